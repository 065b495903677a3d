pub mod convert;
pub mod decompose;
pub mod error;
pub mod prompt;
pub mod retrieval;
pub mod sheets;

pub use convert::{ConvertRequest, ConvertResponse, RetrievalPath, Suggestion};
pub use error::{Error, Result};
pub use gbid_providers::vector_index::{IndexMatch, IndexStats};
pub use sheets::{SheetRequest, SheetResponse};

use std::{future::Future, pin::Pin, sync::Arc};

use gbid_config::{Catalog, Config, EmbeddingProviderConfig, LlmProviderConfig, VectorIndexConfig};
use gbid_providers::{embedding, reasoning, sheets as sheet_source, vector_index};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, Result<Vec<f32>>>;
}

pub trait VectorIndexProvider
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		cfg: &'a VectorIndexConfig,
		vector: &'a [f32],
		top_k: u32,
	) -> BoxFuture<'a, Result<Vec<IndexMatch>>>;

	fn stats<'a>(&'a self, cfg: &'a VectorIndexConfig) -> BoxFuture<'a, Result<IndexStats>>;
}

pub trait ReasoningProvider
where
	Self: Send + Sync,
{
	fn reason<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
		max_output_tokens: u32,
	) -> BoxFuture<'a, Result<String>>;
}

pub trait CatalogSource
where
	Self: Send + Sync,
{
	fn fetch_catalog_text<'a>(
		&'a self,
		cfg: &'a Catalog,
		source_id: &'a str,
	) -> BoxFuture<'a, Result<String>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub vector_index: Arc<dyn VectorIndexProvider>,
	pub reasoning: Arc<dyn ReasoningProvider>,
	pub catalog: Arc<dyn CatalogSource>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		vector_index: Arc<dyn VectorIndexProvider>,
		reasoning: Arc<dyn ReasoningProvider>,
		catalog: Arc<dyn CatalogSource>,
	) -> Self {
		Self { embedding, vector_index, reasoning, catalog }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self {
			embedding: provider.clone(),
			vector_index: provider.clone(),
			reasoning: provider.clone(),
			catalog: provider,
		}
	}
}

pub struct GbidService {
	pub cfg: Arc<Config>,
	pub providers: Providers,
}
impl GbidService {
	pub fn new(cfg: Config) -> Self {
		Self { cfg: Arc::new(cfg), providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, providers: Providers) -> Self {
		Self { cfg: Arc::new(cfg), providers }
	}

	/// Vector index statistics for the configured backend.
	pub async fn index_stats(&self) -> Result<IndexStats> {
		let cfg = self.cfg.providers.vector_index.as_ref().ok_or_else(|| Error::Configuration {
			message: "providers.vector_index is not configured.".to_string(),
		})?;

		self.providers.vector_index.stats(cfg).await
	}
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		text: &'a str,
	) -> BoxFuture<'a, Result<Vec<f32>>> {
		Box::pin(async move {
			embedding::embed(cfg, text)
				.await
				.map_err(|err| Error::Embedding { message: err.to_string() })
		})
	}
}

impl VectorIndexProvider for DefaultProviders {
	fn search<'a>(
		&'a self,
		cfg: &'a VectorIndexConfig,
		vector: &'a [f32],
		top_k: u32,
	) -> BoxFuture<'a, Result<Vec<IndexMatch>>> {
		Box::pin(async move {
			vector_index::search(cfg, vector, top_k)
				.await
				.map_err(|err| Error::Retrieval { message: err.to_string() })
		})
	}

	fn stats<'a>(&'a self, cfg: &'a VectorIndexConfig) -> BoxFuture<'a, Result<IndexStats>> {
		Box::pin(async move {
			vector_index::stats(cfg)
				.await
				.map_err(|err| Error::Retrieval { message: err.to_string() })
		})
	}
}

impl ReasoningProvider for DefaultProviders {
	fn reason<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
		max_output_tokens: u32,
	) -> BoxFuture<'a, Result<String>> {
		Box::pin(async move {
			reasoning::reason(cfg, prompt, max_output_tokens)
				.await
				.map_err(|err| Error::Reasoning { message: err.to_string() })
		})
	}
}

impl CatalogSource for DefaultProviders {
	fn fetch_catalog_text<'a>(
		&'a self,
		cfg: &'a Catalog,
		source_id: &'a str,
	) -> BoxFuture<'a, Result<String>> {
		Box::pin(async move {
			sheet_source::fetch_catalog_text(cfg, source_id)
				.await
				.map_err(|err| Error::SourceUnavailable { message: err.to_string() })
		})
	}
}
