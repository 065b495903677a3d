mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	AuthScheme, Catalog, Config, DecomposeMode, EmbeddingProviderConfig, Lexical,
	LlmProviderConfig, PROJECTION_FIELDS, Pipeline, Projection, Providers, Resolution, Retrieval,
	RetrievalStrategy, Service, VectorIndexBackend, VectorIndexConfig,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}

	validate_reasoning(&cfg.providers.reasoning)?;

	if cfg.retrieval.strategy.uses_embeddings() {
		let strategy = cfg.retrieval.strategy.as_str();
		let Some(embedding) = cfg.providers.embedding.as_ref() else {
			return Err(Error::Validation {
				message: format!(
					"providers.embedding is required when retrieval.strategy is {strategy}."
				),
			});
		};
		let Some(index) = cfg.providers.vector_index.as_ref() else {
			return Err(Error::Validation {
				message: format!(
					"providers.vector_index is required when retrieval.strategy is {strategy}."
				),
			});
		};

		validate_embedding(embedding)?;
		validate_vector_index(index)?;
	}

	if !(1..=100).contains(&cfg.retrieval.top_k) {
		return Err(Error::Validation {
			message: "retrieval.top_k must be in the range 1-100.".to_string(),
		});
	}
	if cfg.retrieval.per_item_cap == 0 {
		return Err(Error::Validation {
			message: "retrieval.per_item_cap must be greater than zero.".to_string(),
		});
	}
	if cfg.retrieval.max_concurrency == 0 {
		return Err(Error::Validation {
			message: "retrieval.max_concurrency must be greater than zero.".to_string(),
		});
	}
	if cfg.lexical.max_candidates == 0 {
		return Err(Error::Validation {
			message: "lexical.max_candidates must be greater than zero.".to_string(),
		});
	}
	if cfg.lexical.min_candidates > cfg.lexical.max_candidates {
		return Err(Error::Validation {
			message: "lexical.min_candidates must not exceed lexical.max_candidates.".to_string(),
		});
	}
	if cfg.lexical.max_terms == 0 {
		return Err(Error::Validation {
			message: "lexical.max_terms must be greater than zero.".to_string(),
		});
	}
	if cfg.projection.columns.is_empty() {
		return Err(Error::Validation {
			message: "projection.columns must be non-empty.".to_string(),
		});
	}

	for column in &cfg.projection.columns {
		let known = PROJECTION_FIELDS.contains(&column.as_str())
			|| column.strip_prefix("extra.").map(|key| !key.trim().is_empty()).unwrap_or(false);

		if !known {
			return Err(Error::Validation {
				message: format!("projection.columns contains unknown column {column:?}."),
			});
		}
	}

	if cfg.projection.max_field_chars == 0 {
		return Err(Error::Validation {
			message: "projection.max_field_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.projection.max_bytes == 0 {
		return Err(Error::Validation {
			message: "projection.max_bytes must be greater than zero.".to_string(),
		});
	}
	if !cfg.resolution.similarity_threshold.is_finite() {
		return Err(Error::Validation {
			message: "resolution.similarity_threshold must be a finite number.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.resolution.similarity_threshold) {
		return Err(Error::Validation {
			message: "resolution.similarity_threshold must be in the range 0.0-1.0.".to_string(),
		});
	}
	if cfg.resolution.no_bid_code.trim().is_empty() {
		return Err(Error::Validation {
			message: "resolution.no_bid_code must be non-empty.".to_string(),
		});
	}
	if cfg.pipeline.request_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "pipeline.request_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.pipeline.max_line_items == 0 {
		return Err(Error::Validation {
			message: "pipeline.max_line_items must be greater than zero.".to_string(),
		});
	}
	if !cfg.catalog.export_url_template.contains("{sheet_id}") {
		return Err(Error::Validation {
			message: "catalog.export_url_template must contain {sheet_id}.".to_string(),
		});
	}

	Ok(())
}

fn validate_reasoning(cfg: &LlmProviderConfig) -> Result<()> {
	if cfg.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "Provider reasoning api_key must be non-empty.".to_string(),
		});
	}
	if cfg.api_base.trim().is_empty() {
		return Err(Error::Validation {
			message: "Provider reasoning api_base must be non-empty.".to_string(),
		});
	}
	if !cfg.temperature.is_finite() || !(0.0..=2.0).contains(&cfg.temperature) {
		return Err(Error::Validation {
			message: "providers.reasoning.temperature must be in the range 0.0-2.0.".to_string(),
		});
	}
	if cfg.max_output_tokens == 0 || cfg.decompose_max_output_tokens == 0 {
		return Err(Error::Validation {
			message: "providers.reasoning output token limits must be greater than zero."
				.to_string(),
		});
	}

	Ok(())
}

fn validate_embedding(cfg: &EmbeddingProviderConfig) -> Result<()> {
	if cfg.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "Provider embedding api_key must be non-empty.".to_string(),
		});
	}
	if cfg.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn validate_vector_index(cfg: &VectorIndexConfig) -> Result<()> {
	if cfg.url.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.vector_index.url must be non-empty.".to_string(),
		});
	}
	if cfg.backend == VectorIndexBackend::Pinecone && cfg.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "Provider vector_index api_key must be non-empty.".to_string(),
		});
	}
	if cfg.backend == VectorIndexBackend::Qdrant && cfg.collection.is_none() {
		return Err(Error::Validation {
			message: "providers.vector_index.collection is required for the qdrant backend."
				.to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if let Some(index) = cfg.providers.vector_index.as_mut()
		&& index.collection.as_deref().map(|name| name.trim().is_empty()).unwrap_or(false)
	{
		index.collection = None;
	}

	let reasoning = &mut cfg.providers.reasoning;

	reasoning.api_key = reasoning.api_key.trim().to_string();

	if let Some(embedding) = cfg.providers.embedding.as_mut() {
		embedding.api_key = embedding.api_key.trim().to_string();
	}

	cfg.projection.columns.retain(|column| !column.trim().is_empty());
}
