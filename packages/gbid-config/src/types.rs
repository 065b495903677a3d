use serde::Deserialize;
use serde_json::{Map, Value};

pub const PROJECTION_FIELDS: [&str; 8] = [
	"id",
	"name",
	"code",
	"code_template",
	"description",
	"properties",
	"alternate_names",
	"special_notes",
];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub providers: Providers,
	#[serde(default)]
	pub catalog: Catalog,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub lexical: Lexical,
	#[serde(default)]
	pub projection: Projection,
	#[serde(default)]
	pub resolution: Resolution,
	#[serde(default)]
	pub pipeline: Pipeline,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub reasoning: LlmProviderConfig,
	/// Required by the semantic retrieval strategies.
	pub embedding: Option<EmbeddingProviderConfig>,
	/// Required by the semantic retrieval strategies.
	pub vector_index: Option<VectorIndexConfig>,
}

/// How the API key is presented to an upstream service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthScheme {
	/// `Authorization: Bearer <key>`.
	#[default]
	Bearer,
	/// `x-api-key: <key>`.
	XApiKey,
	/// `Api-Key: <key>`.
	ApiKey,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub auth: AuthScheme,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	#[serde(default = "default_max_output_tokens")]
	pub max_output_tokens: u32,
	#[serde(default = "default_decompose_max_output_tokens")]
	pub decompose_max_output_tokens: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub auth: AuthScheme,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorIndexBackend {
	/// Pinecone-compatible REST data plane (`/query`, `/describe_index_stats`).
	Pinecone,
	/// Qdrant over gRPC; `collection` is required.
	Qdrant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VectorIndexConfig {
	pub backend: VectorIndexBackend,
	pub url: String,
	pub api_key: String,
	/// Qdrant collection name, or Pinecone namespace.
	pub collection: Option<String>,
	pub timeout_ms: u64,
	#[serde(default = "default_index_auth")]
	pub auth: AuthScheme,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Catalog {
	/// `{sheet_id}` and `{gid}` are substituted.
	pub export_url_template: String,
	pub gid: String,
	pub timeout_ms: u64,
}
impl Default for Catalog {
	fn default() -> Self {
		Self {
			export_url_template:
				"https://docs.google.com/spreadsheets/d/{sheet_id}/export?format=csv&gid={gid}"
					.to_string(),
			gid: "0".to_string(),
			timeout_ms: 30_000,
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStrategy {
	Lexical,
	Semantic,
	#[default]
	SemanticWithFallback,
}
impl RetrievalStrategy {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Lexical => "lexical",
			Self::Semantic => "semantic",
			Self::SemanticWithFallback => "semantic_with_fallback",
		}
	}

	pub fn uses_embeddings(self) -> bool {
		!matches!(self, Self::Lexical)
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	pub strategy: RetrievalStrategy,
	pub top_k: u32,
	pub per_item_cap: u32,
	pub max_concurrency: u32,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self {
			strategy: RetrievalStrategy::default(),
			top_k: 25,
			per_item_cap: 5,
			max_concurrency: 4,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Lexical {
	pub max_candidates: u32,
	pub min_candidates: u32,
	pub empty_terms_prefix: u32,
	pub max_terms: u32,
}
impl Default for Lexical {
	fn default() -> Self {
		Self { max_candidates: 200, min_candidates: 50, empty_terms_prefix: 50, max_terms: 32 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Projection {
	/// Allowlisted record fields; `extra.<column>` selects a raw catalog column.
	pub columns: Vec<String>,
	pub max_field_chars: u32,
	pub max_bytes: u64,
}
impl Default for Projection {
	fn default() -> Self {
		Self {
			columns: [
				"name",
				"code",
				"code_template",
				"description",
				"properties",
				"alternate_names",
				"special_notes",
			]
			.into_iter()
			.map(str::to_string)
			.collect(),
			max_field_chars: 400,
			max_bytes: 120_000,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Resolution {
	pub similarity_threshold: f32,
	pub no_bid_code: String,
}
impl Default for Resolution {
	fn default() -> Self {
		Self { similarity_threshold: 0.7, no_bid_code: "NO BID".to_string() }
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecomposeMode {
	Off,
	#[default]
	Local,
	Reasoning,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Pipeline {
	pub decompose: DecomposeMode,
	pub delegate: bool,
	pub request_timeout_ms: u64,
	pub max_line_items: u32,
}
impl Default for Pipeline {
	fn default() -> Self {
		Self {
			decompose: DecomposeMode::default(),
			delegate: true,
			request_timeout_ms: 120_000,
			max_line_items: 50,
		}
	}
}

fn default_max_output_tokens() -> u32 {
	4_000
}

fn default_decompose_max_output_tokens() -> u32 {
	1_000
}

fn default_index_auth() -> AuthScheme {
	AuthScheme::ApiKey
}
