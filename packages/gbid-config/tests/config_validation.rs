use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use gbid_config::{AuthScheme, Config, DecomposeMode, RetrievalStrategy, VectorIndexBackend};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_toml_with(edit: impl FnOnce(&mut toml::Table)) -> String {
	let mut value: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let root = value.as_table_mut().expect("Template config must be a table.");

	edit(root);

	toml::to_string(&value).expect("Failed to render template config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("gbid_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_err(payload: String) -> String {
	let path = write_temp_config(payload);
	let result = gbid_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result.expect_err("Expected validation error.").to_string()
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse test config.")
}

#[test]
fn sample_config_loads() {
	let path = write_temp_config(SAMPLE_CONFIG_TEMPLATE_TOML.to_string());
	let result = gbid_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Sample config must be valid.");

	assert_eq!(cfg.retrieval.strategy, RetrievalStrategy::SemanticWithFallback);
	assert_eq!(cfg.pipeline.decompose, DecomposeMode::Local);
	assert_eq!(cfg.providers.reasoning.auth, AuthScheme::XApiKey);
	assert_eq!(
		cfg.providers.vector_index.as_ref().map(|index| index.backend),
		Some(VectorIndexBackend::Pinecone)
	);
	assert_eq!(
		cfg.providers.vector_index.as_ref().map(|index| index.auth),
		Some(AuthScheme::ApiKey)
	);
}

#[test]
fn omitted_sections_use_defaults() {
	let payload = sample_toml_with(|root| {
		for key in ["catalog", "retrieval", "lexical", "projection", "resolution", "pipeline"] {
			root.remove(key);
		}
	});
	let cfg: Config = toml::from_str(&payload).expect("Failed to parse config.");

	assert_eq!(cfg.lexical.max_candidates, 200);
	assert_eq!(cfg.lexical.min_candidates, 50);
	assert_eq!(cfg.retrieval.per_item_cap, 5);
	assert!((cfg.resolution.similarity_threshold - 0.7).abs() < f32::EPSILON);
	assert_eq!(cfg.resolution.no_bid_code, "NO BID");
	assert!(cfg.pipeline.delegate);
	assert!(cfg.catalog.export_url_template.contains("{sheet_id}"));
	assert!(gbid_config::validate(&cfg).is_ok());
}

#[test]
fn reasoning_api_key_must_be_non_empty() {
	let payload = sample_toml_with(|root| {
		let reasoning = root
			.get_mut("providers")
			.and_then(Value::as_table_mut)
			.and_then(|providers| providers.get_mut("reasoning"))
			.and_then(Value::as_table_mut)
			.expect("Template config must include [providers.reasoning].");

		reasoning.insert("api_key".to_string(), Value::String("   ".to_string()));
	});
	let message = load_err(payload);

	assert!(
		message.contains("Provider reasoning api_key must be non-empty."),
		"Unexpected error message: {message}"
	);
}

#[test]
fn semantic_strategy_requires_embedding_provider() {
	let payload = sample_toml_with(|root| {
		root.get_mut("providers")
			.and_then(Value::as_table_mut)
			.expect("Template config must include [providers].")
			.remove("embedding");
	});
	let message = load_err(payload);

	assert!(
		message.contains("providers.embedding is required when retrieval.strategy is"),
		"Unexpected error message: {message}"
	);
}

#[test]
fn lexical_strategy_needs_no_semantic_providers() {
	let mut cfg = base_config();

	cfg.retrieval.strategy = RetrievalStrategy::Lexical;
	cfg.providers.embedding = None;
	cfg.providers.vector_index = None;

	assert!(gbid_config::validate(&cfg).is_ok());
}

#[test]
fn qdrant_backend_requires_collection() {
	let mut cfg = base_config();

	if let Some(index) = cfg.providers.vector_index.as_mut() {
		index.backend = VectorIndexBackend::Qdrant;
		index.collection = None;
	}

	let err = gbid_config::validate(&cfg).expect_err("Expected collection validation error.");

	assert!(err.to_string().contains("collection is required"), "Unexpected error: {err}");
}

#[test]
fn top_k_must_be_bounded() {
	let mut cfg = base_config();

	cfg.retrieval.top_k = 0;

	assert!(gbid_config::validate(&cfg).is_err());

	cfg.retrieval.top_k = 101;

	assert!(gbid_config::validate(&cfg).is_err());

	cfg.retrieval.top_k = 50;

	assert!(gbid_config::validate(&cfg).is_ok());
}

#[test]
fn lexical_floor_cannot_exceed_cap() {
	let mut cfg = base_config();

	cfg.lexical.min_candidates = 300;

	let err = gbid_config::validate(&cfg).expect_err("Expected lexical validation error.");

	assert!(
		err.to_string().contains("lexical.min_candidates must not exceed lexical.max_candidates."),
		"Unexpected error: {err}"
	);
}

#[test]
fn projection_columns_are_allowlisted() {
	let mut cfg = base_config();

	cfg.projection.columns.push("extra.Manufacturer".to_string());

	assert!(gbid_config::validate(&cfg).is_ok());

	cfg.projection.columns.push("price".to_string());

	let err = gbid_config::validate(&cfg).expect_err("Expected projection validation error.");

	assert!(err.to_string().contains("unknown column \"price\""), "Unexpected error: {err}");
}

#[test]
fn similarity_threshold_must_be_a_ratio() {
	let mut cfg = base_config();

	cfg.resolution.similarity_threshold = 1.5;

	assert!(gbid_config::validate(&cfg).is_err());

	cfg.resolution.similarity_threshold = f32::NAN;

	assert!(gbid_config::validate(&cfg).is_err());
}
