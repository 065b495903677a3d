use std::{
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use serde_json::{Map, Value};

use gbid_config::{
	Catalog, Config, DecomposeMode, EmbeddingProviderConfig, LlmProviderConfig,
	RetrievalStrategy, VectorIndexConfig,
};
use gbid_service::{
	BoxFuture, CatalogSource, ConvertRequest, EmbeddingProvider, Error, GbidService, IndexMatch,
	IndexStats, Providers, ReasoningProvider, Result, RetrievalPath, SheetRequest,
	VectorIndexProvider,
};

const SAMPLE_CONFIG_TEMPLATE_TOML: &str =
	include_str!("../../gbid-config/tests/fixtures/sample_config.template.toml");
const CATALOG_CSV: &str = "\
Name,GBID,Description,Properties,Alternate Names,Special Notes
EMT Conduit,E34,Steel conduit 3/4,,Electrical metallic tubing,
Wire Nut,WN12,Twist-on connector,24 per box,Wire connector,
";
const CROWDED_CATALOG_CSV: &str = "\
Name,GBID,Description,Properties,Alternate Names,Special Notes
EMT Conduit,E34,Steel conduit 3/4,,,
EMT Conduit 10',E34-10,Steel conduit 3/4 ten foot stick,,,
EMT Conduit 20',E34-20,Steel conduit 3/4 twenty foot stick,,,
Wire Nut,WN12,Twist-on connector,24 per box,Wire connector,
";

struct DummyEmbedding {
	dimensions: usize,
	in_flight: AtomicUsize,
	peak: AtomicUsize,
}
impl DummyEmbedding {
	fn new(dimensions: usize) -> Self {
		Self { dimensions, in_flight: AtomicUsize::new(0), peak: AtomicUsize::new(0) }
	}
}
impl EmbeddingProvider for DummyEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		_text: &'a str,
	) -> BoxFuture<'a, Result<Vec<f32>>> {
		Box::pin(async move {
			let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;

			self.peak.fetch_max(current, Ordering::SeqCst);
			tokio::time::sleep(Duration::from_millis(20)).await;
			self.in_flight.fetch_sub(1, Ordering::SeqCst);

			Ok(vec![0.0; self.dimensions])
		})
	}
}

struct FailingEmbedding;
impl EmbeddingProvider for FailingEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		_text: &'a str,
	) -> BoxFuture<'a, Result<Vec<f32>>> {
		Box::pin(async move {
			Err(Error::Embedding { message: "embedding service unreachable".to_string() })
		})
	}
}

struct DummyIndex;
impl VectorIndexProvider for DummyIndex {
	fn search<'a>(
		&'a self,
		_cfg: &'a VectorIndexConfig,
		_vector: &'a [f32],
		_top_k: u32,
	) -> BoxFuture<'a, Result<Vec<IndexMatch>>> {
		let mut metadata = Map::new();

		metadata.insert("Name".to_string(), Value::String("EMT Conduit".to_string()));
		metadata.insert("GBID".to_string(), Value::String("E34".to_string()));
		metadata.insert("Description".to_string(), Value::String("Steel conduit 3/4".to_string()));

		let hit = IndexMatch { id: "emt-34".to_string(), score: 0.92, metadata };

		Box::pin(async move { Ok(vec![hit]) })
	}

	fn stats<'a>(&'a self, _cfg: &'a VectorIndexConfig) -> BoxFuture<'a, Result<IndexStats>> {
		Box::pin(async move {
			Ok(IndexStats {
				backend: "pinecone".to_string(),
				total_vector_count: 2,
				dimension: Some(3),
				index_fullness: None,
			})
		})
	}
}

struct SpyReasoning {
	reply: String,
	delay: Duration,
	prompts: Mutex<Vec<String>>,
}
impl SpyReasoning {
	fn replying(reply: &str) -> Self {
		Self { reply: reply.to_string(), delay: Duration::ZERO, prompts: Mutex::new(Vec::new()) }
	}

	fn slow(delay: Duration) -> Self {
		Self { delay, ..Self::replying("E34\t800") }
	}

	fn prompts(&self) -> Vec<String> {
		self.prompts.lock().expect("Prompt log poisoned.").clone()
	}
}
impl ReasoningProvider for SpyReasoning {
	fn reason<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		prompt: &'a str,
		_max_output_tokens: u32,
	) -> BoxFuture<'a, Result<String>> {
		self.prompts.lock().expect("Prompt log poisoned.").push(prompt.to_string());

		Box::pin(async move {
			tokio::time::sleep(self.delay).await;

			Ok(self.reply.clone())
		})
	}
}

struct FailingReasoning;
impl ReasoningProvider for FailingReasoning {
	fn reason<'a>(
		&'a self,
		_cfg: &'a LlmProviderConfig,
		_prompt: &'a str,
		_max_output_tokens: u32,
	) -> BoxFuture<'a, Result<String>> {
		Box::pin(async move { Err(Error::Reasoning { message: "overloaded".to_string() }) })
	}
}

struct StaticCatalog {
	csv: &'static str,
	fetches: AtomicUsize,
}
impl StaticCatalog {
	fn new() -> Self {
		Self::with_csv(CATALOG_CSV)
	}

	fn with_csv(csv: &'static str) -> Self {
		Self { csv, fetches: AtomicUsize::new(0) }
	}
}
impl CatalogSource for StaticCatalog {
	fn fetch_catalog_text<'a>(
		&'a self,
		_cfg: &'a Catalog,
		source_id: &'a str,
	) -> BoxFuture<'a, Result<String>> {
		self.fetches.fetch_add(1, Ordering::SeqCst);

		Box::pin(async move {
			if source_id == "missing" {
				return Err(Error::SourceUnavailable {
					message: "Sheet not found. Make sure the sheet is public and the ID is correct."
						.to_string(),
				});
			}

			Ok(self.csv.to_string())
		})
	}
}

fn test_config(strategy: RetrievalStrategy, delegate: bool) -> Config {
	let mut cfg: Config =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse test config.");

	cfg.retrieval.strategy = strategy;
	cfg.pipeline.delegate = delegate;

	if let Some(embedding) = cfg.providers.embedding.as_mut() {
		embedding.dimensions = 3;
	}

	cfg
}

fn service(
	cfg: Config,
	embedding: Arc<dyn EmbeddingProvider>,
	reasoning: Arc<dyn ReasoningProvider>,
	catalog: Arc<dyn CatalogSource>,
) -> GbidService {
	let providers = Providers::new(embedding, Arc::new(DummyIndex), reasoning, catalog);

	GbidService::with_providers(cfg, providers)
}

fn request(material_input: &str, sheet_id: Option<&str>) -> ConvertRequest {
	ConvertRequest {
		material_input: material_input.to_string(),
		sheet_id: sheet_id.map(str::to_string),
	}
}

#[tokio::test]
async fn lexical_path_resolves_cuts_into_footage() {
	let service = service(
		test_config(RetrievalStrategy::Lexical, false),
		Arc::new(FailingEmbedding),
		Arc::new(SpyReasoning::replying("unused")),
		Arc::new(StaticCatalog::new()),
	);
	let response = service
		.convert(request("2 cuts of 400' of 3/4 EMT", Some("sheet-1")))
		.await
		.expect("Conversion failed.");

	assert_eq!(response.strategy, RetrievalPath::Lexical);
	assert_eq!(response.result, "E34\t800");
	assert_eq!(response.suggestions[0].record_id.as_deref(), Some("row-1"));
}

#[tokio::test]
async fn semantic_path_uses_index_metadata() {
	let service = service(
		test_config(RetrievalStrategy::Semantic, false),
		Arc::new(DummyEmbedding::new(3)),
		Arc::new(SpyReasoning::replying("unused")),
		Arc::new(StaticCatalog::new()),
	);
	let response = service
		.convert(request("2 cuts of 400' of 3/4 EMT", None))
		.await
		.expect("Conversion failed.");

	assert_eq!(response.strategy, RetrievalPath::Semantic);
	assert_eq!(response.candidate_count, 1);
	assert_eq!(response.result, "E34\t800");
	assert_eq!(response.suggestions[0].record_id.as_deref(), Some("emt-34"));
}

#[tokio::test]
async fn embedding_failure_falls_back_to_lexical() {
	let catalog = Arc::new(StaticCatalog::new());
	let service = service(
		test_config(RetrievalStrategy::SemanticWithFallback, false),
		Arc::new(FailingEmbedding),
		Arc::new(SpyReasoning::replying("unused")),
		catalog.clone(),
	);
	let response = service
		.convert(request("200' of 3/4 EMT\n3 boxes of wire nut", Some("sheet-1")))
		.await
		.expect("Conversion failed.");

	assert_eq!(response.strategy, RetrievalPath::LexicalFallback);
	assert_eq!(response.items.len(), 2);
	assert_eq!(response.result, "E34\t200\nWN12\t72");
	assert_eq!(catalog.fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn embedding_failure_without_sheet_is_fatal() {
	let service = service(
		test_config(RetrievalStrategy::SemanticWithFallback, false),
		Arc::new(FailingEmbedding),
		Arc::new(SpyReasoning::replying("unused")),
		Arc::new(StaticCatalog::new()),
	);
	let err = service
		.convert(request("200' of 3/4 EMT", None))
		.await
		.expect_err("Expected embedding error.");

	assert!(matches!(err, Error::Embedding { .. }));
}

#[tokio::test]
async fn dimension_mismatch_is_an_embedding_error() {
	let service = service(
		test_config(RetrievalStrategy::Semantic, false),
		Arc::new(DummyEmbedding::new(5)),
		Arc::new(SpyReasoning::replying("unused")),
		Arc::new(StaticCatalog::new()),
	);
	let err = service
		.convert(request("200' of 3/4 EMT", Some("sheet-1")))
		.await
		.expect_err("Expected embedding error.");

	assert!(matches!(err, Error::Embedding { .. }));
}

#[tokio::test]
async fn semantic_fan_out_respects_concurrency_limit() {
	let mut cfg = test_config(RetrievalStrategy::Semantic, false);

	cfg.retrieval.max_concurrency = 2;

	let embedding = Arc::new(DummyEmbedding::new(3));
	let service = service(
		cfg,
		embedding.clone(),
		Arc::new(SpyReasoning::replying("unused")),
		Arc::new(StaticCatalog::new()),
	);
	let input = "200' 3/4 EMT\n100' 3/4 EMT\n50' 3/4 EMT\n20' 3/4 EMT\n10' 3/4 EMT";
	let response = service
		.convert(request(input, None))
		.await
		.expect("Conversion failed.");

	assert_eq!(response.lines.len(), 5);
	assert!(embedding.peak.load(Ordering::SeqCst) <= 2);
	assert_eq!(response.candidate_count, 1);
}

#[tokio::test]
async fn delegate_sends_table_and_parses_reply() {
	let reasoning =
		Arc::new(SpyReasoning::replying("GBID\tQTY\nE34\t800\nNote: confirm the EMT size."));
	let service = service(
		test_config(RetrievalStrategy::Lexical, true),
		Arc::new(FailingEmbedding),
		reasoning.clone(),
		Arc::new(StaticCatalog::new()),
	);
	let response = service
		.convert(request("2 cuts of 400' of 3/4 EMT", Some("sheet-1")))
		.await
		.expect("Conversion failed.");
	let prompts = reasoning.prompts();

	assert_eq!(prompts.len(), 1);
	assert!(prompts[0].contains("EMT Conduit,E34"));
	assert!(prompts[0].contains("=> E34\t800"));
	assert_eq!(response.notes, vec!["Note: confirm the EMT size."]);
	assert_eq!(response.result, "E34\t800\n\nNote: confirm the EMT size.");
}

#[tokio::test]
async fn reply_without_list_keeps_suggestions() {
	let service = service(
		test_config(RetrievalStrategy::Lexical, true),
		Arc::new(FailingEmbedding),
		Arc::new(SpyReasoning::replying("I could not find a clean answer.")),
		Arc::new(StaticCatalog::new()),
	);
	let response = service
		.convert(request("10 hydraulic pumps", Some("sheet-1")))
		.await
		.expect("Conversion failed.");

	assert_eq!(response.lines.len(), 1);
	assert_eq!(response.lines[0].render(), "NO BID\t1");
	assert_eq!(response.notes, vec!["I could not find a clean answer."]);
}

#[tokio::test]
async fn slow_reasoning_times_out() {
	let mut cfg = test_config(RetrievalStrategy::Lexical, true);

	cfg.pipeline.request_timeout_ms = 50;

	let service = service(
		cfg,
		Arc::new(FailingEmbedding),
		Arc::new(SpyReasoning::slow(Duration::from_secs(5))),
		Arc::new(StaticCatalog::new()),
	);
	let err = service
		.convert(request("200' of 3/4 EMT", Some("sheet-1")))
		.await
		.expect_err("Expected timeout.");

	assert!(matches!(err, Error::Timeout { timeout_ms: 50 }));
}

#[tokio::test]
async fn rejects_empty_input_and_bad_sheet_ids() {
	let service = service(
		test_config(RetrievalStrategy::Lexical, false),
		Arc::new(FailingEmbedding),
		Arc::new(SpyReasoning::replying("unused")),
		Arc::new(StaticCatalog::new()),
	);
	let empty = service.convert(request("   ", Some("sheet-1"))).await;
	let bad_sheet = service.convert(request("200' of 3/4 EMT", Some("../etc"))).await;
	let no_sheet = service.convert(request("200' of 3/4 EMT", None)).await;

	assert!(matches!(empty, Err(Error::InvalidRequest { .. })));
	assert!(matches!(bad_sheet, Err(Error::InvalidRequest { .. })));
	assert!(matches!(no_sheet, Err(Error::InvalidRequest { .. })));
}

#[tokio::test]
async fn missing_sheet_surfaces_source_error() {
	let service = service(
		test_config(RetrievalStrategy::Lexical, false),
		Arc::new(FailingEmbedding),
		Arc::new(SpyReasoning::replying("unused")),
		Arc::new(StaticCatalog::new()),
	);
	let err = service
		.convert(request("200' of 3/4 EMT", Some("missing")))
		.await
		.expect_err("Expected source error.");

	assert!(matches!(err, Error::SourceUnavailable { .. }));
	assert!(err.to_string().contains("Sheet not found"));
}

#[tokio::test]
async fn index_stats_come_from_the_index_provider() {
	let service = service(
		test_config(RetrievalStrategy::Semantic, false),
		Arc::new(DummyEmbedding::new(3)),
		Arc::new(SpyReasoning::replying("unused")),
		Arc::new(StaticCatalog::new()),
	);
	let stats = service.index_stats().await.expect("Stats failed.");

	assert_eq!(stats.total_vector_count, 2);
}

#[tokio::test]
async fn sheet_fetch_counts_rows_and_records() {
	let service = service(
		test_config(RetrievalStrategy::Lexical, false),
		Arc::new(FailingEmbedding),
		Arc::new(SpyReasoning::replying("unused")),
		Arc::new(StaticCatalog::new()),
	);
	let sheet = service
		.fetch_sheet(SheetRequest { sheet_id: " sheet-1 ".to_string() })
		.await
		.expect("Sheet fetch failed.");

	assert_eq!(sheet.sheet_id, "sheet-1");
	assert_eq!(sheet.row_count, 3);
	assert_eq!(sheet.record_count, 2);
}

#[tokio::test]
async fn reply_missing_an_item_keeps_its_suggestion() {
	let service = service(
		test_config(RetrievalStrategy::Lexical, true),
		Arc::new(FailingEmbedding),
		Arc::new(SpyReasoning::replying("E34\t800")),
		Arc::new(StaticCatalog::new()),
	);
	let response = service
		.convert(request("2 cuts of 400' of 3/4 EMT\n3 boxes wire nut", Some("sheet-1")))
		.await
		.expect("Conversion failed.");
	let rendered: Vec<String> = response.lines.iter().map(|line| line.render()).collect();

	assert_eq!(rendered, vec!["E34\t800", "WN12\t72"]);
	assert_eq!(response.notes.len(), 1);
	assert!(response.notes[0].contains("3 boxes wire nut"));
	assert!(response.result.starts_with("E34\t800\nWN12\t72\n\n"));
}

#[tokio::test]
async fn reply_missing_the_first_item_restores_it_in_place() {
	let service = service(
		test_config(RetrievalStrategy::Lexical, true),
		Arc::new(FailingEmbedding),
		Arc::new(SpyReasoning::replying("WN12\t72")),
		Arc::new(StaticCatalog::new()),
	);
	let response = service
		.convert(request("2 cuts of 400' of 3/4 EMT\n3 boxes wire nut", Some("sheet-1")))
		.await
		.expect("Conversion failed.");
	let rendered: Vec<String> = response.lines.iter().map(|line| line.render()).collect();

	assert_eq!(rendered, vec!["E34\t800", "WN12\t72"]);
}

#[tokio::test]
async fn lexical_rows_are_scored_per_item() {
	let mut cfg = test_config(RetrievalStrategy::Lexical, false);

	cfg.lexical.max_candidates = 2;
	cfg.lexical.min_candidates = 0;

	let service = service(
		cfg,
		Arc::new(FailingEmbedding),
		Arc::new(SpyReasoning::replying("unused")),
		Arc::new(StaticCatalog::with_csv(CROWDED_CATALOG_CSV)),
	);
	let response = service
		.convert(request("200' of 3/4 EMT\n3 boxes of wire nut", Some("sheet-1")))
		.await
		.expect("Conversion failed.");

	assert_eq!(response.suggestions[1].record_id.as_deref(), Some("row-4"));
	assert_eq!(response.result, "E34\t200\nWN12\t72");
}

#[tokio::test]
async fn reasoning_decomposition_reads_json_items() {
	let mut cfg = test_config(RetrievalStrategy::Lexical, false);

	cfg.pipeline.decompose = DecomposeMode::Reasoning;

	let reasoning = Arc::new(SpyReasoning::replying(
		"Here you go:\n[\"200' of 3/4 EMT\", \"3 boxes of wire nut\"]",
	));
	let service = service(
		cfg,
		Arc::new(FailingEmbedding),
		reasoning.clone(),
		Arc::new(StaticCatalog::new()),
	);
	let items = service
		.decompose("Need 200' of 3/4 EMT\nand also 3 boxes of wire nut")
		.await
		.expect("Decomposition failed.");
	let texts: Vec<&str> = items.iter().map(|item| item.text.as_str()).collect();

	assert_eq!(texts, vec!["200' of 3/4 EMT", "3 boxes of wire nut"]);
	assert_eq!(reasoning.prompts().len(), 1);
	assert!(reasoning.prompts()[0].contains("and also 3 boxes of wire nut"));
}

#[tokio::test]
async fn reasoning_decomposition_without_items_splits_locally() {
	let mut cfg = test_config(RetrievalStrategy::Lexical, false);

	cfg.pipeline.decompose = DecomposeMode::Reasoning;

	let service = service(
		cfg,
		Arc::new(FailingEmbedding),
		Arc::new(SpyReasoning::replying("  \n ")),
		Arc::new(StaticCatalog::new()),
	);
	let items = service
		.decompose("200' of 3/4 EMT\n3 boxes of wire nut")
		.await
		.expect("Decomposition failed.");

	assert_eq!(items.len(), 2);
	assert_eq!(items[1].text, "3 boxes of wire nut");
}

#[tokio::test]
async fn reasoning_decomposition_failure_splits_locally() {
	let mut cfg = test_config(RetrievalStrategy::Lexical, false);

	cfg.pipeline.decompose = DecomposeMode::Reasoning;

	let service = service(
		cfg,
		Arc::new(FailingEmbedding),
		Arc::new(FailingReasoning),
		Arc::new(StaticCatalog::new()),
	);
	let response = service
		.convert(request("200' of 3/4 EMT\n3 boxes of wire nut", Some("sheet-1")))
		.await
		.expect("Conversion failed.");

	assert_eq!(response.items.len(), 2);
	assert_eq!(response.result, "E34\t200\nWN12\t72");
}
