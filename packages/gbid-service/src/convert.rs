use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gbid_config::RetrievalStrategy;
use gbid_domain::{
	attributes::RequestedAttributes,
	candidate::Candidate,
	code::{self, CodeResolution, UnresolvedReason},
	dedupe,
	line_item::LineItem,
	output::{self, ResolvedLine},
	projector::{self, ProjectionSpec},
	quantity,
};

use crate::{Error, GbidService, Result, prompt, retrieval, sheets};

#[derive(Debug, Clone, Deserialize)]
pub struct ConvertRequest {
	pub material_input: String,
	/// Catalog sheet id; required by lexical retrieval and by the semantic fallback.
	#[serde(default)]
	pub sheet_id: Option<String>,
}

/// Which retrieval path produced the candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalPath {
	Lexical,
	Semantic,
	LexicalFallback,
}

/// Deterministic outcome for one line item.
#[derive(Debug, Clone, Serialize)]
pub struct Suggestion {
	pub item_index: usize,
	pub item: String,
	pub record_id: Option<String>,
	pub line: ResolvedLine,
	pub unresolved: Option<UnresolvedReason>,
	pub quantity_parsed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvertResponse {
	pub trace_id: Uuid,
	pub strategy: RetrievalPath,
	pub items: Vec<LineItem>,
	pub suggestions: Vec<Suggestion>,
	pub candidate_count: usize,
	pub table_bytes: usize,
	pub lines: Vec<ResolvedLine>,
	pub notes: Vec<String>,
	/// `code<TAB>quantity` lines, then notes.
	pub result: String,
}

struct Retrieved {
	path: RetrievalPath,
	/// Deduplicated union, in the order handed to the projector.
	pool: Vec<Candidate>,
	/// Per-item candidate lists, indexed by line item.
	per_item: Vec<Vec<Candidate>>,
}
impl Retrieved {
	fn for_item(&self, index: usize) -> &[Candidate] {
		match self.per_item.get(index) {
			Some(candidates) => candidates,
			None => &self.pool,
		}
	}
}

impl GbidService {
	/// Resolves a free-text material request into catalog codes and quantities.
	pub async fn convert(&self, req: ConvertRequest) -> Result<ConvertResponse> {
		let trace_id = Uuid::new_v4();
		let timeout_ms = self.cfg.pipeline.request_timeout_ms;
		let run = self.run_convert(trace_id, req);

		match tokio::time::timeout(Duration::from_millis(timeout_ms), run).await {
			Ok(result) => result,
			Err(_) => {
				tracing::warn!(%trace_id, timeout_ms, "Conversion timed out.");

				Err(Error::Timeout { timeout_ms })
			},
		}
	}

	async fn run_convert(&self, trace_id: Uuid, req: ConvertRequest) -> Result<ConvertResponse> {
		let request = req.material_input.trim();

		if request.is_empty() {
			return Err(Error::InvalidRequest {
				message: "material_input is required.".to_string(),
			});
		}

		let sheet_id = match req.sheet_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
			Some(raw) => Some(sheets::validate_sheet_id(raw)?),
			None => None,
		};
		let strategy = self.cfg.retrieval.strategy;

		if strategy == RetrievalStrategy::Lexical && sheet_id.is_none() {
			return Err(Error::InvalidRequest {
				message: "sheet_id is required for lexical retrieval.".to_string(),
			});
		}

		let items = self.decompose(request).await?;

		if items.is_empty() {
			return Err(Error::InvalidRequest {
				message: "material_input contains no line items.".to_string(),
			});
		}

		tracing::info!(
			%trace_id,
			strategy = strategy.as_str(),
			items = items.len(),
			"Conversion started."
		);

		let retrieved = self.retrieve(trace_id, &items, sheet_id).await?;
		let spec = ProjectionSpec {
			columns: self.cfg.projection.columns.clone(),
			max_field_chars: self.cfg.projection.max_field_chars as usize,
		};
		let table = projector::project(&retrieved.pool, &spec).to_text();
		let table_bytes = table.len();

		if table_bytes as u64 > self.cfg.projection.max_bytes {
			tracing::warn!(
				%trace_id,
				table_bytes,
				max_bytes = self.cfg.projection.max_bytes,
				"Projected table exceeds the byte budget."
			);
		}

		let suggestions: Vec<Suggestion> = items
			.iter()
			.map(|item| self.suggest(item, retrieved.for_item(item.index)))
			.collect();
		let (lines, notes) = if self.cfg.pipeline.delegate {
			self.delegate(trace_id, request, &items, &table, &suggestions).await?
		} else {
			(suggestions.iter().map(|s| s.line.clone()).collect(), unresolved_notes(&suggestions))
		};
		let result = output::render_output(&lines, &notes);

		tracing::info!(
			%trace_id,
			strategy = strategy.as_str(),
			candidates = retrieved.pool.len(),
			table_bytes,
			lines = lines.len(),
			"Conversion finished."
		);

		Ok(ConvertResponse {
			trace_id,
			strategy: retrieved.path,
			items,
			suggestions,
			candidate_count: retrieved.pool.len(),
			table_bytes,
			lines,
			notes,
			result,
		})
	}

	async fn retrieve(
		&self,
		trace_id: Uuid,
		items: &[LineItem],
		sheet_id: Option<&str>,
	) -> Result<Retrieved> {
		let strategy = self.cfg.retrieval.strategy;

		if strategy.uses_embeddings() {
			let semantic =
				retrieval::retrieve_semantic(self.cfg.clone(), self.providers.clone(), items).await;

			match semantic {
				Ok(per_item) => {
					let union = per_item.iter().flatten().cloned().collect();
					let pool = dedupe::dedupe_candidates(union);

					return Ok(Retrieved { path: RetrievalPath::Semantic, pool, per_item });
				},
				Err(err)
					if err.is_semantic_failure()
						&& strategy == RetrievalStrategy::SemanticWithFallback
						&& sheet_id.is_some() =>
				{
					tracing::warn!(
						%trace_id,
						error = %err,
						"Semantic retrieval failed. Using lexical fallback."
					);
				},
				Err(err) => return Err(err),
			}
		}

		let Some(sheet_id) = sheet_id else {
			return Err(Error::InvalidRequest {
				message: "sheet_id is required for lexical retrieval.".to_string(),
			});
		};
		let catalog = self.load_catalog(sheet_id).await?;
		let per_item = retrieval::retrieve_lexical(&self.cfg, &catalog, items);
		let pool = dedupe::dedupe_candidates(per_item.iter().flatten().cloned().collect());
		let path = if strategy.uses_embeddings() {
			RetrievalPath::LexicalFallback
		} else {
			RetrievalPath::Lexical
		};

		Ok(Retrieved { path, pool, per_item })
	}

	fn suggest(&self, item: &LineItem, candidates: &[Candidate]) -> Suggestion {
		let resolution = &self.cfg.resolution;
		let attrs = RequestedAttributes::from_text(&item.text);
		let selected =
			code::select_candidate(candidates, &item.text, &attrs, resolution.similarity_threshold);
		let Some(selected) = selected else {
			return Suggestion {
				item_index: item.index,
				item: item.text.clone(),
				record_id: None,
				line: ResolvedLine::no_bid(&resolution.no_bid_code),
				unresolved: Some(UnresolvedReason::NoMatchingCandidate),
				quantity_parsed: false,
			};
		};
		let quantity = quantity::quantity_for(&item.text, &selected.record.properties);
		let (line, unresolved) = match code::resolve_code(&selected.record, &attrs) {
			CodeResolution::Resolved(code) => (ResolvedLine::new(code, quantity.value()), None),
			CodeResolution::Unresolved(reason) => {
				(ResolvedLine::no_bid(&resolution.no_bid_code), Some(reason))
			},
		};

		Suggestion {
			item_index: item.index,
			item: item.text.clone(),
			record_id: Some(selected.id().to_string()),
			line,
			unresolved,
			quantity_parsed: quantity.is_parsed(),
		}
	}

	async fn delegate(
		&self,
		trace_id: Uuid,
		request: &str,
		items: &[LineItem],
		table: &str,
		suggestions: &[Suggestion],
	) -> Result<(Vec<ResolvedLine>, Vec<String>)> {
		let reasoning = &self.cfg.providers.reasoning;
		let prompt = prompt::build_convert_prompt(
			request,
			items,
			table,
			suggestions,
			&self.cfg.resolution.no_bid_code,
		);
		let reply =
			self.providers.reasoning.reason(reasoning, &prompt, reasoning.max_output_tokens).await?;
		let parsed = output::parse_reasoning_output(&reply);

		if parsed.lines.is_empty() {
			tracing::warn!(%trace_id, "Reasoning reply had no list lines. Using suggestions.");

			let lines = suggestions.iter().map(|s| s.line.clone()).collect();
			let raw = reply.trim();
			let notes = if raw.is_empty() { Vec::new() } else { vec![raw.to_string()] };

			return Ok((lines, notes));
		}

		let mut lines = parsed.lines;
		let mut notes = parsed.notes;
		let restored = restore_omitted(&mut lines, suggestions);

		if !restored.is_empty() {
			tracing::warn!(
				%trace_id,
				listed = lines.len() - restored.len(),
				items = items.len(),
				"Reasoning reply omitted line items. Restored them from suggestions."
			);

			notes.extend(restored);
		}

		Ok((lines, notes))
	}
}

/// Puts back suggestions for items the reasoning reply left out, at their request position.
/// A suggestion counts as listed when its code appears in the reply; the rest of the shortfall
/// is taken from the end of the request. Returns one note per restored item.
fn restore_omitted(lines: &mut Vec<ResolvedLine>, suggestions: &[Suggestion]) -> Vec<String> {
	let shortfall = suggestions.len().saturating_sub(lines.len());

	if shortfall == 0 {
		return Vec::new();
	}

	let mut missing: Vec<&Suggestion> = suggestions
		.iter()
		.filter(|suggestion| !lines.iter().any(|line| line.code == suggestion.line.code))
		.take(shortfall)
		.collect();

	for suggestion in suggestions.iter().rev() {
		if missing.len() >= shortfall {
			break;
		}
		if !missing.iter().any(|kept| kept.item_index == suggestion.item_index) {
			missing.push(suggestion);
		}
	}

	missing.sort_by_key(|suggestion| suggestion.item_index);

	missing
		.into_iter()
		.map(|suggestion| {
			let at = suggestion.item_index.min(lines.len());

			lines.insert(at, suggestion.line.clone());

			format!(
				"\"{}\" was missing from the reasoning reply; kept {} x {} from catalog matching.",
				suggestion.item, suggestion.line.code, suggestion.line.quantity
			)
		})
		.collect()
}

fn unresolved_notes(suggestions: &[Suggestion]) -> Vec<String> {
	suggestions
		.iter()
		.filter(|suggestion| suggestion.unresolved.is_some())
		.map(|suggestion| format!("No catalog code resolved for \"{}\".", suggestion.item))
		.collect()
}
