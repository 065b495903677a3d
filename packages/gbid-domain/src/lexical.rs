use std::collections::HashSet;

use crate::{line_item, quantity};

const STOP_WORDS: [&str; 12] =
	["to", "in", "on", "at", "or", "is", "it", "we", "us", "our", "my", "all"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexicalLimits {
	/// Hard cap on returned rows.
	pub max_candidates: usize,
	/// Floor reached by padding with untouched catalog rows.
	pub min_candidates: usize,
	/// Rows returned when there are no search terms.
	pub empty_terms_prefix: usize,
}
impl Default for LexicalLimits {
	fn default() -> Self {
		Self { max_candidates: 200, min_candidates: 50, empty_terms_prefix: 50 }
	}
}

/// Keyword overlap: 2 per term longer than two characters, 1 otherwise.
pub fn score_row(row: &str, terms: &[String]) -> u32 {
	terms
		.iter()
		.filter(|term| !term.is_empty() && row.contains(term.as_str()))
		.map(|term| if term.len() > 2 { 2 } else { 1 })
		.sum()
}

/// Returns indices into `rows`: best-scoring first, capped, then padded from the start of the
/// catalog. Rows are expected to be lower-cased already.
pub fn score_rows(rows: &[String], terms: &[String], limits: &LexicalLimits) -> Vec<usize> {
	let cap = limits.max_candidates;

	if terms.iter().all(|term| term.is_empty()) {
		return (0..rows.len().min(limits.empty_terms_prefix).min(cap)).collect();
	}

	let mut scored: Vec<(usize, u32)> = rows
		.iter()
		.enumerate()
		.map(|(index, row)| (index, score_row(row, terms)))
		.filter(|(_, score)| *score > 0)
		.collect();

	// Stable sort keeps catalog order among equal scores.
	scored.sort_by(|left, right| right.1.cmp(&left.1));
	scored.truncate(cap);

	let mut selected: Vec<usize> = scored.into_iter().map(|(index, _)| index).collect();
	let floor = limits.min_candidates.min(cap);

	if selected.len() < floor {
		let included: HashSet<usize> = selected.iter().copied().collect();

		for index in 0..rows.len() {
			if selected.len() >= floor {
				break;
			}
			if !included.contains(&index) {
				selected.push(index);
			}
		}
	}

	selected
}

/// Lower-cased search terms for one request fragment, in order of appearance.
pub fn extract_search_terms(text: &str, max_terms: usize) -> Vec<String> {
	let stripped = quantity::strip_quantity(text).to_lowercase();
	let parts =
		stripped.split(|ch: char| !(ch.is_alphanumeric() || matches!(ch, '/' | '-' | '.' | '#')));
	let mut seen = HashSet::new();
	let mut out = Vec::new();

	for raw in parts {
		let term = raw.trim_matches(|ch: char| matches!(ch, '.' | '-' | '/' | '#'));

		if term.len() < 2 || line_item::is_quantity_word(term) || STOP_WORDS.contains(&term) {
			continue;
		}
		if seen.insert(term.to_string()) {
			out.push(term.to_string());
		}
		if out.len() >= max_terms {
			break;
		}
	}

	out
}
