//! Maps a matched catalog record plus the requested attribute values to its output code.
//!
//! A record is addressed in one of three ways, checked in order: a static code, a
//! parametric `code_template`, or a template embedded in the special notes (flagged by the
//! `TEMPLATE` sentinel in the code column) optionally paired with a `KEY: value` table.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
	attributes::RequestedAttributes, candidate::Candidate, catalog::CatalogRecord, line_item,
	quantity, rerank,
};

pub const TEMPLATE_SENTINEL: &str = "TEMPLATE";

const SIZE_PLACEHOLDERS: [&str; 8] =
	["SIZE", "DIM", "DIMENSION", "LENGTH", "WIDTH", "HEIGHT", "GAUGE", "AWG"];

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\(([A-Z][A-Z_ ]*)\)").expect("placeholder pattern must compile")
});
static NOTES_TEMPLATE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"=[A-Za-z0-9./-]*(?:\([A-Z][A-Z_ ]*\)[A-Za-z0-9./-]*)+\*?")
		.expect("notes template pattern must compile")
});
static MAPPING_PAIR: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\b([A-Za-z][A-Za-z_]*)\s*:\s*([A-Z0-9]+)\b")
		.expect("mapping pattern must compile")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UnresolvedReason {
	/// The record carries no static code and no template.
	NoCode,
	/// `TEMPLATE` sentinel without a template in the notes.
	MissingTemplate,
	/// A placeholder had no requested value to fill it.
	MissingValue { placeholder: String },
	/// No candidate reasonably matches the requested item.
	NoMatchingCandidate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeResolution {
	Resolved(String),
	Unresolved(UnresolvedReason),
}
impl CodeResolution {
	pub fn code(&self) -> Option<&str> {
		match self {
			Self::Resolved(code) => Some(code),
			Self::Unresolved(_) => None,
		}
	}
}

/// `KEY: value` pairs found in special notes, in order of appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueMapping {
	pairs: Vec<(String, String)>,
}
impl ValueMapping {
	pub fn parse(notes: &str) -> Self {
		let pairs = MAPPING_PAIR
			.captures_iter(notes)
			.filter_map(|caps| {
				let key = caps.get(1)?.as_str().trim();
				let value = caps.get(2)?.as_str();

				if key.eq_ignore_ascii_case(TEMPLATE_SENTINEL) {
					return None;
				}

				Some((key.to_uppercase(), value.to_string()))
			})
			.collect();

		Self { pairs }
	}

	pub fn is_empty(&self) -> bool {
		self.pairs.is_empty()
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.pairs
			.iter()
			.find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
			.map(|(_, value)| value.as_str())
	}

	/// First requested word that is a key of the table, mapped.
	fn lookup_requested(&self, attrs: &RequestedAttributes) -> Option<&str> {
		attrs.words.iter().find_map(|word| self.get(word))
	}
}

pub fn resolve_code(record: &CatalogRecord, attrs: &RequestedAttributes) -> CodeResolution {
	let code = record.code.as_deref().map(str::trim).filter(|code| !code.is_empty());

	if let Some(code) = code
		&& !is_template_sentinel(code)
	{
		return CodeResolution::Resolved(code.to_string());
	}
	if let Some(template) = record.code_template.as_deref().filter(|t| !t.trim().is_empty()) {
		let substituted = substitute_template(template.trim(), attrs, &ValueMapping::default());

		return into_resolution(substituted);
	}
	if code.map(is_template_sentinel).unwrap_or(false) {
		let Some(template) = find_notes_template(&record.special_notes) else {
			return CodeResolution::Unresolved(UnresolvedReason::MissingTemplate);
		};
		let mapping = ValueMapping::parse(&record.special_notes);

		return into_resolution(substitute_template(&template, attrs, &mapping));
	}

	CodeResolution::Unresolved(UnresolvedReason::NoCode)
}

pub fn is_template_sentinel(code: &str) -> bool {
	code.trim().eq_ignore_ascii_case(TEMPLATE_SENTINEL)
}

/// Fills placeholders left to right. Size-like placeholders consume `attrs.sizes` in order;
/// named placeholders use the value-mapping table when it has one, else the raw value.
/// The result always ends with `*`.
pub fn substitute_template(
	template: &str,
	attrs: &RequestedAttributes,
	mapping: &ValueMapping,
) -> Result<String, UnresolvedReason> {
	let mut sizes = attrs.sizes.iter();
	let mut out = String::with_capacity(template.len() + 8);
	let mut last = 0;

	for caps in PLACEHOLDER.captures_iter(template) {
		let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else { continue };
		let placeholder = name.as_str().trim().to_string();
		let value = if SIZE_PLACEHOLDERS.contains(&placeholder.as_str()) {
			sizes.next().map(|size| size.as_str())
		} else if !mapping.is_empty() {
			mapping
				.lookup_requested(attrs)
				.or_else(|| attrs.named(&placeholder).and_then(|raw| mapping.get(raw)))
				.or_else(|| attrs.named(&placeholder))
		} else {
			attrs.named(&placeholder)
		};
		let Some(value) = value else {
			return Err(UnresolvedReason::MissingValue { placeholder });
		};

		out.push_str(&template[last..whole.start()]);
		out.push_str(value);

		last = whole.end();
	}

	out.push_str(&template[last..]);

	if !out.ends_with('*') {
		out.push('*');
	}

	Ok(out)
}

/// The first `=...(PLACEHOLDER)...` string in free-text notes.
pub fn find_notes_template(notes: &str) -> Option<String> {
	NOTES_TEMPLATE
		.find(notes)
		.map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':']).to_string())
}

/// Picks the record for one line item.
///
/// An exact display-name match wins outright. Otherwise only candidates whose name or
/// aliases contain the item's type token are eligible; among them the first whose text
/// holds every requested size and whose similarity is at least `threshold` (lexical hits
/// carry no score and qualify) is preferred, else the first eligible one. Attribute
/// similarity alone never selects a record.
pub fn select_candidate<'a>(
	candidates: &'a [Candidate],
	item_text: &str,
	attrs: &RequestedAttributes,
	threshold: f32,
) -> Option<&'a Candidate> {
	let described = normalize_name(&quantity::strip_quantity(item_text));

	if !described.is_empty()
		&& let Some(exact) =
			candidates.iter().find(|candidate| normalize_name(&candidate.record.name) == described)
	{
		return Some(exact);
	}

	let token = rerank::type_token(item_text)?;
	let eligible: Vec<&Candidate> = candidates
		.iter()
		.filter(|candidate| rerank::matches_type(&candidate.record, &token))
		.collect();

	eligible
		.iter()
		.copied()
		.find(|candidate| {
			candidate.score.map(|score| score >= threshold).unwrap_or(true)
				&& holds_sizes(&candidate.record, &attrs.sizes)
		})
		.or_else(|| eligible.first().copied())
}

fn holds_sizes(record: &CatalogRecord, sizes: &[String]) -> bool {
	if sizes.is_empty() {
		return false;
	}

	let text = format!("{} {} {}", record.name, record.description, record.properties);

	sizes.iter().all(|size| text.contains(size.as_str()))
}

/// Lower-cased words with quantity and glue vocabulary (`of`, `boxes`, `ft`) dropped.
/// Size tokens such as `3/4` stay.
fn normalize_name(text: &str) -> String {
	text.split_whitespace()
		.map(|word| word.trim_matches(|ch: char| matches!(ch, ',' | ';' | ':' | '(' | ')')))
		.filter(|word| !word.is_empty() && !line_item::is_quantity_word(word))
		.collect::<Vec<_>>()
		.join(" ")
		.to_lowercase()
}

fn into_resolution(result: Result<String, UnresolvedReason>) -> CodeResolution {
	match result {
		Ok(code) => CodeResolution::Resolved(code),
		Err(reason) => CodeResolution::Unresolved(reason),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn record(code: Option<&str>, template: Option<&str>, notes: &str) -> CatalogRecord {
		CatalogRecord {
			id: "r1".to_string(),
			name: "Flex Conduit".to_string(),
			code: code.map(str::to_string),
			code_template: template.map(str::to_string),
			special_notes: notes.to_string(),
			..Default::default()
		}
	}

	#[test]
	fn finds_template_inside_prose() {
		let notes = "Build the code as =165(COLOR)4A. Colors GREEN: GR, BLUE: BL";

		assert_eq!(find_notes_template(notes).as_deref(), Some("=165(COLOR)4A"));
	}

	fn named(id: &str, name: &str) -> Candidate {
		let record = CatalogRecord {
			id: id.to_string(),
			name: name.to_string(),
			code: Some(id.to_uppercase()),
			..Default::default()
		};

		Candidate::lexical(record, 0)
	}

	#[test]
	fn mapping_ignores_lowercase_prose() {
		let mapping = ValueMapping::parse("use GREEN: GR or BLUE: BL; note: call first");

		assert_eq!(mapping.get("green"), Some("GR"));
		assert_eq!(mapping.get("BLUE"), Some("BL"));
		assert_eq!(mapping.get("note"), None);
	}

	#[test]
	fn mapping_accepts_title_case_keys() {
		let mapping = ValueMapping::parse("Green: GR, Blue: BL");

		assert_eq!(mapping.get("GREEN"), Some("GR"));
		assert_eq!(mapping.get("blue"), Some("BL"));
	}

	#[test]
	fn exact_name_wins_after_glue_words() {
		let candidates = vec![named("conn", "EMT Conduit Connector"), named("emt", "EMT Conduit")];

		for text in ["10 EMT Conduit", "200' of EMT Conduit", "2 cuts of 100' of EMT Conduit"] {
			let attrs = RequestedAttributes::from_text(text);
			let selected = select_candidate(&candidates, text, &attrs, 0.7);

			assert_eq!(selected.map(Candidate::id), Some("emt"), "{text}");
		}
	}

	#[test]
	fn exact_name_keeps_size_tokens() {
		let candidates = vec![named("half", "1/2 EMT Conduit"), named("three", "3/4 EMT Conduit")];
		let text = "200' of 3/4 EMT Conduit";
		let attrs = RequestedAttributes::from_text(text);

		assert_eq!(
			select_candidate(&candidates, text, &attrs, 0.7).map(Candidate::id),
			Some("three")
		);
	}

	#[test]
	fn sentinel_without_notes_template_is_unresolved() {
		let attrs = RequestedAttributes::from_text("flex");
		let resolution = resolve_code(&record(Some("template"), None, "ask"), &attrs);

		assert_eq!(resolution, CodeResolution::Unresolved(UnresolvedReason::MissingTemplate));
	}

	#[test]
	fn missing_size_leaves_code_unresolved() {
		let attrs = RequestedAttributes::from_text("junction box");
		let resolution = resolve_code(&record(None, Some("=ASE(DIM)X(DIM)"), ""), &attrs);

		assert_eq!(
			resolution,
			CodeResolution::Unresolved(UnresolvedReason::MissingValue {
				placeholder: "DIM".to_string()
			})
		);
	}
}
