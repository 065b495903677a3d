use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Words that describe quantities or glue rather than the product itself.
pub const QUANTITY_WORDS: [&str; 36] = [
	"of", "cut", "cuts", "roll", "rolls", "box", "boxes", "bx", "case", "cases", "carton",
	"cartons", "pack", "packs", "ft", "feet", "foot", "lf", "ea", "each", "pc", "pcs", "piece",
	"pieces", "qty", "quantity", "x", "per", "and", "the", "a", "an", "with", "for", "need",
	"please",
];

/// One distinct material request taken from the raw input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
	/// Position in the original request.
	pub index: usize,
	pub text: String,
}

pub fn is_quantity_word(word: &str) -> bool {
	QUANTITY_WORDS.iter().any(|candidate| candidate.eq_ignore_ascii_case(word))
}

/// Alphabetic words of `text` in order, quantity vocabulary removed.
pub fn descriptive_words(text: &str) -> Vec<&str> {
	text.split(|ch: char| ch.is_whitespace() || matches!(ch, ',' | ';' | '(' | ')' | ':'))
		.map(|word| word.trim_matches(|ch: char| !ch.is_alphanumeric()))
		.filter(|word| !word.is_empty())
		.filter(|word| word.chars().all(char::is_alphabetic))
		.filter(|word| !is_quantity_word(word))
		.collect()
}

/// Splits a request on newlines, semicolons and list markers.
pub fn split_line_items(request: &str, max_items: usize) -> Vec<LineItem> {
	request
		.split(['\n', ';'])
		.map(strip_list_marker)
		.filter(|text| !text.is_empty())
		.take(max_items)
		.enumerate()
		.map(|(index, text)| LineItem { index, text: text.to_string() })
		.collect()
}

/// Reads the decomposition reply of the reasoning service: a JSON array of strings (or of
/// objects with a `text`/`item` field) anywhere in the reply, else one item per line.
pub fn parse_item_list(reply: &str, max_items: usize) -> Vec<LineItem> {
	if let Some(items) = parse_json_items(reply) {
		return items
			.into_iter()
			.map(|text| text.trim().to_string())
			.filter(|text| !text.is_empty())
			.take(max_items)
			.enumerate()
			.map(|(index, text)| LineItem { index, text })
			.collect();
	}

	reply
		.lines()
		.filter(|line| !line.trim_start().starts_with("```"))
		.map(strip_list_marker)
		.filter(|text| !text.is_empty())
		.take(max_items)
		.enumerate()
		.map(|(index, text)| LineItem { index, text: text.to_string() })
		.collect()
}

fn parse_json_items(reply: &str) -> Option<Vec<String>> {
	let start = reply.find('[')?;
	let end = reply.rfind(']')?;

	if end <= start {
		return None;
	}

	let parsed: Vec<Value> = serde_json::from_str(&reply[start..=end]).ok()?;
	let items = parsed
		.into_iter()
		.filter_map(|value| match value {
			Value::String(text) => Some(text),
			Value::Object(map) => map
				.get("text")
				.or_else(|| map.get("item"))
				.and_then(Value::as_str)
				.map(str::to_string),
			_ => None,
		})
		.collect::<Vec<_>>();

	if items.is_empty() { None } else { Some(items) }
}

fn strip_list_marker(line: &str) -> &str {
	let trimmed = line.trim();

	for marker in ["- ", "* ", "• "] {
		if let Some(rest) = trimmed.strip_prefix(marker) {
			return rest.trim();
		}
	}

	let digits = trimmed.chars().take_while(char::is_ascii_digit).count();

	if digits > 0 {
		let rest = &trimmed[digits..];

		if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
			return rest.trim();
		}
	}

	trimmed
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn splits_lists_and_keeps_order() {
		let items = split_line_items("1. 200' 1/2 EMT\n- 3 boxes wire nuts; 10 connectors\n\n", 10);
		let texts: Vec<&str> = items.iter().map(|item| item.text.as_str()).collect();

		assert_eq!(texts, vec!["200' 1/2 EMT", "3 boxes wire nuts", "10 connectors"]);
		assert_eq!(items[2].index, 2);
	}

	#[test]
	fn counts_are_not_list_markers() {
		let items = split_line_items("2 cuts of 400' of 3/4 EMT", 10);

		assert_eq!(items.len(), 1);
		assert_eq!(items[0].text, "2 cuts of 400' of 3/4 EMT");
	}

	#[test]
	fn reads_json_array_inside_prose() {
		let reply = "Here are the items:\n[\"200' 1/2 EMT\", {\"text\": \"3 boxes wire nuts\"}]\n";
		let items = parse_item_list(reply, 10);

		assert_eq!(items.len(), 2);
		assert_eq!(items[1].text, "3 boxes wire nuts");
	}

	#[test]
	fn descriptive_words_skip_numbers_and_units() {
		assert_eq!(descriptive_words("2 cuts of 400' of 3/4 EMT"), vec!["EMT"]);
	}
}
