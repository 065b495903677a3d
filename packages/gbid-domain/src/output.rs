use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static SEPARATOR: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\t+|\s*\|\s*|\s{2,}").expect("separator pattern must compile"));

const MAX_CODE_CHARS: usize = 64;

/// One output line: catalog code and normalized quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLine {
	pub code: String,
	pub quantity: u64,
}
impl ResolvedLine {
	pub fn new(code: impl Into<String>, quantity: u64) -> Self {
		Self { code: code.into(), quantity }
	}

	/// The unresolved sentinel line, always quantity 1.
	pub fn no_bid(code: &str) -> Self {
		Self::new(code, 1)
	}

	pub fn render(&self) -> String {
		format!("{}\t{}", self.code, self.quantity)
	}
}

/// A reasoning reply split into list lines and trailing notes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedOutput {
	pub lines: Vec<ResolvedLine>,
	pub notes: Vec<String>,
}

/// Reads `code<TAB>quantity` lines from a free-form reply.
///
/// Tabs, pipes and runs of two or more spaces are accepted as separators. Prose before the
/// list and everything after the first non-list line following it become notes, so a
/// malformed line never ends up in `lines`.
pub fn parse_reasoning_output(reply: &str) -> ParsedOutput {
	let mut parsed = ParsedOutput::default();
	let mut in_notes = false;

	for raw in reply.lines() {
		let line = raw.trim();

		if line.is_empty() || line.starts_with("```") {
			continue;
		}
		if in_notes {
			parsed.notes.push(line.to_string());

			continue;
		}

		let stripped = strip_bullet(line);

		if let Some(resolved) = parse_line(stripped) {
			parsed.lines.push(resolved);

			continue;
		}
		if parsed.lines.is_empty() && (is_header(stripped) || is_table_rule(stripped)) {
			continue;
		}
		if !parsed.lines.is_empty() {
			in_notes = true;
		}

		parsed.notes.push(line.to_string());
	}

	parsed
}

/// Lines first, then a blank line and the notes when there are any.
pub fn render_output(lines: &[ResolvedLine], notes: &[String]) -> String {
	let mut out = lines.iter().map(ResolvedLine::render).collect::<Vec<_>>().join("\n");

	if !notes.is_empty() {
		if !out.is_empty() {
			out.push_str("\n\n");
		}

		out.push_str(&notes.join("\n"));
	}

	out
}

fn parse_line(line: &str) -> Option<ResolvedLine> {
	let line = line.trim_matches('|').trim();
	let mut fields = SEPARATOR.splitn(line, 2);
	let (code, quantity) = match (fields.next(), fields.next()) {
		(Some(code), Some(quantity)) => (code.trim(), quantity.trim()),
		// With single spaces only, the last token is the quantity. Codes of several words
		// (`NO BID`) carry no lower-case letters, which keeps prose out.
		_ => {
			let (code, quantity) = line.rsplit_once(char::is_whitespace)?;
			let code = code.trim();

			if code.contains(char::is_whitespace) && code.chars().any(|ch| ch.is_lowercase()) {
				return None;
			}

			(code, quantity)
		},
	};

	if code.is_empty() || code.chars().count() > MAX_CODE_CHARS || code.contains(':') {
		return None;
	}

	let quantity = quantity.trim_end_matches('|').trim().parse::<u64>().ok()?;

	Some(ResolvedLine::new(code, quantity))
}

fn strip_bullet(line: &str) -> &str {
	for marker in ["- ", "* ", "• "] {
		if let Some(rest) = line.strip_prefix(marker) {
			return rest.trim();
		}
	}

	let digits = line.chars().take_while(char::is_ascii_digit).count();
	let after = &line[digits..];

	if digits > 0
		&& let Some(rest) = after.strip_prefix(". ").or_else(|| after.strip_prefix(") "))
	{
		return rest.trim();
	}

	line
}

fn is_header(line: &str) -> bool {
	let upper = line.to_ascii_uppercase();
	let words: Vec<&str> = upper
		.split(|ch: char| ch.is_whitespace() || ch == '|')
		.filter(|word| !word.is_empty())
		.collect();

	matches!(
		words.as_slice(),
		["GBID" | "CODE"]
			| ["GBID" | "CODE", "QTY" | "QUANTITY"]
			| ["ITEM", "CODE", "QTY" | "QUANTITY"]
	)
}

fn is_table_rule(line: &str) -> bool {
	line.contains('-') && line.chars().all(|ch| matches!(ch, '-' | '|' | ':' | ' '))
}
