use std::{ops::Range, sync::LazyLock};

use regex::{Captures, Regex};

static LENGTHS: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"(?i)\b(\d+)\s*(?:(?:cuts?|rolls?|pcs?|pieces?|lengths?|spools?|reels?|coils?)\s*(?:of|x|×|@|at)?|x|×|@)\s*(\d+(?:\.\d+)?)\s*(?:'|ft\b|feet\b|foot\b|lf\b)",
	)
	.expect("lengths pattern must compile")
});
static LENGTHS_REVERSED: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"(?i)\b(\d+(?:\.\d+)?)\s*(?:'|ft\b|feet\b|foot\b|lf\b)\s*(?:x|×|@)?\s*(\d+)\s*(?:cuts?|rolls?|pcs?|pieces?|lengths?|spools?|reels?|coils?)\b",
	)
	.expect("reversed lengths pattern must compile")
});
static CONTAINERS: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)\b(\d+)\s*(?:boxes|box|bx|cases?|cartons?|packs?|pkgs?|bags?)\b")
		.expect("containers pattern must compile")
});
static FOOTAGE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:'|ft\b|feet\b|foot\b|lf\b)")
		.expect("footage pattern must compile")
});
static QTY_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)\b(?:qty|quantity)\s*[:=]?\s*(\d+)\b").expect("qty pattern must compile")
});
static EACH_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)\b(\d+)\s*(?:ea|each|pcs|pc|pieces)\b").expect("each pattern must compile")
});
static LEADING_COUNT: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^\s*(\d+)(?:\s*[x×])?\s+([^\s]*)").expect("leading count pattern must compile")
});
static TRAILING_COUNT: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)\s[x×]\s*(\d+)\s*$").expect("trailing count pattern must compile")
});
static PER_CONTAINER: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"(?i)(\d+)\s*(?:/|per|an?|each|in\s+an?|in\s+each)\s*(?:box|bx|case|carton|pack|pkg|bag)\b",
	)
	.expect("per container pattern must compile")
});
static CONTAINER_OF: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"(?i)\b(?:box|bx|case|carton|pack|pkg|bag)\s*(?:of|qty|quantity|count)?\s*[:=]?\s*(\d+)\b",
	)
	.expect("container of pattern must compile")
});

/// Units that make a leading number a size rather than a count (`12 AWG`, `4 in`).
const SIZE_UNITS: [&str; 12] =
	["awg", "ga", "gauge", "in", "inch", "\"", "mm", "amp", "amps", "a", "v", "volt"];

/// A recognised quantity phrase inside a line item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuantityExpr {
	/// `200'`, `150 ft`.
	Footage { feet: f64 },
	/// `2 cuts of 400'`, `2 rolls × 500'`.
	Lengths { count: u64, length: f64 },
	/// `3 boxes`; multiplied by the per-container count from the record's properties.
	Containers { count: u64 },
	/// `10 connectors`, `qty 10`, `10 ea`.
	Count { count: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityOutcome {
	Parsed(u64),
	/// No quantity could be read; renders as 1.
	Unparsed,
}
impl QuantityOutcome {
	pub fn value(self) -> u64 {
		match self {
			Self::Parsed(value) => value,
			Self::Unparsed => 1,
		}
	}

	pub fn is_parsed(self) -> bool {
		matches!(self, Self::Parsed(_))
	}
}

pub fn parse_quantity_expr(text: &str) -> Option<QuantityExpr> {
	locate(text).map(|(expr, _)| expr)
}

/// Byte range of the quantity phrase, so callers can strip it before reading sizes.
pub fn quantity_span(text: &str) -> Option<Range<usize>> {
	locate(text).map(|(_, span)| span)
}

/// Removes the quantity phrase from `text`.
pub fn strip_quantity(text: &str) -> String {
	match quantity_span(text) {
		Some(span) => format!("{} {}", &text[..span.start], &text[span.end..]).trim().to_string(),
		None => text.trim().to_string(),
	}
}

pub fn normalize_quantity(expr: &QuantityExpr, properties: &str) -> u64 {
	match *expr {
		QuantityExpr::Footage { feet } => round_up(feet),
		QuantityExpr::Lengths { count, length } => round_up(count as f64 * length),
		QuantityExpr::Containers { count } => match per_container_count(properties) {
			Some(per) => count.saturating_mul(per),
			None => count,
		},
		QuantityExpr::Count { count } => count,
	}
}

pub fn quantity_for(text: &str, properties: &str) -> QuantityOutcome {
	match parse_quantity_expr(text) {
		Some(expr) => QuantityOutcome::Parsed(normalize_quantity(&expr, properties)),
		None => QuantityOutcome::Unparsed,
	}
}

/// Reads a per-container count such as `24 per box`, `100/box` or `Box of 50`.
pub fn per_container_count(properties: &str) -> Option<u64> {
	PER_CONTAINER
		.captures(properties)
		.or_else(|| CONTAINER_OF.captures(properties))
		.and_then(|caps| caps.get(1))
		.and_then(|m| m.as_str().parse::<u64>().ok())
		.filter(|count| *count > 0)
}

fn locate(text: &str) -> Option<(QuantityExpr, Range<usize>)> {
	if let Some(caps) = LENGTHS.captures(text)
		&& let (Some(count), Some(length)) = (capture_u64(&caps, 1), capture_f64(&caps, 2))
	{
		return Some((QuantityExpr::Lengths { count, length }, span(&caps)));
	}
	if let Some(caps) = LENGTHS_REVERSED.captures(text)
		&& let (Some(length), Some(count)) = (capture_f64(&caps, 1), capture_u64(&caps, 2))
	{
		return Some((QuantityExpr::Lengths { count, length }, span(&caps)));
	}
	if let Some(caps) = CONTAINERS.captures(text)
		&& let Some(count) = capture_u64(&caps, 1)
	{
		return Some((QuantityExpr::Containers { count }, span(&caps)));
	}

	for caps in FOOTAGE.captures_iter(text) {
		let whole = span(&caps);

		if part_of_fraction(text, whole.start) {
			continue;
		}
		if let Some(feet) = capture_f64(&caps, 1) {
			return Some((QuantityExpr::Footage { feet }, whole));
		}
	}

	for pattern in [&*QTY_KEYWORD, &*EACH_SUFFIX, &*TRAILING_COUNT] {
		if let Some(caps) = pattern.captures(text)
			&& let Some(count) = capture_u64(&caps, 1)
		{
			return Some((QuantityExpr::Count { count }, span(&caps)));
		}
	}

	let caps = LEADING_COUNT.captures(text)?;
	let next = caps.get(2).map(|m| m.as_str().to_lowercase()).unwrap_or_default();

	if next.starts_with('/') || SIZE_UNITS.contains(&next.as_str()) {
		return None;
	}

	let count = capture_u64(&caps, 1)?;
	let end = caps.get(2).map(|m| m.start()).unwrap_or(text.len());

	Some((QuantityExpr::Count { count }, 0..end))
}

fn part_of_fraction(text: &str, start: usize) -> bool {
	text[..start].chars().next_back().map(|ch| ch == '/' || ch == '-').unwrap_or(false)
}

fn span(caps: &Captures<'_>) -> Range<usize> {
	caps.get(0).map(|m| m.range()).unwrap_or(0..0)
}

fn capture_u64(caps: &Captures<'_>, index: usize) -> Option<u64> {
	caps.get(index).and_then(|m| m.as_str().parse().ok())
}

fn capture_f64(caps: &Captures<'_>, index: usize) -> Option<f64> {
	caps.get(index).and_then(|m| m.as_str().parse().ok()).filter(|value: &f64| value.is_finite())
}

fn round_up(value: f64) -> u64 {
	if value <= 0.0 { 0 } else { value.ceil() as u64 }
}
