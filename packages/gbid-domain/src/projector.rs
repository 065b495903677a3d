use std::borrow::Cow;

use crate::candidate::Candidate;

const DELIMITER: char = ',';
const QUOTE: char = '"';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionSpec {
	pub columns: Vec<String>,
	/// Values longer than this are clipped while the table is built.
	pub max_field_chars: usize,
}

/// Compact tabular view of the candidate set handed to the reasoning step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectedTable {
	pub header: Vec<String>,
	pub rows: Vec<Vec<String>>,
}
impl ProjectedTable {
	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	/// Header line then one line per row; fields escaped with [`escape_field`].
	pub fn to_text(&self) -> String {
		let mut out = String::new();

		push_line(&mut out, &self.header);

		for row in &self.rows {
			out.push('\n');
			push_line(&mut out, row);
		}

		out
	}
}

pub fn project(candidates: &[Candidate], spec: &ProjectionSpec) -> ProjectedTable {
	let rows = candidates
		.iter()
		.map(|candidate| {
			spec.columns
				.iter()
				.map(|column| {
					let value = candidate.record.field(column).unwrap_or_default();

					clip(value, spec.max_field_chars)
				})
				.collect()
		})
		.collect();

	ProjectedTable { header: spec.columns.clone(), rows }
}

/// Quotes a value (doubling inner quotes) when it holds the delimiter, a quote or a line
/// break; otherwise returns it unchanged.
pub fn escape_field(value: &str) -> Cow<'_, str> {
	if !value.contains([DELIMITER, QUOTE, '\n', '\r']) {
		return Cow::Borrowed(value);
	}

	let mut escaped = String::with_capacity(value.len() + 2);

	escaped.push(QUOTE);

	for ch in value.chars() {
		if ch == QUOTE {
			escaped.push(QUOTE);
		}

		escaped.push(ch);
	}

	escaped.push(QUOTE);

	Cow::Owned(escaped)
}

fn push_line(out: &mut String, fields: &[String]) {
	for (index, field) in fields.iter().enumerate() {
		if index > 0 {
			out.push(DELIMITER);
		}

		out.push_str(&escape_field(field));
	}
}

fn clip(value: &str, max_chars: usize) -> String {
	match value.char_indices().nth(max_chars) {
		Some((end, _)) => value[..end].to_string(),
		None => value.to_string(),
	}
}
