use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry of the external product catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
	pub id: String,
	pub name: String,
	pub code: Option<String>,
	pub code_template: Option<String>,
	pub description: String,
	pub properties: String,
	pub alternate_names: String,
	pub special_notes: String,
	/// Columns that do not map onto a known field, keyed by their original header.
	#[serde(default)]
	pub extra: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
	Id,
	Name,
	Code,
	CodeTemplate,
	Description,
	Properties,
	AlternateNames,
	SpecialNotes,
}

/// Parsed catalog plus the lower-cased row text used by the lexical scorer.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
	pub records: Vec<CatalogRecord>,
	pub rows: Vec<String>,
}

impl CatalogRecord {
	/// Builds a record from `(header, value)` pairs. `fallback_id` is used when no id column
	/// is present or the id cell is blank.
	pub fn from_fields<'a, I>(fields: I, fallback_id: impl FnOnce() -> String) -> Self
	where
		I: IntoIterator<Item = (&'a str, &'a str)>,
	{
		let mut record = Self::default();

		for (header, value) in fields {
			let value = value.trim();

			match classify_header(header) {
				Some(RecordField::Id) => record.id = value.to_string(),
				Some(RecordField::Name) if record.name.is_empty() => {
					record.name = value.to_string()
				},
				Some(RecordField::Code) => record.code = non_empty(value),
				Some(RecordField::CodeTemplate) => record.code_template = non_empty(value),
				Some(RecordField::Description) => record.description = value.to_string(),
				Some(RecordField::Properties) => record.properties = value.to_string(),
				Some(RecordField::AlternateNames) => record.alternate_names = value.to_string(),
				Some(RecordField::SpecialNotes) => record.special_notes = value.to_string(),
				Some(RecordField::Name) | None => {
					if !value.is_empty() {
						record.extra.insert(header.trim().to_string(), value.to_string());
					}
				},
			}
		}

		if record.id.is_empty() {
			record.id = fallback_id();
		}

		record
	}

	/// Builds a record from vector-index metadata. Non-string scalars are rendered as text.
	pub fn from_metadata(id: &str, metadata: &Map<String, Value>) -> Self {
		let rendered: Vec<(&str, String)> = metadata
			.iter()
			.filter_map(|(key, value)| metadata_text(value).map(|text| (key.as_str(), text)))
			.collect();

		Self::from_fields(
			rendered.iter().map(|(key, text)| (*key, text.as_str())),
			|| id.to_string(),
		)
	}

	/// Reads a projectable column: a known field name or `extra.<header>`.
	pub fn field(&self, column: &str) -> Option<&str> {
		match column {
			"id" => Some(&self.id),
			"name" => Some(&self.name),
			"code" => self.code.as_deref(),
			"code_template" => self.code_template.as_deref(),
			"description" => Some(&self.description),
			"properties" => Some(&self.properties),
			"alternate_names" => Some(&self.alternate_names),
			"special_notes" => Some(&self.special_notes),
			other => other.strip_prefix("extra.").and_then(|key| {
				self.extra
					.iter()
					.find(|(header, _)| header.eq_ignore_ascii_case(key))
					.map(|(_, value)| value.as_str())
			}),
		}
	}

	/// Lower-cased name and alias text, the identity signal used for type matching.
	pub fn identity_text(&self) -> String {
		format!("{} {}", self.name, self.alternate_names).to_lowercase()
	}
}

impl Catalog {
	pub fn parse(text: &str) -> Self {
		let mut table = parse_csv(text).into_iter();
		let Some(header) = table.next() else { return Self::default() };
		let mut catalog = Self::default();

		for (ordinal, row) in table.enumerate() {
			if row.iter().all(|cell| cell.trim().is_empty()) {
				continue;
			}

			let record = CatalogRecord::from_fields(
				header.iter().map(String::as_str).zip(row.iter().map(String::as_str)),
				|| format!("row-{}", ordinal + 1),
			);

			catalog.rows.push(row.join(",").to_lowercase());
			catalog.records.push(record);
		}

		catalog
	}

	pub fn len(&self) -> usize {
		self.records.len()
	}

	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}
}

pub fn classify_header(header: &str) -> Option<RecordField> {
	let normalized = header
		.trim()
		.to_lowercase()
		.replace(['_', '-'], " ")
		.split_whitespace()
		.collect::<Vec<_>>()
		.join(" ");

	let field = match normalized.as_str() {
		"id" | "record id" | "item id" => RecordField::Id,
		"name" | "product name" | "item name" | "item" | "product" | "material" => {
			RecordField::Name
		},
		"gbid" | "code" | "catalog code" | "item code" => RecordField::Code,
		"gbid template" | "code template" | "template" => RecordField::CodeTemplate,
		"description" | "desc" => RecordField::Description,
		"properties" | "property" | "attributes" | "specs" => RecordField::Properties,
		"alternate names" | "alternate name" | "alt names" | "aliases" | "alias" => {
			RecordField::AlternateNames
		},
		"special notes" | "special note" | "notes" => RecordField::SpecialNotes,
		_ => return None,
	};

	Some(field)
}

/// RFC 4180 reader: quoted fields, doubled quotes, embedded delimiters and newlines.
pub fn parse_csv(text: &str) -> Vec<Vec<String>> {
	let mut rows = Vec::new();
	let mut row = Vec::new();
	let mut field = String::new();
	let mut in_quotes = false;
	let mut chars = text.trim_start_matches('\u{FEFF}').chars().peekable();

	while let Some(ch) = chars.next() {
		if in_quotes {
			match ch {
				'"' if chars.peek() == Some(&'"') => {
					field.push('"');
					chars.next();
				},
				'"' => in_quotes = false,
				_ => field.push(ch),
			}

			continue;
		}

		match ch {
			'"' if field.is_empty() => in_quotes = true,
			',' => row.push(std::mem::take(&mut field)),
			'\r' if chars.peek() == Some(&'\n') => {},
			'\n' | '\r' => {
				row.push(std::mem::take(&mut field));
				rows.push(std::mem::take(&mut row));
			},
			_ => field.push(ch),
		}
	}

	if !field.is_empty() || !row.is_empty() {
		row.push(field);
		rows.push(row);
	}

	rows
}

fn non_empty(value: &str) -> Option<String> {
	if value.is_empty() { None } else { Some(value.to_string()) }
}

fn metadata_text(value: &Value) -> Option<String> {
	match value {
		Value::String(text) => Some(text.clone()),
		Value::Number(number) => Some(number.to_string()),
		Value::Bool(flag) => Some(flag.to_string()),
		Value::Array(items) => Some(
			items.iter().filter_map(metadata_text).collect::<Vec<_>>().join(", "),
		),
		Value::Null | Value::Object(_) => None,
	}
}
