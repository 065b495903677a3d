use serde::{Deserialize, Serialize};

use crate::catalog::CatalogRecord;

/// A retrieved catalog record, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
	pub record: CatalogRecord,
	/// Vector similarity in `[0, 1]`; `None` for lexical hits.
	pub score: Option<f32>,
	/// Index of the line item that retrieved this record.
	pub origin: usize,
}
impl Candidate {
	pub fn lexical(record: CatalogRecord, origin: usize) -> Self {
		Self { record, score: None, origin }
	}

	pub fn semantic(record: CatalogRecord, score: f32, origin: usize) -> Self {
		Self { record, score: Some(score.clamp(0.0, 1.0)), origin }
	}

	pub fn id(&self) -> &str {
		&self.record.id
	}
}
