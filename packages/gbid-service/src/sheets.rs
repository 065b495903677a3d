use serde::{Deserialize, Serialize};

use gbid_domain::catalog::Catalog;

use crate::{Error, GbidService, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct SheetRequest {
	pub sheet_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SheetResponse {
	pub sheet_id: String,
	pub csv_data: String,
	/// Non-empty text lines, header included.
	pub row_count: usize,
	pub record_count: usize,
}

impl GbidService {
	/// Fetches the raw catalog sheet and reports its size.
	pub async fn fetch_sheet(&self, req: SheetRequest) -> Result<SheetResponse> {
		let sheet_id = validate_sheet_id(&req.sheet_id)?;
		let csv_data = self.catalog_text(sheet_id).await?;
		let row_count = csv_data.lines().filter(|line| !line.trim().is_empty()).count();
		let record_count = Catalog::parse(&csv_data).len();

		tracing::info!(sheet_id, row_count, record_count, "Catalog sheet fetched.");

		Ok(SheetResponse { sheet_id: sheet_id.to_string(), csv_data, row_count, record_count })
	}

	pub(crate) async fn load_catalog(&self, sheet_id: &str) -> Result<Catalog> {
		let text = self.catalog_text(sheet_id).await?;
		let catalog = Catalog::parse(&text);

		tracing::info!(sheet_id, records = catalog.len(), "Catalog loaded.");

		Ok(catalog)
	}

	async fn catalog_text(&self, sheet_id: &str) -> Result<String> {
		self.providers.catalog.fetch_catalog_text(&self.cfg.catalog, sheet_id).await
	}
}

/// Sheet ids are URL path segments; only `[A-Za-z0-9_-]` is accepted.
pub fn validate_sheet_id(raw: &str) -> Result<&str> {
	let sheet_id = raw.trim();

	if sheet_id.is_empty() {
		return Err(Error::InvalidRequest { message: "sheet_id is required.".to_string() });
	}
	if !sheet_id.chars().all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_')) {
		return Err(Error::InvalidRequest {
			message: "sheet_id may only contain letters, digits, '-' and '_'.".to_string(),
		});
	}

	Ok(sheet_id)
}
