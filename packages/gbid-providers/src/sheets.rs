use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::{Error, Result};

/// Downloads the catalog sheet as CSV text.
pub async fn fetch_catalog_text(cfg: &gbid_config::Catalog, sheet_id: &str) -> Result<String> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let res = client.get(export_url(cfg, sheet_id)).send().await?;
	let status = res.status();

	if !status.is_success() {
		return Err(Error::UnexpectedStatus {
			status: status.as_u16(),
			message: status_message(status),
		});
	}

	Ok(res.text().await?)
}

pub fn export_url(cfg: &gbid_config::Catalog, sheet_id: &str) -> String {
	cfg.export_url_template.replace("{sheet_id}", sheet_id).replace("{gid}", &cfg.gid)
}

pub fn status_message(status: StatusCode) -> String {
	match status {
		StatusCode::NOT_FOUND => {
			"Sheet not found. Make sure the sheet is public and the ID is correct.".to_string()
		},
		StatusCode::FORBIDDEN => {
			"Access denied. Make sure the sheet is set to \"Anyone with the link can view\"."
				.to_string()
		},
		other => format!("Failed to fetch sheet: {other}"),
	}
}
