pub mod embedding;
pub mod error;
pub mod qdrant;
pub mod reasoning;
pub mod sheets;
pub mod vector_index;

pub use error::{Error, Result};

use reqwest::{
	Response,
	header::{AUTHORIZATION, HeaderMap, HeaderName},
};
use serde_json::{Map, Value};

use gbid_config::AuthScheme;

const MAX_ERROR_BODY_CHARS: usize = 512;

pub fn auth_headers(
	scheme: AuthScheme,
	api_key: &str,
	default_headers: &Map<String, Value>,
) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	match scheme {
		AuthScheme::Bearer => {
			headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);
		},
		AuthScheme::XApiKey => {
			headers.insert(HeaderName::from_static("x-api-key"), api_key.parse()?);
		},
		AuthScheme::ApiKey => {
			headers.insert(HeaderName::from_static("api-key"), api_key.parse()?);
		},
	}

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

/// Passes successful responses through; otherwise reads the body into an
/// [`Error::UnexpectedStatus`] prefixed with `context`.
pub(crate) async fn check_status(res: Response, context: &str) -> Result<Response> {
	let status = res.status();

	if status.is_success() {
		return Ok(res);
	}

	let body = res.text().await.unwrap_or_default();
	let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();

	Err(Error::UnexpectedStatus {
		status: status.as_u16(),
		message: format!("{context} failed with status {status}: {body}"),
	})
}
