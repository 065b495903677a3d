use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use gbid_service::{ConvertRequest, ConvertResponse, Error, IndexStats, SheetRequest, SheetResponse};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/convert", post(convert))
		.route("/v1/sheets", post(fetch_sheet))
		.route("/v1/index/stats", get(index_stats))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn convert(
	State(state): State<AppState>,
	Json(payload): Json<ConvertRequest>,
) -> Result<Json<ConvertResponse>, ApiError> {
	let response = state.service.convert(payload).await?;

	Ok(Json(response))
}

async fn fetch_sheet(
	State(state): State<AppState>,
	Json(payload): Json<SheetRequest>,
) -> Result<Json<SheetResponse>, ApiError> {
	let response = state.service.fetch_sheet(payload).await?;

	Ok(Json(response))
}

async fn index_stats(State(state): State<AppState>) -> Result<Json<IndexStats>, ApiError> {
	let response = state.service.index_stats().await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}

pub fn json_error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
	ApiError::new(status, code, message)
}

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		let (status, code) = match &err {
			Error::InvalidRequest { .. } => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
			Error::SourceUnavailable { .. } => {
				(StatusCode::FAILED_DEPENDENCY, "SOURCE_UNAVAILABLE")
			},
			Error::Embedding { .. } => (StatusCode::FAILED_DEPENDENCY, "EMBEDDING_FAILED"),
			Error::Retrieval { .. } => (StatusCode::FAILED_DEPENDENCY, "RETRIEVAL_FAILED"),
			Error::Reasoning { .. } => (StatusCode::FAILED_DEPENDENCY, "REASONING_FAILED"),
			Error::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
			Error::Configuration { .. } => {
				(StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR")
			},
			Error::Task { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
		};

		if status.is_server_error() {
			tracing::error!(error = %err, "Request failed.");
		} else {
			tracing::warn!(error = %err, "Request rejected.");
		}

		json_error(status, code, err.to_string())
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
