pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Configuration error: {message}")]
	Configuration { message: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Catalog source unavailable: {message}")]
	SourceUnavailable { message: String },
	#[error("Embedding error: {message}")]
	Embedding { message: String },
	#[error("Retrieval error: {message}")]
	Retrieval { message: String },
	#[error("Reasoning error: {message}")]
	Reasoning { message: String },
	#[error("Request timed out after {timeout_ms} ms.")]
	Timeout { timeout_ms: u64 },
	#[error("Task error: {message}")]
	Task { message: String },
}
impl Error {
	/// Failures the lexical path can stand in for.
	pub fn is_semantic_failure(&self) -> bool {
		matches!(self, Self::Embedding { .. } | Self::Retrieval { .. })
	}
}

impl From<gbid_config::Error> for Error {
	fn from(err: gbid_config::Error) -> Self {
		Self::Configuration { message: err.to_string() }
	}
}

impl From<tokio::task::JoinError> for Error {
	fn from(err: tokio::task::JoinError) -> Self {
		Self::Task { message: err.to_string() }
	}
}
