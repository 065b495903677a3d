use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::{Map, Value};

use gbid_config::{VectorIndexBackend, VectorIndexConfig};

use crate::{Error, Result};

/// One nearest-neighbour hit with the record metadata stored next to the vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexMatch {
	pub id: String,
	pub score: f32,
	pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndexStats {
	pub backend: String,
	pub total_vector_count: u64,
	pub dimension: Option<u32>,
	pub index_fullness: Option<f64>,
}

pub async fn search(
	cfg: &VectorIndexConfig,
	vector: &[f32],
	top_k: u32,
) -> Result<Vec<IndexMatch>> {
	match cfg.backend {
		VectorIndexBackend::Pinecone => pinecone_query(cfg, vector, top_k).await,
		VectorIndexBackend::Qdrant => crate::qdrant::search(cfg, vector, top_k).await,
	}
}

pub async fn stats(cfg: &VectorIndexConfig) -> Result<IndexStats> {
	match cfg.backend {
		VectorIndexBackend::Pinecone => pinecone_stats(cfg).await,
		VectorIndexBackend::Qdrant => crate::qdrant::stats(cfg).await,
	}
}

async fn pinecone_query(
	cfg: &VectorIndexConfig,
	vector: &[f32],
	top_k: u32,
) -> Result<Vec<IndexMatch>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}/query", cfg.url.trim_end_matches('/'));
	let mut body = serde_json::json!({
		"vector": vector,
		"topK": top_k,
		"includeMetadata": true,
		"includeValues": false,
	});

	if let Some(namespace) = cfg.collection.as_deref() {
		body["namespace"] = Value::String(namespace.to_string());
	}

	let res = client
		.post(url)
		.headers(crate::auth_headers(cfg.auth, &cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = crate::check_status(res, "Vector index query").await?.json().await?;

	parse_query_response(json)
}

async fn pinecone_stats(cfg: &VectorIndexConfig) -> Result<IndexStats> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}/describe_index_stats", cfg.url.trim_end_matches('/'));
	let res = client
		.post(url)
		.headers(crate::auth_headers(cfg.auth, &cfg.api_key, &cfg.default_headers)?)
		.json(&serde_json::json!({}))
		.send()
		.await?;
	let json: Value = crate::check_status(res, "Vector index stats").await?.json().await?;

	Ok(parse_stats_response(json))
}

/// Reads `matches[]`; a missing array is an empty result, a match without an id is an error.
pub fn parse_query_response(json: Value) -> Result<Vec<IndexMatch>> {
	let Some(matches) = json.get("matches").and_then(|v| v.as_array()) else {
		return Ok(Vec::new());
	};
	let mut out = Vec::with_capacity(matches.len());

	for item in matches {
		let id = item.get("id").and_then(|v| v.as_str()).ok_or_else(|| Error::InvalidResponse {
			message: "Vector index match is missing id.".to_string(),
		})?;
		let score = item.get("score").and_then(|v| v.as_f64()).unwrap_or_default() as f32;
		let metadata =
			item.get("metadata").and_then(|v| v.as_object()).cloned().unwrap_or_default();

		out.push(IndexMatch { id: id.to_string(), score, metadata });
	}

	Ok(out)
}

pub fn parse_stats_response(json: Value) -> IndexStats {
	IndexStats {
		backend: "pinecone".to_string(),
		total_vector_count: json
			.get("totalVectorCount")
			.and_then(|v| v.as_u64())
			.unwrap_or_default(),
		dimension: json.get("dimension").and_then(|v| v.as_u64()).map(|v| v as u32),
		index_fullness: json.get("indexFullness").and_then(|v| v.as_f64()),
	}
}
