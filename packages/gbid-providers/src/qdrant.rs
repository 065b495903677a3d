use std::{collections::HashMap, time::Duration};

use qdrant_client::{
	Qdrant,
	qdrant::{PointId, Query, QueryPointsBuilder, Value, point_id::PointIdOptions, value::Kind},
};
use serde_json::Map;

use gbid_config::VectorIndexConfig;

use crate::{
	Error, Result,
	vector_index::{IndexMatch, IndexStats},
};

pub async fn search(
	cfg: &VectorIndexConfig,
	vector: &[f32],
	top_k: u32,
) -> Result<Vec<IndexMatch>> {
	let collection = collection(cfg)?;
	let client = client(cfg)?;
	let query = QueryPointsBuilder::new(collection)
		.query(Query::new_nearest(vector.to_vec()))
		.limit(top_k as u64)
		.with_payload(true);
	let response = client.query(query).await?;
	let mut out = Vec::with_capacity(response.result.len());

	for point in response.result {
		let Some(id) = point.id.as_ref().and_then(point_id_to_string) else {
			tracing::warn!("Vector index point is missing an id.");

			continue;
		};

		let metadata = payload_to_metadata(&point.payload);

		out.push(IndexMatch { id, score: point.score, metadata });
	}

	Ok(out)
}

pub async fn stats(cfg: &VectorIndexConfig) -> Result<IndexStats> {
	let collection = collection(cfg)?;
	let client = client(cfg)?;
	let info = client.collection_info(collection).await?.result.ok_or_else(|| {
		Error::InvalidResponse { message: "Qdrant collection info is missing.".to_string() }
	})?;

	Ok(IndexStats {
		backend: "qdrant".to_string(),
		total_vector_count: info.points_count.unwrap_or_default(),
		dimension: None,
		index_fullness: None,
	})
}

pub fn point_id_to_string(point_id: &PointId) -> Option<String> {
	match &point_id.point_id_options {
		Some(PointIdOptions::Uuid(id)) => Some(id.clone()),
		Some(PointIdOptions::Num(id)) => Some(id.to_string()),
		None => None,
	}
}

/// Scalar payload entries as JSON; nested structs and lists are skipped.
pub fn payload_to_metadata(payload: &HashMap<String, Value>) -> Map<String, serde_json::Value> {
	payload
		.iter()
		.filter_map(|(key, value)| {
			let json = match value.kind.as_ref()? {
				Kind::StringValue(text) => serde_json::Value::String(text.clone()),
				Kind::IntegerValue(number) => serde_json::Value::from(*number),
				Kind::DoubleValue(number) => serde_json::Value::from(*number),
				Kind::BoolValue(flag) => serde_json::Value::Bool(*flag),
				_ => return None,
			};

			Some((key.clone(), json))
		})
		.collect()
}

fn collection(cfg: &VectorIndexConfig) -> Result<&str> {
	cfg.collection.as_deref().ok_or_else(|| Error::InvalidConfig {
		message: "providers.vector_index.collection is required for the qdrant backend."
			.to_string(),
	})
}

fn client(cfg: &VectorIndexConfig) -> Result<Qdrant> {
	let mut builder = Qdrant::from_url(&cfg.url).timeout(Duration::from_millis(cfg.timeout_ms));

	if !cfg.api_key.is_empty() {
		builder = builder.api_key(cfg.api_key.clone());
	}

	Ok(builder.build()?)
}
