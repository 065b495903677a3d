//! Candidate retrieval: per-item semantic search with a bounded fan-out, and per-item
//! lexical scoring over the whole catalog.

use std::sync::Arc;

use tokio::{sync::Semaphore, task::JoinSet};

use gbid_config::Config;
use gbid_domain::{
	candidate::Candidate,
	catalog::{Catalog, CatalogRecord},
	lexical::{self, LexicalLimits},
	line_item::LineItem,
	rerank,
};

use crate::{Error, Providers, Result};

/// Embeds each item, searches the index and keeps the reranked top `per_item_cap` hits.
///
/// Items run concurrently, at most `retrieval.max_concurrency` at a time. The first failing
/// item ends the call; dropping the join set aborts the rest.
pub async fn retrieve_semantic(
	cfg: Arc<Config>,
	providers: Providers,
	items: &[LineItem],
) -> Result<Vec<Vec<Candidate>>> {
	if cfg.providers.embedding.is_none() || cfg.providers.vector_index.is_none() {
		return Err(Error::Configuration {
			message: "Semantic retrieval needs providers.embedding and providers.vector_index."
				.to_string(),
		});
	}

	let semaphore = Arc::new(Semaphore::new(cfg.retrieval.max_concurrency.max(1) as usize));
	let mut tasks = JoinSet::new();

	for item in items.iter().cloned() {
		let cfg = cfg.clone();
		let providers = providers.clone();
		let semaphore = semaphore.clone();

		tasks.spawn(async move {
			let _permit = semaphore
				.acquire_owned()
				.await
				.map_err(|err| Error::Task { message: err.to_string() })?;
			let candidates = retrieve_item(&cfg, &providers, &item).await?;

			Ok::<_, Error>((item.index, candidates))
		});
	}

	let mut per_item = vec![Vec::new(); items.len()];

	while let Some(joined) = tasks.join_next().await {
		let (index, candidates) = joined??;

		if let Some(slot) = per_item.get_mut(index) {
			*slot = candidates;
		}
	}

	Ok(per_item)
}

async fn retrieve_item(
	cfg: &Config,
	providers: &Providers,
	item: &LineItem,
) -> Result<Vec<Candidate>> {
	let (Some(embedding_cfg), Some(index_cfg)) =
		(cfg.providers.embedding.as_ref(), cfg.providers.vector_index.as_ref())
	else {
		return Ok(Vec::new());
	};
	let vector = providers.embedding.embed(embedding_cfg, &item.text).await?;

	if vector.len() != embedding_cfg.dimensions as usize {
		return Err(Error::Embedding {
			message: format!(
				"Vector dimension mismatch: expected {}, got {}.",
				embedding_cfg.dimensions,
				vector.len()
			),
		});
	}

	let matches = providers.vector_index.search(index_cfg, &vector, cfg.retrieval.top_k).await?;
	let candidates = matches
		.into_iter()
		.map(|hit| {
			let record = CatalogRecord::from_metadata(&hit.id, &hit.metadata);

			Candidate::semantic(record, hit.score, item.index)
		})
		.collect();

	Ok(rerank::rerank_and_cap(candidates, &item.text, cfg.retrieval.per_item_cap as usize))
}

/// Scores the catalog separately for each item, then reranks and caps each list the way the
/// semantic path does. One item with broad terms cannot crowd another item's rows out.
pub fn retrieve_lexical(
	cfg: &Config,
	catalog: &Catalog,
	items: &[LineItem],
) -> Vec<Vec<Candidate>> {
	let max_terms = cfg.lexical.max_terms as usize;
	let cap = cfg.retrieval.per_item_cap as usize;
	let limits = LexicalLimits {
		max_candidates: cfg.lexical.max_candidates as usize,
		min_candidates: cfg.lexical.min_candidates as usize,
		empty_terms_prefix: cfg.lexical.empty_terms_prefix as usize,
	};

	items
		.iter()
		.map(|item| {
			let terms = lexical::extract_search_terms(&item.text, max_terms);
			let candidates = lexical::score_rows(&catalog.rows, &terms, &limits)
				.into_iter()
				.filter_map(|row| catalog.records.get(row).cloned())
				.map(|record| Candidate::lexical(record, item.index))
				.collect();

			rerank::rerank_and_cap(candidates, &item.text, cap)
		})
		.collect()
}
