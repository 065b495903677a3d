use crate::{candidate::Candidate, catalog::CatalogRecord, line_item};

/// The product-type word of a line item: the last descriptive word longer than three
/// characters, else the last descriptive word.
pub fn type_token(text: &str) -> Option<String> {
	let words = line_item::descriptive_words(text);

	words
		.iter()
		.rev()
		.find(|word| word.chars().count() > 3)
		.or_else(|| words.last())
		.map(|word| word.to_lowercase())
}

pub fn matches_type(record: &CatalogRecord, token: &str) -> bool {
	!token.is_empty() && record.identity_text().contains(&token.to_lowercase())
}

/// Stable partition: records whose name or aliases contain `token` move ahead, relative
/// order is kept on both sides.
pub fn rerank_by_type(candidates: Vec<Candidate>, token: Option<&str>) -> Vec<Candidate> {
	let Some(token) = token else { return candidates };
	let (mut matched, rest): (Vec<_>, Vec<_>) =
		candidates.into_iter().partition(|candidate| matches_type(&candidate.record, token));

	matched.extend(rest);

	matched
}

/// Rerank then keep the first `cap` candidates of one line item.
pub fn rerank_and_cap(candidates: Vec<Candidate>, item_text: &str, cap: usize) -> Vec<Candidate> {
	let token = type_token(item_text);
	let mut reranked = rerank_by_type(candidates, token.as_deref());

	reranked.truncate(cap);

	reranked
}
