use std::collections::HashSet;

use crate::candidate::Candidate;

/// Keeps the first occurrence of each record id, preserving input order.
pub fn dedupe_candidates(candidates: Vec<Candidate>) -> Vec<Candidate> {
	let mut seen: HashSet<String> = HashSet::new();

	candidates.into_iter().filter(|candidate| seen.insert(candidate.id().to_string())).collect()
}
