use std::collections::{HashMap, HashSet};

use crate::VectorStore;
use mnemo_domain::{ContextDocument, DocumentKind, chunk_id, scoring};
use mnemo_storage::models::StoredDocument;

pub(crate) struct Budget<'a> {
	pub(crate) user_id: &'a str,
	pub(crate) max_context_length: usize,
	pub(crate) neighbor_score: f32,
	pub(crate) k: usize,
}

struct ChunkGroup {
	source_id: String,
	/// (index, total chunks when known), ascending by index.
	positions: Vec<(u32, Option<u32>)>,
}

/// Pulls in the chunks directly before and after every retrieved chunk.
///
/// Neighbors are looked up by id, admitted at a fixed score, and only while the character total
/// of the whole result (survivors included) stays within `max_context_length`. Lookup failures
/// and missing neighbors are skipped. The result is re-sorted and truncated to `k`.
pub(crate) async fn expand(
	store: &dyn VectorStore,
	mut docs: Vec<ContextDocument>,
	budget: Budget<'_>,
) -> Vec<ContextDocument> {
	let mut total_chars = docs.iter().map(ContextDocument::char_len).sum::<usize>();
	let mut seen = docs.iter().map(|doc| doc.id.clone()).collect::<HashSet<_>>();
	let groups = chunk_groups(&docs);
	let mut admitted = 0_usize;

	for group in groups {
		for (index, total) in group.positions {
			for neighbor in neighbor_indexes(index, total) {
				let id = chunk_id(&group.source_id, neighbor);

				// Remaining budget only shrinks, so a rejected or missing id is never retried.
				if !seen.insert(id.clone()) {
					continue;
				}

				let stored = match store.get_by_id(&id).await {
					Ok(Some(stored)) => stored,
					Ok(None) => {
						tracing::debug!(chunk_id = %id, "Adjacent chunk not found.");

						continue;
					},
					Err(err) => {
						tracing::debug!(
							error = %err,
							chunk_id = %id,
							"Adjacent chunk lookup failed."
						);

						continue;
					},
				};

				if stored.metadata.user_id != budget.user_id {
					tracing::debug!(chunk_id = %id, "Adjacent chunk belongs to another user.");

					continue;
				}

				let chars = stored.text.chars().count();

				if total_chars + chars > budget.max_context_length {
					tracing::debug!(
						chunk_id = %id,
						total_chars,
						max_context_length = budget.max_context_length,
						"Adjacent chunk exceeds context budget."
					);

					continue;
				}

				total_chars += chars;
				admitted += 1;

				docs.push(neighbor_document(stored, budget.neighbor_score));
			}
		}
	}

	docs.sort_by(|a, b| scoring::cmp_f32_desc(a.combined_score, b.combined_score));
	docs.truncate(budget.k);

	tracing::debug!(admitted, total_chars, "Adjacent chunks merged.");

	docs
}

fn chunk_groups(docs: &[ContextDocument]) -> Vec<ChunkGroup> {
	let mut groups: Vec<ChunkGroup> = Vec::new();
	let mut by_source: HashMap<&str, usize> = HashMap::new();

	for doc in docs {
		let DocumentKind::Chunk { source_id, index, total } = &doc.metadata.kind else {
			continue;
		};
		let slot = *by_source.entry(source_id.as_str()).or_insert_with(|| {
			groups.push(ChunkGroup { source_id: source_id.clone(), positions: Vec::new() });

			groups.len() - 1
		});

		groups[slot].positions.push((*index, *total));
	}

	for group in &mut groups {
		group.positions.sort_by_key(|(index, _)| *index);
		group.positions.dedup_by_key(|(index, _)| *index);
	}

	groups
}

fn neighbor_indexes(index: u32, total: Option<u32>) -> Vec<u32> {
	let mut out = Vec::with_capacity(2);

	if index > 0 {
		out.push(index - 1);
	}
	let next = index.checked_add(1).filter(|next| total.is_none_or(|total| *next < total));

	if let Some(next) = next {
		out.push(next);
	}

	out
}

fn neighbor_document(stored: StoredDocument, neighbor_score: f32) -> ContextDocument {
	ContextDocument {
		id: stored.id,
		text: stored.text,
		metadata: stored.metadata,
		similarity: neighbor_score,
		recency_score: 1.0,
		combined_score: neighbor_score,
		rerank_score: None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use mnemo_domain::Metadata;

	fn chunk(source_id: &str, index: u32) -> ContextDocument {
		ContextDocument {
			id: chunk_id(source_id, index),
			text: format!("{source_id} part {index}"),
			metadata: Metadata {
				user_id: "u1".to_string(),
				doc_type: "context".to_string(),
				timestamp: None,
				kind: DocumentKind::Chunk { source_id: source_id.to_string(), index, total: None },
			},
			similarity: 0.9,
			recency_score: 1.0,
			combined_score: 0.9,
			rerank_score: None,
		}
	}

	#[test]
	fn neighbors_respect_bounds() {
		assert_eq!(neighbor_indexes(0, Some(3)), vec![1]);
		assert_eq!(neighbor_indexes(2, Some(3)), vec![1]);
		assert_eq!(neighbor_indexes(4, None), vec![3, 5]);
	}

	#[test]
	fn last_representable_index_has_no_successor() {
		assert_eq!(neighbor_indexes(u32::MAX, None), vec![u32::MAX - 1]);
		assert_eq!(neighbor_indexes(u32::MAX, Some(u32::MAX)), vec![u32::MAX - 1]);
	}

	#[test]
	fn groups_keep_first_seen_order_and_sort_indexes() {
		let docs = vec![chunk("b", 3), chunk("a", 1), chunk("b", 1)];
		let groups = chunk_groups(&docs);

		assert_eq!(groups.len(), 2);
		assert_eq!(groups[0].source_id, "b");
		assert_eq!(groups[0].positions, vec![(1, None), (3, None)]);
		assert_eq!(groups[1].source_id, "a");
	}
}
