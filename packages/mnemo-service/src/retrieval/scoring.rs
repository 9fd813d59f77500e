use time::OffsetDateTime;

use crate::retrieval::RetrievalRequest;
use mnemo_domain::{ContextDocument, scoring};
use mnemo_storage::models::Candidate;

/// Scores candidates in store order, dropping those below `min_similarity` and stopping once
/// the next admission would overflow `max_context_length`. The admitted set is returned sorted
/// by `combined_score`, descending; ties keep store order.
pub(crate) fn score_candidates(
	candidates: Vec<Candidate>,
	req: &RetrievalRequest,
	now: OffsetDateTime,
) -> Vec<ContextDocument> {
	let mut docs = Vec::with_capacity(candidates.len());
	let mut total_chars = 0_usize;

	for candidate in candidates {
		let similarity = scoring::similarity_from_distance(candidate.distance);

		if similarity < req.min_similarity {
			continue;
		}

		let chars = candidate.text.chars().count();

		if total_chars + chars > req.max_context_length {
			tracing::debug!(
				user_id = %req.user_id,
				total_chars,
				max_context_length = req.max_context_length,
				"Context budget reached while scoring."
			);

			break;
		}

		let recency_score =
			scoring::recency_from_timestamp(candidate.metadata.timestamp.as_deref(), now);
		let combined_score =
			scoring::combined_score(similarity, recency_score, req.recency_weight);

		total_chars += chars;

		docs.push(ContextDocument {
			id: candidate.id,
			text: candidate.text,
			metadata: candidate.metadata,
			similarity,
			recency_score,
			combined_score,
			rerank_score: None,
		});
	}

	docs.sort_by(|a, b| scoring::cmp_f32_desc(a.combined_score, b.combined_score));

	docs
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;
	use mnemo_config::Retrieval;
	use mnemo_domain::{DocumentKind, Metadata};

	fn candidate(id: &str, text: &str, distance: f32, timestamp: Option<&str>) -> Candidate {
		Candidate {
			id: id.to_string(),
			text: text.to_string(),
			metadata: Metadata {
				user_id: "u1".to_string(),
				doc_type: "context".to_string(),
				timestamp: timestamp.map(str::to_string),
				kind: DocumentKind::Standalone,
			},
			distance,
		}
	}

	fn request(max_context_length: usize) -> RetrievalRequest {
		let mut req = RetrievalRequest::with_defaults("u1", "query", 5, &Retrieval::default());

		req.max_context_length = max_context_length;

		req
	}

	#[test]
	fn drops_candidates_below_threshold() {
		let now = datetime!(2024-06-01 12:00 UTC);
		let docs = score_candidates(
			vec![candidate("near", "near", 0.1, None), candidate("far", "far", 0.5, None)],
			&request(2_000),
			now,
		);

		assert_eq!(docs.len(), 1);
		assert_eq!(docs[0].id, "near");
		assert!((docs[0].similarity - 0.9).abs() < 1e-6);
	}

	#[test]
	fn recency_reorders_equal_similarity() {
		let now = datetime!(2024-06-01 12:00 UTC);
		let docs = score_candidates(
			vec![
				candidate("old", "old note", 0.2, Some("2023-06-01T12:00:00")),
				candidate("new", "new note", 0.2, Some("2024-06-01T08:00:00Z")),
			],
			&request(2_000),
			now,
		);
		let ids = docs.iter().map(|doc| doc.id.as_str()).collect::<Vec<_>>();

		assert_eq!(ids, vec!["new", "old"]);
		assert_eq!(docs[0].recency_score, 1.0);
	}

	#[test]
	fn stops_at_context_budget() {
		let now = datetime!(2024-06-01 12:00 UTC);
		let docs = score_candidates(
			vec![
				candidate("a", &"a".repeat(6), 0.1, None),
				candidate("b", &"b".repeat(6), 0.1, None),
				candidate("c", "c", 0.1, None),
			],
			&request(10),
			now,
		);

		assert_eq!(docs.len(), 1);
		assert_eq!(docs[0].id, "a");
	}
}
