use crate::{Error, MnemoService, Result, retrieval::RetrievalRequest};
use mnemo_storage::models::{Candidate, DocumentFilter};

/// Embeds the query and asks the store for `candidate_multiplier * k` nearest neighbors.
pub(crate) async fn fetch_candidates(
	service: &MnemoService,
	req: &RetrievalRequest,
) -> Result<Vec<Candidate>> {
	let embeddings = service.embed(std::slice::from_ref(&req.query)).await;
	let Some(query_embedding) = embeddings.into_iter().next() else {
		return Err(Error::Provider {
			message: "Embedding cache returned no vector for the query.".to_string(),
		});
	};

	if query_embedding.fallback {
		tracing::warn!(user_id = %req.user_id, "Query embedding is a fallback zero vector.");
	}

	let limit = candidate_limit(req.k, service.cfg.retrieval.candidate_multiplier);
	let filter = DocumentFilter {
		user_id: req.user_id.clone(),
		types: req.allowed_types.clone().unwrap_or_default(),
	};
	let candidates = service.store.query(query_embedding.vector, limit, &filter).await?;

	tracing::debug!(
		user_id = %req.user_id,
		limit,
		candidate_count = candidates.len(),
		"Vector candidates fetched."
	);

	Ok(candidates)
}

fn candidate_limit(k: u32, multiplier: u32) -> u64 {
	u64::from(k) * u64::from(multiplier.max(1))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn limit_scales_with_k() {
		assert_eq!(candidate_limit(5, 3), 15);
		assert_eq!(candidate_limit(2, 0), 2);
	}
}
