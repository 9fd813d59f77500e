use std::sync::Arc;

use crate::RerankProvider;
use mnemo_config::ProviderConfig;
use mnemo_domain::{ContextDocument, scoring};

const PROBE_QUERY: &str = "ping";
const PROBE_DOCUMENT: &str = "pong";

/// Cross-encoder stage whose availability is settled once at startup.
///
/// An unavailable reranker stays unavailable for the life of the process; every call is then a
/// pass-through.
#[derive(Clone)]
pub struct Reranker {
	state: RerankerState,
}

#[derive(Clone)]
enum RerankerState {
	Available { provider: Arc<dyn RerankProvider>, cfg: ProviderConfig },
	Unavailable { reason: String },
}

impl Reranker {
	/// Issues one tiny rerank call and keeps the provider only if it answers correctly.
	pub async fn probe(provider: Arc<dyn RerankProvider>, cfg: Option<&ProviderConfig>) -> Self {
		let Some(cfg) = cfg else {
			tracing::info!("No rerank provider configured; reranking is disabled.");

			return Self::disabled("No rerank provider configured.");
		};
		let docs = [PROBE_DOCUMENT.to_string()];

		match provider.rerank(cfg, PROBE_QUERY, &docs).await {
			Ok(scores) if scores.len() == docs.len() => {
				tracing::info!(
					provider_id = %cfg.provider_id,
					model = %cfg.model,
					"Reranker is available."
				);

				Self { state: RerankerState::Available { provider, cfg: cfg.clone() } }
			},
			Ok(scores) => {
				tracing::warn!(
					provider_id = %cfg.provider_id,
					received = scores.len(),
					"Reranker probe returned the wrong number of scores; reranking is disabled."
				);

				Self::disabled("Rerank probe returned the wrong number of scores.")
			},
			Err(err) => {
				tracing::warn!(
					error = %err,
					provider_id = %cfg.provider_id,
					"Reranker probe failed; reranking is disabled."
				);

				Self::disabled(&format!("Rerank probe failed: {err}"))
			},
		}
	}

	pub fn disabled(reason: &str) -> Self {
		Self { state: RerankerState::Unavailable { reason: reason.to_string() } }
	}

	pub fn is_available(&self) -> bool {
		matches!(self.state, RerankerState::Available { .. })
	}

	pub fn unavailable_reason(&self) -> Option<&str> {
		match &self.state {
			RerankerState::Available { .. } => None,
			RerankerState::Unavailable { reason } => Some(reason.as_str()),
		}
	}

	/// Rescores the best `pool` documents and keeps only those, re-sorted.
	///
	/// Provider errors and misaligned responses leave `docs` untouched for this call.
	pub(crate) async fn rerank(&self, query: &str, docs: &mut Vec<ContextDocument>, pool: usize) {
		let RerankerState::Available { provider, cfg } = &self.state else {
			tracing::debug!("Reranker unavailable; skipping rerank.");

			return;
		};

		if docs.len() <= 1 || pool == 0 {
			return;
		}

		let pool = pool.min(docs.len());
		let texts = docs[..pool].iter().map(|doc| doc.text.clone()).collect::<Vec<_>>();
		let scores = match provider.rerank(cfg, query, &texts).await {
			Ok(scores) if scores.len() == pool => scores,
			Ok(scores) => {
				tracing::warn!(
					expected = pool,
					received = scores.len(),
					"Rerank score count mismatch; skipping rerank for this call."
				);

				return;
			},
			Err(err) => {
				tracing::warn!(error = %err, "Rerank call failed; skipping rerank for this call.");

				return;
			},
		};

		docs.truncate(pool);
		apply_scores(docs, &scores);

		tracing::debug!(pool, "Documents reranked.");
	}
}

fn apply_scores(docs: &mut [ContextDocument], raw_scores: &[f32]) {
	for (doc, raw) in docs.iter_mut().zip(raw_scores) {
		doc.rerank_score = Some(*raw);
		doc.combined_score =
			scoring::blend_rerank(doc.combined_score, scoring::normalize_rerank_score(*raw));
	}

	docs.sort_by(|a, b| scoring::cmp_f32_desc(a.combined_score, b.combined_score));
}

#[cfg(test)]
mod tests {
	use super::*;
	use mnemo_domain::{DocumentKind, Metadata};

	fn doc(id: &str, combined_score: f32) -> ContextDocument {
		ContextDocument {
			id: id.to_string(),
			text: id.to_string(),
			metadata: Metadata {
				user_id: "u1".to_string(),
				doc_type: "context".to_string(),
				timestamp: None,
				kind: DocumentKind::Standalone,
			},
			similarity: combined_score,
			recency_score: 1.0,
			combined_score,
			rerank_score: None,
		}
	}

	#[test]
	fn blends_and_resorts() {
		let mut docs = vec![doc("a", 0.80), doc("b", 0.78)];

		apply_scores(&mut docs, &[-1.0, 1.0]);

		assert_eq!(docs[0].id, "b");
		assert_eq!(docs[0].rerank_score, Some(1.0));
		assert!((docs[0].combined_score - (0.8 * 0.78 + 0.2)).abs() < 1e-6);
		assert!((docs[1].combined_score - 0.64).abs() < 1e-6);
	}

	#[test]
	fn disabled_reports_reason() {
		let reranker = Reranker::disabled("No rerank provider configured.");

		assert!(!reranker.is_available());
		assert_eq!(reranker.unavailable_reason(), Some("No rerank provider configured."));
	}
}
