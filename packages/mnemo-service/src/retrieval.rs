pub mod adjacency;
pub mod dedup;
pub mod fetch;
pub mod rerank;
pub mod scoring;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, MnemoService, Result};
use mnemo_config::Retrieval;
use mnemo_domain::{ContextDocument, QueryPlan, context, planner};

/// Parameters of one retrieval call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalRequest {
	pub user_id: String,
	pub query: String,
	pub k: u32,
	pub min_similarity: f32,
	pub max_context_length: usize,
	pub recency_weight: f32,
	/// `None` or an empty list means every type is eligible.
	pub allowed_types: Option<Vec<String>>,
	pub deduplicate: bool,
	pub use_reranking: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedContext {
	pub plan: QueryPlan,
	pub documents: Vec<ContextDocument>,
	/// Document texts joined and shortened to the configured summary length.
	pub context: String,
}

impl RetrievalRequest {
	/// Request with thresholds and switches taken from the `[retrieval]` section.
	pub fn with_defaults(
		user_id: impl Into<String>,
		query: impl Into<String>,
		k: u32,
		cfg: &Retrieval,
	) -> Self {
		Self {
			user_id: user_id.into(),
			query: query.into(),
			k,
			min_similarity: cfg.min_similarity,
			max_context_length: cfg.max_context_length,
			recency_weight: cfg.recency_weight,
			allowed_types: None,
			deduplicate: cfg.deduplicate,
			use_reranking: cfg.use_reranking,
		}
	}

	pub fn validate(&self) -> Result<()> {
		if self.user_id.trim().is_empty() {
			return Err(invalid("user_id must be non-empty."));
		}
		if self.query.trim().is_empty() {
			return Err(invalid("query must be non-empty."));
		}
		if self.k == 0 {
			return Err(invalid("k must be greater than zero."));
		}
		if !unit_interval(self.min_similarity) {
			return Err(invalid("min_similarity must be in the range 0.0-1.0."));
		}
		if !unit_interval(self.recency_weight) {
			return Err(invalid("recency_weight must be in the range 0.0-1.0."));
		}

		Ok(())
	}
}

impl MnemoService {
	/// Runs fetch, score, dedup, rerank and adjacency expansion for one query.
	///
	/// The result holds at most `k` documents sorted by `combined_score`, descending. A vector
	/// store failure fails the whole call; embedding and rerank failures only degrade it.
	pub async fn retrieve_context(&self, req: &RetrievalRequest) -> Result<Vec<ContextDocument>> {
		req.validate()?;

		let retrieval = &self.cfg.retrieval;
		let k = req.k as usize;
		let candidates = fetch::fetch_candidates(self, req).await?;
		let candidate_count = candidates.len();
		let mut docs = scoring::score_candidates(candidates, req, OffsetDateTime::now_utc());
		let scored_count = docs.len();

		if req.deduplicate && docs.len() > 1 {
			docs = dedup::deduplicate(self, docs, retrieval.dedup_threshold).await;
		}
		if req.use_reranking {
			let pool = k.saturating_mul(retrieval.rerank_pool_multiplier as usize);

			self.reranker.rerank(&req.query, &mut docs, pool).await;
		}

		let docs = adjacency::expand(
			self.store.as_ref(),
			docs,
			adjacency::Budget {
				user_id: &req.user_id,
				max_context_length: req.max_context_length,
				neighbor_score: retrieval.neighbor_score,
				k,
			},
		)
		.await;

		tracing::info!(
			user_id = %req.user_id,
			candidate_count,
			scored_count,
			returned_count = docs.len(),
			"Context retrieved."
		);

		Ok(docs)
	}

	/// Plans breadth and types from the query text, retrieves, and assembles the prompt context.
	pub async fn retrieve_planned(&self, user_id: &str, query: &str) -> Result<PlannedContext> {
		let plan = planner::plan_query(query);
		let mut req = RetrievalRequest::with_defaults(user_id, query, plan.k, &self.cfg.retrieval);

		req.allowed_types = Some(plan.allowed_types.clone());

		let documents = self.retrieve_context(&req).await?;
		let context = context::assemble_context(&documents, self.cfg.retrieval.summary_max_chars);

		tracing::debug!(
			user_id,
			k = plan.k,
			allowed_types = ?plan.allowed_types,
			context_chars = context.chars().count(),
			"Planned context assembled."
		);

		Ok(PlannedContext { plan, documents, context })
	}
}

fn unit_interval(value: f32) -> bool {
	value.is_finite() && (0.0..=1.0).contains(&value)
}

fn invalid(message: &str) -> Error {
	Error::InvalidRequest { message: message.to_string() }
}

#[cfg(test)]
mod tests {
	use super::*;

	fn request() -> RetrievalRequest {
		RetrievalRequest::with_defaults("u1", "what is my plan", 5, &Retrieval::default())
	}

	#[test]
	fn defaults_come_from_config() {
		let req = request();

		assert_eq!(req.min_similarity, 0.65);
		assert_eq!(req.max_context_length, 2_000);
		assert!(req.deduplicate);
		assert!(req.allowed_types.is_none());
		assert!(req.validate().is_ok());
	}

	#[test]
	fn rejects_out_of_range_weights() {
		let mut req = request();

		req.recency_weight = 1.2;

		assert!(matches!(req.validate(), Err(Error::InvalidRequest { .. })));

		req.recency_weight = 0.2;
		req.min_similarity = f32::NAN;

		assert!(req.validate().is_err());
	}

	#[test]
	fn rejects_blank_fields_and_zero_k() {
		let mut req = request();

		req.user_id = "  ".to_string();

		assert!(req.validate().is_err());

		let mut req = request();

		req.k = 0;

		assert!(req.validate().is_err());
	}
}
