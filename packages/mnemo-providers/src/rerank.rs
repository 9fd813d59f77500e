use serde_json::Value;

use crate::{Result, invalid_response};

/// Scores each document against `query` with a cross-encoder endpoint.
///
/// Scores are raw relevance values aligned with `docs`. A response that does not score every
/// document exactly once is rejected.
pub async fn rerank(
	cfg: &mnemo_config::ProviderConfig,
	query: &str,
	docs: &[String],
) -> Result<Vec<f32>> {
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({ "model": cfg.model, "query": query, "documents": docs });
	let res = crate::client(cfg.timeout_ms)?
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_rerank_response(json, docs.len())
}

fn parse_rerank_response(json: Value, doc_count: usize) -> Result<Vec<f32>> {
	let results = json
		.get("results")
		.or_else(|| json.get("data"))
		.and_then(|v| v.as_array())
		.ok_or_else(|| invalid_response("Rerank response is missing results array."))?;
	let mut scores: Vec<Option<f32>> = vec![None; doc_count];

	for item in results {
		let index = item
			.get("index")
			.and_then(|v| v.as_u64())
			.ok_or_else(|| invalid_response("Rerank result is missing index."))? as usize;
		let score = item
			.get("relevance_score")
			.or_else(|| item.get("score"))
			.and_then(|v| v.as_f64())
			.ok_or_else(|| invalid_response("Rerank result is missing score."))? as f32;
		let Some(slot) = scores.get_mut(index) else {
			return Err(invalid_response("Rerank result index is out of range."));
		};

		*slot = Some(score);
	}

	scores
		.into_iter()
		.collect::<Option<Vec<_>>>()
		.ok_or_else(|| invalid_response("Rerank response did not score every document."))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn aligns_scores_by_index() {
		let json = serde_json::json!({
			"results": [
				{ "index": 1, "relevance_score": 0.2 },
				{ "index": 0, "relevance_score": 0.9 }
			]
		});
		let scores = parse_rerank_response(json, 2).expect("parse failed");

		assert_eq!(scores, vec![0.9, 0.2]);
	}

	#[test]
	fn rejects_partial_results() {
		let json = serde_json::json!({ "results": [{ "index": 0, "relevance_score": 0.9 }] });

		assert!(parse_rerank_response(json, 2).is_err());
	}

	#[test]
	fn rejects_out_of_range_index() {
		let json = serde_json::json!({ "results": [{ "index": 3, "score": 0.1 }] });

		assert!(parse_rerank_response(json, 1).is_err());
	}
}
