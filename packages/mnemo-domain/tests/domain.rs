use mnemo_domain::{
	ContextDocument, DocumentKind, Metadata,
	context::{self, TRUNCATION_MARKER},
	planner, scoring,
};

fn doc(text: &str) -> ContextDocument {
	ContextDocument {
		id: text.to_string(),
		text: text.to_string(),
		metadata: Metadata {
			user_id: "u1".to_string(),
			doc_type: "context".to_string(),
			timestamp: None,
			kind: DocumentKind::Standalone,
		},
		similarity: 0.9,
		recency_score: 1.0,
		combined_score: 0.92,
		rerank_score: None,
	}
}

#[test]
fn plans_short_breadth_for_greetings() {
	assert_eq!(planner::plan_query("hi").k, 2);
}

#[test]
fn plans_wide_breadth_for_analytical_queries() {
	assert_eq!(planner::plan_query("explain how compound interest works").k, 7);
}

#[test]
fn plans_planning_types_for_task_queries() {
	let plan = planner::plan_query("remind me of my tasks");

	assert_eq!(plan.k, 5);
	assert_eq!(plan.allowed_types, vec!["plan", "context", "onboarding"]);
}

#[test]
fn defaults_to_context_and_onboarding() {
	let plan = planner::plan_query("what did I eat");

	assert_eq!(plan.allowed_types, vec!["context", "onboarding"]);
}

#[test]
fn recency_starts_at_one() {
	assert_eq!(scoring::recency_score(0), 1.0);
}

#[test]
fn recency_is_non_increasing_and_floored() {
	let mut previous = scoring::recency_score(0);

	for age in [1, 7, 30, 90, 365, 1_000, 100_000] {
		let score = scoring::recency_score(age);

		assert!(score <= previous, "recency increased at age {age}");
		assert!(score >= scoring::RECENCY_FLOOR, "recency fell below floor at age {age}");

		previous = score;
	}

	assert_eq!(scoring::recency_score(i64::MAX / 2), scoring::RECENCY_FLOOR);
}

#[test]
fn combined_score_weights_similarity_and_recency() {
	let score = scoring::combined_score(0.9, 0.5, 0.2);

	assert!((score - 0.82).abs() < 1e-6, "unexpected combined score {score}");
}

#[test]
fn rerank_blend_keeps_most_of_prior() {
	let blended = scoring::blend_rerank(0.8, scoring::normalize_rerank_score(1.0));

	assert!((blended - 0.84).abs() < 1e-6, "unexpected blended score {blended}");
}

#[test]
fn summarize_keeps_both_ends() {
	let head = "a".repeat(1_000);
	let middle = "b".repeat(1_000);
	let tail = "c".repeat(1_000);
	let text = format!("{head}{middle}{tail}");
	let summary = context::summarize_long_context(&text, 2_000);

	assert_eq!(summary, format!("{head}{TRUNCATION_MARKER}{tail}"));
}

#[test]
fn summarize_leaves_short_text_unchanged() {
	assert_eq!(context::summarize_long_context("short", 2_000), "short");
}

#[test]
fn summarize_counts_characters_not_bytes() {
	let text = "é".repeat(10);
	let summary = context::summarize_long_context(&text, 4);

	assert_eq!(summary, format!("éé{TRUNCATION_MARKER}éé"));
}

#[test]
fn assembles_documents_with_blank_lines() {
	let docs = vec![doc("first"), doc("second")];

	assert_eq!(context::assemble_context(&docs, 2_000), "first\n\nsecond");
}
