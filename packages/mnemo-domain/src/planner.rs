use regex::Regex;
use serde::{Deserialize, Serialize};

const FILLER_K: u32 = 2;
const ANALYTICAL_K: u32 = 7;
const DEFAULT_K: u32 = 5;

const FILLER_TERMS: &[&str] =
	&["hi", "hello", "thanks", "thank you", "ok", "okay", "yes", "no", "bye"];
const ANALYTICAL_TERMS: &[&str] =
	&["explain", "how", "why", "what is", "compare", "analyze", "describe", "tell me about"];

const LEARNING_TERMS: &[&str] = &["skill", "learn", "study", "course", "subject"];
const PLANNING_TERMS: &[&str] = &["plan", "schedule", "task", "todo", "routine", "daily"];
const PERSONAL_TERMS: &[&str] = &["name", "call me", "preference", "like", "dislike"];

const LEARNING_TYPES: &[&str] = &["context", "onboarding", "chat"];
const PLANNING_TYPES: &[&str] = &["plan", "context", "onboarding"];
const PERSONAL_TYPES: &[&str] = &["context", "onboarding"];
const DEFAULT_TYPES: &[&str] = &["context", "onboarding"];

/// Retrieval breadth and document-type allow-list derived from the query text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPlan {
	pub k: u32,
	pub allowed_types: Vec<String>,
}

#[derive(Clone, Copy)]
enum Anchor {
	/// Term must be a whole word or phrase.
	Word,
	/// Term must start at a word boundary; inflections such as "tasks" still match.
	Prefix,
}

pub fn plan_query(query: &str) -> QueryPlan {
	QueryPlan { k: plan_k(query), allowed_types: plan_types(query) }
}

/// Breadth for `query`: filler gets 2, analytical questions 7, everything else 5.
///
/// Terms match whole words only, so "which" is not read as the filler "hi".
pub fn plan_k(query: &str) -> u32 {
	if matches_any(query, FILLER_TERMS, Anchor::Word) {
		return FILLER_K;
	}
	if matches_any(query, ANALYTICAL_TERMS, Anchor::Word) {
		return ANALYTICAL_K;
	}

	DEFAULT_K
}

pub fn plan_types(query: &str) -> Vec<String> {
	let buckets = [
		(LEARNING_TERMS, LEARNING_TYPES),
		(PLANNING_TERMS, PLANNING_TYPES),
		(PERSONAL_TERMS, PERSONAL_TYPES),
	];
	let types = buckets
		.iter()
		.find(|(terms, _)| matches_any(query, terms, Anchor::Prefix))
		.map(|(_, types)| *types)
		.unwrap_or(DEFAULT_TYPES);

	types.iter().map(|value| value.to_string()).collect()
}

fn matches_any(query: &str, terms: &[&str], anchor: Anchor) -> bool {
	let alternation = terms.iter().map(|term| regex::escape(term)).collect::<Vec<_>>().join("|");
	let pattern = match anchor {
		Anchor::Word => format!(r"(?i)\b(?:{alternation})\b"),
		Anchor::Prefix => format!(r"(?i)\b(?:{alternation})"),
	};

	Regex::new(&pattern).map(|re| re.is_match(query)).unwrap_or(false)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn filler_terms_need_whole_words() {
		assert_eq!(plan_k("Hi there"), FILLER_K);
		assert_eq!(plan_k("thank you!"), FILLER_K);
		assert_eq!(plan_k("I know this one"), DEFAULT_K);
		assert_eq!(plan_k("which book was it"), DEFAULT_K);
	}

	#[test]
	fn filler_check_runs_before_analytical_check() {
		assert_eq!(plan_k("ok, explain why"), FILLER_K);
	}

	#[test]
	fn type_terms_match_inflections() {
		assert_eq!(plan_types("I am learning Rust"), vec!["context", "onboarding", "chat"]);
		assert_eq!(plan_types("what is scheduled today"), vec!["plan", "context", "onboarding"]);
	}

	#[test]
	fn first_matching_type_bucket_wins() {
		assert_eq!(plan_types("plan my study week"), vec!["context", "onboarding", "chat"]);
	}
}
