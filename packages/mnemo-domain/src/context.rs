use crate::document::ContextDocument;

pub const TRUNCATION_MARKER: &str = "...\n[Context truncated for efficiency]\n...";

/// Keeps both ends of an over-long context and drops the middle.
pub fn summarize_long_context(text: &str, max_length: usize) -> String {
	let total = text.chars().count();

	if total <= max_length {
		return text.to_string();
	}

	let half = max_length / 2;
	let head: String = text.chars().take(half).collect();
	let tail: String = text.chars().skip(total - half).collect();

	format!("{head}{TRUNCATION_MARKER}{tail}")
}

pub fn assemble_context(docs: &[ContextDocument], max_length: usize) -> String {
	let joined = docs.iter().map(|doc| doc.text.as_str()).collect::<Vec<_>>().join("\n\n");

	summarize_long_context(&joined, max_length)
}
