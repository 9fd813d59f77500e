use serde::{Deserialize, Serialize};

/// Document type used for logged conversation turns.
pub const CHAT_TYPE: &str = "chat";

const CHUNK_ID_INFIX: &str = "_chunk_";

/// Position of a stored record relative to the document it was split from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentKind {
	Standalone,
	Chunk { source_id: String, index: u32, total: Option<u32> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
	pub user_id: String,
	#[serde(rename = "type")]
	pub doc_type: String,
	pub timestamp: Option<String>,
	pub kind: DocumentKind,
}

/// A retrieved record together with the scores the pipeline assigned to it.
///
/// `text` and `metadata` never change after scoring; later stages only touch the score fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextDocument {
	pub id: String,
	pub text: String,
	pub metadata: Metadata,
	pub similarity: f32,
	pub recency_score: f32,
	pub combined_score: f32,
	pub rerank_score: Option<f32>,
}

impl DocumentKind {
	pub fn is_chunk(&self) -> bool {
		matches!(self, Self::Chunk { .. })
	}
}

impl ContextDocument {
	pub fn char_len(&self) -> usize {
		self.text.chars().count()
	}
}

pub fn chunk_id(source_id: &str, index: u32) -> String {
	format!("{source_id}{CHUNK_ID_INFIX}{index}")
}
