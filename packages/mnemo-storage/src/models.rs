use serde::{Deserialize, Serialize};

use mnemo_domain::Metadata;

/// A record as written to and read back from the vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
	pub id: String,
	pub text: String,
	pub metadata: Metadata,
}

/// A nearest-neighbor hit. Smaller `distance` means more similar.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
	pub id: String,
	pub text: String,
	pub metadata: Metadata,
	pub distance: f32,
}

/// Restricts a query to one user's records and, when `types` is non-empty, to those types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFilter {
	pub user_id: String,
	pub types: Vec<String>,
}

impl DocumentFilter {
	pub fn allows(&self, metadata: &Metadata) -> bool {
		metadata.user_id == self.user_id
			&& (self.types.is_empty() || self.types.iter().any(|ty| *ty == metadata.doc_type))
	}
}
