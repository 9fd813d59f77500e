use std::collections::HashMap;

use qdrant_client::qdrant::{Value, value::Kind};

use crate::models::StoredDocument;
use mnemo_domain::{DocumentKind, Metadata};

pub const DOC_ID: &str = "doc_id";
pub const TEXT: &str = "text";
pub const USER_ID: &str = "user_id";
pub const TYPE: &str = "type";
pub const TIMESTAMP: &str = "timestamp";
pub const IS_CHUNK: &str = "is_chunk";
pub const SOURCE_DOC_ID: &str = "source_doc_id";
pub const CHUNK_INDEX: &str = "chunk_index";
pub const TOTAL_CHUNKS: &str = "total_chunks";

pub fn document_payload(doc: &StoredDocument) -> HashMap<String, Value> {
	let mut payload = HashMap::new();

	payload.insert(DOC_ID.to_string(), Value::from(doc.id.clone()));
	payload.insert(TEXT.to_string(), Value::from(doc.text.clone()));
	payload.insert(USER_ID.to_string(), Value::from(doc.metadata.user_id.clone()));
	payload.insert(TYPE.to_string(), Value::from(doc.metadata.doc_type.clone()));

	if let Some(timestamp) = doc.metadata.timestamp.as_ref() {
		payload.insert(TIMESTAMP.to_string(), Value::from(timestamp.clone()));
	}

	match &doc.metadata.kind {
		DocumentKind::Standalone => {
			payload.insert(IS_CHUNK.to_string(), Value::from(false));
		},
		DocumentKind::Chunk { source_id, index, total } => {
			payload.insert(IS_CHUNK.to_string(), Value::from(true));
			payload.insert(SOURCE_DOC_ID.to_string(), Value::from(source_id.clone()));
			payload.insert(CHUNK_INDEX.to_string(), Value::from(i64::from(*index)));

			if let Some(total) = total {
				payload.insert(TOTAL_CHUNKS.to_string(), Value::from(i64::from(*total)));
			}
		},
	}

	payload
}

/// Rebuilds a stored record from its payload. Returns `None` when a required field is missing.
pub fn document_from_payload(payload: &HashMap<String, Value>) -> Option<StoredDocument> {
	let id = payload_string(payload, DOC_ID)?;
	let text = payload_string(payload, TEXT)?;
	let user_id = payload_string(payload, USER_ID)?;
	let doc_type = payload_string(payload, TYPE)?;
	let timestamp = payload_string(payload, TIMESTAMP);
	let kind = chunk_kind(payload).unwrap_or(DocumentKind::Standalone);

	Some(StoredDocument { id, text, metadata: Metadata { user_id, doc_type, timestamp, kind } })
}

fn chunk_kind(payload: &HashMap<String, Value>) -> Option<DocumentKind> {
	if !payload_bool(payload, IS_CHUNK)? {
		return None;
	}

	let source_id = payload_string(payload, SOURCE_DOC_ID)?;
	let index = payload_u32(payload, CHUNK_INDEX)?;
	let total = payload_u32(payload, TOTAL_CHUNKS);

	Some(DocumentKind::Chunk { source_id, index, total })
}

pub fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::StringValue(text)) => Some(text.to_string()),
		_ => None,
	}
}

pub fn payload_bool(payload: &HashMap<String, Value>, key: &str) -> Option<bool> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::BoolValue(flag)) => Some(*flag),
		_ => None,
	}
}

pub fn payload_u32(payload: &HashMap<String, Value>, key: &str) -> Option<u32> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::IntegerValue(value)) => u32::try_from(*value).ok(),
		Some(Kind::DoubleValue(value)) =>
			if value.fract() == 0.0 {
				u32::try_from(*value as i64).ok()
			} else {
				None
			},
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn doc(kind: DocumentKind) -> StoredDocument {
		StoredDocument {
			id: "doc-1_chunk_2".to_string(),
			text: "Week two covers ownership.".to_string(),
			metadata: Metadata {
				user_id: "u1".to_string(),
				doc_type: "context".to_string(),
				timestamp: Some("2024-05-01T09:00:00".to_string()),
				kind,
			},
		}
	}

	#[test]
	fn chunk_metadata_survives_payload() {
		let original = doc(DocumentKind::Chunk {
			source_id: "doc-1".to_string(),
			index: 2,
			total: Some(5),
		});
		let payload = document_payload(&original);

		assert_eq!(document_from_payload(&payload), Some(original));
	}

	#[test]
	fn chunk_flag_without_position_reads_as_standalone() {
		let mut payload = document_payload(&doc(DocumentKind::Standalone));

		payload.insert(IS_CHUNK.to_string(), Value::from(true));

		let parsed = document_from_payload(&payload).expect("payload should parse");

		assert_eq!(parsed.metadata.kind, DocumentKind::Standalone);
	}

	#[test]
	fn missing_text_is_rejected() {
		let mut payload = document_payload(&doc(DocumentKind::Standalone));

		payload.remove(TEXT);

		assert!(document_from_payload(&payload).is_none());
	}

	#[test]
	fn whole_doubles_read_as_indexes() {
		let mut payload = HashMap::new();

		payload.insert(CHUNK_INDEX.to_string(), Value::from(3.0_f64));

		assert_eq!(payload_u32(&payload, CHUNK_INDEX), Some(3));
	}
}
