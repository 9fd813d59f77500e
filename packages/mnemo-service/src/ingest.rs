use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use crate::{Error, MnemoService, Result};
use mnemo_chunking::{ChunkingConfig, split_text};
use mnemo_domain::{DocumentKind, Metadata, chunk_id};
use mnemo_storage::models::StoredDocument;

const DEFAULT_DOC_TYPE: &str = "context";

#[derive(Debug, Clone, Deserialize)]
pub struct IngestDocument {
	/// Random UUID when absent.
	#[serde(default)]
	pub id: Option<String>,
	pub text: String,
	#[serde(rename = "type", default = "default_doc_type")]
	pub doc_type: String,
	/// Ingestion time when absent.
	#[serde(default)]
	pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestRequest {
	pub user_id: String,
	pub docs: Vec<IngestDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestResponse {
	pub chunks_created: usize,
	pub docs_processed: usize,
	pub avg_chunks_per_doc: f32,
}

impl MnemoService {
	/// Splits, embeds in one batch, and upserts every document of the request.
	///
	/// A document that fits in one chunk is stored under its own id; longer ones are stored as
	/// `{id}_chunk_{i}` records. Nothing is written if any text only got a fallback vector.
	pub async fn ingest(&self, req: IngestRequest) -> Result<IngestResponse> {
		if req.user_id.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "user_id must be non-empty.".to_string() });
		}

		let chunking = ChunkingConfig {
			chunk_size: self.cfg.chunking.chunk_size,
			chunk_overlap: self.cfg.chunking.chunk_overlap,
		};
		let ingested_at = format_timestamp(OffsetDateTime::now_utc())?;
		let docs_processed = req.docs.len();
		let mut records = Vec::new();

		for doc in req.docs {
			records.extend(split_document(&req.user_id, doc, &chunking, &ingested_at));
		}

		if !records.is_empty() {
			let texts = records.iter().map(|record| record.text.clone()).collect::<Vec<_>>();
			let vectors = embed_for_storage(self, &texts).await?;

			self.store.upsert(&records, &vectors).await?;
		}

		tracing::info!(
			user_id = %req.user_id,
			docs_processed,
			chunks_created = records.len(),
			"Documents ingested."
		);

		Ok(IngestResponse {
			chunks_created: records.len(),
			docs_processed,
			avg_chunks_per_doc: if docs_processed == 0 {
				0.0
			} else {
				records.len() as f32 / docs_processed as f32
			},
		})
	}
}

pub(crate) fn split_document(
	user_id: &str,
	doc: IngestDocument,
	chunking: &ChunkingConfig,
	ingested_at: &str,
) -> Vec<StoredDocument> {
	let id = doc
		.id
		.filter(|id| !id.trim().is_empty())
		.unwrap_or_else(|| Uuid::new_v4().to_string());
	let timestamp = doc.timestamp.unwrap_or_else(|| ingested_at.to_string());
	let metadata = |kind| Metadata {
		user_id: user_id.to_string(),
		doc_type: doc.doc_type.clone(),
		timestamp: Some(timestamp.clone()),
		kind,
	};
	let chunks = split_text(&doc.text, chunking);

	if chunks.len() == 1 && doc.text.chars().count() <= chunking.chunk_size {
		return vec![StoredDocument {
			id,
			text: doc.text.clone(),
			metadata: metadata(DocumentKind::Standalone),
		}];
	}

	let total = chunks.len() as u32;

	chunks
		.into_iter()
		.map(|chunk| StoredDocument {
			id: chunk_id(&id, chunk.chunk_index),
			text: chunk.text,
			metadata: metadata(DocumentKind::Chunk {
				source_id: id.clone(),
				index: chunk.chunk_index,
				total: Some(total),
			}),
		})
		.collect()
}

/// Embeds texts that are about to be persisted; fallback vectors are refused.
pub(crate) async fn embed_for_storage(
	service: &MnemoService,
	texts: &[String],
) -> Result<Vec<Vec<f32>>> {
	let embeddings = service.embed(texts).await;

	if embeddings.iter().any(|embedding| embedding.fallback) {
		return Err(Error::Provider {
			message: "Embedding provider unavailable; refusing to store zero vectors.".to_string(),
		});
	}

	Ok(embeddings.into_iter().map(|embedding| embedding.vector).collect())
}

pub(crate) fn format_timestamp(ts: OffsetDateTime) -> Result<String> {
	ts.format(&Rfc3339).map_err(|err| Error::InvalidRequest {
		message: format!("Failed to format timestamp: {err}"),
	})
}

fn default_doc_type() -> String {
	DEFAULT_DOC_TYPE.to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn chunking() -> ChunkingConfig {
		ChunkingConfig { chunk_size: 40, chunk_overlap: 0 }
	}

	fn document(id: Option<&str>, text: &str) -> IngestDocument {
		IngestDocument {
			id: id.map(str::to_string),
			text: text.to_string(),
			doc_type: "context".to_string(),
			timestamp: None,
		}
	}

	#[test]
	fn short_document_is_standalone() {
		let records = split_document(
			"u1",
			document(Some("note-1"), "Prefers morning study sessions."),
			&chunking(),
			"2024-06-01T00:00:00Z",
		);

		assert_eq!(records.len(), 1);
		assert_eq!(records[0].id, "note-1");
		assert_eq!(records[0].metadata.kind, DocumentKind::Standalone);
		assert_eq!(records[0].metadata.timestamp.as_deref(), Some("2024-06-01T00:00:00Z"));
	}

	#[test]
	fn long_document_becomes_numbered_chunks() {
		let text = "Week one covers syntax. Week two covers ownership. Week three covers traits.";
		let records = split_document("u1", document(Some("syllabus"), text), &chunking(), "now");

		assert!(records.len() > 1);

		for (idx, record) in records.iter().enumerate() {
			assert_eq!(record.id, format!("syllabus_chunk_{idx}"));
			assert_eq!(
				record.metadata.kind,
				DocumentKind::Chunk {
					source_id: "syllabus".to_string(),
					index: idx as u32,
					total: Some(records.len() as u32),
				}
			);
		}
	}

	#[test]
	fn missing_id_gets_a_uuid() {
		let records = split_document("u1", document(None, "short"), &chunking(), "now");

		assert!(Uuid::parse_str(&records[0].id).is_ok());
	}

	#[test]
	fn blank_document_produces_nothing() {
		assert!(split_document("u1", document(Some("x"), "   "), &chunking(), "now").is_empty());
	}
}
