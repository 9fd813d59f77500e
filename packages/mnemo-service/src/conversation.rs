use serde::Serialize;
use time::OffsetDateTime;

use crate::{Error, MnemoService, Result, ingest};
use mnemo_domain::{CHAT_TYPE, DocumentKind, Metadata};
use mnemo_storage::models::StoredDocument;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationRecord {
	pub id: String,
	pub timestamp: String,
}

impl MnemoService {
	/// Stores one user/assistant exchange as a `chat` document so later queries can recall it.
	pub async fn record_conversation(
		&self,
		user_id: &str,
		message: &str,
		response: &str,
	) -> Result<ConversationRecord> {
		if user_id.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "user_id must be non-empty.".to_string() });
		}
		if message.trim().is_empty() && response.trim().is_empty() {
			return Err(Error::InvalidRequest {
				message: "message or response must be non-empty.".to_string(),
			});
		}

		let timestamp = ingest::format_timestamp(OffsetDateTime::now_utc())?;
		let record = StoredDocument {
			id: conversation_id(user_id, &timestamp),
			text: conversation_text(message, response),
			metadata: Metadata {
				user_id: user_id.to_string(),
				doc_type: CHAT_TYPE.to_string(),
				timestamp: Some(timestamp.clone()),
				kind: DocumentKind::Standalone,
			},
		};
		let vectors = ingest::embed_for_storage(self, std::slice::from_ref(&record.text)).await?;

		self.store.upsert(std::slice::from_ref(&record), &vectors).await?;

		tracing::info!(user_id, doc_id = %record.id, "Conversation recorded.");

		Ok(ConversationRecord { id: record.id, timestamp })
	}
}

pub fn conversation_id(user_id: &str, timestamp: &str) -> String {
	format!("chat_{user_id}_{timestamp}")
}

pub fn conversation_text(message: &str, response: &str) -> String {
	format!("User: {message}\nAssistant: {response}")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn formats_exchange() {
		assert_eq!(conversation_text("hi", "hello!"), "User: hi\nAssistant: hello!");
		assert_eq!(
			conversation_id("u1", "2024-06-01T10:00:00Z"),
			"chat_u1_2024-06-01T10:00:00Z"
		);
	}
}
