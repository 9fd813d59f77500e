use qdrant_client::{
	Payload,
	qdrant::{
		Condition, CreateCollectionBuilder, Distance, Filter, GetPointsBuilder, PointId,
		PointStruct, Query, QueryPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
	},
};
use uuid::Uuid;

use crate::{
	Error, Result,
	models::{Candidate, DocumentFilter, StoredDocument},
	payload,
};

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &mnemo_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	/// Creates the collection with cosine distance when it does not exist yet.
	pub async fn ensure_collection(&self) -> Result<()> {
		if self.client.collection_exists(self.collection.clone()).await? {
			return Ok(());
		}

		self.client
			.create_collection(
				CreateCollectionBuilder::new(self.collection.clone()).vectors_config(
					VectorParamsBuilder::new(u64::from(self.vector_dim), Distance::Cosine),
				),
			)
			.await?;

		tracing::info!(
			collection = %self.collection,
			vector_dim = self.vector_dim,
			"Created vector collection."
		);

		Ok(())
	}

	pub async fn query(
		&self,
		vector: Vec<f32>,
		limit: u64,
		filter: &DocumentFilter,
	) -> Result<Vec<Candidate>> {
		self.check_dim(&vector)?;

		let search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.filter(build_filter(filter))
			.limit(limit)
			.with_payload(true);
		let response = self.client.query(search).await?;
		let mut out = Vec::with_capacity(response.result.len());

		for point in response.result {
			let Some(doc) = payload::document_from_payload(&point.payload) else {
				tracing::warn!(
					collection = %self.collection,
					"Vector hit is missing required payload fields."
				);

				continue;
			};

			out.push(Candidate {
				id: doc.id,
				text: doc.text,
				metadata: doc.metadata,
				distance: 1.0 - point.score,
			});
		}

		Ok(out)
	}

	pub async fn get_by_id(&self, id: &str) -> Result<Option<StoredDocument>> {
		let request = GetPointsBuilder::new(self.collection.clone(), vec![point_id(id)])
			.with_payload(true);
		let response = self.client.get_points(request).await?;

		Ok(response.result.iter().find_map(|point| payload::document_from_payload(&point.payload)))
	}

	pub async fn upsert(&self, docs: &[StoredDocument], vectors: &[Vec<f32>]) -> Result<()> {
		if docs.len() != vectors.len() {
			return Err(Error::InvalidArgument(format!(
				"{} documents but {} vectors.",
				docs.len(),
				vectors.len()
			)));
		}
		if docs.is_empty() {
			return Ok(());
		}

		let mut points = Vec::with_capacity(docs.len());

		for (doc, vector) in docs.iter().zip(vectors) {
			self.check_dim(vector)?;

			points.push(PointStruct::new(
				point_id(&doc.id),
				vector.clone(),
				Payload::from(payload::document_payload(doc)),
			));
		}

		self.client
			.upsert_points(UpsertPointsBuilder::new(self.collection.clone(), points).wait(true))
			.await?;

		Ok(())
	}

	fn check_dim(&self, vector: &[f32]) -> Result<()> {
		if vector.len() != self.vector_dim as usize {
			return Err(Error::InvalidArgument(format!(
				"Vector dimension {} does not match collection dimension {}.",
				vector.len(),
				self.vector_dim
			)));
		}

		Ok(())
	}
}

/// Deterministic point id for a document id; Qdrant only accepts integers and UUIDs.
pub fn point_id(doc_id: &str) -> PointId {
	PointId::from(point_uuid(doc_id).to_string())
}

pub fn point_uuid(doc_id: &str) -> Uuid {
	Uuid::new_v5(&Uuid::NAMESPACE_OID, doc_id.as_bytes())
}

pub fn build_filter(filter: &DocumentFilter) -> Filter {
	let mut must = vec![Condition::matches(payload::USER_ID, filter.user_id.clone())];

	if !filter.types.is_empty() {
		must.push(Condition::matches(payload::TYPE, filter.types.clone()));
	}

	Filter::must(must)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn point_ids_are_stable_per_document() {
		assert_eq!(point_uuid("doc-1"), point_uuid("doc-1"));
		assert_ne!(point_uuid("doc-1"), point_uuid("doc-1_chunk_0"));
	}

	#[test]
	fn type_condition_only_when_types_given() {
		let user_only = DocumentFilter { user_id: "u1".to_string(), types: Vec::new() };
		let typed = DocumentFilter {
			user_id: "u1".to_string(),
			types: vec!["context".to_string(), "plan".to_string()],
		};

		assert_eq!(build_filter(&user_only).must.len(), 1);
		assert_eq!(build_filter(&typed).must.len(), 2);
	}
}
