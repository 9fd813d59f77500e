pub mod conversation;
pub mod embedding_cache;
pub mod generation;
pub mod ingest;
pub mod retrieval;

mod error;

pub use conversation::ConversationRecord;
pub use embedding_cache::{Embedding, EmbeddingCache};
pub use error::{Error, Result};
pub use generation::{GenerationMode, ResponseCache};
pub use ingest::{IngestDocument, IngestRequest, IngestResponse};
pub use retrieval::{PlannedContext, RetrievalRequest, rerank::Reranker};

use std::{future::Future, pin::Pin, sync::Arc};

use serde::Serialize;

use mnemo_cache::CacheStats;
use mnemo_config::{Config, EmbeddingProviderConfig, LlmProviderConfig, ProviderConfig};
use mnemo_providers::{embedding, generation as completion, rerank};
use mnemo_storage::{
	models::{Candidate, DocumentFilter, StoredDocument},
	qdrant::QdrantStore,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, mnemo_providers::Result<Vec<Vec<f32>>>>;
}

pub trait RerankProvider
where
	Self: Send + Sync,
{
	fn rerank<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, mnemo_providers::Result<Vec<f32>>>;
}

pub trait GenerationProvider
where
	Self: Send + Sync,
{
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		model: &'a str,
		prompt: &'a str,
	) -> BoxFuture<'a, mnemo_providers::Result<String>>;
}

/// Nearest-neighbor store the pipeline reads candidates from and the ingest path writes to.
pub trait VectorStore
where
	Self: Send + Sync,
{
	fn query<'a>(
		&'a self,
		vector: Vec<f32>,
		limit: u64,
		filter: &'a DocumentFilter,
	) -> BoxFuture<'a, mnemo_storage::Result<Vec<Candidate>>>;

	fn get_by_id<'a>(
		&'a self,
		id: &'a str,
	) -> BoxFuture<'a, mnemo_storage::Result<Option<StoredDocument>>>;

	fn upsert<'a>(
		&'a self,
		docs: &'a [StoredDocument],
		vectors: &'a [Vec<f32>],
	) -> BoxFuture<'a, mnemo_storage::Result<()>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub rerank: Arc<dyn RerankProvider>,
	pub generation: Arc<dyn GenerationProvider>,
}

/// The two process-wide caches, built once from `[cache]` and shared by every call.
pub struct Caches {
	pub embeddings: EmbeddingCache,
	pub responses: ResponseCache,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
	pub reranker_available: bool,
	pub reranker_reason: Option<String>,
	pub embedding_cache: CacheStats,
	pub response_cache: CacheStats,
}

pub struct MnemoService {
	pub cfg: Config,
	pub store: Arc<dyn VectorStore>,
	pub providers: Providers,
	pub caches: Caches,
	pub reranker: Reranker,
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, mnemo_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl RerankProvider for DefaultProviders {
	fn rerank<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, mnemo_providers::Result<Vec<f32>>> {
		Box::pin(rerank::rerank(cfg, query, docs))
	}
}

impl GenerationProvider for DefaultProviders {
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		model: &'a str,
		prompt: &'a str,
	) -> BoxFuture<'a, mnemo_providers::Result<String>> {
		Box::pin(completion::generate(cfg, model, prompt))
	}
}

impl VectorStore for QdrantStore {
	fn query<'a>(
		&'a self,
		vector: Vec<f32>,
		limit: u64,
		filter: &'a DocumentFilter,
	) -> BoxFuture<'a, mnemo_storage::Result<Vec<Candidate>>> {
		Box::pin(QdrantStore::query(self, vector, limit, filter))
	}

	fn get_by_id<'a>(
		&'a self,
		id: &'a str,
	) -> BoxFuture<'a, mnemo_storage::Result<Option<StoredDocument>>> {
		Box::pin(QdrantStore::get_by_id(self, id))
	}

	fn upsert<'a>(
		&'a self,
		docs: &'a [StoredDocument],
		vectors: &'a [Vec<f32>],
	) -> BoxFuture<'a, mnemo_storage::Result<()>> {
		Box::pin(QdrantStore::upsert(self, docs, vectors))
	}
}

impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		rerank: Arc<dyn RerankProvider>,
		generation: Arc<dyn GenerationProvider>,
	) -> Self {
		Self { embedding, rerank, generation }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), rerank: provider.clone(), generation: provider }
	}
}

impl Caches {
	pub fn new(cfg: &Config) -> Self {
		Self {
			embeddings: EmbeddingCache::new(&cfg.cache.embedding),
			responses: ResponseCache::new(&cfg.cache.response),
		}
	}
}

impl MnemoService {
	/// Builds the service and resolves reranker availability with a single probe call.
	pub async fn start(cfg: Config, store: Arc<dyn VectorStore>, providers: Providers) -> Self {
		let reranker = Reranker::probe(providers.rerank.clone(), cfg.providers.rerank.as_ref()).await;

		Self::with_reranker(cfg, store, providers, reranker)
	}

	pub fn with_reranker(
		cfg: Config,
		store: Arc<dyn VectorStore>,
		providers: Providers,
		reranker: Reranker,
	) -> Self {
		let caches = Caches::new(&cfg);

		Self { cfg, store, providers, caches, reranker }
	}

	pub fn reranker_available(&self) -> bool {
		self.reranker.is_available()
	}

	pub fn status(&self) -> ServiceStatus {
		ServiceStatus {
			reranker_available: self.reranker.is_available(),
			reranker_reason: self.reranker.unavailable_reason().map(str::to_string),
			embedding_cache: self.caches.embeddings.stats(),
			response_cache: self.caches.responses.stats(),
		}
	}

	/// Embeds texts through the shared embedding cache with the configured provider.
	pub async fn embed(&self, texts: &[String]) -> Vec<Embedding> {
		self.caches
			.embeddings
			.embed(self.providers.embedding.as_ref(), &self.cfg.providers.embedding, texts)
			.await
	}
}
