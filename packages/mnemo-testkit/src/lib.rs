mod error;

pub use error::{Error, Result};

use std::{
	collections::HashMap,
	sync::{
		Arc, Mutex, MutexGuard,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
};

use qdrant_client::QdrantError;

use mnemo_cache::normalize_text;
use mnemo_config::{Config, EmbeddingProviderConfig, LlmProviderConfig, ProviderConfig};
use mnemo_domain::{DocumentKind, Metadata, scoring};
use mnemo_service::{
	BoxFuture, EmbeddingProvider, GenerationProvider, MnemoService, Providers, RerankProvider,
	VectorStore,
};
use mnemo_storage::models::{Candidate, DocumentFilter, StoredDocument};

const TEST_CONFIG_TOML: &str = r#"
[service]
http_bind = "127.0.0.1:0"
log_level = "debug"

[storage.qdrant]
url        = "http://127.0.0.1:6334"
collection = "mnemo_test"
vector_dim = __DIM__

[providers.embedding]
provider_id = "test"
api_base    = "http://127.0.0.1:1"
api_key     = "test-key"
path        = "/embeddings"
model       = "embed-test"
dimensions  = __DIM__
timeout_ms  = 1000

[providers.generation]
provider_id    = "test"
api_base       = "http://127.0.0.1:1"
api_key        = "test-key"
path           = "/chat/completions"
model          = "primary-model"
fallback_model = "lite-model"
temperature    = 0.2
timeout_ms     = 1000

[providers.rerank]
provider_id = "test"
api_base    = "http://127.0.0.1:1"
api_key     = "test-key"
path        = "/rerank"
model       = "rerank-test"
timeout_ms  = 1000

[chunking]
chunk_size    = 120
chunk_overlap = 20
"#;

/// Validated configuration pointing at unreachable endpoints, with `dim`-sized vectors.
pub fn test_config(dim: u32) -> Result<Config> {
	let raw = TEST_CONFIG_TOML.replace("__DIM__", &dim.to_string());
	let cfg: Config = toml::from_str(&raw)?;

	mnemo_config::validate(&cfg)?;

	Ok(cfg)
}

/// A started service together with handles to every scripted dependency it was built from.
pub struct TestService {
	pub service: MnemoService,
	pub store: Arc<MemoryStore>,
	pub embedder: Arc<StaticEmbedder>,
	pub reranker: Arc<ScriptedReranker>,
	pub generator: Arc<ScriptedGenerator>,
}

pub async fn test_service(
	cfg: Config,
	reranker: ScriptedReranker,
	generator: ScriptedGenerator,
) -> TestService {
	let store = Arc::new(MemoryStore::new());
	let embedder = Arc::new(StaticEmbedder::new(cfg.providers.embedding.dimensions as usize));
	let reranker = Arc::new(reranker);
	let generator = Arc::new(generator);
	let providers = Providers::new(embedder.clone(), reranker.clone(), generator.clone());
	let service = MnemoService::start(cfg, store.clone(), providers).await;

	TestService { service, store, embedder, reranker, generator }
}

pub fn standalone(id: &str, user_id: &str, doc_type: &str, text: &str) -> StoredDocument {
	StoredDocument {
		id: id.to_string(),
		text: text.to_string(),
		metadata: Metadata {
			user_id: user_id.to_string(),
			doc_type: doc_type.to_string(),
			timestamp: None,
			kind: DocumentKind::Standalone,
		},
	}
}

pub fn chunk(source_id: &str, index: u32, total: u32, user_id: &str, text: &str) -> StoredDocument {
	StoredDocument {
		id: mnemo_domain::chunk_id(source_id, index),
		text: text.to_string(),
		metadata: Metadata {
			user_id: user_id.to_string(),
			doc_type: "context".to_string(),
			timestamp: None,
			kind: DocumentKind::Chunk {
				source_id: source_id.to_string(),
				index,
				total: Some(total),
			},
		},
	}
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|err| err.into_inner())
}

fn provider_error(message: &str) -> mnemo_providers::Error {
	mnemo_providers::Error::InvalidResponse { message: message.to_string() }
}

/// In-process vector store ranking by cosine distance over everything inserted.
#[derive(Default)]
pub struct MemoryStore {
	records: Mutex<Vec<(StoredDocument, Vec<f32>)>>,
	fail_queries: AtomicBool,
	fail_lookups: AtomicBool,
	lookups: AtomicUsize,
}
impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&self, doc: StoredDocument, vector: Vec<f32>) {
		let mut records = lock(&self.records);

		records.retain(|(existing, _)| existing.id != doc.id);
		records.push((doc, vector));
	}

	pub fn documents(&self) -> Vec<StoredDocument> {
		lock(&self.records).iter().map(|(doc, _)| doc.clone()).collect()
	}

	pub fn vector(&self, id: &str) -> Option<Vec<f32>> {
		lock(&self.records).iter().find(|(doc, _)| doc.id == id).map(|(_, vector)| vector.clone())
	}

	pub fn set_fail_queries(&self, fail: bool) {
		self.fail_queries.store(fail, Ordering::SeqCst);
	}

	pub fn set_fail_lookups(&self, fail: bool) {
		self.fail_lookups.store(fail, Ordering::SeqCst);
	}

	pub fn lookup_count(&self) -> usize {
		self.lookups.load(Ordering::SeqCst)
	}

	fn nearest(&self, vector: &[f32], limit: u64, filter: &DocumentFilter) -> Vec<Candidate> {
		let records = lock(&self.records);
		let mut hits = records
			.iter()
			.filter(|(doc, _)| filter.allows(&doc.metadata))
			.map(|(doc, stored)| Candidate {
				id: doc.id.clone(),
				text: doc.text.clone(),
				metadata: doc.metadata.clone(),
				distance: 1.0 - scoring::cosine_similarity(vector, stored).unwrap_or(0.0),
			})
			.collect::<Vec<_>>();

		hits.sort_by(|a, b| scoring::cmp_f32_desc(b.distance, a.distance));
		hits.truncate(limit as usize);

		hits
	}
}

impl VectorStore for MemoryStore {
	fn query<'a>(
		&'a self,
		vector: Vec<f32>,
		limit: u64,
		filter: &'a DocumentFilter,
	) -> BoxFuture<'a, mnemo_storage::Result<Vec<Candidate>>> {
		Box::pin(async move {
			if self.fail_queries.load(Ordering::SeqCst) {
				return Err(QdrantError::ConversionError("Scripted query failure.".to_string()).into());
			}

			Ok(self.nearest(&vector, limit, filter))
		})
	}

	fn get_by_id<'a>(
		&'a self,
		id: &'a str,
	) -> BoxFuture<'a, mnemo_storage::Result<Option<StoredDocument>>> {
		Box::pin(async move {
			self.lookups.fetch_add(1, Ordering::SeqCst);

			if self.fail_lookups.load(Ordering::SeqCst) {
				return Err(QdrantError::ConversionError("Scripted lookup failure.".to_string()).into());
			}

			Ok(lock(&self.records).iter().find(|(doc, _)| doc.id == id).map(|(doc, _)| doc.clone()))
		})
	}

	fn upsert<'a>(
		&'a self,
		docs: &'a [StoredDocument],
		vectors: &'a [Vec<f32>],
	) -> BoxFuture<'a, mnemo_storage::Result<()>> {
		Box::pin(async move {
			if docs.len() != vectors.len() {
				return Err(mnemo_storage::Error::InvalidArgument(
					"Document and vector counts differ.".to_string(),
				));
			}

			for (doc, vector) in docs.iter().zip(vectors) {
				self.insert(doc.clone(), vector.clone());
			}

			Ok(())
		})
	}
}

/// Embedder with pinned vectors for chosen texts and hash-derived vectors for the rest.
///
/// Every batch it receives is recorded so tests can assert on provider traffic.
pub struct StaticEmbedder {
	dim: usize,
	pinned: Mutex<HashMap<String, Vec<f32>>>,
	batches: Mutex<Vec<Vec<String>>>,
	fail: AtomicBool,
}
impl StaticEmbedder {
	pub fn new(dim: usize) -> Self {
		Self {
			dim,
			pinned: Mutex::new(HashMap::new()),
			batches: Mutex::new(Vec::new()),
			fail: AtomicBool::new(false),
		}
	}

	pub fn pin(&self, text: &str, vector: Vec<f32>) {
		lock(&self.pinned).insert(normalize_text(text), vector);
	}

	pub fn set_fail(&self, fail: bool) {
		self.fail.store(fail, Ordering::SeqCst);
	}

	pub fn call_count(&self) -> usize {
		lock(&self.batches).len()
	}

	pub fn batches(&self) -> Vec<Vec<String>> {
		lock(&self.batches).clone()
	}

	pub fn vector_for(&self, text: &str) -> Vec<f32> {
		let normalized = normalize_text(text);

		if let Some(vector) = lock(&self.pinned).get(&normalized) {
			return vector.clone();
		}

		let digest = blake3::hash(normalized.as_bytes());
		let bytes = digest.as_bytes();

		(0..self.dim).map(|idx| f32::from(bytes[idx % bytes.len()]) / 127.5 - 1.0).collect()
	}
}

impl EmbeddingProvider for StaticEmbedder {
	fn embed<'a>(
		&'a self,
		_: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, mnemo_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(async move {
			lock(&self.batches).push(texts.to_vec());

			if self.fail.load(Ordering::SeqCst) {
				return Err(provider_error("Scripted embedding failure."));
			}

			Ok(texts.iter().map(|text| self.vector_for(text)).collect())
		})
	}
}

type ScoreFn = dyn Fn(&str, &str) -> f32 + Send + Sync;

enum RerankScript {
	Score(Box<ScoreFn>),
	Fail,
	DropLast,
}

/// Reranker that scores with a closure, fails, or returns one score too few.
///
/// Every batch of document texts it receives is recorded, the startup probe included.
pub struct ScriptedReranker {
	script: RerankScript,
	batches: Mutex<Vec<Vec<String>>>,
}
impl ScriptedReranker {
	fn with_script(script: RerankScript) -> Self {
		Self { script, batches: Mutex::new(Vec::new()) }
	}

	pub fn scoring(score: impl Fn(&str, &str) -> f32 + Send + Sync + 'static) -> Self {
		Self::with_script(RerankScript::Score(Box::new(score)))
	}

	pub fn failing() -> Self {
		Self::with_script(RerankScript::Fail)
	}

	/// Answers the single-document startup probe but misaligns every larger batch.
	pub fn dropping_last() -> Self {
		Self::with_script(RerankScript::DropLast)
	}

	pub fn call_count(&self) -> usize {
		lock(&self.batches).len()
	}

	pub fn batches(&self) -> Vec<Vec<String>> {
		lock(&self.batches).clone()
	}
}

impl RerankProvider for ScriptedReranker {
	fn rerank<'a>(
		&'a self,
		_: &'a ProviderConfig,
		query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, mnemo_providers::Result<Vec<f32>>> {
		Box::pin(async move {
			lock(&self.batches).push(docs.to_vec());

			match &self.script {
				RerankScript::Score(score) => Ok(docs.iter().map(|doc| score(query, doc)).collect()),
				RerankScript::Fail => Err(provider_error("Scripted rerank failure.")),
				RerankScript::DropLast => {
					let keep = if docs.len() > 1 { docs.len() - 1 } else { docs.len() };

					Ok(vec![0.5; keep])
				},
			}
		})
	}
}

/// Generator answering per model; models without a script fail.
#[derive(Default)]
pub struct ScriptedGenerator {
	replies: Mutex<HashMap<String, String>>,
	calls: Mutex<Vec<String>>,
}
impl ScriptedGenerator {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn reply(self, model: &str, text: &str) -> Self {
		lock(&self.replies).insert(model.to_string(), text.to_string());

		self
	}

	/// Models called so far, in call order.
	pub fn calls(&self) -> Vec<String> {
		lock(&self.calls).clone()
	}
}

impl GenerationProvider for ScriptedGenerator {
	fn generate<'a>(
		&'a self,
		_: &'a LlmProviderConfig,
		model: &'a str,
		prompt: &'a str,
	) -> BoxFuture<'a, mnemo_providers::Result<String>> {
		Box::pin(async move {
			lock(&self.calls).push(model.to_string());

			match lock(&self.replies).get(model) {
				Some(reply) => Ok(format!("{reply}: {prompt}")),
				None => Err(provider_error("Scripted generation failure.")),
			}
		})
	}
}
