use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub cache: Cache,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub chunking: Chunking,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub qdrant: Qdrant,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub generation: LlmProviderConfig,
	/// Optional. Without it the cross-encoder stage is reported unavailable and skipped.
	pub rerank: Option<ProviderConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	/// Lighter model used for fast requests and as the retry target when `model` fails.
	pub fallback_model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cache {
	#[serde(default = "default_embedding_cache")]
	pub embedding: CacheLimits,
	#[serde(default = "default_response_cache")]
	pub response: CacheLimits,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CacheLimits {
	pub capacity: usize,
	pub ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Retrieval {
	#[serde(default = "default_min_similarity")]
	pub min_similarity: f32,
	#[serde(default = "default_max_context_length")]
	pub max_context_length: usize,
	#[serde(default = "default_recency_weight")]
	pub recency_weight: f32,
	#[serde(default = "default_true")]
	pub deduplicate: bool,
	#[serde(default = "default_true")]
	pub use_reranking: bool,
	#[serde(default = "default_candidate_multiplier")]
	pub candidate_multiplier: u32,
	#[serde(default = "default_dedup_threshold")]
	pub dedup_threshold: f32,
	#[serde(default = "default_rerank_pool_multiplier")]
	pub rerank_pool_multiplier: u32,
	/// Fixed score assigned to neighbors pulled in by chunk adjacency.
	#[serde(default = "default_neighbor_score")]
	pub neighbor_score: f32,
	#[serde(default = "default_summary_max_chars")]
	pub summary_max_chars: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chunking {
	#[serde(default = "default_chunk_size")]
	pub chunk_size: usize,
	#[serde(default = "default_chunk_overlap")]
	pub chunk_overlap: usize,
}

impl Default for Cache {
	fn default() -> Self {
		Self { embedding: default_embedding_cache(), response: default_response_cache() }
	}
}

impl Default for Retrieval {
	fn default() -> Self {
		Self {
			min_similarity: default_min_similarity(),
			max_context_length: default_max_context_length(),
			recency_weight: default_recency_weight(),
			deduplicate: true,
			use_reranking: true,
			candidate_multiplier: default_candidate_multiplier(),
			dedup_threshold: default_dedup_threshold(),
			rerank_pool_multiplier: default_rerank_pool_multiplier(),
			neighbor_score: default_neighbor_score(),
			summary_max_chars: default_summary_max_chars(),
		}
	}
}

impl Default for Chunking {
	fn default() -> Self {
		Self { chunk_size: default_chunk_size(), chunk_overlap: default_chunk_overlap() }
	}
}

fn default_embedding_cache() -> CacheLimits {
	CacheLimits { capacity: 10_000, ttl_seconds: 7 * 24 * 60 * 60 }
}

fn default_response_cache() -> CacheLimits {
	CacheLimits { capacity: 1_000, ttl_seconds: 60 * 60 }
}

fn default_min_similarity() -> f32 {
	0.65
}

fn default_max_context_length() -> usize {
	2_000
}

fn default_recency_weight() -> f32 {
	0.2
}

fn default_true() -> bool {
	true
}

fn default_candidate_multiplier() -> u32 {
	3
}

fn default_dedup_threshold() -> f32 {
	0.95
}

fn default_rerank_pool_multiplier() -> u32 {
	2
}

fn default_neighbor_score() -> f32 {
	0.75
}

fn default_summary_max_chars() -> usize {
	2_000
}

fn default_chunk_size() -> usize {
	1_000
}

fn default_chunk_overlap() -> usize {
	200
}
