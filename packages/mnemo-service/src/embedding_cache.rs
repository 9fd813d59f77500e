use std::{
	collections::{HashMap, HashSet},
	time::Duration,
};

use mnemo_cache::{BoundedTtlCache, CacheStats, key_prefix, text_key};
use mnemo_config::{CacheLimits, EmbeddingProviderConfig};

use crate::EmbeddingProvider;

const CACHE_KIND: &str = "embedding";

#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
	pub vector: Vec<f32>,
	/// Zero vector substituted after a provider failure. Never cached and never treated as a
	/// near-duplicate of anything.
	pub fallback: bool,
}

/// Text to vector cache keyed by normalized text.
pub struct EmbeddingCache {
	cache: BoundedTtlCache<Vec<f32>>,
}

impl Embedding {
	fn fallback(dimensions: u32) -> Self {
		Self { vector: vec![0.0; dimensions as usize], fallback: true }
	}
}

impl EmbeddingCache {
	pub fn new(limits: &CacheLimits) -> Self {
		Self {
			cache: BoundedTtlCache::new(limits.capacity, Duration::from_secs(limits.ttl_seconds)),
		}
	}

	pub fn stats(&self) -> CacheStats {
		self.cache.stats()
	}

	/// Returns one embedding per input text, in input order.
	///
	/// Cache misses are sent to the provider in a single batch with duplicates removed. If that
	/// call fails or returns the wrong shape, every missed text gets a fallback zero vector.
	pub async fn embed(
		&self,
		provider: &dyn EmbeddingProvider,
		cfg: &EmbeddingProviderConfig,
		texts: &[String],
	) -> Vec<Embedding> {
		let keys = texts.iter().map(|text| text_key(text)).collect::<Vec<_>>();
		let mut resolved = keys
			.iter()
			.map(|key| self.cache.get(key).map(|vector| Embedding { vector, fallback: false }))
			.collect::<Vec<_>>();
		let mut miss_keys = Vec::new();
		let mut miss_texts = Vec::new();
		let mut seen = HashSet::new();

		for (idx, key) in keys.iter().enumerate() {
			if resolved[idx].is_none() && seen.insert(key.as_str()) {
				miss_keys.push(key.clone());
				miss_texts.push(texts[idx].clone());
			}
		}

		tracing::debug!(
			cache_kind = CACHE_KIND,
			requested = texts.len(),
			misses = miss_texts.len(),
			"Embedding cache lookup."
		);

		if miss_texts.is_empty() {
			return resolved.into_iter().flatten().collect();
		}

		let fetched = self.fetch_misses(provider, cfg, &miss_keys, &miss_texts).await;

		for (slot, key) in resolved.iter_mut().zip(keys.iter()) {
			if slot.is_some() {
				continue;
			}

			*slot = Some(match fetched.get(key) {
				Some(vector) => Embedding { vector: vector.clone(), fallback: false },
				None => Embedding::fallback(cfg.dimensions),
			});
		}

		resolved.into_iter().flatten().collect()
	}

	async fn fetch_misses(
		&self,
		provider: &dyn EmbeddingProvider,
		cfg: &EmbeddingProviderConfig,
		keys: &[String],
		texts: &[String],
	) -> HashMap<String, Vec<f32>> {
		let vectors = match provider.embed(cfg, texts).await {
			Ok(vectors) => vectors,
			Err(err) => {
				tracing::warn!(
					error = %err,
					cache_kind = CACHE_KIND,
					batch_size = texts.len(),
					"Embedding provider failed; using zero vectors."
				);

				return HashMap::new();
			},
		};

		if vectors.len() != texts.len()
			|| vectors.iter().any(|vector| vector.len() != cfg.dimensions as usize)
		{
			tracing::warn!(
				cache_kind = CACHE_KIND,
				expected_count = texts.len(),
				received_count = vectors.len(),
				dimensions = cfg.dimensions,
				"Embedding response has the wrong shape; using zero vectors."
			);

			return HashMap::new();
		}

		let mut fetched = HashMap::with_capacity(keys.len());

		for (key, vector) in keys.iter().zip(vectors) {
			tracing::trace!(cache_kind = CACHE_KIND, key_prefix = key_prefix(key), "Cache store.");
			self.cache.insert(key.clone(), vector.clone());
			fetched.insert(key.clone(), vector);
		}

		fetched
	}
}
