use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, MnemoService, Result};
use mnemo_cache::{BoundedTtlCache, CacheStats, key_prefix, scoped_text_key};
use mnemo_config::CacheLimits;

const CACHE_KIND: &str = "response";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
	/// Configured primary model, retried once on the fallback model.
	#[default]
	Primary,
	/// Configured fallback model only.
	Fast,
}

/// Prompt to reply cache keyed by model and normalized prompt.
pub struct ResponseCache {
	cache: BoundedTtlCache<String>,
}

impl ResponseCache {
	pub fn new(limits: &CacheLimits) -> Self {
		Self {
			cache: BoundedTtlCache::new(limits.capacity, Duration::from_secs(limits.ttl_seconds)),
		}
	}

	pub fn stats(&self) -> CacheStats {
		self.cache.stats()
	}

	fn get(&self, key: &str) -> Option<String> {
		self.cache.get(key)
	}

	fn insert(&self, key: String, reply: String) {
		self.cache.insert(key, reply);
	}
}

impl MnemoService {
	pub async fn generate(&self, prompt: &str, mode: GenerationMode) -> Result<String> {
		if prompt.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "prompt must be non-empty.".to_string() });
		}

		let cfg = &self.cfg.providers.generation;
		let model = match mode {
			GenerationMode::Primary => cfg.model.as_str(),
			GenerationMode::Fast => cfg.fallback_model.as_str(),
		};
		let key = scoped_text_key(model, prompt);

		if let Some(reply) = self.caches.responses.get(&key) {
			tracing::debug!(
				cache_kind = CACHE_KIND,
				hit = true,
				key_prefix = key_prefix(&key),
				model,
				"Cache lookup."
			);

			return Ok(reply);
		}

		tracing::debug!(
			cache_kind = CACHE_KIND,
			hit = false,
			key_prefix = key_prefix(&key),
			model,
			"Cache lookup."
		);

		let first_err = match self.providers.generation.generate(cfg, model, prompt).await {
			Ok(reply) => {
				self.caches.responses.insert(key, reply.clone());

				return Ok(reply);
			},
			Err(err) => err,
		};

		if mode == GenerationMode::Fast || cfg.fallback_model == cfg.model {
			tracing::warn!(error = %first_err, model, "Generation failed.");

			return Err(first_err.into());
		}

		tracing::warn!(
			error = %first_err,
			model,
			fallback_model = %cfg.fallback_model,
			"Primary model failed; retrying with fallback model."
		);

		match self.providers.generation.generate(cfg, &cfg.fallback_model, prompt).await {
			Ok(reply) => Ok(reply),
			Err(err) => {
				tracing::error!(
					error = %err,
					model,
					fallback_model = %cfg.fallback_model,
					"Fallback model failed."
				);

				Err(Error::Provider {
					message: format!(
						"Primary model failed ({first_err}); fallback model failed ({err})."
					),
				})
			},
		}
	}
}
