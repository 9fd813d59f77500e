mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Cache, CacheLimits, Chunking, Config, EmbeddingProviderConfig, LlmProviderConfig,
	ProviderConfig, Providers, Qdrant, Retrieval, Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if cfg.providers.generation.fallback_model.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.generation.fallback_model must be non-empty.".to_string(),
		});
	}

	for (label, limits) in
		[("cache.embedding", &cfg.cache.embedding), ("cache.response", &cfg.cache.response)]
	{
		if limits.capacity == 0 {
			return Err(Error::Validation {
				message: format!("{label}.capacity must be greater than zero."),
			});
		}
		if limits.ttl_seconds == 0 {
			return Err(Error::Validation {
				message: format!("{label}.ttl_seconds must be greater than zero."),
			});
		}
	}

	let retrieval = &cfg.retrieval;

	for (label, value) in [
		("retrieval.min_similarity", retrieval.min_similarity),
		("retrieval.recency_weight", retrieval.recency_weight),
		("retrieval.dedup_threshold", retrieval.dedup_threshold),
		("retrieval.neighbor_score", retrieval.neighbor_score),
	] {
		if !value.is_finite() {
			return Err(Error::Validation { message: format!("{label} must be a finite number.") });
		}
		if !(0.0..=1.0).contains(&value) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 0.0-1.0."),
			});
		}
	}

	if retrieval.max_context_length == 0 {
		return Err(Error::Validation {
			message: "retrieval.max_context_length must be greater than zero.".to_string(),
		});
	}
	if retrieval.candidate_multiplier == 0 {
		return Err(Error::Validation {
			message: "retrieval.candidate_multiplier must be greater than zero.".to_string(),
		});
	}
	if retrieval.rerank_pool_multiplier == 0 {
		return Err(Error::Validation {
			message: "retrieval.rerank_pool_multiplier must be greater than zero.".to_string(),
		});
	}
	if retrieval.summary_max_chars == 0 {
		return Err(Error::Validation {
			message: "retrieval.summary_max_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.chunking.chunk_size == 0 {
		return Err(Error::Validation {
			message: "chunking.chunk_size must be greater than zero.".to_string(),
		});
	}
	if cfg.chunking.chunk_overlap >= cfg.chunking.chunk_size {
		return Err(Error::Validation {
			message: "chunking.chunk_overlap must be less than chunking.chunk_size.".to_string(),
		});
	}

	let mut keys = vec![
		("embedding", &cfg.providers.embedding.api_key),
		("generation", &cfg.providers.generation.api_key),
	];

	if let Some(rerank) = cfg.providers.rerank.as_ref() {
		keys.push(("rerank", &rerank.api_key));
	}

	for (label, key) in keys {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.providers.rerank.as_ref().map(|rerank| rerank.api_base.trim().is_empty()).unwrap_or(false)
	{
		cfg.providers.rerank = None;
	}
	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}
}
