use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use mnemo_config::{Config, Error};

const SAMPLE_CONFIG_TOML: &str = include_str!("fixtures/sample_config.toml");

fn sample_with(section: &[&str], key: &str, value: Value) -> String {
	let mut root: Value = toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");
	let mut table = root.as_table_mut().expect("Sample config must be a table.");

	for name in section {
		table = table
			.get_mut(*name)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Sample config must include [{name}]."));
	}

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render sample config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("mnemo_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse test config.")
}

fn load_err(payload: String) -> Error {
	let path = write_temp_config(payload);
	let result = mnemo_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result.expect_err("Expected config validation error.")
}

#[test]
fn sample_config_is_valid() {
	let path = write_temp_config(SAMPLE_CONFIG_TOML.to_string());
	let result = mnemo_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Sample config must load.");

	assert_eq!(cfg.cache.embedding.capacity, 10_000);
	assert_eq!(cfg.cache.response.ttl_seconds, 3_600);
	assert!(cfg.providers.rerank.is_some());
}

#[test]
fn missing_sections_fall_back_to_defaults() {
	let mut root: Value = toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");
	let table = root.as_table_mut().expect("Sample config must be a table.");

	table.remove("cache");
	table.remove("retrieval");
	table.remove("chunking");

	let payload = toml::to_string(&root).expect("Failed to render sample config.");
	let cfg: Config = toml::from_str(&payload).expect("Failed to parse trimmed config.");

	assert_eq!(cfg.cache.embedding.capacity, 10_000);
	assert_eq!(cfg.cache.embedding.ttl_seconds, 604_800);
	assert_eq!(cfg.cache.response.capacity, 1_000);
	assert_eq!(cfg.retrieval.max_context_length, 2_000);
	assert!((cfg.retrieval.dedup_threshold - 0.95).abs() < f32::EPSILON);
	assert_eq!(cfg.chunking.chunk_overlap, 200);
	assert!(mnemo_config::validate(&cfg).is_ok());
}

#[test]
fn embedding_dimensions_must_match_vector_dim() {
	let err = load_err(sample_with(&["storage", "qdrant"], "vector_dim", Value::Integer(1_024)));

	assert!(
		err.to_string()
			.contains("providers.embedding.dimensions must match storage.qdrant.vector_dim."),
		"Unexpected error: {err}"
	);
}

#[test]
fn recency_weight_must_be_a_fraction() {
	let err = load_err(sample_with(&["retrieval"], "recency_weight", Value::Float(1.5)));

	assert!(
		err.to_string().contains("retrieval.recency_weight must be in the range 0.0-1.0."),
		"Unexpected error: {err}"
	);
}

#[test]
fn chunk_overlap_must_be_smaller_than_chunk_size() {
	let mut cfg = base_config();

	cfg.chunking.chunk_overlap = cfg.chunking.chunk_size;

	let err = mnemo_config::validate(&cfg).expect_err("Expected chunk overlap validation error.");

	assert!(
		err.to_string().contains("chunking.chunk_overlap must be less than chunking.chunk_size."),
		"Unexpected error: {err}"
	);
}

#[test]
fn cache_limits_must_be_positive() {
	let mut cfg = base_config();

	cfg.cache.response.ttl_seconds = 0;

	let err = mnemo_config::validate(&cfg).expect_err("Expected cache TTL validation error.");

	assert!(
		err.to_string().contains("cache.response.ttl_seconds must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn blank_rerank_api_base_disables_rerank() {
	let payload = sample_with(&["providers", "rerank"], "api_base", Value::String("  ".to_string()));
	let path = write_temp_config(payload);
	let result = mnemo_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Config with blank rerank api_base must load.");

	assert!(cfg.providers.rerank.is_none());
}

#[test]
fn provider_api_keys_must_be_non_empty() {
	let mut cfg = base_config();

	cfg.providers.generation.api_key = " ".to_string();

	let err = mnemo_config::validate(&cfg).expect_err("Expected api_key validation error.");

	assert!(matches!(err, Error::Validation { .. }));
	assert!(
		err.to_string().contains("Provider generation api_key must be non-empty."),
		"Unexpected error: {err}"
	);
}
