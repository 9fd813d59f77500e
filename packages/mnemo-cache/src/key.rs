/// Collapses whitespace runs to single spaces so formatting differences share a cache key.
pub fn normalize_text(text: &str) -> String {
	text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn text_key(text: &str) -> String {
	blake3::hash(normalize_text(text).as_bytes()).to_hex().to_string()
}

/// Key for text whose cached value also depends on a scope such as a model name.
pub fn scoped_text_key(scope: &str, text: &str) -> String {
	let payload = format!("{scope}:{}", normalize_text(text));

	blake3::hash(payload.as_bytes()).to_hex().to_string()
}

const KEY_PREFIX_CHARS: usize = 12;

/// First twelve characters of `key`, for log fields.
pub fn key_prefix(key: &str) -> &str {
	key.char_indices().nth(KEY_PREFIX_CHARS).map_or(key, |(idx, _)| &key[..idx])
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn normalization_collapses_all_whitespace() {
		assert_eq!(normalize_text("  a\tb \n\n c  "), "a b c");
	}

	#[test]
	fn scope_separates_keys() {
		assert_ne!(scoped_text_key("model-a", "hello"), scoped_text_key("model-b", "hello"));
		assert_eq!(scoped_text_key("model-a", "hello  world"), scoped_text_key("model-a", "hello world"));
	}

	#[test]
	fn key_prefix_is_stable() {
		let key = text_key("prefix me");

		assert_eq!(key_prefix(&key).len(), 12);
		assert_eq!(key_prefix("short"), "short");
	}

	#[test]
	fn key_prefix_cuts_on_char_boundaries() {
		assert_eq!(key_prefix("aéééééééééééééé"), "aééééééééééé");
		assert_eq!(key_prefix("aéééééé"), "aéééééé");
	}
}
