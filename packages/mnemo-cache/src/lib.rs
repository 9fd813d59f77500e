mod key;
mod store;

pub use key::{key_prefix, normalize_text, scoped_text_key, text_key};
pub use store::{BoundedTtlCache, CacheStats};
