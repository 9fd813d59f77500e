use std::{
	collections::{HashMap, VecDeque},
	sync::{Mutex, MutexGuard},
	time::{Duration, Instant},
};

use serde::Serialize;

const MIN_ORDER_SLACK: usize = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
	pub hits: u64,
	pub misses: u64,
	pub expired: u64,
	pub evicted: u64,
	pub len: usize,
}

/// Capacity- and time-bounded key/value store shared between concurrent callers.
///
/// Entries expire `ttl` after insertion and are purged lazily when touched. When a new key
/// would push the entry count past `capacity`, the least recently inserted entry goes first.
/// The internal lock is only held for map bookkeeping, never across caller I/O.
pub struct BoundedTtlCache<V> {
	capacity: usize,
	ttl: Duration,
	inner: Mutex<Inner<V>>,
}

struct CacheEntry<V> {
	value: V,
	inserted_at: Instant,
	ttl: Duration,
	seq: u64,
}

struct Inner<V> {
	entries: HashMap<String, CacheEntry<V>>,
	// Insertion order as (key, seq); a pair whose seq no longer matches its entry is stale.
	order: VecDeque<(String, u64)>,
	next_seq: u64,
	stats: CacheStats,
}

impl<V> CacheEntry<V> {
	fn is_expired(&self, now: Instant) -> bool {
		now.saturating_duration_since(self.inserted_at) > self.ttl
	}
}

impl<V> Inner<V> {
	fn is_live(&self, key: &str, seq: u64) -> bool {
		self.entries.get(key).map(|entry| entry.seq == seq).unwrap_or(false)
	}

	fn purge_expired_front(&mut self, now: Instant) {
		while let Some((key, seq)) = self.order.front() {
			if !self.is_live(key, *seq) {
				self.order.pop_front();

				continue;
			}

			let expired =
				self.entries.get(key.as_str()).map(|entry| entry.is_expired(now)).unwrap_or(false);

			if !expired {
				break;
			}
			if let Some((key, _)) = self.order.pop_front() {
				self.entries.remove(&key);
				self.stats.expired += 1;
			}
		}
	}

	fn evict_oldest(&mut self) -> bool {
		while let Some((key, seq)) = self.order.pop_front() {
			if self.is_live(&key, seq) {
				self.entries.remove(&key);
				self.stats.evicted += 1;

				return true;
			}
		}

		false
	}

	fn compact_order(&mut self, capacity: usize) {
		if self.order.len() <= capacity.saturating_mul(2).max(MIN_ORDER_SLACK) {
			return;
		}

		let order = std::mem::take(&mut self.order);

		self.order = order.into_iter().filter(|(key, seq)| self.is_live(key, *seq)).collect();
	}
}

impl<V> BoundedTtlCache<V>
where
	V: Clone,
{
	pub fn new(capacity: usize, ttl: Duration) -> Self {
		Self {
			capacity,
			ttl,
			inner: Mutex::new(Inner {
				entries: HashMap::new(),
				order: VecDeque::new(),
				next_seq: 0,
				stats: CacheStats::default(),
			}),
		}
	}

	pub fn get(&self, key: &str) -> Option<V> {
		self.get_at(key, Instant::now())
	}

	pub fn insert(&self, key: impl Into<String>, value: V) {
		self.insert_at(key.into(), value, Instant::now());
	}

	/// Number of stored entries, including expired ones not yet purged.
	pub fn len(&self) -> usize {
		self.lock().entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn stats(&self) -> CacheStats {
		let inner = self.lock();

		CacheStats { len: inner.entries.len(), ..inner.stats }
	}

	fn get_at(&self, key: &str, now: Instant) -> Option<V> {
		let mut inner = self.lock();
		let expired = match inner.entries.get(key) {
			Some(entry) => entry.is_expired(now),
			None => {
				inner.stats.misses += 1;

				return None;
			},
		};

		if expired {
			inner.entries.remove(key);
			inner.stats.expired += 1;
			inner.stats.misses += 1;

			return None;
		}

		inner.stats.hits += 1;

		inner.entries.get(key).map(|entry| entry.value.clone())
	}

	fn insert_at(&self, key: String, value: V, now: Instant) {
		if self.capacity == 0 {
			return;
		}

		let mut inner = self.lock();

		inner.purge_expired_front(now);

		if !inner.entries.contains_key(&key) {
			while inner.entries.len() >= self.capacity {
				if !inner.evict_oldest() {
					break;
				}
			}
		}

		let seq = inner.next_seq;

		inner.next_seq += 1;
		inner.order.push_back((key.clone(), seq));
		inner.entries.insert(key, CacheEntry { value, inserted_at: now, ttl: self.ttl, seq });
		inner.compact_order(self.capacity);
	}

	fn lock(&self) -> MutexGuard<'_, Inner<V>> {
		self.inner.lock().unwrap_or_else(|err| err.into_inner())
	}
}
