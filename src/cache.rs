/*!
 * Chunked, time-expiring cache.
 *
 * Payloads are packed (bincode + gzip) and split into fixed-size chunks, each
 * stored as its own entry next to a small meta entry holding the chunk count.
 * A value is only returned when the meta entry and every chunk are present and
 * unexpired; anything less is a miss and the caller reloads from the sheet.
 */

use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::{debug, warn};
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::codec;
use crate::error::CacheError;

/// Largest payload stored under a single key
pub const DEFAULT_CHUNK_SIZE: usize = 90 * 1024;

/// Longest time an entry may live
pub const MAX_TTL: Duration = Duration::from_secs(21600);

#[derive(Debug, Clone)]
struct CacheEntry {
    bytes: Vec<u8>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Key/value store with per-entry expiry and chunked values
pub struct ChunkedCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    chunk_size: usize,
    hits: RwLock<usize>,
    misses: RwLock<usize>,
}

impl ChunkedCache {
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    /// A chunk size of 0 is treated as 1.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            chunk_size: chunk_size.max(1),
            hits: RwLock::new(0),
            misses: RwLock::new(0),
        }
    }

    fn meta_key(key: &str) -> String {
        format!("{}__meta", key)
    }

    fn chunk_key(key: &str, index: usize) -> String {
        format!("{}__{}", key, index)
    }

    /// Store `value` under `key` for `ttl` (clamped to [`MAX_TTL`]).
    ///
    /// Returns the number of chunks written.
    pub fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) -> Result<usize, CacheError> {
        let bytes = codec::pack(value)?;
        let ttl = ttl.min(MAX_TTL);
        let now = Instant::now();
        let expires_at = now + ttl;

        let chunks: Vec<&[u8]> = if bytes.is_empty() {
            vec![&[][..]]
        } else {
            bytes.chunks(self.chunk_size).collect()
        };
        let count = chunks.len();

        let mut entries = self.entries.write();
        entries.retain(|_, entry| entry.is_live(now));

        // Drop chunks left over from a longer previous value
        if let Some(old) = entries.get(&Self::meta_key(key)).and_then(|e| decode_count(&e.bytes)) {
            for i in count..old {
                entries.remove(&Self::chunk_key(key, i));
            }
        }

        for (i, chunk) in chunks.into_iter().enumerate() {
            entries.insert(
                Self::chunk_key(key, i),
                CacheEntry {
                    bytes: chunk.to_vec(),
                    expires_at,
                },
            );
        }
        entries.insert(
            Self::meta_key(key),
            CacheEntry {
                bytes: (count as u64).to_le_bytes().to_vec(),
                expires_at,
            },
        );

        debug!("Cached {} ({} bytes in {} chunks, ttl {:?})", key, bytes.len(), count, ttl);
        Ok(count)
    }

    /// Fetch and decode the value under `key`, `None` on any kind of miss.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        let bytes = {
            let entries = self.entries.read();
            let count = entries
                .get(&Self::meta_key(key))
                .filter(|e| e.is_live(now))
                .and_then(|e| decode_count(&e.bytes));

            match count {
                Some(count) => {
                    let mut bytes = Vec::new();
                    let mut complete = true;
                    for i in 0..count {
                        match entries.get(&Self::chunk_key(key, i)).filter(|e| e.is_live(now)) {
                            Some(entry) => bytes.extend_from_slice(&entry.bytes),
                            None => {
                                debug!("Cache chunk {} of {} missing", i, key);
                                complete = false;
                                break;
                            }
                        }
                    }
                    complete.then_some(bytes)
                }
                None => None,
            }
        };

        let value = bytes.and_then(|bytes| match codec::unpack(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding unreadable cache entry {}: {}", key, e);
                None
            }
        });

        if value.is_some() {
            *self.hits.write() += 1;
            debug!("Cache hit for {}", key);
        } else {
            *self.misses.write() += 1;
            debug!("Cache miss for {}", key);
        }
        value
    }

    /// Remove `key` and all of its chunks.
    pub fn remove(&self, key: &str) {
        let mut entries = self.entries.write();
        if let Some(count) = entries
            .remove(&Self::meta_key(key))
            .and_then(|e| decode_count(&e.bytes))
        {
            for i in 0..count {
                entries.remove(&Self::chunk_key(key, i));
            }
        }
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&self) {
        self.entries.write().clear();
        *self.hits.write() = 0;
        *self.misses.write() = 0;
        debug!("Cache cleared");
    }

    /// `(hits, misses, hit rate)`
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = *self.hits.read();
        let misses = *self.misses.read();
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    /// Number of raw entries (chunks and meta entries) currently held.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for ChunkedCache {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_count(bytes: &[u8]) -> Option<usize> {
    let array: [u8; 8] = bytes.try_into().ok()?;
    Some(u64::from_le_bytes(array) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn words(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Wort{} mit Umlaut ä {}", i, i * 7919)).collect()
    }

    #[test]
    fn large_values_span_several_chunks() {
        let cache = ChunkedCache::with_chunk_size(64);
        let value = words(200);
        let chunks = cache.put("terms", &value, HOUR).unwrap();
        assert!(chunks > 1);
        assert_eq!(cache.get::<Vec<String>>("terms"), Some(value));
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let cache = ChunkedCache::new();
        cache.put("k", &vec![1u32, 2, 3], Duration::ZERO).unwrap();
        assert_eq!(cache.get::<Vec<u32>>("k"), None);
    }

    #[test]
    fn long_ttl_is_clamped() {
        let cache = ChunkedCache::with_chunk_size(16);
        cache.put("k", &words(5), MAX_TTL * 4).unwrap();
        let limit = Instant::now() + MAX_TTL;

        let entries = cache.entries.read();
        assert!(entries.len() > 2);
        assert!(entries.values().all(|entry| entry.expires_at <= limit));
    }

    #[test]
    fn missing_chunk_is_a_miss() {
        let cache = ChunkedCache::with_chunk_size(16);
        cache.put("k", &words(20), HOUR).unwrap();
        cache.entries.write().remove("k__1");
        assert_eq!(cache.get::<Vec<String>>("k"), None);
    }

    #[test]
    fn shorter_value_removes_stale_chunks() {
        let cache = ChunkedCache::with_chunk_size(16);
        cache.put("k", &words(50), HOUR).unwrap();
        let long_len = cache.len();
        cache.put("k", &words(1), HOUR).unwrap();
        assert!(cache.len() < long_len);
        assert_eq!(cache.get::<Vec<String>>("k"), Some(words(1)));
    }

    #[test]
    fn wrong_type_is_a_miss() {
        let cache = ChunkedCache::new();
        cache.put("k", "text", HOUR).unwrap();
        assert_eq!(cache.get::<Vec<u64>>("k"), None);
    }

    #[test]
    fn stats_count_hits_and_misses() {
        let cache = ChunkedCache::new();
        cache.put("k", &1u8, HOUR).unwrap();
        cache.get::<u8>("k");
        cache.get::<u8>("absent");
        let (hits, misses, rate) = cache.stats();
        assert_eq!((hits, misses), (1, 1));
        assert!((rate - 0.5).abs() < f64::EPSILON);

        cache.remove("k");
        assert!(cache.is_empty());
    }
}
