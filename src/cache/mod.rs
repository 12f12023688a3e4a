mod lru_cache;
mod value_cache;

pub use lru_cache::BoundedLruCache;
pub use value_cache::{PageOutcome, ValueCache, ValueCacheEntry, cache_key};
