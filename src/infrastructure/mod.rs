pub mod paper_cache;

pub use paper_cache::{CacheEntry, CachedField, PaperCache};
