pub mod memory_cache;
pub mod sqlite_cache;

pub use memory_cache::MemoryResponseCache;
pub use sqlite_cache::SqliteResponseCache;
