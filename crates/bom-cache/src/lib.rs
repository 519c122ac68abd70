//! # BOM Cache
//!
//! 展開結果緩存與髒標記失效

pub mod cache;
pub mod dirty_tracking;

// Re-export 主要類型
pub use cache::{CacheKey, CacheStats, ExplosionCache};
pub use dirty_tracking::DirtyTracker;
