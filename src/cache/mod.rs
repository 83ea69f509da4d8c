//! Three-tier dataset cache
//!
//! Raw downloads are kept as a single canonical CSV that is refreshed once it
//! goes stale. Interim and processed results are stored as timestamped
//! Parquet snapshots, and consumers read back the most recent one.

mod error;
mod manager;
pub mod staleness;
pub mod tier;

pub use error::CacheError;
pub use manager::{CacheManager, RawLoad, RawOrigin, RawStatus};
pub use staleness::{is_stale, is_stale_at};
pub use tier::Tier;
