//! welltrack-state — embedded store for wells, channels and their
//! time-series buckets.
//!
//! Backed by [redb](https://docs.rs/redb), provides persistent and in-memory
//! storage for well and channel metadata plus one dynamically created table
//! per (well, channel) pair holding that channel's data points.
//!
//! # Architecture
//!
//! Wells and channels are JSON-serialized into redb's `&[u8]` value columns,
//! with name tables enforcing uniqueness. Bucket tables are named from the
//! sanitized well and channel names (see [`bucket`]) and resolved through a
//! process-wide [`BucketRegistry`].
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

pub mod bucket;
pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use bucket::{BucketRegistry, BucketSchema, BucketTable, sanitize};
pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
