//! Per-channel time-series tables ("buckets").
//!
//! Every (well, channel) pair owns one redb table named
//! `bucket_{sanitize(well)}_{sanitize(channel)}`. Rows are keyed by
//! `(time_micros, id)` so a range scan over the key is a time-ordered scan;
//! the value column is the `f64` reading. A companion table
//! `idx_bucket_…` maps `id -> time_micros` for keyed deletes.
//!
//! The link between a channel and its bucket is purely the derived name:
//! renaming a well or channel leaves the old table behind, and two names
//! that sanitize identically share one table.

mod access;
mod points;
mod registry;
mod sanitize;

pub use registry::{BucketRegistry, BucketSchema, BucketTable};
pub use sanitize::sanitize;

use chrono::{DateTime, Utc};

use crate::error::{StateError, StateResult};

/// Prefix shared by every bucket table name.
pub const BUCKET_PREFIX: &str = "bucket_";

/// Prefix of the id index table that accompanies each bucket table.
pub const INDEX_PREFIX: &str = "idx_";

/// Display name of a bucket: `{well}_{channel}`, unsanitized.
pub fn bucket_name(well_name: &str, channel_name: &str) -> String {
    format!("{well_name}_{channel_name}")
}

/// Physical table name of a bucket.
pub fn bucket_table_name(well_name: &str, channel_name: &str) -> String {
    format!(
        "{BUCKET_PREFIX}{}_{}",
        sanitize(well_name),
        sanitize(channel_name)
    )
}

pub(crate) fn to_micros(time: DateTime<Utc>) -> i64 {
    time.timestamp_micros()
}

pub(crate) fn from_micros(micros: i64) -> StateResult<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| StateError::Deserialize(format!("timestamp out of range: {micros}")))
}

/// Drop sub-microsecond digits, the precision bucket keys store.
pub(crate) fn truncate_micros(time: DateTime<Utc>) -> StateResult<DateTime<Utc>> {
    from_micros(to_micros(time))
}
