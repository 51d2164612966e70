//! Domain types for the welltrack store.
//!
//! Wells and channels are persisted as JSON in the metadata tables. Data
//! points live in the per-channel bucket tables and are only materialized
//! as [`DataPoint`] values when read back.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::bucket::{bucket_name, bucket_table_name};

/// Surrogate id of a well.
pub type WellId = u64;

/// Surrogate id of a channel.
pub type ChannelId = u64;

/// Surrogate id of a row inside a bucket table.
pub type PointId = u64;

// ── Well ───────────────────────────────────────────────────────────

/// An oil/gas well.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Well {
    pub id: WellId,
    /// Unique across all wells.
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Artificial lift type ("ESP", "rod pump", ...).
    pub lift_type: Option<String>,
    pub region: String,
    pub installation_date: Option<NaiveDate>,
    /// Depth in meters.
    pub depth: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a well.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewWell {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub lift_type: Option<String>,
    pub region: String,
    #[serde(default)]
    pub installation_date: Option<NaiveDate>,
    pub depth: f64,
    pub status: String,
}

/// Partial well update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WellUpdate {
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub lift_type: Option<String>,
    pub region: Option<String>,
    pub installation_date: Option<NaiveDate>,
    pub depth: Option<f64>,
    pub status: Option<String>,
}

// ── Channel ────────────────────────────────────────────────────────

/// A named measurement stream of a well.
///
/// `data_from`/`data_to` track the extent of the channel's bucket. They are
/// widened by the write paths and never narrowed by deletes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Channel {
    pub id: ChannelId,
    pub well_id: WellId,
    /// Unique within the owning well.
    pub name: String,
    pub data_from: Option<DateTime<Utc>>,
    pub data_to: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Channel {
    /// Widen `data_from`/`data_to` so that they cover `earliest` and `latest`.
    /// A bound only ever moves outward.
    ///
    /// Returns true if either bound moved.
    pub fn widen_bounds(
        &mut self,
        earliest: Option<DateTime<Utc>>,
        latest: Option<DateTime<Utc>>,
    ) -> bool {
        let mut changed = false;
        if let Some(earliest) = earliest {
            if self.data_from.is_none_or(|from| earliest < from) {
                self.data_from = Some(earliest);
                changed = true;
            }
        }
        if let Some(latest) = latest {
            if self.data_to.is_none_or(|to| latest > to) {
                self.data_to = Some(latest);
                changed = true;
            }
        }
        changed
    }
}

/// Fields required to create a channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewChannel {
    pub well_id: WellId,
    pub name: String,
    #[serde(default)]
    pub data_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub data_to: Option<DateTime<Utc>>,
}

/// Partial channel update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChannelUpdate {
    pub name: Option<String>,
    pub data_from: Option<DateTime<Utc>>,
    pub data_to: Option<DateTime<Utc>>,
}

/// A channel together with its derived bucket identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelDetails {
    #[serde(flatten)]
    pub channel: Channel,
    /// `{well name}_{channel name}`, unsanitized.
    pub bucket_name: String,
    /// Physical table holding the channel's data points.
    pub table_name: String,
}

impl ChannelDetails {
    pub fn new(channel: Channel, well_name: &str) -> Self {
        Self {
            bucket_name: bucket_name(well_name, &channel.name),
            table_name: bucket_table_name(well_name, &channel.name),
            channel,
        }
    }
}

// ── Bucket data ────────────────────────────────────────────────────

/// A stored time-series row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DataPoint {
    pub id: PointId,
    pub time: DateTime<Utc>,
    pub value: f64,
}

/// A row to insert; the id is assigned by the store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NewDataPoint {
    pub time: DateTime<Utc>,
    pub value: f64,
}

impl NewDataPoint {
    pub fn new(time: DateTime<Utc>, value: f64) -> Self {
        Self { time, value }
    }
}

/// Optional inclusive time filter for bucket reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// No filtering.
    pub fn all() -> Self {
        Self::default()
    }
}

/// Aggregate statistics over a (possibly filtered) bucket.
///
/// When `count` is zero every aggregate is `None`, which callers read as
/// "no data in range" rather than a zero value.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct BucketStatistics {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
    pub count: u64,
}

impl BucketStatistics {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
