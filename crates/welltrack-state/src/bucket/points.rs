//! Name-addressed bucket operations.
//!
//! These are the entry points callers use: each confirms the well and
//! channel exist (a missing one is `NotFound`), resolves the bucket through
//! the registry, and delegates to the handle-based operations. Reads and
//! deletes never materialize a bucket; a channel without one reads as empty.

use super::BucketTable;
use crate::error::StateResult;
use crate::store::StateStore;
use crate::types::{BucketStatistics, DataPoint, NewDataPoint, PointId, TimeRange};

impl StateStore {
    fn existing_bucket(&self, well_name: &str, channel_name: &str) -> StateResult<Option<BucketTable>> {
        self.resolve_channel(well_name, channel_name)?;
        self.buckets().get_existing_table(well_name, channel_name)
    }

    fn writable_bucket(&self, well_name: &str, channel_name: &str) -> StateResult<BucketTable> {
        self.resolve_channel(well_name, channel_name)?;
        self.buckets().get_or_create_table(well_name, channel_name)
    }

    /// Paginated, time-ordered points of a channel.
    pub fn get_points(
        &self,
        well_name: &str,
        channel_name: &str,
        range: TimeRange,
        skip: usize,
        limit: usize,
    ) -> StateResult<Vec<DataPoint>> {
        match self.existing_bucket(well_name, channel_name)? {
            Some(table) => self.query_range(&table, range, skip, limit),
            None => Ok(Vec::new()),
        }
    }

    /// Store one point for a channel.
    pub fn create_point(
        &self,
        well_name: &str,
        channel_name: &str,
        point: NewDataPoint,
    ) -> StateResult<DataPoint> {
        let table = self.writable_bucket(well_name, channel_name)?;
        self.insert_one(&table, point)
    }

    /// Store a non-empty batch of points for a channel.
    pub fn create_points_batch(
        &self,
        well_name: &str,
        channel_name: &str,
        points: &[NewDataPoint],
    ) -> StateResult<Vec<DataPoint>> {
        let table = self.writable_bucket(well_name, channel_name)?;
        self.insert_batch(&table, points)
    }

    /// Delete one point. `Ok(false)` when the id does not exist.
    pub fn delete_point(
        &self,
        well_name: &str,
        channel_name: &str,
        id: PointId,
    ) -> StateResult<bool> {
        match self.existing_bucket(well_name, channel_name)? {
            Some(table) => self.delete_one(&table, id),
            None => Ok(false),
        }
    }

    /// Delete every point of a channel, returning how many were removed.
    pub fn delete_all_points(&self, well_name: &str, channel_name: &str) -> StateResult<u64> {
        match self.existing_bucket(well_name, channel_name)? {
            Some(table) => self.delete_all(&table),
            None => Ok(0),
        }
    }

    /// Aggregates over a channel's points in `range`.
    pub fn get_statistics(
        &self,
        well_name: &str,
        channel_name: &str,
        range: TimeRange,
    ) -> StateResult<BucketStatistics> {
        match self.existing_bucket(well_name, channel_name)? {
            Some(table) => self.statistics(&table, range),
            None => Ok(BucketStatistics::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::*;
    use crate::types::{NewChannel, NewWell};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn store_with_channel() -> StateStore {
        let store = StateStore::open_in_memory().unwrap();
        let well = store
            .create_well(NewWell {
                name: "Alpha 7".to_string(),
                latitude: 31.9,
                longitude: -102.1,
                lift_type: Some("ESP".to_string()),
                region: "Permian".to_string(),
                installation_date: None,
                depth: 2800.0,
                status: "producing".to_string(),
            })
            .unwrap();
        store
            .create_channel(NewChannel {
                well_id: well.id,
                name: "Oil Rate".to_string(),
                data_from: None,
                data_to: None,
            })
            .unwrap();
        store
    }

    #[test]
    fn unknown_well_or_channel_is_not_found() {
        let store = store_with_channel();

        let err = store.get_points("nope", "Oil Rate", TimeRange::all(), 0, 10).unwrap_err();
        assert!(err.is_not_found());
        let err = store
            .create_point("Alpha 7", "nope", NewDataPoint::new(t0(), 1.0))
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(store.delete_point("nope", "Oil Rate", 1).unwrap_err().is_not_found());
        assert!(store.delete_all_points("Alpha 7", "nope").unwrap_err().is_not_found());
        assert!(store.get_statistics("nope", "x", TimeRange::all()).unwrap_err().is_not_found());
    }

    #[test]
    fn reads_do_not_materialize_bucket() {
        let store = store_with_channel();

        assert!(store.get_points("Alpha 7", "Oil Rate", TimeRange::all(), 0, 10).unwrap().is_empty());
        assert_eq!(store.get_statistics("Alpha 7", "Oil Rate", TimeRange::all()).unwrap().count, 0);
        assert!(!store.delete_point("Alpha 7", "Oil Rate", 1).unwrap());
        assert_eq!(store.delete_all_points("Alpha 7", "Oil Rate").unwrap(), 0);
        assert!(store.buckets().list_all_bucket_tables().unwrap().is_empty());
    }

    #[test]
    fn created_point_is_visible_with_fresh_id() {
        let store = store_with_channel();
        let t = t0() + Duration::minutes(90);

        let a = store.create_point("Alpha 7", "Oil Rate", NewDataPoint::new(t, 41.5)).unwrap();
        let b = store.create_point("Alpha 7", "Oil Rate", NewDataPoint::new(t, 41.5)).unwrap();
        assert_ne!(a.id, b.id);

        let range = TimeRange::new(Some(t - Duration::hours(1)), Some(t + Duration::hours(1)));
        let points = store.get_points("Alpha 7", "Oil Rate", range, 0, 10).unwrap();
        assert!(points.contains(&a));
        assert!(points.contains(&b));
        assert_eq!(
            store.buckets().list_all_bucket_tables().unwrap(),
            vec!["bucket_alpha_7_oil_rate"]
        );
    }

    #[test]
    fn batch_updates_channel_and_stats() {
        let store = store_with_channel();
        let points: Vec<_> = (0..10)
            .map(|i| NewDataPoint::new(t0() + Duration::hours(i), i as f64))
            .collect();

        let stored = store.create_points_batch("Alpha 7", "Oil Rate", &points).unwrap();
        assert_eq!(stored.len(), 10);

        let (_, channel) = store.resolve_channel("Alpha 7", "Oil Rate").unwrap();
        assert_eq!(channel.data_from, Some(t0()));
        assert_eq!(channel.data_to, Some(t0() + Duration::hours(9)));

        let stats = store.get_statistics("Alpha 7", "Oil Rate", TimeRange::all()).unwrap();
        assert_eq!(stats.count, 10);
        assert_eq!(stats.avg, Some(4.5));

        assert!(store.delete_point("Alpha 7", "Oil Rate", stored[0].id).unwrap());
        assert_eq!(store.delete_all_points("Alpha 7", "Oil Rate").unwrap(), 9);
    }
}
