//! Row-level operations against a resolved bucket table.
//!
//! Every write runs in one redb write transaction that also carries the id
//! sequence bump and the owning channel's bound widening, so rows and
//! bounds become visible together or not at all.

use redb::{ReadableDatabase, ReadableTable};
use tracing::debug;

use super::{BucketTable, from_micros, to_micros, truncate_micros};
use crate::error::{StateError, StateResult};
use crate::store::{StateStore, reserve_ids, widen_bounds_by_names};
use crate::types::{BucketStatistics, DataPoint, NewDataPoint, PointId, TimeRange};

/// Inclusive key bounds for a time filter, or `None` if the range is empty.
fn key_bounds(range: TimeRange) -> Option<((i64, u64), (i64, u64))> {
    let lo = range.start.map(to_micros).unwrap_or(i64::MIN);
    let hi = range.end.map(to_micros).unwrap_or(i64::MAX);
    (lo <= hi).then_some(((lo, 0), (hi, u64::MAX)))
}

impl StateStore {
    /// Rows with `start <= time <= end`, ascending by time, then paginated.
    pub fn query_range(
        &self,
        table: &BucketTable,
        range: TimeRange,
        offset: usize,
        limit: usize,
    ) -> StateResult<Vec<DataPoint>> {
        let Some((lo, hi)) = key_bounds(range) else {
            return Ok(Vec::new());
        };
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let rows = txn
            .open_table(table.schema().rows())
            .map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in rows
            .range(lo..=hi)
            .map_err(map_err!(Read))?
            .skip(offset)
            .take(limit)
        {
            let (key, value) = entry.map_err(map_err!(Read))?;
            let (micros, id) = key.value();
            results.push(DataPoint {
                id,
                time: from_micros(micros)?,
                value: value.value(),
            });
        }
        Ok(results)
    }

    /// Insert one row and widen the channel's bounds to include it.
    ///
    /// The time is truncated to microseconds before it is stored, and the
    /// truncated value is what the bounds and the returned row carry.
    pub fn insert_one(&self, table: &BucketTable, point: NewDataPoint) -> StateResult<DataPoint> {
        let time = truncate_micros(point.time)?;
        let micros = to_micros(time);
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let id = reserve_ids(&txn, table.table_name(), 1)?;
        {
            let mut rows = txn
                .open_table(table.schema().rows())
                .map_err(map_err!(Table))?;
            rows.insert((micros, id), point.value)
                .map_err(map_err!(Write))?;
            let mut ids = txn
                .open_table(table.schema().ids())
                .map_err(map_err!(Table))?;
            ids.insert(id, micros).map_err(map_err!(Write))?;
        }
        let widened =
            widen_bounds_by_names(&txn, table.well_name(), table.channel_name(), time, time)?;
        txn.commit().map_err(map_err!(Transaction))?;
        if widened {
            self.record_bound_update();
        }
        debug!(table = %table.table_name(), id, "data point inserted");
        Ok(DataPoint {
            id,
            time,
            value: point.value,
        })
    }

    /// Insert a non-empty batch and widen the channel's bounds once.
    pub fn insert_batch(
        &self,
        table: &BucketTable,
        points: &[NewDataPoint],
    ) -> StateResult<Vec<DataPoint>> {
        self.insert_batch_with(table, points, true)
    }

    /// Insert a non-empty batch; bounds are widened only if `update_bounds`.
    ///
    /// The batch extent is computed in one pass and applied as a single
    /// bounds update, independent of the batch size.
    pub fn insert_batch_with(
        &self,
        table: &BucketTable,
        points: &[NewDataPoint],
        update_bounds: bool,
    ) -> StateResult<Vec<DataPoint>> {
        let Some(first) = points.first() else {
            return Err(StateError::InvalidInput(
                "batch must contain at least one data point".to_string(),
            ));
        };
        let count = points.len() as u64;
        let first_time = truncate_micros(first.time)?;
        let (mut earliest, mut latest) = (first_time, first_time);

        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let first_id = reserve_ids(&txn, table.table_name(), count)?;
        let mut inserted = Vec::with_capacity(points.len());
        {
            let mut rows = txn
                .open_table(table.schema().rows())
                .map_err(map_err!(Table))?;
            let mut ids = txn
                .open_table(table.schema().ids())
                .map_err(map_err!(Table))?;
            for (id, point) in (first_id..).zip(points) {
                let time = truncate_micros(point.time)?;
                let micros = to_micros(time);
                rows.insert((micros, id), point.value)
                    .map_err(map_err!(Write))?;
                ids.insert(id, micros).map_err(map_err!(Write))?;
                earliest = earliest.min(time);
                latest = latest.max(time);
                inserted.push(DataPoint {
                    id,
                    time,
                    value: point.value,
                });
            }
        }
        let widened = update_bounds
            && widen_bounds_by_names(
                &txn,
                table.well_name(),
                table.channel_name(),
                earliest,
                latest,
            )?;
        txn.commit().map_err(map_err!(Transaction))?;
        if widened {
            self.record_bound_update();
        }
        debug!(table = %table.table_name(), count, %earliest, %latest, "data batch inserted");
        Ok(inserted)
    }

    /// Delete a row by id. Returns false if no such row exists.
    ///
    /// Channel bounds are left as they are.
    pub fn delete_one(&self, table: &BucketTable, id: PointId) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut ids = txn
                .open_table(table.schema().ids())
                .map_err(map_err!(Table))?;
            let micros = ids.remove(id).map_err(map_err!(Write))?.map(|g| g.value());
            existed = micros.is_some();
            if let Some(micros) = micros {
                let mut rows = txn
                    .open_table(table.schema().rows())
                    .map_err(map_err!(Table))?;
                rows.remove((micros, id)).map_err(map_err!(Write))?;
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(table = %table.table_name(), id, existed, "data point deleted");
        Ok(existed)
    }

    /// Delete every row, keeping the table. Returns the number removed.
    pub fn delete_all(&self, table: &BucketTable) -> StateResult<u64> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let count;
        {
            let mut rows = txn
                .open_table(table.schema().rows())
                .map_err(map_err!(Table))?;
            // Collect keys first; the table cannot be mutated while iterated.
            let keys = rows
                .iter()
                .map_err(map_err!(Read))?
                .map(|entry| entry.map(|(key, _)| key.value()))
                .collect::<Result<Vec<_>, _>>()
                .map_err(map_err!(Read))?;
            let mut ids = txn
                .open_table(table.schema().ids())
                .map_err(map_err!(Table))?;
            for &(micros, id) in &keys {
                rows.remove((micros, id)).map_err(map_err!(Write))?;
                ids.remove(id).map_err(map_err!(Write))?;
            }
            count = keys.len() as u64;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(table = %table.table_name(), count, "bucket cleared");
        Ok(count)
    }

    /// min / max / avg / count over the filtered rows, in one scan.
    pub fn statistics(&self, table: &BucketTable, range: TimeRange) -> StateResult<BucketStatistics> {
        let Some((lo, hi)) = key_bounds(range) else {
            return Ok(BucketStatistics::default());
        };
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let rows = txn
            .open_table(table.schema().rows())
            .map_err(map_err!(Table))?;

        let mut count = 0u64;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for entry in rows.range(lo..=hi).map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let value = value.value();
            count += 1;
            sum += value;
            min = min.min(value);
            max = max.max(value);
        }

        if count == 0 {
            return Ok(BucketStatistics::default());
        }
        Ok(BucketStatistics {
            min: Some(min),
            max: Some(max),
            avg: Some(sum / count as f64),
            count,
        })
    }
}
