//! StateStore — redb-backed persistence for welltrack.
//!
//! Provides typed CRUD over wells and channels, plus the bucket registry
//! and bucket operations (see [`crate::bucket`]). Wells and channels are
//! JSON-serialized into `&[u8]` value columns; name tables enforce
//! uniqueness. The store supports both on-disk and in-memory backends (the
//! latter for testing).

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, Table, TableHandle, WriteTransaction};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::bucket::{BucketRegistry, bucket_table_name};
use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Thread-safe store backed by redb.
///
/// Cloning is cheap; clones share the database and the bucket registry.
#[derive(Clone)]
pub struct StateStore {
    pub(crate) db: Arc<Database>,
    buckets: Arc<BucketRegistry>,
    bound_updates: Arc<AtomicU64>,
}

impl StateStore {
    /// Open (or create) a persistent store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self::with_database(db)?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self::with_database(db)?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    fn with_database(db: Database) -> StateResult<Self> {
        let db = Arc::new(db);
        let store = Self {
            buckets: Arc::new(BucketRegistry::new(Arc::clone(&db))),
            bound_updates: Arc::new(AtomicU64::new(0)),
            db,
        };
        store.ensure_tables()?;
        Ok(store)
    }

    /// Create all metadata tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        txn.open_table(WELLS).map_err(map_err!(Table))?;
        txn.open_table(WELL_NAMES).map_err(map_err!(Table))?;
        txn.open_table(CHANNELS).map_err(map_err!(Table))?;
        txn.open_table(CHANNEL_NAMES).map_err(map_err!(Table))?;
        txn.open_table(SEQUENCES).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// The process-wide bucket table registry.
    pub fn buckets(&self) -> &BucketRegistry {
        &self.buckets
    }

    /// Channel bound rewrites committed by bucket writes since open.
    ///
    /// A single insert or batch contributes at most one.
    pub fn bound_updates(&self) -> u64 {
        self.bound_updates.load(Ordering::Relaxed)
    }

    pub(crate) fn record_bound_update(&self) {
        self.bound_updates.fetch_add(1, Ordering::Relaxed);
    }

    // ── Wells ──────────────────────────────────────────────────────

    /// Create a well. Fails with `Conflict` if the name is taken.
    pub fn create_well(&self, new: NewWell) -> StateResult<Well> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let well = {
            let mut names = txn.open_table(WELL_NAMES).map_err(map_err!(Table))?;
            if names.get(new.name.as_str()).map_err(map_err!(Read))?.is_some() {
                return Err(StateError::Conflict(format!(
                    "well with name {} already exists",
                    new.name
                )));
            }
            let id = reserve_ids(&txn, WELL_SEQUENCE, 1)?;
            let now = Utc::now();
            let well = Well {
                id,
                name: new.name,
                latitude: new.latitude,
                longitude: new.longitude,
                lift_type: new.lift_type,
                region: new.region,
                installation_date: new.installation_date,
                depth: new.depth,
                status: new.status,
                created_at: now,
                updated_at: now,
            };
            names
                .insert(well.name.as_str(), id)
                .map_err(map_err!(Write))?;
            let mut wells = txn.open_table(WELLS).map_err(map_err!(Table))?;
            put_record(&mut wells, id, &well)?;
            well
        };
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(id = well.id, name = %well.name, "well created");
        Ok(well)
    }

    /// Get a well by id.
    pub fn get_well(&self, id: WellId) -> StateResult<Option<Well>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let wells = txn.open_table(WELLS).map_err(map_err!(Table))?;
        get_record(&wells, id)
    }

    /// Get a well by its unique name.
    pub fn get_well_by_name(&self, name: &str) -> StateResult<Option<Well>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let names = txn.open_table(WELL_NAMES).map_err(map_err!(Table))?;
        let Some(id) = names.get(name).map_err(map_err!(Read))?.map(|g| g.value()) else {
            return Ok(None);
        };
        let wells = txn.open_table(WELLS).map_err(map_err!(Table))?;
        get_record(&wells, id)
    }

    /// List wells in id order.
    pub fn list_wells(&self, skip: usize, limit: usize) -> StateResult<Vec<Well>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let wells = txn.open_table(WELLS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in wells.iter().map_err(map_err!(Read))?.skip(skip).take(limit) {
            let (_, value) = entry.map_err(map_err!(Read))?;
            results.push(decode(value.value())?);
        }
        Ok(results)
    }

    /// Apply a partial update. Returns `None` if the well does not exist.
    ///
    /// Renaming does not move bucket tables: buckets of the old name stay
    /// behind and are logged as orphaned.
    pub fn update_well(&self, id: WellId, update: WellUpdate) -> StateResult<Option<Well>> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let well = {
            let mut wells = txn.open_table(WELLS).map_err(map_err!(Table))?;
            let Some(mut well) = get_record::<Well, _>(&wells, id)? else {
                return Ok(None);
            };

            if let Some(name) = update.name.filter(|name| *name != well.name) {
                let mut names = txn.open_table(WELL_NAMES).map_err(map_err!(Table))?;
                if names.get(name.as_str()).map_err(map_err!(Read))?.is_some() {
                    return Err(StateError::Conflict(format!(
                        "well with name {name} already exists"
                    )));
                }
                names
                    .remove(well.name.as_str())
                    .map_err(map_err!(Write))?;
                names.insert(name.as_str(), id).map_err(map_err!(Write))?;

                for channel in channels_of_well(&txn, id)? {
                    let table = bucket_table_name(&well.name, &channel.name);
                    if table_exists(&txn, &table)? {
                        warn!(%table, well = %name, channel = %channel.name, "well rename orphans bucket table");
                    }
                }
                well.name = name;
            }
            if let Some(latitude) = update.latitude {
                well.latitude = latitude;
            }
            if let Some(longitude) = update.longitude {
                well.longitude = longitude;
            }
            if let Some(lift_type) = update.lift_type {
                well.lift_type = Some(lift_type);
            }
            if let Some(region) = update.region {
                well.region = region;
            }
            if let Some(date) = update.installation_date {
                well.installation_date = Some(date);
            }
            if let Some(depth) = update.depth {
                well.depth = depth;
            }
            if let Some(status) = update.status {
                well.status = status;
            }
            well.updated_at = Utc::now();
            put_record(&mut wells, id, &well)?;
            well
        };
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(id, name = %well.name, "well updated");
        Ok(Some(well))
    }

    /// Delete a well and its channels. Returns true if it existed.
    ///
    /// The channels' bucket tables are not dropped.
    pub fn delete_well(&self, id: WellId) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut wells = txn.open_table(WELLS).map_err(map_err!(Table))?;
            let removed: Option<Well> = match wells.remove(id).map_err(map_err!(Write))? {
                Some(guard) => Some(decode(guard.value())?),
                None => None,
            };
            existed = removed.is_some();
            if let Some(well) = removed {
                let mut names = txn.open_table(WELL_NAMES).map_err(map_err!(Table))?;
                names
                    .remove(well.name.as_str())
                    .map_err(map_err!(Write))?;
                let channels = channels_of_well(&txn, id)?;
                remove_channels(&txn, &channels)?;
                debug!(id, name = %well.name, channels = channels.len(), "well deleted");
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(existed)
    }

    /// Wells whose region matches, ignoring case.
    pub fn wells_by_region(&self, region: &str) -> StateResult<Vec<Well>> {
        let region = region.to_lowercase();
        Ok(self
            .all_wells()?
            .into_iter()
            .filter(|well| well.region.to_lowercase() == region)
            .collect())
    }

    /// Names of wells strictly deeper than `depth`.
    pub fn well_names_deeper_than(&self, depth: f64) -> StateResult<Vec<String>> {
        Ok(self
            .all_wells()?
            .into_iter()
            .filter(|well| well.depth > depth)
            .map(|well| well.name)
            .collect())
    }

    fn all_wells(&self) -> StateResult<Vec<Well>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let wells = txn.open_table(WELLS).map_err(map_err!(Table))?;
        scan_records(&wells)
    }

    // ── Channels ───────────────────────────────────────────────────

    /// Create a channel. The well must exist and the name must be unused
    /// within it.
    pub fn create_channel(&self, new: NewChannel) -> StateResult<Channel> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let channel = {
            let wells = txn.open_table(WELLS).map_err(map_err!(Table))?;
            if wells.get(new.well_id).map_err(map_err!(Read))?.is_none() {
                return Err(StateError::NotFound(format!(
                    "well with id {} does not exist",
                    new.well_id
                )));
            }
            let mut names = txn.open_table(CHANNEL_NAMES).map_err(map_err!(Table))?;
            if names
                .get((new.well_id, new.name.as_str()))
                .map_err(map_err!(Read))?
                .is_some()
            {
                return Err(StateError::Conflict(format!(
                    "channel '{}' already exists for well id {}",
                    new.name, new.well_id
                )));
            }
            let id = reserve_ids(&txn, CHANNEL_SEQUENCE, 1)?;
            let now = Utc::now();
            let channel = Channel {
                id,
                well_id: new.well_id,
                name: new.name,
                data_from: new.data_from,
                data_to: new.data_to,
                created_at: now,
                updated_at: now,
            };
            names
                .insert((channel.well_id, channel.name.as_str()), id)
                .map_err(map_err!(Write))?;
            let mut channels = txn.open_table(CHANNELS).map_err(map_err!(Table))?;
            put_record(&mut channels, id, &channel)?;
            channel
        };
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(id = channel.id, well_id = channel.well_id, name = %channel.name, "channel created");
        Ok(channel)
    }

    /// Get a channel by id.
    pub fn get_channel(&self, id: ChannelId) -> StateResult<Option<Channel>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let channels = txn.open_table(CHANNELS).map_err(map_err!(Table))?;
        get_record(&channels, id)
    }

    /// Get a channel with its derived bucket identity.
    pub fn get_channel_details(&self, id: ChannelId) -> StateResult<Option<ChannelDetails>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let channels = txn.open_table(CHANNELS).map_err(map_err!(Table))?;
        let Some(channel) = get_record::<Channel, _>(&channels, id)? else {
            return Ok(None);
        };
        let wells = txn.open_table(WELLS).map_err(map_err!(Table))?;
        let well: Option<Well> = get_record(&wells, channel.well_id)?;
        Ok(well.map(|well| ChannelDetails::new(channel, &well.name)))
    }

    /// List channels in id order.
    pub fn list_channels(&self, skip: usize, limit: usize) -> StateResult<Vec<Channel>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let channels = txn.open_table(CHANNELS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in channels.iter().map_err(map_err!(Read))?.skip(skip).take(limit) {
            let (_, value) = entry.map_err(map_err!(Read))?;
            results.push(decode(value.value())?);
        }
        Ok(results)
    }

    /// All channels of a well. `NotFound` if the well does not exist.
    pub fn list_channels_for_well(&self, well_id: WellId) -> StateResult<Vec<Channel>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let wells = txn.open_table(WELLS).map_err(map_err!(Table))?;
        if wells.get(well_id).map_err(map_err!(Read))?.is_none() {
            return Err(StateError::NotFound(format!("well with id {well_id} not found")));
        }
        let channels = txn.open_table(CHANNELS).map_err(map_err!(Table))?;
        Ok(scan_records::<Channel, _>(&channels)?
            .into_iter()
            .filter(|channel| channel.well_id == well_id)
            .collect())
    }

    /// Find a channel by owning well id and name.
    pub fn find_channel(&self, well_id: WellId, name: &str) -> StateResult<Option<Channel>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let names = txn.open_table(CHANNEL_NAMES).map_err(map_err!(Table))?;
        let Some(id) = names
            .get((well_id, name))
            .map_err(map_err!(Read))?
            .map(|g| g.value())
        else {
            return Ok(None);
        };
        let channels = txn.open_table(CHANNELS).map_err(map_err!(Table))?;
        get_record(&channels, id)
    }

    /// Look up a well and one of its channels by name.
    ///
    /// A missing well or channel is `NotFound`; this is the existence guard
    /// in front of every name-addressed bucket operation.
    pub fn resolve_channel(&self, well_name: &str, channel_name: &str) -> StateResult<(Well, Channel)> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let well_names = txn.open_table(WELL_NAMES).map_err(map_err!(Table))?;
        let wells = txn.open_table(WELLS).map_err(map_err!(Table))?;
        let well: Well = match well_names.get(well_name).map_err(map_err!(Read))? {
            Some(id) => get_record(&wells, id.value())?,
            None => None,
        }
        .ok_or_else(|| StateError::well_not_found(well_name))?;

        let channel_names = txn.open_table(CHANNEL_NAMES).map_err(map_err!(Table))?;
        let channels = txn.open_table(CHANNELS).map_err(map_err!(Table))?;
        let channel: Channel = match channel_names
            .get((well.id, channel_name))
            .map_err(map_err!(Read))?
        {
            Some(id) => get_record(&channels, id.value())?,
            None => None,
        }
        .ok_or_else(|| StateError::channel_not_found(well_name, channel_name))?;

        Ok((well, channel))
    }

    /// Apply a partial update. Returns `None` if the channel does not exist.
    ///
    /// Explicit `data_from`/`data_to` values replace the stored bounds.
    pub fn update_channel(&self, id: ChannelId, update: ChannelUpdate) -> StateResult<Option<Channel>> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let channel = {
            let mut channels = txn.open_table(CHANNELS).map_err(map_err!(Table))?;
            let Some(mut channel) = get_record::<Channel, _>(&channels, id)? else {
                return Ok(None);
            };

            if let Some(name) = update.name.filter(|name| *name != channel.name) {
                let mut names = txn.open_table(CHANNEL_NAMES).map_err(map_err!(Table))?;
                if names
                    .get((channel.well_id, name.as_str()))
                    .map_err(map_err!(Read))?
                    .is_some()
                {
                    return Err(StateError::Conflict(format!(
                        "channel '{name}' already exists for well id {}",
                        channel.well_id
                    )));
                }
                names
                    .remove((channel.well_id, channel.name.as_str()))
                    .map_err(map_err!(Write))?;
                names
                    .insert((channel.well_id, name.as_str()), id)
                    .map_err(map_err!(Write))?;

                let wells = txn.open_table(WELLS).map_err(map_err!(Table))?;
                if let Some(well) = get_record::<Well, _>(&wells, channel.well_id)? {
                    let table = bucket_table_name(&well.name, &channel.name);
                    if table_exists(&txn, &table)? {
                        warn!(%table, well = %well.name, channel = %name, "channel rename orphans bucket table");
                    }
                }
                channel.name = name;
            }
            if let Some(from) = update.data_from {
                channel.data_from = Some(from);
            }
            if let Some(to) = update.data_to {
                channel.data_to = Some(to);
            }
            channel.updated_at = Utc::now();
            put_record(&mut channels, id, &channel)?;
            channel
        };
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(id, name = %channel.name, "channel updated");
        Ok(Some(channel))
    }

    /// Delete a channel. Returns true if it existed.
    ///
    /// The channel's bucket table is not dropped.
    pub fn delete_channel(&self, id: ChannelId) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed = {
            let channel = {
                let channels = txn.open_table(CHANNELS).map_err(map_err!(Table))?;
                get_record::<Channel, _>(&channels, id)?
            };
            match channel {
                Some(channel) => {
                    remove_channels(&txn, std::slice::from_ref(&channel))?;
                    true
                }
                None => false,
            }
        };
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(id, existed, "channel deleted");
        Ok(existed)
    }

    /// Widen a channel's bounds to cover the given instants.
    ///
    /// Bounds only move outward; an instant already inside is a no-op.
    pub fn update_channel_bounds(
        &self,
        id: ChannelId,
        new_from: Option<DateTime<Utc>>,
        new_to: Option<DateTime<Utc>>,
    ) -> StateResult<Channel> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let (channel, _) = widen_channel_record(&txn, id, new_from, new_to)?
            .ok_or_else(|| StateError::NotFound(format!("channel with id {id} not found")))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(channel)
    }
}

// ── Transaction helpers ────────────────────────────────────────────

fn encode<T: Serialize>(value: &T) -> StateResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(map_err!(Serialize))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StateResult<T> {
    serde_json::from_slice(bytes).map_err(map_err!(Deserialize))
}

fn get_record<T, R>(table: &R, id: u64) -> StateResult<Option<T>>
where
    T: DeserializeOwned,
    R: ReadableTable<u64, &'static [u8]>,
{
    match table.get(id).map_err(map_err!(Read))? {
        Some(guard) => decode(guard.value()).map(Some),
        None => Ok(None),
    }
}

fn scan_records<T, R>(table: &R) -> StateResult<Vec<T>>
where
    T: DeserializeOwned,
    R: ReadableTable<u64, &'static [u8]>,
{
    let mut results = Vec::new();
    for entry in table.iter().map_err(map_err!(Read))? {
        let (_, value) = entry.map_err(map_err!(Read))?;
        results.push(decode(value.value())?);
    }
    Ok(results)
}

fn put_record<T: Serialize>(
    table: &mut Table<'_, u64, &'static [u8]>,
    id: u64,
    value: &T,
) -> StateResult<()> {
    let bytes = encode(value)?;
    table
        .insert(id, bytes.as_slice())
        .map_err(map_err!(Write))?;
    Ok(())
}

fn table_exists(txn: &WriteTransaction, name: &str) -> StateResult<bool> {
    Ok(txn
        .list_tables()
        .map_err(map_err!(Read))?
        .any(|handle| handle.name() == name))
}

fn channels_of_well(txn: &WriteTransaction, well_id: WellId) -> StateResult<Vec<Channel>> {
    let channels = txn.open_table(CHANNELS).map_err(map_err!(Table))?;
    Ok(scan_records::<Channel, _>(&channels)?
        .into_iter()
        .filter(|channel| channel.well_id == well_id)
        .collect())
}

fn remove_channels(txn: &WriteTransaction, doomed: &[Channel]) -> StateResult<()> {
    let mut channels = txn.open_table(CHANNELS).map_err(map_err!(Table))?;
    let mut names = txn.open_table(CHANNEL_NAMES).map_err(map_err!(Table))?;
    for channel in doomed {
        channels.remove(channel.id).map_err(map_err!(Write))?;
        names
            .remove((channel.well_id, channel.name.as_str()))
            .map_err(map_err!(Write))?;
    }
    Ok(())
}

/// Reserve `count` consecutive ids from a sequence, returning the first.
///
/// Ids are never handed out twice, even after the rows they labelled are
/// deleted.
pub(crate) fn reserve_ids(txn: &WriteTransaction, sequence: &str, count: u64) -> StateResult<u64> {
    let mut sequences = txn.open_table(SEQUENCES).map_err(map_err!(Table))?;
    let last = sequences
        .get(sequence)
        .map_err(map_err!(Read))?
        .map(|g| g.value())
        .unwrap_or(0);
    sequences
        .insert(sequence, last + count)
        .map_err(map_err!(Write))?;
    Ok(last + 1)
}

/// Widen the bounds of the channel addressed by well and channel name.
///
/// Returns whether the channel record was rewritten; a missing channel or
/// a range already inside the bounds writes nothing.
pub(crate) fn widen_bounds_by_names(
    txn: &WriteTransaction,
    well_name: &str,
    channel_name: &str,
    earliest: DateTime<Utc>,
    latest: DateTime<Utc>,
) -> StateResult<bool> {
    let channel_id = {
        let well_names = txn.open_table(WELL_NAMES).map_err(map_err!(Table))?;
        let channel_names = txn.open_table(CHANNEL_NAMES).map_err(map_err!(Table))?;
        match well_names.get(well_name).map_err(map_err!(Read))? {
            Some(well_id) => channel_names
                .get((well_id.value(), channel_name))
                .map_err(map_err!(Read))?
                .map(|g| g.value()),
            None => None,
        }
    };
    match channel_id {
        Some(id) => Ok(widen_channel_record(txn, id, Some(earliest), Some(latest))?
            .is_some_and(|(_, changed)| changed)),
        None => {
            debug!(well = %well_name, channel = %channel_name, "no channel to widen");
            Ok(false)
        }
    }
}

fn widen_channel_record(
    txn: &WriteTransaction,
    id: ChannelId,
    earliest: Option<DateTime<Utc>>,
    latest: Option<DateTime<Utc>>,
) -> StateResult<Option<(Channel, bool)>> {
    let mut channels = txn.open_table(CHANNELS).map_err(map_err!(Table))?;
    let Some(mut channel) = get_record::<Channel, _>(&channels, id)? else {
        return Ok(None);
    };
    let changed = channel.widen_bounds(earliest, latest);
    if changed {
        channel.updated_at = Utc::now();
        put_record(&mut channels, id, &channel)?;
        debug!(id, data_from = ?channel.data_from, data_to = ?channel.data_to, "channel bounds widened");
    }
    Ok(Some((channel, changed)))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};

    use super::*;

    fn test_well(name: &str, region: &str, depth: f64) -> NewWell {
        NewWell {
            name: name.to_string(),
            latitude: 57.5,
            longitude: 1.9,
            lift_type: Some("gas lift".to_string()),
            region: region.to_string(),
            installation_date: NaiveDate::from_ymd_opt(2019, 4, 2),
            depth,
            status: "producing".to_string(),
        }
    }

    fn test_channel(well_id: WellId, name: &str) -> NewChannel {
        NewChannel {
            well_id,
            name: name.to_string(),
            data_from: None,
            data_to: None,
        }
    }

    // ── Well CRUD ──────────────────────────────────────────────────

    #[test]
    fn well_create_and_get() {
        let store = StateStore::open_in_memory().unwrap();
        let well = store.create_well(test_well("W1", "North Sea", 3000.0)).unwrap();

        assert_eq!(store.get_well(well.id).unwrap(), Some(well.clone()));
        assert_eq!(store.get_well_by_name("W1").unwrap(), Some(well));
    }

    #[test]
    fn well_get_nonexistent_returns_none() {
        let store = StateStore::open_in_memory().unwrap();
        assert!(store.get_well(42).unwrap().is_none());
        assert!(store.get_well_by_name("nope").unwrap().is_none());
    }

    #[test]
    fn well_duplicate_name_conflicts() {
        let store = StateStore::open_in_memory().unwrap();
        store.create_well(test_well("W1", "North Sea", 3000.0)).unwrap();

        let err = store.create_well(test_well("W1", "Permian", 10.0)).unwrap_err();
        assert!(matches!(err, StateError::Conflict(_)));
        assert_eq!(store.list_wells(0, 100).unwrap().len(), 1);
    }

    #[test]
    fn well_list_paginates_in_id_order() {
        let store = StateStore::open_in_memory().unwrap();
        for name in ["a", "b", "c", "d"] {
            store.create_well(test_well(name, "r", 1.0)).unwrap();
        }

        let page: Vec<_> = store
            .list_wells(1, 2)
            .unwrap()
            .into_iter()
            .map(|w| w.name)
            .collect();
        assert_eq!(page, vec!["b", "c"]);
    }

    #[test]
    fn well_update_in_place() {
        let store = StateStore::open_in_memory().unwrap();
        let well = store.create_well(test_well("W1", "North Sea", 3000.0)).unwrap();

        let updated = store
            .update_well(
                well.id,
                WellUpdate {
                    name: Some("W1-renamed".to_string()),
                    status: Some("shut-in".to_string()),
                    ..Default::default()
                },
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.status, "shut-in");
        assert_eq!(updated.depth, 3000.0);
        assert!(store.get_well_by_name("W1").unwrap().is_none());
        assert_eq!(store.get_well_by_name("W1-renamed").unwrap(), Some(updated));
    }

    #[test]
    fn well_rename_to_taken_name_conflicts() {
        let store = StateStore::open_in_memory().unwrap();
        let a = store.create_well(test_well("A", "r", 1.0)).unwrap();
        store.create_well(test_well("B", "r", 1.0)).unwrap();

        let update = WellUpdate {
            name: Some("B".to_string()),
            ..Default::default()
        };
        assert!(matches!(store.update_well(a.id, update), Err(StateError::Conflict(_))));
        assert_eq!(store.get_well(a.id).unwrap().unwrap().name, "A");
    }

    #[test]
    fn well_update_nonexistent_returns_none() {
        let store = StateStore::open_in_memory().unwrap();
        assert!(store.update_well(7, WellUpdate::default()).unwrap().is_none());
    }

    #[test]
    fn well_delete_cascades_to_channels_not_buckets() {
        let store = StateStore::open_in_memory().unwrap();
        let well = store.create_well(test_well("W1", "r", 1.0)).unwrap();
        let channel = store.create_channel(test_channel(well.id, "flow")).unwrap();
        store.buckets().get_or_create_table("W1", "flow").unwrap();

        assert!(store.delete_well(well.id).unwrap());
        assert!(!store.delete_well(well.id).unwrap());
        assert!(store.get_channel(channel.id).unwrap().is_none());
        assert!(store.find_channel(well.id, "flow").unwrap().is_none());
        assert_eq!(store.buckets().list_all_bucket_tables().unwrap(), vec!["bucket_w1_flow"]);

        // The name is free again.
        store.create_well(test_well("W1", "r", 1.0)).unwrap();
    }

    #[test]
    fn wells_by_region_ignores_case() {
        let store = StateStore::open_in_memory().unwrap();
        store.create_well(test_well("a", "North Sea", 1.0)).unwrap();
        store.create_well(test_well("b", "north sea", 1.0)).unwrap();
        store.create_well(test_well("c", "Permian", 1.0)).unwrap();

        assert_eq!(store.wells_by_region("NORTH SEA").unwrap().len(), 2);
        assert!(store.wells_by_region("Gulf").unwrap().is_empty());
    }

    #[test]
    fn well_names_deeper_than_is_strict() {
        let store = StateStore::open_in_memory().unwrap();
        store.create_well(test_well("shallow", "r", 1000.0)).unwrap();
        store.create_well(test_well("exact", "r", 2000.0)).unwrap();
        store.create_well(test_well("deep", "r", 4000.0)).unwrap();

        assert_eq!(store.well_names_deeper_than(2000.0).unwrap(), vec!["deep"]);
    }

    // ── Channel CRUD ───────────────────────────────────────────────

    #[test]
    fn channel_create_and_find() {
        let store = StateStore::open_in_memory().unwrap();
        let well = store.create_well(test_well("W1", "r", 1.0)).unwrap();
        let channel = store.create_channel(test_channel(well.id, "flow")).unwrap();

        assert_eq!(store.get_channel(channel.id).unwrap(), Some(channel.clone()));
        assert_eq!(store.find_channel(well.id, "flow").unwrap(), Some(channel.clone()));
        let (found_well, found) = store.resolve_channel("W1", "flow").unwrap();
        assert_eq!(found_well.id, well.id);
        assert_eq!(found, channel);
    }

    #[test]
    fn channel_requires_existing_well() {
        let store = StateStore::open_in_memory().unwrap();
        let err = store.create_channel(test_channel(99, "flow")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn channel_name_unique_per_well() {
        let store = StateStore::open_in_memory().unwrap();
        let a = store.create_well(test_well("A", "r", 1.0)).unwrap();
        let b = store.create_well(test_well("B", "r", 1.0)).unwrap();
        store.create_channel(test_channel(a.id, "flow")).unwrap();

        let err = store.create_channel(test_channel(a.id, "flow")).unwrap_err();
        assert!(matches!(err, StateError::Conflict(_)));
        // Same name on another well is fine.
        store.create_channel(test_channel(b.id, "flow")).unwrap();
    }

    #[test]
    fn channel_list_for_well() {
        let store = StateStore::open_in_memory().unwrap();
        let a = store.create_well(test_well("A", "r", 1.0)).unwrap();
        let b = store.create_well(test_well("B", "r", 1.0)).unwrap();
        store.create_channel(test_channel(a.id, "flow")).unwrap();
        store.create_channel(test_channel(a.id, "pressure")).unwrap();
        store.create_channel(test_channel(b.id, "flow")).unwrap();

        assert_eq!(store.list_channels_for_well(a.id).unwrap().len(), 2);
        assert_eq!(store.list_channels(0, 100).unwrap().len(), 3);
        assert!(store.list_channels_for_well(77).unwrap_err().is_not_found());
    }

    #[test]
    fn resolve_channel_distinguishes_missing_well_and_channel() {
        let store = StateStore::open_in_memory().unwrap();
        store.create_well(test_well("W1", "r", 1.0)).unwrap();

        let err = store.resolve_channel("W2", "flow").unwrap_err();
        assert!(err.to_string().contains("well with name 'W2'"));
        let err = store.resolve_channel("W1", "flow").unwrap_err();
        assert!(err.to_string().contains("channel with name 'flow'"));
    }

    #[test]
    fn channel_details_carry_bucket_identity() {
        let store = StateStore::open_in_memory().unwrap();
        let well = store.create_well(test_well("Well A", "r", 1.0)).unwrap();
        let channel = store.create_channel(test_channel(well.id, "Gas-Rate")).unwrap();

        let details = store.get_channel_details(channel.id).unwrap().unwrap();
        assert_eq!(details.bucket_name, "Well A_Gas-Rate");
        assert_eq!(details.table_name, "bucket_well_a_gas_rate");
    }

    #[test]
    fn channel_update_and_rename() {
        let store = StateStore::open_in_memory().unwrap();
        let well = store.create_well(test_well("W1", "r", 1.0)).unwrap();
        let channel = store.create_channel(test_channel(well.id, "flow")).unwrap();
        store.create_channel(test_channel(well.id, "pressure")).unwrap();

        let taken = ChannelUpdate {
            name: Some("pressure".to_string()),
            ..Default::default()
        };
        assert!(matches!(store.update_channel(channel.id, taken), Err(StateError::Conflict(_))));

        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let updated = store
            .update_channel(
                channel.id,
                ChannelUpdate {
                    name: Some("oil".to_string()),
                    data_from: Some(from),
                    data_to: None,
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "oil");
        assert_eq!(updated.data_from, Some(from));
        assert!(store.find_channel(well.id, "flow").unwrap().is_none());
        assert_eq!(store.find_channel(well.id, "oil").unwrap(), Some(updated));
    }

    #[test]
    fn channel_delete() {
        let store = StateStore::open_in_memory().unwrap();
        let well = store.create_well(test_well("W1", "r", 1.0)).unwrap();
        let channel = store.create_channel(test_channel(well.id, "flow")).unwrap();

        assert!(store.delete_channel(channel.id).unwrap());
        assert!(!store.delete_channel(channel.id).unwrap());
        assert!(store.find_channel(well.id, "flow").unwrap().is_none());
        store.create_channel(test_channel(well.id, "flow")).unwrap();
    }

    #[test]
    fn channel_bounds_only_widen() {
        let store = StateStore::open_in_memory().unwrap();
        let well = store.create_well(test_well("W1", "r", 1.0)).unwrap();
        let channel = store.create_channel(test_channel(well.id, "flow")).unwrap();
        let day = |d: u32| Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap();

        let c = store.update_channel_bounds(channel.id, Some(day(10)), Some(day(20))).unwrap();
        assert_eq!((c.data_from, c.data_to), (Some(day(10)), Some(day(20))));

        let c = store.update_channel_bounds(channel.id, Some(day(15)), Some(day(12))).unwrap();
        assert_eq!((c.data_from, c.data_to), (Some(day(10)), Some(day(20))));

        let c = store.update_channel_bounds(channel.id, Some(day(5)), None).unwrap();
        assert_eq!((c.data_from, c.data_to), (Some(day(5)), Some(day(20))));

        assert!(store.update_channel_bounds(999, None, None).unwrap_err().is_not_found());
    }

    // ── Persistence (on-disk) ──────────────────────────────────────

    #[test]
    fn persistence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.redb");

        {
            let store = StateStore::open(&db_path).unwrap();
            let well = store.create_well(test_well("W1", "r", 1.0)).unwrap();
            store.create_channel(test_channel(well.id, "flow")).unwrap();
        }

        let store = StateStore::open(&db_path).unwrap();
        let (well, channel) = store.resolve_channel("W1", "flow").unwrap();
        assert_eq!(channel.well_id, well.id);

        // Sequences persist: new ids do not restart.
        let second = store.create_well(test_well("W2", "r", 1.0)).unwrap();
        assert!(second.id > well.id);
    }

    // ── Edge cases ─────────────────────────────────────────────────

    #[test]
    fn empty_store_operations() {
        let store = StateStore::open_in_memory().unwrap();

        assert!(store.list_wells(0, 100).unwrap().is_empty());
        assert!(store.list_channels(0, 100).unwrap().is_empty());
        assert!(store.wells_by_region("any").unwrap().is_empty());
        assert!(store.well_names_deeper_than(0.0).unwrap().is_empty());
        assert!(!store.delete_well(1).unwrap());
        assert!(!store.delete_channel(1).unwrap());
        assert!(store.get_channel_details(1).unwrap().is_none());
    }
}
