//! Bucket table registry.
//!
//! Resolves a (well, channel) pair to its bucket table, creating the table
//! on first use. Resolved schemas are cached for the lifetime of the
//! process and never evicted. The cache mutex is held across the
//! check-and-create path, so concurrent first resolutions of the same pair
//! create the table once and share one cached schema.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use redb::{Database, ReadableDatabase, TableDefinition, TableHandle};
use tracing::debug;

use super::{BUCKET_PREFIX, INDEX_PREFIX, bucket_table_name};
use crate::error::{StateError, StateResult};

/// Physical layout of one bucket: the row table and its id index.
#[derive(Debug, PartialEq, Eq)]
pub struct BucketSchema {
    name: String,
    index_name: String,
}

impl BucketSchema {
    fn new(name: String) -> Self {
        let index_name = format!("{INDEX_PREFIX}{name}");
        Self { name, index_name }
    }

    /// Row table name (`bucket_…`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id index table name (`idx_bucket_…`).
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// `(time_micros, id) -> value`.
    pub(crate) fn rows(&self) -> TableDefinition<'_, (i64, u64), f64> {
        TableDefinition::new(&self.name)
    }

    /// `id -> time_micros`.
    pub(crate) fn ids(&self) -> TableDefinition<'_, u64, i64> {
        TableDefinition::new(&self.index_name)
    }
}

/// Handle to a resolved bucket, carrying the names it was resolved for.
///
/// The schema is shared with the registry cache. The well and channel names
/// are the caller's, so two pairs that sanitize to the same table still
/// update their own channel's bounds.
#[derive(Debug, Clone)]
pub struct BucketTable {
    schema: Arc<BucketSchema>,
    well_name: String,
    channel_name: String,
}

impl BucketTable {
    pub fn schema(&self) -> &Arc<BucketSchema> {
        &self.schema
    }

    pub fn table_name(&self) -> &str {
        self.schema.name()
    }

    pub fn well_name(&self) -> &str {
        &self.well_name
    }

    pub fn channel_name(&self) -> &str {
        &self.channel_name
    }
}

/// Keyed factory over bucket tables.
pub struct BucketRegistry {
    db: Arc<Database>,
    schemas: Mutex<HashMap<String, Arc<BucketSchema>>>,
}

impl BucketRegistry {
    pub(crate) fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            schemas: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve the bucket for a pair, creating its tables if absent.
    pub fn get_or_create_table(
        &self,
        well_name: &str,
        channel_name: &str,
    ) -> StateResult<BucketTable> {
        let table_name = bucket_table_name(well_name, channel_name);
        let mut schemas = self.lock();
        let schema = match schemas.get(&table_name) {
            Some(schema) => Arc::clone(schema),
            None => {
                let schema = Arc::new(BucketSchema::new(table_name));
                if !self.table_exists(schema.name())? {
                    self.create_tables(&schema)?;
                }
                schemas.insert(schema.name.clone(), Arc::clone(&schema));
                schema
            }
        };
        Ok(Self::handle(schema, well_name, channel_name))
    }

    /// Resolve the bucket for a pair without creating it.
    pub fn get_existing_table(
        &self,
        well_name: &str,
        channel_name: &str,
    ) -> StateResult<Option<BucketTable>> {
        let table_name = bucket_table_name(well_name, channel_name);
        let mut schemas = self.lock();
        if let Some(schema) = schemas.get(&table_name) {
            return Ok(Some(Self::handle(
                Arc::clone(schema),
                well_name,
                channel_name,
            )));
        }
        if !self.table_exists(&table_name)? {
            return Ok(None);
        }
        let schema = Arc::new(BucketSchema::new(table_name));
        schemas.insert(schema.name.clone(), Arc::clone(&schema));
        Ok(Some(Self::handle(schema, well_name, channel_name)))
    }

    /// Names of all bucket tables in storage, sorted.
    pub fn list_all_bucket_tables(&self) -> StateResult<Vec<String>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let mut names: Vec<String> = txn
            .list_tables()
            .map_err(map_err!(Read))?
            .map(|handle| handle.name().to_string())
            .filter(|name| name.starts_with(BUCKET_PREFIX))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Number of cached schemas.
    pub fn cached(&self) -> usize {
        self.lock().len()
    }

    fn handle(schema: Arc<BucketSchema>, well_name: &str, channel_name: &str) -> BucketTable {
        BucketTable {
            schema,
            well_name: well_name.to_string(),
            channel_name: channel_name.to_string(),
        }
    }

    fn table_exists(&self, name: &str) -> StateResult<bool> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let exists = txn
            .list_tables()
            .map_err(map_err!(Read))?
            .any(|handle| handle.name() == name);
        Ok(exists)
    }

    fn create_tables(&self, schema: &BucketSchema) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(schema.rows()).map_err(map_err!(Table))?;
        txn.open_table(schema.ids()).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(table = %schema.name, "bucket table created");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<BucketSchema>>> {
        // The map is only ever inserted into; a panicking holder cannot leave it torn.
        self.schemas.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
