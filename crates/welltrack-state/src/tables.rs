//! redb table definitions for the welltrack store.
//!
//! Metadata tables use `u64` ids as keys and `&[u8]` values holding
//! JSON-serialized domain types. Name tables act as uniqueness indexes.
//! Bucket tables are not listed here: their names are computed at runtime,
//! see [`crate::bucket`].

use redb::TableDefinition;

/// Wells keyed by id.
pub const WELLS: TableDefinition<u64, &[u8]> = TableDefinition::new("wells");

/// Unique well name -> well id.
pub const WELL_NAMES: TableDefinition<&str, u64> = TableDefinition::new("well_names");

/// Channels keyed by id.
pub const CHANNELS: TableDefinition<u64, &[u8]> = TableDefinition::new("channels");

/// `(well_id, channel name)` -> channel id. Enforces per-well name uniqueness.
pub const CHANNEL_NAMES: TableDefinition<(u64, &str), u64> =
    TableDefinition::new("channel_names");

/// Last issued id per sequence name.
pub const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

/// Sequence name for well ids.
pub const WELL_SEQUENCE: &str = "wells";

/// Sequence name for channel ids.
pub const CHANNEL_SEQUENCE: &str = "channels";
