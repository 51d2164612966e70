//! welltrack-generator — synthetic time series for channels.
//!
//! Produces evenly spaced readings over a time window and writes them into
//! the channel's bucket in one batch. Used for seeding demo data.
//!
//! # Architecture
//!
//! ```text
//! Generator
//!   ├── StateStore (resolve channel, get_or_create bucket, batch insert)
//!   ├── PatternParams (base + pattern(d) + slope·d + noise)
//!   └── StdRng (noise source, seedable for tests)
//! ```

pub mod error;
pub mod generator;
pub mod pattern;

pub use error::{GeneratorError, GeneratorResult};
pub use generator::{GenerationSummary, Generator, MAX_POINTS_PER_RUN, PopulateRequest};
pub use pattern::{PatternParams, PatternType};
