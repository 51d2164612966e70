//! Generator — fills a channel's bucket with synthetic readings.
//!
//! Resolves the generation window against the channel's current bounds,
//! walks it at a fixed step (both ends inclusive), and writes every sample
//! through one batch insert so rows and bounds commit together.

use std::f64::consts::PI;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use welltrack_state::{NewDataPoint, StateStore};

use crate::error::{GeneratorError, GeneratorResult};
use crate::pattern::{PatternParams, round2, uniform_noise};

/// Days a window reaches back when neither the request nor the channel
/// supplies a start.
const DEFAULT_LOOKBACK_DAYS: i64 = 30;

/// Most samples one run may write.
pub const MAX_POINTS_PER_RUN: i64 = 1_000_000;

/// Sampling window and write options for one generation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulateRequest {
    /// Defaults to the channel's `data_from`, then to 30 days ago.
    pub start: Option<DateTime<Utc>>,
    /// Defaults to the channel's `data_to`, then to now.
    pub end: Option<DateTime<Utc>>,
    pub interval_seconds: i64,
    /// Widen the channel's bounds to the generated extent.
    pub update_channel_dates: bool,
}

impl Default for PopulateRequest {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            interval_seconds: 3600,
            update_channel_dates: true,
        }
    }
}

/// Outcome of a generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub well_name: String,
    pub channel_name: String,
    pub points_generated: usize,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub interval_seconds: i64,
}

/// Sample function: `(days since start, rng) -> value`.
pub type ValueFn<'a> = dyn Fn(f64, &mut StdRng) -> f64 + 'a;

/// Synthetic data generator over a [`StateStore`].
pub struct Generator {
    store: StateStore,
    rng: Mutex<StdRng>,
}

impl Generator {
    /// Create a generator with an OS-seeded noise source.
    pub fn new(store: StateStore) -> Self {
        Self::with_rng(store, StdRng::from_os_rng())
    }

    /// Create a generator with a fixed seed, for reproducible output.
    pub fn with_seed(store: StateStore, seed: u64) -> Self {
        Self::with_rng(store, StdRng::seed_from_u64(seed))
    }

    fn with_rng(store: StateStore, rng: StdRng) -> Self {
        Self {
            store,
            rng: Mutex::new(rng),
        }
    }

    /// Generate and store evenly spaced samples for a channel.
    ///
    /// Without a `value_fn` the default daily wave is used:
    /// `50 + 25 * sin(pi * d / 15)` plus uniform noise in `[-5, 5]`.
    /// A window with `start == end` yields exactly one sample.
    pub fn populate(
        &self,
        well_name: &str,
        channel_name: &str,
        request: &PopulateRequest,
        value_fn: Option<&ValueFn<'_>>,
    ) -> GeneratorResult<GenerationSummary> {
        let step = match Duration::try_seconds(request.interval_seconds) {
            Some(step) if request.interval_seconds > 0 => step,
            _ => {
                return Err(GeneratorError::InvalidParameter(format!(
                    "interval_seconds must be positive and within range, got {}",
                    request.interval_seconds
                )));
            }
        };
        let (_, channel) = self.store.resolve_channel(well_name, channel_name)?;

        let now = Utc::now();
        let start = request
            .start
            .or(channel.data_from)
            .unwrap_or(now - Duration::days(DEFAULT_LOOKBACK_DAYS));
        let end = request.end.or(channel.data_to).unwrap_or(now);
        if start > end {
            return Err(GeneratorError::InvalidRange(format!(
                "start {start} is after end {end}"
            )));
        }
        let expected = (end - start).num_seconds() / request.interval_seconds + 1;
        if expected > MAX_POINTS_PER_RUN {
            return Err(GeneratorError::InvalidParameter(format!(
                "window would generate {expected} points, more than {MAX_POINTS_PER_RUN}"
            )));
        }

        let points = {
            let mut guard = self.rng();
            let rng: &mut StdRng = &mut guard;
            let mut points = Vec::with_capacity(expected as usize);
            let mut time = start;
            while time <= end {
                let days = days_between(start, time);
                let value = match value_fn {
                    Some(f) => f(days, &mut *rng),
                    None => default_value(days, &mut *rng),
                };
                points.push(NewDataPoint::new(time, value));
                // Stepping past the last representable instant ends the walk.
                match time.checked_add_signed(step) {
                    Some(next) => time = next,
                    None => break,
                }
            }
            points
        };

        let table = self
            .store
            .buckets()
            .get_or_create_table(well_name, channel_name)?;
        self.store
            .insert_batch_with(&table, &points, request.update_channel_dates)?;

        info!(
            well = %well_name,
            channel = %channel_name,
            points = points.len(),
            %start,
            %end,
            "synthetic data generated"
        );
        Ok(GenerationSummary {
            well_name: well_name.to_string(),
            channel_name: channel_name.to_string(),
            points_generated: points.len(),
            start,
            end,
            interval_seconds: request.interval_seconds,
        })
    }

    /// Generate a pattern series and store it through [`Generator::populate`].
    pub fn generate_pattern(
        &self,
        well_name: &str,
        channel_name: &str,
        request: &PopulateRequest,
        params: &PatternParams,
    ) -> GeneratorResult<GenerationSummary> {
        params.validate()?;
        debug!(
            well = %well_name,
            channel = %channel_name,
            pattern = %params.pattern_type,
            "generating pattern series"
        );
        let value_fn: &ValueFn<'_> = &|days: f64, rng: &mut StdRng| params.value_at(days, rng);
        self.populate(well_name, channel_name, request, Some(value_fn))
    }

    fn rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn days_between(start: DateTime<Utc>, time: DateTime<Utc>) -> f64 {
    (time - start).num_milliseconds() as f64 / 86_400_000.0
}

fn default_value(days: f64, rng: &mut StdRng) -> f64 {
    round2(50.0 + 25.0 * (days * PI / 15.0).sin() + uniform_noise(rng, 5.0))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use welltrack_state::{NewChannel, NewWell, TimeRange};

    use super::*;
    use crate::pattern::PatternType;

    fn d0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()
    }

    fn seeded_store() -> StateStore {
        let store = StateStore::open_in_memory().unwrap();
        let well = store
            .create_well(NewWell {
                name: "W1".to_string(),
                latitude: 60.1,
                longitude: 2.7,
                lift_type: None,
                region: "North Sea".to_string(),
                installation_date: None,
                depth: 2500.0,
                status: "producing".to_string(),
            })
            .unwrap();
        store
            .create_channel(NewChannel {
                well_id: well.id,
                name: "flow".to_string(),
                data_from: None,
                data_to: None,
            })
            .unwrap();
        store
    }

    fn window(start: DateTime<Utc>, end: DateTime<Utc>, interval_seconds: i64) -> PopulateRequest {
        PopulateRequest {
            start: Some(start),
            end: Some(end),
            interval_seconds,
            update_channel_dates: true,
        }
    }

    #[test]
    fn square_pattern_over_four_days() {
        let store = seeded_store();
        let generator = Generator::with_seed(store.clone(), 42);
        let params = PatternParams {
            pattern_type: PatternType::Square,
            base_value: 10.0,
            amplitude: 5.0,
            period_days: 2.0,
            trend_slope: 0.0,
            noise_level: 0.25,
        };

        let summary = generator
            .generate_pattern("W1", "flow", &window(d0(), d0() + Duration::days(4), 86_400), &params)
            .unwrap();
        assert_eq!(summary.points_generated, 5);
        assert_eq!(summary.start, d0());
        assert_eq!(summary.end, d0() + Duration::days(4));

        let points = store.get_points("W1", "flow", TimeRange::all(), 0, 100).unwrap();
        assert_eq!(points.len(), 5);
        for (day, point) in points.iter().enumerate() {
            assert_eq!(point.time, d0() + Duration::days(day as i64));
            assert_eq!(round2(point.value), point.value);
            let high = (point.value - 15.0).abs() <= 0.25;
            let low = (point.value - 5.0).abs() <= 0.25;
            assert!(high || low, "day {day}: {}", point.value);
        }
        assert!((points[0].value - 15.0).abs() <= 0.25);
    }

    #[test]
    fn zero_length_window_writes_one_point() {
        let store = seeded_store();
        let generator = Generator::with_seed(store.clone(), 1);

        let summary = generator
            .populate("W1", "flow", &window(d0(), d0(), 3600), None)
            .unwrap();
        assert_eq!(summary.points_generated, 1);

        let points = store.get_points("W1", "flow", TimeRange::all(), 0, 10).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].time, d0());
    }

    #[test]
    fn inverted_window_is_rejected_and_writes_nothing() {
        let store = seeded_store();
        let generator = Generator::with_seed(store.clone(), 1);

        let err = generator
            .populate("W1", "flow", &window(d0() + Duration::hours(1), d0(), 3600), None)
            .unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidRange(_)));
        assert!(err.is_rejected_input());
        assert!(store.buckets().list_all_bucket_tables().unwrap().is_empty());
    }

    #[test]
    fn default_values_stay_in_band() {
        let store = seeded_store();
        let generator = Generator::with_seed(store.clone(), 9);

        let summary = generator
            .populate("W1", "flow", &window(d0(), d0() + Duration::days(2), 3600), None)
            .unwrap();
        assert_eq!(summary.points_generated, 49);

        let stats = store.get_statistics("W1", "flow", TimeRange::all()).unwrap();
        assert_eq!(stats.count, 49);
        assert!(stats.min.unwrap() >= 50.0 - 5.0);
        assert!(stats.max.unwrap() <= 50.0 + 25.0 + 5.0);
    }

    #[test]
    fn populate_widens_channel_bounds_unless_disabled() {
        let store = seeded_store();
        let generator = Generator::with_seed(store.clone(), 3);

        let mut request = window(d0(), d0() + Duration::hours(5), 3600);
        request.update_channel_dates = false;
        generator.populate("W1", "flow", &request, None).unwrap();
        let (_, channel) = store.resolve_channel("W1", "flow").unwrap();
        assert_eq!((channel.data_from, channel.data_to), (None, None));

        request.update_channel_dates = true;
        generator.populate("W1", "flow", &request, None).unwrap();
        let (_, channel) = store.resolve_channel("W1", "flow").unwrap();
        assert_eq!(channel.data_from, Some(d0()));
        assert_eq!(channel.data_to, Some(d0() + Duration::hours(5)));
    }

    #[test]
    fn window_defaults_to_channel_bounds() {
        let store = seeded_store();
        let (_, channel) = store.resolve_channel("W1", "flow").unwrap();
        store
            .update_channel_bounds(channel.id, Some(d0()), Some(d0() + Duration::hours(3)))
            .unwrap();
        let generator = Generator::with_seed(store.clone(), 5);
        let constant: &ValueFn<'_> = &|_: f64, _: &mut StdRng| 1.0;

        let summary = generator
            .populate("W1", "flow", &PopulateRequest::default(), Some(constant))
            .unwrap();
        assert_eq!(summary.start, d0());
        assert_eq!(summary.end, d0() + Duration::hours(3));
        assert_eq!(summary.points_generated, 4);
    }

    #[test]
    fn same_seed_same_series() {
        let run = |seed| {
            let store = seeded_store();
            Generator::with_seed(store.clone(), seed)
                .populate("W1", "flow", &window(d0(), d0() + Duration::days(1), 3600), None)
                .unwrap();
            store
                .get_points("W1", "flow", TimeRange::all(), 0, 100)
                .unwrap()
                .into_iter()
                .map(|p| p.value)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(11), run(11));
    }

    #[test]
    fn bad_interval_and_unknown_channel() {
        let store = seeded_store();
        let generator = Generator::with_seed(store, 1);

        let err = generator
            .populate("W1", "flow", &window(d0(), d0(), 0), None)
            .unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidParameter(_)));

        let err = generator
            .generate_pattern("W1", "nope", &PopulateRequest::default(), &PatternParams::default())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn out_of_range_interval_is_rejected() {
        let store = seeded_store();
        let generator = Generator::with_seed(store.clone(), 1);

        let err = generator
            .populate("W1", "flow", &window(d0(), d0() + Duration::days(1), i64::MAX), None)
            .unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidParameter(_)));
        assert!(err.is_rejected_input());
        assert!(store.get_points("W1", "flow", TimeRange::all(), 0, 10).unwrap().is_empty());
    }

    #[test]
    fn step_past_last_instant_ends_the_walk() {
        let store = seeded_store();
        let generator = Generator::with_seed(store.clone(), 1);

        let summary = generator
            .populate("W1", "flow", &window(d0(), d0() + Duration::days(1), 9_000_000_000_000_000), None)
            .unwrap();
        assert_eq!(summary.points_generated, 1);

        let points = store.get_points("W1", "flow", TimeRange::all(), 0, 10).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].time, d0());
    }

    #[test]
    fn oversized_window_is_rejected_before_writing() {
        let store = seeded_store();
        let generator = Generator::with_seed(store.clone(), 1);
        let epoch = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();

        let err = generator
            .populate("W1", "flow", &window(epoch, d0(), 1), None)
            .unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidParameter(_)));
        assert!(store.get_points("W1", "flow", TimeRange::all(), 0, 10).unwrap().is_empty());

        let one_over = window(d0(), d0() + Duration::seconds(MAX_POINTS_PER_RUN), 1);
        assert!(generator.populate("W1", "flow", &one_over, None).is_err());

        let at_limit = window(d0(), d0() + Duration::seconds(MAX_POINTS_PER_RUN - 1), 1_000);
        let summary = generator.populate("W1", "flow", &at_limit, None).unwrap();
        assert_eq!(summary.points_generated, 1_000);
    }
}
