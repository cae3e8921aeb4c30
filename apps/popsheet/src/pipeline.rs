//! # Transfer Pipeline
//!
//! The one-shot sequence popsheet runs:
//!
//! 1. insert the header at row 1
//! 2. map every country to a seven-cell row
//! 3. append the rows, one paced request each (or a single batch)
//! 4. sort by the configured column
//!
//! A failing step ends the run. Rows written before the failure stay in the
//! destination.

use crate::sink::SheetSink;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use popsheet_core::{
    COLUMN_COUNT, Config, Country, PopsheetError, Row, SortSpec, WriteMode, country_to_row,
    header_row,
};
use std::time::Duration;

/// Rows between progress log lines.
const PROGRESS_EVERY: usize = 25;

// =============================================================================
// PACER
// =============================================================================

/// Direct rate limiter type alias.
type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Enforces the fixed delay between single-row appends.
///
/// The first call passes at once; each later call waits until `delay` has
/// passed since the previous one. A zero delay disables pacing.
pub struct Pacer {
    limiter: Option<DirectRateLimiter>,
}

impl Pacer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            limiter: Quota::with_period(delay).map(RateLimiter::direct),
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self { limiter: None }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }

    pub async fn wait(&self) {
        if let Some(ref limiter) = self.limiter {
            limiter.until_ready().await;
        }
    }
}

// =============================================================================
// PIPELINE
// =============================================================================

/// Outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunReport {
    pub rows_written: usize,
    pub sorted: bool,
}

/// The header → rows → sort sequence, configured once per run.
pub struct Pipeline {
    header: Row,
    mode: WriteMode,
    sort: Option<SortSpec>,
    pacer: Pacer,
}

impl Pipeline {
    pub fn from_config(config: &Config) -> Result<Self, PopsheetError> {
        Ok(Self {
            header: header_row(&config.write.header)?,
            mode: config.write.mode,
            sort: config.sort.enabled.then(|| config.sort.spec()),
            pacer: Pacer::new(Duration::from_millis(config.write.delay_ms)),
        })
    }

    #[must_use]
    pub fn with_pacer(mut self, pacer: Pacer) -> Self {
        self.pacer = pacer;
        self
    }

    /// Map records to rows, in input order.
    #[must_use]
    pub fn rows_for(countries: &[Country]) -> Vec<Row> {
        countries.iter().map(country_to_row).collect()
    }

    /// Run the whole sequence against `sink`.
    pub async fn run<S: SheetSink>(
        &self,
        countries: &[Country],
        sink: &mut S,
    ) -> Result<RunReport, PopsheetError> {
        tracing::info!("Writing {} countries to {}", countries.len(), sink.describe());

        sink.insert_row(self.header.clone(), 1).await?;

        let rows = Self::rows_for(countries);
        let total = rows.len();
        match self.mode {
            WriteMode::Batch => {
                sink.append_rows(rows).await?;
            }
            WriteMode::Row => {
                for (i, row) in rows.into_iter().enumerate() {
                    self.pacer.wait().await;
                    sink.append_row(row).await?;
                    let done = i + 1;
                    if done % PROGRESS_EVERY == 0 || done == total {
                        tracing::info!("Appended {}/{} rows", done, total);
                    }
                }
            }
        }

        let sorted = self.sort(sink).await?;
        Ok(RunReport {
            rows_written: total,
            sorted,
        })
    }

    /// Apply the configured sort, if any. Returns whether a sort was sent.
    pub async fn sort<S: SheetSink>(&self, sink: &mut S) -> Result<bool, PopsheetError> {
        let Some(spec) = self.sort else {
            tracing::info!("Sorting disabled");
            return Ok(false);
        };
        tracing::info!(
            "Sorting {} by {} ({}), skipping {} row(s)",
            sink.describe(),
            spec.column,
            spec.order,
            spec.skip_rows
        );
        sink.sort(&spec, COLUMN_COUNT).await?;
        Ok(true)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use popsheet_core::{Cell, Column};
    use std::time::Instant;

    /// Records every call so tests can check the sequence.
    #[derive(Default)]
    struct RecordingSink {
        calls: Vec<String>,
        fail_on_append: Option<usize>,
        appended: usize,
    }

    impl SheetSink for RecordingSink {
        fn describe(&self) -> String {
            "recording".to_string()
        }

        async fn insert_row(&mut self, row: Row, at: usize) -> Result<(), PopsheetError> {
            self.calls.push(format!("insert@{}:{}", at, row.width()));
            Ok(())
        }

        async fn append_row(&mut self, _row: Row) -> Result<(), PopsheetError> {
            if self.fail_on_append == Some(self.appended) {
                return Err(PopsheetError::Remote("quota".into()));
            }
            self.appended += 1;
            self.calls.push("append".to_string());
            Ok(())
        }

        async fn append_rows(&mut self, rows: Vec<Row>) -> Result<(), PopsheetError> {
            self.calls.push(format!("append_rows:{}", rows.len()));
            Ok(())
        }

        async fn sort(&mut self, spec: &SortSpec, width: usize) -> Result<(), PopsheetError> {
            self.calls
                .push(format!("sort:{}:{}:{}", spec.column, spec.order, width));
            Ok(())
        }
    }

    fn countries(n: usize) -> Vec<Country> {
        (0..n)
            .map(|i| Country {
                population: Some(i as u64),
                ..Country::named(format!("C{i}"))
            })
            .collect()
    }

    fn config(mode: WriteMode) -> Config {
        let mut config = Config::default();
        config.write.mode = mode;
        config.write.delay_ms = 0;
        config
    }

    #[tokio::test]
    async fn row_mode_sequence() {
        let pipeline = Pipeline::from_config(&config(WriteMode::Row)).expect("pipeline");
        let mut sink = RecordingSink::default();

        let report = pipeline.run(&countries(3), &mut sink).await.expect("run");

        assert_eq!(
            sink.calls,
            vec![
                "insert@1:7",
                "append",
                "append",
                "append",
                "sort:population:desc:7"
            ]
        );
        assert_eq!(
            report,
            RunReport {
                rows_written: 3,
                sorted: true
            }
        );
    }

    #[tokio::test]
    async fn batch_mode_uses_one_append() {
        let pipeline = Pipeline::from_config(&config(WriteMode::Batch)).expect("pipeline");
        let mut sink = RecordingSink::default();

        pipeline.run(&countries(4), &mut sink).await.expect("run");

        assert_eq!(sink.calls[1], "append_rows:4");
        assert_eq!(sink.calls.len(), 3);
    }

    #[tokio::test]
    async fn sort_can_be_disabled() {
        let mut cfg = config(WriteMode::Row);
        cfg.sort.enabled = false;
        let pipeline = Pipeline::from_config(&cfg).expect("pipeline");
        let mut sink = RecordingSink::default();

        let report = pipeline.run(&countries(1), &mut sink).await.expect("run");

        assert!(!report.sorted);
        assert!(sink.calls.iter().all(|c| !c.starts_with("sort")));
    }

    #[tokio::test]
    async fn failure_stops_the_run() {
        let pipeline = Pipeline::from_config(&config(WriteMode::Row)).expect("pipeline");
        let mut sink = RecordingSink {
            fail_on_append: Some(2),
            ..RecordingSink::default()
        };

        let err = pipeline.run(&countries(5), &mut sink).await;

        assert!(matches!(err, Err(PopsheetError::Remote(_))));
        assert_eq!(sink.appended, 2);
        assert!(sink.calls.iter().all(|c| !c.starts_with("sort")));
    }

    #[tokio::test]
    async fn pacer_spaces_calls() {
        let pacer = Pacer::new(Duration::from_millis(40));
        assert!(pacer.is_enabled());

        let start = Instant::now();
        pacer.wait().await;
        pacer.wait().await;
        pacer.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(70));
    }

    #[test]
    fn zero_delay_disables_pacer() {
        assert!(!Pacer::new(Duration::ZERO).is_enabled());
        assert!(!Pacer::disabled().is_enabled());
    }

    #[test]
    fn rows_keep_input_order() {
        let rows = Pipeline::rows_for(&countries(2));
        assert_eq!(rows[1].get(Column::Name.index()), Some(&Cell::from("C1")));
    }

    #[test]
    fn bad_header_is_rejected() {
        let mut cfg = Config::default();
        cfg.write.header = vec!["only".into()];
        assert!(Pipeline::from_config(&cfg).is_err());
    }
}
