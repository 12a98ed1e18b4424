//! Tile fetch orchestration implementation

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::retry::{RetryPolicy, Sleeper, ThreadSleeper};
use super::types::{FetchReport, OrchestratorError, StagedTile};
use crate::provider::{Provider, ProviderError};
use crate::staging::StagingArea;
use crate::tile::{BoundingTileRect, TileIndex};

/// Default number of tiles fetched concurrently.
pub const DEFAULT_MAX_PARALLEL: usize = 4;

/// Fetches every tile of a rectangle and stages it on disk.
///
/// Tiles are fetched on a bounded worker pool, each with its own retry
/// budget. The first tile that exhausts its budget aborts the whole fetch;
/// the other workers stop before their next attempt.
///
/// # Example
///
/// ```ignore
/// use gsitile::orchestrator::TileFetcher;
/// use gsitile::provider::{GsiProvider, ReqwestClient, TileStyle};
/// use gsitile::staging::StagingArea;
/// use std::sync::Arc;
///
/// let provider = Arc::new(GsiProvider::new(ReqwestClient::new()?, TileStyle::Std));
/// let fetcher = TileFetcher::new(provider, StagingArea::new("tmp")?).with_max_parallel(8);
/// let report = fetcher.fetch_all(&plan.rect, plan.zoom, |done, total| {
///     eprint!("\rdownloading map tile: {} / {}", done, total);
/// })?;
/// ```
pub struct TileFetcher {
    provider: Arc<dyn Provider>,
    staging: StagingArea,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    max_parallel: usize,
    timeout: Option<Duration>,
}

/// Shared state of one `fetch_all` call.
struct FetchRun<'a> {
    zoom: u8,
    started: Instant,
    total: usize,
    done: AtomicUsize,
    retries: AtomicUsize,
    aborted: AtomicBool,
    failure: Mutex<Option<OrchestratorError>>,
    staged: Mutex<Vec<StagedTile>>,
    progress: &'a (dyn Fn(usize, usize) + Sync),
}

impl FetchRun<'_> {
    /// Records the first fatal error and tells the other workers to stop.
    fn fail(&self, error: OrchestratorError) {
        if !self.aborted.swap(true, Ordering::AcqRel) {
            *self.failure.lock() = Some(error);
        }
    }

    fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }
}

impl TileFetcher {
    /// Creates a fetcher with the default retry policy, no overall timeout
    /// and [`DEFAULT_MAX_PARALLEL`] workers.
    pub fn new(provider: Arc<dyn Provider>, staging: StagingArea) -> Self {
        Self {
            provider,
            staging,
            retry: RetryPolicy::default(),
            sleeper: Arc::new(ThreadSleeper),
            max_parallel: DEFAULT_MAX_PARALLEL,
            timeout: None,
        }
    }

    /// Set the per-tile retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the sleeper used for backoff.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Set the number of concurrent fetches. Zero is treated as one.
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    /// Set an overall deadline for fetching the whole rectangle.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetches and stages every tile of `rect`, each exactly once.
    ///
    /// `progress` is called with `(done, total)` after each tile is staged.
    /// It may be called from several worker threads.
    ///
    /// # Errors
    ///
    /// - `Retrieval` when one tile fails on every attempt
    /// - `Timeout` when the overall deadline passes
    /// - `Storage` when a tile cannot be written to the staging area
    pub fn fetch_all<F>(
        &self,
        rect: &BoundingTileRect,
        zoom: u8,
        progress: F,
    ) -> Result<FetchReport, OrchestratorError>
    where
        F: Fn(usize, usize) + Sync,
    {
        let tiles: Vec<TileIndex> = rect.tiles().collect();
        let run = FetchRun {
            zoom,
            started: Instant::now(),
            total: tiles.len(),
            done: AtomicUsize::new(0),
            retries: AtomicUsize::new(0),
            aborted: AtomicBool::new(false),
            failure: Mutex::new(None),
            staged: Mutex::new(Vec::with_capacity(tiles.len())),
            progress: &progress,
        };

        info!(
            provider = self.provider.name(),
            zoom,
            tiles = run.total,
            workers = self.max_parallel,
            "Fetching tiles"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_parallel)
            .thread_name(|i| format!("gsitile-fetch-{}", i))
            .build()
            .map_err(|e| OrchestratorError::WorkerPool(e.to_string()))?;

        pool.install(|| {
            tiles.par_iter().for_each(|index| {
                if run.is_aborted() {
                    return;
                }
                match self.fetch_and_stage(&run, index) {
                    Ok(Some(staged)) => {
                        run.staged.lock().push(staged);
                        let done = run.done.fetch_add(1, Ordering::AcqRel) + 1;
                        (run.progress)(done, run.total);
                    }
                    // Another worker failed first
                    Ok(None) => {}
                    Err(e) => run.fail(e),
                }
            })
        });

        if let Some(error) = run.failure.into_inner() {
            warn!(error = %error, "Tile fetch aborted");
            return Err(error);
        }

        let mut staged = run.staged.into_inner();
        staged.sort_by_key(|tile| tile.index);

        let report = FetchReport {
            tiles: staged,
            retries: run.retries.into_inner(),
            elapsed: run.started.elapsed(),
        };
        info!(
            tiles = report.tiles.len(),
            retries = report.retries,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "All tiles fetched"
        );
        Ok(report)
    }

    /// Fetches one tile with retries and writes it to staging.
    ///
    /// Returns `Ok(None)` when the run was aborted by another worker.
    fn fetch_and_stage(
        &self,
        run: &FetchRun<'_>,
        index: &TileIndex,
    ) -> Result<Option<StagedTile>, OrchestratorError> {
        let max_attempts = self.retry.attempts();
        let mut attempt = 0;
        let mut last_error = ProviderError::HttpError("no attempt made".to_string());

        while attempt < max_attempts {
            if run.is_aborted() {
                return Ok(None);
            }
            self.check_deadline(run)?;

            attempt += 1;
            match self.provider.fetch_tile(run.zoom, index.x, index.y) {
                Ok(data) => {
                    let path = self
                        .staging
                        .write_tile(index, self.provider.extension(), &data)?;
                    debug!(
                        tile_x = index.x,
                        tile_y = index.y,
                        attempt,
                        bytes = data.len(),
                        "Tile staged"
                    );
                    return Ok(Some(StagedTile {
                        index: *index,
                        path,
                    }));
                }
                Err(e) => {
                    debug!(
                        tile_x = index.x,
                        tile_y = index.y,
                        attempt,
                        error = %e,
                        "Tile fetch attempt failed"
                    );
                    let retryable = e.is_retryable();
                    last_error = e;
                    if !retryable {
                        break;
                    }
                    if attempt < max_attempts {
                        run.retries.fetch_add(1, Ordering::Relaxed);
                        self.sleeper.sleep(self.retry.backoff.delay(attempt));
                    }
                }
            }
        }

        Err(OrchestratorError::Retrieval {
            tile: *index,
            attempts: attempt,
            last_error,
        })
    }

    fn check_deadline(&self, run: &FetchRun<'_>) -> Result<(), OrchestratorError> {
        match self.timeout {
            Some(timeout) if run.started.elapsed() >= timeout => Err(OrchestratorError::Timeout {
                elapsed: run.started.elapsed(),
                tiles_fetched: run.done.load(Ordering::Acquire),
                tiles_total: run.total,
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::retry::tests::RecordingSleeper;
    use crate::orchestrator::Backoff;
    use crate::tile::AxisBound;
    use std::collections::HashMap;
    use tempfile::TempDir;

    /// Provider whose answers are scripted per tile.
    struct ScriptedProvider {
        /// Number of failures before a tile succeeds; missing means 0
        failures_before_success: HashMap<TileIndex, u32>,
        /// Tiles that always fail
        always_fail: Vec<TileIndex>,
        calls: Mutex<HashMap<TileIndex, u32>>,
    }

    impl ScriptedProvider {
        fn healthy() -> Self {
            Self {
                failures_before_success: HashMap::new(),
                always_fail: Vec::new(),
                calls: Mutex::new(HashMap::new()),
            }
        }

        fn calls_for(&self, index: TileIndex) -> u32 {
            self.calls.lock().get(&index).copied().unwrap_or(0)
        }
    }

    impl Provider for ScriptedProvider {
        fn fetch_tile(&self, _zoom: u8, x: u32, y: u32) -> Result<Vec<u8>, ProviderError> {
            let index = TileIndex::new(x, y);
            let call = {
                let mut calls = self.calls.lock();
                let entry = calls.entry(index).or_insert(0);
                *entry += 1;
                *entry
            };

            if self.always_fail.contains(&index) {
                return Err(ProviderError::HttpError("HTTP 503".to_string()));
            }
            let failures = self.failures_before_success.get(&index).copied().unwrap_or(0);
            if call <= failures {
                return Err(ProviderError::HttpError("connection reset".to_string()));
            }
            Ok(vec![x as u8, y as u8])
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn extension(&self) -> &str {
            "png"
        }

        fn min_zoom(&self) -> u8 {
            0
        }

        fn max_zoom(&self) -> u8 {
            18
        }
    }

    fn rect(min_x: u32, max_x: u32, min_y: u32, max_y: u32) -> BoundingTileRect {
        BoundingTileRect {
            min_x: AxisBound { tile: min_x, remainder: 0 },
            max_x: AxisBound { tile: max_x, remainder: 0 },
            min_y: AxisBound { tile: min_y, remainder: 0 },
            max_y: AxisBound { tile: max_y, remainder: 0 },
        }
    }

    fn fetcher(provider: Arc<ScriptedProvider>, temp: &TempDir) -> TileFetcher {
        TileFetcher::new(provider, StagingArea::new(temp.path()).unwrap())
            .with_sleeper(Arc::new(RecordingSleeper::default()))
    }

    #[test]
    fn test_fetch_all_stages_every_tile_once() {
        let temp = TempDir::new().unwrap();
        let provider = Arc::new(ScriptedProvider::healthy());
        let rect = rect(10, 12, 20, 21);

        let report = fetcher(Arc::clone(&provider), &temp)
            .fetch_all(&rect, 5, |_, _| {})
            .unwrap();

        assert_eq!(report.tiles.len(), 6);
        assert_eq!(report.retries, 0);
        for index in rect.tiles() {
            assert_eq!(provider.calls_for(index), 1, "tile {}", index);
            assert!(temp.path().join(index.staging_name("png")).exists());
        }
        let order: Vec<_> = report.tiles.iter().map(|t| t.index).collect();
        assert_eq!(order, rect.tiles().collect::<Vec<_>>());
    }

    #[test]
    fn test_fetch_all_reports_progress_up_to_total() {
        let temp = TempDir::new().unwrap();
        let provider = Arc::new(ScriptedProvider::healthy());
        let seen = Mutex::new(Vec::new());

        fetcher(provider, &temp)
            .with_max_parallel(3)
            .fetch_all(&rect(0, 1, 0, 1), 3, |done, total| {
                seen.lock().push((done, total));
            })
            .unwrap();

        let mut seen = seen.into_inner();
        seen.sort();
        assert_eq!(seen, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
    }

    #[test]
    fn test_transient_failures_are_retried_with_backoff() {
        let temp = TempDir::new().unwrap();
        let flaky = TileIndex::new(1, 1);
        let mut provider = ScriptedProvider::healthy();
        provider.failures_before_success.insert(flaky, 2);
        let provider = Arc::new(provider);
        let sleeper = Arc::new(RecordingSleeper::default());

        let report = TileFetcher::new(
            Arc::clone(&provider) as Arc<dyn Provider>,
            StagingArea::new(temp.path()).unwrap(),
        )
        .with_retry_policy(RetryPolicy::new(
            5,
            Backoff::Fixed(Duration::from_millis(10)),
        ))
        .with_sleeper(Arc::clone(&sleeper) as Arc<dyn Sleeper>)
        .fetch_all(&rect(1, 1, 1, 1), 4, |_, _| {})
        .unwrap();

        assert_eq!(report.retries, 2);
        assert_eq!(provider.calls_for(flaky), 3);
        assert_eq!(
            *sleeper.delays.lock(),
            vec![Duration::from_millis(10), Duration::from_millis(10)]
        );
    }

    #[test]
    fn test_exhausted_retries_abort_with_retrieval_error() {
        let temp = TempDir::new().unwrap();
        let broken = TileIndex::new(2, 3);
        let mut provider = ScriptedProvider::healthy();
        provider.always_fail.push(broken);
        let provider = Arc::new(provider);

        let result = fetcher(Arc::clone(&provider), &temp)
            .with_max_parallel(1)
            .fetch_all(&rect(2, 2, 3, 3), 4, |_, _| {});

        match result {
            Err(OrchestratorError::Retrieval {
                tile,
                attempts,
                last_error,
            }) => {
                assert_eq!(tile, broken);
                assert_eq!(attempts, 10);
                assert_eq!(last_error, ProviderError::HttpError("HTTP 503".to_string()));
            }
            other => panic!("expected retrieval error, got {:?}", other),
        }
        assert_eq!(provider.calls_for(broken), 10);
    }

    #[test]
    fn test_failure_stops_remaining_tiles_when_sequential() {
        let temp = TempDir::new().unwrap();
        let mut provider = ScriptedProvider::healthy();
        provider.always_fail.push(TileIndex::new(0, 0));
        let provider = Arc::new(provider);

        let result = fetcher(Arc::clone(&provider), &temp)
            .with_max_parallel(1)
            .fetch_all(&rect(0, 3, 0, 3), 4, |_, _| {});

        assert!(matches!(result, Err(OrchestratorError::Retrieval { .. })));
        // The last tile in order is never requested once the first one failed
        assert_eq!(provider.calls_for(TileIndex::new(3, 3)), 0);
    }

    #[test]
    fn test_non_retryable_error_fails_on_first_attempt() {
        let temp = TempDir::new().unwrap();
        let provider = Arc::new(ScriptedProvider::healthy());

        // Zoom 2 has only 4×4 tiles; tile 9 is outside the pyramid
        struct OutOfRange(Arc<ScriptedProvider>);
        impl Provider for OutOfRange {
            fn fetch_tile(&self, zoom: u8, x: u32, y: u32) -> Result<Vec<u8>, ProviderError> {
                self.0.fetch_tile(zoom, x, y)?;
                Err(ProviderError::UnsupportedCoordinates { x, y, zoom })
            }
            fn name(&self) -> &str {
                "out-of-range"
            }
            fn extension(&self) -> &str {
                "png"
            }
            fn min_zoom(&self) -> u8 {
                0
            }
            fn max_zoom(&self) -> u8 {
                18
            }
        }

        let result = TileFetcher::new(
            Arc::new(OutOfRange(Arc::clone(&provider))),
            StagingArea::new(temp.path()).unwrap(),
        )
        .fetch_all(&rect(9, 9, 0, 0), 2, |_, _| {});

        assert!(matches!(
            result,
            Err(OrchestratorError::Retrieval { attempts: 1, .. })
        ));
        assert_eq!(provider.calls_for(TileIndex::new(9, 0)), 1);
    }

    #[test]
    fn test_zero_timeout_fails_before_any_request() {
        let temp = TempDir::new().unwrap();
        let provider = Arc::new(ScriptedProvider::healthy());

        let result = fetcher(Arc::clone(&provider), &temp)
            .with_timeout(Some(Duration::ZERO))
            .fetch_all(&rect(0, 1, 0, 0), 3, |_, _| {});

        assert!(matches!(
            result,
            Err(OrchestratorError::Timeout {
                tiles_fetched: 0,
                tiles_total: 2,
                ..
            })
        ));
        assert_eq!(provider.calls_for(TileIndex::new(0, 0)), 0);
    }

    #[test]
    fn test_staging_write_failure_is_storage_error() {
        let temp = TempDir::new().unwrap();
        let staging = StagingArea::new(temp.path().join("staging")).unwrap();
        std::fs::remove_dir_all(staging.dir()).unwrap();

        let result = TileFetcher::new(Arc::new(ScriptedProvider::healthy()), staging)
            .fetch_all(&rect(0, 0, 0, 0), 1, |_, _| {});

        assert!(matches!(result, Err(OrchestratorError::Storage(_))));
    }

    #[test]
    fn test_fetcher_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TileFetcher>();
    }
}
