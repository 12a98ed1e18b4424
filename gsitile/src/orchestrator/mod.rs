//! Tile download orchestration
//!
//! Fetches every tile of a [`BoundingTileRect`](crate::tile::BoundingTileRect)
//! on a bounded worker pool, retries each tile independently and stages the
//! encoded bytes on disk. One tile exhausting its retries fails the request.

mod download;
mod retry;
mod types;

pub use download::{TileFetcher, DEFAULT_MAX_PARALLEL};
pub use retry::{Backoff, RetryPolicy, Sleeper, ThreadSleeper, DEFAULT_MAX_ATTEMPTS};
pub use types::{FetchReport, OrchestratorError, StagedTile};
