//! Stitch pipeline glue.
//!
//! Ties the independent pieces together for one request:
//!
//! ```text
//! BoundingBox ──► TilePlan ──► TileFetcher ──► staged tiles
//!                                                   │
//!        output file ◄── save_image ◄── crop ◄── merge
//! ```
//!
//! # Example
//!
//! ```ignore
//! use gsitile::app::{StitchConfig, Stitcher};
//!
//! let stitcher = Stitcher::gsi(StitchConfig::default())?;
//! let report = stitcher.run(&bbox, Path::new("out.jpg"), |done, total| {
//!     eprintln!("downloading map tile: {} / {}", done, total);
//! })?;
//! ```

mod config;
mod error;
mod stitch;

pub use config::{StitchConfig, DEFAULT_ZOOM};
pub use error::AppError;
pub use stitch::{StitchReport, Stitcher};
