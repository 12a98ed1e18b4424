//! gsitile - GSI map tile stitching
//!
//! This library downloads the tiles of the Geospatial Information Authority
//! of Japan (GSI) tile pyramid that cover a latitude/longitude bounding box
//! and stitches them into one image, cropped to the requested corners.
//!
//! # Modules
//!
//! - [`coord`]: angles, projection to pixel/tile space, ground sample distance
//! - [`tile`]: tile indices and the covering tile rectangle of a request
//! - [`provider`]: HTTP transport and the GSI tile server
//! - [`staging`]: on-disk staging of fetched tiles
//! - [`orchestrator`]: bounded parallel fetching with per-tile retries
//! - [`compose`]: decoding, merging, cropping and saving
//! - [`config`]: the `~/.gsitile/config.ini` file
//! - [`app`]: the end-to-end stitch pipeline
//! - [`logging`]: tracing setup for the command-line tool

pub mod app;
pub mod compose;
pub mod config;
pub mod coord;
pub mod logging;
pub mod orchestrator;
pub mod provider;
pub mod staging;
pub mod tile;

/// Version of the library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
