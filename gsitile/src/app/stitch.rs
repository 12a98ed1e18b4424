//! The stitch pipeline: plan, fetch, merge, crop, save.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbImage;
use rayon::prelude::*;
use tracing::{info, warn};

use super::config::StitchConfig;
use super::error::AppError;
use crate::compose::{crop, decode_tile, merge, save_image, OutputMode};
use crate::coord::{pixel_to_lon_lat, BoundingBox, CoordError, Coordinate};
use crate::orchestrator::{Sleeper, TileFetcher};
use crate::provider::{GsiProvider, Provider, ReqwestClient};
use crate::staging::StagingArea;
use crate::tile::{BoundingTileRect, TileIndex, TilePlan};

/// Summary of a finished stitch.
#[derive(Debug, Clone, PartialEq)]
pub struct StitchReport {
    pub plan: TilePlan,
    pub tiles_fetched: usize,
    /// Failed attempts that were retried.
    pub retries: usize,
    /// Width and height of the produced image.
    pub image_size: (u32, u32),
    /// Geographic extent of the produced image, north-west then south-east.
    pub extent: BoundingBox,
    /// Staging directory, when it was kept.
    pub staged_tiles: Option<PathBuf>,
}

/// Runs stitch requests against one tile provider.
///
/// ```ignore
/// use gsitile::app::{StitchConfig, Stitcher};
/// use gsitile::coord::BoundingBox;
///
/// let stitcher = Stitcher::gsi(StitchConfig::default().with_zoom(18))?;
/// let bbox = BoundingBox::from_angles(36.6394, 36.6593, 138.1777, 138.1994);
/// let report = stitcher.run(&bbox, "out.jpg".as_ref(), |_, _| {})?;
/// println!("{} tiles", report.tiles_fetched);
/// ```
pub struct Stitcher {
    provider: Arc<dyn Provider>,
    config: StitchConfig,
    sleeper: Option<Arc<dyn Sleeper>>,
}

impl Stitcher {
    pub fn new(provider: Arc<dyn Provider>, config: StitchConfig) -> Self {
        Self {
            provider,
            config,
            sleeper: None,
        }
    }

    /// Creates a stitcher that downloads from the GSI tile server named in
    /// `config`.
    pub fn gsi(config: StitchConfig) -> Result<Self, AppError> {
        let client = ReqwestClient::new()?;
        let provider = GsiProvider::with_base_url(client, config.style, config.base_url.as_str());
        Ok(Self::new(Arc::new(provider), config))
    }

    /// Replace the sleeper used for retry backoff.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    pub fn config(&self) -> &StitchConfig {
        &self.config
    }

    /// Resolves the tiles, crop window and ground sample distance of a
    /// request without downloading anything.
    pub fn plan(&self, bbox: &BoundingBox) -> Result<TilePlan, AppError> {
        Ok(TilePlan::new(bbox, self.config.zoom, self.config.gsd_mode)?)
    }

    /// Downloads and assembles the image for `bbox`.
    ///
    /// `progress` receives `(done, total)` after every staged tile. On
    /// success the staging directory is removed unless
    /// `keep_staged_tiles` is set; on failure it is left for inspection.
    ///
    /// A cropped request whose corners share a pixel column or row fails with
    /// `CoordError::DegenerateSpan` before anything is staged or fetched.
    pub fn render<F>(
        &self,
        bbox: &BoundingBox,
        progress: F,
    ) -> Result<(RgbImage, StitchReport), AppError>
    where
        F: Fn(usize, usize) + Sync,
    {
        let plan = self.plan(bbox)?;
        if self.config.output_mode == OutputMode::Cropped {
            let window = plan.rect.crop_window();
            if window.is_empty() {
                let axis = if window.width() == 0 { 'x' } else { 'y' };
                return Err(CoordError::DegenerateSpan { axis }.into());
            }
        }
        if !self.provider.supports_zoom(plan.zoom) {
            return Err(AppError::Config(format!(
                "{} does not serve zoom level {}",
                self.provider.name(),
                plan.zoom
            )));
        }

        info!(
            zoom = plan.zoom,
            columns = plan.rect.columns(),
            rows = plan.rect.rows(),
            tiles = plan.rect.tile_count(),
            "Stitching request"
        );

        let staging = StagingArea::for_run(&self.config.staging_dir)?;
        let mut fetcher = TileFetcher::new(Arc::clone(&self.provider), staging.clone())
            .with_retry_policy(self.config.retry)
            .with_max_parallel(self.config.max_parallel)
            .with_timeout(self.config.timeout);
        if let Some(sleeper) = &self.sleeper {
            fetcher = fetcher.with_sleeper(Arc::clone(sleeper));
        }

        let fetched = fetcher.fetch_all(&plan.rect, plan.zoom, progress)?;

        let tiles = fetched
            .tiles
            .par_iter()
            .map(|staged| -> Result<(TileIndex, RgbImage), AppError> {
                let bytes = staging.read(&staged.path)?;
                let tile = decode_tile(&bytes).map_err(|e| {
                    warn!(tile_x = staged.index.x, tile_y = staged.index.y, error = %e, "Undecodable tile");
                    e
                })?;
                Ok((staged.index, tile))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;

        let canvas = merge(&tiles, &plan.rect)?;
        drop(tiles);

        let image = match self.config.output_mode {
            OutputMode::Cropped => crop(&canvas, &plan.rect)?,
            OutputMode::Merged => canvas,
        };

        let staged_tiles = if self.config.keep_staged_tiles {
            Some(staging.dir().to_path_buf())
        } else {
            staging.remove();
            None
        };

        let report = StitchReport {
            extent: covered_extent(&plan.rect, plan.zoom, self.config.output_mode),
            tiles_fetched: fetched.tiles.len(),
            retries: fetched.retries,
            image_size: image.dimensions(),
            plan,
            staged_tiles,
        };
        Ok((image, report))
    }

    /// Renders `bbox` and writes the image to `output`.
    ///
    /// The output file is only created when every step succeeded.
    pub fn run<F>(
        &self,
        bbox: &BoundingBox,
        output: &Path,
        progress: F,
    ) -> Result<StitchReport, AppError>
    where
        F: Fn(usize, usize) + Sync,
    {
        let (image, report) = self.render(bbox, progress)?;
        save_image(&image, output)?;
        Ok(report)
    }
}

/// Geographic extent covered by the produced image.
fn covered_extent(rect: &BoundingTileRect, zoom: u8, mode: OutputMode) -> BoundingBox {
    let (origin_x, origin_y) = TileIndex::new(rect.min_x.tile, rect.min_y.tile).pixel_origin();
    let (origin_x, origin_y) = (origin_x as f64, origin_y as f64);

    let (left, top, right, bottom) = match mode {
        OutputMode::Cropped => {
            let window = rect.crop_window();
            (window.left, window.top, window.right, window.bottom)
        }
        OutputMode::Merged => {
            let (width, height) = rect.pixel_size();
            (0, 0, width, height)
        }
    };

    let (west, north) = pixel_to_lon_lat(
        origin_x + f64::from(left),
        origin_y + f64::from(top),
        zoom,
    );
    let (east, south) = pixel_to_lon_lat(
        origin_x + f64::from(right),
        origin_y + f64::from(bottom),
        zoom,
    );
    BoundingBox::new(Coordinate::new(north, west), Coordinate::new(south, east))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::GsdMode;
    use crate::provider::{MockHttpClient, ProviderError, TileStyle};
    use image::{ImageFormat, Rgb};
    use tempfile::TempDir;

    fn scenario_bbox() -> BoundingBox {
        BoundingBox::from_angles(
            36.639413033456435,
            36.659306735128496,
            138.1776949697821,
            138.19938069275926,
        )
    }

    struct Unreachable;

    impl Provider for Unreachable {
        fn fetch_tile(&self, _zoom: u8, _x: u32, _y: u32) -> Result<Vec<u8>, ProviderError> {
            panic!("plan must not fetch");
        }
        fn name(&self) -> &str {
            "unreachable"
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

    #[test]
    fn test_plan_does_not_fetch() {
        let stitcher = Stitcher::new(Arc::new(Unreachable), StitchConfig::default().with_zoom(18));

        let plan = stitcher.plan(&scenario_bbox()).unwrap();

        assert_eq!(plan.rect.tile_count(), 323);
        assert!(plan.gsd.is_some());
    }

    #[test]
    fn test_plan_rejects_bad_zoom() {
        let stitcher = Stitcher::new(Arc::new(Unreachable), StitchConfig::default().with_zoom(19));
        assert!(matches!(
            stitcher.plan(&scenario_bbox()),
            Err(AppError::Input(_))
        ));
    }

    #[test]
    fn test_plan_honours_gsd_mode() {
        let compatible = Stitcher::new(Arc::new(Unreachable), StitchConfig::default().with_zoom(18))
            .plan(&scenario_bbox())
            .unwrap();
        let corrected = Stitcher::new(
            Arc::new(Unreachable),
            StitchConfig::default()
                .with_zoom(18)
                .with_gsd_mode(GsdMode::Corrected),
        )
        .plan(&scenario_bbox())
        .unwrap();

        let compatible = compatible.gsd.unwrap();
        let corrected = corrected.gsd.unwrap();
        assert_eq!(compatible.x_meters_per_pixel, corrected.x_meters_per_pixel);
        assert!(corrected.y_meters_per_pixel > compatible.y_meters_per_pixel);
    }

    #[test]
    fn test_cropped_extent_is_inside_merged_extent() {
        let plan = TilePlan::new(&scenario_bbox(), 18, GsdMode::Compatible).unwrap();

        let cropped = covered_extent(&plan.rect, 18, OutputMode::Cropped);
        let merged = covered_extent(&plan.rect, 18, OutputMode::Merged);

        assert!(merged.corner0.lon <= cropped.corner0.lon);
        assert!(merged.corner0.lat >= cropped.corner0.lat);
        assert!(merged.corner1.lon >= cropped.corner1.lon);
        assert!(merged.corner1.lat <= cropped.corner1.lat);
    }

    #[test]
    fn test_cropped_extent_matches_request() {
        let bbox = scenario_bbox();
        let plan = TilePlan::new(&bbox, 18, GsdMode::Compatible).unwrap();

        let extent = covered_extent(&plan.rect, 18, OutputMode::Cropped);

        // Within one pixel (about half a metre) of the requested corners
        let tolerance = 1e-5;
        assert!((extent.corner0.lon - bbox.corner0.lon).abs() < tolerance);
        assert!((extent.corner0.lat - bbox.corner1.lat).abs() < tolerance);
        assert!((extent.corner1.lon - bbox.corner1.lon).abs() < tolerance);
        assert!((extent.corner1.lat - bbox.corner0.lat).abs() < tolerance);
    }

    #[test]
    fn test_single_point_request_fails_before_staging() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("staging");
        let stitcher = Stitcher::new(
            Arc::new(Unreachable),
            StitchConfig::default().with_zoom(10).with_staging_dir(root.clone()),
        );
        let point = BoundingBox::from_angles(35.0, 35.0, 139.0, 139.0);

        let result = stitcher.render(&point, |_, _| {});

        assert!(matches!(
            result,
            Err(AppError::Input(CoordError::DegenerateSpan { axis: 'x' }))
        ));
        assert!(!root.exists());
    }

    #[test]
    fn test_same_row_request_reports_y_axis() {
        let temp = TempDir::new().unwrap();
        let stitcher = Stitcher::new(
            Arc::new(Unreachable),
            StitchConfig::default()
                .with_zoom(10)
                .with_staging_dir(temp.path().join("staging")),
        );
        let row = BoundingBox::from_angles(35.0, 35.0, 139.0, 139.5);

        assert!(matches!(
            stitcher.render(&row, |_, _| {}),
            Err(AppError::Input(CoordError::DegenerateSpan { axis: 'y' }))
        ));
    }

    #[test]
    fn test_east_edge_renders_from_gsi_provider() {
        let temp = TempDir::new().unwrap();
        let mut png = Vec::new();
        RgbImage::from_pixel(256, 256, Rgb([10, 20, 30]))
            .write_to(&mut std::io::Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();
        let provider = GsiProvider::new(MockHttpClient::new(Ok(png)), TileStyle::Std);
        let stitcher = Stitcher::new(
            Arc::new(provider),
            StitchConfig::default()
                .with_zoom(10)
                .with_staging_dir(temp.path().join("staging"))
                .with_max_attempts(1),
        );
        let bbox = BoundingBox::from_angles(35.0, 34.99, 179.99, 180.0);

        let (image, report) = stitcher.render(&bbox, |_, _| {}).unwrap();

        assert_eq!(report.plan.rect.max_x.tile, 1023);
        assert_eq!(report.tiles_fetched, report.plan.rect.tile_count());
        assert_eq!(image.width(), 7);
        assert!((report.extent.corner1.lon - 180.0).abs() < 1e-9);
    }
}
