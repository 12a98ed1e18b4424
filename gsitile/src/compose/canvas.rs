//! Canvas assembly and cropping.

use std::collections::HashMap;

use image::{imageops, RgbImage};
use tracing::debug;

use super::ComposeError;
use crate::coord::TILE_SIZE;
use crate::tile::{BoundingTileRect, CropWindow, TileIndex};

/// Decodes one encoded tile (PNG or JPEG) into RGB.
pub fn decode_tile(data: &[u8]) -> Result<RgbImage, ComposeError> {
    let img = image::load_from_memory(data)?;
    Ok(img.to_rgb8())
}

/// Pastes every tile of `rect` into a single canvas.
///
/// Each tile lands at `((x - min_x) * 256, (y - min_y) * 256)` and overwrites
/// whatever was there. Tiles in `tiles` outside the rectangle are ignored.
///
/// # Errors
///
/// - `MissingTile` if a tile of the rectangle is absent from `tiles`
/// - `TileSize` if a tile is not 256×256 pixels
pub fn merge(
    tiles: &HashMap<TileIndex, RgbImage>,
    rect: &BoundingTileRect,
) -> Result<RgbImage, ComposeError> {
    let (width, height) = rect.pixel_size();
    let mut canvas = RgbImage::new(width, height);

    for index in rect.tiles() {
        let tile = tiles.get(&index).ok_or(ComposeError::MissingTile(index))?;
        if tile.dimensions() != (TILE_SIZE, TILE_SIZE) {
            return Err(ComposeError::TileSize {
                index,
                width: tile.width(),
                height: tile.height(),
            });
        }
        let (x, y) = rect.canvas_offset(&index);
        imageops::replace(&mut canvas, tile, i64::from(x), i64::from(y));
    }

    let ignored = tiles.keys().filter(|index| !rect.contains(index)).count();
    debug!(
        width,
        height,
        tiles = rect.tile_count(),
        ignored,
        "Canvas merged"
    );
    Ok(canvas)
}

/// Crops a merged canvas to the requested extent of `rect`.
pub fn crop(canvas: &RgbImage, rect: &BoundingTileRect) -> Result<RgbImage, ComposeError> {
    crop_to(canvas, rect.crop_window())
}

/// Copies `window` out of `image`.
///
/// # Errors
///
/// - `EmptyCrop` if the window has zero width or height
/// - `WindowOutOfBounds` if the window reaches past the image
pub fn crop_to(image: &RgbImage, window: CropWindow) -> Result<RgbImage, ComposeError> {
    if window.is_empty() {
        return Err(ComposeError::EmptyCrop(window));
    }
    if window.right > image.width() || window.bottom > image.height() {
        return Err(ComposeError::WindowOutOfBounds {
            window,
            width: image.width(),
            height: image.height(),
        });
    }

    let cropped = imageops::crop_imm(
        image,
        window.left,
        window.top,
        window.width(),
        window.height(),
    )
    .to_image();
    Ok(cropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::AxisBound;
    use image::Rgb;

    fn bound(tile: u32, remainder: u32) -> AxisBound {
        AxisBound { tile, remainder }
    }

    fn rect_2x2() -> BoundingTileRect {
        BoundingTileRect {
            min_x: bound(10, 100),
            max_x: bound(11, 50),
            min_y: bound(20, 10),
            max_y: bound(21, 200),
        }
    }

    fn solid(color: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(256, 256, Rgb(color))
    }

    /// Colour that identifies a tile by its position.
    fn tile_color(index: TileIndex) -> [u8; 3] {
        [(index.x * 40) as u8, (index.y * 40) as u8, 128]
    }

    fn tile_id(index: TileIndex) -> u8 {
        (index.x * 16 + index.y) as u8
    }

    fn tiles_for(rect: &BoundingTileRect) -> HashMap<TileIndex, RgbImage> {
        rect.tiles()
            .map(|index| (index, solid(tile_color(index))))
            .collect()
    }

    fn encode_png(img: &RgbImage) -> Vec<u8> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        img.write_to(&mut cursor, image::ImageFormat::Png).unwrap();
        buffer
    }

    #[test]
    fn test_decode_tile_png() {
        let bytes = encode_png(&solid([1, 2, 3]));
        let decoded = decode_tile(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (256, 256));
        assert_eq!(*decoded.get_pixel(17, 200), Rgb([1, 2, 3]));
    }

    #[test]
    fn test_decode_tile_rejects_garbage() {
        let result = decode_tile(b"<html>503 Service Unavailable</html>");
        assert!(matches!(result, Err(ComposeError::Decode(_))));
    }

    #[test]
    fn test_merge_places_tiles_at_offsets() {
        let rect = rect_2x2();
        // Each pixel records its tile and its in-tile position
        let tiles: HashMap<TileIndex, RgbImage> = rect
            .tiles()
            .map(|index| {
                let id = tile_id(index);
                let tile = RgbImage::from_fn(256, 256, |px, py| Rgb([id, px as u8, py as u8]));
                (index, tile)
            })
            .collect();

        let canvas = merge(&tiles, &rect).unwrap();

        assert_eq!(canvas.dimensions(), (512, 512));
        for index in rect.tiles() {
            let (x, y) = rect.canvas_offset(&index);
            let id = tile_id(index);
            for k in 0..256 {
                let expected = Rgb([id, k as u8, k as u8]);
                assert_eq!(*canvas.get_pixel(x + k, y + k), expected, "tile {} k {}", index, k);
                assert_eq!(
                    *canvas.get_pixel(x + k, y + 255 - k),
                    Rgb([id, k as u8, (255 - k) as u8]),
                    "tile {} k {}",
                    index,
                    k
                );
            }
        }
    }

    #[test]
    fn test_merge_ignores_tiles_outside_rect() {
        let rect = rect_2x2();
        let mut tiles = tiles_for(&rect);
        tiles.insert(TileIndex::new(12, 20), solid([255, 255, 255]));
        tiles.insert(TileIndex::new(9, 21), solid([255, 255, 255]));

        let canvas = merge(&tiles, &rect).unwrap();

        assert_eq!(canvas, merge(&tiles_for(&rect), &rect).unwrap());
    }

    #[test]
    fn test_merge_single_tile_is_identity() {
        let rect = BoundingTileRect {
            min_x: bound(5, 0),
            max_x: bound(5, 256),
            min_y: bound(7, 0),
            max_y: bound(7, 256),
        };
        let tile = RgbImage::from_fn(256, 256, |x, y| Rgb([x as u8, y as u8, 0]));
        let tiles = HashMap::from([(TileIndex::new(5, 7), tile.clone())]);

        let canvas = merge(&tiles, &rect).unwrap();
        assert_eq!(canvas, tile);
    }

    #[test]
    fn test_merge_missing_tile() {
        let rect = rect_2x2();
        let mut tiles = tiles_for(&rect);
        tiles.remove(&TileIndex::new(11, 20));

        let result = merge(&tiles, &rect);
        assert!(matches!(
            result,
            Err(ComposeError::MissingTile(index)) if index == TileIndex::new(11, 20)
        ));
    }

    #[test]
    fn test_merge_wrong_tile_size() {
        let rect = rect_2x2();
        let mut tiles = tiles_for(&rect);
        tiles.insert(TileIndex::new(10, 21), RgbImage::new(512, 512));

        let result = merge(&tiles, &rect);
        assert!(matches!(
            result,
            Err(ComposeError::TileSize {
                width: 512,
                height: 512,
                ..
            })
        ));
    }

    #[test]
    fn test_crop_uses_remainders() {
        let rect = rect_2x2();
        let canvas = merge(&tiles_for(&rect), &rect).unwrap();

        let cropped = crop(&canvas, &rect).unwrap();

        // right = 256 + 50, bottom = 256 + 200
        assert_eq!(cropped.dimensions(), (306 - 100, 456 - 10));
        assert_eq!(
            *cropped.get_pixel(0, 0),
            Rgb(tile_color(TileIndex::new(10, 20)))
        );
        let (w, h) = cropped.dimensions();
        assert_eq!(
            *cropped.get_pixel(w - 1, h - 1),
            Rgb(tile_color(TileIndex::new(11, 21)))
        );
    }

    #[test]
    fn test_crop_full_window_is_identity() {
        let image = RgbImage::from_fn(300, 200, |x, y| Rgb([x as u8, y as u8, 7]));
        let cropped = crop_to(&image, CropWindow::full(300, 200)).unwrap();
        assert_eq!(cropped, image);
    }

    #[test]
    fn test_crop_is_idempotent_with_full_window() {
        let rect = rect_2x2();
        let canvas = merge(&tiles_for(&rect), &rect).unwrap();

        let once = crop(&canvas, &rect).unwrap();
        let twice = crop_to(&once, CropWindow::full(once.width(), once.height())).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_crop_empty_window() {
        let image = RgbImage::new(256, 256);
        let window = CropWindow {
            left: 40,
            top: 0,
            right: 40,
            bottom: 256,
        };
        assert!(matches!(
            crop_to(&image, window),
            Err(ComposeError::EmptyCrop(_))
        ));
    }

    #[test]
    fn test_crop_window_out_of_bounds() {
        let image = RgbImage::new(256, 256);
        let window = CropWindow {
            left: 0,
            top: 0,
            right: 257,
            bottom: 10,
        };
        assert!(matches!(
            crop_to(&image, window),
            Err(ComposeError::WindowOutOfBounds {
                width: 256,
                height: 256,
                ..
            })
        ));
    }
}
