//! Spherical Web Mercator, the projection used by slippy-map tile servers.
//!
//! World pixel space at zoom `z` is a square of `TILE_SIZE * 2^z` pixels with
//! the origin at the north-west corner (lat 85.05, lon -180).

pub const TILE_SIZE: f64 = 256.0;

/// Latitude limit where the Mercator square ends.
pub const MAX_LATITUDE: f64 = 85.051_128_78;

/// Side length of the world in pixels at `zoom`.
pub fn world_size(zoom: u8) -> f64 {
    TILE_SIZE * f64::from(1u32 << zoom.min(30))
}

/// Convert latitude/longitude to world pixel coordinates at `zoom`.
pub fn project(latitude: f64, longitude: f64, zoom: u8) -> (f64, f64) {
    let size = world_size(zoom);
    let lat = latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    let x = (longitude + 180.0) / 360.0 * size;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / std::f64::consts::PI) / 2.0 * size;
    (x, y)
}

/// Convert world pixel coordinates at `zoom` back to `[latitude, longitude]`.
pub fn unproject(x: f64, y: f64, zoom: u8) -> [f64; 2] {
    let size = world_size(zoom);
    let longitude = x / size * 360.0 - 180.0;
    let n = std::f64::consts::PI * (1.0 - 2.0 * y / size);
    let latitude = n.sinh().atan().to_degrees();
    [latitude, longitude]
}

/// A tile to draw, with its offset from the viewport's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilePlacement {
    pub z: u8,
    pub x: u32,
    pub y: u32,
    pub left: f64,
    pub top: f64,
}

/// World pixel coordinates of the viewport's top-left corner.
pub fn viewport_origin(center: [f64; 2], zoom: u8, width: f64, height: f64) -> (f64, f64) {
    let (cx, cy) = project(center[0], center[1], zoom);
    (cx - width / 2.0, cy - height / 2.0)
}

/// Tiles covering a `width` x `height` viewport centered on `center`.
///
/// Columns wrap around the antimeridian; rows outside the world are skipped.
pub fn visible_tiles(center: [f64; 2], zoom: u8, width: f64, height: f64) -> Vec<TilePlacement> {
    let (origin_x, origin_y) = viewport_origin(center, zoom, width, height);
    let tiles_per_side = 1i64 << zoom.min(30);

    let first_col = (origin_x / TILE_SIZE).floor() as i64;
    let last_col = ((origin_x + width) / TILE_SIZE).floor() as i64;
    let first_row = ((origin_y / TILE_SIZE).floor() as i64).max(0);
    let last_row = (((origin_y + height) / TILE_SIZE).floor() as i64).min(tiles_per_side - 1);

    let mut tiles = Vec::new();
    for row in first_row..=last_row {
        for col in first_col..=last_col {
            tiles.push(TilePlacement {
                z: zoom,
                x: col.rem_euclid(tiles_per_side) as u32,
                y: row as u32,
                left: col as f64 * TILE_SIZE - origin_x,
                top: row as f64 * TILE_SIZE - origin_y,
            });
        }
    }
    tiles
}
