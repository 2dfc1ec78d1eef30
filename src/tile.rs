//! Web Mercator tile math and region filtering
//!
//! Tiles are addressed slippy-map style by `(x, y, zoom)` with `y` growing
//! southwards. Overlay tiles outside the region of interest are skipped
//! before any fetch is attempted.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ScoreError};

/// Latitude limit of the square Mercator projection
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Deepest zoom accepted; keeps `2^zoom` exact in `u32`
pub const MAX_ZOOM: u8 = 31;

/// Geographic bounding box in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl TileBounds {
    /// Validated box; `north >= south` and `east >= west`
    ///
    /// # Errors
    ///
    /// * `ScoreError::InvalidCoordinate` - edges out of range, not finite, or inverted
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Result<Self> {
        for (name, value, limit) in [
            ("north", north, 90.0),
            ("south", south, 90.0),
            ("east", east, 180.0),
            ("west", west, 180.0),
        ] {
            if !value.is_finite() || value.abs() > limit {
                return Err(ScoreError::InvalidCoordinate(format!(
                    "{name} edge {value} outside ±{limit}"
                )));
            }
        }
        if north < south || east < west {
            return Err(ScoreError::InvalidCoordinate(format!(
                "inverted bounds N{north} S{south} E{east} W{west}"
            )));
        }
        Ok(Self {
            north,
            south,
            east,
            west,
        })
    }

    /// Axis-aligned overlap, touching edges count as overlapping
    #[must_use]
    pub fn intersects(&self, other: &TileBounds) -> bool {
        self.west <= other.east
            && self.east >= other.west
            && self.south <= other.north
            && self.north >= other.south
    }

    #[must_use]
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        (self.south..=self.north).contains(&lat) && (self.west..=self.east).contains(&lng)
    }
}

/// Free-function form of [`TileBounds::intersects`]
#[must_use]
pub fn intersects(tile_bounds: &TileBounds, region_bounds: &TileBounds) -> bool {
    tile_bounds.intersects(region_bounds)
}

/// Tile address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl TileCoord {
    /// # Errors
    ///
    /// * `ScoreError::InvalidTile` - zoom above 31 or `x`/`y` outside `0..2^zoom`
    pub fn new(x: u32, y: u32, zoom: u8) -> Result<Self> {
        if zoom > MAX_ZOOM {
            return Err(ScoreError::invalid_tile(x, y, zoom));
        }
        let n = 1_u64 << zoom;
        if u64::from(x) >= n || u64::from(y) >= n {
            return Err(ScoreError::invalid_tile(x, y, zoom));
        }
        Ok(Self { x, y, zoom })
    }

    #[must_use]
    pub fn bounds(&self) -> TileBounds {
        let n = tiles_per_side(self.zoom);
        let x = f64::from(self.x);
        let y = f64::from(self.y);
        TileBounds {
            north: latitude_at(y, n),
            south: latitude_at(y + 1.0, n),
            east: longitude_at(x + 1.0, n),
            west: longitude_at(x, n),
        }
    }
}

fn tiles_per_side(zoom: u8) -> f64 {
    2_f64.powi(i32::from(zoom))
}

fn latitude_at(y: f64, n: f64) -> f64 {
    (PI * (1.0 - 2.0 * y / n)).sinh().atan().to_degrees()
}

fn longitude_at(x: f64, n: f64) -> f64 {
    x / n * 360.0 - 180.0
}

/// Bounds of tile `(x, y)` at `zoom`
///
/// # Example
///
/// ```rust
/// use exposure_engine::tile::tile_to_lat_lng_bounds;
///
/// let world = tile_to_lat_lng_bounds(0, 0, 0).unwrap();
/// assert!((world.north - 85.0511).abs() < 1e-4);
/// assert_eq!(world.west, -180.0);
/// ```
///
/// # Errors
///
/// * `ScoreError::InvalidTile` - coordinate outside the grid for `zoom`
pub fn tile_to_lat_lng_bounds(x: u32, y: u32, zoom: u8) -> Result<TileBounds> {
    Ok(TileCoord::new(x, y, zoom)?.bounds())
}

/// Tile containing a point; latitude is clamped to the projection limit
///
/// # Errors
///
/// * `ScoreError::InvalidCoordinate` - latitude/longitude not finite or out of range
/// * `ScoreError::InvalidTile` - zoom above 31
pub fn lat_lng_to_tile(lat: f64, lng: f64, zoom: u8) -> Result<TileCoord> {
    if !lat.is_finite() || lat.abs() > 90.0 {
        return Err(ScoreError::InvalidCoordinate(format!("latitude {lat}")));
    }
    if !lng.is_finite() || lng.abs() > 180.0 {
        return Err(ScoreError::InvalidCoordinate(format!("longitude {lng}")));
    }
    if zoom > MAX_ZOOM {
        return Err(ScoreError::invalid_tile(0, 0, zoom));
    }

    let n = tiles_per_side(zoom);
    let max_index = n - 1.0;
    let lat_rad = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();

    let x = ((lng + 180.0) / 360.0 * n).floor().clamp(0.0, max_index);
    let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n)
        .floor()
        .clamp(0.0, max_index);

    // both values are integral and within 0..2^31
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (x, y) = (x as u32, y as u32);
    TileCoord::new(x, y, zoom)
}

/// Outcome of the overlay pre-filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TileDecision {
    /// Tile overlaps the region and should be fetched
    Fetch(TileBounds),
    /// Serve a transparent tile without a network call
    Skip,
}

/// Pre-filter for overlay tiles against a fixed region of interest
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileFilter {
    pub region: TileBounds,
}

impl TileFilter {
    #[must_use]
    pub fn new(region: TileBounds) -> Self {
        Self { region }
    }

    /// # Errors
    ///
    /// * `ScoreError::InvalidTile` - coordinate outside the grid for `zoom`
    pub fn decide(&self, x: u32, y: u32, zoom: u8) -> Result<TileDecision> {
        let bounds = tile_to_lat_lng_bounds(x, y, zoom)?;
        if bounds.intersects(&self.region) {
            Ok(TileDecision::Fetch(bounds))
        } else {
            debug!(x, y, zoom, "tile outside region, skipping fetch");
            Ok(TileDecision::Skip)
        }
    }

    /// Every tile at `zoom` whose bounds touch the region, row-major
    ///
    /// # Errors
    ///
    /// * `ScoreError::InvalidTile` - zoom above 31
    pub fn tiles_in_region(&self, zoom: u8) -> Result<Vec<TileCoord>> {
        let north_west = lat_lng_to_tile(self.region.north, self.region.west, zoom)?;
        let south_east = lat_lng_to_tile(self.region.south, self.region.east, zoom)?;

        // a neighbour that only shares an edge with the region still intersects it
        let last = u32::try_from((1_u64 << zoom) - 1).unwrap_or(u32::MAX);
        let (x_min, y_min) = (north_west.x.saturating_sub(1), north_west.y.saturating_sub(1));
        let x_max = south_east.x.saturating_add(1).min(last);
        let y_max = south_east.y.saturating_add(1).min(last);

        let mut tiles = Vec::new();
        for y in y_min..=y_max {
            for x in x_min..=x_max {
                let tile = TileCoord::new(x, y, zoom)?;
                if tile.bounds().intersects(&self.region) {
                    tiles.push(tile);
                }
            }
        }
        Ok(tiles)
    }
}
