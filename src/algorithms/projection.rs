//! Coordinate reference systems and point transforms
//!
//! Only the two systems the map needs are supported: WGS84 geographic
//! coordinates (EPSG:4326, lon/lat degrees) and spherical web mercator
//! (EPSG:3857, meters). Resolutions follow the usual slippy-map tile
//! pyramid: the whole projection extent fits one 256 px tile at zoom 0.

use crate::core::{MapPoint, EARTH_RADIUS_WGS84, MAX_MERCATOR_LAT_DEG, TILE_SIZE_PX};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Half the width of the web mercator world (meters)
pub const MERCATOR_HALF_WORLD: f64 = PI * EARTH_RADIUS_WGS84;

/// Supported coordinate reference systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crs {
    /// WGS84 geographic coordinates
    #[serde(rename = "EPSG:4326")]
    Wgs84,
    /// Spherical web mercator
    #[serde(rename = "EPSG:3857")]
    WebMercator,
}

impl Crs {
    pub fn code(&self) -> &'static str {
        match self {
            Crs::Wgs84 => "EPSG:4326",
            Crs::WebMercator => "EPSG:3857",
        }
    }

    /// Meters represented by one map unit at the equator
    pub fn meters_per_unit(&self) -> f64 {
        match self {
            Crs::Wgs84 => 2.0 * PI * EARTH_RADIUS_WGS84 / 360.0,
            Crs::WebMercator => 1.0,
        }
    }

    /// Width of the projection's valid extent in map units
    pub fn world_width(&self) -> f64 {
        match self {
            Crs::Wgs84 => 360.0,
            Crs::WebMercator => 2.0 * MERCATOR_HALF_WORLD,
        }
    }

    /// Resolution (map units per pixel) at zoom 0
    pub fn max_resolution(&self) -> f64 {
        self.world_width() / TILE_SIZE_PX as f64
    }

    /// Resolution (map units per pixel) at a fractional zoom level
    pub fn resolution_for_zoom(&self, zoom: f64) -> f64 {
        self.max_resolution() / 2f64.powf(zoom)
    }

    /// Zoom level that yields the given resolution
    pub fn zoom_for_resolution(&self, resolution: f64) -> f64 {
        (self.max_resolution() / resolution).log2()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Crs {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "EPSG:4326" | "WGS84" => Ok(Crs::Wgs84),
            "EPSG:3857" | "EPSG:900913" => Ok(Crs::WebMercator),
            other => Err(format!("Unsupported projection '{}'", other)),
        }
    }
}

/// Transform a point between reference systems
///
/// Geographic points use lon/lat axis order. Latitudes beyond the mercator
/// limit are clamped when projecting, so the transform is total.
pub fn transform(point: MapPoint, source: Crs, target: Crs) -> MapPoint {
    match (source, target) {
        (Crs::Wgs84, Crs::WebMercator) => geographic_to_mercator(point.x, point.y),
        (Crs::WebMercator, Crs::Wgs84) => mercator_to_geographic(&point),
        _ => point,
    }
}

fn geographic_to_mercator(lon: f64, lat: f64) -> MapPoint {
    let lat = lat.clamp(-MAX_MERCATOR_LAT_DEG, MAX_MERCATOR_LAT_DEG);
    let x = EARTH_RADIUS_WGS84 * lon.to_radians();
    let y = EARTH_RADIUS_WGS84 * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
    Point2::new(x, y)
}

fn mercator_to_geographic(point: &MapPoint) -> MapPoint {
    let lon = (point.x / EARTH_RADIUS_WGS84).to_degrees();
    let lat = (2.0 * (point.y / EARTH_RADIUS_WGS84).exp().atan() - PI / 2.0).to_degrees();
    Point2::new(lon, lat)
}

/// Great-circle distance between two lon/lat points (meters)
pub fn haversine_distance(a: &MapPoint, b: &MapPoint, radius: f64) -> f64 {
    let lat1 = a.y.to_radians();
    let lat2 = b.y.to_radians();
    let d_lat = lat2 - lat1;
    let d_lon = (b.x - a.x).to_radians();
    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * radius * h.sqrt().min(1.0).asin()
}
