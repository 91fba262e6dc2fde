//! Core data types for the map display

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Coordinate in the display projection (map units)
pub type MapPoint = Point2<f64>;

/// Geographic coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub lon: f64,
    pub lat: f64,
}

impl GeoCoordinate {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Lon/lat as a point, the axis order used by EPSG:4326 transforms
    pub fn to_point(&self) -> MapPoint {
        Point2::new(self.lon, self.lat)
    }

    pub fn from_point(point: &MapPoint) -> Self {
        Self {
            lon: point.x,
            lat: point.y,
        }
    }
}

/// Single position and heading sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    /// Latitude (degrees)
    pub lat: f64,
    /// Longitude (degrees)
    pub lon: f64,
    /// Heading, clockwise from true north (degrees, [0, 360))
    pub heading: f64,
    /// Counter value that produced this fix
    pub sequence: u64,
    /// Clock time at emission (milliseconds)
    pub timestamp_ms: u64,
}

impl Fix {
    pub fn coordinate(&self) -> GeoCoordinate {
        GeoCoordinate::new(self.lon, self.lat)
    }

    pub fn heading_rad(&self) -> f64 {
        self.heading.to_radians()
    }
}

/// Vehicle marker state owned by the map presentation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MarkerState {
    /// Projected position, `None` until the first fix arrives
    pub position: Option<MapPoint>,
    pub heading_rad: f64,
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn centered(center: &MapPoint, half_width: f64, half_height: f64) -> Self {
        Self::new(
            center.x - half_width,
            center.y - half_height,
            center.x + half_width,
            center.y + half_height,
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn contains(&self, point: &MapPoint) -> bool {
        point.x >= self.min_x && point.x <= self.max_x && point.y >= self.min_y && point.y <= self.max_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fix_heading_radians() {
        let fix = Fix {
            lat: 43.0,
            lon: 5.0,
            heading: 180.0,
            sequence: 1800,
            timestamp_ms: 0,
        };
        assert_relative_eq!(fix.heading_rad(), std::f64::consts::PI);
        assert_eq!(fix.coordinate(), GeoCoordinate::new(5.0, 43.0));
    }

    #[test]
    fn test_extent_geometry() {
        let extent = Extent::centered(&Point2::new(10.0, -5.0), 4.0, 2.0);
        assert_relative_eq!(extent.width(), 8.0);
        assert_relative_eq!(extent.height(), 4.0);
        assert!(extent.contains(&Point2::new(13.0, -4.0)));
        assert!(!extent.contains(&Point2::new(15.0, -4.0)));
    }
}
