//! Graticule (latitude/longitude grid) overlay
//!
//! The line spacing adapts to the map resolution: intervals are tried from
//! coarsest to finest and the finest one whose ground span still exceeds
//! `target_size_px` pixels is kept. Labels use hemisphere/degree/minute/second
//! notation.

use crate::algorithms::projection::{haversine_distance, transform, Crs};
use crate::core::{Extent, GeoCoordinate, EARTH_MEAN_RADIUS, MAX_MERCATOR_LAT_DEG};
use crate::utils::config::GraticuleConfig;
use crate::validation::MapError;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Stroke and label settings of the grid lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraticuleStyle {
    pub stroke_color: String,
    pub stroke_width: f64,
    pub line_dash: Vec<f64>,
    pub show_labels: bool,
    pub wrap_x: bool,
}

/// One meridian or parallel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraticuleLine {
    /// Longitude of a meridian or latitude of a parallel (degrees)
    pub value_deg: f64,
    /// Endpoints in map units
    pub start: [f64; 2],
    pub end: [f64; 2],
    pub label: Option<String>,
}

/// Lines generated for one view extent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraticuleLines {
    pub interval_deg: Option<f64>,
    pub meridians: Vec<GraticuleLine>,
    pub parallels: Vec<GraticuleLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Graticule {
    style: GraticuleStyle,
    intervals: Vec<f64>,
    target_size_px: f64,
    max_lines: usize,
}

impl Graticule {
    pub fn new(config: &GraticuleConfig) -> Result<Self, MapError> {
        if config.intervals_deg.is_empty() {
            return Err(MapError::InvalidGraticule {
                reason: "no intervals configured".to_string(),
            });
        }
        if config.intervals_deg.iter().any(|i| !i.is_finite() || *i <= 0.0) {
            return Err(MapError::InvalidGraticule {
                reason: "intervals must be positive".to_string(),
            });
        }
        if config.intervals_deg.windows(2).any(|w| w[1] >= w[0]) {
            return Err(MapError::InvalidGraticule {
                reason: "intervals must go from coarsest to finest".to_string(),
            });
        }
        if config.target_size_px <= 0.0 || config.max_lines == 0 {
            return Err(MapError::InvalidGraticule {
                reason: format!(
                    "target size {} px / max lines {} out of range",
                    config.target_size_px, config.max_lines
                ),
            });
        }

        Ok(Self {
            style: config.style.clone(),
            intervals: config.intervals_deg.clone(),
            target_size_px: config.target_size_px,
            max_lines: config.max_lines,
        })
    }

    pub fn style(&self) -> &GraticuleStyle {
        &self.style
    }

    pub fn intervals(&self) -> &[f64] {
        &self.intervals
    }

    /// Pick the line spacing for a view centered on `center`
    ///
    /// Returns `None` when even the coarsest interval is narrower than the
    /// target spacing, in which case no grid is drawn.
    pub fn select_interval(&self, center: &GeoCoordinate, resolution_m: f64) -> Option<f64> {
        let target = self.target_size_px * resolution_m;
        let mut selected = None;
        for &interval in &self.intervals {
            let delta = (interval / 2.0).clamp(0.0, 90.0);
            let south = Point2::new(center.lon, (center.lat - delta).clamp(-90.0, 90.0));
            let north = Point2::new(center.lon, (center.lat + delta).clamp(-90.0, 90.0));
            if haversine_distance(&south, &north, EARTH_MEAN_RADIUS) <= target {
                break;
            }
            selected = Some(interval);
        }
        selected
    }

    /// Generate meridians and parallels covering `extent`
    pub fn lines(&self, extent: &Extent, crs: Crs, resolution: f64) -> GraticuleLines {
        let lat_limit = match crs {
            Crs::WebMercator => MAX_MERCATOR_LAT_DEG,
            Crs::Wgs84 => 90.0,
        };
        let sw = transform(Point2::new(extent.min_x, extent.min_y), crs, Crs::Wgs84);
        let ne = transform(Point2::new(extent.max_x, extent.max_y), crs, Crs::Wgs84);
        let min_lon = sw.x.clamp(-180.0, 180.0);
        let max_lon = ne.x.clamp(-180.0, 180.0);
        let min_lat = sw.y.clamp(-lat_limit, lat_limit);
        let max_lat = ne.y.clamp(-lat_limit, lat_limit);

        let center = GeoCoordinate::new((min_lon + max_lon) / 2.0, (min_lat + max_lat) / 2.0);
        let interval = match self.select_interval(&center, resolution * crs.meters_per_unit()) {
            Some(interval) => interval,
            None => return GraticuleLines::default(),
        };

        let meridians = grid_values(min_lon, max_lon, interval, self.max_lines)
            .map(|lon| {
                let start = transform(Point2::new(lon, min_lat), Crs::Wgs84, crs);
                let end = transform(Point2::new(lon, max_lat), Crs::Wgs84, crs);
                GraticuleLine {
                    value_deg: lon,
                    start: [start.x, start.y],
                    end: [end.x, end.y],
                    label: self.label(lon, "EW"),
                }
            })
            .collect();

        let parallels = grid_values(min_lat, max_lat, interval, self.max_lines)
            .map(|lat| {
                let start = transform(Point2::new(min_lon, lat), Crs::Wgs84, crs);
                let end = transform(Point2::new(max_lon, lat), Crs::Wgs84, crs);
                GraticuleLine {
                    value_deg: lat,
                    start: [start.x, start.y],
                    end: [end.x, end.y],
                    label: self.label(lat, "NS"),
                }
            })
            .collect();

        GraticuleLines {
            interval_deg: Some(interval),
            meridians,
            parallels,
        }
    }

    fn label(&self, value: f64, hemispheres: &str) -> Option<String> {
        if self.style.show_labels {
            Some(format_hdms(value, hemispheres, 0))
        } else {
            None
        }
    }
}

/// Multiples of `interval` within [min, max], at most `max_lines` of them
fn grid_values(min: f64, max: f64, interval: f64, max_lines: usize) -> impl Iterator<Item = f64> {
    let first = (min / interval).ceil() as i64;
    let last = (max / interval).floor() as i64;
    (first..=last).take(max_lines).map(move |k| k as f64 * interval)
}

/// Format an angle as `DD° MM′ SS″ H`
///
/// `hemispheres` holds the positive then negative hemisphere letters, e.g.
/// `"NS"` or `"EW"`. Zero carries no hemisphere letter.
pub fn format_hdms(degrees: f64, hemispheres: &str, fraction_digits: usize) -> String {
    let normalized = (degrees + 180.0).rem_euclid(360.0) - 180.0;
    let total_seconds = (3600.0 * normalized).abs();
    let factor = 10f64.powi(fraction_digits as i32);

    let mut deg = (total_seconds / 3600.0).floor();
    let mut min = ((total_seconds - deg * 3600.0) / 60.0).floor();
    let mut sec = ((total_seconds - deg * 3600.0 - min * 60.0) * factor).round() / factor;

    if sec >= 60.0 {
        sec = 0.0;
        min += 1.0;
    }
    if min >= 60.0 {
        min = 0.0;
        deg += 1.0;
    }

    let sec_width = if fraction_digits > 0 { 3 + fraction_digits } else { 2 };
    let hemisphere = if normalized == 0.0 {
        String::new()
    } else {
        let index = if normalized < 0.0 { 1 } else { 0 };
        hemispheres
            .chars()
            .nth(index)
            .map(|c| format!(" {}", c))
            .unwrap_or_default()
    };

    format!(
        "{}\u{00b0} {:02}\u{2032} {:0width$.prec$}\u{2033}{}",
        deg as i64,
        min as i64,
        sec,
        hemisphere,
        width = sec_width,
        prec = fraction_digits
    )
}
