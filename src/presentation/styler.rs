//! Vehicle and north-indicator icon styling
//!
//! Zoomed out, the vehicle keeps a fixed on-screen size so it stays
//! visible. Zoomed in past the resolution limit it is drawn at its true
//! length. The north indicator never rotates and keeps a fixed multiple of
//! the vehicle's base footprint.

use crate::algorithms::projection::Crs;
use crate::presentation::icons::{IconMetrics, LoadedIcons};
use crate::utils::config::MarkerConfig;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IconRole {
    Vehicle,
    NorthIndicator,
}

/// Render style of one icon
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IconStyle {
    pub role: IconRole,
    pub src: String,
    pub scale: f64,
    /// Clockwise rotation (radians)
    pub rotation: f64,
    pub z_index: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerStyler {
    config: MarkerConfig,
    meters_per_unit: f64,
    vehicle: Option<IconMetrics>,
    north_indicator: Option<IconMetrics>,
}

impl MarkerStyler {
    /// Styler for a map in `projection`; metrics arrive later
    pub fn new(config: &MarkerConfig, projection: Crs) -> Self {
        Self {
            config: config.clone(),
            meters_per_unit: projection.meters_per_unit(),
            vehicle: None,
            north_indicator: None,
        }
    }

    pub fn set_metrics(&mut self, icons: LoadedIcons) {
        self.vehicle = usable(icons.vehicle);
        self.north_indicator = usable(icons.north_indicator);
    }

    pub fn has_metrics(&self) -> bool {
        self.vehicle.is_some()
    }

    /// Resolution (meters per pixel) at which the vehicle icon at base
    /// scale is drawn at true size
    pub fn image_resolution(&self) -> Option<f64> {
        self.vehicle
            .map(|m| self.config.vehicle_length_m / m.height as f64 / self.config.base_scale)
    }

    /// Vehicle icon scale at `resolution` (map units per pixel)
    pub fn vehicle_scale(&self, resolution: f64) -> f64 {
        let base = self.config.base_scale;
        let resolution_m = resolution * self.meters_per_unit;
        if !resolution_m.is_finite() || resolution_m <= 0.0 {
            return base;
        }
        match self.image_resolution() {
            Some(image_resolution) if resolution_m < self.config.resolution_limit_m_per_px => {
                base * image_resolution / resolution_m
            }
            _ => base,
        }
    }

    /// North indicator scale, independent of resolution and heading
    pub fn north_indicator_scale(&self) -> f64 {
        let base = self.config.base_scale;
        match (self.vehicle, self.north_indicator) {
            (Some(vehicle), Some(indicator)) => {
                let vehicle_px = vehicle.height as f64 * base;
                self.config.north_indicator_factor * vehicle_px / indicator.height as f64
            }
            _ => base,
        }
    }

    /// Styles for one render: vehicle first, then the north indicator
    pub fn compute(&self, resolution: f64, heading_rad: f64) -> [IconStyle; 2] {
        [
            IconStyle {
                role: IconRole::Vehicle,
                src: self.config.vehicle_icon.src.clone(),
                scale: self.vehicle_scale(resolution),
                rotation: heading_rad,
                z_index: self.config.layer_z_index,
            },
            IconStyle {
                role: IconRole::NorthIndicator,
                src: self.config.north_indicator_icon.src.clone(),
                scale: self.north_indicator_scale(),
                rotation: 0.0,
                z_index: self.config.layer_z_index,
            },
        ]
    }
}

fn usable(metrics: IconMetrics) -> Option<IconMetrics> {
    if metrics.is_degenerate() {
        None
    } else {
        Some(metrics)
    }
}
