use crate::algorithms::graticule::GraticuleStyle;
use crate::algorithms::projection::Crs;
use crate::core::*;
use crate::validation::{ConfigError, FixPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Log verbosity, overridden by `RUST_LOG` when set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Map view parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Display projection
    pub projection: Crs,
    /// Projection of incoming fixes and of `center`
    pub source_projection: Crs,
    /// Initial center, in `source_projection`
    pub center: GeoCoordinate,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Viewport size used until a surface is attached (pixels)
    pub viewport_px: (u32, u32),
}

/// Base raster layer parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileConfig {
    pub url_template: String,
    pub wrap_x: bool,
    pub max_zoom: u8,
}

/// Graticule overlay parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraticuleConfig {
    pub style: GraticuleStyle,
    /// Candidate line spacings from coarsest to finest (degrees)
    pub intervals_deg: Vec<f64>,
    /// Desired spacing between lines (pixels)
    pub target_size_px: f64,
    pub max_lines: usize,
}

/// Icon asset reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconConfig {
    /// Path relative to the assets root
    pub src: String,
    /// Declared natural size (width, height); skips reading the asset
    #[serde(default)]
    pub natural_size_px: Option<(u32, u32)>,
}

/// Marker styling parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub base_scale: f64,
    /// Real-world vehicle length (meters)
    pub vehicle_length_m: f64,
    /// Resolution below which the vehicle is drawn at true size (meters per pixel)
    pub resolution_limit_m_per_px: f64,
    /// North indicator size as a multiple of the vehicle footprint at base scale
    pub north_indicator_factor: f64,
    pub layer_z_index: i32,
    pub vehicle_icon: IconConfig,
    pub north_indicator_icon: IconConfig,
}

/// Simulated trajectory parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub origin: GeoCoordinate,
    /// Latitude/longitude increment per fix (degrees)
    pub step_deg: f64,
    /// Heading is `t / heading_divisor` degrees, modulo 360
    pub heading_divisor: f64,
    pub interval_ms: u64,
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub view: ViewConfig,
    pub tiles: TileConfig,
    pub graticule: GraticuleConfig,
    pub marker: MarkerConfig,
    pub source: SourceConfig,
    /// Directory icon paths are resolved against
    pub assets_root: PathBuf,
    pub fix_policy: FixPolicy,
    pub log_level: LogLevel,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            projection: Crs::WebMercator,
            source_projection: Crs::Wgs84,
            center: GeoCoordinate::new(DEFAULT_CENTER_LON_DEG, DEFAULT_CENTER_LAT_DEG),
            zoom: DEFAULT_ZOOM,
            min_zoom: DEFAULT_MIN_ZOOM,
            max_zoom: DEFAULT_MAX_ZOOM,
            viewport_px: DEFAULT_VIEWPORT_PX,
        }
    }
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            url_template: OSM_URL_TEMPLATE.to_string(),
            wrap_x: false,
            max_zoom: OSM_MAX_ZOOM,
        }
    }
}

impl Default for GraticuleStyle {
    fn default() -> Self {
        Self {
            stroke_color: GRATICULE_STROKE_COLOR.to_string(),
            stroke_width: GRATICULE_STROKE_WIDTH,
            line_dash: GRATICULE_LINE_DASH.to_vec(),
            show_labels: true,
            wrap_x: false,
        }
    }
}

impl Default for GraticuleConfig {
    fn default() -> Self {
        Self {
            style: GraticuleStyle::default(),
            intervals_deg: GRATICULE_INTERVALS_DEG.to_vec(),
            target_size_px: GRATICULE_TARGET_SIZE_PX,
            max_lines: GRATICULE_MAX_LINES,
        }
    }
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            base_scale: ICON_BASE_SCALE,
            vehicle_length_m: VEHICLE_LENGTH_M,
            resolution_limit_m_per_px: RESOLUTION_LIMIT_M_PER_PX,
            north_indicator_factor: NORTH_INDICATOR_FACTOR,
            layer_z_index: MARKER_LAYER_Z_INDEX,
            vehicle_icon: IconConfig {
                src: VEHICLE_ICON_SRC.to_string(),
                natural_size_px: None,
            },
            north_indicator_icon: IconConfig {
                src: NORTH_INDICATOR_ICON_SRC.to_string(),
                natural_size_px: Some((NORTH_INDICATOR_SIZE_PX, NORTH_INDICATOR_SIZE_PX)),
            },
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            origin: GeoCoordinate::new(ORIGIN_LON_DEG, ORIGIN_LAT_DEG),
            step_deg: TRAJECTORY_STEP_DEG,
            heading_divisor: HEADING_DIVISOR,
            interval_ms: FIX_INTERVAL_MS,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            view: ViewConfig::default(),
            tiles: TileConfig::default(),
            graticule: GraticuleConfig::default(),
            marker: MarkerConfig::default(),
            source: SourceConfig::default(),
            assets_root: PathBuf::from("."),
            fix_policy: FixPolicy::default(),
            log_level: LogLevel::default(),
        }
    }
}

/// Configuration validation result
#[derive(Debug)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ConfigError>,
    pub warnings: Vec<String>,
}

/// Loads, validates and saves the application configuration
pub struct ConfigurationManager {
    config: AppConfig,
    config_file_path: Option<PathBuf>,
    is_modified: bool,
}

impl ConfigurationManager {
    /// Create a configuration manager with default settings
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            config_file_path: None,
            is_modified: false,
        }
    }

    /// Create configuration manager and load from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut manager = Self::new();
        manager.load_from_file(path)?;
        Ok(manager)
    }

    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    /// Replace the configuration after validation
    pub fn update_config(&mut self, config: AppConfig) -> Result<(), ConfigError> {
        let validation = self.validate_config(&config);
        if let Some(error) = validation.errors.into_iter().next() {
            return Err(error);
        }

        self.config = config;
        self.is_modified = true;
        Ok(())
    }

    /// Change how out-of-range fixes are handled, returning the previous policy
    pub fn set_fix_policy(&mut self, policy: FixPolicy) -> FixPolicy {
        let old = self.config.fix_policy;
        self.config.fix_policy = policy;
        self.is_modified = true;
        old
    }

    /// Change the initial zoom, returning the previous value
    pub fn set_zoom(&mut self, zoom: f64) -> Result<f64, ConfigError> {
        let view = &self.config.view;
        if !zoom.is_finite() || zoom < view.min_zoom || zoom > view.max_zoom {
            return Err(ConfigError::InvalidParameter {
                parameter: "view.zoom".to_string(),
                value: zoom.to_string(),
                reason: format!("Zoom must be between {} and {}", view.min_zoom, view.max_zoom),
            });
        }

        let old = self.config.view.zoom;
        self.config.view.zoom = zoom;
        self.is_modified = true;
        Ok(old)
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            message: format!("Failed to read config file '{}': {}", path_str, e),
        })?;

        let config: AppConfig = serde_json::from_str(&content).map_err(|e| ConfigError::Serialization {
            message: format!("Failed to parse config file '{}': {}", path_str, e),
        })?;

        let validation = self.validate_config(&config);
        for warning in &validation.warnings {
            log::warn!("{}: {}", path_str, warning);
        }
        if let Some(error) = validation.errors.into_iter().next() {
            return Err(error);
        }

        self.config = config;
        self.config_file_path = Some(path.as_ref().to_path_buf());
        self.is_modified = false;
        Ok(())
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = serde_json::to_string_pretty(&self.config).map_err(|e| ConfigError::Serialization {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(&path, content).map_err(|e| ConfigError::Io {
            message: format!("Failed to write config file '{}': {}", path_str, e),
        })?;

        self.config_file_path = Some(path.as_ref().to_path_buf());
        self.is_modified = false;
        Ok(())
    }

    /// Save to the currently loaded file path
    pub fn save(&mut self) -> Result<(), ConfigError> {
        match self.config_file_path.clone() {
            Some(path) => self.save_to_file(path),
            None => Err(ConfigError::Io {
                message: "No file path set for saving configuration".to_string(),
            }),
        }
    }

    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    /// Check a configuration without applying it
    pub fn validate_config(&self, config: &AppConfig) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let view = &config.view;
        if view.min_zoom > view.max_zoom {
            errors.push(invalid(
                "view.min_zoom",
                view.min_zoom,
                format!("Minimum zoom exceeds maximum zoom {}", view.max_zoom),
            ));
        }
        if !view.zoom.is_finite() || view.zoom < view.min_zoom || view.zoom > view.max_zoom {
            errors.push(invalid(
                "view.zoom",
                view.zoom,
                format!("Zoom must be between {} and {}", view.min_zoom, view.max_zoom),
            ));
        }
        if view.center.lat.abs() > 90.0 || view.center.lon.abs() > 180.0 {
            errors.push(invalid(
                "view.center",
                format!("{}, {}", view.center.lon, view.center.lat),
                "Center must be a valid longitude/latitude".to_string(),
            ));
        }
        if view.viewport_px.0 == 0 || view.viewport_px.1 == 0 {
            errors.push(invalid(
                "view.viewport_px",
                format!("{:?}", view.viewport_px),
                "Viewport must have a non-zero size".to_string(),
            ));
        }

        let marker = &config.marker;
        if marker.base_scale <= 0.0 || !marker.base_scale.is_finite() {
            errors.push(invalid("marker.base_scale", marker.base_scale, "Scale must be positive".to_string()));
        }
        if marker.vehicle_length_m <= 0.0 || !marker.vehicle_length_m.is_finite() {
            errors.push(invalid(
                "marker.vehicle_length_m",
                marker.vehicle_length_m,
                "Vehicle length must be positive".to_string(),
            ));
        }
        if marker.resolution_limit_m_per_px <= 0.0 {
            errors.push(invalid(
                "marker.resolution_limit_m_per_px",
                marker.resolution_limit_m_per_px,
                "Resolution limit must be positive".to_string(),
            ));
        }
        if marker.north_indicator_factor <= 0.0 {
            errors.push(invalid(
                "marker.north_indicator_factor",
                marker.north_indicator_factor,
                "Indicator factor must be positive".to_string(),
            ));
        }
        for (name, icon) in [("vehicle_icon", &marker.vehicle_icon), ("north_indicator_icon", &marker.north_indicator_icon)] {
            if icon.src.trim().is_empty() {
                errors.push(invalid(
                    &format!("marker.{}.src", name),
                    "",
                    "Icon path must not be empty".to_string(),
                ));
            }
            if let Some((w, h)) = icon.natural_size_px {
                if w == 0 || h == 0 {
                    errors.push(invalid(
                        &format!("marker.{}.natural_size_px", name),
                        format!("{}x{}", w, h),
                        "Declared icon size must be non-zero".to_string(),
                    ));
                }
            }
        }

        let source = &config.source;
        if source.interval_ms == 0 {
            errors.push(invalid("source.interval_ms", 0, "Interval must be positive".to_string()));
        } else if source.interval_ms < 50 {
            warnings.push("Very short fix interval renders continuously".to_string());
        }
        if source.heading_divisor <= 0.0 || !source.heading_divisor.is_finite() {
            errors.push(invalid(
                "source.heading_divisor",
                source.heading_divisor,
                "Heading divisor must be positive".to_string(),
            ));
        }
        if source.origin.lat.abs() > 90.0 || source.origin.lon.abs() > 180.0 {
            errors.push(invalid(
                "source.origin",
                format!("{}, {}", source.origin.lon, source.origin.lat),
                "Origin must be a valid longitude/latitude".to_string(),
            ));
        }
        if !source.step_deg.is_finite() {
            errors.push(invalid("source.step_deg", source.step_deg, "Step must be finite".to_string()));
        }

        if config.graticule.intervals_deg.is_empty() {
            errors.push(invalid(
                "graticule.intervals_deg",
                "[]",
                "At least one interval is required".to_string(),
            ));
        }
        if config.tiles.max_zoom > MAX_TILE_ZOOM {
            errors.push(invalid(
                "tiles.max_zoom",
                config.tiles.max_zoom,
                format!("Tile zoom must not exceed {}", MAX_TILE_ZOOM),
            ));
        } else if config.tiles.max_zoom > OSM_MAX_ZOOM {
            warnings.push(format!(
                "Tile zoom {} is deeper than the OpenStreetMap server provides ({})",
                config.tiles.max_zoom, OSM_MAX_ZOOM
            ));
        }
        if config.view.projection == Crs::Wgs84 {
            warnings.push("Tile layer serves web mercator tiles; none are drawn in EPSG:4326".to_string());
        }

        ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

impl Default for ConfigurationManager {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid(parameter: &str, value: impl ToString, reason: String) -> ConfigError {
    ConfigError::InvalidParameter {
        parameter: parameter.to_string(),
        value: value.to_string(),
        reason,
    }
}
