//! Map, marker and trajectory constants

/// Latitude of the first simulated fix (degrees)
pub const ORIGIN_LAT_DEG: f64 = 43.0;

/// Longitude of the first simulated fix (degrees)
pub const ORIGIN_LON_DEG: f64 = 5.0;

/// Latitude/longitude increment per emitted fix (degrees)
pub const TRAJECTORY_STEP_DEG: f64 = 0.0001;

/// Heading advances by `t / HEADING_DIVISOR` degrees
pub const HEADING_DIVISOR: f64 = 10.0;

/// Fix emission cadence (milliseconds)
pub const FIX_INTERVAL_MS: u64 = 1000;

/// Spherical mercator radius, WGS84 semi-major axis (meters)
pub const EARTH_RADIUS_WGS84: f64 = 6378137.0;

/// Mean earth radius used for great-circle distances (meters)
pub const EARTH_MEAN_RADIUS: f64 = 6371008.8;

/// Latitude beyond which web mercator is undefined (degrees)
pub const MAX_MERCATOR_LAT_DEG: f64 = 85.0511287798066;

/// Square tile edge (pixels)
pub const TILE_SIZE_PX: u32 = 256;

/// Highest zoom served by the OpenStreetMap tile source
pub const OSM_MAX_ZOOM: u8 = 19;

/// Deepest tile zoom the XYZ grid addresses; column and row indices stay below 2^30
pub const MAX_TILE_ZOOM: u8 = 30;

/// OpenStreetMap tile URL template
pub const OSM_URL_TEMPLATE: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Initial view center longitude (degrees)
pub const DEFAULT_CENTER_LON_DEG: f64 = 5.882415;

/// Initial view center latitude (degrees)
pub const DEFAULT_CENTER_LAT_DEG: f64 = 43.101914;

pub const DEFAULT_ZOOM: f64 = 10.0;
pub const DEFAULT_MIN_ZOOM: f64 = 3.0;
pub const DEFAULT_MAX_ZOOM: f64 = 27.0;

/// Viewport used until a display surface reports its own size
pub const DEFAULT_VIEWPORT_PX: (u32, u32) = (1024, 768);

/// Below this resolution (meters per pixel) the vehicle is drawn at true size
pub const RESOLUTION_LIMIT_M_PER_PX: f64 = 0.5;

/// Nominal icon scale
pub const ICON_BASE_SCALE: f64 = 0.02;

/// Real-world vehicle length (meters)
pub const VEHICLE_LENGTH_M: f64 = 8.0;

/// North indicator footprint relative to the vehicle at base scale
pub const NORTH_INDICATOR_FACTOR: f64 = 4.0;

/// Natural edge of the north indicator artwork (pixels)
pub const NORTH_INDICATOR_SIZE_PX: u32 = 100;

pub const VEHICLE_ICON_SRC: &str = "assets/ownship.png";
pub const NORTH_INDICATOR_ICON_SRC: &str = "assets/rosace.svg";

/// Z-index of the marker layer
pub const MARKER_LAYER_Z_INDEX: i32 = 2;

/// Graticule intervals from coarsest to finest (degrees)
pub const GRATICULE_INTERVALS_DEG: [f64; 21] = [
    90.0,
    45.0,
    30.0,
    20.0,
    10.0,
    5.0,
    2.0,
    1.0,
    30.0 / 60.0,
    20.0 / 60.0,
    10.0 / 60.0,
    5.0 / 60.0,
    2.0 / 60.0,
    1.0 / 60.0,
    30.0 / 3600.0,
    20.0 / 3600.0,
    10.0 / 3600.0,
    5.0 / 3600.0,
    2.0 / 3600.0,
    1.0 / 3600.0,
    1.0 / 7200.0,
];

/// Desired spacing between graticule lines (pixels)
pub const GRATICULE_TARGET_SIZE_PX: f64 = 100.0;

/// Upper bound on lines drawn per axis
pub const GRATICULE_MAX_LINES: usize = 100;

pub const GRATICULE_STROKE_COLOR: &str = "rgba(255,120,0,0.9)";
pub const GRATICULE_STROKE_WIDTH: f64 = 2.0;
pub const GRATICULE_LINE_DASH: [f64; 2] = [0.5, 4.0];
