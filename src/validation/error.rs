//! Error types for the map display

use thiserror::Error;

/// Map presentation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    /// Fix rejected before reaching the marker
    #[error("Invalid fix: {field} = {value} ({reason})")]
    InvalidFix {
        field: &'static str,
        value: f64,
        reason: String,
    },
    /// Attachment requested without a display surface
    #[error("No display surface to attach the map to")]
    SurfaceMissing,
    /// The map is already bound to a display surface
    #[error("Map already attached to surface '{surface_id}'")]
    AlreadyAttached { surface_id: String },
    /// Geometry update for a feature the layer does not hold
    #[error("Unknown feature '{feature_id}'")]
    UnknownFeature { feature_id: String },
    /// View parameters out of range
    #[error("Invalid view parameter '{parameter}' = {value}")]
    InvalidView { parameter: String, value: String },
    /// Graticule intervals unusable
    #[error("Invalid graticule: {reason}")]
    InvalidGraticule { reason: String },
    /// Presenting a frame failed
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// Icon metrics loading errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IconError {
    #[error("Icon '{src}' not found")]
    NotFound { src: String },
    #[error("Failed to read icon '{src}': {message}")]
    Decode { src: String, message: String },
    #[error("Icon '{src}' has degenerate size {width}x{height}")]
    Degenerate { src: String, width: u32, height: u32 },
    #[error("Icon '{src}' has no readable pixel size; declare natural_size_px")]
    Unsupported { src: String },
    #[error("Icon loader stopped before reporting metrics")]
    LoaderDisconnected,
}

/// Display surface errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurfaceError {
    #[error("Surface '{surface_id}' I/O error: {message}")]
    Io { surface_id: String, message: String },
    #[error("Frame serialization error: {message}")]
    Serialization { message: String },
    #[error("Surface '{surface_id}' is closed")]
    Closed { surface_id: String },
}

/// Scheduler errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("Task interval must be positive, got {interval_ms} ms")]
    InvalidInterval { interval_ms: u64 },
    #[error("Unknown task {id}")]
    UnknownTask { id: u32 },
}

/// Position source errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("Unknown subscription {id}")]
    UnknownSubscription { id: u32 },
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Invalid parameter '{parameter}' = '{value}': {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
    #[error("I/O error: {message}")]
    Io { message: String },
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

/// Application-level errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Map(#[from] MapError),
    #[error(transparent)]
    Icon(#[from] IconError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("Icon metrics must be loaded before the position source starts")]
    IconsNotLoaded,
    #[error("Position source already started")]
    AlreadyStarted,
}

pub type MapResult<T> = Result<T, MapError>;
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MapError::InvalidFix {
            field: "lat",
            value: 95.0,
            reason: "outside [-90, 90]".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid fix: lat = 95 (outside [-90, 90])");

        let err = IconError::Degenerate {
            src: "assets/ownship.png".to_string(),
            width: 0,
            height: 0,
        };
        assert!(err.to_string().contains("0x0"));
    }

    #[test]
    fn test_error_conversions() {
        let surface = SurfaceError::Closed {
            surface_id: "map".to_string(),
        };
        let map: MapError = surface.clone().into();
        assert_eq!(map, MapError::Surface(surface));

        let app: AppError = map.into();
        assert!(matches!(app, AppError::Map(MapError::Surface(_))));
        assert!(app.to_string().contains("closed"));
    }
}
