//! Ownship map display
//!
//! A headless slippy-map presentation of a simulated vehicle: a position
//! source emits fixes on a timer, the map presentation moves the vehicle
//! marker and renders a frame, and the marker styler sizes the vehicle and
//! north-indicator icons from the current resolution.

pub mod core;
pub mod algorithms;
pub mod validation;
pub mod utils;
pub mod source;
pub mod presentation;
pub mod app;

// Re-export commonly used types
pub use crate::core::{Extent, Fix, GeoCoordinate, MapPoint, MarkerState};
pub use algorithms::{Crs, Graticule, GraticuleStyle};
pub use validation::{
    AppError, AppResult, ConfigError, FixPolicy, FixValidator, IconError, MapError, ScheduleError,
    SourceError, SurfaceError,
};
pub use utils::{AppConfig, ConfigurationManager};
pub use source::{Clock, PositionSource, Scheduler, SimulatedTrajectory, SystemClock, TaskHandle, VirtualClock};
pub use presentation::{
    DisplaySurface, FileIconSource, IconStyle, JsonLinesSurface, MapPresentation, MarkerStyler, MemorySurface,
    RenderFrame, StaticIconSource, ViewState,
};
pub use app::Application;
