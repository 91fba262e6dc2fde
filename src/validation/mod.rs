//! Error types and fix validation

pub mod data;
pub mod error;

pub use data::{FixPolicy, FixValidationStats, FixValidator};
pub use error::{
    AppError, AppResult, ConfigError, IconError, MapError, MapResult, ScheduleError, SourceError,
    SurfaceError,
};
