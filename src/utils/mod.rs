//! Configuration management

pub mod config;

pub use config::{
    AppConfig, ConfigurationManager, GraticuleConfig, IconConfig, LogLevel, MarkerConfig,
    SourceConfig, TileConfig, ValidationResult, ViewConfig,
};
