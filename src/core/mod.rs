//! Core types and constants for the ownship map display

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
