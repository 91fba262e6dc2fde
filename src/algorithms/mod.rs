//! Projection and graticule algorithms

pub mod projection;
pub mod graticule;

pub use projection::{transform, Crs};
pub use graticule::{format_hdms, Graticule, GraticuleLine, GraticuleLines, GraticuleStyle};
