use crate::algorithms::graticule::GraticuleLines;
use crate::algorithms::projection::Crs;
use crate::core::Extent;
use crate::presentation::styler::IconStyle;
use serde::Serialize;

/// Graticule summary carried by a frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraticuleFrame {
    pub interval_deg: Option<f64>,
    pub meridians: usize,
    pub parallels: usize,
}

impl From<&GraticuleLines> for GraticuleFrame {
    fn from(lines: &GraticuleLines) -> Self {
        Self {
            interval_deg: lines.interval_deg,
            meridians: lines.meridians.len(),
            parallels: lines.parallels.len(),
        }
    }
}

/// Marker as drawn in a frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerFrame {
    /// Position in the display projection
    pub position: [f64; 2],
    pub heading_rad: f64,
    /// Sequence of the fix that placed the marker
    pub sequence: Option<u64>,
    /// Vehicle style first, then the north indicator
    pub styles: Vec<IconStyle>,
}

/// Everything one render pass produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderFrame {
    pub frame: u64,
    pub projection: Crs,
    pub zoom: f64,
    /// Map units per pixel
    pub resolution: f64,
    pub center: [f64; 2],
    pub extent: Extent,
    pub viewport_px: (u32, u32),
    pub tile_zoom: u8,
    pub tile_count: usize,
    pub graticule: GraticuleFrame,
    /// `None` until the first fix has been applied
    pub marker: Option<MarkerFrame>,
}
