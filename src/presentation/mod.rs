//! Map presentation: view, layers, marker styling and display surfaces

pub mod frame;
pub mod icons;
pub mod layers;
pub mod map;
pub mod styler;
pub mod surface;
pub mod view;

pub use frame::{GraticuleFrame, MarkerFrame, RenderFrame};
pub use icons::{icon_metrics, FileIconSource, IconLoad, IconMetrics, IconSource, LoadedIcons, StaticIconSource};
pub use layers::{Feature, MapLayers, TileCoord, TileLayer, VectorLayer, MARKER_FEATURE_ID};
pub use map::MapPresentation;
pub use styler::{IconRole, IconStyle, MarkerStyler};
pub use surface::{DisplaySurface, FrameRecorder, JsonLinesSurface, MemorySurface};
pub use view::ViewState;
