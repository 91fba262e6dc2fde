//! Map presentation: owns the view, the layer stack and the marker

use crate::core::{Fix, MarkerState};
use crate::presentation::frame::{GraticuleFrame, MarkerFrame, RenderFrame};
use crate::presentation::icons::LoadedIcons;
use crate::presentation::layers::{MapLayers, MARKER_FEATURE_ID};
use crate::presentation::styler::MarkerStyler;
use crate::presentation::surface::DisplaySurface;
use crate::presentation::view::ViewState;
use crate::utils::config::AppConfig;
use crate::validation::{FixValidationStats, FixValidator, MapError, MapResult};

pub struct MapPresentation {
    view: ViewState,
    layers: MapLayers,
    styler: MarkerStyler,
    validator: FixValidator,
    marker: MarkerState,
    last_sequence: Option<u64>,
    surface: Option<Box<dyn DisplaySurface>>,
    last_frame: Option<RenderFrame>,
    render_count: u64,
}

impl MapPresentation {
    pub fn new(config: &AppConfig) -> MapResult<Self> {
        let view = ViewState::new(&config.view)?;
        let layers = MapLayers::new(config)?;
        let styler = MarkerStyler::new(&config.marker, view.projection());

        log::debug!(
            "Map view {} centered on {:?} at zoom {}",
            view.projection(),
            view.geographic_center(),
            view.zoom()
        );

        Ok(Self {
            view,
            layers,
            styler,
            validator: FixValidator::new(config.fix_policy),
            marker: MarkerState::default(),
            last_sequence: None,
            surface: None,
            last_frame: None,
            render_count: 0,
        })
    }

    /// Bind the map to its display surface; allowed once
    ///
    /// The first frame is presented right away. If that fails the map stays
    /// detached and keeps its previous viewport.
    pub fn attach(&mut self, surface: Option<Box<dyn DisplaySurface>>) -> MapResult<()> {
        if let Some(existing) = &self.surface {
            return Err(MapError::AlreadyAttached {
                surface_id: existing.id().to_string(),
            });
        }
        let surface = surface.ok_or(MapError::SurfaceMissing)?;
        let (width, height) = surface.size_px();
        let previous_viewport = self.view.viewport_px();

        self.view.set_viewport((width, height))?;
        self.surface = Some(surface);
        if let Err(e) = self.render() {
            if let Some(surface) = self.surface.take() {
                log::warn!("Detaching surface '{}': first frame failed", surface.id());
            }
            self.view.set_viewport(previous_viewport)?;
            return Err(e);
        }

        if let Some(surface) = &self.surface {
            log::info!("Map attached to surface '{}' ({}x{} px)", surface.id(), width, height);
        }
        Ok(())
    }

    pub fn is_attached(&self) -> bool {
        self.surface.is_some()
    }

    /// Hand the loaded icon sizes to the styler
    pub fn set_icon_metrics(&mut self, icons: LoadedIcons) {
        log::debug!(
            "Icon metrics: vehicle {}x{}, north indicator {}x{}",
            icons.vehicle.width,
            icons.vehicle.height,
            icons.north_indicator.width,
            icons.north_indicator.height
        );
        self.styler.set_metrics(icons);
    }

    /// Move the marker to a new fix and render
    ///
    /// A rejected fix leaves the marker where it was.
    pub fn apply_fix(&mut self, fix: &Fix) -> MapResult<()> {
        let fix = self.validator.validate(fix)?;

        let heading_rad = fix.heading_rad();
        let position = self.view.project(&fix.coordinate());
        self.layers.markers.set_geometry(MARKER_FEATURE_ID, position)?;
        self.marker = MarkerState {
            position: Some(position),
            heading_rad,
        };
        self.last_sequence = Some(fix.sequence);

        self.render()
    }

    /// Compute a frame and present it to the attached surface
    ///
    /// Without a surface the frame is still computed and kept.
    pub fn render(&mut self) -> MapResult<()> {
        self.render_count += 1;
        let frame = self.compute_frame(self.render_count);

        let presented = match self.surface.as_mut() {
            Some(surface) => surface.present(&frame).map_err(MapError::from),
            None => Ok(()),
        };
        log::trace!("Frame {} rendered", frame.frame);
        self.last_frame = Some(frame);
        presented
    }

    fn compute_frame(&self, number: u64) -> RenderFrame {
        let projection = self.view.projection();
        let resolution = self.view.resolution();
        let extent = self.view.extent();
        let center = self.view.center();

        let graticule = self.layers.graticule.lines(&extent, projection, resolution);
        let tile_count = self
            .layers
            .base
            .visible_tiles(&extent, projection, self.view.zoom())
            .len();

        let marker = self.marker.position.map(|position| MarkerFrame {
            position: [position.x, position.y],
            heading_rad: self.marker.heading_rad,
            sequence: self.last_sequence,
            styles: self.styler.compute(resolution, self.marker.heading_rad).to_vec(),
        });

        RenderFrame {
            frame: number,
            projection,
            zoom: self.view.zoom(),
            resolution,
            center: [center.x, center.y],
            extent,
            viewport_px: self.view.viewport_px(),
            tile_zoom: self.layers.base.tile_zoom(self.view.zoom()),
            tile_count,
            graticule: GraticuleFrame::from(&graticule),
            marker,
        }
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn layers(&self) -> &MapLayers {
        &self.layers
    }

    pub fn styler(&self) -> &MarkerStyler {
        &self.styler
    }

    pub fn marker(&self) -> &MarkerState {
        &self.marker
    }

    pub fn last_frame(&self) -> Option<&RenderFrame> {
        self.last_frame.as_ref()
    }

    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    pub fn validation_stats(&self) -> FixValidationStats {
        self.validator.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::projection::{transform, Crs};
    use crate::presentation::icons::IconMetrics;
    use crate::presentation::surface::MemorySurface;
    use crate::validation::FixPolicy;
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    fn fix(lat: f64, lon: f64, heading: f64, sequence: u64) -> Fix {
        Fix {
            lat,
            lon,
            heading,
            sequence,
            timestamp_ms: 0,
        }
    }

    fn icons() -> LoadedIcons {
        LoadedIcons {
            vehicle: IconMetrics::new(50, 100),
            north_indicator: IconMetrics::new(100, 100),
        }
    }

    #[test]
    fn test_attach_requires_surface() {
        let mut map = MapPresentation::new(&AppConfig::default()).unwrap();
        assert_eq!(map.attach(None), Err(MapError::SurfaceMissing));
        assert!(!map.is_attached());
    }

    #[test]
    fn test_attach_once() {
        let mut map = MapPresentation::new(&AppConfig::default()).unwrap();
        let surface = MemorySurface::new("map", (640, 480));
        let recorder = surface.recorder();

        map.attach(Some(Box::new(surface))).unwrap();
        assert_eq!(map.view().viewport_px(), (640, 480));
        assert_eq!(recorder.len(), 1);

        let err = map.attach(Some(Box::new(MemorySurface::new("other", (10, 10))))).unwrap_err();
        assert_eq!(
            err,
            MapError::AlreadyAttached {
                surface_id: "map".to_string()
            }
        );
    }

    #[test]
    fn test_apply_fix_moves_marker_and_renders() {
        let mut map = MapPresentation::new(&AppConfig::default()).unwrap();
        map.set_icon_metrics(icons());
        let surface = MemorySurface::new("map", (1024, 768));
        let recorder = surface.recorder();
        map.attach(Some(Box::new(surface))).unwrap();
        assert!(recorder.last().unwrap().marker.is_none());

        map.apply_fix(&fix(43.0001, 5.0001, 90.0, 1)).unwrap();

        let expected = transform(Point2::new(5.0001, 43.0001), Crs::Wgs84, Crs::WebMercator);
        assert_eq!(map.marker().position, Some(expected));
        assert_relative_eq!(map.marker().heading_rad, std::f64::consts::FRAC_PI_2);
        assert_eq!(
            map.layers().markers.feature(MARKER_FEATURE_ID).unwrap().geometry,
            Some(expected)
        );

        let frame = recorder.last().unwrap();
        assert_eq!(frame.frame, 2);
        let marker = frame.marker.unwrap();
        assert_eq!(marker.sequence, Some(1));
        assert_eq!(marker.styles.len(), 2);
        assert_relative_eq!(marker.styles[0].rotation, std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(marker.styles[0].scale, 0.02);
    }

    #[test]
    fn test_rejected_fix_keeps_marker() {
        let mut map = MapPresentation::new(&AppConfig::default()).unwrap();
        map.apply_fix(&fix(43.0, 5.0, 0.0, 0)).unwrap();
        let before = *map.marker();
        let renders = map.render_count();

        let err = map.apply_fix(&fix(f64::NAN, 5.0, 0.0, 1)).unwrap_err();
        assert!(matches!(err, MapError::InvalidFix { field: "lat", .. }));
        assert_eq!(*map.marker(), before);
        assert_eq!(map.render_count(), renders);
        assert_eq!(map.validation_stats().rejected, 1);
    }

    #[test]
    fn test_clamp_policy_places_marker() {
        let config = AppConfig {
            fix_policy: FixPolicy::Clamp,
            ..AppConfig::default()
        };
        let mut map = MapPresentation::new(&config).unwrap();
        map.apply_fix(&fix(43.0, 190.0, 370.0, 0)).unwrap();

        let position = map.marker().position.unwrap();
        assert!(position.x.is_finite() && position.y.is_finite());
        assert_relative_eq!(map.marker().heading_rad, 10f64.to_radians(), epsilon = 1e-12);
    }

    #[test]
    fn test_render_detached_keeps_frame() {
        let mut map = MapPresentation::new(&AppConfig::default()).unwrap();
        map.render().unwrap();
        let frame = map.last_frame().unwrap();
        assert_eq!(frame.frame, 1);
        assert_eq!(frame.viewport_px, (1024, 768));
        assert_eq!(frame.graticule.interval_deg, Some(10.0 / 60.0));
        assert!(frame.graticule.meridians > 0);
        assert!(frame.tile_count > 0);
    }

    #[test]
    fn test_surface_failure_reported() {
        let mut map = MapPresentation::new(&AppConfig::default()).unwrap();
        let mut surface = MemorySurface::new("map", (100, 100));
        surface.close();
        let err = map.attach(Some(Box::new(surface))).unwrap_err();
        assert!(matches!(err, MapError::Surface(_)));
        assert!(map.last_frame().is_some());

        // the failed attachment is rolled back
        assert!(!map.is_attached());
        assert_eq!(map.view().viewport_px(), (1024, 768));

        let surface = MemorySurface::new("retry", (640, 480));
        let recorder = surface.recorder();
        map.attach(Some(Box::new(surface))).unwrap();
        assert!(map.is_attached());
        assert_eq!(map.view().viewport_px(), (640, 480));
        assert_eq!(recorder.len(), 1);
    }
}
