//! Map view: projection, center and zoom

use crate::algorithms::projection::{transform, Crs};
use crate::core::{Extent, GeoCoordinate, MapPoint};
use crate::utils::config::ViewConfig;
use crate::validation::{MapError, MapResult};

/// Immutable view parameters; only the viewport size follows the surface
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    projection: Crs,
    source_projection: Crs,
    /// Center in the display projection
    center: MapPoint,
    zoom: f64,
    min_zoom: f64,
    max_zoom: f64,
    viewport_px: (u32, u32),
}

impl ViewState {
    pub fn new(config: &ViewConfig) -> MapResult<Self> {
        for (parameter, value) in [
            ("zoom", config.zoom),
            ("min_zoom", config.min_zoom),
            ("max_zoom", config.max_zoom),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(parameter, value));
            }
        }
        if config.min_zoom > config.max_zoom {
            return Err(MapError::InvalidView {
                parameter: "min_zoom".to_string(),
                value: format!("{} > max_zoom {}", config.min_zoom, config.max_zoom),
            });
        }
        if config.zoom < config.min_zoom || config.zoom > config.max_zoom {
            return Err(MapError::InvalidView {
                parameter: "zoom".to_string(),
                value: format!("{} outside [{}, {}]", config.zoom, config.min_zoom, config.max_zoom),
            });
        }
        check_viewport(config.viewport_px)?;

        let center = transform(config.center.to_point(), config.source_projection, config.projection);

        Ok(Self {
            projection: config.projection,
            source_projection: config.source_projection,
            center,
            zoom: config.zoom,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            viewport_px: config.viewport_px,
        })
    }

    pub fn projection(&self) -> Crs {
        self.projection
    }

    pub fn source_projection(&self) -> Crs {
        self.source_projection
    }

    pub fn center(&self) -> MapPoint {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn zoom_bounds(&self) -> (f64, f64) {
        (self.min_zoom, self.max_zoom)
    }

    pub fn viewport_px(&self) -> (u32, u32) {
        self.viewport_px
    }

    /// Map units per pixel at the current zoom
    pub fn resolution(&self) -> f64 {
        self.projection.resolution_for_zoom(self.zoom)
    }

    /// Ground meters per pixel at the current zoom
    pub fn resolution_m(&self) -> f64 {
        self.resolution() * self.projection.meters_per_unit()
    }

    /// Visible area in the display projection
    pub fn extent(&self) -> Extent {
        let resolution = self.resolution();
        let (width, height) = self.viewport_px;
        Extent::centered(
            &self.center,
            width as f64 * resolution / 2.0,
            height as f64 * resolution / 2.0,
        )
    }

    /// Center expressed in the source projection
    pub fn geographic_center(&self) -> GeoCoordinate {
        GeoCoordinate::from_point(&transform(self.center, self.projection, self.source_projection))
    }

    /// Project a source-projection coordinate into the display projection
    pub fn project(&self, coordinate: &GeoCoordinate) -> MapPoint {
        transform(coordinate.to_point(), self.source_projection, self.projection)
    }

    /// Adopt the pixel size of the attached surface
    pub fn set_viewport(&mut self, viewport_px: (u32, u32)) -> MapResult<()> {
        check_viewport(viewport_px)?;
        self.viewport_px = viewport_px;
        Ok(())
    }
}

fn check_viewport(viewport_px: (u32, u32)) -> MapResult<()> {
    if viewport_px.0 == 0 || viewport_px.1 == 0 {
        return Err(MapError::InvalidView {
            parameter: "viewport_px".to_string(),
            value: format!("{}x{}", viewport_px.0, viewport_px.1),
        });
    }
    Ok(())
}

fn invalid(parameter: &str, value: f64) -> MapError {
    MapError::InvalidView {
        parameter: parameter.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_view() {
        let view = ViewState::new(&ViewConfig::default()).unwrap();
        assert_eq!(view.projection(), Crs::WebMercator);
        assert_eq!(view.zoom_bounds(), (3.0, 27.0));
        assert_relative_eq!(view.resolution(), 152.87405657035254, epsilon = 1e-9);

        let center = view.geographic_center();
        assert_relative_eq!(center.lon, 5.882415, epsilon = 1e-9);
        assert_relative_eq!(center.lat, 43.101914, epsilon = 1e-9);
    }

    #[test]
    fn test_extent_follows_viewport() {
        let mut view = ViewState::new(&ViewConfig::default()).unwrap();
        let extent = view.extent();
        assert_relative_eq!(extent.width(), 1024.0 * view.resolution(), epsilon = 1e-6);
        assert!(extent.contains(&view.center()));

        view.set_viewport((200, 100)).unwrap();
        assert_relative_eq!(view.extent().height(), 100.0 * view.resolution(), epsilon = 1e-6);
        assert!(view.set_viewport((0, 100)).is_err());
    }

    #[test]
    fn test_invalid_zoom_rejected() {
        let config = ViewConfig {
            zoom: 2.0,
            ..ViewConfig::default()
        };
        assert!(matches!(ViewState::new(&config), Err(MapError::InvalidView { .. })));

        let config = ViewConfig {
            min_zoom: 12.0,
            max_zoom: 8.0,
            ..ViewConfig::default()
        };
        assert!(ViewState::new(&config).is_err());

        let config = ViewConfig {
            zoom: f64::NAN,
            ..ViewConfig::default()
        };
        assert!(ViewState::new(&config).is_err());
    }

    #[test]
    fn test_project_matches_transform() {
        let view = ViewState::new(&ViewConfig::default()).unwrap();
        let coordinate = GeoCoordinate::new(5.0001, 43.0001);
        let projected = view.project(&coordinate);
        assert_eq!(projected, transform(coordinate.to_point(), Crs::Wgs84, Crs::WebMercator));
    }
}
