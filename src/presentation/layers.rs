//! Map layers: base tiles, graticule overlay and the marker layer

use crate::algorithms::graticule::Graticule;
use crate::algorithms::projection::{Crs, MERCATOR_HALF_WORLD};
use crate::core::{Extent, MapPoint, MAX_TILE_ZOOM};
use crate::utils::config::{AppConfig, TileConfig};
use crate::validation::{MapError, MapResult};
use serde::Serialize;

/// Id of the single vehicle feature
pub const MARKER_FEATURE_ID: &str = "ownship";

/// Slippy-map tile address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TileCoord {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

/// Base raster layer backed by an XYZ tile source
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    url_template: String,
    wrap_x: bool,
    max_zoom: u8,
}

impl TileLayer {
    pub fn new(config: &TileConfig) -> Self {
        Self {
            url_template: config.url_template.clone(),
            wrap_x: config.wrap_x,
            max_zoom: config.max_zoom,
        }
    }

    pub fn wrap_x(&self) -> bool {
        self.wrap_x
    }

    /// Tile zoom used for a fractional view zoom
    pub fn tile_zoom(&self, view_zoom: f64) -> u8 {
        let cap = self.max_zoom.min(MAX_TILE_ZOOM);
        view_zoom.round().clamp(0.0, cap as f64) as u8
    }

    /// Tiles covering `extent`, row by row from the north-west corner
    ///
    /// The tile grid is web mercator, so other display projections get no
    /// tiles.
    pub fn visible_tiles(&self, extent: &Extent, crs: Crs, view_zoom: f64) -> Vec<TileCoord> {
        if crs != Crs::WebMercator {
            return Vec::new();
        }

        let z = self.tile_zoom(view_zoom);
        let count = 1u64 << z;
        let span = 2.0 * MERCATOR_HALF_WORLD / count as f64;
        let last = (count - 1) as i64;

        let column = |x: f64| ((x + MERCATOR_HALF_WORLD) / span).floor() as i64;
        let row = |y: f64| ((MERCATOR_HALF_WORLD - y) / span).floor() as i64;

        let (min_x, max_x) = (column(extent.min_x), column(extent.max_x));
        let (min_y, max_y) = (row(extent.max_y).max(0), row(extent.min_y).min(last));

        let columns: Vec<u32> = if self.wrap_x {
            (min_x..=max_x).map(|x| x.rem_euclid(count as i64) as u32).collect()
        } else {
            (min_x.max(0)..=max_x.min(last)).map(|x| x as u32).collect()
        };

        let mut tiles = Vec::new();
        for y in min_y..=max_y {
            for &x in &columns {
                tiles.push(TileCoord { z, x, y: y as u32 });
            }
        }
        tiles
    }

    pub fn url(&self, tile: &TileCoord) -> String {
        self.url_template
            .replace("{z}", &tile.z.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
    }
}

/// Point feature of a vector layer
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: String,
    /// Position in the display projection, `None` while empty
    pub geometry: Option<MapPoint>,
}

/// Vector layer holding point features
#[derive(Debug, Clone, PartialEq)]
pub struct VectorLayer {
    z_index: i32,
    features: Vec<Feature>,
}

impl VectorLayer {
    /// Layer holding exactly one empty marker feature
    pub fn with_marker(z_index: i32) -> Self {
        Self {
            z_index,
            features: vec![Feature {
                id: MARKER_FEATURE_ID.to_string(),
                geometry: None,
            }],
        }
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn feature(&self, id: &str) -> Option<&Feature> {
        self.features.iter().find(|feature| feature.id == id)
    }

    /// Move a feature, returning its previous geometry
    pub fn set_geometry(&mut self, id: &str, point: MapPoint) -> MapResult<Option<MapPoint>> {
        let feature = self
            .features
            .iter_mut()
            .find(|feature| feature.id == id)
            .ok_or_else(|| MapError::UnknownFeature {
                feature_id: id.to_string(),
            })?;
        Ok(feature.geometry.replace(point))
    }
}

/// The map's layer stack, bottom to top
#[derive(Debug, Clone, PartialEq)]
pub struct MapLayers {
    pub base: TileLayer,
    pub graticule: Graticule,
    pub markers: VectorLayer,
}

impl MapLayers {
    pub fn new(config: &AppConfig) -> MapResult<Self> {
        Ok(Self {
            base: TileLayer::new(&config.tiles),
            graticule: Graticule::new(&config.graticule)?,
            markers: VectorLayer::with_marker(config.marker.layer_z_index),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point2;

    #[test]
    fn test_world_tile_at_zoom_zero() {
        let layer = TileLayer::new(&TileConfig::default());
        let world = Extent::new(-MERCATOR_HALF_WORLD, -MERCATOR_HALF_WORLD, MERCATOR_HALF_WORLD, MERCATOR_HALF_WORLD);
        let tiles = layer.visible_tiles(&world, Crs::WebMercator, 0.0);
        assert_eq!(tiles, vec![TileCoord { z: 0, x: 0, y: 0 }]);
        assert_eq!(layer.url(&tiles[0]), "https://tile.openstreetmap.org/0/0/0.png");
    }

    #[test]
    fn test_tiles_clipped_without_wrap() {
        let layer = TileLayer::new(&TileConfig::default());
        assert!(!layer.wrap_x());
        let beyond = Extent::new(-2.0 * MERCATOR_HALF_WORLD, -1.0, -MERCATOR_HALF_WORLD * 0.9, 1.0);
        let tiles = layer.visible_tiles(&beyond, Crs::WebMercator, 1.0);
        assert!(tiles.iter().all(|t| t.x == 0));
        assert_eq!(tiles.len(), 2);
    }

    #[test]
    fn test_tile_zoom_capped() {
        let layer = TileLayer::new(&TileConfig::default());
        assert_eq!(layer.tile_zoom(10.4), 10);
        assert_eq!(layer.tile_zoom(25.0), 19);
        assert!(layer.visible_tiles(&Extent::new(0.0, 0.0, 1.0, 1.0), Crs::Wgs84, 3.0).is_empty());
    }

    #[test]
    fn test_deep_zoom_stays_on_grid() {
        let layer = TileLayer::new(&TileConfig {
            max_zoom: 64,
            ..TileConfig::default()
        });
        assert_eq!(layer.tile_zoom(64.0), MAX_TILE_ZOOM);

        // a few centimetres just north-east of the origin
        let tiles = layer.visible_tiles(&Extent::new(0.001, 0.001, 0.01, 0.01), Crs::WebMercator, 64.0);
        assert_eq!(tiles, vec![TileCoord { z: MAX_TILE_ZOOM, x: 1 << 29, y: (1 << 29) - 1 }]);
    }

    #[test]
    fn test_marker_layer_setter() {
        let mut layer = VectorLayer::with_marker(2);
        assert_eq!(layer.features().len(), 1);
        assert_eq!(layer.feature(MARKER_FEATURE_ID).unwrap().geometry, None);

        let previous = layer.set_geometry(MARKER_FEATURE_ID, Point2::new(1.0, 2.0)).unwrap();
        assert_eq!(previous, None);
        let previous = layer.set_geometry(MARKER_FEATURE_ID, Point2::new(3.0, 4.0)).unwrap();
        assert_eq!(previous, Some(Point2::new(1.0, 2.0)));

        let err = layer.set_geometry("other", Point2::new(0.0, 0.0)).unwrap_err();
        assert_eq!(
            err,
            MapError::UnknownFeature {
                feature_id: "other".to_string()
            }
        );
        assert_eq!(layer.features().len(), 1);
    }
}
