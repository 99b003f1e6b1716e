//! Tile boundary polygons.
//!
//! A [`TilePolygon`] is the closed five-vertex ring around one tile, in the
//! fixed winding `(x,y) → (x+1,y) → (x+1,y+1) → (x,y+1) → (x,y)`. Map
//! clients draw these as highlight and preset overlays.

use serde_json::{json, Value};

use super::{tile_corner, GeoPoint, TileCoord};

/// Tolerance for point-in-tile checks, in degrees.
const CONTAINS_EPSILON: f64 = 1e-9;

/// Closed boundary ring of a single tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilePolygon {
    pub tile: TileCoord,
    /// Four corners with the first repeated last
    pub ring: [GeoPoint; 5],
}

/// Builds the boundary polygon of a tile.
pub fn polygon_for(tile: &TileCoord) -> TilePolygon {
    let TileCoord { x, y, zoom } = *tile;
    let nw = tile_corner(x, y, zoom);

    TilePolygon {
        tile: *tile,
        ring: [
            nw,
            tile_corner(x + 1, y, zoom),
            tile_corner(x + 1, y + 1, zoom),
            tile_corner(x, y + 1, zoom),
            nw,
        ],
    }
}

impl TilePolygon {
    /// Ring as `[lng, lat]` pairs, the GeoJSON axis order.
    pub fn coordinates(&self) -> Vec<[f64; 2]> {
        self.ring.iter().map(|p| [p.lng, p.lat]).collect()
    }

    /// Bounding-box containment, inclusive of the edges.
    pub fn contains(&self, point: GeoPoint) -> bool {
        let (min_lat, max_lat) = (self.ring[2].lat, self.ring[0].lat);
        let (min_lng, max_lng) = (self.ring[0].lng, self.ring[1].lng);

        point.lat >= min_lat - CONTAINS_EPSILON
            && point.lat <= max_lat + CONTAINS_EPSILON
            && point.lng >= min_lng - CONTAINS_EPSILON
            && point.lng <= max_lng + CONTAINS_EPSILON
    }

    /// GeoJSON `Feature` with the tile indices as properties.
    pub fn to_feature(&self) -> Value {
        json!({
            "type": "Feature",
            "geometry": {
                "type": "Polygon",
                "coordinates": [self.coordinates()],
            },
            "properties": self.tile,
        })
    }
}

/// GeoJSON `FeatureCollection` of the given polygons, in order.
pub fn feature_collection<'a>(polygons: impl IntoIterator<Item = &'a TilePolygon>) -> Value {
    let features: Vec<Value> = polygons.into_iter().map(TilePolygon::to_feature).collect();
    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_is_closed_and_ordered() {
        let tile = TileCoord::new(27443, 14029, 15).unwrap();
        let polygon = polygon_for(&tile);

        assert_eq!(polygon.ring[0], polygon.ring[4]);
        assert_eq!(polygon.ring[0], tile_corner(27443, 14029, 15));
        assert_eq!(polygon.ring[1], tile_corner(27444, 14029, 15));
        assert_eq!(polygon.ring[2], tile_corner(27444, 14030, 15));
        assert_eq!(polygon.ring[3], tile_corner(27443, 14030, 15));

        // north edge first, then east
        assert!(polygon.ring[1].lng > polygon.ring[0].lng);
        assert!(polygon.ring[2].lat < polygon.ring[1].lat);
    }

    #[test]
    fn test_contains_own_center_only() {
        let tile = TileCoord::new(8, 5, 4).unwrap();
        let polygon = polygon_for(&tile);
        let center = GeoPoint::new(
            (polygon.ring[0].lat + polygon.ring[2].lat) / 2.0,
            (polygon.ring[0].lng + polygon.ring[1].lng) / 2.0,
        );

        assert!(polygon.contains(center));
        assert!(!polygon.contains(GeoPoint::new(center.lat, center.lng + 30.0)));
    }

    #[test]
    fn test_last_tile_reaches_grid_edge() {
        let tile = TileCoord::new(3, 3, 2).unwrap();
        let polygon = polygon_for(&tile);
        assert!((polygon.ring[1].lng - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_feature_shape() {
        let tile = TileCoord::new(1, 1, 1).unwrap();
        let feature = polygon_for(&tile).to_feature();

        assert_eq!(feature["type"], "Feature");
        assert_eq!(feature["geometry"]["type"], "Polygon");
        assert_eq!(
            feature["geometry"]["coordinates"][0].as_array().unwrap().len(),
            5
        );
        assert_eq!(feature["properties"]["tileX"], 1);
        // [lng, lat] order
        assert_eq!(feature["geometry"]["coordinates"][0][0][0], 0.0);
    }

    #[test]
    fn test_feature_collection() {
        let polygons: Vec<_> = [(0, 0), (1, 0)]
            .iter()
            .map(|&(x, y)| polygon_for(&TileCoord::new(x, y, 1).unwrap()))
            .collect();

        let collection = feature_collection(&polygons);
        assert_eq!(collection["type"], "FeatureCollection");
        assert_eq!(collection["features"].as_array().unwrap().len(), 2);
        assert_eq!(collection["features"][1]["properties"]["tileX"], 1);
    }
}
