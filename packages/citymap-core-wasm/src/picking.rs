// Hit-testing of geographic points against building footprints
use geo::{BoundingRect, Contains};
use geo_types::{Coord, LineString, Point, Polygon};

use crate::models::{Building, FeatureCollection};

fn footprint_polygon(building: &Building) -> Option<Polygon<f64>> {
    if building.footprint.len() < 3 {
        return None;
    }
    let ring: LineString<f64> = building
        .footprint
        .iter()
        .map(|p| Coord { x: p[0], y: p[1] })
        .collect();
    // Polygon::new closes the ring
    Some(Polygon::new(ring, vec![]))
}

/// Whether the footprint of `building` contains (lng, lat). Points on the
/// outline do not count.
pub fn footprint_contains(building: &Building, lng: f64, lat: f64) -> bool {
    let Some(polygon) = footprint_polygon(building) else {
        return false;
    };

    // Quick rejection against the footprint's bounding box first
    let Some(bounds) = polygon.bounding_rect() else {
        return false;
    };
    let (min, max) = (bounds.min(), bounds.max());
    if lng < min.x || lng > max.x || lat < min.y || lat > max.y {
        return false;
    }

    polygon.contains(&Point::new(lng, lat))
}

/// Building under the given point. Later buildings draw on top of earlier
/// ones, so the last hit wins.
pub fn pick(collection: &FeatureCollection, lng: f64, lat: f64) -> Option<&Building> {
    if !lng.is_finite() || !lat.is_finite() {
        return None;
    }
    collection
        .buildings
        .iter()
        .rev()
        .find(|b| footprint_contains(b, lng, lat))
}
