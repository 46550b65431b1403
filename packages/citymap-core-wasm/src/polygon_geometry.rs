use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::DEFAULT_LOCAL_ORIGIN;

/// Anchor of the local coordinate space, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalOrigin {
    pub lng: f64,
    pub lat: f64,
}

impl LocalOrigin {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

impl Default for LocalOrigin {
    fn default() -> Self {
        Self::new(DEFAULT_LOCAL_ORIGIN[0], DEFAULT_LOCAL_ORIGIN[1])
    }
}

impl From<[f64; 2]> for LocalOrigin {
    fn from(value: [f64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

/// Closed footprint in local space: the last point repeats the first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalShape {
    pub points: Vec<[f64; 2]>,
}

impl LocalShape {
    /// Distinct vertices, without the closing repeat.
    pub fn contour(&self) -> &[[f64; 2]] {
        &self.points[..self.points.len().saturating_sub(1)]
    }

    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.points.len() >= 4 && self.points.first() == self.points.last()
    }

    /// Signed shoelace area; positive for counter-clockwise rings.
    #[cfg(test)]
    pub fn signed_area(&self) -> f64 {
        let contour = self.contour();
        let n = contour.len();
        let mut area = 0.0;
        for i in 0..n {
            let j = (i + 1) % n;
            area += contour[i][0] * contour[j][1] - contour[j][0] * contour[i][1];
        }
        area * 0.5
    }
}

/// Project a lng/lat ring into local space and close it.
///
/// Equirectangular local-tangent approximation:
/// `x = (lng - origin.lng) * scale`, `y = (lat - origin.lat) * scale`.
/// Distances are only meaningful close to `origin`; this is not a geodesic
/// projection.
///
/// Returns `None` when fewer than three distinct vertices remain once an
/// explicit closing vertex is ignored, or when any coordinate is not finite.
pub fn to_local_shape(ring: &[[f64; 2]], origin: LocalOrigin, scale: f64) -> Option<LocalShape> {
    let mut open = ring;
    if open.len() > 1 && open.first() == open.last() {
        open = &open[..open.len() - 1];
    }
    if !scale.is_finite() {
        return None;
    }
    let distinct: HashSet<(u64, u64)> = open
        .iter()
        .map(|p| (p[0].to_bits(), p[1].to_bits()))
        .collect();
    if distinct.len() < 3 {
        return None;
    }

    let mut points = Vec::with_capacity(open.len() + 1);
    for &[lng, lat] in open {
        let x = (lng - origin.lng) * scale;
        let y = (lat - origin.lat) * scale;
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        points.push([x, y]);
    }
    points.push(points[0]);

    Some(LocalShape { points })
}

/// Extrusion depth for a building: its height when finite, else the
/// fallback. Never negative.
pub fn extrusion_height(height: Option<f64>, fallback: f64) -> f64 {
    let h = match height {
        Some(h) if h.is_finite() => h,
        _ => fallback,
    };
    if h.is_finite() {
        h.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_LOCAL_SCALE;

    #[test]
    fn shape_is_closed_for_three_or_more_points() {
        let ring = [[-114.06, 51.0475], [-114.05, 51.0475], [-114.05, 51.05]];
        let shape = to_local_shape(&ring, LocalOrigin::default(), DEFAULT_LOCAL_SCALE).unwrap();
        assert_eq!(shape.points.len(), 4);
        assert_eq!(shape.points.first(), shape.points.last());
        assert!(shape.is_closed());
        assert_eq!(shape.contour().len(), 3);
    }

    #[test]
    fn already_closed_ring_is_not_closed_twice() {
        let ring = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]];
        let shape = to_local_shape(&ring, LocalOrigin::new(0.0, 0.0), 1.0).unwrap();
        assert_eq!(shape.points.len(), 5);
        assert_eq!(shape.points.first(), shape.points.last());
    }

    #[test]
    fn fewer_than_three_points_yields_none() {
        let origin = LocalOrigin::default();
        assert!(to_local_shape(&[], origin, 1.0).is_none());
        assert!(to_local_shape(&[[0.0, 0.0]], origin, 1.0).is_none());
        assert!(to_local_shape(&[[0.0, 0.0], [1.0, 1.0]], origin, 1.0).is_none());
        // a "triangle" that is really a closed two-point ring
        assert!(to_local_shape(&[[0.0, 0.0], [1.0, 1.0], [0.0, 0.0]], origin, 1.0).is_none());
    }

    #[test]
    fn repeated_vertices_do_not_count_as_distinct() {
        let origin = LocalOrigin::new(0.0, 0.0);
        let back_and_forth = [[0.0, 0.0], [1.0, 0.0], [0.0, 0.0], [1.0, 0.0], [0.0, 0.0]];
        assert!(to_local_shape(&back_and_forth, origin, 1.0).is_none());
        let stutter = [[0.0, 0.0], [0.0, 0.0], [1.0, 0.0], [1.0, 0.0]];
        assert!(to_local_shape(&stutter, origin, 1.0).is_none());
        let triangle = [[0.0, 0.0], [1.0, 0.0], [1.0, 0.0], [1.0, 1.0]];
        assert!(to_local_shape(&triangle, origin, 1.0).is_some());
    }

    #[test]
    fn non_finite_input_yields_none() {
        let ring = [[0.0, 0.0], [f64::NAN, 0.0], [1.0, 1.0]];
        assert!(to_local_shape(&ring, LocalOrigin::new(0.0, 0.0), 1.0).is_none());
        let ring = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]];
        assert!(to_local_shape(&ring, LocalOrigin::new(0.0, 0.0), f64::INFINITY).is_none());
    }

    #[test]
    fn projection_is_offset_and_scaled() {
        let origin = LocalOrigin::new(-114.06, 51.0475);
        let ring = [[-114.06, 51.0475], [-114.059, 51.0475], [-114.059, 51.0485]];
        let shape = to_local_shape(&ring, origin, 100_000.0).unwrap();
        assert!((shape.points[0][0]).abs() < 1e-6);
        assert!((shape.points[0][1]).abs() < 1e-6);
        assert!((shape.points[1][0] - 100.0).abs() < 1e-6);
        assert!((shape.points[2][1] - 100.0).abs() < 1e-6);
        assert!(shape.signed_area() > 0.0);
    }

    #[test]
    fn extrusion_height_policy() {
        assert_eq!(extrusion_height(Some(152.4), 10.0), 152.4);
        assert_eq!(extrusion_height(None, 10.0), 10.0);
        assert_eq!(extrusion_height(Some(f64::NAN), 10.0), 10.0);
        assert_eq!(extrusion_height(Some(-5.0), 10.0), 0.0);
        assert_eq!(extrusion_height(None, -1.0), 0.0);
        assert_eq!(extrusion_height(None, 0.0), 0.0);
    }
}
