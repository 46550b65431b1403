use earcutr::earcut;
use serde::Serialize;

use crate::console_log;
use crate::polygon_geometry::LocalShape;

const EPSILON: f64 = 1e-10;

/// Simple 2D vector struct
#[derive(Clone, Copy, Debug, PartialEq)]
struct Vector2 {
    x: f64,
    y: f64,
}

impl Vector2 {
    fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Triangle soup ready for a WebGL/three.js buffer geometry.
///
/// Every triangle owns its three vertices so flat normals stay sharp on
/// the wall edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferGeometry {
    pub vertices: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
}

impl BufferGeometry {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn push_triangle(&mut self, a: [f64; 3], b: [f64; 3], c: [f64; 3]) {
        let normal = face_normal(a, b, c);
        let base = (self.vertices.len() / 3) as u32;
        for p in [a, b, c] {
            self.vertices.extend(p.iter().map(|v| *v as f32));
            self.normals.extend(normal.iter().map(|v| *v as f32));
        }
        self.indices.extend([base, base + 1, base + 2]);
    }
}

fn face_normal(a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> [f64; 3] {
    let v1 = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let v2 = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
    let n = [
        v1[1] * v2[2] - v1[2] * v2[1],
        v1[2] * v2[0] - v1[0] * v2[2],
        v1[0] * v2[1] - v1[1] * v2[0],
    ];
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if len > EPSILON {
        [n[0] / len, n[1] / len, n[2] / len]
    } else {
        // Degenerate triangle - use Z-up normal
        [0.0, 0.0, 1.0]
    }
}

fn is_clockwise(points: &[Vector2]) -> bool {
    let n = points.len();
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    area < 0.0
}

fn merge_overlapping_points(points: &mut Vec<Vector2>) {
    points.dedup_by(|b, a| (a.x - b.x).abs() < EPSILON && (a.y - b.y).abs() < EPSILON);
    while points.len() > 1 {
        let first = points[0];
        let last = points[points.len() - 1];
        if (first.x - last.x).abs() < EPSILON && (first.y - last.y).abs() < EPSILON {
            points.pop();
        } else {
            break;
        }
    }
}

/// Extrude a closed local shape from z = 0 up to z = `depth`.
///
/// Produces bottom and top caps (earcut triangulation) and one quad per
/// contour edge. Returns `None` for a non-positive depth or a contour that
/// collapses below three points.
pub fn extrude_shape(shape: &LocalShape, depth: f64) -> Option<BufferGeometry> {
    if !depth.is_finite() || depth <= EPSILON {
        return None;
    }

    let mut contour: Vec<Vector2> = shape
        .contour()
        .iter()
        .map(|p| Vector2::new(p[0], p[1]))
        .collect();
    merge_overlapping_points(&mut contour);
    if contour.len() < 3 {
        return None;
    }

    // Walls face outwards only for counter-clockwise contours
    if is_clockwise(&contour) {
        contour.reverse();
    }

    let data: Vec<f64> = contour.iter().flat_map(|p| [p.x, p.y]).collect();
    let faces = match earcut(&data, &[], 2) {
        Ok(indices) if !indices.is_empty() => indices,
        Ok(_) => {
            console_log!("Earcut produced no triangles for a {}-point contour", contour.len());
            return None;
        }
        Err(e) => {
            console_log!("Earcut failed: {:?}", e);
            return None;
        }
    };

    let mut geometry = BufferGeometry::default();
    let at = |p: Vector2, z: f64| [p.x, p.y, z];

    for tri in faces.chunks_exact(3) {
        let (a, b, c) = (contour[tri[0]], contour[tri[1]], contour[tri[2]]);
        // earcut does not promise a winding; orient each cap explicitly
        let ccw = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x) > 0.0;
        let (b, c) = if ccw { (b, c) } else { (c, b) };

        // Bottom cap faces down, top cap faces up
        geometry.push_triangle(at(a, 0.0), at(c, 0.0), at(b, 0.0));
        geometry.push_triangle(at(a, depth), at(b, depth), at(c, depth));
    }

    let n = contour.len();
    for i in 0..n {
        let p0 = contour[i];
        let p1 = contour[(i + 1) % n];
        geometry.push_triangle(at(p0, 0.0), at(p1, 0.0), at(p1, depth));
        geometry.push_triangle(at(p0, 0.0), at(p1, depth), at(p0, depth));
    }

    Some(geometry)
}
