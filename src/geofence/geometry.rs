//! Closed-ring primitives used by the tile index.
//!
//! Boundary policy: a point lying on a ring's boundary counts as inside.

use geo::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{Coord, Intersects, LineString, Polygon, Rect};

/// A closed vertex ring.
///
/// The first vertex does not need to be repeated by the caller; the ring is
/// closed on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    polygon: Polygon<f64>,
}

impl Ring {
    pub fn new(vertices: Vec<Coord<f64>>) -> Self {
        Self::from_line_string(LineString::new(vertices))
    }

    pub fn from_line_string(line: LineString<f64>) -> Self {
        // Polygon::new closes the exterior if needed
        Self {
            polygon: Polygon::new(line, vec![]),
        }
    }

    /// Explicit 5-point ring around a rectangle: four corners plus the first
    /// corner again.
    pub fn from_rect(rect: &Rect<f64>) -> Self {
        let (min, max) = (rect.min(), rect.max());
        Self::new(vec![
            Coord { x: min.x, y: min.y },
            Coord { x: max.x, y: min.y },
            Coord { x: max.x, y: max.y },
            Coord { x: min.x, y: max.y },
            Coord { x: min.x, y: min.y },
        ])
    }

    /// The closed boundary, including the repeated closing vertex.
    pub fn boundary(&self) -> &LineString<f64> {
        self.polygon.exterior()
    }

    /// Distinct vertices, without the closing duplicate.
    pub fn vertices(&self) -> &[Coord<f64>] {
        let coords = &self.boundary().0;
        match coords.len() {
            0 => coords,
            n => &coords[..n - 1],
        }
    }

    /// Exact point-in-ring test. Points on the boundary are inside.
    pub fn contains_point(&self, coord: Coord<f64>) -> bool {
        ring_contains_point(self, coord)
    }

    /// Whether any edge of `self` touches or crosses any edge of `other`.
    pub fn intersects(&self, other: &Ring) -> bool {
        rings_intersect(self, other)
    }

    /// Whether every vertex of `other` lies inside or on `self`.
    pub fn contains_ring(&self, other: &Ring) -> bool {
        ring_contains_ring(self, other)
    }
}

pub fn ring_contains_point(ring: &Ring, coord: Coord<f64>) -> bool {
    ring.polygon.coordinate_position(&coord) != CoordPos::Outside
}

pub fn rings_intersect(a: &Ring, b: &Ring) -> bool {
    a.boundary().intersects(b.boundary())
}

pub fn ring_contains_ring(outer: &Ring, inner: &Ring) -> bool {
    inner
        .vertices()
        .iter()
        .all(|v| ring_contains_point(outer, *v))
}

/// Closed-rectangle membership (edges included).
pub fn rect_contains_coord(rect: &Rect<f64>, coord: Coord<f64>) -> bool {
    let (min, max) = (rect.min(), rect.max());
    coord.x >= min.x && coord.x <= max.x && coord.y >= min.y && coord.y <= max.y
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min: f64, max: f64) -> Ring {
        Ring::new(vec![
            Coord { x: min, y: min },
            Coord { x: max, y: min },
            Coord { x: max, y: max },
            Coord { x: min, y: max },
        ])
    }

    #[test]
    fn test_ring_is_closed() {
        let ring = square(0.0, 1.0);
        assert_eq!(ring.boundary().0.len(), 5);
        assert_eq!(ring.vertices().len(), 4);
        assert_eq!(ring.boundary().0.first(), ring.boundary().0.last());
    }

    #[test]
    fn test_boundary_counts_as_inside() {
        let ring = square(0.0, 10.0);
        assert!(ring.contains_point(Coord { x: 5.0, y: 5.0 }));
        assert!(ring.contains_point(Coord { x: 0.0, y: 5.0 }));
        assert!(ring.contains_point(Coord { x: 10.0, y: 10.0 }));
        assert!(!ring.contains_point(Coord { x: 10.5, y: 5.0 }));
    }

    #[test]
    fn test_rect_ring_has_five_points() {
        let rect = Rect::new(Coord { x: 1.0, y: 2.0 }, Coord { x: 3.0, y: 4.0 });
        let ring = Ring::from_rect(&rect);
        assert_eq!(ring.boundary().0.len(), 5);
        assert_eq!(ring.vertices()[2], Coord { x: 3.0, y: 4.0 });
    }

    #[test]
    fn test_rings_intersect() {
        let a = square(0.0, 10.0);
        let crossing = square(5.0, 15.0);
        let nested = square(2.0, 3.0);
        let far = square(20.0, 30.0);

        assert!(a.intersects(&crossing));
        assert!(!a.intersects(&nested));
        assert!(!a.intersects(&far));
    }

    #[test]
    fn test_ring_contains_ring() {
        let a = square(0.0, 10.0);
        assert!(a.contains_ring(&square(2.0, 3.0)));
        assert!(a.contains_ring(&square(0.0, 10.0)));
        assert!(!a.contains_ring(&square(5.0, 15.0)));
        assert!(!a.contains_ring(&square(20.0, 30.0)));
    }

    #[test]
    fn test_rect_contains_coord_includes_edges() {
        let rect = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 });
        assert!(rect_contains_coord(&rect, Coord { x: 1.0, y: 0.5 }));
        assert!(!rect_contains_coord(&rect, Coord { x: 1.1, y: 0.5 }));
    }
}
