use crate::Point;

/// Returns the unsigned volume of a tetrahedron.
///
/// Computed as `|(pt3 - pt0) · ((pt1 - pt0) × (pt2 - pt0))| / 6`.
/// Degenerate tetrahedra (coplanar or coincident vertices) have zero volume.
pub fn tetrahedron_volume(pt0: Point, pt1: Point, pt2: Point, pt3: Point) -> f64 {
    let triple = (pt3 - pt0).triple(pt1 - pt0, pt2 - pt0);
    triple.abs() / 6.
}

/// Returns tetrahedron centroid (i.e. average of each vertices)
///
/// Repeated vertices are counted as many times as they appear.
pub fn tetrahedron_centroid(pt0: Point, pt1: Point, pt2: Point, pt3: Point) -> Point {
    let x = (pt0.x + pt1.x + pt2.x + pt3.x) / 4.;
    let y = (pt0.y + pt1.y + pt2.y + pt3.y) / 4.;
    let z = (pt0.z + pt1.z + pt2.z + pt3.z) / 4.;
    Point::new(x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_corner_volume() {
        let p0 = Point::new(0., 0., 0.);
        let p1 = Point::new(1., 0., 0.);
        let p2 = Point::new(0., 1., 0.);
        let p3 = Point::new(0., 0., 1.);
        assert_relative_eq!(tetrahedron_volume(p0, p1, p2, p3), 1. / 6.);
    }

    #[test]
    fn test_volume_is_unsigned() {
        let p0 = Point::new(0., 0., 0.);
        let p1 = Point::new(1., 0., 0.);
        let p2 = Point::new(0., 1., 0.);
        let p3 = Point::new(0., 0., 1.);
        // Swapping two vertices flips the orientation, not the volume
        assert_relative_eq!(
            tetrahedron_volume(p0, p2, p1, p3),
            tetrahedron_volume(p0, p1, p2, p3)
        );
    }

    #[test]
    fn test_scaled_volume() {
        let p0 = Point::new(10., -5., 2.);
        let p1 = Point::new(12., -5., 2.);
        let p2 = Point::new(10., -2., 2.);
        let p3 = Point::new(10., -5., 6.);
        // Right-corner tetrahedron with legs 2, 3, 4
        assert_relative_eq!(tetrahedron_volume(p0, p1, p2, p3), 4.);
    }

    #[test]
    fn test_coincident_vertices_zero_volume() {
        let p0 = Point::new(0., 0., 0.);
        let p1 = Point::new(1., 0., 0.);
        let p3 = Point::new(0., 0., 1.);
        assert_eq!(tetrahedron_volume(p0, p1, p1, p3), 0.);
        assert_eq!(tetrahedron_volume(p0, p0, p0, p0), 0.);
    }

    #[test]
    fn test_coplanar_zero_volume() {
        let p0 = Point::new(0., 0., 0.);
        let p1 = Point::new(1., 0., 0.);
        let p2 = Point::new(0., 1., 0.);
        let p3 = Point::new(1., 1., 0.);
        assert_eq!(tetrahedron_volume(p0, p1, p2, p3), 0.);
    }

    #[test]
    fn test_centroid() {
        let p0 = Point::new(0., 0., 0.);
        let p1 = Point::new(4., 0., 0.);
        let p2 = Point::new(0., 4., 0.);
        let p3 = Point::new(0., 0., 4.);
        let c = tetrahedron_centroid(p0, p1, p2, p3);
        assert_eq!(c, Point::new(1., 1., 1.));
    }

    #[test]
    fn test_centroid_counts_repeated_vertex_twice() {
        let v = Point::new(2., 2., 2.);
        let p1 = Point::new(6., 0., 0.);
        let p2 = Point::new(0., 6., 0.);
        let c = tetrahedron_centroid(v, p1, p2, v);
        // (2 + 6 + 0 + 2) / 4, (2 + 0 + 6 + 2) / 4, (2 + 0 + 0 + 2) / 4
        assert_relative_eq!(c.x, 2.5);
        assert_relative_eq!(c.y, 2.5);
        assert_relative_eq!(c.z, 1.0);
    }
}
