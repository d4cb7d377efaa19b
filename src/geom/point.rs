use crate::Vector;
use std::fmt;
use std::ops::Sub;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Returns the coordinates as an array `[x, y, z]`.
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f64; 3]> for Point {
    fn from(c: [f64; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prec = f.precision().unwrap_or(2); // Default 2 decimals
        write!(
            f,
            "Point({:.prec$}, {:.prec$}, {:.prec$})",
            self.x,
            self.y,
            self.z,
            prec = prec
        )
    }
}

// Implement - (point - point = vector from `other` to `self`)
impl Sub for Point {
    type Output = Vector;
    fn sub(self, other: Self) -> Vector {
        Vector::from_points(other, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_gives_vector() {
        let p0 = Point::new(1., 1., 1.);
        let p1 = Point::new(2., 3., 4.);
        assert_eq!(p1 - p0, Vector::new(1., 2., 3.));
        assert_eq!(p0 - p1, Vector::new(-1., -2., -3.));
    }

    #[test]
    fn test_display_precision() {
        let p = Point::new(1., 2.5, -3.4);
        assert_eq!(format!("{}", p), "Point(1.00, 2.50, -3.40)");
        assert_eq!(format!("{:.1}", p), "Point(1.0, 2.5, -3.4)");
    }
}
