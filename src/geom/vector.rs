use crate::Point;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector {
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
}

impl Vector {
    pub fn new(dx: f64, dy: f64, dz: f64) -> Self {
        Self { dx, dy, dz }
    }

    pub fn from_points(beg: Point, end: Point) -> Self {
        Self {
            dx: end.x - beg.x,
            dy: end.y - beg.y,
            dz: end.z - beg.z,
        }
    }

    /// Cross product between 2 vectors.
    pub fn cross(self, other: Self) -> Self {
        Self {
            dx: self.dy * other.dz - self.dz * other.dy,
            dy: self.dz * other.dx - self.dx * other.dz,
            dz: self.dx * other.dy - self.dy * other.dx,
        }
    }

    /// Dot product between 2 vectors.
    pub fn dot(self, other: Self) -> f64 {
        self.dx * other.dx + self.dy * other.dy + self.dz * other.dz
    }

    /// Scalar triple product `self · (b × c)`.
    ///
    /// Equals the signed volume of the parallelepiped spanned by the three vectors.
    pub fn triple(self, b: Self, c: Self) -> f64 {
        self.dot(b.cross(c))
    }

    /// Returns the length of the vector.
    ///
    /// Uses `hypot`, so it neither underflows nor overflows for components
    /// whose squares are out of range.
    pub fn length(&self) -> f64 {
        self.dx.hypot(self.dy).hypot(self.dz)
    }

    /// Largest absolute component.
    pub fn max_abs(&self) -> f64 {
        self.dx.abs().max(self.dy.abs()).max(self.dz.abs())
    }

    /// Returns the components as an array `[dx, dy, dz]`.
    pub fn to_array(self) -> [f64; 3] {
        [self.dx, self.dy, self.dz]
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prec = f.precision().unwrap_or(2); // Default 2 decimals
        write!(
            f,
            "Vector({:.prec$}, {:.prec$}, {:.prec$})",
            self.dx,
            self.dy,
            self.dz,
            prec = prec
        )
    }
}
