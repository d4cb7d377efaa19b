//! Ambient (inducing) magnetic field.

use crate::Vector;
use crate::error::{DatagenError, Result};

/// Ambient field vector with its magnitude and unit direction.
///
/// Construction fails only for a zero or non-finite vector, so `direction`
/// always has unit length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientField {
    vector: Vector,
    magnitude: f64,
    direction: Vector,
}

impl AmbientField {
    /// Builds the field from its components `(Bx, By, Bz)`, typically in nT.
    pub fn new(bx: f64, by: f64, bz: f64) -> Result<Self> {
        let vector = Vector::new(bx, by, bz);
        let largest = vector.max_abs();
        if ![bx, by, bz].iter().all(|c| c.is_finite()) || largest == 0.0 {
            return Err(DatagenError::DegenerateField { bx, by, bz });
        }
        // Normalise against the largest component first so tiny or huge
        // components do not leave the f64 range
        let scaled = Vector::new(bx / largest, by / largest, bz / largest);
        let norm = scaled.length();
        let magnitude = largest * norm;
        let direction = Vector::new(scaled.dx / norm, scaled.dy / norm, scaled.dz / norm);
        Ok(Self {
            vector,
            magnitude,
            direction,
        })
    }

    pub fn vector(&self) -> Vector {
        self.vector
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    pub fn direction(&self) -> Vector {
        self.direction
    }

    /// Direction cosines `(lx, ly, lz)` of the field.
    pub fn direction_cosines(&self) -> [f64; 3] {
        self.direction.to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_survey_field() {
        let field = AmbientField::new(4594.8, 19887.1, 41568.2).unwrap();
        let expected = (4594.8f64.powi(2) + 19887.1f64.powi(2) + 41568.2f64.powi(2)).sqrt();
        assert_relative_eq!(field.magnitude(), expected, max_relative = 1e-14);
        let [lx, ly, lz] = field.direction_cosines();
        assert_relative_eq!(lx, 4594.8 / expected, max_relative = 1e-14);
        assert_relative_eq!(ly, 19887.1 / expected, max_relative = 1e-14);
        assert_relative_eq!(lz, 41568.2 / expected, max_relative = 1e-14);
    }

    #[test]
    fn test_direction_has_unit_norm() {
        let cases = [
            (1.0, 0.0, 0.0),
            (0.0, -3.0, 0.0),
            (1e-9, 2e-9, -3e-9),
            (-50_000.0, 1.0, 25_000.0),
            (7.0, 7.0, 7.0),
        ];
        for (bx, by, bz) in cases {
            let field = AmbientField::new(bx, by, bz).unwrap();
            let [lx, ly, lz] = field.direction_cosines();
            assert_abs_diff_eq!(lx * lx + ly * ly + lz * lz, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_zero_field_is_degenerate() {
        let err = AmbientField::new(0.0, 0.0, 0.0).unwrap_err();
        assert!(matches!(err, DatagenError::DegenerateField { .. }));
    }

    #[test]
    fn test_non_finite_field_is_degenerate() {
        assert!(AmbientField::new(f64::NAN, 1.0, 0.0).is_err());
        assert!(AmbientField::new(f64::INFINITY, 1.0, 0.0).is_err());
    }

    #[test]
    fn test_tiny_and_huge_fields_are_valid() {
        let tiny = AmbientField::new(1e-200, 0.0, 0.0).unwrap();
        assert_eq!(tiny.magnitude(), 1e-200);
        assert_eq!(tiny.direction_cosines(), [1.0, 0.0, 0.0]);

        let huge = AmbientField::new(1e200, 1e200, 0.0).unwrap();
        assert_relative_eq!(huge.magnitude(), 2f64.sqrt() * 1e200, max_relative = 1e-15);

        let cases = [
            (1e200, 1e200, 0.0),
            (f64::MAX, -f64::MAX, 1.0),
            (5e-324, 0.0, -5e-324),
        ];
        for (bx, by, bz) in cases {
            let [lx, ly, lz] = AmbientField::new(bx, by, bz).unwrap().direction_cosines();
            assert_abs_diff_eq!(lx * lx + ly * ly + lz * lz, 1.0, epsilon = 1e-12);
        }
    }
}
