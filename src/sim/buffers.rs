/// Reusable per-cell property arrays for one in-flight sample.
///
/// Allocated once with exactly one slot per mesh cell and overwritten by
/// every sample that uses it. A buffer set must never be shared by two
/// samples at the same time; the batch gives each worker its own.
#[derive(Debug, Clone)]
pub struct SampleBuffers {
    pub susceptibility: Vec<f64>,
    pub kx: Vec<f64>,
    pub ky: Vec<f64>,
    pub kz: Vec<f64>,
}

impl SampleBuffers {
    pub fn new(cell_count: usize) -> Self {
        Self {
            susceptibility: vec![0.0; cell_count],
            kx: vec![0.0; cell_count],
            ky: vec![0.0; cell_count],
            kz: vec![0.0; cell_count],
        }
    }

    /// Number of cells each array holds.
    pub fn cell_count(&self) -> usize {
        self.susceptibility.len()
    }

    /// Multiplies the susceptibility array in place.
    pub fn scale_susceptibility(&mut self, factor: f64) {
        self.susceptibility.iter_mut().for_each(|v| *v *= factor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sized_to_cells() {
        let b = SampleBuffers::new(7);
        assert_eq!(b.cell_count(), 7);
        assert_eq!(b.kx.len(), 7);
        assert_eq!(b.ky.len(), 7);
        assert_eq!(b.kz.len(), 7);
    }

    #[test]
    fn test_scale_only_touches_susceptibility() {
        let mut b = SampleBuffers::new(3);
        b.susceptibility.copy_from_slice(&[1.0, -2.0, 0.5]);
        b.kx.copy_from_slice(&[1.0, 1.0, 1.0]);
        b.scale_susceptibility(50_000.0);
        assert_eq!(b.susceptibility, vec![50_000.0, -100_000.0, 25_000.0]);
        assert_eq!(b.kx, vec![1.0, 1.0, 1.0]);
    }
}
