use anyhow::Result;

use crate::Point;
use crate::geom::mesh::TetrahedronIndex;

/// Mode flags forwarded to the kernel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KernelFlags {
    /// Magnetic mode: susceptibility has been scaled by the field magnitude.
    pub magnetic: bool,
    /// Tensor mode.
    pub tensor: bool,
}

/// Everything the kernel sees for one sample.
///
/// Per-cell slices (`susceptibility`, `kx`, `ky`, `kz`, `centroids`, `volumes`)
/// all have length [`KernelInput::cell_count`].
#[derive(Debug, Clone, Copy)]
pub struct KernelInput<'a> {
    pub sample: usize,
    pub susceptibility: &'a [f64],
    pub kx: &'a [f64],
    pub ky: &'a [f64],
    pub kz: &'a [f64],
    pub flags: KernelFlags,
    /// Ambient field direction cosines `(lx, ly, lz)`.
    pub direction: [f64; 3],
    pub nodes: &'a [Point],
    pub cells: &'a [TetrahedronIndex],
    pub receivers: &'a [Point],
    pub centroids: &'a [Point],
    pub volumes: &'a [f64],
}

impl KernelInput<'_> {
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn receiver_count(&self) -> usize {
        self.receivers.len()
    }
}

/// Field computation and migration capability.
///
/// Given the physical properties of one sample and the static survey
/// geometry, returns one migrated field value per cell. Implementations may
/// return a longer buffer; only the first `cell_count` values are used.
///
/// The kernel is shared by all batch workers, hence `Sync`.
pub trait FieldKernel: Sync {
    /// Human-readable identifier for logs and errors.
    fn name(&self) -> &str;

    fn compute_and_migrate(&self, input: &KernelInput<'_>) -> Result<Vec<f64>>;
}
