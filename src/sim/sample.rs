//! Per-sample model property loading.

use std::path::PathBuf;

use crate::error::{DatagenError, Result};
use crate::io::npy::read_npy_into;

use super::buffers::SampleBuffers;

/// Source of per-sample physical property arrays.
///
/// Implementations fill all four arrays of `buffers` for sample `index`,
/// failing with [`DatagenError::ShapeMismatch`] when a stored array does not
/// have one value per cell. Loaders are shared by all batch workers.
pub trait SampleLoader: Sync {
    fn load_into(&self, index: usize, buffers: &mut SampleBuffers) -> Result<()>;
}

/// Loads `prefix + index + "." + extension` files from a model directory.
#[derive(Debug, Clone)]
pub struct NpySampleLoader {
    pub dir: PathBuf,
    pub sus_prefix: String,
    pub kx_prefix: String,
    pub ky_prefix: String,
    pub kz_prefix: String,
    pub extension: String,
}

impl NpySampleLoader {
    /// Returns the susceptibility, kx, ky and kz file paths of sample `index`.
    pub fn paths(&self, index: usize) -> [PathBuf; 4] {
        [
            &self.sus_prefix,
            &self.kx_prefix,
            &self.ky_prefix,
            &self.kz_prefix,
        ]
        .map(|prefix| self.dir.join(format!("{prefix}{index}.{}", self.extension)))
    }
}

impl SampleLoader for NpySampleLoader {
    fn load_into(&self, index: usize, buffers: &mut SampleBuffers) -> Result<()> {
        let [sus, kx, ky, kz] = self.paths(index);

        // All four files must exist before any buffer is touched
        if let Some(missing) = [&sus, &kx, &ky, &kz].into_iter().find(|p| !p.is_file()) {
            return Err(DatagenError::FileNotFound {
                path: missing.clone(),
            });
        }

        read_npy_into(&sus, &mut buffers.susceptibility)?;
        read_npy_into(&kx, &mut buffers.kx)?;
        read_npy_into(&ky, &mut buffers.ky)?;
        read_npy_into(&kz, &mut buffers.kz)?;
        tracing::trace!(sample = index, "loaded model properties");
        Ok(())
    }
}
