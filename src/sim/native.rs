//! Field kernel backed by a shared library with a C ABI.
//!
//! The library exports one function (default name `calc_and_mig_field`):
//!
//! ```text
//! int32_t calc_and_mig_field(
//!     const float *sus, int32_t ismag, int32_t istensor,
//!     const float *kx, const float *ky, const float *kz,
//!     float lx, float ly, float lz,
//!     const float *nodes, int32_t n_nodes,
//!     const int32_t *cells, int32_t n_cells,
//!     const float *receivers, int32_t n_receivers,
//!     const float *centroids, const float *volumes,
//!     float *out);
//! ```
//!
//! Nodes, receivers and centroids are packed `xyz` triples, cells are packed
//! 1-based node index quadruples and `out` has room for `n_cells` values.
//! A return value of 0 means success.

use std::ffi::c_int;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail, ensure};
use libloading::{Library, Symbol};
use tracing::debug;

use crate::Point;
use crate::sim::kernel::{FieldKernel, KernelInput};
use crate::sim::survey::SurveyContext;

type CalcAndMigFn = unsafe extern "C" fn(
    *const f32,
    c_int,
    c_int,
    *const f32,
    *const f32,
    *const f32,
    f32,
    f32,
    f32,
    *const f32,
    c_int,
    *const c_int,
    c_int,
    *const f32,
    c_int,
    *const f32,
    *const f32,
    *mut f32,
) -> c_int;

/// Static survey geometry in the kernel's native layout.
struct NativeGeometry {
    nodes: Vec<f32>,
    cells: Vec<c_int>,
    receivers: Vec<f32>,
    centroids: Vec<f32>,
    volumes: Vec<f32>,
    n_nodes: c_int,
    n_cells: c_int,
    n_receivers: c_int,
}

impl NativeGeometry {
    fn new(context: &SurveyContext<'_>) -> Result<Self> {
        let mesh = context.mesh;
        let n_nodes = to_c_int(mesh.node_count(), "nodes")?;
        let n_cells = to_c_int(mesh.cell_count(), "cells")?;
        let n_receivers = to_c_int(context.receivers.len(), "receivers")?;

        let mut cells = Vec::with_capacity(mesh.cell_count() * 4);
        for cell in mesh.cells() {
            for node in cell.nodes() {
                cells.push(to_c_int(node + 1, "node index")?);
            }
        }

        Ok(Self {
            nodes: pack_points(mesh.nodes()),
            cells,
            receivers: pack_points(context.receivers.points()),
            centroids: pack_points(context.geometry.centroids()),
            volumes: context.geometry.volumes().iter().map(|&v| v as f32).collect(),
            n_nodes,
            n_cells,
            n_receivers,
        })
    }
}

fn to_c_int(n: usize, what: &str) -> Result<c_int> {
    c_int::try_from(n).with_context(|| format!("too many {what} for the native kernel: {n}"))
}

fn pack_points(points: &[Point]) -> Vec<f32> {
    points
        .iter()
        .flat_map(|p| [p.x as f32, p.y as f32, p.z as f32])
        .collect()
}

fn to_f32(values: &[f64]) -> Vec<f32> {
    values.iter().map(|&v| v as f32).collect()
}

/// Kernel loaded from a shared library.
///
/// The geometry is converted once, at load time, and must belong to the
/// survey the kernel is later used with.
pub struct NativeKernel {
    name: String,
    func: CalcAndMigFn,
    geometry: NativeGeometry,
    // Keeps `func` valid
    _library: Library,
}

impl NativeKernel {
    pub fn load(path: &Path, symbol: &str, context: &SurveyContext<'_>) -> Result<Self> {
        let library = unsafe { Library::new(path) }
            .with_context(|| format!("Failed to load kernel library {}", path.display()))?;
        let func = {
            let sym: Symbol<CalcAndMigFn> = unsafe { library.get(symbol.as_bytes()) }
                .with_context(|| {
                    format!("Symbol `{symbol}` not found in {}", path.display())
                })?;
            *sym
        };
        let geometry = NativeGeometry::new(context)?;
        debug!(
            library = %path.display(),
            symbol,
            cells = geometry.n_cells,
            "native kernel loaded"
        );

        Ok(Self {
            name: format!("{}:{symbol}", library_stem(path).display()),
            func,
            geometry,
            _library: library,
        })
    }
}

fn library_stem(path: &Path) -> PathBuf {
    path.file_stem()
        .map(PathBuf::from)
        .unwrap_or_else(|| path.to_path_buf())
}

impl FieldKernel for NativeKernel {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute_and_migrate(&self, input: &KernelInput<'_>) -> Result<Vec<f64>> {
        let geometry = &self.geometry;
        let n_cells = input.cell_count();
        ensure!(
            n_cells == geometry.n_cells as usize
                && input.receiver_count() == geometry.n_receivers as usize,
            "input has {n_cells} cells and {} receivers, kernel was built for {} and {}",
            input.receiver_count(),
            geometry.n_cells,
            geometry.n_receivers
        );
        for (name, values) in [
            ("susceptibility", input.susceptibility),
            ("kx", input.kx),
            ("ky", input.ky),
            ("kz", input.kz),
        ] {
            ensure!(
                values.len() == n_cells,
                "{name} has {} values for {n_cells} cells",
                values.len()
            );
        }

        let sus = to_f32(input.susceptibility);
        let kx = to_f32(input.kx);
        let ky = to_f32(input.ky);
        let kz = to_f32(input.kz);
        let [lx, ly, lz] = input.direction;
        let mut out = vec![0.0f32; n_cells];

        // All arrays match the counts passed alongside them
        let status = unsafe {
            (self.func)(
                sus.as_ptr(),
                c_int::from(input.flags.magnetic),
                c_int::from(input.flags.tensor),
                kx.as_ptr(),
                ky.as_ptr(),
                kz.as_ptr(),
                lx as f32,
                ly as f32,
                lz as f32,
                geometry.nodes.as_ptr(),
                geometry.n_nodes,
                geometry.cells.as_ptr(),
                geometry.n_cells,
                geometry.receivers.as_ptr(),
                geometry.n_receivers,
                geometry.centroids.as_ptr(),
                geometry.volumes.as_ptr(),
                out.as_mut_ptr(),
            )
        };
        if status != 0 {
            bail!("native kernel returned status {status}");
        }
        Ok(out.into_iter().map(f64::from).collect())
    }
}
