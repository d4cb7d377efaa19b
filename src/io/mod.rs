//! File I/O for survey inputs.
//!
//! This module provides readers for the static survey data (TetGen meshes,
//! receiver locations) and the `.npy` codec used for per-sample model arrays.

pub mod npy;
pub mod receivers;
pub mod tetgen;

pub use npy::read_npy_into;
pub use receivers::read_receivers;
pub use tetgen::{MeshFiles, read_tetgen};
