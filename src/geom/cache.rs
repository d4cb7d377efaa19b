//! Per-cell geometry derived once from a [`TetraMesh`].

use rayon::prelude::*;

use crate::Point;
use crate::geom::mesh::TetraMesh;
use crate::geom::tetrahedron::{tetrahedron_centroid, tetrahedron_volume};

/// Centroid and volume of every mesh cell, aligned with [`TetraMesh::cells`].
#[derive(Debug, Clone)]
pub struct GeometryCache {
    centroids: Vec<Point>,
    volumes: Vec<f64>,
}

impl GeometryCache {
    /// Computes centroids and unsigned volumes for all cells in parallel.
    ///
    /// Degenerate cells get a zero volume instead of an error.
    pub fn from_mesh(mesh: &TetraMesh) -> Self {
        let (centroids, volumes): (Vec<Point>, Vec<f64>) = (0..mesh.cell_count())
            .into_par_iter()
            .map(|cell| {
                let [p0, p1, p2, p3] = mesh.cell_points(cell);
                (
                    tetrahedron_centroid(p0, p1, p2, p3),
                    tetrahedron_volume(p0, p1, p2, p3),
                )
            })
            .unzip();
        Self { centroids, volumes }
    }

    pub fn centroids(&self) -> &[Point] {
        &self.centroids
    }

    pub fn volumes(&self) -> &[f64] {
        &self.volumes
    }

    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    /// Sum of all cell volumes.
    pub fn total_volume(&self) -> f64 {
        self.volumes.iter().sum()
    }

    /// Returns the indices of cells with zero volume.
    pub fn zero_volume_cells(&self) -> Vec<usize> {
        self.volumes
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v == 0.0)
            .map(|(i, _)| i)
            .collect()
    }
}
