//! Tetrahedral subsurface mesh.

use crate::Point;
use crate::error::CellIndexError;

/// A tetrahedron defined by four 0-based node indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TetrahedronIndex(pub usize, pub usize, pub usize, pub usize);

impl TetrahedronIndex {
    /// Returns the node indices as an array.
    pub fn nodes(&self) -> [usize; 4] {
        [self.0, self.1, self.2, self.3]
    }

    /// Returns true if the same node is referenced more than once.
    pub fn has_repeated_node(&self) -> bool {
        let n = self.nodes();
        (0..4).any(|i| (i + 1..4).any(|j| n[i] == n[j]))
    }
}

/// Nodes and tetrahedral cells of a subsurface mesh.
///
/// Every cell index is guaranteed to lie in `[0, node_count)`.
/// The mesh is immutable once constructed.
#[derive(Debug, Clone)]
pub struct TetraMesh {
    nodes: Vec<Point>,
    cells: Vec<TetrahedronIndex>,
}

impl TetraMesh {
    /// Creates a mesh, checking that every cell references existing nodes.
    pub fn new(nodes: Vec<Point>, cells: Vec<TetrahedronIndex>) -> Result<Self, CellIndexError> {
        let node_count = nodes.len();
        for (cell, tet) in cells.iter().enumerate() {
            if let Some(&node) = tet.nodes().iter().find(|&&n| n >= node_count) {
                return Err(CellIndexError {
                    cell,
                    node,
                    node_count,
                });
            }
        }
        Ok(Self { nodes, cells })
    }

    pub fn nodes(&self) -> &[Point] {
        &self.nodes
    }

    pub fn cells(&self) -> &[TetrahedronIndex] {
        &self.cells
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Returns the four vertex coordinates of cell `cell`.
    pub fn cell_points(&self, cell: usize) -> [Point; 4] {
        let t = self.cells[cell];
        [
            self.nodes[t.0],
            self.nodes[t.1],
            self.nodes[t.2],
            self.nodes[t.3],
        ]
    }

    /// Returns the indices of cells that reference a node more than once.
    pub fn cells_with_repeated_nodes(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, t)| t.has_repeated_node())
            .map(|(i, _)| i)
            .collect()
    }
}
