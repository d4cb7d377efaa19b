//! Error types for mesh ingestion, sample loading and batch execution.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors produced by the dataset generation pipeline.
///
/// Setup failures (mesh, receivers, configuration, ambient field) abort the
/// whole run. Sample failures can be isolated to the sample that raised them,
/// see [`DatagenError::is_sample_error`].
#[derive(Debug, Error)]
pub enum DatagenError {
    /// A required input file or directory does not exist.
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Reading an existing file failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Mesh node/element file violates the expected layout or index bounds.
    #[error("malformed mesh {}: {reason}", path.display())]
    MalformedMesh { path: PathBuf, reason: String },

    /// Receiver or sample file could not be parsed.
    #[error("malformed input {}: {reason}", path.display())]
    MalformedInput { path: PathBuf, reason: String },

    /// A per-cell array does not have one value per mesh cell.
    #[error(
        "shape mismatch in {}: expected {expected} values, found {actual}",
        path.display()
    )]
    ShapeMismatch {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    /// The ambient field vector has zero (or non-finite) magnitude.
    #[error("degenerate ambient field ({bx}, {by}, {bz}): direction is undefined")]
    DegenerateField { bx: f64, by: f64, bz: f64 },

    /// The configuration file is unreadable or inconsistent.
    #[error("invalid configuration {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    /// The field kernel rejected or failed a sample.
    #[error("kernel `{kernel}` failed on sample {sample}: {reason}")]
    Kernel {
        kernel: String,
        sample: usize,
        reason: String,
    },

    /// The batch worker pool could not be started.
    #[error("failed to start {workers} batch workers: {reason}")]
    WorkerPool { workers: usize, reason: String },
}

/// A specialized `Result` type for pipeline operations.
pub type Result<T> = std::result::Result<T, DatagenError>;

impl DatagenError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub(crate) fn malformed_mesh(path: &Path, reason: impl Into<String>) -> Self {
        Self::MalformedMesh {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed_input(path: &Path, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for error kinds the batch can confine to one sample.
    ///
    /// File, shape and kernel failures qualify. Mesh, configuration, field
    /// and worker pool errors always concern the whole run.
    pub fn is_sample_error(&self) -> bool {
        matches!(
            self,
            DatagenError::FileNotFound { .. }
                | DatagenError::Io { .. }
                | DatagenError::MalformedInput { .. }
                | DatagenError::ShapeMismatch { .. }
                | DatagenError::Kernel { .. }
        )
    }
}

/// A cell references a node outside of the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cell {cell} references node {node}, but the mesh has {node_count} nodes")]
pub struct CellIndexError {
    pub cell: usize,
    pub node: usize,
    pub node_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_display() {
        let err = DatagenError::ShapeMismatch {
            path: PathBuf::from("models/sus_3.npy"),
            expected: 120,
            actual: 119,
        };
        let msg = err.to_string();
        assert!(msg.contains("models/sus_3.npy"));
        assert!(msg.contains("expected 120"));
        assert!(msg.contains("found 119"));
    }

    #[test]
    fn test_not_found_io_maps_to_file_not_found() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = DatagenError::io(Path::new("mesh/a.1.node"), source);
        assert!(matches!(err, DatagenError::FileNotFound { .. }));
        assert!(err.to_string().contains("mesh/a.1.node"));
    }

    #[test]
    fn test_is_sample_error() {
        let kernel = DatagenError::Kernel {
            kernel: "mock".to_string(),
            sample: 2,
            reason: "status 3".to_string(),
        };
        let field = DatagenError::DegenerateField {
            bx: 0.0,
            by: 0.0,
            bz: 0.0,
        };
        assert!(kernel.is_sample_error());
        assert!(!field.is_sample_error());
        let pool = DatagenError::WorkerPool {
            workers: 4,
            reason: "no threads".to_string(),
        };
        assert!(!pool.is_sample_error());
    }

    #[test]
    fn test_cell_index_error_display() {
        let err = CellIndexError {
            cell: 4,
            node: 10,
            node_count: 10,
        };
        assert_eq!(
            err.to_string(),
            "cell 4 references node 10, but the mesh has 10 nodes"
        );
    }
}
