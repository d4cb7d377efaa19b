//! TetGen mesh file reader.
//!
//! A mesh named `base` lives in two companion files inside one directory:
//! `base.1.node` with rows `<index> <x> <y> <z> [attributes...]` and
//! `base.1.ele` with rows `<index> <n1> <n2> <n3> <n4> [attributes...]`.
//! Each file starts with a header line whose first token is the row count.
//! Node references in the element file are 1-based.

use crate::Point;
use crate::error::{DatagenError, Result};
use crate::geom::mesh::{TetraMesh, TetrahedronIndex};
use std::fs;
use std::path::{Path, PathBuf};

/// Paths of the node and element files of a TetGen mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshFiles {
    pub node: PathBuf,
    pub ele: PathBuf,
}

impl MeshFiles {
    pub fn new(dir: &Path, base_name: &str) -> Self {
        Self {
            node: dir.join(format!("{base_name}.1.node")),
            ele: dir.join(format!("{base_name}.1.ele")),
        }
    }
}

/// Reads a tetrahedral mesh from `dir/base_name.1.node` and `dir/base_name.1.ele`.
///
/// Both files must exist before anything is parsed. Node references are
/// converted to 0-based indices and checked against the node count.
pub fn read_tetgen(dir: &Path, base_name: &str) -> Result<TetraMesh> {
    let files = MeshFiles::new(dir, base_name);
    for path in [&files.node, &files.ele] {
        if !path.is_file() {
            return Err(DatagenError::FileNotFound { path: path.clone() });
        }
    }

    let nodes = read_nodes(&files.node)?;
    let cells = read_elements(&files.ele)?;

    TetraMesh::new(nodes, cells)
        .map_err(|e| DatagenError::malformed_mesh(&files.ele, e.to_string()))
}

/// Reads node coordinates from a `.node` file.
pub fn read_nodes(path: &Path) -> Result<Vec<Point>> {
    let content = fs::read_to_string(path).map_err(|e| DatagenError::io(path, e))?;
    let rows = counted_rows(path, &content)?;

    rows.into_iter()
        .map(|(line_no, fields)| {
            if fields.len() < 4 {
                return Err(DatagenError::malformed_mesh(
                    path,
                    format!("line {line_no}: expected 4 columns, found {}", fields.len()),
                ));
            }
            let mut coords = [0.0; 3];
            for (c, field) in coords.iter_mut().zip(&fields[1..4]) {
                *c = field.parse::<f64>().map_err(|_| {
                    let reason = format!("line {line_no}: invalid coordinate `{field}`");
                    DatagenError::malformed_mesh(path, reason)
                })?;
            }
            Ok(Point::from(coords))
        })
        .collect()
}

/// Reads tetrahedra from an `.ele` file, converting node references to 0-based.
pub fn read_elements(path: &Path) -> Result<Vec<TetrahedronIndex>> {
    let content = fs::read_to_string(path).map_err(|e| DatagenError::io(path, e))?;
    let rows = counted_rows(path, &content)?;

    rows.into_iter()
        .map(|(line_no, fields)| {
            if fields.len() < 5 {
                return Err(DatagenError::malformed_mesh(
                    path,
                    format!("line {line_no}: expected 5 columns, found {}", fields.len()),
                ));
            }
            let mut n = [0usize; 4];
            for (slot, field) in n.iter_mut().zip(&fields[1..5]) {
                let one_based: i64 = field.parse().map_err(|_| {
                    let reason = format!("line {line_no}: invalid node reference `{field}`");
                    DatagenError::malformed_mesh(path, reason)
                })?;
                if one_based < 1 {
                    return Err(DatagenError::malformed_mesh(
                        path,
                        format!("line {line_no}: node reference {one_based} is not 1-based"),
                    ));
                }
                *slot = (one_based - 1) as usize;
            }
            Ok(TetrahedronIndex(n[0], n[1], n[2], n[3]))
        })
        .collect()
}

/// Splits the content into the header count and exactly that many data rows.
///
/// Blank lines and `#` comments are skipped. Rows after the counted ones are ignored.
fn counted_rows<'a>(path: &Path, content: &'a str) -> Result<Vec<(usize, Vec<&'a str>)>> {
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.split('#').next().unwrap_or("").trim()))
        .filter(|(_, line)| !line.is_empty());

    let (_, header) = lines
        .next()
        .ok_or_else(|| DatagenError::malformed_mesh(path, "missing header line"))?;
    let first = header.split_whitespace().next().unwrap_or("");
    let count: usize = first.parse().map_err(|_| {
        DatagenError::malformed_mesh(path, format!("invalid count `{first}` in header"))
    })?;

    let rows: Vec<(usize, Vec<&str>)> = lines
        .take(count)
        .map(|(line_no, line)| (line_no, line.split_whitespace().collect()))
        .collect();
    if rows.len() != count {
        return Err(DatagenError::malformed_mesh(
            path,
            format!("header declares {count} rows, found {}", rows.len()),
        ));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const NODES: &str = "\
5  3  0  0
# node list
   1    0.0  0.0  0.0
   2    1.0  0.0  0.0
   3    0.0  1.0  0.0
   4    0.0  0.0  1.0
   5    1.0  1.0  1.0
";

    const ELEMENTS: &str = "\
2  4  1
   1     1  2  3  4   7
   2     2  3  4  5   7
";

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_read_tetgen() -> anyhow::Result<()> {
        let dir = tempdir()?;
        write(dir.path(), "survey.1.node", NODES);
        write(dir.path(), "survey.1.ele", ELEMENTS);

        let mesh = read_tetgen(dir.path(), "survey")?;
        assert_eq!(mesh.node_count(), 5);
        assert_eq!(mesh.cell_count(), 2);
        assert_eq!(mesh.cells()[0], TetrahedronIndex(0, 1, 2, 3));
        assert_eq!(mesh.cells()[1], TetrahedronIndex(1, 2, 3, 4));
        assert_eq!(mesh.nodes()[4], Point::new(1., 1., 1.));
        for t in mesh.cells() {
            assert!(t.nodes().iter().all(|&n| n < mesh.node_count()));
        }
        Ok(())
    }

    #[test]
    fn test_rows_beyond_count_are_ignored() -> anyhow::Result<()> {
        let dir = tempdir()?;
        write(dir.path(), "m.1.node", &format!("{NODES}   6  9.0 9.0 9.0\n"));
        write(dir.path(), "m.1.ele", ELEMENTS);
        let mesh = read_tetgen(dir.path(), "m")?;
        assert_eq!(mesh.node_count(), 5);
        Ok(())
    }

    #[test]
    fn test_missing_element_file() {
        let dir = tempdir().unwrap();
        write(dir.path(), "m.1.node", NODES);
        let err = read_tetgen(dir.path(), "m").unwrap_err();
        match err {
            DatagenError::FileNotFound { path } => assert!(path.ends_with("m.1.ele")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_node_file() {
        let dir = tempdir().unwrap();
        write(dir.path(), "m.1.ele", ELEMENTS);
        let err = read_tetgen(dir.path(), "m").unwrap_err();
        assert!(matches!(err, DatagenError::FileNotFound { .. }));
    }

    #[test]
    fn test_out_of_bounds_reference() {
        let dir = tempdir().unwrap();
        write(dir.path(), "m.1.node", NODES);
        write(dir.path(), "m.1.ele", "1 4 0\n1 1 2 3 6\n");
        let err = read_tetgen(dir.path(), "m").unwrap_err();
        assert!(matches!(err, DatagenError::MalformedMesh { .. }));
        assert!(err.to_string().contains("node 5"));
    }

    #[test]
    fn test_zero_reference_is_rejected() {
        let dir = tempdir().unwrap();
        write(dir.path(), "m.1.node", NODES);
        write(dir.path(), "m.1.ele", "1 4 0\n1 0 1 2 3\n");
        let err = read_tetgen(dir.path(), "m").unwrap_err();
        assert!(err.to_string().contains("not 1-based"));
    }

    #[test]
    fn test_short_file() {
        let dir = tempdir().unwrap();
        write(dir.path(), "m.1.node", "3 3 0 0\n1 0 0 0\n2 1 0 0\n");
        write(dir.path(), "m.1.ele", ELEMENTS);
        let err = read_tetgen(dir.path(), "m").unwrap_err();
        assert!(err.to_string().contains("declares 3 rows, found 2"));
    }

    #[test]
    fn test_invalid_coordinate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.1.node");
        fs::write(&path, "1 3 0 0\n1 0.0 abc 0.0\n").unwrap();
        let err = read_nodes(&path).unwrap_err();
        assert!(matches!(err, DatagenError::MalformedMesh { .. }));
        assert!(err.to_string().contains("abc"));
    }
}
