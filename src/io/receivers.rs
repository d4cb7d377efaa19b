//! Receiver location reader.
//!
//! Receivers are stored one per row as comma-separated values. The first
//! three fields are `x, y, z`; any further columns are ignored, but every
//! row must have the same number of columns.

use crate::Point;
use crate::error::{DatagenError, Result};
use crate::geom::receivers::ReceiverSet;
use std::fs;
use std::path::Path;

/// Reads receiver coordinates from a comma-separated file.
pub fn read_receivers(path: &Path) -> Result<ReceiverSet> {
    let content = fs::read_to_string(path).map_err(|e| DatagenError::io(path, e))?;
    parse_receivers(path, &content)
}

fn parse_receivers(path: &Path, content: &str) -> Result<ReceiverSet> {
    let mut points = Vec::new();
    let mut columns: Option<usize> = None;

    for (i, line) in content.lines().enumerate() {
        let line_no = i + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let found = fields.len();
        match columns {
            None if found < 3 => {
                let reason = format!("line {line_no}: expected at least 3 columns, found {found}");
                return Err(DatagenError::malformed_input(path, reason));
            }
            None => columns = Some(found),
            Some(n) if n != found => {
                let reason = format!("line {line_no}: expected {n} columns, found {found}");
                return Err(DatagenError::malformed_input(path, reason));
            }
            Some(_) => {}
        }

        let mut values = Vec::with_capacity(fields.len());
        for field in &fields {
            let v: f64 = field.parse().map_err(|_| {
                let reason = format!("line {line_no}: invalid number `{field}`");
                DatagenError::malformed_input(path, reason)
            })?;
            values.push(v);
        }
        points.push(Point::new(values[0], values[1], values[2]));
    }

    Ok(ReceiverSet::new(points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_receivers() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("rx.csv");
        fs::write(&path, "0.0,0.0,1.5\n10.0, -2.5, 1.5\n\n1e3,2e3,3\n")?;

        let rx = read_receivers(&path)?;
        assert_eq!(rx.len(), 3);
        assert_eq!(rx.points()[1], Point::new(10.0, -2.5, 1.5));
        assert_eq!(rx.points()[2], Point::new(1000.0, 2000.0, 3.0));
        Ok(())
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let rx = parse_receivers(Path::new("rx.csv"), "1,2,3,99,100\n4,5,6,7,8\n").unwrap();
        assert_eq!(rx.len(), 2);
        assert_eq!(rx.points()[0], Point::new(1., 2., 3.));
        assert_eq!(rx.points()[1], Point::new(4., 5., 6.));
    }

    #[test]
    fn test_inconsistent_columns() {
        let err = parse_receivers(Path::new("rx.csv"), "1,2,3\n4,5,6,7\n").unwrap_err();
        assert!(matches!(err, DatagenError::MalformedInput { .. }));
        assert!(err.to_string().contains("line 2: expected 3 columns, found 4"));
    }

    #[test]
    fn test_too_few_columns() {
        let err = parse_receivers(Path::new("rx.csv"), "1,2\n").unwrap_err();
        assert!(err.to_string().contains("at least 3 columns"));
    }

    #[test]
    fn test_non_numeric_row() {
        let err = parse_receivers(Path::new("rx.csv"), "x,y,z\n1,2,3\n").unwrap_err();
        assert!(matches!(err, DatagenError::MalformedInput { .. }));
        assert!(err.to_string().contains("`x`"));
    }

    #[test]
    fn test_missing_file() {
        let err = read_receivers(Path::new("/nonexistent/rx.csv")).unwrap_err();
        assert!(matches!(err, DatagenError::FileNotFound { .. }));
    }
}
