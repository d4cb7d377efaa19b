//! NumPy `.npy` array reader.
//!
//! Model property arrays are stored as one `.npy` file per property per
//! sample. Only numeric dtypes used for those arrays are supported
//! (`f4`, `f8`, `i4`, `i8`, either byte order); values are widened to `f64`.

use crate::error::{DatagenError, Result};
use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Upper bound on the header dictionary length.
const MAX_HEADER_LEN: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endian {
    Little,
    Big,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    F4,
    F8,
    I4,
    I8,
}

/// Parsed `.npy` header.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NpyHeader {
    endian: Endian,
    kind: Kind,
    /// Element count, the product of the shape dimensions
    len: usize,
}

/// Reads an `.npy` file into `out`, which must hold exactly one slot per element.
///
/// Fails with [`DatagenError::ShapeMismatch`] when the stored element count
/// differs from `out.len()`.
pub fn read_npy_into(path: &Path, out: &mut [f64]) -> Result<()> {
    let mut reader = open(path)?;
    let header = read_header(path, &mut reader)?;
    if header.len != out.len() {
        return Err(DatagenError::ShapeMismatch {
            path: path.to_path_buf(),
            expected: out.len(),
            actual: header.len,
        });
    }
    read_values(path, &mut reader, &header, out)
}

/// Writes a flat little-endian `f8` array (format version 1.0).
#[cfg(test)]
pub(crate) fn write_npy(path: &Path, data: &[f64]) -> Result<()> {
    use byteorder::WriteBytesExt;
    use std::io::{BufWriter, Write};

    let file = File::create(path).map_err(|e| DatagenError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    let mut dict = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': ({},), }}",
        data.len()
    );
    // Magic (6) + version (2) + header length (2) + dict + '\n' is padded to 64 bytes
    let unpadded = MAGIC.len() + 4 + dict.len() + 1;
    let padding = (64 - unpadded % 64) % 64;
    dict.push_str(&" ".repeat(padding));
    dict.push('\n');

    let write = |w: &mut BufWriter<File>| -> std::io::Result<()> {
        w.write_all(MAGIC)?;
        w.write_all(&[1, 0])?;
        w.write_u16::<LittleEndian>(dict.len() as u16)?;
        w.write_all(dict.as_bytes())?;
        for &v in data {
            w.write_f64::<LittleEndian>(v)?;
        }
        w.flush()
    };
    write(&mut writer).map_err(|e| DatagenError::io(path, e))
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| DatagenError::io(path, e))?;
    Ok(BufReader::new(file))
}

/// Reads the magic string, version and header dictionary.
fn read_header<R: Read>(path: &Path, reader: &mut R) -> Result<NpyHeader> {
    let truncated = |_| DatagenError::malformed_input(path, "truncated .npy header");

    let mut magic = [0u8; 6];
    reader.read_exact(&mut magic).map_err(truncated)?;
    if &magic != MAGIC {
        return Err(DatagenError::malformed_input(path, "not a .npy file (bad magic)"));
    }

    let major = reader.read_u8().map_err(truncated)?;
    let _minor = reader.read_u8().map_err(truncated)?;
    let header_len = match major {
        1 => reader.read_u16::<LittleEndian>().map_err(truncated)? as usize,
        2 | 3 => reader.read_u32::<LittleEndian>().map_err(truncated)? as usize,
        v => {
            return Err(DatagenError::malformed_input(
                path,
                format!("unsupported .npy format version {v}"),
            ));
        }
    };

    if header_len > MAX_HEADER_LEN {
        return Err(DatagenError::malformed_input(
            path,
            format!("header length {header_len} exceeds {MAX_HEADER_LEN} bytes"),
        ));
    }
    let mut raw = vec![0u8; header_len];
    reader.read_exact(&mut raw).map_err(truncated)?;
    let dict = String::from_utf8(raw)
        .map_err(|_| DatagenError::malformed_input(path, "header is not valid text"))?;

    parse_header(&dict).map_err(|reason| DatagenError::malformed_input(path, reason))
}

fn parse_header(dict: &str) -> std::result::Result<NpyHeader, String> {
    let descr = dict_value(dict, "descr").ok_or("header has no 'descr'")?;
    let descr = descr
        .strip_prefix('\'')
        .or_else(|| descr.strip_prefix('"'))
        .and_then(|s| s.split(['\'', '"']).next())
        .ok_or("invalid 'descr' value")?;
    let (endian, kind) = parse_descr(descr)?;

    let fortran = dict_value(dict, "fortran_order").ok_or("header has no 'fortran_order'")?;
    let fortran_order = if fortran.starts_with("True") {
        true
    } else if fortran.starts_with("False") {
        false
    } else {
        return Err("invalid 'fortran_order' value".to_string());
    };

    let shape = dict_value(dict, "shape").ok_or("header has no 'shape'")?;
    let inner = shape
        .strip_prefix('(')
        .and_then(|s| s.split(')').next())
        .ok_or("invalid 'shape' value")?;
    let shape = inner
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<usize>().map_err(|_| format!("invalid dimension `{s}` in shape")))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if fortran_order && shape.iter().filter(|&&d| d > 1).count() > 1 {
        return Err("Fortran-ordered multi-dimensional arrays are not supported".to_string());
    }
    let len = shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or("shape overflows")?;

    Ok(NpyHeader { endian, kind, len })
}

/// Returns the text following `'key':` in a Python dict literal.
fn dict_value<'a>(dict: &'a str, key: &str) -> Option<&'a str> {
    let quoted = [format!("'{key}'"), format!("\"{key}\"")];
    let (pos, len) = quoted
        .iter()
        .find_map(|q| dict.find(q.as_str()).map(|p| (p, q.len())))?;
    let rest = dict[pos + len..].trim_start().strip_prefix(':')?;
    Some(rest.trim_start())
}

fn parse_descr(descr: &str) -> std::result::Result<(Endian, Kind), String> {
    let native = if cfg!(target_endian = "big") {
        Endian::Big
    } else {
        Endian::Little
    };
    let (endian, code) = match descr.as_bytes().first() {
        Some(b'<') => (Endian::Little, &descr[1..]),
        Some(b'>') => (Endian::Big, &descr[1..]),
        Some(b'=') | Some(b'|') => (native, &descr[1..]),
        _ => (native, descr),
    };
    let kind = match code {
        "f4" => Kind::F4,
        "f8" => Kind::F8,
        "i4" => Kind::I4,
        "i8" => Kind::I8,
        other => return Err(format!("unsupported dtype `{other}`")),
    };
    Ok((endian, kind))
}

fn read_values<R: Read>(
    path: &Path,
    reader: &mut R,
    header: &NpyHeader,
    out: &mut [f64],
) -> Result<()> {
    let result = match header.endian {
        Endian::Little => fill::<LittleEndian, R>(reader, header.kind, out),
        Endian::Big => fill::<BigEndian, R>(reader, header.kind, out),
    };
    result.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            DatagenError::malformed_input(
                path,
                format!("truncated data: header declares {} values", header.len),
            )
        } else {
            DatagenError::io(path, e)
        }
    })
}

fn fill<E: ByteOrder, R: Read>(reader: &mut R, kind: Kind, out: &mut [f64]) -> std::io::Result<()> {
    match kind {
        Kind::F8 => reader.read_f64_into::<E>(out)?,
        Kind::F4 => {
            for v in out.iter_mut() {
                *v = reader.read_f32::<E>()? as f64;
            }
        }
        Kind::I4 => {
            for v in out.iter_mut() {
                *v = reader.read_i32::<E>()? as f64;
            }
        }
        Kind::I8 => {
            for v in out.iter_mut() {
                *v = reader.read_i64::<E>()? as f64;
            }
        }
    }
    Ok(())
}
