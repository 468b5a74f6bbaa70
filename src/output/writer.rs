//! Matrix serialization.
//!
//! Binary layout (all little-endian):
//!
//! ```text
//! magic "PVMX" | u32 version | u64 rows | u64 columns | f64 × rows·columns
//! ```
//!
//! Values are stored column after column, i.e. one feature vector at
//! a time.

use super::OutputError;
use crate::assembly::TrainingMatrix;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::io::{BufWriter, Read, Write};
use std::path::Path;

const BINARY_MAGIC: &[u8; 4] = b"PVMX";
const BINARY_VERSION: u32 = 1;
/// Magic, version, rows and columns.
const HEADER_LEN: u64 = 4 + 4 + 8 + 8;

/// Matrix file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MatrixFormat {
    /// One line per matrix row, comma separated.
    #[default]
    Csv,
    /// Packed little-endian f64 with a small header.
    Binary,
}

/// Writes a complete matrix to `path` in the given format.
pub fn write_matrix(
    matrix: &TrainingMatrix,
    path: &Path,
    format: MatrixFormat,
) -> Result<(), OutputError> {
    matrix.ensure_complete()?;

    let file = std::fs::File::create(path).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut out = BufWriter::new(file);

    let result = match format {
        MatrixFormat::Csv => write_csv(matrix, &mut out),
        MatrixFormat::Binary => write_binary(matrix, &mut out),
    }
    .and_then(|()| out.flush());

    result.map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!(
        path = %path.display(),
        ?format,
        rows = matrix.rows(),
        columns = matrix.columns(),
        "Wrote training matrix"
    );
    Ok(())
}

fn write_csv(matrix: &TrainingMatrix, out: &mut impl Write) -> std::io::Result<()> {
    for row in matrix.view().rows() {
        let mut first = true;
        for value in row.iter() {
            if !first {
                out.write_all(b",")?;
            }
            write!(out, "{value}")?;
            first = false;
        }
        out.write_all(b"\n")?;
    }
    Ok(())
}

fn write_binary(matrix: &TrainingMatrix, out: &mut impl Write) -> std::io::Result<()> {
    out.write_all(BINARY_MAGIC)?;
    out.write_all(&BINARY_VERSION.to_le_bytes())?;
    out.write_all(&(matrix.rows() as u64).to_le_bytes())?;
    out.write_all(&(matrix.columns() as u64).to_le_bytes())?;
    for column in matrix.view().columns() {
        for value in column.iter() {
            out.write_all(&value.to_le_bytes())?;
        }
    }
    Ok(())
}

fn read_u64(input: &mut impl Read) -> std::io::Result<u64> {
    let mut buf = [0u8; 8];
    input.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Reads a matrix written in the binary format.
pub fn read_binary(path: &Path) -> Result<Array2<f64>, OutputError> {
    let io_err = |source: std::io::Error| OutputError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = std::fs::File::open(path).map_err(io_err)?;
    let file_len = file.metadata().map_err(io_err)?.len();
    let mut input = std::io::BufReader::new(file);

    let mut magic = [0u8; 4];
    input.read_exact(&mut magic).map_err(io_err)?;
    let mut version = [0u8; 4];
    input.read_exact(&mut version).map_err(io_err)?;
    if &magic != BINARY_MAGIC || u32::from_le_bytes(version) != BINARY_VERSION {
        return Err(OutputError::BadHeader(path.to_path_buf()));
    }

    let rows = read_u64(&mut input).map_err(io_err)?;
    let columns = read_u64(&mut input).map_err(io_err)?;

    // The header must describe exactly the payload that follows it.
    let bad_header = || OutputError::BadHeader(path.to_path_buf());
    let count = rows.checked_mul(columns).ok_or_else(bad_header)?;
    let payload = count.checked_mul(8).ok_or_else(bad_header)?;
    if file_len.checked_sub(HEADER_LEN) != Some(payload) {
        return Err(bad_header());
    }
    let count = usize::try_from(count).map_err(|_| bad_header())?;
    let (rows, columns) = (rows as usize, columns as usize);

    let mut values = Vec::with_capacity(count);
    let mut buf = [0u8; 8];
    for _ in 0..count {
        input.read_exact(&mut buf).map_err(io_err)?;
        values.push(f64::from_le_bytes(buf));
    }

    // Stored column after column: read as (columns, rows) and transpose.
    let transposed = Array2::from_shape_vec((columns, rows), values)
        .map_err(|_| bad_header())?;
    Ok(transposed.reversed_axes())
}
