//! The training matrix: one feature vector per column.
//!
//! Columns are written exactly once. Every write checks the vector
//! length against the row count, and the matrix only counts as output
//! once every column has been written.

use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut2, Axis};
use thiserror::Error;

/// Errors that can occur while filling the training matrix.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MatrixError {
    #[error("dimension mismatch: vector has {got} elements, matrix has {expected} rows")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("column {column} out of range for {columns} columns")]
    ColumnOutOfRange { column: usize, columns: usize },
    #[error("{} of {columns} columns never written{}", .missing.len(), first_missing(.missing))]
    UnfilledColumns { missing: Vec<usize>, columns: usize },
}

fn first_missing(missing: &[usize]) -> String {
    missing
        .first()
        .map(|c| format!(" (first: {c})"))
        .unwrap_or_default()
}

fn write_column(
    data: &mut ArrayViewMut2<'_, f64>,
    filled: &mut [bool],
    column: usize,
    values: ArrayView1<'_, f64>,
) -> Result<(), MatrixError> {
    let (rows, columns) = data.dim();
    if values.len() != rows {
        return Err(MatrixError::DimensionMismatch {
            expected: rows,
            got: values.len(),
        });
    }
    if column >= columns {
        return Err(MatrixError::ColumnOutOfRange { column, columns });
    }

    data.column_mut(column).assign(&values);
    filled[column] = true;
    Ok(())
}

/// Feature-length × patch-count matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingMatrix {
    data: Array2<f64>,
    filled: Vec<bool>,
}

impl TrainingMatrix {
    /// Allocates a zeroed matrix with no columns written.
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            data: Array2::zeros((rows, columns)),
            filled: vec![false; columns],
        }
    }

    /// Number of rows (feature length).
    #[inline]
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns (patches).
    #[inline]
    pub fn columns(&self) -> usize {
        self.data.ncols()
    }

    /// Writes `values` into `column`.
    pub fn set_column(&mut self, column: usize, values: ArrayView1<'_, f64>) -> Result<(), MatrixError> {
        write_column(&mut self.data.view_mut(), &mut self.filled, column, values)
    }

    /// Returns a view of one column.
    pub fn column(&self, column: usize) -> ArrayView1<'_, f64> {
        self.data.column(column)
    }

    /// Returns true if `column` has been written.
    pub fn is_filled(&self, column: usize) -> bool {
        self.filled.get(column).copied().unwrap_or(false)
    }

    /// Number of written columns.
    pub fn filled_count(&self) -> usize {
        self.filled.iter().filter(|&&f| f).count()
    }

    /// Returns true if every column has been written.
    pub fn is_complete(&self) -> bool {
        self.filled.iter().all(|&f| f)
    }

    /// Fails unless every column has been written.
    pub fn ensure_complete(&self) -> Result<(), MatrixError> {
        let missing: Vec<usize> = self
            .filled
            .iter()
            .enumerate()
            .filter(|(_, f)| !**f)
            .map(|(c, _)| c)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(MatrixError::UnfilledColumns {
                missing,
                columns: self.columns(),
            })
        }
    }

    /// Returns the underlying array.
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// Consumes the matrix, returning the array if it is complete.
    pub fn into_array(self) -> Result<Array2<f64>, MatrixError> {
        self.ensure_complete()?;
        Ok(self.data)
    }

    /// Builds a new matrix from the listed columns, in the given order.
    pub fn select_columns(&self, columns: &[usize]) -> Self {
        Self {
            data: self.data.select(Axis(1), columns),
            filled: columns.iter().map(|&c| self.is_filled(c)).collect(),
        }
    }

    /// Splits the matrix into consecutive blocks of `width` columns.
    ///
    /// Blocks borrow disjoint column ranges, so they can be filled from
    /// different threads without synchronization.
    pub fn blocks_mut(&mut self, width: usize) -> Vec<ColumnBlock<'_>> {
        let width = width.max(1);
        self.data
            .axis_chunks_iter_mut(Axis(1), width)
            .zip(self.filled.chunks_mut(width))
            .enumerate()
            .map(|(i, (data, filled))| ColumnBlock {
                first_column: i * width,
                data,
                filled,
            })
            .collect()
    }
}

/// A mutable range of consecutive matrix columns.
#[derive(Debug)]
pub struct ColumnBlock<'a> {
    first_column: usize,
    data: ArrayViewMut2<'a, f64>,
    filled: &'a mut [bool],
}

impl ColumnBlock<'_> {
    /// Matrix column index of the block's first column.
    pub fn first_column(&self) -> usize {
        self.first_column
    }

    /// Number of columns in the block.
    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    /// Number of columns of the block written so far.
    pub fn filled_count(&self) -> usize {
        self.filled.iter().filter(|&&f| f).count()
    }

    /// Writes `values` into the block's `column`-th column.
    pub fn set_column(&mut self, column: usize, values: ArrayView1<'_, f64>) -> Result<(), MatrixError> {
        write_column(&mut self.data, self.filled, column, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    #[test]
    fn test_set_column_rejects_wrong_length() {
        let mut matrix = TrainingMatrix::new(10, 4);
        let short = Array1::<f64>::zeros(9);

        assert_eq!(
            matrix.set_column(0, short.view()),
            Err(MatrixError::DimensionMismatch {
                expected: 10,
                got: 9
            })
        );
        assert!(!matrix.is_filled(0));
    }

    #[test]
    fn test_set_column_writes_values() {
        let mut matrix = TrainingMatrix::new(3, 2);
        let values = Array1::from(vec![1.0, 2.0, 3.0]);

        matrix.set_column(1, values.view()).unwrap();
        assert_eq!(matrix.column(1).to_vec(), vec![1.0, 2.0, 3.0]);
        assert_eq!(matrix.column(0).to_vec(), vec![0.0, 0.0, 0.0]);
        assert_eq!(matrix.filled_count(), 1);
        assert!(!matrix.is_complete());
    }

    #[test]
    fn test_column_out_of_range() {
        let mut matrix = TrainingMatrix::new(2, 2);
        let values = Array1::<f64>::ones(2);
        assert_eq!(
            matrix.set_column(2, values.view()),
            Err(MatrixError::ColumnOutOfRange {
                column: 2,
                columns: 2
            })
        );
    }

    #[test]
    fn test_incomplete_matrix_not_output() {
        let mut matrix = TrainingMatrix::new(2, 3);
        let values = Array1::<f64>::ones(2);
        matrix.set_column(0, values.view()).unwrap();
        matrix.set_column(2, values.view()).unwrap();

        match matrix.clone().into_array() {
            Err(MatrixError::UnfilledColumns { missing, columns }) => {
                assert_eq!(missing, vec![1]);
                assert_eq!(columns, 3);
            }
            other => panic!("expected unfilled columns, got {other:?}"),
        }

        matrix.set_column(1, values.view()).unwrap();
        assert!(matrix.into_array().is_ok());
    }

    #[test]
    fn test_blocks_map_to_matrix_columns() {
        let mut matrix = TrainingMatrix::new(2, 6);
        {
            let mut blocks = matrix.blocks_mut(3);
            assert_eq!(blocks.len(), 2);
            assert_eq!(blocks[1].first_column(), 3);
            assert_eq!(blocks[1].width(), 3);

            let values = Array1::from(vec![7.0, 8.0]);
            blocks[1].set_column(0, values.view()).unwrap();
            assert!(blocks[0].set_column(3, values.view()).is_err());
        }

        assert!(matrix.is_filled(3));
        assert_eq!(matrix.column(3).to_vec(), vec![7.0, 8.0]);
        assert_eq!(matrix.filled_count(), 1);
    }

    #[test]
    fn test_select_columns_keeps_order_and_fill_state() {
        let mut matrix = TrainingMatrix::new(1, 4);
        for c in 0..4 {
            matrix.set_column(c, Array1::from(vec![c as f64]).view()).unwrap();
        }

        let picked = matrix.select_columns(&[3, 1]);
        assert_eq!(picked.columns(), 2);
        assert_eq!(picked.column(0)[0], 3.0);
        assert_eq!(picked.column(1)[0], 1.0);
        assert!(picked.is_complete());
    }

    #[test]
    fn test_unfilled_columns_message() {
        let error = MatrixError::UnfilledColumns {
            missing: vec![4, 7],
            columns: 8,
        };
        assert_eq!(error.to_string(), "2 of 8 columns never written (first: 4)");

        let empty = MatrixError::UnfilledColumns {
            missing: Vec::new(),
            columns: 8,
        };
        assert_eq!(empty.to_string(), "0 of 8 columns never written");
    }
}
