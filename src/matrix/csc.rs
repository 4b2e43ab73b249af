use crate::matrix::{Dim, error::CscError};

/// Compressed Sparse Column matrix
/// - column pointers are the indices of the start and end of each column
/// - row indices are the indices of the rows of the non zero values
/// - values are the non zero values
#[derive(Debug, Clone)]
pub struct CscMatrix {
    pub dim: Dim,
    /// Column pointers, len = ncols + 1
    pub column_pointers: Vec<usize>,
    /// Row indices, len = nnz
    pub row_indices: Vec<usize>,
    /// Nonzero values, len = nnz
    pub values: Vec<f64>,
}

/// Borrowed pattern-only view of a CSC matrix. The analysis passes work on
/// this view so callers can hand in pattern arrays without owning a
/// `CscMatrix`.
#[derive(Debug, Clone, Copy)]
pub struct CscPointers<'a> {
    pub dim: Dim,
    column_pointers: &'a [usize],
    row_indices: &'a [usize],
}

impl<'a> CscPointers<'a> {
    pub fn new(dim: Dim, column_pointers: &'a [usize], row_indices: &'a [usize]) -> Self {
        Self {
            dim,
            column_pointers,
            row_indices,
        }
    }

    pub fn nnz(&self) -> usize {
        self.row_indices.len()
    }

    pub fn col_start(&self, j: usize) -> usize {
        self.column_pointers[j]
    }

    pub fn col_end(&self, j: usize) -> usize {
        self.column_pointers[j + 1]
    }

    pub fn row_index(&self, p: usize) -> usize {
        self.row_indices[p]
    }

    /// Row indices of column j
    pub fn col(&self, j: usize) -> &'a [usize] {
        &self.row_indices[self.column_pointers[j]..self.column_pointers[j + 1]]
    }

    pub fn col_degree(&self, j: usize) -> usize {
        self.column_pointers[j + 1] - self.column_pointers[j]
    }

    pub fn column_pointers(&self) -> &'a [usize] {
        self.column_pointers
    }

    pub fn row_indices(&self) -> &'a [usize] {
        self.row_indices
    }

    /// Structural checks the analysis entry points rely on: pointer array
    /// shape, monotone pointers, in-range and strictly increasing row
    /// indices per column (strictness also rules out duplicates).
    pub fn check_invariants(&self) -> Result<(), CscError> {
        if self.column_pointers.len() != self.dim.ncols + 1 {
            return Err(CscError::InvalidColumnPointersLength {
                expected: self.dim.ncols + 1,
                actual: self.column_pointers.len(),
            });
        }
        if *self.column_pointers.first().unwrap_or(&1) != 0 {
            return Err(CscError::InvalidColumnPointers {
                index: 0,
                expected: 0,
                actual: *self.column_pointers.first().unwrap_or(&1),
            });
        }
        if *self.column_pointers.last().unwrap() != self.nnz() {
            return Err(CscError::InvalidColumnPointers {
                index: self.dim.ncols,
                expected: self.nnz(),
                actual: *self.column_pointers.last().unwrap(),
            });
        }
        for j in 0..self.dim.ncols {
            let (start, end) = (self.column_pointers[j], self.column_pointers[j + 1]);
            if start > end || end > self.nnz() {
                return Err(CscError::InvalidColumnPointers {
                    index: j,
                    expected: start,
                    actual: end,
                });
            }
            let mut prev = None;
            for &r in &self.row_indices[start..end] {
                if r >= self.dim.nrows {
                    return Err(CscError::OutOfBoundsIndex {
                        index: r,
                        max: self.dim.nrows,
                    });
                }
                if let Some(p) = prev {
                    if r <= p {
                        return Err(CscError::RowsNotStrictlyIncreasing {
                            index: j,
                            previous: p,
                            actual: r,
                        });
                    }
                }
                prev = Some(r);
            }
        }
        Ok(())
    }

    /// Transpose the pattern into row form. O(n + nnz) counting sort; the
    /// column indices within each row come out ascending.
    pub fn transpose_pattern(&self) -> (Vec<usize>, Vec<usize>) {
        let m = self.dim.nrows;
        let n = self.dim.ncols;
        let nnz = self.nnz();

        let mut rp = vec![0usize; m + 1];
        for &r in self.row_indices {
            rp[r + 1] += 1;
        }
        for i in 0..m {
            rp[i + 1] += rp[i];
        }

        let mut ci = vec![0usize; nnz];
        let mut next = rp.clone();
        for j in 0..n {
            for &r in self.col(j) {
                ci[next[r]] = j;
                next[r] += 1;
            }
        }
        (rp, ci)
    }
}

impl CscMatrix {
    /// number of non zero values
    pub fn nnz(&self) -> usize {
        self.row_indices.len()
    }

    pub fn is_square(&self) -> bool {
        self.dim.is_square()
    }

    pub fn pointers(&self) -> CscPointers<'_> {
        CscPointers::new(self.dim, &self.column_pointers, &self.row_indices)
    }

    pub fn check_invariants(&self) -> Result<(), CscError> {
        if self.row_indices.len() != self.values.len() {
            return Err(CscError::RowIndicesValuesLengthMismatch {
                values: self.values.len(),
                row_indices: self.row_indices.len(),
            });
        }
        self.pointers().check_invariants()
    }

    /// Return (row_indices, values) slice for column j
    pub fn col(&self, j: usize) -> (&[usize], &[f64]) {
        let (s, e) = (self.column_pointers[j], self.column_pointers[j + 1]);
        (&self.row_indices[s..e], &self.values[s..e])
    }
}
