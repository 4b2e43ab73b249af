// SPDX-License-Identifier: GPL-2.0-or-later
//
// This module defines structured errors for the Rust port of the SuiteSparse
// UMFPACK symbolic analysis.

use crate::matrix::error::CscError;

#[derive(Debug, thiserror::Error)]
pub enum SymbolicError {
    // --- Input validation ---
    #[error("required argument missing or too short: {context}")]
    ArgumentMissing { context: &'static str },

    #[error("matrix dimensions must be positive (n_row={n_row}, n_col={n_col})")]
    NRowNColNonPositive { n_row: usize, n_col: usize },

    #[error("invalid matrix: {0}")]
    InvalidMatrix(#[from] CscError),

    #[error("user column permutation is not a permutation of 0..{n_col}")]
    InvalidPermutation { n_col: usize },

    // --- Resources ---
    #[error("workspace of {units} units exceeds the addressable integer range")]
    OutOfMemory { units: f64 },

    // --- Collaborators ---
    #[error("fill-reducing ordering failed: {context}")]
    OrderingFailed { context: &'static str },

    // --- Should not happen ---
    #[error("internal error: {context}")]
    InternalError { context: &'static str },
}

pub type SymbolicResult<T> = Result<T, SymbolicError>;
