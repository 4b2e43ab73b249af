// SPDX-License-Identifier: GPL-2.0-or-later
//
// This file is based on the SuiteSparse UMFPACK implementation by
// Timothy A. Davis.
//
// UMFPACK, Copyright (c) 1995-2024, Timothy A. Davis.  All Rights Reserved.
//
// Modifications/porting for this project:
// Copyright (c) 2025 Ido Ben Amram

use crate::symbolic::{OrderingUsed, Strategy};

/// Statistics produced by the symbolic analysis.
///
/// In the original UMFPACK these live in the fixed-arity `Info [UMFPACK_*]`
/// double vector. For this Rust port we keep them as named fields on a
/// struct owned by the `Symbolic` object, the same move the KLU port makes
/// for `KLU_common`. Floating-point statistics use `-1.0` as "not
/// computed", matching the original sentinel.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnalyzeInfo {
    pub n_row: usize,
    pub n_col: usize,
    pub nz: usize,

    /// row singletons (pivot rows of degree 1 at elimination)
    pub nrow_singletons: usize,
    /// column singletons (including 1-by-1 residual blocks)
    pub ncol_singletons: usize,
    pub nempty_row: usize,
    pub nempty_col: usize,
    /// size of the square part the strategy decision looks at
    pub n2: usize,

    /// fraction of symmetric entries in the pruned pattern, -1 if skipped
    pub symmetry: f64,
    /// structurally (and, with values, numerically) nonzero diagonal
    /// entries of the pruned matrix, -1 if skipped
    pub nzdiag: f64,
    /// off-diagonal nonzeros in the pattern of S + S^T, -1 if skipped
    pub nz_aat: f64,
    pub ndense_row: f64,
    pub ndense_col: f64,

    pub strategy_used: Strategy,
    pub ordering_used: OrderingUsed,
    pub qfixed: bool,
    pub diag_preferred: bool,

    /// peak workspace of the analysis itself, in Units
    pub symbolic_peak_memory: f64,
    /// size of the Symbolic object, in Units
    pub symbolic_size: f64,
    /// wall-clock analysis time, seconds
    pub symbolic_walltime: f64,

    // symmetric-strategy ordering statistics (from the AMD-style backend)
    pub symmetric_lunz: f64,
    pub symmetric_flops: f64,
    pub symmetric_dmax: f64,
    pub symmetric_ndense: f64,

    // projections for the numeric phase, in Units / counts / flops
    pub num_mem_init_usage: f64,
    pub num_mem_size_est: f64,
    pub num_mem_usage_est: f64,
    pub lnz_estimate: f64,
    pub unz_estimate: f64,
    pub flops_estimate: f64,
    pub max_front_rows: f64,
    pub max_front_cols: f64,
}

impl Default for AnalyzeInfo {
    fn default() -> Self {
        Self {
            n_row: 0,
            n_col: 0,
            nz: 0,
            nrow_singletons: 0,
            ncol_singletons: 0,
            nempty_row: 0,
            nempty_col: 0,
            n2: 0,
            symmetry: -1.0,
            nzdiag: -1.0,
            nz_aat: -1.0,
            ndense_row: -1.0,
            ndense_col: -1.0,
            strategy_used: Strategy::Auto,
            ordering_used: OrderingUsed::None,
            qfixed: false,
            diag_preferred: false,
            symbolic_peak_memory: -1.0,
            symbolic_size: -1.0,
            symbolic_walltime: -1.0,
            symmetric_lunz: -1.0,
            symmetric_flops: -1.0,
            symmetric_dmax: -1.0,
            symmetric_ndense: -1.0,
            num_mem_init_usage: -1.0,
            num_mem_size_est: -1.0,
            num_mem_usage_est: -1.0,
            lnz_estimate: -1.0,
            unz_estimate: -1.0,
            flops_estimate: -1.0,
            max_front_rows: -1.0,
            max_front_cols: -1.0,
        }
    }
}
