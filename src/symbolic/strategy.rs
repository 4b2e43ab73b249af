// SPDX-License-Identifier: BSD-3-Clause
//
// The symmetry scan in this file is based on the SuiteSparse AMD
// implementation (amd_aat) by Timothy A. Davis and collaborators.
//
// AMD, Copyright (c) 1996-2022, Timothy A. Davis, Patrick R. Amestoy, and
// Iain S. Duff.  All Rights Reserved.
//
// Modifications/porting for this project:
// Copyright (c) 2025 Ido Ben Amram

use crate::matrix::csc::CscPointers;
use crate::symbolic::{FixQ, Strategy, SymbolicConfig};

/// symmetry statistics of a square pattern (the pruned matrix)
#[derive(Debug, Clone, Copy)]
pub struct SymmetryInfo {
    /// fraction of off-diagonal entries whose transpose is also present
    pub sym: f64,
    /// structurally nonzero diagonal entries
    pub nz_diagonal: usize,
    /// off-diagonal entries matched by their transpose
    pub nz_both: usize,
    /// off-diagonal entries in the pattern of A + A^T
    pub nz_aat: usize,
}

/// Scan a square pattern and report how symmetric it is, together with the
/// per-column off-diagonal lengths of A + A^T (the input the symmetric
/// ordering needs for its workspace).
///
/// The original amd_aat walks A once keeping per-column resume positions;
/// with the pattern transpose already at hand a per-column two-pointer merge
/// of A(:,j) and A^T(:,j) produces the same counts.
pub fn pattern_symmetry(a: &CscPointers<'_>, column_lengths: &mut [usize]) -> SymmetryInfo {
    debug_assert!(a.dim.is_square());
    let n = a.dim.ncols;
    let nz = a.nnz();
    debug_assert!(column_lengths.len() >= n);

    let (tp, ti) = a.transpose_pattern();

    let mut nz_diagonal = 0usize;
    let mut nz_both = 0usize;
    let mut nz_aat = 0usize;

    for j in 0..n {
        let col = a.col(j);
        let row = &ti[tp[j]..tp[j + 1]];
        let mut p = 0;
        let mut q = 0;
        let mut len = 0usize;
        while p < col.len() || q < row.len() {
            let i1 = col.get(p).copied();
            let i2 = row.get(q).copied();
            let i = match (i1, i2) {
                (Some(i1), Some(i2)) => {
                    if i1 == i2 {
                        if i1 != j {
                            // entry present in both A and A^T
                            nz_both += 1;
                        }
                        p += 1;
                        q += 1;
                        i1
                    } else if i1 < i2 {
                        p += 1;
                        i1
                    } else {
                        q += 1;
                        i2
                    }
                }
                (Some(i1), None) => {
                    p += 1;
                    i1
                }
                (None, Some(i2)) => {
                    q += 1;
                    i2
                }
                (None, None) => unreachable!(),
            };
            if i == j {
                nz_diagonal += 1;
            } else {
                len += 1;
            }
        }
        column_lengths[j] = len;
        nz_aat += len;
    }

    // nz_both counted (i,j) and (j,i) of each matched pair separately
    let sym = if nz == nz_diagonal {
        // only diagonal entries (or no entries at all)
        1.0
    } else {
        nz_both as f64 / (nz - nz_diagonal) as f64
    };

    SymmetryInfo {
        sym,
        nz_diagonal,
        nz_both,
        nz_aat,
    }
}

/// Build the off-diagonal pattern of A + A^T in compressed-column form.
/// Columns come out sorted. This is what the symmetric ordering orders.
pub fn build_symmetric_pattern(a: &CscPointers<'_>) -> (Vec<usize>, Vec<usize>) {
    debug_assert!(a.dim.is_square());
    let n = a.dim.ncols;

    let mut lengths = vec![0usize; n];
    let info = pattern_symmetry(a, &mut lengths);

    let mut bp = vec![0usize; n + 1];
    for j in 0..n {
        bp[j + 1] = bp[j] + lengths[j];
    }
    let mut bi = vec![0usize; info.nz_aat];

    let (tp, ti) = a.transpose_pattern();
    for j in 0..n {
        let col = a.col(j);
        let row = &ti[tp[j]..tp[j + 1]];
        let mut p = 0;
        let mut q = 0;
        let mut out = bp[j];
        while p < col.len() || q < row.len() {
            let i1 = col.get(p).copied();
            let i2 = row.get(q).copied();
            let i = match (i1, i2) {
                (Some(i1), Some(i2)) => {
                    if i1 == i2 {
                        p += 1;
                        q += 1;
                        i1
                    } else if i1 < i2 {
                        p += 1;
                        i1
                    } else {
                        q += 1;
                        i2
                    }
                }
                (Some(i1), None) => {
                    p += 1;
                    i1
                }
                (None, Some(i2)) => {
                    q += 1;
                    i2
                }
                (None, None) => unreachable!(),
            };
            if i != j {
                bi[out] = i;
                out += 1;
            }
        }
        debug_assert_eq!(out, bp[j + 1]);
    }

    (bp, bi)
}

/// resolved pivoting strategy
#[derive(Debug, Clone, Copy)]
pub struct StrategyChoice {
    pub strategy: Strategy,
    pub fix_q: bool,
    pub prefer_diagonal: bool,
}

/// Pick symmetric vs unsymmetric pivoting. `can_symmetric` is false for
/// rectangular input, a pattern-asymmetric residual, or a user permutation
/// without an explicit symmetric request; `sym_info`/`nzdiag` carry the
/// auto-strategy signal when it was computed (`nzdiag` excludes numerically
/// zero diagonal entries when values were supplied).
pub fn resolve_strategy(
    config: &SymbolicConfig,
    can_symmetric: bool,
    sym_info: Option<&SymmetryInfo>,
    nzdiag: usize,
    n2: usize,
) -> StrategyChoice {
    let strategy = match config.strategy {
        Strategy::Symmetric if can_symmetric => Strategy::Symmetric,
        Strategy::Symmetric | Strategy::Unsymmetric => Strategy::Unsymmetric,
        Strategy::Auto => {
            if !can_symmetric {
                Strategy::Unsymmetric
            } else {
                // with an empty interior there is nothing to score; the
                // thresholds degenerate to 0 >= 0 and symmetric wins
                let sym = sym_info.map(|s| s.sym).unwrap_or(1.0);
                if sym >= config.sym_threshold
                    && (nzdiag as f64) >= config.nnzdiag_threshold * n2 as f64
                {
                    Strategy::Symmetric
                } else {
                    Strategy::Unsymmetric
                }
            }
        }
    };

    let (mut fix_q, prefer_diagonal) = match strategy {
        Strategy::Symmetric => (true, true),
        _ => (false, false),
    };
    match config.fix_q {
        FixQ::PreferFixed => fix_q = true,
        FixQ::PreferRefined => fix_q = false,
        FixQ::NoOverride => {}
    }

    StrategyChoice {
        strategy,
        fix_q,
        prefer_diagonal,
    }
}
