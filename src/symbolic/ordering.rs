// SPDX-License-Identifier: GPL-2.0-or-later
//
// This file is based on the SuiteSparse UMFPACK implementation
// (umfpack_qsymbolic ordering dispatch) by Timothy A. Davis.
//
// UMFPACK, Copyright (c) 1995-2024, Timothy A. Davis.  All Rights Reserved.
//
// Modifications/porting for this project:
// Copyright (c) 2025 Ido Ben Amram

use crate::matrix::csc::CscPointers;
use crate::symbolic::error::{SymbolicError, SymbolicResult};
use crate::symbolic::mindeg::{column_graph, dense_degree_threshold, minimum_degree};
use crate::symbolic::strategy::build_symmetric_pattern;
use crate::symbolic::{OrderingMethod, OrderingUsed, SymbolicConfig};
use crate::utils::{EMPTY, is_permutation};

/// Optional Cholesky-style statistics an ordering may report back.
/// `-1.0` means not computed.
#[derive(Debug, Clone, Copy)]
pub struct OrderingStats {
    pub max_colcount: f64,
    pub lnz: f64,
    pub flops: f64,
}

impl Default for OrderingStats {
    fn default() -> Self {
        Self {
            max_colcount: -1.0,
            lnz: -1.0,
            flops: -1.0,
        }
    }
}

/// The one capability the pipeline expects from a fill-reducing ordering.
///
/// Given the pattern `(ap, ai)` of an `nrow`-by-`ncol` matrix, write into
/// `perm` a forward permutation of its columns: `perm[k]` is the column
/// placed k-th. With `symmetric` set (and `nrow == ncol`) the ordering is
/// for `P (A + A^T) P^T`; otherwise it is a column ordering for `A Q`.
/// Return false on failure — the pipeline treats that as terminal and never
/// retries. Implementations may not retain the borrowed slices.
pub trait ColumnOrdering {
    fn order(
        &mut self,
        nrow: usize,
        ncol: usize,
        symmetric: bool,
        ap: &[usize],
        ai: &[usize],
        perm: &mut [isize],
        stats: &mut OrderingStats,
    ) -> bool;
}

/// plain functions and closures satisfy the contract directly
impl<F> ColumnOrdering for F
where
    F: FnMut(usize, usize, bool, &[usize], &[usize], &mut [isize], &mut OrderingStats) -> bool,
{
    fn order(
        &mut self,
        nrow: usize,
        ncol: usize,
        symmetric: bool,
        ap: &[usize],
        ai: &[usize],
        perm: &mut [isize],
        stats: &mut OrderingStats,
    ) -> bool {
        self(nrow, ncol, symmetric, ap, ai, perm, stats)
    }
}

/// The built-in backend: minimum degree on `A + A^T` in symmetric mode,
/// minimum degree on the column-intersection graph in column mode.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinMinDegree {
    pub aggressive: bool,
    pub dense_row_factor: f64,
    pub dense_col_factor: f64,
}

impl BuiltinMinDegree {
    pub fn from_config(config: &SymbolicConfig) -> Self {
        Self {
            aggressive: config.aggressive_absorption,
            dense_row_factor: config.dense_row_threshold_factor,
            dense_col_factor: config.dense_col_threshold_factor,
        }
    }
}

impl ColumnOrdering for BuiltinMinDegree {
    fn order(
        &mut self,
        nrow: usize,
        ncol: usize,
        symmetric: bool,
        ap: &[usize],
        ai: &[usize],
        perm: &mut [isize],
        stats: &mut OrderingStats,
    ) -> bool {
        let a = CscPointers::new(
            crate::matrix::Dim { nrows: nrow, ncols: ncol },
            ap,
            ai,
        );
        let md = if symmetric && nrow == ncol {
            let (bp, bi) = build_symmetric_pattern(&a);
            let dense = dense_degree_threshold(self.dense_row_factor, ncol);
            minimum_degree(ncol, &bp, &bi, dense, self.aggressive, perm)
        } else {
            let dense_row = dense_degree_threshold(self.dense_row_factor, ncol);
            let (cp, ci) = column_graph(&a, dense_row);
            let dense_col = dense_degree_threshold(self.dense_col_factor, nrow.max(1));
            minimum_degree(ncol, &cp, &ci, dense_col, self.aggressive, perm)
        };
        stats.max_colcount = md.dmax;
        stats.lnz = md.lnz;
        stats.flops = md.ndiv + 2.0 * md.nms_lu;
        true
    }
}

/// identity ordering (`ordering = none`)
fn natural_order(perm: &mut [isize]) {
    for (k, p) in perm.iter_mut().enumerate() {
        *p = k as isize;
    }
}

/// Run the configured ordering on the pruned matrix S and return the
/// inverse permutation of its columns (`qinv[old] = new`) together with
/// what was actually used. `Given` never reaches this function — the
/// driver derives that permutation from Quser directly.
pub fn fill_reducing_order(
    s: &CscPointers<'_>,
    symmetric_strategy: bool,
    config: &SymbolicConfig,
    mut external: Option<&mut dyn ColumnOrdering>,
    max_rdeg: usize,
) -> SymbolicResult<(Vec<usize>, OrderingUsed, OrderingStats)> {
    let nrow2 = s.dim.nrows;
    let ncol2 = s.dim.ncols;
    let mut perm = vec![EMPTY; ncol2];
    let mut stats = OrderingStats::default();

    let mut builtin = BuiltinMinDegree::from_config(config);
    let sym = symmetric_strategy && nrow2 == ncol2;

    let used = match config.ordering {
        OrderingMethod::None => {
            natural_order(&mut perm);
            OrderingUsed::None
        }
        OrderingMethod::User | OrderingMethod::Metis => {
            let backend = external.as_deref_mut().ok_or(SymbolicError::OrderingFailed {
                context: "no external ordering backend was supplied",
            })?;
            let ok = backend.order(
                nrow2,
                ncol2,
                sym,
                s.column_pointers(),
                s.row_indices(),
                &mut perm,
                &mut stats,
            );
            if !ok {
                return Err(SymbolicError::OrderingFailed {
                    context: "external ordering backend reported failure",
                });
            }
            match config.ordering {
                OrderingMethod::Metis => OrderingUsed::Metis,
                _ => OrderingUsed::User,
            }
        }
        OrderingMethod::MetisGuard => {
            // METIS orders A^T A; a dense row makes that quadratically
            // expensive, so fall back to the column ordering when one is
            // present (or when there is no backend to guard).
            let dense_guard =
                (max_rdeg as f64) > config.dense_row_threshold_factor * ncol2 as f64;
            let guarded = if s.nnz() > 0 && !dense_guard {
                external.as_deref_mut()
            } else {
                None
            };
            if let Some(backend) = guarded {
                let ok = backend.order(
                    nrow2,
                    ncol2,
                    sym,
                    s.column_pointers(),
                    s.row_indices(),
                    &mut perm,
                    &mut stats,
                );
                if !ok {
                    return Err(SymbolicError::OrderingFailed {
                        context: "external ordering backend reported failure",
                    });
                }
                OrderingUsed::Metis
            } else {
                builtin.order(
                    nrow2,
                    ncol2,
                    sym,
                    s.column_pointers(),
                    s.row_indices(),
                    &mut perm,
                    &mut stats,
                );
                if sym { OrderingUsed::Amd } else { OrderingUsed::Colamd }
            }
        }
        OrderingMethod::Best => {
            // try both flavors, keep the lower fill estimate
            let mut perm_sym = vec![EMPTY; ncol2];
            let mut stats_sym = OrderingStats::default();
            let sym_ok = if nrow2 == ncol2 && ncol2 > 0 {
                builtin.order(
                    nrow2,
                    ncol2,
                    true,
                    s.column_pointers(),
                    s.row_indices(),
                    &mut perm_sym,
                    &mut stats_sym,
                );
                true
            } else {
                false
            };
            builtin.order(
                nrow2,
                ncol2,
                false,
                s.column_pointers(),
                s.row_indices(),
                &mut perm,
                &mut stats,
            );
            if sym_ok && stats_sym.lnz >= 0.0 && stats_sym.lnz < stats.lnz {
                perm = perm_sym;
                stats = stats_sym;
                OrderingUsed::Amd
            } else {
                OrderingUsed::Colamd
            }
        }
        OrderingMethod::Colamd | OrderingMethod::Cholmod => {
            builtin.order(
                nrow2,
                ncol2,
                sym,
                s.column_pointers(),
                s.row_indices(),
                &mut perm,
                &mut stats,
            );
            if sym { OrderingUsed::Amd } else { OrderingUsed::Colamd }
        }
    };

    let forward: Vec<usize> = perm.iter().map(|&p| p.max(0) as usize).collect();
    if !is_permutation(ncol2, &forward) || perm.iter().any(|&p| p < 0) {
        return Err(SymbolicError::OrderingFailed {
            context: "ordering backend returned an invalid permutation",
        });
    }

    let mut qinv = vec![0usize; ncol2];
    crate::utils::inverse_permutation(ncol2, &forward, &mut qinv);
    Ok((qinv, used, stats))
}

/// Compose the final column permutation: singleton columns keep the peel
/// order, the interior is rewritten through the inverse fill-reducing
/// permutation (shifted past the singletons), empty columns stay last.
pub fn combine_ordering(
    n1: usize,
    nempty_col: usize,
    cperm1: &[usize],
    qinv: &[usize],
    cperm_init: &mut [usize],
) {
    let n_col = cperm1.len();
    let ncol2 = n_col - n1 - nempty_col;
    debug_assert_eq!(qinv.len(), ncol2);
    debug_assert_eq!(cperm_init.len(), n_col);

    cperm_init[..n1].copy_from_slice(&cperm1[..n1]);
    for k in 0..ncol2 {
        debug_assert!(qinv[k] < ncol2);
        cperm_init[n1 + qinv[k]] = cperm1[n1 + k];
    }
    cperm_init[n_col - nempty_col..].copy_from_slice(&cperm1[n_col - nempty_col..]);

    debug_assert!(is_permutation(n_col, cperm_init));
}
