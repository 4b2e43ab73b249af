// SPDX-License-Identifier: GPL-2.0-or-later
//
// This module is based on the SuiteSparse UMFPACK symbolic analysis
// (umfpack_qsymbolic / umf_symbolic) by Timothy A. Davis.
//
// UMFPACK, Copyright (c) 1995-2024, Timothy A. Davis.  All Rights Reserved.
//
// Modifications/porting for this project:
// Copyright (c) 2025 Ido Ben Amram

pub mod error;
pub mod estimate;
pub mod etree;
pub mod fronts;
pub mod info;
pub mod mindeg;
pub mod ordering;
pub mod singletons;
pub mod strategy;

use std::time::Instant;

use crate::matrix::csc::{CscMatrix, CscPointers};
use crate::symbolic::estimate::{Estimates, simulate_numeric};
use crate::symbolic::etree::analyze_fronts;
use crate::symbolic::fronts::finalize_fronts;
use crate::symbolic::mindeg::dense_degree_threshold;
use crate::symbolic::ordering::{ColumnOrdering, OrderingStats, combine_ordering, fill_reducing_order};
use crate::symbolic::singletons::{Singletons, find_singletons};
use crate::symbolic::strategy::{SymmetryInfo, pattern_symmetry, resolve_strategy};
use crate::utils::is_permutation;

pub use error::{SymbolicError, SymbolicResult};
pub use info::AnalyzeInfo;

/// Pivoting strategy. `Auto` resolves to one of the other two from the
/// pattern symmetry and diagonal density of the pruned matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strategy {
    Auto,
    Unsymmetric,
    Symmetric,
}

/// Whether the symbolic column order must be taken as final, or may be
/// refined by the front-tree post-order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FixQ {
    NoOverride,
    PreferFixed,
    PreferRefined,
}

/// Which fill-reducing ordering to run on the pruned matrix. `Given` is
/// selected implicitly by supplying a user permutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OrderingMethod {
    /// built-in column minimum degree (minimum degree on A+A^T under the
    /// symmetric strategy)
    Colamd,
    /// natural order
    None,
    /// the supplied external backend
    User,
    /// symmetric strategy: minimum degree on A+A^T; otherwise the column
    /// flavor
    Cholmod,
    /// the supplied external backend (a graph partitioner)
    Metis,
    /// try both flavors, keep the lower fill estimate
    Best,
    /// Metis unless the matrix is empty or carries a dense row
    MetisGuard,
}

/// The ordering that actually produced the interior column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OrderingUsed {
    Given,
    Colamd,
    Amd,
    None,
    User,
    Metis,
}

/// Scalar seam: the analysis only ever asks a value whether it is exactly
/// zero, and the resource simulation how many arena Units one entry takes.
pub trait Scalar: Copy {
    const ENTRY_UNITS: usize;
    const DIV_FLOPS: f64;
    const MULTSUB_FLOPS: f64;
    fn is_nonzero(&self) -> bool;
}

impl Scalar for f64 {
    const ENTRY_UNITS: usize = 1;
    const DIV_FLOPS: f64 = 1.0;
    const MULTSUB_FLOPS: f64 = 2.0;

    fn is_nonzero(&self) -> bool {
        *self != 0.0
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SymbolicConfig {
    /// scales the dense-row cutoff max(16, f * 16 * sqrt(n_col))
    pub dense_row_threshold_factor: f64,
    pub dense_col_threshold_factor: f64,
    /// panel size of the numeric kernel; clamped to >= 2 and rounded up
    /// to even
    pub block_size: usize,
    pub strategy: Strategy,
    pub fix_q: FixQ,
    pub do_singletons: bool,
    pub ordering: OrderingMethod,
    pub aggressive_absorption: bool,
    pub sym_threshold: f64,
    pub nnzdiag_threshold: f64,
}

impl Default for SymbolicConfig {
    fn default() -> Self {
        Self {
            dense_row_threshold_factor: 0.2,
            dense_col_threshold_factor: 0.2,
            block_size: 32,
            strategy: Strategy::Auto,
            fix_q: FixQ::NoOverride,
            do_singletons: true,
            ordering: OrderingMethod::Colamd,
            aggressive_absorption: true,
            sym_threshold: 0.5,
            nnzdiag_threshold: 0.9,
        }
    }
}

impl SymbolicConfig {
    fn validated(&self) -> Self {
        let mut c = self.clone();
        c.dense_row_threshold_factor = c.dense_row_threshold_factor.max(0.0);
        c.dense_col_threshold_factor = c.dense_col_threshold_factor.max(0.0);
        c.block_size = c.block_size.max(2);
        if c.block_size % 2 == 1 {
            c.block_size += 1;
        }
        c.sym_threshold = c.sym_threshold.clamp(0.0, 1.0);
        c.nnzdiag_threshold = c.nnzdiag_threshold.clamp(0.0, 1.0);
        c
    }
}

/// Scratch the analysis built on the way to the `Symbolic` object. A
/// multifrontal consumer reuses it instead of recomputing the peel.
#[derive(Debug)]
pub struct Workspace {
    pub cperm1: Vec<usize>,
    pub rperm1: Vec<usize>,
    pub inv_rperm1: Vec<usize>,
    /// per original row: assembling front, nfr for none, -1 for
    /// singleton pivot rows
    pub in_front: Vec<isize>,
}

/// The symbolic analysis artifact. Immutable once built; everything the
/// numeric factorization needs to allocate and schedule its work.
#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Symbolic {
    pub n_row: usize,
    pub n_col: usize,
    pub nz: usize,
    /// panel size for the numeric kernel
    pub nb: usize,

    pub n1: usize,
    pub n1r: usize,
    pub n1c: usize,
    pub nempty_row: usize,
    pub nempty_col: usize,

    pub strategy_used: Strategy,
    pub ordering_used: OrderingUsed,
    pub fix_q: bool,
    pub prefer_diagonal: bool,
    pub max_rdeg: usize,
    pub dense_row_threshold: usize,

    /// final column order: singletons, interior, empty columns
    pub cperm_init: Vec<usize>,
    /// final row order: singleton pivot rows, rows grouped by front,
    /// leftover rows, empty rows
    pub rperm_init: Vec<usize>,
    /// degree of column `cperm_init[k]` (at elimination time for the
    /// singleton prefix)
    pub cdeg: Vec<usize>,
    pub rdeg: Vec<usize>,

    pub nfr: usize,
    pub front_npivcol: Vec<usize>,
    pub front_nrows: Vec<usize>,
    pub front_ncols: Vec<usize>,
    pub front_parent: Vec<Option<usize>>,
    /// length nfr + 1; the last entry is the dummy front holding rows no
    /// front assembles
    pub front_first_row: Vec<usize>,
    pub front_leftmost_desc: Vec<usize>,

    pub nchains: usize,
    pub chain_start: Vec<usize>,
    pub chain_maxrows: Vec<usize>,
    pub chain_maxcols: Vec<usize>,
    pub maxnrows: usize,
    pub maxncols: usize,

    /// per interior column, element size net of dense-row entries; absent
    /// when no row crosses the dense threshold
    pub esize: Option<Vec<usize>>,
    /// where each original diagonal entry lands under the final orderings
    pub diagonal_map: Option<Vec<usize>>,

    pub estimates: Estimates,
    pub info: AnalyzeInfo,
}

impl Symbolic {
    /// Analyze an owned matrix, consuming its values for the numeric-zero
    /// diagonal test.
    pub fn from_matrix(a: &CscMatrix, config: &SymbolicConfig) -> SymbolicResult<Symbolic> {
        analyze(a.pointers(), Some(&a.values), None, config)
    }
}

/// Symbolic analysis with an optional user column permutation
/// (the `qsymbolic` entry point).
pub fn analyze<S: Scalar>(
    a: CscPointers<'_>,
    ax: Option<&[S]>,
    quser: Option<&[usize]>,
    config: &SymbolicConfig,
) -> SymbolicResult<Symbolic> {
    analyze_core(a, ax, quser, None, config, false).map(|(s, _)| s)
}

/// Symbolic analysis with a user ordering backend (the `fsymbolic` entry
/// point). The backend is consulted unless the configured ordering already
/// names a backend-driven mode.
pub fn analyze_with_ordering<S: Scalar>(
    a: CscPointers<'_>,
    ax: Option<&[S]>,
    backend: &mut dyn ColumnOrdering,
    config: &SymbolicConfig,
) -> SymbolicResult<Symbolic> {
    let mut config = config.clone();
    match config.ordering {
        OrderingMethod::User | OrderingMethod::Metis | OrderingMethod::MetisGuard => {}
        _ => config.ordering = OrderingMethod::User,
    }
    analyze_core(a, ax, None, Some(backend), &config, false).map(|(s, _)| s)
}

/// Symbolic analysis for a multifrontal consumer: additionally returns the
/// workspace (the `paru_symbolic` entry point). When both a permutation
/// and a backend are supplied, the permutation wins.
pub fn analyze_paru<S: Scalar>(
    a: CscPointers<'_>,
    ax: Option<&[S]>,
    quser: Option<&[usize]>,
    backend: Option<&mut dyn ColumnOrdering>,
    config: &SymbolicConfig,
) -> SymbolicResult<(Symbolic, Workspace)> {
    let backend = if quser.is_some() { None } else { backend };
    analyze_core(a, ax, quser, backend, config, true)
}

/// compressed-column pattern of the pruned matrix S, columns sorted
pub(crate) fn build_pruned_pattern(
    a: &CscPointers<'_>,
    sing: &Singletons,
) -> (Vec<usize>, Vec<usize>) {
    let n_row = a.dim.nrows;
    let n_col = a.dim.ncols;
    let n1 = sing.n1;
    let nrow2 = sing.nrow2(n_row);
    let ncol2 = sing.ncol2(n_col);

    // row-form first: scanning permuted columns left to right fills each
    // row's list in ascending column order
    let mut rp = vec![0usize; nrow2 + 1];
    for j2 in 0..ncol2 {
        let j = sing.cperm1[n1 + j2];
        for &r in a.col(j) {
            let k = sing.inv_rperm1[r];
            if k >= n1 && k < n1 + nrow2 {
                rp[k - n1 + 1] += 1;
            }
        }
    }
    for i in 0..nrow2 {
        rp[i + 1] += rp[i];
    }
    let snz = rp[nrow2];
    let mut rj = vec![0usize; snz];
    let mut next = rp.clone();
    for j2 in 0..ncol2 {
        let j = sing.cperm1[n1 + j2];
        for &r in a.col(j) {
            let k = sing.inv_rperm1[r];
            if k >= n1 && k < n1 + nrow2 {
                rj[next[k - n1]] = j2;
                next[k - n1] += 1;
            }
        }
    }

    // transpose back: rows ascending gives sorted columns
    let mut sp = vec![0usize; ncol2 + 1];
    for &j2 in &rj {
        sp[j2 + 1] += 1;
    }
    for j in 0..ncol2 {
        sp[j + 1] += sp[j];
    }
    let mut si = vec![0usize; snz];
    let mut next = sp.clone();
    for r2 in 0..nrow2 {
        for &j2 in &rj[rp[r2]..rp[r2 + 1]] {
            si[next[j2]] = r2;
            next[j2] += 1;
        }
    }
    (sp, si)
}

/// interior column order induced by a user permutation: the non-singleton,
/// non-empty columns in the order Quser lists them
fn given_order_qinv(quser: &[usize], sing: &Singletons, n_col: usize) -> Vec<usize> {
    let n1 = sing.n1;
    let ncol2 = sing.ncol2(n_col);
    let interior_end = n_col - sing.nempty_col;
    let mut qinv = vec![0usize; ncol2];
    let mut rank = 0usize;
    for &j in quser {
        let pos1 = sing.inv_cperm1[j];
        if pos1 >= n1 && pos1 < interior_end {
            qinv[pos1 - n1] = rank;
            rank += 1;
        }
    }
    debug_assert_eq!(rank, ncol2);
    qinv
}

#[allow(clippy::too_many_arguments)]
fn analyze_core<S: Scalar>(
    a: CscPointers<'_>,
    ax: Option<&[S]>,
    quser: Option<&[usize]>,
    external: Option<&mut dyn ColumnOrdering>,
    config: &SymbolicConfig,
    for_paru: bool,
) -> SymbolicResult<(Symbolic, Workspace)> {
    let start = Instant::now();
    let config = config.validated();

    // --- S1: validation ---
    let n_row = a.dim.nrows;
    let n_col = a.dim.ncols;
    if n_row == 0 || n_col == 0 {
        return Err(SymbolicError::NRowNColNonPositive { n_row, n_col });
    }
    a.check_invariants()?;
    let nz = a.nnz();
    if let Some(values) = ax {
        if values.len() < nz {
            return Err(SymbolicError::ArgumentMissing {
                context: "values shorter than the pattern",
            });
        }
    }
    if let Some(q) = quser {
        if !is_permutation(n_col, q) || q.len() != n_col {
            return Err(SymbolicError::InvalidPermutation { n_col });
        }
    }

    // workspace sizing is computed in double precision and gated before
    // anything large is allocated, so a 32-bit-style overflow cannot wrap
    let nn = n_row.max(n_col);
    let workspace_units = 3.0 * nz as f64 + 12.0 * nn as f64 + 16.0;
    if workspace_units * std::mem::size_of::<isize>() as f64 >= isize::MAX as f64 {
        return Err(SymbolicError::OutOfMemory {
            units: workspace_units,
        });
    }

    let given = quser.is_some();
    let nb = config.block_size;

    // --- S2: singleton peeling ---
    let sing = find_singletons(&a, config.do_singletons);
    let n1 = sing.n1;
    let nrow2 = sing.nrow2(n_row);
    let ncol2 = sing.ncol2(n_col);

    let (sp, si) = build_pruned_pattern(&a, &sing);
    let snz = si.len();
    let s = CscPointers::new(
        crate::matrix::Dim {
            nrows: nrow2,
            ncols: ncol2,
        },
        &sp,
        &si,
    );

    // --- S3: strategy selection ---
    // a user permutation rules the symmetric strategy out unless it was
    // asked for explicitly; an asymmetric or rectangular residual rules it
    // out unconditionally
    let can_symmetric =
        n_row == n_col && sing.is_sym && (!given || config.strategy == Strategy::Symmetric);
    let nempty = sing.nempty_row.max(sing.nempty_col);
    let n2 = nn - n1 - nempty;

    let mut sym_info: Option<SymmetryInfo> = None;
    let mut nzdiag = 0usize;
    if can_symmetric && nrow2 == ncol2 && ncol2 > 0 {
        let mut lens = vec![0usize; ncol2];
        sym_info = Some(pattern_symmetry(&s, &mut lens));
        for k in n1..(n_row - sing.nempty_row) {
            let c = sing.cperm1[k];
            let r = sing.rperm1[k];
            if let Ok(p) = a.col(c).binary_search(&r) {
                let p = a.col_start(c) + p;
                if ax.map_or(true, |v| v[p].is_nonzero()) {
                    nzdiag += 1;
                }
            }
        }
    }
    let mut choice = resolve_strategy(&config, can_symmetric, sym_info.as_ref(), nzdiag, n2);
    if given && config.fix_q != FixQ::PreferRefined {
        // a supplied permutation is taken as final
        choice.fix_q = true;
    }

    // --- S4: fill-reducing ordering ---
    let symmetric = choice.strategy == Strategy::Symmetric;
    let mut ordering_stats = OrderingStats::default();
    let (qinv, ordering_used) = if let Some(q) = quser {
        (given_order_qinv(q, &sing, n_col), OrderingUsed::Given)
    } else {
        let (qinv, used, stats) =
            fill_reducing_order(&s, symmetric, &config, external, sing.max_rdeg)?;
        ordering_stats = stats;
        (qinv, used)
    };

    let mut cperm_init = vec![0usize; n_col];
    combine_ordering(n1, sing.nempty_col, &sing.cperm1, &qinv, &mut cperm_init);

    // --- S5: symbolic factorization ---
    let tree = analyze_fronts(&s, &qinv, choice.fix_q)?;
    if !choice.fix_q {
        // fold the front post-order into the interior of the permutation
        let interior: Vec<usize> = (0..ncol2).map(|k| cperm_init[n1 + k]).collect();
        for k in 0..ncol2 {
            cperm_init[n1 + k] = interior[tree.cperm2[k]];
        }
    }
    debug_assert!(is_permutation(n_col, &cperm_init));

    // the S pattern is no longer needed; the workspace is released in the
    // same two tranches as the original
    drop(sp);
    drop(si);

    // --- S6: front-tree finalization ---
    let dense_row_threshold = dense_degree_threshold(config.dense_row_threshold_factor, n_col);
    let want_diag = (choice.prefer_diagonal || for_paru) && n_row == n_col;
    let layout = finalize_fronts(&a, &tree, &sing, &cperm_init, dense_row_threshold, want_diag);
    debug_assert!(is_permutation(n_row, &layout.rperm_init));

    // --- S7: resource simulation ---
    let estimates = simulate_numeric::<S>(
        n_row,
        n_col,
        n1,
        sing.nempty_row,
        sing.nempty_col,
        nb,
        snz,
        dense_row_threshold,
        &tree,
        &layout,
    );

    // --- assemble the artifact ---
    let dense_col_threshold = dense_degree_threshold(config.dense_col_threshold_factor, n_row);
    let mut info = AnalyzeInfo {
        n_row,
        n_col,
        nz,
        nrow_singletons: sing.n1r,
        ncol_singletons: sing.n1c,
        nempty_row: sing.nempty_row,
        nempty_col: sing.nempty_col,
        n2,
        strategy_used: choice.strategy,
        ordering_used,
        qfixed: choice.fix_q,
        diag_preferred: choice.prefer_diagonal,
        symbolic_peak_memory: workspace_units,
        symbolic_walltime: start.elapsed().as_secs_f64(),
        num_mem_init_usage: estimates.num_mem_init_usage as f64,
        num_mem_size_est: estimates.num_mem_size_est as f64,
        num_mem_usage_est: estimates.num_mem_usage_est as f64,
        lnz_estimate: estimates.lnz_bound as f64,
        unz_estimate: estimates.unz_bound as f64,
        flops_estimate: estimates.flops_bound,
        max_front_rows: layout.maxnrows as f64,
        max_front_cols: layout.maxncols as f64,
        ..AnalyzeInfo::default()
    };
    if let Some(symi) = &sym_info {
        info.symmetry = symi.sym;
        info.nzdiag = nzdiag as f64;
        info.nz_aat = symi.nz_aat as f64;
    }
    if ordering_used == OrderingUsed::Amd {
        info.symmetric_lunz = ordering_stats.lnz;
        info.symmetric_flops = ordering_stats.flops;
        info.symmetric_dmax = ordering_stats.max_colcount;
    }
    info.ndense_row = layout.rdeg[n1..n_row - sing.nempty_row]
        .iter()
        .filter(|&&d| d > dense_row_threshold)
        .count() as f64;
    info.ndense_col = layout.cdeg[n1..n_col - sing.nempty_col]
        .iter()
        .filter(|&&d| d > dense_col_threshold)
        .count() as f64;

    let front_parent: Vec<Option<usize>> = tree
        .parent
        .iter()
        .map(|&p| if p < 0 { None } else { Some(p as usize) })
        .collect();

    let mut symbolic = Symbolic {
        n_row,
        n_col,
        nz,
        nb,
        n1,
        n1r: sing.n1r,
        n1c: sing.n1c,
        nempty_row: sing.nempty_row,
        nempty_col: sing.nempty_col,
        strategy_used: choice.strategy,
        ordering_used,
        fix_q: choice.fix_q,
        prefer_diagonal: choice.prefer_diagonal,
        max_rdeg: sing.max_rdeg,
        dense_row_threshold,
        cperm_init,
        rperm_init: layout.rperm_init,
        cdeg: layout.cdeg,
        rdeg: layout.rdeg,
        nfr: tree.nfr,
        front_npivcol: tree.npivcol,
        front_nrows: tree.nrows,
        front_ncols: tree.ncols,
        front_parent,
        front_first_row: layout.first_row,
        front_leftmost_desc: layout.leftmost_desc,
        nchains: layout.nchains,
        chain_start: layout.chain_start,
        chain_maxrows: layout.chain_maxrows,
        chain_maxcols: layout.chain_maxcols,
        maxnrows: layout.maxnrows,
        maxncols: layout.maxncols,
        esize: layout.esize,
        diagonal_map: layout.diagonal_map,
        estimates,
        info,
    };
    symbolic.info.symbolic_size = symbolic_object_units(&symbolic) as f64;

    let workspace = Workspace {
        cperm1: sing.cperm1,
        rperm1: sing.rperm1,
        inv_rperm1: sing.inv_rperm1,
        in_front: layout.in_front,
    };

    Ok((symbolic, workspace))
}

/// size of the Symbolic object in arena Units, for the statistics record
fn symbolic_object_units(s: &Symbolic) -> usize {
    let fixed = 24;
    fixed
        + s.cperm_init.len()
        + s.rperm_init.len()
        + s.cdeg.len()
        + s.rdeg.len()
        + 6 * (s.nfr + 1)
        + 3 * (s.nchains + 1)
        + s.esize.as_ref().map_or(0, |e| e.len())
        + s.diagonal_map.as_ref().map_or(0, |d| d.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::builder::MatrixBuilder;
    use rstest::rstest;

    fn pattern(nrows: usize, ncols: usize, entries: &[(usize, usize)]) -> CscMatrix {
        let mut b = MatrixBuilder::new(nrows, ncols);
        for &(c, r) in entries {
            b.push(c, r, 1.0).unwrap();
        }
        b.build_csc().unwrap()
    }

    fn tridiagonal(n: usize) -> CscMatrix {
        let mut b = MatrixBuilder::new(n, n);
        for i in 0..n {
            b.push(i, i, 2.0).unwrap();
            if i + 1 < n {
                b.push(i, i + 1, -1.0).unwrap();
                b.push(i + 1, i, -1.0).unwrap();
            }
        }
        b.build_csc().unwrap()
    }

    /// the universal invariants every successful analysis must satisfy
    fn check_symbolic(sym: &Symbolic, a: &CscMatrix) {
        // permutations
        assert!(is_permutation(sym.n_col, &sym.cperm_init));
        assert!(is_permutation(sym.n_row, &sym.rperm_init));

        // empty columns trail, and only they are empty
        let ap = &a.column_pointers;
        for (k, &j) in sym.cperm_init.iter().enumerate() {
            let empty = ap[j + 1] == ap[j];
            assert_eq!(empty, k >= sym.n_col - sym.nempty_col);
        }

        // front topology and chain partition
        assert_eq!(sym.front_npivcol.len(), sym.nfr);
        for f in 0..sym.nfr {
            match sym.front_parent[f] {
                Some(p) => assert!(p > f && p < sym.nfr),
                None => {}
            }
        }
        if sym.nfr > 0 {
            assert_eq!(sym.chain_start[0], 0);
            assert_eq!(sym.chain_start[sym.nchains], sym.nfr);
            for c in 0..sym.nchains {
                assert!(sym.chain_start[c] < sym.chain_start[c + 1]);
                assert!(sym.chain_maxrows[c] % 2 == 1);
            }
            let total: usize = sym.front_npivcol.iter().sum();
            assert_eq!(total, sym.n_col - sym.n1 - sym.nempty_col);
        } else {
            assert_eq!(sym.nchains, 0);
        }

        // leftmost descendants never exceed their front
        for f in 0..sym.nfr {
            assert!(sym.front_leftmost_desc[f] <= f);
        }

        // first_row covers [n1, n_row] monotonically
        assert_eq!(sym.front_first_row.len(), sym.nfr + 1);
        if sym.nfr > 0 {
            assert_eq!(sym.front_first_row[0], sym.n1);
            for f in 0..sym.nfr {
                assert!(sym.front_first_row[f] <= sym.front_first_row[f + 1]);
            }
        }

        // diagonal map composition
        if let Some(dm) = &sym.diagonal_map {
            let mut inv_r = vec![0usize; sym.n_row];
            crate::utils::inverse_permutation(sym.n_row, &sym.rperm_init, &mut inv_r);
            for k in 0..sym.n_col {
                assert_eq!(dm[k], inv_r[sym.cperm_init[k]]);
            }
        }

        // estimate monotonicity
        let e = &sym.estimates;
        assert!(e.num_mem_usage_est >= e.num_mem_size_est);
        assert!(e.num_mem_size_est >= e.num_mem_init_usage);
        assert!(e.num_mem_init_usage >= 2);
    }

    #[test]
    fn t1_diagonal_all_singletons() {
        let a = pattern(3, 3, &[(0, 0), (1, 1), (2, 2)]);
        let sym = Symbolic::from_matrix(&a, &SymbolicConfig::default()).unwrap();
        check_symbolic(&sym, &a);
        assert_eq!(sym.n1, 3);
        assert_eq!(sym.nempty_col, 0);
        assert_eq!(sym.nfr, 0);
        assert_eq!(sym.nchains, 0);
        assert_eq!(sym.cperm_init, vec![0, 1, 2]);
        assert_eq!(sym.rperm_init, vec![0, 1, 2]);
        assert_eq!(sym.estimates.lnz_bound, 0);
        assert_eq!(sym.estimates.unz_bound, 0);
        assert_eq!(sym.strategy_used, Strategy::Symmetric);
    }

    #[test]
    fn t2_arrow_matrix() {
        let a = pattern(
            4,
            4,
            &[(0, 0), (1, 0), (2, 0), (3, 0), (1, 1), (2, 2), (3, 3)],
        );
        let sym = Symbolic::from_matrix(&a, &SymbolicConfig::default()).unwrap();
        check_symbolic(&sym, &a);
        assert_eq!(sym.n1, 4);
        assert_eq!(sym.n1r, 3);
        assert_eq!(sym.n1c, 1);
        assert_eq!(sym.nfr, 0);
        // rows 1..3 peel first, the leftover 1x1 block last
        assert_eq!(sym.cperm_init, vec![1, 2, 3, 0]);
        assert_eq!(sym.strategy_used, Strategy::Symmetric);
    }

    #[test]
    fn t3_tridiagonal_symmetric_strategy() {
        let a = tridiagonal(5);
        let sym = Symbolic::from_matrix(&a, &SymbolicConfig::default()).unwrap();
        check_symbolic(&sym, &a);
        assert_eq!(sym.n1, 0);
        assert_eq!(sym.strategy_used, Strategy::Symmetric);
        assert_eq!(sym.ordering_used, OrderingUsed::Amd);
        assert!(sym.fix_q);
        assert!(sym.prefer_diagonal);
        assert_eq!(sym.info.symmetry, 1.0);
        assert_eq!(sym.info.nzdiag, 5.0);
        assert!(sym.nchains >= 1);
        assert!(sym.diagonal_map.is_some());
        assert!(sym.info.symmetric_lunz >= 0.0);
    }

    #[test]
    fn t4_rectangular_with_user_permutation() {
        let a = pattern(
            3,
            5,
            &[
                (0, 0),
                (0, 1),
                (1, 1),
                (1, 2),
                (2, 0),
                (2, 2),
                (3, 0),
                (3, 1),
                (3, 2),
                (4, 0),
                (4, 2),
            ],
        );
        let quser = [4usize, 3, 2, 1, 0];
        let sym = analyze(a.pointers(), Some(&a.values), Some(&quser), &SymbolicConfig::default())
            .unwrap();
        check_symbolic(&sym, &a);
        assert_eq!(sym.strategy_used, Strategy::Unsymmetric);
        assert_eq!(sym.ordering_used, OrderingUsed::Given);
        // no singletons here, so the permutation passes through untouched
        assert_eq!(sym.n1, 0);
        assert_eq!(sym.cperm_init, quser.to_vec());
        assert!(sym.diagonal_map.is_none());
    }

    #[test]
    fn t5_empty_column_in_the_middle() {
        let a = pattern(
            4,
            4,
            &[(0, 0), (0, 1), (1, 0), (1, 1), (1, 3), (3, 1), (3, 3)],
        );
        let sym = Symbolic::from_matrix(&a, &SymbolicConfig::default()).unwrap();
        check_symbolic(&sym, &a);
        assert_eq!(sym.nempty_col, 1);
        assert_eq!(sym.cperm_init[3], 2);
        let mut head: Vec<usize> = sym.cperm_init[..3].to_vec();
        head.sort_unstable();
        assert_eq!(head, vec![0, 1, 3]);
    }

    #[test]
    fn t6_invalid_user_permutation() {
        let a = tridiagonal(4);
        let quser = [0usize, 0, 1, 2];
        let err = analyze(
            a.pointers(),
            Some(&a.values),
            Some(&quser),
            &SymbolicConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SymbolicError::InvalidPermutation { n_col: 4 }));
    }

    #[test]
    fn p8_user_permutation_round_trip() {
        // unsymmetric pattern, fixQ on: re-running with the produced
        // permutation must reproduce it
        let a = pattern(
            5,
            5,
            &[
                (0, 0),
                (0, 3),
                (1, 1),
                (1, 0),
                (2, 2),
                (2, 0),
                (2, 4),
                (3, 3),
                (3, 1),
                (4, 4),
                (4, 2),
                (0, 4),
                (1, 4),
            ],
        );
        let config = SymbolicConfig {
            strategy: Strategy::Unsymmetric,
            fix_q: FixQ::PreferFixed,
            ..SymbolicConfig::default()
        };
        let first = Symbolic::from_matrix(&a, &config).unwrap();
        check_symbolic(&first, &a);
        let second = analyze(
            a.pointers(),
            Some(&a.values),
            Some(&first.cperm_init),
            &config,
        )
        .unwrap();
        assert_eq!(second.cperm_init, first.cperm_init);
    }

    #[test]
    fn zero_dimension_is_rejected() {
        let a = CscMatrix {
            dim: crate::matrix::Dim { nrows: 0, ncols: 2 },
            column_pointers: vec![0, 0, 0],
            row_indices: vec![],
            values: vec![],
        };
        assert!(matches!(
            Symbolic::from_matrix(&a, &SymbolicConfig::default()),
            Err(SymbolicError::NRowNColNonPositive { .. })
        ));
    }

    #[test]
    fn broken_pattern_is_rejected() {
        let a = CscMatrix {
            dim: crate::matrix::Dim { nrows: 2, ncols: 2 },
            column_pointers: vec![0, 2, 4],
            row_indices: vec![1, 0, 0, 1],
            values: vec![1.0; 4],
        };
        assert!(matches!(
            Symbolic::from_matrix(&a, &SymbolicConfig::default()),
            Err(SymbolicError::InvalidMatrix(_))
        ));
    }

    #[test]
    fn short_values_are_rejected() {
        let a = tridiagonal(3);
        let short = [1.0f64; 2];
        assert!(matches!(
            analyze(a.pointers(), Some(&short), None, &SymbolicConfig::default()),
            Err(SymbolicError::ArgumentMissing { .. })
        ));
    }

    #[test]
    fn numerically_zero_diagonal_counts_against_symmetric() {
        // tridiagonal pattern whose stored diagonal is explicit zeros:
        // with values supplied the auto strategy must fall back, while the
        // pattern alone still looks perfectly symmetric
        let a = CscMatrix {
            dim: crate::matrix::Dim { nrows: 4, ncols: 4 },
            column_pointers: vec![0, 2, 5, 8, 10],
            row_indices: vec![0, 1, 0, 1, 2, 1, 2, 3, 2, 3],
            values: vec![0.0, -1.0, -1.0, 0.0, -1.0, -1.0, 0.0, -1.0, -1.0, 0.0],
        };
        a.check_invariants().unwrap();

        let with_values = Symbolic::from_matrix(&a, &SymbolicConfig::default()).unwrap();
        assert_eq!(with_values.strategy_used, Strategy::Unsymmetric);
        assert_eq!(with_values.info.nzdiag, 0.0);

        let pattern_only =
            analyze::<f64>(a.pointers(), None, None, &SymbolicConfig::default()).unwrap();
        assert_eq!(pattern_only.strategy_used, Strategy::Symmetric);
        assert_eq!(pattern_only.info.nzdiag, 4.0);
    }

    #[test]
    fn fsymbolic_consults_the_backend() {
        let a = tridiagonal(6);
        let mut calls = 0usize;
        let mut backend = |_nr: usize,
                           nc: usize,
                           _sym: bool,
                           _ap: &[usize],
                           _ai: &[usize],
                           perm: &mut [isize],
                           _st: &mut OrderingStats| {
            calls += 1;
            for k in 0..nc {
                perm[k] = (nc - 1 - k) as isize;
            }
            true
        };
        let sym = analyze_with_ordering(
            a.pointers(),
            Some(&a.values),
            &mut backend,
            &SymbolicConfig {
                strategy: Strategy::Unsymmetric,
                fix_q: FixQ::PreferFixed,
                ..SymbolicConfig::default()
            },
        )
        .unwrap();
        check_symbolic(&sym, &a);
        assert_eq!(sym.ordering_used, OrderingUsed::User);
        assert_eq!(sym.cperm_init, vec![5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn paru_returns_the_workspace() {
        let a = tridiagonal(5);
        let (sym, sw) = analyze_paru(
            a.pointers(),
            Some(&a.values),
            None,
            None,
            &SymbolicConfig::default(),
        )
        .unwrap();
        check_symbolic(&sym, &a);
        assert_eq!(sw.cperm1.len(), 5);
        assert_eq!(sw.rperm1.len(), 5);
        assert_eq!(sw.in_front.len(), 5);
        // every row is assembled by some real front here
        assert!(sw.in_front.iter().all(|&f| f >= 0 && (f as usize) < sym.nfr));
        // the diagonal map is produced for multifrontal consumers
        assert!(sym.diagonal_map.is_some());
    }

    #[rstest]
    #[case::natural(OrderingMethod::None)]
    #[case::colamd(OrderingMethod::Colamd)]
    #[case::cholmod(OrderingMethod::Cholmod)]
    #[case::best(OrderingMethod::Best)]
    #[case::metis_guard(OrderingMethod::MetisGuard)]
    fn every_builtin_ordering_mode_analyzes(#[case] ordering: OrderingMethod) {
        let a = tridiagonal(8);
        let config = SymbolicConfig {
            ordering,
            ..SymbolicConfig::default()
        };
        let sym = Symbolic::from_matrix(&a, &config).unwrap();
        check_symbolic(&sym, &a);
    }

    #[test]
    fn metis_without_backend_fails_terminally() {
        let a = tridiagonal(4);
        let config = SymbolicConfig {
            ordering: OrderingMethod::Metis,
            ..SymbolicConfig::default()
        };
        assert!(matches!(
            Symbolic::from_matrix(&a, &config),
            Err(SymbolicError::OrderingFailed { .. })
        ));
    }

    #[test]
    fn emptied_interior_column_flows_through() {
        // 1x2 all-ones: peeling one column empties the other, which keeps
        // an interior slot and becomes a degenerate front
        let a = pattern(1, 2, &[(0, 0), (1, 0)]);
        let sym = analyze::<f64>(a.pointers(), None, None, &SymbolicConfig::default()).unwrap();
        check_symbolic(&sym, &a);
        assert_eq!(sym.n1, 1);
        assert_eq!(sym.nempty_col, 0);
        assert_eq!(sym.nfr, 1);
        assert_eq!(sym.front_nrows[0], 0);
    }

    #[test]
    fn one_by_one_zero_matrix() {
        let a = CscMatrix {
            dim: crate::matrix::Dim { nrows: 1, ncols: 1 },
            column_pointers: vec![0, 0],
            row_indices: vec![],
            values: vec![],
        };
        let sym = Symbolic::from_matrix(&a, &SymbolicConfig::default()).unwrap();
        check_symbolic(&sym, &a);
        assert_eq!(sym.nempty_col, 1);
        assert_eq!(sym.nempty_row, 1);
        assert_eq!(sym.n1, 0);
        assert_eq!(sym.nfr, 0);
        assert_eq!(sym.cperm_init, vec![0]);
        assert_eq!(sym.rperm_init, vec![0]);
    }

    #[test]
    fn singletons_can_be_disabled() {
        let a = pattern(3, 3, &[(0, 0), (1, 1), (2, 2)]);
        let config = SymbolicConfig {
            do_singletons: false,
            ..SymbolicConfig::default()
        };
        let sym = Symbolic::from_matrix(&a, &config).unwrap();
        check_symbolic(&sym, &a);
        assert_eq!(sym.n1, 0);
        assert_eq!(sym.nfr, 3);
    }

    #[test]
    fn dense_rows_produce_esize() {
        // 20 columns sharing one dense row, plus a sparse band keeping
        // everything out of the peel
        let n = 20usize;
        let mut entries = Vec::new();
        for c in 0..n {
            entries.push((c, 0));
        }
        entries.push((0, 1));
        for i in 1..n {
            entries.push((i, i));
            entries.push((i, (i % (n - 1)) + 1));
            if i + 1 < n {
                entries.push((i, i + 1));
            }
        }
        let a = pattern(n, n, &entries);
        let config = SymbolicConfig {
            strategy: Strategy::Unsymmetric,
            ..SymbolicConfig::default()
        };
        let sym = Symbolic::from_matrix(&a, &config).unwrap();
        check_symbolic(&sym, &a);
        assert!(sym.max_rdeg > sym.dense_row_threshold);
        let esize = sym.esize.as_ref().expect("dense rows must produce esize");
        assert_eq!(esize.len(), n - sym.n1 - sym.nempty_col);
        assert!(sym.info.ndense_row >= 1.0);
    }

    #[test]
    fn block_size_is_normalized() {
        let a = tridiagonal(4);
        let config = SymbolicConfig {
            block_size: 1,
            ..SymbolicConfig::default()
        };
        let sym = Symbolic::from_matrix(&a, &config).unwrap();
        assert_eq!(sym.nb, 2);
        let config = SymbolicConfig {
            block_size: 7,
            ..SymbolicConfig::default()
        };
        let sym = Symbolic::from_matrix(&a, &config).unwrap();
        assert_eq!(sym.nb, 8);
    }
}
