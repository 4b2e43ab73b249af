// SPDX-License-Identifier: GPL-2.0-or-later
//
// This file is based on the SuiteSparse UMFPACK implementation
// (umfpack_qsymbolic front finalization) by Timothy A. Davis.
//
// UMFPACK, Copyright (c) 1995-2024, Timothy A. Davis.  All Rights Reserved.
//
// Modifications/porting for this project:
// Copyright (c) 2025 Ido Ben Amram

use crate::matrix::csc::CscPointers;
use crate::symbolic::etree::FrontTree;
use crate::symbolic::singletons::Singletons;
use crate::utils::{EMPTY, flip, inverse_permutation, unflip};

/// Everything the finalization pass derives from the frontal tree: the
/// final row permutation, row-to-front assignment, chains, descendants,
/// permuted degree vectors and the dense-row element sizes.
#[derive(Debug)]
pub struct FrontLayout {
    pub rperm_init: Vec<usize>,
    /// per front, the index in `rperm_init` where its newly assembled rows
    /// begin; entry nfr is the dummy front holding unassigned rows
    pub first_row: Vec<usize>,
    /// per original row: the front that assembles it, `nfr` for rows
    /// belonging to no front, `EMPTY` for singleton pivot rows
    pub in_front: Vec<isize>,
    pub leftmost_desc: Vec<usize>,

    pub nchains: usize,
    pub chain_start: Vec<usize>,
    /// rounded up to the next odd integer
    pub chain_maxrows: Vec<usize>,
    pub chain_maxcols: Vec<usize>,
    pub maxnrows: usize,
    pub maxncols: usize,

    /// degrees under the final orderings: `cdeg[k]` is the degree of
    /// column `cperm_init[k]`
    pub cdeg: Vec<usize>,
    pub rdeg: Vec<usize>,

    /// per interior column, its element size when dense rows are split off
    pub esize: Option<Vec<usize>>,
    pub diagonal_map: Option<Vec<usize>>,
}

/// Assign rows to fronts, lay out the final row permutation, and derive
/// the chain structure the numeric kernel shares workspace across.
#[allow(clippy::too_many_arguments)]
pub fn finalize_fronts(
    a: &CscPointers<'_>,
    tree: &FrontTree,
    sing: &Singletons,
    cperm_init: &[usize],
    dense_row_threshold: usize,
    want_diagonal_map: bool,
) -> FrontLayout {
    let n_row = a.dim.nrows;
    let n_col = a.dim.ncols;
    let n1 = sing.n1;
    let nfr = tree.nfr;
    let dummy = nfr as isize;

    let mut col_start = vec![0usize; nfr + 1];
    for f in 0..nfr {
        col_start[f + 1] = col_start[f] + tree.npivcol[f];
    }

    // --- row-to-front assignment ---
    // every row starts in the dummy front; singleton pivot rows are taken
    // out of play before the scan
    let mut in_front = vec![dummy; n_row];
    for k in 0..n1 {
        in_front[sing.rperm1[k]] = EMPTY;
    }

    let mut first_row = vec![0usize; nfr + 2];
    for f in 0..nfr {
        for p in col_start[f]..col_start[f + 1] {
            let j = cperm_init[n1 + p];
            for &r in a.col(j) {
                if in_front[r] == dummy {
                    in_front[r] = f as isize;
                    first_row[f] += 1;
                }
            }
        }
    }

    // tally -> starting offsets; singleton rows occupy [0, n1)
    let mut sum = n1;
    for f in 0..=nfr {
        let tally = first_row[f];
        first_row[f] = sum;
        sum += tally;
    }
    // the dummy tally was never counted; it is everything left over
    first_row[nfr + 1] = n_row;

    let mut rperm_init = vec![0usize; n_row];
    rperm_init[..n1].copy_from_slice(&sing.rperm1[..n1]);

    // rows claimed by a front land contiguously, in encounter order; a
    // written row is flip-marked so the second scan writes it once
    let mut next = first_row.clone();
    for f in 0..nfr {
        for p in col_start[f]..col_start[f + 1] {
            let j = cperm_init[n1 + p];
            for &r in a.col(j) {
                if in_front[r] == f as isize {
                    rperm_init[next[f]] = r;
                    next[f] += 1;
                    in_front[r] = flip(f as isize);
                }
            }
        }
        debug_assert_eq!(next[f], first_row[f + 1]);
    }

    // unassigned rows go to the dummy front: rows emptied by the peel
    // first, originally-empty rows last (in original order, so the
    // trailing nempty_row slots are exactly the originally-empty rows)
    let mut pos = first_row[nfr];
    let empty_start = n_row - sing.nempty_row;
    for r in 0..n_row {
        if in_front[r] == dummy && sing.inv_rperm1[r] < empty_start {
            rperm_init[pos] = r;
            pos += 1;
        }
    }
    for r in 0..n_row {
        if in_front[r] == dummy && sing.inv_rperm1[r] >= empty_start {
            rperm_init[pos] = r;
            pos += 1;
        }
    }
    debug_assert_eq!(pos, n_row);

    // restore the claim map for the caller
    for r in 0..n_row {
        in_front[r] = unflip(in_front[r]);
    }

    // --- leftmost descendants ---
    // parent[f] > f, so walking up from each front in order reaches every
    // ancestor before any of its later descendants could
    let mut leftmost_desc = vec![EMPTY; nfr];
    for f in 0..nfr {
        let mut i = f as isize;
        while i != EMPTY && leftmost_desc[i as usize] == EMPTY {
            leftmost_desc[i as usize] = f as isize;
            i = tree.parent[i as usize];
        }
    }
    let leftmost_desc: Vec<usize> = leftmost_desc.iter().map(|&d| d as usize).collect();

    // --- chains ---
    // a chain ends wherever a front's parent is not the next front
    let mut chain_start = Vec::new();
    let mut chain_maxrows = Vec::new();
    let mut chain_maxcols = Vec::new();
    let mut maxnrows = 0usize;
    let mut maxncols = 0usize;

    if nfr > 0 {
        chain_start.push(0);
        let mut maxrows = 0usize;
        let mut maxcols = 0usize;
        for f in 0..nfr {
            maxrows = maxrows.max(tree.nrows[f]);
            maxcols = maxcols.max(tree.ncols[f]);
            if tree.parent[f] != (f + 1) as isize {
                // the numeric kernel wants an odd leading dimension
                if maxrows % 2 == 0 {
                    maxrows += 1;
                }
                chain_maxrows.push(maxrows);
                chain_maxcols.push(maxcols);
                maxnrows = maxnrows.max(maxrows);
                maxncols = maxncols.max(maxcols);
                chain_start.push(f + 1);
                maxrows = 0;
                maxcols = 0;
            }
        }
    }
    let nchains = chain_maxrows.len();
    debug_assert!(nfr == 0 || chain_start.len() == nchains + 1);
    debug_assert!(nfr == 0 || chain_start[nchains] == nfr);

    // --- degrees under the final orderings ---
    let cdeg: Vec<usize> = (0..n_col).map(|k| sing.cdeg[cperm_init[k]]).collect();
    let rdeg: Vec<usize> = (0..n_row).map(|k| sing.rdeg[rperm_init[k]]).collect();

    // --- element sizes when dense rows are split off ---
    let ncol2 = sing.ncol2(n_col);
    let esize = if sing.max_rdeg > dense_row_threshold {
        let mut esize = vec![0usize; ncol2];
        for p in 0..ncol2 {
            let j = cperm_init[n1 + p];
            let mut dense_entries = 0usize;
            for &r in a.col(j) {
                if in_front[r] != EMPTY && sing.rdeg[r] > dense_row_threshold {
                    dense_entries += 1;
                }
            }
            debug_assert!(dense_entries <= cdeg[n1 + p]);
            esize[p] = cdeg[n1 + p] - dense_entries;
        }
        Some(esize)
    } else {
        None
    };

    // --- diagonal map ---
    let diagonal_map = if want_diagonal_map && n_row == n_col {
        let mut inv_rperm = vec![0usize; n_row];
        inverse_permutation(n_row, &rperm_init, &mut inv_rperm);
        Some((0..n_col).map(|k| inv_rperm[cperm_init[k]]).collect())
    } else {
        None
    };

    let first_row = first_row[..nfr + 1].to_vec();

    FrontLayout {
        rperm_init,
        first_row,
        in_front,
        leftmost_desc,
        nchains,
        chain_start,
        chain_maxrows,
        chain_maxcols,
        maxnrows,
        maxncols,
        cdeg,
        rdeg,
        esize,
        diagonal_map,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::builder::MatrixBuilder;
    use crate::matrix::csc::CscMatrix;
    use crate::symbolic::etree::analyze_fronts;
    use crate::symbolic::singletons::find_singletons;
    use crate::utils::is_permutation;

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

    #[test]
    fn tridiagonal_natural_layout() {
        let a = tridiagonal(5);
        let p = a.pointers();
        let sing = find_singletons(&p, true);
        assert_eq!(sing.n1, 0);
        let qinv: Vec<usize> = (0..5).collect();
        let tree = analyze_fronts(&p, &qinv, true).unwrap();
        let cperm_init: Vec<usize> = (0..5).collect();
        let layout = finalize_fronts(&p, &tree, &sing, &cperm_init, usize::MAX, true);

        assert!(is_permutation(5, &layout.rperm_init));
        // one chain covering all four fronts, odd leading dimension
        assert_eq!(layout.nchains, 1);
        assert_eq!(layout.chain_start, vec![0, 4]);
        assert_eq!(layout.chain_maxrows, vec![3]);
        assert_eq!(layout.chain_maxcols, vec![3]);
        assert!(layout.chain_maxrows[0] % 2 == 1);
        // the first front claims rows 0 and 1, each later front one row
        assert_eq!(layout.first_row, vec![0, 2, 3, 4, 5]);
        // every row claimed by a real front
        assert!(layout.in_front.iter().all(|&f| f >= 0 && f < 4));
        // a linear chain has leftmost descendant 0 everywhere
        assert_eq!(layout.leftmost_desc, vec![0; 4]);
        assert!(layout.esize.is_none());
        let dm = layout.diagonal_map.unwrap();
        for k in 0..5 {
            assert!(dm[k] < 5);
        }
    }

    #[test]
    fn singleton_rows_keep_their_slots() {
        // arrow: rows 1..3 peel as singletons, the 1x1 block follows; no
        // fronts remain, all rows sit in the singleton prefix
        let mut b = MatrixBuilder::new(4, 4);
        for c in 0..4 {
            b.push(c, 0, 1.0).unwrap();
        }
        for i in 1..4 {
            b.push(i, i, 1.0).unwrap();
        }
        let a = b.build_csc().unwrap();
        let p = a.pointers();
        let sing = find_singletons(&p, true);
        assert_eq!(sing.n1, 4);
        let tree = analyze_fronts(
            &CscMatrix {
                dim: crate::matrix::Dim { nrows: 0, ncols: 0 },
                column_pointers: vec![0],
                row_indices: vec![],
                values: vec![],
            }
            .pointers(),
            &[],
            true,
        )
        .unwrap();
        let layout = finalize_fronts(&p, &tree, &sing, &sing.cperm1, usize::MAX, true);
        assert_eq!(layout.rperm_init, sing.rperm1);
        assert_eq!(layout.nchains, 0);
        assert!(layout.in_front.iter().all(|&f| f == EMPTY));
        assert_eq!(layout.first_row, vec![4]);
    }

    #[test]
    fn empty_rows_trail_the_row_permutation() {
        // row 2 is empty; it must land in the last slot via the dummy front
        let mut b = MatrixBuilder::new(3, 3);
        b.push(0, 0, 1.0).unwrap();
        b.push(1, 0, 1.0).unwrap();
        b.push(0, 1, 1.0).unwrap();
        b.push(1, 1, 1.0).unwrap();
        b.push(2, 0, 1.0).unwrap();
        b.push(2, 1, 1.0).unwrap();
        let a = b.build_csc().unwrap();
        let p = a.pointers();
        let sing = find_singletons(&p, true);
        assert_eq!(sing.nempty_row, 1);
        let ncol2 = sing.ncol2(3);
        let (sp, si) = super::super::build_pruned_pattern(&p, &sing);
        let s = CscPointers::new(
            crate::matrix::Dim {
                nrows: sing.nrow2(3),
                ncols: ncol2,
            },
            &sp,
            &si,
        );
        let qinv: Vec<usize> = (0..ncol2).collect();
        let tree = analyze_fronts(&s, &qinv, true).unwrap();
        let layout = finalize_fronts(&p, &tree, &sing, &sing.cperm1, usize::MAX, false);
        assert!(is_permutation(3, &layout.rperm_init));
        assert_eq!(*layout.rperm_init.last().unwrap(), 2);
        assert_eq!(layout.in_front[2], tree.nfr as isize);
    }

    #[test]
    fn dense_rows_shrink_element_sizes() {
        // 6x6: row 0 is full (degree 6), the rest tridiagonal-ish; with a
        // low threshold row 0 splits off and every column containing it
        // loses one from its element size
        let n = 6;
        let mut b = MatrixBuilder::new(n, n);
        for c in 0..n {
            b.push(c, 0, 1.0).unwrap();
        }
        // keep column 0 out of the singleton peel
        b.push(0, 1, 1.0).unwrap();
        for i in 1..n {
            b.push(i, i, 2.0).unwrap();
            if i + 1 < n {
                b.push(i, i + 1, -1.0).unwrap();
                b.push(i + 1, i, -1.0).unwrap();
            }
        }
        let a = b.build_csc().unwrap();
        let p = a.pointers();
        let sing = find_singletons(&p, true);
        assert_eq!(sing.n1, 0);
        assert_eq!(sing.max_rdeg, 6);
        let qinv: Vec<usize> = (0..n).collect();
        let tree = analyze_fronts(&p, &qinv, true).unwrap();
        let cperm_init: Vec<usize> = (0..n).collect();
        let layout = finalize_fronts(&p, &tree, &sing, &cperm_init, 3, false);
        let esize = layout.esize.unwrap();
        for k in 0..n {
            assert_eq!(esize[k], layout.cdeg[k] - 1);
        }
    }
}
