// SPDX-License-Identifier: GPL-2.0-or-later
//
// This file is based on the SuiteSparse UMFPACK implementation
// (umf_singletons) by Timothy A. Davis.
//
// UMFPACK, Copyright (c) 1995-2024, Timothy A. Davis.  All Rights Reserved.
//
// Modifications/porting for this project:
// Copyright (c) 2025 Ido Ben Amram

use crate::matrix::csc::CscPointers;

/// Outcome of the singleton peel. Permutations and degrees are indexed by
/// original row/column numbers until the front-tree finalization rewrites
/// the degree vectors into permuted order.
#[derive(Debug)]
pub struct Singletons {
    /// total singletons peeled
    pub n1: usize,
    /// peeled with a pivot row of degree 1 and a wider pivot column
    pub n1r: usize,
    /// peeled with a pivot column of degree 1 (including 1-by-1 blocks)
    pub n1c: usize,

    /// singleton columns first (peel order), interior in original order,
    /// originally-empty columns last
    pub cperm1: Vec<usize>,
    pub rperm1: Vec<usize>,
    pub inv_cperm1: Vec<usize>,
    pub inv_rperm1: Vec<usize>,

    /// per original column: degree at elimination for pivots, residual
    /// degree for the interior, 0 for empty columns
    pub cdeg: Vec<usize>,
    pub rdeg: Vec<usize>,

    pub nempty_row: usize,
    pub nempty_col: usize,

    /// the interior of rperm1 and cperm1 agree element-wise
    pub is_sym: bool,
    /// maximum residual row degree over the interior
    pub max_rdeg: usize,
}

impl Singletons {
    pub fn ncol2(&self, n_col: usize) -> usize {
        n_col - self.n1 - self.nempty_col
    }

    pub fn nrow2(&self, n_row: usize) -> usize {
        n_row - self.n1 - self.nempty_row
    }
}

/// Peel degree-1 rows, then degree-1 columns, from the residual matrix.
///
/// The two phases are self-contained: removing a degree-1 row deletes its
/// pivot column, which only shrinks *row* degrees; removing a degree-1
/// column deletes its pivot row, which only shrinks *column* degrees. So a
/// single row pass followed by a single column pass reaches a residual with
/// no singletons of either kind.
///
/// A pivot whose row and column both have degree 1 (a 1-by-1 residual
/// block) counts as a column singleton.
pub fn find_singletons(a: &CscPointers<'_>, do_singletons: bool) -> Singletons {
    let n_row = a.dim.nrows;
    let n_col = a.dim.ncols;

    let mut cdeg: Vec<usize> = (0..n_col).map(|j| a.col_degree(j)).collect();
    let mut rdeg = vec![0usize; n_row];
    for &r in a.row_indices() {
        rdeg[r] += 1;
    }
    // residual degrees before any peel; used to recognize originally-empty
    // rows/columns at the end
    let cdeg0 = cdeg.clone();
    let rdeg0 = rdeg.clone();

    // row form of the pattern, for walking a row's columns
    let (rp, ri) = a.transpose_pattern();

    let mut alive_row = vec![true; n_row];
    let mut alive_col = vec![true; n_col];

    let mut cperm1: Vec<usize> = Vec::new();
    let mut rperm1: Vec<usize> = Vec::new();
    let mut n1r = 0usize;
    let mut n1c = 0usize;

    if do_singletons {
        // --- row phase ---
        let mut queue: Vec<usize> = (0..n_row).filter(|&i| rdeg[i] == 1).collect();
        let mut head = 0;
        while head < queue.len() {
            let r = queue[head];
            head += 1;
            if !alive_row[r] || rdeg[r] != 1 {
                // already peeled, or emptied while waiting in the queue
                continue;
            }
            // the single surviving column of row r
            let mut pivot_col = None;
            for &c in &ri[rp[r]..rp[r + 1]] {
                if alive_col[c] {
                    pivot_col = Some(c);
                    break;
                }
            }
            let c = match pivot_col {
                Some(c) => c,
                None => continue,
            };
            debug_assert!(cdeg[c] >= 1);
            if cdeg[c] == 1 {
                n1c += 1;
            } else {
                n1r += 1;
            }
            rperm1.push(r);
            cperm1.push(c);
            alive_row[r] = false;
            alive_col[c] = false;
            // removing column c shrinks the degree of its other rows
            for &i in a.col(c) {
                if alive_row[i] {
                    debug_assert!(rdeg[i] >= 1);
                    rdeg[i] -= 1;
                    if rdeg[i] == 1 {
                        queue.push(i);
                    }
                }
            }
        }

        // --- column phase ---
        let mut queue: Vec<usize> = (0..n_col)
            .filter(|&j| alive_col[j] && cdeg[j] == 1)
            .collect();
        let mut head = 0;
        while head < queue.len() {
            let c = queue[head];
            head += 1;
            if !alive_col[c] || cdeg[c] != 1 {
                continue;
            }
            let mut pivot_row = None;
            for &r in a.col(c) {
                if alive_row[r] {
                    pivot_row = Some(r);
                    break;
                }
            }
            let r = match pivot_row {
                Some(r) => r,
                None => continue,
            };
            n1c += 1;
            rperm1.push(r);
            cperm1.push(c);
            alive_row[r] = false;
            alive_col[c] = false;
            // removing row r shrinks the degree of its other columns
            for &j in &ri[rp[r]..rp[r + 1]] {
                if alive_col[j] {
                    debug_assert!(cdeg[j] >= 1);
                    cdeg[j] -= 1;
                    if cdeg[j] == 1 {
                        queue.push(j);
                    }
                }
            }
        }
    }

    let n1 = cperm1.len();
    debug_assert!(n1 == n1r + n1c);

    // interior in original order, originally-empty columns/rows last.
    // columns emptied by the peel keep their interior slot (degree 0).
    let mut nempty_col = 0;
    for j in 0..n_col {
        if alive_col[j] && cdeg0[j] > 0 {
            cperm1.push(j);
        }
    }
    for j in 0..n_col {
        if alive_col[j] && cdeg0[j] == 0 {
            cperm1.push(j);
            nempty_col += 1;
        }
    }
    let mut nempty_row = 0;
    for i in 0..n_row {
        if alive_row[i] && rdeg0[i] > 0 {
            rperm1.push(i);
        }
    }
    for i in 0..n_row {
        if alive_row[i] && rdeg0[i] == 0 {
            rperm1.push(i);
            nempty_row += 1;
        }
    }
    debug_assert_eq!(cperm1.len(), n_col);
    debug_assert_eq!(rperm1.len(), n_row);

    let mut inv_cperm1 = vec![0usize; n_col];
    let mut inv_rperm1 = vec![0usize; n_row];
    crate::utils::inverse_permutation(n_col, &cperm1, &mut inv_cperm1);
    crate::utils::inverse_permutation(n_row, &rperm1, &mut inv_rperm1);

    // pattern symmetry of the residual: the interiors must name the same
    // original index at every position
    let mut is_sym = n_row == n_col && nempty_row == nempty_col;
    if is_sym {
        for k in n1..(n_row - nempty_row) {
            if rperm1[k] != cperm1[k] {
                is_sym = false;
                break;
            }
        }
    }

    let mut max_rdeg = 0;
    for k in n1..(n_row - nempty_row) {
        max_rdeg = max_rdeg.max(rdeg[rperm1[k]]);
    }

    Singletons {
        n1,
        n1r,
        n1c,
        cperm1,
        rperm1,
        inv_cperm1,
        inv_rperm1,
        cdeg,
        rdeg,
        nempty_row,
        nempty_col,
        is_sym,
        max_rdeg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::builder::MatrixBuilder;
    use crate::matrix::csc::CscMatrix;

    fn pattern(nrows: usize, ncols: usize, entries: &[(usize, usize)]) -> CscMatrix {
        let mut b = MatrixBuilder::new(nrows, ncols);
        for &(c, r) in entries {
            b.push(c, r, 1.0).unwrap();
        }
        b.build_csc().unwrap()
    }

    #[test]
    fn diagonal_is_all_one_by_one_blocks() {
        let a = pattern(3, 3, &[(0, 0), (1, 1), (2, 2)]);
        let s = find_singletons(&a.pointers(), true);
        assert_eq!(s.n1, 3);
        assert_eq!(s.n1c, 3);
        assert_eq!(s.n1r, 0);
        assert_eq!(s.cperm1, vec![0, 1, 2]);
        assert_eq!(s.rperm1, vec![0, 1, 2]);
        assert!(s.is_sym);
        assert_eq!(s.nempty_col, 0);
        // every pivot was 1-by-1 at elimination
        assert!(s.cdeg.iter().all(|&d| d == 1));
        assert!(s.rdeg.iter().all(|&d| d == 1));
    }

    #[test]
    fn arrow_peels_rows_first_then_final_block() {
        // row 0 full, diagonal elsewhere: rows 1..3 are row singletons,
        // the leftover 1-by-1 at (0,0) counts as a column singleton
        let a = pattern(
            4,
            4,
            &[(0, 0), (1, 0), (2, 0), (3, 0), (1, 1), (2, 2), (3, 3)],
        );
        let s = find_singletons(&a.pointers(), true);
        assert_eq!(s.n1, 4);
        assert_eq!(s.n1r, 3);
        assert_eq!(s.n1c, 1);
        assert_eq!(s.cperm1, vec![1, 2, 3, 0]);
        assert_eq!(s.rperm1, vec![1, 2, 3, 0]);
        // pivot column degrees at elimination: cols 1..3 held two entries
        assert_eq!(s.cdeg[1], 2);
        assert_eq!(s.cdeg[2], 2);
        assert_eq!(s.cdeg[3], 2);
        assert_eq!(s.cdeg[0], 1);
        assert!(s.is_sym);
    }

    #[test]
    fn empty_column_goes_last() {
        let a = pattern(
            4,
            4,
            &[
                (0, 0),
                (0, 1),
                (1, 0),
                (1, 1),
                (1, 3),
                (3, 1),
                (3, 3),
            ],
        );
        // column 2 has no entries
        let s = find_singletons(&a.pointers(), true);
        assert_eq!(s.nempty_col, 1);
        assert_eq!(*s.cperm1.last().unwrap(), 2);
        assert_eq!(s.cdeg[2], 0);
    }

    #[test]
    fn column_emptied_by_peel_stays_interior() {
        // 1-by-2: both columns share the single row; peeling one empties
        // the other, which must keep an interior slot (P2 is exact about
        // the trailing range holding originally-empty columns only)
        let a = pattern(1, 2, &[(0, 0), (1, 0)]);
        let s = find_singletons(&a.pointers(), true);
        assert_eq!(s.n1, 1);
        assert_eq!(s.nempty_col, 0);
        assert_eq!(s.cperm1.len(), 2);
        assert_eq!(s.cdeg[s.cperm1[1]], 0);
    }

    #[test]
    fn disabled_peel_still_places_empties() {
        let a = pattern(3, 3, &[(0, 0), (2, 0), (2, 2)]);
        let s = find_singletons(&a.pointers(), false);
        assert_eq!(s.n1, 0);
        assert_eq!(s.nempty_col, 1);
        assert_eq!(*s.cperm1.last().unwrap(), 1);
        assert_eq!(s.nempty_row, 1);
        assert_eq!(*s.rperm1.last().unwrap(), 1);
    }

    #[test]
    fn tridiagonal_has_no_singletons() {
        let mut entries = Vec::new();
        for i in 0..5usize {
            entries.push((i, i));
            if i + 1 < 5 {
                entries.push((i, i + 1));
                entries.push((i + 1, i));
            }
        }
        let a = pattern(5, 5, &entries);
        let s = find_singletons(&a.pointers(), true);
        assert_eq!(s.n1, 0);
        assert!(s.is_sym);
        assert_eq!(s.max_rdeg, 3);
    }
}
