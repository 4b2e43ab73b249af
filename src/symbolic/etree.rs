// SPDX-License-Identifier: GPL-2.0-or-later
//
// This file is based on the SuiteSparse UMFPACK implementation
// (umf_analyze) by Timothy A. Davis.
//
// UMFPACK, Copyright (c) 1995-2024, Timothy A. Davis.  All Rights Reserved.
//
// Modifications/porting for this project:
// Copyright (c) 2025 Ido Ben Amram

use crate::matrix::csc::CscPointers;
use crate::symbolic::error::{SymbolicError, SymbolicResult};
use crate::utils::EMPTY;

/// Frontal matrix tree of the pruned matrix under a fixed column order.
///
/// Fronts are numbered in pivot-column order; front f eliminates the
/// `npivcol[f]` consecutive pivot columns starting at
/// `npivcol[0] + .. + npivcol[f-1]`. `parent[f]` is `EMPTY` for roots and
/// strictly greater than f otherwise.
#[derive(Debug)]
pub struct FrontTree {
    pub nfr: usize,
    pub npivcol: Vec<usize>,
    pub nrows: Vec<usize>,
    pub ncols: Vec<usize>,
    pub parent: Vec<isize>,
    /// column post-order: `cperm2[new] = old` position in the interior.
    /// Identity when the column order was fixed.
    pub cperm2: Vec<usize>,
}

struct OpenFront {
    npiv: usize,
    /// union pattern at open, sorted; `pattern[cursor..]` is what is left
    /// after the pivots eliminated so far
    pattern: Vec<usize>,
    cursor: usize,
    nrows: usize,
    ncols: usize,
}

/// Symbolic factorization of `S * Pcol`: build the frontal tree by merging
/// row patterns left to right.
///
/// A front opens at pivot position k by assembling every matrix row whose
/// leftmost (permuted) column is k together with every child element whose
/// smallest surviving column is k. It keeps absorbing the next position as
/// long as its own carried element is the only contribution there, then
/// closes, leaving its Schur pattern as an element linked at the smallest
/// surviving column. The front owning that column becomes its parent.
pub fn analyze_fronts(
    s: &CscPointers<'_>,
    qinv: &[usize],
    fix_q: bool,
) -> SymbolicResult<FrontTree> {
    let nrow2 = s.dim.nrows;
    let ncol2 = s.dim.ncols;
    debug_assert_eq!(qinv.len(), ncol2);

    if ncol2 == 0 {
        return Ok(FrontTree {
            nfr: 0,
            npivcol: Vec::new(),
            nrows: Vec::new(),
            ncols: Vec::new(),
            parent: Vec::new(),
            cperm2: Vec::new(),
        });
    }

    // forward order: S column at position k
    let mut scol_of = vec![0usize; ncol2];
    for (j, &k) in qinv.iter().enumerate() {
        debug_assert!(k < ncol2);
        scol_of[k] = j;
    }

    // first-touch row order: a row is first seen at its leftmost permuted
    // column, so the order groups rows by leftmost position
    let mut row_pos = vec![EMPTY; nrow2];
    let mut nlive = 0usize;
    for k in 0..ncol2 {
        for &r in s.col(scol_of[k]) {
            if row_pos[r] == EMPTY {
                row_pos[r] = nlive as isize;
                nlive += 1;
            }
        }
    }

    // row form B of S * Pcol, live rows only, patterns sorted by position
    let mut bp = vec![0usize; nlive + 1];
    for &r in s.row_indices() {
        bp[row_pos[r] as usize + 1] += 1;
    }
    for i in 0..nlive {
        bp[i + 1] += bp[i];
    }
    let mut bi = vec![0usize; s.nnz()];
    let mut next = bp.clone();
    for k in 0..ncol2 {
        for &r in s.col(scol_of[k]) {
            let i = row_pos[r] as usize;
            bi[next[i]] = k;
            next[i] += 1;
        }
    }

    // rows_at[k]: the contiguous range of B rows whose leftmost column is k
    let mut rows_at = vec![0usize; ncol2 + 1];
    for i in 0..nlive {
        let leftmost = bi[bp[i]];
        rows_at[leftmost + 1] += 1;
    }
    for k in 0..ncol2 {
        rows_at[k + 1] += rows_at[k];
    }
    for i in 0..nlive {
        // first-touch order is leftmost-sorted
        debug_assert!(i == 0 || bi[bp[i - 1]] <= bi[bp[i]]);
    }

    // per-front outputs; each closed front leaves at most one element, so
    // elements are keyed by front index
    let mut npivcol: Vec<usize> = Vec::new();
    let mut nrows: Vec<usize> = Vec::new();
    let mut ncols: Vec<usize> = Vec::new();
    let mut parent_col: Vec<isize> = Vec::new();
    let mut elem_cols: Vec<Vec<usize>> = Vec::new();
    let mut elem_rows: Vec<usize> = Vec::new();

    // element lists keyed by column position, index-linked
    let mut link_head = vec![EMPTY; ncol2];
    let mut link_next: Vec<isize> = Vec::new();

    // marker stamping for the union pattern
    let mut marker = vec![0usize; ncol2];
    let mut tag = 0usize;

    let mut open: Option<OpenFront> = None;

    let close = |f: OpenFront,
                     npivcol: &mut Vec<usize>,
                     nrows: &mut Vec<usize>,
                     ncols: &mut Vec<usize>,
                     parent_col: &mut Vec<isize>,
                     elem_cols: &mut Vec<Vec<usize>>,
                     elem_rows: &mut Vec<usize>,
                     link_head: &mut [isize],
                     link_next: &mut Vec<isize>| {
        let fid = npivcol.len();
        let remaining = f.pattern[f.cursor..].to_vec();
        npivcol.push(f.npiv);
        nrows.push(f.nrows);
        ncols.push(f.ncols);
        let schur_rows = f.nrows.saturating_sub(f.npiv);
        if let Some(&m) = remaining.first() {
            parent_col.push(m as isize);
            // keep the element even when it carries no rows so the column
            // pattern still reaches the parent
            elem_cols.push(remaining);
            elem_rows.push(schur_rows);
            link_next.push(link_head[m]);
            link_head[m] = fid as isize;
        } else {
            parent_col.push(EMPTY);
            elem_cols.push(Vec::new());
            elem_rows.push(0);
            link_next.push(EMPTY);
        }
    };

    for k in 0..ncol2 {
        let new_rows = rows_at[k]..rows_at[k + 1];
        let has_new_rows = !new_rows.is_empty();
        let has_links = link_head[k] != EMPTY;

        let absorbed = match open.as_mut() {
            Some(f) if !has_new_rows && !has_links && f.pattern.get(f.cursor) == Some(&k) => {
                // the carried element is the only contribution at k:
                // absorb k into the current front
                f.npiv += 1;
                f.cursor += 1;
                true
            }
            _ => false,
        };
        if absorbed {
            continue;
        }
        if let Some(f) = open.take() {
            close(
                f,
                &mut npivcol,
                &mut nrows,
                &mut ncols,
                &mut parent_col,
                &mut elem_cols,
                &mut elem_rows,
                &mut link_head,
                &mut link_next,
            );
        }

        // open a new front at k
        tag += 1;
        let mut pattern: Vec<usize> = Vec::new();
        let mut total_rows = 0usize;
        marker[k] = tag;
        pattern.push(k);
        for i in new_rows {
            total_rows += 1;
            for &c in &bi[bp[i]..bp[i + 1]] {
                if marker[c] != tag {
                    marker[c] = tag;
                    pattern.push(c);
                }
            }
        }
        let mut e = link_head[k];
        while e != EMPTY {
            let eid = e as usize;
            total_rows += elem_rows[eid];
            for &c in &elem_cols[eid] {
                if marker[c] != tag {
                    marker[c] = tag;
                    pattern.push(c);
                }
            }
            e = link_next[eid];
            // the element is consumed by this front
        }
        link_head[k] = EMPTY;
        pattern.sort_unstable();
        if pattern[0] != k {
            return Err(SymbolicError::InternalError {
                context: "front pattern does not start at its pivot column",
            });
        }

        open = Some(OpenFront {
            npiv: 1,
            ncols: pattern.len(),
            nrows: total_rows,
            pattern,
            cursor: 1,
        });
    }

    if let Some(f) = open.take() {
        close(
            f,
            &mut npivcol,
            &mut nrows,
            &mut ncols,
            &mut parent_col,
            &mut elem_cols,
            &mut elem_rows,
            &mut link_head,
            &mut link_next,
        );
    }

    let nfr = npivcol.len();
    debug_assert_eq!(npivcol.iter().sum::<usize>(), ncol2);

    // map pivot positions to fronts and resolve parent columns to fronts
    let mut front_of = vec![0usize; ncol2];
    let mut k = 0;
    for f in 0..nfr {
        for _ in 0..npivcol[f] {
            front_of[k] = f;
            k += 1;
        }
    }
    let mut parent: Vec<isize> = Vec::with_capacity(nfr);
    for f in 0..nfr {
        let p = parent_col[f];
        if p == EMPTY {
            parent.push(EMPTY);
        } else {
            let pf = front_of[p as usize];
            debug_assert!(pf > f);
            parent.push(pf as isize);
        }
    }

    if fix_q {
        return Ok(FrontTree {
            nfr,
            npivcol,
            nrows,
            ncols,
            parent,
            cperm2: (0..ncol2).collect(),
        });
    }

    // post-order the tree so that chains become contiguous; the heaviest
    // child is visited last, right before its parent
    let work: Vec<usize> = (0..nfr).map(|f| nrows[f] * ncols[f]).collect();
    let order = postorder_fronts(nfr, &parent, &work);

    let mut inv_order = vec![0usize; nfr];
    for f in 0..nfr {
        inv_order[order[f]] = f;
    }

    let mut col_start = vec![0usize; nfr + 1];
    for f in 0..nfr {
        col_start[f + 1] = col_start[f] + npivcol[f];
    }

    let mut cperm2 = Vec::with_capacity(ncol2);
    let mut new_npivcol = Vec::with_capacity(nfr);
    let mut new_nrows = Vec::with_capacity(nfr);
    let mut new_ncols = Vec::with_capacity(nfr);
    let mut new_parent = Vec::with_capacity(nfr);
    for nf in 0..nfr {
        let f = inv_order[nf];
        for k in col_start[f]..col_start[f + 1] {
            cperm2.push(k);
        }
        new_npivcol.push(npivcol[f]);
        new_nrows.push(nrows[f]);
        new_ncols.push(ncols[f]);
        let p = parent[f];
        new_parent.push(if p == EMPTY {
            EMPTY
        } else {
            order[p as usize] as isize
        });
    }
    debug_assert_eq!(cperm2.len(), ncol2);
    for f in 0..nfr {
        debug_assert!(new_parent[f] == EMPTY || new_parent[f] > f as isize);
    }

    Ok(FrontTree {
        nfr,
        npivcol: new_npivcol,
        nrows: new_nrows,
        ncols: new_ncols,
        parent: new_parent,
        cperm2,
    })
}

/// post-order a forest given by `parent`; returns order[old] = new index.
/// larger `work` children are placed last so chains stay contiguous.
fn postorder_fronts(nfr: usize, parent: &[isize], work: &[usize]) -> Vec<usize> {
    let mut child = vec![EMPTY; nfr];
    let mut sibling = vec![EMPTY; nfr];

    // place the children in link lists, ascending so list order is by index
    for f in (0..nfr).rev() {
        let p = parent[f];
        if p != EMPTY {
            sibling[f] = child[p as usize];
            child[p as usize] = f as isize;
        }
    }

    // move the largest child to the end of each child list
    for i in 0..nfr {
        if child[i] == EMPTY {
            continue;
        }
        let mut fprev = EMPTY;
        let mut bigfprev = EMPTY;
        let mut bigf = EMPTY;
        let mut maxwork = 0usize;
        let mut first = true;

        let mut f = child[i];
        while f != EMPTY {
            let w = work[f as usize];
            if first || w >= maxwork {
                maxwork = w;
                bigfprev = fprev;
                bigf = f;
                first = false;
            }
            fprev = f;
            f = sibling[f as usize];
        }
        debug_assert!(bigf != EMPTY);

        let fnext = sibling[bigf as usize];
        if fnext != EMPTY {
            // bigf is not already last: unlink it and append it
            if bigfprev == EMPTY {
                child[i] = fnext;
            } else {
                sibling[bigfprev as usize] = fnext;
            }
            sibling[bigf as usize] = EMPTY;
            debug_assert!(fprev != bigf && fprev != EMPTY);
            sibling[fprev as usize] = bigf;
        }
    }

    // depth-first search with an explicit stack
    let mut order = vec![0usize; nfr];
    let mut stack = vec![0isize; nfr];
    let mut k = 0usize;
    for root in 0..nfr {
        if parent[root] != EMPTY {
            continue;
        }
        let mut head: isize = 0;
        stack[0] = root as isize;
        while head >= 0 {
            let i = stack[head as usize] as usize;
            if child[i] != EMPTY {
                // push children so the first child pops first
                let mut count = 0;
                let mut f = child[i];
                while f != EMPTY {
                    count += 1;
                    f = sibling[f as usize];
                }
                let mut h = head + count;
                debug_assert!((h as usize) < nfr);
                head = h;
                f = child[i];
                while f != EMPTY {
                    stack[h as usize] = f;
                    h -= 1;
                    f = sibling[f as usize];
                }
                debug_assert!(stack[h as usize] == i as isize);
                // delete the child list so i is emitted next time around
                child[i] = EMPTY;
            } else {
                head -= 1;
                order[i] = k;
                k += 1;
            }
        }
    }
    debug_assert_eq!(k, nfr);
    order
}
