// SPDX-License-Identifier: GPL-2.0-or-later
//
// This file is based on the SuiteSparse UMFPACK implementation
// (umf_symbolic memory-usage simulation) by Timothy A. Davis.
//
// UMFPACK, Copyright (c) 1995-2024, Timothy A. Davis.  All Rights Reserved.
//
// Modifications/porting for this project:
// Copyright (c) 2025 Ido Ben Amram

use crate::symbolic::Scalar;
use crate::symbolic::etree::FrontTree;
use crate::symbolic::fronts::FrontLayout;
use crate::utils::EMPTY;

/// Numeric-phase projections, in arena Units (one Unit = one 8-byte slot).
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Estimates {
    /// high-water mark of head + tail
    pub peak_usage: usize,
    pub head_usage: usize,
    pub tail_usage: usize,
    /// off-diagonal nonzeros of L, upper bound
    pub lnz_bound: usize,
    /// off-diagonal nonzeros of U, upper bound
    pub unz_bound: usize,
    /// total nonzeros of L + U counting each diagonal once
    pub lunz_bound: usize,
    pub flops_bound: f64,
    /// largest per-chain frontal workspace
    pub dmax_usage: usize,
    pub num_mem_init_usage: usize,
    pub num_mem_size_est: usize,
    pub num_mem_usage_est: usize,
}

/// element record: header, row and column index lists, numerical block
fn element_units<S: Scalar>(nrows: usize, ncols: usize) -> usize {
    2 + (nrows + ncols) + nrows * ncols * S::ENTRY_UNITS
}

/// a tuple is an (element, offset) index pair; a list carries a one-Unit
/// header
fn tuple_list_units(tlen: usize) -> usize {
    1 + 2 * tlen
}

/// Walk the chains simulating the numeric kernel's memory discipline: the
/// head of the arena grows with finalized L/U columns, the tail holds
/// element records and tuple lists, frontal workspace is shared across a
/// chain. The high-water mark of head + tail is what the kernel will ask
/// for.
#[allow(clippy::too_many_arguments)]
pub fn simulate_numeric<S: Scalar>(
    n_row: usize,
    n_col: usize,
    n1: usize,
    nempty_row: usize,
    nempty_col: usize,
    nb: usize,
    snz: usize,
    dense_row_threshold: usize,
    tree: &FrontTree,
    layout: &FrontLayout,
) -> Estimates {
    let nfr = tree.nfr;
    let ncol2 = n_col - n1 - nempty_col;
    let eu = S::ENTRY_UNITS;

    // stage 1: markers and the row-form scratch used while the kernel
    // builds its initial elements
    let mut head = 1usize;
    let mut tail = 2usize;
    let nrow2 = n_row - n1 - nempty_row;
    let rpi_units = (nrow2 + 1) + snz;
    tail += rpi_units;
    let mut max_usage = head + tail;

    // stage 2: singleton L and U columns land at the head, indices and
    // values each
    let mut lnz = 0usize;
    let mut unz = 0usize;
    for k in 0..n1 {
        let l_entries = layout.cdeg[k].saturating_sub(1);
        let u_entries = layout.rdeg[k].saturating_sub(1);
        lnz += l_entries;
        unz += u_entries;
        head += l_entries * (1 + eu) + u_entries * (1 + eu);
    }
    max_usage = max_usage.max(head + tail);

    // stage 3: one element per surviving column, one per dense row
    for p in 0..ncol2 {
        let cd = layout.cdeg[n1 + p];
        if cd == 0 {
            continue;
        }
        let es = layout.esize.as_ref().map(|e| e[p]).unwrap_or(cd);
        if es > 0 {
            tail += element_units::<S>(es, 1);
        }
    }
    for i in n1..(n_row - nempty_row) {
        let rd = layout.rdeg[i];
        if rd > dense_row_threshold {
            tail += element_units::<S>(1, rd);
        }
    }
    max_usage = max_usage.max(head + tail);

    // stage 4: per-row and per-column tuple lists
    for i in n1..(n_row - nempty_row) {
        let rd = layout.rdeg[i];
        let tlen = if rd > dense_row_threshold { 1 } else { rd };
        tail += tuple_list_units(tlen);
    }
    for p in 0..ncol2 {
        let cd = layout.cdeg[n1 + p];
        let tlen = if cd == 0 {
            0
        } else {
            let es = layout.esize.as_ref().map(|e| e[p]).unwrap_or(cd);
            (if es > 0 { 1 } else { 0 }) + (cd - es)
        };
        tail += tuple_list_units(tlen);
    }
    max_usage = max_usage.max(head + tail);

    // stage 5: this is what the kernel allocates before any elimination
    let num_mem_init_usage = head + tail;
    tail -= rpi_units;

    // stage 6: walk the chains
    let mut child_head = vec![EMPTY; nfr];
    let mut next_sibling = vec![EMPTY; nfr];
    let mut elem_units_of = vec![0usize; nfr];
    let mut flops = 0.0f64;
    let mut dmax_usage = 0usize;

    for c in 0..layout.nchains {
        let f1 = layout.chain_start[c];
        let f2 = layout.chain_start[c + 1];
        let dr = layout.chain_maxrows[c];
        let dc = layout.chain_maxcols[c];
        // frontal workspace for the whole chain: LU block, L and U panels,
        // and the Schur update block
        let fw = (nb * nb + dr * nb + nb * dc + dr * dc) * eu;
        dmax_usage = dmax_usage.max(fw);
        tail += fw;
        max_usage = max_usage.max(head + tail);

        for f in f1..f2 {
            // assemble every child of f: their elements leave the tail
            let mut e = child_head[f];
            while e != EMPTY {
                tail -= elem_units_of[e as usize];
                e = next_sibling[e as usize];
            }

            let fp = tree.npivcol[f];
            let r = tree.nrows[f].saturating_sub(fp);
            let cc = tree.ncols[f].saturating_sub(fp);
            let (fpf, rf, cf) = (fp as f64, r as f64, cc as f64);

            flops += S::DIV_FLOPS * (fpf * rf + fpf * (fpf - 1.0) / 2.0)
                + S::MULTSUB_FLOPS
                    * (fpf * rf * cf
                        + (rf + cf) * fpf * (fpf - 1.0) / 2.0
                        + fpf * (fpf - 1.0) * (2.0 * fpf - 1.0) / 6.0);

            lnz += fp * r + fp * (fp - 1) / 2;
            unz += fp * cc + fp * (fp - 1) / 2;

            // finalized L and U columns of this front move to the head
            let dlf = fp * r + fp * (fp + 1) / 2;
            let duf = fp * cc + fp * (fp + 1) / 2;
            head += (dlf + duf) * eu + (r + cc + fp);
            max_usage = max_usage.max(head + tail);

            // the Schur complement waits at the tail for its parent
            let parent = tree.parent[f];
            if parent != EMPTY && r > 0 && cc > 0 {
                let units = element_units::<S>(r, cc);
                elem_units_of[f] = units;
                tail += units;
                next_sibling[f] = child_head[parent as usize];
                child_head[parent as usize] = f as isize;
                max_usage = max_usage.max(head + tail);
            }
        }

        tail -= fw;
    }

    let n_inner = n_row.min(n_col);
    let lunz_bound = lnz + unz + n_inner;

    let num_mem_size_est = head.max(num_mem_init_usage);
    let num_mem_usage_est = max_usage.max(num_mem_size_est);

    Estimates {
        peak_usage: max_usage,
        head_usage: head,
        tail_usage: tail,
        lnz_bound: lnz,
        unz_bound: unz,
        lunz_bound,
        flops_bound: flops,
        dmax_usage,
        num_mem_init_usage,
        num_mem_size_est,
        num_mem_usage_est,
    }
}
