// SPDX-License-Identifier: BSD-3-Clause
//
// The degree-list handling and cost accumulation in this file are based on
// the SuiteSparse AMD implementation by Timothy A. Davis and collaborators.
//
// AMD, Copyright (c) 1996-2022, Timothy A. Davis, Patrick R. Amestoy, and
// Iain S. Duff.  All Rights Reserved.
//
// Modifications/porting for this project:
// Copyright (c) 2025 Ido Ben Amram

use crate::matrix::csc::CscPointers;
use crate::utils::EMPTY;

/// Cost statistics of a minimum-degree run, accumulated the way AMD
/// accumulates them (`lnz` excludes the diagonal; flops are for LU).
#[derive(Debug, Clone, Copy)]
pub struct MinDegreeStats {
    pub lnz: f64,
    pub ndiv: f64,
    pub nms_lu: f64,
    pub dmax: f64,
    pub ndense: usize,
}

impl Default for MinDegreeStats {
    fn default() -> Self {
        Self {
            lnz: 0.0,
            ndiv: 0.0,
            nms_lu: 0.0,
            dmax: 1.0,
            ndense: 0,
        }
    }
}

/// A node is "dense" if its degree exceeds this cutoff; dense nodes are
/// parked and ordered last. A node with 16 or fewer neighbors is never
/// considered dense.
pub fn dense_degree_threshold(factor: f64, n: usize) -> usize {
    let dense = (factor * 16.0 * (n as f64).sqrt()) as usize;
    dense.max(16).min(n)
}

fn add_to_degree_list(
    i: usize,
    n: usize,
    deg: usize,
    head: &mut [isize],
    last: &mut [isize],
    next: &mut [isize],
) {
    let inext = head[deg];
    debug_assert!(inext >= EMPTY && inext < n as isize);
    if inext != EMPTY {
        last[inext as usize] = i as isize;
    }
    next[i] = inext;
    last[i] = EMPTY;
    head[deg] = i as isize;
}

fn remove_from_degree_list(
    i: usize,
    n: usize,
    deg: usize,
    head: &mut [isize],
    last: &mut [isize],
    next: &mut [isize],
) {
    let inext = next[i];
    let ilast = last[i];
    debug_assert!(inext >= EMPTY && inext < n as isize);
    debug_assert!(ilast >= EMPTY && ilast < n as isize);
    if inext != EMPTY {
        last[inext as usize] = ilast;
    }
    if ilast != EMPTY {
        next[ilast as usize] = inext;
    } else {
        // i is at the head of the degree list
        debug_assert!(deg < n);
        head[deg] = inext;
    }
}

/// Minimum-degree ordering of an undirected graph given as a symmetric
/// adjacency pattern without self edges. Writes the forward permutation
/// (perm[k] = node eliminated k-th, dense nodes parked at the end).
///
/// This is the collaborator role of AMD, not a port of it: eliminations
/// merge neighbor lists into an explicit clique with marker-stamped
/// deduplication instead of AMD's quotient graph. Supervariables are kept:
/// with `coarsen` enabled, neighbors of the pivot with identical adjacency
/// are merged and eliminated together, and the cost statistics use the
/// supervariable sizes exactly as AMD does.
pub fn minimum_degree(
    n: usize,
    cp: &[usize],
    ci: &[usize],
    dense: usize,
    coarsen: bool,
    perm: &mut [isize],
) -> MinDegreeStats {
    let mut stats = MinDegreeStats::default();
    if n == 0 {
        return stats;
    }
    debug_assert!(perm.len() >= n);

    let mut adj: Vec<Vec<usize>> = (0..n).map(|j| ci[cp[j]..cp[j + 1]].to_vec()).collect();
    let mut alive = vec![true; n];
    // supervariable size; 0 once merged into another node
    let mut nv = vec![1usize; n];
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut degree = vec![0usize; n];

    let mut head = vec![EMPTY; n + 1];
    let mut next = vec![EMPTY; n];
    let mut last = vec![EMPTY; n];

    // marker stamping for clique deduplication and set comparison
    let mut marker = vec![0usize; n];
    let mut tag = 0usize;

    let mut parked: Vec<usize> = Vec::new();
    let mut nel = 0usize;
    let mut out = 0usize;

    for i in 0..n {
        let deg = adj[i].len();
        degree[i] = deg;
        if deg > dense {
            // parked: excluded from the ordering, appended at the end
            alive[i] = false;
            stats.ndense += 1;
            parked.push(i);
            nel += 1;
        } else {
            add_to_degree_list(i, n + 1, deg, &mut head, &mut last, &mut next);
        }
    }

    let mut mindeg = 0usize;
    while nel < n {
        // next pivot supervariable
        while head[mindeg] == EMPTY {
            mindeg += 1;
            debug_assert!(mindeg <= n);
        }
        let me = head[mindeg] as usize;
        remove_from_degree_list(me, n + 1, mindeg, &mut head, &mut last, &mut next);
        alive[me] = false;

        // neighbors of the pivot, alive supervariables only
        tag += 1;
        let mut nbrs: Vec<usize> = Vec::with_capacity(adj[me].len());
        for &u in &adj[me] {
            if alive[u] && marker[u] != tag {
                marker[u] = tag;
                nbrs.push(u);
            }
        }

        let f = nv[me] as f64;
        let r: usize = nbrs.iter().map(|&u| nv[u]).sum();
        nel += nv[me];

        // eliminating me turns its neighborhood into a clique
        for &u in &nbrs {
            tag += 1;
            let mut merged: Vec<usize> = Vec::with_capacity(adj[u].len() + nbrs.len());
            marker[u] = tag;
            for &v in &adj[u] {
                if alive[v] && v != me && marker[v] != tag {
                    marker[v] = tag;
                    merged.push(v);
                }
            }
            for &v in &nbrs {
                if v != u && marker[v] != tag {
                    marker[v] = tag;
                    merged.push(v);
                }
            }
            adj[u] = merged;
        }

        // coarsening: merge indistinguishable neighbors so they pivot
        // together. u and v are indistinguishable when their live
        // adjacency sets agree once u and v themselves are excluded.
        if coarsen {
            let mut i = 0;
            while i < nbrs.len() {
                let u = nbrs[i];
                if nv[u] == 0 {
                    i += 1;
                    continue;
                }
                let mut j = i + 1;
                while j < nbrs.len() {
                    let v = nbrs[j];
                    if nv[v] != 0 {
                        tag += 1;
                        let mut ulen = 0usize;
                        for &w in &adj[u] {
                            if alive[w] && w != v {
                                marker[w] = tag;
                                ulen += 1;
                            }
                        }
                        let mut vlen = 0usize;
                        let mut same = true;
                        for &w in &adj[v] {
                            if alive[w] && w != u {
                                vlen += 1;
                                if marker[w] != tag {
                                    same = false;
                                    break;
                                }
                            }
                        }
                        if same && ulen == vlen {
                            // absorb v into u
                            nv[u] += nv[v];
                            nv[v] = 0;
                            alive[v] = false;
                            let mut vm = std::mem::take(&mut members[v]);
                            members[u].push(v);
                            members[u].append(&mut vm);
                            remove_from_degree_list(
                                v, n + 1, degree[v], &mut head, &mut last, &mut next,
                            );
                        }
                    }
                    j += 1;
                }
                i += 1;
            }
        }

        // refresh degrees and list positions of the surviving neighbors
        for &u in &nbrs {
            if nv[u] == 0 {
                continue;
            }
            let newdeg: usize = adj[u].iter().filter(|&&v| alive[v]).map(|&v| nv[v]).sum();
            remove_from_degree_list(u, n + 1, degree[u], &mut head, &mut last, &mut next);
            degree[u] = newdeg;
            add_to_degree_list(u, n + 1, newdeg, &mut head, &mut last, &mut next);
            mindeg = mindeg.min(newdeg);
        }

        // emit the pivot supervariable
        perm[out] = me as isize;
        out += 1;
        for &m in &members[me] {
            perm[out] = m as isize;
            out += 1;
        }

        // cost model, per AMD: f pivots eliminated against an r-wide rim
        let rf = r as f64 + stats.ndense as f64;
        stats.dmax = stats.dmax.max(f + rf);
        let lnzme = f * rf + (f - 1.0) * f / 2.0;
        stats.lnz += lnzme;
        stats.ndiv += lnzme;
        stats.nms_lu += f * rf * rf + rf * (f - 1.0) * f + (f - 1.0) * f * (2.0 * f - 1.0) / 6.0;
    }

    // parked dense nodes pivot last, as one big clique
    for &i in &parked {
        perm[out] = i as isize;
        out += 1;
    }
    debug_assert_eq!(out, n);

    let f = stats.ndense as f64;
    stats.dmax = stats.dmax.max(f);
    let lnzme = (f - 1.0) * f / 2.0;
    stats.lnz += lnzme;
    stats.ndiv += lnzme;
    stats.nms_lu += (f - 1.0) * f * (2.0 * f - 1.0) / 6.0;

    stats
}

/// Adjacency of the column-intersection graph of a rectangular pattern:
/// two columns are neighbors iff they share a row. Rows wider than
/// `dense_row` are skipped (a dense row would connect everything to
/// everything, which is exactly what COLAMD refuses to pay for).
pub fn column_graph(a: &CscPointers<'_>, dense_row: usize) -> (Vec<usize>, Vec<usize>) {
    let n = a.dim.ncols;
    let (rp, ri) = a.transpose_pattern();

    let mut lists: Vec<Vec<usize>> = vec![Vec::new(); n];
    for r in 0..a.dim.nrows {
        let row = &ri[rp[r]..rp[r + 1]];
        if row.len() < 2 || row.len() > dense_row {
            continue;
        }
        for &c in row {
            for &d in row {
                if d != c {
                    lists[c].push(d);
                }
            }
        }
    }

    let mut cp = vec![0usize; n + 1];
    let mut ci = Vec::new();
    for j in 0..n {
        lists[j].sort_unstable();
        lists[j].dedup();
        ci.extend_from_slice(&lists[j]);
        cp[j + 1] = ci.len();
    }
    (cp, ci)
}
