// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Best-first nearest-neighbor search by box distance.
//!
//! Nodes and entries share one priority queue keyed by their box distance to
//! the query point, so entries come out in non-decreasing distance. At equal
//! distance nodes are expanded before entries are emitted, and entries leave
//! in insertion order; that makes ties stable regardless of tree shape.
//!
//! Box distance is a lower bound of the true distance to whatever shape the box
//! encloses. The k box-nearest entries are therefore candidates, not the exact
//! answer; see [`SpatialIndex::nearest_refined`] for the refinement step.

use alloc::collections::BinaryHeap;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt::{self, Debug};

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::index::SpatialIndex;
use crate::node::{Item, NodeIdx, NodeKind};
use crate::types::{Entry, Point};

/// An entry reached by nearest-neighbor search.
pub struct Neighbor<'a, I> {
    /// The stored entry.
    pub entry: &'a Entry<I>,
    /// Euclidean distance from the query point to the entry's box.
    pub distance: f64,
    pub(crate) seq: usize,
}

impl<I> Clone for Neighbor<'_, I> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I> Copy for Neighbor<'_, I> {}

impl<I: Debug> Debug for Neighbor<'_, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Neighbor")
            .field("entry", self.entry)
            .field("distance", &self.distance)
            .finish_non_exhaustive()
    }
}

enum Candidate<'a, I> {
    Node(NodeIdx),
    Item(&'a Item<I>),
}

struct Queued<'a, I> {
    dist2: f64,
    candidate: Candidate<'a, I>,
}

impl<I> Queued<'_, I> {
    /// Tie-break after distance: nodes first, then entries by sequence number.
    fn rank(&self) -> (u8, usize) {
        match self.candidate {
            Candidate::Node(idx) => (0, idx.get()),
            Candidate::Item(item) => (1, item.seq),
        }
    }
}

impl<I> PartialEq for Queued<'_, I> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<I> Eq for Queued<'_, I> {}

impl<I> PartialOrd for Queued<'_, I> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<I> Ord for Queued<'_, I> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: `BinaryHeap` is a max-heap and we pop the closest first.
        other
            .dist2
            .total_cmp(&self.dist2)
            .then_with(|| other.rank().cmp(&self.rank()))
    }
}

/// Lazy best-first iterator over entries by increasing box distance.
///
/// Created by [`SpatialIndex::nearest_iter`]. Each call to `next` expands only
/// as many nodes as needed to prove the next entry is the closest remaining.
pub struct NearestIter<'a, I> {
    index: &'a SpatialIndex<I>,
    point: Point,
    heap: BinaryHeap<Queued<'a, I>>,
}

impl<'a, I> NearestIter<'a, I> {
    fn new(index: &'a SpatialIndex<I>, point: Point) -> Self {
        let mut heap = BinaryHeap::new();
        if let Some(root) = index.root {
            heap.push(Queued {
                dist2: index.arena[root.get()].bbox.distance_squared_to_point(point),
                candidate: Candidate::Node(root),
            });
        }
        Self { index, point, heap }
    }

    fn expand(&mut self, idx: NodeIdx) {
        let index = self.index;
        let point = self.point;
        match &index.arena[idx.get()].kind {
            NodeKind::Leaf(items) => {
                self.heap.extend(items.iter().map(|item| Queued {
                    dist2: item.entry.bbox.distance_squared_to_point(point),
                    candidate: Candidate::Item(item),
                }));
            }
            NodeKind::Branch(children) => {
                self.heap.extend(children.iter().map(|&c| Queued {
                    dist2: index.arena[c.get()].bbox.distance_squared_to_point(point),
                    candidate: Candidate::Node(c),
                }));
            }
        }
    }
}

impl<'a, I> Iterator for NearestIter<'a, I> {
    type Item = Neighbor<'a, I>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(Queued { dist2, candidate }) = self.heap.pop() {
            match candidate {
                Candidate::Item(item) => {
                    return Some(Neighbor {
                        entry: &item.entry,
                        distance: dist2.sqrt(),
                        seq: item.seq,
                    });
                }
                Candidate::Node(idx) => self.expand(idx),
            }
        }
        None
    }
}

impl<I> Debug for NearestIter<'_, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NearestIter")
            .field("point", &self.point)
            .field("queued", &self.heap.len())
            .finish_non_exhaustive()
    }
}

impl<I> SpatialIndex<I> {
    /// Iterate entries in non-decreasing box distance from `point`.
    ///
    /// Ties are broken by insertion order. Stop consuming whenever you have
    /// enough; no work is done for entries you never ask for.
    pub fn nearest_iter(&self, point: Point) -> NearestIter<'_, I> {
        NearestIter::new(self, point)
    }

    /// Query for the `k` entries whose boxes are closest to `point`.
    ///
    /// Results are sorted by non-decreasing box distance, ties in insertion
    /// order. `k == 0` yields nothing; `k` above [`len`][Self::len] yields every
    /// entry.
    ///
    /// This ranks by box distance. When entries stand for larger shapes,
    /// refine the candidates with [`nearest_refined`][Self::nearest_refined].
    pub fn query_nearest(&self, point: Point, k: usize) -> Vec<&Entry<I>> {
        if k == 0 {
            return Vec::new();
        }
        self.nearest_iter(point).take(k).map(|n| n.entry).collect()
    }
}
