// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sort-Tile-Recursive bulk loading.
//!
//! Entries are sorted by center x and cut into `ceil(sqrt(leaf_count))`
//! vertical slices; each slice is sorted by center y and cut into evenly sized
//! runs of at most `max_children`, one leaf per run. The same tiling is then
//! applied to node centers, level by level, until a single root remains.
//!
//! Every sort breaks ties by input position, so the packed tree depends only
//! on the input order. With the `parallel` feature the sorts run on the rayon
//! pool and produce the same tree.

use alloc::vec::Vec;
use core::cmp::Ordering;
use core::ops::Range;

use tracing::debug;

use crate::error::Error;
use crate::index::SpatialIndex;
use crate::node::{Axis, Item, Node, NodeIdx};
use crate::params::Params;
use crate::types::{BoundingBox, Entry};
use crate::util::{even_runs, isqrt_ceil};

#[derive(Copy, Clone, Debug)]
struct SortKey {
    x: f64,
    y: f64,
    pos: usize,
}

impl SortKey {
    fn new(bbox: &BoundingBox, pos: usize) -> Self {
        Self {
            x: Axis::X.center(bbox),
            y: Axis::Y.center(bbox),
            pos,
        }
    }

    fn cmp_x(a: &Self, b: &Self) -> Ordering {
        a.x.total_cmp(&b.x).then(a.pos.cmp(&b.pos))
    }

    fn cmp_y(a: &Self, b: &Self) -> Ordering {
        a.y.total_cmp(&b.y).then(a.pos.cmp(&b.pos))
    }
}

/// How tiling sorts its keys. Both produce the same order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Sorter {
    Serial,
    #[cfg(feature = "parallel")]
    Parallel,
}

/// Levels smaller than this are sorted on the calling thread.
#[cfg(feature = "parallel")]
const PARALLEL_MIN_KEYS: usize = 4096;

impl Sorter {
    #[cfg(feature = "parallel")]
    fn for_len(len: usize) -> Self {
        if len >= PARALLEL_MIN_KEYS {
            Self::Parallel
        } else {
            Self::Serial
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn for_len(_len: usize) -> Self {
        Self::Serial
    }

    fn sort(self, keys: &mut [SortKey], cmp: fn(&SortKey, &SortKey) -> Ordering) {
        match self {
            Self::Serial => keys.sort_unstable_by(cmp),
            #[cfg(feature = "parallel")]
            Self::Parallel => {
                use rayon::slice::ParallelSliceMut;
                keys.par_sort_unstable_by(cmp);
            }
        }
    }

    fn sort_slices(
        self,
        keys: &mut [SortKey],
        slice_len: usize,
        cmp: fn(&SortKey, &SortKey) -> Ordering,
    ) {
        match self {
            Self::Serial => {
                for slice in keys.chunks_mut(slice_len) {
                    slice.sort_unstable_by(cmp);
                }
            }
            #[cfg(feature = "parallel")]
            Self::Parallel => {
                use rayon::prelude::*;
                keys.par_chunks_mut(slice_len)
                    .for_each(|slice| slice.sort_unstable_by(cmp));
            }
        }
    }
}

/// Sort `keys` into STR order and return the runs that become one node each.
fn tile(keys: &mut [SortKey], max_children: usize, sorter: Sorter) -> Vec<Range<usize>> {
    let n = keys.len();
    let node_count = n.div_ceil(max_children);
    let slice_count = isqrt_ceil(node_count).max(1);
    let slice_len = n.div_ceil(slice_count).max(1);

    sorter.sort(keys, SortKey::cmp_x);
    sorter.sort_slices(keys, slice_len, SortKey::cmp_y);

    let mut runs = Vec::with_capacity(node_count);
    let mut start = 0;
    while start < n {
        let end = (start + slice_len).min(n);
        runs.extend(even_runs(start..end, max_children));
        start = end;
    }
    runs
}

impl<I> SpatialIndex<I> {
    /// Build an index from a complete entry set in one pass, with default fanout.
    ///
    /// Entries receive insertion sequence numbers in iteration order, so the
    /// result answers every query exactly like inserting the same entries one
    /// by one, while producing a shallower, tighter tree much faster.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBoundingBox`] for the first malformed entry
    /// (its `position` is the index in `entries`). No index is built.
    pub fn bulk_load<It>(entries: It) -> Result<Self, Error>
    where
        It: IntoIterator<Item = Entry<I>>,
    {
        Self::bulk_load_with_params(entries, Params::default())
    }

    /// [`bulk_load`][Self::bulk_load] with explicit fanout limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParams`] for unusable limits, or
    /// [`Error::InvalidBoundingBox`] for the first malformed entry.
    pub fn bulk_load_with_params<It>(entries: It, params: Params) -> Result<Self, Error>
    where
        It: IntoIterator<Item = Entry<I>>,
    {
        let mut index = Self::with_params(params)?;
        let items = entries
            .into_iter()
            .enumerate()
            .map(|(seq, entry)| {
                Error::check_bbox(seq, entry.bbox)?;
                Ok(Item { entry, seq })
            })
            .collect::<Result<Vec<_>, Error>>()
            .inspect_err(|err| debug!(%err, "rejected bulk load"))?;

        index.fill(items, Sorter::for_len);
        debug!(
            entries = index.len,
            nodes = index.arena.len(),
            height = index.height(),
            "bulk-loaded spatial index"
        );
        Ok(index)
    }

    fn fill(&mut self, items: Vec<Item<I>>, sorter: fn(usize) -> Sorter) {
        self.len = items.len();
        self.next_seq = items.len();
        self.root = self.pack(items, sorter);
    }

    fn pack(&mut self, items: Vec<Item<I>>, sorter: fn(usize) -> Sorter) -> Option<NodeIdx> {
        if items.is_empty() {
            return None;
        }
        let max = self.params.max_children();

        let mut keys: Vec<SortKey> = items
            .iter()
            .enumerate()
            .map(|(pos, item)| SortKey::new(&item.entry.bbox, pos))
            .collect();
        let sort = sorter(keys.len());
        let runs = tile(&mut keys, max, sort);
        let mut slots: Vec<Option<Item<I>>> = items.into_iter().map(Some).collect();
        let mut level: Vec<NodeIdx> = Vec::with_capacity(runs.len());
        for run in runs {
            let leaf_items: Vec<_> = keys[run]
                .iter()
                .filter_map(|k| slots[k.pos].take())
                .collect();
            level.push(self.push_node(Node::leaf(leaf_items)));
        }

        while level.len() > max {
            let mut keys: Vec<SortKey> = level
                .iter()
                .enumerate()
                .map(|(pos, n)| SortKey::new(&self.arena[n.get()].bbox, pos))
                .collect();
            let sort = sorter(keys.len());
            let runs = tile(&mut keys, max, sort);
            let mut next = Vec::with_capacity(runs.len());
            for run in runs {
                let children = keys[run].iter().map(|k| level[k.pos]).collect();
                let node = self.branch_node(children);
                next.push(self.push_node(node));
            }
            level = next;
        }

        if let [root] = level[..] {
            Some(root)
        } else {
            let node = self.branch_node(level);
            Some(self.push_node(node))
        }
    }
}
