// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Depth-first region queries.

use alloc::vec::Vec;

use smallvec::SmallVec;

use crate::index::SpatialIndex;
use crate::node::{Item, NodeIdx, NodeKind};
use crate::types::{BoundingBox, Entry, Point};

impl<I> SpatialIndex<I> {
    /// Query for entries whose box intersects `bbox` (edges inclusive).
    ///
    /// Results are unordered. An empty index, or an inverted query box, yields
    /// nothing.
    pub fn query_range(&self, bbox: &BoundingBox) -> Vec<&Entry<I>> {
        let mut out = Vec::new();
        self.visit_range(bbox, |e| out.push(e));
        out
    }

    /// Visit entries whose box intersects `bbox` (does not allocate result storage).
    ///
    /// Calls `f(entry)` for each match, in traversal order.
    pub fn visit_range<'a, F: FnMut(&'a Entry<I>)>(&'a self, bbox: &BoundingBox, mut f: F) {
        if !bbox.is_valid() {
            return;
        }
        self.visit_items(
            |node| node.intersects(bbox),
            |b| b.intersects(bbox),
            |item| f(&item.entry),
        );
    }

    /// Query for entries whose box contains the point.
    pub fn query_point(&self, p: Point) -> Vec<&Entry<I>> {
        let mut out = Vec::new();
        self.visit_items(
            |node| node.contains_point(p),
            |b| b.contains_point(p),
            |item| out.push(&item.entry),
        );
        out
    }

    /// Query for entries whose box lies entirely inside `bbox`.
    pub fn query_contained_by(&self, bbox: &BoundingBox) -> Vec<&Entry<I>> {
        let mut out = Vec::new();
        if !bbox.is_valid() {
            return out;
        }
        self.visit_items(
            |node| node.intersects(bbox),
            |b| bbox.contains_box(b),
            |item| out.push(&item.entry),
        );
        out
    }

    /// Depth-first walk: descend into nodes passing `descend`, report leaf items
    /// passing `accept`.
    pub(crate) fn visit_items<'a>(
        &'a self,
        descend: impl Fn(&BoundingBox) -> bool,
        accept: impl Fn(&BoundingBox) -> bool,
        mut f: impl FnMut(&'a Item<I>),
    ) {
        let Some(root) = self.root else {
            return;
        };
        let mut stack: SmallVec<[NodeIdx; 32]> = SmallVec::new();
        stack.push(root);
        while let Some(idx) = stack.pop() {
            let node = &self.arena[idx.get()];
            if !descend(&node.bbox) {
                continue;
            }
            match &node.kind {
                NodeKind::Leaf(items) => {
                    for item in items {
                        if accept(&item.entry.bbox) {
                            f(item);
                        }
                    }
                }
                NodeKind::Branch(children) => stack.extend(children.iter().copied()),
            }
        }
    }
}
