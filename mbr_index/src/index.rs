// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The `SpatialIndex` tree: ownership, incremental insertion, and bookkeeping.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt::{self, Debug};

use tracing::{debug, trace};

use crate::error::Error;
use crate::node::{Item, Node, NodeIdx, NodeKind, choose_split, covering, permute};
use crate::params::Params;
use crate::types::{BoundingBox, Entry};

/// A bounding-box R-tree over entries with opaque identifiers.
///
/// The index exclusively owns its nodes (an arena of tagged leaf/branch nodes)
/// and the entries stored in them. Every node's box is the exact union of its
/// children's boxes, and all leaves sit at the same depth.
///
/// Build it incrementally with [`insert`][Self::insert], or in one pass with
/// [`bulk_load`][Self::bulk_load] when the full entry set is known upfront.
/// Both give identical query results for the same entries in the same order.
#[derive(Clone)]
pub struct SpatialIndex<I> {
    pub(crate) params: Params,
    pub(crate) root: Option<NodeIdx>,
    pub(crate) arena: Vec<Node<I>>,
    pub(crate) len: usize,
    pub(crate) next_seq: usize,
}

impl<I> SpatialIndex<I> {
    /// Create an empty index with default fanout.
    pub fn new() -> Self {
        Self::from_valid_params(Params::default())
    }

    /// Create an empty index with the given fanout limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParams`] if the limits cannot produce valid
    /// splits (this matters for deserialized params, which skip
    /// [`Params::new`]).
    pub fn with_params(params: Params) -> Result<Self, Error> {
        Ok(Self::from_valid_params(params.validate()?))
    }

    pub(crate) fn from_valid_params(params: Params) -> Self {
        Self {
            params,
            root: None,
            arena: Vec::new(),
            len: 0,
            next_seq: 0,
        }
    }

    /// Fanout limits in use.
    pub fn params(&self) -> Params {
        self.params
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of node levels from the root down to the leaves (0 when empty).
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut cursor = self.root;
        while let Some(idx) = cursor {
            height += 1;
            cursor = match &self.arena[idx.get()].kind {
                NodeKind::Leaf(_) => None,
                NodeKind::Branch(children) => children.first().copied(),
            };
        }
        height
    }

    /// Union of all entry boxes, or `None` when empty.
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.root.map(|r| self.arena[r.get()].bbox)
    }

    /// Remove every entry. Sequence numbers restart from zero.
    pub fn clear(&mut self) {
        self.root = None;
        self.arena.clear();
        self.len = 0;
        self.next_seq = 0;
    }

    /// All entries, in storage order (not insertion order).
    pub fn iter(&self) -> impl Iterator<Item = &Entry<I>> + '_ {
        self.arena.iter().flat_map(|node| {
            let items: &[Item<I>] = match &node.kind {
                NodeKind::Leaf(items) => items,
                NodeKind::Branch(_) => &[],
            };
            items.iter().map(|item| &item.entry)
        })
    }

    /// Insert one entry, splitting overflowing nodes on the way back up.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBoundingBox`] if the entry's box is inverted or
    /// has a NaN coordinate. The index is left untouched in that case.
    pub fn insert(&mut self, entry: Entry<I>) -> Result<(), Error> {
        if let Err(err) = Error::check_bbox(self.next_seq, entry.bbox) {
            debug!(%err, "rejected entry");
            return Err(err);
        }
        let item = Item {
            entry,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.len += 1;
        match self.root {
            None => {
                let root = self.push_node(Node::leaf(vec![item]));
                self.root = Some(root);
            }
            Some(root) => {
                if let Some(sibling) = self.insert_at(root, item) {
                    self.grow_root(root, sibling);
                }
            }
        }
        Ok(())
    }

    /// Insert entries one at a time, in order.
    ///
    /// # Errors
    ///
    /// Stops at the first malformed entry and returns its error; entries before
    /// it stay inserted.
    pub fn insert_all<It>(&mut self, entries: It) -> Result<(), Error>
    where
        It: IntoIterator<Item = Entry<I>>,
    {
        entries.into_iter().try_for_each(|entry| self.insert(entry))
    }

    pub(crate) fn push_node(&mut self, node: Node<I>) -> NodeIdx {
        let idx = NodeIdx::new(self.arena.len());
        self.arena.push(node);
        idx
    }

    pub(crate) fn branch_node(&self, children: Vec<NodeIdx>) -> Node<I> {
        let bbox = covering(children.iter().map(|c| self.arena[c.get()].bbox));
        Node {
            bbox,
            kind: NodeKind::Branch(children),
        }
    }

    /// Insert below `idx`; returns a new right sibling if `idx` had to split.
    fn insert_at(&mut self, idx: NodeIdx, item: Item<I>) -> Option<NodeIdx> {
        let bbox = item.entry.bbox;
        self.arena[idx.get()].bbox.expand(&bbox);
        let pending = match &mut self.arena[idx.get()].kind {
            NodeKind::Leaf(items) => {
                items.push(item);
                None
            }
            NodeKind::Branch(_) => Some(item),
        };
        let Some(item) = pending else {
            return self.split_if_overflowing(idx);
        };

        let (pos, child) = match &self.arena[idx.get()].kind {
            NodeKind::Branch(children) => {
                let pos = self.choose_subtree(children, &bbox);
                (pos, children[pos])
            }
            NodeKind::Leaf(_) => unreachable!("leaf insertion handled above"),
        };
        let sibling = self.insert_at(child, item)?;
        if let NodeKind::Branch(children) = &mut self.arena[idx.get()].kind {
            children.insert(pos + 1, sibling);
        }
        self.split_if_overflowing(idx)
    }

    /// Child needing the least area enlargement; ties go to the smaller child.
    fn choose_subtree(&self, children: &[NodeIdx], bbox: &BoundingBox) -> usize {
        let mut best = 0_usize;
        let mut best_cost = (f64::INFINITY, f64::INFINITY);
        for (i, c) in children.iter().enumerate() {
            let cb = &self.arena[c.get()].bbox;
            let area = cb.area();
            let cost = (cb.union(bbox).area() - area, area);
            if cost < best_cost {
                best_cost = cost;
                best = i;
            }
        }
        best
    }

    fn split_if_overflowing(&mut self, idx: NodeIdx) -> Option<NodeIdx> {
        if self.arena[idx.get()].len() <= self.params.max_children() {
            return None;
        }
        let min = self.params.min_children();
        let kind = core::mem::replace(
            &mut self.arena[idx.get()].kind,
            NodeKind::Branch(Vec::new()),
        );
        let (left, right) = match kind {
            NodeKind::Leaf(items) => {
                let boxes: Vec<_> = items.iter().map(|i| i.entry.bbox).collect();
                let (order, k) = choose_split(&boxes, min);
                let mut left = permute(items, &order);
                let right = left.split_off(k);
                (Node::leaf(left), Node::leaf(right))
            }
            NodeKind::Branch(children) => {
                let boxes: Vec<_> = children.iter().map(|c| self.arena[c.get()].bbox).collect();
                let (order, k) = choose_split(&boxes, min);
                let mut left = permute(children, &order);
                let right = left.split_off(k);
                (self.branch_node(left), self.branch_node(right))
            }
        };
        trace!(
            node = idx.get(),
            left = left.len(),
            right = right.len(),
            "split overflowing node"
        );
        self.arena[idx.get()] = left;
        Some(self.push_node(right))
    }

    fn grow_root(&mut self, root: NodeIdx, sibling: NodeIdx) {
        let node = self.branch_node(vec![root, sibling]);
        let new_root = self.push_node(node);
        self.root = Some(new_root);
        debug!(height = self.height(), entries = self.len, "grew tree root");
    }
}

impl<I> Default for SpatialIndex<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> Debug for SpatialIndex<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("params", &self.params)
            .field("len", &self.len)
            .field("height", &self.height())
            .field("arena_nodes", &self.arena.len())
            .field("bounds", &self.bounds())
            .finish_non_exhaustive()
    }
}
