// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arena nodes and the overflow split heuristic.

use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::types::{BoundingBox, Entry};

/// Identity of the union: every real box absorbs it.
pub(crate) const EMPTY: BoundingBox = BoundingBox::new(
    f64::INFINITY,
    f64::INFINITY,
    f64::NEG_INFINITY,
    f64::NEG_INFINITY,
);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeIdx(usize);

impl NodeIdx {
    pub(crate) const fn new(i: usize) -> Self {
        Self(i)
    }

    pub(crate) const fn get(self) -> usize {
        self.0
    }
}

/// An entry as stored in a leaf, tagged with its insertion sequence number.
#[derive(Clone, Debug)]
pub(crate) struct Item<I> {
    pub(crate) entry: Entry<I>,
    pub(crate) seq: usize,
}

#[derive(Clone, Debug)]
pub(crate) enum NodeKind<I> {
    Leaf(Vec<Item<I>>),
    Branch(Vec<NodeIdx>),
}

#[derive(Clone, Debug)]
pub(crate) struct Node<I> {
    pub(crate) bbox: BoundingBox,
    pub(crate) kind: NodeKind<I>,
}

impl<I> Node<I> {
    pub(crate) fn leaf(items: Vec<Item<I>>) -> Self {
        let bbox = covering(items.iter().map(|i| i.entry.bbox));
        Self {
            bbox,
            kind: NodeKind::Leaf(items),
        }
    }

    pub(crate) fn len(&self) -> usize {
        match &self.kind {
            NodeKind::Leaf(items) => items.len(),
            NodeKind::Branch(children) => children.len(),
        }
    }
}

/// Exact union of a set of boxes ([`EMPTY`] for none).
pub(crate) fn covering(boxes: impl IntoIterator<Item = BoundingBox>) -> BoundingBox {
    boxes.into_iter().fold(EMPTY, |acc, b| acc.union(&b))
}

/// Sort axis for splits and bulk tiling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Axis {
    X,
    Y,
}

impl Axis {
    #[inline]
    pub(crate) fn center(self, b: &BoundingBox) -> f64 {
        match self {
            Self::X => b.center().x,
            Self::Y => b.center().y,
        }
    }
}

#[derive(Copy, Clone, Debug)]
struct SplitCost {
    area: f64,
    margin: f64,
}

impl SplitCost {
    fn beats(&self, other: &Self) -> bool {
        self.area
            .total_cmp(&other.area)
            .then(self.margin.total_cmp(&other.margin))
            == Ordering::Less
    }
}

/// SAH-like split of an overflowing node.
///
/// For each axis, children are ordered by center and every split point `k` in
/// `min_children..=n - min_children` is scored as
/// `area(L_k) * k + area(R_k) * (n - k)` using prefix/suffix unions, with the
/// summed margins breaking ties (zero-area point sets). Returns the child order
/// of the winning axis and the size of its left half.
pub(crate) fn choose_split(boxes: &[BoundingBox], min_children: usize) -> (Vec<usize>, usize) {
    let n = boxes.len();
    debug_assert!(
        n >= 2 * min_children,
        "split requires at least 2 * min_children children"
    );
    let mut best: Option<(SplitCost, Vec<usize>, usize)> = None;
    for axis in [Axis::X, Axis::Y] {
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            axis.center(&boxes[a])
                .total_cmp(&axis.center(&boxes[b]))
                .then(a.cmp(&b))
        });

        let mut prefix = Vec::with_capacity(n);
        let mut acc = EMPTY;
        for &i in &order {
            acc.expand(&boxes[i]);
            prefix.push(acc);
        }
        let mut suffix = vec![EMPTY; n];
        let mut acc = EMPTY;
        for (slot, &i) in suffix.iter_mut().zip(&order).rev() {
            acc.expand(&boxes[i]);
            *slot = acc;
        }

        let mut axis_best: Option<(SplitCost, usize)> = None;
        for k in min_children..=(n - min_children) {
            let (left, right) = (prefix[k - 1], suffix[k]);
            let cost = SplitCost {
                area: left.area() * k as f64 + right.area() * (n - k) as f64,
                margin: left.margin() + right.margin(),
            };
            if axis_best.is_none_or(|(c, _)| cost.beats(&c)) {
                axis_best = Some((cost, k));
            }
        }
        if let Some((cost, k)) = axis_best
            && best.as_ref().is_none_or(|(c, _, _)| cost.beats(c))
        {
            best = Some((cost, order, k));
        }
    }
    match best {
        Some((_, order, k)) => (order, k),
        None => ((0..n).collect(), n / 2),
    }
}

/// Reorder `items` so that position `j` holds the element previously at `order[j]`.
pub(crate) fn permute<T>(items: Vec<T>, order: &[usize]) -> Vec<T> {
    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    order.iter().filter_map(|&i| slots[i].take()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_center_matches_box_center() {
        let b = BoundingBox::new(-3.0, 2.0, 5.0, 4.0);
        assert_eq!(Axis::X.center(&b), 1.0);
        assert_eq!(Axis::Y.center(&b), 3.0);
        assert_eq!(Axis::X.center(&b), b.center().x);
    }

    #[test]
    fn covering_of_nothing_is_empty() {
        assert_eq!(covering([]), EMPTY);
        assert!(!EMPTY.is_valid());
        let b = BoundingBox::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(covering([b]), b);
    }

    #[test]
    fn split_separates_clusters() {
        // Two clusters along x, shuffled.
        let boxes = [
            BoundingBox::new(100.0, 0.0, 101.0, 1.0),
            BoundingBox::new(0.0, 0.0, 1.0, 1.0),
            BoundingBox::new(102.0, 0.0, 103.0, 1.0),
            BoundingBox::new(2.0, 0.0, 3.0, 1.0),
            BoundingBox::new(104.0, 0.0, 105.0, 1.0),
            BoundingBox::new(4.0, 0.0, 5.0, 1.0),
        ];
        let (order, k) = choose_split(&boxes, 2);
        assert_eq!(k, 3);
        let mut left: Vec<_> = order[..k].to_vec();
        left.sort_unstable();
        assert_eq!(left, [1, 3, 5]);
    }

    #[test]
    fn split_respects_min_children_for_points() {
        let boxes: Vec<_> = (0..9)
            .map(|i| BoundingBox::from_point(kurbo::Point::new(f64::from(i), 0.0)))
            .collect();
        let (order, k) = choose_split(&boxes, 4);
        assert_eq!(order.len(), 9);
        assert!((4..=5).contains(&k), "split point {k} violates min fill");
    }

    #[test]
    fn permute_moves_without_clone() {
        struct NoClone(u8);
        let v = vec![NoClone(0), NoClone(1), NoClone(2)];
        let p: Vec<u8> = permute(v, &[2, 0, 1]).into_iter().map(|x| x.0).collect();
        assert_eq!(p, [2, 0, 1]);
    }
}
