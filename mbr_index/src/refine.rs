// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Re-ranking box-nearest candidates with caller-supplied exact distances.
//!
//! The index only knows bounding boxes. When entries stand for polygons or
//! other extended shapes, the k entries with the closest boxes are not
//! necessarily the k closest shapes. [`SpatialIndex::nearest_refined`] pulls
//! candidates from the best-first search, asks an exact-distance oracle about
//! each one, and returns the best `k` by exact distance.

use alloc::vec::Vec;
use core::fmt::{self, Debug};

use hashbrown::HashSet;
use tracing::trace;

use crate::index::SpatialIndex;
use crate::nearest::Neighbor;
use crate::types::{BoundingBox, Entry, Point};

/// How many box-nearest candidates [`SpatialIndex::nearest_refined`] examines.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FetchPolicy {
    /// Keep fetching until `k` candidates are held and the next box distance
    /// exceeds the `k`-th best exact distance.
    ///
    /// The result is the exact top `k` whenever the oracle never reports less
    /// than the box distance, which holds when every box encloses its shape.
    #[default]
    Adaptive,
    /// Fetch `k * factor` candidates.
    Factor(usize),
    /// Fetch a fixed number of candidates (at least `k`).
    Count(usize),
}

/// A refined nearest-neighbor result.
pub struct Ranked<'a, I> {
    /// The stored entry.
    pub entry: &'a Entry<I>,
    /// Distance from the query point to the entry's box.
    pub box_distance: f64,
    /// Distance reported by the exact-distance oracle.
    pub distance: f64,
}

impl<I> Clone for Ranked<'_, I> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I> Copy for Ranked<'_, I> {}

impl<I: Debug> Debug for Ranked<'_, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ranked")
            .field("entry", self.entry)
            .field("box_distance", &self.box_distance)
            .field("distance", &self.distance)
            .finish()
    }
}

/// Why an entry appears in a [`SpatialIndex::query_neighborhood`] result.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// One of the `k` entries with the closest boxes.
    Nearest,
    /// Inside the search window but not among the nearest.
    InRange,
}

impl<I> SpatialIndex<I> {
    /// Query for the `k` entries closest to `point` by an exact distance.
    ///
    /// Candidates come from [`nearest_iter`][Self::nearest_iter]; `policy`
    /// decides how many are examined. `exact(id, point)` is called once per
    /// candidate. The result holds at most `k` entries sorted by exact
    /// distance; equal distances keep box-distance order.
    pub fn nearest_refined<'a, F>(
        &'a self,
        point: Point,
        k: usize,
        policy: FetchPolicy,
        exact: F,
    ) -> Vec<Ranked<'a, I>>
    where
        F: Fn(&I, Point) -> f64,
    {
        if k == 0 {
            return Vec::new();
        }
        let rank = |n: Neighbor<'a, I>| Ranked {
            entry: n.entry,
            box_distance: n.distance,
            distance: exact(&n.entry.id, point),
        };

        let mut held = match policy {
            FetchPolicy::Adaptive => {
                let mut held: Vec<Ranked<'a, I>> = Vec::with_capacity(k);
                let mut candidates = self.nearest_iter(point).peekable();
                while let Some(next) = candidates.peek() {
                    if held.len() >= k && next.distance > held[k - 1].distance {
                        break;
                    }
                    let Some(n) = candidates.next() else { break };
                    let r = rank(n);
                    // After every held entry at the same or a smaller distance.
                    let at = held.partition_point(|h| h.distance.total_cmp(&r.distance).is_le());
                    held.insert(at, r);
                }
                held
            }
            FetchPolicy::Factor(factor) => {
                self.fetch_ranked(point, k.saturating_mul(factor).max(k), rank)
            }
            FetchPolicy::Count(count) => self.fetch_ranked(point, count.max(k), rank),
        };
        trace!(k, fetched = held.len(), ?policy, "refined nearest candidates");
        held.truncate(k);
        held
    }

    fn fetch_ranked<'a>(
        &'a self,
        point: Point,
        count: usize,
        rank: impl Fn(Neighbor<'a, I>) -> Ranked<'a, I>,
    ) -> Vec<Ranked<'a, I>> {
        let mut held: Vec<_> = self.nearest_iter(point).take(count).map(rank).collect();
        held.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        held
    }

    /// The `k` box-nearest entries around `anchor`, plus every other entry
    /// lying entirely inside the square window of half-side `radius`.
    ///
    /// Nearest entries come first, in box-distance order, tagged
    /// [`Role::Nearest`]; window entries follow, unordered, tagged
    /// [`Role::InRange`]. No entry appears twice.
    pub fn query_neighborhood(
        &self,
        anchor: Point,
        k: usize,
        radius: f64,
    ) -> Vec<(Role, &Entry<I>)> {
        let mut nearest = HashSet::with_capacity(k);
        let mut out: Vec<_> = self
            .nearest_iter(anchor)
            .take(k)
            .map(|n| {
                nearest.insert(n.seq);
                (Role::Nearest, n.entry)
            })
            .collect();

        let window = BoundingBox::around(anchor, radius);
        self.visit_items(
            |node| node.intersects(&window),
            |b| window.contains_box(b),
            |item| {
                if !nearest.contains(&item.seq) {
                    out.push((Role::InRange, &item.entry));
                }
            },
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Disc shapes: `(center, radius)`, indexed by their bounding squares.
    fn discs(n: usize, seed: u64) -> Vec<(Point, f64)> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                let c = Point::new(rng.random_range(0.0..1000.0), rng.random_range(0.0..1000.0));
                (c, rng.random_range(0.5..30.0))
            })
            .collect()
    }

    fn disc_distance(disc: (Point, f64), p: Point) -> f64 {
        (disc.0.distance(p) - disc.1).max(0.0)
    }

    fn index_of(shapes: &[(Point, f64)]) -> SpatialIndex<usize> {
        SpatialIndex::bulk_load(
            shapes
                .iter()
                .enumerate()
                .map(|(i, &(c, r))| Entry::new(BoundingBox::around(c, r), i)),
        )
        .unwrap()
    }

    fn exact_top_k(shapes: &[(Point, f64)], p: Point, k: usize) -> Vec<f64> {
        let mut d: Vec<f64> = shapes.iter().map(|&s| disc_distance(s, p)).collect();
        d.sort_by(f64::total_cmp);
        d.truncate(k);
        d
    }

    #[test]
    fn adaptive_equals_exact_top_k() {
        let shapes = discs(3000, 17);
        let idx = index_of(&shapes);
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..60 {
            let p = Point::new(rng.random_range(0.0..1000.0), rng.random_range(0.0..1000.0));
            let k = rng.random_range(1..25);
            let got: Vec<f64> = idx
                .nearest_refined(p, k, FetchPolicy::Adaptive, |&id, q| disc_distance(shapes[id], q))
                .iter()
                .map(|r| r.distance)
                .collect();
            assert_eq!(got, exact_top_k(&shapes, p, k));
        }
    }

    #[test]
    fn results_are_sorted_and_carry_both_distances() {
        let shapes = discs(500, 3);
        let idx = index_of(&shapes);
        let p = Point::new(400.0, 600.0);
        let got = idx.nearest_refined(p, 10, FetchPolicy::Factor(20), |&id, q| {
            disc_distance(shapes[id], q)
        });
        assert_eq!(got.len(), 10);
        for pair in got.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
        for r in &got {
            assert_eq!(r.box_distance, r.entry.bbox.distance_to_point(p));
            assert!(r.box_distance <= r.distance + 1e-9);
        }
    }

    #[test]
    fn fixed_fetch_can_miss_but_never_exceeds_k() {
        let shapes = discs(400, 4);
        let idx = index_of(&shapes);
        let p = Point::new(500.0, 500.0);
        let exact = |&id: &usize, q: Point| disc_distance(shapes[id], q);
        let counted = idx.nearest_refined(p, 5, FetchPolicy::Count(2), exact);
        assert_eq!(counted.len(), 5);
        let all = idx.nearest_refined(p, 5, FetchPolicy::Count(400), exact);
        let all: Vec<f64> = all.iter().map(|r| r.distance).collect();
        assert_eq!(all, exact_top_k(&shapes, p, 5));
    }

    #[test]
    fn refinement_reorders_box_ranking() {
        // A huge shape whose box is closest, but whose boundary is far away.
        let mut idx = SpatialIndex::new();
        idx.insert(Entry::new(BoundingBox::new(0.0, 0.0, 100.0, 100.0), "ring"))
            .unwrap();
        idx.insert(Entry::new(BoundingBox::new(51.0, 50.0, 52.0, 51.0), "dot"))
            .unwrap();
        let p = Point::new(50.0, 50.0);
        assert_eq!(idx.query_nearest(p, 1)[0].id, "ring");
        let exact = |id: &&str, q: Point| match *id {
            "ring" => 40.0,
            _ => q.distance(Point::new(51.0, 50.0)),
        };
        let got = idx.nearest_refined(p, 1, FetchPolicy::Adaptive, exact);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].entry.id, "dot");
        assert_eq!(got[0].distance, 1.0);
    }

    #[test]
    fn degenerate_k() {
        let shapes = discs(20, 1);
        let idx = index_of(&shapes);
        let exact = |&id: &usize, q: Point| disc_distance(shapes[id], q);
        let p = Point::new(1.0, 1.0);
        assert!(idx.nearest_refined(p, 0, FetchPolicy::Adaptive, exact).is_empty());
        assert_eq!(idx.nearest_refined(p, 50, FetchPolicy::Adaptive, exact).len(), 20);
        assert_eq!(idx.nearest_refined(p, 50, FetchPolicy::Factor(0), exact).len(), 20);
        let empty: SpatialIndex<usize> = SpatialIndex::new();
        assert!(empty.nearest_refined(p, 3, FetchPolicy::Adaptive, exact).is_empty());
    }

    #[test]
    fn neighborhood_partitions_roles() {
        let shapes = discs(2000, 21);
        let idx = index_of(&shapes);
        let anchor = Point::new(500.0, 500.0);
        let radius = 120.0;
        let got = idx.query_neighborhood(anchor, 30, radius);

        let nearest: Vec<usize> = got
            .iter()
            .filter(|(role, _)| *role == Role::Nearest)
            .map(|(_, e)| e.id)
            .collect();
        let expected: Vec<usize> = idx.query_nearest(anchor, 30).iter().map(|e| e.id).collect();
        assert_eq!(nearest, expected);

        let window = BoundingBox::around(anchor, radius);
        let mut seen = HashSet::new();
        for (role, e) in &got {
            assert!(seen.insert(e.id), "entry {} reported twice", e.id);
            if *role == Role::InRange {
                assert!(window.contains_box(&e.bbox));
            }
        }
        let inside = idx.query_contained_by(&window);
        for e in inside {
            assert!(seen.contains(&e.id), "window entry {} missing", e.id);
        }
    }

    #[test]
    fn neighborhood_on_empty_index() {
        let idx: SpatialIndex<u8> = SpatialIndex::new();
        assert!(idx.query_neighborhood(Point::ORIGIN, 5, 1.0).is_empty());
    }
}
