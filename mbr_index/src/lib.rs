// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=mbr_index --heading-base-level=0

//! MBR Index: a bulk-loadable 2D bounding-box R-tree.
//!
//! MBR Index stores axis-aligned bounding boxes (minimum bounding rectangles)
//! together with opaque identifiers, and answers spatial questions about them.
//!
//! - Build incrementally with [`SpatialIndex::insert`], or in one Sort-Tile-Recursive
//!   pass with [`SpatialIndex::bulk_load`] when the whole set is known upfront.
//! - Query by intersecting box, by point, or by containment.
//! - Walk entries in order of box distance with [`SpatialIndex::nearest_iter`], or take
//!   the first `k` with [`SpatialIndex::query_nearest`].
//! - Re-rank box-nearest candidates with your own exact distance through
//!   [`SpatialIndex::nearest_refined`] or a [`Dataset`] adapter.
//!
//! The index never looks inside identifiers and never owns the real geometry. A box is
//! only an envelope: the entry with the closest box is not always the closest shape, which
//! is why nearest-neighbor search is split into a box phase and a refinement phase.
//!
//! ## Features
//!
//! - `std` *(default)*: use `std` float math and enable `std` support in dependencies.
//! - `libm`: `no_std` + `alloc` builds with `libm` float math (through `kurbo`).
//! - `serde`: (de)serialize [`BoundingBox`], [`Params`] and [`FetchPolicy`].
//! - `parallel`: sort bulk-load partitions on the `rayon` thread pool. The packed tree is
//!   identical to a serial build.
//!
//! # Example
//!
//! ```rust
//! use mbr_index::{BoundingBox, Entry, Point, SpatialIndex};
//!
//! let mut idx = SpatialIndex::new();
//! idx.insert(Entry::new(BoundingBox::new(0.0, 0.0, 1.0, 1.0), "a")).unwrap();
//! idx.insert(Entry::new(BoundingBox::new(2.0, 2.0, 3.0, 3.0), "b")).unwrap();
//! idx.insert(Entry::new(BoundingBox::new(0.5, 0.5, 1.5, 1.5), "c")).unwrap();
//!
//! // Edges are inclusive.
//! let mut hits: Vec<_> = idx
//!     .query_range(&BoundingBox::new(0.0, 0.0, 1.0, 1.0))
//!     .into_iter()
//!     .map(|e| e.id)
//!     .collect();
//! hits.sort_unstable();
//! assert_eq!(hits, ["a", "c"]);
//!
//! let nearest = idx.query_nearest(Point::new(0.0, 0.0), 1);
//! assert_eq!(nearest[0].id, "a");
//! ```
//!
//! Bulk loading produces a shallower tree and answers every query the same way:
//!
//! ```rust
//! use mbr_index::{BoundingBox, Entry, Point, SpatialIndex};
//!
//! let entries = (0..1000).map(|i| {
//!     let x = f64::from(i % 40);
//!     let y = f64::from(i / 40);
//!     Entry::new(BoundingBox::new(x, y, x + 0.5, y + 0.5), i)
//! });
//! let idx = SpatialIndex::bulk_load(entries).unwrap();
//! assert_eq!(idx.len(), 1000);
//! assert_eq!(idx.bounds(), Some(BoundingBox::new(0.0, 0.0, 39.5, 24.5)));
//!
//! let ids: Vec<_> = idx.query_nearest(Point::new(10.2, 3.1), 1).iter().map(|e| e.id).collect();
//! assert_eq!(ids, [130]);
//! ```
//!
//! Refining with an exact distance, here for disc-shaped items stored by their bounding
//! squares:
//!
//! ```rust
//! use mbr_index::{BoundingBox, Entry, FetchPolicy, Point, SpatialIndex};
//!
//! let discs = [(Point::new(0.0, 0.0), 10.0), (Point::new(11.5, 11.5), 1.0)];
//! let idx = SpatialIndex::bulk_load(
//!     discs.iter().enumerate().map(|(i, &(c, r))| Entry::new(BoundingBox::around(c, r), i)),
//! )
//! .unwrap();
//!
//! let p = Point::new(9.8, 9.8);
//! // The big disc's square contains the point, so its box distance is zero...
//! assert_eq!(idx.query_nearest(p, 1)[0].id, 0);
//! // ...but the small disc is closer.
//! let exact = |&i: &usize, q: Point| (discs[i].0.distance(q) - discs[i].1).max(0.0);
//! let best = idx.nearest_refined(p, 1, FetchPolicy::Adaptive, exact);
//! assert_eq!(best[0].entry.id, 1);
//! ```
//!
//! ### Float semantics
//!
//! Boxes with NaN coordinates or inverted extents are rejected with
//! [`Error::InvalidBoundingBox`]. Query boxes are not validated: an inverted query box
//! simply matches nothing.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod bulk;
mod dataset;
mod error;
mod index;
mod nearest;
mod node;
mod params;
mod query;
mod refine;
mod types;
mod util;

pub use dataset::Dataset;
pub use error::Error;
pub use index::SpatialIndex;
pub use nearest::{NearestIter, Neighbor};
pub use params::Params;
pub use refine::{FetchPolicy, Ranked, Role};
pub use types::{BoundingBox, Entry, Point};

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn scenario() -> SpatialIndex<u32> {
        let mut idx = SpatialIndex::new();
        idx.insert(Entry::new(BoundingBox::new(0.0, 0.0, 1.0, 1.0), 1))
            .unwrap();
        idx.insert(Entry::new(BoundingBox::new(2.0, 2.0, 3.0, 3.0), 2))
            .unwrap();
        idx.insert(Entry::new(BoundingBox::new(0.5, 0.5, 1.5, 1.5), 3))
            .unwrap();
        idx
    }

    #[test]
    fn three_box_scenario() {
        let idx = scenario();
        let mut hits: Vec<_> = idx
            .query_range(&BoundingBox::new(0.0, 0.0, 1.0, 1.0))
            .into_iter()
            .map(|e| e.id)
            .collect();
        hits.sort_unstable();
        assert_eq!(hits, [1, 3]);

        let nearest: Vec<_> = idx
            .query_nearest(Point::new(0.0, 0.0), 1)
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(nearest, [1]);
    }

    #[test]
    fn ten_thousand_boxes_same_nearest_for_both_builds() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let entries: Vec<_> = (0..10_000_u32)
            .map(|i| {
                let a = Point::new(rng.random_range(0.0..10_000.0), rng.random_range(0.0..10_000.0));
                let b = Point::new(
                    a.x + rng.random_range(0.0..50.0),
                    a.y + rng.random_range(0.0..50.0),
                );
                Entry::new(BoundingBox::from_corners(a, b), i)
            })
            .collect();

        let bulk = SpatialIndex::bulk_load(entries.clone()).unwrap();
        let mut seq = SpatialIndex::new();
        seq.insert_all(entries).unwrap();
        assert_eq!(bulk.len(), seq.len());
        assert_eq!(bulk.bounds(), seq.bounds());

        for _ in 0..20 {
            let p = Point::new(rng.random_range(0.0..10_000.0), rng.random_range(0.0..10_000.0));
            let a: Vec<_> = bulk.query_nearest(p, 10).iter().map(|e| e.id).collect();
            let b: Vec<_> = seq.query_nearest(p, 10).iter().map(|e| e.id).collect();
            assert_eq!(a.len(), 10);
            assert_eq!(a, b);

            let window = BoundingBox::around(p, 300.0);
            let mut a: Vec<_> = bulk.query_range(&window).iter().map(|e| e.id).collect();
            let mut b: Vec<_> = seq.query_range(&window).iter().map(|e| e.id).collect();
            a.sort_unstable();
            b.sort_unstable();
            assert_eq!(a, b);
        }
    }
}
