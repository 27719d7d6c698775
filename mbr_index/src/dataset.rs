// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapter between caller-owned geometry and the index.

use alloc::vec::Vec;

use crate::error::Error;
use crate::index::SpatialIndex;
use crate::refine::{FetchPolicy, Ranked};
use crate::types::{BoundingBox, Entry, Point};

/// A collection of shapes the index can be built over.
///
/// The index stores only envelopes and identifiers; the dataset keeps the
/// real geometry and answers exact-distance questions about it.
pub trait Dataset {
    /// Identifier stored in the index for each shape.
    type Id;

    /// One entry per shape: its bounding box and identifier, in a stable order.
    fn envelopes(&self) -> impl Iterator<Item = Entry<Self::Id>> + '_;

    /// Exact distance from `point` to the shape named by `id`.
    ///
    /// Should never be less than the distance to the shape's envelope, or
    /// adaptive refinement loses its exactness guarantee.
    fn exact_distance(&self, id: &Self::Id, point: Point) -> f64;
}

/// Boxes are their own shapes; ids are positions in the slice.
impl Dataset for [BoundingBox] {
    type Id = usize;

    fn envelopes(&self) -> impl Iterator<Item = Entry<usize>> + '_ {
        self.iter()
            .enumerate()
            .map(|(i, bbox)| Entry::new(*bbox, i))
    }

    fn exact_distance(&self, id: &usize, point: Point) -> f64 {
        self.get(*id)
            .map_or(f64::INFINITY, |bbox| bbox.distance_to_point(point))
    }
}

impl<I> SpatialIndex<I> {
    /// Bulk-load an index over every shape in `dataset`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBoundingBox`] if the dataset yields a malformed
    /// envelope; `position` counts from the start of [`Dataset::envelopes`].
    pub fn from_dataset<D>(dataset: &D) -> Result<Self, Error>
    where
        D: Dataset<Id = I> + ?Sized,
    {
        Self::bulk_load(dataset.envelopes())
    }

    /// The `k` shapes of `dataset` closest to `point` by exact distance.
    ///
    /// Shorthand for [`nearest_refined`][Self::nearest_refined] with
    /// [`FetchPolicy::Adaptive`] and the dataset as the oracle.
    pub fn nearest_exact<'a, D>(&'a self, dataset: &D, point: Point, k: usize) -> Vec<Ranked<'a, I>>
    where
        D: Dataset<Id = I> + ?Sized,
    {
        self.nearest_refined(point, k, FetchPolicy::Adaptive, |id, p| {
            dataset.exact_distance(id, p)
        })
    }
}
