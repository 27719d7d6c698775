// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type for index construction.

use crate::types::BoundingBox;

/// Errors reported while building or configuring a [`SpatialIndex`][crate::SpatialIndex].
///
/// Queries never fail: an empty index, or a query box that matches nothing,
/// simply yields no results.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A box with `min > max` on some axis (or a NaN coordinate) was offered for insertion.
    ///
    /// `position` is the offending entry's index in the bulk-load input, or the
    /// insertion sequence number it would have received from `insert`.
    #[error("entry {position} has an invalid bounding box {bbox}: min must not exceed max")]
    InvalidBoundingBox {
        /// Position of the rejected entry.
        position: usize,
        /// The rejected box.
        bbox: BoundingBox,
    },

    /// Node fanout limits that cannot produce a valid split.
    #[error(
        "invalid node fanout: min_children = {min_children}, max_children = {max_children} \
         (need min >= 1, max >= 2 and 2 * min <= max + 1)"
    )]
    InvalidParams {
        /// Requested lower bound.
        min_children: usize,
        /// Requested upper bound.
        max_children: usize,
    },
}

impl Error {
    pub(crate) fn check_bbox(position: usize, bbox: BoundingBox) -> Result<(), Self> {
        if bbox.is_valid() {
            Ok(())
        } else {
            Err(Self::InvalidBoundingBox { position, bbox })
        }
    }
}
