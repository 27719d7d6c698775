// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node fanout configuration.

use crate::error::Error;

/// Minimum and maximum number of children per tree node.
///
/// The values tune tree shape and speed; query results never depend on them.
/// The default (`4..=16`) is a common choice for R-trees.
///
/// With the `serde` feature, missing fields fall back to their defaults, and
/// the limits are re-validated when the params reach
/// [`SpatialIndex::with_params`][crate::SpatialIndex::with_params].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Params {
    min_children: usize,
    max_children: usize,
}

impl Params {
    /// Default lower fanout bound.
    pub const DEFAULT_MIN_CHILDREN: usize = 4;
    /// Default upper fanout bound.
    pub const DEFAULT_MAX_CHILDREN: usize = 16;

    /// Create validated fanout limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParams`] unless `min >= 1`, `max >= 2` and
    /// `2 * min <= max + 1` (an overflowing node of `max + 1` children must be
    /// splittable into two halves of at least `min`).
    pub fn new(min_children: usize, max_children: usize) -> Result<Self, Error> {
        let params = Self {
            min_children,
            max_children,
        };
        params.validate()
    }

    /// Lower bound on children for nodes produced by splits.
    #[inline]
    pub const fn min_children(&self) -> usize {
        self.min_children
    }

    /// Upper bound on children of any node.
    #[inline]
    pub const fn max_children(&self) -> usize {
        self.max_children
    }

    pub(crate) fn validate(self) -> Result<Self, Error> {
        let ok = self.min_children >= 1
            && self.max_children >= 2
            && self.min_children.saturating_mul(2) <= self.max_children.saturating_add(1);
        if ok {
            Ok(self)
        } else {
            Err(Error::InvalidParams {
                min_children: self.min_children,
                max_children: self.max_children,
            })
        }
    }
}

impl Default for Params {
    fn default() -> Self {
        Self {
            min_children: Self::DEFAULT_MIN_CHILDREN,
            max_children: Self::DEFAULT_MAX_CHILDREN,
        }
    }
}
