// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::ops::Range;

/// Returns the square root of the number, rounded up.
#[inline]
pub(crate) const fn isqrt_ceil(num: usize) -> usize {
    let s = num.isqrt();

    // This multiplication cannot overflow because `s` is the rounded-down square root of `num`,
    // i.e., `s * s` is guaranteed to be less than or equal to `num`.
    if s * s < num { s + 1 } else { s }
}

/// Cut `range` into the fewest runs of at most `max` elements, with run
/// lengths differing by at most one.
pub(crate) fn even_runs(range: Range<usize>, max: usize) -> impl Iterator<Item = Range<usize>> {
    let len = range.len();
    let parts = len.div_ceil(max.max(1));
    let (base, extra) = if parts == 0 {
        (0, 0)
    } else {
        (len / parts, len % parts)
    };
    let mut start = range.start;
    (0..parts).map(move |i| {
        let run = base + usize::from(i < extra);
        let r = start..start + run;
        start += run;
        r
    })
}
