//! Adaptive group partitioning (Glahn's algorithm).
//!
//! Splits a sequence of integers into contiguous runs ("groups") so that
//! packing each run with its own bit width minimizes total payload size,
//! subject to a minimum run length. This module is deliberately a pure
//! kernel over `&[i64]`: it knows nothing about templates, references, or
//! missing-value sentinels. [`crate::complex`] and [`crate::missing`] each
//! turn the boundaries it returns into their own notion of a packed group.

use crate::intmath::ilog2_ceil_diff;

/// Minimum group length the adaptive partitioner will aim for (the last
/// group of a run may be shorter).
pub const DEFAULT_MINPK: usize = 10;

/// Flat constant approximating the per-group header overhead (reference +
/// width + length fields) in bits. A candidate extension is accepted when it
/// costs no more marginal bits than this estimate, which is what trades off
/// against opening a new group. Not derived from the spec: a deliberate,
/// documented heuristic standing in for the NCEPLIBS reference coefficients
/// we have no retained source for (see DESIGN.md).
const GROUP_OVERHEAD_BITS: i64 = 24;

/// Runs the adaptive partitioner, returning `(start, length)` for each
/// chosen group, in order, covering all of `values`.
pub fn partition_boundaries(values: &[i64], minpk: usize) -> Vec<(usize, usize)> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    if n < 2 {
        return fixed_boundaries(n, minpk);
    }

    let minpk = minpk.max(1);
    let mut groups = Vec::new();
    let mut start = 0usize;
    while start < n {
        let mut end = (start + minpk).min(n);
        let mut min_v = values[start..end].iter().copied().min().unwrap();
        let mut max_v = values[start..end].iter().copied().max().unwrap();

        while end < n {
            let candidate = values[end];
            let new_min = min_v.min(candidate);
            let new_max = max_v.max(candidate);
            let cur_len = (end - start) as i64;
            let cur_bits = ilog2_ceil_diff(max_v, min_v) as i64 * cur_len;
            let new_bits = ilog2_ceil_diff(new_max, new_min) as i64 * (cur_len + 1);
            let marginal = new_bits - cur_bits;
            if marginal <= GROUP_OVERHEAD_BITS {
                min_v = new_min;
                max_v = new_max;
                end += 1;
            } else {
                break;
            }
        }
        groups.push((start, end - start));
        start = end;
    }
    groups
}

/// Splits `n` items into fixed-length chunks of `chunk` (the last chunk may
/// be shorter). Used for the degenerate `n < 2` case, where running the
/// adaptive comparison is meaningless.
pub fn fixed_boundaries(n: usize, chunk: usize) -> Vec<(usize, usize)> {
    let chunk = chunk.max(1);
    let mut out = Vec::new();
    let mut start = 0;
    while start < n {
        let len = chunk.min(n - start);
        out.push((start, len));
        start += len;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_has_no_groups() {
        assert_eq!(partition_boundaries(&[], DEFAULT_MINPK), Vec::new());
    }

    #[test]
    fn single_point_is_its_own_group() {
        assert_eq!(partition_boundaries(&[42], DEFAULT_MINPK), vec![(0, 1)]);
    }

    #[test]
    fn constant_run_collapses_to_one_group() {
        let values = vec![7i64; 37];
        let groups = partition_boundaries(&values, DEFAULT_MINPK);
        assert_eq!(groups, vec![(0, 37)]);
    }

    #[test]
    fn boundaries_cover_the_whole_input_without_gaps() {
        let values: Vec<i64> = (0..100).map(|i| (i * i) % 37).collect();
        let groups = partition_boundaries(&values, DEFAULT_MINPK);
        let mut pos = 0;
        for (start, len) in &groups {
            assert_eq!(*start, pos);
            assert!(*len >= 1);
            pos += len;
        }
        assert_eq!(pos, values.len());
    }

    #[test]
    fn sharp_jump_tends_to_open_a_new_group() {
        let mut values = vec![0i64; 20];
        values.extend(vec![1_000_000i64; 20]);
        let groups = partition_boundaries(&values, DEFAULT_MINPK);
        // The flat run before and after the jump should not be forced into
        // one group spanning the 1_000_000 gap.
        assert!(groups.len() >= 2);
    }

    #[test]
    fn fixed_boundaries_chunk_evenly_with_a_short_final_chunk() {
        assert_eq!(fixed_boundaries(25, 10), vec![(0, 10), (10, 10), (20, 5)]);
        assert_eq!(fixed_boundaries(0, 10), Vec::<(usize, usize)>::new());
    }
}
