//! Integer-log helpers shared by the group partitioner and the packers.

/// Number of bits needed to hold the unsigned integer `n`: `0` for `n == 0`,
/// otherwise the smallest `k` with `n < 2^k`.
///
/// Equivalently, `ceil(log2(n + 1))`. This is the quantity GRIB2's group
/// width and length fields actually store: the width needed to represent a
/// *value*, not a count of representable values.
pub fn ilog2_ceil(n: u32) -> u32 {
    if n == 0 { 0 } else { u32::BITS - n.leading_zeros() }
}

/// `ilog2_ceil` applied to `max - min`, the usual residual range a group or
/// a reference delta spans. Panics if `max < min`, which would indicate a
/// broken caller invariant rather than a recoverable error.
pub fn ilog2_ceil_diff(max: i64, min: i64) -> u32 {
    assert!(max >= min, "ilog2_ceil_diff: max ({max}) < min ({min})");
    ilog2_ceil(u32::try_from(max - min).expect("group range exceeds u32"))
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_ilog2_ceil {
        ($name:ident, $n:expr, $expected:expr) => {
            #[test]
            fn $name() {
                assert_eq!(ilog2_ceil($n), $expected);
            }
        };
    }

    test_ilog2_ceil!(zero_needs_no_bits, 0, 0);
    test_ilog2_ceil!(one_needs_one_bit, 1, 1);
    test_ilog2_ceil!(two_needs_two_bits, 2, 2);
    test_ilog2_ceil!(three_needs_two_bits, 3, 2);
    test_ilog2_ceil!(four_needs_three_bits, 4, 3);
    test_ilog2_ceil!(seven_needs_three_bits, 7, 3);
    test_ilog2_ceil!(eight_needs_four_bits, 8, 4);
    test_ilog2_ceil!(u16_max_needs_sixteen_bits, 0xffff, 16);

    #[test]
    fn diff_of_equal_bounds_is_zero_width() {
        assert_eq!(ilog2_ceil_diff(5, 5), 0);
    }

    #[test]
    fn diff_matches_plain_ilog2_ceil() {
        assert_eq!(ilog2_ceil_diff(104, 100), ilog2_ceil(4));
    }
}
