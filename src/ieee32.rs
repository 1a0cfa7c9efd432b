//! Big-endian IEEE-754 single-precision bit-casts.
//!
//! GRIB2 stores reference values and unpacked spectral coefficients as
//! 4-octet big-endian IEEE-754 floats. Rust's `f32` already uses the IEEE-754
//! binary32 layout on every platform this crate targets, so this module is a
//! thin, explicit bit-cast rather than a software float decoder.

/// Reinterprets a big-endian-ordered 32-bit pattern as `f32`.
pub fn read_ieee(bits: u32) -> f32 {
    f32::from_bits(bits)
}

/// Reinterprets `value` as its big-endian-ordered 32-bit pattern.
pub fn write_ieee(value: f32) -> u32 {
    value.to_bits()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_ordinary_values() {
        for v in [0.0f32, 1.0, -1.0, 3.14159, 1e30, -1e-30, f32::MIN, f32::MAX] {
            assert_eq!(read_ieee(write_ieee(v)), v);
        }
    }

    #[test]
    fn preserves_sign_of_zero() {
        assert_ne!(write_ieee(0.0_f32), write_ieee(-0.0_f32));
        assert!(read_ieee(write_ieee(-0.0)).is_sign_negative());
    }

    #[test]
    fn round_trips_subnormals() {
        let v = f32::from_bits(1);
        assert_eq!(read_ieee(write_ieee(v)), v);
    }

    #[test]
    fn nan_bit_pattern_is_preserved() {
        let bits = 0x7fc0_0000u32;
        assert!(read_ieee(bits).is_nan());
        assert_eq!(write_ieee(read_ieee(bits)), bits);
    }

    #[test]
    fn big_endian_byte_order_matches_grib2_wire_format() {
        // 1.0f32 == 0x3f800000
        assert_eq!(write_ieee(1.0), 0x3f80_0000);
        assert_eq!(read_ieee(0x3f80_0000), 1.0);
    }
}
