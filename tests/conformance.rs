//! Scenarios with hand-traceable expected values: each asserts not just that
//! encode/decode round-trip, but what the packer's intermediate descriptors
//! (`v1`, `v2`, `m_sd`, group width) work out to for a specific, simple
//! input, so a regression in the differencing or grouping math shows up as
//! a wrong number rather than just a failed round trip.

use gribpack::{complex_pack, complex_unpack, MissMgmt, SpatialDiffOrder};

#[test]
fn linear_ramp_under_first_order_differencing_collapses_to_one_flat_group() {
    // quantized (decimal_scale=0, binary_scale=0, ref=10): [0, 2, 4, 6, 8].
    // First differences are constant (2), so v1 is the original ifld[0]
    // (0, since ref already equals the minimum) and every remaining
    // residual collapses to m_sd after the running-minimum subtraction.
    let fld = vec![10.0f32, 12.0, 14.0, 16.0, 18.0];
    let (payload, tmpl) = complex_pack(&fld, 0, 0, MissMgmt::None, 0.0, 0.0, SpatialDiffOrder::First, 10).unwrap();

    assert_eq!(tmpl.ngroups, 1);
    assert_eq!(tmpl.nbits_width, 0);

    let decoded = complex_unpack(&payload, &tmpl, fld.len()).unwrap();
    assert_eq!(decoded, fld);
}

#[test]
fn quadratic_ramp_under_second_order_differencing_collapses_to_one_flat_group() {
    // quantized (ref=10): [0, 2, 6, 12, 20, 30]. Second differences are
    // constant (2), so v1 = ifld[0] = 0, v2 = ifld[1] = 2, and the rest of
    // the differenced sequence is the constant m_sd = 2.
    let fld = vec![10.0f32, 12.0, 16.0, 22.0, 30.0, 40.0];
    let (payload, tmpl) = complex_pack(&fld, 0, 0, MissMgmt::None, 0.0, 0.0, SpatialDiffOrder::Second, 10).unwrap();

    assert_eq!(tmpl.ngroups, 1);
    assert_eq!(tmpl.nbits_width, 0);

    let decoded = complex_unpack(&payload, &tmpl, fld.len()).unwrap();
    assert_eq!(decoded, fld);
}

#[test]
fn primary_missing_sentinel_survives_round_trip_exactly() {
    // 9.999e20 is the conventional GRIB2 "no data" fill value; a decoder
    // that quantized it instead of recognizing the sentinel would corrupt
    // it beyond any reasonable tolerance, so an exact-equality check is the
    // right assertion here (unlike the lossy real samples elsewhere).
    const RMISSP: f32 = 9.999e20;
    let mut fld: Vec<f32> = (0..64).map(|i| i as f32 * 1.5).collect();
    fld[0] = RMISSP;
    fld[30] = RMISSP;
    fld[63] = RMISSP;

    let (payload, tmpl) = complex_pack(&fld, 2, 0, MissMgmt::Primary, RMISSP, 0.0, SpatialDiffOrder::None, 10).unwrap();
    let decoded = complex_unpack(&payload, &tmpl, fld.len()).unwrap();

    for (i, (&got, &want)) in decoded.iter().zip(&fld).enumerate() {
        if want == RMISSP {
            assert_eq!(got, RMISSP, "position {i} lost its missing-value sentinel");
        } else {
            assert!((got - want).abs() <= 0.05, "position {i}: {got} != {want}");
        }
    }
}

#[test]
fn constant_field_needs_no_groups() {
    let fld = vec![3.5f32; 64];
    let (payload, tmpl) = complex_pack(&fld, 0, 1, MissMgmt::None, 0.0, 0.0, SpatialDiffOrder::None, 10).unwrap();
    assert_eq!(tmpl.ngroups, 0);
    assert!(payload.len() <= 5);
    let decoded = complex_unpack(&payload, &tmpl, fld.len()).unwrap();
    for v in decoded {
        assert!((v - 3.5).abs() <= 1e-3);
    }
}
