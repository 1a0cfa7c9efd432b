//! Black-box round trips through the public API, covering the cases that
//! aren't pinned to a specific hand-traced numeric scenario: varying field
//! shapes, missing value combinations, and the positional wrapper surface.

use gribpack::template::{ComplexTemplate, MissMgmt, SpatialDiffOrder};
use gribpack::{complex_pack, complex_pack_positional, complex_unpack, complex_unpack_positional};

fn assert_close(got: &[f32], want: &[f32], eps: f32) {
    assert_eq!(got.len(), want.len());
    for (i, (&g, &w)) in got.iter().zip(want).enumerate() {
        assert!((g - w).abs() <= eps, "index {i}: got {g}, want {w}");
    }
}

#[test]
fn empty_field_round_trips_to_empty() {
    let (payload, tmpl) = complex_pack(&[], 0, 0, MissMgmt::None, 0.0, 0.0, SpatialDiffOrder::None, 10).unwrap();
    let decoded = complex_unpack(&payload, &tmpl, 0).unwrap();
    assert!(decoded.is_empty());
}

#[test]
fn single_point_field_round_trips() {
    let fld = vec![42.25f32];
    let (payload, tmpl) = complex_pack(&fld, 2, 0, MissMgmt::None, 0.0, 0.0, SpatialDiffOrder::Second, 10).unwrap();
    let decoded = complex_unpack(&payload, &tmpl, 1).unwrap();
    assert_close(&decoded, &fld, 0.01);
}

#[test]
fn noisy_field_round_trips_within_quantization_tolerance() {
    let fld: Vec<f32> = (0..500).map(|i| ((i as f32) * 0.37).sin() * 100.0 + (i % 7) as f32).collect();
    for order in [SpatialDiffOrder::None, SpatialDiffOrder::First, SpatialDiffOrder::Second] {
        let (payload, tmpl) = complex_pack(&fld, 3, 1, MissMgmt::None, 0.0, 0.0, order, 10).unwrap();
        let decoded = complex_unpack(&payload, &tmpl, fld.len()).unwrap();
        assert_close(&decoded, &fld, 0.1);
    }
}

#[test]
fn negative_and_fractional_values_round_trip() {
    let fld = vec![-10.5f32, -3.25, 0.0, 3.25, 10.5, -100.0, 50.125];
    let (payload, tmpl) = complex_pack(&fld, 4, 2, MissMgmt::None, 0.0, 0.0, SpatialDiffOrder::First, 3).unwrap();
    let decoded = complex_unpack(&payload, &tmpl, fld.len()).unwrap();
    assert_close(&decoded, &fld, 0.01);
}

#[test]
fn primary_and_secondary_missing_mixed_with_real_groups() {
    const MISS1: f32 = 9999.0;
    const MISS2: f32 = 9998.0;
    let mut fld: Vec<f32> = (0..200).map(|i| (i as f32) * 0.1).collect();
    for i in (0..200).step_by(13) {
        fld[i] = MISS1;
    }
    for i in (5..200).step_by(17) {
        fld[i] = MISS2;
    }

    let (payload, tmpl) = complex_pack(
        &fld, 1, 1, MissMgmt::PrimaryAndSecondary, MISS1, MISS2, SpatialDiffOrder::First, 10,
    )
    .unwrap();
    let decoded = complex_unpack(&payload, &tmpl, fld.len()).unwrap();

    for (i, (&got, &want)) in decoded.iter().zip(&fld).enumerate() {
        if want == MISS1 || want == MISS2 {
            assert_eq!(got, want, "position {i} missing sentinel changed");
        } else {
            assert!((got - want).abs() <= 0.1, "position {i}: {got} != {want}");
        }
    }
}

#[test]
fn entirely_missing_field_round_trips_to_sentinel() {
    const MISS: f32 = -9999.0;
    let fld = vec![MISS; 40];
    let (payload, tmpl) = complex_pack(&fld, 0, 0, MissMgmt::Primary, MISS, 0.0, SpatialDiffOrder::None, 10).unwrap();
    let decoded = complex_unpack(&payload, &tmpl, fld.len()).unwrap();
    assert_eq!(decoded, fld);
}

#[test]
fn positional_round_trip_matches_typed_api() {
    let fld: Vec<f32> = (0..50).map(|i| (i as f32) * 2.0 - 25.0).collect();
    let mut idrstmpl = [0i32; 18];
    let payload = complex_pack_positional(&fld, 1, 0, 0, 0.0, 0.0, 1, 10, &mut idrstmpl).unwrap();
    let decoded = complex_unpack_positional(&payload, &idrstmpl, fld.len()).unwrap();
    assert_close(&decoded, &fld, 0.6);
}

#[test]
fn positional_unpack_degrades_gracefully_on_unrecognized_template() {
    let idrstmpl = [i32::MAX; 18];
    let decoded = complex_unpack_positional(&[], &idrstmpl, 10).unwrap();
    assert_eq!(decoded, vec![0.0; 10]);
}

#[test]
fn template_round_trips_through_positional_array() {
    let (_, tmpl) = complex_pack(
        &[1.0, 2.0, 3.0, 4.0],
        2,
        1,
        MissMgmt::None,
        0.0,
        0.0,
        SpatialDiffOrder::First,
        10,
    )
    .unwrap();
    let mut buf = [0i32; 18];
    tmpl.to_positional(&mut buf);
    let back = ComplexTemplate::from_positional(&buf).unwrap();
    assert_eq!(back, tmpl);
}
