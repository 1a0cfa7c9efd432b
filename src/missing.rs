//! Complex packing with missing value management: Data Representation
//! Templates 5.2 / 5.3 with `miss_mgmt != 0`.
//!
//! Builds directly on [`crate::complex`]'s quantization, spatial-differencing
//! and bit-layout helpers. The one real complication over the no-missing case
//! is that a group can now hold a blend of real residuals and sentinel
//! codes, so group references and widths have to leave room for whichever
//! sentinel codepoints that group actually needs.

use crate::bitio::BitWriter;
use crate::complex;
use crate::error::{PackError, UnpackError};
use crate::group;
use crate::intmath::{ilog2_ceil, ilog2_ceil_diff};
use crate::template::{ComplexTemplate, MissMgmt, SpatialDiffOrder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SampleKind {
    Normal,
    Primary,
    Secondary,
}

fn classify(value: f32, tmpl: &ComplexTemplate) -> SampleKind {
    match tmpl.miss_mgmt {
        MissMgmt::None => SampleKind::Normal,
        MissMgmt::Primary => {
            if value == tmpl.primary_missing {
                SampleKind::Primary
            } else {
                SampleKind::Normal
            }
        }
        MissMgmt::PrimaryAndSecondary => {
            if value == tmpl.primary_missing {
                SampleKind::Primary
            } else if value == tmpl.secondary_missing {
                SampleKind::Secondary
            } else {
                SampleKind::Normal
            }
        }
    }
}

struct MissGroup {
    start: usize,
    length: usize,
    /// `None` for an all-missing group (it carries no real reference).
    reference: Option<i64>,
    width: u32,
}

fn build_groups(values: &[i64], kinds: &[SampleKind], minpk: usize, reserved: u32) -> Vec<MissGroup> {
    group::partition_boundaries(values, minpk)
        .into_iter()
        .map(|(start, length)| {
            let kind_slice = &kinds[start..start + length];
            let val_slice = &values[start..start + length];
            let normals: Vec<i64> = val_slice
                .iter()
                .zip(kind_slice)
                .filter(|(_, k)| **k == SampleKind::Normal)
                .map(|(v, _)| *v)
                .collect();

            let reference = normals.iter().copied().min();
            let width = match reference {
                Some(reference) => {
                    let max = normals.iter().copied().max().unwrap();
                    if normals.len() == kind_slice.len() {
                        ilog2_ceil_diff(max, reference)
                    } else {
                        ilog2_ceil(u32::try_from(max - reference).expect("group span exceeds u32") + reserved)
                    }
                }
                None => {
                    let has_primary = kind_slice.contains(&SampleKind::Primary);
                    let has_secondary = kind_slice.contains(&SampleKind::Secondary);
                    if has_primary && has_secondary { 1 } else { 0 }
                }
            };
            MissGroup {
                start,
                length,
                reference,
                width,
            }
        })
        .collect()
}

fn residual_for(kind: SampleKind, value: i64, reference: i64, width: u32) -> u32 {
    if width == 0 {
        return 0;
    }
    match kind {
        SampleKind::Normal => (value - reference) as u32,
        SampleKind::Primary => ((1u64 << width) - 1) as u32,
        SampleKind::Secondary => ((1u64 << width) - 2) as u32,
    }
}

/// Packs `fld` under DRT 5.2 / 5.3 with missing value management enabled.
/// Positions equal to `primary_missing` (and, under
/// `MissMgmt::PrimaryAndSecondary`, `secondary_missing`) are encoded as
/// sentinel codepoints rather than quantized.
pub fn encode(
    fld: &[f32],
    binary_scale: i16,
    decimal_scale: i16,
    miss_mgmt: MissMgmt,
    primary_missing: f32,
    secondary_missing: f32,
    spatial_diff_order: SpatialDiffOrder,
    minpk: usize,
) -> Result<(Vec<u8>, ComplexTemplate), PackError> {
    if miss_mgmt == MissMgmt::None {
        return Err(PackError::InvalidMissMgmt);
    }

    let mut tmpl = ComplexTemplate::for_encode(
        binary_scale,
        decimal_scale,
        miss_mgmt,
        primary_missing,
        secondary_missing,
        spatial_diff_order,
    );

    if fld.is_empty() {
        return Ok((Vec::new(), tmpl));
    }

    let kinds: Vec<SampleKind> = fld.iter().map(|&v| classify(v, &tmpl)).collect();
    let nonmiss: Vec<f32> = fld
        .iter()
        .zip(&kinds)
        .filter(|(_, k)| **k == SampleKind::Normal)
        .map(|(v, _)| *v)
        .collect();

    let rmin = nonmiss.iter().copied().fold(f32::INFINITY, f32::min);
    let (r_stored, mut jfld) = if nonmiss.is_empty() {
        (0.0f32, Vec::new())
    } else {
        complex::quantize_against(&nonmiss, rmin, decimal_scale, binary_scale)
    };
    tmpl.ref_value = r_stored;

    // A field with too few non-missing samples to support the requested
    // differencing order falls back to a lower one; the returned template
    // records whichever order was actually used (see DESIGN.md).
    let (v1, v2, m_sd, actual_order) = match (spatial_diff_order, jfld.len()) {
        (SpatialDiffOrder::None, _) | (_, 0) => (0, 0, 0, SpatialDiffOrder::None),
        (SpatialDiffOrder::First, _) | (SpatialDiffOrder::Second, 1) => {
            let v1 = complex::diff1(&mut jfld);
            let m_sd = complex::subtract_running_min(&mut jfld[1..]);
            (v1, 0, m_sd, SpatialDiffOrder::First)
        }
        (SpatialDiffOrder::Second, _) => {
            let (v1, v2) = complex::diff2(&mut jfld);
            let m_sd = complex::subtract_running_min(&mut jfld[2..]);
            (v1, v2, m_sd, SpatialDiffOrder::Second)
        }
    };
    tmpl.spatial_diff_order = actual_order;

    // Re-expand: interleave the (possibly differenced) non-missing values
    // back at their original positions; missing positions get sentinel
    // codes distinguishable from any real (non-negative) residual.
    let miss1 = jfld.iter().copied().min().unwrap_or(0) - 1;
    let miss2 = miss1 - 1;
    let mut jfld_iter = jfld.into_iter();
    let ifld: Vec<i64> = kinds
        .iter()
        .map(|k| match k {
            SampleKind::Normal => jfld_iter.next().expect("one jfld entry per normal sample"),
            SampleKind::Primary => miss1,
            SampleKind::Secondary => miss2,
        })
        .collect();

    let reserved = tmpl.miss_mgmt.reserved_codepoints();
    // `ifld` is non-empty here (guarded above), so `build_groups` always
    // returns at least one group: unlike `complex::encode`, there is no
    // constant-field fast path that could leave `groups` empty.
    let groups = build_groups(&ifld, &kinds, minpk, reserved);

    let mut writer = BitWriter::new();
    let s = actual_order.order();
    if s > 0 {
        let nbitsd = complex::compute_nbitsd(v1, if s == 2 { Some(v2) } else { None }, m_sd);
        writer.write_signed(v1, nbitsd as usize);
        if s == 2 {
            writer.write_signed(v2, nbitsd as usize);
        }
        writer.write_signed(m_sd, nbitsd as usize);
        writer.align_to_octet();
        tmpl.nbitsd_octets = nbitsd / 8;
    }

    let max_real_ref = groups.iter().filter_map(|g| g.reference).max().unwrap_or(0);
    let nbits_ref = ilog2_ceil(u32::try_from(max_real_ref).expect("group reference exceeds u32") + reserved);
    let primary_ref = (1i64 << nbits_ref) - 1;
    let secondary_ref = (1i64 << nbits_ref) - 2;

    let width_ref = groups.iter().map(|g| g.width).min().unwrap();
    let nbits_width = ilog2_ceil(groups.iter().map(|g| g.width - width_ref).max().unwrap());
    let butlast = &groups[..groups.len() - 1];
    let length_ref = butlast.iter().map(|g| g.length as u32).min().unwrap_or(groups[0].length as u32);
    let nbits_len = if butlast.is_empty() {
        0
    } else {
        ilog2_ceil(butlast.iter().map(|g| g.length as u32 - length_ref).max().unwrap())
    };
    let last_length = groups.last().unwrap().length as u32;

    tmpl.ngroups = groups.len() as u32;
    tmpl.nbits_ref = nbits_ref as u8;
    tmpl.width_ref = width_ref;
    tmpl.nbits_width = nbits_width as u8;
    tmpl.length_ref = length_ref;
    tmpl.last_length = last_length;
    tmpl.nbits_len = nbits_len as u8;

    // A width-0 group is entirely one sentinel kind, so its reference is how
    // `decode` tells which; a width-1 all-missing group instead disambiguates
    // per sample via the raw bit (see `residual_for`), so its reference is
    // immaterial and left at 0.
    let group_refs: Vec<i64> = groups
        .iter()
        .map(|g| match g.reference {
            Some(r) => r,
            None if g.width == 0 => {
                let has_primary = kinds[g.start..g.start + g.length].contains(&SampleKind::Primary);
                if has_primary { primary_ref } else { secondary_ref }
            }
            None => 0,
        })
        .collect();

    for &r in &group_refs {
        writer.write(r as u32, nbits_ref as usize);
    }
    writer.align_to_octet();
    for g in &groups {
        writer.write(g.width - width_ref, nbits_width as usize);
    }
    writer.align_to_octet();
    for g in butlast {
        writer.write(g.length as u32 - length_ref, nbits_len as usize);
    }
    writer.align_to_octet();
    for (g, &reference) in groups.iter().zip(&group_refs) {
        let values = &ifld[g.start..g.start + g.length];
        let ks = &kinds[g.start..g.start + g.length];
        for (&v, &k) in values.iter().zip(ks) {
            writer.write(residual_for(k, v, reference, g.width), g.width as usize);
        }
    }

    Ok((writer.into_bytes(), tmpl))
}

/// Unpacks a DRT 5.2 / 5.3 payload that uses missing value management.
/// Missing positions are written back as `tmpl.primary_missing` /
/// `tmpl.secondary_missing`, matching the convention used to encode them.
pub fn decode(payload: &[u8], tmpl: &ComplexTemplate, ndpts: usize) -> Result<Vec<f32>, UnpackError> {
    if tmpl.miss_mgmt == MissMgmt::None {
        return Err(UnpackError::InvalidMissMgmt);
    }
    if ndpts == 0 {
        return Ok(Vec::new());
    }
    // Unlike `complex::decode`, there is no `ngroups == 0` fast path here: an
    // entirely missing field still gets one zero- or one-bit-wide group
    // (`build_groups` collapses any constant run, sentinel or real, to a
    // single group), so the general loop below covers it.

    let s = tmpl.spatial_diff_order.order();
    let (v1, v2, m_sd, refs, widths, lengths, mut reader) = complex::parse_header_and_groups(payload, tmpl)?;
    let ngroups = tmpl.ngroups as usize;

    let primary_ref = (1i64 << tmpl.nbits_ref) - 1;
    let secondary_ref = (1i64 << tmpl.nbits_ref) - 2;

    let mut kinds = Vec::with_capacity(ndpts);
    let mut ifld = Vec::with_capacity(ndpts);
    for i in 0..ngroups {
        let (width, reference) = (widths[i], refs[i]);
        if width == 0 {
            let kind = if tmpl.miss_mgmt != MissMgmt::None && reference == primary_ref {
                SampleKind::Primary
            } else if tmpl.miss_mgmt == MissMgmt::PrimaryAndSecondary && reference == secondary_ref {
                SampleKind::Secondary
            } else {
                SampleKind::Normal
            };
            for _ in 0..lengths[i] {
                kinds.push(kind);
                ifld.push(reference);
            }
            continue;
        }
        for _ in 0..lengths[i] {
            let raw = reader.read(width as usize)?;
            let raw = i64::from(raw);
            let kind = if tmpl.miss_mgmt != MissMgmt::None && raw == (1i64 << width) - 1 {
                SampleKind::Primary
            } else if tmpl.miss_mgmt == MissMgmt::PrimaryAndSecondary && raw == (1i64 << width) - 2 {
                SampleKind::Secondary
            } else {
                SampleKind::Normal
            };
            kinds.push(kind);
            ifld.push(if kind == SampleKind::Normal { reference + raw } else { reference });
        }
    }

    let mut jfld: Vec<i64> = ifld
        .iter()
        .zip(&kinds)
        .filter(|(_, k)| **k == SampleKind::Normal)
        .map(|(v, _)| *v)
        .collect();

    if s > 0 && jfld.len() >= s {
        match tmpl.spatial_diff_order {
            SpatialDiffOrder::None => {}
            SpatialDiffOrder::First => {
                complex::add_back(&mut jfld[1..], m_sd);
                complex::undiff1(&mut jfld, v1);
            }
            SpatialDiffOrder::Second => {
                complex::add_back(&mut jfld[2..], m_sd);
                complex::undiff2(&mut jfld, v1, v2);
            }
        }
    }

    let dequantized: Vec<f32> = jfld
        .into_iter()
        .map(|raw| complex::dequantize(raw, tmpl.ref_value, tmpl.binary_scale, tmpl.decimal_scale))
        .collect();

    let mut out = Vec::with_capacity(ndpts);
    let mut real_iter = dequantized.into_iter();
    for k in kinds {
        out.push(match k {
            SampleKind::Normal => real_iter.next().expect("one dequantized entry per normal sample"),
            SampleKind::Primary => tmpl.primary_missing,
            SampleKind::Secondary => tmpl.secondary_missing,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISS: f32 = 9999.0;
    const MISS2: f32 = 9998.0;

    fn approx_eq(a: &[f32], b: &[f32], eps: f32) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            if *y == MISS || *y == MISS2 {
                assert_eq!(x, y);
            } else {
                assert!((x - y).abs() <= eps, "{x} != {y} (eps {eps})");
            }
        }
    }

    #[test]
    fn field_with_scattered_primary_missing_round_trips() {
        let mut fld: Vec<f32> = (0..200).map(|i| i as f32 * 0.25).collect();
        for i in (0..200).step_by(7) {
            fld[i] = MISS;
        }
        let (payload, tmpl) = encode(
            &fld,
            3,
            1,
            MissMgmt::Primary,
            MISS,
            0.0,
            SpatialDiffOrder::None,
            group::DEFAULT_MINPK,
        )
        .unwrap();
        let decoded = decode(&payload, &tmpl, fld.len()).unwrap();
        approx_eq(&decoded, &fld, 0.2);
    }

    #[test]
    fn field_with_primary_and_secondary_missing_round_trips_with_differencing() {
        let mut fld: Vec<f32> = (0..300).map(|i| (i as f32 * 0.1).sin() * 50.0).collect();
        for i in (0..300).step_by(5) {
            fld[i] = MISS;
        }
        for i in (3..300).step_by(11) {
            fld[i] = MISS2;
        }
        let (payload, tmpl) = encode(
            &fld,
            2,
            1,
            MissMgmt::PrimaryAndSecondary,
            MISS,
            MISS2,
            SpatialDiffOrder::First,
            group::DEFAULT_MINPK,
        )
        .unwrap();
        let decoded = decode(&payload, &tmpl, fld.len()).unwrap();
        approx_eq(&decoded, &fld, 0.3);
    }

    #[test]
    fn entirely_missing_field_round_trips_to_all_sentinel() {
        let fld = vec![MISS; 50];
        let (payload, tmpl) = encode(
            &fld,
            0,
            0,
            MissMgmt::Primary,
            MISS,
            0.0,
            SpatialDiffOrder::First,
            group::DEFAULT_MINPK,
        )
        .unwrap();
        assert_eq!(tmpl.ngroups, 1);
        assert_eq!(tmpl.nbits_width, 0);
        assert_eq!(tmpl.spatial_diff_order, SpatialDiffOrder::None);
        let decoded = decode(&payload, &tmpl, fld.len()).unwrap();
        assert_eq!(decoded, fld);
    }

    #[test]
    fn no_missing_present_still_round_trips_under_miss_mgmt() {
        let fld: Vec<f32> = (0..100).map(|i| i as f32).collect();
        let (payload, tmpl) = encode(
            &fld,
            0,
            0,
            MissMgmt::Primary,
            MISS,
            0.0,
            SpatialDiffOrder::None,
            group::DEFAULT_MINPK,
        )
        .unwrap();
        let decoded = decode(&payload, &tmpl, fld.len()).unwrap();
        approx_eq(&decoded, &fld, 1e-3);
    }

    #[test]
    fn none_miss_mgmt_is_rejected() {
        assert_eq!(
            encode(&[1.0], 0, 0, MissMgmt::None, 0.0, 0.0, SpatialDiffOrder::None, group::DEFAULT_MINPK).unwrap_err(),
            PackError::InvalidMissMgmt
        );
    }
}
