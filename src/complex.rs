//! Complex packing without missing values: Data Representation Templates
//! 5.2 (plain) and 5.3 (with spatial differencing).
//!
//! [`crate::missing`] builds on the quantization, differencing, and
//! bit-layout helpers here, adding sentinel handling on top; this module is
//! what it falls back to when missing value management is disabled.

use crate::bitio::{BitReader, BitWriter};
use crate::error::{PackError, UnpackError};
use crate::group;
use crate::intmath::{ilog2_ceil, ilog2_ceil_diff};
use crate::template::{ComplexTemplate, MissMgmt, SpatialDiffOrder};

/// A single packed group: `[start, start + length)` into the (possibly
/// differenced) working sequence, reduced to a reference and a bit width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Group {
    pub(crate) start: usize,
    pub(crate) length: usize,
    pub(crate) reference: i64,
    pub(crate) width: u32,
}

pub(crate) fn build_groups(values: &[i64], minpk: usize) -> Vec<Group> {
    group::partition_boundaries(values, minpk)
        .into_iter()
        .map(|(start, length)| {
            let slice = &values[start..start + length];
            let reference = slice.iter().copied().min().unwrap();
            let max = slice.iter().copied().max().unwrap();
            Group {
                start,
                length,
                reference,
                width: ilog2_ceil_diff(max, reference),
            }
        })
        .collect()
}

/// Quantizes `fld` against its own minimum, per the fixed-point law in
/// `X_int = round((X_real * 10^D - R) * 2^E)`. Returns the quantized
/// reference value (as stored in the template) and the non-negative integer
/// field.
pub(crate) fn quantize(fld: &[f32], decimal_scale: i16, binary_scale: i16) -> (f32, Vec<i64>) {
    let rmin = fld.iter().copied().fold(f32::INFINITY, f32::min);
    quantize_against(fld, rmin, decimal_scale, binary_scale)
}

/// Quantizes `fld` against a caller-supplied reference `rmin` (used by
/// [`crate::missing`], which quantizes only the non-missing subset but must
/// still pick the reference from that subset).
pub(crate) fn quantize_against(
    fld: &[f32],
    rmin: f32,
    decimal_scale: i16,
    binary_scale: i16,
) -> (f32, Vec<i64>) {
    let d = 10f64.powi(i32::from(decimal_scale));
    let scaled_min = (f64::from(rmin) * d).round();
    let r_stored = scaled_min as f32;
    let bscale = 2f64.powi(i32::from(binary_scale));
    let ifld = fld
        .iter()
        .map(|&v| {
            let raw = ((f64::from(v) * d - scaled_min) * bscale).round() as i64;
            raw.max(0)
        })
        .collect();
    (r_stored, ifld)
}

/// Inverts [`quantize`]/[`quantize_against`]: `X_real = (X_int * 2^-E + R) * 10^-D`.
pub(crate) fn dequantize(raw: i64, ref_value: f32, binary_scale: i16, decimal_scale: i16) -> f32 {
    let bscale = 2f64.powi(-i32::from(binary_scale));
    let d = 10f64.powi(-i32::from(decimal_scale));
    ((raw as f64 * bscale + f64::from(ref_value)) * d) as f32
}

/// First-order spatial differencing: `ifld[j] -= ifld[j-1]` walked from the
/// end backward (so every subtraction uses an undifferenced neighbor),
/// leaving `ifld[0]` zeroed and returning its original value.
pub(crate) fn diff1(ifld: &mut [i64]) -> i64 {
    let n = ifld.len();
    for j in (1..n).rev() {
        ifld[j] -= ifld[j - 1];
    }
    let v1 = ifld[0];
    ifld[0] = 0;
    v1
}

/// Second-order spatial differencing:
/// `ifld[j] -= 2*ifld[j-1] - ifld[j-2]`, walked backward; leaves `ifld[0]`
/// and `ifld[1]` zeroed and returns their original values.
pub(crate) fn diff2(ifld: &mut [i64]) -> (i64, i64) {
    let n = ifld.len();
    for j in (2..n).rev() {
        ifld[j] -= 2 * ifld[j - 1] - ifld[j - 2];
    }
    let v1 = ifld[0];
    let v2 = ifld[1];
    ifld[0] = 0;
    ifld[1] = 0;
    (v1, v2)
}

pub(crate) fn undiff1(ifld: &mut [i64], v1: i64) {
    ifld[0] = v1;
    for j in 1..ifld.len() {
        ifld[j] += ifld[j - 1];
    }
}

pub(crate) fn undiff2(ifld: &mut [i64], v1: i64, v2: i64) {
    ifld[0] = v1;
    if ifld.len() > 1 {
        ifld[1] = v2;
    }
    for j in 2..ifld.len() {
        ifld[j] += 2 * ifld[j - 1] - ifld[j - 2];
    }
}

/// Subtracts the minimum of `seq` from every element, returning that
/// minimum (the spec's `m_sd`).
pub(crate) fn subtract_running_min(seq: &mut [i64]) -> i64 {
    let m = seq.iter().copied().min().unwrap_or(0);
    for v in seq.iter_mut() {
        *v -= m;
    }
    m
}

pub(crate) fn add_back(seq: &mut [i64], m: i64) {
    for v in seq.iter_mut() {
        *v += m;
    }
}

fn bit_length_u64(n: u64) -> u32 {
    if n == 0 { 0 } else { u64::BITS - n.leading_zeros() }
}

/// Width, in whole octets, needed to hold `v1`/`v2`/`m_sd` as sign-magnitude
/// fields (one extra bit reserved for the sign).
pub(crate) fn compute_nbitsd(v1: i64, v2: Option<i64>, m_sd: i64) -> u8 {
    let max_abs = [v1.unsigned_abs(), v2.map(i64::unsigned_abs).unwrap_or(0), m_sd.unsigned_abs()]
        .into_iter()
        .max()
        .unwrap();
    let bits_needed = bit_length_u64(max_abs) + 1;
    bits_needed.div_ceil(8).max(1) as u8 * 8
}

/// Packs `fld` under DRT 5.2 (`spatial_diff_order == None`) or 5.3.
pub fn encode(
    fld: &[f32],
    binary_scale: i16,
    decimal_scale: i16,
    spatial_diff_order: SpatialDiffOrder,
    minpk: usize,
) -> Result<(Vec<u8>, ComplexTemplate), PackError> {
    let mut tmpl = ComplexTemplate::for_encode(
        binary_scale,
        decimal_scale,
        MissMgmt::None,
        0.0,
        0.0,
        spatial_diff_order,
    );

    if fld.is_empty() {
        return Ok((Vec::new(), tmpl));
    }

    let rmin = fld.iter().copied().fold(f32::INFINITY, f32::min);
    let rmax = fld.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    // The ngroups=0 fast path is reserved for genuinely constant fields of
    // two or more points; a lone sample is instead carried through the
    // ordinary single-group path (ngroups=1), matching how `ndpts == 1` is
    // defined to behave (see DESIGN.md).
    if rmin == rmax && fld.len() > 1 {
        let d = 10f64.powi(i32::from(decimal_scale));
        tmpl.ref_value = (f64::from(rmin) * d).round() as f32;
        return Ok((Vec::new(), tmpl));
    }

    let (r_stored, mut ifld) = quantize(fld, decimal_scale, binary_scale);
    tmpl.ref_value = r_stored;

    let s = spatial_diff_order.order();
    let (v1, v2, m_sd) = match spatial_diff_order {
        SpatialDiffOrder::None => (0, 0, 0),
        SpatialDiffOrder::First => {
            let v1 = diff1(&mut ifld);
            let m_sd = subtract_running_min(&mut ifld[1..]);
            (v1, 0, m_sd)
        }
        SpatialDiffOrder::Second => {
            let (v1, v2) = diff2(&mut ifld);
            let m_sd = subtract_running_min(&mut ifld[2..]);
            (v1, v2, m_sd)
        }
    };

    let working = &ifld[s..];
    let groups = build_groups(working, minpk);

    let mut writer = BitWriter::new();
    if s > 0 {
        let nbitsd = compute_nbitsd(v1, if s == 2 { Some(v2) } else { None }, m_sd);
        writer.write_signed(v1, nbitsd as usize);
        if s == 2 {
            writer.write_signed(v2, nbitsd as usize);
        }
        writer.write_signed(m_sd, nbitsd as usize);
        writer.align_to_octet();
        tmpl.nbitsd_octets = nbitsd / 8;
    }

    if groups.is_empty() {
        tmpl.ngroups = 0;
        return Ok((writer.into_bytes(), tmpl));
    }

    let max_ref = groups.iter().map(|g| g.reference).max().unwrap();
    let nbits_ref = ilog2_ceil(u32::try_from(max_ref).expect("group reference exceeds u32"));
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

    for g in &groups {
        writer.write(g.reference as u32, nbits_ref as usize);
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
    for g in &groups {
        let slice = &working[g.start..g.start + g.length];
        for &v in slice {
            writer.write((v - g.reference) as u32, g.width as usize);
        }
    }

    Ok((writer.into_bytes(), tmpl))
}

/// Parses the section-7 header (the spatial-differencing descriptors, when
/// present) and the group reference/width/length arrays, leaving `reader`
/// positioned at the start of the residual bitstream. Shared by
/// [`decode`] and [`crate::missing::decode`].
pub(crate) fn parse_header_and_groups<'a>(
    payload: &'a [u8],
    tmpl: &ComplexTemplate,
) -> Result<(i64, i64, i64, Vec<i64>, Vec<u32>, Vec<u32>, BitReader<'a>), UnpackError> {
    let s = tmpl.spatial_diff_order.order();
    let mut reader = BitReader::new(payload);
    let (v1, v2, m_sd) = if s > 0 {
        let nbitsd = tmpl.nbitsd_octets as usize * 8;
        let v1 = reader.read_signed(nbitsd)?;
        let v2 = if s == 2 { reader.read_signed(nbitsd)? } else { 0 };
        let m_sd = reader.read_signed(nbitsd)?;
        reader.align_to_octet();
        (v1, v2, m_sd)
    } else {
        (0, 0, 0)
    };

    let ngroups = tmpl.ngroups as usize;
    let refs: Vec<i64> = (0..ngroups)
        .map(|_| reader.read(tmpl.nbits_ref as usize).map(i64::from))
        .collect::<Result<_, _>>()?;
    reader.align_to_octet();
    let widths: Vec<u32> = (0..ngroups)
        .map(|_| reader.read(tmpl.nbits_width as usize).map(|w| w + tmpl.width_ref))
        .collect::<Result<_, _>>()?;
    reader.align_to_octet();
    let mut lengths: Vec<u32> = (0..ngroups.saturating_sub(1))
        .map(|_| reader.read(tmpl.nbits_len as usize).map(|l| l + tmpl.length_ref))
        .collect::<Result<_, _>>()?;
    lengths.push(tmpl.last_length);
    reader.align_to_octet();

    Ok((v1, v2, m_sd, refs, widths, lengths, reader))
}

/// Unpacks a DRT 5.2 / 5.3 payload back into `ndpts` real values.
pub fn decode(payload: &[u8], tmpl: &ComplexTemplate, ndpts: usize) -> Result<Vec<f32>, UnpackError> {
    if ndpts == 0 {
        return Ok(Vec::new());
    }
    if tmpl.ngroups == 0 {
        let value = dequantize(0, tmpl.ref_value, tmpl.binary_scale, tmpl.decimal_scale);
        return Ok(vec![value; ndpts]);
    }

    let s = tmpl.spatial_diff_order.order();
    let (v1, v2, m_sd, refs, widths, lengths, mut reader) = parse_header_and_groups(payload, tmpl)?;
    let ngroups = tmpl.ngroups as usize;

    let mut working = Vec::with_capacity(ndpts - s);
    for i in 0..ngroups {
        for _ in 0..lengths[i] {
            let raw = reader.read(widths[i] as usize)?;
            working.push(refs[i] + i64::from(raw));
        }
    }

    let mut ifld = vec![0i64; ndpts];
    ifld[s..].copy_from_slice(&working);

    match tmpl.spatial_diff_order {
        SpatialDiffOrder::None => {}
        SpatialDiffOrder::First => {
            add_back(&mut ifld[1..], m_sd);
            undiff1(&mut ifld, v1);
        }
        SpatialDiffOrder::Second => {
            add_back(&mut ifld[2..], m_sd);
            undiff2(&mut ifld, v1, v2);
        }
    }

    Ok(ifld
        .iter()
        .map(|&raw| dequantize(raw, tmpl.ref_value, tmpl.binary_scale, tmpl.decimal_scale))
        .collect())
}
