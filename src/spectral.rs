//! Spherical-harmonic spectral packing: Data Representation Template 5.51.
//!
//! Unlike [`crate::complex`]'s adaptive groups, DRT 5.51 packs its
//! coefficients the way simple packing (DRT 5.0) does: one reference value
//! and one bit width for the whole field. The two things layered on top are
//! a verbatim-stored low-wavenumber subset, kept at full IEEE-754 precision,
//! and a Laplacian rescaling of everything past it, which flattens the
//! otherwise steep fall-off in coefficient magnitude as the total
//! wavenumber grows.

use crate::bitio::{BitReader, BitWriter};
use crate::complex;
use crate::error::{PackError, TemplateError, UnpackError};
use crate::ieee32;
use crate::intmath::ilog2_ceil;
use crate::template::SpectralTemplate;

/// Highest total wavenumber `n` kept for zonal wavenumber `m` under
/// truncation `(jj, kk, mm)`, or `None` if `m` falls outside the truncation
/// entirely. `kk == jj + mm` is the triangular case (`Nm = jj + m`, the usual
/// `Txx` truncation); any other combination is treated as the general case,
/// where every zonal wavenumber keeps the same band (`Nm = jj`).
fn band_max(jj: u16, kk: u16, mm: u16, m: u16) -> Option<u16> {
    if m > mm {
        return None;
    }
    let triangular = kk == jj + mm;
    Some(if triangular { jj + m } else { jj })
}

/// Enumerates `(m, n)` zonal/total wavenumber pairs in on-the-wire order for
/// a spectral truncation `(jj, kk, mm)`.
pub fn truncation_pairs(jj: u16, kk: u16, mm: u16) -> Vec<(u16, u16)> {
    let mut pairs = Vec::new();
    for m in 0..=mm {
        if let Some(n_max) = band_max(jj, kk, mm, m) {
            if n_max >= m {
                for n in m..=n_max {
                    pairs.push((m, n));
                }
            }
        }
    }
    pairs
}

/// Whether `(m, n)` falls inside the verbatim subset truncation `(js, ks,
/// ms)` — the membership test is the same "does `n` fall inside this `m`'s
/// band" question `band_max` answers, just against the subset's own
/// truncation rather than the full field's. The subset for a given `m` is a
/// prefix of the full field's band for that `m` (since `ms <= mm` and
/// `band_max(js, ks, ms, m) <= band_max(jj, kk, mm, m)` whenever both are
/// triangular or both are general), so walking the full traversal and
/// filtering by this test yields the subset in its own traversal order.
fn is_verbatim(m: u16, n: u16, js: u16, ks: u16, ms: u16) -> bool {
    matches!(band_max(js, ks, ms, m), Some(n_max) if n <= n_max)
}

/// `P(n) = (n(n+1))^-T`, the factor [`decode`] multiplies a packed
/// coefficient by to undo the scaling [`encode`] applied before quantizing
/// it. `n == 0` is left unscaled: the mean coefficient always falls inside
/// the verbatim subset in practice, so this only guards against a
/// degenerate all-packed field raising zero to a negative power.
fn unpack_scale(n: u16, scaling_factor: i32) -> f64 {
    if n == 0 {
        return 1.0;
    }
    let t = f64::from(scaling_factor) / 1_000_000.0;
    let nn1 = f64::from(n) * f64::from(n + 1);
    nn1.powf(-t)
}

fn pack_scale(n: u16, scaling_factor: i32) -> f64 {
    let s = unpack_scale(n, scaling_factor);
    if s == 0.0 { 0.0 } else { 1.0 / s }
}

/// Splits `pairs`' indices into the verbatim subset and the packed
/// remainder, both in traversal order, per the `(js, ks, ms)` membership
/// test.
fn split_by_subset(pairs: &[(u16, u16)], js: u16, ks: u16, ms: u16) -> (Vec<usize>, Vec<usize>) {
    let mut verbatim = Vec::new();
    let mut packed = Vec::new();
    for (i, &(m, n)) in pairs.iter().enumerate() {
        if is_verbatim(m, n, js, ks, ms) {
            verbatim.push(i);
        } else {
            packed.push(i);
        }
    }
    (verbatim, packed)
}

/// Packs `coeffs` (interleaved `[re0, im0, re1, im1, ...]`, one pair per
/// entry of `truncation_pairs(jj, kk, mm)`) under DRT 5.51. Pairs inside the
/// `(js, ks, ms)` subset truncation are kept verbatim; the rest are
/// Laplacian-scaled and quantized together as one simple-packed block.
#[allow(clippy::too_many_arguments)]
pub fn encode(
    coeffs: &[f32],
    binary_scale: i16,
    decimal_scale: i16,
    jj: u16,
    kk: u16,
    mm: u16,
    js: u16,
    ks: u16,
    ms: u16,
    laplacian_scaling_factor: i32,
) -> Result<(Vec<u8>, SpectralTemplate), PackError> {
    let pairs = truncation_pairs(jj, kk, mm);
    if coeffs.len() != pairs.len() * 2 {
        return Err(PackError::Template(TemplateError::InvalidTemplate(
            "coefficient count does not match the spectral truncation",
        )));
    }
    let (verbatim, packed) = split_by_subset(&pairs, js, ks, ms);

    let mut tmpl = SpectralTemplate {
        ref_value: 0.0,
        binary_scale,
        decimal_scale,
        nbits: 0,
        laplacian_scaling_factor,
        js,
        ks,
        ms,
        ts: verbatim.len() as u32,
        precision: 1,
    };

    let mut writer = BitWriter::new();
    for &i in &verbatim {
        writer.write(ieee32::write_ieee(coeffs[2 * i]), 32);
        writer.write(ieee32::write_ieee(coeffs[2 * i + 1]), 32);
    }
    writer.align_to_octet();

    if packed.is_empty() {
        return Ok((writer.into_bytes(), tmpl));
    }

    let scaled: Vec<f32> = packed
        .iter()
        .flat_map(|&i| {
            let (_, n) = pairs[i];
            let scale = pack_scale(n, laplacian_scaling_factor);
            [
                (f64::from(coeffs[2 * i]) * scale) as f32,
                (f64::from(coeffs[2 * i + 1]) * scale) as f32,
            ]
        })
        .collect();

    let (r_stored, ifld) = complex::quantize(&scaled, decimal_scale, binary_scale);
    tmpl.ref_value = r_stored;
    let max = ifld.iter().copied().max().unwrap_or(0);
    let nbits = ilog2_ceil(u32::try_from(max).expect("quantized spectral coefficient exceeds u32"));
    tmpl.nbits = nbits as u8;

    for &v in &ifld {
        writer.write(v as u32, nbits as usize);
    }

    Ok((writer.into_bytes(), tmpl))
}

/// Unpacks a DRT 5.51 payload, returning interleaved `[re0, im0, re1, im1,
/// ...]` coefficients in `truncation_pairs(jj, kk, mm)` order.
pub fn decode(payload: &[u8], tmpl: &SpectralTemplate, jj: u16, kk: u16, mm: u16) -> Result<Vec<f32>, UnpackError> {
    if tmpl.precision != 1 {
        return Err(UnpackError::UnsupportedPrecision);
    }

    let pairs = truncation_pairs(jj, kk, mm);
    let (verbatim, packed) = split_by_subset(&pairs, tmpl.js, tmpl.ks, tmpl.ms);
    let mut reader = BitReader::new(payload);

    let mut out = vec![0f32; pairs.len() * 2];
    for &i in &verbatim {
        out[2 * i] = ieee32::read_ieee(reader.read(32)?);
        out[2 * i + 1] = ieee32::read_ieee(reader.read(32)?);
    }
    reader.align_to_octet();

    for &i in &packed {
        let (_, n) = pairs[i];
        let scale = unpack_scale(n, tmpl.laplacian_scaling_factor);
        let re_raw = i64::from(reader.read(tmpl.nbits as usize)?);
        let im_raw = i64::from(reader.read(tmpl.nbits as usize)?);
        let re = complex::dequantize(re_raw, tmpl.ref_value, tmpl.binary_scale, tmpl.decimal_scale);
        let im = complex::dequantize(im_raw, tmpl.ref_value, tmpl.binary_scale, tmpl.decimal_scale);
        out[2 * i] = (f64::from(re) * scale) as f32;
        out[2 * i + 1] = (f64::from(im) * scale) as f32;
    }

    Ok(out)
}
