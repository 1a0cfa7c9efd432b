//! GRIB2 complex packing (Data Representation Templates 5.2, 5.3) and
//! spherical-harmonic spectral packing (5.51).
//!
//! This crate implements the three adaptive-group codecs the WMO manual
//! groups under "complex packing": plain complex packing, complex packing
//! with spatial differencing, and the spectral variant used for gridded
//! fields expressed as spherical-harmonic coefficients. It does not parse
//! GRIB2 messages; callers are expected to hand it a template's already-read
//! `idrstmpl` array (or the typed [`ComplexTemplate`]/[`SpectralTemplate`]
//! built from one) and the section-7 payload bytes.
//!
//! # Layout
//!
//! - [`bitio`] — sub-octet bit gather/scatter.
//! - [`ieee32`] — big-endian IEEE-754 bit-casts.
//! - [`intmath`] — the integer-log helpers the group and template math need.
//! - [`template`] — typed stand-ins for the positional `idrstmpl` arrays.
//! - [`group`] — Glahn's adaptive group partitioner.
//! - [`complex`] — DRT 5.2 / 5.3 without missing value management.
//! - [`missing`] — DRT 5.2 / 5.3 with missing value management.
//! - [`spectral`] — DRT 5.51.

pub mod bitio;
pub mod complex;
pub mod error;
pub mod group;
pub mod ieee32;
pub mod intmath;
pub mod missing;
pub mod spectral;
pub mod template;

pub use crate::{
    error::{BitIoError, PackError, TemplateError, UnpackError},
    template::{ComplexTemplate, MissMgmt, SpatialDiffOrder, SpectralTemplate},
};

/// Packs `fld` under DRT 5.2 / 5.3, dispatching to [`complex::encode`] or
/// [`missing::encode`] depending on `miss_mgmt`.
#[allow(clippy::too_many_arguments)]
pub fn complex_pack(
    fld: &[f32],
    binary_scale: i16,
    decimal_scale: i16,
    miss_mgmt: MissMgmt,
    primary_missing: f32,
    secondary_missing: f32,
    spatial_diff_order: SpatialDiffOrder,
    minpk: usize,
) -> Result<(Vec<u8>, ComplexTemplate), PackError> {
    match miss_mgmt {
        MissMgmt::None => complex::encode(fld, binary_scale, decimal_scale, spatial_diff_order, minpk),
        MissMgmt::Primary | MissMgmt::PrimaryAndSecondary => missing::encode(
            fld,
            binary_scale,
            decimal_scale,
            miss_mgmt,
            primary_missing,
            secondary_missing,
            spatial_diff_order,
            minpk,
        ),
    }
}

/// Unpacks a DRT 5.2 / 5.3 payload into `ndpts` real values, dispatching to
/// [`complex::decode`] or [`missing::decode`] depending on `tmpl.miss_mgmt`.
pub fn complex_unpack(payload: &[u8], tmpl: &ComplexTemplate, ndpts: usize) -> Result<Vec<f32>, UnpackError> {
    match tmpl.miss_mgmt {
        MissMgmt::None => complex::decode(payload, tmpl, ndpts),
        MissMgmt::Primary | MissMgmt::PrimaryAndSecondary => missing::decode(payload, tmpl, ndpts),
    }
}

/// [`complex_pack`] through the raw 18-slot positional `idrstmpl` array
/// layout, for callers that parse section 5 by hand rather than through
/// [`ComplexTemplate`].
pub fn complex_pack_positional(
    fld: &[f32],
    binary_scale: i16,
    decimal_scale: i16,
    miss_mgmt: u8,
    primary_missing: f32,
    secondary_missing: f32,
    spatial_diff_order: u8,
    minpk: usize,
    idrstmpl: &mut [i32],
) -> Result<Vec<u8>, PackError> {
    let miss_mgmt = MissMgmt::from_u8(miss_mgmt)?;
    let spatial_diff_order = match spatial_diff_order {
        0 => SpatialDiffOrder::None,
        1 => SpatialDiffOrder::First,
        2 => SpatialDiffOrder::Second,
        _ => return Err(PackError::Template(TemplateError::InvalidTemplate("unknown spatial differencing order"))),
    };
    let (payload, tmpl) = complex_pack(
        fld,
        binary_scale,
        decimal_scale,
        miss_mgmt,
        primary_missing,
        secondary_missing,
        spatial_diff_order,
        minpk,
    )?;
    tmpl.to_positional(idrstmpl);
    Ok(payload)
}

/// [`complex_unpack`] through the raw 18-slot positional `idrstmpl` array
/// layout. Returns a zero-filled field of `ndpts` points if the template
/// declares a missing value management mode this crate cannot interpret,
/// matching how the reference decoder degrades on an unrecognized template
/// rather than aborting the whole message.
pub fn complex_unpack_positional(payload: &[u8], idrstmpl: &[i32], ndpts: usize) -> Result<Vec<f32>, UnpackError> {
    let tmpl = match ComplexTemplate::from_positional(idrstmpl) {
        Ok(tmpl) => tmpl,
        Err(_) => return Ok(vec![0.0; ndpts]),
    };
    complex_unpack(payload, &tmpl, ndpts)
}

/// [`spectral::decode`] through the raw 10-slot positional `idrstmpl` array
/// layout. Returns a zero-filled coefficient list if the template's
/// precision flag isn't one this crate supports, for the same reason
/// [`complex_unpack_positional`] does.
pub fn spectral_unpack_positional(
    payload: &[u8],
    idrstmpl: &[i32],
    jj: u16,
    kk: u16,
    mm: u16,
) -> Result<Vec<f32>, UnpackError> {
    let tmpl = SpectralTemplate::from_positional(idrstmpl)?;
    match spectral::decode(payload, &tmpl, jj, kk, mm) {
        Ok(values) => Ok(values),
        Err(UnpackError::UnsupportedPrecision) => {
            let pairs = spectral::truncation_pairs(jj, kk, mm);
            Ok(vec![0.0; pairs.len() * 2])
        }
        Err(e) => Err(e),
    }
}
