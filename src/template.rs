//! Typed stand-ins for GRIB2's positional `idrstmpl[]` arrays.
//!
//! [`ComplexTemplate`] covers Data Representation Templates 5.2 and 5.3 (the
//! fields that differ between them — spatial-differencing order and the
//! `nbitsd` octet count — are simply zero when unused). [`SpectralTemplate`]
//! covers 5.51. Both provide `from_positional`/`to_positional` so callers
//! that still think in terms of the raw 18- and 10-slot arrays (as the
//! reference implementation's `idrstmpl` does) can interoperate with code
//! built around the typed records.

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::error::TemplateError;
use crate::ieee32;

/// Missing value management mode (Code Table 5.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum MissMgmt {
    None = 0,
    Primary = 1,
    PrimaryAndSecondary = 2,
}

impl MissMgmt {
    pub fn from_u8(v: u8) -> Result<Self, TemplateError> {
        Self::try_from(v).map_err(|_| TemplateError::InvalidMissMgmt(v))
    }

    pub fn as_u8(self) -> u8 {
        self.into()
    }

    /// Number of top codepoints a group's bit width must reserve for
    /// sentinels: 0, 1, or 2.
    pub fn reserved_codepoints(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Primary => 1,
            Self::PrimaryAndSecondary => 2,
        }
    }
}

/// Spatial differencing order (Code Table 5.6). `None` is DRT 5.2; `First`
/// or `Second` selects DRT 5.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum SpatialDiffOrder {
    None = 0,
    First = 1,
    Second = 2,
}

impl SpatialDiffOrder {
    pub fn order(self) -> usize {
        u8::from(self) as usize
    }
}

/// Typed record for DRT 5.2 / 5.3's 18-slot `idrstmpl`.
///
/// Slots `[0..=17]` below correspond to template labels `[1]..[18]` in the
/// packed representation (1-based numbering, as the WMO manual writes it).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplexTemplate {
    /// `[1]` Reference value R, stored as the quantized field minimum.
    pub ref_value: f32,
    /// `[2]` Binary scale factor E.
    pub binary_scale: i16,
    /// `[3]` Decimal scale factor D.
    pub decimal_scale: i16,
    /// `[4]` Number of bits used for each group's packed reference value.
    pub nbits_ref: u8,
    /// `[5]` Type of original field values (always 0: floating point).
    pub orig_field_type: u8,
    /// `[6]` Group splitting method used (always 1: general, Glahn).
    pub group_splitting_method: u8,
    /// `[7]` Missing value management used.
    pub miss_mgmt: MissMgmt,
    /// `[8]` Primary missing value substitute, as an IEEE-754 float.
    pub primary_missing: f32,
    /// `[9]` Secondary missing value substitute, as an IEEE-754 float.
    pub secondary_missing: f32,
    /// `[10]` Number of groups.
    pub ngroups: u32,
    /// `[11]` Reference for group widths.
    pub width_ref: u32,
    /// `[12]` Number of bits used for the group widths (after subtracting
    /// `width_ref`).
    pub nbits_width: u8,
    /// `[13]` Reference for group lengths.
    pub length_ref: u32,
    /// `[14]` Length increment for the group lengths (always 1).
    pub length_increment: u8,
    /// `[15]` True length of the last group.
    pub last_length: u32,
    /// `[16]` Number of bits used for the group lengths (after subtracting
    /// `length_ref`).
    pub nbits_len: u8,
    /// `[17]` Order of spatial differencing (0 for DRT 5.2).
    pub spatial_diff_order: SpatialDiffOrder,
    /// `[18]` Number of octets used for each of the extra spatial
    /// differencing descriptors (0 for DRT 5.2).
    pub nbitsd_octets: u8,
}

impl ComplexTemplate {
    /// Builds the input-side fields an encoder is given; output-side fields
    /// (group layout, nbits_ref, ...) start zeroed and are filled in by
    /// [`crate::complex`]/[`crate::missing`] once packing completes.
    pub fn for_encode(
        binary_scale: i16,
        decimal_scale: i16,
        miss_mgmt: MissMgmt,
        primary_missing: f32,
        secondary_missing: f32,
        spatial_diff_order: SpatialDiffOrder,
    ) -> Self {
        Self {
            ref_value: 0.0,
            binary_scale,
            decimal_scale,
            nbits_ref: 0,
            orig_field_type: 0,
            group_splitting_method: 1,
            miss_mgmt,
            primary_missing,
            secondary_missing,
            ngroups: 0,
            width_ref: 0,
            nbits_width: 0,
            length_ref: 0,
            length_increment: 1,
            last_length: 0,
            nbits_len: 0,
            spatial_diff_order,
            nbitsd_octets: 0,
        }
    }

    pub fn from_positional(tmpl: &[i32]) -> Result<Self, TemplateError> {
        if tmpl.len() < 18 {
            return Err(TemplateError::InvalidTemplate("complex template needs >= 18 slots"));
        }
        let spatial_diff_order = match tmpl[16] {
            0 => SpatialDiffOrder::None,
            1 => SpatialDiffOrder::First,
            2 => SpatialDiffOrder::Second,
            _ => return Err(TemplateError::InvalidTemplate("unknown spatial differencing order")),
        };
        Ok(Self {
            ref_value: ieee32::read_ieee(tmpl[0] as u32),
            binary_scale: tmpl[1] as i16,
            decimal_scale: tmpl[2] as i16,
            nbits_ref: tmpl[3] as u8,
            orig_field_type: tmpl[4] as u8,
            group_splitting_method: tmpl[5] as u8,
            miss_mgmt: MissMgmt::from_u8(tmpl[6] as u8)?,
            primary_missing: ieee32::read_ieee(tmpl[7] as u32),
            secondary_missing: ieee32::read_ieee(tmpl[8] as u32),
            ngroups: tmpl[9] as u32,
            width_ref: tmpl[10] as u32,
            nbits_width: tmpl[11] as u8,
            length_ref: tmpl[12] as u32,
            length_increment: tmpl[13] as u8,
            last_length: tmpl[14] as u32,
            nbits_len: tmpl[15] as u8,
            spatial_diff_order,
            nbitsd_octets: tmpl[17] as u8,
        })
    }

    pub fn to_positional(&self, tmpl: &mut [i32]) {
        assert!(tmpl.len() >= 18, "complex template needs >= 18 slots");
        tmpl[0] = ieee32::write_ieee(self.ref_value) as i32;
        tmpl[1] = i32::from(self.binary_scale);
        tmpl[2] = i32::from(self.decimal_scale);
        tmpl[3] = i32::from(self.nbits_ref);
        tmpl[4] = i32::from(self.orig_field_type);
        tmpl[5] = i32::from(self.group_splitting_method);
        tmpl[6] = i32::from(self.miss_mgmt.as_u8());
        tmpl[7] = ieee32::write_ieee(self.primary_missing) as i32;
        tmpl[8] = ieee32::write_ieee(self.secondary_missing) as i32;
        tmpl[9] = self.ngroups as i32;
        tmpl[10] = self.width_ref as i32;
        tmpl[11] = i32::from(self.nbits_width);
        tmpl[12] = self.length_ref as i32;
        tmpl[13] = i32::from(self.length_increment);
        tmpl[14] = self.last_length as i32;
        tmpl[15] = i32::from(self.nbits_len);
        tmpl[16] = self.spatial_diff_order.order() as i32;
        tmpl[17] = i32::from(self.nbitsd_octets);
    }
}

/// Typed record for DRT 5.51's 10-slot `idrstmpl`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralTemplate {
    /// `[1]` Reference value R.
    pub ref_value: f32,
    /// `[2]` Binary scale factor E.
    pub binary_scale: i16,
    /// `[3]` Decimal scale factor D.
    pub decimal_scale: i16,
    /// `[4]` Number of bits per packed value.
    pub nbits: u8,
    /// `[5]` Laplacian scaling factor P, stored as an integer times 10^6.
    pub laplacian_scaling_factor: i32,
    /// `[6]` Js: subset truncation, zonal wavenumber bound.
    pub js: u16,
    /// `[7]` Ks: subset truncation, total wavenumber bound.
    pub ks: u16,
    /// `[8]` Ms: subset truncation, order bound.
    pub ms: u16,
    /// `[9]` Ts: number of unpacked (verbatim) coefficient pairs.
    pub ts: u32,
    /// `[10]` Precision of the unpacked values (1 = IEEE 32-bit).
    pub precision: u8,
}

impl SpectralTemplate {
    pub fn from_positional(tmpl: &[i32]) -> Result<Self, TemplateError> {
        if tmpl.len() < 10 {
            return Err(TemplateError::InvalidTemplate("spectral template needs >= 10 slots"));
        }
        Ok(Self {
            ref_value: ieee32::read_ieee(tmpl[0] as u32),
            binary_scale: tmpl[1] as i16,
            decimal_scale: tmpl[2] as i16,
            nbits: tmpl[3] as u8,
            laplacian_scaling_factor: tmpl[4],
            js: tmpl[5] as u16,
            ks: tmpl[6] as u16,
            ms: tmpl[7] as u16,
            ts: tmpl[8] as u32,
            precision: tmpl[9] as u8,
        })
    }

    pub fn to_positional(&self, tmpl: &mut [i32]) {
        assert!(tmpl.len() >= 10, "spectral template needs >= 10 slots");
        tmpl[0] = ieee32::write_ieee(self.ref_value) as i32;
        tmpl[1] = i32::from(self.binary_scale);
        tmpl[2] = i32::from(self.decimal_scale);
        tmpl[3] = i32::from(self.nbits);
        tmpl[4] = self.laplacian_scaling_factor;
        tmpl[5] = i32::from(self.js);
        tmpl[6] = i32::from(self.ks);
        tmpl[7] = i32::from(self.ms);
        tmpl[8] = self.ts as i32;
        tmpl[9] = i32::from(self.precision);
    }
}
