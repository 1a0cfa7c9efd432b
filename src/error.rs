use std::fmt::{self, Display, Formatter};

/// Failure of a [`crate::bitio`] primitive: the only way reading or writing a
/// bitfield can fail is running off the end of the caller's buffer, or being
/// asked for a width outside `[0, 32]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitIoError {
    BufferOverrun {
        bit_offset: usize,
        nbits: usize,
        buf_bits: usize,
    },
    InvalidWidth(usize),
}

impl std::error::Error for BitIoError {}

impl Display for BitIoError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::BufferOverrun {
                bit_offset,
                nbits,
                buf_bits,
            } => write!(
                f,
                "bit access of {nbits} bit(s) at offset {bit_offset} overruns buffer of {buf_bits} bit(s)"
            ),
            Self::InvalidWidth(w) => write!(f, "bit width {w} is out of range [0, 32]"),
        }
    }
}

/// A template descriptor carries a value outside what this codec can
/// interpret (an unsupported missing-value management mode, or an internally
/// inconsistent group layout).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplateError {
    InvalidMissMgmt(u8),
    InvalidTemplate(&'static str),
}

impl std::error::Error for TemplateError {}

impl Display for TemplateError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::InvalidMissMgmt(v) => {
                write!(f, "missing value management {v} is not 0, 1, or 2")
            }
            Self::InvalidTemplate(s) => write!(f, "invalid template: {s}"),
        }
    }
}

impl From<BitIoError> for TemplateError {
    fn from(_: BitIoError) -> Self {
        Self::InvalidTemplate("bit layout inconsistent with declared group counts")
    }
}

/// Error surfaced by the encode (`pack`) side of a codec.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PackError {
    InvalidMissMgmt,
    Template(TemplateError),
    BitIo(BitIoError),
}

impl std::error::Error for PackError {}

impl Display for PackError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::InvalidMissMgmt => write!(f, "missing value management is not 0, 1, or 2"),
            Self::Template(e) => write!(f, "{e}"),
            Self::BitIo(e) => write!(f, "{e}"),
        }
    }
}

impl From<TemplateError> for PackError {
    fn from(e: TemplateError) -> Self {
        Self::Template(e)
    }
}

impl From<BitIoError> for PackError {
    fn from(e: BitIoError) -> Self {
        Self::BitIo(e)
    }
}

/// Error surfaced by the decode (`unpack`) side of a codec.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UnpackError {
    InvalidMissMgmt,
    UnsupportedPrecision,
    Template(TemplateError),
    BitIo(BitIoError),
}

impl std::error::Error for UnpackError {}

impl Display for UnpackError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::InvalidMissMgmt => write!(f, "missing value management is not 0, 1, or 2"),
            Self::UnsupportedPrecision => {
                write!(f, "spectral precision flag is not 32-bit IEEE-754")
            }
            Self::Template(e) => write!(f, "{e}"),
            Self::BitIo(e) => write!(f, "{e}"),
        }
    }
}

impl From<TemplateError> for UnpackError {
    fn from(e: TemplateError) -> Self {
        Self::Template(e)
    }
}

impl From<BitIoError> for UnpackError {
    fn from(e: BitIoError) -> Self {
        Self::BitIo(e)
    }
}
