//! MP4 atom FourCC.
//! See https://developer.apple.com/library/archive/documentation/QuickTime/QTFF/QTFFChap2/qtff2.html#//apple_ref/doc/uid/TP40000939-CH204-56313.
//! Some non-standard Four CC listed, stemming from e.g. GoPro MP4-files.

use std::fmt::Display;

/// MP4 atom Four CC.
/// See https://developer.apple.com/library/archive/documentation/QuickTime/QTFF/QTFFChap2/qtff2.html#//apple_ref/doc/uid/TP40000939-CH204-56313.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FourCC {
    /// Chunk offset, 64-bit values
    Co64,
    /// Data Information Atoms
    Dinf,
    Edts,
    Ftyp,
    /// Base media information header,
    /// e.g. GoPro telemetry track.
    Gmhd,
    /// GoPro GPMF sample description,
    /// inside `gmhd`.
    Gpmd,
    Hdlr,
    Mdat,
    /// Media header, one per track.
    Mdhd,
    Mdia,
    Minf,
    /// Movie Atom
    Moov,
    /// Movie Header Atom
    Mvhd,
    Stbl,
    /// Chunk offset, 32-bit values
    Stco,
    Stsz,
    Stts,
    /// Track header
    Tkhd,
    /// Track description
    Trak,
    Tref,
    /// User data
    Udta,

    Custom(String)
}

impl Display for FourCC {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FourCC {
    pub fn from_slice(fourcc: &[u8]) -> Self {
        match fourcc {
            b"co64" => Self::Co64,
            b"dinf" => Self::Dinf,
            b"edts" => Self::Edts,
            b"ftyp" => Self::Ftyp,
            b"gmhd" => Self::Gmhd,
            b"gpmd" => Self::Gpmd,
            b"hdlr" => Self::Hdlr,
            b"mdat" => Self::Mdat,
            b"mdhd" => Self::Mdhd,
            b"mdia" => Self::Mdia,
            b"minf" => Self::Minf,
            b"moov" => Self::Moov,
            b"mvhd" => Self::Mvhd,
            b"stbl" => Self::Stbl,
            b"stco" => Self::Stco,
            b"stsz" => Self::Stsz,
            b"stts" => Self::Stts,
            b"tkhd" => Self::Tkhd,
            b"trak" => Self::Trak,
            b"tref" => Self::Tref,
            b"udta" => Self::Udta,

            // UTF-8 does not work for single-byte char above 127
            // but ISO8859-1 mapping works for range 128-255
            _ => Self::Custom(
                fourcc
                    .iter()
                    .map(|n| *n as char)
                    .collect::<String>()
            ),
        }
    }

    pub fn from_u32(value: u32) -> Self {
        Self::from_slice(&value.to_be_bytes())
    }

    pub fn from_str(fourcc: &str) -> Self {
        match fourcc {
            "co64" => Self::Co64,
            "dinf" => Self::Dinf,
            "edts" => Self::Edts,
            "ftyp" => Self::Ftyp,
            "gmhd" => Self::Gmhd,
            "gpmd" => Self::Gpmd,
            "hdlr" => Self::Hdlr,
            "mdat" => Self::Mdat,
            "mdhd" => Self::Mdhd,
            "mdia" => Self::Mdia,
            "minf" => Self::Minf,
            "moov" => Self::Moov,
            "mvhd" => Self::Mvhd,
            "stbl" => Self::Stbl,
            "stco" => Self::Stco,
            "stsz" => Self::Stsz,
            "stts" => Self::Stts,
            "tkhd" => Self::Tkhd,
            "trak" => Self::Trak,
            "tref" => Self::Tref,
            "udta" => Self::Udta,
            _ => Self::Custom(fourcc.to_owned()),
        }
    }

    pub fn to_str(&self) -> &str {
        match self {
            Self::Co64 => "co64",
            Self::Dinf => "dinf",
            Self::Edts => "edts",
            Self::Ftyp => "ftyp",
            Self::Gmhd => "gmhd",
            Self::Gpmd => "gpmd",
            Self::Hdlr => "hdlr",
            Self::Mdat => "mdat",
            Self::Mdhd => "mdhd",
            Self::Mdia => "mdia",
            Self::Minf => "minf",
            Self::Moov => "moov",
            Self::Mvhd => "mvhd",
            Self::Stbl => "stbl",
            Self::Stco => "stco",
            Self::Stsz => "stsz",
            Self::Stts => "stts",
            Self::Tkhd => "tkhd",
            Self::Trak => "trak",
            Self::Tref => "tref",
            Self::Udta => "udta",
            Self::Custom(s) => s.as_str()
        }
    }
}

impl Default for FourCC {
    fn default() -> Self {
        Self::Custom("None".to_owned())
    }
}
