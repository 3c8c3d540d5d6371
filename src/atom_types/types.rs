//! Typed atom data loads.

use std::io::Cursor;

use binrw::BinReaderExt;

use crate::{atom::Field, AtomHeader, FourCC, Mp4Error};

use super::{Co64, Hdlr, Mdhd, Mvhd, Stco, Stsz, Stts, Tkhd};

/// Decoded atom data load for atoms
/// relevant to telemetry extraction and
/// creation time patching.
#[derive(Debug, Clone)]
pub enum AtomType {
    /// Chunk offset, 64-bit values
    Co64(Co64),
    Hdlr(Hdlr),
    /// Media header, one per track
    Mdhd(Mdhd),
    /// Movie Header Atom
    Mvhd(Mvhd),
    /// Chunk offset, 32-bit values
    Stco(Stco),
    Stsz(Stsz),
    Stts(Stts),
    /// Track header
    Tkhd(Tkhd),
    /// Container atom, data load consists of other atoms.
    Container,
    /// Atom with data load that is not decoded.
    Other,
}

impl AtomType {
    /// Returns `true` if data load for atom
    /// with specified FourCC is decoded.
    pub(crate) fn is_decoded(fourcc: &FourCC) -> bool {
        matches!(fourcc,
            FourCC::Co64
            | FourCC::Hdlr
            | FourCC::Mdhd
            | FourCC::Mvhd
            | FourCC::Stco
            | FourCC::Stsz
            | FourCC::Stts
            | FourCC::Tkhd
        )
    }

    /// Decodes data load (excluding header)
    /// for atom with specified header.
    pub(crate) fn decode(header: &AtomHeader, data: Vec<u8>) -> Result<Self, Mp4Error> {
        let mut cursor = Cursor::new(data);
        let atom_type = match header.name() {
            FourCC::Co64 => Self::Co64(cursor.read_be::<Co64>()?),
            FourCC::Hdlr => {
                let hdlr = cursor.read_be::<Hdlr>()?;
                let name = cursor.get_ref().get(Hdlr::FIXED_SIZE..).unwrap_or_default();
                Self::Hdlr(hdlr.with_name(name))
            },
            FourCC::Mdhd => Self::Mdhd(cursor.read_be::<Mdhd>()?),
            FourCC::Mvhd => Self::Mvhd(cursor.read_be::<Mvhd>()?),
            FourCC::Stco => Self::Stco(cursor.read_be::<Stco>()?),
            FourCC::Stsz => Self::Stsz(cursor.read_be::<Stsz>()?),
            FourCC::Stts => Self::Stts(cursor.read_be::<Stts>()?),
            FourCC::Tkhd => Self::Tkhd(cursor.read_be::<Tkhd>()?),
            _ if header.is_container() => Self::Container,
            _ => Self::Other,
        };
        Ok(atom_type)
    }

    /// Named fields for atom, with absolute byte spans
    /// where the field is fixed-width and patchable.
    pub(crate) fn fields(&self, header: &AtomHeader) -> Vec<Field> {
        let data_offset = header.data_offset();
        match self {
            Self::Mvhd(mvhd) => mvhd.fields(data_offset),
            Self::Tkhd(tkhd) => tkhd.fields(data_offset),
            Self::Mdhd(mdhd) => mdhd.fields(data_offset),
            Self::Hdlr(hdlr) => hdlr.fields(),
            Self::Stco(stco) => vec![Field::count(stco.len())],
            Self::Co64(co64) => vec![Field::count(co64.len())],
            Self::Stsz(stsz) => vec![Field::count(stsz.len())],
            Self::Stts(stts) => vec![Field::count(stts.len())],
            Self::Container | Self::Other => Vec::new(),
        }
    }
}
