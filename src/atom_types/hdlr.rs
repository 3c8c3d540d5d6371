//! Handler reference atom (`hdlr`).
//!
//! > Note: Distinguish from 'Metadata handler atom' with the same FourCC.
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/handler_reference_atom>

use binrw::BinRead;

use crate::{atom::{Field, FieldValue}, support::{chars_from_bytes, maybe_counted_string}};

/// Handler reference atom (`hdlr`)
///
/// See: <https://developer.apple.com/documentation/quicktime-file-format/handler_reference_atom>
#[derive(Debug, Default, Clone, BinRead)]
#[br(big)]
pub struct Hdlr {
    _version: u8,
    _flags: [u8; 3],
    /// Byte 12-15
    /// Possible values:
    /// - `mhlr`: media handler
    /// - `dhlr`: data handler
    /// - `[0, 0, 0, 0]` (DJI Osmo, ISO MP4)
    #[br(map(|data: [u8; 4]| chars_from_bytes(data)))]
    pub(crate) component_type: [char; 4],
    /// Four CC for the type of media or data handler,
    /// e.g. `vide`, `soun`, `tmcd`, `meta`.
    #[br(map(|data: [u8; 4]| chars_from_bytes(data)))]
    pub(crate) component_sub_type: [char; 4],
    /// Reserved, should be set to 0.
    pub(crate) component_manufacturer: u32,
    /// Reserved, should be set to 0.
    pub(crate) component_flags: u32,
    /// Reserved, should be set to 0.
    pub(crate) component_flags_mask: u32,
    /// May be a counted string (first byte specifies size),
    /// null terminated string, or neither.
    ///
    /// This field is set separately via `Hdlr::with_name()`,
    /// since for some old MP4/Quicktimes
    /// `component_name` is not a counted string.
    #[br(ignore)]
    pub(crate) component_name: String,
}

impl Hdlr {
    /// Size in bytes for fixed part, preceding component name.
    pub(crate) const FIXED_SIZE: usize = 24;

    /// Sets component name from the remaining bytes in atom.
    pub(crate) fn with_name(self, name: &[u8]) -> Self {
        Self {
            component_name: maybe_counted_string(name),
            ..self
        }
    }

    /// Returns component type as `String`.
    /// Should be either `mhlr` (media handler),
    /// or `dhlr` (data handler).
    pub fn component_type(&self) -> String {
        self.component_type.iter().collect()
    }

    /// Returns component sub type as `String`.
    /// E.g. `meta` for GoPro telemetry.
    pub fn component_sub_type(&self) -> String {
        self.component_sub_type.iter().collect()
    }

    pub fn component_manufacturer(&self) -> u32 {
        self.component_manufacturer
    }

    pub fn component_flags(&self) -> u32 {
        self.component_flags
    }

    pub fn component_flags_mask(&self) -> u32 {
        self.component_flags_mask
    }

    pub fn component_name(&self) -> &str {
        self.component_name.as_str()
    }

    pub(crate) fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("component_type", FieldValue::Text(self.component_type()), None),
            Field::new("component_subtype", FieldValue::Text(self.component_sub_type()), None),
            Field::new("component_name", FieldValue::Text(self.component_name.to_owned()), None),
        ]
    }
}
