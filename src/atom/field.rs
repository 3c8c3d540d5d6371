//! Named, decoded atom fields and the box tree capability
//! used for locating and patching them.

use time::PrimitiveDateTime;

use crate::{atom_types::{mac_seconds, mac_time}, FourCC, Mp4Error};

/// Absolute byte span for a fixed-width field
/// in the backing MP4 file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpan {
    /// Absolute byte offset from start of file.
    pub offset: u64,
    /// Field width in bytes.
    pub width: u8,
}

impl FieldSpan {
    pub fn new(offset: u64, width: u8) -> Self {
        Self{offset, width}
    }

    /// Absolute byte offset for the first byte
    /// after the field.
    pub fn end(&self) -> u64 {
        self.offset + self.width as u64
    }
}

/// Decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    /// MP4 datetime, stored as seconds since 1904-01-01,
    /// preferably UTC.
    DateTime(PrimitiveDateTime),
    Text(String),
    Raw(Vec<u8>),
}

impl FieldValue {
    /// Seconds since 1904-01-01 as a datetime,
    /// or the raw value if out of range.
    pub(crate) fn from_mac_time(seconds: u64, width: u8) -> Self {
        match mac_time(seconds) {
            Some(datetime) => Self::DateTime(datetime),
            None => match width {
                4 => Self::U32(seconds as u32),
                _ => Self::U64(seconds),
            }
        }
    }

    /// 32-bit value for version 0 atoms,
    /// 64-bit value for version 1 atoms.
    pub(crate) fn from_versioned(value: u64, version: u8) -> Self {
        match version {
            1 => Self::U64(value),
            _ => Self::U32(value as u32),
        }
    }

    pub fn as_datetime(&self) -> Option<&PrimitiveDateTime> {
        match self {
            Self::DateTime(dt) => Some(dt),
            _ => None
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::U8(n) => Some(*n as u64),
            Self::U16(n) => Some(*n as u64),
            Self::U32(n) => Some(*n as u64),
            Self::U64(n) => Some(*n),
            _ => None
        }
    }

    /// `true` if both values are the same variant,
    /// e.g. both datetimes.
    pub fn same_kind(&self, other: &FieldValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None
        }
    }

    /// Big endian encoding for a field that is `width` bytes wide.
    ///
    /// Datetimes are encoded as whole seconds since 1904-01-01,
    /// as 32-bit values unless `width` is 8 or the value
    /// exceeds the 32-bit range.
    /// Other values use their natural size, regardless of `width`.
    ///
    /// The returned length may differ from `width`, the caller
    /// decides whether that is acceptable.
    pub fn encode(&self, width: u8) -> Result<Vec<u8>, Mp4Error> {
        let bytes = match self {
            Self::U8(n) => vec![*n],
            Self::U16(n) => n.to_be_bytes().to_vec(),
            Self::U32(n) => n.to_be_bytes().to_vec(),
            Self::U64(n) => n.to_be_bytes().to_vec(),
            Self::DateTime(dt) => {
                let seconds = mac_seconds(dt)?;
                match (width, u32::try_from(seconds)) {
                    (8, _) | (_, Err(_)) => seconds.to_be_bytes().to_vec(),
                    (_, Ok(s)) => s.to_be_bytes().to_vec(),
                }
            },
            Self::Text(s) => s.as_bytes().to_vec(),
            Self::Raw(b) => b.to_owned(),
        };
        Ok(bytes)
    }
}

/// Named atom field, e.g. `creation_date` in `mvhd`.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub(crate) name: &'static str,
    pub(crate) value: FieldValue,
    /// Byte span in the MP4, if field is fixed-width
    /// and can be patched in place.
    pub(crate) span: Option<FieldSpan>,
}

impl Field {
    pub fn new(name: &'static str, value: FieldValue, span: Option<FieldSpan>) -> Self {
        Self{name, value, span}
    }

    /// Number of entries in a sample table atom.
    pub(crate) fn count(n: usize) -> Self {
        Self::new("count", FieldValue::U64(n as u64), None)
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    pub fn span(&self) -> Option<&FieldSpan> {
        self.span.as_ref()
    }
}

/// Navigable box tree node with named fields.
///
/// The patch engine only depends on this capability,
/// not on the MP4 grammar.
pub trait BoxNode: Sized {
    /// FourCC for this node.
    fn fourcc(&self) -> &FourCC;

    /// Child nodes, in file order.
    fn children(&self) -> &[Self];

    /// Decoded fields for this node.
    fn fields(&self) -> &[Field];

    /// Field with specified name, `None` if not present.
    fn field(&self, name: &str) -> Option<&Field> {
        self.fields().iter().find(|f| f.name() == name)
    }

    /// First direct child with specified FourCC.
    fn child(&self, fourcc: &FourCC) -> Option<&Self> {
        self.children().iter().find(|c| c.fourcc() == fourcc)
    }

    /// Descendant following a path of FourCC:s,
    /// taking the first match at each level,
    /// e.g. `["mdia", "hdlr"]` from a `trak`.
    fn find_path(&self, path: &[&str]) -> Option<&Self> {
        path.iter()
            .try_fold(self, |node, name| node.child(&FourCC::from_str(name)))
    }
}
