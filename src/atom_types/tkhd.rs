//! Track header atom (`tkhd`).
//!
//! Location: `moov/trak[multiple]/tkhd`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/track_header_atom>

use binrw::BinRead;
use time::PrimitiveDateTime;

use crate::atom::{Field, FieldSpan, FieldValue};

use super::{mac_time, time_fields, versioned, versioned_width};

/// Track header atom (`tkhd`).
///
/// Location: `moov/trak[multiple]/tkhd`
///
/// See: <https://developer.apple.com/documentation/quicktime-file-format/track_header_atom>
#[derive(Debug, Clone, BinRead)]
#[br(big)]
pub struct Tkhd {
    pub(crate) version: u8,
    _flags: [u8; 3],
    /// Indicates the creation calendar date and time for the track header.
    /// Represents the calendar date and time in seconds since midnight,
    /// January 1, 1904, preferably using coordinated universal time (UTC).
    #[br(parse_with = versioned, args(version))]
    pub(crate) creation_time: u64,
    /// Indicates the last change date for the track header.
    /// Represents the calendar date and time in seconds since midnight,
    /// January 1, 1904, preferably using coordinated universal time (UTC).
    #[br(parse_with = versioned, args(version))]
    pub(crate) modification_time: u64,
    /// Uniquely identifies the track.
    /// Value 0 cannot be used.
    pub(crate) track_id: u32,
    /// Reserved. Should be set to 0.
    _reserved1: [u8; 4],
    /// Indicates the duration of this track,
    /// in the movie’s time coordinate system.
    #[br(parse_with = versioned, args(version))]
    pub(crate) duration: u64,
    _reserved2: [u8; 8],
    /// Layer, alternate group, volume
    _presentation: [u8; 6],
    _reserved3: [u8; 2],
    _matrix_structure: [u8; 36],
    /// Width, height as 16.16 fixed point
    _dimensions: [u8; 8],
}

impl Tkhd {
    pub fn track_id(&self) -> u32 {
        self.track_id
    }

    /// This track's unscaled duration.
    pub fn duration(&self) -> u64 {
        self.duration
    }

    /// Creation datetime for this track.
    pub fn creation_time(&self) -> Option<PrimitiveDateTime> {
        mac_time(self.creation_time)
    }

    /// Modification datetime for this track.
    pub fn modification_time(&self) -> Option<PrimitiveDateTime> {
        mac_time(self.modification_time)
    }

    pub(crate) fn fields(&self, data_offset: u64) -> Vec<Field> {
        let width = versioned_width(self.version) as u64;
        let mut fields = time_fields(
            self.version,
            self.creation_time,
            self.modification_time,
            data_offset
        ).to_vec();
        fields.push(Field::new(
            "track_id",
            FieldValue::U32(self.track_id),
            Some(FieldSpan::new(data_offset + 4 + 2 * width, 4))
        ));
        // track id + 4 reserved bytes
        fields.push(Field::new(
            "duration",
            FieldValue::from_versioned(self.duration, self.version),
            Some(FieldSpan::new(data_offset + 12 + 2 * width, width as u8))
        ));
        fields
    }
}
