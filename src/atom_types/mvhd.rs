//! Movie header atom (`mvhd`).
//!
//! Location: `moov/mvhd`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/movie_header_atom>

use binrw::BinRead;
use time::{Duration, PrimitiveDateTime, ext::NumericalDuration};

use crate::atom::{Field, FieldSpan, FieldValue};

use super::{mac_time, time_fields, versioned, versioned_width};

/// Movie header atom (`mvhd`).
///
/// Location: `moov/mvhd`
///
/// Version 0 uses 32-bit times and duration,
/// version 1 64-bit.
///
/// See: <https://developer.apple.com/documentation/quicktime-file-format/movie_header_atom>
#[derive(Debug, Clone, BinRead)]
#[br(big)]
pub struct Mvhd {
    pub(crate) version: u8,
    _flags: [u8; 3],
    /// Seconds since midnight, 1904-01-01 UTC
    #[br(parse_with = versioned, args(version))]
    pub(crate) creation_time: u64,
    /// Seconds since midnight, 1904-01-01 UTC
    #[br(parse_with = versioned, args(version))]
    pub(crate) modification_time: u64,
    /// Number of time units that pass in one second
    pub(crate) time_scale: u32,
    /// Unscaled duration. I.e. "time units"
    /// that require dividing by time scale
    /// to derive a value in seconds.
    ///
    /// Corresponds to the longest track.
    #[br(parse_with = versioned, args(version))]
    pub(crate) duration: u64,
    /// Preferred rate (16.16) and volume (8.8)
    _rate_volume: [u8; 6],
    _reserved: [u8; 10],
    _matrix: [u8; 36], // row-major matrix
    _predefined: [u8; 24],
    _next_track_id: u32,
}

impl Mvhd {
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Creation time as UTC datetime.
    /// May default to MP4 default time
    /// `1904-01-01 00:00:00` depending on device and settings.
    pub fn creation_time(&self) -> Option<PrimitiveDateTime> {
        mac_time(self.creation_time)
    }

    /// Modification time as UTC datetime.
    pub fn modification_time(&self) -> Option<PrimitiveDateTime> {
        mac_time(self.modification_time)
    }

    pub fn time_scale(&self) -> u32 {
        self.time_scale
    }

    /// Duration of the longest track in seconds.
    pub fn duration(&self) -> Duration {
        match self.time_scale {
            0 => Duration::ZERO,
            ts => (self.duration as f64 / ts as f64).seconds()
        }
    }

    /// Named fields with absolute byte spans,
    /// given the absolute offset of the atom's data load.
    pub(crate) fn fields(&self, data_offset: u64) -> Vec<Field> {
        let width = versioned_width(self.version) as u64;
        let mut fields = time_fields(
            self.version,
            self.creation_time,
            self.modification_time,
            data_offset
        ).to_vec();
        fields.push(Field::new(
            "time_scale",
            FieldValue::U32(self.time_scale),
            Some(FieldSpan::new(data_offset + 4 + 2 * width, 4))
        ));
        fields.push(Field::new(
            "duration",
            FieldValue::from_versioned(self.duration, self.version),
            Some(FieldSpan::new(data_offset + 8 + 2 * width, width as u8))
        ));
        fields
    }
}
