//! Typed atom data loads, decoded with `binrw`.
//! Only atoms required for locating telemetry and
//! creation times are supported.

mod co64;
mod hdlr;
mod mdhd;
mod mvhd;
mod stco;
mod stsz;
mod stts;
mod tkhd;
mod types;

pub use co64::Co64;
pub use hdlr::Hdlr;
pub use mdhd::Mdhd;
pub use mvhd::Mvhd;
pub use stco::Stco;
pub use stsz::Stsz;
pub use stts::{Stts, TimeToSample};
pub use tkhd::Tkhd;
pub use types::AtomType;

use binrw::{BinRead, BinResult};
use time::{Duration, PrimitiveDateTime};

use crate::{atom::{Field, FieldSpan, FieldValue}, consts::MP4_TIME_ZERO, Mp4Error};

/// Reads a 32-bit value for version 0 atoms,
/// a 64-bit value for version 1 atoms.
#[binrw::parser(reader, endian)]
pub(crate) fn versioned(version: u8) -> BinResult<u64> {
    match version {
        1 => u64::read_options(reader, endian, ()),
        _ => u32::read_options(reader, endian, ()).map(u64::from),
    }
}

/// Byte width for fields that depend on atom version.
pub(crate) fn versioned_width(version: u8) -> u8 {
    match version {
        1 => 8,
        _ => 4,
    }
}

/// Seconds since midnight, 1904-01-01 as datetime.
/// Returns `None` if out of range.
pub fn mac_time(seconds: u64) -> Option<PrimitiveDateTime> {
    let seconds = i64::try_from(seconds).ok()?;
    MP4_TIME_ZERO.checked_add(Duration::seconds(seconds))
}

/// Datetime as seconds since midnight, 1904-01-01.
/// Sub-second precision is discarded.
pub fn mac_seconds(datetime: &PrimitiveDateTime) -> Result<u64, Mp4Error> {
    u64::try_from((*datetime - MP4_TIME_ZERO).whole_seconds())
        .map_err(|_| Mp4Error::InvalidTimestamp(datetime.to_string()))
}

/// Creation and modification time fields,
/// common to `mvhd`, `tkhd`, and `mdhd`, positioned
/// directly after version and flags.
pub(crate) fn time_fields(
    version: u8,
    creation_time: u64,
    modification_time: u64,
    data_offset: u64,
) -> [Field; 2] {
    let width = versioned_width(version);
    [
        Field::new(
            crate::consts::CREATION_DATE,
            FieldValue::from_mac_time(creation_time, width),
            Some(FieldSpan::new(data_offset + 4, width)),
        ),
        Field::new(
            crate::consts::MODIFICATION_DATE,
            FieldValue::from_mac_time(modification_time, width),
            Some(FieldSpan::new(data_offset + 4 + width as u64, width)),
        ),
    ]
}
