//! Sets MP4 creation times from GPS time in GoPro GPMF telemetry.
//!
//! Cameras without a GPS fix at power on often record
//! a wrong creation time. This crate locates the first
//! GPS time logged after the GPS acquired a fix, subtracts
//! its offset into the recording, and patches the
//! `creation_date` fields in `mvhd`, `tkhd`, and `mdhd` in place.
//! The input file is never modified, a patched copy is written instead.
//!
//! Does not and will not support any kind of video de/encoding.
//!
//! The MP4 implementation was mostly done with help from
//! <https://developer.apple.com/library/archive/documentation/QuickTime/QTFF/QTFFPreface/qtffPreface.html>
//!
//! ```rs
//! use mp4timefix::{fix_timestamp, FixOptions, FixOutcome};
//! use std::path::Path;
//!
//! fn main() -> Result<(), mp4timefix::Mp4Error> {
//!     let options = FixOptions::default().with_sanity_year(Some(2021));
//!
//!     match fix_timestamp(Path::new("GOPRO.MP4"), &options)? {
//!         FixOutcome::Written { fix, patched, path } => {
//!             println!("Set {patched} fields to {}, wrote {}", fix.capture_start, path.display())
//!         },
//!         FixOutcome::Unchanged { .. } => println!("Nothing was changed"),
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod mp4;
pub mod fourcc;
pub mod offset;
pub mod atom;
pub mod atom_types;
pub mod consts;
pub mod track;
pub mod payload;
pub mod gpmf;
pub mod patch;
pub mod fix;
pub mod errors;
pub mod reader;

pub(crate) mod support;

#[cfg(test)]
mod tests;

pub use mp4::Mp4;
pub use fourcc::FourCC;
pub use offset::{Offset, Offsets};
pub use atom::{Atom, AtomHeader, AtomTree, BoxNode, Field, FieldSpan, FieldValue};
pub use atom_types::{
    AtomType,
    Co64,
    Hdlr,
    Mdhd,
    Mvhd,
    Stco,
    Stsz,
    Stts,
    Tkhd,
};
pub use errors::Mp4Error;
pub use reader::Mp4Reader;
pub use track::TelemetryTrack;
pub use payload::{extract_payload, Payload};
pub use fix::{fix_file, fix_timestamp, FixOptions, FixOutcome};
