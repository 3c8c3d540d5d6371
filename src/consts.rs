use time::{macros::datetime, PrimitiveDateTime};

/// FourCC:s for known "container" atoms.
/// These are nested and contains more atoms,
/// within its specified, total size.
///
/// Only container atoms in the main MP4 tree are listed.
///
/// - `moov`: offset tables, timing, metadata, telemetry
/// - `trak`: moov.trak (multiple)
/// - `tref`: moov.trak.tref
/// - `edts`: moov.trak.edts
/// - `mdia`: moov.trak.mdia
/// - `minf`: moov.trak.mdia.minf
/// - `dinf`: moov.trak.mdia.minf.dinf
/// - `stbl`: moov.trak.mdia.minf.stbl, contains timing (stts), offsets (stco)
/// - `udta`: moov.udta, may contain custom data, specific to the device
/// - `gmhd`: moov.trak.mdia.minf.gmhd, base media info, for GoPro telemetry contains `gpmd`
pub const CONTAINER: [&'static str; 10] = [
    "moov",
    "trak",
    "tref",
    "edts",
    "mdia",
    "minf",
    "dinf",
    "stbl",
    "udta",
    "gmhd",
];

/// Time zero for MP4 containers. Midnight January 1, 1904.
pub const MP4_TIME_ZERO: PrimitiveDateTime = datetime!(1904-01-01 0:00);

/// Semantic name for the creation time field in
/// `mvhd`, `tkhd`, and `mdhd` atoms.
pub const CREATION_DATE: &str = "creation_date";

/// Semantic name for the modification time field in
/// `mvhd`, `tkhd`, and `mdhd` atoms.
pub const MODIFICATION_DATE: &str = "modification_date";

/// Handler name for GoPro GPMF telemetry track.
pub const GOPRO_MET: &str = "GoPro MET";

/// GPMF key for GPS fix status
/// (0 = no lock, 2 = 2D lock, 3 = 3D lock).
pub const GPSF: [u8; 4] = *b"GPSF";

/// GPMF key for GPS UTC time, `yymmddhhmmss.sss`.
pub const GPSU: [u8; 4] = *b"GPSU";
