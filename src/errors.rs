//! Various MP4 and GPMF related errors.

use std::fmt;

/// Various MP4/GPMF related read, parse and patch errors.
#[derive(Debug)]
pub enum Mp4Error {
    /// Converted `BinResult` error.
    BinReadError(binrw::Error),
    /// Converted `Utf8Error`.
    Utf8Error(std::string::FromUtf8Error),
    /// IO error
    IOError(std::io::Error),
    /// Integer conversion error, e.g. `u64` to `usize`.
    IntConversion(std::num::TryFromIntError),
    /// GPMF record whose header or padded data load
    /// exceeds the remaining bytes in the buffer.
    TruncatedRecord{key: [u8; 4], offset: usize, needed: usize, remaining: usize},
    /// No value interpreter for GPMF type code.
    UnsupportedType(u8),
    /// GPS time string (type `U`) could not be parsed.
    InvalidGpsTime(String),
    /// Read of `len` bytes at `offset` exceeds stream size `max`.
    OffsetOutOfRange{offset: u64, len: u64, max: u64},
    /// Sample size and chunk offset/duration tables differ in length.
    SampleTableMismatch{sizes: usize, other: usize, table: String},
    /// No GPS fix status followed by a GPS time was found.
    NoGpsFixFound,
    /// Derived capture year does not match the expected year.
    SanityCheckFailed{expected: i32, got: i32},
    /// Replacement value does not encode to the field's byte width.
    PatchWidthMismatch{offset: u64, expected: usize, got: usize},
    /// Field has no byte span in the backing file.
    NotPatchable(String),
    /// Field holds a different kind of value than the replacement.
    FieldKindMismatch{name: String, offset: u64},
    /// Two staged patches cover the same bytes.
    OverlappingPatch{offset: u64, previous_end: u64},
    /// Datetime that can not be expressed as seconds since 1904-01-01.
    InvalidTimestamp(String),
    /// Failed to locate a track with specified handler name
    /// containing interleaved telemetry.
    MissingHandler(String),
    /// Atom with a size smaller than its header,
    /// or larger than its parent.
    UnexpectedAtomSize{len: u64, offset: u64},
    /// No such atom.
    NoSuchAtom(String),
}

impl std::error::Error for Mp4Error {}

impl fmt::Display for Mp4Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mp4Error::BinReadError(err) => write!(f, "{err}"),
            Mp4Error::Utf8Error(err) => write!(f, "{err}"),
            Mp4Error::IOError(err) => write!(f, "IO error: {}", err),
            Mp4Error::IntConversion(err) => write!(f, "Integer conversion error: {err}"),
            Mp4Error::TruncatedRecord{key, offset, needed, remaining} => write!(f,
                "Truncated GPMF record '{}' @ offset {offset}: needs {needed} bytes, {remaining} remaining.",
                key.iter().map(|b| *b as char).collect::<String>()
            ),
            Mp4Error::UnsupportedType(t) => write!(f, "Unsupported GPMF type {}/'{}'", t, *t as char),
            Mp4Error::InvalidGpsTime(s) => write!(f, "Invalid GPS time '{s}'"),
            Mp4Error::OffsetOutOfRange{offset, len, max} => write!(f, "Read of {len} bytes @ offset {offset} exceeds stream size {max}."),
            Mp4Error::SampleTableMismatch{sizes, other, table} => write!(f, "Sample table mismatch: {sizes} sample sizes, {other} entries in '{table}'."),
            Mp4Error::NoGpsFixFound => write!(f, "No GPS fix/time found"),
            Mp4Error::SanityCheckFailed{expected, got} => write!(f, "Sanity mismatch {got} != {expected}"),
            Mp4Error::PatchWidthMismatch{offset, expected, got} => write!(f, "Replacement @ offset {offset} is {got} bytes, field width is {expected} bytes."),
            Mp4Error::NotPatchable(name) => write!(f, "Field '{name}' has no byte span and can not be patched."),
            Mp4Error::FieldKindMismatch{name, offset} => write!(f, "Field '{name}' @ offset {offset} holds a different kind of value than the replacement."),
            Mp4Error::OverlappingPatch{offset, previous_end} => write!(f, "Patch @ offset {offset} overlaps previous patch ending @ {previous_end}."),
            Mp4Error::InvalidTimestamp(s) => write!(f, "Can not express '{s}' as an MP4 timestamp."),
            Mp4Error::MissingHandler(hdlr) => write!(f, "No telemetry track with handler name '{hdlr}'. Failed to locate offsets ('stco', 'stsz', 'stts') for interleaved data."),
            Mp4Error::UnexpectedAtomSize{len, offset} => write!(f, "Unexpected MP4 atom size of {len} bytes @ offset {offset}."),
            Mp4Error::NoSuchAtom(name) => write!(f, "No such atom {name}."),
        }
    }
}

/// Converts std::io::Error to Mp4Error
impl From<std::io::Error> for Mp4Error {
    fn from(err: std::io::Error) -> Self {
        Mp4Error::IOError(err)
    }
}

/// Converts std::string::FromUtf8Error to Mp4Error
impl From<std::string::FromUtf8Error> for Mp4Error {
    fn from(err: std::string::FromUtf8Error) -> Mp4Error {
        Mp4Error::Utf8Error(err)
    }
}

/// Converts std::num::TryFromIntError to Mp4Error
impl From<std::num::TryFromIntError> for Mp4Error {
    fn from(err: std::num::TryFromIntError) -> Mp4Error {
        Mp4Error::IntConversion(err)
    }
}

/// Converts Mp4Error to std::io::Error
impl From<Mp4Error> for std::io::Error {
    fn from(err: Mp4Error) -> Self {
        std::io::Error::new(std::io::ErrorKind::Other, err)
    }
}

/// Converts binrw::Error to Mp4Error
impl From<binrw::Error> for Mp4Error {
    fn from(err: binrw::Error) -> Mp4Error {
        Mp4Error::BinReadError(err)
    }
}
