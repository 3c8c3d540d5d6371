//! GPMF record decoding.

use std::io::Cursor;

use binrw::{BinRead, BinReaderExt, BinWrite, BinWriterExt};

use crate::{support::{align4, iso8859_1}, Mp4Error};

use super::value::{interpreter, Value};

/// GPMF record header, 8 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(big)]
pub struct RecordHeader {
    /// FourCC key, e.g. `GPSU`.
    pub key: [u8; 4],
    /// Type code, e.g. `L` for `u32`.
    /// `0` for nested records.
    pub type_code: u8,
    /// Size in bytes for a single element.
    pub element_size: u8,
    /// Number of elements.
    pub repeat: u16,
}

impl RecordHeader {
    /// Header size in bytes.
    pub const SIZE: usize = 8;

    /// Size of data load in bytes, excluding padding.
    pub fn data_size(&self) -> usize {
        self.element_size as usize * self.repeat as usize
    }

    /// Size of data load in bytes, including padding.
    pub fn padded_size(&self) -> usize {
        align4(self.data_size())
    }
}

/// GPMF record, borrowing its data load
/// (excluding padding) from the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    pub(crate) header: RecordHeader,
    pub(crate) data: &'a [u8],
}

/// A record is either a sequence of nested records,
/// or a value.
#[derive(Debug, Clone)]
pub enum Element<'a> {
    /// Type code `0`. Data load is itself a sequence of records.
    Nested(Records<'a>),
    /// Any other type code.
    Value(Record<'a>),
}

impl <'a> Record<'a> {
    /// New record from key, type, element size, and data load.
    /// Repeat is derived from data length.
    ///
    /// Mainly for generating GPMF data.
    pub fn new(key: [u8; 4], type_code: u8, element_size: u8, data: &'a [u8]) -> Result<Self, Mp4Error> {
        let repeat = match element_size {
            0 => 0,
            n => u16::try_from(data.len() / n as usize)?,
        };
        let header = RecordHeader { key, type_code, element_size, repeat };
        if header.data_size() != data.len() {
            return Err(Mp4Error::TruncatedRecord {
                key,
                offset: 0,
                needed: header.data_size(),
                remaining: data.len()
            })
        }
        Ok(Self { header, data })
    }

    pub fn header(&self) -> &RecordHeader {
        &self.header
    }

    pub fn key(&self) -> [u8; 4] {
        self.header.key
    }

    /// FourCC key as string.
    pub fn key_str(&self) -> String {
        iso8859_1(&self.header.key, false)
    }

    pub fn type_code(&self) -> u8 {
        self.header.type_code
    }

    pub fn element_size(&self) -> u8 {
        self.header.element_size
    }

    pub fn repeat(&self) -> u16 {
        self.header.repeat
    }

    /// Raw data load, excluding padding.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn is_nested(&self) -> bool {
        self.header.type_code == 0
    }

    /// Nested records or value.
    pub fn element(&self) -> Element<'a> {
        match self.is_nested() {
            true => Element::Nested(Records::new(self.data)),
            false => Element::Value(*self),
        }
    }

    /// Interpret data load according to type code.
    ///
    /// Fails with `Mp4Error::UnsupportedType` for type codes
    /// without an interpreter, including nested records.
    pub fn value(&self) -> Result<Value, Mp4Error> {
        let interpret = interpreter(self.type_code())
            .ok_or(Mp4Error::UnsupportedType(self.type_code()))?;
        interpret(self)
    }

    /// Interpret data load according to type code,
    /// returning the raw bytes for unsupported types.
    pub fn value_or_raw(&self) -> Result<Value, Mp4Error> {
        match self.value() {
            Err(Mp4Error::UnsupportedType(_)) => Ok(Value::Raw(self.data.to_vec())),
            result => result
        }
    }

    /// Size in bytes when encoded, including header and padding.
    pub fn encoded_size(&self) -> usize {
        RecordHeader::SIZE + self.header.padded_size()
    }

    /// Encodes record as header, data load,
    /// and zero padding to 4 byte alignment.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Mp4Error> {
        let mut cursor = Cursor::new(Vec::with_capacity(self.encoded_size()));
        cursor.write_be(&self.header)?;
        let mut bytes = cursor.into_inner();
        bytes.extend_from_slice(self.data);
        bytes.resize(self.encoded_size(), 0);
        Ok(bytes)
    }
}

/// Iterator over a flat sequence of GPMF records.
///
/// Yields `Mp4Error::TruncatedRecord` once if a header or a padded
/// data load exceeds the remaining bytes, then stops.
/// Each iterator is independent, clone or create a new one to restart.
#[derive(Debug, Clone)]
pub struct Records<'a> {
    data: &'a [u8],
    pos: usize,
    failed: bool,
}

impl <'a> Records<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            failed: false
        }
    }

    /// Current byte offset in buffer.
    pub fn pos(&self) -> usize {
        self.pos
    }

    fn read_record(&mut self) -> Result<Record<'a>, Mp4Error> {
        let remaining = self.data.len() - self.pos;

        if remaining < RecordHeader::SIZE {
            let mut key = [0_u8; 4];
            let partial = &self.data[self.pos ..];
            let n = partial.len().min(4);
            key[..n].copy_from_slice(&partial[..n]);
            return Err(Mp4Error::TruncatedRecord {
                key,
                offset: self.pos,
                needed: RecordHeader::SIZE,
                remaining
            })
        }

        let header_bytes = &self.data[self.pos .. self.pos + RecordHeader::SIZE];
        let header = Cursor::new(header_bytes).read_be::<RecordHeader>()?;

        let needed = RecordHeader::SIZE + header.padded_size();
        if needed > remaining {
            return Err(Mp4Error::TruncatedRecord {
                key: header.key,
                offset: self.pos,
                needed,
                remaining
            })
        }

        let start = self.pos + RecordHeader::SIZE;
        let data = &self.data[start .. start + header.data_size()];
        self.pos += needed;

        Ok(Record { header, data })
    }
}

impl <'a> Iterator for Records<'a> {
    type Item = Result<Record<'a>, Mp4Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.data.len() {
            return None
        }
        let result = self.read_record();
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}
