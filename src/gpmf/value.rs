//! GPMF value interpretation, keyed on type code.

use std::io::Cursor;

use binrw::{BinRead, BinReaderExt};
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};

use crate::{support::iso8859_1, Mp4Error};

use super::Record;

/// Interpreted GPMF value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Types `b`, `s`, `l`, `j`.
    Signed(Vec<i64>),
    /// Types `B`, `S`, `L`, `J`.
    Unsigned(Vec<u64>),
    /// Types `f`, `d`, `q`, `Q`. Fixed point values
    /// are converted to floats.
    Float(Vec<f64>),
    /// Type `c`, with null bytes ignored.
    Text(String),
    /// Type `F`.
    FourCC(Vec<String>),
    /// Type `U`, GPS UTC time.
    DateTime(OffsetDateTime),
    /// Unsupported types, if requested via `Record::value_or_raw()`.
    Raw(Vec<u8>),
}

impl Value {
    /// First numerical value as float.
    pub fn first_f64(&self) -> Option<f64> {
        match self {
            Value::Signed(v) => v.first().map(|n| *n as f64),
            Value::Unsigned(v) => v.first().map(|n| *n as f64),
            Value::Float(v) => v.first().copied(),
            _ => None
        }
    }

    pub fn as_datetime(&self) -> Option<&OffsetDateTime> {
        match self {
            Value::DateTime(dt) => Some(dt),
            _ => None
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None
        }
    }
}

/// Interprets a record's data load.
pub type Interpreter = fn(&Record) -> Result<Value, Mp4Error>;

/// Interpreter for specified type code,
/// `None` if the type is not supported.
///
/// Nested records (`0`), complex structures (`?`)
/// and UUIDs (`G`) are not supported.
pub fn interpreter(type_code: u8) -> Option<Interpreter> {
    let interpret: Interpreter = match type_code {
        b'b' => int8,
        b'B' => uint8,
        b's' => int16,
        b'S' => uint16,
        b'l' => int32,
        b'L' => uint32,
        b'j' => int64,
        b'J' => uint64,
        b'f' => float32,
        b'd' => float64,
        b'q' => fixed32,
        b'Q' => fixed64,
        b'c' => text,
        b'F' => fourcc,
        b'U' => utc_time,
        _ => return None
    };
    Some(interpret)
}

fn int8(record: &Record) -> Result<Value, Mp4Error> {
    Ok(Value::Signed(record.data().iter().map(|b| *b as i8 as i64).collect()))
}

fn uint8(record: &Record) -> Result<Value, Mp4Error> {
    Ok(Value::Unsigned(record.data().iter().map(|b| *b as u64).collect()))
}

fn int16(record: &Record) -> Result<Value, Mp4Error> {
    Ok(Value::Signed(numbers::<i16>(record)?.into_iter().map(i64::from).collect()))
}

fn uint16(record: &Record) -> Result<Value, Mp4Error> {
    Ok(Value::Unsigned(numbers::<u16>(record)?.into_iter().map(u64::from).collect()))
}

fn int32(record: &Record) -> Result<Value, Mp4Error> {
    Ok(Value::Signed(numbers::<i32>(record)?.into_iter().map(i64::from).collect()))
}

fn uint32(record: &Record) -> Result<Value, Mp4Error> {
    Ok(Value::Unsigned(numbers::<u32>(record)?.into_iter().map(u64::from).collect()))
}

fn int64(record: &Record) -> Result<Value, Mp4Error> {
    Ok(Value::Signed(numbers::<i64>(record)?))
}

fn uint64(record: &Record) -> Result<Value, Mp4Error> {
    Ok(Value::Unsigned(numbers::<u64>(record)?))
}

fn float32(record: &Record) -> Result<Value, Mp4Error> {
    Ok(Value::Float(numbers::<f32>(record)?.into_iter().map(f64::from).collect()))
}

fn float64(record: &Record) -> Result<Value, Mp4Error> {
    Ok(Value::Float(numbers::<f64>(record)?))
}

/// Q15.16 fixed point.
fn fixed32(record: &Record) -> Result<Value, Mp4Error> {
    Ok(Value::Float(numbers::<i32>(record)?.into_iter().map(|n| n as f64 / 65536.0).collect()))
}

/// Q31.32 fixed point.
fn fixed64(record: &Record) -> Result<Value, Mp4Error> {
    Ok(Value::Float(numbers::<i64>(record)?.into_iter().map(|n| n as f64 / 4294967296.0).collect()))
}

fn text(record: &Record) -> Result<Value, Mp4Error> {
    Ok(Value::Text(iso8859_1(record.data(), true)))
}

fn fourcc(record: &Record) -> Result<Value, Mp4Error> {
    Ok(Value::FourCC(record.data().chunks_exact(4).map(|c| iso8859_1(c, false)).collect()))
}

fn utc_time(record: &Record) -> Result<Value, Mp4Error> {
    Ok(Value::DateTime(parse_gps_time(record.data())?))
}

/// Reads as many big endian values of type `T` as fit in the data load.
fn numbers<T>(record: &Record) -> Result<Vec<T>, Mp4Error>
where
    T: BinRead,
    for<'a> T::Args<'a>: Default,
{
    let count = record.data().len() / std::mem::size_of::<T>();
    let mut cursor = Cursor::new(record.data());
    (0 .. count)
        .map(|_| cursor.read_be::<T>().map_err(Mp4Error::from))
        .collect()
}

/// Parses GPS UTC time, `yymmddhhmmss.sss`,
/// e.g. `210615100000.000`. Year is relative to 2000.
///
/// Trailing null bytes are ignored.
pub fn parse_gps_time(bytes: &[u8]) -> Result<OffsetDateTime, Mp4Error> {
    let text = iso8859_1(bytes, true);
    let text = text.trim();
    let invalid = || Mp4Error::InvalidGpsTime(text.to_owned());

    let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));
    if whole.len() != 12
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid())
    }

    let num = |start: usize| whole[start .. start + 2].parse::<u8>().map_err(|_| invalid());

    let month = Month::try_from(num(2)?).map_err(|_| invalid())?;
    let date = Date::from_calendar_date(2000 + num(0)? as i32, month, num(4)?)
        .map_err(|_| invalid())?;

    // Fraction as nanoseconds, at most 9 digits
    let nanos = fraction.bytes()
        .chain(std::iter::repeat(b'0'))
        .take(9)
        .fold(0_u32, |n, b| n * 10 + (b - b'0') as u32);
    let time = Time::from_hms_nano(num(6)?, num(8)?, num(10)?, nanos)
        .map_err(|_| invalid())?;

    Ok(PrimitiveDateTime::new(date, time).assume_utc())
}
