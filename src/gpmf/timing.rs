//! Correlates GPS time in GPMF telemetry with the
//! MP4 timeline, to derive when recording started.
//!
//! GPS time (`GPSU`) is only trusted after the
//! GPS has reported a fix (`GPSF` > 0).

use time::{Duration, OffsetDateTime};
use tracing::{debug, trace};

use crate::{
    consts::{GPSF, GPSU},
    payload::Payload,
    Mp4Error,
};

use super::{walk, Record, Value};

/// First trusted GPS time and the derived start
/// of recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fix {
    /// GPS time (`GPSU`).
    pub gps_time: OffsetDateTime,
    /// Start of the payload containing `gps_time`,
    /// relative to start of stream.
    pub stream_offset_ms: u64,
    /// `gps_time` minus `stream_offset_ms`.
    pub capture_start: OffsetDateTime,
}

impl Fix {
    pub fn new(gps_time: OffsetDateTime, stream_offset_ms: u64) -> Result<Self, Mp4Error> {
        Ok(Self {
            gps_time,
            stream_offset_ms,
            capture_start: capture_start(gps_time, stream_offset_ms)?,
        })
    }
}

/// Start of recording, given a GPS time and the
/// stream offset of its payload.
///
/// Fails with `Mp4Error::InvalidTimestamp` if the offset
/// is out of range for a datetime.
pub fn capture_start(gps_time: OffsetDateTime, stream_offset_ms: u64) -> Result<OffsetDateTime, Mp4Error> {
    let invalid = || Mp4Error::InvalidTimestamp(format!("{gps_time} - {stream_offset_ms}ms"));
    let offset = i64::try_from(stream_offset_ms).map_err(|_| invalid())?;
    gps_time.checked_sub(Duration::milliseconds(offset))
        .ok_or_else(invalid)
}

/// `true` if record is a GPS fix status (`GPSF`)
/// reporting a fix, i.e. a value above 0.
/// Unsupported value types count as no fix.
pub fn is_fix_status(record: &Record) -> Result<bool, Mp4Error> {
    if record.key() != GPSF {
        return Ok(false)
    }
    Ok(record.value_or_raw()?.first_f64().map(|v| v > 0.0).unwrap_or(false))
}

/// `true` if record is GPS time (`GPSU`).
pub fn is_gps_time(record: &Record) -> bool {
    record.key() == GPSU
}

/// GPS time if record is `GPSU`, `None` for other records.
pub fn gps_time(record: &Record) -> Result<Option<OffsetDateTime>, Mp4Error> {
    if !is_gps_time(record) {
        return Ok(None)
    }
    match record.value()? {
        Value::DateTime(dt) => Ok(Some(dt)),
        other => Err(Mp4Error::InvalidGpsTime(format!("{other:?}")))
    }
}

/// Scans records in stream order for the first GPS time
/// following a GPS fix.
///
/// The fix status carries over between payloads.
/// A later `GPSF` of 0 does not revoke an earlier fix.
#[derive(Debug, Default, Clone)]
pub struct FixScanner {
    fix_acquired: bool,
    fix: Option<Fix>,
}

impl FixScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once a `GPSF` > 0 has been seen.
    pub fn fix_acquired(&self) -> bool {
        self.fix_acquired
    }

    /// The first fix, if found.
    pub fn fix(&self) -> Option<Fix> {
        self.fix
    }

    /// Observes a single record, belonging to the payload
    /// starting at `payload_start_ms`.
    /// Returns the fix once found. Later records are ignored.
    pub fn observe(&mut self, record: &Record, payload_start_ms: u64) -> Result<Option<Fix>, Mp4Error> {
        if self.fix.is_some() {
            return Ok(self.fix)
        }
        if is_fix_status(record)? {
            trace!("GPS fix @ {payload_start_ms}ms");
            self.fix_acquired = true;
        } else if self.fix_acquired {
            if let Some(gps_time) = gps_time(record)? {
                self.fix = Some(Fix::new(gps_time, payload_start_ms)?);
            }
        }
        Ok(self.fix)
    }

    /// Walks all records in a single payload
    /// until a fix is found.
    pub fn scan(&mut self, payload: &Payload) -> Result<Option<Fix>, Mp4Error> {
        for node in walk(&payload.data) {
            if let Some(fix) = self.observe(&node?.record, payload.start_ms)? {
                return Ok(Some(fix))
            }
        }
        Ok(None)
    }
}

/// Scans payloads in stream order and returns the
/// first GPS time following a GPS fix.
///
/// Stops reading payloads once found.
/// Fails with `Mp4Error::NoGpsFixFound` if payloads run out first.
pub fn correlate<I>(payloads: I) -> Result<Fix, Mp4Error>
where
    I: IntoIterator<Item = Result<Payload, Mp4Error>>,
{
    let mut scanner = FixScanner::new();
    for payload in payloads {
        let payload = payload?;
        if let Some(fix) = scanner.scan(&payload)? {
            debug!("GPS time {} @ {}ms", fix.gps_time, fix.stream_offset_ms);
            return Ok(fix)
        }
    }
    Err(Mp4Error::NoGpsFixFound)
}

/// Fails with `Mp4Error::SanityCheckFailed` unless
/// the capture start falls within `expected_year`.
pub fn sanity_check(fix: &Fix, expected_year: i32) -> Result<(), Mp4Error> {
    let got = fix.capture_start.year();
    match got == expected_year {
        true => Ok(()),
        false => Err(Mp4Error::SanityCheckFailed { expected: expected_year, got })
    }
}
