//! Extracts interleaved telemetry payloads from the MP4 `mdat` atom,
//! via sample sizes and offsets.

use std::io::{Read, Seek};

use crate::{Mp4Error, Mp4Reader, Offsets};

/// Raw telemetry sample, e.g. a single GPMF
/// payload (usually spanning one second for GoPro).
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    /// Raw sample bytes.
    pub data: Vec<u8>,
    /// Start of sample in milliseconds,
    /// relative to start of telemetry track.
    pub start_ms: u64,
}

/// Reads `sizes[i]` bytes at `offsets[i]` for each
/// sample size, and concatenates these in order into
/// a single payload.
///
/// Assumes one sample per chunk, i.e. a single interleaved
/// stream such as GoPro telemetry.
///
/// Fails with `Mp4Error::OffsetOutOfRange` if any read would exceed
/// stream size, or if there is no offset for a sample size.
/// No partial payload is returned.
pub fn extract_payload<R: Read + Seek>(
    reader: &mut Mp4Reader<R>,
    sizes: &[u32],
    offsets: &[u64],
) -> Result<Vec<u8>, Mp4Error> {
    // Check all ranges before reading anything
    for (i, size) in sizes.iter().enumerate() {
        let offset = offsets.get(i)
            .ok_or_else(|| Mp4Error::OffsetOutOfRange {
                offset: reader.len(),
                len: *size as u64,
                max: reader.len()
            })?;
        reader.check_range(*offset, *size as u64)?;
    }

    let mut payload: Vec<u8> = Vec::with_capacity(sizes.iter().map(|s| *s as usize).sum());
    for (size, offset) in sizes.iter().zip(offsets.iter()) {
        payload.extend(reader.read_at(*offset, *size as u64)?);
    }

    Ok(payload)
}

/// Iterator over the samples for a track,
/// reading one sample at a time.
pub struct Payloads<'a, R: Read + Seek> {
    reader: &'a mut Mp4Reader<R>,
    offsets: &'a Offsets,
    index: usize,
}

impl <'a, R: Read + Seek> Payloads<'a, R> {
    pub fn new(reader: &'a mut Mp4Reader<R>, offsets: &'a Offsets) -> Self {
        Self {
            reader,
            offsets,
            index: 0
        }
    }
}

impl <'a, R: Read + Seek> Iterator for Payloads<'a, R> {
    type Item = Result<Payload, Mp4Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let offset = self.offsets.get(self.index)?;
        self.index += 1;
        let payload = self.reader.read_at(offset.position, offset.size as u64)
            .map(|data| Payload {
                data,
                start_ms: offset.start_ms
            });
        Some(payload)
    }
}
