//! MP4 byte offset (extracted from `stco`/`co64` atom), size in bytes (extracted from `stsz` atom),
//! and timing (extracted from `stts` atom) in milliseconds
//! for samples of interleaved data, e.g. GoPro GPMF telemetry.

use crate::{Co64, Mp4Error, Stsz, Stts};

/// Sample offsets for a track.
///
/// Assumes one sample per chunk, which is the case for
/// GoPro telemetry. The general sample-to-chunk mapping
/// (`stsc`) is not supported.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Offsets(pub(crate) Vec<Offset>);

impl Offsets {
    /// Merge sample sizes (`stsz`), chunk offsets (`stco`/`co64`),
    /// and sample durations (`stts`) into sample offsets.
    ///
    /// The number of samples in `stsz` determines the number of
    /// offsets. Chunk offset and duration tables must list at least as many.
    /// Tables are only expanded once the chunk offset count is verified,
    /// since declared sample counts are not bounded by atom size.
    ///
    /// If `time_scale` is 0 (invalid), it is set to 1 to avoid division by 0.
    pub fn new(
        stsz: &Stsz,
        co64: &Co64,
        stts: &Stts,
        time_scale: u32,
    ) -> Result<Self, Mp4Error> {
        let samples = stsz.len();
        let positions = co64.offsets();

        if positions.len() < samples {
            return Err(Mp4Error::SampleTableMismatch {
                sizes: samples,
                other: positions.len(),
                table: "stco".to_owned()
            })
        }

        let durations = stts.durations(samples);
        if durations.len() < samples {
            return Err(Mp4Error::SampleTableMismatch {
                sizes: samples,
                other: durations.len(),
                table: "stts".to_owned()
            })
        }

        let sizes: Vec<u32> = stsz.sizes().collect();

        Ok(Self::from_tables(&sizes, positions, &durations, time_scale))
    }

    /// Creates offsets from raw tables, with
    /// unscaled durations in `time_scale` units.
    /// Iterates over the shortest table.
    pub fn from_tables(
        sizes: &[u32],
        positions: &[u64],
        durations: &[u32],
        time_scale: u32,
    ) -> Self {
        let time_scale = time_scale.max(1) as u64;
        let mut ticks = 0_u64;

        let offsets = sizes.iter()
            .zip(positions.iter())
            .zip(durations.iter())
            .map(|((size, position), duration)| {
                let offset = Offset {
                    position: *position,
                    size: *size,
                    start_ms: ticks.saturating_mul(1000) / time_scale,
                    duration_ms: *duration as u64 * 1000 / time_scale,
                };
                ticks = ticks.saturating_add(*duration as u64);
                offset
            })
            .collect();

        Self(offsets)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Offset> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&Offset> {
        self.0.first()
    }

    pub fn get(&self, index: usize) -> Option<&Offset> {
        self.0.get(index)
    }

    /// Sample sizes in bytes.
    pub fn sizes(&self) -> Vec<u32> {
        self.0.iter().map(|o| o.size).collect()
    }

    /// Absolute sample byte offsets.
    pub fn positions(&self) -> Vec<u64> {
        self.0.iter().map(|o| o.position).collect()
    }
}

/// MP4 byte offset (from `stco` atom), size in bytes (from `stsz` atom),
/// and timing (from `stts` atom) in milliseconds
/// for a sample of data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offset {
    /// Offset in bytes from start of file.
    pub position: u64,
    /// Size of sample in bytes.
    pub size: u32,
    /// Sample start in milliseconds,
    /// relative to start of track.
    pub start_ms: u64,
    /// Sample duration in milliseconds.
    pub duration_ms: u64,
}
