//! Time-to-sample atom (`stts`).
//!
//! Location: `moov/trak[multiple]/mdia/minf/stbl/stts`
//!
//! See <https://developer.apple.com/documentation/quicktime-file-format/time-to-sample_atom>

use binrw::BinRead;

#[derive(Debug, Clone, BinRead)]
#[br(big)]
pub struct TimeToSample {
    pub(crate) sample_count: u32,
    pub(crate) sample_duration: u32,
}

impl TimeToSample {
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn sample_duration(&self) -> u32 {
        self.sample_duration
    }
}

/// Time to sample atom (`stts`).
///
/// Path: `moov/trak[multiple]/mdia/minf/stbl/stts`
///
/// See <https://developer.apple.com/documentation/quicktime-file-format/time-to-sample_atom>
#[derive(Debug, Clone, BinRead)]
#[br(big)]
pub struct Stts {
    _version: u8,
    _flags: [u8; 3],
    pub(crate) no_of_entries: u32,
    #[br(count = no_of_entries)]
    pub(crate) table: Vec<TimeToSample>
}

impl Stts {
    /// Returns total number of samples.
    ///
    /// If an entry lists a duration for four samples,
    /// it counts as four entries towards the total.
    pub fn len(&self) -> usize {
        self.table.iter()
            .map(|t| t.sample_count as usize)
            .sum()
    }

    /// Returns the time to sample table as tuples,
    /// `(SAMPLE_COUNT, SAMPLE_DURATION)`.
    pub fn table(&self) -> Vec<(u32, u32)> {
        self.table.iter()
            .map(|t| (t.sample_count, t.sample_duration))
            .collect()
    }

    /// Unscaled duration for each sample,
    /// for at most `limit` samples.
    pub fn durations(&self, limit: usize) -> Vec<u32> {
        self.table.iter()
            .flat_map(|t| std::iter::repeat(t.sample_duration).take(t.sample_count as usize))
            .take(limit)
            .collect()
    }
}
