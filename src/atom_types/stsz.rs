//! Sample size atom (`stsz`).
//!
//! Location: `moov/trak[multiple]/mdia/minf/stbl/stsz`
//!
//! Note that `stsz` lists sample size not chunk size.
//! `stco` or `co64` list chunk offsets, not offsets to individual samples.
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/sample_size_atom>

use binrw::BinRead;

/// Sample size atom (`stsz`).
///
/// Location: `moov/trak[multiple]/mdia/minf/stbl/stsz`
///
/// See: <https://developer.apple.com/documentation/quicktime-file-format/sample_size_atom>
#[derive(Debug, Clone, BinRead)]
#[br(big)]
pub struct Stsz {
    _version: u8,
    _flags: [u8; 3],
    /// Sample size.
    /// If 0 `no_of_entries` contains
    /// the number of u32 values that should be read,
    /// else all sample sizes have this value.
    pub(crate) sample_size: u32,
    pub(crate) no_of_entries: u32,
    /// Empty if all samples have the same size.
    #[br(if(sample_size == 0), count = no_of_entries)]
    pub(crate) sizes: Vec<u32>
}

impl Stsz {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.no_of_entries as usize
    }

    pub fn sample_size(&self) -> u32 {
        self.sample_size
    }

    /// Sample sizes in bytes. A constant sample size
    /// is repeated for each sample, not stored.
    pub fn sizes(&self) -> impl Iterator<Item = u32> + '_ {
        let constant = match self.sample_size {
            0 => 0,
            _ => self.len(),
        };
        self.sizes.iter()
            .copied()
            .chain(std::iter::repeat(self.sample_size).take(constant))
    }
}
