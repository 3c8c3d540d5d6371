//! Core MP4 struct and methods.
//!
//! ```rs
//! use mp4timefix::Mp4;
//! use std::path::Path;
//!
//! fn main() -> Result<(), mp4timefix::Mp4Error> {
//!     let mut mp4 = Mp4::new(Path::new("GOPRO.MP4"))?;
//!
//!     // Decode atom tree and print all creation times
//!     let tree = mp4.atoms()?;
//!     for field in mp4timefix::patch::locate(tree.atoms(), "creation_date") {
//!         println!("{:?}", field.value())
//!     }
//!
//!     // Raw GPMF samples for GoPro telemetry track
//!     let track = mp4.telemetry("GoPro MET")?;
//!     for payload in mp4.payloads(track.offsets()) {
//!         println!("{}", payload?.data.len())
//!     }
//!
//!     Ok(())
//! }
//! ```

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use crate::{
    atom::AtomTree,
    errors::Mp4Error,
    payload::{extract_payload, Payloads},
    track::TelemetryTrack,
    Mp4Reader,
    Offsets,
};

/// Mp4 file.
#[derive(Debug)]
pub struct Mp4 {
    /// Path to MP4 file.
    pub(crate) path: PathBuf,
    /// Reader over the MP4 file.
    pub(crate) reader: Mp4Reader<BufReader<File>>,
}

impl Mp4 {
    /// New Mp4 from path.
    pub fn new(path: &Path) -> Result<Self, Mp4Error> {
        let file = File::open(path)?;
        Ok(Self {
            path: path.to_owned(),
            reader: Mp4Reader::new(BufReader::new(file))?,
        })
    }

    /// Returns MP4 file size in bytes.
    pub fn len(&self) -> u64 {
        self.reader.len()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads `len` number of bytes
    /// at specified position/byte offset `pos` from start of MP4.
    pub fn read_at(&mut self, pos: u64, len: u64) -> Result<Vec<u8>, Mp4Error> {
        self.reader.read_at(pos, len)
    }

    /// Decodes the full atom tree.
    pub fn atoms(&mut self) -> Result<AtomTree, Mp4Error> {
        AtomTree::read(&mut self.reader)
    }

    /// Locates telemetry track, e.g. `GoPro MET` for
    /// GoPro GPMF data.
    pub fn telemetry(&mut self, handler_name: &str) -> Result<TelemetryTrack, Mp4Error> {
        let tree = self.atoms()?;
        TelemetryTrack::locate(&tree, handler_name)
    }

    /// Concatenated sample data for specified offsets.
    pub fn payload(&mut self, offsets: &Offsets) -> Result<Vec<u8>, Mp4Error> {
        extract_payload(&mut self.reader, &offsets.sizes(), &offsets.positions())
    }

    /// Iterate over sample data for specified offsets,
    /// one sample at a time.
    pub fn payloads<'a>(&'a mut self, offsets: &'a Offsets) -> Payloads<'a, BufReader<File>> {
        Payloads::new(&mut self.reader, offsets)
    }
}
