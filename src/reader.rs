use std::io::{Read, Seek, SeekFrom};

use binrw::{BinRead, BinReaderExt, Endian};

use crate::{AtomHeader, FourCC, Mp4Error};

/// Reader over an MP4 byte stream,
/// e.g. `BufReader<File>` or an in-memory `Cursor<Vec<u8>>`,
/// with bounds checked reads.
#[derive(Debug)]
pub struct Mp4Reader<R: Read + Seek> {
    /// Stream size in bytes.
    pub(crate) len: u64,
    /// Reader over the full MP4 stream.
    pub(crate) inner: R,
}

impl <R: Read + Seek> Mp4Reader<R> {
    /// Creates a new reader. Determines stream size
    /// by seeking to end, then resets position to start.
    pub fn new(mut inner: R) -> Result<Self, Mp4Error> {
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self {
            len,
            inner
        })
    }

    /// Returns size in bytes for stream.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Returns current position.
    pub fn pos(&mut self) -> Result<u64, Mp4Error> {
        Ok(self.inner.stream_position()?)
    }

    /// Seeks to absolute position `pos`.
    pub fn seek_to(&mut self, pos: u64) -> Result<u64, Mp4Error> {
        Ok(self.inner.seek(SeekFrom::Start(pos))?)
    }

    /// Resets position to start of stream.
    #[inline]
    pub fn reset(&mut self) -> Result<u64, Mp4Error> {
        self.seek_to(0)
    }

    /// Returns an error if reading `len` bytes
    /// at `offset` would exceed stream size.
    pub(crate) fn check_range(&self, offset: u64, len: u64) -> Result<(), Mp4Error> {
        match offset.checked_add(len) {
            Some(end) if end <= self.len => Ok(()),
            _ => Err(Mp4Error::OffsetOutOfRange { offset, len, max: self.len })
        }
    }

    /// Reads `len` bytes at current position.
    pub fn read_bytes(&mut self, len: u64) -> Result<Vec<u8>, Mp4Error> {
        let pos = self.pos()?;
        self.check_range(pos, len)?;
        let mut buf = vec![0_u8; usize::try_from(len)?];
        self.inner.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Reads `len` bytes at absolute position `offset`.
    ///
    /// Fails with `Mp4Error::OffsetOutOfRange` if
    /// the read would exceed stream size. Nothing is read in that case.
    pub fn read_at(&mut self, offset: u64, len: u64) -> Result<Vec<u8>, Mp4Error> {
        self.check_range(offset, len)?;
        self.seek_to(offset)?;
        self.read_bytes(len)
    }

    /// Read big endian type `T` at current position.
    pub(crate) fn read_be<T>(&mut self) -> Result<T, Mp4Error>
    where
        T: BinRead,
        <T as BinRead>::Args<'static>: Sized + Clone + Default,
    {
        Ok(self.inner.read_type::<T>(Endian::Big)?)
    }

    /// Reads FourCC at current position.
    pub(crate) fn fourcc(&mut self) -> Result<FourCC, Mp4Error> {
        Ok(FourCC::from_slice(&self.read_be::<[u8; 4]>()?))
    }

    /// Returns MP4 header at current position.
    ///
    /// Does not verify that current position
    /// is at atom boundary.
    ///
    /// `end` is the absolute end of the enclosing atom
    /// (or stream size for top-level atoms), used
    /// for atoms with size 0, which extend to the end
    /// of their parent.
    pub(crate) fn header(&mut self, end: u64) -> Result<AtomHeader, Mp4Error> {
        let mut hdr = AtomHeader::default();

        // Get offset for header
        hdr.offset = self.pos()?;
        self.check_range(hdr.offset, 8)?;

        // Read 32bit total atom size
        hdr.atom_size = self.read_be::<u32>()? as u64;

        // Can not read fourcc name as utf-8 since some
        // manufacturers use single-byte extended ascii/ISO8859-1
        hdr.name = self.fourcc()?;

        // Check if atom size is 64bit and read the 8 bytes
        // following directly after FourCC as new size if so
        if hdr.atom_size == 1 {
            self.check_range(hdr.offset + 8, 8)?;
            hdr.atom_size = self.read_be::<u64>()?;
            // some cameras exclusively use 64bit size, even for sub-64bit sized atoms
            hdr.size_64bit = true;
        }

        if hdr.atom_size == 0 {
            hdr.atom_size = end.saturating_sub(hdr.offset);
        }

        if hdr.atom_size < hdr.header_size() as u64 || hdr.end() > end {
            return Err(Mp4Error::UnexpectedAtomSize {
                len: hdr.atom_size,
                offset: hdr.offset,
            });
        }

        Ok(hdr)
    }
}
