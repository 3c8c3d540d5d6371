//! MP4 atom and atom tree.

use std::io::{Read, Seek};

use tracing::{trace, warn};

use crate::{atom_types::AtomType, errors::Mp4Error, fourcc::FourCC, reader::Mp4Reader};

use super::{AtomHeader, BoxNode, Field};

/// MP4 atom with decoded data load
/// (for supported atom types) and child atoms
/// (for container atoms).
#[derive(Debug, Clone)]
pub struct Atom {
    /// Header
    pub(crate) header: AtomHeader,
    /// Decoded data load.
    pub(crate) data: AtomType,
    /// Named fields, derived from data load.
    pub(crate) fields: Vec<Field>,
    /// Child atoms if container.
    pub(crate) children: Vec<Atom>,
}

impl BoxNode for Atom {
    fn fourcc(&self) -> &FourCC {
        &self.header.name
    }

    fn children(&self) -> &[Self] {
        &self.children
    }

    fn fields(&self) -> &[Field] {
        &self.fields
    }
}

impl Atom {
    /// Reads atom with specified header. Recurses into
    /// container atoms, decodes data load for supported atom types,
    /// and skips the data load for all others (e.g. `mdat`).
    pub(crate) fn read<R: Read + Seek>(
        reader: &mut Mp4Reader<R>,
        header: AtomHeader,
    ) -> Result<Self, Mp4Error> {
        trace!("{} @{} size: {}", header.name, header.offset, header.atom_size);

        let (data, children) = if header.is_container() {
            let children = read_atoms(reader, header.data_offset(), header.end(), false)?;
            (AtomType::Container, children)
        } else if AtomType::is_decoded(header.name()) {
            let bytes = reader.read_at(header.data_offset(), header.data_size())?;
            (AtomType::decode(&header, bytes)?, Vec::new())
        } else {
            (AtomType::Other, Vec::new())
        };

        let fields = data.fields(&header);

        Ok(Self {
            header,
            data,
            fields,
            children,
        })
    }

    pub fn header(&self) -> &AtomHeader {
        &self.header
    }

    pub fn name(&self) -> &FourCC {
        &self.header.name
    }

    /// Decoded data load.
    pub fn data(&self) -> &AtomType {
        &self.data
    }

    /// Total size of the atom in bytes.
    pub fn size(&self) -> u64 {
        self.header.atom_size
    }

    /// The absolute byte offset to the atom's start in MP4 file.
    pub fn start(&self) -> u64 {
        self.header.start()
    }

    /// The absolute byte offset to the atom's end in MP4 file.
    pub fn end(&self) -> u64 {
        self.header.end()
    }

    /// All direct children with specified FourCC,
    /// e.g. all `trak` atoms in `moov`.
    pub fn children_named<'a>(&'a self, fourcc: &'a FourCC) -> impl Iterator<Item = &'a Atom> + 'a {
        self.children.iter()
            .filter(move |a| a.name() == fourcc)
    }
}

/// Reads consecutive atoms within absolute range `start .. end`.
///
/// If `strict` is `false`, a malformed header ends the
/// sequence with a warning instead of failing. Some vendors
/// pad e.g. `udta` with data that is not atoms.
fn read_atoms<R: Read + Seek>(
    reader: &mut Mp4Reader<R>,
    start: u64,
    end: u64,
    strict: bool,
) -> Result<Vec<Atom>, Mp4Error> {
    let mut atoms: Vec<Atom> = Vec::new();
    let mut pos = start;

    while pos < end {
        reader.seek_to(pos)?;
        let header = match reader.header(end) {
            Ok(hdr) => hdr,
            Err(err) if !strict => {
                warn!("Ignoring {} trailing bytes @ offset {pos}: {err}", end - pos);
                break
            },
            Err(err) => return Err(err)
        };
        pos = header.end();
        atoms.push(Atom::read(reader, header)?);
    }

    Ok(atoms)
}

/// MP4 atom tree. Top level atoms
/// in file order, e.g. `ftyp`, `mdat`, `moov`.
#[derive(Debug, Clone)]
pub struct AtomTree {
    /// Size of MP4 in bytes.
    pub(crate) len: u64,
    pub(crate) atoms: Vec<Atom>,
}

impl AtomTree {
    /// Reads the full atom tree from start of stream.
    pub fn read<R: Read + Seek>(reader: &mut Mp4Reader<R>) -> Result<Self, Mp4Error> {
        let len = reader.len();
        let atoms = read_atoms(reader, 0, len, true)?;
        reader.reset()?;
        Ok(Self { len, atoms })
    }

    /// Size in bytes of the MP4 the tree was read from.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Top level atoms.
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// First top level atom with specified FourCC.
    pub fn find(&self, fourcc: &FourCC) -> Option<&Atom> {
        self.atoms.iter().find(|a| a.name() == fourcc)
    }

    /// Movie atom (`moov`).
    pub fn moov(&self) -> Result<&Atom, Mp4Error> {
        self.find(&FourCC::Moov)
            .ok_or_else(|| Mp4Error::NoSuchAtom(FourCC::Moov.to_string()))
    }

    /// Track atoms (`moov/trak`).
    pub fn tracks(&self) -> Result<Vec<&Atom>, Mp4Error> {
        Ok(self.moov()?.children_named(&FourCC::Trak).collect())
    }
}
