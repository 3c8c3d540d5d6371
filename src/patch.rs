//! Locates named fields in a box tree and writes a patched
//! copy of the source file, overwriting fixed-width fields in place.
//!
//! The source is never modified. Output is written to a
//! temporary file next to the destination, which is
//! renamed once complete.

use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, trace};

use crate::{
    atom::{BoxNode, Field, FieldSpan, FieldValue},
    Mp4Error,
};

/// All fields with specified name in `nodes` and their
/// descendants, in pre-order (parents before children,
/// siblings in file order).
pub fn locate<'a, N: BoxNode>(nodes: &'a [N], name: &str) -> Vec<&'a Field> {
    let mut fields = Vec::new();
    for node in nodes {
        collect(node, name, &mut fields);
    }
    fields
}

fn collect<'a, N: BoxNode>(node: &'a N, name: &str, fields: &mut Vec<&'a Field>) {
    if let Some(field) = node.field(name) {
        fields.push(field);
    }
    for child in node.children() {
        collect(child, name, fields);
    }
}

/// Replacement bytes for a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Absolute byte offset in source.
    pub offset: u64,
    pub bytes: Vec<u8>,
}

impl Patch {
    /// Encodes `value` for the field at `span`.
    ///
    /// Fails with `Mp4Error::PatchWidthMismatch` unless the
    /// encoded value is exactly as wide as the field.
    pub fn new(span: &FieldSpan, value: &FieldValue) -> Result<Self, Mp4Error> {
        let bytes = value.encode(span.width)?;
        if bytes.len() != span.width as usize {
            return Err(Mp4Error::PatchWidthMismatch {
                offset: span.offset,
                expected: span.width as usize,
                got: bytes.len()
            })
        }
        Ok(Self { offset: span.offset, bytes })
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn end(&self) -> u64 {
        self.offset + self.len()
    }
}

/// `true` if the field's current value does not already
/// encode to the patch bytes.
pub fn needs_patch(field: &Field, patch: &Patch) -> Result<bool, Mp4Error> {
    let width = u8::try_from(patch.bytes.len())?;
    Ok(field.value().encode(width)? != patch.bytes)
}

/// Non-overlapping patches, sorted on offset.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PatchSet(Vec<Patch>);

impl PatchSet {
    /// Sorts patches on offset.
    /// Fails with `Mp4Error::OverlappingPatch` if any two patches
    /// cover the same bytes.
    pub fn new(mut patches: Vec<Patch>) -> Result<Self, Mp4Error> {
        patches.sort_by_key(|p| p.offset);
        for pair in patches.windows(2) {
            if pair[1].offset < pair[0].end() {
                return Err(Mp4Error::OverlappingPatch {
                    offset: pair[1].offset,
                    previous_end: pair[0].end()
                })
            }
        }
        Ok(Self(patches))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Patch> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Stages a patch setting each field to `replacement`.
/// Fields that already hold the replacement value are skipped.
///
/// Fails with `Mp4Error::NotPatchable` for fields without a byte span,
/// `Mp4Error::FieldKindMismatch` if the field holds another kind of value
/// (e.g. an integer for a datetime replacement),
/// or `Mp4Error::PatchWidthMismatch` if the replacement does not fit.
/// No patches are staged on failure.
pub fn stage(fields: &[&Field], replacement: &FieldValue) -> Result<PatchSet, Mp4Error> {
    let mut patches = Vec::new();
    for field in fields {
        let span = field.span()
            .ok_or_else(|| Mp4Error::NotPatchable(field.name().to_owned()))?;
        if !field.value().same_kind(replacement) {
            return Err(Mp4Error::FieldKindMismatch {
                name: field.name().to_owned(),
                offset: span.offset
            })
        }
        let patch = Patch::new(span, replacement)?;
        if needs_patch(field, &patch)? {
            trace!("Staged {} @ {}: {:?} -> {:?}", field.name(), span.offset, field.value(), replacement);
            patches.push(patch);
        } else {
            trace!("Skipped {} @ {}, already set", field.name(), span.offset);
        }
    }
    PatchSet::new(patches)
}

/// Copies `src` to `dst`, writing patch bytes
/// in place of the source bytes they cover.
/// Returns number of bytes written.
///
/// Fails with `Mp4Error::OffsetOutOfRange` before writing anything
/// if a patch extends past the end of `src`.
pub fn commit<R, W>(src: &mut R, dst: &mut W, patches: &PatchSet) -> Result<u64, Mp4Error>
where
    R: Read + Seek,
    W: Write,
{
    let len = src.seek(SeekFrom::End(0))?;
    src.seek(SeekFrom::Start(0))?;

    if let Some(patch) = patches.iter().find(|p| p.end() > len) {
        return Err(Mp4Error::OffsetOutOfRange {
            offset: patch.offset,
            len: patch.len(),
            max: len
        })
    }

    let mut pos = 0;
    for patch in patches.iter() {
        copy_exact(src, dst, patch.offset - pos)?;
        copy_exact(src, &mut io::sink(), patch.len())?;
        dst.write_all(&patch.bytes)?;
        pos = patch.end();
    }
    copy_exact(src, dst, len - pos)?;

    Ok(len)
}

/// Copies exactly `len` bytes.
fn copy_exact<R: Read, W: Write>(src: &mut R, dst: &mut W, len: u64) -> Result<(), Mp4Error> {
    let copied = io::copy(&mut src.take(len), dst)?;
    if copied != len {
        return Err(Mp4Error::IOError(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("Copied {copied} of {len} bytes")
        )))
    }
    Ok(())
}

/// Temporary path for `path`, i.e. `<path>.part`.
pub fn part_path(path: &Path) -> PathBuf {
    let mut part = path.as_os_str().to_owned();
    part.push(".part");
    PathBuf::from(part)
}

/// Writes a patched copy of `input` to `output`.
///
/// Writes to `<output>.part` first, then renames it to `output`.
/// On failure the temporary file is removed and `output`
/// is left as it was.
pub fn commit_file(input: &Path, output: &Path, patches: &PatchSet) -> Result<u64, Mp4Error> {
    let part = part_path(output);
    match write_patched(input, &part, patches) {
        Ok(len) => {
            fs::rename(&part, output)?;
            debug!("Wrote {len} bytes to {}", output.display());
            Ok(len)
        },
        Err(err) => {
            let _ = fs::remove_file(&part);
            Err(err)
        }
    }
}

fn write_patched(input: &Path, part: &Path, patches: &PatchSet) -> Result<u64, Mp4Error> {
    let mut src = BufReader::new(File::open(input)?);
    let mut dst = BufWriter::new(File::create(part)?);
    let len = commit(&mut src, &mut dst, patches)?;
    let file = dst.into_inner().map_err(|err| err.into_error())?;
    file.sync_all()?;
    Ok(len)
}
