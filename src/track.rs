//! Interleaved telemetry track, e.g. GoPro GPMF,
//! with sample offsets for locating the raw telemetry in `mdat`.
//!
//! A GoPro telemetry track has handler sub type `meta`,
//! handler name `GoPro MET`, and a `gpmd` atom in
//! `moov/trak/mdia/minf/gmhd`.

use crate::{
    atom::{Atom, AtomTree, BoxNode},
    atom_types::AtomType,
    Co64,
    FourCC,
    Mp4Error,
    Offsets,
};

/// Telemetry track attributes and sample offsets.
#[derive(Debug, Clone)]
pub struct TelemetryTrack {
    /// Track ID from `tkhd`.
    pub(crate) id: u32,
    /// Handler name from `hdlr`.
    pub(crate) name: String,
    /// Time units per second from `mdhd`.
    pub(crate) time_scale: u32,
    /// Sample offsets.
    pub(crate) offsets: Offsets,
}

impl TelemetryTrack {
    /// Returns the first track with handler sub type `meta`
    /// that either contains a `gpmd` sample description,
    /// or has the specified handler name.
    pub fn locate(tree: &AtomTree, handler_name: &str) -> Result<Self, Mp4Error> {
        tree.tracks()?
            .into_iter()
            .find(|trak| is_telemetry(trak, handler_name))
            .ok_or_else(|| Mp4Error::MissingHandler(handler_name.to_owned()))
            .and_then(Self::from_trak)
    }

    /// Compiles track attributes and offsets
    /// from a `trak` atom.
    pub(crate) fn from_trak(trak: &Atom) -> Result<Self, Mp4Error> {
        let id = match trak.child(&FourCC::Tkhd).map(|a| a.data()) {
            Some(AtomType::Tkhd(tkhd)) => tkhd.track_id(),
            _ => return Err(Mp4Error::NoSuchAtom("tkhd".to_owned()))
        };

        let name = match trak.find_path(&["mdia", "hdlr"]).map(|a| a.data()) {
            Some(AtomType::Hdlr(hdlr)) => hdlr.component_name().to_owned(),
            _ => return Err(Mp4Error::NoSuchAtom("hdlr".to_owned()))
        };

        let time_scale = match trak.find_path(&["mdia", "mdhd"]).map(|a| a.data()) {
            Some(AtomType::Mdhd(mdhd)) => mdhd.time_scale(),
            _ => return Err(Mp4Error::NoSuchAtom("mdhd".to_owned()))
        };

        let stbl = trak.find_path(&["mdia", "minf", "stbl"])
            .ok_or_else(|| Mp4Error::NoSuchAtom("stbl".to_owned()))?;

        let stsz = match stbl.child(&FourCC::Stsz).map(|a| a.data()) {
            Some(AtomType::Stsz(stsz)) => stsz,
            _ => return Err(Mp4Error::NoSuchAtom("stsz".to_owned()))
        };

        let stts = match stbl.child(&FourCC::Stts).map(|a| a.data()) {
            Some(AtomType::Stts(stts)) => stts,
            _ => return Err(Mp4Error::NoSuchAtom("stts".to_owned()))
        };

        // Only one of stco or co64 exists in a single track,
        // always output 64 bit offsets.
        let co64 = match (stbl.child(&FourCC::Co64), stbl.child(&FourCC::Stco)) {
            (Some(Atom{data: AtomType::Co64(co64), ..}), _) => co64.to_owned(),
            (_, Some(Atom{data: AtomType::Stco(stco), ..})) => Co64::from(stco),
            _ => return Err(Mp4Error::NoSuchAtom("stco".to_owned()))
        };

        let offsets = Offsets::new(stsz, &co64, stts, time_scale)?;

        Ok(Self {
            id,
            name,
            time_scale,
            offsets,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn time_scale(&self) -> u32 {
        self.time_scale
    }

    pub fn offsets(&self) -> &Offsets {
        &self.offsets
    }

    /// Number of samples in track.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }
}

/// Returns `true` if `trak` is an interleaved telemetry track.
pub fn is_telemetry(trak: &Atom, handler_name: &str) -> bool {
    let Some(AtomType::Hdlr(hdlr)) = trak.find_path(&["mdia", "hdlr"]).map(|a| a.data()) else {
        return false
    };
    if hdlr.component_sub_type() != "meta" {
        return false
    }
    trak.find_path(&["mdia", "minf", "gmhd", "gpmd"]).is_some()
        || hdlr.component_name() == handler_name
}
