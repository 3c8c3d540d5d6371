//! Sets MP4 creation times to the start of recording,
//! as derived from GPS time in GoPro GPMF telemetry.
//!
//! 1. Decode the atom tree and locate the telemetry track.
//! 2. Scan telemetry payloads for the first GPS time after a GPS fix.
//! 3. Subtract the payload's stream offset to get the start of recording.
//! 4. Optionally check the year.
//! 5. Re-decode the atom tree, stage patches for all matching fields.
//! 6. Write a patched copy, optionally replacing the input.
//!
//! Any failure leaves the input untouched.

use std::{
    fs,
    path::{Path, PathBuf},
};

use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};
use tracing::{debug, info};

use crate::{
    atom::FieldValue,
    consts::{CREATION_DATE, GOPRO_MET},
    gpmf::{correlate, sanity_check, Fix},
    patch::{commit_file, locate, stage, PatchSet},
    Mp4,
    Mp4Error,
};

/// Options for `fix_timestamp()`.
#[derive(Debug, Clone, PartialEq)]
pub struct FixOptions {
    /// Output path. Defaults to `<input>.new`.
    pub output: Option<PathBuf>,
    /// Replace input with output once written.
    pub overwrite: bool,
    /// Expected year for start of recording.
    pub sanity_year: Option<i32>,
    /// Field to set, defaults to `creation_date`.
    pub field: String,
    /// Telemetry track handler name, defaults to `GoPro MET`.
    pub handler_name: String,
    /// Write an unmodified copy to output
    /// even when no field needs changing.
    pub copy_unchanged: bool,
}

impl Default for FixOptions {
    fn default() -> Self {
        Self {
            output: None,
            overwrite: false,
            sanity_year: None,
            field: CREATION_DATE.to_owned(),
            handler_name: GOPRO_MET.to_owned(),
            copy_unchanged: false,
        }
    }
}

impl FixOptions {
    pub fn with_output(self, output: Option<&Path>) -> Self {
        Self { output: output.map(Path::to_owned), ..self }
    }

    pub fn with_overwrite(self, overwrite: bool) -> Self {
        Self { overwrite, ..self }
    }

    pub fn with_sanity_year(self, sanity_year: Option<i32>) -> Self {
        Self { sanity_year, ..self }
    }

    pub fn with_field(self, field: &str) -> Self {
        Self { field: field.to_owned(), ..self }
    }

    pub fn with_handler_name(self, handler_name: &str) -> Self {
        Self { handler_name: handler_name.to_owned(), ..self }
    }

    pub fn with_copy_unchanged(self, copy_unchanged: bool) -> Self {
        Self { copy_unchanged, ..self }
    }

    /// Output path for `input`.
    pub fn output_path(&self, input: &Path) -> PathBuf {
        match &self.output {
            Some(path) => path.to_owned(),
            None => {
                let mut path = input.as_os_str().to_owned();
                path.push(".new");
                PathBuf::from(path)
            }
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub enum FixOutcome {
    /// All fields already held the derived time.
    /// `copied_to` is set if an unmodified copy was written.
    Unchanged {
        fix: Fix,
        copied_to: Option<PathBuf>,
    },
    /// `patched` fields were set and the result written to `path`.
    Written {
        fix: Fix,
        patched: usize,
        path: PathBuf,
    },
}

impl FixOutcome {
    pub fn fix(&self) -> &Fix {
        match self {
            Self::Unchanged { fix, .. } | Self::Written { fix, .. } => fix
        }
    }
}

/// Start of recording as a naive UTC datetime,
/// truncated to whole seconds.
pub fn capture_start_utc(fix: &Fix) -> PrimitiveDateTime {
    let utc = fix.capture_start.to_offset(UtcOffset::UTC);
    let whole = utc - time::Duration::nanoseconds(utc.nanosecond() as i64);
    PrimitiveDateTime::new(whole.date(), whole.time())
}

/// Sets all fields named `options.field` in the atom tree
/// to the start of recording, derived from telemetry GPS time.
///
/// Patching is all-or-nothing: if any field can not be patched
/// nothing is written.
pub fn fix_timestamp(input: &Path, options: &FixOptions) -> Result<FixOutcome, Mp4Error> {
    info!("Processing {}", input.display());

    let mut mp4 = Mp4::new(input)?;

    let track = mp4.telemetry(&options.handler_name)?;
    debug!("Telemetry track {} '{}', {} samples", track.id(), track.name(), track.len());

    let fix = correlate(mp4.payloads(track.offsets()))?;
    info!("GPS time {} @ {}ms, recording started {}",
        fix.gps_time, fix.stream_offset_ms, fix.capture_start);

    if let Some(year) = options.sanity_year {
        sanity_check(&fix, year)?;
    }

    // Independent decode for locating fields
    let tree = mp4.atoms()?;
    drop(mp4);

    let fields = locate(tree.atoms(), &options.field);
    debug!("Found {} '{}' fields", fields.len(), options.field);

    let replacement = FieldValue::DateTime(capture_start_utc(&fix));
    let patches = stage(&fields, &replacement)?;

    let output = options.output_path(input);

    if patches.is_empty() {
        info!("Nothing was changed");
        let copied_to = match options.copy_unchanged {
            true => Some(write(input, &output, &patches, false)?),
            false => None,
        };
        return Ok(FixOutcome::Unchanged { fix, copied_to })
    }

    let patched = patches.len();
    let path = write(input, &output, &patches, options.overwrite)?;
    info!("Set {patched} '{}' fields to {replacement:?}", options.field);

    Ok(FixOutcome::Written { fix, patched, path })
}

/// Writes patched copy to `output`, then moves it over `input`
/// if `overwrite` is set. Returns the final path.
fn write(input: &Path, output: &Path, patches: &PatchSet, overwrite: bool) -> Result<PathBuf, Mp4Error> {
    commit_file(input, output, patches)?;
    if overwrite && output != input {
        fs::rename(output, input)?;
        debug!("Moved {} to {}", output.display(), input.display());
        return Ok(input.to_owned())
    }
    Ok(output.to_owned())
}

/// Prints one line for the outcome of `fix_timestamp()`,
/// to stderr on failure. Returns `true` on success.
pub fn report(input: &Path, result: &Result<FixOutcome, Mp4Error>) -> bool {
    match result {
        Ok(FixOutcome::Written { fix, patched, path }) => {
            println!("{}: set {patched} fields to {}, wrote {}",
                input.display(), rfc3339(&fix.capture_start), path.display());
            true
        },
        Ok(FixOutcome::Unchanged { .. }) => {
            println!("{}: Nothing was changed", input.display());
            true
        },
        Err(err) => {
            eprintln!("ERROR {}: {err}", input.display());
            false
        }
    }
}

/// Fixes a single file with default field and handler name.
/// Returns `true` on success, including when nothing needed changing.
pub fn fix_file(input: &Path, output: Option<&Path>, overwrite: bool, sanity_year: Option<i32>) -> bool {
    let options = FixOptions::default()
        .with_output(output)
        .with_overwrite(overwrite)
        .with_sanity_year(sanity_year);
    report(input, &fix_timestamp(input, &options))
}

/// RFC 3339 formatted datetime.
pub fn rfc3339(datetime: &OffsetDateTime) -> String {
    datetime.format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| datetime.to_string())
}
