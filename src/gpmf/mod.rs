//! GoPro Metadata Format (GPMF).
//!
//! GPMF is a FourCC-keyed, tag-length-value format,
//! interleaved as samples in the MP4 `mdat` atom. Each record has an 8 byte header,
//! followed by the data load, padded to 4 byte alignment:
//!
//! ```ignore
//! | [K K K K] [T] [S] [R R] | data ... | padding |
//!    |         |   |   |
//!    |         |   |   repeat (u16 BE), number of elements
//!    |         |   element size in bytes
//!    |         type, 0 = nested records
//!    FourCC key, e.g. DEVC, STRM, GPSU
//! ```
//!
//! See: <https://github.com/gopro/gpmf-parser>

mod record;
mod timing;
mod value;
mod walk;

pub use record::{Element, Record, RecordHeader, Records};
pub use timing::{capture_start, correlate, gps_time, is_fix_status, is_gps_time, sanity_check, Fix, FixScanner};
pub use value::{interpreter, parse_gps_time, Interpreter, Value};
pub use walk::{walk, Node, Walker};
