//! MP4 atom tree: headers, decoded atoms, and named fields.

mod atom;
mod atom_header;
mod field;

pub use atom::{Atom, AtomTree};
pub use atom_header::AtomHeader;
pub use field::{BoxNode, Field, FieldSpan, FieldValue};
