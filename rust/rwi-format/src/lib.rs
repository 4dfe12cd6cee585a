//! Fixed-width record format shared by the posting layer.
//!
//! A record is a byte buffer of exactly [`Schema::object_size`](schema::Schema::object_size)
//! bytes, laid out as the schema's columns in order. Column 0 is the primary key.
//! Numeric columns are big-endian base-256, so raw records compare in key order as
//! unsigned byte strings.

pub mod cardinal;
pub mod column;
pub mod flags;
pub mod key;
pub mod micro_date;
pub mod property_form;
pub mod record;
pub mod schema;

pub use column::{CellKind, Column, Encoder};
pub use flags::Flags;
pub use key::HashKey;
pub use record::{RecordMut, RecordRef};
pub use schema::Schema;
