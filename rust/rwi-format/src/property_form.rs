//! Human-readable `{nick=value,...}` rendering of a record.
//!
//! Integer cells are written in decimal, bit vectors as lowercase hex (byte order
//! as stored), and fixed strings as their raw text with trailing zero bytes removed.
//! Parsing accepts either `=` or `:` between nickname and value; columns that are
//! absent stay zero.

use std::fmt::Write;

use rwi_common::{Result, error::Error};

use crate::{
    column::CellKind,
    record::{RecordMut, RecordRef},
    schema::Schema,
};

pub fn to_property_form(record: &RecordRef<'_>) -> String {
    let schema = record.schema();
    let mut out = String::with_capacity(schema.object_size() * 3);
    out.push('{');
    for (i, column) in schema.columns().iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(column.nickname());
        out.push('=');
        let cell = record.bytes(i);
        match column.kind() {
            CellKind::FixedString => {
                let end = cell.iter().rposition(|&b| b != 0).map_or(0, |p| p + 1);
                out.push_str(&String::from_utf8_lossy(&cell[..end]));
            }
            CellKind::Bitfield => {
                for b in cell {
                    let _ = write!(out, "{b:02x}");
                }
            }
            CellKind::Cardinal | CellKind::Binary => match record.cardinal(i) {
                Ok(v) => {
                    let _ = write!(out, "{v}");
                }
                Err(_) => {
                    for b in cell {
                        let _ = write!(out, "{b:02x}");
                    }
                }
            },
        }
    }
    out.push('}');
    out
}

/// Parses a property form into a fresh record buffer.
pub fn parse_property_form(schema: &Schema, text: &str) -> Result<Vec<u8>> {
    let body = text
        .trim()
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .ok_or_else(|| Error::invalid_format("property form", "missing braces"))?;

    let mut buf = vec![0u8; schema.object_size()];
    let mut record = RecordMut::new(schema, &mut buf)?;
    for entry in body.split(',').filter(|e| !e.trim().is_empty()) {
        let (nick, value) = entry
            .split_once(['=', ':'])
            .ok_or_else(|| Error::invalid_format("property form", format!("entry '{entry}'")))?;
        let nick = nick.trim();
        let value = value.trim();
        let index = schema.index_of(nick)?;
        match schema.column(index).kind() {
            CellKind::FixedString => record.set_bytes(index, value.as_bytes())?,
            CellKind::Bitfield => record.set_bytes(index, &parse_hex(nick, value)?)?,
            CellKind::Cardinal | CellKind::Binary => {
                let v = value.parse::<u64>().map_err(|e| {
                    Error::invalid_format(nick, format!("'{value}' is not a number: {e}"))
                })?;
                record.set_cardinal(index, v)?;
            }
        }
    }
    Ok(buf)
}

fn parse_hex(nick: &str, value: &str) -> Result<Vec<u8>> {
    let value = value.strip_prefix("0x").unwrap_or(value);
    if value.len() % 2 != 0 {
        return Err(Error::invalid_format(nick, "odd number of hex digits"));
    }
    (0..value.len())
        .step_by(2)
        .map(|i| {
            value
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| Error::invalid_format(nick, format!("'{value}' is not hex")))
        })
        .collect()
}
