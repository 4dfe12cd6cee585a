//! Schema-driven views over a single fixed-width record.

use rwi_common::{Result, error::Error};

use crate::{cardinal, column::Column, schema::Schema};

/// Read-only view of a record.
#[derive(Debug, Clone, Copy)]
pub struct RecordRef<'a> {
    schema: &'a Schema,
    bytes: &'a [u8],
}

impl<'a> RecordRef<'a> {
    /// Fails with `InvalidArgument` unless `bytes` is exactly one record long.
    pub fn new(schema: &'a Schema, bytes: &'a [u8]) -> Result<RecordRef<'a>> {
        check_len(schema, bytes.len())?;
        Ok(RecordRef { schema, bytes })
    }

    /// Wraps a buffer whose length is already known to match the schema.
    pub fn new_unchecked(schema: &'a Schema, bytes: &'a [u8]) -> RecordRef<'a> {
        debug_assert_eq!(bytes.len(), schema.object_size());
        RecordRef { schema, bytes }
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn key(&self) -> &'a [u8] {
        self.bytes(0)
    }

    /// Raw bytes of the column at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range for the schema.
    pub fn bytes(&self, index: usize) -> &'a [u8] {
        &self.bytes[self.schema.range(index)]
    }

    /// Unsigned value of the column at `index`.
    pub fn cardinal(&self, index: usize) -> Result<u64> {
        check_numeric(column_at(self.schema, index)?)?;
        Ok(cardinal::read(self.bytes(index)))
    }

    pub fn cardinal_by_name(&self, name: &str) -> Result<u64> {
        self.cardinal(self.schema.index_of(name)?)
    }

    pub fn bytes_by_name(&self, name: &str) -> Result<&'a [u8]> {
        Ok(self.bytes(self.schema.index_of(name)?))
    }
}

/// Mutable view of a record.
#[derive(Debug)]
pub struct RecordMut<'a> {
    schema: &'a Schema,
    bytes: &'a mut [u8],
}

impl<'a> RecordMut<'a> {
    pub fn new(schema: &'a Schema, bytes: &'a mut [u8]) -> Result<RecordMut<'a>> {
        check_len(schema, bytes.len())?;
        Ok(RecordMut { schema, bytes })
    }

    pub fn as_record(&self) -> RecordRef<'_> {
        RecordRef {
            schema: self.schema,
            bytes: &*self.bytes,
        }
    }

    /// Stores `value` truncated modulo `256^width` of the column.
    pub fn set_cardinal(&mut self, index: usize, value: u64) -> Result<()> {
        check_numeric(column_at(self.schema, index)?)?;
        let range = self.schema.range(index);
        cardinal::write(&mut self.bytes[range], value);
        Ok(())
    }

    /// Stores raw bytes into the column at `index`.
    ///
    /// The primary key must match the key width exactly. Any other column is
    /// zero padded when `value` is short and truncated when it is long.
    pub fn set_bytes(&mut self, index: usize, value: &[u8]) -> Result<()> {
        let column = column_at(self.schema, index)?;
        if index == 0 && value.len() != column.width() {
            return Err(Error::invalid_arg(
                column.name(),
                format!(
                    "key requires exactly {} bytes, got {}",
                    column.width(),
                    value.len()
                ),
            ));
        }
        let cell = &mut self.bytes[self.schema.range(index)];
        let n = value.len().min(cell.len());
        cell[..n].copy_from_slice(&value[..n]);
        cell[n..].fill(0);
        Ok(())
    }

    pub fn set_cardinal_by_name(&mut self, name: &str, value: u64) -> Result<()> {
        let index = self.schema.index_of(name)?;
        self.set_cardinal(index, value)
    }

    pub fn set_bytes_by_name(&mut self, name: &str, value: &[u8]) -> Result<()> {
        let index = self.schema.index_of(name)?;
        self.set_bytes(index, value)
    }
}

fn check_len(schema: &Schema, len: usize) -> Result<()> {
    if len == schema.object_size() {
        Ok(())
    } else {
        Err(Error::invalid_arg(
            "record",
            format!(
                "record requires exactly {} bytes, got {len}",
                schema.object_size()
            ),
        ))
    }
}

fn column_at(schema: &Schema, index: usize) -> Result<&Column> {
    schema.columns().get(index).ok_or_else(|| {
        Error::invalid_arg(
            "index",
            format!("column {index} out of range for {} columns", schema.len()),
        )
    })
}

fn check_numeric(column: &Column) -> Result<()> {
    if column.is_numeric() {
        Ok(())
    } else {
        Err(Error::invalid_arg(
            column.name(),
            "column is not an integer column",
        ))
    }
}

#[cfg(test)]
mod tests {
    use rwi_common::error::ErrorKind;

    use super::*;

    fn schema() -> Schema {
        Schema::new(vec![
            Column::string("h", "urlhash", 12),
            Column::cardinal("w", "wordsintext", 2),
            Column::cardinal("c", "hitcount", 1),
            Column::string("l", "language", 2),
        ])
        .unwrap()
    }

    #[test]
    fn test_get_set() {
        let schema = schema();
        let mut buf = vec![0u8; schema.object_size()];
        let mut rec = RecordMut::new(&schema, &mut buf).unwrap();
        rec.set_bytes(0, b"AAAAAABBBBBB").unwrap();
        rec.set_cardinal_by_name("w", 300).unwrap();
        rec.set_cardinal_by_name("hitcount", 7).unwrap();
        rec.set_bytes_by_name("l", b"de").unwrap();

        let rec = RecordRef::new(&schema, &buf).unwrap();
        assert_eq!(rec.key(), b"AAAAAABBBBBB");
        assert_eq!(rec.cardinal(1).unwrap(), 300);
        assert_eq!(rec.cardinal_by_name("c").unwrap(), 7);
        assert_eq!(rec.bytes_by_name("language").unwrap(), b"de");
        assert_eq!(&buf[12..14], &[1, 44]);
    }

    #[test]
    fn test_width_rules() {
        let schema = schema();
        let mut buf = vec![0u8; schema.object_size()];
        let mut rec = RecordMut::new(&schema, &mut buf).unwrap();

        rec.set_cardinal(2, 256 + 9).unwrap();
        assert_eq!(rec.as_record().cardinal(2).unwrap(), 9);

        rec.set_bytes(3, b"x").unwrap();
        assert_eq!(rec.as_record().bytes(3), b"x\0");
        rec.set_bytes(3, b"engl").unwrap();
        assert_eq!(rec.as_record().bytes(3), b"en");

        let err = rec.set_bytes(0, b"short").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
        assert!(rec.set_cardinal(0, 1).is_err());
    }

    #[test]
    fn test_index_out_of_range() {
        let schema = schema();
        let mut buf = vec![0u8; schema.object_size()];
        let mut rec = RecordMut::new(&schema, &mut buf).unwrap();
        for err in [
            rec.set_cardinal(4, 1).unwrap_err(),
            rec.set_bytes(9, b"x").unwrap_err(),
            rec.as_record().cardinal(4).unwrap_err(),
        ] {
            assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
        }
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_wrong_length() {
        let schema = schema();
        assert!(RecordRef::new(&schema, &[0u8; 5]).is_err());
        let mut buf = vec![0u8; schema.object_size() + 1];
        assert!(RecordMut::new(&schema, &mut buf).is_err());
    }
}
