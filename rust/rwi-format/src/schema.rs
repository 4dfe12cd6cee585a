use std::collections::HashSet;

use rwi_common::{Result, error::Error, verify_arg};

use crate::column::Column;

/// Ordered sequence of columns describing a fixed-width record.
///
/// Column order defines byte offsets; the widths sum to [`object_size`](Self::object_size).
/// Column 0 is the primary key. Names and nicknames are unique across the schema,
/// and a name may not collide with another column's nickname.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<Column>,
    offsets: Vec<usize>,
    object_size: usize,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Result<Schema> {
        validate_columns(&columns)?;
        Ok(Self::new_unchecked(columns))
    }

    /// Builds a schema without validating uniqueness or widths. Intended for
    /// statically known layouts whose validity is covered by tests.
    pub fn new_unchecked(columns: Vec<Column>) -> Schema {
        let mut offsets = Vec::with_capacity(columns.len());
        let mut object_size = 0;
        for column in &columns {
            offsets.push(object_size);
            object_size += column.width();
        }
        Schema {
            columns,
            offsets,
            object_size,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> &Column {
        &self.columns[index]
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn offset(&self, index: usize) -> usize {
        self.offsets[index]
    }

    /// Byte range of the column at `index` within a record.
    pub fn range(&self, index: usize) -> std::ops::Range<usize> {
        let start = self.offsets[index];
        start..start + self.columns[index].width()
    }

    pub fn object_size(&self) -> usize {
        self.object_size
    }

    pub fn primary_key(&self) -> &Column {
        &self.columns[0]
    }

    pub fn key_width(&self) -> usize {
        self.columns[0].width()
    }

    /// Resolves a column by full name or nickname.
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.matches(name))
            .ok_or_else(|| Error::unknown_column(name))
    }
}

fn validate_columns(columns: &[Column]) -> Result<()> {
    verify_arg!(columns, !columns.is_empty());
    let mut seen = HashSet::new();
    for column in columns {
        if column.width() == 0 {
            return Err(Error::invalid_arg(
                column.name(),
                "column width must be positive",
            ));
        }
        if !seen.insert(column.name()) {
            return Err(Error::invalid_arg(column.name(), "duplicate column name"));
        }
        if column.nickname() != column.name() && !seen.insert(column.nickname()) {
            return Err(Error::invalid_arg(
                column.nickname(),
                "duplicate column nickname",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rwi_common::error::ErrorKind;

    use super::*;

    fn sample() -> Vec<Column> {
        vec![
            Column::string("h", "urlhash", 12),
            Column::cardinal("a", "lastModified", 2),
            Column::bitfield("z", "flags", 4),
        ]
    }

    #[test]
    fn test_offsets() {
        let schema = Schema::new(sample()).unwrap();
        assert_eq!(schema.object_size(), 18);
        assert_eq!(schema.offset(0), 0);
        assert_eq!(schema.offset(1), 12);
        assert_eq!(schema.offset(2), 14);
        assert_eq!(schema.range(2), 14..18);
        assert_eq!(schema.key_width(), 12);
    }

    #[test]
    fn test_index_of() {
        let schema = Schema::new(sample()).unwrap();
        assert_eq!(schema.index_of("a").unwrap(), 1);
        assert_eq!(schema.index_of("flags").unwrap(), 2);
        let err = schema.index_of("q").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnknownColumn { .. }));
    }

    #[test]
    fn test_rejects_invalid() {
        assert!(Schema::new(vec![]).is_err());

        let mut dup = sample();
        dup.push(Column::cardinal("x", "urlhash", 1));
        assert!(Schema::new(dup).is_err());

        let mut dup_nick = sample();
        dup_nick.push(Column::cardinal("a", "other", 1));
        assert!(Schema::new(dup_nick).is_err());

        let mut zero = sample();
        zero.push(Column::cardinal("e", "empty", 0));
        assert!(Schema::new(zero).is_err());
    }
}
