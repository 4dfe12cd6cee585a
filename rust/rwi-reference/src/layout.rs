//! Byte layout of a word reference record.
//!
//! The same layout is described twice: as a [`Schema`] for name-driven access
//! (property form, generic tools), and as compile-time [`Field`] constants used by
//! the typed accessors of [`ReferenceRow`](crate::row::ReferenceRow). Tests keep
//! the two in agreement.

use std::sync::LazyLock;

use rwi_format::{Column, Schema};

/// Location of a cell within a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub offset: usize,
    pub width: usize,
}

impl Field {
    const fn after(prev: Field, width: usize) -> Field {
        Field {
            offset: prev.offset + prev.width,
            width,
        }
    }

    pub const fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.width
    }
}

pub const URL_HASH: Field = Field {
    offset: 0,
    width: 12,
};
pub const LAST_MODIFIED: Field = Field::after(URL_HASH, 2);
pub const FRESH_UNTIL: Field = Field::after(LAST_MODIFIED, 2);
pub const WORDS_IN_TITLE: Field = Field::after(FRESH_UNTIL, 1);
pub const WORDS_IN_TEXT: Field = Field::after(WORDS_IN_TITLE, 2);
pub const PHRASES_IN_TEXT: Field = Field::after(WORDS_IN_TEXT, 2);
pub const DOCTYPE: Field = Field::after(PHRASES_IN_TEXT, 1);
pub const LANGUAGE: Field = Field::after(DOCTYPE, 2);
pub const LLOCAL: Field = Field::after(LANGUAGE, 1);
pub const LOTHER: Field = Field::after(LLOCAL, 1);
pub const URL_LENGTH: Field = Field::after(LOTHER, 1);
pub const URL_COMPS: Field = Field::after(URL_LENGTH, 1);
pub const WORD_TYPE: Field = Field::after(URL_COMPS, 1);
pub const FLAGS: Field = Field::after(WORD_TYPE, 4);
pub const HITCOUNT: Field = Field::after(FLAGS, 1);
pub const POS_IN_TEXT: Field = Field::after(HITCOUNT, 2);
pub const POS_IN_PHRASE: Field = Field::after(POS_IN_TEXT, 1);
pub const POS_OF_PHRASE: Field = Field::after(POS_IN_PHRASE, 1);
pub const RESERVE1: Field = Field::after(POS_OF_PHRASE, 1);
pub const RESERVE2: Field = Field::after(RESERVE1, 1);

/// Size of one record in bytes.
pub const ROW_SIZE: usize = RESERVE2.offset + RESERVE2.width;

/// Language stored when none, or a malformed one, is supplied.
pub const DEFAULT_LANGUAGE: [u8; 2] = *b"uk";

/// Every field in column order.
pub const FIELDS: [Field; 20] = [
    URL_HASH,
    LAST_MODIFIED,
    FRESH_UNTIL,
    WORDS_IN_TITLE,
    WORDS_IN_TEXT,
    PHRASES_IN_TEXT,
    DOCTYPE,
    LANGUAGE,
    LLOCAL,
    LOTHER,
    URL_LENGTH,
    URL_COMPS,
    WORD_TYPE,
    FLAGS,
    HITCOUNT,
    POS_IN_TEXT,
    POS_IN_PHRASE,
    POS_OF_PHRASE,
    RESERVE1,
    RESERVE2,
];

static REFERENCE_SCHEMA: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new_unchecked(vec![
        Column::string("h", "urlhash", URL_HASH.width),
        Column::cardinal("a", "lastModified", LAST_MODIFIED.width),
        Column::cardinal("s", "freshUntil", FRESH_UNTIL.width),
        Column::cardinal("u", "wordsInTitle", WORDS_IN_TITLE.width),
        Column::cardinal("w", "wordsInText", WORDS_IN_TEXT.width),
        Column::cardinal("p", "phrasesInText", PHRASES_IN_TEXT.width),
        Column::binary("d", "doctype", DOCTYPE.width),
        Column::string("l", "language", LANGUAGE.width),
        Column::cardinal("x", "llocal", LLOCAL.width),
        Column::cardinal("y", "lother", LOTHER.width),
        Column::cardinal("m", "urlLength", URL_LENGTH.width),
        Column::cardinal("n", "urlComps", URL_COMPS.width),
        Column::binary("g", "typeofword", WORD_TYPE.width),
        Column::bitfield("z", "flags", FLAGS.width),
        Column::cardinal("c", "hitcount", HITCOUNT.width),
        Column::cardinal("t", "posintext", POS_IN_TEXT.width),
        Column::cardinal("r", "posinphrase", POS_IN_PHRASE.width),
        Column::cardinal("o", "posofphrase", POS_OF_PHRASE.width),
        Column::cardinal("i", "reserve1", RESERVE1.width),
        Column::cardinal("k", "reserve2", RESERVE2.width),
    ])
});

/// The word reference schema.
pub fn reference_schema() -> &'static Schema {
    &REFERENCE_SCHEMA
}
