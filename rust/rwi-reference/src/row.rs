//! Compact form of a word reference: one fixed 40-byte record.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use rwi_common::{Result, error::Error};
use rwi_format::{
    Flags, HashKey, RecordRef, cardinal,
    key::KEY_LENGTH,
    micro_date,
    property_form::{parse_property_form, to_property_form},
};

use crate::layout::{self, DEFAULT_LANGUAGE, Field, ROW_SIZE, reference_schema};

/// A word reference in its stored form.
///
/// Equality, ordering and hashing consider the document key only, so rows sort
/// identically to their raw bytes.
#[derive(Clone, Copy)]
pub struct ReferenceRow {
    bytes: [u8; ROW_SIZE],
}

impl ReferenceRow {
    /// The row with an all-zero document key.
    ///
    /// Zero bytes are outside the key alphabet, so no indexed document can carry
    /// this key.
    pub const fn sentinel() -> ReferenceRow {
        ReferenceRow {
            bytes: [0; ROW_SIZE],
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.bytes[layout::URL_HASH.range()]
            .iter()
            .all(|&b| b == 0)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<ReferenceRow> {
        let bytes: [u8; ROW_SIZE] = bytes.try_into().map_err(|_| {
            Error::invalid_arg(
                "row",
                format!("row requires exactly {ROW_SIZE} bytes, got {}", bytes.len()),
            )
        })?;
        Ok(ReferenceRow { bytes })
    }

    pub fn from_property_form(text: &str) -> Result<ReferenceRow> {
        ReferenceRow::from_bytes(&parse_property_form(reference_schema(), text)?)
    }

    pub fn as_bytes(&self) -> &[u8; ROW_SIZE] {
        &self.bytes
    }

    /// Schema-driven view of this row.
    pub fn record(&self) -> RecordRef<'_> {
        RecordRef::new_unchecked(reference_schema(), &self.bytes)
    }

    pub fn to_property_form(&self) -> String {
        to_property_form(&self.record())
    }

    pub fn key_bytes(&self) -> &[u8] {
        &self.bytes[layout::URL_HASH.range()]
    }

    pub fn document_key(&self) -> HashKey {
        let mut raw = [0u8; KEY_LENGTH];
        raw.copy_from_slice(self.key_bytes());
        HashKey::from_raw(raw)
    }

    pub fn last_modified_days(&self) -> u64 {
        self.get(layout::LAST_MODIFIED)
    }

    /// Milliseconds since the epoch, at day granularity.
    pub fn last_modified(&self) -> u64 {
        micro_date::millis(self.last_modified_days())
    }

    pub fn fresh_until_days(&self) -> u64 {
        self.get(layout::FRESH_UNTIL)
    }

    pub fn words_in_title(&self) -> u64 {
        self.get(layout::WORDS_IN_TITLE)
    }

    pub fn words_in_text(&self) -> u64 {
        self.get(layout::WORDS_IN_TEXT)
    }

    pub fn phrases_in_text(&self) -> u64 {
        self.get(layout::PHRASES_IN_TEXT)
    }

    pub fn doctype(&self) -> u8 {
        self.bytes[layout::DOCTYPE.offset]
    }

    pub fn language(&self) -> [u8; 2] {
        let off = layout::LANGUAGE.offset;
        [self.bytes[off], self.bytes[off + 1]]
    }

    pub fn llocal(&self) -> u64 {
        self.get(layout::LLOCAL)
    }

    pub fn lother(&self) -> u64 {
        self.get(layout::LOTHER)
    }

    pub fn url_length(&self) -> u64 {
        self.get(layout::URL_LENGTH)
    }

    pub fn url_comps(&self) -> u64 {
        self.get(layout::URL_COMPS)
    }

    pub fn word_type(&self) -> u8 {
        self.bytes[layout::WORD_TYPE.offset]
    }

    pub fn flags(&self) -> Flags {
        Flags::from_record_bytes(&self.bytes[layout::FLAGS.range()])
    }

    pub fn hitcount(&self) -> u64 {
        self.get(layout::HITCOUNT)
    }

    pub fn pos_in_text(&self) -> u64 {
        self.get(layout::POS_IN_TEXT)
    }

    pub fn pos_in_phrase(&self) -> u64 {
        self.get(layout::POS_IN_PHRASE)
    }

    pub fn pos_of_phrase(&self) -> u64 {
        self.get(layout::POS_OF_PHRASE)
    }

    pub fn reserve1(&self) -> u8 {
        self.bytes[layout::RESERVE1.offset]
    }

    pub fn reserve2(&self) -> u8 {
        self.bytes[layout::RESERVE2.offset]
    }

    fn get(&self, field: Field) -> u64 {
        cardinal::read(&self.bytes[field.range()])
    }

    fn set(&mut self, field: Field, value: u64) {
        cardinal::write(&mut self.bytes[field.range()], value);
    }
}

impl PartialEq for ReferenceRow {
    fn eq(&self, other: &Self) -> bool {
        self.key_bytes() == other.key_bytes()
    }
}

impl Eq for ReferenceRow {}

impl PartialOrd for ReferenceRow {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReferenceRow {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key_bytes().cmp(other.key_bytes())
    }
}

impl Hash for ReferenceRow {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key_bytes().hash(state);
    }
}

impl fmt::Debug for ReferenceRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReferenceRow{}", self.to_property_form())
    }
}

/// Builds a [`ReferenceRow`] from document statistics.
///
/// Statistics wider than their column are truncated. The language falls back to
/// `"uk"` unless exactly two bytes are supplied. The freshness horizon is derived
/// from the last-modified and update times unless set explicitly.
#[derive(Debug, Clone)]
pub struct ReferenceRowBuilder {
    key: HashKey,
    url_length: u64,
    url_comps: u64,
    words_in_title: u64,
    hitcount: u64,
    words_in_text: u64,
    phrases_in_text: u64,
    pos_in_text: u64,
    pos_in_phrase: u64,
    pos_of_phrase: u64,
    last_modified: u64,
    update_time: Option<u64>,
    fresh_until_days: Option<u64>,
    language: [u8; 2],
    doctype: u8,
    llocal: u64,
    lother: u64,
    word_type: u8,
    flags: Flags,
}

impl ReferenceRowBuilder {
    pub fn new(key: HashKey) -> ReferenceRowBuilder {
        ReferenceRowBuilder {
            key,
            url_length: 0,
            url_comps: 0,
            words_in_title: 0,
            hitcount: 0,
            words_in_text: 0,
            phrases_in_text: 0,
            pos_in_text: 0,
            pos_in_phrase: 0,
            pos_of_phrase: 0,
            last_modified: 0,
            update_time: None,
            fresh_until_days: None,
            language: DEFAULT_LANGUAGE,
            doctype: 0,
            llocal: 0,
            lother: 0,
            word_type: 0,
            flags: Flags::empty(),
        }
    }

    /// Starts a builder for a textual document key, validating it.
    pub fn for_key(key: &str) -> Result<ReferenceRowBuilder> {
        Ok(ReferenceRowBuilder::new(key.parse()?))
    }

    pub fn url_length(mut self, value: u64) -> Self {
        self.url_length = value;
        self
    }

    pub fn url_comps(mut self, value: u64) -> Self {
        self.url_comps = value;
        self
    }

    /// Estimates the title word count from its length in characters.
    pub fn title_length(mut self, chars: u64) -> Self {
        self.words_in_title = chars / 6;
        self
    }

    pub fn words_in_title(mut self, value: u64) -> Self {
        self.words_in_title = value;
        self
    }

    pub fn hitcount(mut self, value: u64) -> Self {
        self.hitcount = value;
        self
    }

    pub fn words_in_text(mut self, value: u64) -> Self {
        self.words_in_text = value;
        self
    }

    pub fn phrases_in_text(mut self, value: u64) -> Self {
        self.phrases_in_text = value;
        self
    }

    pub fn pos_in_text(mut self, value: u64) -> Self {
        self.pos_in_text = value;
        self
    }

    pub fn pos_in_phrase(mut self, value: u64) -> Self {
        self.pos_in_phrase = value;
        self
    }

    pub fn pos_of_phrase(mut self, value: u64) -> Self {
        self.pos_of_phrase = value;
        self
    }

    /// Last-modified time in milliseconds since the epoch.
    pub fn last_modified(mut self, millis: u64) -> Self {
        self.last_modified = millis;
        self
    }

    /// Index update time in milliseconds since the epoch. Defaults to the
    /// last-modified time.
    pub fn update_time(mut self, millis: u64) -> Self {
        self.update_time = Some(millis);
        self
    }

    /// Stores the given freshness horizon instead of deriving it.
    pub fn fresh_until_days(mut self, days: u64) -> Self {
        self.fresh_until_days = Some(days);
        self
    }

    pub fn language(mut self, language: &[u8]) -> Self {
        self.language = match language {
            [a, b] => [*a, *b],
            _ => DEFAULT_LANGUAGE,
        };
        self
    }

    pub fn doctype(mut self, value: u8) -> Self {
        self.doctype = value;
        self
    }

    pub fn llocal(mut self, value: u64) -> Self {
        self.llocal = value;
        self
    }

    pub fn lother(mut self, value: u64) -> Self {
        self.lother = value;
        self
    }

    pub fn word_type(mut self, value: u8) -> Self {
        self.word_type = value;
        self
    }

    pub fn flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    pub fn build(&self) -> ReferenceRow {
        let lm_days = micro_date::days(self.last_modified);
        let fresh_until = self.fresh_until_days.unwrap_or_else(|| {
            let update_days = micro_date::days(self.update_time.unwrap_or(self.last_modified));
            micro_date::fresh_until(lm_days, update_days)
        });

        let mut row = ReferenceRow::sentinel();
        row.bytes[layout::URL_HASH.range()].copy_from_slice(self.key.as_bytes());
        row.set(layout::LAST_MODIFIED, lm_days);
        row.set(layout::FRESH_UNTIL, fresh_until);
        row.set(layout::WORDS_IN_TITLE, self.words_in_title);
        row.set(layout::WORDS_IN_TEXT, self.words_in_text);
        row.set(layout::PHRASES_IN_TEXT, self.phrases_in_text);
        row.bytes[layout::DOCTYPE.offset] = self.doctype;
        row.bytes[layout::LANGUAGE.range()].copy_from_slice(&self.language);
        row.set(layout::LLOCAL, self.llocal);
        row.set(layout::LOTHER, self.lother);
        row.set(layout::URL_LENGTH, self.url_length);
        row.set(layout::URL_COMPS, self.url_comps);
        row.bytes[layout::WORD_TYPE.offset] = self.word_type;
        row.bytes[layout::FLAGS.range()].copy_from_slice(&self.flags.to_record_bytes());
        row.set(layout::HITCOUNT, self.hitcount);
        row.set(layout::POS_IN_TEXT, self.pos_in_text);
        row.set(layout::POS_IN_PHRASE, self.pos_in_phrase);
        row.set(layout::POS_OF_PHRASE, self.pos_of_phrase);
        row
    }
}
