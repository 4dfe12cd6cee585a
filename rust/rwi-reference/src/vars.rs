//! Expanded form of a word reference and its merge operations.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use rwi_format::{Flags, HashKey};

use crate::{
    reference::Reference,
    row::{ReferenceRow, ReferenceRowBuilder},
};

/// A word reference decoded into typed fields.
///
/// Unlike the compact form it keeps every occurrence offset seen for the term and
/// an explicit, lazily computed term frequency. Equality, ordering and hashing
/// consider the document key only.
#[derive(Debug, Clone)]
pub struct ReferenceVars {
    document_key: HashKey,
    /// Milliseconds since the epoch.
    pub last_modified: u64,
    pub fresh_until_days: u64,
    pub words_in_title: u64,
    pub words_in_text: u64,
    pub phrases_in_text: u64,
    pub doctype: u8,
    pub language: [u8; 2],
    pub llocal: u64,
    pub lother: u64,
    pub url_length: u64,
    pub url_comps: u64,
    pub word_type: u8,
    pub flags: Flags,
    pub hitcount: u64,
    pub pos_in_phrase: u64,
    pub pos_of_phrase: u64,
    pub virtual_age: u64,
    positions: Vec<u64>,
    term_frequency: Option<f64>,
}

impl ReferenceVars {
    pub fn document_key(&self) -> HashKey {
        self.document_key
    }

    pub fn positions(&self) -> &[u64] {
        &self.positions
    }

    pub fn add_position(&mut self, position: u64) {
        self.positions.push(position);
    }

    /// Term frequency, computing and caching it on first access.
    pub fn cached_term_frequency(&mut self) -> f64 {
        let computed = Reference::term_frequency(&*self);
        *self.term_frequency.get_or_insert(computed)
    }

    pub fn set_term_frequency(&mut self, value: f64) {
        self.term_frequency = Some(value);
    }

    /// Whether the term frequency was set or cached.
    pub fn has_term_frequency(&self) -> bool {
        self.term_frequency.is_some()
    }

    /// Encodes back into the compact form.
    ///
    /// Only the first position survives; the others are dropped.
    pub fn to_row(&self) -> ReferenceRow {
        ReferenceRowBuilder::new(self.document_key)
            .url_length(self.url_length)
            .url_comps(self.url_comps)
            .words_in_title(self.words_in_title)
            .hitcount(self.hitcount)
            .words_in_text(self.words_in_text)
            .phrases_in_text(self.phrases_in_text)
            .pos_in_text(self.positions.first().copied().unwrap_or(0))
            .pos_in_phrase(self.pos_in_phrase)
            .pos_of_phrase(self.pos_of_phrase)
            .last_modified(self.last_modified)
            .fresh_until_days(self.fresh_until_days)
            .language(&self.language)
            .doctype(self.doctype)
            .llocal(self.llocal)
            .lother(self.lother)
            .word_type(self.word_type)
            .flags(self.flags)
            .build()
    }

    /// Folds in another observation of the same document and term.
    ///
    /// Only the positional fields, the word count and the term frequency are
    /// combined. Every other field keeps this reference's value.
    pub fn join(&mut self, other: &ReferenceVars) {
        self.positions.extend_from_slice(&other.positions);
        self.pos_in_phrase = if self.pos_of_phrase == other.pos_of_phrase {
            self.pos_in_phrase.min(other.pos_in_phrase)
        } else {
            0
        };
        self.pos_of_phrase = self.pos_of_phrase.min(other.pos_of_phrase);

        let tf = self.cached_term_frequency() + other.term_frequency();
        self.term_frequency = Some(tf);
        self.words_in_text += other.words_in_text;
    }

    /// Pointwise minimum, in place, with a reference to the same document for
    /// another term.
    ///
    /// Positions collapse to the single smallest offset of both sides; when one
    /// side has no positions the other side's are kept.
    pub fn min_with(&mut self, other: &ReferenceVars) {
        self.fold(other, std::cmp::min, f64::min, |a, b| {
            a.iter().chain(b).copied().min()
        });
    }

    /// Pointwise maximum, in place. See [`min_with`](Self::min_with).
    pub fn max_with(&mut self, other: &ReferenceVars) {
        self.fold(other, std::cmp::max, f64::max, |a, b| {
            a.iter().chain(b).copied().max()
        });
    }

    fn fold(
        &mut self,
        other: &ReferenceVars,
        pick: fn(u64, u64) -> u64,
        pick_f: fn(f64, f64) -> f64,
        extreme: impl Fn(&[u64], &[u64]) -> Option<u64>,
    ) {
        self.hitcount = pick(self.hitcount, other.hitcount);
        self.llocal = pick(self.llocal, other.llocal);
        self.lother = pick(self.lother, other.lother);
        self.virtual_age = pick(self.virtual_age, other.virtual_age);
        self.words_in_text = pick(self.words_in_text, other.words_in_text);
        self.phrases_in_text = pick(self.phrases_in_text, other.phrases_in_text);
        if self.positions.is_empty() {
            self.positions = other.positions.clone();
        } else if !other.positions.is_empty() {
            self.positions = extreme(&self.positions, &other.positions)
                .into_iter()
                .collect();
        }
        self.pos_in_phrase = pick(self.pos_in_phrase, other.pos_in_phrase);
        self.pos_of_phrase = pick(self.pos_of_phrase, other.pos_of_phrase);
        self.last_modified = pick(self.last_modified, other.last_modified);
        self.url_length = pick(self.url_length, other.url_length);
        self.url_comps = pick(self.url_comps, other.url_comps);
        self.words_in_title = pick(self.words_in_title, other.words_in_title);
        let tf = pick_f(self.cached_term_frequency(), other.term_frequency());
        self.term_frequency = Some(tf);
    }
}

impl From<&ReferenceRow> for ReferenceVars {
    fn from(row: &ReferenceRow) -> Self {
        ReferenceVars {
            document_key: row.document_key(),
            last_modified: row.last_modified(),
            fresh_until_days: row.fresh_until_days(),
            words_in_title: row.words_in_title(),
            words_in_text: row.words_in_text(),
            phrases_in_text: row.phrases_in_text(),
            doctype: row.doctype(),
            language: row.language(),
            llocal: row.llocal(),
            lother: row.lother(),
            url_length: row.url_length(),
            url_comps: row.url_comps(),
            word_type: row.word_type(),
            flags: row.flags(),
            hitcount: row.hitcount(),
            pos_in_phrase: row.pos_in_phrase(),
            pos_of_phrase: row.pos_of_phrase(),
            virtual_age: row.last_modified_days(),
            positions: vec![row.pos_in_text()],
            term_frequency: None,
        }
    }
}

impl From<ReferenceRow> for ReferenceVars {
    fn from(row: ReferenceRow) -> Self {
        ReferenceVars::from(&row)
    }
}

impl Reference for ReferenceVars {
    fn document_key(&self) -> HashKey {
        self.document_key
    }

    fn last_modified(&self) -> u64 {
        self.last_modified
    }

    fn fresh_until_days(&self) -> u64 {
        self.fresh_until_days
    }

    fn words_in_title(&self) -> u64 {
        self.words_in_title
    }

    fn words_in_text(&self) -> u64 {
        self.words_in_text
    }

    fn phrases_in_text(&self) -> u64 {
        self.phrases_in_text
    }

    fn doctype(&self) -> u8 {
        self.doctype
    }

    fn language(&self) -> [u8; 2] {
        self.language
    }

    fn llocal(&self) -> u64 {
        self.llocal
    }

    fn lother(&self) -> u64 {
        self.lother
    }

    fn url_length(&self) -> u64 {
        self.url_length
    }

    fn url_comps(&self) -> u64 {
        self.url_comps
    }

    fn word_type(&self) -> u8 {
        self.word_type
    }

    fn flags(&self) -> Flags {
        self.flags
    }

    fn hitcount(&self) -> u64 {
        self.hitcount
    }

    fn pos_in_phrase(&self) -> u64 {
        self.pos_in_phrase
    }

    fn pos_of_phrase(&self) -> u64 {
        self.pos_of_phrase
    }

    fn positions(&self) -> Vec<u64> {
        self.positions.clone()
    }

    fn term_frequency(&self) -> f64 {
        match self.term_frequency {
            Some(tf) => tf,
            None => {
                self.hitcount as f64 / (self.words_in_text + self.words_in_title + 1) as f64
            }
        }
    }

    fn virtual_age(&self) -> u64 {
        self.virtual_age
    }
}

impl PartialEq for ReferenceVars {
    fn eq(&self, other: &Self) -> bool {
        self.document_key == other.document_key
    }
}

impl Eq for ReferenceVars {}

impl PartialOrd for ReferenceVars {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReferenceVars {
    fn cmp(&self, other: &Self) -> Ordering {
        self.document_key.cmp(&other.document_key)
    }
}

impl Hash for ReferenceVars {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.document_key.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(key: &str, hitcount: u64, words: u64, pos: u64) -> ReferenceVars {
        ReferenceVars::from(
            ReferenceRowBuilder::for_key(key)
                .unwrap()
                .hitcount(hitcount)
                .words_in_text(words)
                .pos_in_text(pos)
                .build(),
        )
    }

    #[test]
    fn test_term_frequency_cached() {
        let mut v = vars("AAAAAABBBBBB", 3, 5, 1);
        assert!(!v.has_term_frequency());
        assert_eq!(v.term_frequency(), 0.5);
        assert!(!v.has_term_frequency());
        assert_eq!(v.cached_term_frequency(), 0.5);
        assert!(v.has_term_frequency());
        v.hitcount = 100;
        assert_eq!(v.term_frequency(), 0.5);
    }

    #[test]
    fn test_join_phrase_alignment() {
        let mut a = vars("AAAAAABBBBBB", 1, 10, 3);
        a.pos_of_phrase = 4;
        a.pos_in_phrase = 6;
        let mut b = vars("AAAAAABBBBBB", 1, 20, 9);
        b.pos_of_phrase = 4;
        b.pos_in_phrase = 2;

        let mut same = a.clone();
        same.join(&b);
        assert_eq!(same.pos_in_phrase, 2);
        assert_eq!(same.pos_of_phrase, 4);
        assert_eq!(same.positions(), &[3, 9]);
        assert_eq!(same.words_in_text, 30);

        b.pos_of_phrase = 2;
        let mut different = a.clone();
        different.join(&b);
        assert_eq!(different.pos_in_phrase, 0);
        assert_eq!(different.pos_of_phrase, 2);
    }

    #[test]
    fn test_join_keeps_first_operand_metadata() {
        // Documented asymmetry: fields outside the positional statistics, the word
        // count and the term frequency are taken from the receiver unchanged.
        let mut a = vars("AAAAAABBBBBB", 1, 10, 3);
        a.url_length = 40;
        a.llocal = 2;
        let mut b = vars("AAAAAABBBBBB", 7, 10, 5);
        b.url_length = 90;
        b.llocal = 9;

        a.join(&b);
        assert_eq!(a.hitcount, 1);
        assert_eq!(a.url_length, 40);
        assert_eq!(a.llocal, 2);
    }

    #[test]
    fn test_join_sums_term_frequency() {
        let mut a = vars("AAAAAABBBBBB", 1, 1, 0);
        let b = vars("AAAAAABBBBBB", 2, 3, 0);
        a.join(&b);
        assert_eq!(a.term_frequency(), 1.0);
    }

    #[test]
    fn test_min_max_positions() {
        let mut a = vars("AAAAAABBBBBB", 1, 1, 8);
        a.add_position(3);
        let mut b = vars("AAAAAABBBBBB", 1, 1, 5);
        b.add_position(20);

        let mut lo = a.clone();
        lo.min_with(&b);
        assert_eq!(lo.positions(), &[3]);

        let mut hi = a.clone();
        hi.max_with(&b);
        assert_eq!(hi.positions(), &[20]);

        let mut empty = a.clone();
        empty.positions.clear();
        empty.min_with(&b);
        assert_eq!(empty.positions(), &[5, 20]);

        let mut keep = a.clone();
        let mut none = b.clone();
        none.positions.clear();
        keep.max_with(&none);
        assert_eq!(keep.positions(), &[8, 3]);
    }

    #[test]
    fn test_distance() {
        let mut v = vars("AAAAAABBBBBB", 1, 1, 10);
        v.add_position(4);
        v.add_position(12);
        assert_eq!(v.distance(), 7);
        assert_eq!(v.min_position(), Some(4));
        assert_eq!(v.max_position(), Some(12));
    }

    #[test]
    fn test_ordering_by_key() {
        let a = vars("AAAAAABBBBBB", 1, 1, 1);
        let b = vars("CCCCCCBBBBBB", 9, 9, 9);
        assert!(a < b);
        assert_eq!(a, vars("AAAAAABBBBBB", 5, 5, 5));
        assert_eq!(a.cmp(&b), a.to_row().cmp(&b.to_row()));
    }

}
