use rwi_format::{Flags, HashKey, micro_date};

use crate::row::ReferenceRow;

/// Read access shared by the compact and expanded forms of a word reference.
pub trait Reference {
    fn document_key(&self) -> HashKey;

    /// Last-modified time in milliseconds since the epoch.
    fn last_modified(&self) -> u64;

    fn fresh_until_days(&self) -> u64;

    fn words_in_title(&self) -> u64;

    fn words_in_text(&self) -> u64;

    fn phrases_in_text(&self) -> u64;

    fn doctype(&self) -> u8;

    fn language(&self) -> [u8; 2];

    fn llocal(&self) -> u64;

    fn lother(&self) -> u64;

    fn url_length(&self) -> u64;

    fn url_comps(&self) -> u64;

    fn word_type(&self) -> u8;

    fn flags(&self) -> Flags;

    fn hitcount(&self) -> u64;

    fn pos_in_phrase(&self) -> u64;

    fn pos_of_phrase(&self) -> u64;

    /// Occurrence offsets of the term, in insertion order.
    fn positions(&self) -> Vec<u64>;

    /// `hitcount / (words_in_text + words_in_title + 1)`.
    fn term_frequency(&self) -> f64 {
        self.hitcount() as f64 / (self.words_in_text() + self.words_in_title() + 1) as f64
    }

    /// Last-modified time as a day count.
    fn virtual_age(&self) -> u64 {
        micro_date::days(self.last_modified())
    }

    fn min_position(&self) -> Option<u64> {
        self.positions().into_iter().min()
    }

    fn max_position(&self) -> Option<u64> {
        self.positions().into_iter().max()
    }

    /// Mean absolute gap between consecutive positions; zero with fewer than two.
    fn distance(&self) -> u64 {
        let positions = self.positions();
        if positions.len() < 2 {
            return 0;
        }
        let total: u64 = positions.windows(2).map(|w| w[0].abs_diff(w[1])).sum();
        total / (positions.len() as u64 - 1)
    }

    fn is_older(&self, other: &dyn Reference) -> bool {
        self.last_modified() < other.last_modified()
    }
}

impl Reference for ReferenceRow {
    fn document_key(&self) -> HashKey {
        ReferenceRow::document_key(self)
    }

    fn last_modified(&self) -> u64 {
        ReferenceRow::last_modified(self)
    }

    fn fresh_until_days(&self) -> u64 {
        ReferenceRow::fresh_until_days(self)
    }

    fn words_in_title(&self) -> u64 {
        ReferenceRow::words_in_title(self)
    }

    fn words_in_text(&self) -> u64 {
        ReferenceRow::words_in_text(self)
    }

    fn phrases_in_text(&self) -> u64 {
        ReferenceRow::phrases_in_text(self)
    }

    fn doctype(&self) -> u8 {
        ReferenceRow::doctype(self)
    }

    fn language(&self) -> [u8; 2] {
        ReferenceRow::language(self)
    }

    fn llocal(&self) -> u64 {
        ReferenceRow::llocal(self)
    }

    fn lother(&self) -> u64 {
        ReferenceRow::lother(self)
    }

    fn url_length(&self) -> u64 {
        ReferenceRow::url_length(self)
    }

    fn url_comps(&self) -> u64 {
        ReferenceRow::url_comps(self)
    }

    fn word_type(&self) -> u8 {
        ReferenceRow::word_type(self)
    }

    fn flags(&self) -> Flags {
        ReferenceRow::flags(self)
    }

    fn hitcount(&self) -> u64 {
        ReferenceRow::hitcount(self)
    }

    fn pos_in_phrase(&self) -> u64 {
        ReferenceRow::pos_in_phrase(self)
    }

    fn pos_of_phrase(&self) -> u64 {
        ReferenceRow::pos_of_phrase(self)
    }

    fn positions(&self) -> Vec<u64> {
        vec![self.pos_in_text()]
    }

    fn virtual_age(&self) -> u64 {
        self.last_modified_days()
    }
}
