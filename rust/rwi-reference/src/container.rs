//! Per-term collection of word references.

use std::cmp::Ordering;

use rwi_common::{Result, verify_data};
use rwi_format::{HashKey, key::TermHash};

use crate::{
    layout::ROW_SIZE,
    reference::Reference,
    row::ReferenceRow,
    vars::ReferenceVars,
};

/// The references of one term, sorted by document key with at most one entry per
/// document.
#[derive(Debug, Clone)]
pub struct ReferenceContainer {
    term_hash: TermHash,
    rows: Vec<ReferenceRow>,
}

impl ReferenceContainer {
    pub fn new(term_hash: TermHash) -> ReferenceContainer {
        ReferenceContainer {
            term_hash,
            rows: Vec::new(),
        }
    }

    /// Collects rows, keeping the first occurrence of each document key.
    pub fn from_rows(
        term_hash: TermHash,
        rows: impl IntoIterator<Item = ReferenceRow>,
    ) -> ReferenceContainer {
        let mut rows: Vec<ReferenceRow> = rows.into_iter().collect();
        rows.sort();
        rows.dedup();
        ReferenceContainer { term_hash, rows }
    }

    /// Parses a concatenation of stored records.
    pub fn from_bytes(term_hash: TermHash, bytes: &[u8]) -> Result<ReferenceContainer> {
        verify_data!(
            bytes,
            bytes.len() % ROW_SIZE == 0,
            "{} bytes is not a whole number of {ROW_SIZE}-byte records",
            bytes.len()
        );
        let rows = bytes
            .chunks_exact(ROW_SIZE)
            .map(ReferenceRow::from_bytes)
            .collect::<Result<Vec<_>>>()?;
        Ok(ReferenceContainer::from_rows(term_hash, rows))
    }

    /// Stored records in key order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.rows.len() * ROW_SIZE);
        for row in &self.rows {
            out.extend_from_slice(row.as_bytes());
        }
        out
    }

    pub fn term_hash(&self) -> TermHash {
        self.term_hash
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[ReferenceRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReferenceRow> {
        self.rows.iter()
    }

    pub fn get(&self, key: &HashKey) -> Option<&ReferenceRow> {
        self.find(key).ok().map(|i| &self.rows[i])
    }

    pub fn contains(&self, key: &HashKey) -> bool {
        self.find(key).is_ok()
    }

    /// Inserts `row`, replacing and returning any entry with the same key.
    pub fn put(&mut self, row: ReferenceRow) -> Option<ReferenceRow> {
        match self.find(&row.document_key()) {
            Ok(i) => Some(std::mem::replace(&mut self.rows[i], row)),
            Err(i) => {
                self.rows.insert(i, row);
                None
            }
        }
    }

    /// Inserts `row` unless an entry for the same document is more recent.
    ///
    /// Returns `true` if `row` is now stored.
    pub fn put_recent(&mut self, row: ReferenceRow) -> bool {
        match self.find(&row.document_key()) {
            Ok(i) => {
                if row.is_older(&self.rows[i]) {
                    false
                } else {
                    self.rows[i] = row;
                    true
                }
            }
            Err(i) => {
                self.rows.insert(i, row);
                true
            }
        }
    }

    /// Applies [`put_recent`](Self::put_recent) to every entry of `other`.
    /// Returns the number of entries taken over.
    pub fn put_all_recent(&mut self, other: &ReferenceContainer) -> usize {
        other.iter().filter(|row| self.put_recent(**row)).count()
    }

    pub fn remove(&mut self, key: &HashKey) -> Option<ReferenceRow> {
        self.find(key).ok().map(|i| self.rows.remove(i))
    }

    /// Removes all entries whose keys are listed. Returns the number removed.
    pub fn remove_entries<'a>(&mut self, keys: impl IntoIterator<Item = &'a HashKey>) -> usize {
        keys.into_iter()
            .filter(|key| self.remove(key).is_some())
            .count()
    }

    /// Drops the oldest entries until at most `max_references` remain.
    ///
    /// Entries with equal modification time are dropped in key order. A limit of
    /// zero disables shrinking. Returns the number of entries dropped.
    pub fn shrink_references(&mut self, max_references: usize) -> usize {
        if max_references == 0 || self.rows.len() <= max_references {
            return 0;
        }
        let excess = self.rows.len() - max_references;
        let mut by_age: Vec<usize> = (0..self.rows.len()).collect();
        by_age.sort_by_key(|&i| self.rows[i].last_modified_days());
        let mut doomed = vec![false; self.rows.len()];
        for &i in &by_age[..excess] {
            doomed[i] = true;
        }
        let mut index = 0;
        self.rows.retain(|_| {
            let keep = !doomed[index];
            index += 1;
            keep
        });
        log::debug!(
            "shrank references of {} by {excess} to {}",
            self.term_hash,
            self.rows.len()
        );
        excess
    }

    /// Union with `other`. For documents present in both, the more recent entry
    /// wins; on a tie the entry of `self` is kept.
    pub fn merge(mut self, other: &ReferenceContainer) -> ReferenceContainer {
        self.rows.reserve(other.len());
        for row in other.iter() {
            match self.find(&row.document_key()) {
                Ok(i) => {
                    if self.rows[i].is_older(row) {
                        self.rows[i] = *row;
                    }
                }
                Err(i) => self.rows.insert(i, *row),
            }
        }
        self
    }

    /// Removes every entry whose document also appears in `exclude`.
    /// Returns the number removed.
    pub fn exclude_destructive(&mut self, exclude: &ReferenceContainer) -> usize {
        if self.is_empty() || exclude.is_empty() {
            return 0;
        }
        let before = self.rows.len();
        self.rows
            .retain(|row| exclude.find(&row.document_key()).is_err());
        before - self.rows.len()
    }

    /// Applies [`exclude_destructive`](Self::exclude_destructive) for each container.
    pub fn exclude_containers<'a>(
        &mut self,
        containers: impl IntoIterator<Item = &'a ReferenceContainer>,
    ) -> usize {
        let mut removed = 0;
        for exclude in containers {
            if self.is_empty() {
                break;
            }
            removed += self.exclude_destructive(exclude);
        }
        removed
    }

    fn find(&self, key: &HashKey) -> std::result::Result<usize, usize> {
        self.rows
            .binary_search_by(|row| row.key_bytes().cmp(key.as_bytes().as_slice()))
    }
}

impl<'a> IntoIterator for &'a ReferenceContainer {
    type Item = &'a ReferenceRow;
    type IntoIter = std::slice::Iter<'a, ReferenceRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Intersection of two containers.
///
/// For each document in both, the entry of `a` is expanded and joined with the
/// entry of `b`. Results whose mean position gap exceeds `max_distance` are
/// dropped. The output is in key order.
pub fn join_constructive(
    a: &ReferenceContainer,
    b: &ReferenceContainer,
    max_distance: u64,
) -> Vec<ReferenceVars> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let high = a.len().max(b.len());
    let low = a.len().min(b.len());
    let steps_enum = 10 * (high + low - 1);
    let steps_test = 12 * log2(high) * low;
    if steps_enum > steps_test {
        join_by_lookup(a, b, max_distance)
    } else {
        join_by_enumeration(a, b, max_distance)
    }
}

/// Conjunction over several containers, smallest first.
///
/// Any empty input yields an empty result.
pub fn join_containers(containers: &[&ReferenceContainer], max_distance: u64) -> Vec<ReferenceVars> {
    if containers.is_empty() || containers.iter().any(|c| c.is_empty()) {
        return Vec::new();
    }
    let mut ordered: Vec<&ReferenceContainer> = containers.to_vec();
    ordered.sort_by_key(|c| c.len());

    let mut result: Vec<ReferenceVars> = ordered[0].iter().map(ReferenceVars::from).collect();
    for container in &ordered[1..] {
        result = result
            .into_iter()
            .filter_map(|mut vars| {
                let other = container.get(&vars.document_key())?;
                vars.join(&ReferenceVars::from(other));
                (vars.distance() <= max_distance).then_some(vars)
            })
            .collect();
        if result.is_empty() {
            break;
        }
    }
    result
}

fn join_by_lookup(a: &ReferenceContainer, b: &ReferenceContainer, max_distance: u64) -> Vec<ReferenceVars> {
    let (small, large, small_is_a) = if a.len() <= b.len() {
        (a, b, true)
    } else {
        (b, a, false)
    };
    let mut out = Vec::new();
    for row in small {
        let Some(hit) = large.get(&row.document_key()) else {
            continue;
        };
        let (first, second) = if small_is_a { (row, hit) } else { (hit, row) };
        push_joined(&mut out, first, second, max_distance);
    }
    out
}

fn join_by_enumeration(
    a: &ReferenceContainer,
    b: &ReferenceContainer,
    max_distance: u64,
) -> Vec<ReferenceVars> {
    let mut out = Vec::new();
    let mut ia = a.iter().peekable();
    let mut ib = b.iter().peekable();
    while let (Some(&ra), Some(&rb)) = (ia.peek(), ib.peek()) {
        match ra.cmp(rb) {
            Ordering::Less => {
                ia.next();
            }
            Ordering::Greater => {
                ib.next();
            }
            Ordering::Equal => {
                push_joined(&mut out, ra, rb, max_distance);
                ia.next();
                ib.next();
            }
        }
    }
    out
}

fn push_joined(
    out: &mut Vec<ReferenceVars>,
    first: &ReferenceRow,
    second: &ReferenceRow,
    max_distance: u64,
) {
    let mut joined = ReferenceVars::from(first);
    joined.join(&ReferenceVars::from(second));
    if joined.distance() <= max_distance {
        out.push(joined);
    }
}

fn log2(mut x: usize) -> usize {
    let mut l = 0;
    while x > 0 {
        x >>= 1;
        l += 1;
    }
    l
}

#[cfg(test)]
mod tests {
    use rwi_format::micro_date::DAY_MILLIS;

    use super::*;
    use crate::row::ReferenceRowBuilder;

    fn row(key: &str, day: u64, pos: u64) -> ReferenceRow {
        ReferenceRowBuilder::for_key(key)
            .unwrap()
            .last_modified(day * DAY_MILLIS)
            .pos_in_text(pos)
            .hitcount(1)
            .words_in_text(10)
            .build()
    }

    fn term() -> TermHash {
        "TTTTTTTTTTTT".parse().unwrap()
    }

    fn key(s: &str) -> HashKey {
        s.parse().unwrap()
    }

    #[test]
    fn test_sorted_unique() {
        let mut c = ReferenceContainer::new(term());
        assert!(c.put(row("CCCCCCBBBBBB", 1, 0)).is_none());
        assert!(c.put(row("AAAAAABBBBBB", 1, 0)).is_none());
        let old = c.put(row("CCCCCCBBBBBB", 2, 0)).unwrap();
        assert_eq!(old.last_modified_days(), 1);
        assert_eq!(c.len(), 2);
        let keys: Vec<_> = c.iter().map(|r| r.document_key().to_string()).collect();
        assert_eq!(keys, ["AAAAAABBBBBB", "CCCCCCBBBBBB"]);
        assert_eq!(c.get(&key("CCCCCCBBBBBB")).unwrap().last_modified_days(), 2);
    }

    #[test]
    fn test_bytes_round_trip() {
        let c = ReferenceContainer::from_rows(
            term(),
            [row("CCCCCCBBBBBB", 1, 0), row("AAAAAABBBBBB", 1, 0)],
        );
        let bytes = c.to_bytes();
        assert_eq!(bytes.len(), 2 * ROW_SIZE);
        assert_eq!(&bytes[..12], b"AAAAAABBBBBB");
        let parsed = ReferenceContainer::from_bytes(term(), &bytes).unwrap();
        assert_eq!(parsed.rows(), c.rows());
        let err = ReferenceContainer::from_bytes(term(), &bytes[1..]).unwrap_err();
        match err.into_kind() {
            rwi_common::error::ErrorKind::InvalidFormat { element, message } => {
                assert_eq!(element, "bytes");
                assert_eq!(message, "79 bytes is not a whole number of 40-byte records");
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_put_recent() {
        let mut c = ReferenceContainer::new(term());
        assert!(c.put_recent(row("AAAAAABBBBBB", 5, 0)));
        assert!(!c.put_recent(row("AAAAAABBBBBB", 4, 0)));
        assert!(c.put_recent(row("AAAAAABBBBBB", 5, 1)));
        assert!(c.put_recent(row("AAAAAABBBBBB", 6, 2)));
        assert_eq!(c.get(&key("AAAAAABBBBBB")).unwrap().pos_in_text(), 2);

        let other = ReferenceContainer::from_rows(
            term(),
            [row("AAAAAABBBBBB", 1, 0), row("DDDDDDBBBBBB", 1, 0)],
        );
        assert_eq!(c.put_all_recent(&other), 1);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_remove_entries() {
        let mut c = ReferenceContainer::from_rows(
            term(),
            [
                row("AAAAAABBBBBB", 1, 0),
                row("CCCCCCBBBBBB", 1, 0),
                row("DDDDDDBBBBBB", 1, 0),
            ],
        );
        let gone = [key("AAAAAABBBBBB"), key("EEEEEEBBBBBB"), key("DDDDDDBBBBBB")];
        assert_eq!(c.remove_entries(&gone), 2);
        assert_eq!(c.len(), 1);
        assert!(c.contains(&key("CCCCCCBBBBBB")));
        assert!(c.remove(&key("CCCCCCBBBBBB")).is_some());
        assert!(c.is_empty());
    }

    #[test]
    fn test_shrink_drops_oldest() {
        let mut c = ReferenceContainer::from_rows(
            term(),
            [
                row("AAAAAABBBBBB", 30, 0),
                row("CCCCCCBBBBBB", 10, 0),
                row("DDDDDDBBBBBB", 20, 0),
                row("EEEEEEBBBBBB", 10, 0),
            ],
        );
        assert_eq!(c.shrink_references(0), 0);
        assert_eq!(c.shrink_references(10), 0);
        assert_eq!(c.shrink_references(2), 2);
        let keys: Vec<_> = c.iter().map(|r| r.document_key().to_string()).collect();
        assert_eq!(keys, ["AAAAAABBBBBB", "DDDDDDBBBBBB"]);
    }

    #[test]
    fn test_merge_prefers_recent() {
        let a = ReferenceContainer::from_rows(
            term(),
            [row("AAAAAABBBBBB", 1, 0), row("CCCCCCBBBBBB", 9, 0)],
        );
        let b = ReferenceContainer::from_rows(
            term(),
            [row("AAAAAABBBBBB", 5, 0), row("CCCCCCBBBBBB", 2, 0), row("DDDDDDBBBBBB", 1, 0)],
        );
        let merged = a.merge(&b);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.get(&key("AAAAAABBBBBB")).unwrap().last_modified_days(), 5);
        assert_eq!(merged.get(&key("CCCCCCBBBBBB")).unwrap().last_modified_days(), 9);
    }

    #[test]
    fn test_exclude_destructive() {
        let mut pivot = ReferenceContainer::from_rows(
            term(),
            [
                row("AAAAAABBBBBB", 1, 0),
                row("CCCCCCBBBBBB", 1, 0),
                row("DDDDDDBBBBBB", 1, 0),
            ],
        );
        let excl = ReferenceContainer::from_rows(term(), [row("CCCCCCBBBBBB", 1, 0)]);
        let empty = ReferenceContainer::new(term());
        assert_eq!(pivot.exclude_containers([&empty, &excl]), 1);
        assert_eq!(pivot.len(), 2);
        assert!(!pivot.contains(&key("CCCCCCBBBBBB")));
    }

    #[test]
    fn test_join_constructive_strategies_agree() {
        let a = ReferenceContainer::from_rows(
            term(),
            (0..200).map(|i| row(&format!("A{i:05}BBBBBB"), 1, 10)),
        );
        let b = ReferenceContainer::from_rows(
            term(),
            [row("A00003BBBBBB", 1, 14), row("A00150BBBBBB", 1, 90), row("ZZZZZZBBBBBB", 1, 0)],
        );
        let lookup = join_by_lookup(&a, &b, u64::MAX);
        let enumeration = join_by_enumeration(&a, &b, u64::MAX);
        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup, enumeration);
        assert_eq!(lookup[0].positions(), &[10, 14]);
        assert_eq!(enumeration[0].positions(), &[10, 14]);

        let close = join_constructive(&a, &b, 10);
        assert_eq!(close.len(), 1);
        assert_eq!(close[0].document_key(), key("A00003BBBBBB"));
        assert_eq!(close[0].words_in_text, 20);
    }

    #[test]
    fn test_join_containers() {
        let a = ReferenceContainer::from_rows(
            term(),
            [row("AAAAAABBBBBB", 1, 1), row("CCCCCCBBBBBB", 1, 1), row("DDDDDDBBBBBB", 1, 1)],
        );
        let b = ReferenceContainer::from_rows(
            term(),
            [row("AAAAAABBBBBB", 1, 2), row("DDDDDDBBBBBB", 1, 3)],
        );
        let c = ReferenceContainer::from_rows(term(), [row("DDDDDDBBBBBB", 1, 5)]);
        let joined = join_containers(&[&a, &b, &c], u64::MAX);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].positions(), &[5, 3, 1]);
        assert_eq!(joined[0].words_in_text, 30);

        let empty = ReferenceContainer::new(term());
        assert!(join_containers(&[&a, &empty], u64::MAX).is_empty());
    }
}
