//! Index abstracts: compact summaries of which documents a container references.
//!
//! Document keys are grouped by host hash (the last six characters). Each group is
//! written as the host hash, a colon, and the concatenated six-character local
//! hashes of its documents:
//!
//! ```text
//! {BBBBBB:AAAAAACCCCCC,DDDDDD:EEEEEE}
//! ```
//!
//! Groups are ordered by host hash; locals keep container order. Peers exchange
//! abstracts to learn which remote peers hold which documents for a term. The
//! format is advisory, so decoding never fails: malformed input yields nothing.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::time::{Duration, Instant};

use rwi_format::{
    HashKey,
    key::{SEGMENT_LENGTH, is_key_text},
};

use crate::{config::AbstractConfig, container::ReferenceContainer};

/// Membership test used to exclude documents from an abstract.
pub trait KeySet {
    fn contains_key(&self, key: &HashKey) -> bool;
}

impl KeySet for ReferenceContainer {
    fn contains_key(&self, key: &HashKey) -> bool {
        self.contains(key)
    }
}

impl KeySet for BTreeSet<HashKey> {
    fn contains_key(&self, key: &HashKey) -> bool {
        self.contains(key)
    }
}

impl KeySet for HashSet<HashKey> {
    fn contains_key(&self, key: &HashKey) -> bool {
        self.contains(key)
    }
}

/// An encoded abstract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAbstract {
    pub text: String,
    /// `false` when the time budget ran out and some documents were left out.
    /// The text is well-formed either way.
    pub complete: bool,
}

impl fmt::Display for EncodedAbstract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Encodes the documents of `container` that are not in `exclude`.
///
/// With a `budget`, the encoder checks the deadline before each document and
/// before each group, and stops once it has passed. Rows whose key is outside
/// the key alphabet, the sentinel included, are left out with a warning.
pub fn encode(
    container: &ReferenceContainer,
    exclude: Option<&dyn KeySet>,
    budget: Option<Duration>,
) -> EncodedAbstract {
    let deadline = budget.map(|b| Instant::now() + b);
    let encoded = encode_until(container, exclude, || {
        deadline.is_some_and(|d| Instant::now() >= d)
    });
    if !encoded.complete {
        log::warn!(
            "abstract of {} truncated by time budget {:?}",
            container.term_hash(),
            budget
        );
    }
    encoded
}

/// Encoder body. `expired` is polled before each row and before each group.
fn encode_until(
    container: &ReferenceContainer,
    exclude: Option<&dyn KeySet>,
    mut expired: impl FnMut() -> bool,
) -> EncodedAbstract {
    let mut complete = true;
    let mut malformed = 0usize;

    let mut domains: BTreeMap<&[u8], Vec<u8>> = BTreeMap::new();
    for row in container {
        if expired() {
            complete = false;
            break;
        }
        let key = row.key_bytes();
        if !is_key_text(key) {
            malformed += 1;
            continue;
        }
        if exclude.is_some_and(|ex| ex.contains_key(&row.document_key())) {
            continue;
        }
        let (local, domain) = key.split_at(SEGMENT_LENGTH);
        domains.entry(domain).or_default().extend_from_slice(local);
    }
    if malformed > 0 {
        log::warn!(
            "left {malformed} references with malformed keys out of the abstract of {}",
            container.term_hash()
        );
    }

    let mut text = String::with_capacity(2 + container.len() * (SEGMENT_LENGTH + 2));
    let mut groups = 0;
    text.push('{');
    for (domain, locals) in &domains {
        if expired() {
            complete = false;
            break;
        }
        if groups > 0 {
            text.push(',');
        }
        text.push_str(&String::from_utf8_lossy(domain));
        text.push(':');
        text.push_str(&String::from_utf8_lossy(locals));
        groups += 1;
    }
    text.push('}');

    log::trace!(
        "encoded abstract of {}: {groups} of {} domains, {} bytes",
        container.term_hash(),
        domains.len(),
        text.len()
    );
    EncodedAbstract { text, complete }
}

/// [`encode`] with the budget taken from `config`.
pub fn encode_with_config(
    container: &ReferenceContainer,
    exclude: Option<&dyn KeySet>,
    config: &AbstractConfig,
) -> EncodedAbstract {
    encode(container, exclude, config.time_budget())
}

/// Decodes an abstract into a map from document key to `peer`.
///
/// Returns an empty map for malformed input.
pub fn decode(text: &str, peer: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    match parse(text) {
        Some(keys) => {
            for key in keys {
                out.insert(key, peer.to_string());
            }
        }
        None => log::warn!("ignoring malformed abstract from peer {peer}"),
    }
    out
}

/// Accumulates abstracts from several peers into a map from document key to the
/// concatenated ids of the peers that reported it.
#[derive(Debug, Clone, Default)]
pub struct AbstractConsensus {
    peers: BTreeMap<String, String>,
}

impl AbstractConsensus {
    pub fn new() -> AbstractConsensus {
        Default::default()
    }

    /// Appends `peer` to every document listed in `text`. Returns the number of
    /// documents listed; malformed input changes nothing and returns zero.
    pub fn absorb(&mut self, text: &str, peer: &str) -> usize {
        let Some(keys) = parse(text) else {
            log::warn!("ignoring malformed abstract from peer {peer}");
            return 0;
        };
        let count = keys.len();
        for key in keys {
            self.peers.entry(key).or_default().push_str(peer);
        }
        count
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.peers.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.peers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.peers
    }
}

/// Full document keys listed in `text`, or `None` if it is malformed.
fn parse(text: &str) -> Option<Vec<String>> {
    let body = text.strip_prefix('{')?.strip_suffix('}')?;
    if !body.is_ascii() {
        return None;
    }
    let mut keys = Vec::new();
    if body.is_empty() {
        return Some(keys);
    }
    for group in body.split(',') {
        let (domain, locals) = group.split_at_checked(SEGMENT_LENGTH)?;
        let locals = locals.strip_prefix(':')?;
        if !is_key_text(domain.as_bytes())
            || locals.is_empty()
            || locals.len() % SEGMENT_LENGTH != 0
            || !is_key_text(locals.as_bytes())
        {
            return None;
        }
        for local in locals.as_bytes().chunks_exact(SEGMENT_LENGTH) {
            let mut key = String::with_capacity(2 * SEGMENT_LENGTH);
            key.push_str(std::str::from_utf8(local).ok()?);
            key.push_str(domain);
            keys.push(key);
        }
    }
    Some(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::{ReferenceRow, ReferenceRowBuilder};

    fn container(keys: &[&str]) -> ReferenceContainer {
        ReferenceContainer::from_rows(
            "TTTTTTTTTTTT".parse().unwrap(),
            keys.iter()
                .map(|k| ReferenceRowBuilder::for_key(k).unwrap().build()),
        )
    }

    #[test]
    fn test_toy_collection() {
        let c = container(&["AAAAAABBBBBB", "CCCCCCBBBBBB"]);
        let encoded = encode(&c, None, None);
        assert_eq!(encoded.text, "{BBBBBB:AAAAAACCCCCC}");
        assert!(encoded.complete);

        let decoded = decode(&encoded.text, "P1");
        let expected: BTreeMap<String, String> = [
            ("AAAAAABBBBBB".to_string(), "P1".to_string()),
            ("CCCCCCBBBBBB".to_string(), "P1".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_exclusion() {
        let c = container(&["AAAAAABBBBBB", "CCCCCCBBBBBB"]);
        let exclude: BTreeSet<HashKey> = ["AAAAAABBBBBB".parse().unwrap()].into_iter().collect();
        let encoded = encode(&c, Some(&exclude), None);
        assert_eq!(encoded.text, "{BBBBBB:CCCCCC}");

        let all = container(&["AAAAAABBBBBB", "CCCCCCBBBBBB"]);
        assert_eq!(encode(&c, Some(&all), None).text, "{}");
    }

    #[test]
    fn test_domains_sorted() {
        let c = container(&["AAAAAAZZZZZZ", "BBBBBBYYYYYY", "CCCCCCZZZZZZ"]);
        assert_eq!(
            encode(&c, None, None).text,
            "{YYYYYY:BBBBBB,ZZZZZZ:AAAAAACCCCCC}"
        );
    }

    #[test]
    fn test_empty() {
        let c = container(&[]);
        let encoded = encode(&c, None, None);
        assert_eq!(encoded.text, "{}");
        assert!(encoded.complete);
        assert!(decode("{}", "P").is_empty());
    }

    #[test]
    fn test_zero_budget_truncates() {
        let c = container(&["AAAAAABBBBBB", "CCCCCCDDDDDD"]);
        let encoded = encode(&c, None, Some(Duration::ZERO));
        assert!(!encoded.complete);
        assert!(encoded.text.starts_with('{') && encoded.text.ends_with('}'));
        assert!(parse(&encoded.text).is_some());

        let config = AbstractConfig {
            time_budget_ms: Some(60_000),
        };
        assert!(encode_with_config(&c, None, &config).complete);
    }

    #[test]
    fn test_deadline_between_groups() {
        let c = container(&["AAAAAAXXXXXX", "BBBBBBYYYYYY", "CCCCCCZZZZZZ"]);
        // Three row checks, then the deadline passes at the third group.
        let mut polls = 0;
        let encoded = encode_until(&c, None, || {
            polls += 1;
            polls > 5
        });
        assert!(!encoded.complete);
        assert_eq!(encoded.text, "{XXXXXX:AAAAAA,YYYYYY:BBBBBB}");
        let decoded = decode(&encoded.text, "P1");
        assert_eq!(decoded.len(), 2);
        assert!(decoded.contains_key("BBBBBBYYYYYY"));
    }

    #[test]
    fn test_deadline_after_first_row() {
        let c = container(&["AAAAAAXXXXXX", "BBBBBBYYYYYY"]);
        let mut polls = 0;
        let encoded = encode_until(&c, None, || {
            polls += 1;
            polls == 2
        });
        assert!(!encoded.complete);
        assert_eq!(encoded.text, "{XXXXXX:AAAAAA}");
    }

    #[test]
    fn test_skips_rows_with_malformed_keys() {
        let valid = ReferenceRowBuilder::for_key("AAAAAABBBBBB").unwrap().build();
        let mut bytes = ReferenceRow::sentinel().as_bytes().to_vec();
        bytes.extend_from_slice(valid.as_bytes());
        let mut garbled = *valid.as_bytes();
        garbled[3] = b'+';
        bytes.extend_from_slice(&garbled);
        let c = ReferenceContainer::from_bytes("TTTTTTTTTTTT".parse().unwrap(), &bytes).unwrap();
        assert_eq!(c.len(), 3);

        let encoded = encode(&c, None, None);
        assert!(encoded.complete);
        assert_eq!(encoded.text, "{BBBBBB:AAAAAA}");
        let decoded = decode(&encoded.text, "P1");
        assert_eq!(decoded.get("AAAAAABBBBBB").map(String::as_str), Some("P1"));
        assert_eq!(decoded.len(), 1);
    }

    #[test]
    fn test_malformed() {
        for text in [
            "",
            "BBBBBB:AAAAAA",
            "{BBBBBB:AAAAAA",
            "BBBBBB:AAAAAA}",
            "{BBBBBBAAAAAA}",
            "{BBBBBB:}",
            "{BBBBBB:AAAAA}",
            "{BBBBBB:AAAAAA,}",
            "{BBB:AAAAAA}",
            "{BBBBBB:AAAA+A}",
            "{BBBBBB:AAAAAA,CCCCCC}",
            "{BBBBBB:AAAAAÄ}",
        ] {
            assert!(decode(text, "P1").is_empty(), "{text:?}");
        }
    }

    #[test]
    fn test_consensus() {
        let mut consensus = AbstractConsensus::new();
        assert_eq!(consensus.absorb("{BBBBBB:AAAAAACCCCCC}", "P1"), 2);
        assert_eq!(consensus.absorb("{BBBBBB:AAAAAA,DDDDDD:EEEEEE}", "P2"), 2);
        assert_eq!(consensus.absorb("{broken", "P3"), 0);

        assert_eq!(consensus.len(), 3);
        assert_eq!(consensus.get("AAAAAABBBBBB"), Some("P1P2"));
        assert_eq!(consensus.get("CCCCCCBBBBBB"), Some("P1"));
        assert_eq!(consensus.get("EEEEEEDDDDDD"), Some("P2"));
        assert_eq!(consensus.get("ZZZZZZZZZZZZ"), None);
    }
}
