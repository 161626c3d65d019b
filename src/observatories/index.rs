use crate::address::normalizer::{AddressNormalizer, NormalizedAddress};
use crate::error::ConfigurationError;
use crate::types::observatory::{ObservatoryId, ObservatoryReference};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Where a reference prefix may occur inside an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// The prefix may occur anywhere in the address.
    #[default]
    Containment,
    /// The address must start with the prefix.
    Prefix,
}

/// A reference row together with its canonical prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedReference {
    pub reference: ObservatoryReference,
    pub prefix: NormalizedAddress,
    /// Length of `prefix` in characters.
    pub prefix_len: usize,
}

/// A reference prefix found in an address.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    /// Position of the reference in the reference dataset.
    pub ordinal: usize,
    pub entry: &'a IndexedReference,
    /// Character offset in the address where the prefix starts.
    pub start: usize,
}

impl Candidate<'_> {
    pub fn len(&self) -> usize {
        self.entry.prefix_len
    }

    pub fn end(&self) -> usize {
        self.start + self.entry.prefix_len
    }

    pub fn observatory_id(&self) -> &ObservatoryId {
        &self.entry.reference.observatory_id
    }
}

#[derive(Debug, Default)]
struct TrieNode {
    children: HashMap<char, usize>,
    /// Ordinals of the references ending here, in declaration order.
    terminals: Vec<usize>,
}

/// Immutable character trie over the canonical reference prefixes.
///
/// Built once per run and shared read-only between lookups.
#[derive(Debug)]
pub struct ObservatoryIndex {
    nodes: Vec<TrieNode>,
    entries: Vec<IndexedReference>,
    first_by_id: HashMap<ObservatoryId, usize>,
    mode: MatchMode,
}

impl ObservatoryIndex {
    /// Builds an index in [`MatchMode::Containment`].
    ///
    /// Prefixes are normalized with the same pipeline as the addresses.
    ///
    /// # Errors
    ///
    /// * [`ConfigurationError::EmptyReferencePrefix`] when a prefix normalizes to
    ///   nothing, since it would match every address.
    /// * [`ConfigurationError::DuplicateReference`] when the same canonical prefix is
    ///   declared twice for the same observatory.
    pub fn build(
        references: impl IntoIterator<Item = ObservatoryReference>,
    ) -> Result<Self, ConfigurationError> {
        Self::build_with_mode(references, MatchMode::default())
    }

    pub fn build_with_mode(
        references: impl IntoIterator<Item = ObservatoryReference>,
        mode: MatchMode,
    ) -> Result<Self, ConfigurationError> {
        let normalizer = AddressNormalizer::new();
        let mut index = Self {
            nodes: vec![TrieNode::default()],
            entries: Vec::new(),
            first_by_id: HashMap::new(),
            mode,
        };
        let mut seen: HashSet<(String, ObservatoryId)> = HashSet::new();

        for reference in references {
            let prefix = normalizer.normalize(&reference.canonical_address_prefix);
            if prefix.is_empty() {
                return Err(ConfigurationError::EmptyReferencePrefix {
                    raw: reference.canonical_address_prefix,
                    observatory_id: reference.observatory_id.0,
                });
            }
            if !seen.insert((prefix.as_str().to_string(), reference.observatory_id.clone())) {
                return Err(ConfigurationError::DuplicateReference {
                    prefix: prefix.into_string(),
                    observatory_id: reference.observatory_id.0,
                });
            }

            let ordinal = index.entries.len();
            let node = index.insert_path(prefix.as_str());
            index.nodes[node].terminals.push(ordinal);
            index
                .first_by_id
                .entry(reference.observatory_id.clone())
                .or_insert(ordinal);
            index.entries.push(IndexedReference {
                prefix_len: prefix.char_len(),
                prefix,
                reference,
            });
        }

        debug!(
            "Built observatory index with {} prefixes for {} observatories ({} trie nodes)",
            index.entries.len(),
            index.first_by_id.len(),
            index.nodes.len()
        );
        Ok(index)
    }

    fn insert_path(&mut self, prefix: &str) -> usize {
        let mut node = 0;
        for c in prefix.chars() {
            node = match self.nodes[node].children.get(&c) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(TrieNode::default());
                    self.nodes[node].children.insert(c, child);
                    child
                }
            };
        }
        node
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Number of reference prefixes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct observatories.
    pub fn observatory_count(&self) -> usize {
        self.first_by_id.len()
    }

    /// The first declared reference of an observatory.
    pub fn get(&self, id: &str) -> Option<&ObservatoryReference> {
        self.first_by_id
            .get(id)
            .map(|&ordinal| &self.entries[ordinal].reference)
    }

    pub fn display_name(&self, id: &str) -> Option<&str> {
        self.get(id).map(|r| r.display_name.as_str())
    }

    pub fn references(&self) -> impl Iterator<Item = &ObservatoryReference> {
        self.entries.iter().map(|e| &e.reference)
    }

    pub fn entries(&self) -> &[IndexedReference] {
        &self.entries
    }

    /// Every reference whose prefix occurs in `address` under the index's
    /// [`MatchMode`], ordered by start position and then by length.
    pub fn candidates<'a>(&'a self, address: &NormalizedAddress) -> Vec<Candidate<'a>> {
        let chars: Vec<char> = address.as_str().chars().collect();
        let starts = match self.mode {
            MatchMode::Prefix => 0..chars.len().min(1),
            MatchMode::Containment => 0..chars.len(),
        };

        let mut found = Vec::new();
        for start in starts {
            let mut node = 0;
            for c in &chars[start..] {
                let Some(&child) = self.nodes[node].children.get(c) else {
                    break;
                };
                node = child;
                found.extend(self.nodes[node].terminals.iter().map(|&ordinal| Candidate {
                    ordinal,
                    entry: &self.entries[ordinal],
                    start,
                }));
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(id: &str, prefix: &str) -> ObservatoryReference {
        ObservatoryReference::new(id, prefix)
    }

    fn address(raw: &str) -> NormalizedAddress {
        AddressNormalizer::new().normalize(raw)
    }

    #[test]
    fn test_build_and_lookup() -> Result<(), ConfigurationError> {
        let index = ObservatoryIndex::build(vec![
            reference("東京", "東京都"),
            reference("渋谷", "東京都渋谷区").with_display_name("渋谷観測所"),
            reference("東京", "東京都千代田区"),
        ])?;
        assert_eq!(index.len(), 3);
        assert_eq!(index.observatory_count(), 2);
        assert_eq!(index.display_name("渋谷"), Some("渋谷観測所"));
        assert_eq!(index.get("東京").map(|r| r.canonical_address_prefix.as_str()), Some("東京都"));
        assert!(index.get("大阪").is_none());

        let found = index.candidates(&address("東京都渋谷区道玄坂1-2-3"));
        let ids: Vec<&str> = found.iter().map(|c| c.observatory_id().as_str()).collect();
        assert_eq!(ids, vec!["東京", "渋谷"]);
        Ok(())
    }

    #[test]
    fn test_prefixes_are_normalized() -> Result<(), ConfigurationError> {
        let index = ObservatoryIndex::build(vec![reference("渋谷", "東京都澁谷區")])?;
        assert_eq!(index.entries()[0].prefix.as_str(), "東京都渋谷区");
        assert_eq!(index.candidates(&address("東京都渋谷区宇田川町")).len(), 1);
        Ok(())
    }

    #[test]
    fn test_containment_and_prefix_modes() -> Result<(), ConfigurationError> {
        let refs = vec![reference("渋谷", "渋谷区")];
        let contained = ObservatoryIndex::build(refs.clone())?;
        let prefix_only = ObservatoryIndex::build_with_mode(refs, MatchMode::Prefix)?;

        let target = address("東京都渋谷区道玄坂1-2-3");
        let found = contained.candidates(&target);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].start, 3);
        assert_eq!(found[0].end(), 6);
        assert!(prefix_only.candidates(&target).is_empty());
        assert_eq!(prefix_only.candidates(&address("渋谷区道玄坂")).len(), 1);
        Ok(())
    }

    #[test]
    fn test_duplicate_reference_is_rejected() {
        let err = ObservatoryIndex::build(vec![
            reference("東京", "東京都"),
            reference("東京", "東京都　"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateReference { .. }));
    }

    #[test]
    fn test_same_prefix_for_different_observatories_is_allowed() {
        let index = ObservatoryIndex::build(vec![
            reference("東京", "東京都"),
            reference("練馬", "東京都"),
        ])
        .unwrap();
        assert_eq!(index.candidates(&address("東京都")).len(), 2);
    }

    #[test]
    fn test_empty_prefix_is_rejected() {
        let err = ObservatoryIndex::build(vec![reference("東京", " ！ ")]).unwrap_err();
        assert!(matches!(err, ConfigurationError::EmptyReferencePrefix { .. }));
    }

    #[test]
    fn test_empty_address_has_no_candidates() {
        let index = ObservatoryIndex::build(vec![reference("東京", "東京都")]).unwrap();
        assert!(index.candidates(&address("")).is_empty());
    }
}
