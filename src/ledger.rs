use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Species that have reached maturity. Entries are sticky once some plant
/// has been confirmed mature; an entry with no confirmations can be retracted.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryLedger {
    #[serde(default)]
    pub discovered_trees: Vec<String>,
    /// Plants confirmed mature per species. Absent in records written before
    /// evidence was tracked.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub discovery_counts: BTreeMap<String, u32>,
}

impl DiscoveryLedger {
    pub fn contains(&self, species: &str) -> bool {
        self.discovered_trees.iter().any(|s| s == species)
    }

    pub fn confirmations(&self, species: &str) -> u32 {
        self.discovery_counts.get(species).copied().unwrap_or(0)
    }

    /// Records one more plant of `species` observed mature. Returns true if
    /// the species was not discovered before.
    pub fn confirm(&mut self, species: &str) -> bool {
        *self
            .discovery_counts
            .entry(species.to_string())
            .or_insert(0) += 1;
        if self.contains(species) {
            return false;
        }
        self.discovered_trees.push(species.to_string());
        true
    }

    /// Drops `species` unless some plant has confirmed it. Returns true if an
    /// entry was removed.
    pub fn retract(&mut self, species: &str) -> bool {
        if self.confirmations(species) > 0 {
            return false;
        }
        let before = self.discovered_trees.len();
        self.discovered_trees.retain(|s| s != species);
        self.discovered_trees.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.discovered_trees.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.discovered_trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.discovered_trees.is_empty()
    }
}
