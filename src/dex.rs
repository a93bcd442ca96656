//! Read-only TreeDex view over the grove record. It recomputes maturity from
//! the shared registry durations and never writes anything back.

use crate::model::SaveRecord;
use crate::registry::{Rarity, Registry};

#[derive(Clone, Debug, PartialEq)]
pub struct DexEntry {
    pub number: u32,
    pub species: String,
    pub tree_name: String,
    pub rarity: Rarity,
    pub sprout_sprite: String,
    pub tree_sprite: String,
    /// A planted instance is mature right now.
    pub collected: bool,
    /// The species is in the discovery ledger.
    pub discovered: bool,
}

pub fn is_collected(registry: &Registry, record: &SaveRecord, species: &str, now: i64) -> bool {
    record
        .plants
        .iter()
        .filter(|p| p.species == species)
        .any(|p| registry.stage_of(p, now).is_mature())
}

pub fn entries(registry: &Registry, record: &SaveRecord, now: i64) -> Vec<DexEntry> {
    registry
        .dex_order()
        .into_iter()
        .filter_map(|sp| {
            let number = sp.dex_number?;
            let tree_name = sp
                .display_name
                .strip_suffix(" Seed")
                .unwrap_or(&sp.display_name)
                .to_string();
            Some(DexEntry {
                number,
                species: sp.id.clone(),
                tree_name: format!("{number:02} {tree_name}"),
                rarity: sp.rarity,
                sprout_sprite: sp.sprites.plant.clone(),
                tree_sprite: sp.sprites.mature.clone(),
                collected: is_collected(registry, record, &sp.id, now),
                discovered: record.ledger.contains(&sp.id),
            })
        })
        .collect()
}

/// (collected, total) over the numbered species.
pub fn progress(entries: &[DexEntry]) -> (usize, usize) {
    (entries.iter().filter(|e| e.collected).count(), entries.len())
}
