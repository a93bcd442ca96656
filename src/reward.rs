//! The typing race awards seeds by writing straight into the grove record.
//! It only ever bumps one inventory count and leaves everything else alone.

use crate::registry::{Rarity, Registry, Species};
use crate::storage::{self, SaveStore};
use anyhow::Result;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{Map, Value};
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Intermediate,
    Hard,
    Impossible,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Intermediate,
        Difficulty::Hard,
        Difficulty::Impossible,
    ];

    pub fn tier(self) -> Rarity {
        match self {
            Difficulty::Easy => Rarity::Common,
            Difficulty::Intermediate => Rarity::Rare,
            Difficulty::Hard => Rarity::Goated,
            Difficulty::Impossible => Rarity::Hidden,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Hard => "hard",
            Difficulty::Impossible => "impossible",
        }
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|d| *d == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

/// Uniform pick among the species of the difficulty's tier.
pub fn pick_seed<'a, R: Rng + ?Sized>(
    registry: &'a Registry,
    difficulty: Difficulty,
    rng: &mut R,
) -> Option<&'a Species> {
    registry.of_rarity(difficulty.tier()).choose(rng).copied()
}

/// Adds one `species` seed to the shared record.
pub fn grant_seed<S: SaveStore + ?Sized>(store: &mut S, species: &str) -> Result<()> {
    storage::modify_raw(store, |obj| {
        let inv = obj
            .entry("inventory")
            .or_insert_with(|| Value::Object(Map::new()));
        if !inv.is_object() {
            *inv = Value::Object(Map::new());
        }
        if let Value::Object(inv) = inv {
            let n = inv.get(species).and_then(Value::as_u64).unwrap_or(0);
            inv.insert(species.to_string(), Value::from(n + 1));
        }
    })?;
    info!(species, "race reward granted");
    Ok(())
}

/// Picks a seed for a won race and grants it. Returns the species id.
pub fn award_win<S, R>(
    store: &mut S,
    registry: &Registry,
    difficulty: Difficulty,
    rng: &mut R,
) -> Result<Option<String>>
where
    S: SaveStore + ?Sized,
    R: Rng + ?Sized,
{
    let Some(species) = pick_seed(registry, difficulty, rng) else {
        return Ok(None);
    };
    grant_seed(store, &species.id)?;
    Ok(Some(species.id.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SaveRecord;
    use crate::storage::MemoryStore;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn picks_stay_inside_the_tier() {
        let reg = Registry::builtin();
        let mut rng = StdRng::seed_from_u64(7);
        for d in Difficulty::ALL {
            for _ in 0..20 {
                let sp = pick_seed(&reg, d, &mut rng).unwrap();
                assert_eq!(sp.rarity, d.tier());
            }
        }
        assert_eq!(
            pick_seed(&reg, Difficulty::Impossible, &mut rng).map(|s| s.id.as_str()),
            Some("yggdrasil_seed")
        );
    }

    #[test]
    fn grant_only_touches_one_count() {
        let mut store = MemoryStore::with_contents(
            r#"{"inventory":{"oak_seed":2},"plants":[{"ix":1,"iy":1,"type":"oak_seed","plantedAt":3}],
                "settings":{"gridOffsetY":250},"discoveredTrees":["oak_seed"]}"#,
        );
        let before = storage::load(&store, SaveRecord::default());
        grant_seed(&mut store, "oak_seed").unwrap();
        grant_seed(&mut store, "ginkgo_seed").unwrap();
        let after = storage::load(&store, SaveRecord::default());
        assert_eq!(after.count("oak_seed"), 3);
        assert_eq!(after.count("ginkgo_seed"), 1);
        assert_eq!(after.plants, before.plants);
        assert_eq!(after.ledger, before.ledger);
    }

    #[test]
    fn grant_into_an_empty_slot_creates_the_inventory() {
        let mut store = MemoryStore::new();
        grant_seed(&mut store, "acacia_seed").unwrap();
        let rec = storage::load(&store, SaveRecord::default());
        assert_eq!(rec.count("acacia_seed"), 1);
    }

    #[test]
    fn award_win_reports_the_granted_species() {
        let reg = Registry::builtin();
        let mut store = MemoryStore::new();
        let mut rng = StdRng::seed_from_u64(1);
        let got = award_win(&mut store, &reg, Difficulty::Hard, &mut rng)
            .unwrap()
            .unwrap();
        let rec = storage::load(&store, SaveRecord::default());
        assert_eq!(rec.count(&got), 1);
        assert_eq!(reg.get(&got).unwrap().rarity, Rarity::Goated);
    }

    #[test]
    fn difficulties_cycle() {
        assert_eq!(Difficulty::Easy.next(), Difficulty::Intermediate);
        assert_eq!(Difficulty::Impossible.next(), Difficulty::Easy);
    }
}
