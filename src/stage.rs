use crate::model::Plant;
use crate::registry::{GrowthDurations, Registry};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Growth phase of a plant. `Unknown` is reported for plants whose species is
/// not in the registry and sorts before every real stage.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Unknown,
    Seedling,
    Plant,
    Mature,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Unknown => "unknown",
            Stage::Seedling => "seedling",
            Stage::Plant => "plant",
            Stage::Mature => "mature",
        }
    }

    pub fn is_mature(self) -> bool {
        self == Stage::Mature
    }
}

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Stage after `elapsed_ms`. Boundary instants belong to the later stage.
pub fn stage_after(durations: &GrowthDurations, elapsed_ms: i64) -> Stage {
    if elapsed_ms < durations.seedling_ms {
        Stage::Seedling
    } else if elapsed_ms < durations.total_ms() {
        Stage::Plant
    } else {
        Stage::Mature
    }
}

pub fn remaining_after(durations: &GrowthDurations, elapsed_ms: i64) -> i64 {
    let next = match stage_after(durations, elapsed_ms) {
        Stage::Seedling => durations.seedling_ms,
        Stage::Plant => durations.total_ms(),
        Stage::Mature | Stage::Unknown => return 0,
    };
    next.saturating_sub(elapsed_ms).max(0)
}

impl Registry {
    /// Pure stage query; never touches the discovery ledger.
    pub fn stage_of(&self, plant: &Plant, now: i64) -> Stage {
        match self.get(&plant.species) {
            Some(sp) => stage_after(&sp.durations, now.saturating_sub(plant.planted_at)),
            None => Stage::Unknown,
        }
    }

    /// Milliseconds until the next stage; zero once mature or when the
    /// species is unknown.
    pub fn time_to_next_stage(&self, plant: &Plant, now: i64) -> i64 {
        match self.get(&plant.species) {
            Some(sp) => remaining_after(&sp.durations, now.saturating_sub(plant.planted_at)),
            None => 0,
        }
    }

    /// Instant the plant reaches (or reached) maturity.
    pub fn matures_at(&self, plant: &Plant) -> Option<i64> {
        self.get(&plant.species)
            .map(|sp| plant.planted_at.saturating_add(sp.durations.total_ms()))
    }
}

/// `m:ss`, seconds floored.
pub fn format_remaining(ms: i64) -> String {
    let seconds = ms.max(0) / 1000;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oak(planted_at: i64) -> Plant {
        Plant {
            ix: 0,
            iy: 0,
            species: "oak_seed".to_string(),
            planted_at,
            occupied_tiles: None,
            is_multi_tile: None,
            matured_at: None,
        }
    }

    #[test]
    fn boundaries_belong_to_the_next_stage() {
        let reg = Registry::builtin();
        let p = oak(1_000);
        assert_eq!(reg.stage_of(&p, 1_000 + 4_999), Stage::Seedling);
        assert_eq!(reg.stage_of(&p, 1_000 + 5_000), Stage::Plant);
        assert_eq!(reg.stage_of(&p, 1_000 + 9_999), Stage::Plant);
        assert_eq!(reg.stage_of(&p, 1_000 + 10_000), Stage::Mature);
    }

    #[test]
    fn stage_never_goes_backwards() {
        let reg = Registry::builtin();
        let p = oak(0);
        let mut prev = reg.stage_of(&p, -500);
        for t in (-500..15_000).step_by(250) {
            let s = reg.stage_of(&p, t);
            assert!(s >= prev, "stage regressed at {t}");
            prev = s;
        }
    }

    #[test]
    fn time_to_next_counts_down_and_floors_at_zero() {
        let reg = Registry::builtin();
        let p = oak(0);
        assert_eq!(reg.time_to_next_stage(&p, 0), 5_000);
        assert_eq!(reg.time_to_next_stage(&p, 4_000), 1_000);
        assert_eq!(reg.time_to_next_stage(&p, 5_000), 5_000);
        assert_eq!(reg.time_to_next_stage(&p, 9_999), 1);
        assert_eq!(reg.time_to_next_stage(&p, 10_000), 0);
        assert_eq!(reg.time_to_next_stage(&p, 99_000), 0);
    }

    #[test]
    fn unregistered_species_reads_unknown() {
        let reg = Registry::builtin();
        let mut p = oak(0);
        p.species = "banana_seed".to_string();
        assert_eq!(reg.stage_of(&p, 50_000), Stage::Unknown);
        assert_eq!(reg.time_to_next_stage(&p, 0), 0);
        assert_eq!(reg.matures_at(&p), None);
    }

    #[test]
    fn remaining_is_formatted_as_minutes_and_seconds() {
        assert_eq!(format_remaining(0), "0:00");
        assert_eq!(format_remaining(4_999), "0:04");
        assert_eq!(format_remaining(65_000), "1:05");
        assert_eq!(format_remaining(-10), "0:00");
    }
}
