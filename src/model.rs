use crate::ledger::DiscoveryLedger;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Storage key of the grove record; the file store uses it as the file stem.
pub const SAVE_KEY: &str = "isoFarm_v1";

pub const DEFAULT_GRID_OFFSET_Y: f64 = 250.0;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tile {
    pub ix: i32,
    pub iy: i32,
}

impl Tile {
    pub const fn new(ix: i32, iy: i32) -> Self {
        Self { ix, iy }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Plant {
    pub ix: i32,
    pub iy: i32,
    #[serde(rename = "type")]
    pub species: String,
    pub planted_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupied_tiles: Option<Vec<Tile>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_multi_tile: Option<bool>,
    /// Set the first time this plant is observed mature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matured_at: Option<i64>,
}

impl Plant {
    pub fn anchor(&self) -> Tile {
        Tile::new(self.ix, self.iy)
    }

    /// Every tile the plant covers. Single-tile plants written without an
    /// explicit tile list cover just their anchor.
    pub fn occupied(&self) -> Vec<Tile> {
        match &self.occupied_tiles {
            Some(tiles) if !tiles.is_empty() => {
                let mut out = tiles.clone();
                if !out.contains(&self.anchor()) {
                    out.push(self.anchor());
                }
                out
            }
            _ => vec![self.anchor()],
        }
    }

    pub fn covers(&self, tile: Tile) -> bool {
        self.anchor() == tile
            || self
                .occupied_tiles
                .as_ref()
                .is_some_and(|tiles| tiles.contains(&tile))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BoardSettings {
    pub grid_offset_y: f64,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            grid_offset_y: DEFAULT_GRID_OFFSET_Y,
        }
    }
}

/// The single persisted snapshot shared by the farm, the dex viewer and the
/// race reward producer.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaveRecord {
    pub inventory: BTreeMap<String, u32>,
    pub plants: Vec<Plant>,
    pub settings: BoardSettings,
    #[serde(flatten)]
    pub ledger: DiscoveryLedger,
}

impl SaveRecord {
    /// Fresh record with a zero count for every given species.
    pub fn with_zero_inventory<'a>(species: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            inventory: species.into_iter().map(|id| (id.to_string(), 0)).collect(),
            ..Self::default()
        }
    }

    pub fn count(&self, species: &str) -> u32 {
        self.inventory.get(species).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plant_wire_shape_matches_the_browser_record() {
        let p = Plant {
            ix: 2,
            iy: 3,
            species: "yggdrasil_seed".to_string(),
            planted_at: 1_700_000_000_000,
            occupied_tiles: Some(vec![Tile::new(2, 3), Tile::new(3, 3)]),
            is_multi_tile: Some(true),
            matured_at: None,
        };
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["type"], "yggdrasil_seed");
        assert_eq!(v["plantedAt"], 1_700_000_000_000_i64);
        assert_eq!(v["occupiedTiles"][1]["ix"], 3);
        assert_eq!(v["isMultiTile"], true);
        assert!(v.get("maturedAt").is_none());
    }

    #[test]
    fn single_tile_plant_without_list_covers_anchor_only() {
        let p: Plant =
            serde_json::from_str(r#"{"ix":4,"iy":5,"type":"oak_seed","plantedAt":10}"#).unwrap();
        assert_eq!(p.occupied(), vec![Tile::new(4, 5)]);
        assert!(p.covers(Tile::new(4, 5)));
        assert!(!p.covers(Tile::new(5, 5)));
    }
}
