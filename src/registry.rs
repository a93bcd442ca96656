use std::collections::BTreeMap;

/// Rarity tier a species belongs to. Also decides which race difficulty can
/// award it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rarity {
    Common,
    Rare,
    Goated,
    Hidden,
}

impl Rarity {
    pub fn label(self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Rare => "Rare",
            Rarity::Goated => "Goated",
            Rarity::Hidden => "Hidden",
        }
    }
}

/// Tile shape relative to the anchor. The anchor is always the corner with
/// the smallest `ix` and `iy`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Footprint {
    Single,
    Square2,
}

impl Footprint {
    pub fn width(self) -> i32 {
        match self {
            Footprint::Single => 1,
            Footprint::Square2 => 2,
        }
    }

    pub fn is_multi_tile(self) -> bool {
        self.width() > 1
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sprites {
    pub seed: String,
    pub seedling: String,
    pub plant: String,
    pub mature: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrowthDurations {
    /// Time from planting until the seedling stage ends.
    pub seedling_ms: i64,
    /// Time spent in the plant stage before maturity.
    pub plant_ms: i64,
}

impl GrowthDurations {
    pub fn total_ms(&self) -> i64 {
        self.seedling_ms.saturating_add(self.plant_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Species {
    pub id: String,
    pub display_name: String,
    /// Position in the TreeDex; `None` for legacy species the dex never lists.
    pub dex_number: Option<u32>,
    pub rarity: Rarity,
    pub grows_into: String,
    pub sprites: Sprites,
    pub durations: GrowthDurations,
    pub footprint: Footprint,
}

/// Catalog of plantable species keyed by id. Nothing else in the crate
/// enumerates species by hand, so registering a new one is enough to make it
/// plantable, viewable in the dex and awardable by the race.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    species: BTreeMap<String, Species>,
}

const SEEDLING_MS: i64 = 5_000;
const PLANT_MS: i64 = 5_000;

// (slug, display name, dex number, rarity, seed sprite)
const GROVE: [(&str, &str, u32, Rarity, &str); 16] = [
    ("oak", "Oak", 1, Rarity::Common, "common_seed"),
    ("birch", "Birch", 2, Rarity::Common, "common_seed"),
    ("spruce", "Spruce", 3, Rarity::Common, "common_seed"),
    ("cedar", "Cedar", 4, Rarity::Common, "common_seed"),
    ("willow", "Willow", 5, Rarity::Common, "common_seed"),
    ("maple", "Maple", 6, Rarity::Common, "common_seed"),
    ("acacia", "Acacia", 7, Rarity::Common, "common_seed"),
    ("silkfloss", "Silk Floss", 8, Rarity::Rare, "rare_seed"),
    ("ghostgum", "Ghost Gum", 9, Rarity::Rare, "rare_seed"),
    ("socotradragon", "Socotra Dragon", 10, Rarity::Rare, "rare_seed"),
    ("ginkgo", "Ginkgo", 11, Rarity::Rare, "rare_seed"),
    ("monkeypuzzle", "Monkey Puzzle", 12, Rarity::Rare, "rare_seed"),
    ("rainboweucalyptus", "Rainbow Eucalyptus", 13, Rarity::Goated, "goated_seed"),
    ("baobab", "Baobab", 14, Rarity::Goated, "goated_seed"),
    ("fertility", "Fertility Tree", 15, Rarity::Goated, "goated_seed"),
    ("yggdrasil", "Yggdrasil", 16, Rarity::Hidden, "yggdrasil_seed"),
];

impl Registry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The shipped grove: sixteen dex species plus the legacy pine seed.
    pub fn builtin() -> Self {
        let mut reg = Self::empty();
        for (slug, name, number, rarity, seed_sprite) in GROVE {
            let seed = format!("assets/{seed_sprite}.png");
            reg.register(Species {
                id: format!("{slug}_seed"),
                display_name: format!("{name} Seed"),
                dex_number: Some(number),
                rarity,
                grows_into: format!("{slug}_tree"),
                sprites: Sprites {
                    seed: seed.clone(),
                    seedling: seed,
                    plant: format!("assets/sprout/{number:02}{slug}Sprout.png"),
                    mature: format!("assets/tree/{number:02}{slug}Tree.png"),
                },
                durations: GrowthDurations {
                    seedling_ms: SEEDLING_MS,
                    plant_ms: PLANT_MS,
                },
                footprint: if slug == "yggdrasil" {
                    Footprint::Square2
                } else {
                    Footprint::Single
                },
            });
        }

        // Old saves may still hold pine plants.
        reg.register(Species {
            id: "pine_seed".to_string(),
            display_name: "Pine Seed".to_string(),
            dex_number: None,
            rarity: Rarity::Common,
            grows_into: "pine_tree".to_string(),
            sprites: Sprites {
                seed: "assets/common_seed.png".to_string(),
                seedling: "assets/common_seed.png".to_string(),
                plant: "assets/sprout/01oakSprout.png".to_string(),
                mature: "assets/tree/01oakTree.png".to_string(),
            },
            durations: GrowthDurations {
                seedling_ms: SEEDLING_MS,
                plant_ms: PLANT_MS,
            },
            footprint: Footprint::Single,
        });
        reg
    }

    /// Adds or replaces a species.
    pub fn register(&mut self, species: Species) {
        self.species.insert(species.id.clone(), species);
    }

    pub fn get(&self, id: &str) -> Option<&Species> {
        self.species.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.species.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Species> {
        self.species.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.species.keys().map(String::as_str)
    }

    /// Species in dex order; legacy species are left out.
    pub fn dex_order(&self) -> Vec<&Species> {
        let mut out: Vec<&Species> = self
            .species
            .values()
            .filter(|s| s.dex_number.is_some())
            .collect();
        out.sort_by_key(|s| s.dex_number);
        out
    }

    pub fn of_rarity(&self, rarity: Rarity) -> Vec<&Species> {
        self.dex_order()
            .into_iter()
            .filter(|s| s.rarity == rarity)
            .collect()
    }
}
