use crate::error::{PlacementRejected, RemovalRejected};
use crate::grid::{self, GridBounds};
use crate::model::{BoardSettings, Plant, SaveRecord, Tile};
use crate::registry::Registry;
use crate::stage::Stage;
use crate::storage::{self, SaveStore};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Outcome of a successful removal.
#[derive(Clone, Debug, PartialEq)]
pub struct Removal {
    pub plant: Plant,
    /// Stage at the moment of removal.
    pub stage: Stage,
    /// True if the species was dropped from the discovery ledger.
    pub retracted: bool,
}

/// Hover-panel view of one plant.
#[derive(Clone, Debug, PartialEq)]
pub struct PlantInfo {
    pub anchor: Tile,
    pub species: String,
    pub display_name: String,
    pub stage: Stage,
    pub remaining_ms: i64,
    pub multi_tile: bool,
}

/// Owns the grove state and is the only thing that mutates it. Every
/// mutation is written through to the store before returning.
pub struct Farm<S: SaveStore> {
    registry: Registry,
    bounds: GridBounds,
    store: S,
    record: SaveRecord,
    // Inventory as of our last load or write. Anything above this on disk
    // was added by another producer.
    synced_inventory: BTreeMap<String, u32>,
}

impl<S: SaveStore> Farm<S> {
    /// Loads the record from `store`, or starts a fresh one with a zero count
    /// for every registered species.
    pub fn open(registry: Registry, bounds: GridBounds, store: S) -> Self {
        let existing = storage::try_load(&store);
        let fresh = existing.is_none();
        let record = existing.unwrap_or_else(|| SaveRecord::with_zero_inventory(registry.ids()));
        let mut farm = Self {
            registry,
            bounds,
            store,
            synced_inventory: record.inventory.clone(),
            record,
        };
        info!(
            plants = farm.record.plants.len(),
            discovered = farm.record.ledger.len(),
            "grove loaded"
        );
        if fresh {
            farm.persist();
        }
        farm
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    pub fn record(&self) -> &SaveRecord {
        &self.record
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn plants(&self) -> &[Plant] {
        &self.record.plants
    }

    pub fn count(&self, species: &str) -> u32 {
        self.record.count(species)
    }

    pub fn is_discovered(&self, species: &str) -> bool {
        self.record.ledger.contains(species)
    }

    pub fn plant_index_at(&self, tile: Tile) -> Option<usize> {
        grid::plant_index_at(&self.record.plants, tile)
    }

    pub fn is_tile_occupied(&self, tile: Tile) -> bool {
        grid::is_occupied(&self.record.plants, &[tile])
    }

    /// Plants one seed of `species` anchored at `anchor`. Checks run before
    /// anything is touched, so a rejection leaves the state and the store as
    /// they were.
    pub fn place(&mut self, species: &str, anchor: Tile, now: i64) -> Result<(), PlacementRejected> {
        if self.count(species) == 0 {
            return Err(PlacementRejected::InsufficientInventory(species.to_string()));
        }
        let footprint = match self.registry.get(species) {
            Some(sp) => sp.footprint,
            None => return Err(PlacementRejected::UnknownSpecies(species.to_string())),
        };
        if !grid::fits(anchor, footprint, self.bounds) {
            return Err(PlacementRejected::OutOfBounds(anchor));
        }
        let tiles = grid::footprint_tiles(anchor, footprint);
        if grid::is_occupied(&self.record.plants, &tiles) {
            return Err(PlacementRejected::Occupied(anchor));
        }

        if let Some(n) = self.record.inventory.get_mut(species) {
            *n = n.saturating_sub(1);
        }
        let multi = footprint.is_multi_tile();
        self.record.plants.push(Plant {
            ix: anchor.ix,
            iy: anchor.iy,
            species: species.to_string(),
            planted_at: now,
            occupied_tiles: multi.then_some(tiles),
            is_multi_tile: multi.then_some(true),
            matured_at: None,
        });
        info!(species, ix = anchor.ix, iy = anchor.iy, "planted");
        self.persist();
        Ok(())
    }

    /// Digs up whatever covers `tile` and returns its seed to the inventory,
    /// whatever its stage.
    pub fn remove_at(&mut self, tile: Tile, now: i64) -> Result<Removal, RemovalRejected> {
        let idx = self
            .plant_index_at(tile)
            .ok_or(RemovalRejected::Empty(tile))?;

        self.note_maturity(idx, now);
        let stage = self.stage_of(idx, now);
        let plant = self.record.plants.remove(idx);
        let species = plant.species.clone();
        let was_mature = plant.matured_at.is_some();

        let n = self.record.inventory.entry(species.clone()).or_insert(0);
        *n = n.saturating_add(1);

        let mut retracted = false;
        if !was_mature {
            let siblings: Vec<usize> = (0..self.record.plants.len())
                .filter(|&i| self.record.plants[i].species == species)
                .collect();
            for i in siblings {
                self.note_maturity(i, now);
            }
            let confirmed_elsewhere = self.record.ledger.confirmations(&species) > 0;
            let other_mature = self
                .record
                .plants
                .iter()
                .any(|p| p.species == species && p.matured_at.is_some());
            if !confirmed_elsewhere && !other_mature {
                retracted = self.record.ledger.retract(&species);
                if retracted {
                    info!(species = %species, "undiscovered: removed before it matured");
                }
            }
        }

        info!(
            species = %species,
            ix = tile.ix,
            iy = tile.iy,
            stage = stage.label(),
            "removed; seed returned"
        );
        self.persist();
        Ok(Removal {
            plant,
            stage,
            retracted,
        })
    }

    /// Pure stage query for the plant at `index`; `Unknown` for a bad index
    /// or an unregistered species.
    pub fn stage_of(&self, index: usize, now: i64) -> Stage {
        self.record
            .plants
            .get(index)
            .map_or(Stage::Unknown, |p| self.registry.stage_of(p, now))
    }

    pub fn time_to_next_stage(&self, index: usize, now: i64) -> i64 {
        self.record
            .plants
            .get(index)
            .map_or(0, |p| self.registry.time_to_next_stage(p, now))
    }

    /// If the plant at `index` is mature and has not been counted yet, marks
    /// it, confirms its species in the ledger and saves. Returns true when
    /// something changed.
    pub fn record_if_matured(&mut self, index: usize, now: i64) -> bool {
        let changed = self.note_maturity(index, now);
        if changed {
            self.persist();
        }
        changed
    }

    /// Stage query followed by `record_if_matured`.
    pub fn observe_stage(&mut self, index: usize, now: i64) -> Stage {
        self.record_if_matured(index, now);
        self.stage_of(index, now)
    }

    /// Runs `record_if_matured` over every plant with a single save. Returns
    /// how many plants were newly counted.
    pub fn observe_all(&mut self, now: i64) -> usize {
        let mut n = 0;
        for i in 0..self.record.plants.len() {
            if self.note_maturity(i, now) {
                n += 1;
            }
        }
        if n > 0 {
            self.persist();
        }
        n
    }

    pub fn inspect(&mut self, tile: Tile, now: i64) -> Option<PlantInfo> {
        let idx = self.plant_index_at(tile)?;
        let stage = self.observe_stage(idx, now);
        let remaining_ms = self.time_to_next_stage(idx, now);
        let p = &self.record.plants[idx];
        let display_name = self
            .registry
            .get(&p.species)
            .map_or_else(|| p.species.clone(), |sp| sp.display_name.clone());
        Some(PlantInfo {
            anchor: p.anchor(),
            species: p.species.clone(),
            display_name,
            stage,
            remaining_ms,
            multi_tile: p.is_multi_tile.unwrap_or(false),
        })
    }

    pub fn add_seeds(&mut self, species: &str, n: u32) {
        let c = self.record.inventory.entry(species.to_string()).or_insert(0);
        *c = c.saturating_add(n);
        debug!(species, n, "seeds added");
        self.persist();
    }

    /// Never drops below zero.
    pub fn remove_seeds(&mut self, species: &str, n: u32) {
        let c = self.record.inventory.entry(species.to_string()).or_insert(0);
        *c = c.saturating_sub(n);
        debug!(species, n, "seeds removed");
        self.persist();
    }

    pub fn set_grid_offset(&mut self, y: f64) {
        self.record.settings.grid_offset_y = y;
        self.persist();
    }

    /// Wipes the save: zero inventory, no plants, nothing discovered.
    pub fn reset(&mut self) {
        if let Err(e) = self.store.clear() {
            warn!("could not clear save slot: {e:#}");
        }
        self.record = SaveRecord::with_zero_inventory(self.registry.ids());
        self.record.settings = BoardSettings::default();
        info!("save cleared");
        // A reset overwrites whatever the slot still holds; nothing on disk
        // counts as seeds from another producer.
        self.write_through();
    }

    /// Replaces in-memory state with whatever the store holds now.
    pub fn reload(&mut self) {
        if let Some(rec) = storage::try_load(&self.store) {
            self.synced_inventory = rec.inventory.clone();
            self.record = rec;
        }
    }

    fn note_maturity(&mut self, index: usize, now: i64) -> bool {
        let Some(plant) = self.record.plants.get(index) else {
            return false;
        };
        if plant.matured_at.is_some() || !self.registry.stage_of(plant, now).is_mature() {
            return false;
        }
        let matured_at = self.registry.matures_at(plant);
        let species = plant.species.clone();
        self.record.plants[index].matured_at = matured_at;
        if self.record.ledger.confirm(&species) {
            info!(species = %species, "tree discovered");
        }
        true
    }

    // Folds in seeds other producers added since our last sync, then writes.
    fn persist(&mut self) -> bool {
        if let Some(disk) = storage::try_load(&self.store) {
            for (species, &on_disk) in &disk.inventory {
                let seen = self.synced_inventory.get(species).copied().unwrap_or(0);
                if on_disk > seen {
                    let extra = on_disk - seen;
                    let c = self.record.inventory.entry(species.clone()).or_insert(0);
                    *c = c.saturating_add(extra);
                    info!(species = species.as_str(), extra, "merged external seeds");
                }
            }
        }
        self.write_through()
    }

    // Writes the record as is. `synced_inventory` only advances on success.
    fn write_through(&mut self) -> bool {
        let ok = storage::save(&mut self.store, &self.record);
        if ok {
            self.synced_inventory = self.record.inventory.clone();
        }
        ok
    }
}
