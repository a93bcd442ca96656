use crate::config::atomic_rename;
use crate::model::{BoardSettings, Plant, SaveRecord, SAVE_KEY};
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::{
    cell::RefCell,
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};
use tracing::{debug, error, warn};

/// A single-slot key-value store holding the serialized grove record.
pub trait SaveStore {
    fn read(&self) -> Result<Option<String>>;
    fn write(&mut self, data: &str) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

/// JSON file named after the save key, replaced atomically on every write.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{SAVE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SaveStore for FileStore {
    fn read(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let s = fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        Ok(Some(s))
    }

    fn write(&mut self, data: &str) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).ok();
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;
        atomic_rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .with_context(|| format!("removing {}", self.path.display()))?;
        }
        Ok(())
    }
}

/// In-memory slot. Clones share the slot, so several producers can write to
/// one record the way browser pages share local storage.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    slot: Rc<RefCell<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(data: &str) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Some(data.to_string()))),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.slot.borrow().clone()
    }
}

impl SaveStore for MemoryStore {
    fn read(&self) -> Result<Option<String>> {
        Ok(self.slot.borrow().clone())
    }

    fn write(&mut self, data: &str) -> Result<()> {
        *self.slot.borrow_mut() = Some(data.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        *self.slot.borrow_mut() = None;
        Ok(())
    }
}

/// Reads the record, or `None` when the slot is empty or unreadable.
/// Individual malformed fields fall back to their defaults.
pub fn try_load<S: SaveStore + ?Sized>(store: &S) -> Option<SaveRecord> {
    let raw = match store.read() {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!("save slot unreadable: {e:#}");
            return None;
        }
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(obj)) => Some(decode_record(&obj)),
        Ok(_) => {
            warn!("save record is not an object; ignoring it");
            None
        }
        Err(e) => {
            warn!("save record is not valid JSON: {e}");
            None
        }
    }
}

/// Never fails: a missing or corrupted record yields `fallback`.
pub fn load<S: SaveStore + ?Sized>(store: &S, fallback: SaveRecord) -> SaveRecord {
    try_load(store).unwrap_or_else(|| {
        debug!("starting from an empty save");
        fallback
    })
}

/// Writes the full snapshot, last write wins. Failures are logged and
/// reported as `false`.
pub fn save<S: SaveStore + ?Sized>(store: &mut S, record: &SaveRecord) -> bool {
    let data = match serde_json::to_string_pretty(record) {
        Ok(d) => d,
        Err(e) => {
            error!("could not serialize save record: {e}");
            return false;
        }
    };
    match store.write(&data) {
        Ok(()) => true,
        Err(e) => {
            error!("could not write save record: {e:#}");
            false
        }
    }
}

/// Read-modify-write on the raw JSON object, keeping fields this crate does
/// not know about. Used by producers that only own a slice of the record.
pub fn modify_raw<S, F>(store: &mut S, edit: F) -> Result<()>
where
    S: SaveStore + ?Sized,
    F: FnOnce(&mut Map<String, Value>),
{
    let mut obj = match store.read()? {
        Some(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(obj)) => obj,
            _ => {
                warn!("replacing unreadable save record");
                Map::new()
            }
        },
        None => Map::new(),
    };
    edit(&mut obj);
    let data = serde_json::to_string_pretty(&Value::Object(obj))?;
    store.write(&data)
}

fn decode_record(obj: &Map<String, Value>) -> SaveRecord {
    let mut rec = SaveRecord::default();

    if let Some(Value::Object(inv)) = obj.get("inventory") {
        rec.inventory = decode_inventory(inv);
    }

    if let Some(Value::Array(items)) = obj.get("plants") {
        rec.plants = items
            .iter()
            .filter_map(|item| match serde_json::from_value::<Plant>(item.clone()) {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!("dropping malformed plant entry: {e}");
                    None
                }
            })
            .collect();
    }

    if let Some(y) = obj
        .get("settings")
        .and_then(|s| s.get("gridOffsetY"))
        .and_then(Value::as_f64)
    {
        rec.settings = BoardSettings { grid_offset_y: y };
    }

    if let Some(trees) = obj.get("discoveredTrees") {
        match serde_json::from_value::<Vec<String>>(trees.clone()) {
            Ok(t) => rec.ledger.discovered_trees = t,
            Err(e) => warn!("discoveredTrees unreadable, starting empty: {e}"),
        }
    }
    if let Some(counts) = obj.get("discoveryCounts") {
        match serde_json::from_value::<BTreeMap<String, u32>>(counts.clone()) {
            Ok(c) => rec.ledger.discovery_counts = c,
            Err(e) => warn!("discoveryCounts unreadable, dropping them: {e}"),
        }
    }

    rec
}

fn decode_inventory(inv: &Map<String, Value>) -> BTreeMap<String, u32> {
    inv.iter()
        .map(|(k, v)| {
            let n = v
                .as_u64()
                .or_else(|| v.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .unwrap_or(0);
            (k.clone(), u32::try_from(n).unwrap_or(u32::MAX))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Tile;

    fn sample() -> SaveRecord {
        let mut rec = SaveRecord::with_zero_inventory(["oak_seed", "yggdrasil_seed"]);
        rec.inventory.insert("oak_seed".to_string(), 3);
        rec.plants.push(Plant {
            ix: 1,
            iy: 2,
            species: "yggdrasil_seed".to_string(),
            planted_at: 1_700_000_000_123,
            occupied_tiles: Some(vec![
                Tile::new(1, 2),
                Tile::new(2, 2),
                Tile::new(1, 3),
                Tile::new(2, 3),
            ]),
            is_multi_tile: Some(true),
            matured_at: Some(1_700_000_010_123),
        });
        rec.plants.push(Plant {
            ix: 7,
            iy: 0,
            species: "oak_seed".to_string(),
            planted_at: 1_700_000_000_500,
            occupied_tiles: None,
            is_multi_tile: None,
            matured_at: None,
        });
        rec.settings.grid_offset_y = 312.75;
        rec.ledger.confirm("yggdrasil_seed");
        rec
    }

    #[test]
    fn save_then_load_round_trips() {
        let mut store = MemoryStore::new();
        let rec = sample();
        assert!(save(&mut store, &rec));
        assert_eq!(load(&store, SaveRecord::default()), rec);
    }

    #[test]
    fn empty_or_garbage_slots_fall_back() {
        let fallback = SaveRecord::with_zero_inventory(["oak_seed"]);
        assert_eq!(load(&MemoryStore::new(), fallback.clone()), fallback);
        assert_eq!(
            load(&MemoryStore::with_contents("{not json"), fallback.clone()),
            fallback
        );
        assert_eq!(
            load(&MemoryStore::with_contents("[1,2,3]"), fallback.clone()),
            fallback
        );
    }

    #[test]
    fn browser_record_without_counts_loads() {
        let raw = r#"{
            "inventory": {"oak_seed": 2, "pine_seed": 0, "spruce_seed": 1},
            "plants": [{"ix": 0, "iy": 0, "type": "oak_seed", "plantedAt": 5}],
            "settings": {"gridOffsetY": 250},
            "discoveredTrees": ["oak_seed"]
        }"#;
        let rec = load(&MemoryStore::with_contents(raw), SaveRecord::default());
        assert_eq!(rec.count("oak_seed"), 2);
        assert_eq!(rec.count("spruce_seed"), 1);
        assert_eq!(rec.plants.len(), 1);
        assert_eq!(rec.settings.grid_offset_y, 250.0);
        assert!(rec.ledger.contains("oak_seed"));
        assert_eq!(rec.ledger.confirmations("oak_seed"), 0);
    }

    #[test]
    fn malformed_fields_are_recovered_one_by_one() {
        let raw = r#"{
            "inventory": {"oak_seed": -4, "birch_seed": 1},
            "plants": [{"ix": "nope"}, {"ix": 3, "iy": 3, "type": "birch_seed", "plantedAt": 9}],
            "settings": {"gridOffsetY": "high"},
            "discoveredTrees": "oak_seed"
        }"#;
        let rec = load(&MemoryStore::with_contents(raw), SaveRecord::default());
        assert_eq!(rec.count("oak_seed"), 0);
        assert_eq!(rec.count("birch_seed"), 1);
        assert_eq!(rec.plants.len(), 1);
        assert_eq!(rec.plants[0].species, "birch_seed");
        assert_eq!(rec.settings, BoardSettings::default());
        assert!(rec.ledger.is_empty());
    }

    #[test]
    fn bad_counts_do_not_cost_the_discovered_list() {
        let raw = r#"{
            "inventory": {},
            "discoveredTrees": ["oak_seed", "birch_seed"],
            "discoveryCounts": {"oak_seed": "lots"}
        }"#;
        let rec = load(&MemoryStore::with_contents(raw), SaveRecord::default());
        assert!(rec.ledger.contains("oak_seed"));
        assert!(rec.ledger.contains("birch_seed"));
        assert_eq!(rec.ledger.confirmations("oak_seed"), 0);
    }

    #[test]
    fn modify_raw_keeps_unknown_fields() {
        let mut store = MemoryStore::with_contents(r#"{"inventory":{"oak_seed":1},"extra":42}"#);
        modify_raw(&mut store, |obj| {
            obj.insert("touched".to_string(), Value::Bool(true));
        })
        .unwrap();
        let v: Value = serde_json::from_str(&store.contents().unwrap()).unwrap();
        assert_eq!(v["extra"], 42);
        assert_eq!(v["touched"], true);
        assert_eq!(v["inventory"]["oak_seed"], 1);
    }

    #[test]
    fn file_store_writes_under_the_save_key() {
        let dir = std::env::temp_dir().join(format!(
            "isogrove-store-{}-{}",
            std::process::id(),
            crate::stage::now_ms()
        ));
        let mut store = FileStore::in_dir(&dir);
        assert!(store.path().ends_with("isoFarm_v1.json"));
        assert_eq!(store.read().unwrap(), None);

        let rec = sample();
        assert!(save(&mut store, &rec));
        assert_eq!(load(&store, SaveRecord::default()), rec);

        store.clear().unwrap();
        assert_eq!(store.read().unwrap(), None);
        fs::remove_dir_all(&dir).ok();
    }
}
