//! Isometric tree grove: species registry, growth stages, tile occupancy,
//! discovery bookkeeping and the shared save record.

pub mod config;
pub mod dex;
pub mod error;
pub mod farm;
pub mod grid;
pub mod ledger;
pub mod logging;
pub mod model;
pub mod registry;
pub mod reward;
pub mod stage;
pub mod storage;

pub use error::{PlacementRejected, RemovalRejected};
pub use farm::{Farm, PlantInfo, Removal};
pub use model::{Plant, SaveRecord, Tile};
pub use registry::Registry;
pub use stage::Stage;
