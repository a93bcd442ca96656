use crate::model::Tile;

/// Why a placement did nothing. No state changes on any of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementRejected {
    #[error("no {0} left in the inventory")]
    InsufficientInventory(String),

    #[error("{0} is not a registered species")]
    UnknownSpecies(String),

    #[error("footprint anchored at ({}, {}) leaves the grid", .0.ix, .0.iy)]
    OutOfBounds(Tile),

    #[error("a tile under ({}, {}) is already planted", .0.ix, .0.iy)]
    Occupied(Tile),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemovalRejected {
    #[error("nothing is planted at ({}, {})", .0.ix, .0.iy)]
    Empty(Tile),
}
