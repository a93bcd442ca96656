use crate::model::{Plant, Tile};
use crate::registry::Footprint;

pub const DEFAULT_COLS: i32 = 10;
pub const DEFAULT_ROWS: i32 = 10;
/// Largest side length the settings file may ask for.
pub const MAX_SIDE: i32 = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridBounds {
    pub cols: i32,
    pub rows: i32,
}

impl Default for GridBounds {
    fn default() -> Self {
        Self {
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
        }
    }
}

impl GridBounds {
    pub fn new(cols: i32, rows: i32) -> Self {
        Self {
            cols: cols.max(1),
            rows: rows.max(1),
        }
    }

    pub fn contains(&self, t: Tile) -> bool {
        (0..self.cols).contains(&t.ix) && (0..self.rows).contains(&t.iy)
    }
}

/// Tiles covered by `footprint` anchored at `anchor`, anchor first. Tiles
/// saturate at the edge of the `i32` range instead of wrapping.
pub fn footprint_tiles(anchor: Tile, footprint: Footprint) -> Vec<Tile> {
    let w = footprint.width();
    let mut out = Vec::with_capacity((w * w) as usize);
    for dy in 0..w {
        for dx in 0..w {
            out.push(Tile::new(anchor.ix.saturating_add(dx), anchor.iy.saturating_add(dy)));
        }
    }
    out
}

pub fn fits(anchor: Tile, footprint: Footprint, bounds: GridBounds) -> bool {
    if !bounds.contains(anchor) {
        return false;
    }
    footprint_tiles(anchor, footprint)
        .into_iter()
        .all(|t| bounds.contains(t))
}

/// True if any tile in `tiles` is covered by an existing plant. Linear scan;
/// the grid is small.
pub fn is_occupied(plants: &[Plant], tiles: &[Tile]) -> bool {
    tiles
        .iter()
        .any(|&t| plants.iter().any(|p| p.covers(t)))
}

/// Index of the plant covering `tile`. An exact anchor match wins over a
/// multi-tile plant that merely covers the tile.
pub fn plant_index_at(plants: &[Plant], tile: Tile) -> Option<usize> {
    plants
        .iter()
        .position(|p| p.anchor() == tile)
        .or_else(|| plants.iter().position(|p| p.covers(tile)))
}
