//! Wang sets: terrain colors assigned to tile edges and corners
//!
//! Index layout (clockwise from top):
//! ```text
//!   7|0|1
//!   6|X|2
//!   5|4|3
//! ```
//! Even indices are edges, odd indices are corners.

use crate::tileset::TileId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Position of a color within a [`WangId`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum WangIndex {
    Top = 0,
    TopRight = 1,
    Right = 2,
    BottomRight = 3,
    Bottom = 4,
    BottomLeft = 5,
    Left = 6,
    TopLeft = 7,
}

impl WangIndex {
    pub const ALL: [WangIndex; 8] = [
        WangIndex::Top,
        WangIndex::TopRight,
        WangIndex::Right,
        WangIndex::BottomRight,
        WangIndex::Bottom,
        WangIndex::BottomLeft,
        WangIndex::Left,
        WangIndex::TopLeft,
    ];

    pub fn from_index(i: usize) -> Self {
        Self::ALL[i % 8]
    }

    pub fn is_corner(self) -> bool {
        (self as u8) % 2 == 1
    }

    /// Index for a cell of a 3x3 grid over the tile; the center has none
    pub fn by_grid(x: i32, y: i32) -> Option<WangIndex> {
        match (x, y) {
            (0, 0) => Some(WangIndex::TopLeft),
            (1, 0) => Some(WangIndex::Top),
            (2, 0) => Some(WangIndex::TopRight),
            (0, 1) => Some(WangIndex::Left),
            (2, 1) => Some(WangIndex::Right),
            (0, 2) => Some(WangIndex::BottomLeft),
            (1, 2) => Some(WangIndex::Bottom),
            (2, 2) => Some(WangIndex::BottomRight),
            _ => None,
        }
    }

    /// Column and row of this index in the 3x3 grid
    pub fn grid_position(self) -> (i32, i32) {
        match self {
            WangIndex::TopLeft => (0, 0),
            WangIndex::Top => (1, 0),
            WangIndex::TopRight => (2, 0),
            WangIndex::Left => (0, 1),
            WangIndex::Right => (2, 1),
            WangIndex::BottomLeft => (0, 2),
            WangIndex::Bottom => (1, 2),
            WangIndex::BottomRight => (2, 2),
        }
    }
}

/// Terrain colors of a tile's edges and corners. Color 0 means none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WangId {
    pub colors: [u8; 8],
}

impl WangId {
    /// Marker meaning "this index is targeted" while the active color is 0
    pub const INDEX_MASK: u8 = 0xFF;

    pub const EMPTY: WangId = WangId { colors: [0; 8] };

    pub fn new(colors: [u8; 8]) -> Self {
        Self { colors }
    }

    /// All positions set to one color
    pub fn filled(color: u8) -> Self {
        Self { colors: [color; 8] }
    }

    #[inline]
    pub fn index_color(&self, index: WangIndex) -> u8 {
        self.colors[index as usize]
    }

    #[inline]
    pub fn set_index_color(&mut self, index: WangIndex, color: u8) {
        self.colors[index as usize] = color;
    }

    pub fn is_empty(&self) -> bool {
        self.colors.iter().all(|&c| c == 0)
    }

    /// Whether any position uses `color`
    pub fn has_color(&self, color: u8) -> bool {
        self.colors.contains(&color)
    }

    /// Rotate by quarter turns; positive is clockwise
    pub fn rotate(&mut self, rotations: i32) {
        let steps = rotations.rem_euclid(4) as usize * 2;
        let old = self.colors;
        for (i, color) in old.iter().enumerate() {
            self.colors[(i + steps) % 8] = *color;
        }
    }

    /// Mirror across the vertical axis
    pub fn flip_horizontally(&mut self) {
        use WangIndex::*;
        let old = *self;
        self.set_index_color(TopRight, old.index_color(TopLeft));
        self.set_index_color(Right, old.index_color(Left));
        self.set_index_color(BottomRight, old.index_color(BottomLeft));
        self.set_index_color(BottomLeft, old.index_color(BottomRight));
        self.set_index_color(Left, old.index_color(Right));
        self.set_index_color(TopLeft, old.index_color(TopRight));
    }

    /// Mirror across the horizontal axis
    pub fn flip_vertically(&mut self) {
        self.flip_horizontally();
        self.rotate(2);
    }

    /// Only the positions relevant to a set type
    pub fn masked(&self, kind: WangSetType) -> WangId {
        let mut out = *self;
        for index in WangIndex::ALL {
            if !kind.uses_index(index) {
                out.set_index_color(index, 0);
            }
        }
        out
    }
}

/// Which positions a Wang set assigns colors to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WangSetType {
    Edge,
    Corner,
    #[default]
    Mixed,
}

impl WangSetType {
    pub fn uses_index(self, index: WangIndex) -> bool {
        match self {
            WangSetType::Edge => !index.is_corner(),
            WangSetType::Corner => index.is_corner(),
            WangSetType::Mixed => true,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WangSetType::Edge => "Edge",
            WangSetType::Corner => "Corner",
            WangSetType::Mixed => "Mixed",
        }
    }
}

/// A terrain color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WangColor {
    pub name: String,
    pub color: [u8; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_tile: Option<TileId>,
}

impl WangColor {
    pub fn new(name: impl Into<String>, color: [u8; 3]) -> Self {
        Self {
            name: name.into(),
            color,
            image_tile: None,
        }
    }
}

/// A set of terrain colors and their assignment to tiles
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WangSet {
    pub name: String,
    pub kind: WangSetType,
    /// Colors, addressed 1-based by [`WangId`] values
    pub colors: Vec<WangColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_tile: Option<TileId>,
    #[serde(default)]
    tile_wang_ids: HashMap<TileId, WangId>,
}

impl WangSet {
    pub fn new(name: impl Into<String>, kind: WangSetType) -> Self {
        Self {
            name: name.into(),
            kind,
            colors: Vec::new(),
            image_tile: None,
            tile_wang_ids: HashMap::new(),
        }
    }

    pub fn with_color(mut self, color: WangColor) -> Self {
        self.colors.push(color);
        self
    }

    pub fn color_count(&self) -> usize {
        self.colors.len()
    }

    /// Color for a 1-based color index
    pub fn color(&self, index: u8) -> Option<&WangColor> {
        if index == 0 {
            return None;
        }
        self.colors.get(index as usize - 1)
    }

    pub fn color_mut(&mut self, index: u8) -> Option<&mut WangColor> {
        if index == 0 {
            return None;
        }
        self.colors.get_mut(index as usize - 1)
    }

    pub fn wang_id_of_tile(&self, tile: TileId) -> WangId {
        self.tile_wang_ids.get(&tile).copied().unwrap_or_default()
    }

    /// Assign a WangId; empty ids remove the assignment
    pub fn set_wang_id(&mut self, tile: TileId, wang_id: WangId) {
        if wang_id.is_empty() {
            self.tile_wang_ids.remove(&tile);
        } else {
            self.tile_wang_ids.insert(tile, wang_id);
        }
    }

    /// Number of tiles carrying exactly this id
    pub fn tile_count_with(&self, wang_id: WangId) -> usize {
        self.tile_wang_ids.values().filter(|&&w| w == wang_id).count()
    }

    pub fn is_wang_id_used(&self, wang_id: WangId) -> bool {
        self.tile_count_with(wang_id) > 0
    }

    pub fn assigned_tiles(&self) -> impl Iterator<Item = (&TileId, &WangId)> {
        self.tile_wang_ids.iter()
    }

    /// Drop the assignment of a removed tile, returning the old id
    pub(crate) fn forget_tile(&mut self, tile: TileId) -> Option<WangId> {
        self.tile_wang_ids.remove(&tile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_by_grid_center_is_dead_zone() {
        assert_eq!(WangIndex::by_grid(1, 1), None);
        assert_eq!(WangIndex::by_grid(0, 0), Some(WangIndex::TopLeft));
        assert_eq!(WangIndex::by_grid(1, 2), Some(WangIndex::Bottom));
        for index in WangIndex::ALL {
            let (x, y) = index.grid_position();
            assert_eq!(WangIndex::by_grid(x, y), Some(index));
        }
    }

    #[test]
    fn test_rotate_clockwise_and_back() {
        let mut id = WangId::EMPTY;
        id.set_index_color(WangIndex::Top, 1);
        id.set_index_color(WangIndex::TopRight, 2);
        id.rotate(1);
        assert_eq!(id.index_color(WangIndex::Right), 1);
        assert_eq!(id.index_color(WangIndex::BottomRight), 2);
        id.rotate(-1);
        assert_eq!(id.index_color(WangIndex::Top), 1);
        assert_eq!(id.index_color(WangIndex::TopRight), 2);
    }

    #[test]
    fn test_flips() {
        let mut id = WangId::EMPTY;
        id.set_index_color(WangIndex::Left, 3);
        id.set_index_color(WangIndex::TopLeft, 4);
        id.flip_horizontally();
        assert_eq!(id.index_color(WangIndex::Right), 3);
        assert_eq!(id.index_color(WangIndex::TopRight), 4);
        assert_eq!(id.index_color(WangIndex::Left), 0);

        let mut id = WangId::EMPTY;
        id.set_index_color(WangIndex::Top, 5);
        id.set_index_color(WangIndex::TopLeft, 6);
        id.flip_vertically();
        assert_eq!(id.index_color(WangIndex::Bottom), 5);
        assert_eq!(id.index_color(WangIndex::BottomLeft), 6);
        assert_eq!(id.index_color(WangIndex::Top), 0);
    }

    #[test]
    fn test_masking_by_type() {
        let id = WangId::filled(2);
        let edges = id.masked(WangSetType::Edge);
        assert_eq!(edges.index_color(WangIndex::Top), 2);
        assert_eq!(edges.index_color(WangIndex::TopRight), 0);
        let corners = id.masked(WangSetType::Corner);
        assert_eq!(corners.index_color(WangIndex::Top), 0);
        assert_eq!(corners.index_color(WangIndex::BottomLeft), 2);
        assert_eq!(id.masked(WangSetType::Mixed), id);
    }

    #[test]
    fn test_wang_set_usage() {
        let mut set = WangSet::new("Ground", WangSetType::Corner)
            .with_color(WangColor::new("Grass", [60, 160, 60]));
        let id = WangId::filled(1);
        assert!(!set.is_wang_id_used(id));
        set.set_wang_id(TileId(3), id);
        set.set_wang_id(TileId(4), id);
        assert_eq!(set.tile_count_with(id), 2);
        set.set_wang_id(TileId(3), WangId::EMPTY);
        assert_eq!(set.tile_count_with(id), 1);
        assert_eq!(set.wang_id_of_tile(TileId(3)), WangId::EMPTY);
        assert_eq!(set.color(1).map(|c| c.name.as_str()), Some("Grass"));
        assert!(set.color(0).is_none());
    }
}
