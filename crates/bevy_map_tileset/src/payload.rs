//! Drag-and-drop payload carrying an ordered list of tile ids

use crate::tileset::TileId;

/// MIME type of a tile list payload
pub const TILES_MIME_TYPE: &str = "application/vnd.bevy-map.tile-list";

/// What a drop should do with the dragged tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropAction {
    Move,
    Copy,
}

/// Encoded drag data: a format tag plus big-endian `i32` tile ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileDragPayload {
    pub format: String,
    pub data: Vec<u8>,
}

impl TileDragPayload {
    /// Encode tile ids in order
    pub fn from_ids(ids: &[TileId]) -> Self {
        let mut data = Vec::with_capacity(ids.len() * 4);
        for id in ids {
            data.extend_from_slice(&id.0.to_be_bytes());
        }
        Self {
            format: TILES_MIME_TYPE.to_string(),
            data,
        }
    }

    pub fn has_tile_list(&self) -> bool {
        self.format == TILES_MIME_TYPE
    }

    /// Decode the ids. `None` for a foreign format or truncated data.
    pub fn tile_ids(&self) -> Option<Vec<TileId>> {
        if !self.has_tile_list() || self.data.len() % 4 != 0 {
            return None;
        }
        Some(
            self.data
                .chunks_exact(4)
                .map(|chunk| TileId(i32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])))
                .collect(),
        )
    }
}
