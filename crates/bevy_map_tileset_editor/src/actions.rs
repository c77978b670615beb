//! Requests the tileset view hands to its host

use bevy::ecs::message::Message;
use bevy_map_tileset::{TileId, WangId};

/// Something the view wants the surrounding editor to do or know.
///
/// Collected by [`crate::view::TilesetView`] and drained with
/// [`crate::view::TilesetView::take_actions`]. The plugin forwards them as
/// messages.
#[derive(Message, Debug, Clone, PartialEq)]
pub enum TilesetViewAction {
    /// Swap two tiles in the map (map editor context menu)
    SwapTiles(TileId, TileId),
    /// Open the properties of a tile (tileset editor context menu)
    EditTileProperties(TileId),
    /// Use a tile as the image of the active Wang set
    WangSetImageSelected(TileId),
    /// Use a tile as the image of a Wang color (1-based)
    WangColorImageSelected { tile: TileId, color: u8 },
    /// The WangId painted in whole-id mode was rotated or flipped
    CurrentWangIdChanged(WangId),
    /// A WangId became used or unused in the active Wang set
    WangIdUsedChanged(WangId),
    /// The grid was toggled from the context menu
    ShowGridChanged(bool),
    /// The tile under the current cell changed
    CurrentTileChanged(Option<TileId>),
}

impl TilesetViewAction {
    /// Short label for logging
    pub fn name(&self) -> &'static str {
        match self {
            TilesetViewAction::SwapTiles(..) => "Swap Tiles",
            TilesetViewAction::EditTileProperties(_) => "Tile Properties",
            TilesetViewAction::WangSetImageSelected(_) => "Terrain Set Image",
            TilesetViewAction::WangColorImageSelected { .. } => "Terrain Image",
            TilesetViewAction::CurrentWangIdChanged(_) => "Current WangId",
            TilesetViewAction::WangIdUsedChanged(_) => "WangId Used",
            TilesetViewAction::ShowGridChanged(_) => "Show Grid",
            TilesetViewAction::CurrentTileChanged(_) => "Current Tile",
        }
    }
}
