//! Undoable tile commands
//!
//! The model, span manager and view never touch tiles directly. They build
//! [`TileCommand`]s (grouped into [`CommandBatch`]es) and hand them to
//! [`crate::TilesetDocument`], which applies them and records the inverse.

use crate::geometry::PixelRect;
use crate::tileset::{Tile, TileId};
use crate::wang::WangId;
use serde::{Deserialize, Serialize};

/// A single mutation of a tileset or its Wang sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TileCommand {
    /// Append tiles to the end of the tile list
    AddTiles(Vec<Tile>),
    /// Insert tiles at list positions, applied in order
    InsertTiles(Vec<(usize, Tile)>),
    /// Remove tiles (and their Wang assignments)
    RemoveTiles(Vec<TileId>),
    /// Change the image rectangles of tiles
    ChangeImageRects(Vec<(TileId, PixelRect)>),
    /// Move tiles, one after another, to a list location
    RelocateTiles { tiles: Vec<TileId>, location: usize },
    /// Restore a complete tile order
    ReorderTiles(Vec<TileId>),
    /// Assign WangIds in one Wang set
    ChangeWangIds {
        wang_set: usize,
        changes: Vec<(TileId, WangId)>,
    },
    /// Terminates a painting stroke of WangId changes
    FinishWangIdChange,
}

impl TileCommand {
    /// Whether consecutive commands of this kind merge into one undo step
    pub fn is_mergeable(&self) -> bool {
        matches!(self, TileCommand::ChangeWangIds { .. })
    }
}

/// Commands applied and undone as one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandBatch {
    pub description: String,
    pub commands: Vec<TileCommand>,
}

impl CommandBatch {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            commands: Vec::new(),
        }
    }

    pub fn single(description: impl Into<String>, command: TileCommand) -> Self {
        Self {
            description: description.into(),
            commands: vec![command],
        }
    }

    pub fn push(&mut self, command: TileCommand) {
        self.commands.push(command);
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// True if every command merges with an open WangId stroke
    pub fn is_mergeable(&self) -> bool {
        !self.commands.is_empty() && self.commands.iter().all(TileCommand::is_mergeable)
    }

    /// True if this batch only closes a WangId stroke
    pub fn is_stroke_end(&self) -> bool {
        !self.commands.is_empty()
            && self
                .commands
                .iter()
                .all(|c| matches!(c, TileCommand::FinishWangIdChange))
    }
}

/// What changed in a document after applying commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentChange {
    TilesAdded(Vec<TileId>),
    TilesRemoved(Vec<TileId>),
    TileImageRectsChanged(Vec<TileId>),
    TilesRelocated,
    WangIdsChanged { wang_set: usize, tiles: Vec<TileId> },
}

/// Errors when applying commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    UnknownTile(TileId),
    DuplicateTile(TileId),
    LocationOutOfRange { location: usize, len: usize },
    InvalidOrder,
    UnknownWangSet(usize),
    NothingToUndo,
    NothingToRedo,
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::UnknownTile(id) => write!(f, "Unknown tile {}", id),
            CommandError::DuplicateTile(id) => write!(f, "Tile {} already exists", id),
            CommandError::LocationOutOfRange { location, len } => {
                write!(f, "Location {} out of range for {} tiles", location, len)
            }
            CommandError::InvalidOrder => {
                write!(f, "Tile order does not match the tiles in the tileset")
            }
            CommandError::UnknownWangSet(index) => write!(f, "Unknown Wang set {}", index),
            CommandError::NothingToUndo => write!(f, "Nothing to undo"),
            CommandError::NothingToRedo => write!(f, "Nothing to redo"),
        }
    }
}

impl std::error::Error for CommandError {}
