//! bevy_map_tileset_editor - Tileset grid view for bevy_map_editor
//!
//! This crate shows a tileset as a zoomable grid inside an egui panel:
//! - Tile selection, rubber-band selection and keyboard navigation
//! - Drag-and-drop reordering of collection tiles
//! - Merging and splitting multi-cell atlas tiles
//! - Terrain (Wang) painting with rotate/flip shortcuts
//! - Persisted view preferences and per-tileset zoom
//!
//! Edits are applied to the [`TilesetDocument`] resource with undo/redo.
//!
//! # Usage
//!
//! ```rust,ignore
//! use bevy::prelude::*;
//! use bevy_map_tileset::{Tileset, TilesetDocument};
//! use bevy_map_tileset_editor::TilesetViewPlugin;
//!
//! fn main() {
//!     let tileset = Tileset::new_atlas("Ground".to_string(), 16, 16, 8, 8);
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(TilesetViewPlugin::new().with_editing_tileset(true))
//!         .insert_resource(TilesetDocument::new(tileset))
//!         .run();
//! }
//! ```

pub mod actions;
pub mod panel;
pub mod preferences;
pub mod shortcuts;
pub mod textures;
pub mod view;

pub use actions::TilesetViewAction;
pub use preferences::ViewPreferences;
pub use textures::TilesetTextures;
pub use view::{InteractionMode, TilesetView, ViewConfig, WangBehavior, WrapBehavior};

use bevy::ecs::message::MessageWriter;
use bevy::prelude::*;
use bevy_egui::{EguiPlugin, EguiPrimaryContextPass};
use bevy_map_tileset::TilesetDocument;
use uuid::Uuid;

/// Document-level requests queued by shortcuts and the toolbar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    Undo,
    Redo,
}

/// The tileset view shown in the panel
#[derive(Resource, Default)]
pub struct TilesetPanel {
    pub view: Option<TilesetView>,
    /// Tileset the view was created for
    pub tileset_id: Option<Uuid>,
    pub pending_action: Option<PendingAction>,
}

/// Configuration for the tileset panel
#[derive(Resource, Clone, Debug)]
pub struct TilesetPanelConfig {
    /// Show tileset editing entries (tile properties) instead of map editing
    /// ones (tile swapping). Default: false
    pub editing_tileset: bool,
    /// Initial panel width. Default: 320
    pub panel_width: f32,
    /// Load and save view preferences in the config directory. Default: true
    pub persist_preferences: bool,
}

impl Default for TilesetPanelConfig {
    fn default() -> Self {
        Self {
            editing_tileset: false,
            panel_width: 320.0,
            persist_preferences: true,
        }
    }
}

/// Tileset view plugin
///
/// Shows the [`TilesetDocument`] resource, when present, in a side panel and
/// sends the view's requests as [`TilesetViewAction`] messages.
#[derive(Default)]
pub struct TilesetViewPlugin {
    pub config: TilesetPanelConfig,
}

impl TilesetViewPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the view inside a tileset editor (default: map editor)
    pub fn with_editing_tileset(mut self, editing: bool) -> Self {
        self.config.editing_tileset = editing;
        self
    }

    pub fn with_panel_width(mut self, width: f32) -> Self {
        self.config.panel_width = width.max(120.0);
        self
    }

    /// Keep preferences in memory only
    pub fn without_persisted_preferences(mut self) -> Self {
        self.config.persist_preferences = false;
        self
    }
}

impl Plugin for TilesetViewPlugin {
    fn build(&self, app: &mut App) {
        let preferences = if self.config.persist_preferences {
            let preferences = ViewPreferences::load();
            info!("Loaded tileset view preferences");
            preferences
        } else {
            ViewPreferences::default()
        };

        if !app.is_plugin_added::<EguiPlugin>() {
            app.add_plugins(EguiPlugin::default());
        }

        app.insert_resource(preferences)
            .insert_resource(self.config.clone())
            .init_resource::<TilesetPanel>()
            .init_resource::<TilesetTextures>()
            .add_message::<TilesetViewAction>()
            .add_systems(
                Update,
                (
                    sync_view_with_document,
                    textures::load_tileset_textures,
                    shortcuts::handle_keyboard_shortcuts,
                    process_pending_action,
                    forward_view_actions,
                    save_view_preferences,
                )
                    .chain(),
            )
            .add_systems(EguiPrimaryContextPass, panel::render_tileset_panel);
    }
}

/// System creating the view for the current document's tileset
fn sync_view_with_document(
    mut panel: ResMut<TilesetPanel>,
    document: Option<Res<TilesetDocument>>,
    preferences: Res<ViewPreferences>,
    config: Res<TilesetPanelConfig>,
) {
    let Some(document) = document else {
        if panel.view.is_some() {
            panel.view = None;
            panel.tileset_id = None;
        }
        return;
    };

    let tileset = document.tileset();
    if panel.view.is_some() && panel.tileset_id == Some(tileset.id) {
        return;
    }

    let mut view = TilesetView::new(tileset, preferences.view.clone());
    view.set_editing_tileset(config.editing_tileset);
    if let Some(scale) = preferences.scale_for(tileset.id) {
        view.set_scale(scale, tileset);
    }
    info!(
        "Showing tileset '{}' ({} tiles)",
        tileset.name,
        tileset.tile_count()
    );

    panel.view = Some(view);
    panel.tileset_id = Some(tileset.id);
}

/// System running queued undo/redo
fn process_pending_action(
    mut panel: ResMut<TilesetPanel>,
    document: Option<ResMut<TilesetDocument>>,
) {
    let Some(action) = panel.pending_action.take() else {
        return;
    };
    let Some(mut document) = document else {
        return;
    };

    let result = match action {
        PendingAction::Undo => document.undo(),
        PendingAction::Redo => document.redo(),
    };
    match result {
        Ok(changes) => {
            if let Some(view) = panel.view.as_mut() {
                view.document_changed(&document, &changes);
            }
        }
        // Nothing to undo/redo is routine
        Err(e) => debug!("{:?} skipped: {}", action, e),
    }
}

/// System sending the view's requests as messages
fn forward_view_actions(
    mut panel: ResMut<TilesetPanel>,
    mut actions: MessageWriter<TilesetViewAction>,
) {
    let Some(view) = panel.view.as_mut() else {
        return;
    };
    for action in view.take_actions() {
        debug!("Tileset view action: {}", action.name());
        actions.write(action);
    }
}

/// System storing display options and zoom when they change
fn save_view_preferences(
    panel: Res<TilesetPanel>,
    mut preferences: ResMut<ViewPreferences>,
    config: Res<TilesetPanelConfig>,
) {
    let (Some(view), Some(tileset_id)) = (panel.view.as_ref(), panel.tileset_id) else {
        return;
    };

    let mut changed = false;
    if view.config() != &preferences.view {
        preferences.view = view.config().clone();
        changed = true;
    }
    if preferences.scale_for(tileset_id).unwrap_or(1.0) != view.scale() {
        changed |= preferences.remember_scale(tileset_id, view.scale());
    }

    if changed && config.persist_preferences {
        if let Err(e) = preferences.save() {
            error!("Failed to save tileset view preferences: {}", e);
        }
    }
}
