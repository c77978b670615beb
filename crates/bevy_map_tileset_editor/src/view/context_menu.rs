//! Right-click menu of the tileset view

use super::{InteractionMode, TilesetView, WangBehavior};
use bevy_egui::egui;
use bevy_map_tileset::TilesetDocument;

/// One row of the context menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEntry {
    UseAsTerrainSetImage,
    UseAsTerrainImage,
    TileProperties,
    SwapTiles { enabled: bool },
    Separator,
    ShowGrid { checked: bool },
    SelectAllTiles,
}

impl MenuEntry {
    pub fn label(&self) -> &'static str {
        match self {
            MenuEntry::UseAsTerrainSetImage => "Use as Terrain Set Image",
            MenuEntry::UseAsTerrainImage => "Use as Terrain Image",
            MenuEntry::TileProperties => "Tile Properties...",
            MenuEntry::SwapTiles { .. } => "Swap Tiles",
            MenuEntry::Separator => "",
            MenuEntry::ShowGrid { .. } => "Show Grid",
            MenuEntry::SelectAllTiles => "Select All Tiles",
        }
    }

    pub fn is_enabled(&self) -> bool {
        match self {
            MenuEntry::SwapTiles { enabled } => *enabled,
            _ => true,
        }
    }
}

/// Entries for the tile the menu was opened on. Empty while relocating.
pub fn menu_entries(view: &TilesetView, doc: &TilesetDocument) -> Vec<MenuEntry> {
    if view.mode() == InteractionMode::Relocate {
        return Vec::new();
    }

    let tileset = doc.tileset();
    let tile = view.context_tile(tileset);
    let mut entries = Vec::new();

    if view.mode() == InteractionMode::EditWang && tile.is_some() && view.wang_set().is_some() {
        entries.push(MenuEntry::UseAsTerrainSetImage);
        if view.wang_behavior() == WangBehavior::HoveredIndex && view.wang_color() > 0 {
            entries.push(MenuEntry::UseAsTerrainImage);
        }
        entries.push(MenuEntry::Separator);
    }

    if view.is_editing_tileset() {
        if tile.is_some() {
            entries.push(MenuEntry::TileProperties);
            entries.push(MenuEntry::Separator);
        }
    } else {
        entries.push(MenuEntry::SwapTiles {
            enabled: view.selected_tiles(tileset).len() == 2,
        });
        entries.push(MenuEntry::Separator);
    }

    entries.push(MenuEntry::ShowGrid {
        checked: view.draw_grid(),
    });
    entries.push(MenuEntry::SelectAllTiles);
    entries
}

/// Render the menu and run the clicked entry
pub fn show_context_menu(ui: &mut egui::Ui, view: &mut TilesetView, doc: &TilesetDocument) {
    let entries = menu_entries(view, doc);
    if entries.is_empty() {
        ui.close();
        return;
    }

    for entry in entries {
        match entry {
            MenuEntry::Separator => {
                ui.separator();
            }
            MenuEntry::ShowGrid { checked } => {
                let mut show = checked;
                if ui.checkbox(&mut show, entry.label()).clicked() {
                    view.activate_menu_entry(entry, doc);
                    ui.close();
                }
            }
            _ => {
                if ui
                    .add_enabled(entry.is_enabled(), egui::Button::new(entry.label()))
                    .clicked()
                {
                    view.activate_menu_entry(entry, doc);
                    ui.close();
                }
            }
        }
    }
}
