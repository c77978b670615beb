//! Side panel hosting the tileset view

use crate::textures::TilesetTextures;
use crate::view::{TilesetView, WangBehavior, WrapBehavior};
use crate::{PendingAction, TilesetPanel, TilesetPanelConfig};
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};
use bevy_map_tileset::{CommandBatch, TilesetDocument, WangId};

/// Render the panel and apply the edits made in it
pub fn render_tileset_panel(
    mut contexts: EguiContexts,
    mut panel: ResMut<TilesetPanel>,
    document: Option<ResMut<TilesetDocument>>,
    textures: Res<TilesetTextures>,
    config: Res<TilesetPanelConfig>,
) {
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };
    let Some(mut document) = document else {
        return;
    };
    let panel = &mut *panel;
    let Some(view) = panel.view.as_mut() else {
        return;
    };

    egui::SidePanel::left("tileset_view")
        .default_width(config.panel_width)
        .resizable(true)
        .show(ctx, |ui| {
            ui.heading(document.tileset().name.as_str());
            if let Some(action) = toolbar(ui, view, &document) {
                panel.pending_action = Some(action);
            }
            ui.separator();

            let batches = view.ui(ui, &document, &*textures);
            for batch in batches {
                apply_batch(view, &mut document, batch);
            }
        });
}

/// Apply a batch from the view and report the result back to it
pub fn apply_batch(view: &mut TilesetView, document: &mut TilesetDocument, batch: CommandBatch) {
    let description = batch.description.clone();
    let mergeable = batch.is_mergeable();
    match document.apply_batch(batch) {
        Ok(changes) => view.document_changed(document, &changes),
        Err(e) => {
            error!("Failed to apply '{}': {}", description, e);
            if mergeable {
                view.wang_change_rejected();
            }
        }
    }
}

fn wrap_label(behavior: WrapBehavior) -> &'static str {
    match behavior {
        WrapBehavior::Default => "Auto Wrap",
        WrapBehavior::Dynamic => "Always Wrap",
        WrapBehavior::Fixed => "No Wrap",
    }
}

fn toolbar(
    ui: &mut egui::Ui,
    view: &mut TilesetView,
    document: &TilesetDocument,
) -> Option<PendingAction> {
    let tileset = document.tileset();
    let history = document.history();
    let mut pending = None;

    ui.horizontal(|ui| {
        if ui
            .add_enabled(history.can_undo(), egui::Button::new("Undo"))
            .on_hover_text(history.undo_description().unwrap_or_default())
            .clicked()
        {
            pending = Some(PendingAction::Undo);
        }
        if ui
            .add_enabled(history.can_redo(), egui::Button::new("Redo"))
            .on_hover_text(history.redo_description().unwrap_or_default())
            .clicked()
        {
            pending = Some(PendingAction::Redo);
        }
        ui.separator();

        let mut relocate = view.is_relocate_tiles();
        if ui
            .toggle_value(&mut relocate, "Rearrange")
            .on_hover_text("Move tiles, or merge and split atlas tiles")
            .clicked()
        {
            view.set_relocate_tiles(relocate);
        }
        let mut terrain = view.is_edit_wang_set();
        if ui.toggle_value(&mut terrain, "Terrain").clicked() {
            view.set_edit_wang_set(terrain);
        }
    });

    ui.horizontal(|ui| {
        if ui
            .add_enabled(view.zoomable().can_zoom_out(), egui::Button::new("-"))
            .clicked()
        {
            view.zoom_out(tileset);
        }
        ui.label(format!("{:.0}%", view.scale() * 100.0));
        if ui
            .add_enabled(view.zoomable().can_zoom_in(), egui::Button::new("+"))
            .clicked()
        {
            view.zoom_in(tileset);
        }
        if ui.button("1:1").clicked() {
            view.reset_zoom(tileset);
        }
        ui.separator();

        let mut show_grid = view.draw_grid();
        if ui.checkbox(&mut show_grid, "Grid").changed() {
            view.set_draw_grid(show_grid, tileset);
        }

        let mut wrap = view.config().wrap_behavior;
        egui::ComboBox::from_id_salt("tileset_wrap")
            .selected_text(wrap_label(wrap))
            .show_ui(ui, |ui| {
                for behavior in [WrapBehavior::Default, WrapBehavior::Dynamic, WrapBehavior::Fixed] {
                    ui.selectable_value(&mut wrap, behavior, wrap_label(behavior));
                }
            });
        if wrap != view.config().wrap_behavior {
            view.set_wrap_behavior(wrap, tileset);
        }
    });

    if view.is_edit_wang_set() {
        terrain_toolbar(ui, view, document);
    }

    pending
}

fn terrain_toolbar(ui: &mut egui::Ui, view: &mut TilesetView, document: &TilesetDocument) {
    let sets = document.wang_sets();

    ui.horizontal_wrapped(|ui| {
        let mut selection = view.wang_set();
        let selected_text = selection
            .and_then(|index| sets.get(index))
            .map(|set| set.name.as_str())
            .unwrap_or("(None)");
        egui::ComboBox::from_id_salt("tileset_wang_set")
            .selected_text(selected_text)
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut selection, None, "(None)");
                for (index, set) in sets.iter().enumerate() {
                    ui.selectable_value(
                        &mut selection,
                        Some(index),
                        format!("{} ({})", set.name, set.kind.label()),
                    );
                }
            });
        if selection != view.wang_set() {
            view.set_wang_set(selection);
        }

        let Some(set) = view.wang_set().and_then(|index| sets.get(index)) else {
            return;
        };

        let painting_index = view.wang_behavior() == WangBehavior::HoveredIndex;
        if ui
            .selectable_label(painting_index && view.wang_color() == 0, "Erase")
            .clicked()
        {
            view.set_wang_color(0);
        }
        for (i, color) in set.colors.iter().enumerate() {
            let index = (i + 1) as u8;
            let [r, g, b] = color.color;
            let text = egui::RichText::new(&color.name).color(egui::Color32::from_rgb(r, g, b));
            if ui
                .selectable_label(painting_index && view.wang_color() == index, text)
                .clicked()
            {
                view.set_wang_color(index);
            }
        }
        ui.separator();

        if ui
            .selectable_label(!painting_index, "Whole Tile")
            .on_hover_text("Paint whole tiles with the selected color. Z rotates, X and Y flip.")
            .clicked()
        {
            let color = view.wang_color().max(1);
            view.set_wang_id(WangId::filled(color).masked(set.kind));
        }
    });
}
