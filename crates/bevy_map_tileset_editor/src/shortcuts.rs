//! Keyboard shortcuts handled outside the view

use crate::{PendingAction, TilesetPanel};
use bevy::prelude::*;

/// Undo/redo shortcuts. View-local keys (zoom, selection, terrain
/// transforms) are handled by the view itself through egui.
pub fn handle_keyboard_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut panel: ResMut<TilesetPanel>,
) {
    let ctrl = keyboard.pressed(KeyCode::ControlLeft)
        || keyboard.pressed(KeyCode::ControlRight)
        || keyboard.pressed(KeyCode::SuperLeft)
        || keyboard.pressed(KeyCode::SuperRight);
    let shift = keyboard.pressed(KeyCode::ShiftLeft) || keyboard.pressed(KeyCode::ShiftRight);

    if !ctrl {
        return;
    }
    // Ctrl+Z - Undo
    if keyboard.just_pressed(KeyCode::KeyZ) && !shift {
        panel.pending_action = Some(PendingAction::Undo);
    }
    // Ctrl+Shift+Z or Ctrl+Y - Redo
    if (keyboard.just_pressed(KeyCode::KeyZ) && shift) || keyboard.just_pressed(KeyCode::KeyY) {
        panel.pending_action = Some(PendingAction::Redo);
    }
}
