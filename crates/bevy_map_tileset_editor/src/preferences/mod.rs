//! Persisted tileset view preferences
//!
//! Display options shared by every tileset view, plus the zoom last used
//! for each tileset.

mod file;

pub use file::PreferencesError;

use crate::view::ViewConfig;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Saved view settings
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewPreferences {
    pub view: ViewConfig,
    /// Zoom per tileset
    pub tileset_scales: HashMap<Uuid, f32>,
}

impl ViewPreferences {
    /// Zoom last used for a tileset
    pub fn scale_for(&self, tileset: Uuid) -> Option<f32> {
        self.tileset_scales
            .get(&tileset)
            .copied()
            .filter(|scale| scale.is_finite() && *scale > 0.0)
    }

    /// Remember a tileset's zoom. Returns true if it changed.
    pub fn remember_scale(&mut self, tileset: Uuid, scale: f32) -> bool {
        if self.tileset_scales.get(&tileset) == Some(&scale) {
            return false;
        }
        if scale == 1.0 {
            return self.tileset_scales.remove(&tileset).is_some();
        }
        self.tileset_scales.insert(tileset, scale);
        true
    }
}
