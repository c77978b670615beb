//! Tile images loaded through the asset server and registered with egui

use crate::view::{TileTexture, TileTextures};
use bevy::asset::LoadState;
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiTextureHandle};
use bevy_map_tileset::{PixelRect, Tile, Tileset, TilesetDocument};
use std::collections::HashMap;

/// State of an image load operation
#[derive(Debug, Clone, PartialEq)]
pub enum ImageLoadState {
    Loading,
    Loaded,
    Failed(String),
}

/// Resource tracking tile images, keyed by image path.
///
/// Atlas tiles share the tileset image; collection tiles each have their own.
#[derive(Resource, Default)]
pub struct TilesetTextures {
    /// Loaded images: path -> (handle, texture id, image size)
    loaded: HashMap<String, (Handle<Image>, egui::TextureId, Vec2)>,
    /// Images waiting for the asset server or for egui registration
    pending: HashMap<String, Handle<Image>>,
    load_states: HashMap<String, ImageLoadState>,
}

impl TilesetTextures {
    /// Use an image that is already in `Assets<Image>` for `path`, such as a
    /// generated one, instead of loading it from disk
    pub fn insert_handle(&mut self, path: impl Into<String>, handle: Handle<Image>) {
        let path = path.into();
        self.loaded.remove(&path);
        self.load_states.insert(path.clone(), ImageLoadState::Loading);
        self.pending.insert(path, handle);
    }

    pub fn load_state(&self, path: &str) -> Option<&ImageLoadState> {
        self.load_states.get(path)
    }

    pub fn is_loaded(&self, path: &str) -> bool {
        self.loaded.contains_key(path)
    }

    /// Number of images still loading
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn needs_load(&self, path: &str) -> bool {
        !self.loaded.contains_key(path)
            && !matches!(self.load_states.get(path), Some(ImageLoadState::Failed(_)))
    }
}

impl TileTextures for TilesetTextures {
    fn texture(&self, tileset: &Tileset, tile: &Tile) -> Option<TileTexture> {
        let path = image_path(tileset, tile)?;
        let (_, id, size) = self.loaded.get(path)?;
        Some(TileTexture {
            id: *id,
            uv: uv_rect(tile.image_rect, *size),
        })
    }
}

/// Image a tile is cut from
pub fn image_path<'a>(tileset: &'a Tileset, tile: &'a Tile) -> Option<&'a str> {
    if tileset.is_atlas() {
        tileset.image_path.as_deref()
    } else {
        tile.image_path.as_deref()
    }
}

/// Normalized texture coordinates of a pixel rect within an image
pub fn uv_rect(rect: PixelRect, image_size: Vec2) -> egui::Rect {
    if image_size.x <= 0.0 || image_size.y <= 0.0 || rect.is_empty() {
        return egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
    }
    egui::Rect::from_min_max(
        egui::pos2(rect.x as f32 / image_size.x, rect.y as f32 / image_size.y),
        egui::pos2(
            (rect.x + rect.width) as f32 / image_size.x,
            (rect.y + rect.height) as f32 / image_size.y,
        ),
    )
}

/// Asset server path for an image path: forward slashes only
pub fn to_asset_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Distinct image paths used by a tileset
fn required_paths(tileset: &Tileset) -> Vec<String> {
    let mut paths: Vec<String> = Vec::new();
    for tile in tileset.tiles() {
        if let Some(path) = image_path(tileset, tile) {
            if !paths.iter().any(|p| p == path) {
                paths.push(path.to_string());
            }
        }
        if tileset.is_atlas() {
            break;
        }
    }
    paths
}

/// System to load tile images and register them with egui
pub fn load_tileset_textures(
    document: Option<Res<TilesetDocument>>,
    mut textures: ResMut<TilesetTextures>,
    mut contexts: EguiContexts,
    asset_server: Res<AssetServer>,
    images: Res<Assets<Image>>,
) {
    let Some(document) = document else {
        return;
    };

    // Explicitly inserted handles may not belong to the current tileset
    let mut paths = required_paths(document.tileset());
    for path in textures.pending.keys() {
        if !paths.contains(path) {
            paths.push(path.clone());
        }
    }

    for path in paths {
        if !textures.needs_load(&path) {
            continue;
        }

        if let Some(handle) = textures.pending.get(&path).cloned() {
            if let Some(image) = images.get(&handle) {
                let size = Vec2::new(image.width() as f32, image.height() as f32);
                let texture_id = contexts.add_image(EguiTextureHandle::Strong(handle.clone()));
                debug!("Tile image loaded: {} -> {}x{} px", path, size.x, size.y);

                textures.pending.remove(&path);
                textures
                    .load_states
                    .insert(path.clone(), ImageLoadState::Loaded);
                textures.loaded.insert(path, (handle, texture_id, size));
                continue;
            }

            if let LoadState::Failed(e) = asset_server.load_state(&handle) {
                warn!("Failed to load tile image {}: {}", path, e);
                textures.pending.remove(&path);
                textures
                    .load_states
                    .insert(path, ImageLoadState::Failed(e.to_string()));
            }
            continue;
        }

        debug!("Loading tile image: {}", path);
        let handle: Handle<Image> = asset_server.load(to_asset_path(&path));
        textures.pending.insert(path.clone(), handle);
        textures.load_states.insert(path, ImageLoadState::Loading);
    }
}
