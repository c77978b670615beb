//! Painting of individual tileset cells

use super::layout::{grid_extra, placeholder_size};
use bevy::math::{Affine2, Vec2};
use bevy_egui::egui;
use bevy_map_tileset::{Tile, Tileset};
use std::f32::consts::FRAC_PI_4;

/// Grid line color between cells
pub const GRID_COLOR: egui::Color32 = egui::Color32::from_rgb(30, 30, 35);
/// Background behind tiles when the tileset defines none
pub const DEFAULT_BACKGROUND: egui::Color32 = egui::Color32::from_rgb(52, 54, 60);
const MISSING_IMAGE_COLOR: egui::Color32 = egui::Color32::from_rgb(200, 80, 80);

/// A registered egui texture and the part of it showing a tile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileTexture {
    pub id: egui::TextureId,
    pub uv: egui::Rect,
}

/// Source of tile textures for painting and layout
pub trait TileTextures {
    /// Texture for a tile, `None` while its image is missing or loading
    fn texture(&self, tileset: &Tileset, tile: &Tile) -> Option<TileTexture>;
}

/// Texture source without any images; every tile shows the placeholder
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTextures;

impl TileTextures for NoTextures {
    fn texture(&self, _tileset: &Tileset, _tile: &Tile) -> Option<TileTexture> {
        None
    }
}

/// View state that affects how a cell is painted
#[derive(Debug, Clone, Copy)]
pub struct DelegateStyle {
    pub scale: f32,
    pub draw_grid: bool,
    pub dynamic_wrapping: bool,
    pub relocating: bool,
    pub mark_animated_tiles: bool,
    pub highlight: egui::Color32,
}

impl DelegateStyle {
    /// Cell rect without the trailing grid line
    pub fn inner_rect(&self, cell_rect: egui::Rect) -> egui::Rect {
        let extra = grid_extra(self.draw_grid);
        egui::Rect::from_min_max(cell_rect.min, cell_rect.max - egui::vec2(extra, extra))
    }
}

/// Where a tile image of `image_size` pixels lands inside `inner`.
///
/// Dynamic wrapping fits the image to the cell and centers it; otherwise the
/// image is drawn at the zoom level, aligned to the bottom-left corner.
pub fn image_target_rect(
    inner: egui::Rect,
    image_size: egui::Vec2,
    scale: f32,
    dynamic_wrapping: bool,
) -> egui::Rect {
    if dynamic_wrapping {
        let fit = if image_size.x > 0.0 && image_size.y > 0.0 {
            (inner.width() / image_size.x).min(inner.height() / image_size.y)
        } else {
            0.0
        };
        return egui::Rect::from_center_size(inner.center(), image_size * fit);
    }

    let size = image_size * scale;
    egui::Rect::from_min_size(egui::pos2(inner.min.x, inner.max.y - size.y), size)
}

/// Paint one cell: image or placeholder, relocate grid, film strip and
/// selection highlight
pub fn paint_tile(
    painter: &egui::Painter,
    tileset: &Tileset,
    tile: &Tile,
    cell_rect: egui::Rect,
    selected: bool,
    style: &DelegateStyle,
    textures: &dyn TileTextures,
) {
    let inner = style.inner_rect(cell_rect);

    let texture = textures.texture(tileset, tile);
    let image_size = match texture {
        Some(_) => {
            let (width, height) = tile.size();
            egui::vec2(width as f32, height as f32)
        }
        None => {
            let size = placeholder_size(tileset);
            egui::vec2(size.x, size.y)
        }
    };
    let target = image_target_rect(inner, image_size, style.scale, style.dynamic_wrapping);

    match texture {
        Some(texture) => {
            painter.image(texture.id, target, texture.uv, egui::Color32::WHITE);
        }
        None => paint_missing_image(painter, target),
    }

    if style.relocating {
        painter.rect_stroke(
            inner,
            0.0,
            egui::Stroke::new(1.0, style.highlight.gamma_multiply(0.5)),
            egui::StrokeKind::Inside,
        );
    }

    if style.mark_animated_tiles && tile.is_animated() {
        paint_film_strip(painter, target);
    }

    if selected {
        painter.rect_filled(inner, 0.0, style.highlight.gamma_multiply(0.5));
    }
}

/// Grid lines along the right and bottom edge of a cell
pub fn paint_grid_lines(painter: &egui::Painter, cell_rect: egui::Rect) {
    let right = egui::Rect::from_min_max(
        egui::pos2(cell_rect.max.x - 1.0, cell_rect.min.y),
        cell_rect.max,
    );
    let bottom = egui::Rect::from_min_max(
        egui::pos2(cell_rect.min.x, cell_rect.max.y - 1.0),
        cell_rect.max,
    );
    painter.rect_filled(right, 0.0, GRID_COLOR);
    painter.rect_filled(bottom, 0.0, GRID_COLOR);
}

fn paint_missing_image(painter: &egui::Painter, rect: egui::Rect) {
    let stroke = egui::Stroke::new(1.0, MISSING_IMAGE_COLOR);
    painter.rect_stroke(rect.shrink(1.0), 0.0, stroke, egui::StrokeKind::Inside);
    painter.line_segment([rect.left_top(), rect.right_bottom()], stroke);
    painter.line_segment([rect.right_top(), rect.left_bottom()], stroke);
}

/// Strip and hole polygons of the animation marker, in screen space.
///
/// The strip is a 32x6 band laid diagonally across the bottom-right corner
/// of `target`, scaled with the tile. The first polygon is the strip, the
/// rest are its holes.
pub fn film_strip_polygons(target: egui::Rect) -> Vec<Vec<egui::Pos2>> {
    let scale = (target.width() / 32.0).min(target.height() / 32.0);
    let transform = Affine2::from_translation(Vec2::new(target.max.x, target.max.y))
        * Affine2::from_scale(Vec2::splat(scale))
        * Affine2::from_translation(Vec2::new(-18.0, 3.0))
        * Affine2::from_angle(-FRAC_PI_4);

    let to_screen = |points: [Vec2; 4]| -> Vec<egui::Pos2> {
        points
            .iter()
            .map(|p| {
                let s = transform.transform_point2(*p);
                egui::pos2(s.x, s.y)
            })
            .collect()
    };

    let (strip_width, strip_height) = (32.0, 6.0);
    let mut polygons = vec![to_screen(corners(Vec2::ZERO, Vec2::new(strip_width, strip_height)))];

    let hole = strip_height * 0.6;
    let step = (strip_height - hole) + hole;
    let margin = (strip_height - hole) / 2.0;
    let mut x = (step - hole) / 2.0;
    while x < strip_width {
        polygons.push(to_screen(corners(Vec2::new(x, margin), Vec2::splat(hole))));
        x += step;
    }
    polygons
}

fn corners(min: Vec2, size: Vec2) -> [Vec2; 4] {
    [
        min,
        min + Vec2::new(size.x, 0.0),
        min + size,
        min + Vec2::new(0.0, size.y),
    ]
}

fn paint_film_strip(painter: &egui::Painter, target: egui::Rect) {
    let clipped = painter.with_clip_rect(target.intersect(painter.clip_rect()));
    let strip_color = egui::Color32::from_black_alpha(204);
    let hole_color = egui::Color32::from_white_alpha(204);
    for (i, polygon) in film_strip_polygons(target).into_iter().enumerate() {
        let fill = if i == 0 { strip_color } else { hole_color };
        clipped.add(egui::Shape::convex_polygon(polygon, fill, egui::Stroke::NONE));
    }
}

/// Parse a "#RRGGBB" background color
pub fn parse_hex_color(hex: &str) -> Option<egui::Color32> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(egui::Color32::from_rgb(r, g, b))
}

/// Background of a tileset's grid
pub fn background_color(tileset: &Tileset) -> egui::Color32 {
    tileset
        .background_color
        .as_deref()
        .and_then(parse_hex_color)
        .unwrap_or(DEFAULT_BACKGROUND)
}
