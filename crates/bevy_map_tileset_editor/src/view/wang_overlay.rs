//! Terrain overlay: which part of a tile the pointer targets and how
//! assigned WangIds are drawn on top of tiles

use bevy::math::{Affine2, Rect, Vec2};
use bevy_egui::egui;
use bevy_map_tileset::{Tileset, TilesetOrientation, WangId, WangIndex, WangSet, WangSetType};
use std::f32::consts::{FRAC_1_SQRT_2, FRAC_PI_4};

/// Overlay rect and the transform drawing it onto the tile.
///
/// Orthogonal tilesets draw straight into `rect`. Isometric tilesets draw
/// into a square around the center, rotated 45 degrees and squashed to the
/// tileset's grid ratio so it lines up with the diamond.
pub fn overlay_transform(tileset: &Tileset, rect: Rect) -> (Rect, Affine2) {
    if tileset.orientation != TilesetOrientation::Isometric {
        return (rect, Affine2::IDENTITY);
    }

    let center = rect.center();
    let (grid_width, grid_height) = tileset.grid_size;
    let ratio = if grid_width > 0 {
        grid_height as f32 / grid_width as f32
    } else {
        1.0
    };
    let transform = Affine2::from_translation(center)
        * Affine2::from_scale(Vec2::new(FRAC_1_SQRT_2, FRAC_1_SQRT_2 * ratio))
        * Affine2::from_angle(FRAC_PI_4)
        * Affine2::from_translation(-center);
    let square = Rect::from_center_size(center, Vec2::splat(rect.width()));
    (square, transform)
}

/// Position inside the overlay rect as a 0..1 fraction, undoing the
/// isometric transform
pub fn tile_fraction(pointer: Vec2, rect: Rect, transform: Affine2) -> Vec2 {
    let local = transform.inverse().transform_point2(pointer);
    let size = rect.size().max(Vec2::splat(f32::EPSILON));
    (local - rect.min) / size
}

/// WangId position targeted at a tile-local fraction.
///
/// The middle of the tile is a dead zone for every set type.
pub fn hovered_index(kind: WangSetType, fraction: Vec2) -> Option<WangIndex> {
    let x = ((fraction.x * 3.0).floor() as i32).clamp(0, 2);
    let y = ((fraction.y * 3.0).floor() as i32).clamp(0, 2);
    let grid_index = WangIndex::by_grid(x, y)?;

    match kind {
        WangSetType::Mixed => Some(grid_index),
        WangSetType::Edge => {
            let p = fraction - Vec2::splat(0.5);
            Some(if p.x < p.y {
                if p.x > -p.y {
                    WangIndex::Bottom
                } else {
                    WangIndex::Left
                }
            } else if p.x > -p.y {
                WangIndex::Right
            } else {
                WangIndex::Top
            })
        }
        WangSetType::Corner => Some(match (fraction.x < 0.5, fraction.y < 0.5) {
            (true, true) => WangIndex::TopLeft,
            (false, true) => WangIndex::TopRight,
            (true, false) => WangIndex::BottomLeft,
            (false, false) => WangIndex::BottomRight,
        }),
    }
}

/// WangId previewed while hovering one index with a color.
///
/// Color 0 erases, shown with the index mask.
pub fn hover_wang_id(index: WangIndex, color: u8) -> WangId {
    let mut wang_id = WangId::EMPTY;
    let marker = if color == 0 { WangId::INDEX_MASK } else { color };
    wang_id.set_index_color(index, marker);
    wang_id
}

/// Region of the unit square colored for one index
pub fn index_polygon(kind: WangSetType, index: WangIndex) -> Vec<Vec2> {
    match kind {
        WangSetType::Edge => {
            let center = Vec2::splat(0.5);
            let (a, b) = match index {
                WangIndex::Top => (Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)),
                WangIndex::Right => (Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0)),
                WangIndex::Bottom => (Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)),
                WangIndex::Left => (Vec2::new(0.0, 1.0), Vec2::new(0.0, 0.0)),
                _ => return Vec::new(),
            };
            vec![a, b, center]
        }
        WangSetType::Corner => {
            if !index.is_corner() {
                return Vec::new();
            }
            let (x, y) = index.grid_position();
            square(Vec2::new(x as f32 * 0.25, y as f32 * 0.25), 0.5)
        }
        WangSetType::Mixed => {
            let (x, y) = index.grid_position();
            square(Vec2::new(x as f32, y as f32) / 3.0, 1.0 / 3.0)
        }
    }
}

fn square(min: Vec2, size: f32) -> Vec<Vec2> {
    vec![
        min,
        min + Vec2::new(size, 0.0),
        min + Vec2::splat(size),
        min + Vec2::new(0.0, size),
    ]
}

/// Paint the colored regions of `wang_id` over `rect`
pub fn paint_wang_overlay(
    painter: &egui::Painter,
    wang_id: WangId,
    wang_set: &WangSet,
    rect: Rect,
    transform: Affine2,
    opacity: f32,
) {
    for index in WangIndex::ALL {
        let color = wang_id.index_color(index);
        if color == 0 || !wang_set.kind.uses_index(index) {
            continue;
        }
        let polygon = index_polygon(wang_set.kind, index);
        if polygon.is_empty() {
            continue;
        }

        let rgb = if color == WangId::INDEX_MASK {
            [255, 255, 255]
        } else {
            match wang_set.color(color) {
                Some(c) => c.color,
                None => continue,
            }
        };
        let fill = egui::Color32::from_rgba_unmultiplied(
            rgb[0],
            rgb[1],
            rgb[2],
            (160.0 * opacity).round() as u8,
        );
        let outline = egui::Color32::from_rgba_unmultiplied(
            rgb[0] / 2,
            rgb[1] / 2,
            rgb[2] / 2,
            (255.0 * opacity).round() as u8,
        );

        let points: Vec<egui::Pos2> = polygon
            .into_iter()
            .map(|p| {
                let local = rect.min + p * rect.size();
                let screen = transform.transform_point2(local);
                egui::pos2(screen.x, screen.y)
            })
            .collect();
        painter.add(egui::Shape::convex_polygon(
            points,
            fill,
            egui::Stroke::new(1.0, outline),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_uses_grid_cells() {
        let kind = WangSetType::Mixed;
        assert_eq!(hovered_index(kind, Vec2::new(0.1, 0.1)), Some(WangIndex::TopLeft));
        assert_eq!(hovered_index(kind, Vec2::new(0.5, 0.9)), Some(WangIndex::Bottom));
        assert_eq!(hovered_index(kind, Vec2::new(1.2, 0.5)), Some(WangIndex::Right));
        assert_eq!(hovered_index(kind, Vec2::new(0.5, 0.5)), None);
    }

    #[test]
    fn test_edge_uses_diagonal_quadrants() {
        let kind = WangSetType::Edge;
        assert_eq!(hovered_index(kind, Vec2::new(0.5, 0.1)), Some(WangIndex::Top));
        assert_eq!(hovered_index(kind, Vec2::new(0.9, 0.6)), Some(WangIndex::Right));
        assert_eq!(hovered_index(kind, Vec2::new(0.4, 0.95)), Some(WangIndex::Bottom));
        assert_eq!(hovered_index(kind, Vec2::new(0.05, 0.4)), Some(WangIndex::Left));
        // Corner cells of the 3x3 grid still resolve to an edge
        assert_eq!(hovered_index(kind, Vec2::new(0.05, 0.2)), Some(WangIndex::Left));
        assert_eq!(hovered_index(kind, Vec2::new(0.5, 0.5)), None);
    }

    #[test]
    fn test_corner_uses_quadrants() {
        let kind = WangSetType::Corner;
        assert_eq!(hovered_index(kind, Vec2::new(0.2, 0.3)), Some(WangIndex::TopLeft));
        assert_eq!(hovered_index(kind, Vec2::new(0.5, 0.1)), Some(WangIndex::TopRight));
        assert_eq!(hovered_index(kind, Vec2::new(0.1, 0.8)), Some(WangIndex::BottomLeft));
        assert_eq!(hovered_index(kind, Vec2::new(0.9, 0.9)), Some(WangIndex::BottomRight));
    }

    #[test]
    fn test_hover_erase_marker() {
        let wang_id = hover_wang_id(WangIndex::Right, 0);
        assert_eq!(wang_id.index_color(WangIndex::Right), WangId::INDEX_MASK);
        let wang_id = hover_wang_id(WangIndex::Right, 3);
        assert_eq!(wang_id.index_color(WangIndex::Right), 3);
        assert_eq!(wang_id.index_color(WangIndex::Top), 0);
    }

    #[test]
    fn test_orthogonal_fraction() {
        let tileset = Tileset::new_atlas("Ground".to_string(), 16, 16, 2, 2);
        let rect = Rect::new(10.0, 20.0, 42.0, 52.0);
        let (target, transform) = overlay_transform(&tileset, rect);
        assert_eq!(target, rect);
        let fraction = tile_fraction(Vec2::new(18.0, 44.0), target, transform);
        assert!((fraction - Vec2::new(0.25, 0.75)).length() < 1e-5);
    }

    #[test]
    fn test_isometric_fraction_undoes_rotation() {
        let mut tileset = Tileset::new_atlas("Iso".to_string(), 64, 32, 2, 2);
        tileset.orientation = TilesetOrientation::Isometric;
        tileset.grid_size = (64, 32);
        let rect = Rect::new(0.0, 0.0, 64.0, 32.0);
        let (target, transform) = overlay_transform(&tileset, rect);
        assert_eq!(target.size(), Vec2::splat(64.0));

        // The top vertex of the diamond is the square's top-left corner
        let top = transform.transform_point2(target.min);
        assert!((top - Vec2::new(32.0, 0.0)).length() < 1e-3);
        let fraction = tile_fraction(Vec2::new(32.0, 1.0), target, transform);
        assert_eq!(
            hovered_index(WangSetType::Mixed, fraction),
            Some(WangIndex::TopLeft)
        );

        // The diamond's right vertex is the square's top-right corner
        let fraction = tile_fraction(Vec2::new(62.0, 16.0), target, transform);
        assert_eq!(
            hovered_index(WangSetType::Mixed, fraction),
            Some(WangIndex::TopRight)
        );
    }

    #[test]
    fn test_polygons_match_set_type() {
        assert!(index_polygon(WangSetType::Edge, WangIndex::TopLeft).is_empty());
        assert!(index_polygon(WangSetType::Corner, WangIndex::Top).is_empty());
        assert_eq!(index_polygon(WangSetType::Edge, WangIndex::Top).len(), 3);
        let corner = index_polygon(WangSetType::Corner, WangIndex::BottomRight);
        assert_eq!(corner[0], Vec2::new(0.5, 0.5));
        let mixed = index_polygon(WangSetType::Mixed, WangIndex::Bottom);
        assert!((mixed[0] - Vec2::new(1.0 / 3.0, 2.0 / 3.0)).length() < 1e-6);
    }
}
