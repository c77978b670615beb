//! Tileset grid view
//!
//! [`TilesetView`] shows a [`TilesetModel`] as a scrollable, zoomable grid
//! and turns pointer and keyboard input into selections, drag-and-drop
//! relocation, atlas span edits and terrain (Wang) painting. It never edits
//! tiles itself: edits are returned as [`CommandBatch`]es for the host to
//! apply to its [`TilesetDocument`], after which the host reports the
//! resulting changes back through [`TilesetView::document_changed`].

pub mod context_menu;
pub mod delegate;
pub mod input;
pub mod layout;
pub mod wang_overlay;
pub mod zoom;

pub use context_menu::MenuEntry;
pub use delegate::{NoTextures, TileTexture, TileTextures};
pub use input::{InputTracker, Modifiers, PointerButton, ViewEvent, ViewKey};
pub use layout::GridLayout;
pub use zoom::Zoomable;

use crate::actions::TilesetViewAction;
use bevy::log::debug;
use bevy::math::{Rect, Vec2};
use bevy_egui::egui;
use bevy_map_tileset::{
    create_tile, merge_span, remove_tiles_intersecting, split_span, CommandBatch, DirtyRegion,
    DocumentChange, DropAction, GridCell, GridRect, Invalidation, PixelRect, Tile, TileCommand,
    TileDragPayload, TileId, Tileset, TilesetDocument, TilesetModel, WangId, WangIndex,
};
use delegate::DelegateStyle;
use layout::grid_extra;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Pointer travel before a press turns into a drag
const DRAG_THRESHOLD: f32 = 4.0;

/// What pointer input does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InteractionMode {
    #[default]
    Normal,
    /// Rearrange collection tiles, or merge/split/create atlas tiles
    Relocate,
    /// Paint terrain onto tiles
    EditWang,
}

/// When the column count follows the viewport width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WrapBehavior {
    /// Collections wrap, atlases keep their columns
    #[default]
    Default,
    Dynamic,
    Fixed,
}

/// How terrain painting picks the WangId it assigns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WangBehavior {
    /// Assign the current WangId as a whole
    #[default]
    WholeId,
    /// Assign the current color to the hovered edge or corner
    HoveredIndex,
}

/// Display options of the view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub show_grid: bool,
    pub mark_animated_tiles: bool,
    /// Wheel zooms without Ctrl (and scrolls with it)
    pub wheel_zooms_by_default: bool,
    pub wrap_behavior: WrapBehavior,
    /// Selection and relocate highlight (RGBA)
    pub highlight_color: [u8; 4],
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            show_grid: true,
            mark_animated_tiles: true,
            wheel_zooms_by_default: false,
            wrap_behavior: WrapBehavior::Default,
            highlight_color: [45, 130, 209, 255],
        }
    }
}

impl ViewConfig {
    pub fn highlight(&self) -> egui::Color32 {
        let [r, g, b, a] = self.highlight_color;
        egui::Color32::from_rgba_unmultiplied(r, g, b, a)
    }
}

#[derive(Debug, Clone, Default)]
enum DragState {
    #[default]
    None,
    /// Primary button down, not moved far enough to start a drag
    Pressed {
        origin: Vec2,
        cell: Option<GridCell>,
        tile_drag: bool,
        modifiers: Modifiers,
    },
    RubberBand {
        origin: Vec2,
        current: Vec2,
        base: HashSet<GridCell>,
    },
    /// Atlas region drag in relocate mode
    Marquee {
        origin: Vec2,
        current: Vec2,
        button: PointerButton,
        snap: bool,
    },
    TileDrag {
        payload: TileDragPayload,
        target: Option<GridCell>,
    },
    Pan {
        last: Vec2,
        button: PointerButton,
    },
    WangPaint,
}

/// Usage bookkeeping for one WangId change awaiting its document change
#[derive(Debug, Clone, Copy)]
struct WangUsage {
    previous: WangId,
    new: WangId,
    was_unused: bool,
}

pub struct TilesetView {
    model: TilesetModel,
    dirty: DirtyRegion,
    config: ViewConfig,
    zoom: Zoomable,
    mode: InteractionMode,

    layout: GridLayout,
    layout_valid: bool,
    loaded_images: HashSet<TileId>,
    viewport: Vec2,
    scroll: Vec2,
    /// Relative content position and viewport position to keep aligned
    /// across the next relayout
    zoom_anchor: Option<(Vec2, Vec2)>,

    selection: HashSet<GridCell>,
    current: Option<GridCell>,
    anchor: Option<GridCell>,
    hovered: Option<GridCell>,
    drag: DragState,
    space_held: bool,

    wang_set: Option<usize>,
    wang_id: WangId,
    wang_color: u8,
    wang_behavior: WangBehavior,
    hovered_wang_id: WangId,
    wang_changed: bool,
    last_wang_change: Option<(TileId, WangId)>,
    pending_usage: VecDeque<WangUsage>,

    editing_tileset: bool,
    context_cell: Option<GridCell>,
    pending_actions: Vec<TilesetViewAction>,
    input: InputTracker,
}

impl TilesetView {
    pub fn new(tileset: &Tileset, config: ViewConfig) -> Self {
        let mut model = TilesetModel::new(tileset);
        let dirty = DirtyRegion::new();
        model.subscribe(Box::new(dirty.clone()));

        Self {
            model,
            dirty,
            config,
            zoom: Zoomable::default(),
            mode: InteractionMode::Normal,
            layout: GridLayout::default(),
            layout_valid: false,
            loaded_images: HashSet::new(),
            viewport: Vec2::ZERO,
            scroll: Vec2::ZERO,
            zoom_anchor: None,
            selection: HashSet::new(),
            current: None,
            anchor: None,
            hovered: None,
            drag: DragState::None,
            space_held: false,
            wang_set: None,
            wang_id: WangId::EMPTY,
            wang_color: 0,
            wang_behavior: WangBehavior::WholeId,
            hovered_wang_id: WangId::EMPTY,
            wang_changed: false,
            last_wang_change: None,
            pending_usage: VecDeque::new(),
            editing_tileset: false,
            context_cell: None,
            pending_actions: Vec::new(),
            input: InputTracker::default(),
        }
    }

    pub fn model(&self) -> &TilesetModel {
        &self.model
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ViewConfig, tileset: &Tileset) {
        if self.config == config {
            return;
        }
        self.config = config;
        self.layout_valid = false;
        self.refresh_column_count(tileset);
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    /// Requests collected since the last call
    pub fn take_actions(&mut self) -> Vec<TilesetViewAction> {
        std::mem::take(&mut self.pending_actions)
    }

    // --- Zoom and wrapping ---

    pub fn scale(&self) -> f32 {
        self.zoom.scale()
    }

    pub fn zoomable(&self) -> &Zoomable {
        &self.zoom
    }

    /// Set the zoom, keeping the viewport center in place
    pub fn set_scale(&mut self, scale: f32, tileset: &Tileset) {
        let anchor = self.anchor_at(self.viewport / 2.0);
        if self.zoom.set_scale(scale) {
            self.scale_changed(anchor, tileset);
        }
    }

    pub fn zoom_in(&mut self, tileset: &Tileset) {
        let anchor = self.anchor_at(self.viewport / 2.0);
        if self.zoom.zoom_in() {
            self.scale_changed(anchor, tileset);
        }
    }

    pub fn zoom_out(&mut self, tileset: &Tileset) {
        let anchor = self.anchor_at(self.viewport / 2.0);
        if self.zoom.zoom_out() {
            self.scale_changed(anchor, tileset);
        }
    }

    pub fn reset_zoom(&mut self, tileset: &Tileset) {
        let anchor = self.anchor_at(self.viewport / 2.0);
        if self.zoom.reset_zoom() {
            self.scale_changed(anchor, tileset);
        }
    }

    pub fn dynamic_wrapping(&self, tileset: &Tileset) -> bool {
        match self.config.wrap_behavior {
            WrapBehavior::Default => tileset.is_collection(),
            WrapBehavior::Dynamic => true,
            WrapBehavior::Fixed => false,
        }
    }

    pub fn set_wrap_behavior(&mut self, behavior: WrapBehavior, tileset: &Tileset) {
        if self.config.wrap_behavior == behavior {
            return;
        }
        self.config.wrap_behavior = behavior;
        self.layout_valid = false;
        self.refresh_column_count(tileset);
    }

    pub fn draw_grid(&self) -> bool {
        self.config.show_grid
    }

    pub fn set_draw_grid(&mut self, show: bool, tileset: &Tileset) {
        if self.config.show_grid == show {
            return;
        }
        self.config.show_grid = show;
        self.layout_valid = false;
        self.refresh_column_count(tileset);
    }

    /// Recompute the column override from the viewport width.
    ///
    /// Selected tiles stay selected across the re-wrap.
    pub fn refresh_column_count(&mut self, tileset: &Tileset) {
        let columns = if self.dynamic_wrapping(tileset) {
            layout::dynamic_column_count(
                self.viewport.x,
                tileset.tile_width,
                self.scale(),
                self.config.show_grid,
            )
        } else {
            0
        };
        if columns == self.model.column_count_override() {
            return;
        }

        let selected = self.selected_tiles(tileset);
        let current = self
            .current
            .and_then(|cell| self.model.tile_at(tileset, cell))
            .map(|tile| tile.id);

        self.model.set_column_count_override(columns);
        self.dirty.take();
        self.layout_valid = false;

        self.selection = selected
            .iter()
            .filter_map(|id| self.model.tile_index_of(tileset, *id).ok())
            .collect();
        self.current = current.and_then(|id| self.model.tile_index_of(tileset, id).ok());
        self.anchor = self.current;
    }

    pub fn viewport_size(&self) -> Vec2 {
        self.viewport
    }

    pub fn set_viewport_size(&mut self, size: Vec2, tileset: &Tileset) {
        if self.viewport == size {
            return;
        }
        self.viewport = size;
        self.refresh_column_count(tileset);
        self.clamp_scroll();
    }

    pub fn scroll(&self) -> Vec2 {
        self.scroll
    }

    pub fn set_scroll(&mut self, scroll: Vec2) {
        self.scroll = scroll;
        self.clamp_scroll();
    }

    fn scroll_by(&mut self, delta: Vec2) {
        self.set_scroll(self.scroll + delta);
    }

    fn clamp_scroll(&mut self) {
        let max = (self.layout.content_size() - self.viewport).max(Vec2::ZERO);
        self.scroll = self.scroll.clamp(Vec2::ZERO, max);
    }

    fn anchor_at(&self, viewport_pos: Vec2) -> Option<(Vec2, Vec2)> {
        let size = self.layout.content_size();
        if size.x <= 0.0 || size.y <= 0.0 {
            return None;
        }
        Some(((viewport_pos + self.scroll) / size, viewport_pos))
    }

    fn scale_changed(&mut self, anchor: Option<(Vec2, Vec2)>, tileset: &Tileset) {
        self.zoom_anchor = anchor;
        self.layout_valid = false;
        self.refresh_column_count(tileset);
    }

    // --- Layout ---

    /// Current layout, recomputed if anything it depends on changed
    pub fn layout(&mut self, tileset: &Tileset) -> &GridLayout {
        self.ensure_layout(tileset);
        &self.layout
    }

    fn ensure_layout(&mut self, tileset: &Tileset) {
        if self.layout_valid {
            return;
        }
        let loaded = &self.loaded_images;
        self.layout = GridLayout::compute(
            &self.model,
            tileset,
            self.zoom.scale(),
            self.config.show_grid,
            self.dynamic_wrapping(tileset),
            &|tile: &Tile| loaded.contains(&tile.id),
        );
        self.layout_valid = true;

        if let Some((relative, viewport_pos)) = self.zoom_anchor.take() {
            self.scroll = relative * self.layout.content_size() - viewport_pos;
        }
        self.clamp_scroll();
    }

    /// Track which collection tiles have images; their cell size depends on it
    pub fn update_textures(&mut self, tileset: &Tileset, textures: &dyn TileTextures) {
        if tileset.is_atlas() {
            return;
        }
        let loaded: HashSet<TileId> = tileset
            .tiles()
            .iter()
            .filter(|tile| textures.texture(tileset, tile).is_some())
            .map(|tile| tile.id)
            .collect();
        if loaded != self.loaded_images {
            self.loaded_images = loaded;
            self.layout_valid = false;
        }
    }

    // --- Modes ---

    pub fn is_relocate_tiles(&self) -> bool {
        self.mode == InteractionMode::Relocate
    }

    /// Enter or leave relocate mode. Leaves terrain editing.
    pub fn set_relocate_tiles(&mut self, enabled: bool) {
        if enabled == self.is_relocate_tiles() {
            return;
        }
        self.mode = if enabled {
            InteractionMode::Relocate
        } else {
            InteractionMode::Normal
        };
        self.model.set_relocating(enabled);
        self.reset_interaction();
    }

    pub fn is_edit_wang_set(&self) -> bool {
        self.mode == InteractionMode::EditWang
    }

    /// Enter or leave terrain editing. Leaves relocate mode.
    pub fn set_edit_wang_set(&mut self, enabled: bool) {
        if enabled == self.is_edit_wang_set() {
            return;
        }
        if enabled && self.is_relocate_tiles() {
            self.model.set_relocating(false);
        }
        self.mode = if enabled {
            InteractionMode::EditWang
        } else {
            InteractionMode::Normal
        };
        self.reset_interaction();
    }

    fn reset_interaction(&mut self) {
        self.drag = DragState::None;
        self.hovered_wang_id = WangId::EMPTY;
        self.wang_changed = false;
        self.last_wang_change = None;
        self.process_invalidation();
    }

    /// Whether the view belongs to a tileset editor rather than a map editor
    pub fn is_editing_tileset(&self) -> bool {
        self.editing_tileset
    }

    pub fn set_editing_tileset(&mut self, editing: bool) {
        self.editing_tileset = editing;
    }

    // --- Terrain ---

    pub fn wang_set(&self) -> Option<usize> {
        self.wang_set
    }

    pub fn set_wang_set(&mut self, wang_set: Option<usize>) {
        self.wang_set = wang_set;
        self.hovered_wang_id = WangId::EMPTY;
        self.pending_usage.clear();
    }

    pub fn wang_id(&self) -> WangId {
        self.wang_id
    }

    pub fn wang_color(&self) -> u8 {
        self.wang_color
    }

    pub fn wang_behavior(&self) -> WangBehavior {
        self.wang_behavior
    }

    pub fn hovered_wang_id(&self) -> WangId {
        self.hovered_wang_id
    }

    /// Paint whole WangIds
    pub fn set_wang_id(&mut self, wang_id: WangId) {
        self.wang_id = wang_id;
        self.wang_behavior = WangBehavior::WholeId;
        if self.hovered.is_some() && !self.hovered_wang_id.is_empty() {
            self.hovered_wang_id = wang_id;
        }
    }

    /// Paint one color onto hovered edges and corners (0 erases)
    pub fn set_wang_color(&mut self, color: u8) {
        self.wang_color = color;
        self.wang_behavior = WangBehavior::HoveredIndex;
        self.hovered_wang_id = WangId::EMPTY;
    }

    // --- Selection ---

    pub fn current_cell(&self) -> Option<GridCell> {
        self.current
    }

    pub fn hovered_cell(&self) -> Option<GridCell> {
        self.hovered
    }

    pub fn is_selected(&self, cell: GridCell) -> bool {
        self.selection.contains(&cell)
    }

    /// Selected cells in row-major order
    pub fn selected_cells(&self) -> Vec<GridCell> {
        let mut cells: Vec<GridCell> = self.selection.iter().copied().collect();
        cells.sort_by_key(|cell| (cell.row, cell.col));
        cells
    }

    /// Tiles anchored at selected cells, in row-major order
    pub fn selected_tiles(&self, tileset: &Tileset) -> Vec<TileId> {
        self.selected_cells()
            .into_iter()
            .filter_map(|cell| self.model.tile_at(tileset, cell))
            .map(|tile| tile.id)
            .collect()
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn select_all(&mut self, tileset: &Tileset) {
        let all = GridRect::new(
            0,
            0,
            self.model.row_count(tileset),
            self.model.column_count(tileset),
        );
        self.selection = all
            .cells()
            .filter(|cell| self.model.cell_flags(tileset, *cell).selectable)
            .collect();
    }

    /// Select the cell showing a tile and make it current
    pub fn select_tile(&mut self, tileset: &Tileset, id: TileId) {
        if let Ok(cell) = self.model.tile_index_of(tileset, id) {
            self.select_only(cell, tileset);
        }
    }

    fn select_only(&mut self, cell: GridCell, tileset: &Tileset) {
        self.selection.clear();
        self.selection.insert(cell);
        self.anchor = Some(cell);
        self.set_current(Some(cell), tileset);
    }

    fn set_current(&mut self, cell: Option<GridCell>, tileset: &Tileset) {
        if self.current == cell {
            return;
        }
        let before = self.current.and_then(|c| self.model.tile_at(tileset, c)).map(|t| t.id);
        self.current = cell;
        let after = cell.and_then(|c| self.model.tile_at(tileset, c)).map(|t| t.id);
        if before != after {
            self.pending_actions
                .push(TilesetViewAction::CurrentTileChanged(after));
        }
    }

    fn click_select(&mut self, cell: GridCell, modifiers: Modifiers, tileset: &Tileset) {
        if modifiers.shift {
            let from = self.anchor.or(self.current).unwrap_or(cell);
            if !modifiers.ctrl {
                self.selection.clear();
            }
            for c in GridRect::from_corners(from, cell).cells() {
                if self.model.cell_flags(tileset, c).selectable {
                    self.selection.insert(c);
                }
            }
            self.set_current(Some(cell), tileset);
        } else if modifiers.ctrl {
            if !self.selection.remove(&cell) {
                self.selection.insert(cell);
            }
            self.anchor = Some(cell);
            self.set_current(Some(cell), tileset);
        } else {
            self.select_only(cell, tileset);
        }
    }

    fn move_current(&mut self, rows: i32, cols: i32, extend: bool, tileset: &Tileset) {
        let from = self.current.unwrap_or_default();
        let target = if self.current.is_none() {
            from
        } else {
            from.offset(rows, cols)
        };
        if !self.model.is_valid_cell(tileset, target) {
            return;
        }
        if extend {
            self.click_select(target, Modifiers::SHIFT, tileset);
        } else {
            self.select_only(target, tileset);
        }
    }

    /// Tile shown at a cell, with the cells it covers. Cells inside a span
    /// resolve to the spanning tile.
    fn tile_under<'a>(&self, tileset: &'a Tileset, cell: GridCell) -> Option<(&'a Tile, GridRect)> {
        if let Some(tile) = self.model.tile_at(tileset, cell) {
            let span = self.model.tile_span_size(tileset, cell);
            return Some((tile, GridRect::from_span(cell, span)));
        }
        let tile = self.model.find_spanning_tile(tileset, cell)?;
        let rect = self.model.tile_rect(tileset, tile).ok()?;
        Some((tile, rect))
    }

    /// Tile the context menu was opened on
    pub fn context_tile<'a>(&self, tileset: &'a Tileset) -> Option<&'a Tile> {
        let cell = self.context_cell?;
        self.tile_under(tileset, cell).map(|(tile, _)| tile)
    }

    // --- Document updates ---

    /// Bring the view up to date after the host applied a batch (or undo/redo)
    pub fn document_changed(&mut self, doc: &TilesetDocument, changes: &[DocumentChange]) {
        let tileset = doc.tileset();
        self.model.document_changed(tileset, changes);

        let structural = changes.iter().any(|c| {
            matches!(
                c,
                DocumentChange::TilesAdded(_)
                    | DocumentChange::TilesRemoved(_)
                    | DocumentChange::TilesRelocated
            )
        });
        self.process_invalidation();
        if structural {
            self.refresh_column_count(tileset);
        }

        for change in changes {
            let DocumentChange::WangIdsChanged { wang_set, .. } = change else {
                continue;
            };
            if Some(*wang_set) != self.wang_set {
                continue;
            }
            let Some(usage) = self.pending_usage.pop_front() else {
                continue;
            };
            let Some(set) = doc.wang_set(*wang_set) else {
                continue;
            };
            if !usage.previous.is_empty() && !set.is_wang_id_used(usage.previous) {
                self.pending_actions
                    .push(TilesetViewAction::WangIdUsedChanged(usage.previous));
            }
            if usage.was_unused && !usage.new.is_empty() {
                self.pending_actions
                    .push(TilesetViewAction::WangIdUsedChanged(usage.new));
            }
        }
    }

    /// The host failed to apply the last terrain change this view produced
    pub fn wang_change_rejected(&mut self) {
        self.pending_usage.pop_back();
        self.last_wang_change = None;
    }

    /// The tileset was replaced or reloaded outside of commands
    pub fn tileset_changed(&mut self, tileset: &Tileset) {
        self.model.tileset_changed(tileset);
        self.process_invalidation();
        self.refresh_column_count(tileset);
    }

    fn process_invalidation(&mut self) {
        match self.dirty.take() {
            Some(Invalidation::Reset) => {
                self.layout_valid = false;
                self.selection.clear();
                self.current = None;
                self.anchor = None;
                if matches!(
                    self.drag,
                    DragState::TileDrag { .. } | DragState::Marquee { .. }
                ) {
                    self.drag = DragState::None;
                }
            }
            Some(Invalidation::Range(_)) => self.layout_valid = false,
            None => {}
        }
    }

    // --- Events ---

    /// Handle one input event. Returns the edit it produced, if any.
    pub fn handle_event(&mut self, event: ViewEvent, doc: &TilesetDocument) -> Option<CommandBatch> {
        let tileset = doc.tileset();
        self.ensure_layout(tileset);

        match event {
            ViewEvent::ViewportResized(size) => {
                self.set_viewport_size(size, tileset);
                None
            }
            ViewEvent::PointerMoved { pos, .. } => self.pointer_moved(pos, doc),
            ViewEvent::PointerPressed {
                pos,
                button,
                modifiers,
            } => self.pointer_pressed(pos, button, modifiers, doc),
            ViewEvent::PointerReleased { pos, button, .. } => self.pointer_released(pos, button, doc),
            ViewEvent::PointerLeft => {
                self.hovered = None;
                self.hovered_wang_id = WangId::EMPTY;
                None
            }
            ViewEvent::Wheel {
                pos,
                pixels,
                angle,
                modifiers,
            } => {
                self.wheel(pos, pixels, angle, modifiers, tileset);
                None
            }
            ViewEvent::Zoom { pos, factor } => {
                let anchor = self.anchor_at(pos);
                if self.zoom.handle_zoom_delta(factor) {
                    self.scale_changed(anchor, tileset);
                }
                None
            }
            ViewEvent::KeyPressed { key, modifiers } => {
                self.key_pressed(key, modifiers, tileset);
                None
            }
            ViewEvent::KeyReleased { key, .. } => {
                if key == ViewKey::Space {
                    self.space_held = false;
                }
                None
            }
        }
    }

    fn pointer_pressed(
        &mut self,
        pos: Vec2,
        button: PointerButton,
        modifiers: Modifiers,
        doc: &TilesetDocument,
    ) -> Option<CommandBatch> {
        let tileset = doc.tileset();
        let content = pos + self.scroll;
        let cell = self.layout.cell_at(content);
        self.hovered = cell;

        if button == PointerButton::Middle || (button == PointerButton::Primary && self.space_held) {
            self.drag = DragState::Pan { last: pos, button };
            return None;
        }

        match self.mode {
            InteractionMode::EditWang => {
                match button {
                    PointerButton::Primary => {
                        self.update_wang_hover(content, doc);
                        self.drag = DragState::WangPaint;
                        return self.apply_wang_id(doc);
                    }
                    PointerButton::Secondary => {
                        self.context_cell = cell;
                        if let Some(cell) = cell {
                            self.select_only(cell, tileset);
                        }
                    }
                    PointerButton::Middle => {}
                }
                None
            }
            InteractionMode::Relocate if tileset.is_atlas() => {
                if button == PointerButton::Middle || !self.shows_atlas_cells(tileset) {
                    return None;
                }
                let Some(cell) = self.layout.cell_at_clamped(content) else {
                    return None;
                };
                self.drag = DragState::Marquee {
                    origin: content,
                    current: content,
                    button,
                    snap: !modifiers.alt,
                };
                self.selection.clear();
                self.selection.insert(cell);
                None
            }
            _ => {
                let selectable = cell.filter(|c| self.model.cell_flags(tileset, *c).selectable);
                if button == PointerButton::Secondary {
                    self.context_cell = cell;
                    if let Some(cell) = selectable {
                        if !self.selection.contains(&cell) {
                            self.select_only(cell, tileset);
                        }
                    }
                    return None;
                }

                let drag_enabled = self.mode == InteractionMode::Relocate;
                match selectable {
                    None => {
                        if !modifiers.ctrl && !modifiers.shift {
                            self.selection.clear();
                        }
                        self.drag = DragState::Pressed {
                            origin: content,
                            cell: None,
                            tile_drag: false,
                            modifiers,
                        };
                    }
                    Some(cell) => {
                        let tile_drag = drag_enabled
                            && self.selection.contains(&cell)
                            && self.model.cell_flags(tileset, cell).draggable
                            && !modifiers.ctrl
                            && !modifiers.shift;
                        if !tile_drag {
                            self.click_select(cell, modifiers, tileset);
                        }
                        self.drag = DragState::Pressed {
                            origin: content,
                            cell: Some(cell),
                            tile_drag,
                            modifiers,
                        };
                    }
                }
                None
            }
        }
    }

    fn pointer_moved(&mut self, pos: Vec2, doc: &TilesetDocument) -> Option<CommandBatch> {
        let tileset = doc.tileset();
        let content = pos + self.scroll;
        let cell = self.layout.cell_at(content);
        self.hovered = cell;

        self.drag = match std::mem::take(&mut self.drag) {
            DragState::Pan { last, button } => {
                self.scroll_by(last - pos);
                DragState::Pan { last: pos, button }
            }
            DragState::Pressed {
                origin,
                cell: pressed_cell,
                tile_drag,
                modifiers,
            } => {
                if content.distance(origin) < DRAG_THRESHOLD {
                    DragState::Pressed {
                        origin,
                        cell: pressed_cell,
                        tile_drag,
                        modifiers,
                    }
                } else if tile_drag {
                    match self.model.mime_data(tileset, &self.selected_cells()) {
                        Some(payload) => DragState::TileDrag {
                            payload,
                            target: cell,
                        },
                        None => DragState::None,
                    }
                } else {
                    let base = if modifiers.ctrl {
                        self.selection.clone()
                    } else {
                        HashSet::new()
                    };
                    self.update_rubber_band(origin, content, &base, tileset);
                    DragState::RubberBand {
                        origin,
                        current: content,
                        base,
                    }
                }
            }
            DragState::RubberBand { origin, base, .. } => {
                self.update_rubber_band(origin, content, &base, tileset);
                DragState::RubberBand {
                    origin,
                    current: content,
                    base,
                }
            }
            DragState::Marquee {
                origin,
                button,
                snap,
                ..
            } => {
                if let Some(cells) = self.marquee_cells(origin, content) {
                    self.selection = cells.cells().collect();
                }
                DragState::Marquee {
                    origin,
                    current: content,
                    button,
                    snap,
                }
            }
            DragState::TileDrag { payload, .. } => DragState::TileDrag {
                payload,
                target: cell,
            },
            other => other,
        };

        if self.mode == InteractionMode::EditWang {
            self.update_wang_hover(content, doc);
            if matches!(self.drag, DragState::WangPaint) {
                return self.apply_wang_id(doc);
            }
        }
        None
    }

    fn pointer_released(
        &mut self,
        pos: Vec2,
        button: PointerButton,
        doc: &TilesetDocument,
    ) -> Option<CommandBatch> {
        let tileset = doc.tileset();
        let content = pos + self.scroll;

        match std::mem::take(&mut self.drag) {
            DragState::Pan { button: held, .. } if held != button => {
                self.drag = DragState::Pan { last: pos, button: held };
                None
            }
            DragState::Pan { .. } => None,
            DragState::Pressed {
                cell: Some(cell),
                tile_drag: true,
                ..
            } => {
                // A click on a selected tile without dragging selects just it
                self.select_only(cell, tileset);
                None
            }
            DragState::Pressed { .. } | DragState::RubberBand { .. } => None,
            DragState::TileDrag { payload, .. } => {
                let target = self.layout.cell_at(content);
                let command =
                    self.model
                        .drop_mime_data(tileset, &payload, DropAction::Move, target)?;
                Some(CommandBatch::single("Relocate Tiles", command))
            }
            DragState::Marquee {
                origin,
                button: held,
                snap,
                current,
            } => {
                if held != button {
                    self.drag = DragState::Marquee {
                        origin,
                        current,
                        button: held,
                        snap,
                    };
                    return None;
                }
                let batch = self.finish_marquee(origin, content, button, snap, tileset);
                self.selection.clear();
                batch
            }
            DragState::WangPaint => {
                if button != PointerButton::Primary {
                    self.drag = DragState::WangPaint;
                    return None;
                }
                self.finish_wang_id_change()
            }
            DragState::None => None,
        }
    }

    fn update_rubber_band(
        &mut self,
        origin: Vec2,
        current: Vec2,
        base: &HashSet<GridCell>,
        tileset: &Tileset,
    ) {
        let mut selection = base.clone();
        if let Some(cells) = self
            .layout
            .cells_intersecting(Rect::from_corners(origin, current))
        {
            for cell in cells.cells() {
                if self.model.cell_flags(tileset, cell).selectable {
                    selection.insert(cell);
                }
            }
        }
        self.selection = selection;
    }

    fn marquee_cells(&self, origin: Vec2, current: Vec2) -> Option<GridRect> {
        let a = self.layout.cell_at_clamped(origin)?;
        let b = self.layout.cell_at_clamped(current)?;
        Some(GridRect::from_corners(a, b))
    }

    /// Whether view cells are atlas cells. Marquee edits turn view positions
    /// into atlas pixels and need this.
    fn shows_atlas_cells(&self, tileset: &Tileset) -> bool {
        tileset.is_atlas() && self.model.column_count(tileset) == tileset.columns
    }

    /// Span edit for a finished atlas marquee
    fn finish_marquee(
        &self,
        origin: Vec2,
        end: Vec2,
        button: PointerButton,
        snap: bool,
        tileset: &Tileset,
    ) -> Option<CommandBatch> {
        if !self.shows_atlas_cells(tileset) {
            debug!(
                "Ignoring atlas marquee: view shows {} columns, atlas has {}",
                self.model.column_count(tileset),
                tileset.columns
            );
            return None;
        }
        let cells = self.marquee_cells(origin, end)?;
        let single = cells.width == 1 && cells.height == 1;
        let metrics = tileset.metrics();
        let extra = grid_extra(self.config.show_grid);
        let free_rect = || -> Option<PixelRect> {
            let a = self.layout.atlas_pixel(origin, &metrics, extra)?;
            let b = self.layout.atlas_pixel(end, &metrics, extra)?;
            Some(PixelRect::from_points(a, b))
        };

        match button {
            PointerButton::Primary if snap => {
                if single && self.model.is_cell_covered_by_span(tileset, cells.origin()) {
                    return None;
                }
                merge_span(
                    &self.model,
                    tileset,
                    cells.row,
                    cells.bottom(),
                    cells.col,
                    cells.right(),
                )
            }
            PointerButton::Primary => create_tile(tileset, free_rect()?),
            PointerButton::Secondary if single => {
                let cell = cells.origin();
                let (tile, span) = self.tile_under(tileset, cell)?;
                if span.width > 1 || span.height > 1 {
                    return split_span(
                        &self.model,
                        tileset,
                        tile.id,
                        cell.row - span.row,
                        cell.col - span.col,
                    );
                }
                Some(CommandBatch::single(
                    "Remove Tiles",
                    TileCommand::RemoveTiles(vec![tile.id]),
                ))
            }
            PointerButton::Secondary => {
                let rect = if snap {
                    metrics.cell_to_pixel(cells)
                } else {
                    free_rect()?
                };
                remove_tiles_intersecting(tileset, rect)
            }
            PointerButton::Middle => None,
        }
    }

    fn wheel(&mut self, pos: Vec2, pixels: Vec2, angle: f32, modifiers: Modifiers, tileset: &Tileset) {
        let dynamic = self.dynamic_wrapping(tileset);
        let zooms = !dynamic && self.config.wheel_zooms_by_default;
        if zooms != modifiers.ctrl {
            let anchor = self.anchor_at(pos);
            if self.zoom.handle_wheel_delta(angle) {
                self.scale_changed(anchor, tileset);
            }
            return;
        }

        let delta = if modifiers.shift && pixels.x == 0.0 {
            Vec2::new(pixels.y, 0.0)
        } else {
            pixels
        };
        self.scroll_by(-delta);
    }

    fn key_pressed(&mut self, key: ViewKey, modifiers: Modifiers, tileset: &Tileset) {
        match key {
            ViewKey::Space => self.space_held = true,
            ViewKey::Escape => {
                if matches!(
                    self.drag,
                    DragState::Marquee { .. } | DragState::RubberBand { .. } | DragState::TileDrag { .. }
                ) {
                    self.drag = DragState::None;
                }
                self.selection.clear();
            }
            ViewKey::Equals if modifiers.ctrl => self.zoom_in(tileset),
            ViewKey::Minus if modifiers.ctrl => self.zoom_out(tileset),
            ViewKey::Zero if modifiers.ctrl => self.reset_zoom(tileset),
            ViewKey::A if modifiers.ctrl => self.select_all(tileset),
            ViewKey::Up => self.move_current(-1, 0, modifiers.shift, tileset),
            ViewKey::Down => self.move_current(1, 0, modifiers.shift, tileset),
            ViewKey::Left => self.move_current(0, -1, modifiers.shift, tileset),
            ViewKey::Right => self.move_current(0, 1, modifiers.shift, tileset),
            ViewKey::Z | ViewKey::X | ViewKey::Y => {
                if self.mode != InteractionMode::EditWang
                    || self.wang_behavior != WangBehavior::WholeId
                    || modifiers.ctrl
                {
                    return;
                }
                let mut wang_id = self.wang_id;
                match key {
                    ViewKey::Z if modifiers.shift => wang_id.rotate(-1),
                    ViewKey::Z => wang_id.rotate(1),
                    ViewKey::X => wang_id.flip_horizontally(),
                    _ => wang_id.flip_vertically(),
                }
                if wang_id != self.wang_id {
                    self.set_wang_id(wang_id);
                    self.pending_actions
                        .push(TilesetViewAction::CurrentWangIdChanged(wang_id));
                }
            }
            _ => {}
        }
    }

    // --- Terrain painting ---

    /// Overlay rect of a tile in content coordinates
    fn overlay_rect(&self, cells: GridRect) -> Option<Rect> {
        let rect = self.layout.grid_rect(cells)?;
        let extra = grid_extra(self.config.show_grid);
        Some(Rect::from_corners(rect.min, rect.max - Vec2::splat(extra)))
    }

    fn update_wang_hover(&mut self, content: Vec2, doc: &TilesetDocument) {
        let tileset = doc.tileset();
        let wang_set = self.wang_set.and_then(|index| doc.wang_set(index));
        let hovered = self.hovered.and_then(|cell| self.tile_under(tileset, cell));

        self.hovered_wang_id = match (wang_set, hovered) {
            (Some(set), Some((_, cells))) => match self.wang_behavior {
                WangBehavior::WholeId => self.wang_id,
                WangBehavior::HoveredIndex => self
                    .overlay_rect(cells)
                    .and_then(|rect| {
                        let (target, transform) = wang_overlay::overlay_transform(tileset, rect);
                        let fraction = wang_overlay::tile_fraction(content, target, transform);
                        wang_overlay::hovered_index(set.kind, fraction)
                    })
                    .map(|index| wang_overlay::hover_wang_id(index, self.wang_color))
                    .unwrap_or(WangId::EMPTY),
            },
            _ => WangId::EMPTY,
        };
    }

    /// Assign the hovered WangId to the hovered tile
    fn apply_wang_id(&mut self, doc: &TilesetDocument) -> Option<CommandBatch> {
        let set_index = self.wang_set?;
        let set = doc.wang_set(set_index)?;
        let (tile, _) = self.tile_under(doc.tileset(), self.hovered?)?;

        let previous = set.wang_id_of_tile(tile.id);
        let new = match self.wang_behavior {
            WangBehavior::WholeId => self.wang_id,
            WangBehavior::HoveredIndex => {
                let mut wang_id = previous;
                for index in WangIndex::ALL {
                    if self.hovered_wang_id.index_color(index) != 0 {
                        wang_id.set_index_color(index, self.wang_color);
                    }
                }
                wang_id
            }
        };
        if new == previous || self.last_wang_change == Some((tile.id, new)) {
            return None;
        }

        self.pending_usage.push_back(WangUsage {
            previous,
            new,
            was_unused: !set.is_wang_id_used(new),
        });
        self.wang_changed = true;
        self.last_wang_change = Some((tile.id, new));

        Some(CommandBatch::single(
            "Change Tile Terrain",
            TileCommand::ChangeWangIds {
                wang_set: set_index,
                changes: vec![(tile.id, new)],
            },
        ))
    }

    fn finish_wang_id_change(&mut self) -> Option<CommandBatch> {
        self.last_wang_change = None;
        if !std::mem::take(&mut self.wang_changed) {
            return None;
        }
        Some(CommandBatch::single(
            "Change Tile Terrain",
            TileCommand::FinishWangIdChange,
        ))
    }

    // --- Context menu ---

    pub fn menu_entries(&self, doc: &TilesetDocument) -> Vec<MenuEntry> {
        context_menu::menu_entries(self, doc)
    }

    /// Run a context menu entry
    pub fn activate_menu_entry(&mut self, entry: MenuEntry, doc: &TilesetDocument) {
        let tileset = doc.tileset();
        let tile = self.context_tile(tileset).map(|tile| tile.id);
        match entry {
            MenuEntry::UseAsTerrainSetImage => {
                if let Some(tile) = tile {
                    self.pending_actions
                        .push(TilesetViewAction::WangSetImageSelected(tile));
                }
            }
            MenuEntry::UseAsTerrainImage => {
                if let Some(tile) = tile {
                    self.pending_actions
                        .push(TilesetViewAction::WangColorImageSelected {
                            tile,
                            color: self.wang_color,
                        });
                }
            }
            MenuEntry::TileProperties => {
                if let Some(tile) = tile {
                    self.pending_actions
                        .push(TilesetViewAction::EditTileProperties(tile));
                }
            }
            MenuEntry::SwapTiles { .. } => {
                if let [a, b] = self.selected_tiles(tileset).as_slice() {
                    self.pending_actions
                        .push(TilesetViewAction::SwapTiles(*a, *b));
                }
            }
            MenuEntry::ShowGrid { checked } => {
                self.set_draw_grid(!checked, tileset);
                self.pending_actions
                    .push(TilesetViewAction::ShowGridChanged(!checked));
            }
            MenuEntry::SelectAllTiles => self.select_all(tileset),
            MenuEntry::Separator => {}
        }
    }

    // --- egui ---

    /// Show the view in the remaining space of `ui`. Returns the edits made
    /// this frame, in order.
    pub fn ui(
        &mut self,
        ui: &mut egui::Ui,
        doc: &TilesetDocument,
        textures: &dyn TileTextures,
    ) -> Vec<CommandBatch> {
        let tileset = doc.tileset();
        let size = ui.available_size().max(egui::vec2(1.0, 1.0));
        let (response, painter) = ui.allocate_painter(size, egui::Sense::click_and_drag());
        if response.clicked() || response.drag_started() || response.secondary_clicked() {
            response.request_focus();
        }

        self.update_textures(tileset, textures);

        let events = self.input.collect(ui, &response);
        let mut batches = Vec::new();
        for event in events {
            if let Some(batch) = self.handle_event(event, doc) {
                batches.push(batch);
            }
        }

        self.ensure_layout(tileset);
        self.paint(&painter, response.rect.min, doc, textures);

        if self.mode != InteractionMode::Relocate {
            response.context_menu(|ui| {
                context_menu::show_context_menu(ui, self, doc);
            });
        }

        batches
    }

    /// Paint the visible cells and drag feedback. `origin` is the screen
    /// position of the viewport's top-left corner.
    pub fn paint(
        &self,
        painter: &egui::Painter,
        origin: egui::Pos2,
        doc: &TilesetDocument,
        textures: &dyn TileTextures,
    ) {
        let tileset = doc.tileset();
        let viewport = egui::Rect::from_min_size(origin, egui::vec2(self.viewport.x, self.viewport.y));
        let painter = painter.with_clip_rect(viewport.intersect(painter.clip_rect()));
        painter.rect_filled(viewport, 0.0, delegate::background_color(tileset));

        let to_screen = |rect: Rect| -> egui::Rect {
            egui::Rect::from_min_max(
                egui::pos2(origin.x + rect.min.x - self.scroll.x, origin.y + rect.min.y - self.scroll.y),
                egui::pos2(origin.x + rect.max.x - self.scroll.x, origin.y + rect.max.y - self.scroll.y),
            )
        };

        let style = DelegateStyle {
            scale: self.scale(),
            draw_grid: self.config.show_grid,
            dynamic_wrapping: self.dynamic_wrapping(tileset),
            relocating: self.mode == InteractionMode::Relocate,
            mark_animated_tiles: self.config.mark_animated_tiles,
            highlight: self.config.highlight(),
        };
        let wang_set = if self.mode == InteractionMode::EditWang {
            self.wang_set.and_then(|index| doc.wang_set(index))
        } else {
            None
        };
        let hovered_tile = self
            .hovered
            .and_then(|cell| self.tile_under(tileset, cell))
            .map(|(tile, _)| tile.id);

        let visible = Rect::from_corners(self.scroll, self.scroll + self.viewport);
        let Some(range) = self.layout.cells_intersecting(visible) else {
            return;
        };

        let mut painted_spans: HashSet<TileId> = HashSet::new();
        for cell in range.cells() {
            let under = self.tile_under(tileset, cell);
            if let Some((tile, cells)) = under {
                // Spans are painted once, from whichever covered cell comes first
                if (cells.width > 1 || cells.height > 1) && !painted_spans.insert(tile.id) {
                    continue;
                }
            }

            let Some((tile, cells)) = under else {
                if self.model.is_cell_covered_by_span(tileset, cell) {
                    continue;
                }
                let Some(rect) = self.layout.cell_rect(cell) else {
                    continue;
                };
                let screen = to_screen(rect);
                if style.draw_grid {
                    delegate::paint_grid_lines(&painter, screen);
                }
                let inner = style.inner_rect(screen);
                if style.relocating && tileset.is_atlas() {
                    painter.rect_stroke(
                        inner,
                        0.0,
                        egui::Stroke::new(1.0, style.highlight.gamma_multiply(0.5)),
                        egui::StrokeKind::Inside,
                    );
                }
                if self.selection.contains(&cell) {
                    painter.rect_filled(inner, 0.0, style.highlight.gamma_multiply(0.5));
                }
                continue;
            };

            let Some(rect) = self.layout.grid_rect(cells) else {
                continue;
            };
            let screen = to_screen(rect);
            if style.draw_grid {
                delegate::paint_grid_lines(&painter, screen);
            }
            let selected = self.selection.contains(&cells.origin());
            delegate::paint_tile(&painter, tileset, tile, screen, selected, &style, textures);

            if let Some(set) = wang_set {
                let Some(overlay) = self.overlay_rect(cells).map(to_screen) else {
                    continue;
                };
                let overlay = Rect::new(overlay.min.x, overlay.min.y, overlay.max.x, overlay.max.y);
                let (target, transform) = wang_overlay::overlay_transform(tileset, overlay);
                let assigned = set.wang_id_of_tile(tile.id).masked(set.kind);
                wang_overlay::paint_wang_overlay(&painter, assigned, set, target, transform, 1.0);
                if hovered_tile == Some(tile.id) && !self.hovered_wang_id.is_empty() {
                    wang_overlay::paint_wang_overlay(
                        &painter,
                        self.hovered_wang_id.masked(set.kind),
                        set,
                        target,
                        transform,
                        0.5,
                    );
                }
            } else if hovered_tile == Some(tile.id) && self.mode != InteractionMode::Relocate {
                painter.rect_stroke(
                    style.inner_rect(screen),
                    0.0,
                    egui::Stroke::new(1.0, style.highlight.gamma_multiply(0.6)),
                    egui::StrokeKind::Inside,
                );
            }
        }

        self.paint_drag_feedback(&painter, &style, to_screen);
    }

    fn paint_drag_feedback(
        &self,
        painter: &egui::Painter,
        style: &DelegateStyle,
        to_screen: impl Fn(Rect) -> egui::Rect,
    ) {
        match &self.drag {
            DragState::RubberBand { origin, current, .. } => {
                let rect = to_screen(Rect::from_corners(*origin, *current));
                painter.rect_filled(rect, 0.0, style.highlight.gamma_multiply(0.2));
                painter.rect_stroke(
                    rect,
                    0.0,
                    egui::Stroke::new(1.0, style.highlight),
                    egui::StrokeKind::Inside,
                );
            }
            DragState::Marquee {
                origin,
                current,
                snap,
                ..
            } => {
                let rect = if *snap {
                    self.marquee_cells(*origin, *current)
                        .and_then(|cells| self.layout.grid_rect(cells))
                } else {
                    Some(Rect::from_corners(*origin, *current))
                };
                if let Some(rect) = rect {
                    painter.rect_stroke(
                        to_screen(rect),
                        0.0,
                        egui::Stroke::new(2.0, style.highlight),
                        egui::StrokeKind::Inside,
                    );
                }
            }
            DragState::TileDrag {
                target: Some(target),
                ..
            } => {
                if let Some(rect) = self.layout.cell_rect(*target) {
                    painter.rect_stroke(
                        to_screen(rect),
                        0.0,
                        egui::Stroke::new(2.0, style.highlight),
                        egui::StrokeKind::Outside,
                    );
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_map_tileset::{SpanSize, WangColor, WangSet, WangSetType};

    fn atlas_doc() -> TilesetDocument {
        let tileset = Tileset::new_atlas("Ground".to_string(), 16, 16, 4, 4);
        TilesetDocument::new(tileset).with_wang_set(
            WangSet::new("Terrain", WangSetType::Corner)
                .with_color(WangColor::new("Grass", [60, 180, 60]))
                .with_color(WangColor::new("Water", [40, 90, 220])),
        )
    }

    fn collection_doc(count: i32) -> TilesetDocument {
        let mut tileset = Tileset::new_collection("Props".to_string(), 16, 16);
        for i in 0..count {
            tileset.push_tile(Tile::with_image(TileId(i), format!("prop_{i}.png"), 16, 16));
        }
        TilesetDocument::new(tileset)
    }

    fn view_for(doc: &TilesetDocument) -> TilesetView {
        let mut view = TilesetView::new(doc.tileset(), ViewConfig::default());
        view.handle_event(ViewEvent::ViewportResized(Vec2::new(200.0, 200.0)), doc);
        view
    }

    /// Center of a cell with the default 16px tiles and grid lines
    fn cell_pos(row: i32, col: i32) -> Vec2 {
        Vec2::new(col as f32 * 17.0 + 8.0, row as f32 * 17.0 + 8.0)
    }

    fn press(
        view: &mut TilesetView,
        doc: &TilesetDocument,
        pos: Vec2,
        button: PointerButton,
        modifiers: Modifiers,
    ) -> Option<CommandBatch> {
        view.handle_event(ViewEvent::PointerPressed { pos, button, modifiers }, doc)
    }

    fn move_to(view: &mut TilesetView, doc: &TilesetDocument, pos: Vec2) -> Option<CommandBatch> {
        view.handle_event(
            ViewEvent::PointerMoved {
                pos,
                modifiers: Modifiers::NONE,
            },
            doc,
        )
    }

    fn release(
        view: &mut TilesetView,
        doc: &TilesetDocument,
        pos: Vec2,
        button: PointerButton,
    ) -> Option<CommandBatch> {
        view.handle_event(
            ViewEvent::PointerReleased {
                pos,
                button,
                modifiers: Modifiers::NONE,
            },
            doc,
        )
    }

    fn click(view: &mut TilesetView, doc: &TilesetDocument, pos: Vec2, modifiers: Modifiers) {
        press(view, doc, pos, PointerButton::Primary, modifiers);
        release(view, doc, pos, PointerButton::Primary);
    }

    fn apply(view: &mut TilesetView, doc: &mut TilesetDocument, batch: CommandBatch) {
        let changes = doc.apply_batch(batch).unwrap();
        view.document_changed(doc, &changes);
    }

    #[test]
    fn test_click_selects_and_reports_current_tile() {
        let doc = atlas_doc();
        let mut view = view_for(&doc);
        click(&mut view, &doc, cell_pos(1, 2), Modifiers::NONE);

        assert_eq!(view.selected_cells(), vec![GridCell::new(1, 2)]);
        assert_eq!(view.current_cell(), Some(GridCell::new(1, 2)));
        assert_eq!(
            view.take_actions(),
            vec![TilesetViewAction::CurrentTileChanged(Some(TileId(6)))]
        );
    }

    #[test]
    fn test_ctrl_click_toggles() {
        let doc = atlas_doc();
        let mut view = view_for(&doc);
        click(&mut view, &doc, cell_pos(0, 0), Modifiers::NONE);
        click(&mut view, &doc, cell_pos(0, 1), Modifiers::CTRL);
        assert_eq!(view.selected_cells().len(), 2);

        click(&mut view, &doc, cell_pos(0, 1), Modifiers::CTRL);
        assert_eq!(view.selected_cells(), vec![GridCell::new(0, 0)]);
    }

    #[test]
    fn test_shift_click_selects_range() {
        let doc = atlas_doc();
        let mut view = view_for(&doc);
        click(&mut view, &doc, cell_pos(0, 0), Modifiers::NONE);
        click(&mut view, &doc, cell_pos(1, 1), Modifiers::SHIFT);
        assert_eq!(
            view.selected_cells(),
            vec![
                GridCell::new(0, 0),
                GridCell::new(0, 1),
                GridCell::new(1, 0),
                GridCell::new(1, 1),
            ]
        );
    }

    #[test]
    fn test_rubber_band_selects_without_edits() {
        let doc = atlas_doc();
        let mut view = view_for(&doc);
        press(&mut view, &doc, Vec2::new(2.0, 2.0), PointerButton::Primary, Modifiers::NONE);
        assert!(move_to(&mut view, &doc, Vec2::new(30.0, 30.0)).is_none());
        assert!(release(&mut view, &doc, Vec2::new(30.0, 30.0), PointerButton::Primary).is_none());
        assert_eq!(view.selected_cells().len(), 4);
    }

    #[test]
    fn test_normal_mode_never_drags_tiles() {
        let doc = collection_doc(3);
        let mut view = view_for(&doc);
        click(&mut view, &doc, cell_pos(0, 0), Modifiers::NONE);

        press(&mut view, &doc, cell_pos(0, 0), PointerButton::Primary, Modifiers::NONE);
        move_to(&mut view, &doc, cell_pos(0, 2));
        assert!(release(&mut view, &doc, cell_pos(0, 2), PointerButton::Primary).is_none());
    }

    #[test]
    fn test_relocate_drag_moves_collection_tile() {
        let mut doc = collection_doc(3);
        let mut view = view_for(&doc);
        view.set_relocate_tiles(true);
        click(&mut view, &doc, cell_pos(0, 0), Modifiers::NONE);

        press(&mut view, &doc, cell_pos(0, 0), PointerButton::Primary, Modifiers::NONE);
        move_to(&mut view, &doc, cell_pos(0, 2));
        let batch = release(&mut view, &doc, cell_pos(0, 2), PointerButton::Primary).unwrap();
        assert_eq!(
            batch.commands,
            vec![TileCommand::RelocateTiles {
                tiles: vec![TileId(0)],
                location: 2,
            }]
        );

        apply(&mut view, &mut doc, batch);
        let ts = doc.tileset();
        assert_eq!(view.model().tile_at(ts, GridCell::new(0, 2)).map(|t| t.id), Some(TileId(0)));
    }

    #[test]
    fn test_relocate_click_on_selected_tile_selects_only_it() {
        let doc = collection_doc(3);
        let mut view = view_for(&doc);
        view.set_relocate_tiles(true);
        click(&mut view, &doc, cell_pos(0, 0), Modifiers::NONE);
        click(&mut view, &doc, cell_pos(0, 1), Modifiers::CTRL);
        assert_eq!(view.selected_cells().len(), 2);

        click(&mut view, &doc, cell_pos(0, 1), Modifiers::NONE);
        assert_eq!(view.selected_cells(), vec![GridCell::new(0, 1)]);
    }

    #[test]
    fn test_relocate_marquee_merges_atlas_cells() {
        let mut doc = atlas_doc();
        let mut view = view_for(&doc);
        view.set_relocate_tiles(true);

        press(&mut view, &doc, cell_pos(0, 0), PointerButton::Primary, Modifiers::NONE);
        move_to(&mut view, &doc, cell_pos(1, 1));
        assert_eq!(view.selected_cells().len(), 4);
        let batch = release(&mut view, &doc, cell_pos(1, 1), PointerButton::Primary).unwrap();
        assert_eq!(batch.description, "Merge Tiles");
        assert!(view.selected_cells().is_empty());

        apply(&mut view, &mut doc, batch);
        let ts = doc.tileset();
        assert_eq!(
            view.model().tile_span_size(ts, GridCell::new(0, 0)),
            SpanSize::new(2, 2)
        );
        assert!(view.model().is_cell_covered_by_span(ts, GridCell::new(1, 1)));
    }

    #[test]
    fn test_relocate_click_on_covered_cell_is_ignored() {
        let mut doc = atlas_doc();
        let mut view = view_for(&doc);
        view.set_relocate_tiles(true);
        press(&mut view, &doc, cell_pos(0, 0), PointerButton::Primary, Modifiers::NONE);
        let batch = release(&mut view, &doc, cell_pos(0, 1), PointerButton::Primary).unwrap();
        apply(&mut view, &mut doc, batch);

        press(&mut view, &doc, cell_pos(0, 1), PointerButton::Primary, Modifiers::NONE);
        assert!(release(&mut view, &doc, cell_pos(0, 1), PointerButton::Primary).is_none());
    }

    #[test]
    fn test_relocate_right_click_removes_or_splits() {
        let mut doc = atlas_doc();
        let mut view = view_for(&doc);
        view.set_relocate_tiles(true);

        press(&mut view, &doc, cell_pos(3, 3), PointerButton::Secondary, Modifiers::NONE);
        let batch = release(&mut view, &doc, cell_pos(3, 3), PointerButton::Secondary).unwrap();
        assert_eq!(batch.commands, vec![TileCommand::RemoveTiles(vec![TileId(15)])]);

        press(&mut view, &doc, cell_pos(0, 0), PointerButton::Primary, Modifiers::NONE);
        let batch = release(&mut view, &doc, cell_pos(1, 1), PointerButton::Primary).unwrap();
        apply(&mut view, &mut doc, batch);

        // Clicking the origin of a span dissolves it
        press(&mut view, &doc, cell_pos(0, 0), PointerButton::Secondary, Modifiers::NONE);
        let batch = release(&mut view, &doc, cell_pos(0, 0), PointerButton::Secondary).unwrap();
        apply(&mut view, &mut doc, batch);
        let ts = doc.tileset();
        assert_eq!(
            view.model().tile_span_size(ts, GridCell::new(0, 0)),
            SpanSize::SINGLE
        );
        assert!(view.model().tile_at(ts, GridCell::new(1, 1)).is_some());
    }

    #[test]
    fn test_relocate_right_drag_removes_intersecting() {
        let doc = atlas_doc();
        let mut view = view_for(&doc);
        view.set_relocate_tiles(true);

        press(&mut view, &doc, cell_pos(0, 0), PointerButton::Secondary, Modifiers::NONE);
        move_to(&mut view, &doc, cell_pos(0, 1));
        let batch = release(&mut view, &doc, cell_pos(0, 1), PointerButton::Secondary).unwrap();
        assert_eq!(
            batch.commands,
            vec![TileCommand::RemoveTiles(vec![TileId(0), TileId(1)])]
        );
    }

    #[test]
    fn test_rewrapped_atlas_ignores_marquee_edits() {
        let doc = atlas_doc();
        let mut view = view_for(&doc);
        view.set_wrap_behavior(WrapBehavior::Dynamic, doc.tileset());
        assert_eq!(view.model().column_count(doc.tileset()), 11);
        view.set_relocate_tiles(true);

        // View cells (1, 0) and (1, 1) show atlas tiles 11 and 12
        for (button, modifiers) in [
            (PointerButton::Secondary, Modifiers::NONE),
            (PointerButton::Primary, Modifiers::NONE),
            (PointerButton::Primary, Modifiers::ALT),
        ] {
            press(&mut view, &doc, cell_pos(1, 0), button, modifiers);
            move_to(&mut view, &doc, cell_pos(1, 1));
            assert!(release(&mut view, &doc, cell_pos(1, 1), button).is_none());
            assert!(view.selected_cells().is_empty());
        }

        view.set_wrap_behavior(WrapBehavior::Fixed, doc.tileset());
        press(&mut view, &doc, cell_pos(1, 0), PointerButton::Secondary, Modifiers::NONE);
        move_to(&mut view, &doc, cell_pos(1, 1));
        let batch = release(&mut view, &doc, cell_pos(1, 1), PointerButton::Secondary).unwrap();
        assert_eq!(
            batch.commands,
            vec![TileCommand::RemoveTiles(vec![TileId(4), TileId(5)])]
        );
    }

    #[test]
    fn test_escape_cancels_marquee() {
        let doc = atlas_doc();
        let mut view = view_for(&doc);
        view.set_relocate_tiles(true);
        press(&mut view, &doc, cell_pos(0, 0), PointerButton::Primary, Modifiers::NONE);
        move_to(&mut view, &doc, cell_pos(1, 1));
        view.handle_event(
            ViewEvent::KeyPressed {
                key: ViewKey::Escape,
                modifiers: Modifiers::NONE,
            },
            &doc,
        );
        assert!(release(&mut view, &doc, cell_pos(1, 1), PointerButton::Primary).is_none());
        assert!(view.selected_cells().is_empty());
    }

    #[test]
    fn test_modes_are_exclusive() {
        let doc = atlas_doc();
        let mut view = view_for(&doc);
        view.set_relocate_tiles(true);
        assert!(view.model().is_relocating());

        view.set_edit_wang_set(true);
        assert!(view.is_edit_wang_set());
        assert!(!view.is_relocate_tiles());
        assert!(!view.model().is_relocating());

        view.set_relocate_tiles(true);
        assert!(!view.is_edit_wang_set());
    }

    #[test]
    fn test_wheel_zoom_needs_ctrl_by_default() {
        let doc = atlas_doc();
        let mut view = view_for(&doc);
        let wheel = |modifiers| ViewEvent::Wheel {
            pos: Vec2::new(10.0, 10.0),
            pixels: Vec2::new(0.0, 40.0),
            angle: 120.0,
            modifiers,
        };

        view.handle_event(wheel(Modifiers::NONE), &doc);
        assert_eq!(view.scale(), 1.0);
        view.handle_event(wheel(Modifiers::CTRL), &doc);
        assert!(view.scale() > 1.0);
    }

    #[test]
    fn test_wheel_zooms_by_default_only_without_dynamic_wrapping() {
        let config = ViewConfig {
            wheel_zooms_by_default: true,
            ..ViewConfig::default()
        };
        let wheel = ViewEvent::Wheel {
            pos: Vec2::new(10.0, 10.0),
            pixels: Vec2::new(0.0, 40.0),
            angle: 120.0,
            modifiers: Modifiers::NONE,
        };

        let doc = atlas_doc();
        let mut view = TilesetView::new(doc.tileset(), config.clone());
        view.handle_event(wheel, &doc);
        assert!(view.scale() > 1.0);

        let doc = collection_doc(4);
        let mut view = TilesetView::new(doc.tileset(), config);
        view.handle_event(wheel, &doc);
        assert_eq!(view.scale(), 1.0);
    }

    #[test]
    fn test_selection_survives_rewrap() {
        let doc = collection_doc(6);
        let mut view = view_for(&doc);
        assert_eq!(view.model().column_count(doc.tileset()), 11);
        click(&mut view, &doc, cell_pos(0, 5), Modifiers::NONE);

        view.handle_event(ViewEvent::ViewportResized(Vec2::new(60.0, 200.0)), &doc);
        assert_eq!(view.model().column_count(doc.tileset()), 3);
        assert_eq!(view.selected_cells(), vec![GridCell::new(1, 2)]);
        assert_eq!(view.current_cell(), Some(GridCell::new(1, 2)));
    }

    #[test]
    fn test_arrow_keys_move_current_cell() {
        let doc = atlas_doc();
        let mut view = view_for(&doc);
        let key = |key, modifiers| ViewEvent::KeyPressed { key, modifiers };

        view.handle_event(key(ViewKey::Right, Modifiers::NONE), &doc);
        assert_eq!(view.current_cell(), Some(GridCell::new(0, 0)));
        view.handle_event(key(ViewKey::Right, Modifiers::NONE), &doc);
        view.handle_event(key(ViewKey::Down, Modifiers::SHIFT), &doc);
        assert_eq!(view.current_cell(), Some(GridCell::new(1, 1)));
        assert_eq!(view.selected_cells().len(), 2);

        // Moving off the grid keeps the current cell
        view.handle_event(key(ViewKey::Up, Modifiers::NONE), &doc);
        view.handle_event(key(ViewKey::Up, Modifiers::NONE), &doc);
        view.handle_event(key(ViewKey::Up, Modifiers::NONE), &doc);
        assert_eq!(view.current_cell(), Some(GridCell::new(0, 1)));
    }

    #[test]
    fn test_paint_whole_wang_id_stroke() {
        let mut doc = atlas_doc();
        let mut view = view_for(&doc);
        view.set_edit_wang_set(true);
        view.set_wang_set(Some(0));
        let grass = WangId::filled(1);
        view.set_wang_id(grass);

        let batch = press(
            &mut view,
            &doc,
            cell_pos(0, 0),
            PointerButton::Primary,
            Modifiers::NONE,
        )
        .unwrap();
        assert_eq!(
            batch.commands,
            vec![TileCommand::ChangeWangIds {
                wang_set: 0,
                changes: vec![(TileId(0), grass)],
            }]
        );
        apply(&mut view, &mut doc, batch);
        assert!(view
            .take_actions()
            .contains(&TilesetViewAction::WangIdUsedChanged(grass)));

        // Moving within the same tile paints nothing new
        assert!(move_to(&mut view, &doc, cell_pos(0, 0) + Vec2::new(2.0, 2.0)).is_none());

        let batch = move_to(&mut view, &doc, cell_pos(0, 1)).unwrap();
        apply(&mut view, &mut doc, batch);
        // Still in use, so no usage change
        assert!(view.take_actions().is_empty());

        let finish = release(&mut view, &doc, cell_pos(0, 1), PointerButton::Primary).unwrap();
        assert_eq!(finish.commands, vec![TileCommand::FinishWangIdChange]);
        doc.apply_batch(finish).unwrap();

        // The whole stroke is one undo step
        let changes = doc.undo().unwrap();
        view.document_changed(&doc, &changes);
        let set = doc.wang_set(0).unwrap();
        assert!(set.wang_id_of_tile(TileId(0)).is_empty());
        assert!(set.wang_id_of_tile(TileId(1)).is_empty());
    }

    #[test]
    fn test_paint_hovered_corner() {
        let doc = atlas_doc();
        let mut view = view_for(&doc);
        view.set_edit_wang_set(true);
        view.set_wang_set(Some(0));
        view.set_wang_color(2);

        // Top-left quadrant of the first tile
        let batch = press(
            &mut view,
            &doc,
            Vec2::new(3.0, 3.0),
            PointerButton::Primary,
            Modifiers::NONE,
        )
        .unwrap();
        let TileCommand::ChangeWangIds { changes, .. } = &batch.commands[0] else {
            panic!("expected a WangId change");
        };
        let (tile, wang_id) = changes[0];
        assert_eq!(tile, TileId(0));
        assert_eq!(wang_id.index_color(WangIndex::TopLeft), 2);
        assert_eq!(wang_id.index_color(WangIndex::BottomRight), 0);
    }

    #[test]
    fn test_no_wang_set_paints_nothing() {
        let doc = atlas_doc();
        let mut view = view_for(&doc);
        view.set_edit_wang_set(true);
        view.set_wang_id(WangId::filled(1));
        let batch = press(
            &mut view,
            &doc,
            cell_pos(0, 0),
            PointerButton::Primary,
            Modifiers::NONE,
        );
        assert!(batch.is_none());
        assert!(release(&mut view, &doc, cell_pos(0, 0), PointerButton::Primary).is_none());
    }

    #[test]
    fn test_rotate_key_changes_current_wang_id() {
        let doc = atlas_doc();
        let mut view = view_for(&doc);
        view.set_edit_wang_set(true);
        let mut wang_id = WangId::EMPTY;
        wang_id.set_index_color(WangIndex::Top, 1);
        view.set_wang_id(wang_id);

        let key = |key, modifiers| ViewEvent::KeyPressed { key, modifiers };
        view.handle_event(key(ViewKey::Z, Modifiers::CTRL), &doc);
        assert_eq!(view.wang_id(), wang_id);

        view.handle_event(key(ViewKey::Z, Modifiers::NONE), &doc);
        assert_eq!(view.wang_id().index_color(WangIndex::Right), 1);
        assert_eq!(
            view.take_actions(),
            vec![TilesetViewAction::CurrentWangIdChanged(view.wang_id())]
        );

        // Hovered-index painting ignores the transform keys
        view.set_wang_color(1);
        let before = view.wang_id();
        view.handle_event(key(ViewKey::X, Modifiers::NONE), &doc);
        assert_eq!(view.wang_id(), before);
    }

    #[test]
    fn test_menu_show_grid_toggles_and_reports() {
        let doc = atlas_doc();
        let mut view = view_for(&doc);
        view.activate_menu_entry(MenuEntry::ShowGrid { checked: true }, &doc);
        assert!(!view.draw_grid());
        assert_eq!(
            view.take_actions(),
            vec![TilesetViewAction::ShowGridChanged(false)]
        );
    }
}
