//! Standalone tileset viewer
//!
//! Run with: tileset_viewer [IMAGE TILE_WIDTH TILE_HEIGHT COLUMNS ROWS]
//!
//! Without arguments a generated checker atlas with a demo terrain set is
//! shown.

use bevy::asset::{AssetPlugin, RenderAssetUsages, UnapprovedPathMode};
use bevy::ecs::message::MessageReader;
use bevy::image::{ImageFilterMode, ImageSamplerDescriptor};
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use bevy_map_tileset::{Tileset, TilesetDocument, WangColor, WangSet, WangSetType};
use bevy_map_tileset_editor::{TilesetTextures, TilesetViewAction, TilesetViewPlugin};

const GENERATED_IMAGE: &str = "generated://checker.png";
const GENERATED_TILE_SIZE: u32 = 16;
const GENERATED_COLUMNS: u32 = 8;
const GENERATED_ROWS: u32 = 6;

/// Atlas given on the command line
#[derive(Resource, Debug, Clone, PartialEq)]
struct AtlasArgs {
    image: String,
    tile_width: i32,
    tile_height: i32,
    columns: i32,
    rows: i32,
}

fn parse_args(args: &[String]) -> Option<AtlasArgs> {
    let [image, tile_width, tile_height, columns, rows] = args else {
        if !args.is_empty() {
            warn!("Usage: tileset_viewer [IMAGE TILE_WIDTH TILE_HEIGHT COLUMNS ROWS]");
        }
        return None;
    };
    let number = |value: &String| value.parse::<i32>().ok().filter(|n| *n > 0);
    let parsed = AtlasArgs {
        image: image.clone(),
        tile_width: number(tile_width)?,
        tile_height: number(tile_height)?,
        columns: number(columns)?,
        rows: number(rows)?,
    };
    Some(parsed)
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut app = App::new();
    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Tileset Viewer".to_string(),
                    ..default()
                }),
                ..default()
            })
            .set(ImagePlugin {
                // Pixel-perfect rendering: use Nearest (point) sampling for crisp pixel art
                default_sampler: ImageSamplerDescriptor {
                    mag_filter: ImageFilterMode::Nearest,
                    min_filter: ImageFilterMode::Nearest,
                    mipmap_filter: ImageFilterMode::Nearest,
                    ..default()
                },
            })
            .set(AssetPlugin {
                // Tileset images may live anywhere on disk
                unapproved_path_mode: UnapprovedPathMode::Allow,
                ..default()
            }),
    )
    .add_plugins(TilesetViewPlugin::new().with_editing_tileset(true))
    .add_systems(Startup, setup_viewer)
    .add_systems(Update, log_view_actions);

    match parse_args(&args) {
        Some(atlas) => {
            app.insert_resource(atlas);
        }
        None if !args.is_empty() => {
            warn!("Invalid arguments, showing the generated tileset");
        }
        None => {}
    }

    app.run();
}

fn setup_viewer(
    mut commands: Commands,
    atlas: Option<Res<AtlasArgs>>,
    mut images: ResMut<Assets<Image>>,
    mut textures: ResMut<TilesetTextures>,
) {
    commands.spawn(Camera2d);

    let document = match atlas {
        Some(atlas) => {
            let mut tileset = Tileset::new_atlas(
                file_stem(&atlas.image),
                atlas.tile_width,
                atlas.tile_height,
                atlas.columns,
                atlas.rows,
            );
            tileset.image_path = Some(atlas.image.clone());
            info!("Opening {} ({} tiles)", atlas.image, tileset.tile_count());
            TilesetDocument::new(tileset)
        }
        None => {
            let handle = images.add(checker_image());
            textures.insert_handle(GENERATED_IMAGE, handle);

            let mut tileset = Tileset::new_atlas(
                "Checker".to_string(),
                GENERATED_TILE_SIZE as i32,
                GENERATED_TILE_SIZE as i32,
                GENERATED_COLUMNS as i32,
                GENERATED_ROWS as i32,
            );
            tileset.image_path = Some(GENERATED_IMAGE.to_string());
            tileset.background_color = Some("#2B2D33".to_string());
            TilesetDocument::new(tileset)
                .with_wang_set(
                    WangSet::new("Ground", WangSetType::Corner)
                        .with_color(WangColor::new("Grass", [76, 175, 80]))
                        .with_color(WangColor::new("Sand", [230, 200, 120]))
                        .with_color(WangColor::new("Water", [50, 120, 220])),
                )
                .with_wang_set(
                    WangSet::new("Paths", WangSetType::Edge)
                        .with_color(WangColor::new("Road", [140, 110, 80])),
                )
        }
    };

    commands.insert_resource(document);
}

fn file_stem(path: &str) -> String {
    std::path::Path::new(path)
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "Tileset".to_string())
}

/// Checkerboard atlas with a distinct hue per tile
fn checker_image() -> Image {
    let width = GENERATED_TILE_SIZE * GENERATED_COLUMNS;
    let height = GENERATED_TILE_SIZE * GENERATED_ROWS;
    let mut data = Vec::with_capacity((width * height * 4) as usize);

    for y in 0..height {
        for x in 0..width {
            let tile = (y / GENERATED_TILE_SIZE) * GENERATED_COLUMNS + x / GENERATED_TILE_SIZE;
            let hue = (tile * 37 % 255) as u8;
            let local_x = x % GENERATED_TILE_SIZE;
            let local_y = y % GENERATED_TILE_SIZE;
            let dark = ((local_x / 4) + (local_y / 4)) % 2 == 0;
            let shade = if dark { 150 } else { 220 };
            data.extend_from_slice(&[hue, shade, 255 - hue, 255]);
        }
    }

    Image::new(
        Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        data,
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    )
}

/// The viewer has no map or property editor; report what the view asked for
fn log_view_actions(mut actions: MessageReader<TilesetViewAction>) {
    for action in actions.read() {
        match action {
            TilesetViewAction::CurrentTileChanged(Some(tile)) => {
                info!("Current tile: {}", tile);
            }
            TilesetViewAction::CurrentTileChanged(None) => {}
            other => info!("{}: {:?}", other.name(), other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_atlas_args() {
        let parsed = parse_args(&strings(&["tiles/ground.png", "16", "16", "8", "4"]));
        assert_eq!(
            parsed,
            Some(AtlasArgs {
                image: "tiles/ground.png".to_string(),
                tile_width: 16,
                tile_height: 16,
                columns: 8,
                rows: 4,
            })
        );
    }

    #[test]
    fn test_parse_rejects_bad_args() {
        assert_eq!(parse_args(&[]), None);
        assert_eq!(parse_args(&strings(&["a.png", "16", "0", "8", "4"])), None);
        assert_eq!(parse_args(&strings(&["a.png", "16"])), None);
    }

    #[test]
    fn test_checker_image_size() {
        let image = checker_image();
        assert_eq!(image.width(), GENERATED_TILE_SIZE * GENERATED_COLUMNS);
        assert_eq!(image.height(), GENERATED_TILE_SIZE * GENERATED_ROWS);
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("assets/tiles/ground.png"), "ground");
    }
}
