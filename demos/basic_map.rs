use anyhow::{bail, Context};
use macroquad::prelude::*;
use std::collections::HashMap;
use tiled_resolve::{FlipFlags, Layer, LayerType, Map, ParseStatus, Tileson};

fn window_conf() -> Conf {
    Conf {
        window_title: "Basic Map".into(),
        window_width: 1280,
        window_height: 720,
        ..Default::default()
    }
}

async fn load(path: &str) -> anyhow::Result<(Map, HashMap<usize, Texture2D>)> {
    let map = Tileson::default().parse_file(path);
    if map.status() != ParseStatus::Ok {
        bail!("{path}: {} ({})", map.status(), map.status_message());
    }

    let mut textures = HashMap::new();
    for ts in &map.tilesets {
        if ts.image.as_os_str().is_empty() {
            continue;
        }
        let img = ts.image_path.to_string_lossy().into_owned();
        let tex = load_texture(&img)
            .await
            .with_context(|| format!("Loading texture {img}"))?;
        tex.set_filter(FilterMode::Nearest);
        textures.insert(ts.index, tex);
    }
    Ok((map, textures))
}

fn draw_layer(map: &Map, layer: &Layer, textures: &HashMap<usize, Texture2D>) {
    if !layer.visible {
        return;
    }
    if layer.kind == LayerType::Group {
        for child in &layer.layers {
            draw_layer(map, child, textures);
        }
        return;
    }
    for cell in layer.tile_objects() {
        let Some(tile) = map.resolve(cell.tile) else {
            continue;
        };
        let Some(tex) = textures.get(&tile.tileset) else {
            continue;
        };
        let flags = tile.flip_flags;
        draw_texture_ex(
            tex,
            cell.position.x + layer.offset.x,
            cell.position.y + layer.offset.y,
            Color::new(1.0, 1.0, 1.0, layer.opacity),
            DrawTextureParams {
                source: Some(cell.drawing_rect.to_macroquad()),
                flip_x: flags.contains(FlipFlags::HORIZONTAL),
                flip_y: flags.contains(FlipFlags::VERTICAL),
                rotation: if flags.contains(FlipFlags::DIAGONAL) {
                    std::f32::consts::FRAC_PI_2
                } else {
                    0.0
                },
                ..Default::default()
            },
        );
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();
    let path = std::env::args().nth(1).unwrap_or_else(|| "assets/map.json".into());
    let (map, textures) = match load(&path).await {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("{err:#}");
            return;
        }
    };
    let background = map.background_color.to_macroquad();

    loop {
        clear_background(background);
        for layer in &map.layers {
            draw_layer(&map, layer, &textures);
        }
        draw_text(
            &format!("FPS: {}", get_fps()),
            screen_width() - 135.0,
            55.0,
            30.0,
            RED,
        );
        next_frame().await;
    }
}
