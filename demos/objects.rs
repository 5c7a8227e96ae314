//! Prints every object of a map, resolving templates and project types.
//!
//! cargo run --example objects -- assets/map.json [assets/game.tiled-project]

use anyhow::bail;
use tiled_resolve::{Layer, LayerType, ParseStatus, Project, PropertyValue, Tileson};

fn print_layer(layer: &Layer, depth: usize) {
    let pad = "  ".repeat(depth);
    println!("{pad}{} ({:?})", layer.name, layer.kind);
    if layer.kind == LayerType::Group {
        for child in &layer.layers {
            print_layer(child, depth + 1);
        }
        return;
    }
    for obj in &layer.objects {
        println!(
            "{pad}  #{} '{}' {:?} class='{}' at ({}, {}) size ({}, {})",
            obj.id, obj.name, obj.object_type, obj.class, obj.position.x, obj.position.y, obj.size.x, obj.size.y
        );
        for prop in obj.properties.iter() {
            let value = match prop.value() {
                PropertyValue::Enum(e) => e.value_names().join("|"),
                other => format!("{other:?}"),
            };
            println!("{pad}    {} = {value}", prop.name());
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let mut args = std::env::args().skip(1);
    let map_path = args.next().unwrap_or_else(|| "assets/map.json".into());

    let mut parser = Tileson::default();
    if let Some(project_path) = args.next() {
        parser = parser.with_project(Project::load(project_path)?);
    }

    let map = parser.parse_file(&map_path);
    if map.status() != ParseStatus::Ok {
        bail!("{map_path}: {} ({})", map.status(), map.status_message());
    }

    for layer in &map.layers {
        print_layer(layer, 0);
    }
    if let Some(types) = parser.project().map(|p| p.property_types()) {
        if let Some(class) = map.class_instance(types) {
            println!("map class {}: {} members", class.name(), class.members().len());
        }
    }
    Ok(())
}
