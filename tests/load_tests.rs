// tests/load_tests.rs

use std::fs;
use std::path::Path;
use tiled_resolve::{
    EnumValue, ObjectType, ParseStatus, PropertyType, Project, TiledClass, Tileson, World,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const TILESET: &str = r#"
{
  "columns": 4, "image": "../img/tiles.png", "imagewidth": 64, "imageheight": 32,
  "margin": 0, "spacing": 0, "name": "external", "tilecount": 8,
  "tilewidth": 16, "tileheight": 16, "type": "tileset",
  "tiles": [
    { "id": 0, "animation": [{ "tileid": 0, "duration": 100 }, { "tileid": 1, "duration": 100 }] }
  ]
}
"#;

const TEMPLATE: &str = r#"
{
  "type": "template",
  "object": {
    "name": "spawn", "type": "Spawner", "rotation": 0, "visible": true,
    "x": 5, "y": 5, "width": 10, "height": 10,
    "properties": [
      { "name": "rate", "type": "float", "value": 0.5 },
      { "name": "enemy", "type": "string", "value": "slime" }
    ]
  }
}
"#;

const MAP: &str = r#"
{
  "width": 2, "height": 1, "tilewidth": 16, "tileheight": 16,
  "nextobjectid": 3, "orientation": "orthogonal", "tiledversion": "1.10.2",
  "class": "Level",
  "properties": [
    { "name": "Difficulty", "type": "int", "value": 3 },
    { "name": "Mode", "type": "string", "propertytype": "GameMode", "value": "Hard" },
    { "name": "Flags", "type": "string", "propertytype": "LevelFlags", "value": "Dark,Windy" }
  ],
  "tilesets": [{ "firstgid": 1, "source": "tilesets/external.json" }],
  "layers": [
    { "name": "tiles", "type": "tilelayer", "opacity": 1, "visible": true, "x": 0, "y": 0,
      "width": 2, "height": 1, "data": [1, 8] },
    { "name": "objects", "type": "objectgroup", "opacity": 1, "visible": true, "x": 0, "y": 0,
      "objects": [
        { "id": 1, "name": "A", "width": 20, "template": "templates/spawn.tx" },
        { "id": 2, "template": "templates/spawn.tx",
          "properties": [{ "name": "enemy", "type": "string", "value": "bat" }] }
      ] }
  ]
}
"#;

const PROJECT: &str = r#"
{
  "folders": ["."],
  "propertyTypes": [
    { "id": 1, "name": "Level", "type": "class",
      "members": [
        { "name": "Difficulty", "type": "int", "value": 1 },
        { "name": "Title", "type": "string", "value": "untitled" }
      ] },
    { "id": 2, "name": "GameMode", "type": "enum", "storageType": "string",
      "values": ["Easy", "Normal", "Hard"], "valuesAsFlags": false },
    { "id": 3, "name": "LevelFlags", "type": "enum", "storageType": "string",
      "values": ["Dark", "Windy", "Flooded"], "valuesAsFlags": true }
  ]
}
"#;

fn write_fixture(root: &Path) {
    fs::create_dir_all(root.join("maps/tilesets")).unwrap();
    fs::create_dir_all(root.join("maps/templates")).unwrap();
    fs::write(root.join("maps/map.json"), MAP).unwrap();
    fs::write(root.join("maps/tilesets/external.json"), TILESET).unwrap();
    fs::write(root.join("maps/templates/spawn.tx"), TEMPLATE).unwrap();
    fs::write(root.join("game.tiled-project"), PROJECT).unwrap();
}

#[test]
fn map_file_with_external_tileset_and_templates() {
    init_logger();
    let dir = tempfile::tempdir().expect("tempdir");
    write_fixture(dir.path());

    let map = Tileson::default().parse_file(dir.path().join("maps/map.json"));
    assert_eq!(map.status(), ParseStatus::Ok, "{}", map.status_message());

    let ts = &map.tilesets[0];
    assert_eq!(ts.name, "external");
    assert_eq!(ts.source.as_deref(), Some(Path::new("tilesets/external.json")));
    assert_eq!(ts.image_path, dir.path().join("maps/tilesets/../img/tiles.png"));
    let first = ts.tile(1).expect("tile 1");
    assert_eq!(first.animation.frames.len(), 2);
    assert_eq!(first.animation.frames[1].tile_id, 2);

    let tiles = map.layer("tiles").expect("tiles");
    assert_eq!(map.tile_at(tiles, 1, 0).map(|t| t.id), Some(8));

    let objects = map.layer("objects").expect("objects");
    let a = objects.object(1).expect("A");
    assert_eq!((a.position.x, a.position.y), (5.0, 5.0));
    assert_eq!((a.size.x, a.size.y), (20.0, 10.0));
    assert_eq!(a.name, "A");
    assert_eq!(a.object_type, ObjectType::Template);
    assert_eq!(a.get::<f32>("rate"), 0.5);

    let b = objects.object(2).expect("B");
    assert_eq!(b.name, "spawn");
    assert_eq!(b.class, "Spawner");
    assert_eq!(b.get::<String>("enemy"), "bat");
    assert_eq!(b.get::<f32>("rate"), 0.5);
}

#[test]
fn project_types_resolve_properties_and_classes() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_fixture(dir.path());

    let project = Project::load(dir.path().join("game.tiled-project")).expect("project");
    let types = project.property_types().clone();
    let parser = Tileson::default().with_project(project);
    let map = parser.parse_file(dir.path().join("maps/map.json"));
    assert_eq!(map.status(), ParseStatus::Ok);

    let mode = map.property("Mode").expect("Mode");
    assert_eq!(mode.kind(), PropertyType::Enum);
    let mode: EnumValue = mode.get();
    assert_eq!(mode.value(), 3);
    assert_eq!(mode.value_name(), "Hard");

    let flags: EnumValue = map.get("Flags");
    assert_eq!(flags.value(), 1 | 2);
    assert!(flags.has_flag_value(2));
    assert!(!flags.has_flag_value(4));

    let level: TiledClass = map.class_instance(&types).expect("Level class");
    assert_eq!(level.get::<i32>("Difficulty"), 3);
    assert_eq!(level.get::<String>("Title"), "untitled");

    let plain = Tileson::default().parse_file(dir.path().join("maps/map.json"));
    let unresolved: EnumValue = plain.get("Mode");
    assert_eq!(unresolved.value(), 0);
}

#[test]
fn missing_and_malformed_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let parser = Tileson::default();

    let missing = dir.path().join("nope.json");
    let map = parser.parse_file(&missing);
    assert_eq!(map.status(), ParseStatus::FileNotFound);
    assert_eq!(map.status_message(), format!("File not found: {}", missing.display()));

    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{ \"width\": ").unwrap();
    let map = parser.parse_file(&broken);
    assert_eq!(map.status(), ParseStatus::ParseError);
    assert!(map.status_message().starts_with("Parse error: "));
}

#[test]
fn missing_external_tileset_fails_the_tileset() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_fixture(dir.path());
    fs::remove_file(dir.path().join("maps/tilesets/external.json")).unwrap();

    let map = Tileson::default().parse_file(dir.path().join("maps/map.json"));
    assert_eq!(map.status(), ParseStatus::MissingData);
    assert!(map.tilesets.is_empty());
    assert_eq!(map.tileset_errors().len(), 1);
}

#[test]
fn world_loads_existing_maps() {
    init_logger();
    let dir = tempfile::tempdir().expect("tempdir");
    write_fixture(dir.path());
    fs::write(
        dir.path().join("maps/overworld.world"),
        r#"{
          "maps": [
            { "fileName": "map.json", "x": 0, "y": 0, "width": 32, "height": 16 },
            { "fileName": "missing.json", "x": 32, "y": 0, "width": 32, "height": 16 }
          ],
          "onlyShowAdjacentMaps": true,
          "type": "world"
        }"#,
    )
    .unwrap();

    let mut world = World::load(dir.path().join("maps/overworld.world")).expect("world");
    assert!(world.only_show_adjacent_maps());
    assert_eq!(world.map_data().len(), 2);
    assert_eq!(world.load_maps(&Tileson::default()), 1);
    assert_eq!(world.maps()[0].status(), ParseStatus::Ok);
    assert_eq!(world.get("missing.json").map(|m| m.x), Some(32));

    let project = Project::load(dir.path().join("game.tiled-project")).expect("project");
    let root = &project.folders()[0];
    let maps = root
        .sub_folders()
        .iter()
        .find(|f| f.path().ends_with("maps"))
        .expect("maps folder");
    assert!(maps.has_world_file());
}
