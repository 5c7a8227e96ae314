// tests/map_tests.rs

use tiled_resolve::{
    FlipFlags, LayerType, ParseStatus, ParserOptions, TileKey, TileRect, TilesetError, Tileson,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const FLIP_H_2: u32 = 0x8000_0002;

const MAP: &str = r##"
{
  "width": 3, "height": 2, "tilewidth": 16, "tileheight": 16,
  "nextobjectid": 1, "nextlayerid": 4,
  "orientation": "orthogonal", "renderorder": "right-down",
  "tiledversion": "1.10.2", "infinite": false,
  "backgroundcolor": "#202020",
  "properties": [{ "name": "music", "type": "file", "value": "theme.ogg" }],
  "tilesets": [
    {
      "firstgid": 1, "columns": 2, "image": "a.png", "imagewidth": 32, "imageheight": 32,
      "margin": 0, "spacing": 0, "name": "terrain", "tilecount": 4,
      "tilewidth": 16, "tileheight": 16,
      "tiles": [
        { "id": 1, "type": "Wall", "properties": [{ "name": "solid", "type": "bool", "value": true }] }
      ]
    },
    {
      "firstgid": 5, "columns": 1, "image": "b.png", "imagewidth": 16, "imageheight": 32,
      "margin": 0, "spacing": 0, "name": "props", "tilecount": 2,
      "tilewidth": 16, "tileheight": 16
    }
  ],
  "layers": [
    {
      "id": 1, "name": "ground", "type": "tilelayer", "opacity": 1, "visible": true,
      "x": 0, "y": 0, "width": 3, "height": 2,
      "data": [1, 2, 0, 2147483650, 0, 99]
    },
    {
      "id": 2, "name": "group", "type": "group", "opacity": 1, "visible": true, "x": 0, "y": 0,
      "layers": [
        {
          "id": 3, "name": "detail", "type": "tilelayer", "opacity": 1, "visible": true,
          "x": 0, "y": 0, "width": 3, "height": 2,
          "data": [0, 0, 2147483650, 5, 6, 0]
        }
      ]
    }
  ]
}
"##;

#[test]
fn cells_resolve_only_for_known_nonzero_gids() {
    init_logger();
    let map = Tileson::default().parse_bytes(MAP.as_bytes());
    assert_eq!(map.status(), ParseStatus::Ok, "{}", map.status_message());
    assert_eq!(map.tilesets.len(), 2);
    assert!(map.background_color == "#202020");

    let ground = map.layer("ground").expect("ground");
    assert_eq!(ground.tiles().count(), 3);
    assert_eq!(ground.tile_objects().count(), 3);
    assert!(ground.tile_key(2, 0).is_none());
    assert!(ground.tile_key(2, 1).is_none(), "gid 99 belongs to no tileset");

    let detail = map.layer("detail").expect("nested layer");
    assert_eq!(detail.kind, LayerType::TileLayer);
    assert_eq!(detail.tiles().count(), 3);
    assert_eq!(
        detail.tile_key(0, 1),
        Some(TileKey::Tileset { tileset: 1, id: 1 })
    );
}

#[test]
fn identical_flagged_gids_share_one_tile() {
    let map = Tileson::default().parse_bytes(MAP.as_bytes());
    let ground = map.layer("ground").expect("ground");
    let detail = map.layer("detail").expect("detail");

    assert_eq!(ground.unique_flagged().len(), 2);
    assert_eq!(ground.tile_key(0, 1), Some(TileKey::Synthesized { gid: FLIP_H_2 }));
    assert_eq!(ground.tile_key(0, 1), detail.tile_key(2, 0));
    assert_eq!(map.index().synthesized().count(), 1);

    let a = map.tile_at(ground, 0, 1).expect("flipped in ground");
    let b = map.tile_at(detail, 2, 0).expect("flipped in detail");
    assert_eq!(a.tileset, b.tileset);
    assert_eq!(a.properties, b.properties);
    assert_eq!(a.id, 2);
    assert_eq!(a.gid, FLIP_H_2);
    assert!(a.has_flip_flags(FlipFlags::HORIZONTAL));
    assert!(a.get::<bool>("solid"));

    let plain = map.tile(2).expect("unflipped");
    assert!(plain.flip_flags.is_empty());
    assert_eq!(plain.class, "Wall");
}

#[test]
fn tile_objects_carry_positions_and_rects() {
    let map = Tileson::default().parse_bytes(MAP.as_bytes());
    let ground = map.layer("ground").expect("ground");

    let obj = ground.tile_object(1, 0).expect("cell (1,0)");
    assert_eq!(obj.position.x, 16.0);
    assert_eq!(obj.position.y, 0.0);
    assert_eq!(obj.drawing_rect, TileRect::new(16, 0, 16, 16));
    assert_eq!(obj.gid, 2);

    let flipped = ground.tile_object(0, 1).expect("cell (0,1)");
    assert_eq!(flipped.position.y, 16.0);
    assert_eq!(flipped.drawing_rect, TileRect::new(16, 0, 16, 16));
    assert_eq!(flipped.gid, FLIP_H_2);

    let detail = map.layer("detail").expect("detail");
    let prop = detail.tile_object(1, 1).expect("cell (1,1)");
    assert_eq!(prop.drawing_rect, TileRect::new(0, 16, 16, 16));
}

#[test]
fn layers_know_the_map_grid() {
    let map = Tileson::default().parse_bytes(MAP.as_bytes());
    let detail = map.layer("detail").expect("nested layer");
    assert_eq!((detail.tile_size.x, detail.tile_size.y), (16, 16));
    let pos = detail.cell_position(2, 1);
    assert_eq!((pos.x, pos.y), (32.0, 16.0));
    let obj = detail.tile_object(1, 1).expect("cell (1,1)");
    assert_eq!(obj.position, detail.cell_position(1, 1));
}

#[test]
fn map_lookups() {
    let map = Tileson::default().parse_bytes(MAP.as_bytes());
    assert_eq!(map.tileset("props").map(|t| t.first_gid), Some(5));
    assert_eq!(map.tileset_by_gid(4).map(|t| t.name.as_str()), Some("terrain"));
    assert_eq!(map.tileset_by_gid(6 | 0x4000_0000).map(|t| t.name.as_str()), Some("props"));
    assert!(map.tileset_by_gid(7).is_none());
    assert_eq!(
        map.get::<std::path::PathBuf>("music"),
        std::path::PathBuf::from("theme.ogg")
    );
    assert_eq!(map.compression_level, -1);
    assert_eq!(map.next_layer_id, 4);
}

#[test]
fn missing_map_field_is_missing_data() {
    let json = MAP.replace(r#""tiledversion": "1.10.2","#, "");
    let map = Tileson::default().parse_bytes(json.as_bytes());
    assert_eq!(map.status(), ParseStatus::MissingData);
    assert_eq!(map.status_message(), "Missing map data...");
    // everything else still loads
    assert_eq!(map.layers.len(), 2);
}

#[test]
fn broken_tileset_is_missing_data() {
    let json = MAP.replace(r#""name": "props", "tilecount": 2,"#, r#""name": "props","#);
    let map = Tileson::default().parse_bytes(json.as_bytes());
    assert_eq!(map.status(), ParseStatus::MissingData);
    assert_eq!(map.tilesets.len(), 1);
    assert_eq!(map.tileset_errors().len(), 1);
}

#[test]
fn tileset_range_overflow_is_missing_data() {
    init_logger();
    let json = MAP.replace(r#""firstgid": 5,"#, r#""firstgid": 4294967295,"#);
    let map = Tileson::default().parse_bytes(json.as_bytes());
    assert_eq!(map.status(), ParseStatus::MissingData);
    assert_eq!(map.tilesets.len(), 1);
    assert!(matches!(
        map.tileset_errors()[0],
        TilesetError::InvalidRange { first_gid: u32::MAX, .. }
    ));
    // cells of the dropped tileset simply stay empty
    let detail = map.layer("detail").expect("detail");
    assert!(detail.tile_key(0, 1).is_none());
}

#[test]
fn huge_tile_id_does_not_abort_the_parse() {
    let json = MAP.replace(r#"{ "id": 1, "type": "Wall""#, r#"{ "id": 4294967295, "type": "Wall""#);
    let map = Tileson::default().parse_bytes(json.as_bytes());
    assert_eq!(map.status(), ParseStatus::Ok);
    let terrain = map.tileset("terrain").expect("terrain");
    assert!(terrain.tiles().iter().any(|t| !t.all_found));
    // tile 2 is generated plain instead
    assert_eq!(map.tile(2).map(|t| t.class.as_str()), Some(""));
}

const ENCODED: &str = r#"
{
  "width": 3, "height": 2, "tilewidth": 16, "tileheight": 16,
  "nextobjectid": 1, "orientation": "orthogonal", "tiledversion": "1.10.2",
  "tilesets": [
    {
      "firstgid": 1, "columns": 2, "image": "a.png", "imagewidth": 32, "imageheight": 32,
      "margin": 0, "spacing": 0, "name": "terrain", "tilecount": 4,
      "tilewidth": 16, "tileheight": 16
    }
  ],
  "layers": [
    { "name": "plain", "type": "tilelayer", "opacity": 1, "visible": true, "x": 0, "y": 0,
      "encoding": "base64", "data": "AQAAAAIAAAAAAAAAAgAAgAAAAAADAAAA" },
    { "name": "zlib", "type": "tilelayer", "opacity": 1, "visible": true, "x": 0, "y": 0,
      "encoding": "base64", "compression": "zlib", "data": "eJxjZGBgYGKAACDdAKKZgRgABPwAiQ==" },
    { "name": "gzip", "type": "tilelayer", "opacity": 1, "visible": true, "x": 0, "y": 0,
      "encoding": "base64", "compression": "gzip",
      "data": "H4sIAAAAAAACA2NkYGBgYoAAIN0AopmBGAC16PFwGAAAAA==" },
    { "name": "bad", "type": "tilelayer", "opacity": 1, "visible": true, "x": 0, "y": 0,
      "encoding": "base64", "compression": "zlib", "data": "AQAAAAIAAAA=" }
  ]
}
"#;

#[test]
fn encoded_layers_decode_with_compression_codecs() {
    init_logger();
    let parser = Tileson::new(ParserOptions {
        compression_codecs: true,
        ..Default::default()
    });
    let map = parser.parse_bytes(ENCODED.as_bytes());
    assert_eq!(map.status(), ParseStatus::Ok);

    let expected = vec![1, 2, 0, 0x8000_0002, 0, 3];
    for name in ["plain", "zlib", "gzip"] {
        let layer = map.layer(name).expect(name);
        assert_eq!(layer.data, expected, "layer {name}");
        assert_eq!(layer.tiles().count(), 4, "layer {name}");
    }

    // a corrupt payload only empties its own layer
    let bad = map.layer("bad").expect("bad");
    assert!(bad.data.is_empty());
    assert!(bad.decode_error.is_some());
    assert_eq!(map.decode_errors().len(), 1);
    assert_eq!(map.decode_errors()[0].0, "bad");
}

#[test]
fn compression_is_skipped_without_codec() {
    let map = Tileson::default().parse_bytes(ENCODED.as_bytes());
    // zlib is not registered, so the layer holds the raw compressed bytes
    let zlib = map.layer("zlib").expect("zlib");
    assert!(zlib.decode_error.is_none());
    assert_ne!(zlib.data, vec![1, 2, 0, 0x8000_0002, 0, 3]);
    assert_eq!(map.layer("plain").expect("plain").data.len(), 6);
}

const INFINITE: &str = r#"
{
  "width": 4, "height": 4, "tilewidth": 8, "tileheight": 8, "infinite": true,
  "nextobjectid": 1, "orientation": "orthogonal", "tiledversion": "1.10.2",
  "tilesets": [],
  "layers": [
    { "name": "inf", "type": "tilelayer", "opacity": 1, "visible": true, "x": 0, "y": 0,
      "startx": -16, "starty": 0,
      "chunks": [
        { "x": -16, "y": 0, "width": 2, "height": 1, "data": [3, 4] },
        { "x": 0, "y": 0, "width": 2, "height": 1, "data": "AQAAAAIAAAA=" }
      ],
      "encoding": "base64"
    }
  ]
}
"#;

#[test]
fn infinite_maps_keep_chunks() {
    let map = Tileson::default().parse_bytes(INFINITE.as_bytes());
    assert!(map.infinite);
    let layer = map.layer("inf").expect("inf");
    assert_eq!(layer.chunks.len(), 2);
    assert_eq!(layer.chunks[0].data, vec![3, 4]);
    assert_eq!(layer.chunks[1].data, vec![1, 2]);
    assert_eq!(layer.tiles().count(), 0);
}
