//! Objects of object layers, with template fallback.

use crate::color::Color;
use crate::gid::{self, FlipFlags};
use crate::json::JsonNode;
use crate::loader::context::ParseContext;
use crate::project::{PropertyTypes, TiledClass};
use crate::property::{FromProperty, PropertyCollection};
use crate::tile;
use macroquad::math::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectType {
    #[default]
    Undefined,
    /// Tile object (has a `gid`).
    Object,
    Ellipse,
    Rectangle,
    Point,
    Polygon,
    Polyline,
    Text,
    /// Template instance without any shape of its own.
    Template,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlignment {
    #[default]
    Unresolved,
    Left,
    Center,
    Right,
    Justify,
    Top,
    Bottom,
}

impl TextAlignment {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "left" => TextAlignment::Left,
            "center" => TextAlignment::Center,
            "right" => TextAlignment::Right,
            "justify" => TextAlignment::Justify,
            "top" => TextAlignment::Top,
            "bottom" => TextAlignment::Bottom,
            _ => TextAlignment::Unresolved,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub text: String,
    pub color: Color,
    pub wrap: bool,
    pub bold: bool,
    pub font_family: String,
    pub horizontal_alignment: TextAlignment,
    pub vertical_alignment: TextAlignment,
    pub italic: bool,
    pub kerning: bool,
    pub pixel_size: i32,
    pub strikeout: bool,
    pub underline: bool,
}

impl Default for Text {
    fn default() -> Self {
        Text {
            text: String::new(),
            color: Color::default(),
            wrap: false,
            bold: false,
            font_family: "sans-serif".to_owned(),
            horizontal_alignment: TextAlignment::Left,
            vertical_alignment: TextAlignment::Top,
            italic: false,
            kerning: true,
            pixel_size: 16,
            strikeout: false,
            underline: false,
        }
    }
}

impl Text {
    pub(crate) fn parse(json: &dyn JsonNode) -> Self {
        let d = Text::default();
        Text {
            text: json.field_string("text").unwrap_or_default(),
            color: json.field_str("color").map(Color::parse).unwrap_or_default(),
            wrap: json.field_bool("wrap").unwrap_or(d.wrap),
            bold: json.field_bool("bold").unwrap_or(d.bold),
            font_family: json.field_string("fontfamily").unwrap_or(d.font_family),
            horizontal_alignment: json
                .field_str("halign")
                .map(TextAlignment::from_tag)
                .unwrap_or(d.horizontal_alignment),
            vertical_alignment: json
                .field_str("valign")
                .map(TextAlignment::from_tag)
                .unwrap_or(d.vertical_alignment),
            italic: json.field_bool("italic").unwrap_or(d.italic),
            kerning: json.field_bool("kerning").unwrap_or(d.kerning),
            pixel_size: json.field_i32("pixelsize").unwrap_or(d.pixel_size),
            strikeout: json.field_bool("strikeout").unwrap_or(d.strikeout),
            underline: json.field_bool("underline").unwrap_or(d.underline),
        }
    }
}

/// Reads object fields from the object first, then from its template.
#[derive(Clone, Copy)]
pub(crate) struct FieldSource<'j> {
    pub main: &'j dyn JsonNode,
    pub template: Option<&'j dyn JsonNode>,
}

impl<'j> FieldSource<'j> {
    pub fn field(&self, name: &str) -> Option<&'j dyn JsonNode> {
        self.main
            .get(name)
            .or_else(|| self.template.and_then(|t| t.get(name)))
    }

    pub fn has(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    fn bool(&self, name: &str) -> Option<bool> {
        self.field(name)?.as_bool()
    }

    fn f32(&self, name: &str) -> Option<f32> {
        self.field(name)?.as_f32()
    }

    fn string(&self, name: &str) -> Option<String> {
        self.field(name)?.as_str().map(str::to_owned)
    }

    /// Both components must be found, each may come from either source.
    fn vec2(&self, x: &str, y: &str) -> Option<Vec2> {
        Some(Vec2::new(self.f32(x)?, self.f32(y)?))
    }

    fn points(&self, name: &str) -> Option<Vec<Vec2>> {
        let node = self.field(name).filter(|n| n.is_array())?;
        Some(
            node.elements()
                .into_iter()
                .map(|p| {
                    Vec2::new(
                        p.field_f32("x").unwrap_or(0.0),
                        p.field_f32("y").unwrap_or(0.0),
                    )
                })
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct Object {
    pub id: u32,
    pub name: String,
    /// `type`, or `class` for files written by Tiled 1.9 and later.
    pub class: String,
    pub object_type: ObjectType,
    pub position: Vec2,
    pub size: Vec2,
    pub rotation: f32,
    pub visible: bool,
    pub ellipse: bool,
    pub point: bool,
    pub polygon: Vec<Vec2>,
    pub polyline: Vec<Vec2>,
    pub text: Text,
    /// Clean GID of a tile object; `0` otherwise.
    pub gid: u32,
    pub flip_flags: FlipFlags,
    /// Template path as written in the file.
    pub template: Option<String>,
    pub properties: PropertyCollection,
    pub all_found: bool,
}

impl Object {
    pub(crate) fn parse(json: &dyn JsonNode, ctx: &mut ParseContext) -> Self {
        let template = json.field_string("template");
        let template_doc = template.as_deref().and_then(|t| ctx.template(t));
        let src = FieldSource {
            main: json,
            template: template_doc.as_ref().and_then(|d| d.root().get("object")),
        };

        let ellipse = src.bool("ellipse").unwrap_or(false);
        let point = src.bool("point").unwrap_or(false);
        let (flip_flags, gid) = src
            .field("gid")
            .and_then(|g| g.as_u32())
            .map(gid::decode)
            .unwrap_or_default();

        let id = src.field("id").and_then(|n| n.as_u32());
        let name = src.string("name");
        let rotation = src.f32("rotation");
        let class = src.string("type").or_else(|| src.string("class"));
        let visible = src.bool("visible");
        let size = src.vec2("width", "height");
        let position = src.vec2("x", "y");

        let object_type = classify(&src, ellipse, point, template.is_some());
        let all_found = object_type == ObjectType::Template
            || (id.is_some()
                && name.is_some()
                && rotation.is_some()
                && class.is_some()
                && visible.is_some()
                && size.is_some()
                && position.is_some());

        let mut properties = match src.template {
            Some(t) => PropertyCollection::parse(&t.array("properties"), ctx.types),
            None => PropertyCollection::new(),
        };
        properties.merge(PropertyCollection::parse(&json.array("properties"), ctx.types));

        Object {
            id: id.unwrap_or_default(),
            name: name.unwrap_or_default(),
            class: class.unwrap_or_default(),
            object_type,
            position: position.unwrap_or_default(),
            size: size.unwrap_or_default(),
            rotation: rotation.unwrap_or_default(),
            visible: visible.unwrap_or_default(),
            ellipse,
            point,
            polygon: src.points("polygon").unwrap_or_default(),
            polyline: src.points("polyline").unwrap_or_default(),
            text: src.field("text").map(Text::parse).unwrap_or_default(),
            gid,
            flip_flags,
            template,
            properties,
            all_found,
        }
    }

    pub fn has_flip_flags(&self, flags: FlipFlags) -> bool {
        self.flip_flags.contains(flags)
    }

    pub fn get<T: FromProperty + Default>(&self, name: &str) -> T {
        self.properties.value(name)
    }

    pub fn class_instance(&self, types: &PropertyTypes) -> Option<TiledClass> {
        tile::class_instance(&self.class, &self.properties, types)
    }
}

fn classify(src: &FieldSource, ellipse: bool, point: bool, templated: bool) -> ObjectType {
    if ellipse {
        ObjectType::Ellipse
    } else if point {
        ObjectType::Point
    } else if src.has("polygon") {
        ObjectType::Polygon
    } else if src.has("polyline") {
        ObjectType::Polyline
    } else if src.has("text") {
        ObjectType::Text
    } else if src.has("gid") {
        ObjectType::Object
    } else if templated {
        ObjectType::Template
    } else {
        ObjectType::Rectangle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::DecoderRegistry;
    use crate::json::SerdeJsonBackend;
    use serde_json::json;
    use std::path::Path;

    fn parse_in(dir: &Path, json: serde_json::Value) -> Object {
        let registry = DecoderRegistry::new();
        let mut ctx = ParseContext::new(&SerdeJsonBackend, &registry, None, dir);
        Object::parse(&json, &mut ctx)
    }

    #[test]
    fn classification_priority() {
        let dir = Path::new("");
        let cases = [
            (json!({"ellipse": true, "point": true}), ObjectType::Ellipse),
            (json!({"point": true, "polygon": []}), ObjectType::Point),
            (json!({"polygon": [], "polyline": []}), ObjectType::Polygon),
            (json!({"polyline": [], "text": {}}), ObjectType::Polyline),
            (json!({"text": {}, "gid": 3}), ObjectType::Text),
            (json!({"gid": 3}), ObjectType::Object),
            (json!({"width": 3}), ObjectType::Rectangle),
        ];
        for (json, expected) in cases {
            assert_eq!(parse_in(dir, json).object_type, expected);
        }
    }

    #[test]
    fn mandatory_fields_and_flags() {
        let obj = parse_in(
            Path::new(""),
            json!({
                "id": 7, "name": "chest", "type": "Loot", "rotation": 90.0, "visible": true,
                "x": 1.5, "y": 2.0, "width": 16, "height": 16,
                "gid": 2147483653u32
            }),
        );
        assert!(obj.all_found);
        assert_eq!(obj.gid, 5);
        assert!(obj.has_flip_flags(FlipFlags::HORIZONTAL));
        assert_eq!(obj.position, Vec2::new(1.5, 2.0));
        assert_eq!(obj.class, "Loot");

        let partial = parse_in(Path::new(""), json!({"id": 1, "x": 0, "y": 0}));
        assert!(!partial.all_found);
    }

    #[test]
    fn text_defaults() {
        let obj = parse_in(Path::new(""), json!({"text": {"text": "Hi", "halign": "center", "color": "#ff0000"}}));
        assert_eq!(obj.object_type, ObjectType::Text);
        assert_eq!(obj.text.text, "Hi");
        assert_eq!(obj.text.horizontal_alignment, TextAlignment::Center);
        assert_eq!(obj.text.vertical_alignment, TextAlignment::Top);
        assert_eq!(obj.text.font_family, "sans-serif");
        assert_eq!(obj.text.pixel_size, 16);
        assert!(obj.text.kerning);
        assert!(obj.text.color == "#ff0000");
    }

    #[test]
    fn template_fields_fall_back_and_properties_merge() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("crate.tx"),
            json!({
                "type": "template",
                "object": {
                    "name": "T", "type": "Crate", "rotation": 0, "visible": true,
                    "x": 5, "y": 5, "width": 10, "height": 10,
                    "properties": [
                        {"name": "hp", "type": "int", "value": 3},
                        {"name": "kind", "type": "string", "value": "wood"}
                    ]
                }
            })
            .to_string(),
        )
        .expect("write template");

        let obj = parse_in(
            dir.path(),
            json!({
                "id": 1, "name": "A", "width": 20, "template": "crate.tx",
                "properties": [{"name": "hp", "type": "int", "value": 9}]
            }),
        );
        assert_eq!(obj.position, Vec2::new(5.0, 5.0));
        assert_eq!(obj.size, Vec2::new(20.0, 10.0));
        assert_eq!(obj.name, "A");
        assert_eq!(obj.class, "Crate");
        assert_eq!(obj.object_type, ObjectType::Template);
        assert!(obj.all_found);
        assert_eq!(obj.get::<i32>("hp"), 9);
        assert_eq!(obj.get::<String>("kind"), "wood");
    }

    #[test]
    fn missing_template_degrades_to_plain_object() {
        let obj = parse_in(Path::new("/nowhere"), json!({"id": 2, "template": "gone.tx", "width": 4, "height": 4}));
        assert_eq!(obj.object_type, ObjectType::Template);
        assert_eq!(obj.size, Vec2::new(4.0, 4.0));
        assert_eq!(obj.template.as_deref(), Some("gone.tx"));
    }
}
