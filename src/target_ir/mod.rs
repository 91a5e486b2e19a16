//! In-memory model of the target project archive. Matches
//! `original_source/scir/ir.go`'s struct shapes and field tags.

pub mod idtable;
pub mod input;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use input::{Field, Input, InputKind, List, MaybeShadowedInput, Variable};

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Project {
    pub targets: Vec<Target>,
    pub monitors: Vec<Monitor>,
    pub extensions: Vec<String>,
    pub meta: Meta,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Target {
    #[serde(rename = "isStage")]
    pub is_stage: bool,
    pub name: String,
    pub variables: HashMap<String, Variable>,
    pub lists: HashMap<String, List>,
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub broadcasts: HashMap<String, String>,
    pub blocks: HashMap<String, Block>,
    pub comments: HashMap<String, Comment>,
    #[serde(rename = "currentCostume")]
    pub current_costume: u32,
    pub costumes: Vec<Costume>,
    pub sounds: Vec<Sound>,
    #[serde(rename = "layerOrder")]
    pub layer_order: f64,
    pub volume: f64,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tempo: Option<f64>,
    #[serde(rename = "videoState", skip_serializing_if = "Option::is_none", default)]
    pub video_state: Option<String>,
    #[serde(
        rename = "videoTransparency",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub video_transparency: Option<f64>,
    #[serde(
        rename = "textToSpeechLanguage",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub text_to_speech_language: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub direction: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub draggable: Option<bool>,
    #[serde(
        rename = "rotationStyle",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub rotation_style: Option<String>,
}

/// Default sprite fields, matching `original_source/scir/ir.go`'s `NewTarget`.
pub fn new_target(name: String, costumes: Vec<Costume>) -> Target {
    Target {
        is_stage: false,
        name,
        variables: HashMap::new(),
        lists: HashMap::new(),
        broadcasts: HashMap::new(),
        blocks: HashMap::new(),
        comments: HashMap::new(),
        current_costume: 0,
        costumes,
        sounds: Vec::new(),
        layer_order: 0.0,
        volume: 100.0,
        tempo: None,
        video_state: None,
        video_transparency: None,
        text_to_speech_language: None,
        visible: Some(true),
        x: Some(0.0),
        y: Some(0.0),
        size: Some(100.0),
        direction: Some(90.0),
        draggable: Some(false),
        rotation_style: Some("all around".to_string()),
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Costume {
    #[serde(rename = "assetId")]
    pub asset_id: String,
    pub name: String,
    pub md5ext: String,
    #[serde(rename = "dataFormat")]
    pub data_format: String,
    #[serde(
        rename = "bitmapResolution",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub bitmap_resolution: Option<f64>,
    #[serde(
        rename = "rotationCenterX",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub rotation_center_x: Option<f64>,
    #[serde(
        rename = "rotationCenterY",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub rotation_center_y: Option<f64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Sound {
    #[serde(rename = "assetId")]
    pub asset_id: String,
    pub name: String,
    pub md5ext: String,
    #[serde(rename = "dataFormat")]
    pub data_format: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rate: Option<f64>,
    #[serde(
        rename = "sampleCount",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub sample_count: Option<f64>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Block {
    pub opcode: String,
    pub fields: HashMap<String, Field>,
    pub inputs: HashMap<String, MaybeShadowedInput>,
    pub parent: Option<String>,
    pub next: Option<String>,
    pub shadow: bool,
    #[serde(rename = "topLevel")]
    pub top_level: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub mutation: Option<Mutation>,
}

impl Block {
    pub fn new(opcode: impl Into<String>) -> Self {
        Block {
            opcode: opcode.into(),
            fields: HashMap::new(),
            inputs: HashMap::new(),
            parent: None,
            next: None,
            shadow: false,
            top_level: false,
            x: None,
            y: None,
            comment: None,
            mutation: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Mutation {
    #[serde(rename = "tagName")]
    pub tag_name: String,
    pub children: Vec<serde_json::Value>,
    #[serde(rename = "proccode", skip_serializing_if = "Option::is_none", default)]
    pub proc_code: Option<String>,
    #[serde(
        rename = "argumentids",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub argument_ids: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub warp: Option<String>,
    #[serde(
        rename = "argumentnames",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub argument_names: Option<String>,
    #[serde(
        rename = "argumentdefaults",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub argument_defaults: Option<String>,
    #[serde(rename = "hasnext", skip_serializing_if = "Option::is_none", default)]
    pub has_next: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Comment {
    #[serde(rename = "blockId")]
    pub block_id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub minimized: bool,
    pub text: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Monitor {
    pub id: String,
    pub mode: String,
    pub opcode: String,
    #[serde(rename = "spriteName")]
    pub sprite_name: String,
    pub value: String,
    pub width: f64,
    pub height: f64,
    pub x: f64,
    pub y: f64,
    pub visible: bool,
    #[serde(rename = "sliderMin", skip_serializing_if = "Option::is_none", default)]
    pub slider_min: Option<f64>,
    #[serde(rename = "sliderMax", skip_serializing_if = "Option::is_none", default)]
    pub slider_max: Option<f64>,
    #[serde(
        rename = "isDiscrete",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub is_discrete: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Meta {
    pub semver: String,
    pub vm: String,
    pub agent: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_round_trips_through_json() {
        let mut target = new_target("Sprite1".to_string(), Vec::new());
        target.is_stage = true;
        target.blocks.insert(
            "b1".to_string(),
            Block::new("procedures_definition".to_string()),
        );
        let project = Project {
            targets: vec![target],
            monitors: Vec::new(),
            extensions: Vec::new(),
            meta: Meta {
                semver: "3.0.0".to_string(),
                vm: "0.2.0".to_string(),
                agent: "".to_string(),
            },
        };
        let json = serde_json::to_string(&project).unwrap();
        let back: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(project, back);
    }

    #[test]
    fn broadcasts_are_omitted_when_empty() {
        let target = new_target("Sprite1".to_string(), Vec::new());
        let json = serde_json::to_string(&target).unwrap();
        assert!(!json.contains("broadcasts"));
    }

    #[test]
    fn stage_only_fields_are_absent_on_sprites() {
        let target = new_target("Sprite1".to_string(), Vec::new());
        let json = serde_json::to_string(&target).unwrap();
        assert!(!json.contains("tempo"));
        assert!(json.contains("\"visible\":true"));
    }
}
