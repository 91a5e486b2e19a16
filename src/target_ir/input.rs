//! Hand-written serialisation for the target IR's array-tagged shapes.
//! Generic derive cannot express these (Design Notes §9); matches
//! `original_source/scir/ir.go`'s `MarshalJSON`/`UnmarshalJSON` pairs.

use serde::de::{Error as DeError, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum InputKind {
    Block = 0,
    Number = 4,
    PositiveNumber = 5,
    PositiveInteger = 6,
    Integer = 7,
    Angle = 8,
    Color = 9,
    Str = 10,
    Broadcast = 11,
    Variable = 12,
    List = 13,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Input {
    Block(String),
    Numeral { kind: InputKind, value: f64 },
    Text { kind: InputKind, value: String },
    Broadcast { name: String, id: String },
    VariableOrList {
        kind: InputKind,
        name: String,
        id: String,
        position: Option<(f64, f64)>,
    },
}

impl Serialize for Input {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Input::Block(uuid) => serializer.serialize_str(uuid),
            Input::Numeral { kind, value } => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(&(*kind as u8))?;
                seq.serialize_element(value)?;
                seq.end()
            }
            Input::Text { kind, value } => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(&(*kind as u8))?;
                seq.serialize_element(value)?;
                seq.end()
            }
            Input::Broadcast { name, id } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(&(InputKind::Broadcast as u8))?;
                seq.serialize_element(name)?;
                seq.serialize_element(id)?;
                seq.end()
            }
            Input::VariableOrList {
                kind,
                name,
                id,
                position,
            } => {
                let len = if position.is_some() { 5 } else { 3 };
                let mut seq = serializer.serialize_seq(Some(len))?;
                seq.serialize_element(&(*kind as u8))?;
                seq.serialize_element(name)?;
                seq.serialize_element(id)?;
                if let Some((x, y)) = position {
                    seq.serialize_element(x)?;
                    seq.serialize_element(y)?;
                }
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Input {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct InputVisitor;

        impl<'de> Visitor<'de> for InputVisitor {
            type Value = Input;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a block-reference string or a tagged input array")
            }

            fn visit_str<E: DeError>(self, value: &str) -> Result<Input, E> {
                Ok(Input::Block(value.to_string()))
            }

            fn visit_string<E: DeError>(self, value: String) -> Result<Input, E> {
                Ok(Input::Block(value))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Input, A::Error> {
                let kind: f64 = seq
                    .next_element()?
                    .ok_or_else(|| DeError::custom("missing input kind"))?;
                match kind as u8 {
                    4 | 5 | 6 | 7 | 8 => {
                        let value: f64 = seq
                            .next_element()?
                            .ok_or_else(|| DeError::custom("missing numeral value"))?;
                        Ok(Input::Numeral {
                            kind: kind_from_u8(kind as u8),
                            value,
                        })
                    }
                    9 | 10 => {
                        let value: String = seq
                            .next_element()?
                            .ok_or_else(|| DeError::custom("missing string value"))?;
                        Ok(Input::Text {
                            kind: kind_from_u8(kind as u8),
                            value,
                        })
                    }
                    11 => {
                        let value: String = seq
                            .next_element()?
                            .ok_or_else(|| DeError::custom("missing broadcast name"))?;
                        let id: String = seq
                            .next_element()?
                            .ok_or_else(|| DeError::custom("missing broadcast id"))?;
                        Ok(Input::Broadcast { name: value, id })
                    }
                    12 | 13 => {
                        let value: String = seq
                            .next_element()?
                            .ok_or_else(|| DeError::custom("missing variable/list name"))?;
                        let id: String = seq
                            .next_element()?
                            .ok_or_else(|| DeError::custom("missing variable/list id"))?;
                        let x: Option<f64> = seq.next_element()?;
                        let y: Option<f64> = seq.next_element()?;
                        let position = match (x, y) {
                            (Some(x), Some(y)) => Some((x, y)),
                            _ => None,
                        };
                        Ok(Input::VariableOrList {
                            kind: kind_from_u8(kind as u8),
                            name: value,
                            id,
                            position,
                        })
                    }
                    other => Err(DeError::custom(format!("unrecognised input kind {}", other))),
                }
            }
        }

        deserializer.deserialize_any(InputVisitor)
    }
}

fn kind_from_u8(value: u8) -> InputKind {
    match value {
        4 => InputKind::Number,
        5 => InputKind::PositiveNumber,
        6 => InputKind::PositiveInteger,
        7 => InputKind::Integer,
        8 => InputKind::Angle,
        9 => InputKind::Color,
        10 => InputKind::Str,
        11 => InputKind::Broadcast,
        12 => InputKind::Variable,
        13 => InputKind::List,
        _ => InputKind::Block,
    }
}

/// `[1, shadow]`, `[2, obscured]`, or `[3, obscured, shadow]`.
#[derive(Clone, Debug, PartialEq)]
pub enum MaybeShadowedInput {
    Shadow(Input),
    Nonshadow(Input),
    Shadowed { obscured: Input, shadow: Input },
}

impl Serialize for MaybeShadowedInput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MaybeShadowedInput::Shadow(input) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(&1u8)?;
                seq.serialize_element(input)?;
                seq.end()
            }
            MaybeShadowedInput::Nonshadow(input) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(&2u8)?;
                seq.serialize_element(input)?;
                seq.end()
            }
            MaybeShadowedInput::Shadowed { obscured, shadow } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(&3u8)?;
                seq.serialize_element(obscured)?;
                seq.serialize_element(shadow)?;
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for MaybeShadowedInput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TaggedVisitor;

        impl<'de> Visitor<'de> for TaggedVisitor {
            type Value = MaybeShadowedInput;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a [tag, ...] shadowed-input array")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<MaybeShadowedInput, A::Error> {
                let tag: u8 = seq
                    .next_element()?
                    .ok_or_else(|| DeError::custom("missing shadow tag"))?;
                match tag {
                    1 => {
                        let input: Input = seq
                            .next_element()?
                            .ok_or_else(|| DeError::custom("missing shadow input"))?;
                        Ok(MaybeShadowedInput::Shadow(input))
                    }
                    2 => {
                        let input: Input = seq
                            .next_element()?
                            .ok_or_else(|| DeError::custom("missing nonshadow input"))?;
                        Ok(MaybeShadowedInput::Nonshadow(input))
                    }
                    3 => {
                        let obscured: Input = seq
                            .next_element()?
                            .ok_or_else(|| DeError::custom("missing obscured input"))?;
                        let shadow: Input = seq
                            .next_element()?
                            .ok_or_else(|| DeError::custom("missing shadow input"))?;
                        Ok(MaybeShadowedInput::Shadowed { obscured, shadow })
                    }
                    other => Err(DeError::custom(format!("unrecognised shadow tag {}", other))),
                }
            }
        }

        deserializer.deserialize_seq(TaggedVisitor)
    }
}

/// `[value]` or `[value, id]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub value: String,
    pub id: Option<String>,
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.id.is_some() { 2 } else { 1 };
        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(&self.value)?;
        if let Some(id) = &self.id {
            seq.serialize_element(id)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let array: Vec<Option<String>> = Deserialize::deserialize(deserializer)?;
        let value = array
            .first()
            .cloned()
            .flatten()
            .ok_or_else(|| DeError::custom("missing field value"))?;
        let id = array.get(1).cloned().flatten();
        Ok(Field { value, id })
    }
}

/// `[name, value]` or `[name, value, true]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    pub name: String,
    pub value: String,
    pub is_cloud: bool,
}

impl Serialize for Variable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.is_cloud { 3 } else { 2 };
        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(&self.name)?;
        seq.serialize_element(&self.value)?;
        if self.is_cloud {
            seq.serialize_element(&true)?;
        }
        seq.end()
    }
}

/// Coerces a scalar JSON value to a string the way Scratch itself stores
/// variable/list contents: a fresh numeric variable serialises as `["x", 0]`
/// with `0` a JSON number, not a string. `original_source/scir/ir.go`'s
/// `UnmarshalJSON` resolves this with a type assertion that silently
/// produces `""` on a non-string; this keeps the value instead of dropping
/// it, but never errors either way.
fn coerce_scalar_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

impl<'de> Deserialize<'de> for Variable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let array: Vec<serde_json::Value> = Deserialize::deserialize(deserializer)?;
        if array.len() < 2 {
            return Err(DeError::custom("variable array too short"));
        }
        let name = array[0]
            .as_str()
            .ok_or_else(|| DeError::custom("variable name is not a string"))?
            .to_string();
        let value = coerce_scalar_to_string(&array[1]);
        let is_cloud = array.get(2).and_then(|v| v.as_bool()).unwrap_or(false);
        Ok(Variable {
            name,
            value,
            is_cloud,
        })
    }
}

/// `[name, values[]]`.
#[derive(Clone, Debug, PartialEq)]
pub struct List {
    pub name: String,
    pub values: Vec<String>,
}

impl Serialize for List {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&self.name)?;
        seq.serialize_element(&self.values)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for List {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (name, items): (String, Vec<serde_json::Value>) = Deserialize::deserialize(deserializer)?;
        let values = items.iter().map(coerce_scalar_to_string).collect();
        Ok(List { name, values })
    }
}
