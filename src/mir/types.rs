//! Types and type views. Matches `original_source/mir/type.go`.

use std::collections::HashMap;

use super::slot::Slot;

#[derive(Clone, Debug, PartialEq)]
pub enum Type {
    Untyped,
    Number,
    String,
    Bool,
    Array { inner: Box<Type>, n: u32 },
    DynArray { inner: Box<Type> },
    Struct { fields: HashMap<String, StructField>, size: u32 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructField {
    pub typ: Type,
    pub offset: u32,
}

impl Type {
    /// Size in slots, or `None` for a dyn-sized value.
    pub fn size(&self) -> Option<u32> {
        match self {
            Type::Untyped => None,
            Type::Number | Type::String | Type::Bool => Some(1),
            Type::Array { inner, n } => inner.size().map(|size| size * n),
            Type::DynArray { .. } => None,
            Type::Struct { size, .. } => Some(*size),
        }
    }

    pub fn field(&self, name: &str) -> Option<&StructField> {
        match self {
            Type::Struct { fields, .. } => fields.get(name),
            _ => None,
        }
    }
}

/// How a value is laid out across a contiguous range of slots within an
/// enclosing allocation. `offset` is measured in the omitter's call-stack
/// frame, not in slot units.
#[derive(Clone, Debug)]
pub struct TypeView {
    pub typ: Type,
    pub slots: Vec<Slot>,
    pub offset: u32,
}
