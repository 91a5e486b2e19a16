//! Persisted identity table, stabilising target-IR UUIDs across recompiles.
//! Matches `original_source/scir/idtable.go`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct IdUsage {
    #[serde(rename = "For")]
    pub for_name: String,
    #[serde(rename = "Uuid")]
    pub uuid: String,
    #[serde(rename = "RawDeclaration")]
    pub raw_declaration: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct IdTable {
    #[serde(rename = "Ids")]
    pub ids: HashMap<String, IdUsage>,
}

impl IdTable {
    pub fn new() -> Self {
        IdTable::default()
    }

    pub fn update(&mut self, id: String, usage: IdUsage) {
        self.ids.insert(id, usage);
    }

    pub fn lookup(&self, id: &str) -> Option<&IdUsage> {
        self.ids.get(id)
    }

    pub fn open(path: &Path) -> Result<Self, IdTableError> {
        let content = fs::read_to_string(path).map_err(IdTableError::Io)?;
        serde_json::from_str(&content).map_err(IdTableError::Json)
    }

    pub fn save(&self, path: &Path) -> Result<(), IdTableError> {
        let content = serde_json::to_string(self).map_err(IdTableError::Json)?;
        fs::write(path, content).map_err(IdTableError::Io)
    }
}

#[derive(Debug)]
pub enum IdTableError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for IdTableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdTableError::Io(err) => write!(f, "identity table I/O error: {}", err),
            IdTableError::Json(err) => write!(f, "identity table parse error: {}", err),
        }
    }
}

impl std::error::Error for IdTableError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_reuses_a_previously_recorded_uuid() {
        let mut table = IdTable::new();
        table.update(
            "Hello".to_string(),
            IdUsage {
                for_name: "Hello".to_string(),
                uuid: "uuid-1".to_string(),
                raw_declaration: "func Hello() {}".to_string(),
            },
        );
        assert_eq!(table.lookup("Hello").unwrap().uuid, "uuid-1");
        assert!(table.lookup("World").is_none());
    }

    #[test]
    fn round_trips_through_json() {
        let mut table = IdTable::new();
        table.update(
            "Hello".to_string(),
            IdUsage {
                for_name: "Hello".to_string(),
                uuid: "uuid-1".to_string(),
                raw_declaration: "func Hello() {}".to_string(),
            },
        );
        let json = serde_json::to_string(&table).unwrap();
        let back: IdTable = serde_json::from_str(&json).unwrap();
        assert_eq!(table, back);
    }
}
