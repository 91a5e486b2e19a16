//! Project archive I/O and the in-memory block-graph helpers the omitter
//! mutates while lowering. Matches `original_source/scir/scir.go`'s `Scir`
//! (`LoadSb3`/`ExportSb3`, `InsertBlock`/`ConnectBlocks`/`SetInput`/…).

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use uuid::Uuid;
use zip::write::FileOptions;
use zip::ZipArchive;

use crate::target_ir::idtable::{IdTable, IdTableError};
use crate::target_ir::{Block, Input, List, MaybeShadowedInput, Project};

#[derive(Debug)]
pub enum ArchiveError {
    Io(std::io::Error),
    Zip(zip::result::ZipError),
    Json(serde_json::Error),
    MissingStageTarget,
}

impl std::fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveError::Io(err) => write!(f, "archive I/O error: {}", err),
            ArchiveError::Zip(err) => write!(f, "zip error: {}", err),
            ArchiveError::Json(err) => write!(f, "project.json parse error: {}", err),
            ArchiveError::MissingStageTarget => {
                write!(f, "project.json: missing target `stage`")
            }
        }
    }
}

impl std::error::Error for ArchiveError {}

impl From<std::io::Error> for ArchiveError {
    fn from(err: std::io::Error) -> Self {
        ArchiveError::Io(err)
    }
}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(err: zip::result::ZipError) -> Self {
        ArchiveError::Zip(err)
    }
}

impl From<IdTableError> for ArchiveError {
    fn from(err: IdTableError) -> Self {
        match err {
            IdTableError::Io(err) => ArchiveError::Io(err),
            IdTableError::Json(err) => ArchiveError::Json(err),
        }
    }
}

/// Holds the loaded project plus the block-graph manipulation the omitter
/// needs. `editing_target`/`stage_target` are indices into `project.targets`
/// rather than Go-style aliased pointers.
pub struct Archive {
    pub assets: HashMap<String, Vec<u8>>,
    pub project: Project,
    pub id_table: IdTable,
    pub editing_target: Option<usize>,
    pub stage_target: usize,
}

impl Archive {
    pub fn load(path: &Path, id_table_path: Option<&Path>) -> Result<Self, ArchiveError> {
        let file = File::open(path)?;
        let mut zip = ZipArchive::new(file)?;

        let mut assets = HashMap::new();
        let mut project = None;
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i)?;
            let mut content = Vec::new();
            entry.read_to_end(&mut content)?;
            if entry.name() == "project.json" {
                project = Some(serde_json::from_slice::<Project>(&content).map_err(ArchiveError::Json)?);
            } else {
                assets.insert(entry.name().to_string(), content);
            }
        }
        let project = project.ok_or(ArchiveError::MissingStageTarget)?;

        let id_table = match id_table_path {
            Some(path) => IdTable::open(path).unwrap_or_default(),
            None => IdTable::new(),
        };

        let stage_target = project
            .targets
            .iter()
            .position(|target| target.is_stage)
            .ok_or(ArchiveError::MissingStageTarget)?;

        Ok(Archive {
            assets,
            project,
            id_table,
            editing_target: None,
            stage_target,
        })
    }

    pub fn export(&self, path: &Path, id_table_path: &Path) -> Result<(), ArchiveError> {
        self.id_table.save(id_table_path)?;

        let zip_file = File::create(path)?;
        let mut writer = zip::ZipWriter::new(zip_file);
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        for (name, content) in &self.assets {
            writer.start_file(name, options)?;
            writer.write_all(content)?;
        }
        writer.start_file("project.json", options)?;
        let json = serde_json::to_vec(&self.project).map_err(ArchiveError::Json)?;
        writer.write_all(&json)?;
        writer.finish()?;
        Ok(())
    }

    /// Select or create the target a subsequent omit pass writes into.
    pub fn set_editing_target(&mut self, name: &str) {
        if let Some(index) = self.project.targets.iter().position(|t| t.name == name) {
            self.editing_target = Some(index);
            return;
        }
        let first_costume = self.project.targets[self.stage_target]
            .costumes
            .first()
            .cloned();
        let costumes = first_costume.into_iter().collect();
        let new_target = crate::target_ir::new_target(name.to_string(), costumes);
        self.project.targets.push(new_target);
        self.editing_target = Some(self.project.targets.len() - 1);
    }

    fn editing(&mut self) -> &mut crate::target_ir::Target {
        let index = self.editing_target.expect("no editing target selected");
        &mut self.project.targets[index]
    }

    /// Finds the editing target's `_Stack` list, creating it if absent, and
    /// returns its UUID.
    pub fn ensure_stack_list(&mut self) -> String {
        if let Some((uuid, _)) = self.editing().lists.iter().find(|(_, l)| l.name == "_Stack") {
            return uuid.clone();
        }
        let uuid = Uuid::new_v4().to_string();
        self.editing().lists.insert(
            uuid.clone(),
            List {
                name: "_Stack".to_string(),
                values: Vec::new(),
            },
        );
        uuid
    }

    pub fn insert_block(&mut self, block: Block) -> String {
        let uuid = Uuid::new_v4().to_string();
        self.insert_block_with_uuid(uuid.clone(), block);
        uuid
    }

    pub fn insert_block_with_uuid(&mut self, uuid: String, block: Block) {
        self.editing().blocks.insert(uuid, block);
    }

    pub fn block_mut(&mut self, uuid: &str) -> &mut Block {
        self.editing()
            .blocks
            .get_mut(uuid)
            .unwrap_or_else(|| panic!("block {} not found", uuid))
    }

    pub fn connect_blocks(&mut self, block_uuid: &str, next_uuid: &str) {
        self.block_mut(block_uuid).next = Some(next_uuid.to_string());
        self.block_mut(next_uuid).parent = Some(block_uuid.to_string());
    }

    /// Shallow-duplicates each named block under a fresh UUID, preserving
    /// every other field (including its existing input edges) as-written.
    /// This is the "deep-copy rule" for a reused base-index subtree
    /// (spec §4.6): a fresh top-level UUID per copy, not a recursive clone
    /// of the blocks it points to.
    pub fn copy_blocks(&mut self, uuids: &[String]) -> Vec<String> {
        uuids
            .iter()
            .map(|uuid| {
                let block = self.editing().blocks.get(uuid).unwrap().clone();
                self.insert_block(block)
            })
            .collect()
    }

    /// Wires an already-inserted block as a nonshadow input of `parent_uuid`.
    pub fn set_input(&mut self, parent_uuid: &str, input_name: &str, child_uuid: &str) {
        self.block_mut(child_uuid).parent = Some(parent_uuid.to_string());
        self.block_mut(parent_uuid).inputs.insert(
            input_name.to_string(),
            MaybeShadowedInput::Nonshadow(Input::Block(child_uuid.to_string())),
        );
    }

    pub fn set_shadow_input(&mut self, parent_uuid: &str, input_name: &str, child_uuid: &str) {
        self.block_mut(child_uuid).parent = Some(parent_uuid.to_string());
        self.block_mut(parent_uuid).inputs.insert(
            input_name.to_string(),
            MaybeShadowedInput::Shadow(Input::Block(child_uuid.to_string())),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target_ir::{new_target, Meta, Project};

    fn sample_project() -> Project {
        let mut stage = new_target("Stage".to_string(), Vec::new());
        stage.is_stage = true;
        Project {
            targets: vec![stage],
            monitors: Vec::new(),
            extensions: Vec::new(),
            meta: Meta {
                semver: "3.0.0".to_string(),
                vm: "0.2.0".to_string(),
                agent: "yumc".to_string(),
            },
        }
    }

    fn write_sb3(path: &Path, project: &Project) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = FileOptions::default();
        writer.start_file("project.json", options).unwrap();
        writer
            .write_all(&serde_json::to_vec(project).unwrap())
            .unwrap();
        writer.finish().unwrap();
    }

    #[test]
    fn load_finds_the_stage_target() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("yumc-test-{}.sb3", Uuid::new_v4()));
        write_sb3(&path, &sample_project());

        let archive = Archive::load(&path, None).unwrap();
        assert!(archive.project.targets[archive.stage_target].is_stage);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn load_without_stage_target_is_an_error() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("yumc-test-{}.sb3", Uuid::new_v4()));
        let mut project = sample_project();
        project.targets[0].is_stage = false;
        write_sb3(&path, &project);

        let result = Archive::load(&path, None);
        assert!(matches!(result, Err(ArchiveError::MissingStageTarget)));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn insert_connect_and_set_input_wire_a_small_graph() {
        let mut archive = Archive::load_in_memory_for_tests();
        let a = archive.insert_block(Block::new("procedures_definition"));
        let b = archive.insert_block(Block::new("data_addtolist"));
        archive.connect_blocks(&a, &b);
        assert_eq!(archive.block_mut(&a).next.as_deref(), Some(b.as_str()));
        assert_eq!(archive.block_mut(&b).parent.as_deref(), Some(a.as_str()));

        let child = archive.insert_block(Block::new("data_lengthoflist"));
        archive.set_input(&b, "INDEX", &child);
        assert_eq!(archive.block_mut(&child).parent.as_deref(), Some(b.as_str()));
    }

    #[test]
    fn copy_blocks_mints_a_fresh_uuid_preserving_content() {
        let mut archive = Archive::load_in_memory_for_tests();
        let base = archive.insert_block(Block::new("data_lengthoflist"));
        let copies = archive.copy_blocks(std::slice::from_ref(&base));
        assert_eq!(copies.len(), 1);
        assert_ne!(copies[0], base);
        assert_eq!(archive.block_mut(&copies[0]).opcode, "data_lengthoflist");
    }

    impl Archive {
        fn load_in_memory_for_tests() -> Self {
            let mut project = sample_project();
            project.targets[0].is_stage = true;
            let mut archive = Archive {
                assets: HashMap::new(),
                project,
                id_table: IdTable::new(),
                editing_target: None,
                stage_target: 0,
            };
            archive.set_editing_target("Stage");
            archive
        }
    }

    #[test]
    fn export_then_load_round_trips_the_project() {
        let dir = std::env::temp_dir();
        let out_path = dir.join(format!("yumc-out-{}.sb3", Uuid::new_v4()));
        let id_table_path = dir.join(format!("yumc-ids-{}.json", Uuid::new_v4()));

        let archive = Archive::load_in_memory_for_tests();
        archive.export(&out_path, &id_table_path).unwrap();

        let reloaded = Archive::load(&out_path, Some(&id_table_path)).unwrap();
        assert_eq!(reloaded.project, archive.project);

        std::fs::remove_file(&out_path).ok();
        std::fs::remove_file(&id_table_path).ok();
    }
}
