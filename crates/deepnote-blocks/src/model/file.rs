//! Project, notebook and file-level records.

use serde::Serialize;
use serde_json::{Map, Number, Value};
use serde_with::skip_serializing_none;
use std::collections::BTreeMap;

use super::block::Block;
use super::metadata::Passthrough;

/// A parsed `.deepnote` document.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeepnoteFile {
    pub metadata: FileMetadata,
    pub environment: Option<Environment>,
    pub execution: Option<Execution>,
    pub project: Project,
    pub version: String,
}

impl DeepnoteFile {
    /// All blocks of all notebooks in document order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.project.notebooks.iter().flat_map(|n| n.blocks.iter())
    }

    pub fn find_block(&self, id: &str) -> Option<&Block> {
        self.blocks().find(|b| b.id() == id)
    }

    pub fn find_notebook(&self, id_or_name: &str) -> Option<&Notebook> {
        self.project
            .notebooks
            .iter()
            .find(|n| n.id == id_or_name)
            .or_else(|| self.project.notebooks.iter().find(|n| n.name == id_or_name))
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub created_at: String,
    pub exported_at: Option<String>,
    pub modified_at: Option<String>,
    pub checksum: Option<String>,
    #[serde(flatten)]
    pub extra: Passthrough,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub notebooks: Vec<Notebook>,
    pub init_notebook_id: Option<String>,
    pub integrations: Option<Vec<Integration>>,
    pub settings: Option<ProjectSettings>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Integration {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub integration_type: String,
    #[serde(flatten)]
    pub extra: Passthrough,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSettings {
    pub requirements: Option<Vec<String>>,
    pub sql_cache_max_age: Option<Number>,
    #[serde(flatten)]
    pub extra: Passthrough,
}

/// Whether running a block also re-runs its dependents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Block,
    Downstream,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notebook {
    pub id: String,
    pub name: String,
    pub blocks: Vec<Block>,
    pub execution_mode: Option<ExecutionMode>,
    pub is_module: Option<bool>,
    pub working_directory: Option<String>,
}

impl Notebook {
    pub fn block_ids(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().map(|b| b.id())
    }
}

/// Runtime environment the project was last executed in.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub custom_image: Option<String>,
    pub hash: Option<String>,
    pub packages: Option<BTreeMap<String, String>>,
    pub platform: Option<String>,
    pub python: Option<PythonEnvironment>,
    #[serde(flatten)]
    pub extra: Passthrough,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PythonEnvironment {
    pub environment: Option<String>,
    pub version: Option<String>,
    #[serde(flatten)]
    pub extra: Passthrough,
}

/// Summary of the last project run.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub triggered_by: Option<String>,
    pub inputs: Option<Map<String, Value>>,
    pub summary: Option<ExecutionSummary>,
    pub error: Option<ExecutionError>,
    #[serde(flatten)]
    pub extra: Passthrough,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSummary {
    pub blocks_executed: Option<u64>,
    pub blocks_succeeded: Option<u64>,
    pub blocks_failed: Option<u64>,
    pub total_duration_ms: Option<Number>,
    #[serde(flatten)]
    pub extra: Passthrough,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutionError {
    pub name: Option<String>,
    pub message: Option<String>,
    pub traceback: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Passthrough,
}

/// A file that also records the environment and execution it was taken from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DeepnoteSnapshot(DeepnoteFile);

impl DeepnoteSnapshot {
    pub fn file(&self) -> &DeepnoteFile {
        &self.0
    }

    pub fn into_file(self) -> DeepnoteFile {
        self.0
    }

    pub fn environment(&self) -> &Environment {
        // Presence is checked in `try_from`.
        self.0.environment.as_ref().unwrap_or(&EMPTY_ENVIRONMENT)
    }

    pub fn execution(&self) -> &Execution {
        self.0.execution.as_ref().unwrap_or(&EMPTY_EXECUTION)
    }
}

static EMPTY_ENVIRONMENT: Environment = Environment {
    custom_image: None,
    hash: None,
    packages: None,
    platform: None,
    python: None,
    extra: BTreeMap::new(),
};

static EMPTY_EXECUTION: Execution = Execution {
    started_at: None,
    finished_at: None,
    triggered_by: None,
    inputs: None,
    summary: None,
    error: None,
    extra: BTreeMap::new(),
};

/// Names the section a snapshot is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingSnapshotSection(pub &'static str);

impl std::fmt::Display for MissingSnapshotSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "snapshot requires an '{}' section", self.0)
    }
}

impl std::error::Error for MissingSnapshotSection {}

impl TryFrom<DeepnoteFile> for DeepnoteSnapshot {
    type Error = MissingSnapshotSection;

    fn try_from(file: DeepnoteFile) -> Result<Self, Self::Error> {
        if file.environment.is_none() {
            return Err(MissingSnapshotSection("environment"));
        }
        if file.execution.is_none() {
            return Err(MissingSnapshotSection("execution"));
        }
        Ok(DeepnoteSnapshot(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::block::{BlockHeader, PresentationBlock};
    use crate::model::metadata::PresentationMetadata;

    fn separator(id: &str) -> Block {
        Block::Separator(PresentationBlock {
            header: BlockHeader {
                id: id.to_string(),
                block_group: "g".to_string(),
                sorting_key: "0".to_string(),
                content_hash: None,
                version: None,
            },
            content: None,
            metadata: PresentationMetadata::default(),
        })
    }

    fn file() -> DeepnoteFile {
        DeepnoteFile {
            metadata: FileMetadata {
                created_at: "2024-01-01T00:00:00.000Z".to_string(),
                exported_at: None,
                modified_at: None,
                checksum: None,
                extra: Passthrough::new(),
            },
            environment: None,
            execution: None,
            project: Project {
                id: "p".to_string(),
                name: "Project".to_string(),
                notebooks: vec![
                    Notebook {
                        id: "n1".to_string(),
                        name: "Main".to_string(),
                        blocks: vec![separator("a"), separator("b")],
                        execution_mode: None,
                        is_module: None,
                        working_directory: None,
                    },
                    Notebook {
                        id: "n2".to_string(),
                        name: "Helpers".to_string(),
                        blocks: vec![separator("c")],
                        execution_mode: Some(ExecutionMode::Downstream),
                        is_module: Some(true),
                        working_directory: None,
                    },
                ],
                init_notebook_id: None,
                integrations: None,
                settings: None,
            },
            version: "1.0.0".to_string(),
        }
    }

    #[test]
    fn test_blocks_iterates_in_document_order() {
        let file = file();
        let ids: Vec<&str> = file.blocks().map(|b| b.id()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(file.find_block("c").is_some());
        assert!(file.find_block("z").is_none());
    }

    #[test]
    fn test_find_notebook_by_id_or_name() {
        let file = file();
        assert_eq!(file.find_notebook("n2").map(|n| n.name.as_str()), Some("Helpers"));
        assert_eq!(file.find_notebook("Main").map(|n| n.id.as_str()), Some("n1"));
        let ids: Vec<&str> = file.project.notebooks[0].block_ids().collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_snapshot_requires_environment_and_execution() {
        let err = DeepnoteSnapshot::try_from(file()).unwrap_err();
        assert_eq!(err, MissingSnapshotSection("environment"));

        let mut with_env = file();
        with_env.environment = Some(Environment::default());
        let err = DeepnoteSnapshot::try_from(with_env.clone()).unwrap_err();
        assert_eq!(err.to_string(), "snapshot requires an 'execution' section");

        with_env.execution = Some(Execution::default());
        let snapshot = DeepnoteSnapshot::try_from(with_env).unwrap();
        assert_eq!(snapshot.file().project.id, "p");
        assert!(snapshot.execution().summary.is_none());
    }
}
