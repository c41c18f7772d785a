//! File model types.
//!
//! Plain data threaded through validation, serialization and code generation.
//! Values are built by [`crate::schema::validate`] and only derive `Serialize`;
//! field declaration order is the emitted field order.

pub mod block;
pub mod file;
pub mod metadata;

pub use block::{
    Block, BlockFamily, BlockHeader, BlockType, ExecutableBlock, ExecutionState,
    PresentationBlock, UnknownBlockType,
};
pub use file::{
    DeepnoteFile, DeepnoteSnapshot, Environment, Execution, ExecutionError, ExecutionMode,
    ExecutionSummary, FileMetadata, Integration, MissingSnapshotSection, Notebook, Project,
    ProjectSettings, PythonEnvironment,
};
pub use metadata::*;
