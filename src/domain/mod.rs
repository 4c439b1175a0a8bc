//! Domain layer: entities and tree-building logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod diagnostics;
pub mod entities;
pub mod error;

pub use arena::{FeatureTree, NodeData, TreeNode};
pub use builder::{build_tree, ensure_unique_ids, BuildOutput, TreeBuilder, DEFAULT_ROOT_NAME};
pub use diagnostics::Diagnostic;
pub use entities::*;
pub use error::{DomainError, DomainResult};
