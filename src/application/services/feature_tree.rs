//! Feature tree service
//!
//! Loads a catalog (builtin or from a JSON file), builds the tree and renders it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::catalog::Catalog;
use crate::application::render::{self, OutputFormat};
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{BuildOutput, FeatureTree, TreeBuilder};
use crate::infrastructure::traits::FileSystem;

/// Headline numbers about a built tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeSummary {
    /// Feature nodes (root excluded)
    pub features: usize,
    /// Levels, root included
    pub depth: usize,
    pub leaves: usize,
    /// Labels of the root's children, in order
    pub root_children: Vec<String>,
    /// Diagnostics that moved a node under the root
    pub fallbacks: usize,
    /// Remaining, informational diagnostics
    pub data_quality: usize,
}

/// Service for building and rendering the feature tree.
pub struct FeatureTreeService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
}

impl FeatureTreeService {
    /// Create a new feature tree service.
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self { fs, settings }
    }

    /// Resolve the catalog: explicit path, then configured path, then builtin.
    #[instrument(level = "debug", skip(self))]
    pub fn load_catalog(&self, path: Option<&Path>) -> ApplicationResult<Catalog> {
        let path: Option<PathBuf> = path
            .map(Path::to_path_buf)
            .or_else(|| self.settings.catalog.clone());

        let Some(path) = path else {
            debug!("load_catalog: using builtin catalog");
            return Ok(Catalog::builtin());
        };

        if !self.fs.is_file(&path) {
            return Err(ApplicationError::Catalog {
                message: format!("catalog not found: {}", path.display()),
            });
        }
        let content = self
            .fs
            .read_to_string(&path)
            .with_path_context("read catalog", &path)?;
        let catalog = Catalog::from_json_str(&content, self.settings.encoding)?;
        debug!("load_catalog: {} records from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Build the tree for `catalog` using the configured root name.
    pub fn build(&self, catalog: &Catalog) -> ApplicationResult<BuildOutput> {
        let output = TreeBuilder::new()
            .with_root_name(self.settings.root_name.clone())
            .build(catalog.records())?;
        Ok(output)
    }

    pub fn load_and_build(&self, path: Option<&Path>) -> ApplicationResult<BuildOutput> {
        let catalog = self.load_catalog(path)?;
        self.build(&catalog)
    }

    /// Render with `format`, falling back to the configured format.
    pub fn render(
        &self,
        tree: &FeatureTree,
        format: Option<OutputFormat>,
        compact: bool,
    ) -> ApplicationResult<String> {
        render::render(tree, format.unwrap_or(self.settings.format), compact)
    }

    /// Labels from the root down to feature `id`.
    pub fn ancestry(&self, tree: &FeatureTree, id: u32) -> ApplicationResult<Vec<String>> {
        Ok(tree
            .ancestors(id)?
            .into_iter()
            .map(|n| n.data.to_string())
            .collect())
    }

    pub fn summarize(&self, output: &BuildOutput) -> TreeSummary {
        let tree = &output.tree;
        let fallbacks = output.fallbacks().count();
        TreeSummary {
            features: tree.len(),
            depth: tree.depth(),
            leaves: tree.leaf_nodes().len(),
            root_children: tree
                .children_of(tree.root())
                .map(|n| n.data.to_string())
                .collect(),
            fallbacks,
            data_quality: output.diagnostics.len() - fallbacks,
        }
    }
}
