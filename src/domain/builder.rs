//! Tree builder: turns a flat catalog into a single rooted feature tree.

use generational_arena::Index;
use tracing::{debug, info, instrument, warn};

use crate::domain::arena::FeatureTree;
use crate::domain::diagnostics::Diagnostic;
use crate::domain::entities::{FeatureOrder, FeatureRecord, OrderToken};
use crate::domain::error::{DomainError, DomainResult};

/// Display name of the synthetic root unless configured otherwise.
pub const DEFAULT_ROOT_NAME: &str = "Banking App";

/// A finished tree together with what the builder tolerated along the way.
#[derive(Debug)]
pub struct BuildOutput {
    pub tree: FeatureTree,
    pub diagnostics: Vec<Diagnostic>,
}

impl BuildOutput {
    /// Diagnostics that moved a node under the root.
    pub fn fallbacks(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_fallback())
    }
}

/// Where a record should hang before cycle checks.
enum Placement {
    Root,
    Parent(u32),
    Malformed { raw: String, reason: String },
}

/// Constructs the feature tree from catalog records.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    root_name: String,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            root_name: DEFAULT_ROOT_NAME.to_string(),
        }
    }

    pub fn with_root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = name.into();
        self
    }

    /// Build the tree.
    ///
    /// All nodes are allocated before any linking so that a record may name
    /// a parent that appears later in the catalog. Siblings keep catalog
    /// order. Unresolvable parents attach under the root and are reported in
    /// [`BuildOutput::diagnostics`]; only duplicate ids abort the build.
    #[instrument(level = "debug", skip(self, records), fields(records = records.len()))]
    pub fn build(&self, records: &[FeatureRecord]) -> DomainResult<BuildOutput> {
        let mut tree = FeatureTree::with_root(self.root_name.clone());
        let mut diagnostics = Vec::new();

        // Index pass
        let mut nodes: Vec<(Index, Placement)> = Vec::with_capacity(records.len());
        for record in records {
            let placement = Self::placement(record, &mut diagnostics);
            let idx = tree.insert_detached(record.clone())?;
            nodes.push((idx, placement));
        }

        // Link pass, catalog order
        let root = tree.root();
        for (record, (idx, placement)) in records.iter().zip(nodes) {
            let parent = match placement {
                Placement::Root => root,
                Placement::Malformed { raw, reason } => {
                    warn!(id = record.id, raw = %raw, "unresolvable parent token, attaching to root");
                    diagnostics.push(Diagnostic::MalformedEncoding {
                        id: record.id,
                        raw,
                        reason,
                    });
                    root
                }
                Placement::Parent(parent_id) => match tree.find(parent_id) {
                    None => {
                        warn!(id = record.id, parent = parent_id, "dangling parent, attaching to root");
                        diagnostics.push(Diagnostic::DanglingParent {
                            id: record.id,
                            parent: parent_id,
                        });
                        root
                    }
                    Some(parent_idx) if tree.is_ancestor_or_self(idx, parent_idx) => {
                        warn!(id = record.id, parent = parent_id, "parent would form a cycle, attaching to root");
                        diagnostics.push(Diagnostic::CycleBroken {
                            id: record.id,
                            parent: parent_id,
                        });
                        root
                    }
                    Some(parent_idx) => parent_idx,
                },
            };
            tree.attach(idx, parent);
        }

        debug!(
            nodes = tree.len(),
            root_children = tree.root_node().children.len(),
            diagnostics = diagnostics.len(),
            "tree built"
        );
        Ok(BuildOutput { tree, diagnostics })
    }

    fn placement(record: &FeatureRecord, diagnostics: &mut Vec<Diagnostic>) -> Placement {
        let encoding = match &record.order {
            FeatureOrder::Unordered => return Placement::Root,
            FeatureOrder::Chains(encoding) => encoding,
        };

        for token in encoding.ignored_tokens() {
            info!(id = record.id, token, "ignoring non-integer token in feature_order");
            diagnostics.push(Diagnostic::IgnoredToken {
                id: record.id,
                token: token.to_string(),
            });
        }
        if let Some(token) = encoding.trailing_id() {
            if token != record.id {
                info!(id = record.id, token, "feature_order does not end with own id");
                diagnostics.push(Diagnostic::TrailingTokenMismatch {
                    id: record.id,
                    token,
                });
            }
        }

        match encoding.parent_token() {
            None => Placement::Root,
            Some(OrderToken::Id(parent)) => Placement::Parent(*parent),
            Some(OrderToken::Invalid(token)) => Placement::Malformed {
                raw: encoding.raw().to_string(),
                reason: format!("parent token {token:?} is not a feature id"),
            },
        }
    }
}

/// Build a tree with the default root name, discarding diagnostics.
///
/// Diagnostics are still logged through `tracing`.
pub fn build_tree(records: &[FeatureRecord]) -> DomainResult<FeatureTree> {
    TreeBuilder::new().build(records).map(|out| out.tree)
}

/// Check ids for uniqueness without building.
pub fn ensure_unique_ids(records: &[FeatureRecord]) -> DomainResult<()> {
    let mut seen = std::collections::HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.id) {
            return Err(DomainError::DuplicateId { id: record.id });
        }
    }
    Ok(())
}
