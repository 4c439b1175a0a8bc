//! Arena-backed feature tree.

use std::collections::HashMap;
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::entities::FeatureRecord;
use crate::domain::error::{DomainError, DomainResult};

/// Payload of a tree node: the synthetic root or one catalog record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Root { name: String },
    Feature(FeatureRecord),
}

impl NodeData {
    /// Display label for renderers.
    pub fn label(&self) -> &str {
        match self {
            NodeData::Root { name } => name,
            NodeData::Feature(record) => &record.name,
        }
    }

    /// Stable identifier, `None` for the root.
    pub fn id(&self) -> Option<u32> {
        match self {
            NodeData::Root { .. } => None,
            NodeData::Feature(record) => Some(record.id),
        }
    }

    pub fn record(&self) -> Option<&FeatureRecord> {
        match self {
            NodeData::Root { .. } => None,
            NodeData::Feature(record) => Some(record),
        }
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeData::Root { name } => write!(f, "{}", name),
            NodeData::Feature(record) => write!(f, "{}", record),
        }
    }
}

/// Tree node in the arena.
#[derive(Debug)]
pub struct TreeNode {
    /// Root marker or feature record
    pub data: NodeData,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes, in catalog order
    pub children: Vec<Index>,
}

impl TreeNode {
    pub fn label(&self) -> &str {
        self.data.label()
    }

    pub fn id(&self) -> Option<u32> {
        self.data.id()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Rooted tree of catalog features.
///
/// Uses a generational arena for node storage and keeps an id -> index map
/// for O(1) lookups. Read-only once the builder hands it out.
#[derive(Debug)]
pub struct FeatureTree {
    arena: Arena<TreeNode>,
    root: Index,
    index: HashMap<u32, Index>,
}

impl FeatureTree {
    pub(crate) fn with_root(name: impl Into<String>) -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(TreeNode {
            data: NodeData::Root { name: name.into() },
            parent: None,
            children: Vec::new(),
        });
        Self {
            arena,
            root,
            index: HashMap::new(),
        }
    }

    /// Allocate an unlinked node for `record`.
    #[instrument(level = "trace", skip(self, record), fields(id = record.id))]
    pub(crate) fn insert_detached(&mut self, record: FeatureRecord) -> DomainResult<Index> {
        let id = record.id;
        if self.index.contains_key(&id) {
            return Err(DomainError::DuplicateId { id });
        }
        let idx = self.arena.insert(TreeNode {
            data: NodeData::Feature(record),
            parent: None,
            children: Vec::new(),
        });
        self.index.insert(id, idx);
        Ok(idx)
    }

    /// Append `child` to `parent`'s children.
    #[instrument(level = "trace", skip(self))]
    pub(crate) fn attach(&mut self, child: Index, parent: Index) {
        if let Some(node) = self.arena.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.arena.get_mut(parent) {
            node.children.push(child);
        }
    }

    /// True if `candidate` is `node` or lies above it on the parent chain.
    pub(crate) fn is_ancestor_or_self(&self, candidate: Index, node: Index) -> bool {
        let mut current = Some(node);
        while let Some(idx) = current {
            if idx == candidate {
                return true;
            }
            current = self.arena.get(idx).and_then(|n| n.parent);
        }
        false
    }

    pub fn root(&self) -> Index {
        self.root
    }

    pub fn root_node(&self) -> &TreeNode {
        // the root is inserted on construction and never removed
        &self.arena[self.root]
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    /// Arena index of the feature with `id`.
    pub fn find(&self, id: u32) -> Option<Index> {
        self.index.get(&id).copied()
    }

    pub fn node(&self, id: u32) -> Option<&TreeNode> {
        self.find(id).and_then(|idx| self.get_node(idx))
    }

    /// Number of feature nodes (the root is not counted).
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Child nodes of `idx`, in order.
    pub fn children_of(&self, idx: Index) -> impl Iterator<Item = &TreeNode> + '_ {
        self.get_node(idx)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(move |&c| self.get_node(c))
    }

    /// Parent of the feature with `id`; the root node for top-level features.
    pub fn parent_of(&self, id: u32) -> Option<&TreeNode> {
        self.node(id)
            .and_then(|n| n.parent)
            .and_then(|p| self.get_node(p))
    }

    /// Nodes from the root down to the feature with `id`, both included.
    #[instrument(level = "debug", skip(self))]
    pub fn ancestors(&self, id: u32) -> DomainResult<Vec<&TreeNode>> {
        let mut current = Some(self.find(id).ok_or(DomainError::UnknownFeature(id))?);
        let mut path = Vec::new();
        while let Some(idx) = current {
            let node = match self.get_node(idx) {
                Some(node) => node,
                None => break,
            };
            path.push(node);
            current = node.parent;
        }
        path.reverse();
        Ok(path)
    }

    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    /// Number of levels, the root level included.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.calculate_depth(self.root)
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.get_node(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Feature records without children, in pre-order.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_nodes(&self) -> Vec<&FeatureRecord> {
        self.iter()
            .filter(|(_, node)| node.is_leaf())
            .filter_map(|(_, node)| node.data.record())
            .collect()
    }

    /// Pre-order listing of `(depth, id)` pairs; equal for structurally equal trees.
    pub fn shape(&self) -> Vec<(usize, Option<u32>)> {
        let mut out = Vec::with_capacity(self.len() + 1);
        self.collect_shape(self.root, 0, &mut out);
        out
    }

    fn collect_shape(&self, idx: Index, depth: usize, out: &mut Vec<(usize, Option<u32>)>) {
        if let Some(node) = self.get_node(idx) {
            out.push((depth, node.id()));
            for &child in &node.children {
                self.collect_shape(child, depth + 1, out);
            }
        }
    }
}

pub struct TreeIterator<'a> {
    tree: &'a FeatureTree,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a FeatureTree) -> Self {
        Self {
            tree,
            stack: vec![tree.root()],
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    tree: &'a FeatureTree,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(tree: &'a FeatureTree) -> Self {
        Self {
            tree,
            stack: vec![(tree.root(), false)],
        }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}
