//! Tree renderings for the terminal and for external layout tools

use generational_arena::Index;
use serde::{Deserialize, Serialize};
use termtree::Tree;

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::FeatureTree;

/// Output format of the `tree` command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

/// Nested, owned projection of a [`FeatureTree`].
///
/// Serializes to the `{name, id, children}` shape hierarchical layout
/// libraries consume. The raw `feature_order` rides along so renderers can
/// use the alternative chains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeView {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_order: Option<String>,
    #[serde(default)]
    pub children: Vec<TreeView>,
}

impl TreeView {
    pub fn from_tree(tree: &FeatureTree) -> Self {
        Self::from_node(tree, tree.root())
    }

    fn from_node(tree: &FeatureTree, idx: Index) -> Self {
        match tree.get_node(idx) {
            Some(node) => Self {
                name: node.label().to_string(),
                id: node.id(),
                feature_order: node
                    .data
                    .record()
                    .and_then(|r| r.raw_order())
                    .map(str::to_string),
                children: node
                    .children
                    .iter()
                    .map(|&child| Self::from_node(tree, child))
                    .collect(),
            },
            None => Self {
                name: String::new(),
                id: None,
                feature_order: None,
                children: Vec::new(),
            },
        }
    }

    /// Number of nodes in this subtree, this one included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(TreeView::count).sum::<usize>()
    }
}

/// Conversion into a printable termtree.
pub trait ToTermTree {
    fn to_term_tree(&self) -> Tree<String>;
}

impl ToTermTree for FeatureTree {
    fn to_term_tree(&self) -> Tree<String> {
        fn build(tree: &FeatureTree, idx: Index) -> Tree<String> {
            let label = tree
                .get_node(idx)
                .map(|n| n.data.to_string())
                .unwrap_or_default();
            let leaves: Vec<_> = tree
                .get_node(idx)
                .map(|n| n.children.iter().map(|&c| build(tree, c)).collect())
                .unwrap_or_default();
            Tree::new(label).with_leaves(leaves)
        }

        build(self, self.root())
    }
}

impl ToTermTree for TreeView {
    fn to_term_tree(&self) -> Tree<String> {
        let label = match self.id {
            Some(id) => format!("{} [{}]", self.name, id),
            None => self.name.clone(),
        };
        Tree::new(label).with_leaves(self.children.iter().map(|c| c.to_term_tree()))
    }
}

pub fn render_text(tree: &FeatureTree) -> String {
    tree.to_term_tree().to_string()
}

pub fn render_json(tree: &FeatureTree, compact: bool) -> ApplicationResult<String> {
    let view = TreeView::from_tree(tree);
    let result = if compact {
        serde_json::to_string(&view)
    } else {
        serde_json::to_string_pretty(&view)
    };
    result.map_err(|e| ApplicationError::OperationFailed {
        context: "serialize tree".to_string(),
        source: Box::new(e),
    })
}

pub fn render(tree: &FeatureTree, format: OutputFormat, compact: bool) -> ApplicationResult<String> {
    match format {
        OutputFormat::Text => Ok(render_text(tree)),
        OutputFormat::Json => render_json(tree, compact),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{build_tree, FeatureOrder, FeatureRecord, OrderEncoding};

    fn small_tree() -> FeatureTree {
        let records = vec![
            FeatureRecord::new(1, "Card", FeatureOrder::Chains(OrderEncoding::parse("31-1").unwrap())),
            FeatureRecord::new(31, "Upgrade", FeatureOrder::Chains(OrderEncoding::parse("31").unwrap())),
            FeatureRecord::new(30, "Login", FeatureOrder::Unordered),
        ];
        build_tree(&records).unwrap()
    }

    #[test]
    fn test_render_text() {
        let text = render_text(&small_tree());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Banking App");
        assert!(lines[1].ends_with("Upgrade [31]"));
        assert!(lines[2].ends_with("Card [1]"));
        assert!(lines[3].ends_with("Login [30]"));
    }

    #[test]
    fn test_view_text_matches_tree_text() {
        let tree = small_tree();
        assert_eq!(
            TreeView::from_tree(&tree).to_term_tree().to_string(),
            render_text(&tree)
        );
    }

    #[test]
    fn test_render_json_shape() {
        let json = render_json(&small_tree(), true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["name"], "Banking App");
        assert!(value.get("id").is_none());
        assert_eq!(value["children"][0]["id"], 31);
        assert_eq!(value["children"][0]["children"][0]["feature_order"], "31-1");
        assert!(value["children"][1].get("feature_order").is_none());
    }

    #[test]
    fn test_view_deserializes_back() {
        let tree = small_tree();
        let json = render_json(&tree, false).unwrap();
        let view: TreeView = serde_json::from_str(&json).unwrap();
        assert_eq!(view, TreeView::from_tree(&tree));
        assert_eq!(view.count(), 4);
    }
}
