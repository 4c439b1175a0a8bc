//! featuretree: the banking feature catalog as a rooted tree.
//!
//! A flat catalog of feature records, each carrying a `feature_order` string,
//! is decoded and linked into a single tree under a synthetic root. The tree
//! is read-only and can be rendered as text or handed to an external layout
//! tool as JSON.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

pub use application::{Catalog, EncodingPolicy, RawFeatureRecord, TreeView};
pub use domain::{build_tree, BuildOutput, Diagnostic, DomainError, FeatureRecord, FeatureTree, TreeBuilder};
