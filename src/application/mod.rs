//! Application layer: catalog ingestion, rendering and services
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod catalog;
pub mod error;
pub mod error_ext;
pub mod render;
pub mod services;

pub use catalog::{Catalog, EncodingPolicy, RawFeatureRecord};
pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::IoResultExt;
pub use render::{OutputFormat, ToTermTree, TreeView};
