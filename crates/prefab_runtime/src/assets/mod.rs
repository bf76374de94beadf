//! Asset input
//!
//! Prefab libraries arrive as generic [`DataNode`] trees produced by a
//! [`LibrarySource`]. The prefab code only interprets the tree.

pub mod data_node;
pub mod library_source;

pub use data_node::DataNode;
pub use library_source::{LibrarySource, MemoryLibrarySource, RonLibrarySource, SourceError};
