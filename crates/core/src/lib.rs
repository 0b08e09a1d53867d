//! Domain types and pure rules for the notebook document tree.
//!
//! Nothing in this crate performs I/O; storage lives in `notebook-db` and the
//! HTTP surface in `notebook-api`.

pub mod document;
pub mod error;
pub mod tree;
pub mod types;
