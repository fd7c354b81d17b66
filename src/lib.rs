// Copyright 2025 Oxide Computer Company

//! openapi-diff
//!
//! Structural, reference-aware differences between OpenAPI documents.

mod compare;
mod context;
mod difference;
mod document;
mod error;
mod node;
mod operations;
mod options;
mod path;
mod registry;
mod resolve;
mod schema;
mod security;
mod setops;

pub use compare::{Comparator, compare, compare_documents};
pub use difference::*;
pub use error::CompareError;
pub use options::CompareOptions;
pub use resolve::{Reference, ReferenceKind, Resolvable, ResolveReference};
