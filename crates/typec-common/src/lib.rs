//! Shared leaf types for the TypeC compiler crates.

pub mod config;
pub mod span;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use config::TypeckConfig;
pub use span::{LineIndex, Span};

/// Identity of a source document. Every syntax node belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub u32);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc#{}", self.0)
    }
}
