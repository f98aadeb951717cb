//! Schema Paths
//!
//! Every TypeNode, field and reference remembers where it came from in the
//! input document. Paths render as JSON pointers anchored at the document
//! root (`#/properties/foo/oneOf/2`) so fatal errors point at the exact node.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Path Segment
// =============================================================================

/// A single step from a schema node to one of its children.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PathSegment {
    /// An object key (`properties`, `$defs`, a property name, ...)
    Key(String),
    /// An array position (`oneOf/2`, `enum/0`)
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // RFC 6901 escaping: '~' first, then '/'
            Self::Key(key) => write!(f, "{}", key.replace('~', "~0").replace('/', "~1")),
            Self::Index(i) => write!(f, "{}", i),
        }
    }
}

// =============================================================================
// Schema Path
// =============================================================================

/// Location of a schema node, relative to the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SchemaPath(Vec<PathSegment>);

impl SchemaPath {
    /// The document root (`#`)
    pub fn root() -> Self {
        Self::default()
    }

    /// Extend with an object key
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.into()));
        Self(segments)
    }

    /// Extend with an array index
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    /// Extend with several keys at once (`path.keys(["properties", name])`)
    pub fn keys<I, S>(&self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut segments = self.0.clone();
        segments.extend(keys.into_iter().map(|k| PathSegment::Key(k.into())));
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#")?;
        for segment in &self.0 {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}
