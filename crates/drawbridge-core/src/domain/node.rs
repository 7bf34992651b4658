//! Logical namespace tree and object-key mapping
//!
//! The store itself is flat; the tree shape exists only on this side.
//! Each node owns its own fields and holds a non-owning reference *upward*
//! to its parent directory. Children are never stored on a node - they are
//! reconstructed per listing call by the namespace service - so the
//! structure cannot form cycles and cannot go stale between listings.
//!
//! Key derivation is the single source of truth for identity: ancestor
//! names joined with `/`, with a trailing `/` iff the node is a directory.

use std::sync::Arc;

use super::errors::DomainError;
use super::newtypes::ObjectKey;

/// Validates a single node name (one path segment)
///
/// Names must be non-empty, must not contain the key delimiter, and must
/// not be a traversal segment.
fn validate_name(name: &str) -> Result<(), DomainError> {
    if name.is_empty() {
        return Err(DomainError::InvalidNodeName(
            "Node name cannot be empty".to_string(),
        ));
    }
    if name.contains('/') {
        return Err(DomainError::InvalidNodeName(format!(
            "Node name cannot contain '/': {name}"
        )));
    }
    if name == "." || name == ".." {
        return Err(DomainError::InvalidNodeName(format!(
            "Node name cannot be a traversal segment: {name}"
        )));
    }
    Ok(())
}

/// Joins the ancestor chain into a `/`-separated path, root first
fn path_string(name: &str, parent: Option<&Arc<Directory>>) -> String {
    let mut segments = vec![name];
    let mut current = parent;
    while let Some(dir) = current {
        segments.push(dir.name());
        current = dir.parent();
    }
    segments.reverse();
    segments.join("/")
}

// ============================================================================
// Directory
// ============================================================================

/// A directory in the logical namespace
///
/// Constructed with a parent drawn from an already-existing ancestry chain,
/// so the full path is always well-formed. Shared via `Arc` because file
/// and directory children all reference the same parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    name: String,
    parent: Option<Arc<Directory>>,
}

impl Directory {
    /// Creates a directory under the given parent (None = root level)
    ///
    /// # Errors
    /// Returns `DomainError::InvalidNodeName` if the name is not a valid
    /// path segment
    pub fn new(
        name: impl Into<String>,
        parent: Option<Arc<Directory>>,
    ) -> Result<Arc<Self>, DomainError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Arc::new(Self { name, parent }))
    }

    /// The directory's own name (last path segment)
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parent directory, if any
    #[must_use]
    pub fn parent(&self) -> Option<&Arc<Directory>> {
        self.parent.as_ref()
    }

    /// Derives the object key: ancestor names joined with `/`, plus the
    /// trailing `/` that marks a directory placeholder
    #[must_use]
    pub fn object_key(&self) -> ObjectKey {
        let path = path_string(&self.name, self.parent.as_ref());
        ObjectKey::from_validated(format!("{path}/"))
    }

    /// The listing prefix for this directory's children
    ///
    /// Identical to the object key; kept as a separate accessor because
    /// callers that build prefixes should not care about placeholder
    /// semantics.
    #[must_use]
    pub fn child_prefix(&self) -> String {
        self.object_key().into()
    }
}

// ============================================================================
// FileNode
// ============================================================================

/// A file in the logical namespace
///
/// The size hint is informational only (taken from listing results),
/// never authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    name: String,
    parent: Option<Arc<Directory>>,
    size_hint: Option<u64>,
}

impl FileNode {
    /// Creates a file node under the given parent (None = root level)
    ///
    /// # Errors
    /// Returns `DomainError::InvalidNodeName` if the name is not a valid
    /// path segment
    pub fn new(
        name: impl Into<String>,
        parent: Option<Arc<Directory>>,
        size_hint: Option<u64>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            parent,
            size_hint,
        })
    }

    /// The file's own name (last path segment)
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parent directory, if any
    #[must_use]
    pub fn parent(&self) -> Option<&Arc<Directory>> {
        self.parent.as_ref()
    }

    /// Informational size from the last listing, if known
    #[must_use]
    pub fn size_hint(&self) -> Option<u64> {
        self.size_hint
    }

    /// Derives the object key: ancestor names joined with `/`, no trailing
    /// delimiter
    #[must_use]
    pub fn object_key(&self) -> ObjectKey {
        ObjectKey::from_validated(path_string(&self.name, self.parent.as_ref()))
    }
}

// ============================================================================
// LogicalNode
// ============================================================================

/// A node in the logical namespace - either a directory or a file
///
/// Modeled as a tagged union dispatched by explicit match, never by
/// runtime type inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicalNode {
    /// A directory (common-prefix listing result)
    Directory(Arc<Directory>),
    /// A file (content listing result)
    File(FileNode),
}

impl LogicalNode {
    /// The node's own name (last path segment)
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            LogicalNode::Directory(dir) => dir.name(),
            LogicalNode::File(file) => file.name(),
        }
    }

    /// Whether this node is a directory
    #[must_use]
    pub fn is_directory(&self) -> bool {
        matches!(self, LogicalNode::Directory(_))
    }

    /// Derives the node's object key
    #[must_use]
    pub fn object_key(&self) -> ObjectKey {
        match self {
            LogicalNode::Directory(dir) => dir.object_key(),
            LogicalNode::File(file) => file.object_key(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
