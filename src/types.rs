//! Core domain types: references, resolved dependencies, and scan notices.
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// A raw dependency string extracted from a source file, not yet resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// File the reference was extracted from.
    pub referrer: PathBuf,
    /// Raw reference text, e.g. `util.h`.
    pub text: String,
}

/// A reference bound to the concrete file it resolved to.
///
/// Two records with the same `path` denote the same dependency no matter which
/// spelling produced them. The scanner guarantees each path appears once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDependency {
    /// Absolute, lexically normalized path of the dependency.
    pub path: PathBuf,
    /// Reference text as written in the referring file.
    pub reference: String,
    /// Concrete path of the file that referenced it.
    pub referrer: PathBuf,
}

impl fmt::Display for ResolvedDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{}", self.path.display());
    }
}

/// Non-fatal condition recorded during a traversal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// A file exists but its content could not be read as text.
    Unreadable {
        /// Concrete path of the unreadable file.
        path: PathBuf,
        /// Human-readable cause.
        reason: String,
    },
    /// No search path contained a file matching the reference.
    Unresolved {
        /// Raw reference text.
        reference: String,
        /// Concrete path of the file containing the reference.
        referrer: PathBuf,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            Notice::Unreadable { path, reason } => {
                write!(f, "unreadable: {} ({reason})", path.display())
            },
            Notice::Unresolved { reference, referrer } => {
                write!(f, "unresolved: `{reference}` in {}", referrer.display())
            },
        };
    }
}
