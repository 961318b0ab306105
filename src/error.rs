//! Crate-level error types for dependency discovery.
use std::path::PathBuf;

/// Every error names the rule, pattern, or file it concerns so a diagnostic
/// can be produced without a debugger.
///
/// Only configuration-time variants abort an operation. `FileTooLarge`,
/// `Io` and `NotText` raised while reading a scanned file are turned into
/// [`crate::types::Notice::Unreadable`] by the scanner.
#[allow(clippy::error_impl_error, reason = "crate-wide error type re-exported at the root")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An extraction pattern does not have exactly one capturing group.
    #[error("rule `{rule}`: extract pattern `{pattern}` has {groups} capture groups, expected 1")]
    CaptureGroups {
        /// Number of capturing groups found in the pattern.
        groups: usize,
        /// The offending pattern source.
        pattern: String,
        /// Name of the rule being constructed.
        rule: String,
    },

    /// An explicitly requested config file does not exist on disk.
    #[error("config not found: {}", path.display())]
    ConfigNotFound {
        /// Path to the missing config file.
        path: PathBuf,
    },

    /// A rule has neither name patterns nor extensions and could never match.
    #[error("rule `{rule}` has no name patterns or extensions")]
    EmptyRule {
        /// Name of the rule being constructed.
        rule: String,
    },

    /// Scanned file exceeds the content size limit.
    #[error("file too large ({size_bytes} bytes, max {max_bytes}): {}", file.display())]
    FileTooLarge {
        /// File that exceeded the size limit.
        file: PathBuf,
        /// Maximum allowed file size in bytes.
        max_bytes: u64,
        /// Actual file size in bytes.
        size_bytes: u64,
    },

    /// A name or extract pattern is not a valid regular expression.
    #[error("rule `{rule}`: invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        /// The offending pattern source.
        pattern: String,
        /// Name of the rule being constructed.
        rule: String,
        /// Underlying regex compilation error.
        source: regex::Error,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// File content is not valid UTF-8 text.
    #[error("not a text file: {}", file.display())]
    NotText {
        /// File whose content could not be decoded.
        file: PathBuf,
    },

    /// Scanner configuration was changed after enumeration began.
    #[error("scanner for {} already started; configure it before iterating", root.display())]
    ScanStarted {
        /// Starting file of the scanner.
        root: PathBuf,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),
}
