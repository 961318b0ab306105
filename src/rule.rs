//! Dependency rules: which files a rule governs and how references are
//! pulled out of them.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use serde::Deserialize;

use crate::error::Error;

/// Maximum file size read for content extraction (16 MiB).
pub const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Name of the built-in rule used when no rules are configured.
pub const DEFAULT_RULE_NAME: &str = "c";

/// Custom extraction routine: `(path, name match) -> references`.
pub type Extractor = dyn Fn(&Path, &NameMatch) -> Vec<String> + Send + Sync;

/// Owned result of a successful file-name match.
///
/// Group 0 is the whole match; later groups are the pattern's captures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameMatch {
    /// Captured groups, `None` where a group did not participate.
    groups: Vec<Option<String>>,
    /// Index of the pattern that matched, extension patterns first.
    pattern_index: usize,
}

impl NameMatch {
    /// The full matched text.
    pub fn as_str(&self) -> &str {
        return self.get(0).unwrap_or_default();
    }

    /// Capture group `index`, if it participated in the match.
    pub fn get(&self, index: usize) -> Option<&str> {
        return self.groups.get(index).and_then(|g| return g.as_deref());
    }

    /// Index of the pattern that matched (extension-derived patterns come first).
    pub const fn pattern_index(&self) -> usize {
        return self.pattern_index;
    }
}

/// A policy describing which files it governs and how to extract references.
///
/// Implementations must be immutable once registered; the registry shares
/// them between scanners behind `Arc`.
pub trait Rule: fmt::Debug + Send + Sync {
    /// Extract raw references from a file this rule matched.
    ///
    /// Order is preserved and duplicates are allowed; deduplication happens
    /// after resolution.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io`, `Error::FileTooLarge` or `Error::NotText` when the
    /// file content cannot be read as text.
    fn extract(&self, path: &Path, name_match: &NameMatch) -> Result<Vec<String>, Error>;

    /// Test the file's base name against this rule's name predicates.
    fn matches(&self, path: &Path) -> Option<NameMatch>;

    /// Identifier used for registry deduplication and reporting.
    fn name(&self) -> &str;

    /// Pattern sources for display, name predicates first.
    fn patterns(&self) -> Vec<String> {
        return Vec::new();
    }
}

/// Declarative rule description, as written in `.depends.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    /// Extensions without the leading dot, e.g. `["c", "h"]`.
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Content patterns, each with exactly one capturing group.
    #[serde(default)]
    pub extracts: Vec<String>,
    /// Rule identifier.
    pub name: String,
    /// File-name patterns, anchored at the start of the base name.
    #[serde(default)]
    pub names: Vec<String>,
}

/// The built-in rule variant: regex name predicates plus regex content
/// extraction, optionally overridden by a custom extractor.
pub struct PatternRule {
    /// Custom extraction routine, used instead of `extracts` when present.
    extractor: Option<Arc<Extractor>>,
    /// Compiled content patterns.
    extracts: Vec<Regex>,
    /// Rule identifier.
    name: String,
    /// Compiled name predicates: extension-derived first, then explicit names.
    name_patterns: Vec<Regex>,
}

impl PatternRule {
    /// Compile a rule from its declarative description.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyRule` when `spec` has no names or extensions,
    /// `Error::InvalidPattern` for malformed regexes, and
    /// `Error::CaptureGroups` when an extract pattern does not have exactly one
    /// capturing group.
    pub fn new(spec: &RuleSpec) -> Result<Self, Error> {
        if spec.extensions.is_empty() && spec.names.is_empty() {
            return Err(Error::EmptyRule {
                rule: spec.name.clone(),
            });
        }

        let extension_sources = spec
            .extensions
            .iter()
            .map(|ext| return format!(r"^.+\.{}$", regex::escape(ext.trim_start_matches('.'))));
        let name_sources = spec.names.iter().map(|name| return format!("^(?:{name})"));

        let mut name_patterns = Vec::with_capacity(spec.extensions.len() + spec.names.len());
        for source in extension_sources.chain(name_sources) {
            name_patterns.push(compile_pattern(&spec.name, &source)?);
        }

        let mut extracts = Vec::with_capacity(spec.extracts.len());
        for source in &spec.extracts {
            let pattern = compile_pattern(&spec.name, source)?;
            let groups = pattern.captures_len().saturating_sub(1);
            if groups != 1 {
                return Err(Error::CaptureGroups {
                    groups,
                    pattern: source.clone(),
                    rule: spec.name.clone(),
                });
            }
            extracts.push(pattern);
        }

        return Ok(Self {
            extractor: None,
            extracts,
            name: spec.name.clone(),
            name_patterns,
        });
    }

    /// Attach a custom extraction routine; it replaces pattern extraction.
    #[must_use]
    pub fn with_extractor<F>(mut self, extractor: F) -> Self
    where
        F: Fn(&Path, &NameMatch) -> Vec<String> + Send + Sync + 'static,
    {
        self.extractor = Some(Arc::new(extractor));
        return self;
    }
}

impl fmt::Debug for PatternRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f
            .debug_struct("PatternRule")
            .field("custom_extractor", &self.extractor.is_some())
            .field("extracts", &self.extracts)
            .field("name", &self.name)
            .field("name_patterns", &self.name_patterns)
            .finish();
    }
}

impl Rule for PatternRule {
    fn extract(&self, path: &Path, name_match: &NameMatch) -> Result<Vec<String>, Error> {
        if let Some(extractor) = &self.extractor {
            return Ok(extractor(path, name_match));
        }
        if self.extracts.is_empty() {
            return Ok(Vec::new());
        }

        let content = read_text(path)?;
        return Ok(extract_with_patterns(&content, &self.extracts));
    }

    fn matches(&self, path: &Path) -> Option<NameMatch> {
        let file_name = path.file_name()?.to_string_lossy();

        for (pattern_index, pattern) in self.name_patterns.iter().enumerate() {
            let Some(caps) = pattern.captures(&file_name) else {
                continue;
            };
            let groups = caps
                .iter()
                .map(|g| return g.map(|m| return m.as_str().to_string()))
                .collect();
            return Some(NameMatch { groups, pattern_index });
        }
        return None;
    }

    fn name(&self) -> &str {
        return &self.name;
    }

    fn patterns(&self) -> Vec<String> {
        return self
            .name_patterns
            .iter()
            .chain(&self.extracts)
            .map(|p| return p.as_str().to_string())
            .collect();
    }
}

/// The built-in rule for C-style `#include "file"` sources (`.c`, `.h`).
///
/// # Panics
///
/// Panics if the hardcoded patterns are invalid (compile-time invariant).
#[allow(clippy::expect_used, reason = "hardcoded patterns are known to compile")]
pub fn default_rule() -> Arc<dyn Rule> {
    let spec = RuleSpec {
        extensions: vec!["c".to_string(), "h".to_string()],
        extracts: vec![r#"#include\s*"([^"]+)""#.to_string()],
        name: DEFAULT_RULE_NAME.to_string(),
        names: Vec::new(),
    };
    return Arc::new(PatternRule::new(&spec).expect("valid default rule"));
}

/// Compile one pattern, attributing failures to the owning rule.
///
/// # Errors
///
/// Returns `Error::InvalidPattern` if the source is not a valid regex.
fn compile_pattern(rule: &str, source: &str) -> Result<Regex, Error> {
    return Regex::new(source).map_err(|err| {
        return Error::InvalidPattern {
            pattern: source.to_string(),
            rule: rule.to_string(),
            source: err,
        };
    });
}

/// Apply every pattern in declaration order, collecting group 1 of each match.
fn extract_with_patterns(content: &str, patterns: &[Regex]) -> Vec<String> {
    let mut references = Vec::new();
    for pattern in patterns {
        for caps in pattern.captures_iter(content) {
            if let Some(group) = caps.get(1) {
                references.push(group.as_str().to_string());
            }
        }
    }
    return references;
}

/// Read a file as UTF-8 text, refusing oversized files.
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be read, `Error::FileTooLarge` above
/// [`MAX_FILE_SIZE`], or `Error::NotText` if the content is not UTF-8.
pub fn read_text(path: &Path) -> Result<String, Error> {
    let size_bytes = std::fs::metadata(path)?.len();
    if size_bytes > MAX_FILE_SIZE {
        return Err(Error::FileTooLarge {
            file: path.to_path_buf(),
            max_bytes: MAX_FILE_SIZE,
            size_bytes,
        });
    }

    let bytes = std::fs::read(path)?;
    return String::from_utf8(bytes).map_err(|_err| {
        return Error::NotText {
            file: path.to_path_buf(),
        };
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(extensions: &[&str], names: &[&str], extracts: &[&str]) -> PatternRule {
        let spec = RuleSpec {
            extensions: extensions.iter().map(ToString::to_string).collect(),
            extracts: extracts.iter().map(ToString::to_string).collect(),
            name: "test".to_string(),
            names: names.iter().map(ToString::to_string).collect(),
        };
        PatternRule::new(&spec).unwrap()
    }

    #[test]
    fn extension_must_end_the_name() {
        let r = rule(&["c"], &[], &[]);
        assert!(r.matches(Path::new("src/main.c")).is_some());
        assert!(r.matches(Path::new("main.cpp")).is_none());
        assert!(r.matches(Path::new("main.c.bak")).is_none());
        assert!(r.matches(Path::new(".c")).is_none());
    }

    #[test]
    fn name_patterns_match_base_name_from_start() {
        let r = rule(&[], &[r"special_(\S+)\.ext$"], &[]);
        let m = r.matches(Path::new("dir/special_one.ext")).unwrap();
        assert_eq!(m.as_str(), "special_one.ext");
        assert_eq!(m.get(1), Some("one"));
        assert!(r.matches(Path::new("not_special_one.ext")).is_none());
    }

    #[test]
    fn extension_patterns_are_tried_before_names() {
        let r = rule(&["ext"], &[r"special_\S+\.ext$"], &[]);
        let m = r.matches(Path::new("special_x.ext")).unwrap();
        assert_eq!(m.pattern_index(), 0);
    }

    #[test]
    fn empty_rule_is_rejected() {
        let spec = RuleSpec {
            name: "empty".to_string(),
            ..RuleSpec::default()
        };
        assert!(matches!(PatternRule::new(&spec), Err(Error::EmptyRule { .. })));
    }

    #[test]
    fn malformed_pattern_fails_at_construction() {
        let spec = RuleSpec {
            extensions: vec!["c".to_string()],
            extracts: vec!["(unclosed".to_string()],
            name: "broken".to_string(),
            names: Vec::new(),
        };
        let err = PatternRule::new(&spec).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { ref rule, .. } if rule == "broken"));
    }

    #[test]
    fn extract_pattern_needs_one_group() {
        let spec = RuleSpec {
            extensions: vec!["c".to_string()],
            extracts: vec![r"(a)(b)".to_string()],
            name: "groups".to_string(),
            names: Vec::new(),
        };
        let err = PatternRule::new(&spec).unwrap_err();
        assert!(matches!(err, Error::CaptureGroups { groups: 2, .. }));
    }

    #[test]
    fn extracts_every_occurrence_in_pattern_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.ext");
        std::fs::write(
            &path,
            "!import \"thing.ext2\"\nuse other\n!import \"thing.ext2\"\n",
        )
        .unwrap();

        let r = rule(&["ext"], &[], &[r#"!import\s+"([^"]+)""#, r"use (\w+)"]);
        let m = r.matches(&path).unwrap();
        let refs = r.extract(&path, &m).unwrap();
        assert_eq!(refs, vec!["thing.ext2", "thing.ext2", "other"]);
    }

    #[test]
    fn custom_extractor_replaces_patterns() {
        let r = rule(&[], &[r"gen_(\w+)\.in$"], &[r"(never)"])
            .with_extractor(|_path, m| return vec![format!("{}.h", m.get(1).unwrap_or_default())]);
        let path = Path::new("gen_tables.in");
        let m = r.matches(path).unwrap();
        // The custom extractor never touches the (nonexistent) file.
        assert_eq!(r.extract(path, &m).unwrap(), vec!["tables.h"]);
    }

    #[test]
    fn binary_content_is_not_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.c");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x23]).unwrap();

        let r = default_rule();
        let m = r.matches(&path).unwrap();
        assert!(matches!(r.extract(&path, &m), Err(Error::NotText { .. })));
    }

    #[test]
    fn default_rule_reads_quoted_includes_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.c");
        std::fs::write(&path, "#include <stdio.h>\n#include \"util.h\"\n#include\"b.h\"\n").unwrap();

        let r = default_rule();
        let m = r.matches(&path).unwrap();
        assert_eq!(r.extract(&path, &m).unwrap(), vec!["util.h", "b.h"]);
    }
}
