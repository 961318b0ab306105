use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use crate::error::Error;
use crate::registry::RuleRegistry;
use crate::resolver::SearchPaths;
use crate::rule::{PatternRule, Rule, RuleSpec};

/// File name of the per-project configuration.
pub const CONFIG_FILE_NAME: &str = ".depends.toml";

/// Process-wide default configuration, copied into each scanner on creation.
static GLOBAL: LazyLock<RwLock<Config>> = LazyLock::new(|| return RwLock::new(Config::default()));

/// Search paths and rules consumed by scanners.
///
/// Both lists are append-only: adding entries never replaces or reorders
/// existing ones, and duplicates (same directory, same rule name) are
/// dropped. Cloning yields an independent snapshot.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Directories searched when resolving references.
    paths: SearchPaths,
    /// Rules in priority order.
    rules: RuleRegistry,
}

/// Raw TOML structure for `.depends.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct DependsTomlConfig {
    /// Search directories, relative to the config file's directory.
    #[serde(default)]
    paths: Vec<PathBuf>,
    /// Declarative rule definitions.
    #[serde(default)]
    rules: Vec<RuleSpec>,
}

impl Config {
    /// Append search directories not already present.
    pub fn add_paths<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.paths.extend(paths);
    }

    /// Append a rule unless one with the same name exists. Returns whether it was added.
    pub fn add_rule(&mut self, rule: Arc<dyn Rule>) -> bool {
        return self.rules.add(rule);
    }

    /// Load `.depends.toml` from the given root directory.
    /// Returns an empty config if the file doesn't exist.
    /// Returns an error if the file exists but is malformed; a config file the
    /// user wrote is never silently ignored.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// `Error::TomlDe` if the TOML is malformed, or a rule construction error.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE_NAME);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
        };
        return Self::parse(&content, root);
    }

    /// Load an explicitly named config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigNotFound` if the file doesn't exist, otherwise the
    /// same errors as [`Config::load`].
    pub fn load_file(path: &Path) -> Result<Self, Error> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ConfigNotFound { path: path.to_path_buf() });
            },
            Err(e) => return Err(Error::Io(e)),
        };
        let base = path.parent().unwrap_or_else(|| return Path::new(""));
        return Self::parse(&content, base);
    }

    /// Append every path and rule of `other` not already present.
    pub fn merge(&mut self, other: &Self) {
        self.paths.extend(other.paths.as_slice().iter().cloned());
        self.rules.merge(&other.rules);
    }

    /// Parse TOML config content. Relative paths are joined onto `base`.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` for malformed TOML or unknown keys, and
    /// `Error::EmptyRule`, `Error::InvalidPattern` or `Error::CaptureGroups`
    /// for a bad rule definition.
    pub fn parse(content: &str, base: &Path) -> Result<Self, Error> {
        let raw: DependsTomlConfig = toml::from_str(content)?;

        let mut config = Self::default();
        config.add_paths(raw.paths.iter().map(|p| return base.join(p)));
        for spec in &raw.rules {
            config.add_rule(Arc::new(PatternRule::new(spec)?));
        }
        return Ok(config);
    }

    /// Search directories in priority order.
    pub const fn paths(&self) -> &SearchPaths {
        return &self.paths;
    }

    /// Rules in priority order.
    pub const fn rules(&self) -> &RuleRegistry {
        return &self.rules;
    }
}

/// Snapshot of the process-wide configuration.
pub fn global() -> Config {
    return GLOBAL.read().unwrap_or_else(PoisonError::into_inner).clone();
}

/// Mutate the process-wide configuration.
///
/// Intended for program start-up; scanners created earlier keep their snapshot.
pub fn update_global<F: FnOnce(&mut Config)>(update: F) {
    let mut config = GLOBAL.write().unwrap_or_else(PoisonError::into_inner);
    update(&mut config);
}
