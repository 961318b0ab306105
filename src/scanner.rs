//! Recursive, cycle-safe dependency discovery for a single starting file.
//!
//! A [`Scanner`] is created per top-level file with a snapshot of the
//! configuration. The first enumeration runs one full traversal and caches
//! the result; later enumerations replay the cache without touching the
//! filesystem.
//!
//! Result order is pre-order with breadth inside a file: every direct
//! reference of a file is resolved and recorded before any of those files is
//! expanded, and expansion then proceeds depth-first in discovery order.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::config::Config;
use crate::error::Error;
use crate::registry::RuleRegistry;
use crate::resolver::{SearchPaths, concrete_path, parent_dir};
use crate::rule::{NameMatch, Rule, default_rule};
use crate::types::{Notice, Reference, ResolvedDependency};

/// Lifecycle of a scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Configured but not yet enumerated; configuration may still change.
    Created,
    /// Traversal finished; results are cached.
    Done,
    /// Traversal in progress.
    Scanning,
}

/// Everything one traversal discovered.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanResult {
    /// Dependencies in discovery order, one per concrete path.
    dependencies: Vec<ResolvedDependency>,
    /// Unresolved references and unreadable files, in discovery order.
    notices: Vec<Notice>,
    /// Notices already recorded, for constant-time deduplication.
    #[serde(skip)]
    reported: HashSet<Notice>,
    /// Concrete path of the starting file.
    root: PathBuf,
    /// Concrete paths already discovered, the root included.
    #[serde(skip)]
    visited: HashSet<PathBuf>,
}

impl ScanResult {
    /// Start a result whose visited set holds only `root`.
    fn new(root: PathBuf) -> Self {
        let mut visited = HashSet::new();
        visited.insert(root.clone());
        return Self {
            dependencies: Vec::new(),
            notices: Vec::new(),
            reported: HashSet::new(),
            root,
            visited,
        };
    }

    /// Whether `path` (a concrete path) was discovered, or is the root.
    pub fn contains(&self, path: &Path) -> bool {
        return self.visited.contains(path);
    }

    /// Dependencies in discovery order.
    pub fn dependencies(&self) -> &[ResolvedDependency] {
        return &self.dependencies;
    }

    /// Non-fatal notices in discovery order.
    pub fn notices(&self) -> &[Notice] {
        return &self.notices;
    }

    /// Record a notice once; repeats of an identical notice are dropped.
    fn record(&mut self, notice: Notice) {
        if self.reported.insert(notice.clone()) {
            self.notices.push(notice);
        }
    }

    /// Concrete path of the starting file.
    pub fn root(&self) -> &Path {
        return &self.root;
    }
}

/// Per-file orchestrator performing one recursive dependency discovery.
#[derive(Debug)]
pub struct Scanner {
    /// Snapshot of the configuration the scanner was created with.
    inherited: Config,
    /// Scanner-local additions.
    local: Config,
    /// Cached traversal result, populated once `state` is `Done`.
    result: ScanResult,
    /// Starting file as given by the caller.
    root: PathBuf,
    /// Current lifecycle state.
    state: ScanState,
}

impl Scanner {
    /// Append scanner-local search directories.
    ///
    /// # Errors
    ///
    /// Returns `Error::ScanStarted` once enumeration has begun.
    pub fn add_paths<I, P>(&mut self, paths: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.ensure_configurable()?;
        self.local.add_paths(paths);
        return Ok(());
    }

    /// Append a scanner-local rule. Returns whether it was added (rules are
    /// deduplicated by name against inherited and local rules).
    ///
    /// # Errors
    ///
    /// Returns `Error::ScanStarted` once enumeration has begun.
    pub fn add_rule(&mut self, rule: Arc<dyn Rule>) -> Result<bool, Error> {
        self.ensure_configurable()?;
        if self.inherited.rules().contains(rule.name()) {
            return Ok(false);
        }
        return Ok(self.local.add_rule(rule));
    }

    /// Dependencies in discovery order, scanning first if needed.
    pub fn dependencies(&mut self) -> &[ResolvedDependency] {
        return self.scan().dependencies();
    }

    /// Reject configuration changes after enumeration started.
    fn ensure_configurable(&self) -> Result<(), Error> {
        if self.state == ScanState::Created {
            return Ok(());
        }
        return Err(Error::ScanStarted { root: self.root.clone() });
    }

    /// Select a rule for `file`, extract its references, resolve them, and
    /// record what is new. Returns newly discovered files in discovery order.
    fn expand(
        file: &Path,
        rules: &RuleRegistry,
        configured: &SearchPaths,
        result: &mut ScanResult,
    ) -> Vec<PathBuf> {
        let Some((rule, name_match)) = rules.select(file) else {
            trace!(file = %file.display(), "no matching rule");
            return Vec::new();
        };
        debug!(file = %file.display(), rule = rule.name(), "scanning");

        let references = match extract_references(file, rule.as_ref(), &name_match) {
            Ok(references) => references,
            Err(err) => {
                warn!(file = %file.display(), error = %err, "unreadable file");
                result.record(Notice::Unreadable {
                    path: file.to_path_buf(),
                    reason: err.to_string(),
                });
                return Vec::new();
            },
        };

        let search = configured.with_front(&parent_dir(file));
        let mut discovered = Vec::new();
        for reference in references {
            let Some(path) = search.resolve(&reference.text) else {
                debug!(reference = %reference.text, referrer = %file.display(), "unresolved");
                result.record(Notice::Unresolved {
                    reference: reference.text,
                    referrer: reference.referrer,
                });
                continue;
            };
            if !result.visited.insert(path.clone()) {
                trace!(path = %path.display(), "already discovered");
                continue;
            }
            trace!(reference = %reference.text, path = %path.display(), "resolved");
            result.dependencies.push(ResolvedDependency {
                path: path.clone(),
                reference: reference.text,
                referrer: reference.referrer,
            });
            discovered.push(path);
        }
        return discovered;
    }

    /// Consume the scanner, returning its (possibly freshly computed) result.
    pub fn into_result(mut self) -> ScanResult {
        self.scan();
        return self.result;
    }

    /// Iterate dependencies in discovery order, scanning first if needed.
    pub fn iter(&mut self) -> std::slice::Iter<'_, ResolvedDependency> {
        return self.dependencies().iter();
    }

    /// Create a scanner for `path` with a snapshot of `config`.
    pub fn new<P: Into<PathBuf>>(path: P, config: Config) -> Self {
        return Self {
            inherited: config,
            local: Config::default(),
            result: ScanResult::default(),
            root: path.into(),
            state: ScanState::Created,
        };
    }

    /// Notices recorded by the traversal, scanning first if needed.
    pub fn notices(&mut self) -> &[Notice] {
        return self.scan().notices();
    }

    /// Starting file as given by the caller.
    pub fn root(&self) -> &Path {
        return &self.root;
    }

    /// Effective rules: inherited rules followed by scanner-local additions.
    pub fn rules(&self) -> RuleRegistry {
        let mut rules = self.inherited.rules().clone();
        rules.merge(self.local.rules());
        return rules;
    }

    /// Run the traversal on first call; return the cached result afterwards.
    pub fn scan(&mut self) -> &ScanResult {
        if self.state == ScanState::Created {
            self.traverse();
        }
        return &self.result;
    }

    /// Configured search list: the starting file's directory, then local
    /// paths, then inherited paths.
    pub fn search_paths(&self) -> SearchPaths {
        let mut paths = SearchPaths::new([parent_dir(&self.root)]);
        paths.extend(self.local.paths().as_slice().iter().cloned());
        paths.extend(self.inherited.paths().as_slice().iter().cloned());
        return paths;
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> ScanState {
        return self.state;
    }

    /// Full traversal from the root. Each concrete path enters the visited
    /// set at most once, so cycles terminate.
    fn traverse(&mut self) {
        self.state = ScanState::Scanning;

        let mut rules = self.rules();
        if rules.is_empty() {
            debug!("no rules configured, using the default rule");
            rules.add(default_rule());
        }
        let configured = self.search_paths();
        let root = concrete_path(&self.root);
        let mut result = ScanResult::new(root.clone());

        let mut pending = vec![root];
        while let Some(file) = pending.pop() {
            let discovered = Self::expand(&file, &rules, &configured, &mut result);
            pending.extend(discovered.into_iter().rev());
        }

        debug!(
            root = %result.root.display(),
            dependencies = result.dependencies.len(),
            notices = result.notices.len(),
            "scan complete"
        );
        self.result = result;
        self.state = ScanState::Done;
    }
}

impl<'a> IntoIterator for &'a mut Scanner {
    type IntoIter = std::slice::Iter<'a, ResolvedDependency>;
    type Item = &'a ResolvedDependency;

    fn into_iter(self) -> Self::IntoIter {
        return self.iter();
    }
}

/// Run a rule's extraction and tag each reference with its referrer.
///
/// # Errors
///
/// Propagates content read failures from [`Rule::extract`].
fn extract_references(
    file: &Path,
    rule: &dyn Rule,
    name_match: &NameMatch,
) -> Result<Vec<Reference>, Error> {
    let texts = rule.extract(file, name_match)?;
    return Ok(texts
        .into_iter()
        .map(|text| {
            return Reference {
                referrer: file.to_path_buf(),
                text,
            };
        })
        .collect());
}
