//! Rule-based transitive dependency discovery.
//!
//! Given a starting file, `depends` selects the [`Rule`] governing it,
//! extracts raw references from its content, resolves each reference against
//! an ordered search-path list, and repeats across every discovered file to
//! produce a deduplicated, cycle-safe dependency closure.
//!
//! ```no_run
//! depends::setup(["include"]);
//!
//! let mut scanner = depends::scanner("src/main.c");
//! scanner.add_paths(["vendor/include"])?;
//! for dep in &mut scanner {
//!     println!("{}", dep.path.display());
//! }
//! # Ok::<(), depends::Error>(())
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod rule;
pub mod scanner;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

pub use crate::config::Config;
pub use crate::error::Error;
pub use crate::registry::RuleRegistry;
pub use crate::resolver::{SearchPaths, resolve};
pub use crate::rule::{NameMatch, PatternRule, Rule, RuleSpec, default_rule};
pub use crate::scanner::{ScanResult, ScanState, Scanner};
pub use crate::types::{Notice, Reference, ResolvedDependency};

/// Append directories to the process-wide search paths.
pub fn setup<I, P>(paths: I)
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    config::update_global(|config| config.add_paths(paths));
}

/// Register a rule process-wide. Returns whether it was added.
pub fn add_rule(rule: Arc<dyn Rule>) -> bool {
    let mut added = false;
    config::update_global(|config| added = config.add_rule(rule));
    return added;
}

/// Snapshot of the process-wide configuration.
pub fn global_config() -> Config {
    return config::global();
}

/// Clear the process-wide configuration.
pub fn reset_global() {
    config::update_global(|config| *config = Config::default());
}

/// Create a scanner for `path` seeded with a snapshot of the process-wide
/// configuration. Later global changes do not affect it.
pub fn scanner<P: Into<PathBuf>>(path: P) -> Scanner {
    return Scanner::new(path, config::global());
}
