use std::path::{Path, PathBuf};
use std::process::ExitCode;

use serde::Serialize;
use tracing::{debug, info};
use walkdir::WalkDir;

use depends::diagnostics;
use depends::{Config, Error, RuleRegistry, ScanResult, Scanner, default_rule};

/// Options shared by the scanning commands.
pub struct ScanOptions {
    /// Explicit config file; `.depends.toml` in the working directory otherwise.
    pub config: Option<PathBuf>,
    /// Extra search directories appended after configured ones.
    pub include: Vec<PathBuf>,
    /// Emit JSON instead of plain text.
    pub json: bool,
    /// Exit with status 1 when any notice was recorded.
    pub strict: bool,
}

/// A scanned file and its dependency paths, for `tree` output.
#[derive(Serialize)]
struct TreeEntry<'a> {
    /// Concrete dependency paths in discovery order.
    dependencies: Vec<&'a Path>,
    /// Concrete path of the scanned file.
    file: &'a Path,
}

// ── CLI commands ──────────────────────────────────────────────────────

/// Scan each file and print its dependency closure.
///
/// # Errors
///
/// Returns configuration loading errors or JSON serialization failures.
pub fn cmd_scan(files: &[PathBuf], options: &ScanOptions) -> Result<ExitCode, Error> {
    let config = load_config(options)?;
    let results: Vec<ScanResult> = files
        .iter()
        .map(|file| return Scanner::new(file, config.clone()).into_result())
        .collect();

    if options.json {
        println!("{}", to_json(&results)?);
    } else {
        let show_headers = results.len() > 1;
        for result in &results {
            if show_headers {
                println!("{}:", result.root().display());
            }
            for dep in result.dependencies() {
                let indent = if show_headers { "  " } else { "" };
                println!("{indent}{dep}");
            }
        }
    }

    return Ok(report_notices(&results, options.strict));
}

/// Scan every file under `root` that some rule matches.
///
/// # Errors
///
/// Returns configuration loading errors or JSON serialization failures.
pub fn cmd_tree(root: &Path, options: &ScanOptions) -> Result<ExitCode, Error> {
    let config = load_config(options)?;
    let rules = effective_rules(&config);

    let results: Vec<ScanResult> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| return e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
        .filter_map(Result::ok)
        .filter(|e| return e.file_type().is_file())
        .filter(|e| return rules.select(e.path()).is_some())
        .map(|e| return Scanner::new(e.path(), config.clone()).into_result())
        .collect();
    info!(files = results.len(), root = %root.display(), "tree scanned");

    if options.json {
        let entries: Vec<TreeEntry<'_>> = results
            .iter()
            .map(|r| {
                return TreeEntry {
                    dependencies: r.dependencies().iter().map(|d| return d.path.as_path()).collect(),
                    file: r.root(),
                };
            })
            .collect();
        println!("{}", to_json(&entries)?);
    } else {
        for result in &results {
            println!("{}:", result.root().display());
            for dep in result.dependencies() {
                println!("  {dep}");
            }
        }
    }

    return Ok(report_notices(&results, options.strict));
}

/// List the rules a scan would use, in priority order.
///
/// # Errors
///
/// Returns configuration loading errors.
pub fn cmd_rules(config: Option<&Path>) -> Result<(), Error> {
    let config = match config {
        Some(path) => Config::load_file(path)?,
        None => Config::load(Path::new("."))?,
    };
    let rules = effective_rules(&config);

    for rule in rules.iter() {
        println!("{}", rule.name());
        for pattern in rule.patterns() {
            println!("    {pattern}");
        }
    }
    return Ok(());
}

// ── Helpers ───────────────────────────────────────────────────────────

/// Configured rules, or the built-in default when none are configured.
fn effective_rules(config: &Config) -> RuleRegistry {
    let mut rules = config.rules().clone();
    if rules.is_empty() {
        rules.add(default_rule());
    }
    return rules;
}

/// Load the project config and append command-line search paths.
///
/// # Errors
///
/// Returns `Error::ConfigNotFound` for a missing explicit config, or parse errors.
fn load_config(options: &ScanOptions) -> Result<Config, Error> {
    let mut config = match &options.config {
        Some(path) => Config::load_file(path)?,
        None => Config::load(Path::new("."))?,
    };
    config.add_paths(options.include.iter().cloned());
    debug!(
        paths = config.paths().as_slice().len(),
        rules = config.rules().len(),
        "configuration loaded"
    );
    return Ok(config);
}

/// Print notices for every result and pick the exit code.
fn report_notices(results: &[ScanResult], strict: bool) -> ExitCode {
    let mut total = 0usize;
    for result in results {
        diagnostics::print_notices(result.root(), result.notices());
        total = total.saturating_add(result.notices().len());
    }

    if strict && total > 0 {
        eprintln!("{total} notices");
        return ExitCode::from(1);
    }
    return ExitCode::SUCCESS;
}

/// Pretty-print a value as JSON.
///
/// # Errors
///
/// Returns `Error::Io` if serialization fails.
fn to_json<T: Serialize>(value: &T) -> Result<String, Error> {
    return serde_json::to_string_pretty(value).map_err(|e| return Error::Io(e.into()));
}
