//! Markdown rendering of errors and scan notices for terminal output.

use std::fmt::Write as _;
use std::path::Path;

use crate::config::CONFIG_FILE_NAME;
use crate::error::Error;
use crate::types::Notice;

/// ANSI bold.
const BOLD: &str = "\x1b[1m";
/// ANSI reset.
const RESET: &str = "\x1b[0m";

/// Render an error as markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    print_markdown(&render_error(e));
}

/// Render notices as a markdown warning block and print to stderr.
pub fn print_notices(root: &Path, notices: &[Notice]) {
    if notices.is_empty() {
        return;
    }
    print_markdown(&render_notices(root, notices));
}

/// Write markdown to stderr, bolding heading lines.
fn print_markdown(md: &str) {
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is one,
/// how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::CaptureGroups { groups, pattern, rule } => render_capture_groups(rule, pattern, *groups),
        Error::ConfigNotFound { path } => format!(
            "\
# Error: Config Not Found

`{}` does not exist.
",
            path.display()
        ),
        Error::EmptyRule { rule } => format!(
            "\
# Error: Empty Rule

Rule `{rule}` has no `names` or `extensions`, so it could never match a file.

## Fix

Add at least one extension or name pattern to the rule in `{CONFIG_FILE_NAME}`.
"
        ),
        Error::FileTooLarge { file, size_bytes, max_bytes } => format!(
            "\
# Error: File Too Large

`{}` is {size_bytes} bytes (max {max_bytes}).
",
            file.display()
        ),
        Error::InvalidPattern { pattern, rule, source } => format!(
            "\
# Error: Invalid Pattern

Rule `{rule}` has a pattern that is not a valid regular expression:

    {pattern}

{source}
"
        ),
        Error::Io(err) => format!(
            "\
# Error: I/O

{err}
"
        ),
        Error::NotText { file } => format!(
            "\
# Error: Not a Text File

`{}` is not valid UTF-8.
",
            file.display()
        ),
        Error::ScanStarted { root } => format!(
            "\
# Error: Scan Already Started

The scanner for `{}` was configured after its results were requested.

## Fix

Add paths and rules before iterating the scanner.
",
            root.display()
        ),
        Error::TomlDe(err) => format!(
            "\
# Error: Invalid TOML

{err}
"
        ),
    };
}

/// Explain an extract pattern with the wrong number of capture groups.
fn render_capture_groups(rule: &str, pattern: &str, groups: usize) -> String {
    return format!(
        "\
# Error: Wrong Capture Group Count

Rule `{rule}` has an extract pattern with {groups} capture groups:

    {pattern}

Each extract pattern must capture exactly one group: the referenced file name.

## Fix

Turn extra groups into non-capturing ones with `(?:...)`.
"
    );
}

/// Render scan notices grouped by kind.
pub fn render_notices(root: &Path, notices: &[Notice]) -> String {
    let mut out = format!("# Warning: Incomplete Dependencies for `{}`\n", root.display());

    let unresolved: Vec<&Notice> = notices
        .iter()
        .filter(|n| return matches!(n, Notice::Unresolved { .. }))
        .collect();
    if !unresolved.is_empty() {
        out.push_str("\n## Unresolved references\n\n");
        for notice in unresolved {
            if let Notice::Unresolved { reference, referrer } = notice {
                let _ = writeln!(out, "- `{reference}` in {}", referrer.display());
            }
        }
    }

    let unreadable: Vec<&Notice> = notices
        .iter()
        .filter(|n| return matches!(n, Notice::Unreadable { .. }))
        .collect();
    if !unreadable.is_empty() {
        out.push_str("\n## Unreadable files\n\n");
        for notice in unreadable {
            if let Notice::Unreadable { path, reason } = notice {
                let _ = writeln!(out, "- {} ({reason})", path.display());
            }
        }
    }

    return out;
}
