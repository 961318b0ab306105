//! Reference resolution against an ordered search-path list.

use std::path::{Component, Path, PathBuf};

use tracing::trace;

/// Ordered, duplicate-free list of directories consulted when resolving.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPaths {
    /// Directories in priority order.
    dirs: Vec<PathBuf>,
}

impl SearchPaths {
    /// Build a list from directories, dropping later duplicates.
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut paths = Self::default();
        paths.extend(dirs);
        return paths;
    }

    /// Directories in priority order.
    pub fn as_slice(&self) -> &[PathBuf] {
        return &self.dirs;
    }

    /// Append each directory not already present. Existing order is kept.
    pub fn extend<I, P>(&mut self, dirs: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        for dir in dirs {
            self.push(dir);
        }
    }

    /// Whether the list contains no directories.
    pub const fn is_empty(&self) -> bool {
        return self.dirs.is_empty();
    }

    /// Append a directory if not already present. Returns whether it was added.
    ///
    /// Entries are stored lexically normalized, so `./include` and `include`
    /// are the same directory.
    pub fn push<P: Into<PathBuf>>(&mut self, dir: P) -> bool {
        let dir = normalize_path(&dir.into());
        if self.dirs.contains(&dir) {
            return false;
        }
        self.dirs.push(dir);
        return true;
    }

    /// Resolve a reference against this list. See [`resolve`].
    pub fn resolve(&self, reference: &str) -> Option<PathBuf> {
        return resolve(reference, &self.dirs);
    }

    /// Copy of this list with `dir` moved (or inserted) at the front.
    #[must_use]
    pub fn with_front(&self, dir: &Path) -> Self {
        let dir = normalize_path(dir);
        let mut dirs = Vec::with_capacity(self.dirs.len() + 1);
        dirs.extend(self.dirs.iter().filter(|d| return **d != dir).cloned());
        dirs.insert(0, dir);
        return Self { dirs };
    }
}

/// Resolve a raw reference to the concrete path of an existing regular file.
///
/// Absolute references are tested directly. Otherwise each directory is
/// tried in order and the first `dir/reference` that is a regular file wins.
/// Returns `None` when nothing matches; that is not an error, references to
/// system headers outside the project are expected to miss.
pub fn resolve(reference: &str, search_paths: &[PathBuf]) -> Option<PathBuf> {
    if reference.is_empty() {
        return None;
    }

    let reference_path = Path::new(reference);
    if reference_path.is_absolute() {
        return reference_path.is_file().then(|| return concrete_path(reference_path));
    }

    for dir in search_paths {
        let candidate = dir.join(reference_path);
        trace!(candidate = %candidate.display(), "probing");
        if candidate.is_file() {
            return Some(concrete_path(&candidate));
        }
    }
    return None;
}

/// Absolute, lexically normalized form of a path, used as dependency identity.
///
/// Does not follow symlinks, so two links to one file stay distinct.
pub fn concrete_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_err| return path.to_path_buf());
    return normalize_path(&absolute);
}

/// Directory containing `path`; empty for a bare file name.
pub fn parent_dir(path: &Path) -> PathBuf {
    return path.parent().map(Path::to_path_buf).unwrap_or_default();
}

/// Collapse `.` and `..` components in a path without touching the filesystem.
/// Preserves leading `..` when there is nothing left to pop.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        push_normalized_component(&mut components, component);
    }
    return components.iter().collect();
}

/// Handle a single path component during normalization.
/// Pops the last component for `..` when possible, preserves it otherwise.
fn push_normalized_component<'a>(components: &mut Vec<Component<'a>>, component: Component<'a>) {
    match component {
        Component::CurDir => {},
        Component::ParentDir => {
            match components.last() {
                Some(Component::RootDir | Component::Prefix(_)) => {},
                Some(Component::Normal(_)) => {
                    components.pop();
                },
                _ => components.push(component),
            }
        },
        other => components.push(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_dots() {
        assert_eq!(normalize_path(Path::new("a/./b/../c.h")), PathBuf::from("a/c.h"));
        assert_eq!(normalize_path(Path::new("../x/../y")), PathBuf::from("../y"));
        assert_eq!(normalize_path(Path::new("/../etc")), PathBuf::from("/etc"));
    }

    #[test]
    fn first_directory_wins() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        std::fs::create_dir_all(&first).unwrap();
        std::fs::create_dir_all(&second).unwrap();
        std::fs::write(first.join("util.h"), "").unwrap();
        std::fs::write(second.join("util.h"), "").unwrap();

        let paths = vec![second.clone(), first.clone()];
        assert_eq!(resolve("util.h", &paths), Some(concrete_path(&second.join("util.h"))));
        // Idempotent.
        assert_eq!(resolve("util.h", &paths), resolve("util.h", &paths));
    }

    #[test]
    fn directories_do_not_satisfy_references() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sub.h")).unwrap();
        assert_eq!(resolve("sub.h", &[dir.path().to_path_buf()]), None);
    }

    #[test]
    fn absolute_reference_skips_search_paths() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("abs.h");
        std::fs::write(&file, "").unwrap();

        let reference = file.to_string_lossy().to_string();
        assert_eq!(resolve(&reference, &[]), Some(concrete_path(&file)));
        assert_eq!(resolve("", &[dir.path().to_path_buf()]), None);
    }

    #[test]
    fn different_spellings_share_a_concrete_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("inc")).unwrap();
        std::fs::write(dir.path().join("util.h"), "").unwrap();

        let paths = vec![dir.path().to_path_buf()];
        assert_eq!(resolve("inc/../util.h", &paths), resolve("./util.h", &paths));
    }

    #[test]
    fn search_paths_append_unique() {
        let mut paths = SearchPaths::new(["a", "b", "a"]);
        assert!(!paths.push("b"));
        assert!(paths.push("c"));
        assert_eq!(paths.as_slice(), [PathBuf::from("a"), PathBuf::from("b"), PathBuf::from("c")]);

        let fronted = paths.with_front(Path::new("b"));
        assert_eq!(fronted.as_slice(), [PathBuf::from("b"), PathBuf::from("a"), PathBuf::from("c")]);
    }

    #[test]
    fn search_paths_treat_spellings_of_one_directory_as_equal() {
        let mut paths = SearchPaths::new(["./include"]);
        assert!(!paths.push("include"));
        assert!(!paths.push("include/../include/."));
        assert!(paths.push("lib"));
        assert_eq!(paths.as_slice(), [PathBuf::from("include"), PathBuf::from("lib")]);

        let fronted = paths.with_front(Path::new("./lib"));
        assert_eq!(fronted.as_slice(), [PathBuf::from("lib"), PathBuf::from("include")]);
    }
}
