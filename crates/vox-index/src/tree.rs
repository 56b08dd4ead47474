//! Indented file-tree rendering with the scanner's directory filters.

use std::fmt::Write;
use std::path::Path;

use crate::error::{Result, ScanError};
use crate::scanner::{ScannerConfig, project_walker};

/// Default cap on rendered entries.
pub const DEFAULT_MAX_ENTRIES: usize = 2000;

/// Render the tree under `root`, two spaces per level, directories suffixed with `/`.
///
/// Output stops after `max_entries` lines with a count of what was left out.
///
/// # Errors
///
/// Returns [`ScanError::NotADirectory`] if `root` is not a directory.
pub fn render_tree(root: &Path, config: &ScannerConfig, max_entries: usize) -> Result<String> {
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let root_name = root
        .file_name()
        .map_or_else(|| root.display().to_string(), |n| n.to_string_lossy().into_owned());
    let mut out = format!("{root_name}/\n");
    let mut shown = 0usize;
    let mut omitted = 0usize;

    for entry in project_walker(root, config).flatten() {
        if entry.depth() == 0 {
            continue;
        }
        if shown >= max_entries {
            omitted += 1;
            continue;
        }
        let indent = "  ".repeat(entry.depth());
        let name = entry.file_name().to_string_lossy();
        let slash = if entry.file_type().is_some_and(|ft| ft.is_dir()) {
            "/"
        } else {
            ""
        };
        let _ = writeln!(out, "{indent}{name}{slash}");
        shown += 1;
    }

    if omitted > 0 {
        let _ = writeln!(out, "... ({omitted} more entries)");
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        fs::create_dir_all(dir.path().join("node_modules/pkg")).unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join("src/nested/lib.py"), "").unwrap();
        fs::write(dir.path().join("src/main.py"), "").unwrap();
        fs::write(dir.path().join("README.md"), "").unwrap();
        fs::write(dir.path().join("node_modules/pkg/index.js"), "").unwrap();
        dir
    }

    #[test]
    fn renders_sorted_indented_tree() {
        let dir = fixture();
        let tree = render_tree(dir.path(), &ScannerConfig::default(), 100).unwrap();
        let lines: Vec<&str> = tree.lines().skip(1).collect();
        assert_eq!(
            lines,
            [
                "  README.md",
                "  src/",
                "    main.py",
                "    nested/",
                "      lib.py",
            ]
        );
        assert!(tree.lines().next().unwrap().ends_with('/'));
    }

    #[test]
    fn ignored_directories_are_absent() {
        let dir = fixture();
        let tree = render_tree(dir.path(), &ScannerConfig::default(), 100).unwrap();
        assert!(!tree.contains("node_modules"));
        assert!(!tree.contains(".git"));
    }

    #[test]
    fn entry_cap_reports_remainder() {
        let dir = fixture();
        let tree = render_tree(dir.path(), &ScannerConfig::default(), 2).unwrap();
        assert_eq!(tree.lines().count(), 4);
        assert!(tree.ends_with("... (3 more entries)\n"));
    }

    #[test]
    fn file_root_is_rejected() {
        let dir = fixture();
        assert!(render_tree(&dir.path().join("README.md"), &ScannerConfig::default(), 10).is_err());
    }
}
