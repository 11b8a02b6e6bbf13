//! Locating the root directory and the rule-list files beneath it.

use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::error::LintError;

/// Pick the root directory when none was given.
///
/// Walks up from the executable's directory, then from the current
/// directory, and returns the first ancestor that contains `config_path`.
/// Falls back to the current directory.
pub fn discover_root(config_path: &Path) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut starts = Vec::new();
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        starts.push(exe_dir);
    }
    starts.push(cwd.clone());

    find_root(&starts, config_path).unwrap_or(cwd)
}

/// First ancestor of any start directory (in order) containing `config_path`
pub fn find_root(starts: &[PathBuf], config_path: &Path) -> Option<PathBuf> {
    starts.iter().find_map(|start| {
        start
            .ancestors()
            .find(|dir| dir.join(config_path).is_file())
            .map(Path::to_path_buf)
    })
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || name == "target"
}

/// All files with the given extension under `root`, sorted by path.
///
/// Hidden directories and `target/` are not descended into. Any directory
/// that cannot be read aborts the scan.
pub fn list_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>, LintError> {
    if !root.is_dir() {
        return Err(LintError::RootNotFound(root.to_path_buf()));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e));

    for entry in walker {
        let entry = entry.map_err(|e| LintError::UnreadableRoot {
            path: e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf()),
            source: e.into(),
        })?;

        let matches = entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == extension);
        if matches {
            files.push(entry.into_path());
        }
    }

    files.sort();
    debug!("Found {} .{} file(s) under {}", files.len(), extension, root.display());
    Ok(files)
}

/// Path relative to `root`, with `/` separators, for messages
pub fn display_name(root: &Path, path: &Path) -> String {
    let Ok(relative) = path.strip_prefix(root) else {
        return path.display().to_string();
    };
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
