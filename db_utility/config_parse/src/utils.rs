use std::env;
use std::path::{Path, PathBuf};
use log::debug;
use walkdir::{DirEntry, WalkDir};

/// Find a file below the current working directory.
pub fn find_file(file_name: &str) -> Result<PathBuf, String> {
    // Get the absolute path of the current running directory
    let current_dir = env::current_dir()
        .map_err(|e| format!("Failed to get current directory: {}", e))?;
    find_file_in(&current_dir, file_name)
}

/// Find a file below `root`.
///
/// `root/file_name` is preferred, otherwise the tree is walked recursively,
/// skipping hidden directories and cargo `target` directories.
pub fn find_file_in(root: &Path, file_name: &str) -> Result<PathBuf, String> {
    let root = root.canonicalize()
        .map_err(|e| format!("Failed to canonicalize path {}: {}", root.display(), e))?;

    let direct = root.join(file_name);
    if direct.is_file() {
        debug!("found {} at {}", file_name, direct.display());
        return Ok(direct);
    }

    let walker = WalkDir::new(&root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry));
    for entry in walker.filter_map(|e| e.ok()) {
        let path = entry.path();
        if entry.file_type().is_file() && path.file_name() == Some(Path::new(file_name).as_os_str()) {
            debug!("found {} at {}", file_name, path.display());
            return path.canonicalize()
                .map_err(|e| format!("Failed to canonicalize file path: {}", e));
        }
    }

    Err(format!("File '{}' not found in {}", file_name, root.display()))
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || name == "target"
}
