//! Custom test assertions for blob output and scratch space

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Every file under the blob root, as `/`-separated paths relative to it, sorted
pub fn blob_objects(root: &Path) -> Vec<String> {
    if !root.exists() {
        return Vec::new();
    }
    let mut objects: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect();
    objects.sort();
    objects
}

/// Files left anywhere under `dir`
pub fn residual_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        return Vec::new();
    }
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect()
}

/// Assert the work directory holds no leftover temporary files
pub fn assert_no_temp_files(work_dir: &Path) {
    let leftovers = residual_files(work_dir);
    assert!(
        leftovers.is_empty(),
        "temporary files left behind: {leftovers:?}"
    );
}
