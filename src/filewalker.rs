use crate::error::ProjectError;
use anyhow::Result;
use ignore::{DirEntry, WalkBuilder};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Extension a file needs to be read as a fragment.
pub const FRAGMENT_EXTENSION: &str = "md";

/// Lists the chapter directories directly under the manuscript root,
/// sorted by name.
pub fn collect_chapter_dirs(manuscript_root: &Path) -> Result<Vec<PathBuf>> {
    if !manuscript_root.is_dir() {
        return Err(ProjectError::not_found(manuscript_root).into());
    }
    collect_children(manuscript_root, is_dir)
}

/// Lists the `.md` files directly inside a chapter directory, sorted by
/// name. Nested directories and other files (chapter notes) are skipped.
pub fn collect_fragment_files(chapter_dir: &Path) -> Result<Vec<PathBuf>> {
    collect_children(chapter_dir, |e| is_file(e) && is_fragment(e.path()))
}

/// Counts immediate subdirectories, hidden ones included.
pub async fn count_subdirs(dir: &Path) -> Result<usize> {
    let listing_error = |e| ProjectError::io(format!("listing {}", dir.display()), e);

    let mut entries = fs::read_dir(dir).await.map_err(listing_error)?;
    let mut count = 0;
    while let Some(entry) = entries.next_entry().await.map_err(listing_error)? {
        if fs::metadata(entry.path()).await.is_ok_and(|m| m.is_dir()) {
            count += 1;
        }
    }
    Ok(count)
}

/// Walk errors, dangling links included, fail the whole listing.
fn collect_children(dir: &Path, keep: impl Fn(&DirEntry) -> bool) -> Result<Vec<PathBuf>> {
    let mut builder = WalkBuilder::new(dir);

    // No ignore-file semantics: every non-hidden entry of a chapter counts.
    builder
        .standard_filters(false)
        .follow_links(true)
        .max_depth(Some(1))
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(|e| !is_hidden(e));

    let mut paths = Vec::new();
    for result in builder.build() {
        let entry = result.map_err(|err| {
            ProjectError::io(format!("listing {}", dir.display()), io::Error::other(err))
        })?;
        if entry.depth() == 1 && keep(&entry) {
            paths.push(entry.into_path());
        }
    }
    Ok(paths)
}

fn is_fragment(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == FRAGMENT_EXTENSION)
}

fn is_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_some_and(|t| t.is_dir())
}

fn is_file(entry: &DirEntry) -> bool {
    entry.file_type().is_some_and(|t| t.is_file())
}

/// Determines if a file/folder is hidden (starts with a dot)
fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .path()
            .file_name()
            .and_then(|s| s.to_str())
            .is_some_and(|s| s.starts_with('.'))
}
