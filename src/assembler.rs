//! Manuscript loading and assembly.
//!
//! A manuscript is a directory of chapter directories, each holding fragment
//! files. Chapters sort by directory name and fragments by file name; that
//! order drives both the flat text and the per-chapter grouping.

use crate::config::Replacements;
use crate::error::ProjectError;
use crate::filewalker::{collect_chapter_dirs, collect_fragment_files};
use crate::normalize::normalize;
use anyhow::Result;
use content_inspector::{ContentType, inspect};
use log::debug;
use memmap2::MmapOptions;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::str;

/// Markdown rule placed after every fragment.
pub const SECTION_SEPARATOR: &str = "\n\n----\n\n";

/// Replaces the trailing separator once the last fragment has been added.
const SECTION_END: &str = "\n\n";

/// Text of one source file, as read from disk.
#[derive(Debug, Clone)]
pub struct Fragment {
    /// Base name of the owning chapter directory.
    pub chapter: String,
    pub path: PathBuf,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct Chapter {
    pub name: String,
    pub fragments: Vec<Fragment>,
}

#[derive(Debug, Clone, Default)]
pub struct Manuscript {
    pub chapters: Vec<Chapter>,
}

impl Manuscript {
    /// Reads every fragment under `root`. Any unreadable fragment aborts the
    /// whole load.
    pub fn load(root: &Path) -> Result<Self> {
        let mut chapters = Vec::new();

        for dir in collect_chapter_dirs(root)? {
            let name = base_name(&dir);
            let mut fragments = Vec::new();

            for path in collect_fragment_files(&dir)? {
                let text = read_fragment(&path)?;
                fragments.push(Fragment {
                    chapter: name.clone(),
                    path,
                    text,
                });
            }

            debug!("Chapter {:?}: {} fragment(s)", name, fragments.len());
            chapters.push(Chapter { name, fragments });
        }

        Ok(Self { chapters })
    }

    /// All fragments in chapter order, each followed by a section rule; the
    /// final rule becomes a plain blank line.
    pub fn assemble(&self, replacements: &Replacements) -> String {
        join_fragments(
            self.chapters.iter().flat_map(|c| c.fragments.iter()),
            replacements,
        )
    }

    /// One assembled text per chapter, keyed and ordered by chapter name.
    /// Empty chapters are present with an empty text.
    pub fn assemble_by_chapter(&self, replacements: &Replacements) -> BTreeMap<String, String> {
        self.chapters
            .iter()
            .map(|c| (c.name.clone(), c.assemble(replacements)))
            .collect()
    }

    pub fn fragment_count(&self) -> usize {
        self.chapters.iter().map(|c| c.fragments.len()).sum()
    }
}

impl Chapter {
    pub fn assemble(&self, replacements: &Replacements) -> String {
        join_fragments(self.fragments.iter(), replacements)
    }
}

/// Loads and assembles the manuscript under `root` into one text.
pub fn assemble(root: &Path, replacements: &Replacements) -> Result<String> {
    Ok(Manuscript::load(root)?.assemble(replacements))
}

/// Loads the manuscript under `root` and assembles each chapter separately.
pub fn assemble_by_chapter(
    root: &Path,
    replacements: &Replacements,
) -> Result<BTreeMap<String, String>> {
    Ok(Manuscript::load(root)?.assemble_by_chapter(replacements))
}

fn join_fragments<'a>(
    fragments: impl Iterator<Item = &'a Fragment>,
    replacements: &Replacements,
) -> String {
    let mut buffer = String::new();
    for fragment in fragments {
        buffer.push_str(&normalize(&fragment.text, replacements));
        buffer.push_str(SECTION_SEPARATOR);
    }

    if let Some(body) = buffer.strip_suffix(SECTION_SEPARATOR) {
        let mut closed = body.to_string();
        closed.push_str(SECTION_END);
        return closed;
    }
    buffer
}

/// Reads one fragment as UTF-8 text, rejecting binary files.
pub fn read_fragment(path: &Path) -> Result<String> {
    let file =
        File::open(path).map_err(|e| ProjectError::io(format!("opening {}", path.display()), e))?;
    let len = file
        .metadata()
        .map_err(|e| ProjectError::io(format!("inspecting {}", path.display()), e))?
        .len();

    if len == 0 {
        debug!("Empty fragment: {}", path.display());
        return Ok(String::new());
    }

    // SAFETY: the map is read-only and dropped before this function returns.
    let mmap = unsafe {
        MmapOptions::new()
            .map(&file)
            .map_err(|e| ProjectError::io(format!("mapping {}", path.display()), e))?
    };

    let sample_size = std::cmp::min(8192, mmap.len());
    if inspect(&mmap[..sample_size]) == ContentType::BINARY {
        return Err(ProjectError::Binary {
            path: path.to_path_buf(),
        }
        .into());
    }

    let text = str::from_utf8(&mmap).map_err(|e| {
        ProjectError::io(
            format!("decoding {}", path.display()),
            std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        )
    })?;

    debug!("Read fragment: {} ({} bytes)", path.display(), mmap.len());
    Ok(text.to_string())
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
