//! Starter directories and files for new projects and chapters.
//!
//! Nothing here ever overwrites: every file is created with `create_new`, and
//! an existing file is left exactly as it is.

use crate::error::ProjectError;
use crate::filewalker::count_subdirs;
use anyhow::Result;
use log::{debug, info};
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

const FIRST_CHAPTER_NAME: &str = "Your first Chapter";
const CHAPTER_NAME: &str = "New Chapter";

const CHAPTER_HEADER_FILE: &str = "00 - Chapter Header.md";
const FIRST_SCENE_FILE: &str = "01 - Setting the stage.md";
const CHAPTER_NOTES_FILE: &str = "_Chapter notes.txt";

const FIRST_SCENE: &str = "Your book starts here!\n\nYour second paragraph\n";
const CHAPTER_NOTES: &str = "Place your chapter notes here!\n";

const EXAMPLE_CHARACTER: &str = "# New Character Name\n\n## Role\n\nCharacter's role in the story\n\n## Description\n\nPhysical and mental description of the character.";
const EXAMPLE_SCENE: &str = "# New Location Name\n\n## Role\n\nScene's role in the story\n\n## Description\n\nPhysical and mental description of the scene.";

/// Note directories created next to the manuscript by `init`.
pub const NOTE_DIRS: [&str; 4] = ["People", "Places", "Things", "Notes"];

/// Directory name for chapter `number`.
pub fn chapter_dir_name(number: u32) -> String {
    let name = if number == 1 {
        FIRST_CHAPTER_NAME
    } else {
        CHAPTER_NAME
    };
    format!("Chapter {number} - {name}")
}

/// Creates the chapter directory and its starter fragments, returning the
/// directory name.
///
/// Without an explicit number the chapter is numbered one past the count of
/// existing chapter directories.
pub async fn create_chapter(manuscript_dir: &Path, number: Option<u32>) -> Result<String> {
    create_dir(manuscript_dir).await?;

    let number = match number {
        Some(n) => n,
        None => count_subdirs(manuscript_dir).await? as u32 + 1,
    };
    let dir_name = chapter_dir_name(number);
    let chapter_dir = manuscript_dir.join(&dir_name);
    create_dir(&chapter_dir).await?;

    let heading = format!("\\newpage\n\n# {dir_name}\n\n");
    write_new(&chapter_dir.join(CHAPTER_HEADER_FILE), &heading).await?;
    write_new(&chapter_dir.join(FIRST_SCENE_FILE), FIRST_SCENE).await?;
    write_new(&chapter_dir.join(CHAPTER_NOTES_FILE), CHAPTER_NOTES).await?;

    info!("Chapter ready: {}", chapter_dir.display());
    Ok(dir_name)
}

/// Lays out a fresh project: chapter one, the note directories, the export
/// directory and two example notes.
pub async fn init_project(root: &Path, manuscript_dir: &Path, export_dir: &Path) -> Result<String> {
    let chapter = create_chapter(manuscript_dir, Some(1)).await?;

    for dir in NOTE_DIRS {
        create_dir(&root.join(dir)).await?;
    }
    create_dir(export_dir).await?;

    write_new(
        &root.join("People").join("Example Character.md"),
        EXAMPLE_CHARACTER,
    )
    .await?;
    write_new(&root.join("Places").join("Example Scene.md"), EXAMPLE_SCENE).await?;

    Ok(chapter)
}

async fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| ProjectError::io(format!("creating {}", path.display()), e))?;
    Ok(())
}

/// Writes `contents` to a file that must not exist yet. Returns whether the
/// file was written.
async fn write_new(path: &Path, contents: &str) -> Result<bool> {
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            debug!("Keeping existing file: {}", path.display());
            return Ok(false);
        }
        Err(e) => return Err(ProjectError::io(format!("creating {}", path.display()), e).into()),
    };

    file.write_all(contents.as_bytes())
        .await
        .map_err(|e| ProjectError::io(format!("writing {}", path.display()), e))?;
    file.flush()
        .await
        .map_err(|e| ProjectError::io(format!("writing {}", path.display()), e))?;
    Ok(true)
}
