//! The project context: one working directory, its configuration and the
//! fixed paths derived from it.

use crate::assembler::Manuscript;
use crate::charts::{NoCharts, ProgressChart, default_renderer};
use crate::config::{CONFIG_FILE, Config};
use crate::error::ProjectError;
use crate::ledger::{LEDGER_FILE, record_today};
use crate::normalize::normalize;
use crate::scaffold;
use crate::wordcount::{count, count_by_chapter, token_count};
use anyhow::Result;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const MANUSCRIPT_DIR: &str = "Manuscript";
pub const EXPORT_DIR: &str = "Exports";
pub const PROGRESS_DIR: &str = "Progress";

/// Flat assembled text handed to the converter.
pub const SCRATCH_FILE: &str = "temp_work_file.md";
/// Title block handed to the converter.
pub const METADATA_FILE: &str = "00-ebook-info.txt";

/// Prefix of the working directories the PDF engine leaves behind.
const TEX_WORK_PREFIX: &str = "tex2pdf.";

pub struct Project {
    root: PathBuf,
    config: Config,
    charts: Box<dyn ProgressChart>,
}

impl Project {
    /// Opens the project rooted at `root`, writing a default `config.yml`
    /// when there is none.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let config = Config::load_or_init(&root.join(CONFIG_FILE)).await?;
        Ok(Self::with_config(root, config))
    }

    pub fn with_config(root: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            root: root.into(),
            config,
            charts: default_renderer(),
        }
    }

    /// Swaps the chart renderer used when progress is saved.
    pub fn with_charts(mut self, charts: Box<dyn ProgressChart>) -> Self {
        self.charts = charts;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn manuscript_dir(&self) -> PathBuf {
        self.root.join(MANUSCRIPT_DIR)
    }

    pub fn export_dir(&self) -> PathBuf {
        self.root.join(EXPORT_DIR)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.root.join(PROGRESS_DIR).join(LEDGER_FILE)
    }

    pub fn scratch_path(&self) -> PathBuf {
        self.root.join(SCRATCH_FILE)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.root.join(METADATA_FILE)
    }

    /// `Exports/<bookFile>.<extension>`
    pub fn export_path(&self, extension: &str) -> PathBuf {
        self.export_dir()
            .join(format!("{}.{}", self.config.book_file, extension))
    }

    pub fn load_manuscript(&self) -> Result<Manuscript> {
        Manuscript::load(&self.manuscript_dir())
    }

    /// Assembles the whole manuscript, making sure the export directory
    /// exists first.
    pub async fn assemble(&self) -> Result<String> {
        self.ensure_export_dir().await?;
        Ok(self.load_manuscript()?.assemble(&self.config.replacements))
    }

    pub async fn assemble_by_chapter(&self) -> Result<BTreeMap<String, String>> {
        self.ensure_export_dir().await?;
        Ok(self
            .load_manuscript()?
            .assemble_by_chapter(&self.config.replacements))
    }

    /// Assembles the manuscript into the scratch file and returns the text.
    pub async fn write_scratch(&self) -> Result<String> {
        let text = self.assemble().await?;
        let path = self.scratch_path();
        fs::write(&path, &text)
            .await
            .map_err(|e| ProjectError::io(format!("writing {}", path.display()), e))?;
        debug!("Wrote scratch manuscript: {}", path.display());
        Ok(text)
    }

    /// Words in the manuscript before the configured offset.
    ///
    /// The assembled text is normalised once more as a whole, which drops the
    /// section rules so they never count as words.
    pub async fn raw_word_count(&self) -> Result<i64> {
        let text = self.assemble().await?;
        let normalized = normalize(&text, &self.config.replacements);
        Ok(token_count(&normalized) as i64)
    }

    /// Words in the manuscript less `wordCountOffset`. May be negative.
    pub async fn word_count(&self) -> Result<i64> {
        let text = self.assemble().await?;
        let normalized = normalize(&text, &self.config.replacements);
        Ok(count(&normalized, self.config.word_count_offset))
    }

    /// Words per chapter, section rules included, no offset.
    pub async fn chapter_word_counts(&self) -> Result<BTreeMap<String, usize>> {
        Ok(count_by_chapter(&self.assemble_by_chapter().await?))
    }

    /// Records today's raw count in the ledger and returns today's delta.
    pub async fn save_progress(&self, draw_charts: bool) -> Result<i64> {
        let current = self.raw_word_count().await?;
        let renderer: &dyn ProgressChart = if draw_charts {
            self.charts.as_ref()
        } else {
            &NoCharts
        };
        let delta = record_today(
            &self.ledger_path(),
            current,
            renderer,
            &self.config.book_name,
        )
        .await?;
        info!("Progress saved: {current} words, {delta} today");
        Ok(delta)
    }

    pub async fn create_chapter(&self, number: Option<u32>) -> Result<String> {
        scaffold::create_chapter(&self.manuscript_dir(), number).await
    }

    pub async fn init(&self) -> Result<String> {
        scaffold::init_project(&self.root, &self.manuscript_dir(), &self.export_dir()).await
    }

    /// The metadata block the converter reads ahead of the manuscript.
    pub fn metadata_block(&self) -> String {
        let c = &self.config;
        let mut block = String::from("---\n");
        block.push_str(&format!("title: {}\n", c.book_name));
        block.push_str(&format!("author: {}\n", c.author_name));
        block.push_str(&format!("rights:  {}\n", c.copy_right));
        block.push_str(&format!("language: {}\n", c.language_code));
        block.push_str("geometry: margin=3cm\n");
        block.push_str(&format!("fontsize: {}\n", c.pdf_font_size));
        block.push_str(&format!("publisher: {}\n", c.publisher_name));
        if !c.cover_image.is_empty() {
            block.push_str(&format!("cover-image: {}\n", c.cover_image));
        }
        block.push_str("...\n");
        block
    }

    pub async fn write_metadata(&self) -> Result<()> {
        let path = self.metadata_path();
        fs::write(&path, self.metadata_block())
            .await
            .map_err(|e| ProjectError::io(format!("writing {}", path.display()), e))?;
        Ok(())
    }

    /// Removes the scratch file, the metadata block and leftover PDF engine
    /// directories. Failures are logged, never returned.
    pub async fn cleanup(&self) {
        for path in [self.scratch_path(), self.metadata_path()] {
            match fs::remove_file(&path).await {
                Ok(()) => debug!("Removed {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Could not remove {}: {e}", path.display()),
            }
        }

        let Ok(mut entries) = fs::read_dir(&self.root).await else {
            return;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let is_tex_dir = entry
                .file_name()
                .to_str()
                .is_some_and(|n| n.starts_with(TEX_WORK_PREFIX));
            if is_tex_dir && entry.path().is_dir() {
                if let Err(e) = fs::remove_dir(entry.path()).await {
                    warn!("Could not remove {}: {e}", entry.path().display());
                }
            }
        }
    }

    async fn ensure_export_dir(&self) -> Result<()> {
        let dir = self.export_dir();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| ProjectError::io(format!("creating {}", dir.display()), e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_metadata_block() {
        let config = Config {
            book_name: "Dune".to_string(),
            author_name: "Frank".to_string(),
            copy_right: "1965 All rights reserved".to_string(),
            ..Config::default()
        };
        let project = Project::with_config("/tmp/book", config);
        assert_eq!(
            project.metadata_block(),
            "---\ntitle: Dune\nauthor: Frank\nrights:  1965 All rights reserved\nlanguage: en-US\ngeometry: margin=3cm\nfontsize: 12pt\npublisher: Self Published\n...\n"
        );
    }

    #[test]
    fn test_metadata_block_cover_image() {
        let config = Config {
            cover_image: "cover.jpg".to_string(),
            ..Config::default()
        };
        let project = Project::with_config("/tmp/book", config);
        assert!(project.metadata_block().contains("cover-image: cover.jpg\n...\n"));
    }

    #[test]
    fn test_export_path() {
        let project = Project::with_config("/tmp/book", Config::default());
        assert_eq!(
            project.export_path("epub"),
            Path::new("/tmp/book/Exports/My Ebook.epub")
        );
    }

    #[tokio::test]
    async fn test_cleanup_removes_scratch_files() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let project = Project::with_config(dir.path(), Config::default());
        std::fs::write(project.scratch_path(), "text")?;
        std::fs::write(project.metadata_path(), "---\n...\n")?;
        std::fs::create_dir(dir.path().join("tex2pdf.1234"))?;

        project.cleanup().await;

        assert!(!project.scratch_path().exists());
        assert!(!project.metadata_path().exists());
        assert!(!dir.path().join("tex2pdf.1234").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_cleanup_without_files_is_quiet() -> anyhow::Result<()> {
        let dir = tempdir()?;
        Project::with_config(dir.path(), Config::default())
            .cleanup()
            .await;
        Ok(())
    }
}
