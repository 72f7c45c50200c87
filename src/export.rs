//! Distributable formats, produced by handing the metadata block and the
//! scratch manuscript to pandoc (and calibre's `ebook-convert` for mobi).
//!
//! Converters run in the project root with inherited standard streams, one
//! at a time, without timeouts. A non-zero exit aborts that export.

use crate::error::ProjectError;
use crate::project::{METADATA_FILE, Project, SCRATCH_FILE};
use anyhow::Result;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::fs;
use tokio::process::Command;

static PANDOC_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^pandoc(?:\.exe)?\s+(\d+)\.").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Epub,
    Mobi,
    Html,
    Txt,
    Pdf,
    Md,
    Odt,
    Docx,
    Doc,
    Rtf,
}

impl ExportFormat {
    /// Formats built by `all`, in build order.
    pub const ALL: [ExportFormat; 8] = [
        ExportFormat::Epub,
        ExportFormat::Mobi,
        ExportFormat::Html,
        ExportFormat::Txt,
        ExportFormat::Pdf,
        ExportFormat::Md,
        ExportFormat::Odt,
        ExportFormat::Docx,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Epub => "epub",
            ExportFormat::Mobi => "mobi",
            ExportFormat::Html => "html",
            ExportFormat::Txt => "txt",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Md => "md",
            ExportFormat::Odt => "odt",
            ExportFormat::Docx => "docx",
            ExportFormat::Doc => "doc",
            ExportFormat::Rtf => "rtf",
        }
    }
}

/// Picks pandoc's smart-typography switch from its `--version` output.
///
/// pandoc 1.x takes `-S`; 2.x and later take `-f markdown+smart`.
/// Unrecognised output yields no switch.
pub fn markdown_args(version_output: &str) -> Vec<String> {
    let first_line = version_output.lines().next().unwrap_or("");
    let Some(major) = PANDOC_VERSION
        .captures(first_line)
        .and_then(|c| c[1].parse::<u32>().ok())
    else {
        return Vec::new();
    };

    if major < 2 {
        vec!["-S".to_string()]
    } else {
        vec!["-f".to_string(), "markdown+smart".to_string()]
    }
}

/// pandoc arguments that turn the metadata block and scratch manuscript into
/// `output`. `Txt` converts from `epub` instead. Not used for `Md` and `Mobi`.
pub fn pandoc_args(
    format: ExportFormat,
    markdown_args: &[String],
    font_size: &str,
    output: &Path,
    epub: &Path,
) -> Vec<String> {
    let output = output.display().to_string();
    let mut args: Vec<String> = Vec::new();

    match format {
        ExportFormat::Txt => {
            args.extend(["-t".to_string(), "plain".to_string()]);
            args.push(epub.display().to_string());
            args.extend(["-o".to_string(), output]);
            return args;
        }
        ExportFormat::Docx => args.push("-s".to_string()),
        ExportFormat::Rtf => {
            args.push("-s".to_string());
            args.extend(markdown_args.iter().cloned());
        }
        ExportFormat::Pdf => {
            args.extend(["-V".to_string(), format!("fontsize={font_size}")]);
            args.extend(markdown_args.iter().cloned());
        }
        _ => args.extend(markdown_args.iter().cloned()),
    }

    args.extend([
        "-o".to_string(),
        output,
        METADATA_FILE.to_string(),
        SCRATCH_FILE.to_string(),
    ]);
    args
}

/// Per-run export state: the detected pandoc switch and whether the epub
/// has already been built.
#[derive(Debug, Default)]
pub struct Exporter {
    markdown_args: Option<Vec<String>>,
    epub_built: bool,
}

impl Exporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds `format` and returns the path of the produced file.
    pub async fn export(&mut self, project: &Project, format: ExportFormat) -> Result<PathBuf> {
        let output = project.export_path(format.extension());

        match format {
            ExportFormat::Epub => {
                self.ensure_epub(project).await?;
            }
            ExportFormat::Mobi => {
                let epub = self.ensure_epub(project).await?;
                let tool = &project.config().ebook_convert_path;
                let args = [epub.display().to_string(), output.display().to_string()];
                run_tool(project.root(), tool, &args, true).await?;
            }
            ExportFormat::Txt => {
                let epub = self.ensure_epub(project).await?;
                self.run_pandoc(project, format, &output, &epub).await?;
            }
            ExportFormat::Md => {
                project.write_scratch().await?;
                fs::copy(project.scratch_path(), &output)
                    .await
                    .map_err(|e| ProjectError::io(format!("writing {}", output.display()), e))?;
            }
            _ => {
                project.write_metadata().await?;
                project.write_scratch().await?;
                let epub = project.export_path(ExportFormat::Epub.extension());
                self.run_pandoc(project, format, &output, &epub).await?;
            }
        }

        info!("Exported {}", output.display());
        Ok(output)
    }

    /// Builds the epub once per run.
    async fn ensure_epub(&mut self, project: &Project) -> Result<PathBuf> {
        let epub = project.export_path(ExportFormat::Epub.extension());
        if self.epub_built {
            debug!("Reusing {}", epub.display());
            return Ok(epub);
        }

        project.write_metadata().await?;
        project.write_scratch().await?;
        self.run_pandoc(project, ExportFormat::Epub, &epub, &epub)
            .await?;
        self.epub_built = true;
        Ok(epub)
    }

    async fn run_pandoc(
        &mut self,
        project: &Project,
        format: ExportFormat,
        output: &Path,
        epub: &Path,
    ) -> Result<()> {
        let pandoc = project.config().pandoc_path.clone();
        let markdown = self.detect_markdown_args(project.root(), &pandoc).await;
        let args = pandoc_args(
            format,
            &markdown,
            &project.config().pdf_font_size,
            &relative_to(project.root(), output),
            &relative_to(project.root(), epub),
        );
        run_tool(project.root(), &pandoc, &args, false).await
    }

    async fn detect_markdown_args(&mut self, root: &Path, pandoc: &str) -> Vec<String> {
        if let Some(args) = &self.markdown_args {
            return args.clone();
        }

        let args = match Command::new(pandoc)
            .arg("--version")
            .current_dir(root)
            .stdin(Stdio::null())
            .output()
            .await
        {
            Ok(out) => {
                let version = String::from_utf8_lossy(&out.stdout);
                debug!("Detected {}", version.lines().next().unwrap_or("unknown pandoc"));
                markdown_args(&version)
            }
            Err(e) => {
                warn!("Could not query {pandoc} --version: {e}");
                Vec::new()
            }
        };

        self.markdown_args = Some(args.clone());
        args
    }
}

async fn run_tool(root: &Path, program: &str, args: &[String], quiet: bool) -> Result<()> {
    info!("Running {} {}", program, args.join(" "));

    let mut command = Command::new(program);
    command.args(args).current_dir(root).stdin(Stdio::null());
    if quiet {
        command.stdout(Stdio::null());
    }

    let status = command.status().await.map_err(|source| ProjectError::Spawn {
        program: program.to_string(),
        source,
    })?;

    if !status.success() {
        return Err(ProjectError::ExternalTool {
            program: program.to_string(),
            status,
        }
        .into());
    }
    Ok(())
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}
