//! Command dispatch for one invocation.
//!
//! Tokens run in order. A failing command prints a diagnostic and the next
//! token still runs; temporary converter inputs are cleaned up after the
//! last one no matter what happened before.

use crate::cli::print_usage;
use crate::export::{ExportFormat, Exporter};
use crate::project::Project;
use crate::watch::ManuscriptWatcher;
use crate::wordcount::format_chapter_counts;
use anyhow::{Result, bail};
use chrono::Local;
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Init,
    All,
    Ebooks,
    Export(ExportFormat),
    WordCount,
    NewChapter,
    RemoteSync,
    Watch,
}

impl Command {
    pub fn parse(token: &str) -> Option<Self> {
        let command = match token {
            "init" => Command::Init,
            "all" => Command::All,
            "ebooks" => Command::Ebooks,
            "epub" => Command::Export(ExportFormat::Epub),
            "mobi" => Command::Export(ExportFormat::Mobi),
            "pdf" => Command::Export(ExportFormat::Pdf),
            "html" => Command::Export(ExportFormat::Html),
            "txt" | "text" => Command::Export(ExportFormat::Txt),
            "md" | "markdown" => Command::Export(ExportFormat::Md),
            "odt" => Command::Export(ExportFormat::Odt),
            "docx" => Command::Export(ExportFormat::Docx),
            "doc" => Command::Export(ExportFormat::Doc),
            "rtf" => Command::Export(ExportFormat::Rtf),
            "wc" | "wordcount" | "word_count" => Command::WordCount,
            "chapter" | "nc" | "newchapter" => Command::NewChapter,
            "nano" => Command::RemoteSync,
            "watch" => Command::Watch,
            _ => return None,
        };
        Some(command)
    }
}

/// Running totals for a watch session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchProgress {
    start: i64,
    last: i64,
}

impl WatchProgress {
    pub fn new(start: i64) -> Self {
        Self { start, last: start }
    }

    /// Takes a fresh count and returns words written since the watch began
    /// and since the previous count.
    pub fn advance(&mut self, words: i64) -> (i64, i64) {
        let since_last = words - self.last;
        self.last = words;
        (words - self.start, since_last)
    }
}

pub struct Session {
    project: Project,
    exporter: Exporter,
    todays_progress: i64,
}

impl Session {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            exporter: Exporter::new(),
            todays_progress: 0,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Runs every token, then removes the converter's temporary inputs.
    /// Returns the number of commands that failed.
    pub async fn run(&mut self, tokens: &[String]) -> usize {
        let mut failures = 0;

        for token in tokens {
            let Some(command) = Command::parse(token) else {
                println!("Warning unknown argument '{token}'");
                print_usage();
                continue;
            };

            debug!("Running {command:?}");
            if let Err(err) = self.execute(command).await {
                println!("ERROR: {err:#}");
                failures += 1;
            }
        }

        self.project.cleanup().await;
        failures
    }

    pub async fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Init => {
                let chapter = self.project.init().await?;
                println!("* Added new chapter directory: {chapter}");
            }
            Command::All => {
                self.save_progress().await?;
                let mut failed = Vec::new();
                for format in ExportFormat::ALL {
                    if let Err(err) = self.export(format).await {
                        println!("ERROR: {err:#}");
                        failed.push(format.extension());
                    }
                }
                self.report_word_count().await?;
                if !failed.is_empty() {
                    bail!("could not build {}", failed.join(", "));
                }
            }
            Command::Ebooks => {
                self.save_progress().await?;
                self.export(ExportFormat::Epub).await?;
                self.export(ExportFormat::Mobi).await?;
            }
            Command::Export(format) => {
                self.save_progress().await?;
                self.export(format).await?;
            }
            Command::WordCount => {
                self.save_progress().await?;
                self.report_word_count().await?;
                self.report_chapter_counts().await?;
            }
            Command::NewChapter => {
                let chapter = self.project.create_chapter(None).await?;
                println!("* Added new chapter directory: {chapter}");
            }
            Command::RemoteSync => self.remote_sync().await?,
            Command::Watch => self.watch().await?,
        }
        Ok(())
    }

    async fn save_progress(&mut self) -> Result<()> {
        self.todays_progress = self.project.save_progress(true).await?;
        Ok(())
    }

    async fn export(&mut self, format: ExportFormat) -> Result<()> {
        let output = self.exporter.export(&self.project, format).await?;
        let shown = output.strip_prefix(self.project.root()).unwrap_or(&output);
        println!("* {} created", shown.display());
        Ok(())
    }

    async fn report_word_count(&self) -> Result<i64> {
        let words = self.project.word_count().await?;
        println!("    Project Wordcount: {words}");
        println!("     Today's Progress: {}", self.todays_progress);
        Ok(words)
    }

    async fn report_chapter_counts(&self) -> Result<()> {
        let counts = self.project.chapter_word_counts().await?;
        println!("  -------------- Chapter Word Counts -----------------");
        print!("{}", format_chapter_counts(&counts));
        Ok(())
    }

    #[cfg(feature = "remote")]
    async fn remote_sync(&self) -> Result<()> {
        use crate::error::ProjectError;
        use crate::remote::{DEFAULT_UPDATE_URL, RemoteSync, SyncOutcome};

        let config = self.project.config();
        if !config.has_remote_credentials() {
            return Err(ProjectError::Config(
                "Cannot update remote word count - no configuration. Be sure to set \
                 remoteServiceSecretKey and remoteServiceUsername in your config.yml."
                    .to_string(),
            )
            .into());
        }

        let words = self.project.word_count().await?;
        println!(
            "* Updating remote word count (currently {words})... Connecting to {DEFAULT_UPDATE_URL}"
        );

        let outcome = RemoteSync::default()
            .publish(
                &config.remote_service_username,
                &config.remote_service_secret_key,
                words,
            )
            .await?;

        match outcome {
            SyncOutcome::Confirmed => println!("* SUCCESS! Remote count matches current count"),
            SyncOutcome::Mismatch { reported } => println!(
                "ERROR: Remote count does NOT match your current count after update - check your secret and username ({} vs {words})",
                reported.as_deref().unwrap_or("nothing")
            ),
        }
        Ok(())
    }

    #[cfg(not(feature = "remote"))]
    async fn remote_sync(&self) -> Result<()> {
        Err(crate::error::ProjectError::Config(
            "Remote word count sync is not available in this build".to_string(),
        )
        .into())
    }

    /// Recounts on every manuscript change until Control-C.
    async fn watch(&mut self) -> Result<()> {
        self.save_progress().await?;
        let mut progress = WatchProgress::new(self.project.word_count().await?);

        let mut watcher = ManuscriptWatcher::start(&self.project.manuscript_dir())?;
        println!("* Press Control-C to stop watching");

        loop {
            let change = tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                change = watcher.next_change() => match change {
                    Some(change) => change,
                    None => break,
                },
            };

            println!(
                "---------- Watch Event @ {} ----------------",
                Local::now().format("%H:%M:%S")
            );
            println!("* Received {} event - {}.", change.kind, change.path.display());

            if let Err(err) = self.on_change(&mut progress).await {
                println!("ERROR: {err:#}");
            }
        }

        Ok(())
    }

    /// One watch step: recount, save progress and report both deltas.
    async fn on_change(&mut self, progress: &mut WatchProgress) -> Result<(i64, i64)> {
        let words = self.recount().await?;
        let (since_start, since_last) = progress.advance(words);
        println!("* Words written since start: {since_start}");
        println!("* Words written since last save: {since_last}");
        Ok((since_start, since_last))
    }

    async fn recount(&mut self) -> Result<i64> {
        self.todays_progress = self.project.save_progress(false).await?;
        self.report_word_count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        for token in ["wc", "wordcount", "word_count"] {
            assert_eq!(Command::parse(token), Some(Command::WordCount));
        }
        for token in ["chapter", "nc", "newchapter"] {
            assert_eq!(Command::parse(token), Some(Command::NewChapter));
        }
        assert_eq!(
            Command::parse("text"),
            Some(Command::Export(ExportFormat::Txt))
        );
        assert_eq!(
            Command::parse("markdown"),
            Some(Command::Export(ExportFormat::Md))
        );
    }

    #[test]
    fn test_watch_progress_deltas() {
        let mut progress = WatchProgress::new(100);
        assert_eq!(progress.advance(110), (10, 10));
        assert_eq!(progress.advance(125), (25, 15));
        assert_eq!(progress.advance(120), (20, -5));
        assert_eq!(progress.advance(120), (20, 0));
    }

    #[tokio::test]
    async fn test_each_change_recounts_and_saves() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let chapter = dir.path().join("Manuscript").join("01");
        std::fs::create_dir_all(&chapter)?;
        std::fs::write(chapter.join("a.md"), "one two")?;

        let project = Project::with_config(dir.path(), crate::config::Config::default())
            .with_charts(Box::new(crate::charts::NoCharts));
        let mut session = Session::new(project);
        let mut progress = WatchProgress::new(session.project().word_count().await?);

        std::fs::write(chapter.join("b.md"), "three four five")?;
        assert_eq!(session.on_change(&mut progress).await?, (3, 3));

        std::fs::write(chapter.join("b.md"), "three")?;
        assert_eq!(session.on_change(&mut progress).await?, (1, -2));

        let ledger = std::fs::read_to_string(session.project().ledger_path())?;
        assert!(ledger.ends_with("\t3\n"));
        Ok(())
    }

    #[test]
    fn test_unknown_token() {
        assert_eq!(Command::parse("epubs"), None);
        assert_eq!(Command::parse(""), None);
    }
}
