//! # enovel Library
//!
//! This crate can be used to:
//!
//! - Assemble a directory of Markdown chapter fragments into one normalised
//!   manuscript, flat or per chapter
//! - Count words and keep a daily progress ledger
//! - Scaffold new projects and chapters
//! - Hand the manuscript to pandoc to build e-books
//!
//! ## Usage
//!
//! ### To count words in a project:
//!
//! ```rust,no_run
//! use enovel::Project;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let project = Project::open(std::env::current_dir()?).await?;
//!     let today = project.save_progress(false).await?;
//!     println!("{} words, {today} today", project.word_count().await?);
//!     Ok(())
//! }
//! ```
//!
//! ### To assemble a manuscript directory directly:
//!
//! ```rust,no_run
//! use enovel::{Replacements, assemble};
//! use std::path::Path;
//!
//! let text = assemble(Path::new("Manuscript"), &Replacements::new())?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod assembler;
pub mod charts;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod filewalker;
pub mod ledger;
pub mod normalize;
pub mod project;
#[cfg(feature = "remote")]
pub mod remote;
pub mod scaffold;
pub mod watch;
pub mod wordcount;

pub use assembler::{Manuscript, SECTION_SEPARATOR, assemble, assemble_by_chapter};
pub use commands::{Command, Session};
pub use config::{Config, Replacements};
pub use error::ProjectError;
pub use ledger::{ProgressLedger, record_today};
pub use normalize::normalize;
pub use project::Project;
pub use scaffold::create_chapter;
pub use wordcount::{count, count_by_chapter, token_count};

use anyhow::Result;

/// Runs the command tokens from the command line against the project in
/// `args.project_root`. Returns the number of commands that failed.
pub async fn run_enovel(args: cli::Config) -> Result<usize> {
    if args.commands.is_empty() {
        cli::print_usage();
        return Ok(0);
    }

    let project = Project::open(&args.project_root).await?;
    let mut session = Session::new(project);
    Ok(session.run(&args.commands).await)
}
