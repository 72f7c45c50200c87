use anyhow::Result;
use clap::{Arg, ArgAction, Command};
use std::ffi::OsString;
use std::path::PathBuf;

pub struct Config {
    /// Bare command tokens, run in the order given.
    pub commands: Vec<String>,
    pub project_root: PathBuf,
}

pub const USAGE: &str = "\
Usage:
    enovel init        Creates the base directories and starter content
                       (existing files are never overwritten)
    enovel all         Creates a .mobi, .epub, .pdf, .txt, .html, .md, .odt
                       and .docx from your manuscript then displays a word count
    enovel ebooks      Create .mobi and .epub from your manuscript
    enovel pdf         Creates a .pdf from your manuscript
    enovel mobi        Creates a .mobi from your manuscript
    enovel epub        Creates an .epub from your manuscript
    enovel html        Creates a .html from your manuscript
    enovel text        Creates a .txt file from your manuscript
    enovel txt         Alias to enovel text
    enovel odt         Creates an .odt from your manuscript
    enovel docx        Creates a .docx from your manuscript
    enovel doc         Creates a .doc from your manuscript
    enovel rtf         Creates a .rtf (Rich Text Format) file from your manuscript
    enovel md          Creates a .md (MarkDown) file from your manuscript
    enovel markdown    Alias to enovel md
    enovel chapter     Creates a new chapter template in your manuscript folder
    enovel nc          Alias to enovel chapter
    enovel newchapter  Alias to enovel chapter
    enovel wordcount   Gives you a current word count of your manuscript
    enovel wc          Alias to enovel wordcount
    enovel word_count  Alias to enovel wordcount
    enovel nano        If your remote service username and secret are in the
                       config, this will attempt to update your daily stat
    enovel watch       Watches the manuscript and reports words written as
                       you save (Control-C to stop)";

pub fn print_usage() {
    println!("{USAGE}");
}

fn command() -> Command {
    Command::new("enovel")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Assembles a Markdown manuscript, tracks word count progress and exports e-books")
        .after_help(USAGE)
        .arg(
            Arg::new("commands")
                .value_name("COMMAND")
                .help("Commands to run, in order")
                .num_args(0..)
                .allow_hyphen_values(true)
                .action(ArgAction::Append),
        )
}

pub fn parse_args() -> Result<Config> {
    parse_from(std::env::args_os())
}

pub fn parse_from<I, T>(args: I) -> Result<Config>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command().get_matches_from(args);

    let commands = matches
        .get_many::<String>("commands")
        .map(|vals| vals.cloned().collect())
        .unwrap_or_default();

    Ok(Config {
        commands,
        project_root: std::env::current_dir()?,
    })
}
