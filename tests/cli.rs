use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn enovel() -> Command {
    Command::cargo_bin("enovel").unwrap()
}

/// No tokens prints usage and touches nothing.
#[test]
fn test_usage_without_commands() {
    let temp_dir = tempdir().unwrap();

    enovel()
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"));

    assert!(!temp_dir.path().join("config.yml").exists());
}

/// Unknown tokens warn, print usage and let later tokens run.
#[test]
fn test_unknown_token_continues() {
    let temp_dir = tempdir().unwrap();

    enovel()
        .current_dir(temp_dir.path())
        .args(["bogus", "chapter"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Warning unknown argument 'bogus'"))
        .stdout(predicate::str::contains(
            "* Added new chapter directory: Chapter 1 - Your first Chapter",
        ));

    assert!(temp_dir.path().join("config.yml").is_file());
}

#[test]
fn test_hyphenated_token_continues() {
    let temp_dir = tempdir().unwrap();

    enovel()
        .current_dir(temp_dir.path())
        .args(["-draft", "chapter"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Warning unknown argument '-draft'"))
        .stdout(predicate::str::contains(
            "* Added new chapter directory: Chapter 1 - Your first Chapter",
        ));
}

#[test]
fn test_init_then_word_count() {
    let temp_dir = tempdir().unwrap();

    enovel()
        .current_dir(temp_dir.path())
        .args(["init", "wc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Project Wordcount: 15"))
        .stdout(predicate::str::contains("Chapter Word Counts"))
        .stdout(predicate::str::contains("Chapter 1 - Your first Chapter: 16"));

    let ledger = fs::read_to_string(temp_dir.path().join("Progress/progress.tsv")).unwrap();
    assert!(ledger.ends_with("\t15\n"));
    assert!(!temp_dir.path().join("temp_work_file.md").exists());
}

#[test]
fn test_failures_are_reported_on_stdout() {
    let temp_dir = tempdir().unwrap();

    enovel()
        .current_dir(temp_dir.path())
        .args(["wc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ERROR: not found"));
}
