use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn packrat() -> Command {
    Command::cargo_bin("packrat").expect("Binary exists")
}

#[test]
fn help_lists_the_subcommands() {
    packrat()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("run")
                .and(predicate::str::contains("render"))
                .and(predicate::str::contains("publish")),
        );
}

#[test]
fn run_rejects_an_invalid_source_path() {
    let work = tempdir().unwrap();
    packrat()
        .current_dir(work.path())
        .args(["run", "--source", "does-not-exist", "--yes", "--uploader", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid source path"));
}

#[test]
fn run_with_yes_requires_an_uploader_name() {
    let work = tempdir().unwrap();
    let source = work.path().join("source");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("a.txt"), b"payload").unwrap();

    packrat()
        .current_dir(work.path())
        .args(["run", "--source", "source", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--uploader is required"));
}

#[test]
fn run_over_a_fully_uploaded_tree_skips_the_upload_phase() {
    let work = tempdir().unwrap();
    let source = work.path().join("source");
    fs::create_dir_all(&source).unwrap();
    fs::write(source.join("a.txt"), b"known payload").unwrap();

    // Seed the ledger with this exact content hash so the scan dedups it.
    let hash = packrat_core::hash::sha256_file(&source.join("a.txt")).unwrap();
    fs::write(
        work.path().join("uploaded.log"),
        format!("item1|alice|a.txt|{hash}|2026-01-01T00:00:00\n"),
    )
    .unwrap();

    packrat()
        .current_dir(work.path())
        .args(["run", "--source", "source", "--yes", "--uploader", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All files already uploaded."));
}

#[test]
fn render_with_an_empty_ledger_reports_nothing_to_do() {
    let work = tempdir().unwrap();
    packrat()
        .current_dir(work.path())
        .arg("render")
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to render"));
    assert!(!work.path().join("index.html").exists());
}

#[test]
fn render_builds_the_page_and_sets_the_pending_flag() {
    let work = tempdir().unwrap();
    fs::write(
        work.path().join("uploaded.log"),
        "item1|alice|a/b.txt|HASH1|T1\n\
         malformed|line\n\
         item1|alice|a/c.txt|HASH2|T2\n",
    )
    .unwrap();

    packrat()
        .current_dir(work.path())
        .arg("render")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rendered index.html"));

    let page = fs::read_to_string(work.path().join("index.html")).unwrap();
    assert!(page.contains("Uploader: alice"));
    assert!(page.contains("https://archive.org/download/item1/a/b.txt"));
    assert!(page.contains("https://archive.org/download/item1/a/c.txt"));
    assert!(work.path().join(".push_state").exists());
}

#[test]
fn publish_without_a_rendered_page_aborts_with_guidance() {
    let work = tempdir().unwrap();
    packrat()
        .current_dir(work.path())
        .args(["publish", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no rendered page"));
}

#[test]
fn config_overrides_relocate_the_ledger() {
    let work = tempdir().unwrap();
    fs::write(
        work.path().join("packrat.yaml"),
        "ledger_path: archive/custom.log\nsite_path: archive/index.html\n",
    )
    .unwrap();
    fs::create_dir_all(work.path().join("archive")).unwrap();
    fs::write(
        work.path().join("archive/custom.log"),
        "item1|bob|file.txt|HASH|T\n",
    )
    .unwrap();

    packrat()
        .current_dir(work.path())
        .args(["render", "--config", "packrat.yaml"])
        .assert()
        .success();

    let page = fs::read_to_string(work.path().join("archive/index.html")).unwrap();
    assert!(page.contains("Uploader: bob"));
}
