use std::error::Error;
use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn cli() -> Result<Command, Box<dyn Error>> {
    Ok(Command::cargo_bin("zolapad")?)
}

#[test]
fn paste_special_prints_youtube_shortcode() -> Result<(), Box<dyn Error>> {
    let config = tempdir()?;
    cli()?
        .args([
            "--config",
            config.path().to_str().unwrap(),
            "paste-special",
            "--text",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("{{ youtube(id=\"dQw4w9WgXcQ\")}}"));
    Ok(())
}

#[test]
fn paste_special_keeps_plain_text() -> Result<(), Box<dyn Error>> {
    let config = tempdir()?;
    cli()?
        .args([
            "--config",
            config.path().to_str().unwrap(),
            "paste-special",
            "--text",
            "just some words",
        ])
        .assert()
        .success()
        .stdout("just some words\n");
    Ok(())
}

#[test]
fn paste_special_replaces_each_selection() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let document = dir.path().join("index.md");
    fs::write(&document, "A then B")?;

    cli()?
        .args([
            "--config",
            dir.path().join("config").to_str().unwrap(),
            "paste-special",
            "--text",
            "https://twitter.com/zola/status/1234567890",
            "--file",
            document.to_str().unwrap(),
            "--select",
            "0:1",
            "--select",
            "7:8",
        ])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&document)?,
        "{{ twitter(id=\"1234567890\")}} then {{ twitter(id=\"1234567890\")}}"
    );
    Ok(())
}

#[test]
fn block_is_inserted_at_caret() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let document = dir.path().join("index.md");
    fs::write(&document, "+++\n+++\n")?;

    cli()?
        .args([
            "--config",
            dir.path().join("config").to_str().unwrap(),
            "block",
            "--text",
            "Hello",
            "--file",
            document.to_str().unwrap(),
        ])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&document)?,
        "+++\n+++\n{% block() %}\nHello\n{% end %}"
    );
    Ok(())
}

#[test]
fn malformed_selection_is_rejected() -> Result<(), Box<dyn Error>> {
    let config = tempdir()?;
    cli()?
        .args([
            "--config",
            config.path().to_str().unwrap(),
            "block",
            "--select",
            "3-4",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected START:END"));
    Ok(())
}

#[test]
fn paste_image_ignores_non_content_documents() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let document = dir.path().join("config.toml");
    fs::write(&document, "title = \"x\"\n")?;

    cli()?
        .args([
            "--config",
            dir.path().join("config").to_str().unwrap(),
            "paste-image",
            document.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("No image inserted"));

    assert_eq!(fs::read_to_string(&document)?, "title = \"x\"\n");
    assert_eq!(fs::read_dir(dir.path())?.count(), 1);
    Ok(())
}

#[test]
fn paste_image_skips_missing_non_documents() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let document = dir.path().join("missing.txt");

    cli()?
        .args([
            "--config",
            dir.path().join("config").to_str().unwrap(),
            "paste-image",
            document.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("No image inserted"));

    assert!(!document.exists());
    Ok(())
}

#[test]
fn paste_image_ignores_documents_outside_known_sites() -> Result<(), Box<dyn Error>> {
    let site = tempdir()?;
    let elsewhere = tempdir()?;
    let document = elsewhere.path().join("content").join("index.md");
    fs::create_dir_all(document.parent().unwrap())?;
    fs::write(&document, "+++\n+++\n")?;

    cli()?
        .args([
            "--config",
            site.path().join("config").to_str().unwrap(),
            "--workspace",
            site.path().to_str().unwrap(),
            "paste-image",
            document.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("No image inserted"));

    assert_eq!(fs::read_to_string(&document)?, "+++\n+++\n");
    assert_eq!(fs::read_dir(document.parent().unwrap())?.count(), 1);
    Ok(())
}
