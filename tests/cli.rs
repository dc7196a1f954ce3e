use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn render_cli_happy_flow_produces_a_document() {
    let source = tempdir().expect("temp source dir");
    fs::write(source.path().join("main.rs"), "fn main() {}\n").expect("write sample file");
    let out = tempdir().expect("temp output dir");
    let output = out.path().join("out.pdf");

    let config = out.path().join("config.yaml");
    fs::write(
        &config,
        format!(
            "source:\n  type: local\n  path: {}\noutput:\n  target: {}\n",
            source.path().display(),
            output.display()
        ),
    )
    .expect("write config");

    let mut cmd = Command::cargo_bin("repoprint").expect("binary exists");
    cmd.arg("render").arg("--config").arg(&config);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Render complete"));

    let bytes = fs::read(&output).expect("output document exists");
    assert_eq!(&bytes[0..4], b"%PDF");
}

#[test]
fn render_cli_fails_for_missing_config_file() {
    let mut cmd = Command::cargo_bin("repoprint").expect("binary exists");
    cmd.arg("render").arg("--config").arg("/no/such/config.yaml");

    cmd.assert().failure();
}

#[test]
fn render_cli_fails_for_missing_local_source() {
    let out = tempdir().expect("temp dir");
    let config = out.path().join("config.yaml");
    fs::write(
        &config,
        "source:\n  type: local\n  path: /definitely/not/here\n",
    )
    .expect("write config");

    let mut cmd = Command::cargo_bin("repoprint").expect("binary exists");
    cmd.arg("render").arg("--config").arg(&config);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}
