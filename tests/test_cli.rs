// Copyright (c) 2024 tomoDRGN developers
// Licensed under the GNU General Public License v3.0
// ----------------------------

use std::fs;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

fn tomodrgn() -> Command {
    let mut cmd = Command::cargo_bin("tomodrgn").expect("Calling binary failed");
    // Keep the developer's own settings out of the tests
    cmd.env("HOME", env!("CARGO_MANIFEST_DIR"))
        .env_remove("TOMODRGN_VIEW_CONFIG__FORMAT")
        .env_remove("TOMODRGN_VIEW_CONFIG__SHOW_META")
        .env_remove("TOMODRGN_GRAPH_TRAVERSAL__MAX_NEIGHBORS");
    cmd
}

#[test]
fn test_cli_without_subcommand_fails() {
    tomodrgn().assert().failure();
}

#[test]
fn test_global_flags_without_subcommand_print_usage() {
    tomodrgn()
        .arg("-v")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("USAGE"))
        .stderr(predicate::str::contains("panicked").not());

    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("tomodrgn.toml");
    fs::write(&settings, "[view_config]\nshow_meta = false\n").unwrap();
    tomodrgn()
        .arg("-c")
        .arg(&settings)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("USAGE"))
        .stderr(predicate::str::contains("panicked").not());
}

#[test]
fn test_view_config_toml_workdir() {
    tomodrgn()
        .args(&["view_config", "fixtures/workdir_toml"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Version: 0.2.2\n"))
        .stdout(predicate::str::contains("Creation time: 2023-05-01 12:30:00"))
        .stdout(predicate::str::contains("Config:\nseed = 42\n"))
        .stdout(predicate::str::contains("[model_args]"))
        .stdout(predicate::str::contains("zdim = 8"));
}

#[test]
fn test_view_config_json_workdir_as_json() {
    let output = tomodrgn()
        .args(&["view_config", "fixtures/workdir_json", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    // no metadata recorded for this job
    let body = stdout.strip_prefix("Config:\n").unwrap();
    let json: serde_json::Value = serde_json::from_str(body).unwrap();
    assert_eq!(json["lattice_args"]["D"], 97);
    assert_eq!(json["model_args"]["zdim"], 2);
}

#[test]
fn test_view_config_format_from_environment() {
    tomodrgn()
        .env("TOMODRGN_VIEW_CONFIG__FORMAT", "json")
        .env("TOMODRGN_VIEW_CONFIG__SHOW_META", "false")
        .args(&["view_config", "fixtures/workdir_toml"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Config:\n{"))
        .stdout(predicate::str::contains("\"qlayersA\": 3"));
}

#[test]
fn test_view_config_requires_one_workdir() {
    tomodrgn().arg("view_config").assert().failure();
    tomodrgn()
        .args(&["view_config", "fixtures/workdir_toml", "fixtures/workdir_json"])
        .assert()
        .failure();
}

#[test]
fn test_view_config_missing_config() {
    tomodrgn()
        .args(&["view_config", "fixtures/workdir_empty"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No config.toml or config.json found"));
}

#[test]
fn test_view_config_not_a_directory() {
    tomodrgn()
        .args(&["view_config", "fixtures/does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a directory"));
}

#[test]
fn test_view_config_invalid_config() {
    let workdir = TempDir::new().unwrap();
    let config = fs::read_to_string("fixtures/workdir_toml/config.toml")
        .unwrap()
        .replace("D = 65", "D = 64");
    fs::write(workdir.path().join("config.toml"), config).unwrap();

    tomodrgn()
        .arg("view_config")
        .arg(workdir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("lattice_args.D"));
}

#[test]
fn test_view_config_native_toml_datetime() {
    let workdir = TempDir::new().unwrap();
    let config = fs::read_to_string("fixtures/workdir_toml/config.toml")
        .unwrap()
        .replace("time = \"2023-05-01T12:30:00\"", "time = 2023-05-01T12:30:00");
    fs::write(workdir.path().join("config.toml"), config).unwrap();

    tomodrgn()
        .arg("view_config")
        .arg(workdir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Creation time: 2023-05-01 12:30:00"));
}

#[test]
fn test_settings_file() {
    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("tomodrgn.toml");
    fs::write(&settings, "[view_config]\nshow_meta = false\n").unwrap();

    tomodrgn()
        .arg("--config")
        .arg(&settings)
        .args(&["view_config", "fixtures/workdir_toml"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Config:\n"));

    tomodrgn()
        .arg("--config")
        .arg(&settings)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("show_meta = false"))
        .stdout(predicate::str::contains("max_neighbors = 10"));
}

#[test]
fn test_api_reference() {
    tomodrgn()
        .arg("api_reference")
        .assert()
        .success()
        .stdout(predicate::str::contains(":caption: TomoDRGN core"))
        .stdout(predicate::str::contains(":caption: TomoDRGN commands"))
        .stdout(predicate::str::contains("tomodrgn.commands.view_config"));

    tomodrgn()
        .args(&["api_reference", "--format", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tomodrgn.starfile\n"));
}

#[test]
fn test_graph_traversal() {
    let outdir = TempDir::new().unwrap();
    tomodrgn()
        .args(&[
            "graph_traversal",
            "fixtures/embeddings_line.txt",
            "--anchors",
            "0",
            "3",
            "5",
            "--max-neighbors",
            "2",
            "--avg-neighbors",
            "2",
            "-o",
        ])
        .arg(outdir.path())
        .assert()
        .success();

    let indices = fs::read_to_string(outdir.path().join("path_particle_indices.txt")).unwrap();
    assert_eq!(indices, "0\n1\n2\n3\n4\n5\n");
    let embeddings =
        fs::read_to_string(outdir.path().join("path_particle_embeddings.txt")).unwrap();
    assert_eq!(embeddings.lines().next(), Some("0 0"));
    assert_eq!(embeddings.lines().count(), 6);
}

#[test]
fn test_graph_traversal_needs_two_anchors() {
    let outdir = TempDir::new().unwrap();
    tomodrgn()
        .args(&[
            "graph_traversal",
            "fixtures/embeddings_line.txt",
            "--anchors",
            "0",
            "-o",
        ])
        .arg(outdir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("At least 2 anchors"));
}
