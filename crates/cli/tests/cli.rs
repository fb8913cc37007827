//! CLI integration tests: run the `spcf` binary against a temp project root.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

const REPLY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<synai>
  <concept><id>c1</id><content>avoids conflict</content><harris_area>C</harris_area><weight>0.7</weight></concept>
  <concept><id>c2</id><content>values family</content><harris_area>D</harris_area><weight>0.4</weight></concept>
</synai>"#;

fn spcf(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("spcf").unwrap();
    cmd.arg("--root")
        .arg(root)
        .env_remove("SPCF_DATA_DIR")
        .env_remove("SPCF_DB_PATH")
        .env_remove("SPCF_BASE_PROMPTS_DIR")
        .env_remove("RUST_LOG");
    cmd
}

fn user_id_from(stdout: &[u8]) -> String {
    let text = String::from_utf8_lossy(stdout);
    text.lines()
        .find_map(|l| l.split("User created with ID: ").nth(1))
        .map(|id| id.trim().to_string())
        .unwrap()
}

#[test]
fn help_lists_commands() {
    Command::cargo_bin("spcf")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("onboard"))
        .stdout(predicate::str::contains("seed"));
}

#[test]
fn init_creates_project_layout() {
    let tmp = tempfile::tempdir().unwrap();
    spcf(tmp.path()).arg("init").assert().success();

    assert!(tmp.path().join("spcf.toml").is_file());
    assert!(tmp.path().join("base_prompts/synai_assessment.xml").is_file());
    assert!(tmp.path().join("base_prompts/synai_designer.xml").is_file());
    assert!(tmp.path().join("data/users").is_dir());
    assert!(tmp.path().join("data/spcf.db").is_file());

    // Idempotent
    spcf(tmp.path()).arg("init").assert().success();
}

#[test]
fn onboard_then_seed_then_export() {
    let tmp = tempfile::tempdir().unwrap();
    spcf(tmp.path()).arg("init").assert().success();

    let out = spcf(tmp.path())
        .args(["onboard", "jane@example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Assessment prompt generated"))
        .get_output()
        .stdout
        .clone();
    let user_id = user_id_from(&out);

    let notes = tmp.path().join("notes.md");
    std::fs::write(&notes, "Wants calmer mornings").unwrap();
    spcf(tmp.path())
        .args(["context", &user_id])
        .arg(&notes)
        .assert()
        .success();

    spcf(tmp.path())
        .args(["prepare", &user_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("### Context from notes.md ###"))
        .stdout(predicate::str::contains("Wants calmer mornings"));

    let reply = tmp.path().join("reply.xml");
    std::fs::write(&reply, REPLY).unwrap();
    let out = spcf(tmp.path())
        .args(["seed", &user_id])
        .arg(&reply)
        .arg("--extract-data")
        .assert()
        .success()
        .stdout(predicate::str::contains("area_summary_stats"))
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8_lossy(&out);
    let seed_path = text
        .lines()
        .find_map(|l| l.split("Saved to: ").nth(1))
        .unwrap()
        .trim()
        .to_string();

    spcf(tmp.path())
        .args(["export", &user_id, &seed_path])
        .assert()
        .success()
        .stdout(predicate::str::contains("seed_export_"));

    spcf(tmp.path())
        .args(["history", &user_id, "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SEED_PROMPT_GENERATED"))
        .stdout(predicate::str::contains("CONTEXT_FILES_ADDED"))
        .stdout(predicate::str::contains("SEED_EXPORTED"))
        .stdout(predicate::str::contains("PENDING_EXTERNAL"));

    spcf(tmp.path())
        .args(["users", "--detailed"])
        .assert()
        .success()
        .stdout(predicate::str::contains(user_id.as_str()))
        .stdout(predicate::str::contains("jane@example.com"));
}

#[test]
fn invalid_reply_fails_and_is_recorded() {
    let tmp = tempfile::tempdir().unwrap();
    spcf(tmp.path()).arg("init").assert().success();
    let out = spcf(tmp.path())
        .args(["onboard", "sam", "--with-context"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let user_id = user_id_from(&out);

    let reply = tmp.path().join("bad.xml");
    std::fs::write(&reply, "<html>nope</html>").unwrap();
    spcf(tmp.path())
        .args(["seed", &user_id])
        .arg(&reply)
        .assert()
        .failure();

    spcf(tmp.path())
        .args(["history", &user_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("SEED_GENERATION_FAILED"));
}

#[test]
fn unknown_user_fails() {
    let tmp = tempfile::tempdir().unwrap();
    spcf(tmp.path()).arg("init").assert().success();
    spcf(tmp.path())
        .args(["prepare", "0000000000000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn users_on_empty_project() {
    let tmp = tempfile::tempdir().unwrap();
    spcf(tmp.path()).arg("init").assert().success();
    spcf(tmp.path())
        .arg("users")
        .assert()
        .success()
        .stdout(predicate::str::contains("No users found"));
}
