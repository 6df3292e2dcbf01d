//! End-to-end grading through the CLI binary.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use bubblegrade_core::{AnswerKey, KeyQuestion};
use bubblegrade_test_support::SheetBuilder;
use predicates::prelude::*;
use std::path::Path;

fn bubblegrade(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("bubblegrade").expect("binary built");
    cmd.env("XDG_CONFIG_HOME", workdir)
        .env("XDG_DATA_HOME", workdir)
        .env("HOME", workdir)
        .current_dir(workdir);
    cmd
}

fn write_key(dir: &Path, quiz_id: &str) {
    let key = AnswerKey {
        quiz_id: quiz_id.to_string(),
        title: "Algebra".to_string(),
        questions: (0..10).map(|q| KeyQuestion::single(q % 5)).collect(),
    };
    let json = serde_json::to_string(&key).expect("serialize key");
    std::fs::write(dir.join(format!("{quiz_id}.json")), json).expect("write key");
}

fn write_sheet(dir: &Path, quiz_id: &str, correct: usize) {
    let mut builder = SheetBuilder::new(quiz_id);
    for q in 0..correct {
        builder = builder.mark(q, [q % 5]);
    }
    let photo = builder.render_photo(100);
    photo
        .save(dir.join(format!("{quiz_id}.png")))
        .expect("save sheet");
}

#[test]
fn test_grades_a_directory_of_sheets() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let keys = tmp.path().join("keys");
    let sheets = tmp.path().join("sheets");
    std::fs::create_dir_all(&keys).expect("mkdir");
    std::fs::create_dir_all(&sheets).expect("mkdir");
    write_key(&keys, "quiz-1");
    write_sheet(&sheets, "quiz-1", 10);

    bubblegrade(tmp.path())
        .arg("grade")
        .arg(&sheets)
        .arg("--keys")
        .arg(&keys)
        .arg("--no-id")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"quiz_id\":\"quiz-1\""))
        .stdout(predicate::str::contains("\"correct\":10"));
}

#[test]
fn test_missing_key_yields_failure_record_and_exit_one() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let keys = tmp.path().join("keys");
    let sheets = tmp.path().join("sheets");
    std::fs::create_dir_all(&keys).expect("mkdir");
    std::fs::create_dir_all(&sheets).expect("mkdir");
    write_sheet(&sheets, "quiz-unknown", 3);

    bubblegrade(tmp.path())
        .arg("grade")
        .arg(&sheets)
        .arg("--keys")
        .arg(&keys)
        .arg("--no-id")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("answer_key_not_found"));
}

#[test]
fn test_json_array_format() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let keys = tmp.path().join("keys");
    let sheets = tmp.path().join("sheets");
    std::fs::create_dir_all(&keys).expect("mkdir");
    std::fs::create_dir_all(&sheets).expect("mkdir");
    write_key(&keys, "quiz-2");
    write_sheet(&sheets, "quiz-2", 7);

    bubblegrade(tmp.path())
        .arg("grade")
        .arg(&sheets)
        .arg("--keys")
        .arg(&keys)
        .args(["--no-id", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("["));
}

#[test]
fn test_unreadable_photo_is_reported_not_fatal() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let keys = tmp.path().join("keys");
    let sheets = tmp.path().join("sheets");
    std::fs::create_dir_all(&keys).expect("mkdir");
    std::fs::create_dir_all(&sheets).expect("mkdir");
    std::fs::write(sheets.join("broken.png"), b"not a png").expect("write");

    bubblegrade(tmp.path())
        .arg("grade")
        .arg(&sheets)
        .arg("--keys")
        .arg(&keys)
        .arg("--no-id")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("invalid_image"));
}
