//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const PAPER: &str = "papers/sample.json";

fn exam() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("exam").unwrap();
    cmd.env_remove("EXAM_DB_URL")
        .env_remove("EXAM_RESULT_SINK_URL")
        .env_remove("EXAM_TICK_MS")
        .env_remove("EXAM_DELIVERY_TIMEOUT_MS");
    cmd
}

fn db_url(dir: &TempDir) -> String {
    format!("sqlite://{}", dir.path().join("exam.sqlite3").display())
}

fn take(dir: &TempDir, script: &str) -> assert_cmd::assert::Assert {
    exam()
        .args(["take", "--paper", PAPER, "--candidate-id", "JEE-1", "--name", "Asha"])
        .args(["--db", &db_url(dir)])
        .write_stdin(script)
        .assert()
}

#[test]
fn export_prints_question_paper() {
    exam()
        .args(["export", "--paper", PAPER])
        .assert()
        .success()
        .stdout(predicate::str::contains("QUESTION PAPER: Sample Mock Test"))
        .stdout(predicate::str::contains("Duration: 10 minutes"))
        .stdout(predicate::str::contains("   B. Newton"))
        .stdout(predicate::str::contains("   [image: img/leaf.png]"))
        .stdout(predicate::str::contains("   Answer: ________"));
}

#[test]
fn export_writes_answer_key_to_file() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("key.txt");

    exam()
        .args(["export", "--paper", PAPER, "--answer-key", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));

    let key = std::fs::read_to_string(output).unwrap();
    assert_eq!(key, "ANSWER KEY\n1. B\n2. A, C\n3. 6\n4. C\n");
}

#[test]
fn export_rejects_missing_paper() {
    exam()
        .args(["export", "--paper", "papers/nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn take_submit_and_show_result() {
    let dir = TempDir::new().unwrap();

    take(&dir, "a B\nn\na A, C\nn\na 6\nsubmit\n")
        .success()
        .stdout(predicate::str::contains("Exam submitted."))
        .stdout(predicate::str::contains("Total Score: 11"))
        .stdout(predicate::str::contains("Q4 - UNATTEMPTED | Marks: 0"));

    exam()
        .args(["result", "--paper", PAPER, "--candidate-id", "JEE-1"])
        .args(["--db", &db_url(&dir)])
        .assert()
        .success()
        .stdout(predicate::str::contains("(manual)"))
        .stdout(predicate::str::contains("Total Score: 11"))
        .stdout(predicate::str::contains("   Your Answer: A, C"));

    take(&dir, "a C\n")
        .success()
        .stdout(predicate::str::contains("already been submitted"))
        .stdout(predicate::str::contains("Total Score: 11"));
}

#[test]
fn quit_saves_progress_for_resume() {
    let dir = TempDir::new().unwrap();

    take(&dir, "a B\nr\nq\n")
        .success()
        .stdout(predicate::str::contains("Progress saved"));

    take(&dir, "q\n")
        .success()
        .stdout(predicate::str::contains("   (x) B. Newton"))
        .stdout(predicate::str::contains("(marked for review)"));
}

#[test]
fn bad_input_is_reported_and_ignored() {
    let dir = TempDir::new().unwrap();

    take(&dir, "jump\na Z\nq\n")
        .success()
        .stderr(predicate::str::contains("unknown command: jump"))
        .stderr(predicate::str::contains("option 25 is out of range"));
}

#[test]
fn result_without_submission_fails() {
    let dir = TempDir::new().unwrap();

    exam()
        .args(["result", "--paper", PAPER, "--candidate-id", "JEE-9"])
        .args(["--db", &db_url(&dir)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no submitted exam for candidate JEE-9"));
}
