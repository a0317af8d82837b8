// Drives the compiled binary end to end. Every test points --store and
// --config into a temp dir so the user's session log is never touched.
use assert_cmd::Command;
use tempfile::tempdir;

fn readalong(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("readalong").unwrap();
    cmd.arg("--store")
        .arg(dir.join("sessions.db"))
        .arg("--config")
        .arg(dir.join("config.json"));
    cmd
}

#[test]
fn compare_reports_statuses_and_feedback() {
    let dir = tempdir().unwrap();
    let output = readalong(dir.path())
        .args(["compare", "--text", "The quick brown fox", "--spoken", "the quik brown"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("incorrect  quick"));
    assert!(stdout.contains("skipped    fox"));
    assert!(stdout.contains("The word \"quick\" was a bit tricky."));
}

#[test]
fn compare_json_output_parses() {
    let dir = tempdir().unwrap();
    let output = readalong(dir.path())
        .args(["compare", "-t", "the cat sat", "-s", "the cat", "--json"])
        .output()
        .unwrap();

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value[2]["word"], "sat");
    assert_eq!(value[2]["status"], "skipped");
}

#[test]
fn locate_prints_word_not_separator() {
    let dir = tempdir().unwrap();
    let output = readalong(dir.path())
        .args(["locate", "--text", "Hello world foo", "--offset", "6"])
        .output()
        .unwrap();

    assert_eq!(String::from_utf8(output.stdout).unwrap(), "2\tworld\n");
}

#[test]
fn simulate_then_summarize_and_export() {
    let dir = tempdir().unwrap();

    let output = readalong(dir.path())
        .args(["simulate", "--text", "one two three four", "--wpm", "120"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("4 words loaded"));
    assert!(stdout.contains("(120 wpm)"));

    let output = readalong(dir.path())
        .args(["sessions", "--json"])
        .output()
        .unwrap();
    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["sessions"], 1);
    assert_eq!(summary["total_words"], 4);

    let csv_path = dir.path().join("sessions.csv");
    readalong(dir.path())
        .args(["export", "--output"])
        .arg(&csv_path)
        .assert()
        .success();
    let csv = std::fs::read_to_string(csv_path).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("start,end,total_words,total_secs,wpm"));
    assert!(lines.next().unwrap().ends_with(",4,2.00,120.00"));
}

#[test]
fn simulate_rejects_non_positive_rate() {
    let dir = tempdir().unwrap();
    readalong(dir.path())
        .args(["simulate", "--text", "hi", "--wpm", "0"])
        .assert()
        .failure();
}

#[test]
fn simulate_rejects_vanishingly_slow_rate() {
    let dir = tempdir().unwrap();
    let output = readalong(dir.path())
        .args(["simulate", "--text", "a b", "--wpm", "1e-300"])
        .output()
        .unwrap();

    // error return exits 1; a panic would exit 101
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("InvalidRate"));
}
