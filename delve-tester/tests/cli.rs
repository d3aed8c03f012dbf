use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "delve-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_writes_json_report() {
    let exe = env!("CARGO_BIN_EXE_delve-tester");
    let output_path = temp_path("json");
    let status = Command::new(exe)
        .args(["--days", "3", "--seed", "9", "--strategy", "greedy"])
        .args(["--report", "json", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(&output_path).expect("read output");
    let report: serde_json::Value = serde_json::from_str(&content).expect("json report");
    assert_eq!(report["strategy"], "greedy");
    assert_eq!(report["runs"].as_array().map(Vec::len), Some(3));
    assert_eq!(report["statistics"]["attempted"], 3);
    let _ = std::fs::remove_file(output_path);
}

#[test]
fn cli_store_carries_progress_between_invocations() {
    let exe = env!("CARGO_BIN_EXE_delve-tester");
    let store_path = temp_path("store");
    for (start, expected_attempted) in [("2024-03-01", 2), ("2024-03-03", 4)] {
        let output = Command::new(exe)
            .args(["--days", "2", "--start-date", start, "--report", "json", "--store"])
            .arg(&store_path)
            .output()
            .expect("run cli");
        assert!(output.status.success());
        let report: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("json on stdout");
        assert_eq!(report["progression"]["total_runs_attempted"], expected_attempted);
    }
    let _ = std::fs::remove_file(store_path);
}

#[test]
fn cli_console_report_shows_banner() {
    let exe = env!("CARGO_BIN_EXE_delve-tester");
    let output = Command::new(exe)
        .args(["--days", "1", "--strategy", "cautious"])
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Stepdelve Automated Tester"));
    assert!(stdout.contains("Lifetime Progress"));
}

#[test]
fn cli_rejects_bad_start_date() {
    let exe = env!("CARGO_BIN_EXE_delve-tester");
    let output = Command::new(exe)
        .args(["--start-date", "2024-13-40"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid --start-date"));
}
