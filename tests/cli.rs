use std::path::PathBuf;
use std::process::Command;

fn write_temp(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("qoe-cli-{}-{}", std::process::id(), name));
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_scores_stats_files() {
    let v2 = write_temp(
        "perfect.json",
        r#"{"schema": "v2", "stalls": {"totalCount": 0, "totalDuration": 0},
            "startupDelay": 0, "level": {"lowest": {"width": 1920, "height": 1080}}}"#,
    );
    let v1 = write_temp(
        "legacy.json",
        r#"{"schema": "v1", "stallsCount": 5, "stallsDuration": 20000, "startupDelay": 8000,
            "level": {"width": 1280, "height": 720}}"#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_qoe-score"))
        .arg(&v2)
        .arg(&v1)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);

    let perfect = lines[0]["score"]["total"].as_f64().unwrap();
    assert!((perfect - 0.88).abs() < 1e-9);

    // 0.5 startup, 720p, 0.25 * e^-10 stalls
    let expected = (0.5 + 2.0 * 0.5 + 2.0 * 0.25 * (-10.0f64).exp()) / 5.0;
    let legacy = lines[1]["score"]["total"].as_f64().unwrap();
    assert!((legacy - expected).abs() < 1e-9);
    assert_eq!(lines[1]["score"]["tier"], "720p");
}

#[test]
fn test_invalid_stats_fail_the_run() {
    let bad = write_temp(
        "negative.json",
        r#"{"schema": "v2", "stalls": {"totalCount": -1, "totalDuration": 0}}"#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_qoe-score"))
        .arg(&bad)
        .output()
        .unwrap();
    assert!(!output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let line: serde_json::Value = serde_json::from_str(stdout.lines().next().unwrap()).unwrap();
    assert!(line["error"].as_str().unwrap().contains("stall count"));
}

#[test]
fn test_uppercase_extension_is_a_stats_file() {
    let upper = write_temp(
        "UPPER.JSON",
        r#"{"schema": "v2", "stalls": {"totalCount": 0, "totalDuration": 0},
            "startupDelay": 0, "level": {"lowest": {"width": 1920, "height": 1080}}}"#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_qoe-score"))
        .arg(&upper)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).unwrap();
    let line: serde_json::Value = serde_json::from_str(stdout.lines().next().unwrap()).unwrap();
    assert!((line["score"]["total"].as_f64().unwrap() - 0.88).abs() < 1e-9);
}
