//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own data directory.

use std::path::Path;
use std::process::{Command, Stdio};

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_mindful"))
        .args(args)
        .env("MINDFUL_DATA_DIR", data_dir)
        .env_remove("MINDFUL_LOG")
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn json_lines(stdout: &str) -> Vec<serde_json::Value> {
    stdout
        .lines()
        .filter(|line| line.starts_with('{'))
        .map(|line| serde_json::from_str(line).expect("JSON line"))
        .collect()
}

#[test]
fn test_quote() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["quote"]);
    assert_eq!(code, 0, "quote failed");
    assert!(stdout.contains("--"));
}

#[test]
fn test_quote_all_json() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["quote", "--all", "--json"]);
    assert_eq!(code, 0);
    let quotes: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let quotes = quotes.as_array().unwrap();
    assert!(quotes.len() > 1);
    assert!(quotes.iter().all(|q| q["text"].is_string() && q["author"].is_string()));
}

#[test]
fn test_config_get_set() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "timer.default_duration_secs"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "300");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "audio.default_theme", "rain"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "audio.default_theme"]);
    assert_eq!(stdout.trim(), "rain");
}

#[test]
fn test_config_rejects_unknown_key() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "get", "timer.nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "audio.default_theme", "thunder"]);
    assert_eq!(code, 1);
}

#[test]
fn test_config_path_and_list() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "path"]);
    assert_eq!(code, 0);
    assert!(stdout.trim().ends_with("config.toml"));

    let (stdout, _, code) = run_cli(dir.path(), &["config", "list"]);
    assert_eq!(code, 0);
    let config: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(config["worker"]["app_name"], "mindful-moments");
}

#[test]
fn test_settings_round_trip() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["settings", "show", "--json"]);
    assert_eq!(code, 0);
    let settings: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(settings["vibration"], true);

    let (_, _, code) = run_cli(dir.path(), &["settings", "set", "vibration", "false"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(dir.path(), &["settings", "show", "--json"]);
    let settings: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(settings["vibration"], false);
    assert_eq!(settings["notificationSound"], true);
}

#[test]
fn test_settings_unknown_key() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["settings", "set", "volume", "true"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error: Unknown setting: volume"));
}

#[test]
fn test_render_theme_wav() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("rain.wav");
    let (stdout, _, code) = run_cli(
        dir.path(),
        &["render", "rain", "--seconds", "0.5", "--seed", "7", "--out", out.to_str().unwrap()],
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("rendered rain: 0.50s at 44100 Hz"));

    let bytes = std::fs::read(&out).unwrap();
    assert_eq!(&bytes[..4], b"RIFF");
    // 0.5s of 16-bit mono at 44.1 kHz plus the header.
    assert!(bytes.len() > 22_050 * 2);
}

#[test]
fn test_render_low_sample_rate() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("rain-16.wav");
    let (stdout, stderr, code) = run_cli(
        dir.path(),
        &["render", "rain", "--seconds", "1", "--sample-rate", "16", "--out", out.to_str().unwrap()],
    );
    assert_eq!(code, 0, "render failed: {stderr}");
    assert!(stdout.contains("at 16 Hz"));
    assert!(out.exists());
}

#[test]
fn test_render_chime_stops_when_tone_ends() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("chime.wav");
    let (stdout, _, code) = run_cli(
        dir.path(),
        &["render", "--chime", "--seconds", "2", "--out", out.to_str().unwrap()],
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("rendered chime: 0.30s"));
}

#[test]
fn test_completions() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("mindful"));
}

#[test]
fn test_timer_presets() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["timer", "presets", "--json"]);
    assert_eq!(code, 0);
    let presets: Vec<u32> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(presets, vec![300, 600, 900, 1200, 1800]);
}

#[test]
fn test_timer_run_once() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["config", "set", "timer.auto_reset_delay_secs", "0"]);
    assert_eq!(code, 0);

    let (stdout, stderr, code) = run_cli(dir.path(), &["timer", "run", "--once", "--duration", "1", "--json"]);
    assert_eq!(code, 0, "timer run failed: {stderr}");

    let types: Vec<String> = json_lines(&stdout)
        .iter()
        .map(|event| event["type"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(
        types,
        vec![
            "QuoteShown",
            "StateSnapshot",
            "TimerStarted",
            "TimerCompleted",
            "TimerReset",
            "QuoteShown"
        ]
    );
}

#[test]
fn test_worker_get_version() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["worker", "message", r#"{"type":"GET_VERSION"}"#]);
    assert_eq!(code, 0);
    let lines = json_lines(&stdout);
    assert_eq!(lines[0]["effect"], "reply");
    assert_eq!(lines[0]["version"], "mindful-moments-v1.0.0");
    assert_eq!(lines[1]["state"], "parsed");
}

#[test]
fn test_worker_notification_click_opens_autostart() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["worker", "click", "--action", "start-meditation"]);
    assert_eq!(code, 0);
    let lines = json_lines(&stdout);
    assert_eq!(lines[0]["effect"], "close_notification");
    assert_eq!(lines[1]["effect"], "open_window");
    assert_eq!(lines[1]["url"], "http://localhost:8080/index.html?autostart=true");
}

#[test]
fn test_worker_fetch_passes_through_before_install() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["worker", "fetch", "/index.html"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("not handled by the worker"));
}

#[test]
fn test_worker_rejects_unknown_message() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["worker", "message", r#"{"type":"SELF_DESTRUCT"}"#]);
    assert_eq!(code, 1);
}
