//! Binary-level replay tests

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tempfile::TempDir;

const RUN: &str = concat!(
    "event: status\n",
    "data: {\"node\":\"generator\",\"status\":\"start\"}\n\n",
    "event: message\n",
    "data: {\"message_id\":\"m1\",\"type\":\"function_call\",\"content\":\"start\",\"is_finish\":false,\"extra_info\":{\"call_id\":\"c1\"}}\n\n",
    "event: delta\n",
    "data: {\"channel\":\"answer\",\"content\":\"hello\"}\n\n",
    "event: message\n",
    "data: {\"message_id\":\"m2\",\"type\":\"tool_response\",\"content\":\"done\",\"is_finish\":true,\"extra_info\":{\"call_id\":\"c1\"}}\n\n",
    "event: message\n",
    "data: {broken\n\n",
    "event: card\n",
    "data: {\"card_type\":\"file_create\"}\n\n",
);

struct CliResult {
    success: bool,
    stdout: String,
    stderr: String,
}

/// Wrapper around the built `bops` binary
struct BopsCli {
    bin: PathBuf,
    output_format: Option<String>,
    envs: Vec<(String, String)>,
}

impl BopsCli {
    fn new() -> Self {
        Self {
            bin: PathBuf::from(env!("CARGO_BIN_EXE_bops")),
            output_format: None,
            envs: Vec::new(),
        }
    }

    fn with_env(mut self, key: &str, value: &str) -> Self {
        self.envs.push((key.to_string(), value.to_string()));
        self
    }

    fn with_output_format(mut self, format: &str) -> Self {
        self.output_format = Some(format.to_string());
        self
    }

    fn run(&self, args: &[&str], stdin: Option<&str>) -> CliResult {
        let mut cmd = Command::new(&self.bin);
        if let Some(format) = &self.output_format {
            cmd.arg("--output").arg(format);
        }
        cmd.args(args)
            .env_remove("RUST_LOG")
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().expect("spawn bops");
        {
            let mut pipe = child.stdin.take().expect("stdin pipe");
            if let Some(input) = stdin {
                pipe.write_all(input.as_bytes()).expect("write stdin");
            }
        }
        let output = child.wait_with_output().expect("wait for bops");
        CliResult {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

fn write_capture(dir: &TempDir, raw: &str) -> PathBuf {
    let path = dir.path().join("run.sse");
    std::fs::write(&path, raw).unwrap();
    path
}

#[test]
fn test_replay_file_minimal() {
    let dir = TempDir::new().unwrap();
    let path = write_capture(&dir, RUN);
    let result = BopsCli::new()
        .with_output_format("minimal")
        .run(&["replay", path.to_str().unwrap()], None);
    assert!(result.success, "stderr: {}", result.stderr);
    assert_eq!(
        result.stdout.trim(),
        "entries=3 applied=4 ignored=1 dropped=1"
    );
}

#[test]
fn test_replay_stdin_pretty() {
    let result = BopsCli::new().run(&["replay", "-"], Some(RUN));
    assert!(result.success, "stderr: {}", result.stderr);
    assert!(result.stdout.contains("hello"));
    assert!(result.stdout.contains("file_create"));
}

#[test]
fn test_replay_json_report() {
    let result = BopsCli::new()
        .with_output_format("json")
        .run(&["replay"], Some(RUN));
    assert!(result.success, "stderr: {}", result.stderr);
    let report: serde_json::Value = serde_json::from_str(&result.stdout).unwrap();
    assert_eq!(report["entries"].as_array().unwrap().len(), 3);
    assert_eq!(report["last_status"]["node"], "generator");
    assert_eq!(report["stats"]["dropped"], 1);
}

#[test]
fn test_replay_missing_file_fails() {
    let result = BopsCli::new().run(&["replay", "/nonexistent/run.sse"], None);
    assert!(!result.success);
    assert!(result.stderr.contains("Input error"));
}

#[test]
fn test_config_respects_env_override() {
    let result = BopsCli::new()
        .with_output_format("json")
        .with_env("BOPS_STEP_LABEL", "tool")
        .run(&["config"], None);
    assert!(result.success, "stderr: {}", result.stderr);
    let config: serde_json::Value = serde_json::from_str(&result.stdout).unwrap();
    assert_eq!(config["step_label"], "tool");
    assert_eq!(config["rotate_on_result"], true);
}
