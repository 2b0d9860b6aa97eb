use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::OnceLock;

use telepath_testkit::{fixture_path as shared_fixture_path, target_dir as workspace_target_dir};

static TELEPATH_BIN: OnceLock<PathBuf> = OnceLock::new();

pub(crate) fn fixture_path(name: &str) -> PathBuf {
	shared_fixture_path(name)
}

pub(crate) fn fixture_arg(name: &str) -> String {
	fixture_path(name).display().to_string()
}

pub(crate) fn run_telepath(args: &[&str]) -> Output {
	Command::new(telepath_bin()).args(args).output().expect("telepath command executes")
}

pub(crate) fn run_telepath_stdout(args: &[&str]) -> String {
	let output = run_telepath(args);
	assert!(
		output.status.success(),
		"telepath command failed with status={}: {}",
		output.status,
		String::from_utf8_lossy(&output.stderr)
	);
	String::from_utf8(output.stdout).expect("stdout should be utf-8")
}

pub(crate) fn run_telepath_json(args: &[&str]) -> serde_json::Value {
	let stdout = run_telepath_stdout(args);
	serde_json::from_str(&stdout).expect("stdout should be valid json")
}

fn telepath_bin() -> &'static PathBuf {
	TELEPATH_BIN.get_or_init(resolve_telepath_bin)
}

fn resolve_telepath_bin() -> PathBuf {
	if let Ok(path) = std::env::var("CARGO_BIN_EXE_telepath") {
		return PathBuf::from(path);
	}

	let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
	let target_dir = workspace_target_dir();

	let mut bin = target_dir.join("debug");
	bin.push(if cfg!(windows) { "telepath.exe" } else { "telepath" });

	let status = Command::new("cargo")
		.current_dir(&manifest_dir)
		.args(["build", "--quiet", "--bin", "telepath"])
		.status()
		.expect("cargo build executes");
	assert!(status.success(), "failed to build telepath binary at {}", bin.display());

	bin
}
