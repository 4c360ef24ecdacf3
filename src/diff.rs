// Copyright 2025 Muvon Un Limited
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Applying model-produced unified diffs through `git apply`.

use anyhow::{anyhow, bail, Context, Result};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Validate that a diff would apply cleanly, without touching any file.
/// Runs `git apply --check -` with the diff on stdin.
pub fn check_diff(diff_text: &str, repo_root: &Path) -> Result<()> {
	run_git_apply(diff_text, repo_root, &["apply", "--check", "-"])
}

/// Apply a unified diff to the repository using `git apply`.
pub fn apply_diff(diff_text: &str, repo_root: &Path) -> Result<()> {
	run_git_apply(diff_text, repo_root, &["apply", "-"])
}

fn run_git_apply(diff_text: &str, repo_root: &Path, args: &[&str]) -> Result<()> {
	let mut child = Command::new("git")
		.args(args)
		.current_dir(repo_root)
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.spawn()
		.map_err(|e| {
			anyhow!(
				"Failed to run git (is it installed and on PATH?): {}",
				e
			)
		})?;

	child
		.stdin
		.take()
		.ok_or_else(|| anyhow!("Failed to open stdin of git"))?
		.write_all(diff_text.as_bytes())
		.context("Failed to pipe diff to git")?;

	let output = child
		.wait_with_output()
		.context("Failed to wait for git apply")?;

	if !output.status.success() {
		bail!(
			"git {} failed with code {}:\nSTDOUT:\n{}\nSTDERR:\n{}",
			args.join(" "),
			output.status.code().unwrap_or(-1),
			String::from_utf8_lossy(&output.stdout),
			String::from_utf8_lossy(&output.stderr)
		);
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use tempfile::tempdir;

	fn git_available() -> bool {
		Command::new("git").arg("--version").output().is_ok()
	}

	fn init_repo(dir: &Path) {
		let status = Command::new("git")
			.args(["init", "-q"])
			.current_dir(dir)
			.status()
			.unwrap();
		assert!(status.success());
	}

	const DIFF: &str = "--- a/hello.txt\n+++ b/hello.txt\n@@ -1,2 +1,2 @@\n hello\n-old\n+new\n";

	#[test]
	fn test_check_then_apply() {
		if !git_available() {
			return;
		}
		let dir = tempdir().unwrap();
		init_repo(dir.path());
		fs::write(dir.path().join("hello.txt"), "hello\nold\n").unwrap();

		check_diff(DIFF, dir.path()).unwrap();
		// Check must not modify the file.
		assert_eq!(fs::read_to_string(dir.path().join("hello.txt")).unwrap(), "hello\nold\n");

		apply_diff(DIFF, dir.path()).unwrap();
		assert_eq!(fs::read_to_string(dir.path().join("hello.txt")).unwrap(), "hello\nnew\n");
	}

	#[test]
	fn test_invalid_diff_reports_git_output() {
		if !git_available() {
			return;
		}
		let dir = tempdir().unwrap();
		init_repo(dir.path());
		fs::write(dir.path().join("hello.txt"), "completely different\n").unwrap();

		let err = check_diff(DIFF, dir.path()).unwrap_err();
		assert!(err.to_string().contains("git apply --check - failed"));
		assert!(apply_diff(DIFF, dir.path()).is_err());
	}
}
