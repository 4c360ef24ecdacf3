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

// Directory utilities for cross-platform data directory management

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Get the system-wide data directory for ollamadev
///
/// This function returns the appropriate data directory based on the OS:
/// - macOS: ~/.local/share/ollamadev
/// - Linux: ~/.local/share/ollamadev (following XDG Base Directory specification)
/// - Windows: %LOCALAPPDATA%/ollamadev
pub fn get_ollamadev_data_dir() -> Result<PathBuf> {
	let data_dir = match dirs::home_dir() {
		Some(home) => {
			#[cfg(target_os = "windows")]
			let path = {
				match dirs::data_local_dir() {
					Some(dir) => dir.join("ollamadev"),
					None => home.join("AppData").join("Local").join("ollamadev"),
				}
			};

			#[cfg(not(target_os = "windows"))]
			let path = home.join(".local").join("share").join("ollamadev");

			path
		}
		None => {
			return Err(anyhow::anyhow!("Unable to determine home directory"));
		}
	};

	// Ensure the directory exists
	if !data_dir.exists() {
		fs::create_dir_all(&data_dir).context(format!(
			"Failed to create ollamadev data directory: {}",
			data_dir.display()
		))?;
	}

	Ok(data_dir)
}

/// Get the configuration directory path
pub fn get_config_dir() -> Result<PathBuf> {
	let data_dir = get_ollamadev_data_dir()?;
	let config_dir = data_dir.join("config");

	if !config_dir.exists() {
		fs::create_dir_all(&config_dir)?;
	}

	Ok(config_dir)
}

/// Display information about the data directory locations
pub fn print_directory_info() -> Result<()> {
	println!("Ollamadev Data Directories:");
	println!("  Data Dir:   {}", get_ollamadev_data_dir()?.display());
	println!("  Config Dir: {}", get_config_dir()?.display());

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_get_ollamadev_data_dir() {
		let result = get_ollamadev_data_dir();
		assert!(result.is_ok());

		let path = result.unwrap();
		assert!(path.to_string_lossy().contains("ollamadev"));

		// The directory should exist after calling the function
		assert!(path.exists());
	}

	#[test]
	fn test_config_dir() {
		assert!(get_config_dir().is_ok());
	}
}
