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

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum LogLevel {
	#[serde(rename = "none")]
	None,
	#[serde(rename = "info")]
	Info,
	#[serde(rename = "debug")]
	Debug,
}

impl Default for LogLevel {
	fn default() -> Self {
		Self::None
	}
}

impl LogLevel {
	/// Check if info logging is enabled
	pub fn is_info_enabled(&self) -> bool {
		matches!(self, LogLevel::Info | LogLevel::Debug)
	}

	/// Check if debug logging is enabled
	pub fn is_debug_enabled(&self) -> bool {
		matches!(self, LogLevel::Debug)
	}
}

// Default functions
fn default_model() -> String {
	"llama3.2:3b".to_string()
}

fn default_base_url() -> String {
	"http://localhost:11434".to_string()
}

fn default_timeout_seconds() -> u64 {
	360 // Local models can be slow on large prompts
}

fn default_temperature() -> f32 {
	0.2
}

fn default_index_filename() -> String {
	"class_index.json".to_string()
}

fn default_folder_metadata_filename() -> String {
	"metadata.json".to_string()
}

fn default_top_k() -> usize {
	12
}

/// Connection settings for the Ollama-compatible backend.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OllamaConfig {
	#[serde(default = "default_model")]
	pub model: String,

	#[serde(default = "default_base_url")]
	pub base_url: String,

	#[serde(default = "default_timeout_seconds")]
	pub timeout_seconds: u64,

	#[serde(default = "default_temperature")]
	pub temperature: f32,

	/// Optional cap on generated tokens; None or 0 leaves the model default.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub max_tokens: Option<u32>,

	/// Extra backend options forwarded verbatim with every request.
	#[serde(default, skip_serializing_if = "HashMap::is_empty")]
	pub options: HashMap<String, serde_json::Value>,
}

impl Default for OllamaConfig {
	fn default() -> Self {
		Self {
			model: default_model(),
			base_url: default_base_url(),
			timeout_seconds: default_timeout_seconds(),
			temperature: default_temperature(),
			max_tokens: None,
			options: HashMap::new(),
		}
	}
}

/// Main configuration, loaded from TOML with env overrides on top.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
	#[serde(default)]
	pub log_level: LogLevel,

	/// File name of the flat workspace index, relative to the workspace root.
	#[serde(default = "default_index_filename")]
	pub index_filename: String,

	/// File name of the per-folder metadata files in the hierarchical index.
	#[serde(default = "default_folder_metadata_filename")]
	pub folder_metadata_filename: String,

	/// How many scored index entries feed the question-answering context.
	#[serde(default = "default_top_k")]
	pub top_k: usize,

	#[serde(default)]
	pub ollama: OllamaConfig,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			log_level: LogLevel::default(),
			ollama: OllamaConfig::default(),
			index_filename: default_index_filename(),
			folder_metadata_filename: default_folder_metadata_filename(),
			top_k: default_top_k(),
		}
	}
}

impl Config {
	/// Path of the user-level config file.
	pub fn config_path() -> Result<PathBuf> {
		Ok(crate::directories::get_config_dir()?.join("config.toml"))
	}

	/// Load config from the user config file, or defaults when it does not
	/// exist. `LLM_BASE_URL` and `LLM_MODEL` env vars override the file.
	pub fn load() -> Result<Self> {
		let path = Self::config_path()?;
		let mut config = if path.exists() {
			let raw = fs::read_to_string(&path)
				.context(format!("Failed to read config file: {}", path.display()))?;
			toml::from_str(&raw)
				.context(format!("Invalid config file: {}", path.display()))?
		} else {
			Self::default()
		};
		config.apply_env_overrides();
		Ok(config)
	}

	fn apply_env_overrides(&mut self) {
		if let Ok(base_url) = std::env::var("LLM_BASE_URL") {
			if !base_url.is_empty() {
				self.ollama.base_url = base_url;
			}
		}
		if let Ok(model) = std::env::var("LLM_MODEL") {
			if !model.is_empty() {
				self.ollama.model = model;
			}
		}
	}

	/// Write the config back to the user config file as TOML.
	pub fn save(&self) -> Result<()> {
		let path = Self::config_path()?;
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).context(format!(
				"Failed to create config directory: {}",
				parent.display()
			))?;
		}
		let serialized = toml::to_string_pretty(self).context("Failed to serialize config")?;
		fs::write(&path, serialized)
			.context(format!("Failed to write config file: {}", path.display()))
	}

	/// Create the config file with defaults if it does not exist yet.
	/// Returns the path either way.
	pub fn create_default_config() -> Result<PathBuf> {
		let path = Self::config_path()?;
		if !path.exists() {
			Self::default().save()?;
		}
		Ok(path)
	}

	/// Get the global log level (system-wide setting)
	pub fn get_log_level(&self) -> LogLevel {
		self.log_level.clone()
	}
}

// Logging macros for different log levels
// These macros automatically check the current log level and only print if appropriate

thread_local! {
	static CURRENT_CONFIG: RefCell<Option<Config>> = const { RefCell::new(None) };
}

/// Set the current config for the thread (to be used by logging macros)
pub fn set_thread_config(config: &Config) {
	CURRENT_CONFIG.with(|c| {
		*c.borrow_mut() = Some(config.clone());
	});
}

/// Get the current config for the thread
pub fn with_thread_config<F, R>(f: F) -> Option<R>
where
	F: FnOnce(&Config) -> R,
{
	CURRENT_CONFIG.with(|c| (*c.borrow()).as_ref().map(f))
}

/// Info logging macro with automatic cyan coloring
/// Shows info messages when log level is Info OR Debug
#[macro_export]
macro_rules! log_info {
	($fmt:expr) => {
		if let Some(should_log) = $crate::config::with_thread_config(|config| config.get_log_level().is_info_enabled()) {
		if should_log {
		use colored::Colorize;
		println!("{}", $fmt.cyan());
		}
		}
	};
	($fmt:expr, $($arg:expr),*) => {
		if let Some(should_log) = $crate::config::with_thread_config(|config| config.get_log_level().is_info_enabled()) {
		if should_log {
		use colored::Colorize;
	println!("{}", format!($fmt, $($arg),*).cyan());
	}
	}
	};
}

/// Debug logging macro with automatic bright blue coloring
#[macro_export]
macro_rules! log_debug {
	($fmt:expr) => {
		if let Some(should_log) = $crate::config::with_thread_config(|config| config.get_log_level().is_debug_enabled()) {
		if should_log {
		use colored::Colorize;
		println!("{}", $fmt.bright_blue());
		}
		}
	};
	($fmt:expr, $($arg:expr),*) => {
		if let Some(should_log) = $crate::config::with_thread_config(|config| config.get_log_level().is_debug_enabled()) {
		if should_log {
		use colored::Colorize;
	println!("{}", format!($fmt, $($arg),*).bright_blue());
	}
	}
	};
}

/// Error logging macro with automatic bright red coloring
/// Always visible regardless of log level (errors should always be shown)
#[macro_export]
macro_rules! log_error {
	($fmt:expr) => {{
		use colored::Colorize;
		eprintln!("{}", $fmt.bright_red());
		}};
	($fmt:expr, $($arg:expr),*) => {{
		use colored::Colorize;
		eprintln!("{}", format!($fmt, $($arg),*).bright_red());
		}};
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config = Config::default();
		assert_eq!(config.ollama.model, "llama3.2:3b");
		assert_eq!(config.ollama.base_url, "http://localhost:11434");
		assert_eq!(config.ollama.timeout_seconds, 360);
		assert_eq!(config.ollama.temperature, 0.2);
		assert!(config.ollama.max_tokens.is_none());
		assert_eq!(config.index_filename, "class_index.json");
		assert_eq!(config.folder_metadata_filename, "metadata.json");
		assert_eq!(config.top_k, 12);
		assert_eq!(config.log_level, LogLevel::None);
	}

	#[test]
	fn test_partial_toml_fills_defaults() {
		let config: Config = toml::from_str(
			r#"
log_level = "debug"

[ollama]
model = "qwen2.5-coder:7b"
"#,
		)
		.unwrap();
		assert_eq!(config.log_level, LogLevel::Debug);
		assert_eq!(config.ollama.model, "qwen2.5-coder:7b");
		assert_eq!(config.ollama.base_url, "http://localhost:11434");
		assert_eq!(config.top_k, 12);
	}

	#[test]
	fn test_toml_round_trip() {
		let mut config = Config::default();
		config.log_level = LogLevel::Info;
		config.ollama.temperature = 0.7;
		config.top_k = 5;

		let serialized = toml::to_string_pretty(&config).unwrap();
		assert!(serialized.contains("log_level = \"info\""));
		let reloaded: Config = toml::from_str(&serialized).unwrap();
		assert_eq!(reloaded.log_level, LogLevel::Info);
		assert_eq!(reloaded.ollama.temperature, 0.7);
		assert_eq!(reloaded.top_k, 5);
	}

	#[test]
	fn test_env_overrides() {
		let mut config = Config::default();
		std::env::set_var("LLM_BASE_URL", "http://example:9999");
		std::env::set_var("LLM_MODEL", "custom:latest");
		config.apply_env_overrides();
		std::env::remove_var("LLM_BASE_URL");
		std::env::remove_var("LLM_MODEL");

		assert_eq!(config.ollama.base_url, "http://example:9999");
		assert_eq!(config.ollama.model, "custom:latest");
	}

	#[test]
	fn test_log_level_gating() {
		assert!(!LogLevel::None.is_info_enabled());
		assert!(LogLevel::Info.is_info_enabled());
		assert!(!LogLevel::Info.is_debug_enabled());
		assert!(LogLevel::Debug.is_info_enabled());
		assert!(LogLevel::Debug.is_debug_enabled());
	}
}
