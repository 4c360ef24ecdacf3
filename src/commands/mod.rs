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

pub mod analyze;
pub mod ask;
pub mod chat;
pub mod config;
pub mod edit;
pub mod models;
pub mod summarize;

// Re-export all the command structs and enums
pub use analyze::AnalyzeArgs;
pub use ask::AskArgs;
pub use chat::ChatArgs;
pub use config::ConfigArgs;
pub use edit::EditArgs;
pub use models::ModelsArgs;
pub use summarize::SummarizeArgs;

use anyhow::Result;
use ollamadev::config::Config;
use ollamadev::llm::LlmClient;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// Build an LLM client from the loaded config, with an optional runtime
/// model override (not saved).
pub fn build_client(config: &Config, model: Option<&str>) -> Result<LlmClient> {
	let mut ollama = config.ollama.clone();
	if let Some(model) = model {
		ollama.model = model.to_string();
	}
	LlmClient::new(ollama)
}

/// Read one line of input. Returns None on Ctrl+C / Ctrl+D.
pub fn read_line(prompt: &str) -> Result<Option<String>> {
	let mut editor = DefaultEditor::new()?;
	match editor.readline(prompt) {
		Ok(line) => Ok(Some(line)),
		Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
		Err(err) => Err(anyhow::anyhow!("Error reading input: {}", err)),
	}
}

/// Simple y/n confirmation; anything other than y/yes counts as no.
pub fn confirm(prompt: &str) -> Result<bool> {
	match read_line(&format!("{} [y/N] ", prompt))? {
		Some(answer) => {
			let answer = answer.trim().to_lowercase();
			Ok(answer == "y" || answer == "yes")
		}
		None => Ok(false),
	}
}
