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

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;
use ollamadev::config::Config;
use ollamadev::indexer::search::answer_question;
use ollamadev::llm::LlmClient;
use ollamadev::store::{MetadataStore, SymbolIndex};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct AskArgs {
	/// Path to the workspace root directory
	#[arg(default_value = ".")]
	pub workspace: PathBuf,

	/// Metadata index filename inside the workspace
	#[arg(long)]
	pub index: Option<String>,

	/// Use a specific model instead of the default (runtime only, not saved)
	#[arg(long)]
	pub model: Option<String>,

	/// Ask a single question and exit (non-interactive mode)
	#[arg(short = 'q', long)]
	pub question: Option<String>,

	/// Number of most relevant symbols to include as context
	#[arg(long)]
	pub top_k: Option<usize>,
}

pub async fn execute(args: &AskArgs, config: &Config) -> Result<()> {
	if !args.workspace.is_dir() {
		bail!(
			"Workspace path does not exist or is not a directory: {}",
			args.workspace.display()
		);
	}

	let index_filename = args.index.as_deref().unwrap_or(&config.index_filename);
	let index_path = args.workspace.join(index_filename);
	println!("Loading metadata index: {}", index_path.display());
	let index = MetadataStore::load_index(&index_path)?;

	let llm = super::build_client(config, args.model.as_deref())?;
	if !llm.is_backend_available().await {
		bail!(
			"LLM backend is not reachable at {}. Make sure Ollama is running and try again.",
			llm.base_url()
		);
	}

	let top_k = args.top_k.unwrap_or(config.top_k);

	if let Some(question) = &args.question {
		println!("Question: {}", question);
		let reply = answer_with_progress(&llm, question, &index, top_k).await?;
		println!("\n{}", reply);
		return Ok(());
	}

	interactive_loop(&llm, &index, top_k).await?;
	Ok(())
}

async fn answer_with_progress(
	llm: &LlmClient,
	question: &str,
	index: &SymbolIndex,
	top_k: usize,
) -> Result<String> {
	println!("{}", "Searching metadata and generating an answer...".dimmed());
	answer_question(llm, question, index, top_k).await
}

async fn interactive_loop(llm: &LlmClient, index: &SymbolIndex, top_k: usize) -> Result<()> {
	println!("{}", "Workspace Q&A mode".bright_green());
	println!("Type your question and press Enter.");
	println!("Type 'exit' or 'quit' to stop.");
	println!("{}", "-".repeat(60));

	loop {
		let Some(line) = super::read_line("\n> ")? else {
			println!("Bye!");
			break;
		};
		let question = line.trim();
		if question.is_empty() {
			continue;
		}
		if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
			println!("Bye!");
			break;
		}

		match answer_with_progress(llm, question, index, top_k).await {
			Ok(reply) => println!("\n{}", reply),
			Err(e) => eprintln!("{}", format!("Error: {}", e).bright_red()),
		}
	}

	Ok(())
}
