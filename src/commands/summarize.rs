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

use anyhow::{bail, Context, Result};
use clap::Args;
use ollamadev::config::Config;
use ollamadev::service::summarize_document;
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct SummarizeArgs {
	/// Text file to summarize
	pub file: PathBuf,

	/// Maximum characters per chunk
	#[arg(long, default_value = "4000")]
	pub max_chars: usize,

	/// Overlapping characters between consecutive chunks
	#[arg(long, default_value = "200")]
	pub overlap: usize,

	/// Ask for a summary of at most this many words per chunk
	#[arg(long)]
	pub max_words: Option<usize>,

	/// Use a specific model instead of the default (runtime only, not saved)
	#[arg(long)]
	pub model: Option<String>,
}

pub async fn execute(args: &SummarizeArgs, config: &Config) -> Result<()> {
	let text = fs::read_to_string(&args.file)
		.context(format!("Text file not found: {}", args.file.display()))?;

	let llm = super::build_client(config, args.model.as_deref())?;
	if !llm.is_backend_available().await {
		bail!(
			"LLM backend is not reachable at {}. Make sure Ollama is running and try again.",
			llm.base_url()
		);
	}

	println!("Summarizing {} with {}...", args.file.display(), llm.model());
	let summary =
		summarize_document(&llm, &text, args.max_chars, args.overlap, args.max_words).await?;
	println!("\n{}", summary);

	Ok(())
}
