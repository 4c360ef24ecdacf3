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
use ollamadev::indexer::WorkspaceAnalyzer;
use ollamadev::store::MetadataStore;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
	/// Path to the workspace root directory
	#[arg(default_value = ".")]
	pub workspace: PathBuf,

	/// Flat index filename, written inside the workspace
	#[arg(long)]
	pub output: Option<String>,

	/// Use a specific model instead of the default (runtime only, not saved)
	#[arg(long)]
	pub model: Option<String>,

	/// Repository-level context text blended into every summary prompt
	#[arg(long)]
	pub context: Option<String>,
}

pub async fn execute(args: &AnalyzeArgs, config: &Config) -> Result<()> {
	if !args.workspace.is_dir() {
		bail!(
			"Workspace path does not exist or is not a directory: {}",
			args.workspace.display()
		);
	}

	let llm = super::build_client(config, args.model.as_deref())?;
	if !llm.is_backend_available().await {
		bail!(
			"LLM backend is not reachable at {}. Make sure Ollama is running and try again.",
			llm.base_url()
		);
	}

	let index_filename = args.output.as_deref().unwrap_or(&config.index_filename);
	let index_path = args.workspace.join(index_filename);
	let store = MetadataStore::open(&index_path)?;

	println!("Analyzing workspace: {}", args.workspace.display());
	println!("Using model: {}", llm.model());

	let analyzer = WorkspaceAnalyzer::new(&args.workspace, &llm, store)
		.with_repo_context(args.context.clone().unwrap_or_default())
		.with_folder_metadata_filename(&config.folder_metadata_filename);

	let report = analyzer.analyze().await?;

	println!(
		"{}",
		format!("✓ Analyzed {} file(s)", report.analyzed_files).green()
	);
	if !report.failed_files.is_empty() {
		eprintln!(
			"{}",
			format!("{} file(s) failed:", report.failed_files.len()).yellow()
		);
		for file in &report.failed_files {
			eprintln!("  {}", file);
		}
	}
	println!("Flat index written to: {}", index_path.display());

	Ok(())
}
