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
use clap::{Args, ValueEnum};
use colored::Colorize;
use ollamadev::config::Config;
use ollamadev::diff::{apply_diff, check_diff};
use ollamadev::service::{CodeService, OutputMode};
use std::fs;
use std::path::PathBuf;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
	/// Refactor the class toward the given goals
	Refactor,
	/// Add new functionality described in --description
	Add,
	/// Add or improve docstrings on the class and its public methods
	Docstrings,
}

#[derive(Args, Debug)]
pub struct EditArgs {
	/// Path to the workspace root directory (must be a git repository
	/// for the patch to be applied)
	#[arg(default_value = ".")]
	pub workspace: PathBuf,

	/// File to edit, relative to the workspace root
	#[arg(long)]
	pub file: String,

	/// Name of the class to edit
	#[arg(long)]
	pub class: String,

	/// What kind of edit to perform
	#[arg(long, value_enum)]
	pub mode: EditMode,

	/// Natural language description of the change (required for
	/// refactor and add modes)
	#[arg(long)]
	pub description: Option<String>,

	/// Additional repository context passed to the model
	#[arg(long)]
	pub context: Option<String>,

	/// Use a specific model instead of the default (runtime only, not saved)
	#[arg(long)]
	pub model: Option<String>,

	/// Apply the diff without asking for confirmation
	#[arg(long)]
	pub auto_apply: bool,
}

pub async fn execute(args: &EditArgs, config: &Config) -> Result<()> {
	if !args.workspace.is_dir() {
		bail!(
			"Workspace path does not exist or is not a directory: {}",
			args.workspace.display()
		);
	}

	let file_path = args.workspace.join(&args.file);
	let code = fs::read_to_string(&file_path)
		.context(format!("Failed to read file: {}", file_path.display()))?;

	let llm = super::build_client(config, args.model.as_deref())?;
	if !llm.is_backend_available().await {
		bail!(
			"LLM backend is not reachable at {}. Make sure Ollama is running and try again.",
			llm.base_url()
		);
	}

	let service = CodeService::new(code, args.context.clone().unwrap_or_default(), &llm)
		.with_file_path(&args.file);

	println!(
		"Generating {} diff for class '{}' in {}...",
		mode_label(args.mode),
		args.class,
		args.file
	);

	let diff = match args.mode {
		EditMode::Refactor => {
			let description = require_description(args)?;
			service
				.refactor_class(&args.class, description, None, OutputMode::UnifiedDiff)
				.await?
		}
		EditMode::Add => {
			let description = require_description(args)?;
			service
				.add_functionality_to_class(&args.class, description, None, OutputMode::UnifiedDiff)
				.await?
		}
		EditMode::Docstrings => {
			service
				.generate_docstrings(&args.class, None, OutputMode::UnifiedDiff)
				.await?
		}
	};

	if diff.trim().is_empty() {
		bail!("The model returned an empty diff");
	}

	println!("\n{}\n", diff);

	if !args.auto_apply && !super::confirm("Apply this diff?")? {
		println!("Diff not applied.");
		return Ok(());
	}

	check_diff(&diff, &args.workspace)?;
	apply_diff(&diff, &args.workspace)?;
	println!("{}", "✓ Diff applied".green());

	Ok(())
}

fn mode_label(mode: EditMode) -> &'static str {
	match mode {
		EditMode::Refactor => "refactor",
		EditMode::Add => "add-functionality",
		EditMode::Docstrings => "docstrings",
	}
}

fn require_description(args: &EditArgs) -> Result<&str> {
	args.description
		.as_deref()
		.filter(|d| !d.trim().is_empty())
		.ok_or_else(|| {
			anyhow::anyhow!(
				"--description is required for {} mode",
				mode_label(args.mode)
			)
		})
}
