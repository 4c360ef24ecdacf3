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

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use ollamadev::config::Config;

#[derive(Args, Debug)]
pub struct ModelsArgs {
	/// Mark this model as the one in use instead of the configured default
	#[arg(long)]
	pub model: Option<String>,
}

pub async fn execute(args: &ModelsArgs, config: &Config) -> Result<()> {
	let llm = super::build_client(config, args.model.as_deref())?;
	let models = llm.list_models().await?;

	if models.is_empty() {
		println!("No models available on the backend.");
		return Ok(());
	}

	println!("Available models on {}:", llm.base_url());
	for model in models {
		if model == llm.model() {
			println!("  {} {}", model, "(default)".dimmed());
		} else {
			println!("  {}", model);
		}
	}

	Ok(())
}
