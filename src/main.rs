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

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{AnalyzeArgs, AskArgs, ChatArgs, ConfigArgs, EditArgs, ModelsArgs, SummarizeArgs};
use ollamadev::config::{set_thread_config, Config};

#[derive(Parser)]
#[command(name = "ollamadev")]
#[command(version = "0.1.0")]
#[command(about = "Ollamadev analyzes, documents and edits codebases with a local LLM backend")]
struct OllamadevArgs {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Analyze a workspace and build metadata indexes
	Analyze(AnalyzeArgs),

	/// Ask questions about an analyzed workspace
	Ask(AskArgs),

	/// Edit a class via a model-generated diff
	Edit(EditArgs),

	/// Interactive chat session with the backend
	Chat(ChatArgs),

	/// Summarize a long text document chunk by chunk
	Summarize(SummarizeArgs),

	/// List models available on the backend
	Models(ModelsArgs),

	/// Generate or update the configuration file
	Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = OllamadevArgs::parse();

	// Load configuration and make it available to the logging macros
	let config = Config::load()?;
	set_thread_config(&config);

	match &args.command {
		Commands::Analyze(analyze_args) => commands::analyze::execute(analyze_args, &config).await,
		Commands::Ask(ask_args) => commands::ask::execute(ask_args, &config).await,
		Commands::Edit(edit_args) => commands::edit::execute(edit_args, &config).await,
		Commands::Chat(chat_args) => commands::chat::execute(chat_args, &config).await,
		Commands::Summarize(summarize_args) => {
			commands::summarize::execute(summarize_args, &config).await
		}
		Commands::Models(models_args) => commands::models::execute(models_args, &config).await,
		Commands::Config(config_args) => commands::config::execute(config_args, &config).await,
	}
}
