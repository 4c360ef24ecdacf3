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

#[derive(Args, Debug)]
pub struct ChatArgs {
	/// Use a specific model instead of the default (runtime only, not saved)
	#[arg(long)]
	pub model: Option<String>,

	/// System prompt seeding the session
	#[arg(long)]
	pub system: Option<String>,
}

pub async fn execute(args: &ChatArgs, config: &Config) -> Result<()> {
	let mut llm = super::build_client(config, args.model.as_deref())?;
	if !llm.is_backend_available().await {
		bail!(
			"LLM backend is not reachable at {}. Make sure Ollama is running and try again.",
			llm.base_url()
		);
	}

	println!(
		"{}",
		format!("Chat session with {} (type 'exit' or 'quit' to stop)", llm.model())
			.bright_green()
	);

	llm.start_chat(args.system.as_deref());

	loop {
		let Some(line) = super::read_line("\n> ")? else {
			println!("Bye!");
			break;
		};
		let message = line.trim();
		if message.is_empty() {
			continue;
		}
		if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
			println!("Bye!");
			break;
		}

		match llm.send_chat_message(message, None, None, None).await {
			Ok(reply) => println!("\n{}", reply),
			Err(e) => eprintln!("{}", format!("Error: {}", e).bright_red()),
		}
	}

	Ok(())
}
