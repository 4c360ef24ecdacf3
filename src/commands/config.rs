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
use ollamadev::config::Config;
use ollamadev::directories;

#[derive(Args, Debug)]
pub struct ConfigArgs {
	/// Set the default model and save it to the config file
	#[arg(long)]
	pub model: Option<String>,

	/// Set the backend base URL and save it to the config file
	#[arg(long)]
	pub base_url: Option<String>,
}

pub async fn execute(args: &ConfigArgs, config: &Config) -> Result<()> {
	let mut config = config.clone();
	let mut modified = false;

	if let Some(model) = &args.model {
		config.ollama.model = model.clone();
		println!("Set default model to {}", model);
		modified = true;
	}

	if let Some(base_url) = &args.base_url {
		config.ollama.base_url = base_url.clone();
		println!("Set backend base URL to {}", base_url);
		modified = true;
	}

	if modified {
		config.save()?;
		println!("Configuration saved successfully");
	} else {
		let config_path = Config::create_default_config()?;
		println!("Configuration file: {}", config_path.display());
	}

	println!("\nCurrent configuration:");
	println!("Model:           {}", config.ollama.model);
	println!("Base URL:        {}", config.ollama.base_url);
	println!("Timeout:         {}s", config.ollama.timeout_seconds);
	println!("Temperature:     {}", config.ollama.temperature);
	println!("Index filename:  {}", config.index_filename);
	println!("Folder metadata: {}", config.folder_metadata_filename);
	println!("Top-k:           {}", config.top_k);
	println!("Log level:       {:?}", config.log_level);
	println!();
	directories::print_directory_info()?;

	Ok(())
}
