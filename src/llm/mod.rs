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

// Client for an Ollama-compatible chat-completion backend.
//
// This module has a single responsibility: sending prompts (or chat
// messages) to the local backend and returning raw model output. Higher
// level functionality lives in the code service and the indexer.

use crate::config::OllamaConfig;
use crate::{log_debug, log_error, log_info};
use anyhow::{anyhow, bail, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// One chat turn in the wire format used by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
	pub role: String,
	pub content: String,
}

impl Message {
	pub fn system(content: &str) -> Self {
		Self {
			role: "system".to_string(),
			content: content.to_string(),
		}
	}

	pub fn user(content: &str) -> Self {
		Self {
			role: "user".to_string(),
			content: content.to_string(),
		}
	}

	pub fn assistant(content: &str) -> Self {
		Self {
			role: "assistant".to_string(),
			content: content.to_string(),
		}
	}
}

/// Synchronous request/response wrapper around the backend's chat endpoint.
///
/// One reqwest client is reused for connection pooling only; every call
/// performs exactly one round trip and blocks the caller up to the
/// configured timeout. Nothing is retried.
pub struct LlmClient {
	config: OllamaConfig,
	client: Client,
	// None means no active session; an empty Vec is a started session.
	chat_history: Option<Vec<Message>>,
}

impl LlmClient {
	pub fn new(config: OllamaConfig) -> Result<Self> {
		let client = Client::builder()
			.timeout(Duration::from_secs(config.timeout_seconds))
			.build()
			.context("Failed to build HTTP client")?;

		log_debug!(
			"Initialized LLM client with model={}, base_url={}",
			config.model,
			config.base_url
		);

		Ok(Self {
			config,
			client,
			chat_history: None,
		})
	}

	pub fn model(&self) -> &str {
		&self.config.model
	}

	pub fn base_url(&self) -> &str {
		&self.config.base_url
	}

	/// Lightweight reachability probe against the model-listing endpoint.
	/// Network errors are swallowed and reported as "not available".
	pub async fn is_backend_available(&self) -> bool {
		let url = format!("{}/api/tags", self.config.base_url);
		match self.client.get(&url).send().await {
			Ok(response) => response.status().is_success(),
			Err(e) => {
				log_info!("LLM backend not available: {}", e);
				false
			}
		}
	}

	/// List the model names available on the backend.
	pub async fn list_models(&self) -> Result<Vec<String>> {
		let url = format!("{}/api/tags", self.config.base_url);
		let response = self
			.client
			.get(&url)
			.send()
			.await
			.map_err(|e| anyhow!("Failed to list models from LLM backend: {}", e))?;

		if !response.status().is_success() {
			bail!(
				"Failed to list models: LLM backend returned HTTP {}",
				response.status()
			);
		}

		let data: Value = response
			.json()
			.await
			.context("Failed to parse model list response")?;
		log_debug!("Received models metadata: {}", data);

		let models = data
			.get("models")
			.and_then(|m| m.as_array())
			.ok_or_else(|| anyhow!("Unexpected response format when listing models: {}", data))?;

		Ok(models
			.iter()
			.filter_map(|m| m.get("name").and_then(|n| n.as_str()))
			.map(|name| name.to_string())
			.collect())
	}

	/// Generate text from a single user prompt. Convenience wrapper that
	/// prepends an optional system message and delegates to `chat`.
	pub async fn generate(
		&self,
		prompt: &str,
		system_prompt: Option<&str>,
		temperature: Option<f32>,
		max_tokens: Option<u32>,
		options: Option<&HashMap<String, Value>>,
	) -> Result<String> {
		let mut messages = Vec::new();
		if let Some(system) = system_prompt {
			messages.push(Message::system(system));
		}
		messages.push(Message::user(prompt));

		self.chat(&messages, temperature, max_tokens, options).await
	}

	/// Send chat messages to the backend and return the assistant reply.
	///
	/// Per-call options are merged over the configured default options;
	/// the generation-length cap (`num_predict`) is only set when an
	/// effective max-token value is present and positive.
	pub async fn chat(
		&self,
		messages: &[Message],
		temperature: Option<f32>,
		max_tokens: Option<u32>,
		options: Option<&HashMap<String, Value>>,
	) -> Result<String> {
		let effective_temperature = temperature.unwrap_or(self.config.temperature);
		let effective_max_tokens = max_tokens.or(self.config.max_tokens);

		let mut request_options = serde_json::Map::new();
		for (key, value) in &self.config.options {
			request_options.insert(key.clone(), value.clone());
		}
		request_options.insert(
			"temperature".to_string(),
			serde_json::json!(effective_temperature),
		);
		if let Some(limit) = effective_max_tokens {
			if limit > 0 {
				request_options.insert("num_predict".to_string(), serde_json::json!(limit));
			}
		}
		if let Some(options) = options {
			for (key, value) in options {
				request_options.insert(key.clone(), value.clone());
			}
		}

		let payload = serde_json::json!({
			"model": self.config.model,
			"messages": messages,
			"stream": false,
			"options": request_options,
		});

		let url = format!("{}/api/chat", self.config.base_url);
		let response = self
			.client
			.post(&url)
			.json(&payload)
			.send()
			.await
			.map_err(|e| anyhow!("Failed to call LLM backend: {}", e))?;

		let status = response.status();
		let body = response
			.text()
			.await
			.map_err(|e| anyhow!("Failed to read LLM backend response: {}", e))?;

		if !status.is_success() {
			log_error!("LLM backend status: {}", status);
			log_error!("LLM backend body: {}", body);
			bail!("LLM backend returned HTTP {}: {}", status, body);
		}

		let data: Value = serde_json::from_str(&body)
			.map_err(|e| anyhow!("Failed to parse LLM backend response: {}. Body: {}", e, body))?;

		match data
			.get("message")
			.and_then(|m| m.get("content"))
			.and_then(|c| c.as_str())
		{
			Some(content) => Ok(content.trim().to_string()),
			None => bail!("Unexpected response format from LLM backend: {}", data),
		}
	}

	/// Start a persistent chat session, optionally seeded with a system
	/// prompt. Any previous session state is discarded.
	pub fn start_chat(&mut self, system_prompt: Option<&str>) {
		let mut history = Vec::new();
		if let Some(system) = system_prompt {
			history.push(Message::system(system));
		}
		self.chat_history = Some(history);
	}

	/// Append a user turn, replay the entire accumulated history through
	/// `chat`, record the assistant reply, and return it.
	pub async fn send_chat_message(
		&mut self,
		user_message: &str,
		temperature: Option<f32>,
		max_tokens: Option<u32>,
		options: Option<&HashMap<String, Value>>,
	) -> Result<String> {
		let Some(history) = self.chat_history.as_mut() else {
			bail!("No chat session active. Call start_chat() first.");
		};

		history.push(Message::user(user_message));
		let snapshot = history.clone();

		let reply = self.chat(&snapshot, temperature, max_tokens, options).await?;

		if let Some(history) = self.chat_history.as_mut() {
			history.push(Message::assistant(&reply));
		}

		Ok(reply)
	}

	/// Clear the chat history, ending the session.
	pub fn reset_chat(&mut self) {
		self.chat_history = None;
	}

	/// Snapshot of the current chat history (empty when no session is active).
	pub fn get_history(&self) -> Vec<Message> {
		self.chat_history.clone().unwrap_or_default()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::net::SocketAddr;
	use tokio::io::{AsyncReadExt, AsyncWriteExt};
	use tokio::net::TcpListener;

	const CHAT_BODY: &str = r#"{"message":{"role":"assistant","content":"  stub reply  "}}"#;
	const TAGS_BODY: &str = r#"{"models":[{"name":"llama3.2:3b"},{"name":"qwen2.5-coder:7b"}]}"#;

	/// Minimal HTTP stub standing in for an Ollama backend. Serves a canned
	/// body per method and closes each connection after one exchange.
	async fn spawn_stub_backend(status: &'static str, chat_body: &'static str) -> SocketAddr {
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();

		tokio::spawn(async move {
			loop {
				let Ok((mut stream, _)) = listener.accept().await else {
					break;
				};
				let mut buf = vec![0u8; 65536];
				let mut read = 0usize;
				loop {
					let n = stream.read(&mut buf[read..]).await.unwrap_or(0);
					if n == 0 {
						break;
					}
					read += n;
					let text = String::from_utf8_lossy(&buf[..read]).to_string();
					let Some(header_end) = text.find("\r\n\r\n") else {
						continue;
					};
					let mut content_length = 0usize;
					for line in text[..header_end].lines() {
						let lower = line.to_ascii_lowercase();
						if let Some(value) = lower.strip_prefix("content-length:") {
							content_length = value.trim().parse().unwrap_or(0);
						}
					}
					if read < header_end + 4 + content_length {
						continue;
					}
					let body = if text.starts_with("GET") { TAGS_BODY } else { chat_body };
					let response = format!(
						"HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
						status,
						body.len(),
						body
					);
					let _ = stream.write_all(response.as_bytes()).await;
					break;
				}
			}
		});

		addr
	}

	fn test_config(addr: SocketAddr) -> OllamaConfig {
		OllamaConfig {
			model: "llama3.2:3b".to_string(),
			base_url: format!("http://{}", addr),
			timeout_seconds: 5,
			temperature: 0.2,
			max_tokens: None,
			options: HashMap::new(),
		}
	}

	fn unreachable_config() -> OllamaConfig {
		OllamaConfig {
			model: "llama3.2:3b".to_string(),
			base_url: "http://127.0.0.1:1".to_string(),
			timeout_seconds: 1,
			temperature: 0.2,
			max_tokens: None,
			options: HashMap::new(),
		}
	}

	#[tokio::test]
	async fn test_generate_returns_trimmed_reply() {
		let addr = spawn_stub_backend("200 OK", CHAT_BODY).await;
		let client = LlmClient::new(test_config(addr)).unwrap();

		let reply = client
			.generate("hello", Some("be brief"), None, None, None)
			.await
			.unwrap();
		assert_eq!(reply, "stub reply");
	}

	#[tokio::test]
	async fn test_chat_http_error_is_backend_error() {
		let addr = spawn_stub_backend("500 Internal Server Error", "{}").await;
		let client = LlmClient::new(test_config(addr)).unwrap();

		let err = client
			.chat(&[Message::user("hi")], None, None, None)
			.await
			.unwrap_err();
		assert!(err.to_string().contains("HTTP"));
	}

	#[tokio::test]
	async fn test_chat_shape_mismatch_is_backend_error() {
		let addr = spawn_stub_backend("200 OK", r#"{"unexpected":true}"#).await;
		let client = LlmClient::new(test_config(addr)).unwrap();

		let err = client
			.chat(&[Message::user("hi")], None, None, None)
			.await
			.unwrap_err();
		assert!(err.to_string().contains("Unexpected response format"));
	}

	#[tokio::test]
	async fn test_network_failure_is_backend_error() {
		let client = LlmClient::new(unreachable_config()).unwrap();
		let err = client
			.chat(&[Message::user("hi")], None, None, None)
			.await
			.unwrap_err();
		assert!(err.to_string().contains("Failed to call LLM backend"));
	}

	#[tokio::test]
	async fn test_list_models() {
		let addr = spawn_stub_backend("200 OK", CHAT_BODY).await;
		let client = LlmClient::new(test_config(addr)).unwrap();

		let models = client.list_models().await.unwrap();
		assert_eq!(models, vec!["llama3.2:3b", "qwen2.5-coder:7b"]);
	}

	#[tokio::test]
	async fn test_backend_availability() {
		let addr = spawn_stub_backend("200 OK", CHAT_BODY).await;
		let client = LlmClient::new(test_config(addr)).unwrap();
		assert!(client.is_backend_available().await);

		let client = LlmClient::new(unreachable_config()).unwrap();
		assert!(!client.is_backend_available().await);
	}

	#[tokio::test]
	async fn test_send_before_start_is_session_error() {
		let addr = spawn_stub_backend("200 OK", CHAT_BODY).await;
		let mut client = LlmClient::new(test_config(addr)).unwrap();

		let err = client
			.send_chat_message("hi", None, None, None)
			.await
			.unwrap_err();
		assert!(err.to_string().contains("No chat session active"));
	}

	#[tokio::test]
	async fn test_persistent_chat_history_accumulates() {
		let addr = spawn_stub_backend("200 OK", CHAT_BODY).await;
		let mut client = LlmClient::new(test_config(addr)).unwrap();

		client.start_chat(None);
		client.send_chat_message("first", None, None, None).await.unwrap();
		client.send_chat_message("second", None, None, None).await.unwrap();

		let history = client.get_history();
		assert_eq!(history.len(), 4);
		assert_eq!(history[0].role, "user");
		assert_eq!(history[0].content, "first");
		assert_eq!(history[1].role, "assistant");
		assert_eq!(history[2].role, "user");
		assert_eq!(history[2].content, "second");
		assert_eq!(history[3].role, "assistant");

		client.reset_chat();
		assert!(client.get_history().is_empty());
		assert!(client
			.send_chat_message("third", None, None, None)
			.await
			.is_err());
	}

	#[tokio::test]
	async fn test_start_chat_with_system_prompt() {
		let addr = spawn_stub_backend("200 OK", CHAT_BODY).await;
		let mut client = LlmClient::new(test_config(addr)).unwrap();

		client.start_chat(Some("You are terse."));
		client.send_chat_message("hi", None, None, None).await.unwrap();

		let history = client.get_history();
		assert_eq!(history.len(), 3);
		assert_eq!(history[0].role, "system");
	}
}
