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

// Code-centric operations over one (code, context, llm) triple.
//
// Each operation is a deterministic prompt template plus a single generate
// call. Interface accessors dispatch to the tree-sitter extractor for
// Python and only fall back to the model for other languages.

use crate::chunker::chunk_text;
use crate::extractor;
use crate::llm::LlmClient;
use anyhow::Result;

/// How an editing operation should return its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
	/// The full updated file as plain text.
	FullFile,
	/// A unified diff applicable with `git apply`.
	UnifiedDiff,
}

/// Service for code-related operations backed by an [`LlmClient`].
///
/// Does not manage the LLM runtime itself; it borrows an already configured
/// client and focuses purely on code-centric tasks.
pub struct CodeService<'a> {
	code: String,
	context: String,
	llm: &'a LlmClient,
	language: String,
	file_path: Option<String>,
}

impl<'a> CodeService<'a> {
	pub fn new(code: impl Into<String>, context: impl Into<String>, llm: &'a LlmClient) -> Self {
		Self {
			code: code.into(),
			context: context.into(),
			llm,
			language: "python".to_string(),
			file_path: None,
		}
	}

	pub fn with_language(mut self, language: impl Into<String>) -> Self {
		self.language = language.into();
		self
	}

	/// Path of the file within the repository, used only for diff headers so
	/// the patch can be applied with `git apply`.
	pub fn with_file_path(mut self, file_path: impl Into<String>) -> Self {
		self.file_path = Some(file_path.into());
		self
	}

	fn is_python(&self) -> bool {
		self.language.eq_ignore_ascii_case("python")
	}

	/// Instruction describing whether the model should return a full updated
	/// file or a unified diff.
	fn build_output_instruction(&self, mode: OutputMode) -> String {
		match mode {
			OutputMode::FullFile => "Return the FULL updated code file as plain text. \
				Do NOT include any explanation outside of comments or docstrings.\n"
				.to_string(),
			OutputMode::UnifiedDiff => {
				let file_label = self.file_path.as_deref().unwrap_or("code.py");
				format!(
					"Return ONLY a unified diff (patch) that can be applied with `git apply`\n\
					against the original code shown above.\n\
					\n\
					Requirements for the diff:\n\
					- Use standard unified diff format.\n\
					- Include `---` and `+++` headers using '{}' as the file path.\n\
					- Make sure the diff can be applied cleanly to the original content.\n\
					- Do NOT include any prose explanation before or after the diff.\n",
					file_label
				)
			}
		}
	}

	pub async fn write_unit_tests(
		&self,
		class_name: Option<&str>,
		testing_framework: &str,
		include_comments: bool,
		max_tokens: Option<u32>,
	) -> Result<String> {
		let target_description = match class_name {
			Some(name) => format!("the class '{}'", name),
			None => "the main public classes or functions in the file".to_string(),
		};

		let comments_instruction = if include_comments {
			"Include clear comments that explain each test's purpose.\n"
		} else {
			"Focus on concise tests with minimal comments.\n"
		};

		let prompt = format!(
			"You are an expert software engineer and test writer.\n\
			\n\
			You are given the code of a file and some additional repository context.\n\
			Your task is to write unit tests for {}.\n\
			\n\
			Use the testing framework: {}.\n\
			\n\
			{}\
			Follow these rules:\n\
			- Return ONLY valid {} test code as plain text.\n\
			- Do NOT include explanation outside of comments in the code.\n\
			- Make sure tests are realistic and cover both typical and edge cases.\n\
			\n\
			Repository context (may be partial, use only if helpful):\n\
			--------------------\n\
			{}\n\
			--------------------\n\
			\n\
			Code file:\n\
			--------------------\n\
			{}\n\
			--------------------",
			target_description,
			testing_framework,
			comments_instruction,
			testing_framework,
			self.context,
			self.code
		);

		self.llm.generate(&prompt, None, None, max_tokens, None).await
	}

	pub async fn describe_class(&self, class_name: &str, max_tokens: Option<u32>) -> Result<String> {
		let prompt = format!(
			"You are an expert software engineer.\n\
			\n\
			You are given a code file and some additional repository context.\n\
			Describe the class '{}' in clear, concise language.\n\
			\n\
			Focus on:\n\
			- What the class does.\n\
			- Its key responsibilities.\n\
			- How it likely fits into the bigger system.\n\
			- Any important design decisions or patterns that stand out.\n\
			\n\
			Keep the description suitable for a developer reading documentation.\n\
			\n\
			Repository context (may be partial, use only if helpful):\n\
			--------------------\n\
			{}\n\
			--------------------\n\
			\n\
			Code file:\n\
			--------------------\n\
			{}\n\
			--------------------",
			class_name, self.context, self.code
		);

		self.llm.generate(&prompt, None, None, max_tokens, None).await
	}

	pub async fn describe_module(&self, max_tokens: Option<u32>) -> Result<String> {
		let prompt = format!(
			"You are an expert software engineer.\n\
			\n\
			You are given a code file and some additional repository context.\n\
			Describe what this module does in clear, concise language.\n\
			\n\
			Focus on:\n\
			- The overall purpose of the module.\n\
			- The key classes and functions it provides.\n\
			- How it likely fits into the bigger system.\n\
			\n\
			Keep the description suitable for a developer reading documentation.\n\
			\n\
			Repository context (may be partial, use only if helpful):\n\
			--------------------\n\
			{}\n\
			--------------------\n\
			\n\
			Code file:\n\
			--------------------\n\
			{}\n\
			--------------------",
			self.context, self.code
		);

		self.llm.generate(&prompt, None, None, max_tokens, None).await
	}

	pub async fn describe_function(
		&self,
		function_name: &str,
		max_tokens: Option<u32>,
	) -> Result<String> {
		let prompt = format!(
			"You are an expert software engineer.\n\
			\n\
			You are given a code file and some additional repository context.\n\
			Describe the top-level function '{}' in clear, concise language.\n\
			\n\
			Focus on:\n\
			- What the function does and when it should be used.\n\
			- Its parameters and return value.\n\
			- Important branches or edge cases.\n\
			\n\
			Keep the description suitable for a developer reading documentation.\n\
			\n\
			Repository context (may be partial, use only if helpful):\n\
			--------------------\n\
			{}\n\
			--------------------\n\
			\n\
			Code file:\n\
			--------------------\n\
			{}\n\
			--------------------",
			function_name, self.context, self.code
		);

		self.llm.generate(&prompt, None, None, max_tokens, None).await
	}

	/// Add functionality to a class based on a natural language description.
	pub async fn add_functionality_to_class(
		&self,
		class_name: &str,
		description: &str,
		max_tokens: Option<u32>,
		mode: OutputMode,
	) -> Result<String> {
		let output_instruction = self.build_output_instruction(mode);

		let prompt = format!(
			"You are an expert software engineer.\n\
			\n\
			You are given the code of a file and some additional repository context.\n\
			Your task is to add new functionality to the class '{}'.\n\
			\n\
			New functionality description:\n\
			--------------------\n\
			{}\n\
			--------------------\n\
			\n\
			Requirements:\n\
			- Modify ONLY the relevant parts of the code needed to support\n\
			  the new functionality.\n\
			- Preserve existing behavior unless the description explicitly\n\
			  states otherwise.\n\
			- Follow the existing coding style and conventions (naming,\n\
			  formatting, docstrings, etc.).\n\
			\n\
			{}\n\
			\n\
			Repository context (may be partial, use only if helpful):\n\
			--------------------\n\
			{}\n\
			--------------------\n\
			\n\
			Original code file:\n\
			--------------------\n\
			{}\n\
			--------------------",
			class_name, description, output_instruction, self.context, self.code
		);

		self.llm.generate(&prompt, None, None, max_tokens, None).await
	}

	/// Refactor a class based on a high-level description.
	pub async fn refactor_class(
		&self,
		class_name: &str,
		description: &str,
		max_tokens: Option<u32>,
		mode: OutputMode,
	) -> Result<String> {
		let output_instruction = self.build_output_instruction(mode);

		let prompt = format!(
			"You are an expert software engineer.\n\
			\n\
			You are given the code of a file and some additional repository context.\n\
			Your task is to refactor the class '{}'.\n\
			\n\
			Refactor goals:\n\
			--------------------\n\
			{}\n\
			--------------------\n\
			\n\
			Requirements:\n\
			- Preserve the public behavior and interface of the class unless the\n\
			  description explicitly allows changes.\n\
			- Improve readability and maintainability.\n\
			- Keep or improve type hints and docstrings where appropriate.\n\
			- Follow the existing coding style and conventions.\n\
			\n\
			{}\n\
			\n\
			Repository context (may be partial, use only if helpful):\n\
			--------------------\n\
			{}\n\
			--------------------\n\
			\n\
			Original code file:\n\
			--------------------\n\
			{}\n\
			--------------------",
			class_name, description, output_instruction, self.context, self.code
		);

		self.llm.generate(&prompt, None, None, max_tokens, None).await
	}

	/// Add or improve docstrings for a class and its public methods.
	pub async fn generate_docstrings(
		&self,
		class_name: &str,
		max_tokens: Option<u32>,
		mode: OutputMode,
	) -> Result<String> {
		let output_instruction = self.build_output_instruction(mode);

		let prompt = format!(
			"You are an expert software engineer.\n\
			\n\
			You are given the code of a file and some additional repository context.\n\
			Your task is to add or improve docstrings for the class '{}'.\n\
			\n\
			Requirements:\n\
			- Ensure the class itself and all its public methods have clear,\n\
			  informative docstrings.\n\
			- Follow the existing docstring style if one is already present\n\
			  (e.g. Google, NumPy, or reStructuredText style).\n\
			- Preserve existing behavior and signatures.\n\
			\n\
			{}\n\
			\n\
			Repository context (may be partial, use only if helpful):\n\
			--------------------\n\
			{}\n\
			--------------------\n\
			\n\
			Original code file:\n\
			--------------------\n\
			{}\n\
			--------------------",
			class_name, output_instruction, self.context, self.code
		);

		self.llm.generate(&prompt, None, None, max_tokens, None).await
	}

	/// Code review of a class; returns suggestions, not modified code.
	pub async fn suggest_improvements(
		&self,
		class_name: &str,
		max_tokens: Option<u32>,
	) -> Result<String> {
		let prompt = format!(
			"You are an expert software engineer performing a code review.\n\
			\n\
			You are given the code of a file and some additional repository context.\n\
			Provide a list of concrete improvement suggestions for the class\n\
			'{}'.\n\
			\n\
			Focus on:\n\
			- Readability and maintainability.\n\
			- Naming and structure.\n\
			- Testability and separation of concerns.\n\
			- Error handling and edge cases.\n\
			- Type hints and documentation.\n\
			\n\
			Format your answer as bullet points grouped by theme. Do NOT return\n\
			modified code, only suggestions.\n\
			\n\
			Repository context (may be partial, use only if helpful):\n\
			--------------------\n\
			{}\n\
			--------------------\n\
			\n\
			Code file:\n\
			--------------------\n\
			{}\n\
			--------------------",
			class_name, self.context, self.code
		);

		self.llm.generate(&prompt, None, None, max_tokens, None).await
	}

	/// Explain a single method inside a class.
	pub async fn explain_method(
		&self,
		class_name: &str,
		method_name: &str,
		max_tokens: Option<u32>,
	) -> Result<String> {
		let prompt = format!(
			"You are an expert software engineer.\n\
			\n\
			You are given the code of a file and some additional repository context.\n\
			Explain the method '{}' inside the class '{}'.\n\
			\n\
			Focus on:\n\
			- What the method does and when it should be used.\n\
			- Its parameters and return value.\n\
			- Important branches or edge cases.\n\
			- Any side effects or interactions with other components.\n\
			\n\
			Keep the explanation suitable for a developer reading documentation.\n\
			\n\
			Repository context (may be partial, use only if helpful):\n\
			--------------------\n\
			{}\n\
			--------------------\n\
			\n\
			Code file:\n\
			--------------------\n\
			{}\n\
			--------------------",
			method_name, class_name, self.context, self.code
		);

		self.llm.generate(&prompt, None, None, max_tokens, None).await
	}

	/// Generate usage examples for a class, steered by caller-provided
	/// usage context.
	pub async fn generate_usage_examples(
		&self,
		class_name: &str,
		usage_context: &str,
		max_tokens: Option<u32>,
	) -> Result<String> {
		let prompt = format!(
			"You are an expert software engineer.\n\
			\n\
			You are given the code of a file, some repository context, and some\n\
			additional usage context.\n\
			\n\
			Your task is to generate realistic usage examples for the class\n\
			'{}'.\n\
			\n\
			Usage context (what the caller is trying to do, constraints, etc.):\n\
			--------------------\n\
			{}\n\
			--------------------\n\
			\n\
			Repository context (may be partial, use only if helpful):\n\
			--------------------\n\
			{}\n\
			--------------------\n\
			\n\
			Code file:\n\
			--------------------\n\
			{}\n\
			--------------------\n\
			\n\
			Requirements:\n\
			- Provide one or more concise code examples showing how to instantiate\n\
			  and use the class '{}'.\n\
			- Use realistic data and function calls.\n\
			- If relevant, show how this class interacts with other components\n\
			  hinted at in the context.\n\
			- Return ONLY code examples as plain text (with comments allowed),\n\
			  no prose explanation around them.",
			class_name, usage_context, self.context, self.code, class_name
		);

		self.llm.generate(&prompt, None, None, max_tokens, None).await
	}

	/// Review a diff against the stored "before" version of the code and
	/// suggest merge request content and review comments.
	pub async fn review_diff_for_merge_request(
		&self,
		class_name: &str,
		diff: &str,
		max_tokens: Option<u32>,
	) -> Result<String> {
		let prompt = format!(
			"You are an expert software engineer performing a code review.\n\
			\n\
			You are given:\n\
			- The previous version of a code file (as stored in the repository).\n\
			- A diff describing the proposed changes to that file.\n\
			- Some additional repository context.\n\
			\n\
			The main focus is on the class '{}'.\n\
			\n\
			Previous code file (before changes):\n\
			--------------------\n\
			{}\n\
			--------------------\n\
			\n\
			Diff (proposed changes):\n\
			--------------------\n\
			{}\n\
			--------------------\n\
			\n\
			Repository context (may be partial, use only if helpful):\n\
			--------------------\n\
			{}\n\
			--------------------\n\
			\n\
			Your task:\n\
			- Act as a reviewer doing a code review for a merge request / pull request.\n\
			- Identify what has changed and why it might have been changed.\n\
			- Call out potential issues, edge cases, or design concerns.\n\
			- Highlight improvements or positive aspects where relevant.\n\
			\n\
			Output format:\n\
			1. A suggested merge request title (one line).\n\
			2. A short merge request description (2-5 bullet points).\n\
			3. A section \"Review comments\" with bullet points of concrete comments\n\
			   a reviewer might leave (both positive and critical).\n\
			\n\
			Do NOT output any modified code, only the review content.",
			class_name, self.code, diff, self.context
		);

		self.llm.generate(&prompt, None, None, max_tokens, None).await
	}

	/// Extract the interface (header, public methods, docstrings) of a class.
	///
	/// For Python this is pure static analysis and never calls the model;
	/// other languages fall back to an LLM-prompted extraction.
	pub async fn get_class_interface(&self, class_name: &str) -> Result<String> {
		if self.is_python() {
			return extractor::class_interface(&self.code, class_name);
		}

		let prompt = format!(
			"Extract the public interface for the class '{}' from the code below.\n\
			\n\
			Requirements:\n\
			- Include the class declaration line (with bases if present).\n\
			- Include the class docstring if present.\n\
			- Include all public method signatures (methods that are part\n\
			  of the public API), with their docstrings if present.\n\
			- Do NOT include method bodies; replace with '...' or an empty body.\n\
			- Return valid code in the same language as the original.\n\
			\n\
			Code file:\n\
			--------------------\n\
			{}\n\
			--------------------",
			class_name, self.code
		);

		self.llm.generate(&prompt, None, None, None, None).await
	}

	/// Extract the interface of a top-level function.
	pub async fn get_function_interface(&self, function_name: &str) -> Result<String> {
		if self.is_python() {
			return extractor::function_interface(&self.code, function_name);
		}

		let prompt = format!(
			"Extract the signature of the top-level function '{}' from the code below.\n\
			\n\
			Requirements:\n\
			- Include the function declaration line and its docstring if present.\n\
			- Do NOT include the function body; replace with '...' or an empty body.\n\
			- Return valid code in the same language as the original.\n\
			\n\
			Code file:\n\
			--------------------\n\
			{}\n\
			--------------------",
			function_name, self.code
		);

		self.llm.generate(&prompt, None, None, None, None).await
	}

	/// Extract the signature-only view of the whole module.
	pub async fn get_module_interface(&self) -> Result<String> {
		if self.is_python() {
			return extractor::module_interface(&self.code);
		}

		let prompt = format!(
			"Extract the public interface of the module below: every top-level\n\
			class and function in signature-only form.\n\
			\n\
			Requirements:\n\
			- Include declaration lines and docstrings where present.\n\
			- Do NOT include any bodies; replace with '...' or an empty body.\n\
			- Return valid code in the same language as the original.\n\
			\n\
			Code file:\n\
			--------------------\n\
			{}\n\
			--------------------",
			self.code
		);

		self.llm.generate(&prompt, None, None, None, None).await
	}
}

/// Summarization prompt for one text chunk.
pub fn build_summarization_prompt(chunk: &str, max_words: Option<usize>) -> String {
	let limit_instruction = match max_words {
		Some(limit) if limit > 0 => format!("in at most {} words ", limit),
		_ => String::new(),
	};

	format!(
		"You are a helpful assistant that summarizes documents.\n\n\
		Summarize the following text {}\
		using clear, concise language that a non-expert can understand.\n\n\
		Text:\n\
		------\n\
		{}\n\
		------\n\n\
		Summary:",
		limit_instruction, chunk
	)
}

/// Summarize a long document chunk by chunk, joining the partial summaries.
pub async fn summarize_document(
	llm: &LlmClient,
	text: &str,
	max_chars: usize,
	overlap: usize,
	max_words: Option<usize>,
) -> Result<String> {
	let chunks = chunk_text(text, max_chars, overlap)?;

	let mut summaries = Vec::with_capacity(chunks.len());
	for chunk in &chunks {
		let prompt = build_summarization_prompt(chunk, max_words);
		let summary = llm.generate(&prompt, None, None, None, None).await?;
		summaries.push(summary);
	}

	Ok(summaries.join("\n\n"))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::OllamaConfig;

	fn offline_client() -> LlmClient {
		// Points at a closed port; static-analysis paths never touch it.
		LlmClient::new(OllamaConfig {
			base_url: "http://127.0.0.1:1".to_string(),
			timeout_seconds: 1,
			..OllamaConfig::default()
		})
		.unwrap()
	}

	const SOURCE: &str = "class Foo:\n    \"\"\"A thing.\"\"\"\n\n    def bar(self):\n        return 1\n\n\ndef helper():\n    return 2\n";

	#[test]
	fn test_output_instruction_full_file() {
		let llm = offline_client();
		let service = CodeService::new(SOURCE, "", &llm);
		let instruction = service.build_output_instruction(OutputMode::FullFile);
		assert!(instruction.contains("FULL updated code file"));
		assert!(!instruction.contains("unified diff"));
	}

	#[test]
	fn test_output_instruction_diff_uses_file_path() {
		let llm = offline_client();
		let service = CodeService::new(SOURCE, "", &llm).with_file_path("pkg/thing.py");
		let instruction = service.build_output_instruction(OutputMode::UnifiedDiff);
		assert!(instruction.contains("unified diff"));
		assert!(instruction.contains("'pkg/thing.py'"));

		let service = CodeService::new(SOURCE, "", &llm);
		let instruction = service.build_output_instruction(OutputMode::UnifiedDiff);
		assert!(instruction.contains("'code.py'"));
	}

	#[tokio::test]
	async fn test_python_interfaces_skip_the_model() {
		let llm = offline_client();
		let service = CodeService::new(SOURCE, "", &llm);

		let class_interface = service.get_class_interface("Foo").await.unwrap();
		assert!(class_interface.contains("class Foo:"));
		assert!(class_interface.contains("def bar(self):"));
		assert!(!class_interface.contains("return 1"));

		let fn_interface = service.get_function_interface("helper").await.unwrap();
		assert!(fn_interface.starts_with("def helper():"));

		let module_interface = service.get_module_interface().await.unwrap();
		assert!(module_interface.contains("class Foo:"));
		assert!(module_interface.contains("def helper():"));
	}

	#[tokio::test]
	async fn test_non_python_interface_needs_the_model() {
		let llm = offline_client();
		let service = CodeService::new("public class Foo {}", "", &llm).with_language("java");
		assert!(service.get_class_interface("Foo").await.is_err());
	}

	#[test]
	fn test_summarization_prompt_word_limit() {
		let prompt = build_summarization_prompt("some text", Some(50));
		assert!(prompt.contains("in at most 50 words"));
		assert!(prompt.contains("some text"));

		let prompt = build_summarization_prompt("some text", None);
		assert!(!prompt.contains("at most"));

		let prompt = build_summarization_prompt("some text", Some(0));
		assert!(!prompt.contains("at most"));
	}

	#[tokio::test]
	async fn test_summarize_document_rejects_bad_window() {
		let llm = offline_client();
		assert!(summarize_document(&llm, "text", 0, 0, None).await.is_err());
		assert!(summarize_document(&llm, "text", 100, 100, None).await.is_err());
	}
}
