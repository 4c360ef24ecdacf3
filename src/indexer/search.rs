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

// Keyword-overlap relevance over the flat index, feeding a Q&A prompt.

use crate::llm::LlmClient;
use crate::store::{SymbolIndex, SymbolMetadata};
use anyhow::Result;

/// One index record selected as relevant for a question.
#[derive(Debug, Clone, PartialEq)]
pub struct RelevantEntry {
	pub file_path: String,
	pub symbol_key: String,
	pub metadata: SymbolMetadata,
}

/// Very lightweight tokenization for relevance scoring (no external deps).
pub fn tokenize(text: &str) -> Vec<String> {
	text.split_whitespace()
		.map(|t| {
			t.trim_matches(|c: char| ".,:;!?()[]{}\"'".contains(c))
				.to_lowercase()
		})
		.filter(|t| !t.is_empty())
		.collect()
}

/// Count how many question tokens appear in interface+summary.
pub fn score_entry(question_tokens: &[String], metadata: &SymbolMetadata) -> usize {
	let haystack = format!("{}\n{}", metadata.interface, metadata.summary).to_lowercase();
	question_tokens
		.iter()
		.filter(|t| haystack.contains(t.as_str()))
		.count()
}

/// Select the top_k positive-scoring index records for a question, sorted
/// by score descending.
pub fn select_relevant(index: &SymbolIndex, question: &str, top_k: usize) -> Vec<RelevantEntry> {
	let question_tokens = tokenize(question);
	let mut scored: Vec<(usize, RelevantEntry)> = Vec::new();

	for (file_path, symbols) in index {
		for (symbol_key, metadata) in symbols {
			let score = score_entry(&question_tokens, metadata);
			if score > 0 {
				scored.push((
					score,
					RelevantEntry {
						file_path: file_path.clone(),
						symbol_key: symbol_key.clone(),
						metadata: metadata.clone(),
					},
				));
			}
		}
	}

	scored.sort_by(|a, b| b.0.cmp(&a.0));
	scored
		.into_iter()
		.take(top_k.max(1))
		.map(|(_, entry)| entry)
		.collect()
}

/// Build a compact context block from relevant index records.
pub fn build_context(relevant: &[RelevantEntry]) -> String {
	if relevant.is_empty() {
		return "No relevant symbols were matched from the metadata index. \
			Answer with best-effort guidance and suggest how to improve the index \
			(e.g., re-run analysis or broaden the question)."
			.to_string();
	}

	let blocks: Vec<String> = relevant
		.iter()
		.map(|entry| {
			format!(
				"File: {}\nSymbol: {}\nInterface:\n{}\nSummary:\n{}",
				entry.file_path,
				entry.symbol_key,
				entry.metadata.interface.trim(),
				entry.metadata.summary.trim()
			)
		})
		.collect();

	blocks.join("\n\n---\n\n")
}

/// Use index metadata + the model to answer a question about the workspace.
pub async fn answer_question(
	llm: &LlmClient,
	question: &str,
	index: &SymbolIndex,
	top_k: usize,
) -> Result<String> {
	let relevant = select_relevant(index, question, top_k);
	let context_block = build_context(&relevant);

	let prompt = format!(
		"You are an expert software engineering assistant.\n\
		\n\
		You are answering questions about a codebase using a metadata index that contains:\n\
		- a symbol interface (signatures/docstrings)\n\
		- a short summary for each symbol\n\
		\n\
		Important rules:\n\
		- Prefer pointing to the most relevant symbol(s) and file paths.\n\
		- If multiple candidates exist, list them and explain why.\n\
		- If the metadata is insufficient to answer confidently, say what is missing and\n\
		  suggest what to inspect next (e.g., which file/class to open).\n\
		- Do NOT invent symbols or file paths that are not present in the metadata.\n\
		\n\
		Metadata context:\n\
		--------------------\n\
		{}\n\
		--------------------\n\
		\n\
		Question:\n\
		{}\n\
		\n\
		Answer:",
		context_block, question
	);

	llm.generate(&prompt, None, Some(0.2), None, None).await
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::BTreeMap;

	fn meta(interface: &str, summary: &str) -> SymbolMetadata {
		SymbolMetadata {
			interface: interface.to_string(),
			summary: summary.to_string(),
		}
	}

	fn sample_index() -> SymbolIndex {
		let mut index = SymbolIndex::new();
		let mut a = BTreeMap::new();
		a.insert(
			"Parser".to_string(),
			meta("class Parser:", "Parses configuration files into sections."),
		);
		a.insert(
			"func:render".to_string(),
			meta("def render(tree):", "Renders a parsed tree back to text."),
		);
		index.insert("parser.py".to_string(), a);

		let mut b = BTreeMap::new();
		b.insert(
			"__module__".to_string(),
			meta("import socket", "Networking helpers."),
		);
		index.insert("net.py".to_string(), b);
		index
	}

	#[test]
	fn test_tokenize_strips_punctuation_and_lowercases() {
		let tokens = tokenize("How does the Parser, work? (quickly!)");
		assert_eq!(tokens, vec!["how", "does", "the", "parser", "work", "quickly"]);
		assert!(tokenize("   ").is_empty());
	}

	#[test]
	fn test_score_entry_counts_overlap() {
		let metadata = meta("class Parser:", "Parses configuration files.");
		let tokens = tokenize("parser configuration missing");
		assert_eq!(score_entry(&tokens, &metadata), 2);
		assert_eq!(score_entry(&tokenize("unrelated words"), &metadata), 0);
	}

	#[test]
	fn test_select_relevant_sorted_and_positive_only() {
		let index = sample_index();
		let relevant = select_relevant(&index, "who parses configuration files", 12);

		assert!(!relevant.is_empty());
		assert_eq!(relevant[0].symbol_key, "Parser");
		assert!(relevant.iter().all(|e| e.symbol_key != "__module__"));

		let none = select_relevant(&index, "zzz qqq", 12);
		assert!(none.is_empty());
	}

	#[test]
	fn test_select_relevant_top_k_floor() {
		let index = sample_index();
		// top_k of 0 still returns at least one match.
		let relevant = select_relevant(&index, "parses", 0);
		assert_eq!(relevant.len(), 1);
	}

	#[test]
	fn test_build_context_blocks_and_fallback() {
		let index = sample_index();
		let relevant = select_relevant(&index, "parses configuration", 12);
		let context = build_context(&relevant);
		assert!(context.contains("File: parser.py"));
		assert!(context.contains("Symbol: Parser"));
		assert!(context.contains("Interface:"));

		let fallback = build_context(&[]);
		assert!(fallback.contains("No relevant symbols"));
	}
}
