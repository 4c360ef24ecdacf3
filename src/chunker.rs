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

// Character-window text chunking for long-document prompts

use anyhow::{bail, Result};

/// Split text into overlapping character-based chunks.
///
/// This is a simple, model-agnostic chunking strategy that works reasonably
/// well for local LLM use cases without needing tokenization. Windows are
/// measured in characters (not bytes) so multi-byte text never splits inside
/// a code point. Each chunk is trimmed; empty chunks are dropped.
pub fn chunk_text(text: &str, max_chars: usize, overlap: usize) -> Result<Vec<String>> {
	if max_chars == 0 {
		bail!("max_chars must be positive");
	}
	if overlap >= max_chars {
		bail!("overlap must be smaller than max_chars");
	}

	let chars: Vec<char> = text.trim().chars().collect();
	if chars.is_empty() {
		return Ok(Vec::new());
	}

	let mut chunks = Vec::new();
	let mut start = 0usize;
	let len = chars.len();

	while start < len {
		let end = (start + max_chars).min(len);
		let chunk: String = chars[start..end].iter().collect();
		let chunk = chunk.trim();
		if !chunk.is_empty() {
			chunks.push(chunk.to_string());
		}
		if end == len {
			break;
		}
		// Move the window forward with overlap; overlap < max_chars
		// guarantees forward progress.
		start = end - overlap;
	}

	Ok(chunks)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_empty_and_whitespace_input() {
		assert!(chunk_text("", 100, 10).unwrap().is_empty());
		assert!(chunk_text("   \n\t  ", 100, 10).unwrap().is_empty());
	}

	#[test]
	fn test_invalid_parameters() {
		assert!(chunk_text("hello", 0, 0).is_err());
		assert!(chunk_text("hello", 10, 10).is_err());
		assert!(chunk_text("hello", 10, 11).is_err());
	}

	#[test]
	fn test_short_input_single_chunk() {
		let chunks = chunk_text("hello world", 100, 10).unwrap();
		assert_eq!(chunks, vec!["hello world".to_string()]);
	}

	#[test]
	fn test_non_overlapping_tiling() {
		let text = "abcdefghij";
		let chunks = chunk_text(text, 4, 0).unwrap();
		assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
		assert_eq!(chunks.concat(), text);
	}

	#[test]
	fn test_consecutive_chunks_overlap() {
		// No whitespace so trimming cannot disturb the window boundaries.
		let text: String = (0..1000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
		let chunks = chunk_text(&text, 300, 50).unwrap();
		assert!(chunks.len() > 1);
		for window in chunks.windows(2) {
			let tail: String = window[0].chars().rev().take(50).collect::<Vec<_>>().into_iter().rev().collect();
			assert!(window[1].starts_with(&tail));
		}
	}

	#[test]
	fn test_chunk_size_bound() {
		let text = "x".repeat(12345);
		for chunk in chunk_text(&text, 1000, 100).unwrap() {
			assert!(!chunk.is_empty());
			assert!(chunk.chars().count() <= 1000);
		}
	}

	#[test]
	fn test_nine_thousand_chars_three_chunks() {
		let text: String = (0..9000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
		let chunks = chunk_text(&text, 4000, 200).unwrap();
		assert_eq!(chunks.len(), 3);
		// Third window starts at 7600 and runs to the end of the input.
		let tail: String = text.chars().skip(7600).collect();
		assert_eq!(chunks[2], tail);
		assert!(text.ends_with(chunks[2].as_str()));
	}

	#[test]
	fn test_multibyte_text() {
		let text = "héllo wörld ".repeat(50);
		let chunks = chunk_text(&text, 40, 5).unwrap();
		assert!(!chunks.is_empty());
		for chunk in &chunks {
			assert!(chunk.chars().count() <= 40);
		}
	}
}
