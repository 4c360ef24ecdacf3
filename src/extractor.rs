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

// Signature-only interface extraction for Python sources via tree-sitter.
//
// Only definitions that are direct children of the module node are visible:
// methods are reached through their class, nested classes and inner
// functions are invisible by design.

use anyhow::{anyhow, bail, Result};
use tree_sitter::{Node, Parser, Tree};

fn parse(source: &str) -> Result<Tree> {
	let mut parser = Parser::new();
	parser.set_language(&tree_sitter_python::LANGUAGE.into())?;
	let tree = parser
		.parse(source, None)
		.ok_or_else(|| anyhow!("Failed to parse Python source"))?;
	if tree.root_node().has_error() {
		bail!("Failed to parse Python source: syntax error");
	}
	Ok(tree)
}

/// Extract top-level class names and top-level function names.
///
/// Methods and nested functions are not included.
pub fn top_level_symbols(source: &str) -> Result<(Vec<String>, Vec<String>)> {
	let tree = parse(source)?;
	let root = tree.root_node();

	let mut classes = Vec::new();
	let mut functions = Vec::new();

	let mut cursor = root.walk();
	for child in root.named_children(&mut cursor) {
		let def = unwrap_decorated(child);
		match def.kind() {
			"class_definition" => {
				if let Some(name) = node_name(def, source) {
					classes.push(name);
				}
			}
			"function_definition" => {
				if let Some(name) = node_name(def, source) {
					functions.push(name);
				}
			}
			_ => {}
		}
	}

	Ok((classes, functions))
}

/// Render the interface view of a top-level class: its header line, its
/// docstring verbatim, and every public method's header + docstring with
/// the body replaced by `...`.
///
/// Double-underscore methods are treated as private and skipped, except
/// `__init__` which is always part of the interface.
pub fn class_interface(source: &str, class_name: &str) -> Result<String> {
	let tree = parse(source)?;
	let class_node = find_top_level(tree.root_node(), source, "class_definition", class_name)
		.ok_or_else(|| anyhow!("Class '{}' not found in source", class_name))?;
	Ok(render_class(class_node, source))
}

/// Render the interface view of a top-level function.
pub fn function_interface(source: &str, function_name: &str) -> Result<String> {
	let tree = parse(source)?;
	let fn_node = find_top_level(tree.root_node(), source, "function_definition", function_name)
		.ok_or_else(|| anyhow!("Function '{}' not found in source", function_name))?;
	Ok(render_function(fn_node, source))
}

/// Render a whole-module interface view: the module docstring (if any)
/// followed by the interface of every top-level class and function.
pub fn module_interface(source: &str) -> Result<String> {
	let tree = parse(source)?;
	let root = tree.root_node();

	let mut blocks = Vec::new();
	if let Some(doc) = first_string_statement(root) {
		if let Ok(text) = doc.utf8_text(source.as_bytes()) {
			blocks.push(text.to_string());
		}
	}

	let mut cursor = root.walk();
	for child in root.named_children(&mut cursor) {
		let def = unwrap_decorated(child);
		match def.kind() {
			"class_definition" => blocks.push(render_class(def, source)),
			"function_definition" => blocks.push(render_function(def, source)),
			_ => {}
		}
	}

	Ok(blocks.join("\n\n"))
}

fn unwrap_decorated(node: Node) -> Node {
	if node.kind() == "decorated_definition" {
		node.child_by_field_name("definition").unwrap_or(node)
	} else {
		node
	}
}

fn node_name(node: Node, source: &str) -> Option<String> {
	let name = node.child_by_field_name("name")?;
	name.utf8_text(source.as_bytes()).ok().map(|s| s.to_string())
}

fn find_top_level<'a>(root: Node<'a>, source: &str, kind: &str, name: &str) -> Option<Node<'a>> {
	let mut cursor = root.walk();
	for child in root.named_children(&mut cursor) {
		let def = unwrap_decorated(child);
		if def.kind() == kind && node_name(def, source).as_deref() == Some(name) {
			return Some(def);
		}
	}
	None
}

/// Header of a definition: everything before its body, at its original
/// indentation. Covers multi-line signatures.
fn node_header(node: Node, source: &str) -> String {
	let end = node
		.child_by_field_name("body")
		.map(|body| body.start_byte())
		.unwrap_or_else(|| node.end_byte());
	let header = source[node.start_byte()..end].trim_end();
	format!("{}{}", " ".repeat(node.start_position().column), header)
}

/// The docstring string node of a definition body, when its first
/// statement is a bare string expression.
fn docstring_node<'a>(def: Node<'a>) -> Option<Node<'a>> {
	first_string_statement(def.child_by_field_name("body")?)
}

fn first_string_statement(body: Node) -> Option<Node> {
	let mut cursor = body.walk();
	let first = body.named_children(&mut cursor).next()?;
	if first.kind() != "expression_statement" {
		return None;
	}
	let mut inner_cursor = first.walk();
	let inner = first.named_children(&mut inner_cursor).next()?;
	if inner.kind() == "string" {
		Some(inner)
	} else {
		None
	}
}

fn render_docstring(doc: Node, source: &str, indent: usize) -> Option<String> {
	let text = doc.utf8_text(source.as_bytes()).ok()?;
	// Continuation lines keep their original layout from the source slice.
	Some(format!("{}{}", " ".repeat(indent), text))
}

fn render_class(class_node: Node, source: &str) -> String {
	let col = class_node.start_position().column;
	let mut lines = vec![node_header(class_node, source)];

	if let Some(doc) = docstring_node(class_node) {
		if let Some(rendered) = render_docstring(doc, source, col + 4) {
			lines.push(rendered);
		}
	}

	if let Some(body) = class_node.child_by_field_name("body") {
		let mut cursor = body.walk();
		for stmt in body.named_children(&mut cursor) {
			let def = unwrap_decorated(stmt);
			if def.kind() != "function_definition" {
				continue;
			}
			let Some(name) = node_name(def, source) else {
				continue;
			};
			if name.starts_with("__") && name != "__init__" {
				continue;
			}
			lines.push(render_function(def, source));
		}
	}

	lines.join("\n")
}

fn render_function(def: Node, source: &str) -> String {
	let col = def.start_position().column;
	let mut lines = vec![node_header(def, source)];

	if let Some(doc) = docstring_node(def) {
		if let Some(rendered) = render_docstring(doc, source, col + 4) {
			lines.push(rendered);
		}
	}

	lines.push(format!("{}...", " ".repeat(col + 4)));
	lines.join("\n")
}
