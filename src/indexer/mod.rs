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

// Workspace analysis: walks a Python workspace and builds two outputs,
// a flat (file, symbol) metadata index and per-folder metadata files
// that embed their whole subtree.

pub mod search;

use crate::extractor;
use crate::llm::LlmClient;
use crate::service::CodeService;
use crate::store::{MetadataStore, SymbolKey, SymbolMetadata, FUNCTIONS_BUCKET};
use crate::{log_debug, log_error, log_info};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directory names never descended into during the walk.
pub const SKIP_DIRS: &[&str] = &[
	".venv",
	"venv",
	"__pycache__",
	".git",
	"node_modules",
	"target",
];

/// Value stored per symbol key inside one file of a folder node. Most keys
/// map to plain metadata; the `__functions__` bucket maps function names to
/// their metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileEntry {
	Functions(BTreeMap<String, SymbolMetadata>),
	Symbol(SymbolMetadata),
}

/// One folder in the workspace hierarchy. `path` is relative to the
/// workspace root, `"."` for the root itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FolderNode {
	pub path: String,
	pub files: BTreeMap<String, BTreeMap<String, FileEntry>>,
	pub subfolders: BTreeMap<String, FolderNode>,
}

impl FolderNode {
	fn new(path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			..Default::default()
		}
	}

	/// Retrieve or create the node for a relative directory like
	/// `"."`, `"pkg"` or `"pkg/subpkg"`.
	fn get_or_create(&mut self, rel_dir: &str) -> &mut FolderNode {
		if rel_dir == "." || rel_dir.is_empty() {
			return self;
		}

		let mut cur = self;
		let mut running = String::new();
		for part in rel_dir.split('/') {
			if !running.is_empty() {
				running.push('/');
			}
			running.push_str(part);
			let path = running.clone();
			cur = cur
				.subfolders
				.entry(part.to_string())
				.or_insert_with(|| FolderNode::new(path));
		}
		cur
	}
}

/// Outcome counters for one analysis run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisReport {
	pub analyzed_files: usize,
	pub failed_files: Vec<String>,
}

/// Analyze a workspace directory tree and build structured metadata.
///
/// For each Python file the analyzer always produces a module-level
/// interface + summary, then one entry per top-level class and per
/// top-level function. File failures are logged and collected; the run
/// continues with the next file.
pub struct WorkspaceAnalyzer<'a> {
	root_dir: PathBuf,
	llm: &'a LlmClient,
	store: MetadataStore,
	repo_context: String,
	folder_metadata_filename: String,
}

impl<'a> WorkspaceAnalyzer<'a> {
	pub fn new(root_dir: impl Into<PathBuf>, llm: &'a LlmClient, store: MetadataStore) -> Self {
		Self {
			root_dir: root_dir.into(),
			llm,
			store,
			repo_context: String::new(),
			folder_metadata_filename: "metadata.json".to_string(),
		}
	}

	/// Repository-level context text blended into every summary prompt.
	pub fn with_repo_context(mut self, repo_context: impl Into<String>) -> Self {
		self.repo_context = repo_context.into();
		self
	}

	pub fn with_folder_metadata_filename(mut self, filename: impl Into<String>) -> Self {
		self.folder_metadata_filename = filename.into();
		self
	}

	/// Analyze all Python files under the root directory.
	///
	/// Writes a metadata file into every folder touched by the walk and
	/// saves the flat store once at the end.
	pub async fn analyze(mut self) -> Result<AnalysisReport> {
		log_info!("Starting workspace analysis under {}", self.root_dir.display());

		let files = self.collect_python_files();
		let mut tree = FolderNode::new(".");
		let mut report = AnalysisReport::default();

		for file_path in files {
			match self.analyze_file(&file_path, &mut tree).await {
				Ok(()) => report.analyzed_files += 1,
				Err(e) => {
					log_error!("Failed to analyze file {}: {:#}", file_path.display(), e);
					report.failed_files.push(file_path.display().to_string());
				}
			}
		}

		self.write_folder_tree(&tree)?;

		log_info!("Saving flat metadata to {}", self.store.json_path().display());
		self.store.save()?;

		if !report.failed_files.is_empty() {
			log_error!("{} file(s) failed analysis", report.failed_files.len());
		}

		Ok(report)
	}

	/// All Python source files under the root, in sorted order, skipping
	/// virtualenv, VCS and build directories.
	fn collect_python_files(&self) -> Vec<PathBuf> {
		fn skipped(entry: &DirEntry) -> bool {
			entry.file_type().is_dir()
				&& entry
					.file_name()
					.to_str()
					.map(|name| SKIP_DIRS.contains(&name))
					.unwrap_or(false)
		}

		let mut files: Vec<PathBuf> = WalkDir::new(&self.root_dir)
			.into_iter()
			.filter_entry(|e| !skipped(e))
			.filter_map(|e| e.ok())
			.filter(|e| {
				e.file_type().is_file()
					&& e.path().extension().map(|ext| ext == "py").unwrap_or(false)
			})
			.map(|e| e.into_path())
			.collect();
		files.sort();
		files
	}

	async fn analyze_file(&mut self, file_path: &Path, tree: &mut FolderNode) -> Result<()> {
		log_info!("Analyzing file: {}", file_path.display());

		let code = fs::read_to_string(file_path)
			.context(format!("Failed to read file: {}", file_path.display()))?;
		let (class_names, function_names) = extractor::top_level_symbols(&code)?;

		let relative = file_path
			.strip_prefix(&self.root_dir)
			.unwrap_or(file_path)
			.to_path_buf();
		let rel_file = path_to_string(&relative);
		let rel_dir = relative
			.parent()
			.filter(|p| !p.as_os_str().is_empty())
			.map(path_to_string)
			.unwrap_or_else(|| ".".to_string());
		let file_name = relative
			.file_name()
			.map(|n| n.to_string_lossy().to_string())
			.unwrap_or_else(|| rel_file.clone());

		let file_context = self.build_file_context(&rel_file);
		let service = CodeService::new(code, file_context, self.llm).with_file_path(&rel_file);

		let node = tree.get_or_create(&rel_dir);
		let file_entries = node.files.entry(file_name).or_default();

		// Module-level metadata, always.
		let module_metadata = SymbolMetadata {
			interface: service.get_module_interface().await?,
			summary: service.describe_module(None).await?,
		};
		file_entries.insert(
			SymbolKey::Module.as_key(),
			FileEntry::Symbol(module_metadata.clone()),
		);
		self.store.set(&rel_file, &SymbolKey::Module, module_metadata);
		log_debug!("Indexed module: {}", rel_file);

		for class_name in &class_names {
			let metadata = SymbolMetadata {
				interface: service.get_class_interface(class_name).await?,
				summary: service.describe_class(class_name, None).await?,
			};
			let key = SymbolKey::Class(class_name.clone());
			file_entries.insert(key.as_key(), FileEntry::Symbol(metadata.clone()));
			self.store.set(&rel_file, &key, metadata);
			log_debug!("Indexed class: {}", class_name);
		}

		if !function_names.is_empty() {
			let mut bucket = BTreeMap::new();
			for fn_name in &function_names {
				let metadata = SymbolMetadata {
					interface: service.get_function_interface(fn_name).await?,
					summary: service.describe_function(fn_name, None).await?,
				};
				bucket.insert(fn_name.clone(), metadata.clone());
				self.store
					.set(&rel_file, &SymbolKey::Function(fn_name.clone()), metadata);
				log_debug!("Indexed function: {}", fn_name);
			}
			file_entries.insert(FUNCTIONS_BUCKET.to_string(), FileEntry::Functions(bucket));
		}

		Ok(())
	}

	fn build_file_context(&self, relative_path: &str) -> String {
		let base = self.repo_context.trim();
		if base.is_empty() {
			format!("File: {}", relative_path)
		} else {
			format!("{}\n\nFile: {}", base, relative_path)
		}
	}

	/// Write a metadata JSON file into every folder of the tree. Each
	/// folder's file embeds its whole subtree.
	fn write_folder_tree(&self, node: &FolderNode) -> Result<()> {
		let folder_path = if node.path == "." {
			self.root_dir.clone()
		} else {
			self.root_dir.join(&node.path)
		};
		fs::create_dir_all(&folder_path).context(format!(
			"Failed to create folder: {}",
			folder_path.display()
		))?;

		let out_path = folder_path.join(&self.folder_metadata_filename);
		let serialized = serde_json::to_string_pretty(node)?;
		fs::write(&out_path, serialized).context(format!(
			"Failed to write folder metadata: {}",
			out_path.display()
		))?;
		log_info!("Wrote folder metadata to {}", out_path.display());

		for child in node.subfolders.values() {
			self.write_folder_tree(child)?;
		}

		Ok(())
	}
}

fn path_to_string(path: &Path) -> String {
	// Index keys always use forward slashes so they stay portable.
	path.to_string_lossy().replace('\\', "/")
}
