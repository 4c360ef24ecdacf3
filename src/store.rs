use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Reserved key under which module-level metadata is stored.
pub const MODULE_KEY: &str = "__module__";

/// Prefix used for top-level functions in the flat index.
pub const FUNCTION_KEY_PREFIX: &str = "func:";

/// Reserved bucket name grouping top-level functions in folder metadata.
pub const FUNCTIONS_BUCKET: &str = "__functions__";

/// Typed symbol identity inside one source file.
///
/// The JSON files keep the string convention (`__module__`, plain class
/// names, `func:` prefixed functions) so indexes stay readable by other
/// tools, but in memory the kinds are kept apart.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SymbolKey {
	Module,
	Class(String),
	Function(String),
}

impl SymbolKey {
	/// Parse a raw index key back into its typed form.
	pub fn parse(raw: &str) -> Self {
		if raw == MODULE_KEY {
			SymbolKey::Module
		} else if let Some(name) = raw.strip_prefix(FUNCTION_KEY_PREFIX) {
			SymbolKey::Function(name.to_string())
		} else {
			SymbolKey::Class(raw.to_string())
		}
	}

	/// Render the key as stored in the JSON index.
	pub fn as_key(&self) -> String {
		match self {
			SymbolKey::Module => MODULE_KEY.to_string(),
			SymbolKey::Class(name) => name.clone(),
			SymbolKey::Function(name) => format!("{}{}", FUNCTION_KEY_PREFIX, name),
		}
	}
}

impl fmt::Display for SymbolKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.as_key())
	}
}

/// Interface + summary pair for one symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolMetadata {
	#[serde(default)]
	pub interface: String,
	#[serde(default)]
	pub summary: String,
}

/// index[file_path][symbol_key] = SymbolMetadata
pub type SymbolIndex = BTreeMap<String, BTreeMap<String, SymbolMetadata>>;

/// JSON-backed store for symbol metadata across a workspace.
///
/// The stored JSON has the shape:
///
/// ```json
/// {
///   "<file_path>": {
///     "<symbol_key>": { "interface": "...", "summary": "..." }
///   }
/// }
/// ```
///
/// Paths are stored as strings relative to the workspace root. Writes are
/// last-writer-wins; the file on disk is the only persisted representation.
pub struct MetadataStore {
	json_path: PathBuf,
	index: SymbolIndex,
}

impl MetadataStore {
	/// Open a store backed by the given JSON file, loading any existing data.
	pub fn open(json_path: impl Into<PathBuf>) -> Result<Self> {
		let mut store = Self {
			json_path: json_path.into(),
			index: SymbolIndex::new(),
		};
		if store.json_path.exists() {
			store.load()?;
		}
		Ok(store)
	}

	pub fn json_path(&self) -> &Path {
		&self.json_path
	}

	/// Reload the index from disk. Fails if the file holds malformed JSON.
	pub fn load(&mut self) -> Result<()> {
		self.index = Self::load_index(&self.json_path)?;
		Ok(())
	}

	/// Read a flat index directly from a JSON file without opening a store.
	pub fn load_index(path: &Path) -> Result<SymbolIndex> {
		let raw = fs::read_to_string(path)
			.context(format!("Index file not found: {}", path.display()))?;
		serde_json::from_str(&raw)
			.context(format!("Invalid JSON in index file: {}", path.display()))
	}

	/// Persist the whole index as pretty-printed UTF-8 JSON.
	pub fn save(&self) -> Result<()> {
		if let Some(parent) = self.json_path.parent() {
			fs::create_dir_all(parent).context(format!(
				"Failed to create index directory: {}",
				parent.display()
			))?;
		}
		let serialized = serde_json::to_string_pretty(&self.index)?;
		fs::write(&self.json_path, serialized).context(format!(
			"Failed to write index file: {}",
			self.json_path.display()
		))
	}

	/// Set or update the metadata for one symbol in one file.
	/// Setting an existing (file, symbol) pair overwrites the previous entry.
	pub fn set(&mut self, file_path: &str, key: &SymbolKey, metadata: SymbolMetadata) {
		self.index
			.entry(file_path.to_string())
			.or_default()
			.insert(key.as_key(), metadata);
	}

	pub fn get(&self, file_path: &str, key: &SymbolKey) -> Option<&SymbolMetadata> {
		self.index.get(file_path)?.get(&key.as_key())
	}

	/// Return an independent copy of the entire index.
	pub fn all(&self) -> SymbolIndex {
		self.index.clone()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	fn meta(interface: &str, summary: &str) -> SymbolMetadata {
		SymbolMetadata {
			interface: interface.to_string(),
			summary: summary.to_string(),
		}
	}

	#[test]
	fn test_symbol_key_round_trip() {
		for key in [
			SymbolKey::Module,
			SymbolKey::Class("Foo".to_string()),
			SymbolKey::Function("helper".to_string()),
		] {
			assert_eq!(SymbolKey::parse(&key.as_key()), key);
		}
		assert_eq!(SymbolKey::Module.as_key(), "__module__");
		assert_eq!(SymbolKey::Function("helper".to_string()).as_key(), "func:helper");
	}

	#[test]
	fn test_set_get_and_overwrite() {
		let dir = tempdir().unwrap();
		let mut store = MetadataStore::open(dir.path().join("index.json")).unwrap();
		let key = SymbolKey::Class("Foo".to_string());

		store.set("a.py", &key, meta("class Foo:", "first"));
		store.set("a.py", &key, meta("class Foo:", "second"));

		assert_eq!(store.get("a.py", &key).unwrap().summary, "second");
		assert_eq!(store.all().get("a.py").unwrap().len(), 1);
		assert!(store.get("a.py", &SymbolKey::Module).is_none());
		assert!(store.get("missing.py", &key).is_none());
	}

	#[test]
	fn test_save_load_round_trip() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("nested").join("index.json");

		let mut store = MetadataStore::open(&path).unwrap();
		store.set("a.py", &SymbolKey::Module, meta("import os", "module summary"));
		store.set("a.py", &SymbolKey::Class("Foo".to_string()), meta("class Foo:", "a class"));
		store.set(
			"pkg/b.py",
			&SymbolKey::Function("helper".to_string()),
			meta("def helper():", "ünïcode summary"),
		);
		store.save().unwrap();

		let reloaded = MetadataStore::open(&path).unwrap();
		assert_eq!(reloaded.all(), store.all());
		assert_eq!(
			reloaded
				.get("pkg/b.py", &SymbolKey::Function("helper".to_string()))
				.unwrap()
				.summary,
			"ünïcode summary"
		);
	}

	#[test]
	fn test_load_tolerates_missing_fields() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("index.json");
		fs::write(&path, r#"{"a.py": {"Foo": {"interface": "class Foo:"}}}"#).unwrap();

		let store = MetadataStore::open(&path).unwrap();
		let entry = store.get("a.py", &SymbolKey::Class("Foo".to_string())).unwrap();
		assert_eq!(entry.interface, "class Foo:");
		assert_eq!(entry.summary, "");
	}

	#[test]
	fn test_load_malformed_json_fails() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("index.json");
		fs::write(&path, "{not valid json").unwrap();
		assert!(MetadataStore::open(&path).is_err());
	}
}
