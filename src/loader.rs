//! Schema Loading
//!
//! Reads schema documents (JSON or YAML) from the filesystem and pulls
//! definitions referenced from other files into the document, so the graph
//! builder only ever sees local `#/...` references.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{CompileError, Result};
use crate::graph::SchemaPath;

const EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

/// Keywords whose values are data, not schemas
const DATA_KEYWORDS: &[&str] = &["const", "enum", "default", "examples", "example"];

/// Configuration for schema discovery
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Skip files whose relative path starts with one of these
    pub skip_prefixes: Vec<String>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            skip_prefixes: vec![
                "target/".to_string(),       // Rust build artifacts
                ".git/".to_string(),         // Git repository
                "node_modules/".to_string(), // Node.js dependencies
                "generated/".to_string(),    // Our own output
            ],
        }
    }
}

/// A decoded schema document and where it came from
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    pub path: PathBuf,
    pub value: Value,
}

impl SchemaDocument {
    /// File name without `.json` / `.yaml` / `.schema.json`
    pub fn stem(&self) -> String {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        strip_schema_extension(&name).to_string()
    }
}

/// `user.schema.json` -> `user`
pub fn strip_schema_extension(name: &str) -> &str {
    let base = EXTENSIONS
        .iter()
        .find_map(|ext| name.strip_suffix(ext).and_then(|n| n.strip_suffix('.')))
        .unwrap_or(name);
    base.strip_suffix(".schema").unwrap_or(base)
}

/// Read and decode one document, resolving references into other files
pub fn load_document(path: &Path) -> Result<SchemaDocument> {
    let mut value = parse_file(path)?;

    let mut resolver = ExternalRefs::default();
    resolver.in_progress.insert(canonical(path));
    resolver.walk(&mut value, base_dir(path), &SchemaPath::root(), false)?;
    let pulled = resolver.merge_into(&mut value);

    tracing::debug!(path = %path.display(), external_defs = pulled, "loaded schema document");
    Ok(SchemaDocument {
        path: path.to_path_buf(),
        value,
    })
}

/// Decode JSON, or YAML for `.yaml` / `.yml`
fn parse_file(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => Ok(serde_yaml::from_str::<Value>(&content)?),
        _ => Ok(serde_json::from_str(&content)?),
    }
}

fn base_dir(path: &Path) -> &Path {
    path.parent().unwrap_or_else(|| Path::new("."))
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

// =============================================================================
// External References
// =============================================================================

/// Collects definitions from referenced files while rewriting references.
///
/// `./other.json#/$defs/Name` becomes `#/$defs/Name` and `Name` is copied
/// into the root `$defs` (definitions already in the document win). A
/// reference without a fragment inlines the whole file. Every `$defs` block
/// of a referenced file is hoisted too, so its own local references keep
/// resolving.
#[derive(Default)]
struct ExternalRefs {
    defs: BTreeMap<String, Value>,
    /// Files already resolved, by canonical path
    loaded: BTreeMap<PathBuf, Value>,
    /// Files being resolved; a reference back into one of them only rewrites
    in_progress: BTreeSet<PathBuf>,
}

impl ExternalRefs {
    fn walk(&mut self, value: &mut Value, base: &Path, path: &SchemaPath, foreign: bool) -> Result<()> {
        match value {
            Value::Object(map) => {
                let reference = map.get("$ref").and_then(Value::as_str).map(str::to_string);
                if let Some(reference) = reference {
                    if !reference.starts_with('#') {
                        self.external(map, &reference, base, path)?;
                    } else if foreign {
                        if let Some(name) = reference.strip_prefix("#/definitions/") {
                            map.insert("$ref".to_string(), Value::String(format!("#/$defs/{}", name)));
                        }
                    }
                }

                for (key, child) in map.iter_mut() {
                    if DATA_KEYWORDS.contains(&key.as_str()) {
                        continue;
                    }
                    self.walk(child, base, &path.key(key.as_str()), foreign)?;
                }
            }
            Value::Array(items) => {
                for (i, item) in items.iter_mut().enumerate() {
                    self.walk(item, base, &path.index(i), foreign)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Rewrite or inline one reference to another file
    fn external(&mut self, node: &mut Map<String, Value>, reference: &str, base: &Path, path: &SchemaPath) -> Result<()> {
        let (file, pointer) = match reference.split_once('#') {
            Some((file, pointer)) => (file, pointer),
            None => (reference, ""),
        };
        let unresolved = || CompileError::UnresolvedReference {
            path: path.key("$ref"),
            reference: reference.to_string(),
        };

        let full = base.join(file);
        if !full.is_file() {
            tracing::warn!(reference, file = %full.display(), "referenced file not found");
            return Err(unresolved());
        }
        let key = canonical(&full);
        let tokens: Vec<String> = pointer
            .strip_prefix('/')
            .map(|p| p.split('/').map(|t| t.replace("~1", "/").replace("~0", "~")).collect())
            .unwrap_or_default();

        let name = match tokens.as_slice() {
            [container, name] if container == "$defs" || container == "definitions" => Some(name.clone()),
            [name] => Some(name.clone()),
            _ => None,
        };

        if self.in_progress.contains(&key) {
            // Its definitions are hoisted when it finishes
            return match name {
                Some(name) => {
                    node.insert("$ref".to_string(), Value::String(format!("#/$defs/{}", name)));
                    Ok(())
                }
                None => Err(CompileError::invalid(
                    path,
                    format!("'{}' inlines a file that is still being resolved", reference),
                )),
            };
        }

        let document = self.resolve_file(&full, key)?;
        let target = if pointer.is_empty() { Some(&document) } else { document.pointer(pointer) };
        let Some(target) = target.cloned() else {
            return Err(unresolved());
        };

        match name {
            Some(name) => {
                self.defs.entry(name.clone()).or_insert(target);
                node.insert("$ref".to_string(), Value::String(format!("#/$defs/{}", name)));
            }
            None => inline(node, target),
        }
        Ok(())
    }

    /// Load a referenced file once, resolve its own references and hoist its definitions
    fn resolve_file(&mut self, file: &Path, key: PathBuf) -> Result<Value> {
        if let Some(done) = self.loaded.get(&key) {
            return Ok(done.clone());
        }

        let mut value = parse_file(file)?;
        self.in_progress.insert(key.clone());
        self.walk(&mut value, base_dir(file), &SchemaPath::root(), true)?;
        self.in_progress.remove(&key);

        for container in ["$defs", "definitions"] {
            if let Some(Value::Object(defs)) = value.get(container) {
                for (name, schema) in defs {
                    self.defs.entry(name.clone()).or_insert_with(|| schema.clone());
                }
            }
        }

        tracing::debug!(file = %file.display(), "resolved referenced file");
        self.loaded.insert(key, value.clone());
        Ok(value)
    }

    /// Add collected definitions the document does not define itself.
    /// Returns how many were added.
    fn merge_into(self, document: &mut Value) -> usize {
        let Value::Object(root) = document else {
            return 0;
        };

        let existing: BTreeSet<String> = ["$defs", "definitions"]
            .iter()
            .filter_map(|c| root.get(*c).and_then(Value::as_object))
            .flat_map(|defs| defs.keys().cloned())
            .collect();

        let missing: Vec<(String, Value)> = self.defs.into_iter().filter(|(name, _)| !existing.contains(name)).collect();
        let pulled = missing.len();
        if pulled == 0 {
            return 0;
        }

        let defs = root.entry("$defs").or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(defs) = defs {
            defs.extend(missing);
        }
        pulled
    }
}

/// Replace a `$ref` node by the referenced schema. Keywords next to the
/// reference take precedence; definitions were hoisted already.
fn inline(node: &mut Map<String, Value>, target: Value) {
    node.remove("$ref");
    let Value::Object(target) = target else {
        return;
    };
    for (key, value) in target {
        if matches!(key.as_str(), "$defs" | "definitions" | "$schema" | "$id") {
            continue;
        }
        node.entry(key).or_insert(value);
    }
}

/// All `.json` / `.yaml` / `.yml` files under a directory, sorted by path
pub fn discover_documents(dir: &Path, config: &LoadConfig) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let schema_file = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| EXTENSIONS.contains(&e));
        if !schema_file {
            continue;
        }

        let relative = path.strip_prefix(dir).unwrap_or(path).to_string_lossy().replace('\\', "/");
        if config.skip_prefixes.iter().any(|p| relative.starts_with(p)) {
            continue;
        }

        found.push(path.to_path_buf());
    }

    found.sort();
    tracing::debug!(dir = %dir.display(), documents = found.len(), "discovered schema documents");
    Ok(found)
}

/// Load a single file, or every document under a directory
pub fn load_documents(input: &Path, config: &LoadConfig) -> Result<Vec<SchemaDocument>> {
    if input.is_dir() {
        discover_documents(input, config)?
            .iter()
            .map(|path| load_document(path))
            .collect()
    } else {
        Ok(vec![load_document(input)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_discover_skips_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::create_dir_all(dir.path().join("node_modules")).unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(dir.path().join("nested/a.schema.json"), "{}").unwrap();
        fs::write(dir.path().join("node_modules/x.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::write(dir.path().join("c.yml"), "{}").unwrap();

        let found = discover_documents(dir.path(), &LoadConfig::default()).unwrap();
        assert_eq!(
            found,
            vec![dir.path().join("b.json"), dir.path().join("c.yml"), dir.path().join("nested/a.schema.json")]
        );

        let docs = load_documents(dir.path(), &LoadConfig::default()).unwrap();
        assert_eq!(docs[1].stem(), "a");
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_document(&path), Err(CompileError::Json(_))));
    }

    #[test]
    fn test_strip_schema_extension() {
        assert_eq!(strip_schema_extension("user.json"), "user");
        assert_eq!(strip_schema_extension("user.schema.json"), "user");
        assert_eq!(strip_schema_extension("order.yaml"), "order");
        assert_eq!(strip_schema_extension("README"), "README");
    }

    #[test]
    fn test_yaml_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "user.yaml",
            "title: User\ntype: object\nproperties:\n  name:\n    type: string\nrequired: [name]\n",
        );

        let doc = load_document(&path).unwrap();
        assert_eq!(doc.stem(), "user");
        assert_eq!(doc.value["properties"]["name"], json!({"type": "string"}));
        assert_eq!(doc.value["required"], json!(["name"]));
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "broken.yaml", "type: [object\n");
        assert!(matches!(load_document(&path), Err(CompileError::Yaml(_))));
    }

    #[test]
    fn test_fragment_reference_is_pulled_into_defs() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "shared/common.yaml",
            "$defs:\n  Money:\n    type: object\n    properties:\n      currency:\n        $ref: \"#/definitions/Currency\"\ndefinitions:\n  Currency:\n    enum: [EUR, USD]\n",
        );
        let main = write(
            dir.path(),
            "order.json",
            r##"{"type": "object", "properties": {
                "total": {"$ref": "./shared/common.yaml#/$defs/Money"},
                "sample": {"const": {"$ref": "./missing.json"}}
            }}"##,
        );

        let doc = load_document(&main).unwrap();
        assert_eq!(doc.value["properties"]["total"], json!({"$ref": "#/$defs/Money"}));
        assert_eq!(doc.value["properties"]["sample"], json!({"const": {"$ref": "./missing.json"}}));
        assert_eq!(doc.value["$defs"]["Money"]["properties"]["currency"], json!({"$ref": "#/$defs/Currency"}));
        assert_eq!(doc.value["$defs"]["Currency"], json!({"enum": ["EUR", "USD"]}));
    }

    #[test]
    fn test_reference_without_fragment_is_inlined() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "address.json",
            r#"{"title": "Address", "type": "object", "properties": {"city": {"type": "string"}}, "required": ["city"]}"#,
        );
        let main = write(
            dir.path(),
            "user.json",
            r#"{"type": "object", "properties": {"home": {"$ref": "./address.json", "description": "Where they live"}}}"#,
        );

        let doc = load_document(&main).unwrap();
        let home = &doc.value["properties"]["home"];
        assert!(home.get("$ref").is_none());
        assert_eq!(home["title"], json!("Address"));
        assert_eq!(home["description"], json!("Where they live"));
        assert_eq!(home["required"], json!(["city"]));
        assert!(doc.value.get("$defs").is_none());
    }

    #[test]
    fn test_local_definitions_win_over_pulled_ones() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "other.json", r#"{"$defs": {"Id": {"type": "integer"}, "Tag": {"type": "string"}}}"#);
        let main = write(
            dir.path(),
            "main.json",
            r#"{"$defs": {"Id": {"type": "string"}, "Item": {"$ref": "./other.json#/$defs/Tag"}}}"#,
        );

        let doc = load_document(&main).unwrap();
        assert_eq!(doc.value["$defs"]["Id"], json!({"type": "string"}));
        assert_eq!(doc.value["$defs"]["Tag"], json!({"type": "string"}));
        assert_eq!(doc.value["$defs"]["Item"], json!({"$ref": "#/$defs/Tag"}));
    }

    #[test]
    fn test_reference_cycle_between_files() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "leaf.json",
            r#"{"$defs": {"Leaf": {"type": "object", "properties": {"parent": {"$ref": "./tree.json#/$defs/Tree"}}}}}"#,
        );
        let main = write(
            dir.path(),
            "tree.json",
            r#"{"$defs": {"Tree": {"type": "object", "properties": {"leaves": {"type": "array", "items": {"$ref": "./leaf.json#/$defs/Leaf"}}}}}}"#,
        );

        let doc = load_document(&main).unwrap();
        assert_eq!(doc.value["$defs"]["Tree"]["properties"]["leaves"]["items"], json!({"$ref": "#/$defs/Leaf"}));
        assert_eq!(doc.value["$defs"]["Leaf"]["properties"]["parent"], json!({"$ref": "#/$defs/Tree"}));
    }

    #[test]
    fn test_inlining_a_file_into_itself_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let main = write(
            dir.path(),
            "loop.json",
            r#"{"type": "object", "properties": {"again": {"$ref": "./loop.json"}}}"#,
        );
        assert!(matches!(load_document(&main), Err(CompileError::InvalidSchema { .. })));
    }

    #[test]
    fn test_missing_file_is_unresolved() {
        let dir = tempfile::tempdir().unwrap();
        let main = write(
            dir.path(),
            "main.json",
            r#"{"properties": {"x": {"$ref": "./nowhere.json#/$defs/X"}}}"#,
        );

        match load_document(&main) {
            Err(CompileError::UnresolvedReference { path, reference }) => {
                assert_eq!(reference, "./nowhere.json#/$defs/X");
                assert_eq!(path.to_string(), "#/properties/x/$ref");
            }
            other => panic!("expected UnresolvedReference, got {:?}", other.map(|d| d.path)),
        }
    }
}
