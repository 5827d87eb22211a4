//! The document store: the immutable corpus, loaded once at startup.
//!
//! A corpus is a file or a directory. Directories are walked recursively in
//! file-name order so that document ids are stable across runs. Supported
//! inputs:
//!
//! - `.json`: a single record or an array of records
//! - `.jsonl`: one record per non-blank line
//! - `.md`, `.markdown`, `.txt`: one document per file, titled by the first
//!   heading or else the file stem
//!
//! A record is `{ "id"?, "title", "body" | "text", "url" | "source_ref" | "sourceRef"? }`.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::LoadError;
use crate::normalize::normalize;

pub type DocId = u32;

lazy_static! {
    static ref ATX_HEADING: Regex = Regex::new(r"(?m)^[ \t]{0,3}#{1,6}[ \t]+(.+?)[ \t#]*$").expect("valid regex");
}

/// One unit of retrieval.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: DocId,
    /// Identifier from the corpus itself: the record `id`, or a path-derived one.
    pub external_id: String,
    pub title: String,
    pub source_ref: String,
    /// Normalized body; the only text the index sees.
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct InputDoc {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(alias = "text")]
    pub body: String,
    #[serde(default, alias = "url", alias = "sourceRef")]
    pub source_ref: Option<String>,
}

#[derive(Debug, Default)]
pub struct DocumentStore {
    docs: Vec<Document>,
}

impl DocumentStore {
    /// Load every document under `source`. Any unreadable or malformed input fails the whole load.
    pub fn load<P: AsRef<Path>>(source: P) -> Result<Self, LoadError> {
        let root = source.as_ref();
        let meta = fs::metadata(root).map_err(|e| LoadError::Io { path: root.to_path_buf(), source: e })?;

        let files = if meta.is_dir() { collect_files(root)? } else { vec![root.to_path_buf()] };
        let mut builder = StoreBuilder::default();
        for file in files {
            let rel = relative_name(root, &file);
            match file.extension().and_then(|s| s.to_str()).map(|s| s.to_ascii_lowercase()).as_deref() {
                Some("jsonl") => load_jsonl(&file, &rel, &mut builder)?,
                Some("json") => load_json(&file, &rel, &mut builder)?,
                Some("md" | "markdown" | "txt") => load_text(&file, &rel, &mut builder)?,
                _ => tracing::debug!(file = %rel, "skipping unsupported corpus file"),
            }
        }

        let store = builder.finish();
        if store.is_empty() {
            tracing::warn!(source = %root.display(), "corpus contains no documents");
        }
        tracing::info!(source = %root.display(), num_docs = store.len(), "corpus loaded");
        Ok(store)
    }

    /// Build a store from in-memory records, in order. Ids follow iteration order.
    pub fn from_inputs<I>(inputs: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = InputDoc>,
    {
        let mut builder = StoreBuilder::default();
        for (n, doc) in inputs.into_iter().enumerate() {
            let location = format!("input #{n}");
            let fallback = doc.id.clone().unwrap_or_else(|| location.clone());
            builder.push(doc, location, fallback)?;
        }
        Ok(builder.finish())
    }

    pub fn get(&self, id: DocId) -> Option<&Document> {
        self.docs.get(id as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.docs.iter()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

#[derive(Default)]
struct StoreBuilder {
    docs: Vec<Document>,
    seen: HashSet<String>,
}

impl StoreBuilder {
    /// `fallback_id` doubles as the default source reference.
    fn push(&mut self, doc: InputDoc, location: String, fallback_id: String) -> Result<(), LoadError> {
        let title = doc.title.trim().to_string();
        if title.is_empty() {
            return Err(LoadError::MissingField { location, field: "title" });
        }
        let text = normalize(&doc.body);
        if text.is_empty() {
            return Err(LoadError::MissingField { location, field: "body" });
        }
        let external_id = doc.id.unwrap_or_else(|| fallback_id.clone());
        if !self.seen.insert(external_id.clone()) {
            return Err(LoadError::DuplicateId { id: external_id, location });
        }
        let source_ref = doc.source_ref.filter(|s| !s.trim().is_empty()).unwrap_or(fallback_id);

        let id = self.docs.len() as DocId;
        self.docs.push(Document { id, external_id, title, source_ref, text });
        Ok(())
    }

    fn finish(self) -> DocumentStore {
        DocumentStore { docs: self.docs }
    }
}

fn collect_files(root: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));
    for entry in walker {
        let entry = entry.map_err(|e| LoadError::Walk { path: root.to_path_buf(), source: e })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn relative_name(root: &Path, file: &Path) -> String {
    let rel = match file.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel,
        _ => file.file_name().map(Path::new).unwrap_or(file),
    };
    rel.to_string_lossy().replace('\\', "/")
}

fn read_to_string(file: &Path) -> Result<String, LoadError> {
    fs::read_to_string(file).map_err(|e| LoadError::Io { path: file.to_path_buf(), source: e })
}

fn load_jsonl(file: &Path, rel: &str, builder: &mut StoreBuilder) -> Result<(), LoadError> {
    let f = File::open(file).map_err(|e| LoadError::Io { path: file.to_path_buf(), source: e })?;
    let reader = BufReader::new(f);
    for (n, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| LoadError::Io { path: file.to_path_buf(), source: e })?;
        if line.trim().is_empty() { continue; }
        let location = format!("{rel}:{}", n + 1);
        let doc: InputDoc = serde_json::from_str(&line)
            .map_err(|e| LoadError::Malformed { location: location.clone(), source: e })?;
        builder.push(doc, location.clone(), location)?;
    }
    Ok(())
}

fn load_json(file: &Path, rel: &str, builder: &mut StoreBuilder) -> Result<(), LoadError> {
    let raw = read_to_string(file)?;
    let json: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| LoadError::Malformed { location: rel.to_string(), source: e })?;
    match json {
        serde_json::Value::Array(arr) => {
            for (n, v) in arr.into_iter().enumerate() {
                let location = format!("{rel}#{n}");
                let doc: InputDoc = serde_json::from_value(v)
                    .map_err(|e| LoadError::Malformed { location: location.clone(), source: e })?;
                builder.push(doc, location.clone(), location)?;
            }
        }
        serde_json::Value::Object(_) => {
            let doc: InputDoc = serde_json::from_value(json)
                .map_err(|e| LoadError::Malformed { location: rel.to_string(), source: e })?;
            builder.push(doc, rel.to_string(), rel.to_string())?;
        }
        _ => return Err(LoadError::UnexpectedShape { path: file.to_path_buf() }),
    }
    Ok(())
}

fn load_text(file: &Path, rel: &str, builder: &mut StoreBuilder) -> Result<(), LoadError> {
    let body = read_to_string(file)?;
    let title = ATX_HEADING
        .captures(&body)
        .map(|caps| caps[1].to_string())
        .or_else(|| file.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| rel.to_string());
    let doc = InputDoc { id: None, title, body, source_ref: None };
    builder.push(doc, rel.to_string(), rel.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn input(title: &str, body: &str) -> InputDoc {
        InputDoc { id: None, title: title.into(), body: body.into(), source_ref: None }
    }

    #[test]
    fn ids_follow_input_order() {
        let store = DocumentStore::from_inputs(vec![input("A", "alpha"), input("B", "beta")]).unwrap();
        let ids: Vec<DocId> = store.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![0, 1]);
        assert_eq!(store.get(1).unwrap().title, "B");
        assert!(store.get(2).is_none());
    }

    #[test]
    fn text_is_normalized_title_is_not() {
        let store = DocumentStore::from_inputs(vec![input("  Invoice API ", "# Invoice\n\n**Create**   it")]).unwrap();
        let doc = store.get(0).unwrap();
        assert_eq!(doc.title, "Invoice API");
        assert_eq!(doc.text, "invoice create it");
    }

    #[test]
    fn blank_title_is_rejected() {
        let err = DocumentStore::from_inputs(vec![input("   ", "body")]).unwrap_err();
        assert!(matches!(err, LoadError::MissingField { field: "title", .. }));
    }

    #[test]
    fn blank_body_is_rejected() {
        let err = DocumentStore::from_inputs(vec![input("Title", "  <br/> ")]).unwrap_err();
        assert!(matches!(err, LoadError::MissingField { field: "body", .. }));
    }

    #[test]
    fn duplicate_external_ids_are_rejected() {
        let mut a = input("A", "alpha");
        a.id = Some("x".into());
        let mut b = input("B", "beta");
        b.id = Some("x".into());
        let err = DocumentStore::from_inputs(vec![a, b]).unwrap_err();
        assert!(matches!(err, LoadError::DuplicateId { .. }));
    }

    #[test]
    fn markdown_title_comes_from_first_heading() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("payments.md"), "intro\n\n## Accept Payments ##\n\nbody").unwrap();
        fs::write(dir.path().join("plain.txt"), "no heading here").unwrap();
        let store = DocumentStore::load(dir.path()).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(0).unwrap().title, "Accept Payments");
        assert_eq!(store.get(0).unwrap().source_ref, "payments.md");
        assert_eq!(store.get(1).unwrap().title, "plain");
    }

    #[test]
    fn missing_source_is_an_io_error() {
        let dir = tempdir().unwrap();
        let err = DocumentStore::load(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
