//! File-based content and mastery storage.
//!
//! Content lives in a data directory as `vocabulary.json`, `grammar.json`,
//! `confusable_pairs.json` and `cloze_templates.json`. Mastery records are a
//! single JSON object keyed by item ID, written via temp file + rename.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::core::{ClozeTemplate, ConfusablePair, ItemKind, KnowledgeItem, MasteryRecord};
use crate::error::{Result, TutorError};
use crate::storage::{ContentStore, MasteryStore};

pub const VOCABULARY_FILE: &str = "vocabulary.json";
pub const GRAMMAR_FILE: &str = "grammar.json";
pub const CONFUSABLE_PAIRS_FILE: &str = "confusable_pairs.json";
pub const CLOZE_TEMPLATES_FILE: &str = "cloze_templates.json";

/// Write `contents` to `path` atomically using a sibling temp file.
///
/// Creates the parent directory if needed.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !dir.exists() {
        fs::create_dir_all(&dir).map_err(|e| TutorError::storage(&dir, e))?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "state".to_string());
    let temp_path = dir.join(format!(".{}.tmp", file_name));

    {
        let mut file =
            fs::File::create(&temp_path).map_err(|e| TutorError::storage(&temp_path, e))?;
        file.write_all(contents.as_bytes())
            .map_err(|e| TutorError::storage(&temp_path, e))?;
        file.sync_all()
            .map_err(|e| TutorError::storage(&temp_path, e))?;
    }

    // Rename temp file to final path (atomic on POSIX)
    fs::rename(&temp_path, path).map_err(|e| TutorError::storage(path, e))?;

    Ok(())
}

/// Read and parse a JSON file. Ok(None) if it does not exist.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|e| TutorError::storage(path, e))?;
    let value = serde_json::from_str(&content)
        .map_err(|e| TutorError::serde(format!("{}: {}", path.display(), e)))?;
    Ok(Some(value))
}

/// Content store over a directory of JSON files.
#[derive(Debug, Clone)]
pub struct FileContentStore {
    data_dir: PathBuf,
}

impl FileContentStore {
    pub fn with_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn read_items(&self, file: &str, kind: ItemKind) -> Result<Vec<KnowledgeItem>> {
        let path = self.data_dir.join(file);
        let Some(mut items): Option<Vec<KnowledgeItem>> = read_json(&path)? else {
            tracing::debug!(path = %path.display(), "content file not found");
            return Ok(Vec::new());
        };
        // The file decides the kind
        for item in &mut items {
            item.kind = kind;
        }
        Ok(items)
    }
}

impl ContentStore for FileContentStore {
    fn items(&self) -> Result<Vec<KnowledgeItem>> {
        if !self.data_dir.is_dir() {
            return Err(TutorError::content(format!(
                "data directory not found: {}",
                self.data_dir.display()
            )));
        }
        let mut items = self.read_items(VOCABULARY_FILE, ItemKind::Vocabulary)?;
        items.extend(self.read_items(GRAMMAR_FILE, ItemKind::Grammar)?);
        Ok(items)
    }

    fn confusable_pairs(&self) -> Result<Vec<ConfusablePair>> {
        Ok(read_json(&self.data_dir.join(CONFUSABLE_PAIRS_FILE))?.unwrap_or_default())
    }

    fn cloze_templates(&self) -> Result<Vec<ClozeTemplate>> {
        Ok(read_json(&self.data_dir.join(CLOZE_TEMPLATES_FILE))?.unwrap_or_default())
    }
}

/// Mastery store backed by one JSON file.
#[derive(Debug, Clone)]
pub struct FileMasteryStore {
    path: PathBuf,
}

impl FileMasteryStore {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MasteryStore for FileMasteryStore {
    fn load_all(&self) -> Result<Vec<MasteryRecord>> {
        let records: BTreeMap<String, MasteryRecord> =
            read_json(&self.path)?.unwrap_or_default();
        Ok(records
            .into_iter()
            .map(|(id, mut record)| {
                if let Some(learning) = record.learning_mut() {
                    if learning.clamp_probabilities() {
                        tracing::warn!(
                            item = %id,
                            path = %self.path.display(),
                            "stored mastery probabilities out of range, clamped"
                        );
                    }
                }
                record.item_id = id;
                record
            })
            .collect())
    }

    fn save_all(&self, records: &[MasteryRecord]) -> Result<()> {
        let keyed: BTreeMap<&str, &MasteryRecord> =
            records.iter().map(|r| (r.item_id.as_str(), r)).collect();
        let json = serde_json::to_string_pretty(&keyed)?;
        write_atomic(&self.path, &json)?;
        tracing::debug!(path = %self.path.display(), records = records.len(), "saved mastery records");
        Ok(())
    }
}
