//! Named transcript storage.
//!
//! A transcript is an opaque text blob keyed by a user-chosen name. The
//! file store keeps one `<name>.txt` per transcript in a single directory.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::core::config::path_display;

const EXTENSION: &str = "txt";

#[derive(Debug)]
pub enum TranscriptError {
    /// A transcript with this name already exists.
    DuplicateName(String),
    NotFound(String),
    /// Empty, or contains path separators or control characters.
    InvalidName(String),
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for TranscriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscriptError::DuplicateName(name) => {
                write!(f, "A transcript named '{name}' already exists")
            }
            TranscriptError::NotFound(name) => write!(f, "No transcript named '{name}'"),
            TranscriptError::InvalidName(name) => {
                write!(f, "'{name}' is not a valid transcript name")
            }
            TranscriptError::Io { path, source } => {
                write!(f, "Transcript I/O failed at {}: {}", path_display(path), source)
            }
        }
    }
}

impl Error for TranscriptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TranscriptError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub fn validate_name(name: &str) -> Result<&str, TranscriptError> {
    let trimmed = name.trim();
    let invalid = trimmed.is_empty()
        || trimmed.starts_with('.')
        || trimmed
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control());
    if invalid {
        return Err(TranscriptError::InvalidName(name.to_string()));
    }
    Ok(trimmed)
}

pub trait TranscriptStore {
    fn get(&self, name: &str) -> Result<Option<String>, TranscriptError>;

    /// Writes `text` under `name`, replacing any existing transcript.
    fn set(&mut self, name: &str, text: &str) -> Result<(), TranscriptError>;

    /// Returns whether a transcript was removed.
    fn remove(&mut self, name: &str) -> Result<bool, TranscriptError>;

    /// Names in sorted order.
    fn list_keys(&self) -> Result<Vec<String>, TranscriptError>;

    /// Like [`set`](Self::set), but refuses to overwrite.
    fn create(&mut self, name: &str, text: &str) -> Result<(), TranscriptError> {
        let name = validate_name(name)?;
        if self.get(name)?.is_some() {
            return Err(TranscriptError::DuplicateName(name.to_string()));
        }
        self.set(name, text)
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryTranscriptStore {
    entries: BTreeMap<String, String>,
}

impl MemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TranscriptStore for MemoryTranscriptStore {
    fn get(&self, name: &str) -> Result<Option<String>, TranscriptError> {
        let name = validate_name(name)?;
        Ok(self.entries.get(name).cloned())
    }

    fn set(&mut self, name: &str, text: &str) -> Result<(), TranscriptError> {
        let name = validate_name(name)?;
        self.entries.insert(name.to_string(), text.to_string());
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<bool, TranscriptError> {
        let name = validate_name(name)?;
        Ok(self.entries.remove(name).is_some())
    }

    fn list_keys(&self) -> Result<Vec<String>, TranscriptError> {
        Ok(self.entries.keys().cloned().collect())
    }
}

#[derive(Debug, Clone)]
pub struct FileTranscriptStore {
    dir: PathBuf,
}

impl FileTranscriptStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, TranscriptError> {
        let name = validate_name(name)?;
        Ok(self.dir.join(format!("{name}.{EXTENSION}")))
    }

    fn io_error(path: &Path, source: io::Error) -> TranscriptError {
        TranscriptError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl TranscriptStore for FileTranscriptStore {
    fn get(&self, name: &str) -> Result<Option<String>, TranscriptError> {
        let path = self.path_for(name)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Self::io_error(&path, err)),
        }
    }

    fn set(&mut self, name: &str, text: &str) -> Result<(), TranscriptError> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.dir).map_err(|err| Self::io_error(&self.dir, err))?;

        let mut temp_file =
            NamedTempFile::new_in(&self.dir).map_err(|err| Self::io_error(&self.dir, err))?;
        temp_file
            .write_all(text.as_bytes())
            .map_err(|err| Self::io_error(&path, err))?;
        temp_file
            .as_file_mut()
            .sync_all()
            .map_err(|err| Self::io_error(&path, err))?;
        temp_file
            .persist(&path)
            .map_err(|err| Self::io_error(&path, err.error))?;
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<bool, TranscriptError> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(Self::io_error(&path, err)),
        }
    }

    fn list_keys(&self) -> Result<Vec<String>, TranscriptError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(Self::io_error(&self.dir, err)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| Self::io_error(&self.dir, err))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                if validate_name(stem).is_ok() {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn exercise_store(store: &mut dyn TranscriptStore) {
        assert_eq!(store.get("alpha").expect("get"), None);
        store.create("alpha", "You: hi").expect("create");
        store.set("beta", "You: yo").expect("set");
        assert_eq!(store.get("alpha").expect("get").as_deref(), Some("You: hi"));
        assert_eq!(store.list_keys().expect("list"), vec!["alpha", "beta"]);

        match store.create("alpha", "overwrite?") {
            Err(TranscriptError::DuplicateName(name)) => assert_eq!(name, "alpha"),
            other => panic!("expected duplicate error, got {other:?}"),
        }
        assert_eq!(store.get("alpha").expect("get").as_deref(), Some("You: hi"));

        assert!(store.remove("alpha").expect("remove"));
        assert!(!store.remove("alpha").expect("remove again"));
        assert_eq!(store.list_keys().expect("list"), vec!["beta"]);
    }

    #[test]
    fn memory_store_behaves_like_a_key_value_store() {
        let mut store = MemoryTranscriptStore::new();
        exercise_store(&mut store);
    }

    #[test]
    fn file_store_behaves_like_a_key_value_store() {
        let dir = TempDir::new().expect("tempdir");
        let mut store = FileTranscriptStore::new(dir.path().join("transcripts"));
        exercise_store(&mut store);
    }

    #[test]
    fn file_store_lists_nothing_for_missing_directory() {
        let dir = TempDir::new().expect("tempdir");
        let store = FileTranscriptStore::new(dir.path().join("absent"));
        assert!(store.list_keys().expect("list").is_empty());
    }

    #[test]
    fn file_store_ignores_foreign_files() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("notes.md"), "x").expect("write");
        fs::write(dir.path().join("kept.txt"), "y").expect("write");
        let store = FileTranscriptStore::new(dir.path());
        assert_eq!(store.list_keys().expect("list"), vec!["kept"]);
    }

    #[test]
    fn names_with_separators_are_rejected() {
        let mut store = MemoryTranscriptStore::new();
        for bad in ["", "   ", "../escape", "a/b", "a\\b", ".hidden", "tab\tname"] {
            assert!(
                matches!(store.set(bad, "x"), Err(TranscriptError::InvalidName(_))),
                "accepted {bad:?}"
            );
        }
    }
}
