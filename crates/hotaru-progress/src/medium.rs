//! Storage media for progress records.
//!
//! A small trait keeps the store independent of where the payload lives:
//! a file on disk for real sessions, memory for tests and throwaway runs.

use std::path::PathBuf;

use crate::error::{ProgressError, ProgressResult};

/// Somewhere a progress payload can live.
pub trait StorageMedium {
    /// Read the stored payload, if any.
    fn read(&self) -> ProgressResult<Option<String>>;

    /// Replace the stored payload.
    fn write(&mut self, payload: &str) -> ProgressResult<()>;

    /// Remove the stored payload.
    fn clear(&mut self) -> ProgressResult<()>;

    /// Where this medium lives, for logs and error messages.
    fn location(&self) -> String;
}

/// A progress file on disk.
#[derive(Debug, Clone)]
pub struct FileMedium {
    path: PathBuf,
}

impl FileMedium {
    /// A medium backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StorageMedium for FileMedium {
    fn read(&self) -> ProgressResult<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(payload) => Ok(Some(payload)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ProgressError::Read {
                location: self.location(),
                source,
            }),
        }
    }

    fn write(&mut self, payload: &str) -> ProgressResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| ProgressError::Write {
                    location: self.location(),
                    source,
                })?;
            }
        }
        std::fs::write(&self.path, payload).map_err(|source| ProgressError::Write {
            location: self.location(),
            source,
        })
    }

    fn clear(&mut self) -> ProgressResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ProgressError::Write {
                location: self.location(),
                source,
            }),
        }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// An in-memory medium for tests and `--ephemeral` runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryMedium {
    payload: Option<String>,
}

impl MemoryMedium {
    /// An empty in-memory medium.
    pub fn new() -> Self {
        Self::default()
    }

    /// A medium pre-seeded with a payload.
    pub fn with_payload(payload: impl Into<String>) -> Self {
        Self {
            payload: Some(payload.into()),
        }
    }
}

impl StorageMedium for MemoryMedium {
    fn read(&self) -> ProgressResult<Option<String>> {
        Ok(self.payload.clone())
    }

    fn write(&mut self, payload: &str) -> ProgressResult<()> {
        self.payload = Some(payload.to_string());
        Ok(())
    }

    fn clear(&mut self) -> ProgressResult<()> {
        self.payload = None;
        Ok(())
    }

    fn location(&self) -> String {
        "<memory>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_round_trip() {
        let mut medium = MemoryMedium::new();
        assert_eq!(medium.read().unwrap(), None);
        medium.write("{}").unwrap();
        assert_eq!(medium.read().unwrap().as_deref(), Some("{}"));
        medium.clear().unwrap();
        assert_eq!(medium.read().unwrap(), None);
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut medium = FileMedium::new(dir.path().join("progress.json"));
        assert_eq!(medium.read().unwrap(), None);
        medium.write(r#"{"completedScenes":[]}"#).unwrap();
        assert_eq!(
            medium.read().unwrap().as_deref(),
            Some(r#"{"completedScenes":[]}"#)
        );
        medium.clear().unwrap();
        assert_eq!(medium.read().unwrap(), None);
        // Clearing an absent file stays quiet.
        medium.clear().unwrap();
    }

    #[test]
    fn file_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("saves").join("slot1").join("progress.json");
        let mut medium = FileMedium::new(&nested);
        medium.write("{}").unwrap();
        assert!(nested.exists());
    }
}
