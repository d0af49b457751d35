//! The progress store: a record plus the medium it persists to.

use std::path::PathBuf;

use crate::error::ProgressResult;
use crate::medium::{FileMedium, MemoryMedium, StorageMedium};
use crate::record::ProgressRecord;
use crate::report;

/// Owns the in-memory progress record and writes it through to a medium.
///
/// Loading never fails outward: a missing, unreadable, or corrupt payload
/// logs a warning and starts from a default record. Mutating operations
/// write only when they actually changed something.
pub struct ProgressStore {
    medium: Box<dyn StorageMedium>,
    record: ProgressRecord,
}

impl std::fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressStore")
            .field("location", &self.medium.location())
            .field("record", &self.record)
            .finish()
    }
}

impl ProgressStore {
    /// Open a store over any medium, loading the record immediately.
    pub fn open(medium: impl StorageMedium + 'static) -> Self {
        let mut store = Self {
            medium: Box::new(medium),
            record: ProgressRecord::default(),
        };
        store.reload();
        store
    }

    /// Open a store over a progress file.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self::open(FileMedium::new(path))
    }

    /// Open a throwaway in-memory store.
    pub fn in_memory() -> Self {
        Self::open(MemoryMedium::new())
    }

    /// The current record.
    pub fn record(&self) -> &ProgressRecord {
        &self.record
    }

    /// Where the record persists.
    pub fn location(&self) -> String {
        self.medium.location()
    }

    /// Re-read the record from the medium, falling back to defaults.
    pub fn reload(&mut self) {
        self.record = match self.medium.read() {
            Ok(Some(payload)) => match serde_json::from_str(&payload) {
                Ok(record) => record,
                Err(err) => {
                    tracing::warn!(
                        location = self.medium.location(),
                        error = %err,
                        "progress payload is corrupt; starting from defaults"
                    );
                    ProgressRecord::default()
                }
            },
            Ok(None) => ProgressRecord::default(),
            Err(err) => {
                tracing::warn!(error = %err, "progress medium unreadable; starting from defaults");
                ProgressRecord::default()
            }
        };
    }

    /// Persist the current record, refreshing its timestamp.
    pub fn save(&mut self) -> ProgressResult<()> {
        self.record.touch();
        let payload = serde_json::to_string(&self.record)?;
        self.medium.write(&payload)
    }

    /// True when the scene is recorded as completed.
    pub fn is_completed(&self, scene: &str) -> bool {
        self.record.is_completed(scene)
    }

    /// Record a scene completion. Writes only the first time a given
    /// scene completes; repeats return `false` without touching the
    /// medium.
    pub fn mark_completed(&mut self, scene: &str) -> ProgressResult<bool> {
        if !self.record.mark_completed(scene) {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Record that a scene has been opened. Writes only when the marker
    /// was absent.
    pub fn mark_visited(&mut self, scene: &str) -> ProgressResult<bool> {
        if !self.record.mark_visited(scene) {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Current value of an affinity flag.
    pub fn affinity(&self, flag: &str) -> i64 {
        self.record.affinity(flag)
    }

    /// Apply a delta to an affinity flag and persist. Returns the new
    /// value.
    pub fn adjust_affinity(&mut self, flag: &str, delta: i64) -> ProgressResult<i64> {
        let value = self.record.adjust_affinity(flag, delta);
        self.save()?;
        Ok(value)
    }

    /// Wipe the record and the medium.
    pub fn reset(&mut self) -> ProgressResult<()> {
        self.record = ProgressRecord::default();
        self.medium.clear()
    }

    /// The raw record JSON, for save-data export.
    pub fn export(&self) -> ProgressResult<String> {
        Ok(serde_json::to_string_pretty(&self.record)?)
    }

    /// Completion report over the current record.
    pub fn completion_report(&self, total_scenes: usize) -> report::ProgressReport {
        report::completion_report(&self.record, total_scenes)
    }

    /// Flowchart view over the current record.
    pub fn flowchart(&self, scene_ids: &[String], total_scenes: usize) -> report::Flowchart {
        report::flowchart(&self.record, scene_ids, total_scenes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProgressResult;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Medium wrapper that counts writes, for write-only-on-change checks.
    struct CountingMedium {
        inner: MemoryMedium,
        writes: Rc<Cell<usize>>,
    }

    impl StorageMedium for CountingMedium {
        fn read(&self) -> ProgressResult<Option<String>> {
            self.inner.read()
        }

        fn write(&mut self, payload: &str) -> ProgressResult<()> {
            self.writes.set(self.writes.get() + 1);
            self.inner.write(payload)
        }

        fn clear(&mut self) -> ProgressResult<()> {
            self.inner.clear()
        }

        fn location(&self) -> String {
            self.inner.location()
        }
    }

    fn counting_store() -> (ProgressStore, Rc<Cell<usize>>) {
        let writes = Rc::new(Cell::new(0));
        let medium = CountingMedium {
            inner: MemoryMedium::new(),
            writes: Rc::clone(&writes),
        };
        (ProgressStore::open(medium), writes)
    }

    #[test]
    fn corrupt_payload_loads_defaults() {
        let store = ProgressStore::open(MemoryMedium::with_payload("{not json"));
        assert!(store.record().completed_scenes.is_empty());
        assert!(store.record().scene_markers.is_empty());
        assert!(store.record().game_state.affinity.is_empty());
    }

    #[test]
    fn completion_writes_once() {
        let (mut store, writes) = counting_store();
        assert!(store.mark_completed("scene1").unwrap());
        assert_eq!(writes.get(), 1);
        assert!(!store.mark_completed("scene1").unwrap());
        assert_eq!(writes.get(), 1);
        assert!(store.is_completed("scene1"));
    }

    #[test]
    fn visit_marker_writes_once() {
        let (mut store, writes) = counting_store();
        assert!(store.mark_visited("scene1").unwrap());
        assert_eq!(writes.get(), 1);
        assert!(!store.mark_visited("scene1").unwrap());
        assert_eq!(writes.get(), 1);
    }

    #[test]
    fn affinity_persists() {
        let mut store = ProgressStore::in_memory();
        store.adjust_affinity("yurina", 3).unwrap();
        store.adjust_affinity("yurina", -1).unwrap();
        assert_eq!(store.affinity("yurina"), 2);
    }

    #[test]
    fn reset_clears_everything() {
        let mut store = ProgressStore::in_memory();
        store.mark_completed("scene1").unwrap();
        store.mark_visited("scene2").unwrap();
        store.adjust_affinity("yurina", 5).unwrap();
        store.reset().unwrap();
        assert!(!store.is_completed("scene1"));
        assert_eq!(store.affinity("yurina"), 0);
        assert!(store.record().scene_markers.is_empty());
        store.reload();
        assert!(!store.is_completed("scene1"));
    }

    #[test]
    fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        {
            let mut store = ProgressStore::at_path(&path);
            store.mark_completed("scene1").unwrap();
            store.mark_visited("scene1").unwrap();
            store.adjust_affinity("yurina", 2).unwrap();
        }
        let store = ProgressStore::at_path(&path);
        assert!(store.is_completed("scene1"));
        assert_eq!(store.record().scene_markers.get("scene1"), Some(&1));
        assert_eq!(store.affinity("yurina"), 2);
    }

    #[test]
    fn export_is_pretty_record_json() {
        let mut store = ProgressStore::in_memory();
        store.mark_completed("scene1").unwrap();
        let exported = store.export().unwrap();
        assert!(exported.contains("\"completedScenes\""));
        assert!(exported.contains("scene1"));
    }
}
