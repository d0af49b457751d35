//! Persistent play progress: completed scenes, visited-scene markers,
//! and affinity flags.
//!
//! A [`ProgressStore`] wraps a [`StorageMedium`] (a file on disk, or
//! memory in tests) and keeps the current [`ProgressRecord`] loaded.
//! Mutations persist immediately; a corrupt or missing payload falls
//! back to a fresh record rather than failing the session.

/// Error types for progress persistence.
pub mod error;
/// Storage backends the store can write through.
pub mod medium;
/// The persisted record and its accessors.
pub mod record;
/// Report and flowchart views over a record.
pub mod report;
/// The store: a record bound to a medium.
pub mod store;

pub use error::{ProgressError, ProgressResult};
pub use medium::{FileMedium, MemoryMedium, StorageMedium};
pub use record::{GameState, ProgressRecord};
pub use report::{
    DEFAULT_TOTAL_SCENES, FlowEdge, FlowNode, Flowchart, GameStats, NodeKind, ProgressReport,
    completion_rate, completion_report, flowchart,
};
pub use store::ProgressStore;
