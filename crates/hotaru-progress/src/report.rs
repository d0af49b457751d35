//! Progress queries: the completion report and the flowchart view.
//!
//! Both serialize to camelCase JSON, so exports line up with the save
//! format and need no adapter on the consuming side.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::record::ProgressRecord;

/// Scene total used when the caller does not supply one.
pub const DEFAULT_TOTAL_SCENES: usize = 6;

/// Aggregate play statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStats {
    /// Total play time in seconds; not tracked yet, always 0.
    pub total_play_time: u64,
    /// When the record last changed.
    pub last_played: Option<DateTime<Utc>>,
    /// Affinity flag snapshot.
    pub affinity_values: HashMap<String, i64>,
}

/// The completion report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    /// When the record last changed.
    pub last_updated: DateTime<Utc>,
    /// Completed scene identifiers, in completion order.
    pub completed_scenes: Vec<String>,
    /// Visited-scene markers.
    pub scene_markers: HashMap<String, i64>,
    /// How many scenes the game has.
    pub total_scenes: usize,
    /// `round(completed / total * 100)`; 0 when the total is 0.
    pub completion_rate: u32,
    /// Aggregate statistics.
    pub game_stats: GameStats,
}

/// Completion percentage, rounded to the nearest whole percent.
pub fn completion_rate(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round() as u32
}

/// Build the completion report for a record.
pub fn completion_report(record: &ProgressRecord, total_scenes: usize) -> ProgressReport {
    ProgressReport {
        last_updated: record.timestamp,
        completed_scenes: record.completed_scenes.clone(),
        scene_markers: record.scene_markers.clone(),
        total_scenes,
        completion_rate: completion_rate(record.completion_count(), total_scenes),
        game_stats: GameStats {
            total_play_time: 0,
            last_played: Some(record.timestamp),
            affinity_values: record.game_state.affinity.clone(),
        },
    }
}

/// Kind of a flowchart node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// The entry node.
    Start,
    /// A scene.
    Scene,
    /// The exit node.
    End,
}

/// One node in the flowchart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowNode {
    /// Node identifier.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Node kind.
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Whether the player has reached this node.
    pub completed: bool,
}

/// A directed edge between flowchart nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowEdge {
    /// Source node id.
    pub from: String,
    /// Target node id.
    pub to: String,
}

/// The flowchart view of progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Flowchart {
    /// All nodes: start, one per scene, end.
    pub nodes: Vec<FlowNode>,
    /// Linear edges through the scene list.
    pub edges: Vec<FlowEdge>,
    /// Completion percentage.
    pub completion_rate: u32,
    /// Completed scene identifiers.
    pub completed_scenes: Vec<String>,
    /// Visited-scene markers.
    pub scene_markers: HashMap<String, i64>,
}

/// Build the flowchart for a record over an ordered scene list.
///
/// Scene nodes light up from the visited markers, not the completion
/// list, so the chart shows where the player has been.
pub fn flowchart(record: &ProgressRecord, scene_ids: &[String], total_scenes: usize) -> Flowchart {
    let mut nodes = Vec::with_capacity(scene_ids.len() + 2);
    nodes.push(FlowNode {
        id: "start".to_string(),
        label: "start".to_string(),
        kind: NodeKind::Start,
        completed: true,
    });
    for id in scene_ids {
        nodes.push(FlowNode {
            id: id.clone(),
            // Only the first underscore reads as a space.
            label: id.replacen('_', " ", 1),
            kind: NodeKind::Scene,
            completed: record.scene_markers.get(id) == Some(&1),
        });
    }
    nodes.push(FlowNode {
        id: "end".to_string(),
        label: "end".to_string(),
        kind: NodeKind::End,
        completed: false,
    });

    let mut edges = Vec::with_capacity(scene_ids.len() + 1);
    let mut previous = "start".to_string();
    for id in scene_ids {
        edges.push(FlowEdge {
            from: previous,
            to: id.clone(),
        });
        previous = id.clone();
    }
    edges.push(FlowEdge {
        from: previous,
        to: "end".to_string(),
    });

    Flowchart {
        nodes,
        edges,
        completion_rate: completion_rate(record.completion_count(), total_scenes),
        completed_scenes: record.completed_scenes.clone(),
        scene_markers: record.scene_markers.clone(),
    }
}
