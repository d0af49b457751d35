use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use hotaru_progress::ProgressStore;

pub fn run(file: &Path, total: usize, export: bool, reset: bool) -> Result<(), String> {
    let mut store = ProgressStore::at_path(file);

    if reset {
        store.reset().map_err(|e| e.to_string())?;
        println!("  Progress reset at {}", store.location());
        return Ok(());
    }

    if export {
        let payload = store.export().map_err(|e| e.to_string())?;
        println!("{payload}");
        return Ok(());
    }

    let record = store.record();
    let report = store.completion_report(total);

    println!(
        "  {} {} of {} scenes completed ({}%)",
        "Progress:".bold(),
        report.completed_scenes.len(),
        report.total_scenes,
        report.completion_rate,
    );
    println!("  Record: {}", store.location());
    println!("  Last updated: {}", report.last_updated);

    if record.scene_markers.is_empty() && report.completed_scenes.is_empty() {
        println!();
        println!("  No scenes visited yet.");
    } else {
        let mut scenes: Vec<&String> = record.scene_markers.keys().collect();
        for scene in &report.completed_scenes {
            if !record.scene_markers.contains_key(scene) {
                scenes.push(scene);
            }
        }
        scenes.sort();

        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Scene", "Visited", "Completed"]);
        for scene in scenes {
            let visited = if record.scene_markers.get(scene) == Some(&1) {
                "yes"
            } else {
                "-"
            };
            let completed = if report.completed_scenes.contains(scene) {
                "yes"
            } else {
                "-"
            };
            table.add_row(vec![scene.as_str(), visited, completed]);
        }
        println!();
        println!("{table}");
    }

    if !report.game_stats.affinity_values.is_empty() {
        let mut flags: Vec<_> = report.game_stats.affinity_values.iter().collect();
        flags.sort();
        println!();
        println!("  {}", "Affinity:".dimmed());
        for (flag, value) in flags {
            println!("    {flag}: {value}");
        }
    }

    Ok(())
}
