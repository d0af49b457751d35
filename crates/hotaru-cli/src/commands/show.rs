use std::path::Path;

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use hotaru_script::{StoryLine, parse_action};

pub fn run(script: &Path) -> Result<(), String> {
    let scene = super::load_script(script)?;
    let id = scene.scene_id_or(script);

    println!("  {} [{} lines]", id.bold(), scene.len());
    println!();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Speaker", "Text", "Action"]);

    for (index, line) in scene.story.iter().enumerate() {
        table.add_row(vec![
            index.to_string(),
            line.speaker.clone().unwrap_or_else(|| "—".to_string()),
            preview(&line.text),
            describe_line(line),
        ]);
    }

    println!("{table}");
    println!();

    let commands = scene
        .story
        .iter()
        .filter(|l| l.command_text().is_some())
        .count();
    println!("  {} story lines, {} of them commands", scene.len(), commands);
    println!(
        "  assets: {} backgrounds, {} bgm tracks, {} sounds, {} videos, {} event images",
        scene.background.len(),
        scene.bgm.len(),
        scene.audio.len(),
        scene.videos.len(),
        scene.events.len(),
    );

    Ok(())
}

/// Shorten long text for the table.
fn preview(text: &str) -> String {
    const MAX: usize = 48;
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= MAX {
        return flat;
    }
    let cut: String = flat.chars().take(MAX - 3).collect();
    format!("{cut}...")
}

fn describe_line(line: &StoryLine) -> String {
    if let Some(raw) = line.command_text() {
        return match parse_action(raw) {
            Some(_) => raw.to_string(),
            None => format!("{raw} (unknown)"),
        };
    }
    match &line.action {
        Some(raw) => match raw.as_action() {
            Some(action) => action.tag().to_string(),
            None => "unknown action".to_string(),
        },
        None => String::new(),
    }
}
