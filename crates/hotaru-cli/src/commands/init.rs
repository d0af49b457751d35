use std::fs;
use std::path::Path;

const STARTER_SCENE: &str = r#"{
  "sceneId": "scene1",
  "background": { "classroom": "images/classroom.png" },
  "bgm": { "theme": "audio/theme.mp3" },
  "story": [
    {
      "speaker": "Yurina",
      "text": "Good morning![s] You made it after all.",
      "background": "classroom",
      "bgm": "theme"
    },
    { "text": "The classroom settles as the bell rings." },
    { "command": "[if cond=\"f.yurina >= 2\"]" },
    { "speaker": "Yurina", "text": "I saved you a seat." },
    { "command": "[affinity flag=yurina add=1]" },
    { "command": "[else]" },
    { "text": "You find a seat near the window." },
    { "command": "[endif]" },
    { "command": "[selection text=\"Talk to Yurina\" target=scene2]" },
    { "command": "[selection text=\"Review your notes\" target=scene3]" },
    { "command": "[showselections]" }
  ]
}
"#;

pub fn run(name: &str) -> Result<(), String> {
    let dir = Path::new(name);

    if dir.exists() {
        return Err(format!("directory '{}' already exists", name));
    }

    fs::create_dir_all(dir).map_err(|e| format!("cannot create directory: {e}"))?;

    fs::write(dir.join("scene1.json"), STARTER_SCENE)
        .map_err(|e| format!("cannot write scene1.json: {e}"))?;

    println!("Created scene project '{}' in {}/", name, name);
    println!("  scene1.json  — a starter scene with segments, a branch, and choices");
    println!();
    println!("Get started:");
    println!("  cd {name}");
    println!("  # Edit scene1.json, then:");
    println!("  hotaru check scene1.json   # Validate the script");
    println!("  hotaru show scene1.json    # Summarize lines and assets");
    println!("  hotaru play scene1.json    # Play it in the terminal");

    Ok(())
}
