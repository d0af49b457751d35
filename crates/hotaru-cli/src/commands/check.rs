use std::path::Path;

use hotaru_script::diagnostics::{Severity, render_diagnostics};
use hotaru_script::{ScriptError, validate_script};

pub fn run(script: &Path) -> Result<(), String> {
    let scene = super::load_script(script)?;
    let (listing, diags) = validate_script(&scene);

    let errors = diags.iter().filter(|d| d.severity == Severity::Error).count();
    let warnings = diags
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .count();

    if !diags.is_empty() {
        let filename = script.display().to_string();
        let rendered = render_diagnostics(listing.text(), &filename, &diags);
        eprint!("{rendered}");

        if errors > 0 {
            eprintln!(
                "  {} error{}, {} warning{}",
                errors,
                if errors == 1 { "" } else { "s" },
                warnings,
                if warnings == 1 { "" } else { "s" },
            );
        } else {
            eprintln!(
                "  {} warning{}",
                warnings,
                if warnings == 1 { "" } else { "s" },
            );
        }
    }

    if errors > 0 {
        return Err(ScriptError::Invalid(errors).to_string());
    }

    let commands = scene
        .story
        .iter()
        .filter(|l| l.command_text().is_some())
        .count();
    println!("  All checks passed for '{}'.", scene.scene_id_or(script));
    println!("  {} story lines, {} of them commands", scene.len(), commands);

    Ok(())
}
