use std::io::{self, BufRead, Write};
use std::path::Path;

use colored::Colorize;

use hotaru_player::{
    Directive, EffectCue, EffectKind, NavTarget, Phase, PlayerEvent, ScenePlayer, ScreenFilter,
    StepOutput,
};
use hotaru_progress::ProgressStore;

const DEFAULT_PROGRESS_FILE: &str = "hotaru-progress.json";

pub fn run(script: &Path, progress: Option<&Path>, ephemeral: bool) -> Result<(), String> {
    let scene = super::load_script(script)?;
    let scene_id = scene.scene_id_or(script);

    let store = if ephemeral {
        ProgressStore::in_memory()
    } else {
        let path = progress
            .map(Path::to_path_buf)
            .unwrap_or_else(|| DEFAULT_PROGRESS_FILE.into());
        ProgressStore::at_path(path)
    };

    println!("  {} {}", "Playing".bold(), scene_id);
    println!("  Enter advances, a number picks a choice, 'q' quits.\n");

    let mut player = ScenePlayer::new(scene, scene_id.clone(), store);

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut line = String::new();

    let first = player.start();
    let mut output = settle(&mut player, first);

    loop {
        render(&output.directives);

        if output.scene_ended() {
            println!("\n  {} {}", "Scene complete:".bold(), scene_id);
            break;
        }

        print!("> ");
        io::stdout().flush().map_err(|e| e.to_string())?;

        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break, // EOF
            Err(e) => return Err(e.to_string()),
            _ => {}
        }

        let input = line.trim();
        if input.eq_ignore_ascii_case("q") || input.eq_ignore_ascii_case("quit") {
            break;
        }

        let event = match input.parse::<usize>() {
            Ok(n) if n >= 1 && player.phase() == Phase::AwaitingChoice => {
                PlayerEvent::ChoicePicked(n - 1)
            }
            _ => PlayerEvent::Advance,
        };
        let next = player.handle(event);
        output = settle(&mut player, next);
    }

    Ok(())
}

/// Acknowledge timed phases immediately. The terminal has no typewriter
/// and no animation clock, so typing and effects complete at once; the
/// directives of every settled step pile into one output.
fn settle(player: &mut ScenePlayer, mut output: StepOutput) -> StepOutput {
    loop {
        let event = match output.phase {
            Phase::Typing => PlayerEvent::TypingFinished,
            Phase::PlayingEffect => PlayerEvent::EffectFinished,
            _ => return output,
        };
        let next = player.handle(event);
        output.directives.extend(next.directives);
        output.phase = next.phase;
    }
}

fn render(directives: &[Directive]) {
    for directive in directives {
        match directive {
            Directive::SetSpeaker { name } => println!("\n{}", name.bold()),
            Directive::ShowText { full, revealed, .. } => {
                // Reveals are cumulative; print only the new tail.
                let tail = &full[*revealed..];
                if !tail.is_empty() {
                    println!("  {tail}");
                }
            }
            Directive::ShowChoices { choices } => {
                println!();
                for (index, choice) in choices.iter().enumerate() {
                    println!("  {}) {}", index + 1, choice.text.cyan());
                }
            }
            Directive::Navigate { target } => match target {
                NavTarget::Scene(id) => {
                    println!("\n  {}", format!("[continues in {id}]").cyan());
                }
                NavTarget::MainMenu => {
                    println!("\n  {}", "[returns to the main menu]".cyan());
                }
            },
            Directive::SetBackground { path, .. } => stage(&format!("background: {path}")),
            Directive::HideBackground => stage("background cleared"),
            Directive::ShowEventVisual { path, .. } => stage(&format!("event art: {path}")),
            Directive::HideEventVisual => stage("event art hidden"),
            Directive::CoverScreen { color } => stage(&format!("screen covered in {color}")),
            Directive::ApplyFilter { filter } => {
                stage(&format!("filter on: {}", filter_name(filter)));
            }
            Directive::RemoveFilter { filter } => {
                stage(&format!("filter off: {}", filter_name(filter)));
            }
            Directive::PlayBgm { path } => stage(&format!("bgm: {path}")),
            Directive::StopBgm => stage("bgm stops"),
            Directive::PlaySound { path } => stage(&format!("sound: {path}")),
            Directive::PlayVideo { path } => stage(&format!("video: {path}")),
            Directive::StopAllAudio => stage("audio stops"),
            Directive::PlayEffect(cue) => stage(&describe_effect(cue)),
            Directive::ClearSpeaker
            | Directive::ShowTextWindow
            | Directive::HideTextWindow
            | Directive::HideAllCharacters
            | Directive::ShowContinuePrompt => {}
        }
    }
}

/// Stage notes stand in for what a real host would draw or play.
fn stage(note: &str) {
    println!("  {}", format!("[{note}]").dimmed());
}

fn filter_name(filter: &ScreenFilter) -> &'static str {
    match filter {
        ScreenFilter::Sepia => "sepia",
        ScreenFilter::Inverted => "inverted",
    }
}

fn describe_effect(cue: &EffectCue) -> String {
    let what = match &cue.kind {
        EffectKind::FadeOut { color } => format!("fade out to {color}"),
        EffectKind::FadeIn { color } => format!("fade in from {color}"),
        EffectKind::WhiteOut => "white out".to_string(),
        EffectKind::CharacterFade => "characters fade out".to_string(),
        EffectKind::EventFadeIn => "event art fades in".to_string(),
        EffectKind::EventFadeOut => "event art fades out".to_string(),
        EffectKind::Hold => "hold".to_string(),
        EffectKind::AffinityUp { flag, .. } => match flag {
            Some(flag) => format!("{flag} affinity up"),
            None => "affinity up".to_string(),
        },
        EffectKind::AffinityDown { flag, .. } => match flag {
            Some(flag) => format!("{flag} affinity down"),
            None => "affinity down".to_string(),
        },
    };
    format!("{what}, {}ms", cue.duration_ms)
}
