//! The scene player state machine.
//!
//! [`ScenePlayer`] walks a scene script one story line at a time. It owns
//! no timers and touches no screen: each step returns [`Directive`]s for
//! the host to perform plus the [`Phase`] the machine now waits in, and
//! the host feeds observed input back as [`PlayerEvent`]s. Anything a
//! script gets wrong at runtime is logged and played through rather than
//! surfaced as an error.

use std::collections::VecDeque;

use hotaru_progress::ProgressStore;
use hotaru_script::action::{CHAR_DELAY_MS, DEFAULT_AFFINITY_CUE_MS};
use hotaru_script::{Action, ChoiceOption, RawAction, SceneScript, StoryLine, parse_command};
use tracing::{debug, warn};

use crate::directive::{
    Directive, EffectCue, EffectKind, NavTarget, Phase, PlayerEvent, ScreenFilter, StepOutput,
};
use crate::segment::{Reveal, SegmentRun};
use crate::state::InterpreterState;

/// Length of the fade-to-black half of a background swap.
const BACKGROUND_SWAP_FADE_MS: u64 = 200;

/// What dispatching an action did to the flow of play.
enum Dispatch {
    /// Done; play moves on to the next line.
    Advance,
    /// Done; the line's own text decides what happens next.
    Stay,
    /// A gate opened; playback waits in this phase.
    Wait(Phase),
}

/// Queued effect-chain steps plus what happens when they run out.
///
/// Each step's directives are emitted together; a step whose last
/// directive is a [`Directive::PlayEffect`] waits for
/// [`PlayerEvent::EffectFinished`] before the next step runs.
struct EffectChain {
    steps: VecDeque<Vec<Directive>>,
    then: ChainEnd,
}

/// Where play goes once an effect chain is exhausted.
#[derive(Clone, Copy)]
enum ChainEnd {
    /// Display the next story line.
    NextLine,
    /// Mark the scene completed and hand control to the main menu.
    Menu,
}

/// Plays one scene script against a progress store.
///
/// Create with [`ScenePlayer::new`], call [`ScenePlayer::start`] once,
/// then feed host input through [`ScenePlayer::handle`] until a step
/// reports [`Phase::SceneEnded`]. At most one effect is ever in flight:
/// while the phase is [`Phase::PlayingEffect`] the only event that moves
/// the machine is [`PlayerEvent::EffectFinished`], so a click can never
/// race an effect's completion.
pub struct ScenePlayer {
    script: SceneScript,
    scene_id: String,
    store: ProgressStore,
    state: InterpreterState,
    chain: Option<EffectChain>,
}

impl ScenePlayer {
    /// Wrap a script and a progress store into an unstarted player.
    pub fn new(script: SceneScript, scene_id: impl Into<String>, store: ProgressStore) -> Self {
        Self {
            script,
            scene_id: scene_id.into(),
            store,
            state: InterpreterState::default(),
            chain: None,
        }
    }

    /// Begin playback: stamp the scene's visited marker and display the
    /// first line. Call once, before any [`ScenePlayer::handle`].
    pub fn start(&mut self) -> StepOutput {
        match self.store.mark_visited(&self.scene_id) {
            Ok(true) => debug!(scene = %self.scene_id, "first visit recorded"),
            Ok(false) => {}
            Err(err) => warn!(scene = %self.scene_id, error = %err, "could not record visit"),
        }
        let mut directives = Vec::new();
        let phase = self.step_from(0, &mut directives);
        self.finish_step(directives, phase)
    }

    /// Feed one host event through the state machine.
    ///
    /// Events that do not fit the current phase are logged and ignored.
    pub fn handle(&mut self, event: PlayerEvent) -> StepOutput {
        let mut directives = Vec::new();
        let phase = match (self.state.phase, event) {
            (Phase::SceneEnded, _) => Phase::SceneEnded,
            (Phase::Typing, PlayerEvent::TypingFinished) => {
                self.finish_typing(false, &mut directives)
            }
            (Phase::Typing, PlayerEvent::Advance) => self.finish_typing(true, &mut directives),
            (Phase::AwaitingSegmentClick, PlayerEvent::Advance) => {
                self.next_segment(&mut directives)
            }
            (Phase::AwaitingCommand, PlayerEvent::Advance) => {
                self.step_from(self.state.line + 1, &mut directives)
            }
            (Phase::AwaitingChoice, PlayerEvent::ChoicePicked(index)) => {
                self.pick_choice(index, &mut directives)
            }
            (Phase::AwaitingChoice, PlayerEvent::Advance) => {
                debug!("advance ignored while choices are up");
                Phase::AwaitingChoice
            }
            (Phase::PlayingEffect, PlayerEvent::EffectFinished) => {
                self.resume_chain(&mut directives)
            }
            (Phase::PlayingEffect, PlayerEvent::Advance) => {
                debug!("advance ignored while an effect is running");
                Phase::PlayingEffect
            }
            (phase, event) => {
                warn!(?phase, ?event, "event does not fit the current phase; ignored");
                phase
            }
        };
        self.finish_step(directives, phase)
    }

    /// The script being played.
    pub fn script(&self) -> &SceneScript {
        &self.script
    }

    /// The identifier progress is recorded under.
    pub fn scene_id(&self) -> &str {
        &self.scene_id
    }

    /// The observable interpreter state.
    pub fn state(&self) -> &InterpreterState {
        &self.state
    }

    /// What the player is currently waiting for.
    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// The progress store playback records into.
    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    /// Reclaim the store, e.g. to carry it into the next scene.
    pub fn into_store(self) -> ProgressStore {
        self.store
    }

    fn finish_step(&mut self, directives: Vec<Directive>, phase: Phase) -> StepOutput {
        self.state.phase = phase;
        StepOutput { directives, phase }
    }

    /// Walk story lines from `index` until something needs the host.
    ///
    /// Structural lines feed the branch tracker and never render, even
    /// inside a skipped region; each is processed exactly once per visit.
    /// Non-structural lines under a false conditional arm advance
    /// silently. Past the last line the scene ends.
    fn step_from(&mut self, index: usize, out: &mut Vec<Directive>) -> Phase {
        let mut index = index;
        loop {
            if index >= self.script.len() {
                return self.end_scene(out);
            }
            self.state.line = index;
            self.state.run = None;
            let line = self.script.story[index].clone();

            if let Some(raw) = line.command_text() {
                match self.dispatch_command(index, raw, out) {
                    Dispatch::Advance | Dispatch::Stay => index += 1,
                    Dispatch::Wait(phase) => return phase,
                }
                continue;
            }

            if let Some(action) = line.action.as_ref().and_then(RawAction::as_action) {
                if action.is_structural() {
                    self.apply_structural(action);
                    index += 1;
                    continue;
                }
            }
            if self.state.branches.should_skip() {
                index += 1;
                continue;
            }
            match self.render_line(&line, out) {
                Some(phase) => return phase,
                None => index += 1,
            }
        }
    }

    /// Run one command line. Unknown or unparsable commands are no-ops.
    fn dispatch_command(&mut self, index: usize, raw: &str, out: &mut Vec<Directive>) -> Dispatch {
        let parsed = parse_command(raw);
        let action = parsed.as_ref().and_then(|command| command.to_action());

        if let Some(action) = &action {
            if action.is_structural() {
                self.apply_structural(action);
                return Dispatch::Advance;
            }
        }
        if self.state.branches.should_skip() {
            return Dispatch::Advance;
        }
        let Some(action) = action else {
            match parsed {
                Some(command) => {
                    warn!(line = index, name = %command.name, "unknown command; line skipped");
                }
                None => {
                    warn!(line = index, command = raw, "no bracket group in command; line skipped");
                }
            }
            return Dispatch::Advance;
        };
        if matches!(action, Action::WaitForClick) {
            out.push(Directive::ShowContinuePrompt);
            return Dispatch::Wait(Phase::AwaitingCommand);
        }
        self.dispatch_action(action, out)
    }

    /// Feed one conditional-family action through the branch tracker.
    ///
    /// Conditions evaluate against the store's current affinity values. A
    /// conditional nested inside a skipped region still pushes a frame so
    /// its `[endif]` stays matched, but leaves the selection gate alone
    /// because it never executed.
    fn apply_structural(&mut self, action: &Action) {
        match action {
            Action::Conditional { condition } => {
                let result = hotaru_script::evaluate_condition(
                    condition,
                    &self.store.record().game_state.affinity,
                );
                debug!(line = self.state.line, condition = %condition, result, "conditional opened");
                if self.state.branches.should_skip() {
                    self.state.branches.open_skipped(result);
                } else {
                    self.state.branches.open(result);
                }
            }
            Action::ConditionalElse => self.state.branches.alternate(),
            Action::ConditionalEnd => self.state.branches.close(),
            _ => {}
        }
    }

    /// Render a narrative line: speaker, text, assets, then any embedded
    /// action. Returns `None` when the embedded action moves play onward
    /// by itself.
    fn render_line(&mut self, line: &StoryLine, out: &mut Vec<Directive>) -> Option<Phase> {
        match &line.speaker {
            Some(name) => out.push(Directive::SetSpeaker { name: name.clone() }),
            None => out.push(Directive::ClearSpeaker),
        }

        let mut run = SegmentRun::new(&line.text);
        let text_phase = match run.next_reveal() {
            Some(reveal) => {
                self.state.run = Some(run);
                self.begin_reveal(&reveal, out)
            }
            None => {
                // Every segment blank; show an empty box and wait.
                out.push(Directive::ShowText {
                    full: String::new(),
                    revealed: 0,
                    char_delay_ms: CHAR_DELAY_MS,
                });
                Phase::AwaitingCommand
            }
        };

        if let Some(key) = &line.background {
            match self.script.background_path(key) {
                Some(path) => out.push(Directive::SetBackground {
                    path: path.to_string(),
                    position: None,
                }),
                None => warn!(line = self.state.line, key = %key, "background key not defined"),
            }
        }
        if let Some(key) = &line.bgm {
            if key == "bgm stop" {
                out.push(Directive::StopBgm);
            } else {
                match self.script.bgm_path(key) {
                    Some(path) => out.push(Directive::PlayBgm {
                        path: path.to_string(),
                    }),
                    None => warn!(line = self.state.line, key = %key, "bgm key not defined"),
                }
            }
        }
        if let Some(key) = &line.audio {
            // The bgm field owns keys present in both maps.
            if !self.script.is_bgm_key(key) {
                match self.script.audio_path(key) {
                    Some(path) => out.push(Directive::PlaySound {
                        path: path.to_string(),
                    }),
                    None => warn!(line = self.state.line, key = %key, "audio key not defined"),
                }
            }
        }
        if let Some(key) = &line.video {
            match self.script.video_path(key) {
                Some(path) => out.push(Directive::PlayVideo {
                    path: path.to_string(),
                }),
                None => warn!(line = self.state.line, key = %key, "video key not defined"),
            }
        }

        if let Some(raw) = &line.action {
            match raw.as_action() {
                Some(action) => match self.dispatch_action(action.clone(), out) {
                    Dispatch::Wait(phase) => return Some(phase),
                    Dispatch::Advance => return None,
                    Dispatch::Stay => {}
                },
                None => warn!(line = self.state.line, "unrecognized action object; ignored"),
            }
        }

        Some(text_phase)
    }

    /// Emit a reveal and decide what to wait for. Reveals with nothing
    /// left to type skip the typewriter entirely.
    fn begin_reveal(&mut self, reveal: &Reveal, out: &mut Vec<Directive>) -> Phase {
        let needs_typing = reveal.revealed < reveal.full.len();
        out.push(Directive::ShowText {
            full: reveal.full.clone(),
            revealed: reveal.revealed,
            char_delay_ms: CHAR_DELAY_MS,
        });
        if needs_typing {
            return Phase::Typing;
        }
        self.after_reveal()
    }

    /// Where a finished reveal leaves the machine: segmented lines wait
    /// for the next segment click, unsegmented lines go back to idle.
    fn after_reveal(&mut self) -> Phase {
        if self.state.run.as_ref().is_some_and(SegmentRun::is_split) {
            Phase::AwaitingSegmentClick
        } else {
            self.state.run = None;
            Phase::AwaitingCommand
        }
    }

    /// Complete the current reveal, either because the typewriter
    /// reported done or because a click cut it short. The cursor never
    /// moves here; the follow-up advance does that.
    fn finish_typing(&mut self, cut_short: bool, out: &mut Vec<Directive>) -> Phase {
        if cut_short {
            if let Some(reveal) = self.state.run.as_ref().and_then(SegmentRun::current_reveal) {
                let revealed = reveal.full.len();
                out.push(Directive::ShowText {
                    full: reveal.full,
                    revealed,
                    char_delay_ms: CHAR_DELAY_MS,
                });
            }
        }
        self.after_reveal()
    }

    /// Reveal the next segment, or clear a finished line.
    ///
    /// The click that lands after the last segment only clears the run;
    /// the one after that moves lines. Scripts pace their beats around
    /// that extra click.
    fn next_segment(&mut self, out: &mut Vec<Directive>) -> Phase {
        let Some(run) = self.state.run.as_mut() else {
            warn!("segment click with no reveal in progress");
            return Phase::AwaitingCommand;
        };
        match run.next_reveal() {
            Some(reveal) => self.begin_reveal(&reveal, out),
            None => {
                self.state.run = None;
                Phase::AwaitingCommand
            }
        }
    }

    /// Navigate to the picked choice's target scene.
    fn pick_choice(&mut self, index: usize, out: &mut Vec<Directive>) -> Phase {
        let Some(choice) = self.state.active_choices.get(index) else {
            warn!(
                index,
                count = self.state.active_choices.len(),
                "choice index out of range"
            );
            return Phase::AwaitingChoice;
        };
        let target = choice.target.clone();
        debug!(index, target = %target, "choice picked");
        self.state.active_choices.clear();
        out.push(Directive::StopAllAudio);
        out.push(Directive::Navigate {
            target: NavTarget::Scene(target),
        });
        Phase::SceneEnded
    }

    /// Put a choice list on screen; an empty list plays on instead of
    /// stalling the scene.
    fn present_choices(&mut self, choices: Vec<ChoiceOption>, out: &mut Vec<Directive>) -> Dispatch {
        if choices.is_empty() {
            debug!(line = self.state.line, "no choices to show");
            return Dispatch::Advance;
        }
        out.push(Directive::ShowChoices {
            choices: choices.clone(),
        });
        self.state.active_choices = choices;
        Dispatch::Wait(Phase::AwaitingChoice)
    }

    /// Mark the scene completed and show the end-of-scene prompt.
    fn end_scene(&mut self, out: &mut Vec<Directive>) -> Phase {
        self.record_completion();
        out.push(Directive::ShowContinuePrompt);
        Phase::SceneEnded
    }

    /// Completion persists once per scene; failures degrade to a warning.
    fn record_completion(&mut self) {
        match self.store.mark_completed(&self.scene_id) {
            Ok(true) => debug!(scene = %self.scene_id, "completion recorded"),
            Ok(false) => {}
            Err(err) => {
                warn!(scene = %self.scene_id, error = %err, "could not record completion");
            }
        }
    }

    /// Queue an effect chain and run it up to its first gate.
    fn start_chain(
        &mut self,
        steps: Vec<Vec<Directive>>,
        then: ChainEnd,
        out: &mut Vec<Directive>,
    ) -> Dispatch {
        self.chain = Some(EffectChain {
            steps: steps.into(),
            then,
        });
        Dispatch::Wait(self.resume_chain(out))
    }

    /// Emit chain steps until one gates on an effect or the chain ends.
    fn resume_chain(&mut self, out: &mut Vec<Directive>) -> Phase {
        let Some(mut chain) = self.chain.take() else {
            warn!("effect completion with no effect in flight");
            return Phase::AwaitingCommand;
        };
        while let Some(step) = chain.steps.pop_front() {
            let gated = matches!(step.last(), Some(Directive::PlayEffect(_)));
            out.extend(step);
            if gated {
                self.chain = Some(chain);
                return Phase::PlayingEffect;
            }
        }
        match chain.then {
            ChainEnd::NextLine => self.step_from(self.state.line + 1, out),
            ChainEnd::Menu => {
                self.record_completion();
                out.push(Directive::StopAllAudio);
                out.push(Directive::Navigate {
                    target: NavTarget::MainMenu,
                });
                Phase::SceneEnded
            }
        }
    }

    /// Perform one non-structural action.
    fn dispatch_action(&mut self, action: Action, out: &mut Vec<Directive>) -> Dispatch {
        match action {
            Action::ClearName => {
                out.push(Directive::ClearSpeaker);
                Dispatch::Stay
            }
            Action::HideText => {
                out.push(Directive::HideTextWindow);
                Dispatch::Stay
            }
            Action::ShowText => {
                out.push(Directive::ShowTextWindow);
                Dispatch::Stay
            }
            Action::HideAllCharacters => {
                out.push(Directive::HideAllCharacters);
                Dispatch::Stay
            }
            Action::HideEventVisual => {
                out.push(Directive::HideEventVisual);
                Dispatch::Stay
            }
            Action::WindowMode { visible } => {
                out.push(if visible {
                    Directive::ShowTextWindow
                } else {
                    Directive::HideTextWindow
                });
                Dispatch::Stay
            }
            // On a command line the prompt path handles this; embedded in
            // a narrative line it asks for nothing the text does not.
            Action::WaitForClick => Dispatch::Stay,

            Action::SepiaStart => {
                out.push(Directive::ApplyFilter {
                    filter: ScreenFilter::Sepia,
                });
                Dispatch::Advance
            }
            Action::SepiaEnd => {
                out.push(Directive::RemoveFilter {
                    filter: ScreenFilter::Sepia,
                });
                Dispatch::Advance
            }
            Action::NegaposiFlip => {
                out.push(Directive::ApplyFilter {
                    filter: ScreenFilter::Inverted,
                });
                Dispatch::Advance
            }
            Action::NegaposiFlipEnd => {
                out.push(Directive::RemoveFilter {
                    filter: ScreenFilter::Inverted,
                });
                Dispatch::Advance
            }

            Action::AddSelection { text, target } => {
                // Gated on the most recent conditional that executed,
                // open or already closed.
                if self.state.branches.current_result() == Some(false) {
                    debug!(line = self.state.line, "selection suppressed by conditional gate");
                } else {
                    self.state.pending_choices.push(ChoiceOption { text, target });
                }
                Dispatch::Advance
            }
            Action::ShowSelections => {
                let choices = std::mem::take(&mut self.state.pending_choices);
                self.present_choices(choices, out)
            }
            Action::Choice { choices } => self.present_choices(choices, out),

            Action::NextScene { target } => {
                out.push(Directive::StopAllAudio);
                out.push(Directive::Navigate {
                    target: NavTarget::Scene(target),
                });
                Dispatch::Wait(Phase::SceneEnded)
            }
            Action::ReturnToMenu => {
                self.record_completion();
                out.push(Directive::StopAllAudio);
                out.push(Directive::Navigate {
                    target: NavTarget::MainMenu,
                });
                Dispatch::Wait(Phase::SceneEnded)
            }

            Action::AffinityChange { flag, add } => {
                match self.store.adjust_affinity(&flag, add) {
                    Ok(value) => debug!(flag = %flag, add, value, "affinity adjusted"),
                    Err(err) => warn!(flag = %flag, error = %err, "could not persist affinity"),
                }
                if add == 0 {
                    return Dispatch::Advance;
                }
                let kind = if add > 0 {
                    EffectKind::AffinityUp {
                        flag: Some(flag),
                        delta: add,
                    }
                } else {
                    EffectKind::AffinityDown {
                        flag: Some(flag),
                        delta: add,
                    }
                };
                self.start_chain(
                    vec![vec![effect(kind, DEFAULT_AFFINITY_CUE_MS)]],
                    ChainEnd::NextLine,
                    out,
                )
            }
            Action::AffinityUpShow { flag, time } => self.start_chain(
                vec![vec![effect(EffectKind::AffinityUp { flag, delta: 1 }, time)]],
                ChainEnd::NextLine,
                out,
            ),
            Action::AffinityDownShow { flag, time } => self.start_chain(
                vec![vec![effect(
                    EffectKind::AffinityDown { flag, delta: -1 },
                    time,
                )]],
                ChainEnd::NextLine,
                out,
            ),

            Action::FadeOut {
                duration,
                background_color,
            } => self.start_chain(
                vec![vec![effect(
                    EffectKind::FadeOut {
                        color: background_color,
                    },
                    duration,
                )]],
                ChainEnd::NextLine,
                out,
            ),
            Action::FadeIn {
                duration,
                background_color,
            } => self.start_chain(
                vec![vec![effect(
                    EffectKind::FadeIn {
                        color: background_color,
                    },
                    duration,
                )]],
                ChainEnd::NextLine,
                out,
            ),
            Action::FadeOutWhite { duration } => self.start_chain(
                vec![vec![effect(
                    EffectKind::FadeOut {
                        color: "white".to_string(),
                    },
                    duration,
                )]],
                ChainEnd::NextLine,
                out,
            ),
            Action::WhiteOut { time } => {
                let mut step = clear_stage();
                step.push(effect(EffectKind::WhiteOut, time));
                self.start_chain(vec![step], ChainEnd::NextLine, out)
            }
            Action::HideCharacter { time } => self.start_chain(
                vec![vec![effect(EffectKind::CharacterFade, time)]],
                ChainEnd::NextLine,
                out,
            ),

            Action::BackgroundChange {
                file,
                time,
                position,
            } => {
                let Some(path) = self.script.background_path(&file).map(str::to_string) else {
                    warn!(line = self.state.line, key = %file, "background key not defined; change skipped");
                    return Dispatch::Advance;
                };
                let mut cover = clear_stage();
                cover.push(effect(
                    EffectKind::FadeOut {
                        color: "black".to_string(),
                    },
                    BACKGROUND_SWAP_FADE_MS,
                ));
                let swap = vec![
                    Directive::SetBackground { path, position },
                    effect(
                        EffectKind::FadeIn {
                            color: "black".to_string(),
                        },
                        time,
                    ),
                ];
                self.start_chain(vec![cover, swap], ChainEnd::NextLine, out)
            }
            Action::BackgroundChangeNoTransition { file, time } => {
                let Some(path) = self.script.background_path(&file).map(str::to_string) else {
                    warn!(line = self.state.line, key = %file, "background key not defined; change skipped");
                    return Dispatch::Advance;
                };
                let mut step = clear_stage();
                step.push(Directive::SetBackground {
                    path,
                    position: None,
                });
                step.push(effect(
                    EffectKind::FadeIn {
                        color: "transparent".to_string(),
                    },
                    time,
                ));
                self.start_chain(vec![step], ChainEnd::NextLine, out)
            }
            Action::BackgroundErase { time, transition } => {
                let mut step = clear_stage();
                step.push(Directive::HideBackground);
                step.push(effect(EffectKind::FadeIn { color: transition }, time));
                self.start_chain(vec![step], ChainEnd::NextLine, out)
            }
            Action::EventShow {
                file,
                opacity,
                time,
            } => {
                let Some(path) = self.script.event_path(&file).map(str::to_string) else {
                    warn!(line = self.state.line, key = %file, "event key not defined; show skipped");
                    return Dispatch::Advance;
                };
                let mut step = clear_stage();
                step.push(Directive::ShowEventVisual { path, opacity });
                step.push(effect(EffectKind::EventFadeIn, time));
                self.start_chain(vec![step], ChainEnd::NextLine, out)
            }
            Action::EventHide { time } => self.start_chain(
                vec![
                    vec![
                        Directive::ClearSpeaker,
                        Directive::HideTextWindow,
                        effect(EffectKind::EventFadeOut, time),
                    ],
                    vec![Directive::HideEventVisual],
                ],
                ChainEnd::NextLine,
                out,
            ),

            Action::FinishGame { bg_color, duration } => {
                let mut step = clear_stage();
                step.push(effect(EffectKind::FadeOut { color: bg_color }, duration));
                self.start_chain(vec![step], ChainEnd::NextLine, out)
            }
            Action::FinishGameNoTransition { bg_color, duration } => {
                let mut step = clear_stage();
                step.push(Directive::CoverScreen { color: bg_color });
                step.push(effect(EffectKind::Hold, duration));
                self.start_chain(vec![step], ChainEnd::NextLine, out)
            }
            Action::ChapterEnd { bg_color, duration } => {
                let mut step = clear_stage();
                step.push(effect(EffectKind::FadeOut { color: bg_color }, duration));
                self.start_chain(vec![step], ChainEnd::Menu, out)
            }

            structural @ (Action::Conditional { .. }
            | Action::ConditionalElse
            | Action::ConditionalEnd) => {
                self.apply_structural(&structural);
                Dispatch::Advance
            }
        }
    }
}

/// Wrap an effect into its directive.
fn effect(kind: EffectKind, duration_ms: u64) -> Directive {
    Directive::PlayEffect(EffectCue { kind, duration_ms })
}

/// The stage reset most full-screen transitions start with.
fn clear_stage() -> Vec<Directive> {
    vec![
        Directive::ClearSpeaker,
        Directive::HideTextWindow,
        Directive::HideAllCharacters,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script_from(json: &str) -> SceneScript {
        SceneScript::from_json(json).unwrap()
    }

    fn player(json: &str) -> ScenePlayer {
        ScenePlayer::new(script_from(json), "scene1", ProgressStore::in_memory())
    }

    fn shows_text(output: &StepOutput, full: &str) -> bool {
        output.directives.contains(&Directive::ShowText {
            full: full.to_string(),
            revealed: 0,
            char_delay_ms: 30,
        })
    }

    const TWO_LINES: &str = r#"{
        "story": [
            { "speaker": "Yurina", "text": "Good morning." },
            { "text": "The classroom hums." }
        ]
    }"#;

    const BRANCHED: &str = r#"{
        "story": [
            { "command": "[if cond=\"f.yurina >= 2\"]" },
            { "text": "High affinity route." },
            { "command": "[else]" },
            { "text": "Low affinity route." },
            { "command": "[endif]" },
            { "text": "Common route." }
        ]
    }"#;

    #[test]
    fn dialogue_types_then_advances() {
        let mut player = player(TWO_LINES);

        let output = player.start();
        assert_eq!(output.phase, Phase::Typing);
        assert!(output.directives.contains(&Directive::SetSpeaker {
            name: "Yurina".to_string(),
        }));
        assert!(shows_text(&output, "Good morning."));

        let output = player.handle(PlayerEvent::TypingFinished);
        assert_eq!(output.phase, Phase::AwaitingCommand);
        assert!(output.directives.is_empty());

        let output = player.handle(PlayerEvent::Advance);
        assert_eq!(output.phase, Phase::Typing);
        assert!(output.directives.contains(&Directive::ClearSpeaker));
        assert!(shows_text(&output, "The classroom hums."));
        assert_eq!(player.state().line, 1);
    }

    #[test]
    fn advance_mid_typing_completes_the_reveal() {
        let mut player = player(TWO_LINES);
        player.start();

        let output = player.handle(PlayerEvent::Advance);
        assert_eq!(output.phase, Phase::AwaitingCommand);
        assert!(output.directives.contains(&Directive::ShowText {
            full: "Good morning.".to_string(),
            revealed: "Good morning.".len(),
            char_delay_ms: 30,
        }));
        // The cursor stays; the next advance moves lines.
        assert_eq!(player.state().line, 0);
    }

    #[test]
    fn segments_accumulate_and_cost_a_clearing_click() {
        let mut player = player(
            r#"{ "story": [
                { "text": "Hello[s] world[s]!" },
                { "text": "Next line." }
            ] }"#,
        );

        let output = player.start();
        assert!(shows_text(&output, "Hello"));
        player.handle(PlayerEvent::TypingFinished);
        assert_eq!(player.phase(), Phase::AwaitingSegmentClick);

        let output = player.handle(PlayerEvent::Advance);
        assert_eq!(output.phase, Phase::Typing);
        assert!(output.directives.contains(&Directive::ShowText {
            full: "Hello world".to_string(),
            revealed: 5,
            char_delay_ms: 30,
        }));
        player.handle(PlayerEvent::TypingFinished);

        let output = player.handle(PlayerEvent::Advance);
        assert!(output.directives.contains(&Directive::ShowText {
            full: "Hello world!".to_string(),
            revealed: 11,
            char_delay_ms: 30,
        }));
        player.handle(PlayerEvent::TypingFinished);
        assert_eq!(player.phase(), Phase::AwaitingSegmentClick);

        // One click clears the finished line, the next moves on.
        let output = player.handle(PlayerEvent::Advance);
        assert_eq!(output.phase, Phase::AwaitingCommand);
        assert!(output.directives.is_empty());
        assert_eq!(player.state().line, 0);

        let output = player.handle(PlayerEvent::Advance);
        assert!(shows_text(&output, "Next line."));
        assert_eq!(player.state().line, 1);
    }

    #[test]
    fn fadeout_gates_on_effect_completion() {
        let mut player = player(
            r#"{ "story": [
                { "command": "[fadeout time=500 color=white]" },
                { "text": "After the fade." }
            ] }"#,
        );

        let output = player.start();
        assert_eq!(output.phase, Phase::PlayingEffect);
        assert!(output.directives.contains(&Directive::PlayEffect(EffectCue {
            kind: EffectKind::FadeOut {
                color: "white".to_string(),
            },
            duration_ms: 500,
        })));

        // Clicks cannot race the effect.
        let output = player.handle(PlayerEvent::Advance);
        assert_eq!(output.phase, Phase::PlayingEffect);
        assert!(output.directives.is_empty());

        let output = player.handle(PlayerEvent::EffectFinished);
        assert_eq!(output.phase, Phase::Typing);
        assert!(shows_text(&output, "After the fade."));
    }

    #[test]
    fn background_change_runs_cover_then_swap() {
        let mut player = player(
            r#"{
                "background": { "classroom": "images/classroom.png" },
                "story": [
                    { "text": "", "action": { "type": "backgroundChange", "file": "classroom", "time": 600 } },
                    { "text": "Later." }
                ]
            }"#,
        );

        let output = player.start();
        assert_eq!(output.phase, Phase::PlayingEffect);
        assert!(output.directives.contains(&Directive::HideTextWindow));
        assert!(output.directives.contains(&Directive::PlayEffect(EffectCue {
            kind: EffectKind::FadeOut {
                color: "black".to_string(),
            },
            duration_ms: 200,
        })));
        assert!(
            !output
                .directives
                .iter()
                .any(|d| matches!(d, Directive::SetBackground { .. }))
        );

        let output = player.handle(PlayerEvent::EffectFinished);
        assert_eq!(output.phase, Phase::PlayingEffect);
        assert!(output.directives.contains(&Directive::SetBackground {
            path: "images/classroom.png".to_string(),
            position: None,
        }));
        assert!(output.directives.contains(&Directive::PlayEffect(EffectCue {
            kind: EffectKind::FadeIn {
                color: "black".to_string(),
            },
            duration_ms: 600,
        })));

        let output = player.handle(PlayerEvent::EffectFinished);
        assert_eq!(output.phase, Phase::Typing);
        assert!(shows_text(&output, "Later."));
    }

    #[test]
    fn false_conditions_take_the_else_arm() {
        let mut player = player(BRANCHED);

        // f.yurina is unset, so the else arm plays.
        let output = player.start();
        assert!(shows_text(&output, "Low affinity route."));
        player.handle(PlayerEvent::TypingFinished);

        let output = player.handle(PlayerEvent::Advance);
        assert!(shows_text(&output, "Common route."));
        assert_eq!(player.state().branches.depth(), 0);
    }

    #[test]
    fn true_conditions_take_the_if_arm() {
        let mut store = ProgressStore::in_memory();
        store.adjust_affinity("yurina", 2).unwrap();
        let mut player = ScenePlayer::new(script_from(BRANCHED), "scene1", store);

        let output = player.start();
        assert!(shows_text(&output, "High affinity route."));
        player.handle(PlayerEvent::TypingFinished);

        let output = player.handle(PlayerEvent::Advance);
        assert!(shows_text(&output, "Common route."));
    }

    #[test]
    fn skipped_nested_conditionals_stay_balanced() {
        let mut player = player(
            r#"{ "story": [
                { "command": "[if cond=\"f.a >= 1\"]" },
                { "command": "[if cond=\"1\"]" },
                { "text": "Unreachable." },
                { "command": "[endif]" },
                { "command": "[endif]" },
                { "command": "[selection text=\"Stay\" target=scene2]" },
                { "command": "[showselections]" },
                { "text": "No choices shown." }
            ] }"#,
        );

        let output = player.start();
        assert_eq!(player.state().branches.depth(), 0);
        // The gate still reads the outer condition that failed, so the
        // selection never queues and the empty list plays on.
        assert!(shows_text(&output, "No choices shown."));
        assert!(
            !output
                .directives
                .iter()
                .any(|d| matches!(d, Directive::ShowChoices { .. }))
        );
    }

    #[test]
    fn selections_present_and_navigate() {
        let mut player = player(
            r#"{ "story": [
                { "command": "[if cond=\"f.yurina >= 0\"]" },
                { "command": "[selection text=\"Library\" target=scene2]" },
                { "command": "[endif]" },
                { "command": "[selection text=\"Home\" target=scene3]" },
                { "command": "[showselections]" }
            ] }"#,
        );

        let output = player.start();
        assert_eq!(output.phase, Phase::AwaitingChoice);
        assert!(output.directives.contains(&Directive::ShowChoices {
            choices: vec![
                ChoiceOption {
                    text: "Library".to_string(),
                    target: "scene2".to_string(),
                },
                ChoiceOption {
                    text: "Home".to_string(),
                    target: "scene3".to_string(),
                },
            ],
        }));

        // Plain advances do nothing while the list is up.
        let output = player.handle(PlayerEvent::Advance);
        assert_eq!(output.phase, Phase::AwaitingChoice);
        assert!(output.directives.is_empty());

        // An out-of-range pick keeps waiting.
        let output = player.handle(PlayerEvent::ChoicePicked(7));
        assert_eq!(output.phase, Phase::AwaitingChoice);

        let output = player.handle(PlayerEvent::ChoicePicked(1));
        assert!(output.scene_ended());
        assert!(output.directives.contains(&Directive::StopAllAudio));
        assert!(output.directives.contains(&Directive::Navigate {
            target: NavTarget::Scene("scene3".to_string()),
        }));
        assert!(!player.store().is_completed("scene1"));
    }

    #[test]
    fn inline_choice_lists_present_immediately() {
        let mut player = player(
            r#"{ "story": [
                { "speaker": "Mei", "text": "Which way?", "action": { "type": "choice", "choices": [
                    { "text": "Left", "target": "scene2" },
                    { "text": "Right", "target": "scene3" }
                ] } }
            ] }"#,
        );

        let output = player.start();
        assert_eq!(output.phase, Phase::AwaitingChoice);
        // The question text still goes up behind the list.
        assert!(shows_text(&output, "Which way?"));

        let output = player.handle(PlayerEvent::ChoicePicked(0));
        assert!(output.directives.contains(&Directive::Navigate {
            target: NavTarget::Scene("scene2".to_string()),
        }));
    }

    #[test]
    fn affinity_changes_persist_and_cue() {
        let mut player = player(
            r#"{ "story": [
                { "command": "[affinity flag=yurina add=3]" },
                { "command": "[affinity flag=yurina add=-1]" },
                { "command": "[affinity flag=yurina add=0]" },
                { "text": "Done." }
            ] }"#,
        );

        let output = player.start();
        assert_eq!(output.phase, Phase::PlayingEffect);
        assert!(output.directives.contains(&Directive::PlayEffect(EffectCue {
            kind: EffectKind::AffinityUp {
                flag: Some("yurina".to_string()),
                delta: 3,
            },
            duration_ms: 1000,
        })));
        assert_eq!(player.store().affinity("yurina"), 3);

        let output = player.handle(PlayerEvent::EffectFinished);
        assert_eq!(output.phase, Phase::PlayingEffect);
        assert!(output.directives.contains(&Directive::PlayEffect(EffectCue {
            kind: EffectKind::AffinityDown {
                flag: Some("yurina".to_string()),
                delta: -1,
            },
            duration_ms: 1000,
        })));
        assert_eq!(player.store().affinity("yurina"), 2);

        // A zero delta plays no cue; the walk continues to the text.
        let output = player.handle(PlayerEvent::EffectFinished);
        assert_eq!(output.phase, Phase::Typing);
        assert!(shows_text(&output, "Done."));
        assert_eq!(player.store().affinity("yurina"), 2);
    }

    #[test]
    fn scene_end_records_completion_once() {
        let mut player = player(r#"{ "story": [ { "text": "Only line." } ] }"#);
        player.start();
        player.handle(PlayerEvent::TypingFinished);

        let output = player.handle(PlayerEvent::Advance);
        assert!(output.scene_ended());
        assert!(output.directives.contains(&Directive::ShowContinuePrompt));
        assert!(player.store().is_completed("scene1"));

        // Ended scenes ignore further input.
        let output = player.handle(PlayerEvent::Advance);
        assert_eq!(output.phase, Phase::SceneEnded);
        assert!(output.directives.is_empty());
        assert_eq!(player.store().record().completion_count(), 1);
    }

    #[test]
    fn starting_stamps_the_scene_marker() {
        let mut player = player(r#"{ "story": [ { "text": "Hi." } ] }"#);
        player.start();
        assert_eq!(
            player.store().record().scene_markers.get("scene1"),
            Some(&1)
        );
        assert!(!player.store().is_completed("scene1"));
    }

    #[test]
    fn empty_scripts_end_immediately() {
        let mut player = player(r#"{ "story": [] }"#);
        let output = player.start();
        assert!(output.scene_ended());
        assert!(player.store().is_completed("scene1"));
    }

    #[test]
    fn asset_keys_resolve_and_bgm_shadows_audio() {
        let mut player = player(
            r#"{
                "bgm": { "theme": "audio/theme.mp3" },
                "audio": { "theme": "audio/theme-once.mp3", "bell": "audio/bell.mp3" },
                "videos": { "intro": "video/intro.mp4" },
                "story": [
                    { "text": "One.", "bgm": "theme", "audio": "theme", "video": "intro" },
                    { "text": "Two.", "bgm": "bgm stop", "audio": "bell", "video": "missing" }
                ]
            }"#,
        );

        let output = player.start();
        assert!(output.directives.contains(&Directive::PlayBgm {
            path: "audio/theme.mp3".to_string(),
        }));
        // "theme" is a bgm key, so the audio field stays silent.
        assert!(
            !output
                .directives
                .iter()
                .any(|d| matches!(d, Directive::PlaySound { .. }))
        );
        assert!(output.directives.contains(&Directive::PlayVideo {
            path: "video/intro.mp4".to_string(),
        }));

        player.handle(PlayerEvent::TypingFinished);
        let output = player.handle(PlayerEvent::Advance);
        assert!(output.directives.contains(&Directive::StopBgm));
        assert!(output.directives.contains(&Directive::PlaySound {
            path: "audio/bell.mp3".to_string(),
        }));
        // An unmapped video key logs and plays nothing.
        assert!(
            !output
                .directives
                .iter()
                .any(|d| matches!(d, Directive::PlayVideo { .. }))
        );
    }

    #[test]
    fn unknown_commands_are_no_ops() {
        let mut player = player(
            r#"{ "story": [
                { "command": "[teleport dest=moon]" },
                { "text": "Still here." }
            ] }"#,
        );
        let output = player.start();
        assert!(shows_text(&output, "Still here."));
    }

    #[test]
    fn wait_for_click_prompts_and_holds() {
        let mut player = player(
            r#"{ "story": [
                { "command": "[s]" },
                { "text": "Moved on." }
            ] }"#,
        );

        let output = player.start();
        assert_eq!(output.phase, Phase::AwaitingCommand);
        assert!(output.directives.contains(&Directive::ShowContinuePrompt));

        let output = player.handle(PlayerEvent::Advance);
        assert!(shows_text(&output, "Moved on."));
    }

    #[test]
    fn next_scene_stops_audio_and_navigates() {
        let mut player = player(r#"{ "story": [ { "command": "[next target=scene4]" } ] }"#);

        let output = player.start();
        assert!(output.scene_ended());
        assert_eq!(
            output.directives,
            vec![
                Directive::StopAllAudio,
                Directive::Navigate {
                    target: NavTarget::Scene("scene4".to_string()),
                },
            ]
        );
        // Navigating away is not completing.
        assert!(!player.store().is_completed("scene1"));
    }

    #[test]
    fn chapter_end_fades_then_returns_to_menu() {
        let mut player = player(
            r#"{ "story": [
                { "text": "", "action": { "type": "chapterEnd", "bgColor": "white", "duration": 800 } }
            ] }"#,
        );

        let output = player.start();
        assert_eq!(output.phase, Phase::PlayingEffect);
        assert!(output.directives.contains(&Directive::PlayEffect(EffectCue {
            kind: EffectKind::FadeOut {
                color: "white".to_string(),
            },
            duration_ms: 800,
        })));

        let output = player.handle(PlayerEvent::EffectFinished);
        assert!(output.scene_ended());
        assert!(output.directives.contains(&Directive::StopAllAudio));
        assert!(output.directives.contains(&Directive::Navigate {
            target: NavTarget::MainMenu,
        }));
        assert!(player.store().is_completed("scene1"));
    }

    #[test]
    fn finish_game_fades_then_ends_the_scene() {
        let mut player = player(r#"{ "story": [ { "command": "[finish time=2000]" } ] }"#);

        let output = player.start();
        assert_eq!(output.phase, Phase::PlayingEffect);

        let output = player.handle(PlayerEvent::EffectFinished);
        assert!(output.scene_ended());
        assert!(output.directives.contains(&Directive::ShowContinuePrompt));
        assert!(player.store().is_completed("scene1"));
    }

    #[test]
    fn event_art_fades_in_then_out() {
        let mut player = player(
            r#"{
                "events": { "cg1": "images/event1.png" },
                "story": [
                    { "text": "", "action": { "type": "eventShow", "file": "cg1", "time": 400 } },
                    { "text": "", "action": { "type": "eventHide", "time": 300 } },
                    { "text": "After." }
                ]
            }"#,
        );

        let output = player.start();
        assert!(output.directives.contains(&Directive::ShowEventVisual {
            path: "images/event1.png".to_string(),
            opacity: 255,
        }));
        assert!(output.directives.contains(&Directive::PlayEffect(EffectCue {
            kind: EffectKind::EventFadeIn,
            duration_ms: 400,
        })));

        let output = player.handle(PlayerEvent::EffectFinished);
        assert!(output.directives.contains(&Directive::PlayEffect(EffectCue {
            kind: EffectKind::EventFadeOut,
            duration_ms: 300,
        })));

        let output = player.handle(PlayerEvent::EffectFinished);
        assert!(output.directives.contains(&Directive::HideEventVisual));
        assert_eq!(output.phase, Phase::Typing);
        assert!(shows_text(&output, "After."));
    }

    #[test]
    fn missing_event_art_skips_the_show() {
        let mut player = player(
            r#"{ "story": [
                { "text": "", "action": { "type": "eventShow", "file": "ghost" } },
                { "text": "Played on." }
            ] }"#,
        );
        let output = player.start();
        assert!(shows_text(&output, "Played on."));
        assert!(
            !output
                .directives
                .iter()
                .any(|d| matches!(d, Directive::ShowEventVisual { .. }))
        );
    }

    #[test]
    fn quiet_actions_leave_the_text_in_charge() {
        let mut player = player(
            r#"{ "story": [
                { "text": "Silence.", "action": { "type": "hideText" } },
                { "text": "Two." }
            ] }"#,
        );
        let output = player.start();
        assert_eq!(output.phase, Phase::Typing);
        assert!(output.directives.contains(&Directive::HideTextWindow));
        assert_eq!(player.state().line, 0);
    }

    #[test]
    fn filter_actions_apply_and_play_on() {
        let mut player = player(
            r#"{ "story": [
                { "text": "", "action": { "type": "sepiaStart" } },
                { "text": "Toned." }
            ] }"#,
        );
        let output = player.start();
        assert!(output.directives.contains(&Directive::ApplyFilter {
            filter: ScreenFilter::Sepia,
        }));
        assert!(shows_text(&output, "Toned."));
        assert_eq!(player.state().line, 1);
    }
}
