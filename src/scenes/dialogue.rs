use super::{Scene, SceneKind};
use crate::config::DialogueConfig;
use crate::engine::stage::{Node, NodeId, NodeKind, Stage};
use crate::engine::timeline::{Handle, Timeline, TweenSpec};
use crate::engine::{Color, Point, Renderer, TextStyle};
use crate::source::{DialogueLine, MagicWords};
use anyhow::Result;
use futures::channel::oneshot;

/// ELI5:
/// ┌──────────────── Dialogue Flow ──────────────────────────────────┐
/// │  Loading ─► FadeIn ─► Typing(i) ─► Paused(i) ─► Waiting         │
/// │                 ▲                                 │             │
/// │                 │            next line exists ◄───┤             │
/// │                 │                                 ▼             │
/// │                 └──────── FadingOut ◄──── end of dialogue       │
/// │                                                                 │
/// │  unknown speaker : Typing is skipped, only the skip delay runs  │
/// │  document failed : Failed(reason), nothing else happens         │
/// └─────────────────────────────────────────────────────────────────┘
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Loading,
    Typing { line: usize, revealed: usize },
    Paused { line: usize },
    /// between lines, after a skip, or before a restart
    Waiting,
    FadingOut,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
enum DialogueEvent {
    TypeNext,
    LineTyped,
    NextLine,
    Restart,
    FadedOut,
}

struct Character {
    name: String,
    sprite: NodeId,
    text: NodeId,
}

// centre of the design canvas
const MESSAGE_POSITION: Point = Point::new(960.0, 540.0);

/// Magic Words : characters reading a remote dialogue, one typed line at a time
pub struct DialogueScene {
    config: DialogueConfig,
    stage: Stage,
    timeline: Timeline<DialogueEvent>,
    pending: Option<oneshot::Receiver<Result<MagicWords>>>,
    characters: Vec<Character>,
    lines: Vec<DialogueLine>,
    index: usize,
    phase: Phase,
    typing_timer: Option<Handle>,
}

impl DialogueScene {
    pub fn new(config: DialogueConfig, document: oneshot::Receiver<Result<MagicWords>>) -> Self {
        DialogueScene {
            config,
            stage: Stage::new(),
            timeline: Timeline::new(),
            pending: Some(document),
            characters: Vec::new(),
            lines: Vec::new(),
            index: 0,
            phase: Phase::Loading,
            typing_timer: None,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Text currently displayed above `name`
    pub fn text_of(&self, name: &str) -> Option<&str> {
        let character = self.character(name)?;
        self.stage.get(character.text)?.content()
    }

    /// Avatar node of `name`, only for characters with a slot
    pub fn avatar_of(&self, name: &str) -> Option<&Node> {
        let character = self.character(name)?;
        self.stage.get(character.sprite)
    }

    fn character(&self, name: &str) -> Option<&Character> {
        self.characters.iter().find(|character| character.name == name)
    }

    fn poll_document(&mut self) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        let outcome = match pending.try_recv() {
            Ok(None) => return,
            Ok(Some(outcome)) => outcome,
            Err(oneshot::Canceled) => Err(anyhow::anyhow!("dialogue source went away")),
        };
        self.pending = None;
        match outcome {
            Ok(words) => self.start(words),
            Err(err) => self.fail(format!("{:#}", err)),
        }
    }

    fn start(&mut self, words: MagicWords) {
        log!(
            "Magic Words : {} lines, {} characters",
            words.dialogue.len(),
            words.characters.len()
        );
        let style = TextStyle::new(self.config.font_size, Color::WHITE).wrapped(self.config.wrap_width);
        for data in words.characters {
            let Some(position) = self.config.slot(&data.name) else {
                continue;
            };
            // a later entry for the same name replaces the avatar
            if let Some(sprite) = self.character(&data.name).map(|character| character.sprite) {
                if let Some(node) = self.stage.get_mut(sprite) {
                    node.kind = NodeKind::Sprite {
                        texture: data.avatar,
                    };
                }
                continue;
            }
            let sprite = self
                .stage
                .add(Node::sprite(data.avatar).at(position).centered().transparent());
            let text_position = Point::new(
                position.x + self.config.text_offset.x,
                position.y + self.config.text_offset.y,
            );
            let text = self
                .stage
                .add(Node::text("", style.clone()).at(text_position).centered());
            self.characters.push(Character {
                name: data.name,
                sprite,
                text,
            });
        }
        self.lines = words.dialogue;
        self.begin_loop();
    }

    fn fail(&mut self, reason: String) {
        error!("Magic Words unavailable : {}", reason);
        let style = TextStyle::new(self.config.font_size * 1.5, Color(0xff5555));
        self.stage.add(
            Node::text(format!("Dialogue unavailable: {}", reason), style)
                .at(MESSAGE_POSITION)
                .centered(),
        );
        self.phase = Phase::Failed(reason);
    }

    fn begin_loop(&mut self) {
        for character in &self.characters {
            self.timeline.tween(
                &self.stage,
                TweenSpec::to(character.sprite)
                    .alpha(1.0)
                    .duration(self.config.fade_in),
            );
        }
        self.index = 0;
        self.show_line();
    }

    fn show_line(&mut self) {
        if self.index >= self.lines.len() {
            self.phase = Phase::Waiting;
            self.timeline.after(self.config.restart_delay, DialogueEvent::Restart);
            return;
        }

        self.clear_texts();
        let speaker = &self.lines[self.index].speaker;
        let Some((sprite, text)) = self
            .character(speaker)
            .map(|character| (character.sprite, character.text))
        else {
            self.index += 1;
            self.phase = Phase::Waiting;
            self.timeline.after(self.config.skip_delay, DialogueEvent::NextLine);
            return;
        };

        self.timeline.tween(
            &self.stage,
            TweenSpec::to(sprite)
                .alpha(1.0)
                .duration(self.config.speaker_fade),
        );
        if let Some(punch) = self.config.scale_punch {
            for node in [sprite, text] {
                self.timeline.tween(
                    &self.stage,
                    TweenSpec::to(node).scale(punch.scale).duration(punch.duration),
                );
            }
        }
        self.phase = Phase::Typing {
            line: self.index,
            revealed: 0,
        };
        self.typing_timer = Some(
            self.timeline
                .every(self.config.type_interval, DialogueEvent::TypeNext),
        );
    }

    fn type_next(&mut self) {
        let Phase::Typing { line, revealed } = self.phase else {
            return;
        };
        let next = self.lines[line].text.chars().nth(revealed);
        match (next, self.speaker_text(line)) {
            (Some(letter), Some(text)) => {
                if let Some(content) = self.stage.get_mut(text).and_then(Node::content_mut) {
                    content.push(letter);
                }
                self.phase = Phase::Typing {
                    line,
                    revealed: revealed + 1,
                };
            }
            _ => {
                if let Some(handle) = self.typing_timer.take() {
                    self.timeline.cancel(handle);
                }
                self.phase = Phase::Paused { line };
                self.timeline
                    .after(self.config.pause_after_line, DialogueEvent::LineTyped);
            }
        }
    }

    fn speaker_text(&self, line: usize) -> Option<NodeId> {
        let speaker = &self.lines.get(line)?.speaker;
        self.character(speaker).map(|character| character.text)
    }

    fn line_typed(&mut self) {
        if let (Some(punch), Phase::Paused { line }) = (self.config.scale_punch, self.phase.clone()) {
            let speaker = self.lines[line].speaker.clone();
            if let Some((sprite, text)) = self
                .character(&speaker)
                .map(|character| (character.sprite, character.text))
            {
                for node in [sprite, text] {
                    self.timeline.tween(
                        &self.stage,
                        TweenSpec::to(node).scale(1.0).duration(punch.duration),
                    );
                }
            }
        }

        self.index += 1;
        self.phase = Phase::Waiting;
        if self.index < self.lines.len() {
            self.timeline.after(self.config.line_gap, DialogueEvent::NextLine);
        } else {
            self.timeline
                .after(self.config.restart_delay, DialogueEvent::Restart);
        }
    }

    fn restart(&mut self) {
        match self.config.fade_out {
            Some(duration) if !self.characters.is_empty() => {
                self.phase = Phase::FadingOut;
                for (position, character) in self.characters.iter().enumerate() {
                    let fade = TweenSpec::to(character.sprite).alpha(0.0).duration(duration);
                    // one completion for the whole group
                    let fade = if position == 0 {
                        fade.on_complete(DialogueEvent::FadedOut)
                    } else {
                        fade
                    };
                    self.timeline.tween(&self.stage, fade);
                }
            }
            _ => {
                self.clear_texts();
                self.index = 0;
                self.show_line();
            }
        }
    }

    fn clear_texts(&mut self) {
        for character in &self.characters {
            if let Some(content) = self.stage.get_mut(character.text).and_then(Node::content_mut) {
                content.clear();
            }
        }
    }

    fn on_event(&mut self, event: DialogueEvent) {
        match event {
            DialogueEvent::TypeNext => self.type_next(),
            DialogueEvent::LineTyped => self.line_typed(),
            DialogueEvent::NextLine => self.show_line(),
            DialogueEvent::Restart => self.restart(),
            DialogueEvent::FadedOut => {
                self.clear_texts();
                self.begin_loop();
            }
        }
    }
}

impl Scene for DialogueScene {
    fn kind(&self) -> SceneKind {
        SceneKind::MagicWords
    }

    fn update(&mut self, delta: f64) {
        self.poll_document();
        let until = self.timeline.now() + delta;
        while let Some(event) = self.timeline.next_event(until, &mut self.stage) {
            self.on_event(event);
        }
    }

    fn draw(&self, renderer: &Renderer) {
        self.stage.draw(renderer);
    }

    fn dispose(&mut self) {
        self.pending = None;
        self.typing_timer = None;
        self.timeline.clear();
    }
}
