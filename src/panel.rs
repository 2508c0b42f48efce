use crate::engine::input::KeyState;
use crate::engine::{GameStatus, Point, Rect, Renderer, Size, TextAlign};
use crate::scores::{ScoreEntry, ScoreError};
use chrono::{DateTime, Utc};

pub const MAX_USERNAME_LEN: usize = 16;

/// ELI5:
/// ┌──────────────── Game Over Panel ───────────────────────────┐
/// │  Editing    ── Enter (name ok) ──►  Submitting             │
/// │  Editing    ── Enter (blank)   ──►  Editing + notice       │
/// │  Submitting ── resolve(Ok)     ──►  Submitted              │
/// │  Submitting ── resolve(Err)    ──►  Failed(message)        │
/// │  Failed     ── Enter           ──►  Submitting (manual)    │
/// │  any but Submitting ── Escape  ──►  Restart                │
/// │  Submitted  ── Enter / click   ──►  Restart                │
/// └────────────────────────────────────────────────────────────┘
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelPhase {
    Editing,
    Submitting,
    Submitted,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelAction {
    Submit(ScoreEntry),
    Restart,
}

#[derive(Debug)]
pub struct GameOverPanel {
    game: &'static str,
    score: u32,
    outcome: GameStatus,
    username: String,
    phase: PanelPhase,
    notice: Option<String>,
}

impl GameOverPanel {
    pub fn new(game: &'static str, score: u32, outcome: GameStatus) -> Self {
        GameOverPanel {
            game,
            score,
            outcome,
            username: String::new(),
            phase: PanelPhase::Editing,
            notice: None,
        }
    }

    pub fn game(&self) -> &'static str {
        self.game
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn phase(&self) -> &PanelPhase {
        &self.phase
    }

    /// Inline validation message, if any
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn handle_input(&mut self, keystate: &KeyState, now: DateTime<Utc>) -> Option<PanelAction> {
        match self.phase {
            PanelPhase::Submitting => None,
            PanelPhase::Submitted => {
                if keystate.any_pressed(&["Enter", "Escape"]) || keystate.clicked() {
                    Some(PanelAction::Restart)
                } else {
                    None
                }
            }
            PanelPhase::Editing | PanelPhase::Failed(_) => {
                if keystate.was_pressed("Escape") {
                    return Some(PanelAction::Restart);
                }
                self.edit(keystate);
                if keystate.was_pressed("Enter") {
                    self.submit(now)
                } else {
                    None
                }
            }
        }
    }

    fn edit(&mut self, keystate: &KeyState) {
        for c in keystate.typed() {
            if !c.is_control() && self.username.chars().count() < MAX_USERNAME_LEN {
                self.username.push(*c);
            }
        }
        if keystate.was_pressed("Backspace") {
            self.username.pop();
        }
    }

    fn submit(&mut self, now: DateTime<Utc>) -> Option<PanelAction> {
        match ScoreEntry::new(&self.username, self.score, now) {
            Ok(entry) => {
                self.notice = None;
                self.phase = PanelPhase::Submitting;
                Some(PanelAction::Submit(entry))
            }
            Err(err) => {
                self.notice = Some(err.to_string());
                None
            }
        }
    }

    /// Outcome of the submission started by the last `Submit`
    pub fn resolve(&mut self, result: Result<(), ScoreError>) {
        if self.phase != PanelPhase::Submitting {
            return;
        }
        self.phase = match result {
            Ok(()) => PanelPhase::Submitted,
            Err(err) => {
                log::warn!("Score submission for {} failed: {}", self.game, err);
                PanelPhase::Failed(err.to_string())
            }
        };
    }

    pub fn draw(&self, renderer: &Renderer, scene: Size) {
        let cx = scene.width * 0.5;
        let cy = scene.height * 0.5;
        renderer.fill_rect(&Rect::new(Point::default(), scene), "rgba(0, 0, 0, 0.6)");
        let card = Rect::from_xywh(cx - 150.0, cy - 110.0, 300.0, 220.0);
        renderer.fill_rect(&card, "#1d1d3b");
        renderer.stroke_rect(&card, "#f5a623", 2.0);

        let title = match self.outcome {
            GameStatus::Won => "You Win!",
            _ => "Game Over",
        };
        renderer.text(title, Point::new(cx, cy - 80.0), 26.0, "#ffffff", TextAlign::Center);
        renderer.text(
            &format!("Score: {}", self.score),
            Point::new(cx, cy - 45.0),
            18.0,
            "#f5a623",
            TextAlign::Center,
        );

        let field = Rect::from_xywh(cx - 110.0, cy - 20.0, 220.0, 32.0);
        renderer.fill_rect(&field, "#ffffff");
        let shown = if self.username.is_empty() && self.phase == PanelPhase::Editing {
            "type your name"
        } else {
            self.username.as_str()
        };
        renderer.text(shown, field.center(), 16.0, "#1d1d3b", TextAlign::Center);

        let (status, color) = match (&self.phase, &self.notice) {
            (PanelPhase::Editing, Some(notice)) => (notice.as_str(), "#ff6b6b"),
            (PanelPhase::Editing, None) => ("Enter: save   Esc: skip", "#cccccc"),
            (PanelPhase::Submitting, _) => ("Saving...", "#cccccc"),
            (PanelPhase::Submitted, _) => ("Saved! Enter to play again", "#7ed957"),
            (PanelPhase::Failed(message), _) => (message.as_str(), "#ff6b6b"),
        };
        renderer.text(status, Point::new(cx, cy + 40.0), 14.0, color, TextAlign::Center);
        if let PanelPhase::Failed(_) = self.phase {
            renderer.text(
                "Enter: try again   Esc: skip",
                Point::new(cx, cy + 70.0),
                13.0,
                "#cccccc",
                TextAlign::Center,
            );
        }
    }
}
