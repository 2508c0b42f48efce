use crate::browser;
use crate::engine::input::KeyState;
use crate::engine::{FrameRunner, Game, Point, Rect, Renderer, Size, TextAlign};
use crate::panel::{GameOverPanel, PanelAction};
use crate::scores::{ScoreEntry, ScoreError, ScoreSink};
use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub const PAUSE_KEY: &str = "KeyP";
/// pause for games that read letters
pub const TEXT_PAUSE_KEY: &str = "Escape";

/// A score on its way to the sink. Holds the panel weakly: if the player
/// restarted or the game was unmounted meanwhile, the result is dropped.
pub struct Submission {
    pub game: &'static str,
    pub entry: ScoreEntry,
    panel: Weak<RefCell<GameOverPanel>>,
}

impl Submission {
    pub fn resolve(&self, result: Result<(), ScoreError>) {
        match self.panel.upgrade() {
            Some(panel) => panel.borrow_mut().resolve(result),
            None => log::info!("Dropping submission result for closed {} panel", self.game),
        }
    }
}

/// One mounted game plus everything around it: pause, game-over panel and
/// the score sink.
///
/// ┌──────────────── Session::advance ───────────────────┐
/// │ panel open?  -> panel input -> Submit / Restart     │
/// │ KeyP         -> toggle pause                        │
/// │ running      -> game.update() x steps               │
/// │ terminal now -> open panel with the final score     │
/// └─────────────────────────────────────────────────────┘
pub struct Session {
    game: Box<dyn Game>,
    paused: bool,
    panel: Option<Rc<RefCell<GameOverPanel>>>,
    sink: Rc<dyn ScoreSink>,
}

impl Session {
    pub fn new(game: Box<dyn Game>, sink: Rc<dyn ScoreSink>) -> Self {
        Session {
            game,
            paused: false,
            panel: None,
            sink,
        }
    }

    pub fn game(&self) -> &dyn Game {
        self.game.as_ref()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn panel(&self) -> Option<Rc<RefCell<GameOverPanel>>> {
        self.panel.clone()
    }

    pub fn pause_key(&self) -> &'static str {
        if self.game.captures_text() {
            TEXT_PAUSE_KEY
        } else {
            PAUSE_KEY
        }
    }

    pub fn restart(&mut self) {
        log::info!("Restarting {}", self.game.name());
        self.game.restart();
        self.panel = None;
        self.paused = false;
    }

    /// Runs one animation frame worth of logic with `steps` fixed updates.
    /// Edge-triggered input is consumed by the first step that sees it, or
    /// kept for the next frame when no step ran.
    pub fn advance(
        &mut self,
        steps: u32,
        keystate: &mut KeyState,
        now: DateTime<Utc>,
    ) -> Option<Submission> {
        if let Some(panel) = self.panel.clone() {
            let action = panel.borrow_mut().handle_input(keystate, now);
            keystate.clear_edges();
            return match action {
                Some(PanelAction::Submit(entry)) => Some(Submission {
                    game: self.game.name(),
                    entry,
                    panel: Rc::downgrade(&panel),
                }),
                Some(PanelAction::Restart) => {
                    self.restart();
                    None
                }
                None => None,
            };
        }

        if keystate.was_pressed(self.pause_key()) {
            self.paused = !self.paused;
            keystate.clear_edges();
            return None;
        }
        if self.paused {
            keystate.clear_edges();
            return None;
        }

        for _ in 0..steps {
            self.game.update(keystate);
            keystate.clear_edges();
            if self.game.status().is_terminal() {
                break;
            }
        }

        let status = self.game.status();
        if status.is_terminal() {
            log::info!("{} finished with {}", self.game.name(), self.game.score());
            self.panel = Some(Rc::new(RefCell::new(GameOverPanel::new(
                self.game.name(),
                self.game.score(),
                status,
            ))));
            keystate.clear_edges();
        }
        None
    }

    fn dispatch(&self, submission: Submission) {
        let sink = self.sink.clone();
        browser::spawn_local(async move {
            let result = sink
                .submit(submission.game, submission.entry.clone())
                .await;
            submission.resolve(result);
        });
    }
}

impl FrameRunner for Session {
    fn logical_size(&self) -> Size {
        self.game.logical_size()
    }

    fn is_suspended(&self) -> bool {
        self.paused || self.panel.is_some()
    }

    fn frame(&mut self, steps: u32, keystate: &mut KeyState) {
        if let Some(submission) = self.advance(steps, keystate, Utc::now()) {
            self.dispatch(submission);
        }
    }

    fn draw(&self, renderer: &Renderer) {
        let scene = self.game.logical_size();
        self.game.draw(renderer);
        if let Some(panel) = &self.panel {
            panel.borrow().draw(renderer, scene);
        } else if self.paused {
            renderer.fill_rect(&Rect::new(Point::default(), scene), "rgba(0, 0, 0, 0.5)");
            let hint = if self.game.captures_text() { "Esc" } else { "P" };
            renderer.text(
                &format!("Paused - {} to resume", hint),
                Point::new(scene.width * 0.5, scene.height * 0.5),
                22.0,
                "#ffffff",
                TextAlign::Center,
            );
        }
    }
}
