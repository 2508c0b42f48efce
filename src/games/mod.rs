//! The minigames. Each one owns its state, runs one fixed step per
//! `update` and knows how to put itself back to its starting layout.
//!
//! TABLE
//! ┌───────────────┬────────────────┬───────────┬──────────────────────────┐
//! │ GameKind      │ name key       │ logical   │ input                    │
//! ├───────────────┼────────────────┼───────────┼──────────────────────────┤
//! │ Snake         │ snake          │ 400 x 400 │ arrows / WASD            │
//! │ Flappy        │ flappy         │ 400 x 600 │ space / click            │
//! │ Breakout      │ brickBreaker   │ 480 x 320 │ arrows / pointer         │
//! │ Pong          │ pong           │ 600 x 400 │ up-down / pointer        │
//! │ Twenty48      │ 2048           │ 410 x 470 │ arrows / WASD            │
//! │ Minesweeper   │ minesweeper    │ 288 x 328 │ click, right click / F   │
//! │ Pinball       │ pinball        │ 400 x 600 │ left / right flippers    │
//! │ SpaceShooter  │ spaceShooter   │ 480 x 640 │ arrows + space / pointer │
//! │ TowerBuilder  │ towerBuilder   │ 400 x 600 │ space / click            │
//! │ LogoDodge     │ logoDodge      │ 400 x 600 │ arrows / pointer         │
//! │ LogoRacer     │ logoRacer      │ 300 x 500 │ left / right / click     │
//! │ IdeaDash      │ ideaDash       │ 600 x 250 │ space / click            │
//! │ Bouncer       │ bouncer        │ 400 x 600 │ arrows / pointer         │
//! │ LogoCatch     │ logoCatch      │ 400 x 600 │ arrows / pointer         │
//! │ Wordle        │ wordle         │ 350 x 480 │ typing                   │
//! └───────────────┴────────────────┴───────────┴──────────────────────────┘

use crate::engine::{Game, Point, Rect, Renderer, Size, TextAlign};
use crate::scores::store::KeyValueStore;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::rc::Rc;
use std::str::FromStr;
use thiserror::Error;

pub mod bouncer;
pub mod breakout;
pub mod flappy;
pub mod idea_dash;
pub mod logo_catch;
pub mod logo_dodge;
pub mod logo_racer;
pub mod minesweeper;
pub mod pinball;
pub mod pong;
pub mod snake;
pub mod space_shooter;
pub mod tower_builder;
pub mod twenty48;
pub mod wordle;

/// Key codes shared by most games
pub mod keys {
    pub const LEFT: [&str; 2] = ["ArrowLeft", "KeyA"];
    pub const RIGHT: [&str; 2] = ["ArrowRight", "KeyD"];
    pub const UP: [&str; 2] = ["ArrowUp", "KeyW"];
    pub const DOWN: [&str; 2] = ["ArrowDown", "KeyS"];
    pub const ACTION: [&str; 2] = ["Space", "ArrowUp"];
}

pub mod palette {
    pub const BACKGROUND: &str = "#10102a";
    pub const ACCENT: &str = "#f5a623";
    pub const TEXT: &str = "#ffffff";
    pub const MUTED: &str = "#8888aa";
    pub const DANGER: &str = "#ff6b6b";
    pub const GOOD: &str = "#7ed957";
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameKind {
    Snake,
    Flappy,
    Breakout,
    Pong,
    Twenty48,
    Minesweeper,
    Pinball,
    SpaceShooter,
    TowerBuilder,
    LogoDodge,
    LogoRacer,
    IdeaDash,
    Bouncer,
    LogoCatch,
    Wordle,
}

impl GameKind {
    pub const ALL: [GameKind; 15] = [
        GameKind::Snake,
        GameKind::Flappy,
        GameKind::Breakout,
        GameKind::Pong,
        GameKind::Twenty48,
        GameKind::Minesweeper,
        GameKind::Pinball,
        GameKind::SpaceShooter,
        GameKind::TowerBuilder,
        GameKind::LogoDodge,
        GameKind::LogoRacer,
        GameKind::IdeaDash,
        GameKind::Bouncer,
        GameKind::LogoCatch,
        GameKind::Wordle,
    ];

    /// Name used as the score key, locally and on the spreadsheet
    pub fn key(&self) -> &'static str {
        match self {
            GameKind::Snake => snake::NAME,
            GameKind::Flappy => flappy::NAME,
            GameKind::Breakout => breakout::NAME,
            GameKind::Pong => pong::NAME,
            GameKind::Twenty48 => twenty48::NAME,
            GameKind::Minesweeper => minesweeper::NAME,
            GameKind::Pinball => pinball::NAME,
            GameKind::SpaceShooter => space_shooter::NAME,
            GameKind::TowerBuilder => tower_builder::NAME,
            GameKind::LogoDodge => logo_dodge::NAME,
            GameKind::LogoRacer => logo_racer::NAME,
            GameKind::IdeaDash => idea_dash::NAME,
            GameKind::Bouncer => bouncer::NAME,
            GameKind::LogoCatch => logo_catch::NAME,
            GameKind::Wordle => wordle::NAME,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown game '{0}'")]
pub struct UnknownGame(pub String);

impl FromStr for GameKind {
    type Err = UnknownGame;

    /// Accepts the score key in any letter case
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let wanted = name.trim();
        GameKind::ALL
            .iter()
            .find(|kind| kind.key().eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| UnknownGame(name.to_string()))
    }
}

/// What a game may need from outside when it is built
pub struct GameContext {
    pub seed: u64,
    pub store: Rc<dyn KeyValueStore>,
}

pub fn create(kind: GameKind, context: &GameContext) -> Box<dyn Game> {
    let seed = context.seed;
    match kind {
        GameKind::Snake => Box::new(snake::Snake::new(seed)),
        GameKind::Flappy => Box::new(flappy::Flappy::new(seed)),
        GameKind::Breakout => Box::new(breakout::Breakout::new()),
        GameKind::Pong => Box::new(pong::Pong::new(seed)),
        GameKind::Twenty48 => Box::new(twenty48::Twenty48::new(seed)),
        GameKind::Minesweeper => Box::new(minesweeper::Minesweeper::new(seed)),
        GameKind::Pinball => Box::new(pinball::Pinball::new(seed)),
        GameKind::SpaceShooter => Box::new(space_shooter::SpaceShooter::new(seed)),
        GameKind::TowerBuilder => Box::new(tower_builder::TowerBuilder::new()),
        GameKind::LogoDodge => Box::new(logo_dodge::LogoDodge::new(seed)),
        GameKind::LogoRacer => Box::new(logo_racer::LogoRacer::new(seed)),
        GameKind::IdeaDash => Box::new(idea_dash::IdeaDash::new(seed, context.store.clone())),
        GameKind::Bouncer => Box::new(bouncer::Bouncer::new()),
        GameKind::LogoCatch => Box::new(logo_catch::LogoCatch::new(seed)),
        GameKind::Wordle => Box::new(wordle::Wordle::new(seed)),
    }
}

pub(crate) fn rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

pub(crate) fn draw_backdrop(renderer: &Renderer, size: Size) {
    renderer.fill_rect(&Rect::new(Point::default(), size), palette::BACKGROUND);
}

/// Score line in the top left corner
pub(crate) fn draw_score(renderer: &Renderer, label: &str) {
    renderer.text(label, Point::new(12.0, 18.0), 16.0, palette::TEXT, TextAlign::Left);
}

/// Centered prompt shown while a game waits for its first input
pub(crate) fn draw_prompt(renderer: &Renderer, size: Size, prompt: &str) {
    renderer.text(
        prompt,
        Point::new(size.width * 0.5, size.height * 0.5),
        18.0,
        palette::ACCENT,
        TextAlign::Center,
    );
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::GameStatus;
    use crate::scores::store::MemoryStore;

    fn context() -> GameContext {
        GameContext {
            seed: 7,
            store: Rc::new(MemoryStore::default()),
        }
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for kind in GameKind::ALL {
            assert_eq!(kind.key().parse::<GameKind>(), Ok(kind));
        }
        assert_eq!("BrickBreaker".parse::<GameKind>(), Ok(GameKind::Breakout));
        assert!("tetris".parse::<GameKind>().is_err());
    }

    #[test]
    fn every_game_restarts_to_score_zero() {
        let context = context();
        for kind in GameKind::ALL {
            let mut game = create(kind, &context);
            assert_eq!(game.name(), kind.key());
            testing::idle(game.as_mut(), 120);
            game.restart();
            assert_eq!(game.score(), 0, "{} kept its score", kind.key());
            assert!(
                !game.status().is_terminal(),
                "{} restarted into a terminal state",
                kind.key()
            );
            assert_ne!(game.status(), GameStatus::Won);
        }
    }
}
