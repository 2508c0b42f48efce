use crate::engine::input::KeyState;
use crate::engine::{Game, GameStatus, Point, Rect, Renderer, Size, TextAlign};
use crate::games::{draw_backdrop, palette, rng};
use once_cell::sync::Lazy;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use std::collections::{HashMap, HashSet};

pub const NAME: &str = "wordle";

const WORD_LENGTH: usize = 5;
const MAX_ATTEMPTS: usize = 6;
const POINTS_PER_ATTEMPT_LEFT: u32 = 100;
const STEPS_PER_SECOND: u32 = 60;

const TILE: f32 = 56.0;
const GAP: f32 = 6.0;
const TOP: f32 = 60.0;
const WIDTH: f32 = 350.0;
const HEIGHT: f32 = 480.0;
const LEFT: f32 = (WIDTH - (WORD_LENGTH as f32 * TILE + (WORD_LENGTH - 1) as f32 * GAP)) / 2.0;

const WORDS: &[&str] = &[
    "ABOUT", "ACTOR", "ADOPT", "AGILE", "ALERT", "APPLE", "ARRAY", "ASSET", "AUDIT", "BADGE",
    "BASIC", "BENCH", "BLEND", "BOARD", "BRAIN", "BRAVE", "BUILD", "CACHE", "CHAIR", "CHART",
    "CHESS", "CLASS", "CLOUD", "CODER", "CRAFT", "CRANE", "CROWD", "DEBUG", "DELTA", "DRAFT",
    "EARLY", "EERIE", "EVENT", "FAITH", "FIELD", "FLAME", "FOCUS", "FORGE", "FRAME", "GAMER",
    "GIANT", "GRAPH", "GUEST", "GUIDE", "HEART", "HOTEL", "IDEAS", "INDEX", "INPUT", "LASER",
    "LEARN", "LEVEL", "LIGHT", "LOGIC", "MATCH", "MEDIA", "MERGE", "MODEL", "MOUSE", "NERDS",
    "NOVEL", "OCEAN", "PAPER", "PARTY", "PITCH", "PIXEL", "PLANT", "POINT", "PRIZE", "PROXY",
    "QUEST", "QUEUE", "RADIO", "RAPID", "REACT", "ROBOT", "ROUTE", "SCALE", "SCORE", "SHARE",
    "SHIFT", "SMART", "SOLAR", "SPACE", "SPEED", "STACK", "STAGE", "TABLE", "TEAMS", "THEME",
    "TOKEN", "TOWER", "TRACK", "TRAIN", "TRUST", "UNITY", "VALUE", "VIDEO", "VOICE", "WORLD",
];

static DICTIONARY: Lazy<HashSet<&'static str>> = Lazy::new(|| WORDS.iter().copied().collect());

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum LetterState {
    Correct,
    Present,
    Absent,
}

impl LetterState {
    fn color(self) -> &'static str {
        match self {
            LetterState::Correct => "#6aaa64",
            LetterState::Present => "#c9b458",
            LetterState::Absent => "#3a3a4c",
        }
    }
}

#[derive(Debug, Clone)]
struct Attempt {
    guess: String,
    states: Vec<LetterState>,
}

/// Exact matches first, then misplaced letters from what the exact matches
/// left over, so a doubled letter is only marked as often as it occurs.
fn evaluate_guess(secret: &str, guess: &str) -> Vec<LetterState> {
    let secret: Vec<char> = secret.chars().collect();
    let guess: Vec<char> = guess.chars().collect();
    let mut states = vec![LetterState::Absent; guess.len()];
    let mut remaining: HashMap<char, usize> = HashMap::new();

    for (i, &letter) in secret.iter().enumerate() {
        if guess.get(i) == Some(&letter) {
            states[i] = LetterState::Correct;
        } else {
            *remaining.entry(letter).or_insert(0) += 1;
        }
    }
    for (i, letter) in guess.iter().enumerate() {
        if states[i] == LetterState::Correct {
            continue;
        }
        if let Some(count) = remaining.get_mut(letter) {
            if *count > 0 {
                *count -= 1;
                states[i] = LetterState::Present;
            }
        }
    }
    states
}

/// ┌─────────────── Wordle ─────────────────────────┐
/// │ letters     ── up to five in the current row   │
/// │ Backspace   ── drop the last letter            │
/// │ Enter       ── check against the word list     │
/// │ all correct ── Won, 100 per attempt left + 100 │
/// │ sixth miss  ── Lost, the word is shown         │
/// └────────────────────────────────────────────────┘
pub struct Wordle {
    rng: SmallRng,
    secret: String,
    attempts: Vec<Attempt>,
    current: String,
    message: Option<String>,
    elapsed: u32,
    status: GameStatus,
}

impl Wordle {
    pub fn new(seed: u64) -> Self {
        let mut game = Wordle {
            rng: rng(seed),
            secret: String::new(),
            attempts: Vec::new(),
            current: String::new(),
            message: None,
            elapsed: 0,
            status: GameStatus::Playing,
        };
        game.restart();
        game
    }

    #[cfg(test)]
    pub(crate) fn with_secret(seed: u64, secret: &str) -> Self {
        let mut game = Wordle::new(seed);
        game.secret = secret.to_string();
        game
    }

    fn type_letters(&mut self, keystate: &KeyState) {
        for letter in keystate.typed() {
            if letter.is_ascii_alphabetic() && self.current.len() < WORD_LENGTH {
                self.current.push(letter.to_ascii_uppercase());
                self.message = None;
            }
        }
        if keystate.was_pressed("Backspace") {
            self.current.pop();
            self.message = None;
        }
    }

    fn submit(&mut self) {
        if self.current.len() < WORD_LENGTH {
            self.message = Some("Not enough letters".to_string());
            return;
        }
        if !DICTIONARY.contains(self.current.as_str()) {
            self.message = Some("Not in word list".to_string());
            return;
        }
        let guess = std::mem::take(&mut self.current);
        let states = evaluate_guess(&self.secret, &guess);
        let solved = states.iter().all(|state| *state == LetterState::Correct);
        self.attempts.push(Attempt { guess, states });

        if solved {
            self.status = GameStatus::Won;
            self.message = Some("Nice!".to_string());
        } else if self.attempts.len() >= MAX_ATTEMPTS {
            self.status = GameStatus::Lost;
            self.message = Some(format!("The word was {}", self.secret));
        }
    }

    fn tile(row: usize, column: usize) -> Rect {
        Rect::from_xywh(
            LEFT + column as f32 * (TILE + GAP),
            TOP + row as f32 * (TILE + GAP),
            TILE,
            TILE,
        )
    }
}

impl Game for Wordle {
    fn name(&self) -> &'static str {
        NAME
    }

    fn logical_size(&self) -> Size {
        Size::new(WIDTH, HEIGHT)
    }

    fn update(&mut self, keystate: &KeyState) {
        if self.status != GameStatus::Playing {
            return;
        }
        self.elapsed += 1;
        self.type_letters(keystate);
        if keystate.was_pressed("Enter") {
            self.submit();
        }
    }

    fn draw(&self, renderer: &Renderer) {
        draw_backdrop(renderer, self.logical_size());
        let seconds = self.elapsed / STEPS_PER_SECOND;
        renderer.text(
            &format!("{}:{:02}", seconds / 60, seconds % 60),
            Point::new(WIDTH - 12.0, 24.0),
            16.0,
            palette::MUTED,
            TextAlign::Right,
        );
        renderer.text("WORDLE", Point::new(WIDTH / 2.0, 24.0), 22.0, palette::TEXT, TextAlign::Center);

        for row in 0..MAX_ATTEMPTS {
            for column in 0..WORD_LENGTH {
                let rect = Wordle::tile(row, column);
                let (letter, color) = match self.attempts.get(row) {
                    Some(attempt) => (
                        attempt.guess.chars().nth(column),
                        attempt.states[column].color(),
                    ),
                    None if row == self.attempts.len() => (self.current.chars().nth(column), "#20203a"),
                    None => (None, "#20203a"),
                };
                renderer.fill_rect(&rect, color);
                renderer.stroke_rect(&rect, "#4a4a6a", 2.0);
                if let Some(letter) = letter {
                    renderer.text(&letter.to_string(), rect.center(), 28.0, palette::TEXT, TextAlign::Center);
                }
            }
        }

        if let Some(message) = &self.message {
            renderer.text(
                message,
                Point::new(WIDTH / 2.0, HEIGHT - 24.0),
                16.0,
                palette::ACCENT,
                TextAlign::Center,
            );
        }
    }

    fn status(&self) -> GameStatus {
        self.status
    }

    fn score(&self) -> u32 {
        if self.status != GameStatus::Won {
            return 0;
        }
        (MAX_ATTEMPTS - self.attempts.len() + 1) as u32 * POINTS_PER_ATTEMPT_LEFT
    }

    fn restart(&mut self) {
        self.secret = WORDS.choose(&mut self.rng).copied().unwrap_or("CRANE").to_string();
        self.attempts.clear();
        self.current.clear();
        self.message = None;
        self.elapsed = 0;
        self.status = GameStatus::Playing;
    }

    fn captures_text(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::input::InputEvent;
    use LetterState::*;

    fn typed(word: &str) -> KeyState {
        let mut keys = KeyState::new();
        for letter in word.chars() {
            let code = format!("Key{}", letter.to_ascii_uppercase());
            keys.apply(InputEvent::KeyDown {
                code: code.clone(),
                key: letter.to_string(),
            });
            keys.apply(InputEvent::KeyUp { code });
        }
        keys
    }

    fn guess(game: &mut Wordle, word: &str) {
        let mut keys = typed(word);
        keys.apply(InputEvent::KeyDown {
            code: "Enter".into(),
            key: "Enter".into(),
        });
        game.update(&keys);
    }

    fn with_secret(secret: &str) -> Wordle {
        Wordle::with_secret(1, secret)
    }

    #[test]
    fn duplicate_letters_are_only_counted_once() {
        assert_eq!(
            evaluate_guess("APPLE", "PAPER"),
            vec![Present, Present, Correct, Present, Absent]
        );
        assert_eq!(
            evaluate_guess("CRANE", "EERIE"),
            vec![Absent, Absent, Present, Absent, Correct]
        );
    }

    #[test]
    fn every_word_has_five_letters() {
        assert!(WORDS.iter().all(|word| word.len() == WORD_LENGTH));
        assert_eq!(DICTIONARY.len(), WORDS.len());
    }

    #[test]
    fn short_and_unknown_words_are_refused() {
        let mut game = with_secret("CRANE");
        guess(&mut game, "cran");
        assert_eq!(game.message.as_deref(), Some("Not enough letters"));
        assert!(game.attempts.is_empty());

        let mut game = with_secret("CRANE");
        guess(&mut game, "zzzzz");
        assert_eq!(game.message.as_deref(), Some("Not in word list"));
        assert!(game.attempts.is_empty());
    }

    #[test]
    fn solving_first_try_scores_the_most() {
        let mut game = with_secret("CRANE");
        guess(&mut game, "crane");
        assert_eq!(game.status(), GameStatus::Won);
        assert_eq!(game.score(), 600);
    }

    #[test]
    fn six_misses_lose_with_no_score() {
        let mut game = with_secret("CRANE");
        for word in ["APPLE", "PAPER", "ROBOT", "SPACE", "TOWER", "LIGHT"] {
            guess(&mut game, word);
        }
        assert_eq!(game.status(), GameStatus::Lost);
        assert_eq!(game.score(), 0);
        assert_eq!(game.message.as_deref(), Some("The word was CRANE"));
    }

    #[test]
    fn backspace_edits_the_row() {
        let mut game = with_secret("CRANE");
        game.update(&typed("crx"));
        let mut keys = KeyState::new();
        keys.apply(InputEvent::KeyDown {
            code: "Backspace".into(),
            key: "Backspace".into(),
        });
        game.update(&keys);
        assert_eq!(game.current, "CR");
    }

    #[test]
    fn restart_clears_the_board() {
        let mut game = with_secret("CRANE");
        guess(&mut game, "crane");
        game.restart();
        assert!(game.attempts.is_empty());
        assert!(DICTIONARY.contains(game.secret.as_str()));
        assert_eq!(game.status(), GameStatus::Playing);
        assert_eq!(game.score(), 0);
    }
}
