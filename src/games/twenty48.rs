use crate::engine::input::KeyState;
use crate::engine::{Game, GameStatus, Point, Rect, Renderer, Size, TextAlign};
use crate::games::{draw_backdrop, draw_score, keys, palette, rng};
use rand::rngs::SmallRng;
use rand::Rng;

pub const NAME: &str = "2048";

const SIDE: usize = 4;
const TILE: f32 = 90.0;
const GAP: f32 = 10.0;
const HEADER: f32 = 60.0;
const BOARD: f32 = SIDE as f32 * TILE + (SIDE + 1) as f32 * GAP;
const GOAL: u32 = 2048;
/// One new tile in ten is a 4
const FOUR_CHANCE: f64 = 0.1;

type Board = [[u32; SIDE]; SIDE];

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Move {
    Left,
    Right,
    Up,
    Down,
}

impl Move {
    fn from_keys(keystate: &KeyState) -> Option<Move> {
        if keystate.any_pressed(&keys::LEFT) {
            Some(Move::Left)
        } else if keystate.any_pressed(&keys::RIGHT) {
            Some(Move::Right)
        } else if keystate.any_pressed(&keys::UP) {
            Some(Move::Up)
        } else if keystate.any_pressed(&keys::DOWN) {
            Some(Move::Down)
        } else {
            None
        }
    }

    /// Board coordinates of line `i`, ordered in the direction tiles slide
    fn line(self, i: usize) -> [(usize, usize); SIDE] {
        let mut cells = [(0, 0); SIDE];
        for (k, cell) in cells.iter_mut().enumerate() {
            *cell = match self {
                Move::Left => (i, k),
                Move::Right => (i, SIDE - 1 - k),
                Move::Up => (k, i),
                Move::Down => (SIDE - 1 - k, i),
            };
        }
        cells
    }
}

/// Slides one line towards index 0. Each tile merges at most once per move.
/// Returns the new line and the points gained from merges.
fn slide(line: [u32; SIDE]) -> ([u32; SIDE], u32) {
    let tiles: Vec<u32> = line.iter().copied().filter(|v| *v != 0).collect();
    let mut out = [0; SIDE];
    let mut gained = 0;
    let mut write = 0;
    let mut i = 0;
    while i < tiles.len() {
        if i + 1 < tiles.len() && tiles[i] == tiles[i + 1] {
            let merged = tiles[i] * 2;
            out[write] = merged;
            gained += merged;
            i += 2;
        } else {
            out[write] = tiles[i];
            i += 1;
        }
        write += 1;
    }
    (out, gained)
}

fn can_move(board: &Board) -> bool {
    (0..SIDE).any(|r| {
        (0..SIDE).any(|c| {
            let v = board[r][c];
            v == 0
                || (c + 1 < SIDE && board[r][c + 1] == v)
                || (r + 1 < SIDE && board[r + 1][c] == v)
        })
    })
}

fn tile_color(value: u32) -> &'static str {
    match value {
        0 => "#2a2a4a",
        2 => "#eee4da",
        4 => "#ede0c8",
        8 => "#f2b179",
        16 => "#f59563",
        32 => "#f67c5f",
        64 => "#f65e3b",
        128 => "#edcf72",
        256 => "#edcc61",
        512 => "#edc850",
        1024 => "#edc53f",
        _ => "#edc22e",
    }
}

/// Score is the sum of every merge.
pub struct Twenty48 {
    rng: SmallRng,
    board: Board,
    score: u32,
    status: GameStatus,
}

impl Twenty48 {
    pub fn new(seed: u64) -> Self {
        let mut game = Twenty48 {
            rng: rng(seed),
            board: [[0; SIDE]; SIDE],
            score: 0,
            status: GameStatus::Playing,
        };
        game.restart();
        game
    }

    fn spawn(&mut self) {
        let empty: Vec<(usize, usize)> = (0..SIDE)
            .flat_map(|r| (0..SIDE).map(move |c| (r, c)))
            .filter(|&(r, c)| self.board[r][c] == 0)
            .collect();
        if empty.is_empty() {
            return;
        }
        let (r, c) = empty[self.rng.gen_range(0..empty.len())];
        self.board[r][c] = if self.rng.gen_bool(FOUR_CHANCE) { 4 } else { 2 };
    }

    /// Returns true if any tile moved
    fn shift(&mut self, direction: Move) -> bool {
        let mut moved = false;
        for i in 0..SIDE {
            let cells = direction.line(i);
            let mut line = [0; SIDE];
            for (k, &(r, c)) in cells.iter().enumerate() {
                line[k] = self.board[r][c];
            }
            let (slid, gained) = slide(line);
            if slid != line {
                moved = true;
            }
            self.score += gained;
            for (k, &(r, c)) in cells.iter().enumerate() {
                self.board[r][c] = slid[k];
            }
        }
        moved
    }

    fn tile_rect(r: usize, c: usize) -> Rect {
        Rect::from_xywh(
            GAP + c as f32 * (TILE + GAP),
            HEADER + GAP + r as f32 * (TILE + GAP),
            TILE,
            TILE,
        )
    }
}

impl Game for Twenty48 {
    fn name(&self) -> &'static str {
        NAME
    }

    fn logical_size(&self) -> Size {
        Size::new(BOARD, BOARD + HEADER)
    }

    fn update(&mut self, keystate: &KeyState) {
        if self.status != GameStatus::Playing {
            return;
        }
        let Some(direction) = Move::from_keys(keystate) else {
            return;
        };
        if !self.shift(direction) {
            return;
        }
        self.spawn();
        if self.board.iter().flatten().any(|v| *v >= GOAL) {
            self.status = GameStatus::Won;
        } else if !can_move(&self.board) {
            self.status = GameStatus::Lost;
        }
    }

    fn draw(&self, renderer: &Renderer) {
        let size = self.logical_size();
        draw_backdrop(renderer, size);
        draw_score(renderer, &format!("Score: {}", self.score));
        for (r, row) in self.board.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                let rect = Twenty48::tile_rect(r, c);
                renderer.fill_rect(&rect, tile_color(*value));
                if *value > 0 {
                    let color = if *value <= 4 { "#776e65" } else { palette::TEXT };
                    let font = if *value >= 1024 { 28.0 } else { 36.0 };
                    renderer.text(&value.to_string(), rect.center(), font, color, TextAlign::Center);
                }
            }
        }
        renderer.text(
            "Join the tiles, get to 2048!",
            Point::new(BOARD - 12.0, 18.0),
            14.0,
            palette::MUTED,
            TextAlign::Right,
        );
    }

    fn status(&self) -> GameStatus {
        self.status
    }

    fn score(&self) -> u32 {
        self.score
    }

    fn restart(&mut self) {
        self.board = [[0; SIDE]; SIDE];
        self.score = 0;
        self.status = GameStatus::Playing;
        self.spawn();
        self.spawn();
    }
}
