use crate::engine::input::{KeyState, PointerButton};
use crate::engine::{Game, GameStatus, Point, Rect, Renderer, Size, TextAlign};
use crate::games::{draw_backdrop, palette, rng};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use std::collections::VecDeque;

pub const NAME: &str = "minesweeper";

const COLUMNS: usize = 9;
const ROWS: usize = 9;
const MINES: usize = 10;
const CELL: f32 = 32.0;
const HEADER: f32 = 40.0;
/// Held while clicking to flag instead of reveal
const FLAG_KEY: &str = "KeyF";

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
struct Cell {
    mine: bool,
    revealed: bool,
    flagged: bool,
    adjacent: u8,
}

fn neighbours(index: usize) -> impl Iterator<Item = usize> {
    let (row, column) = ((index / COLUMNS) as i32, (index % COLUMNS) as i32);
    (-1..=1)
        .flat_map(move |dr| (-1..=1).map(move |dc| (row + dr, column + dc)))
        .filter(move |&(r, c)| {
            (r, c) != (row, column)
                && (0..ROWS as i32).contains(&r)
                && (0..COLUMNS as i32).contains(&c)
        })
        .map(|(r, c)| r as usize * COLUMNS + c as usize)
}

/// Mines are laid on the first reveal, away from the clicked cell and its
/// neighbours, so the opening click always opens some ground.
/// Score is the number of safe cells revealed.
pub struct Minesweeper {
    rng: SmallRng,
    cells: Vec<Cell>,
    mines_laid: bool,
    revealed: usize,
    status: GameStatus,
}

impl Minesweeper {
    pub fn new(seed: u64) -> Self {
        let mut game = Minesweeper {
            rng: rng(seed),
            cells: Vec::new(),
            mines_laid: false,
            revealed: 0,
            status: GameStatus::Ready,
        };
        game.restart();
        game
    }

    fn lay_mines(&mut self, safe: usize) {
        let keep_clear: Vec<usize> = neighbours(safe).chain(std::iter::once(safe)).collect();
        let mut candidates: Vec<usize> = (0..self.cells.len())
            .filter(|i| !keep_clear.contains(i))
            .collect();
        candidates.shuffle(&mut self.rng);
        for &i in candidates.iter().take(MINES) {
            self.cells[i].mine = true;
        }
        self.count_adjacent();
        self.mines_laid = true;
    }

    fn count_adjacent(&mut self) {
        for i in 0..self.cells.len() {
            let count = neighbours(i).filter(|&n| self.cells[n].mine).count();
            self.cells[i].adjacent = count as u8;
        }
    }

    fn cell_at(position: Point) -> Option<usize> {
        if position.x < 0.0 || position.y < HEADER {
            return None;
        }
        let column = (position.x / CELL) as usize;
        let row = ((position.y - HEADER) / CELL) as usize;
        (column < COLUMNS && row < ROWS).then_some(row * COLUMNS + column)
    }

    fn toggle_flag(&mut self, index: usize) {
        let cell = &mut self.cells[index];
        if !cell.revealed {
            cell.flagged = !cell.flagged;
        }
    }

    fn reveal(&mut self, index: usize) {
        if self.cells[index].flagged || self.cells[index].revealed {
            return;
        }
        if !self.mines_laid {
            self.lay_mines(index);
            self.status = GameStatus::Playing;
        }
        if self.cells[index].mine {
            for cell in self.cells.iter_mut().filter(|cell| cell.mine) {
                cell.revealed = true;
            }
            self.status = GameStatus::Lost;
            return;
        }

        let mut queue = VecDeque::from([index]);
        while let Some(i) = queue.pop_front() {
            let cell = &mut self.cells[i];
            if cell.revealed || cell.flagged || cell.mine {
                continue;
            }
            cell.revealed = true;
            self.revealed += 1;
            if cell.adjacent == 0 {
                queue.extend(neighbours(i));
            }
        }

        if self.revealed == COLUMNS * ROWS - MINES {
            for cell in self.cells.iter_mut().filter(|cell| cell.mine) {
                cell.flagged = true;
            }
            self.status = GameStatus::Won;
        }
    }

    fn flags(&self) -> usize {
        self.cells.iter().filter(|cell| cell.flagged).count()
    }

    fn cell_rect(index: usize) -> Rect {
        let (row, column) = (index / COLUMNS, index % COLUMNS);
        Rect::from_xywh(
            column as f32 * CELL + 1.0,
            HEADER + row as f32 * CELL + 1.0,
            CELL - 2.0,
            CELL - 2.0,
        )
    }
}

impl Game for Minesweeper {
    fn name(&self) -> &'static str {
        NAME
    }

    fn logical_size(&self) -> Size {
        Size::new(COLUMNS as f32 * CELL, ROWS as f32 * CELL + HEADER)
    }

    fn update(&mut self, keystate: &KeyState) {
        if self.status.is_terminal() {
            return;
        }
        let flagging = keystate.is_pressed(FLAG_KEY);
        for click in keystate.clicks() {
            let Some(index) = Minesweeper::cell_at(click.position) else {
                continue;
            };
            if click.button == PointerButton::Secondary || flagging {
                self.toggle_flag(index);
            } else {
                self.reveal(index);
            }
            if self.status.is_terminal() {
                break;
            }
        }
    }

    fn draw(&self, renderer: &Renderer) {
        let size = self.logical_size();
        draw_backdrop(renderer, size);
        renderer.text(
            &format!("Mines: {}", MINES.saturating_sub(self.flags())),
            Point::new(12.0, 22.0),
            16.0,
            palette::TEXT,
            TextAlign::Left,
        );
        renderer.text(
            &format!("Cleared: {}", self.revealed),
            Point::new(size.width - 12.0, 22.0),
            16.0,
            palette::TEXT,
            TextAlign::Right,
        );

        for (i, cell) in self.cells.iter().enumerate() {
            let rect = Minesweeper::cell_rect(i);
            if !cell.revealed {
                renderer.fill_rect(&rect, "#3a3a6a");
                if cell.flagged {
                    renderer.text("F", rect.center(), 18.0, palette::DANGER, TextAlign::Center);
                }
                continue;
            }
            if cell.mine {
                renderer.fill_rect(&rect, palette::DANGER);
                renderer.draw_logo(&rect);
            } else {
                renderer.fill_rect(&rect, "#20203a");
                if cell.adjacent > 0 {
                    renderer.text(
                        &cell.adjacent.to_string(),
                        rect.center(),
                        18.0,
                        palette::ACCENT,
                        TextAlign::Center,
                    );
                }
            }
        }
    }

    fn status(&self) -> GameStatus {
        self.status
    }

    fn score(&self) -> u32 {
        self.revealed as u32
    }

    fn restart(&mut self) {
        self.cells = vec![Cell::default(); COLUMNS * ROWS];
        self.mines_laid = false;
        self.revealed = 0;
        self.status = GameStatus::Ready;
    }
}
