use crate::engine::input::KeyState;
use crate::engine::{Circle, Game, GameStatus, Point, Rect, Renderer, Size};
use crate::games::{draw_backdrop, draw_prompt, draw_score, keys, palette, rng};
use rand::rngs::SmallRng;
use rand::Rng;
use std::collections::VecDeque;

pub const NAME: &str = "snake";

const GRID: i32 = 20;
const CELL: f32 = 20.0;
/// Fixed steps between two moves
const MOVE_EVERY: u32 = 6;
/// Head first, facing right
const START: [Cell; 3] = [(10, 10), (9, 10), (8, 10)];

type Cell = (i32, i32);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    fn delta(self) -> Cell {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    fn from_keys(keystate: &KeyState) -> Option<Direction> {
        if keystate.any_pressed(&keys::UP) {
            Some(Direction::Up)
        } else if keystate.any_pressed(&keys::DOWN) {
            Some(Direction::Down)
        } else if keystate.any_pressed(&keys::LEFT) {
            Some(Direction::Left)
        } else if keystate.any_pressed(&keys::RIGHT) {
            Some(Direction::Right)
        } else {
            None
        }
    }
}

/// ┌──────────────── Snake ──────────────────┐
/// │ Ready   ── arrow (not back) ──► Playing │
/// │ Playing ── wall / own body  ──► Lost    │
/// │ Playing ── board filled     ──► Won     │
/// └─────────────────────────────────────────┘
///
/// The queued turn is checked against the direction actually travelled,
/// so two quick presses between moves can't fold the snake onto itself.
pub struct Snake {
    rng: SmallRng,
    body: VecDeque<Cell>,
    direction: Direction,
    queued: Option<Direction>,
    food: Cell,
    ticks: u32,
    score: u32,
    status: GameStatus,
}

impl Snake {
    pub fn new(seed: u64) -> Self {
        let mut snake = Snake {
            rng: rng(seed),
            body: VecDeque::new(),
            direction: Direction::Right,
            queued: None,
            food: (0, 0),
            ticks: 0,
            score: 0,
            status: GameStatus::Ready,
        };
        snake.restart();
        snake
    }

    fn place_food(&mut self) -> Cell {
        let free: Vec<Cell> = (0..GRID)
            .flat_map(|y| (0..GRID).map(move |x| (x, y)))
            .filter(|cell| !self.body.contains(cell))
            .collect();
        if free.is_empty() {
            return self.food;
        }
        free[self.rng.gen_range(0..free.len())]
    }

    fn step(&mut self) {
        if let Some(turn) = self.queued.take() {
            self.direction = turn;
        }
        let (dx, dy) = self.direction.delta();
        let Some(&(x, y)) = self.body.front() else {
            return;
        };
        let head = (x + dx, y + dy);

        if !(0..GRID).contains(&head.0) || !(0..GRID).contains(&head.1) {
            self.status = GameStatus::Lost;
            return;
        }

        let eating = head == self.food;
        // the tail moves out of the way unless the snake grows
        let solid = if eating {
            self.body.len()
        } else {
            self.body.len() - 1
        };
        if self.body.iter().take(solid).any(|cell| *cell == head) {
            self.status = GameStatus::Lost;
            return;
        }

        self.body.push_front(head);
        if eating {
            self.score += 1;
            if self.body.len() == (GRID * GRID) as usize {
                self.status = GameStatus::Won;
            } else {
                self.food = self.place_food();
            }
        } else {
            self.body.pop_back();
        }
    }

    fn cell_rect((x, y): Cell) -> Rect {
        Rect::from_xywh(x as f32 * CELL + 1.0, y as f32 * CELL + 1.0, CELL - 2.0, CELL - 2.0)
    }
}

impl Game for Snake {
    fn name(&self) -> &'static str {
        NAME
    }

    fn logical_size(&self) -> Size {
        Size::new(GRID as f32 * CELL, GRID as f32 * CELL)
    }

    fn update(&mut self, keystate: &KeyState) {
        if let Some(wanted) = Direction::from_keys(keystate) {
            if wanted != self.direction.opposite() {
                self.queued = Some(wanted);
                if self.status == GameStatus::Ready {
                    self.status = GameStatus::Playing;
                }
            }
        }
        if self.status != GameStatus::Playing {
            return;
        }
        self.ticks += 1;
        if self.ticks >= MOVE_EVERY {
            self.ticks = 0;
            self.step();
        }
    }

    fn draw(&self, renderer: &Renderer) {
        let size = self.logical_size();
        draw_backdrop(renderer, size);

        let (fx, fy) = self.food;
        renderer.fill_circle(
            &Circle::new(
                Point::new((fx as f32 + 0.5) * CELL, (fy as f32 + 0.5) * CELL),
                CELL * 0.4,
            ),
            palette::DANGER,
        );
        for (i, cell) in self.body.iter().enumerate() {
            let color = if i == 0 { palette::ACCENT } else { palette::GOOD };
            renderer.fill_rect(&Snake::cell_rect(*cell), color);
        }

        draw_score(renderer, &format!("Score: {}", self.score));
        if self.status == GameStatus::Ready {
            draw_prompt(renderer, size, "Press an arrow key to start");
        }
    }

    fn status(&self) -> GameStatus {
        self.status
    }

    fn score(&self) -> u32 {
        self.score
    }

    fn restart(&mut self) {
        self.body = START.iter().copied().collect();
        self.direction = Direction::Right;
        self.queued = None;
        self.ticks = 0;
        self.score = 0;
        self.status = GameStatus::Ready;
        self.food = self.place_food();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::testing::{idle, tap};

    /// One arrow press followed by exactly one move
    fn turn(snake: &mut Snake, code: &str) {
        snake.update(&tap(code));
        idle(snake, MOVE_EVERY - 1);
    }

    #[test]
    fn waits_for_an_arrow_key() {
        let mut snake = Snake::new(1);
        idle(&mut snake, 60);
        assert_eq!(snake.status(), GameStatus::Ready);
        assert_eq!(snake.body.front(), Some(&(10, 10)));

        // reversing into the body does not start the game
        snake.update(&tap("ArrowLeft"));
        assert_eq!(snake.status(), GameStatus::Ready);
    }

    #[test]
    fn eating_grows_and_scores() {
        let mut snake = Snake::new(1);
        snake.food = (11, 10);
        turn(&mut snake, "ArrowRight");
        assert_eq!(snake.score(), 1);
        assert_eq!(snake.body.len(), 4);
        assert_ne!(snake.food, (11, 10));
    }

    #[test]
    fn running_into_itself_ends_the_game_and_keeps_the_score() {
        let mut snake = Snake::new(3);
        snake.food = (11, 10);
        turn(&mut snake, "ArrowRight");
        snake.food = (12, 10);
        turn(&mut snake, "ArrowRight");
        assert_eq!(snake.score(), 2);
        snake.food = (0, 0);

        turn(&mut snake, "ArrowDown");
        turn(&mut snake, "ArrowLeft");
        assert_eq!(snake.status(), GameStatus::Playing);
        turn(&mut snake, "ArrowUp");

        assert_eq!(snake.status(), GameStatus::Lost);
        assert_eq!(snake.score(), 2);
    }

    #[test]
    fn two_quick_turns_cannot_reverse() {
        let mut snake = Snake::new(1);
        snake.food = (0, 0);
        turn(&mut snake, "ArrowRight");
        // up then left before the next move: left is checked against "right"
        snake.update(&tap("ArrowUp"));
        snake.update(&tap("ArrowLeft"));
        idle(&mut snake, MOVE_EVERY);
        assert_eq!(snake.status(), GameStatus::Playing);
        assert_eq!(snake.body.front(), Some(&(11, 9)));
    }

    #[test]
    fn leaving_the_board_is_fatal() {
        let mut snake = Snake::new(1);
        snake.food = (0, 0);
        snake.update(&tap("ArrowRight"));
        idle(&mut snake, MOVE_EVERY * 10);
        assert_eq!(snake.status(), GameStatus::Lost);
    }

    #[test]
    fn restart_puts_the_snake_back() {
        let mut snake = Snake::new(1);
        snake.food = (11, 10);
        turn(&mut snake, "ArrowRight");
        turn(&mut snake, "ArrowDown");
        snake.restart();
        assert_eq!(snake.body, START.iter().copied().collect::<VecDeque<_>>());
        assert_eq!(snake.direction, Direction::Right);
        assert_eq!(snake.score(), 0);
        assert_eq!(snake.status(), GameStatus::Ready);
    }
}
