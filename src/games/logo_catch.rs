use crate::engine::input::KeyState;
use crate::engine::{Circle, Game, GameStatus, Point, Rect, Renderer, Size, TextAlign, Vector};
use crate::games::{draw_backdrop, draw_prompt, draw_score, keys, palette, rng};
use rand::rngs::SmallRng;
use rand::Rng;

pub const NAME: &str = "logoCatch";

const WIDTH: f32 = 400.0;
const HEIGHT: f32 = 600.0;
const STEPS_PER_SECOND: u32 = 60;
/// One minute on the clock
const ROUND_STEPS: u32 = 60 * STEPS_PER_SECOND;

const BASKET_WIDTH: f32 = 70.0;
const BASKET_HEIGHT: f32 = 30.0;
const BASKET_START: Point = Point::new((WIDTH - BASKET_WIDTH) / 2.0, HEIGHT - 50.0);
const BASKET_SPEED: f32 = 7.0;

const ITEM_SIZE: f32 = 36.0;
const ITEM_SPEED: f32 = 2.5;
const SPAWN_INTERVAL: u32 = 35;
const BAD_CHANCE: f64 = 0.2;
const BAD_PENALTY: u32 = 3;

#[derive(Debug, Clone, PartialEq)]
struct Item {
    rect: Rect,
    bad: bool,
}

/// Catch the community logos, dodge the red ones. Runs on a one minute
/// clock and ends as a win when it runs out.
pub struct LogoCatch {
    rng: SmallRng,
    basket: Rect,
    items: Vec<Item>,
    remaining: u32,
    spawn_timer: u32,
    last_pointer: Option<Point>,
    score: u32,
    status: GameStatus,
}

impl LogoCatch {
    pub fn new(seed: u64) -> Self {
        let mut game = LogoCatch {
            rng: rng(seed),
            basket: Rect::default(),
            items: Vec::new(),
            remaining: ROUND_STEPS,
            spawn_timer: 0,
            last_pointer: None,
            score: 0,
            status: GameStatus::Ready,
        };
        game.restart();
        game
    }

    fn steer(&mut self, keystate: &KeyState) {
        let mut x = self.basket.x();
        if keystate.any_held(&keys::LEFT) {
            x -= BASKET_SPEED;
        }
        if keystate.any_held(&keys::RIGHT) {
            x += BASKET_SPEED;
        }
        let pointer = keystate.pointer();
        if pointer.is_some() && pointer != self.last_pointer {
            self.last_pointer = pointer;
            if let Some(p) = pointer {
                x = p.x - BASKET_WIDTH / 2.0;
            }
        }
        self.basket.position.x = x.clamp(0.0, WIDTH - BASKET_WIDTH);
    }

    fn drop_items(&mut self) {
        self.spawn_timer += 1;
        if self.spawn_timer >= SPAWN_INTERVAL {
            self.spawn_timer = 0;
            let x = self.rng.gen_range(0.0..(WIDTH - ITEM_SIZE));
            let bad = self.rng.gen_bool(BAD_CHANCE);
            self.items.push(Item {
                rect: Rect::from_xywh(x, -ITEM_SIZE, ITEM_SIZE, ITEM_SIZE),
                bad,
            });
        }
        let fall = Vector::new(0.0, ITEM_SPEED);
        for item in &mut self.items {
            item.rect = item.rect.translated(fall);
        }
    }

    fn catch(&mut self) {
        let basket = self.basket;
        let mut caught = Vec::new();
        self.items.retain(|item| {
            if item.rect.intersects(&basket) {
                caught.push(item.bad);
                false
            } else {
                item.rect.top() < HEIGHT
            }
        });
        for bad in caught {
            if bad {
                self.score = self.score.saturating_sub(BAD_PENALTY);
            } else {
                self.score += 1;
            }
        }
    }

    fn seconds_left(&self) -> u32 {
        (self.remaining + STEPS_PER_SECOND - 1) / STEPS_PER_SECOND
    }
}

impl Game for LogoCatch {
    fn name(&self) -> &'static str {
        NAME
    }

    fn logical_size(&self) -> Size {
        Size::new(WIDTH, HEIGHT)
    }

    fn update(&mut self, keystate: &KeyState) {
        match self.status {
            GameStatus::Ready => {
                let started = keystate.any_pressed(&keys::LEFT)
                    || keystate.any_pressed(&keys::RIGHT)
                    || keystate.clicked();
                if !started {
                    return;
                }
                self.status = GameStatus::Playing;
            }
            GameStatus::Playing => {}
            _ => return,
        }
        self.steer(keystate);
        self.drop_items();
        self.catch();
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.status = GameStatus::Won;
        }
    }

    fn draw(&self, renderer: &Renderer) {
        let size = self.logical_size();
        draw_backdrop(renderer, size);
        for item in &self.items {
            if item.bad {
                let radius = ITEM_SIZE / 2.0;
                renderer.fill_circle(&Circle::new(item.rect.center(), radius), palette::DANGER);
                renderer.text("X", item.rect.center(), 20.0, palette::TEXT, TextAlign::Center);
            } else {
                renderer.draw_logo(&item.rect);
            }
        }
        renderer.fill_rect(&self.basket, palette::ACCENT);
        draw_score(renderer, &format!("Caught: {}", self.score));
        renderer.text(
            &format!("Time: {}", self.seconds_left()),
            Point::new(WIDTH - 12.0, 18.0),
            16.0,
            palette::TEXT,
            TextAlign::Right,
        );
        if self.status == GameStatus::Ready {
            draw_prompt(renderer, size, "Move the basket to start");
        }
    }

    fn status(&self) -> GameStatus {
        self.status
    }

    fn score(&self) -> u32 {
        self.score
    }

    fn restart(&mut self) {
        self.basket = Rect::new(BASKET_START, Size::new(BASKET_WIDTH, BASKET_HEIGHT));
        self.items.clear();
        self.remaining = ROUND_STEPS;
        self.spawn_timer = 0;
        self.last_pointer = None;
        self.score = 0;
        self.status = GameStatus::Ready;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::testing::{idle, tap};

    fn playing() -> LogoCatch {
        let mut game = LogoCatch::new(12);
        game.status = GameStatus::Playing;
        game
    }

    fn item_above_basket(game: &LogoCatch, bad: bool) -> Item {
        Item {
            rect: Rect::from_xywh(game.basket.x(), game.basket.y() - ITEM_SIZE, ITEM_SIZE, ITEM_SIZE),
            bad,
        }
    }

    #[test]
    fn clock_starts_on_first_move() {
        let mut game = LogoCatch::new(12);
        idle(&mut game, 100);
        assert_eq!(game.remaining, ROUND_STEPS);
        game.update(&tap("ArrowLeft"));
        assert_eq!(game.remaining, ROUND_STEPS - 1);
        assert_eq!(game.seconds_left(), 60);
    }

    #[test]
    fn good_logos_score_and_bad_ones_cost_three() {
        let mut game = playing();
        for _ in 0..4 {
            let item = item_above_basket(&game, false);
            game.items.push(item);
            game.update(&KeyState::new());
        }
        assert_eq!(game.score(), 4);
        let item = item_above_basket(&game, true);
        game.items.push(item);
        game.update(&KeyState::new());
        assert_eq!(game.score(), 1);

        let item = item_above_basket(&game, true);
        game.items.push(item);
        game.update(&KeyState::new());
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn running_out_of_time_wins() {
        let mut game = playing();
        game.score = 5;
        game.remaining = 2;
        game.items.clear();
        game.update(&KeyState::new());
        assert_eq!(game.status(), GameStatus::Playing);
        game.update(&KeyState::new());
        assert_eq!(game.status(), GameStatus::Won);
        assert_eq!(game.score(), 5);
    }

    #[test]
    fn restart_refills_the_clock() {
        let mut game = playing();
        idle(&mut game, 300);
        game.restart();
        assert_eq!(game.remaining, ROUND_STEPS);
        assert_eq!(game.basket.position, BASKET_START);
        assert_eq!(game.status(), GameStatus::Ready);
    }
}
