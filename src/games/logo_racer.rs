use crate::engine::input::KeyState;
use crate::engine::{Game, GameStatus, Point, Rect, Renderer, Size};
use crate::games::{draw_backdrop, draw_prompt, draw_score, keys, palette, rng};
use rand::rngs::SmallRng;
use rand::Rng;

pub const NAME: &str = "logoRacer";

const LANES: usize = 3;
const LANE_WIDTH: f32 = 100.0;
const WIDTH: f32 = LANES as f32 * LANE_WIDTH;
const HEIGHT: f32 = 500.0;

const CAR_WIDTH: f32 = 50.0;
const CAR_HEIGHT: f32 = 80.0;
const CAR_Y: f32 = 400.0;
const START_LANE: usize = 1;

const OBSTACLE_SIZE: f32 = 50.0;
const BASE_SPEED: f32 = 4.0;
const SPEED_STEP: f32 = 0.1;
const MAX_SPEED: f32 = 10.0;
const BASE_INTERVAL: u32 = 50;
const MIN_INTERVAL: u32 = 22;
const STRIPE_LENGTH: f32 = 30.0;

fn lane_x(lane: usize, width: f32) -> f32 {
    lane as f32 * LANE_WIDTH + (LANE_WIDTH - width) / 2.0
}

#[derive(Debug, Clone, PartialEq)]
struct Obstacle {
    lane: usize,
    y: f32,
}

impl Obstacle {
    fn rect(&self) -> Rect {
        Rect::from_xywh(lane_x(self.lane, OBSTACLE_SIZE), self.y, OBSTACLE_SIZE, OBSTACLE_SIZE)
    }
}

/// Three-lane racer. The car hops one lane per press; every obstacle that
/// leaves the bottom of the road is a point and speeds the road up.
pub struct LogoRacer {
    rng: SmallRng,
    lane: usize,
    obstacles: Vec<Obstacle>,
    spawn_timer: u32,
    road_offset: f32,
    score: u32,
    status: GameStatus,
}

impl LogoRacer {
    pub fn new(seed: u64) -> Self {
        let mut game = LogoRacer {
            rng: rng(seed),
            lane: START_LANE,
            obstacles: Vec::new(),
            spawn_timer: 0,
            road_offset: 0.0,
            score: 0,
            status: GameStatus::Ready,
        };
        game.restart();
        game
    }

    fn car(&self) -> Rect {
        Rect::from_xywh(lane_x(self.lane, CAR_WIDTH), CAR_Y, CAR_WIDTH, CAR_HEIGHT)
    }

    fn speed(&self) -> f32 {
        (BASE_SPEED + self.score as f32 * SPEED_STEP).min(MAX_SPEED)
    }

    /// -1, 0 or 1 lanes from keys or a click on either half of the road
    fn steering(keystate: &KeyState) -> i32 {
        let mut shift: i32 = 0;
        if keystate.any_pressed(&keys::LEFT) {
            shift -= 1;
        }
        if keystate.any_pressed(&keys::RIGHT) {
            shift += 1;
        }
        for click in keystate.clicks() {
            shift += if click.position.x < WIDTH / 2.0 { -1 } else { 1 };
        }
        shift.signum()
    }

    fn traffic(&mut self) {
        let interval = BASE_INTERVAL.saturating_sub(self.score).max(MIN_INTERVAL);
        self.spawn_timer += 1;
        if self.spawn_timer >= interval {
            self.spawn_timer = 0;
            let lane = self.rng.gen_range(0..LANES);
            self.obstacles.push(Obstacle {
                lane,
                y: -OBSTACLE_SIZE,
            });
        }

        let speed = self.speed();
        self.road_offset = (self.road_offset + speed) % (STRIPE_LENGTH * 2.0);
        for obstacle in &mut self.obstacles {
            obstacle.y += speed;
        }
        let before = self.obstacles.len();
        self.obstacles.retain(|obstacle| obstacle.y < HEIGHT);
        self.score += (before - self.obstacles.len()) as u32;
    }
}

impl Game for LogoRacer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn logical_size(&self) -> Size {
        Size::new(WIDTH, HEIGHT)
    }

    fn update(&mut self, keystate: &KeyState) {
        let shift = LogoRacer::steering(keystate);
        match self.status {
            GameStatus::Ready if shift != 0 || keystate.was_pressed("Space") => {
                self.status = GameStatus::Playing;
            }
            GameStatus::Playing => {}
            _ => return,
        }
        self.lane = (self.lane as i32 + shift).clamp(0, LANES as i32 - 1) as usize;
        self.traffic();
        let car = self.car();
        if self.obstacles.iter().any(|obstacle| obstacle.rect().intersects(&car)) {
            self.status = GameStatus::Lost;
        }
    }

    fn draw(&self, renderer: &Renderer) {
        let size = self.logical_size();
        draw_backdrop(renderer, size);
        for lane in 1..LANES {
            let x = lane as f32 * LANE_WIDTH;
            let mut y = self.road_offset - STRIPE_LENGTH * 2.0;
            while y < HEIGHT {
                renderer.line(
                    Point::new(x, y),
                    Point::new(x, y + STRIPE_LENGTH),
                    palette::MUTED,
                    3.0,
                );
                y += STRIPE_LENGTH * 2.0;
            }
        }
        for obstacle in &self.obstacles {
            renderer.draw_logo(&obstacle.rect());
        }
        renderer.fill_rect(&self.car(), palette::DANGER);
        draw_score(renderer, &format!("Passed: {}", self.score));
        if self.status == GameStatus::Ready {
            draw_prompt(renderer, size, "Left / Right to race");
        }
    }

    fn status(&self) -> GameStatus {
        self.status
    }

    fn score(&self) -> u32 {
        self.score
    }

    fn restart(&mut self) {
        self.lane = START_LANE;
        self.obstacles.clear();
        self.spawn_timer = 0;
        self.road_offset = 0.0;
        self.score = 0;
        self.status = GameStatus::Ready;
    }
}
