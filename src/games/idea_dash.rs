use crate::engine::input::KeyState;
use crate::engine::{Circle, Game, GameStatus, Point, Rect, Renderer, Size, TextAlign};
use crate::games::{draw_backdrop, draw_prompt, draw_score, keys, palette, rng};
use crate::scores::store::{KeyValueStore, RunRecords};
use rand::rngs::SmallRng;
use rand::Rng;
use std::rc::Rc;

pub const NAME: &str = "ideaDash";

const WIDTH: f32 = 600.0;
const HEIGHT: f32 = 250.0;
const GROUND_Y: f32 = 210.0;

const RUNNER_X: f32 = 60.0;
const RUNNER_WIDTH: f32 = 30.0;
const RUNNER_HEIGHT: f32 = 40.0;
const GRAVITY: f32 = 0.5;
const JUMP_VELOCITY: f32 = -9.5;

const BASE_SPEED: f32 = 5.0;
const MAX_SPEED: f32 = 12.0;
/// Speed gained per step of distance covered
const ACCELERATION: f32 = 0.001;

const IDEA_RADIUS: f32 = 10.0;
const IDEA_POINTS: u32 = 10;
/// Distance units per point
const DISTANCE_PER_POINT: f32 = 60.0;

/// Endless runner: jump the boxes, grab the light bulbs. When the run ends
/// the best score and the idea streak are written to local storage.
pub struct IdeaDash {
    rng: SmallRng,
    records: RunRecords,
    runner_y: f32,
    velocity: f32,
    obstacles: Vec<Rect>,
    ideas: Vec<Circle>,
    obstacle_timer: u32,
    idea_timer: u32,
    distance: f32,
    collected: u32,
    best: u32,
    streak: u32,
    status: GameStatus,
}

impl IdeaDash {
    pub fn new(seed: u64, store: Rc<dyn KeyValueStore>) -> Self {
        let records = RunRecords::new(store);
        let best = records.high_score();
        let streak = records.streak();
        let mut game = IdeaDash {
            rng: rng(seed),
            records,
            runner_y: 0.0,
            velocity: 0.0,
            obstacles: Vec::new(),
            ideas: Vec::new(),
            obstacle_timer: 0,
            idea_timer: 0,
            distance: 0.0,
            collected: 0,
            best,
            streak,
            status: GameStatus::Ready,
        };
        game.restart();
        game
    }

    fn runner(&self) -> Rect {
        Rect::from_xywh(RUNNER_X, self.runner_y, RUNNER_WIDTH, RUNNER_HEIGHT)
    }

    fn on_ground(&self) -> bool {
        self.runner_y >= GROUND_Y - RUNNER_HEIGHT
    }

    fn speed(&self) -> f32 {
        (BASE_SPEED + self.distance * ACCELERATION).min(MAX_SPEED)
    }

    fn jump(&mut self, keystate: &KeyState) {
        let pressed = keystate.any_pressed(&keys::ACTION) || keystate.clicked();
        if pressed && self.on_ground() {
            self.velocity = JUMP_VELOCITY;
        }
        self.velocity += GRAVITY;
        self.runner_y = (self.runner_y + self.velocity).min(GROUND_Y - RUNNER_HEIGHT);
        if self.on_ground() {
            self.velocity = 0.0;
        }
    }

    fn spawn(&mut self) {
        if self.obstacle_timer == 0 {
            let height = self.rng.gen_range(30.0..50.0);
            self.obstacles
                .push(Rect::from_xywh(WIDTH, GROUND_Y - height, 20.0, height));
            self.obstacle_timer = self.rng.gen_range(60..110);
        }
        if self.idea_timer == 0 {
            let y = self.rng.gen_range(120.0..160.0);
            self.ideas
                .push(Circle::new(Point::new(WIDTH + IDEA_RADIUS, y), IDEA_RADIUS));
            self.idea_timer = self.rng.gen_range(90..150);
        }
        self.obstacle_timer -= 1;
        self.idea_timer -= 1;
    }

    fn scroll(&mut self) {
        let speed = self.speed();
        self.distance += speed;
        for obstacle in &mut self.obstacles {
            obstacle.position.x -= speed;
        }
        for idea in &mut self.ideas {
            idea.center.x -= speed;
        }
        self.obstacles.retain(|obstacle| obstacle.right() > 0.0);
        self.ideas.retain(|idea| idea.center.x + idea.radius > 0.0);
    }

    fn collide(&mut self) {
        let runner = self.runner();
        let before = self.ideas.len();
        self.ideas.retain(|idea| !idea.intersects_rect(&runner));
        self.collected += (before - self.ideas.len()) as u32;

        if self.obstacles.iter().any(|obstacle| obstacle.intersects(&runner)) {
            self.status = GameStatus::Lost;
            self.finish_run();
        }
    }

    fn finish_run(&mut self) {
        let score = self.score();
        match self.records.record_run(score, self.collected) {
            Ok(outcome) => {
                if outcome.new_best {
                    log::info!("New {} best: {}", NAME, score);
                    self.best = score;
                }
                self.streak = outcome.streak;
            }
            Err(err) => log::warn!("Could not save {} records: {}", NAME, err),
        }
    }
}

impl Game for IdeaDash {
    fn name(&self) -> &'static str {
        NAME
    }

    fn logical_size(&self) -> Size {
        Size::new(WIDTH, HEIGHT)
    }

    fn update(&mut self, keystate: &KeyState) {
        match self.status {
            GameStatus::Ready => {
                if keystate.any_pressed(&keys::ACTION) || keystate.clicked() {
                    self.status = GameStatus::Playing;
                } else {
                    return;
                }
            }
            GameStatus::Playing => {}
            _ => return,
        }
        self.jump(keystate);
        self.spawn();
        self.scroll();
        self.collide();
    }

    fn draw(&self, renderer: &Renderer) {
        let size = self.logical_size();
        draw_backdrop(renderer, size);
        renderer.fill_rect(
            &Rect::from_xywh(0.0, GROUND_Y, WIDTH, HEIGHT - GROUND_Y),
            palette::MUTED,
        );
        for obstacle in &self.obstacles {
            renderer.fill_rect(obstacle, palette::DANGER);
        }
        for idea in &self.ideas {
            renderer.fill_circle(idea, "#f8e71c");
        }
        let runner = self.runner();
        renderer.fill_rect(&runner, palette::GOOD);
        renderer.draw_logo(&Rect::from_xywh(runner.x() + 3.0, runner.y() + 3.0, 24.0, 24.0));

        draw_score(renderer, &format!("Score: {}   Ideas: {}", self.score(), self.collected));
        renderer.text(
            &format!("Best: {}   Streak: {}", self.best.max(self.score()), self.streak),
            Point::new(WIDTH - 12.0, 18.0),
            16.0,
            palette::TEXT,
            TextAlign::Right,
        );
        if self.status == GameStatus::Ready {
            draw_prompt(renderer, size, "Space to jump");
        }
    }

    fn status(&self) -> GameStatus {
        self.status
    }

    fn score(&self) -> u32 {
        (self.distance / DISTANCE_PER_POINT) as u32 + self.collected * IDEA_POINTS
    }

    fn restart(&mut self) {
        self.runner_y = GROUND_Y - RUNNER_HEIGHT;
        self.velocity = 0.0;
        self.obstacles.clear();
        self.ideas.clear();
        self.obstacle_timer = 60;
        self.idea_timer = 90;
        self.distance = 0.0;
        self.collected = 0;
        self.status = GameStatus::Ready;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::testing::tap;
    use crate::scores::store::MemoryStore;

    fn playing(store: Rc<MemoryStore>) -> IdeaDash {
        let mut game = IdeaDash::new(2, store);
        game.status = GameStatus::Playing;
        game
    }

    #[test]
    fn jumps_only_from_the_ground() {
        let mut game = playing(Rc::new(MemoryStore::default()));
        game.update(&tap("Space"));
        let airborne = game.runner_y;
        assert!(airborne < GROUND_Y - RUNNER_HEIGHT);
        game.update(&tap("Space"));
        assert!(game.velocity > JUMP_VELOCITY + GRAVITY);
        for _ in 0..60 {
            game.obstacles.clear();
            game.update(&KeyState::new());
        }
        assert!(game.on_ground());
    }

    #[test]
    fn ideas_are_worth_ten() {
        let mut game = playing(Rc::new(MemoryStore::default()));
        let runner = game.runner();
        game.ideas.push(Circle::new(
            Point::new(runner.right() + 5.0, runner.center().y),
            IDEA_RADIUS,
        ));
        game.update(&KeyState::new());
        assert_eq!(game.collected, 1);
        assert!(game.score() >= IDEA_POINTS);
    }

    #[test]
    fn crashing_records_best_and_streak() {
        let store = Rc::new(MemoryStore::default());
        let mut game = playing(store.clone());
        game.collected = 2;
        game.distance = 600.0;
        let runner = game.runner();
        game.obstacles.push(Rect::from_xywh(runner.right() + 2.0, GROUND_Y - 40.0, 20.0, 40.0));
        game.update(&KeyState::new());
        assert_eq!(game.status(), GameStatus::Lost);

        let records = RunRecords::new(store.clone());
        assert_eq!(records.high_score(), game.score());
        assert_eq!(records.streak(), 1);

        // a fresh game reads the stored records back
        let again = IdeaDash::new(3, store);
        assert_eq!(again.best, game.score());
        assert_eq!(again.streak, 1);
    }

    #[test]
    fn restart_keeps_records_but_resets_the_run() {
        let store = Rc::new(MemoryStore::default());
        let mut game = playing(store);
        game.collected = 1;
        game.distance = 120.0;
        game.finish_run();
        game.restart();
        assert_eq!(game.score(), 0);
        assert_eq!(game.runner_y, GROUND_Y - RUNNER_HEIGHT);
        assert_eq!(game.best, 12);
        assert_eq!(game.status(), GameStatus::Ready);
    }
}
