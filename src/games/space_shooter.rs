use crate::engine::input::KeyState;
use crate::engine::{Game, GameStatus, Point, Rect, Renderer, Size, TextAlign, Vector};
use crate::games::{draw_backdrop, draw_prompt, draw_score, keys, palette, rng};
use rand::rngs::SmallRng;
use rand::Rng;

pub const NAME: &str = "spaceShooter";

const WIDTH: f32 = 480.0;
const HEIGHT: f32 = 640.0;

const SHIP_WIDTH: f32 = 40.0;
const SHIP_HEIGHT: f32 = 24.0;
const SHIP_Y: f32 = HEIGHT - 50.0;
const SHIP_SPEED: f32 = 5.0;

const BULLET_WIDTH: f32 = 4.0;
const BULLET_HEIGHT: f32 = 10.0;
const BULLET_SPEED: f32 = 8.0;
/// Steps between two shots
const FIRE_COOLDOWN: u32 = 15;

const ENEMY_WIDTH: f32 = 32.0;
const ENEMY_HEIGHT: f32 = 24.0;
const ENEMY_POINTS: u32 = 10;
const LIVES: u32 = 3;

const FIRE_KEYS: [&str; 1] = ["Space"];

/// Spawn interval and fall speed both tighten as the score grows
fn spawn_interval(score: u32) -> u32 {
    60u32.saturating_sub(score / 50).max(20)
}

fn enemy_speed(score: u32) -> f32 {
    (1.5 + score as f32 / 500.0).min(5.0)
}

/// Ship at the bottom, enemies falling from the top. An enemy that reaches
/// the ground or rams the ship costs a life.
pub struct SpaceShooter {
    rng: SmallRng,
    ship: Rect,
    bullets: Vec<Rect>,
    enemies: Vec<Rect>,
    cooldown: u32,
    spawn_timer: u32,
    last_pointer: Option<Point>,
    lives: u32,
    score: u32,
    status: GameStatus,
}

impl SpaceShooter {
    pub fn new(seed: u64) -> Self {
        let mut game = SpaceShooter {
            rng: rng(seed),
            ship: Rect::default(),
            bullets: Vec::new(),
            enemies: Vec::new(),
            cooldown: 0,
            spawn_timer: 0,
            last_pointer: None,
            lives: LIVES,
            score: 0,
            status: GameStatus::Ready,
        };
        game.restart();
        game
    }

    fn steer(&mut self, keystate: &KeyState) {
        let mut x = self.ship.x();
        if keystate.any_held(&keys::LEFT) {
            x -= SHIP_SPEED;
        }
        if keystate.any_held(&keys::RIGHT) {
            x += SHIP_SPEED;
        }
        let pointer = keystate.pointer();
        if pointer.is_some() && pointer != self.last_pointer {
            self.last_pointer = pointer;
            if let Some(p) = pointer {
                x = p.x - SHIP_WIDTH / 2.0;
            }
        }
        self.ship.position.x = x.clamp(0.0, WIDTH - SHIP_WIDTH);
    }

    fn fire(&mut self, keystate: &KeyState) {
        self.cooldown = self.cooldown.saturating_sub(1);
        let trigger = keystate.any_held(&FIRE_KEYS) || keystate.is_pointer_down();
        if trigger && self.cooldown == 0 {
            let muzzle = self.ship.center();
            self.bullets.push(Rect::from_xywh(
                muzzle.x - BULLET_WIDTH / 2.0,
                self.ship.top() - BULLET_HEIGHT,
                BULLET_WIDTH,
                BULLET_HEIGHT,
            ));
            self.cooldown = FIRE_COOLDOWN;
        }
    }

    fn spawn(&mut self) {
        self.spawn_timer += 1;
        if self.spawn_timer < spawn_interval(self.score) {
            return;
        }
        self.spawn_timer = 0;
        let x = self.rng.gen_range(0.0..(WIDTH - ENEMY_WIDTH));
        self.enemies
            .push(Rect::from_xywh(x, -ENEMY_HEIGHT, ENEMY_WIDTH, ENEMY_HEIGHT));
    }

    fn advance_actors(&mut self) {
        let up = Vector::new(0.0, -BULLET_SPEED);
        let down = Vector::new(0.0, enemy_speed(self.score));
        for bullet in &mut self.bullets {
            *bullet = bullet.translated(up);
        }
        for enemy in &mut self.enemies {
            *enemy = enemy.translated(down);
        }
        self.bullets.retain(|bullet| bullet.bottom() > 0.0);
    }

    fn collide(&mut self) {
        let mut hits = 0;
        let bullets = &mut self.bullets;
        self.enemies.retain(|enemy| {
            match bullets.iter().position(|bullet| bullet.intersects(enemy)) {
                Some(i) => {
                    bullets.swap_remove(i);
                    hits += 1;
                    false
                }
                None => true,
            }
        });
        self.score += hits * ENEMY_POINTS;

        let ship = self.ship;
        let before = self.enemies.len();
        self.enemies
            .retain(|enemy| !enemy.intersects(&ship) && enemy.top() < HEIGHT);
        let lost = (before - self.enemies.len()) as u32;
        self.lives = self.lives.saturating_sub(lost);
        if self.lives == 0 {
            self.status = GameStatus::Lost;
        }
    }
}

impl Game for SpaceShooter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn logical_size(&self) -> Size {
        Size::new(WIDTH, HEIGHT)
    }

    fn update(&mut self, keystate: &KeyState) {
        match self.status {
            GameStatus::Ready => {
                if keystate.any_pressed(&FIRE_KEYS)
                    || keystate.any_pressed(&keys::LEFT)
                    || keystate.any_pressed(&keys::RIGHT)
                    || keystate.clicked()
                {
                    self.status = GameStatus::Playing;
                } else {
                    return;
                }
            }
            GameStatus::Playing => {}
            _ => return,
        }
        self.steer(keystate);
        self.fire(keystate);
        self.spawn();
        self.advance_actors();
        self.collide();
    }

    fn draw(&self, renderer: &Renderer) {
        let size = self.logical_size();
        draw_backdrop(renderer, size);
        for bullet in &self.bullets {
            renderer.fill_rect(bullet, palette::ACCENT);
        }
        for enemy in &self.enemies {
            renderer.draw_logo(enemy);
        }
        renderer.fill_rect(&self.ship, palette::GOOD);
        draw_score(renderer, &format!("Score: {}", self.score));
        renderer.text(
            &format!("Lives: {}", self.lives),
            Point::new(WIDTH - 12.0, 18.0),
            16.0,
            palette::TEXT,
            TextAlign::Right,
        );
        if self.status == GameStatus::Ready {
            draw_prompt(renderer, size, "Arrows to move, Space to fire");
        }
    }

    fn status(&self) -> GameStatus {
        self.status
    }

    fn score(&self) -> u32 {
        self.score
    }

    fn restart(&mut self) {
        self.ship = Rect::from_xywh((WIDTH - SHIP_WIDTH) / 2.0, SHIP_Y, SHIP_WIDTH, SHIP_HEIGHT);
        self.bullets.clear();
        self.enemies.clear();
        self.cooldown = 0;
        self.spawn_timer = 0;
        self.last_pointer = None;
        self.lives = LIVES;
        self.score = 0;
        self.status = GameStatus::Ready;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::testing::{hold, tap};

    fn playing() -> SpaceShooter {
        let mut game = SpaceShooter::new(8);
        game.update(&tap("Space"));
        game.bullets.clear();
        game.enemies.clear();
        game
    }

    #[test]
    fn holding_space_fires_on_a_cooldown() {
        let mut game = playing();
        game.cooldown = 0;
        let keys = hold("Space");
        for _ in 0..FIRE_COOLDOWN {
            game.update(&keys);
        }
        assert_eq!(game.bullets.len(), 1);
        game.update(&keys);
        assert_eq!(game.bullets.len(), 2);
    }

    #[test]
    fn shooting_an_enemy_scores_ten() {
        let mut game = playing();
        game.enemies.push(Rect::from_xywh(100.0, 100.0, ENEMY_WIDTH, ENEMY_HEIGHT));
        game.bullets.push(Rect::from_xywh(110.0, 130.0, BULLET_WIDTH, BULLET_HEIGHT));
        game.update(&KeyState::new());
        assert_eq!(game.score(), ENEMY_POINTS);
        assert!(game.enemies.is_empty());
        assert!(game.bullets.is_empty());
    }

    #[test]
    fn enemies_that_get_through_cost_lives() {
        let mut game = playing();
        for _ in 0..LIVES {
            game.enemies.push(Rect::from_xywh(0.0, HEIGHT - 1.0, ENEMY_WIDTH, ENEMY_HEIGHT));
            game.update(&KeyState::new());
        }
        assert_eq!(game.status(), GameStatus::Lost);
    }

    #[test]
    fn ramming_the_ship_costs_a_life() {
        let mut game = playing();
        let ship = game.ship;
        game.enemies.push(Rect::from_xywh(ship.x(), ship.y() - 10.0, ENEMY_WIDTH, ENEMY_HEIGHT));
        game.update(&KeyState::new());
        assert_eq!(game.lives, LIVES - 1);
        assert_eq!(game.status(), GameStatus::Playing);
    }

    #[test]
    fn difficulty_ramps_with_score() {
        assert_eq!(spawn_interval(0), 60);
        assert_eq!(spawn_interval(10_000), 20);
        assert!(enemy_speed(1000) > enemy_speed(0));
        assert_eq!(enemy_speed(100_000), 5.0);
    }

    #[test]
    fn restart_recenters_the_ship() {
        let mut game = playing();
        game.update(&hold("ArrowLeft"));
        game.restart();
        assert_eq!(game.ship.x(), (WIDTH - SHIP_WIDTH) / 2.0);
        assert_eq!(game.lives, LIVES);
        assert_eq!(game.status(), GameStatus::Ready);
    }
}
