use crate::engine::input::KeyState;
use crate::engine::{Game, GameStatus, Point, Rect, Renderer, Size, Vector};
use crate::games::{draw_backdrop, draw_prompt, draw_score, keys, palette, rng};
use rand::rngs::SmallRng;
use rand::Rng;

pub const NAME: &str = "logoDodge";

const WIDTH: f32 = 400.0;
const HEIGHT: f32 = 600.0;
const STEPS_PER_SECOND: u32 = 60;

const PLAYER_SIZE: f32 = 40.0;
const PLAYER_START: Point = Point::new((WIDTH - PLAYER_SIZE) / 2.0, HEIGHT - 60.0);
const PLAYER_SPEED: f32 = 6.0;

const LOGO_SIZE: f32 = 36.0;
/// Logos only hurt when they overlap by more than this on every side
const HIT_INSET: f32 = 4.0;

fn fall_speed(elapsed: u32) -> f32 {
    3.0 + elapsed as f32 / (STEPS_PER_SECOND * 10) as f32 * 0.5
}

fn spawn_interval(elapsed: u32) -> u32 {
    40u32.saturating_sub(elapsed / (STEPS_PER_SECOND * 3)).max(12)
}

fn inset(rect: &Rect, by: f32) -> Rect {
    Rect::from_xywh(
        rect.x() + by,
        rect.y() + by,
        rect.size.width - 2.0 * by,
        rect.size.height - 2.0 * by,
    )
}

/// Survive the falling logos. Score is whole seconds survived.
pub struct LogoDodge {
    rng: SmallRng,
    player: Rect,
    logos: Vec<Rect>,
    elapsed: u32,
    spawn_timer: u32,
    last_pointer: Option<Point>,
    status: GameStatus,
}

impl LogoDodge {
    pub fn new(seed: u64) -> Self {
        let mut game = LogoDodge {
            rng: rng(seed),
            player: Rect::default(),
            logos: Vec::new(),
            elapsed: 0,
            spawn_timer: 0,
            last_pointer: None,
            status: GameStatus::Ready,
        };
        game.restart();
        game
    }

    fn steer(&mut self, keystate: &KeyState) {
        let mut x = self.player.x();
        if keystate.any_held(&keys::LEFT) {
            x -= PLAYER_SPEED;
        }
        if keystate.any_held(&keys::RIGHT) {
            x += PLAYER_SPEED;
        }
        let pointer = keystate.pointer();
        if pointer.is_some() && pointer != self.last_pointer {
            self.last_pointer = pointer;
            if let Some(p) = pointer {
                x = p.x - PLAYER_SIZE / 2.0;
            }
        }
        self.player.position.x = x.clamp(0.0, WIDTH - PLAYER_SIZE);
    }

    fn rain(&mut self) {
        self.spawn_timer += 1;
        if self.spawn_timer >= spawn_interval(self.elapsed) {
            self.spawn_timer = 0;
            let x = self.rng.gen_range(0.0..(WIDTH - LOGO_SIZE));
            self.logos
                .push(Rect::from_xywh(x, -LOGO_SIZE, LOGO_SIZE, LOGO_SIZE));
        }
        let fall = Vector::new(0.0, fall_speed(self.elapsed));
        for logo in &mut self.logos {
            *logo = logo.translated(fall);
        }
        self.logos.retain(|logo| logo.top() < HEIGHT);
    }
}

impl Game for LogoDodge {
    fn name(&self) -> &'static str {
        NAME
    }

    fn logical_size(&self) -> Size {
        Size::new(WIDTH, HEIGHT)
    }

    fn update(&mut self, keystate: &KeyState) {
        match self.status {
            GameStatus::Ready => {
                let moved = keystate.any_pressed(&keys::LEFT) || keystate.any_pressed(&keys::RIGHT);
                if moved || keystate.clicked() {
                    self.status = GameStatus::Playing;
                } else {
                    return;
                }
            }
            GameStatus::Playing => {}
            _ => return,
        }
        self.elapsed += 1;
        self.steer(keystate);
        self.rain();
        let body = inset(&self.player, HIT_INSET);
        if self.logos.iter().any(|logo| logo.intersects(&body)) {
            self.status = GameStatus::Lost;
        }
    }

    fn draw(&self, renderer: &Renderer) {
        let size = self.logical_size();
        draw_backdrop(renderer, size);
        for logo in &self.logos {
            renderer.draw_logo(logo);
        }
        renderer.fill_rect(&self.player, palette::GOOD);
        draw_score(renderer, &format!("Time: {}s", self.score()));
        if self.status == GameStatus::Ready {
            draw_prompt(renderer, size, "Move to start dodging");
        }
    }

    fn status(&self) -> GameStatus {
        self.status
    }

    fn score(&self) -> u32 {
        self.elapsed / STEPS_PER_SECOND
    }

    fn restart(&mut self) {
        self.player = Rect::new(PLAYER_START, Size::new(PLAYER_SIZE, PLAYER_SIZE));
        self.logos.clear();
        self.elapsed = 0;
        self.spawn_timer = 0;
        self.last_pointer = None;
        self.status = GameStatus::Ready;
    }
}
