use crate::engine::input::KeyState;
use crate::engine::physics::{bounce_inside, integrate, Walls};
use crate::engine::{Circle, Game, GameStatus, Point, Rect, Renderer, Size, Vector};
use crate::games::{draw_backdrop, draw_prompt, draw_score, keys, palette};

pub const NAME: &str = "bouncer";

const WIDTH: f32 = 400.0;
const HEIGHT: f32 = 600.0;

const PADDLE_WIDTH: f32 = 90.0;
const PADDLE_HEIGHT: f32 = 14.0;
const PADDLE_Y: f32 = 560.0;
const PADDLE_SPEED: f32 = 7.0;

const BALL_RADIUS: f32 = 12.0;
const BALL_START: Point = Point::new(200.0, 200.0);
const BALL_DRIFT: f32 = 2.5;
const GRAVITY: f32 = 0.25;
const WALL_DAMPING: f32 = 0.9;
const BOUNCE_SPEED: f32 = 11.0;
/// Sideways speed added per unit of paddle offset
const STEER: f32 = 3.0;
const MAX_DRIFT: f32 = 8.0;

/// Keep the logo in the air. Gravity pulls it down, the paddle sends it
/// back up with a fixed kick; one point per bounce.
pub struct Bouncer {
    paddle: Rect,
    ball: Circle,
    velocity: Vector,
    last_pointer: Option<Point>,
    score: u32,
    status: GameStatus,
}

impl Bouncer {
    pub fn new() -> Self {
        let mut game = Bouncer {
            paddle: Rect::default(),
            ball: Circle::default(),
            velocity: Vector::ZERO,
            last_pointer: None,
            score: 0,
            status: GameStatus::Ready,
        };
        game.restart();
        game
    }

    fn steer(&mut self, keystate: &KeyState) {
        let mut x = self.paddle.x();
        if keystate.any_held(&keys::LEFT) {
            x -= PADDLE_SPEED;
        }
        if keystate.any_held(&keys::RIGHT) {
            x += PADDLE_SPEED;
        }
        let pointer = keystate.pointer();
        if pointer.is_some() && pointer != self.last_pointer {
            self.last_pointer = pointer;
            if let Some(p) = pointer {
                x = p.x - PADDLE_WIDTH / 2.0;
            }
        }
        self.paddle.position.x = x.clamp(0.0, WIDTH - PADDLE_WIDTH);
    }

    fn bounce_off_paddle(&mut self) {
        if self.velocity.y <= 0.0 || !self.ball.intersects_rect(&self.paddle) {
            return;
        }
        let offset = ((self.ball.center.x - self.paddle.center().x) / (PADDLE_WIDTH / 2.0))
            .clamp(-1.0, 1.0);
        self.velocity = Vector::new(
            (self.velocity.x + offset * STEER).clamp(-MAX_DRIFT, MAX_DRIFT),
            -BOUNCE_SPEED,
        );
        self.ball.center.y = self.paddle.top() - BALL_RADIUS;
        self.score += 1;
    }
}

impl Default for Bouncer {
    fn default() -> Self {
        Bouncer::new()
    }
}

impl Game for Bouncer {
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
                    || keystate.was_pressed("Space")
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
        integrate(&mut self.ball.center, &mut self.velocity, GRAVITY);
        let bounds = Rect::from_xywh(0.0, 0.0, WIDTH, HEIGHT);
        bounce_inside(
            &mut self.ball,
            &mut self.velocity,
            &bounds,
            Walls::OPEN_BOTTOM,
            WALL_DAMPING,
        );
        self.bounce_off_paddle();
        if self.ball.center.y - BALL_RADIUS > HEIGHT {
            self.status = GameStatus::Lost;
        }
    }

    fn draw(&self, renderer: &Renderer) {
        let size = self.logical_size();
        draw_backdrop(renderer, size);
        renderer.fill_rect(&self.paddle, palette::ACCENT);
        renderer.draw_logo(&self.ball.bounds());
        draw_score(renderer, &format!("Bounces: {}", self.score));
        if self.status == GameStatus::Ready {
            draw_prompt(renderer, size, "Move the paddle to start");
        }
    }

    fn status(&self) -> GameStatus {
        self.status
    }

    fn score(&self) -> u32 {
        self.score
    }

    fn restart(&mut self) {
        self.paddle = Rect::from_xywh(
            (WIDTH - PADDLE_WIDTH) / 2.0,
            PADDLE_Y,
            PADDLE_WIDTH,
            PADDLE_HEIGHT,
        );
        self.ball = Circle::new(BALL_START, BALL_RADIUS);
        self.velocity = Vector::new(BALL_DRIFT, 0.0);
        self.last_pointer = None;
        self.score = 0;
        self.status = GameStatus::Ready;
    }
}
