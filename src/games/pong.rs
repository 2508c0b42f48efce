use crate::engine::input::KeyState;
use crate::engine::physics::{bounce_inside, Walls};
use crate::engine::{Circle, Game, GameStatus, Point, Rect, Renderer, Size, TextAlign, Vector};
use crate::games::{draw_backdrop, draw_prompt, draw_score, keys, palette, rng};
use rand::rngs::SmallRng;
use rand::Rng;

pub const NAME: &str = "pong";

const WIDTH: f32 = 600.0;
const HEIGHT: f32 = 400.0;

const PADDLE_WIDTH: f32 = 10.0;
const PADDLE_HEIGHT: f32 = 70.0;
const PLAYER_X: f32 = 20.0;
const CPU_X: f32 = WIDTH - PLAYER_X - PADDLE_WIDTH;
const PLAYER_SPEED: f32 = 6.0;
const CPU_SPEED: f32 = 3.2;

const BALL_RADIUS: f32 = 7.0;
const SERVE_SPEED: f32 = 4.0;
const MAX_SPEED: f32 = 9.0;
const SPEEDUP: f32 = 1.05;
/// Vertical speed added per unit of paddle offset
const SPIN: f32 = 3.0;

const MISSES_ALLOWED: u32 = 3;
/// Bonus for getting the ball past the computer
const POINT_BONUS: u32 = 5;

/// Player on the left against a computer paddle that tracks the ball at a
/// capped speed. Every return is a point, the run ends after three misses.
pub struct Pong {
    rng: SmallRng,
    player: Rect,
    cpu: Rect,
    ball: Circle,
    velocity: Vector,
    last_pointer: Option<Point>,
    misses: u32,
    score: u32,
    status: GameStatus,
}

fn paddle_at(x: f32) -> Rect {
    Rect::from_xywh(x, (HEIGHT - PADDLE_HEIGHT) / 2.0, PADDLE_WIDTH, PADDLE_HEIGHT)
}

impl Pong {
    pub fn new(seed: u64) -> Self {
        let mut pong = Pong {
            rng: rng(seed),
            player: paddle_at(PLAYER_X),
            cpu: paddle_at(CPU_X),
            ball: Circle::default(),
            velocity: Vector::ZERO,
            last_pointer: None,
            misses: 0,
            score: 0,
            status: GameStatus::Ready,
        };
        pong.restart();
        pong
    }

    /// Ball back to the middle, heading at `direction` (-1 left, 1 right)
    fn serve(&mut self, direction: f32) {
        self.ball.center = Point::new(WIDTH / 2.0, HEIGHT / 2.0);
        let vy = self.rng.gen_range(-2.0..2.0);
        self.velocity = Vector::new(SERVE_SPEED * direction, vy);
    }

    fn move_player(&mut self, keystate: &KeyState) {
        let mut y = self.player.y();
        if keystate.any_held(&keys::UP) {
            y -= PLAYER_SPEED;
        }
        if keystate.any_held(&keys::DOWN) {
            y += PLAYER_SPEED;
        }
        let pointer = keystate.pointer();
        if pointer.is_some() && pointer != self.last_pointer {
            self.last_pointer = pointer;
            if let Some(p) = pointer {
                y = p.y - PADDLE_HEIGHT / 2.0;
            }
        }
        self.player.position.y = y.clamp(0.0, HEIGHT - PADDLE_HEIGHT);
    }

    fn move_cpu(&mut self) {
        let target = if self.velocity.x > 0.0 {
            self.ball.center.y
        } else {
            HEIGHT / 2.0
        };
        let delta = (target - self.cpu.center().y).clamp(-CPU_SPEED, CPU_SPEED);
        self.cpu.position.y = (self.cpu.y() + delta).clamp(0.0, HEIGHT - PADDLE_HEIGHT);
    }

    /// Returns off a paddle speed the ball up and add spin by hit offset
    fn return_ball(&mut self, paddle: Rect, direction: f32) {
        let offset = (self.ball.center.y - paddle.center().y) / (PADDLE_HEIGHT / 2.0);
        let speed = (self.velocity.x.abs() * SPEEDUP).min(MAX_SPEED);
        self.velocity = Vector::new(speed * direction, self.velocity.y + offset * SPIN);
    }

    fn collide(&mut self) {
        if self.velocity.x < 0.0 && self.ball.intersects_rect(&self.player) {
            let paddle = self.player;
            self.return_ball(paddle, 1.0);
            self.ball.center.x = paddle.right() + BALL_RADIUS;
            self.score += 1;
        } else if self.velocity.x > 0.0 && self.ball.intersects_rect(&self.cpu) {
            let paddle = self.cpu;
            self.return_ball(paddle, -1.0);
            self.ball.center.x = paddle.left() - BALL_RADIUS;
        }
    }
}

impl Game for Pong {
    fn name(&self) -> &'static str {
        NAME
    }

    fn logical_size(&self) -> Size {
        Size::new(WIDTH, HEIGHT)
    }

    fn update(&mut self, keystate: &KeyState) {
        match self.status {
            GameStatus::Ready => {
                if keystate.any_pressed(&["Space", "ArrowUp", "ArrowDown"]) || keystate.clicked() {
                    self.status = GameStatus::Playing;
                    self.serve(-1.0);
                }
                return;
            }
            GameStatus::Playing => {}
            _ => return,
        }

        self.move_player(keystate);
        self.move_cpu();
        self.ball.center += self.velocity;
        let walls = Walls {
            top: true,
            bottom: true,
            ..Walls::default()
        };
        let bounds = Rect::from_xywh(0.0, 0.0, WIDTH, HEIGHT);
        bounce_inside(&mut self.ball, &mut self.velocity, &bounds, walls, 1.0);
        self.collide();

        if self.ball.center.x + BALL_RADIUS < 0.0 {
            self.misses += 1;
            if self.misses >= MISSES_ALLOWED {
                self.status = GameStatus::Lost;
            } else {
                self.serve(-1.0);
            }
        } else if self.ball.center.x - BALL_RADIUS > WIDTH {
            self.score += POINT_BONUS;
            self.serve(1.0);
        }
    }

    fn draw(&self, renderer: &Renderer) {
        let size = self.logical_size();
        draw_backdrop(renderer, size);
        renderer.line(
            Point::new(WIDTH / 2.0, 0.0),
            Point::new(WIDTH / 2.0, HEIGHT),
            palette::MUTED,
            2.0,
        );
        renderer.fill_rect(&self.player, palette::TEXT);
        renderer.fill_rect(&self.cpu, palette::TEXT);
        renderer.draw_logo(&self.ball.bounds());
        draw_score(renderer, &format!("Score: {}", self.score));
        renderer.text(
            &format!("Misses: {}/{}", self.misses, MISSES_ALLOWED),
            Point::new(WIDTH - 12.0, 18.0),
            16.0,
            palette::TEXT,
            TextAlign::Right,
        );
        if self.status == GameStatus::Ready {
            draw_prompt(renderer, size, "Space or click to serve");
        }
    }

    fn status(&self) -> GameStatus {
        self.status
    }

    fn score(&self) -> u32 {
        self.score
    }

    fn restart(&mut self) {
        self.player = paddle_at(PLAYER_X);
        self.cpu = paddle_at(CPU_X);
        self.ball = Circle::new(Point::new(WIDTH / 2.0, HEIGHT / 2.0), BALL_RADIUS);
        self.velocity = Vector::ZERO;
        self.last_pointer = None;
        self.misses = 0;
        self.score = 0;
        self.status = GameStatus::Ready;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::testing::{idle, tap};

    fn rally(center: Point, velocity: Vector) -> Pong {
        let mut pong = Pong::new(9);
        pong.status = GameStatus::Playing;
        pong.ball.center = center;
        pong.velocity = velocity;
        pong
    }

    #[test]
    fn serve_heads_for_the_player() {
        let mut pong = Pong::new(9);
        pong.update(&tap("Space"));
        assert_eq!(pong.status(), GameStatus::Playing);
        assert!(pong.velocity.x < 0.0);
    }

    #[test]
    fn returning_the_ball_scores_and_speeds_up() {
        let mut pong = rally(
            Point::new(PLAYER_X + PADDLE_WIDTH + BALL_RADIUS + 2.0, HEIGHT / 2.0),
            Vector::new(-SERVE_SPEED, 0.0),
        );
        pong.update(&KeyState::new());
        assert_eq!(pong.score(), 1);
        assert!(pong.velocity.x > SERVE_SPEED);
    }

    #[test]
    fn three_misses_lose() {
        let mut pong = rally(Point::new(5.0, 20.0), Vector::new(-SERVE_SPEED, 0.0));
        idle(&mut pong, 5);
        assert_eq!(pong.misses, 1);
        assert_eq!(pong.status(), GameStatus::Playing);
        for _ in 0..2 {
            pong.ball.center = Point::new(5.0, 20.0);
            pong.velocity = Vector::new(-SERVE_SPEED, 0.0);
            idle(&mut pong, 5);
        }
        assert_eq!(pong.status(), GameStatus::Lost);
        assert_eq!(pong.score(), 0);
    }

    #[test]
    fn beating_the_computer_is_worth_a_bonus() {
        let mut pong = rally(Point::new(WIDTH - 2.0, 20.0), Vector::new(SERVE_SPEED, 0.0));
        pong.cpu.position.y = HEIGHT - PADDLE_HEIGHT;
        idle(&mut pong, 5);
        assert_eq!(pong.score(), POINT_BONUS);
    }

    #[test]
    fn restart_centers_everything() {
        let mut pong = rally(Point::new(5.0, 20.0), Vector::new(-SERVE_SPEED, 0.0));
        idle(&mut pong, 5);
        pong.restart();
        assert_eq!(pong.player, paddle_at(PLAYER_X));
        assert_eq!(pong.ball.center, Point::new(300.0, 200.0));
        assert_eq!(pong.misses, 0);
        assert_eq!(pong.status(), GameStatus::Ready);
    }
}
