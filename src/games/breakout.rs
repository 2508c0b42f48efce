use crate::engine::input::KeyState;
use crate::engine::physics::{bounce_inside, resolve_circle_rect, Walls};
use crate::engine::{Circle, Game, GameStatus, Point, Rect, Renderer, Size, Vector};
use crate::games::{draw_backdrop, draw_prompt, draw_score, keys, palette};

pub const NAME: &str = "brickBreaker";

const WIDTH: f32 = 480.0;
const HEIGHT: f32 = 320.0;

const PADDLE_WIDTH: f32 = 75.0;
const PADDLE_HEIGHT: f32 = 10.0;
const PADDLE_Y: f32 = 300.0;
const PADDLE_SPEED: f32 = 7.0;

const BALL_RADIUS: f32 = 8.0;
const BALL_SPEED: f32 = 3.0;
/// Steepest launch off the paddle edge, in radians from vertical
const MAX_BOUNCE_ANGLE: f32 = std::f32::consts::FRAC_PI_3;

const BRICK_ROWS: usize = 5;
const BRICK_COLUMNS: usize = 8;
const BRICK_WIDTH: f32 = 50.0;
const BRICK_HEIGHT: f32 = 16.0;
const BRICK_PADDING: f32 = 6.0;
const BRICK_TOP: f32 = 40.0;
const BRICK_LEFT: f32 =
    (WIDTH - (BRICK_COLUMNS as f32 * BRICK_WIDTH + (BRICK_COLUMNS - 1) as f32 * BRICK_PADDING)) / 2.0;
const BRICK_POINTS: u32 = 10;
const LIVES: u32 = 3;

const ROW_COLORS: [&str; BRICK_ROWS] = ["#ff6b6b", "#f5a623", "#f8e71c", "#7ed957", "#4a90e2"];

#[derive(Debug, Clone)]
struct Brick {
    rect: Rect,
    row: usize,
    destroyed: bool,
}

fn wall() -> Vec<Brick> {
    (0..BRICK_ROWS)
        .flat_map(|row| {
            (0..BRICK_COLUMNS).map(move |column| Brick {
                rect: Rect::from_xywh(
                    BRICK_LEFT + column as f32 * (BRICK_WIDTH + BRICK_PADDING),
                    BRICK_TOP + row as f32 * (BRICK_HEIGHT + BRICK_PADDING),
                    BRICK_WIDTH,
                    BRICK_HEIGHT,
                ),
                row,
                destroyed: false,
            })
        })
        .collect()
}

/// Classic brick breaker. The ball rides on the paddle until it is served,
/// both at the start and after every lost life.
pub struct Breakout {
    paddle: Rect,
    ball: Circle,
    velocity: Vector,
    serving: bool,
    bricks: Vec<Brick>,
    last_pointer: Option<Point>,
    lives: u32,
    score: u32,
    status: GameStatus,
}

impl Breakout {
    pub fn new() -> Self {
        let mut breakout = Breakout {
            paddle: Rect::default(),
            ball: Circle::default(),
            velocity: Vector::ZERO,
            serving: true,
            bricks: Vec::new(),
            last_pointer: None,
            lives: LIVES,
            score: 0,
            status: GameStatus::Ready,
        };
        breakout.restart();
        breakout
    }

    fn serve_position(&self) -> Point {
        Point::new(self.paddle.center().x, PADDLE_Y - BALL_RADIUS - 2.0)
    }

    fn move_paddle(&mut self, keystate: &KeyState) {
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

    /// Bounce angle depends on where the ball meets the paddle
    fn hit_paddle(&mut self) {
        if self.velocity.y <= 0.0 || !self.ball.intersects_rect(&self.paddle) {
            return;
        }
        let offset = ((self.ball.center.x - self.paddle.center().x) / (PADDLE_WIDTH / 2.0))
            .clamp(-1.0, 1.0);
        let angle = offset * MAX_BOUNCE_ANGLE;
        let speed = self.velocity.length();
        self.velocity = Vector::new(speed * angle.sin(), -speed * angle.cos());
        self.ball.center.y = self.paddle.top() - BALL_RADIUS;
    }

    fn hit_brick(&mut self) {
        let ball = &mut self.ball;
        let velocity = &mut self.velocity;
        let hit = self
            .bricks
            .iter_mut()
            .filter(|brick| !brick.destroyed)
            .find(|brick| resolve_circle_rect(ball, velocity, &brick.rect, 1.0));
        if let Some(brick) = hit {
            brick.destroyed = true;
            self.score += BRICK_POINTS;
        }
    }

    fn lose_ball(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.status = GameStatus::Lost;
        } else {
            self.serving = true;
            self.velocity = Vector::ZERO;
            self.ball.center = self.serve_position();
        }
    }
}

impl Default for Breakout {
    fn default() -> Self {
        Breakout::new()
    }
}

impl Game for Breakout {
    fn name(&self) -> &'static str {
        NAME
    }

    fn logical_size(&self) -> Size {
        Size::new(WIDTH, HEIGHT)
    }

    fn update(&mut self, keystate: &KeyState) {
        if self.status.is_terminal() {
            return;
        }
        self.move_paddle(keystate);

        if self.serving {
            self.ball.center = self.serve_position();
            if keystate.any_pressed(&keys::ACTION) || keystate.clicked() {
                self.serving = false;
                self.status = GameStatus::Playing;
                self.velocity = Vector::new(BALL_SPEED, -BALL_SPEED);
            }
            return;
        }

        self.ball.center += self.velocity;
        let bounds = Rect::from_xywh(0.0, 0.0, WIDTH, HEIGHT);
        bounce_inside(&mut self.ball, &mut self.velocity, &bounds, Walls::OPEN_BOTTOM, 1.0);
        self.hit_paddle();
        self.hit_brick();

        if self.bricks.iter().all(|brick| brick.destroyed) {
            self.status = GameStatus::Won;
        } else if self.ball.center.y - BALL_RADIUS > HEIGHT {
            self.lose_ball();
        }
    }

    fn draw(&self, renderer: &Renderer) {
        let size = self.logical_size();
        draw_backdrop(renderer, size);
        for brick in self.bricks.iter().filter(|brick| !brick.destroyed) {
            renderer.fill_rect(&brick.rect, ROW_COLORS[brick.row]);
        }
        renderer.fill_rect(&self.paddle, palette::TEXT);
        renderer.draw_logo(&self.ball.bounds());
        draw_score(renderer, &format!("Score: {}   Lives: {}", self.score, self.lives));
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
        self.paddle = Rect::from_xywh(
            (WIDTH - PADDLE_WIDTH) / 2.0,
            PADDLE_Y,
            PADDLE_WIDTH,
            PADDLE_HEIGHT,
        );
        self.ball = Circle::new(self.serve_position(), BALL_RADIUS);
        self.velocity = Vector::ZERO;
        self.serving = true;
        self.bricks = wall();
        self.last_pointer = None;
        self.lives = LIVES;
        self.score = 0;
        self.status = GameStatus::Ready;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::testing::{idle, tap};
    use approx::assert_relative_eq;

    fn in_flight(center: Point, velocity: Vector) -> Breakout {
        let mut breakout = Breakout::new();
        breakout.serving = false;
        breakout.status = GameStatus::Playing;
        breakout.ball.center = center;
        breakout.velocity = velocity;
        breakout
    }

    #[test]
    fn wall_is_centered_five_by_eight() {
        let bricks = wall();
        assert_eq!(bricks.len(), 40);
        assert_relative_eq!(bricks[0].rect.left(), 19.0);
        assert_relative_eq!(bricks[7].rect.right(), WIDTH - 19.0);
    }

    #[test]
    fn serve_launches_up_and_right() {
        let mut breakout = Breakout::new();
        idle(&mut breakout, 30);
        assert_eq!(breakout.status(), GameStatus::Ready);
        breakout.update(&tap("Space"));
        assert_eq!(breakout.status(), GameStatus::Playing);
        assert!(breakout.velocity.y < 0.0 && breakout.velocity.x > 0.0);
    }

    #[test]
    fn breaking_a_brick_scores_ten_and_bounces() {
        let first = wall()[32].rect;
        let mut breakout = in_flight(
            Point::new(first.center().x, first.bottom() + 6.0),
            Vector::new(0.0, -3.0),
        );
        breakout.update(&KeyState::new());
        assert_eq!(breakout.score(), BRICK_POINTS);
        assert!(breakout.bricks[32].destroyed);
        assert!(breakout.velocity.y > 0.0);
    }

    #[test]
    fn paddle_sends_the_ball_back_up() {
        let mut breakout = Breakout::new();
        let center = breakout.paddle.center();
        breakout.serving = false;
        breakout.status = GameStatus::Playing;
        breakout.ball.center = Point::new(center.x, PADDLE_Y - BALL_RADIUS);
        breakout.velocity = Vector::new(0.0, 3.0);
        breakout.update(&KeyState::new());
        assert!(breakout.velocity.y < 0.0);
        assert_relative_eq!(breakout.velocity.length(), 3.0, epsilon = 1e-4);
    }

    #[test]
    fn three_missed_balls_lose() {
        let mut breakout = in_flight(Point::new(100.0, HEIGHT + 20.0), Vector::new(0.0, 3.0));
        breakout.update(&KeyState::new());
        assert_eq!(breakout.lives, 2);
        assert!(breakout.serving);
        for _ in 0..2 {
            breakout.serving = false;
            breakout.ball.center = Point::new(100.0, HEIGHT + 20.0);
            breakout.velocity = Vector::new(0.0, 3.0);
            breakout.update(&KeyState::new());
        }
        assert_eq!(breakout.status(), GameStatus::Lost);
    }

    #[test]
    fn last_brick_wins() {
        let mut breakout = in_flight(Point::new(240.0, 200.0), Vector::new(0.0, -3.0));
        for brick in breakout.bricks.iter_mut().skip(1) {
            brick.destroyed = true;
        }
        let first = breakout.bricks[0].rect;
        breakout.ball.center = Point::new(first.center().x, first.bottom() + 6.0);
        breakout.update(&KeyState::new());
        assert_eq!(breakout.status(), GameStatus::Won);
    }

    #[test]
    fn restart_rebuilds_the_wall() {
        let mut breakout = in_flight(Point::new(100.0, HEIGHT + 20.0), Vector::new(0.0, 3.0));
        breakout.bricks[0].destroyed = true;
        breakout.update(&KeyState::new());
        breakout.restart();
        assert!(breakout.bricks.iter().all(|brick| !brick.destroyed));
        assert_eq!(breakout.lives, LIVES);
        assert_eq!(breakout.paddle.x(), (WIDTH - PADDLE_WIDTH) / 2.0);
        assert_eq!(breakout.status(), GameStatus::Ready);
    }
}
