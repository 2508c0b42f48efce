use crate::engine::input::KeyState;
use crate::engine::physics::{bounce_inside, integrate, resolve_circle_segment, Walls};
use crate::engine::{Circle, Game, GameStatus, Point, Rect, Renderer, Segment, Size, TextAlign, Vector};
use crate::games::{draw_backdrop, draw_prompt, draw_score, palette, rng};
use rand::rngs::SmallRng;
use rand::Rng;

pub const NAME: &str = "pinball";

const WIDTH: f32 = 400.0;
const HEIGHT: f32 = 600.0;

const BALL_RADIUS: f32 = 8.0;
const BALL_START: Point = Point::new(200.0, 80.0);
const GRAVITY: f32 = 0.18;
const MAX_SPEED: f32 = 12.0;
const WALL_DAMPING: f32 = 0.85;
const BALLS: u32 = 3;

const BUMPER_POINTS: u32 = 100;
const BUMPER_KICK: f32 = 2.0;
const BUMPERS: [(f32, f32, f32); 3] = [(120.0, 200.0, 22.0), (280.0, 200.0, 22.0), (200.0, 300.0, 26.0)];

const FLIPPER_LENGTH: f32 = 80.0;
const FLIPPER_Y: f32 = 520.0;
const LEFT_PIVOT_X: f32 = 110.0;
const RIGHT_PIVOT_X: f32 = 290.0;
/// Rest and raised angle below/above horizontal, in radians
const FLIPPER_TILT: f32 = 0.436;
const FLIPPER_KICK: f32 = 4.0;
const LEFT_FLIPPER_KEYS: [&str; 2] = ["ArrowLeft", "KeyZ"];
const RIGHT_FLIPPER_KEYS: [&str; 2] = ["ArrowRight", "Slash"];

/// Slanted walls funnelling the ball onto the flippers
const GUIDES: [(Point, Point); 2] = [
    (Point::new(0.0, 440.0), Point::new(LEFT_PIVOT_X, FLIPPER_Y)),
    (Point::new(WIDTH, 440.0), Point::new(RIGHT_PIVOT_X, FLIPPER_Y)),
];

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

fn flipper(side: Side, raised: bool) -> Segment {
    let tilt = if raised { -FLIPPER_TILT } else { FLIPPER_TILT };
    let (pivot_x, angle) = match side {
        Side::Left => (LEFT_PIVOT_X, tilt),
        Side::Right => (RIGHT_PIVOT_X, std::f32::consts::PI - tilt),
    };
    let pivot = Point::new(pivot_x, FLIPPER_Y);
    Segment::new(
        pivot,
        pivot + Vector::new(angle.cos(), angle.sin()) * FLIPPER_LENGTH,
    )
}

fn bumpers() -> impl Iterator<Item = Circle> {
    BUMPERS
        .iter()
        .map(|&(x, y, r)| Circle::new(Point::new(x, y), r))
}

/// ELI5:
/// ┌──────────── Pinball step ─────────────┐
/// │ gravity ─► walls ─► bumpers (+100)     │
/// │         ─► guides ─► flippers (kick)   │
/// │         ─► speed cap ─► drain check    │
/// └────────────────────────────────────────┘
///
/// The ball is dropped from the top on Space. Three balls per game.
pub struct Pinball {
    rng: SmallRng,
    ball: Circle,
    velocity: Vector,
    left_raised: bool,
    right_raised: bool,
    waiting: bool,
    balls: u32,
    score: u32,
    status: GameStatus,
}

impl Pinball {
    pub fn new(seed: u64) -> Self {
        let mut pinball = Pinball {
            rng: rng(seed),
            ball: Circle::new(BALL_START, BALL_RADIUS),
            velocity: Vector::ZERO,
            left_raised: false,
            right_raised: false,
            waiting: true,
            balls: BALLS,
            score: 0,
            status: GameStatus::Ready,
        };
        pinball.restart();
        pinball
    }

    fn launch(&mut self) {
        self.waiting = false;
        self.velocity = Vector::new(self.rng.gen_range(-1.5..1.5), 0.0);
    }

    fn hit_bumpers(&mut self) {
        for bumper in bumpers() {
            let offset = self.ball.center - bumper.center;
            if !self.ball.intersects_circle(&bumper) || offset.length() == 0.0 {
                continue;
            }
            let normal = offset.normalized();
            self.ball.center = bumper.center + normal * (bumper.radius + self.ball.radius);
            let speed = self.velocity.length().max(3.0);
            self.velocity = normal * (speed + BUMPER_KICK);
            self.score += BUMPER_POINTS;
        }
    }

    fn hit_segments(&mut self) {
        for (start, end) in GUIDES {
            resolve_circle_segment(
                &mut self.ball,
                &mut self.velocity,
                &Segment::new(start, end),
                WALL_DAMPING,
                0.0,
            );
        }
        for (side, raised) in [(Side::Left, self.left_raised), (Side::Right, self.right_raised)] {
            let impulse = if raised { FLIPPER_KICK } else { 0.0 };
            resolve_circle_segment(
                &mut self.ball,
                &mut self.velocity,
                &flipper(side, raised),
                WALL_DAMPING,
                impulse,
            );
        }
    }

    fn drain(&mut self) {
        self.balls = self.balls.saturating_sub(1);
        if self.balls == 0 {
            self.status = GameStatus::Lost;
        } else {
            self.ball.center = BALL_START;
            self.velocity = Vector::ZERO;
            self.waiting = true;
        }
    }
}

impl Game for Pinball {
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
        self.left_raised = keystate.any_held(&LEFT_FLIPPER_KEYS);
        self.right_raised = keystate.any_held(&RIGHT_FLIPPER_KEYS);

        if self.waiting {
            if keystate.was_pressed("Space") || keystate.clicked() {
                self.status = GameStatus::Playing;
                self.launch();
            }
            return;
        }

        integrate(&mut self.ball.center, &mut self.velocity, GRAVITY);
        let bounds = Rect::from_xywh(0.0, 0.0, WIDTH, HEIGHT);
        bounce_inside(
            &mut self.ball,
            &mut self.velocity,
            &bounds,
            Walls::OPEN_BOTTOM,
            WALL_DAMPING,
        );
        self.hit_bumpers();
        self.hit_segments();
        if self.velocity.length() > MAX_SPEED {
            self.velocity = self.velocity.normalized() * MAX_SPEED;
        }
        if self.ball.center.y - BALL_RADIUS > HEIGHT {
            self.drain();
        }
    }

    fn draw(&self, renderer: &Renderer) {
        let size = self.logical_size();
        draw_backdrop(renderer, size);
        for bumper in bumpers() {
            renderer.fill_circle(&bumper, palette::ACCENT);
            renderer.draw_logo(&Circle::new(bumper.center, bumper.radius * 0.7).bounds());
        }
        for (start, end) in GUIDES {
            renderer.line(start, end, palette::MUTED, 4.0);
        }
        for (side, raised) in [(Side::Left, self.left_raised), (Side::Right, self.right_raised)] {
            let segment = flipper(side, raised);
            renderer.line(segment.start, segment.end, palette::TEXT, 8.0);
        }
        renderer.fill_circle(&self.ball, palette::TEXT);
        draw_score(renderer, &format!("Score: {}", self.score));
        renderer.text(
            &format!("Balls: {}", self.balls),
            Point::new(WIDTH - 12.0, 18.0),
            16.0,
            palette::TEXT,
            TextAlign::Right,
        );
        if self.waiting && !self.status.is_terminal() {
            draw_prompt(renderer, size, "Space to drop the ball");
        }
    }

    fn status(&self) -> GameStatus {
        self.status
    }

    fn score(&self) -> u32 {
        self.score
    }

    fn restart(&mut self) {
        self.ball = Circle::new(BALL_START, BALL_RADIUS);
        self.velocity = Vector::ZERO;
        self.left_raised = false;
        self.right_raised = false;
        self.waiting = true;
        self.balls = BALLS;
        self.score = 0;
        self.status = GameStatus::Ready;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::testing::{hold, idle, tap};

    fn rolling(center: Point, velocity: Vector) -> Pinball {
        let mut pinball = Pinball::new(4);
        pinball.waiting = false;
        pinball.status = GameStatus::Playing;
        pinball.ball.center = center;
        pinball.velocity = velocity;
        pinball
    }

    #[test]
    fn ball_waits_for_space() {
        let mut pinball = Pinball::new(4);
        idle(&mut pinball, 30);
        assert_eq!(pinball.ball.center, BALL_START);
        pinball.update(&tap("Space"));
        assert_eq!(pinball.status(), GameStatus::Playing);
        idle(&mut pinball, 5);
        assert!(pinball.ball.center.y > BALL_START.y);
    }

    #[test]
    fn bumpers_score_and_push_away() {
        let mut pinball = rolling(Point::new(120.0, 171.0), Vector::new(0.0, 2.0));
        pinball.update(&KeyState::new());
        assert_eq!(pinball.score(), BUMPER_POINTS);
        assert!(pinball.velocity.y < 0.0);
        let gap = pinball.ball.center.distance_to(Point::new(120.0, 200.0));
        assert!(gap >= 30.0 - 1e-3);
    }

    #[test]
    fn raised_flipper_kicks_the_ball_up() {
        let raised = flipper(Side::Left, true);
        let middle = raised.start + (raised.end - raised.start) * 0.5;
        let mut pinball = rolling(middle + Vector::new(0.0, -7.0), Vector::new(0.0, 1.0));
        pinball.update(&hold("ArrowLeft"));
        assert!(pinball.left_raised);
        assert!(pinball.velocity.y < 0.0);
    }

    #[test]
    fn flippers_mirror_each_other() {
        let left = flipper(Side::Left, false);
        let right = flipper(Side::Right, false);
        assert!((left.end.y - right.end.y).abs() < 1e-3);
        assert!(((left.end.x - LEFT_PIVOT_X) + (right.end.x - RIGHT_PIVOT_X)).abs() < 1e-3);
        // the ball fits between resting tips
        assert!(right.end.x - left.end.x > BALL_RADIUS * 2.0);
    }

    #[test]
    fn three_drains_end_the_game() {
        for drained in 1..=BALLS {
            let mut pinball = rolling(Point::new(200.0, HEIGHT + 20.0), Vector::new(0.0, 2.0));
            pinball.balls = BALLS - drained + 1;
            pinball.update(&KeyState::new());
            if drained < BALLS {
                assert!(pinball.waiting);
                assert_eq!(pinball.ball.center, BALL_START);
            } else {
                assert_eq!(pinball.status(), GameStatus::Lost);
            }
        }
    }

    #[test]
    fn restart_returns_all_balls() {
        let mut pinball = rolling(Point::new(200.0, HEIGHT + 20.0), Vector::new(0.0, 2.0));
        pinball.score = 300;
        pinball.update(&KeyState::new());
        pinball.restart();
        assert_eq!(pinball.balls, BALLS);
        assert_eq!(pinball.ball.center, BALL_START);
        assert_eq!(pinball.score(), 0);
        assert_eq!(pinball.status(), GameStatus::Ready);
    }
}
