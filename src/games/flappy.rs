use crate::engine::input::KeyState;
use crate::engine::{Circle, Game, GameStatus, Point, Rect, Renderer, Size};
use crate::games::{draw_backdrop, draw_prompt, draw_score, keys, palette, rng};
use rand::rngs::SmallRng;
use rand::Rng;

pub const NAME: &str = "flappy";

const WIDTH: f32 = 400.0;
const HEIGHT: f32 = 600.0;
const GROUND_Y: f32 = 560.0;

const BIRD_X: f32 = 80.0;
const BIRD_START_Y: f32 = 300.0;
const BIRD_RADIUS: f32 = 12.0;
const GRAVITY: f32 = 0.45;
const FLAP_VELOCITY: f32 = -7.5;
const MAX_FALL: f32 = 10.0;

const PIPE_WIDTH: f32 = 60.0;
const PIPE_GAP: f32 = 150.0;
const PIPE_SPEED: f32 = 2.5;
/// Steps between two pipes
const PIPE_INTERVAL: u32 = 90;
const PIPE_MARGIN: f32 = 60.0;

#[derive(Debug, Clone, PartialEq)]
struct Pipe {
    x: f32,
    gap_top: f32,
    scored: bool,
}

impl Pipe {
    fn upper(&self) -> Rect {
        Rect::from_xywh(self.x, 0.0, PIPE_WIDTH, self.gap_top)
    }

    fn lower(&self) -> Rect {
        let top = self.gap_top + PIPE_GAP;
        Rect::from_xywh(self.x, top, PIPE_WIDTH, GROUND_Y - top)
    }
}

/// The bird hovers at its start height until the first flap. The ceiling
/// only stops it, the ground and the pipes end the run. One point per pipe
/// cleared.
pub struct Flappy {
    rng: SmallRng,
    bird: Circle,
    velocity: f32,
    pipes: Vec<Pipe>,
    spawn_timer: u32,
    score: u32,
    status: GameStatus,
}

impl Flappy {
    pub fn new(seed: u64) -> Self {
        let mut flappy = Flappy {
            rng: rng(seed),
            bird: Circle::default(),
            velocity: 0.0,
            pipes: Vec::new(),
            spawn_timer: 0,
            score: 0,
            status: GameStatus::Ready,
        };
        flappy.restart();
        flappy
    }

    fn spawn_pipe(&mut self) {
        let gap_top = self
            .rng
            .gen_range(PIPE_MARGIN..(GROUND_Y - PIPE_GAP - PIPE_MARGIN));
        self.pipes.push(Pipe {
            x: WIDTH,
            gap_top,
            scored: false,
        });
    }

    fn fly(&mut self, flap: bool) {
        if flap {
            self.velocity = FLAP_VELOCITY;
        }
        self.velocity = (self.velocity + GRAVITY).min(MAX_FALL);
        self.bird.center.y += self.velocity;
        if self.bird.center.y - BIRD_RADIUS < 0.0 {
            self.bird.center.y = BIRD_RADIUS;
            self.velocity = 0.0;
        }
    }

    fn move_pipes(&mut self) {
        self.spawn_timer += 1;
        if self.spawn_timer >= PIPE_INTERVAL {
            self.spawn_timer = 0;
            self.spawn_pipe();
        }
        for pipe in &mut self.pipes {
            pipe.x -= PIPE_SPEED;
            if !pipe.scored && pipe.x + PIPE_WIDTH < BIRD_X - BIRD_RADIUS {
                pipe.scored = true;
                self.score += 1;
            }
        }
        self.pipes.retain(|pipe| pipe.x + PIPE_WIDTH > 0.0);
    }

    fn crashed(&self) -> bool {
        self.bird.center.y + BIRD_RADIUS >= GROUND_Y
            || self.pipes.iter().any(|pipe| {
                self.bird.intersects_rect(&pipe.upper()) || self.bird.intersects_rect(&pipe.lower())
            })
    }
}

impl Game for Flappy {
    fn name(&self) -> &'static str {
        NAME
    }

    fn logical_size(&self) -> Size {
        Size::new(WIDTH, HEIGHT)
    }

    fn update(&mut self, keystate: &KeyState) {
        let flap = keystate.any_pressed(&keys::ACTION) || keystate.clicked();
        match self.status {
            GameStatus::Ready if flap => self.status = GameStatus::Playing,
            GameStatus::Playing => {}
            _ => return,
        }
        self.fly(flap);
        self.move_pipes();
        if self.crashed() {
            log::debug!("flappy crashed after {} pipes", self.score);
            self.status = GameStatus::Lost;
        }
    }

    fn draw(&self, renderer: &Renderer) {
        let size = self.logical_size();
        draw_backdrop(renderer, size);
        for pipe in &self.pipes {
            renderer.fill_rect(&pipe.upper(), palette::GOOD);
            renderer.fill_rect(&pipe.lower(), palette::GOOD);
        }
        renderer.fill_rect(
            &Rect::from_xywh(0.0, GROUND_Y, WIDTH, HEIGHT - GROUND_Y),
            palette::MUTED,
        );
        renderer.draw_logo(&self.bird.bounds());
        draw_score(renderer, &format!("Score: {}", self.score));
        if self.status == GameStatus::Ready {
            draw_prompt(renderer, size, "Space or click to flap");
        }
    }

    fn status(&self) -> GameStatus {
        self.status
    }

    fn score(&self) -> u32 {
        self.score
    }

    fn restart(&mut self) {
        self.bird = Circle::new(Point::new(BIRD_X, BIRD_START_Y), BIRD_RADIUS);
        self.velocity = 0.0;
        self.pipes.clear();
        self.spawn_timer = 0;
        self.score = 0;
        self.status = GameStatus::Ready;
    }
}
