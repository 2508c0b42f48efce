use crate::engine::input::KeyState;
use crate::engine::{Game, GameStatus, Rect, Renderer, Size, Vector};
use crate::games::{draw_backdrop, draw_score, keys, palette};

pub const NAME: &str = "towerBuilder";

const WIDTH: f32 = 400.0;
const HEIGHT: f32 = 600.0;

const BLOCK_HEIGHT: f32 = 30.0;
const BASE_WIDTH: f32 = 200.0;
const BASE: Rect = Rect::from_xywh((WIDTH - BASE_WIDTH) / 2.0, HEIGHT - BLOCK_HEIGHT, BASE_WIDTH, BLOCK_HEIGHT);
/// Drops closer than this to the block below snap into place
const PERFECT_TOLERANCE: f32 = 3.0;
const BASE_SPEED: f32 = 3.0;
const SPEED_STEP: f32 = 0.2;
const MAX_SPEED: f32 = 8.0;
/// The camera follows once the top of the tower climbs above this line
const CAMERA_LINE: f32 = 300.0;

const BLOCK_COLORS: [&str; 4] = ["#f5a623", "#7ed957", "#4a90e2", "#ff6b6b"];

/// The block slides back and forth above the tower; dropping it trims
/// whatever hangs over the edge. Missing the tower entirely ends the game.
/// One point per block placed.
pub struct TowerBuilder {
    tower: Vec<Rect>,
    mover: Rect,
    direction: f32,
    score: u32,
    status: GameStatus,
}

impl TowerBuilder {
    pub fn new() -> Self {
        let mut game = TowerBuilder {
            tower: Vec::new(),
            mover: Rect::default(),
            direction: 1.0,
            score: 0,
            status: GameStatus::Playing,
        };
        game.restart();
        game
    }

    fn top(&self) -> Rect {
        self.tower.last().copied().unwrap_or(BASE)
    }

    fn speed(&self) -> f32 {
        (BASE_SPEED + self.score as f32 * SPEED_STEP).min(MAX_SPEED)
    }

    /// Next block, starting at the left edge one row above the tower
    fn next_mover(&self) -> Rect {
        let top = self.top();
        Rect::from_xywh(0.0, top.top() - BLOCK_HEIGHT, top.size.width, BLOCK_HEIGHT)
    }

    fn slide(&mut self) {
        let limit = WIDTH - self.mover.size.width;
        let mut x = self.mover.x() + self.direction * self.speed();
        if x <= 0.0 {
            x = 0.0;
            self.direction = 1.0;
        } else if x >= limit {
            x = limit;
            self.direction = -1.0;
        }
        self.mover.position.x = x;
    }

    fn drop_block(&mut self) {
        let top = self.top();
        let mut left = self.mover.left().max(top.left());
        let mut right = self.mover.right().min(top.right());
        if right - left <= 0.0 {
            log::debug!("tower missed at height {}", self.score);
            self.status = GameStatus::Lost;
            return;
        }
        if (self.mover.left() - top.left()).abs() <= PERFECT_TOLERANCE {
            left = top.left();
            right = top.right();
        }
        self.tower.push(Rect::from_xywh(
            left,
            top.top() - BLOCK_HEIGHT,
            right - left,
            BLOCK_HEIGHT,
        ));
        self.score += 1;
        self.mover = self.next_mover();
        self.direction = 1.0;
    }

    /// How far the scene is shifted down so the top stays on screen
    fn camera(&self) -> f32 {
        (CAMERA_LINE - self.top().top()).max(0.0)
    }
}

impl Default for TowerBuilder {
    fn default() -> Self {
        TowerBuilder::new()
    }
}

impl Game for TowerBuilder {
    fn name(&self) -> &'static str {
        NAME
    }

    fn logical_size(&self) -> Size {
        Size::new(WIDTH, HEIGHT)
    }

    fn update(&mut self, keystate: &KeyState) {
        if self.status != GameStatus::Playing {
            return;
        }
        if keystate.any_pressed(&keys::ACTION) || keystate.clicked() {
            self.drop_block();
        } else {
            self.slide();
        }
    }

    fn draw(&self, renderer: &Renderer) {
        draw_backdrop(renderer, self.logical_size());
        let shift = Vector::new(0.0, self.camera());
        renderer.fill_rect(&BASE.translated(shift), palette::MUTED);
        for (i, block) in self.tower.iter().enumerate() {
            renderer.fill_rect(&block.translated(shift), BLOCK_COLORS[i % BLOCK_COLORS.len()]);
        }
        if self.status == GameStatus::Playing {
            let mover = self.mover.translated(shift);
            renderer.fill_rect(&mover, BLOCK_COLORS[self.tower.len() % BLOCK_COLORS.len()]);
            let badge = BLOCK_HEIGHT - 6.0;
            renderer.draw_logo(&Rect::from_xywh(
                mover.center().x - badge / 2.0,
                mover.y() + 3.0,
                badge,
                badge,
            ));
        }
        draw_score(renderer, &format!("Height: {}", self.score));
    }

    fn status(&self) -> GameStatus {
        self.status
    }

    fn score(&self) -> u32 {
        self.score
    }

    fn restart(&mut self) {
        self.tower.clear();
        self.score = 0;
        self.direction = 1.0;
        self.status = GameStatus::Playing;
        self.mover = self.next_mover();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::testing::tap;
    use approx::assert_relative_eq;

    #[test]
    fn block_starts_left_above_the_base() {
        let game = TowerBuilder::new();
        assert_eq!(game.mover, Rect::from_xywh(0.0, HEIGHT - 60.0, BASE_WIDTH, BLOCK_HEIGHT));
    }

    #[test]
    fn mover_bounces_between_walls() {
        let mut game = TowerBuilder::new();
        for _ in 0..100 {
            game.update(&KeyState::new());
            assert!(game.mover.left() >= 0.0 && game.mover.right() <= WIDTH);
        }
        assert_eq!(game.direction, -1.0);
    }

    #[test]
    fn overhang_is_trimmed() {
        let mut game = TowerBuilder::new();
        game.mover.position.x = BASE.left() + 50.0;
        game.update(&tap("Space"));
        assert_eq!(game.score(), 1);
        let placed = game.tower[0];
        assert_relative_eq!(placed.left(), BASE.left() + 50.0);
        assert_relative_eq!(placed.size.width, BASE_WIDTH - 50.0);
        assert_relative_eq!(game.mover.size.width, BASE_WIDTH - 50.0);
    }

    #[test]
    fn near_perfect_drops_snap() {
        let mut game = TowerBuilder::new();
        game.mover.position.x = BASE.left() + 2.0;
        game.update(&tap("Space"));
        assert_eq!(game.tower[0].left(), BASE.left());
        assert_eq!(game.tower[0].size.width, BASE_WIDTH);
    }

    #[test]
    fn missing_the_tower_loses() {
        let mut game = TowerBuilder::new();
        game.mover.position.x = BASE.left() + 60.0;
        game.update(&tap("Space"));
        game.mover.position.x = 0.0;
        game.mover.size.width = 40.0;
        game.update(&tap("Space"));
        assert_eq!(game.status(), GameStatus::Lost);
        assert_eq!(game.score(), 1);
    }

    #[test]
    fn camera_follows_tall_towers() {
        let mut game = TowerBuilder::new();
        for _ in 0..12 {
            game.mover.position.x = game.top().left();
            game.update(&tap("Space"));
        }
        assert_eq!(game.score(), 12);
        assert!(game.camera() > 0.0);
    }

    #[test]
    fn restart_clears_the_tower() {
        let mut game = TowerBuilder::new();
        game.mover.position.x = BASE.left();
        game.update(&tap("Space"));
        game.restart();
        assert!(game.tower.is_empty());
        assert_eq!(game.top(), BASE);
        assert_eq!(game.mover.x(), 0.0);
        assert_eq!(game.score(), 0);
    }
}
