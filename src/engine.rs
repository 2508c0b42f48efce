use crate::browser::{self, Listener};
use anyhow::{anyhow, Error, Result};
// ELI5: web assembly is a single threaded environment, so Rc RefCell > Mutex
use futures::channel::oneshot::channel;
use std::cell::{Cell, RefCell};
use std::f64::consts::TAU;
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

pub mod geometry;
pub mod input;
pub mod physics;
pub mod viewport;

pub use geometry::{Circle, Point, Rect, Segment, Size, Vector};
use input::{InputListeners, KeyState};
use viewport::Viewport;

/// TABLE
/// ┌──────────┬───────────────┬───────────────────────────────────────┐
/// │ status   │ loop steps it │ meaning                               │
/// ├──────────┼───────────────┼───────────────────────────────────────┤
/// │ Ready    │ yes           │ waiting for the first input           │
/// │ Playing  │ yes           │ simulation running                    │
/// │ Won      │ no (terminal) │ goal reached, score is final          │
/// │ Lost     │ no (terminal) │ player died / ran out of lives        │
/// └──────────┴───────────────┴───────────────────────────────────────┘
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameStatus {
    Ready,
    Playing,
    Won,
    Lost,
}

impl GameStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameStatus::Won | GameStatus::Lost)
    }
}

/// A minigame plugged into the shared loop.
///
/// `update` runs once per fixed step (1/60 s) and must not draw; `draw`
/// repaints the whole scene in logical coordinates.
pub trait Game {
    /// key used for score storage and the remote leaderboard
    fn name(&self) -> &'static str;
    fn logical_size(&self) -> Size;
    fn update(&mut self, keystate: &KeyState);
    fn draw(&self, renderer: &Renderer);
    fn status(&self) -> GameStatus;
    fn score(&self) -> u32;
    /// back to the documented initial state, score 0
    fn restart(&mut self);
    /// Games reading typed letters keep every letter key to themselves, so
    /// the session pauses them on `Escape` instead of `KeyP`.
    fn captures_text(&self) -> bool {
        false
    }
}

/// What the animation frame drives. `Session` is the only production
/// implementation; kept as a trait so the loop never sees scores or panels.
pub trait FrameRunner {
    fn logical_size(&self) -> Size;
    /// true while simulation time should not accumulate (paused, game over)
    fn is_suspended(&self) -> bool;
    fn frame(&mut self, steps: u32, keystate: &mut KeyState);
    fn draw(&self, renderer: &Renderer);
}

// length of a frame in milliseconds
const FRAME_SIZE: f32 = 1.0 / 60.0 * 1000.0;
// after a backgrounded tab comes back, drop the backlog instead of replaying it
const MAX_STEPS_PER_FRAME: u32 = 5;

/// Fixed timestep accumulator
#[derive(Debug)]
pub struct GameLoop {
    last_frame: f64,
    accumulated_delta: f32,
}

type SharedLoopClosure = Rc<RefCell<Option<browser::LoopClosure>>>;

impl GameLoop {
    pub fn new(now: f64) -> Self {
        GameLoop {
            last_frame: now,
            accumulated_delta: 0.0,
        }
    }

    /// Number of simulation steps owed at time `perf` (ms)
    pub fn advance(&mut self, perf: f64) -> u32 {
        self.accumulated_delta += (perf - self.last_frame) as f32;
        self.last_frame = perf;
        let mut steps = 0;
        while self.accumulated_delta > FRAME_SIZE {
            self.accumulated_delta -= FRAME_SIZE;
            steps += 1;
            if steps == MAX_STEPS_PER_FRAME {
                self.accumulated_delta = 0.0;
                break;
            }
        }
        steps
    }

    /// Forget any accumulated time, e.g. while paused
    pub fn resync(&mut self, perf: f64) {
        self.last_frame = perf;
        self.accumulated_delta = 0.0;
    }

    /// Starts driving `runner` from `requestAnimationFrame`.
    ///
    /// ┌──────────── every animation frame ────────────┐
    /// │ resized? -> refit canvas + viewport           │
    /// │ drain input channel -> KeyState               │
    /// │ suspended? -> resync clock, 0 steps           │
    /// │          : -> accumulate, N fixed steps       │
    /// │ runner.frame(N) -> runner.draw()              │
    /// │ request next frame                            │
    /// └───────────────────────────────────────────────┘
    /// The loop runs until the returned handle is dropped.
    pub fn start(
        runner: impl FrameRunner + 'static,
        canvas: HtmlCanvasElement,
        logo: Option<HtmlImageElement>,
        canvas_fraction: f32,
    ) -> Result<LoopHandle> {
        let mut runner = runner;
        let logical = runner.logical_size();
        let (mut receiver, input_listeners) = input::prepare_input(&canvas)?;
        let renderer = Renderer::new(browser::context(&canvas)?, logo);
        let mut keystate = KeyState::new();
        let mut game_loop = GameLoop::new(browser::now()?);
        let mut viewport = Viewport::identity(logical);

        // resize events only mark the canvas dirty, the next frame refits once
        let resized = Rc::new(Cell::new(true));
        let resize_flag = resized.clone();
        let window = browser::window()?;
        let resize_listener = browser::listen(
            &window,
            "resize",
            move |_: web_sys::Event| resize_flag.set(true),
        )?;

        let frame_id = Rc::new(Cell::new(None));
        let next_frame = frame_id.clone();
        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |perf: f64| {
            if resized.replace(false) {
                match fit_canvas(&canvas, logical, canvas_fraction) {
                    Ok(fitted) => viewport = fitted,
                    Err(err) => log::warn!("Keeping previous canvas size: {:#}", err),
                }
            }
            input::process_input(&mut keystate, &mut receiver, &viewport);

            let steps = if runner.is_suspended() {
                game_loop.resync(perf);
                0
            } else {
                game_loop.advance(perf)
            };
            runner.frame(steps, &mut keystate);

            renderer.begin_frame(&viewport);
            runner.draw(&renderer);

            if let Some(closure) = f.borrow().as_ref() {
                next_frame.set(browser::request_animation_frame(closure).ok());
            }
        }));

        let first = browser::request_animation_frame(
            g.borrow()
                .as_ref()
                .ok_or_else(|| anyhow!("GameLoop: Loop is None"))?,
        )?;
        frame_id.set(Some(first));

        Ok(LoopHandle {
            closure: g,
            frame_id,
            _input: input_listeners,
            _resize: resize_listener,
        })
    }
}

/// Mounted loop. Dropping it is the unmount: the pending frame is
/// cancelled, listeners are detached and the closure (which owns the
/// runner) is released.
pub struct LoopHandle {
    closure: SharedLoopClosure,
    frame_id: Rc<Cell<Option<i32>>>,
    _input: InputListeners,
    _resize: Listener,
}

impl Drop for LoopHandle {
    fn drop(&mut self) {
        if let Some(id) = self.frame_id.take() {
            if let Err(err) = browser::cancel_animation_frame(id) {
                log::warn!("{:#}", err);
            }
        }
        // the closure holds a clone of its own cell, taking it breaks the cycle
        self.closure.borrow_mut().take();
    }
}

fn fit_canvas(canvas: &HtmlCanvasElement, logical: Size, fraction: f32) -> Result<Viewport> {
    let (width, height) = browser::inner_size()?;
    let viewport = Viewport::fit(logical, width, height * fraction, fraction);
    canvas.set_width(viewport.display().width.round() as u32);
    canvas.set_height(viewport.display().height.round() as u32);
    Ok(viewport)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    fn as_str(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

pub struct Renderer {
    context: CanvasRenderingContext2d,
    logo: Option<HtmlImageElement>,
}

impl Renderer {
    pub fn new(context: CanvasRenderingContext2d, logo: Option<HtmlImageElement>) -> Self {
        Renderer { context, logo }
    }

    /// Scale logical coordinates onto the canvas and wipe it
    pub fn begin_frame(&self, viewport: &Viewport) {
        let scale = viewport.scale() as f64;
        report(self.context.set_transform(scale, 0.0, 0.0, scale, 0.0, 0.0));
        let logical = viewport.logical();
        self.clear(&Rect::new(Point::default(), logical));
    }

    pub fn clear(&self, rect: &Rect) {
        self.context.clear_rect(
            rect.x().into(),
            rect.y().into(),
            rect.size.width.into(),
            rect.size.height.into(),
        );
    }

    pub fn fill_rect(&self, rect: &Rect, color: &str) {
        self.context.set_fill_style_str(color);
        self.context.fill_rect(
            rect.x().into(),
            rect.y().into(),
            rect.size.width.into(),
            rect.size.height.into(),
        );
    }

    pub fn stroke_rect(&self, rect: &Rect, color: &str, line_width: f32) {
        self.context.set_stroke_style_str(color);
        self.context.set_line_width(line_width.into());
        self.context.stroke_rect(
            rect.x().into(),
            rect.y().into(),
            rect.size.width.into(),
            rect.size.height.into(),
        );
    }

    pub fn fill_circle(&self, circle: &Circle, color: &str) {
        self.context.set_fill_style_str(color);
        self.context.begin_path();
        report(self.context.arc(
            circle.center.x.into(),
            circle.center.y.into(),
            circle.radius.into(),
            0.0,
            TAU,
        ));
        self.context.fill();
    }

    pub fn line(&self, from: Point, to: Point, color: &str, width: f32) {
        self.context.set_stroke_style_str(color);
        self.context.set_line_width(width.into());
        self.context.begin_path();
        self.context.move_to(from.x.into(), from.y.into());
        self.context.line_to(to.x.into(), to.y.into());
        self.context.stroke();
    }

    pub fn text(&self, text: &str, position: Point, size: f32, color: &str, align: TextAlign) {
        self.context.set_fill_style_str(color);
        self.context.set_font(&format!("bold {}px sans-serif", size));
        self.context.set_text_align(align.as_str());
        self.context.set_text_baseline("middle");
        report(
            self.context
                .fill_text(text, position.x.into(), position.y.into()),
        );
    }

    /// Community logo sprite, or a drawn badge when the image never loaded
    pub fn draw_logo(&self, rect: &Rect) {
        match &self.logo {
            Some(image) => report(
                self.context
                    .draw_image_with_html_image_element_and_dw_and_dh(
                        image,
                        rect.x().into(),
                        rect.y().into(),
                        rect.size.width.into(),
                        rect.size.height.into(),
                    ),
            ),
            None => {
                let radius = rect.size.width.min(rect.size.height) * 0.5;
                self.fill_circle(&Circle::new(rect.center(), radius), "#f5a623");
                self.fill_circle(&Circle::new(rect.center(), radius * 0.55), "#1d1d3b");
            }
        }
    }
}

// canvas calls only throw on invalid arguments, which a frame can't recover from
fn report(result: Result<(), JsValue>) {
    if let Err(err) = result {
        log::debug!("canvas call failed: {:?}", err);
    }
}

/// Asynchronously load an image from a given source path
/// # Arguments
/// * `source` - string slice to path/url
/// # Returns
/// * `Ok(HtmlImageElement)` - on load success
/// * `Err` - on load fail
pub async fn load_image(source: &str) -> Result<HtmlImageElement> {
    let image = browser::new_image()?;
    let (tx, rx) = channel::<Result<(), Error>>();
    let success_tx = Rc::new(RefCell::new(Some(tx)));
    let error_tx = success_tx.clone();

    let success_callback = browser::closure_once(move || {
        if let Some(tx) = success_tx.borrow_mut().take() {
            let _ = tx.send(Ok(()));
        }
    });

    let source_name = source.to_string();
    let error_callback = browser::closure_once(move |err: JsValue| {
        if let Some(tx) = error_tx.borrow_mut().take() {
            let _ = tx.send(Err(anyhow!(
                "[engine.rs::load_image] Error loading image {}: {:#?}",
                source_name,
                err
            )));
        }
    });

    image.set_onload(Some(success_callback.as_ref().unchecked_ref()));
    image.set_onerror(Some(error_callback.as_ref().unchecked_ref()));
    image.set_src(source);

    // keep callback alive until image is loaded or errors
    success_callback.forget();
    error_callback.forget();

    // ?? - Result<Result<(), Error>, oneshot::Canceled>
    // - first ? yields the channel result
    // - second ? yields the image load result
    rx.await??;

    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_frame_of_time_runs_one_step() {
        let mut clock = GameLoop::new(0.0);
        assert_eq!(clock.advance(17.0), 1);
        assert_eq!(clock.advance(57.0), 2);
    }

    #[test]
    fn short_frames_accumulate() {
        let mut clock = GameLoop::new(0.0);
        assert_eq!(clock.advance(10.0), 0);
        assert_eq!(clock.advance(20.0), 1);
    }

    #[test]
    fn backlog_is_capped_and_dropped() {
        let mut clock = GameLoop::new(0.0);
        assert_eq!(clock.advance(5_000.0), MAX_STEPS_PER_FRAME);
        assert_eq!(clock.advance(5_010.0), 0);
    }

    #[test]
    fn resync_discards_paused_time() {
        let mut clock = GameLoop::new(0.0);
        clock.advance(10.0);
        clock.resync(2_000.0);
        assert_eq!(clock.advance(2_010.0), 0);
    }

    #[test]
    fn only_won_and_lost_are_terminal() {
        assert!(GameStatus::Won.is_terminal());
        assert!(GameStatus::Lost.is_terminal());
        assert!(!GameStatus::Ready.is_terminal());
        assert!(!GameStatus::Playing.is_terminal());
    }
}
