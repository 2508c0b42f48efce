use crate::browser::{self, Listener};
use crate::engine::geometry::Point;
use crate::engine::viewport::Viewport;
use anyhow::Result;
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use std::collections::HashSet;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, KeyboardEvent, PointerEvent};

/// Keys whose browser default (page scrolling) is swallowed while a game
/// is mounted
const CAPTURED_KEYS: [&str; 5] = ["ArrowUp", "ArrowDown", "ArrowLeft", "ArrowRight", "Space"];

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Click {
    pub position: Point,
    pub button: PointerButton,
}

/// Raw input, in the order the browser delivered it.
/// Pointer positions are canvas-relative CSS pixels until `process_input`
/// maps them into logical space.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    KeyDown { code: String, key: String },
    KeyUp { code: String },
    PointerDown { position: Point, button: PointerButton },
    PointerMove(Point),
    PointerUp,
}

/// TABLE
/// ┌──────────────┬──────────────────────────────┬──────────────────────┐
/// │ field        │ meaning                      │ cleared              │
/// ├──────────────┼──────────────────────────────┼──────────────────────┤
/// │ held         │ key is down right now        │ on keyup             │
/// │ pressed      │ key went down this frame     │ clear_edges()        │
/// │ typed        │ printable chars this frame   │ clear_edges()        │
/// │ clicks       │ pointer downs this frame     │ clear_edges()        │
/// │ pointer      │ last known pointer position  │ never                │
/// └──────────────┴──────────────────────────────┴──────────────────────┘
#[derive(Debug, Default)]
pub struct KeyState {
    held: HashSet<String>,
    pressed: HashSet<String>,
    typed: Vec<char>,
    pointer: Option<Point>,
    pointer_down: bool,
    clicks: Vec<Click>,
}

impl KeyState {
    pub fn new() -> Self {
        KeyState::default()
    }

    pub fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyDown { code, key } => {
                let mut chars = key.chars();
                if let (Some(c), None) = (chars.next(), chars.next()) {
                    self.typed.push(c);
                }
                if self.held.insert(code.clone()) {
                    self.pressed.insert(code);
                }
            }
            InputEvent::KeyUp { code } => {
                self.held.remove(&code);
            }
            InputEvent::PointerDown { position, button } => {
                self.pointer = Some(position);
                self.pointer_down = true;
                self.clicks.push(Click { position, button });
            }
            InputEvent::PointerMove(position) => self.pointer = Some(position),
            InputEvent::PointerUp => self.pointer_down = false,
        }
    }

    /// Key is being held down
    pub fn is_pressed(&self, code: &str) -> bool {
        self.held.contains(code)
    }

    /// Key went down since the last `clear_edges`
    pub fn was_pressed(&self, code: &str) -> bool {
        self.pressed.contains(code)
    }

    pub fn any_pressed(&self, codes: &[&str]) -> bool {
        codes.iter().any(|code| self.was_pressed(code))
    }

    pub fn any_held(&self, codes: &[&str]) -> bool {
        codes.iter().any(|code| self.is_pressed(code))
    }

    pub fn typed(&self) -> &[char] {
        &self.typed
    }

    pub fn pointer(&self) -> Option<Point> {
        self.pointer
    }

    pub fn is_pointer_down(&self) -> bool {
        self.pointer_down
    }

    pub fn clicks(&self) -> &[Click] {
        &self.clicks
    }

    pub fn clicked(&self) -> bool {
        !self.clicks.is_empty()
    }

    /// Drops edge-triggered input once a simulation step has seen it
    pub fn clear_edges(&mut self) {
        self.pressed.clear();
        self.typed.clear();
        self.clicks.clear();
    }
}

/// Listener guards for the input channel. Dropping this detaches every
/// handler from the page.
pub struct InputListeners {
    _listeners: Vec<Listener>,
}

/// Wires keyboard and pointer handlers into an unbounded channel so the
/// frame callback can drain them at its own pace.
pub fn prepare_input(canvas: &HtmlCanvasElement) -> Result<(UnboundedReceiver<InputEvent>, InputListeners)> {
    let (sender, receiver) = unbounded::<InputEvent>();
    let window = browser::window()?;

    let keydown_tx = sender.clone();
    let keydown = browser::listen(&window, "keydown", move |event: KeyboardEvent| {
        let code = event.code();
        if CAPTURED_KEYS.contains(&code.as_str()) {
            event.prevent_default();
        }
        send(&keydown_tx, InputEvent::KeyDown { code, key: event.key() });
    })?;

    let keyup_tx = sender.clone();
    let keyup = browser::listen(&window, "keyup", move |event: KeyboardEvent| {
        send(&keyup_tx, InputEvent::KeyUp { code: event.code() });
    })?;

    let down_tx = sender.clone();
    let pointer_down = browser::listen(canvas, "pointerdown", move |event: PointerEvent| {
        let button = if event.button() == 2 {
            PointerButton::Secondary
        } else {
            PointerButton::Primary
        };
        send(
            &down_tx,
            InputEvent::PointerDown {
                position: offset(&event),
                button,
            },
        );
    })?;

    let move_tx = sender.clone();
    let pointer_move = browser::listen(canvas, "pointermove", move |event: PointerEvent| {
        send(&move_tx, InputEvent::PointerMove(offset(&event)));
    })?;

    let up_tx = sender;
    let pointer_up = browser::listen(canvas, "pointerup", move |_: PointerEvent| {
        send(&up_tx, InputEvent::PointerUp);
    })?;

    // right click flags mines instead of opening the browser menu
    let context_menu = browser::listen(canvas, "contextmenu", |event: web_sys::Event| {
        event.prevent_default();
    })?;

    Ok((
        receiver,
        InputListeners {
            _listeners: vec![keydown, keyup, pointer_down, pointer_move, pointer_up, context_menu],
        },
    ))
}

/// Drains everything queued since the last frame into `keystate`
pub fn process_input(
    keystate: &mut KeyState,
    receiver: &mut UnboundedReceiver<InputEvent>,
    viewport: &Viewport,
) {
    // stops on empty or closed
    while let Ok(event) = receiver.try_recv() {
        keystate.apply(to_logical(event, viewport));
    }
}

fn to_logical(event: InputEvent, viewport: &Viewport) -> InputEvent {
    match event {
        InputEvent::PointerDown { position, button } => InputEvent::PointerDown {
            position: viewport.to_logical(position),
            button,
        },
        InputEvent::PointerMove(position) => InputEvent::PointerMove(viewport.to_logical(position)),
        other => other,
    }
}

fn offset(event: &PointerEvent) -> Point {
    let mouse: &web_sys::MouseEvent = event.unchecked_ref();
    Point::new(mouse.offset_x() as f32, mouse.offset_y() as f32)
}

fn send(sender: &UnboundedSender<InputEvent>, event: InputEvent) {
    // receiver only goes away on unmount, the listeners follow right after
    let _ = sender.unbounded_send(event);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_down(code: &str, key: &str) -> InputEvent {
        InputEvent::KeyDown {
            code: code.into(),
            key: key.into(),
        }
    }

    #[test]
    fn pressed_is_edge_triggered_held_is_level() {
        let mut keys = KeyState::new();
        keys.apply(key_down("ArrowRight", "ArrowRight"));
        assert!(keys.was_pressed("ArrowRight"));
        assert!(keys.is_pressed("ArrowRight"));

        keys.clear_edges();
        // auto-repeat keydown while held is not a new press
        keys.apply(key_down("ArrowRight", "ArrowRight"));
        assert!(!keys.was_pressed("ArrowRight"));
        assert!(keys.is_pressed("ArrowRight"));

        keys.apply(InputEvent::KeyUp {
            code: "ArrowRight".into(),
        });
        assert!(!keys.is_pressed("ArrowRight"));
    }

    #[test]
    fn only_single_character_keys_are_typed() {
        let mut keys = KeyState::new();
        keys.apply(key_down("KeyA", "a"));
        keys.apply(key_down("Enter", "Enter"));
        keys.apply(key_down("Space", " "));
        assert_eq!(keys.typed(), &['a', ' ']);
        keys.clear_edges();
        assert!(keys.typed().is_empty());
    }

    #[test]
    fn clicks_remember_position_and_button() {
        let mut keys = KeyState::new();
        keys.apply(InputEvent::PointerDown {
            position: Point::new(3.0, 4.0),
            button: PointerButton::Secondary,
        });
        assert_eq!(keys.clicks()[0].button, PointerButton::Secondary);
        assert!(keys.is_pointer_down());
        keys.apply(InputEvent::PointerUp);
        keys.clear_edges();
        assert!(!keys.clicked());
        assert_eq!(keys.pointer(), Some(Point::new(3.0, 4.0)));
    }

    #[test]
    fn queued_pointer_events_are_scaled_to_logical_space() {
        use crate::engine::geometry::Size;
        let (tx, mut rx) = unbounded();
        let viewport = Viewport::fit(Size::new(400.0, 400.0), 200.0 / 0.9, 0.0, 0.9);
        tx.unbounded_send(InputEvent::PointerMove(Point::new(50.0, 100.0)))
            .unwrap();
        let mut keys = KeyState::new();
        process_input(&mut keys, &mut rx, &viewport);
        let p = keys.pointer().unwrap();
        assert!((p.x - 100.0).abs() < 0.01);
        assert!((p.y - 200.0).abs() < 0.01);
    }
}
