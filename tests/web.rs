//! Browser-only checks, run with `wasm-pack test --headless --firefox`
#![cfg(target_arch = "wasm32")]

use chrono::Utc;
use community_arcade::browser::{self, html};
use community_arcade::engine::GameLoop;
use community_arcade::engine::viewport::{Viewport, DEFAULT_CANVAS_FRACTION};
use community_arcade::engine::{Renderer, Size};
use community_arcade::games::{self, GameContext, GameKind};
use community_arcade::scores::store::{BrowserStorage, KeyValueStore, MemoryStore, ScoreBook};
use community_arcade::scores::{LocalScoreSink, ScoreEntry};
use community_arcade::session::Session;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

wasm_bindgen_test_configure!(run_in_browser);

fn scratch_canvas() -> HtmlCanvasElement {
    let document = web_sys::window().unwrap().document().unwrap();
    document
        .create_element("canvas")
        .unwrap()
        .dyn_into()
        .unwrap()
}

fn scratch_context() -> CanvasRenderingContext2d {
    scratch_canvas()
        .get_context("2d")
        .unwrap()
        .unwrap()
        .dyn_into()
        .unwrap()
}

#[wasm_bindgen_test]
fn local_storage_keeps_values() {
    let storage = BrowserStorage::open().unwrap();
    storage.set("arcadeWebTest", "42").unwrap();
    assert_eq!(storage.get("arcadeWebTest").unwrap().as_deref(), Some("42"));
    assert_eq!(storage.get("arcadeWebTestMissing").unwrap(), None);
}

#[wasm_bindgen_test]
fn score_book_survives_a_new_handle() {
    let key = "arcadeWebTestScores";
    let first = ScoreBook::new(Rc::new(BrowserStorage::open().unwrap()), key);
    first
        .record("snake", ScoreEntry::new("ada", 7, Utc::now()).unwrap())
        .unwrap();

    let second = ScoreBook::new(Rc::new(BrowserStorage::open().unwrap()), key);
    let top = second.top("snake").unwrap();
    assert!(top.iter().any(|entry| entry.username == "ada" && entry.score == 7));
}

#[wasm_bindgen_test]
fn every_game_draws_its_first_frame() {
    let renderer = Renderer::new(scratch_context(), None);
    let store: Rc<dyn KeyValueStore> = Rc::new(BrowserStorage::open().unwrap());
    for kind in GameKind::ALL {
        let game = games::create(kind, &GameContext { seed: 3, store: store.clone() });
        game.draw(&renderer);
    }
}

#[wasm_bindgen_test]
fn viewport_fits_the_real_window() {
    let window = web_sys::window().unwrap();
    let width = window.inner_width().unwrap().as_f64().unwrap() as f32;
    let height = window.inner_height().unwrap().as_f64().unwrap() as f32;
    let logical = Size::new(400.0, 600.0);
    let viewport = Viewport::fit(logical, width, height, DEFAULT_CANVAS_FRACTION);
    let display = viewport.display();
    assert!(display.width <= logical.width);
    assert!((display.width / display.height - logical.aspect_ratio()).abs() < 1e-3);
}

fn pending_callbacks() -> usize {
    let window = web_sys::window().unwrap();
    js_sys::Object::keys(&window)
        .iter()
        .filter_map(|key| key.as_string())
        .filter(|key| key.starts_with(html::JSONP_CALLBACK_PREFIX))
        .count()
}

#[wasm_bindgen_test]
async fn jsonp_answers_and_leaves_no_globals() {
    let value = browser::jsonp(|callback| format!("data:text/javascript,{}(42)", callback))
        .await
        .unwrap();
    assert_eq!(value.as_f64(), Some(42.0));
    assert_eq!(pending_callbacks(), 0);
}

#[wasm_bindgen_test]
async fn jsonp_without_answer_fails_and_cleans_up() {
    let result = browser::jsonp(|_| "data:text/javascript,//silent".to_string()).await;
    assert!(result.is_err());
    assert_eq!(pending_callbacks(), 0);
}

#[wasm_bindgen_test]
fn loop_mounts_and_unmounts_on_a_canvas() {
    let store: Rc<dyn KeyValueStore> = Rc::new(MemoryStore::default());
    let game = games::create(GameKind::Snake, &GameContext { seed: 1, store: store.clone() });
    let sink = Rc::new(LocalScoreSink::new(ScoreBook::new(store, "arcadeWebTestLoop")));
    let handle = GameLoop::start(Session::new(game, sink), scratch_canvas(), None, DEFAULT_CANVAS_FRACTION)
        .unwrap();
    drop(handle);
}
