// ==================== Imports ====================
use anyhow::{anyhow, Result};
use config::ArcadeConfig;
use engine::{GameLoop, LoopHandle};
use games::{GameContext, GameKind};
use scores::leaderboard::{AggregateRank, Leaderboard, RemoteScore};
use scores::remote::ScoreClient;
use scores::store::{BrowserStorage, KeyValueStore, MemoryStore, ScoreBook};
use scores::{LocalScoreSink, RemoteScoreSink, ScoreSink};
use serde::Serialize;
use session::Session;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

pub mod browser;
pub mod config;
pub mod engine;
pub mod games;
pub mod panel;
pub mod scores;
pub mod session;

// ELI5: one canvas, one game. Replacing the handle unmounts the old game.
thread_local! {
    static MOUNTED: RefCell<Option<LoopHandle>> = const { RefCell::new(None) };
}

// ==================== Exports ====================
/// Main entry for the WebAssembly module
/// - installs the panic hook and the console logger
/// - mounts the game named by the canvas `data-game` attribute, if any
#[wasm_bindgen]
pub fn main_js() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    // init fails only when a logger is already set, e.g. after a hot reload
    let _ = console_log::init_with_level(log::Level::Info);

    let canvas = browser::canvas().map_err(to_js)?;
    let Some(name) = canvas.get_attribute(browser::html::GAME_ATTRIBUTE) else {
        log::info!("No game on the canvas yet, waiting for mount_game");
        return Ok(());
    };
    browser::spawn_local(async move {
        if let Err(err) = mount(&name).await {
            log::error!("Could not start {}: {:#}", name, err);
        }
    });
    Ok(())
}

/// Stops whatever is running and starts `name` (a score key such as
/// `snake` or `brickBreaker`) on the page canvas
#[wasm_bindgen]
pub async fn mount_game(name: String) -> Result<(), JsValue> {
    mount(&name).await.map_err(to_js)
}

#[wasm_bindgen]
pub fn unmount_game() {
    let handle = MOUNTED.with(|slot| slot.borrow_mut().take());
    if let Some(handle) = handle {
        drop(handle);
        log::info!("Game unmounted");
    }
}

/// Remote standings: each game's best `top` scores plus the cross-game
/// ranking
#[wasm_bindgen]
pub async fn leaderboard(top: usize) -> Result<JsValue, JsValue> {
    let client = remote_client().await.map_err(to_js)?;
    let board = client.leaderboard().await.map_err(|err| to_js(err.into()))?;
    standings(&board, top)
}

/// Same as `leaderboard`, grouped the way the name ranking page wants it
#[wasm_bindgen]
pub async fn name_leaderboard(top: usize) -> Result<JsValue, JsValue> {
    let client = remote_client().await.map_err(to_js)?;
    let board = client
        .name_leaderboard()
        .await
        .map_err(|err| to_js(err.into()))?;
    standings(&board, top)
}

/// Site constants kept next to the scores, passed through as-is
#[wasm_bindgen]
pub async fn site_constants() -> Result<JsValue, JsValue> {
    let client = remote_client().await.map_err(to_js)?;
    let constants = client.constants().await.map_err(|err| to_js(err.into()))?;
    serde_wasm_bindgen::to_value(&constants).map_err(Into::into)
}

/// The local top ten for one game
#[wasm_bindgen]
pub async fn local_scores(game: String) -> Result<JsValue, JsValue> {
    let config = ArcadeConfig::load().await;
    let book = ScoreBook::new(open_store(), config.storage_key);
    let entries = book.top(&game).map_err(|err| to_js(err.into()))?;
    serde_wasm_bindgen::to_value(&entries).map_err(Into::into)
}

// ==================== Wiring ====================
async fn mount(name: &str) -> Result<()> {
    let kind: GameKind = name.parse()?;
    let config = ArcadeConfig::load().await;
    let store = open_store();
    let sink = score_sink(&config, store.clone());
    let seed = config.seed.unwrap_or_else(rand::random);
    let game = games::create(kind, &GameContext { seed, store });

    let logo = match engine::load_image(&config.logo_path).await {
        Ok(image) => Some(image),
        Err(err) => {
            log::warn!("Drawing logo badges instead of {}: {:#}", config.logo_path, err);
            None
        }
    };

    let canvas = browser::canvas()?;
    // the old loop lets go of the canvas before the new one grabs it
    unmount_game();
    let handle = GameLoop::start(Session::new(game, sink), canvas, logo, config.canvas_fraction)?;
    MOUNTED.with(|slot| *slot.borrow_mut() = Some(handle));
    log::info!("Mounted {}", kind.key());
    Ok(())
}

fn open_store() -> Rc<dyn KeyValueStore> {
    match BrowserStorage::open() {
        Ok(storage) => Rc::new(storage),
        Err(err) => {
            log::warn!("Scores will not survive a reload: {:#}", err);
            Rc::new(MemoryStore::default())
        }
    }
}

fn score_sink(config: &ArcadeConfig, store: Rc<dyn KeyValueStore>) -> Rc<dyn ScoreSink> {
    if let Some(endpoint) = &config.score_endpoint {
        match ScoreClient::new(endpoint) {
            Ok(client) => return Rc::new(RemoteScoreSink::new(client)),
            Err(err) => log::warn!("Keeping scores local: {}", err),
        }
    }
    Rc::new(LocalScoreSink::new(ScoreBook::new(
        store,
        config.storage_key.clone(),
    )))
}

async fn remote_client() -> Result<ScoreClient> {
    let config = ArcadeConfig::load().await;
    let endpoint = config
        .score_endpoint
        .ok_or_else(|| anyhow!("No score endpoint configured"))?;
    Ok(ScoreClient::new(&endpoint)?)
}

#[derive(Serialize)]
struct Standings {
    games: BTreeMap<String, Vec<RemoteScore>>,
    aggregate: Vec<AggregateRank>,
}

fn standings(board: &Leaderboard, top: usize) -> Result<JsValue, JsValue> {
    let view = Standings {
        games: board
            .game_names()
            .map(|game| (game.to_string(), board.top(game, top)))
            .collect(),
        aggregate: board.aggregate(),
    };
    serde_wasm_bindgen::to_value(&view).map_err(Into::into)
}

fn to_js(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{:#}", err))
}
