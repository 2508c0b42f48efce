use anyhow::{anyhow, Result};
use futures::channel::oneshot::channel;
use serde::de::DeserializeOwned;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;
use wasm_bindgen::closure::{Closure, WasmClosureFnOnce};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

#[rustfmt::skip]
use web_sys::{
    Document,
    Event,
    EventTarget,
    Window,
    CanvasRenderingContext2d,
    HtmlCanvasElement,
    HtmlImageElement,
    HtmlScriptElement,
    Response,
    Storage,
};

// ==================== Constants ====================
// Constants related to HTML elements
pub mod html {
    pub const CANVAS_ID: &str = "canvas";
    pub const CONTEXT_2D: &str = "2d";
    /// attribute on the canvas naming the game to mount
    pub const GAME_ATTRIBUTE: &str = "data-game";
    pub const JSONP_CALLBACK_PREFIX: &str = "__arcadeJsonp";
}

pub type LoopClosure = Closure<dyn FnMut(f64)>;

pub fn new_image() -> Result<HtmlImageElement> {
    HtmlImageElement::new().map_err(|err| anyhow!("Could not create image element : {:#?}", err))
}

pub fn context(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d> {
    canvas
        .get_context(html::CONTEXT_2D)
        // Result<Option<Object>, JsValue> -> map the JsValue error, then the
        // missing context, then cast the Object
        .map_err(|js_value| anyhow!("Error getting context : {:#?}", js_value))?
        .ok_or_else(|| anyhow!("No 2d context found"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|element| {
            anyhow!(
                "Error converting {:#?} to CanvasRenderingContext2d",
                element
            )
        })
}

pub fn canvas() -> Result<HtmlCanvasElement> {
    canvas_by_id(html::CANVAS_ID)
}

pub fn canvas_by_id(id: &str) -> Result<HtmlCanvasElement> {
    document()?
        .get_element_by_id(id)
        .ok_or_else(|| anyhow!("No Canvas Element found with ID : '{}'", id))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|element| anyhow!("Error converting {:#?} to HtmlCanvasElement", element))
}

pub fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| anyhow!("Window not found"))
}

pub fn document() -> Result<Document> {
    window()?
        .document()
        .ok_or_else(|| anyhow!("No Document Found"))
}

pub fn local_storage() -> Result<Storage> {
    window()?
        .local_storage()
        .map_err(|err| anyhow!("Local storage unavailable : {:#?}", err))?
        .ok_or_else(|| anyhow!("No local storage on this window"))
}

/// Inner window size in CSS pixels
pub fn inner_size() -> Result<(f32, f32)> {
    let window = window()?;
    let width = window
        .inner_width()
        .map_err(|err| anyhow!("Could not read window width : {:#?}", err))?
        .as_f64()
        .ok_or_else(|| anyhow!("Window width is not a number"))?;
    let height = window
        .inner_height()
        .map_err(|err| anyhow!("Could not read window height : {:#?}", err))?
        .as_f64()
        .ok_or_else(|| anyhow!("Window height is not a number"))?;
    Ok((width as f32, height as f32))
}

pub fn now() -> Result<f64> {
    Ok(window()?
        .performance()
        .ok_or_else(|| anyhow!("Performance object not found"))?
        .now())
}

pub fn create_raf_closure(f: impl FnMut(f64) + 'static) -> LoopClosure {
    Closure::wrap(Box::new(f) as Box<dyn FnMut(f64)>)
}

pub fn request_animation_frame(callback: &LoopClosure) -> Result<i32> {
    window()?
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("Cannot request animation frame : {:#?}", err))
}

pub fn cancel_animation_frame(handle: i32) -> Result<()> {
    window()?
        .cancel_animation_frame(handle)
        .map_err(|err| anyhow!("Cannot cancel animation frame : {:#?}", err))
}

pub fn closure_once<F, A, R>(f: F) -> Closure<F::FnMut>
where
    F: 'static + WasmClosureFnOnce<A, R>,
{
    Closure::once(f)
}

pub fn spawn_local<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

/// An attached DOM event handler. Dropping it detaches the handler.
pub struct Listener {
    target: EventTarget,
    event: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.closure.as_ref().unchecked_ref());
    }
}

pub fn listen<E, F>(target: &EventTarget, event: &'static str, mut handler: F) -> Result<Listener>
where
    E: JsCast,
    F: FnMut(E) + 'static,
{
    let closure = Closure::wrap(Box::new(move |event: Event| {
        handler(event.unchecked_into::<E>());
    }) as Box<dyn FnMut(Event)>);
    target
        .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("Could not listen to '{}' : {:#?}", event, err))?;
    Ok(Listener {
        target: target.clone(),
        event,
        closure,
    })
}

pub async fn fetch_json<T>(json_path: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let resp_value = fetch_with_str(json_path).await?;
    let resp: Response = resp_value
        .dyn_into()
        .map_err(|element| anyhow!("error converting [{:#?}] to Response", element))?;
    if !resp.ok() {
        return Err(anyhow!("{} answered with status {}", json_path, resp.status()));
    }
    let json = resp
        .json()
        .map_err(|err| anyhow!("Could not get JSON from response [{:#?}]", err))?;

    let json_value = JsFuture::from(json)
        .await
        .map_err(|err| anyhow!("error fetching [{:#?}]", err))?;

    serde_wasm_bindgen::from_value(json_value)
        .map_err(|err| anyhow!("error converting response : {:#?}", err))
}

async fn fetch_with_str(resource: &str) -> Result<JsValue> {
    let resp = window()?.fetch_with_str(resource);

    JsFuture::from(resp)
        .await
        .map_err(|err| anyhow!("error fetching : {:#?}", err))
}

thread_local! {
    static NEXT_JSONP_ID: Cell<u64> = const { Cell::new(0) };
}

/// Cross-origin script-tag request resolved as a future.
///
/// ┌──────────── one request ─────────────────────────────────────────┐
/// │ 1. take a fresh id -> callback name `__arcadeJsonp<id>`          │
/// │ 2. install a one-shot function under that name on `window`       │
/// │ 3. append <script src=url(callback)>                             │
/// │ 4. endpoint script calls the function -> oneshot channel -> Ok   │
/// │    script error, or loads without calling back          -> Err   │
/// │ 5. remove the function and the script tag                        │
/// └──────────────────────────────────────────────────────────────────┘
/// No global state outlives the request and concurrent requests never
/// share a callback.
pub async fn jsonp<F>(build_url: F) -> Result<JsValue>
where
    F: FnOnce(&str) -> String,
{
    let id = NEXT_JSONP_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    });
    let callback_name = format!("{}{}", html::JSONP_CALLBACK_PREFIX, id);
    let url = build_url(&callback_name);
    let window = window()?;
    let document = document()?;

    let (tx, rx) = channel::<Result<JsValue>>();
    let result_tx = Rc::new(RefCell::new(Some(tx)));
    let error_tx = result_tx.clone();
    let load_tx = result_tx.clone();

    let on_result = Closure::wrap(Box::new(move |value: JsValue| {
        if let Some(tx) = result_tx.borrow_mut().take() {
            let _ = tx.send(Ok(value));
        }
    }) as Box<dyn FnMut(JsValue)>);

    let error_url = url.clone();
    let on_error = Closure::wrap(Box::new(move |_: JsValue| {
        if let Some(tx) = error_tx.borrow_mut().take() {
            let _ = tx.send(Err(anyhow!("Could not load script {}", error_url)));
        }
    }) as Box<dyn FnMut(JsValue)>);

    // the endpoint script runs before its load event, so a sender still
    // present here means it never called back
    let on_load = Closure::wrap(Box::new(move |_: JsValue| {
        if let Some(tx) = load_tx.borrow_mut().take() {
            let _ = tx.send(Err(anyhow!("Endpoint did not answer the callback")));
        }
    }) as Box<dyn FnMut(JsValue)>);

    let script: HtmlScriptElement = document
        .create_element("script")
        .map_err(|err| anyhow!("Could not create script element : {:#?}", err))?
        .dyn_into()
        .map_err(|element| anyhow!("Error converting {:#?} to HtmlScriptElement", element))?;
    script.set_onerror(Some(on_error.as_ref().unchecked_ref()));
    script.set_onload(Some(on_load.as_ref().unchecked_ref()));
    script.set_src(&url);

    let parent = document
        .head()
        .ok_or_else(|| anyhow!("Document has no head"))?;

    // nothing above touched `window`; from here on every exit runs the cleanup
    let callback_key = JsValue::from_str(&callback_name);
    let appended = js_sys::Reflect::set(&window, &callback_key, on_result.as_ref())
        .map_err(|err| anyhow!("Could not install {} : {:#?}", callback_name, err))
        .and_then(|_| {
            parent
                .append_child(&script)
                .map_err(|err| anyhow!("Could not append script : {:#?}", err))
        });

    let result = match appended {
        Ok(_) => rx
            .await
            .map_err(|_| anyhow!("JSONP request {} was cancelled", id))
            .and_then(|inner| inner),
        Err(err) => Err(err),
    };

    script.remove();
    let _ = js_sys::Reflect::delete_property(&window, &callback_key);
    // closures must outlive the script, drop them only after cleanup
    drop((on_result, on_error, on_load));

    result
}
