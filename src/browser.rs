use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use std::future::Future;
use wasm_bindgen::closure::{Closure, WasmClosure};
use wasm_bindgen::convert::FromWasmAbi;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

#[rustfmt::skip]
use web_sys::{
    Document,
    EventTarget,
    Window,
    CanvasRenderingContext2d,
    HtmlCanvasElement,
    HtmlImageElement,
    Response,
};

// ==================== Logging ====================
// `#[macro_use] mod browser` in lib.rs makes these visible crate wide
// - wasm32 : browser console
// - native : stdout / stderr, so unit tests can log without a JS host
macro_rules! log {
    ($($t:tt)*) => {
        $crate::browser::log_line(&format!($($t)*))
    };
}

macro_rules! error {
    ($($t:tt)*) => {
        $crate::browser::error_line(&format!($($t)*))
    };
}

pub fn log_line(line: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::log_1(&JsValue::from_str(line));
    #[cfg(not(target_arch = "wasm32"))]
    println!("{}", line);
}

pub fn error_line(line: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::error_1(&JsValue::from_str(line));
    #[cfg(not(target_arch = "wasm32"))]
    eprintln!("{}", line);
}

// ==================== Constants ====================
// Constants related to HTML elements
mod html {
    pub const CANVAS_ID: &str = "canvas";
    pub const CONTEXT_2D: &str = "2d";
}

pub type LoopClosure = Closure<dyn FnMut(f64)>;

// ==================== Elements ====================
pub fn new_image() -> Result<HtmlImageElement> {
    HtmlImageElement::new().map_err(|err| anyhow!("Could not create image element : {:#?}", err))
}

pub fn context() -> Result<CanvasRenderingContext2d> {
    canvas()?
        .get_context(html::CONTEXT_2D)
        // Result<Option<Object>, JsValue>
        // - JsValue error -> anyhow
        // - None -> anyhow
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
    document()?
        .get_element_by_id(html::CANVAS_ID)
        .ok_or_else(|| anyhow!("No Canvas Element found with ID : '{:#?}'", html::CANVAS_ID))?
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

/// Current viewport size in CSS pixels : (innerWidth, innerHeight)
pub fn viewport_size() -> Result<(f64, f64)> {
    let window = window()?;
    let width = window
        .inner_width()
        .map_err(|err| anyhow!("Could not read innerWidth : {:#?}", err))?
        .as_f64()
        .ok_or_else(|| anyhow!("innerWidth is not a number"))?;
    let height = window
        .inner_height()
        .map_err(|err| anyhow!("Could not read innerHeight : {:#?}", err))?
        .as_f64()
        .ok_or_else(|| anyhow!("innerHeight is not a number"))?;
    Ok((width, height))
}

/// Resize the drawing buffer AND the css box of the canvas to the viewport
pub fn resize_canvas(canvas: &HtmlCanvasElement, width: f64, height: f64) -> Result<()> {
    canvas.set_width(width as u32);
    canvas.set_height(height as u32);
    let style = canvas.style();
    style
        .set_property("width", &format!("{}px", width))
        .map_err(|err| anyhow!("Could not set canvas width : {:#?}", err))?;
    style
        .set_property("height", &format!("{}px", height))
        .map_err(|err| anyhow!("Could not set canvas height : {:#?}", err))
}

// ==================== Closures ====================
/// One-shot callback handed to JS as a plain function value
/// - freed by wasm-bindgen after its single call
pub fn closure_once(f: impl FnOnce(JsValue) + 'static) -> JsValue {
    Closure::<dyn FnMut(JsValue)>::once_into_js(f)
}

pub fn closure_wrap<T: WasmClosure + ?Sized>(data: Box<T>) -> Closure<T> {
    Closure::wrap(data)
}

pub fn create_raf_closure(f: impl FnMut(f64) + 'static) -> LoopClosure {
    closure_wrap(Box::new(f))
}

pub fn request_animation_frame(callback: &LoopClosure) -> Result<i32> {
    window()?
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("Cannot request animation frame {:#?}", err))
}

/// Attach `handler` to `event` on `target` for the lifetime of the page
/// - the closure is leaked on purpose, listeners are never removed
pub fn listen<E>(target: &EventTarget, event: &str, handler: impl FnMut(E) + 'static) -> Result<()>
where
    E: FromWasmAbi + 'static,
{
    let closure = closure_wrap(Box::new(handler) as Box<dyn FnMut(E)>);
    target
        .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("Could not listen to '{}' : {:#?}", event, err))?;
    closure.forget();
    Ok(())
}

pub fn now() -> Result<f64> {
    Ok(window()?
        .performance()
        .ok_or_else(|| anyhow!("Performance object not found"))?
        .now())
}

// ==================== Async ====================
pub fn spawn_local<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
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
