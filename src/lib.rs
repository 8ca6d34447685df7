// ==================== Imports ====================
use wasm_bindgen::prelude::*;

#[macro_use]
mod browser;
mod app;
pub mod config;
pub mod engine;
pub mod scenes;
pub mod shell;
pub mod source;

// ==================== Main Functions ====================
/// Main entry for Webassembly module
/// - better panic messages
/// - everything else happens asynchronously in `app::run`
#[wasm_bindgen]
pub fn main_js() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    // spawns a new asynchronous task in local thread, for web assembly
    // environment, using wasm_bindgen_futures
    browser::spawn_local(async move {
        if let Err(err) = app::run().await {
            error!("Showcase failed to start : {:#}", err);
        }
    });

    Ok(())
}
