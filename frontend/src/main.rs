//! Marketplace page frontend entry point
//!
//! Mounts the photo uploader, filter popups, listings filter and keyboard helpers
//! once the server-rendered page has been parsed.

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

mod config;
mod dom;
mod filter_popups;
mod keyboard_submit;
mod listings_filter;
mod page;
mod photo_uploader;

pub fn main() {
    if let Err(error) = when_dom_ready(start) {
        zoon::eprintln!("[Page] Failed to schedule startup: {error}");
    }
}

fn start() {
    let result = dom::document()
        .and_then(|document| page::Page::mount(&document))
        .and_then(|page| {
            page::store_page(page);
            page::expose_page_api()
        });
    if let Err(error) = result {
        zoon::eprintln!("[Page] Startup failed: {error}");
    }
}

/// Run `f` now if the document is parsed, otherwise on `DOMContentLoaded`.
fn when_dom_ready(f: fn()) -> Result<(), String> {
    let document = dom::document()?;
    if document.ready_state() != "loading" {
        f();
        return Ok(());
    }
    let callback = Closure::once_into_js(f);
    document
        .add_event_listener_with_callback("DOMContentLoaded", callback.unchecked_ref())
        .map_err(dom::js_error)
}
