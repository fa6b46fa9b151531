//! Page registry: keeps the mounted controllers alive and exposes the globals
//! that inline markup calls (`openFilter(id, button)`, `applyFilters()`).

use std::cell::RefCell;

use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement};

use crate::dom;
use crate::filter_popups::PopupLayer;
use crate::keyboard_submit::{ChatComposer, SearchBox};
use crate::listings_filter::ListingsFilter;
use crate::photo_uploader::PhotoUploader;

pub struct Page {
    pub uploader: PhotoUploader,
    pub popups: PopupLayer,
    pub listings: ListingsFilter,
    pub chat: ChatComposer,
    pub search: SearchBox,
}

thread_local! {
    static PAGE: RefCell<Option<Page>> = const { RefCell::new(None) };
}

impl Page {
    /// Build every controller from the current document. Controllers whose elements are
    /// missing come back disabled; only DOM API failures are errors.
    pub fn mount(document: &Document) -> Result<Self, String> {
        let config = crate::config::load_page_config(document);

        let listings = ListingsFilter::new(config.listings.clone());
        if let Err(error) = listings.prefill_from_location(document) {
            zoon::eprintln!("[Listings] Failed to prefill filters from URL: {error}");
        }

        let page = Self {
            uploader: PhotoUploader::from_document(document, &config.uploader)?,
            popups: PopupLayer::new(document, config.popups.clone())?,
            listings,
            chat: ChatComposer::from_document(document, &config.chat)?,
            search: SearchBox::from_document(document, &config.search)?,
        };
        zoon::println!(
            "[Page] Mounted (uploader: {}, chat: {}, search: {})",
            page.uploader.is_enabled(),
            page.chat.is_enabled(),
            page.search.is_enabled()
        );
        Ok(page)
    }
}

pub fn store_page(page: Page) {
    PAGE.with(|cell| {
        *cell.borrow_mut() = Some(page);
    });
}

fn with_page<F, R>(f: F) -> Option<R>
where
    F: FnOnce(&Page) -> R,
{
    PAGE.with(|cell| cell.borrow().as_ref().map(f))
}

pub fn expose_page_api() -> Result<(), String> {
    let window = dom::window()?;

    let open_filter_closure =
        Closure::wrap(Box::new(open_filter_impl) as Box<dyn Fn(JsValue, JsValue)>);
    js_sys::Reflect::set(
        &window,
        &"openFilter".into(),
        open_filter_closure.as_ref().unchecked_ref(),
    )
    .map_err(dom::js_error)?;
    open_filter_closure.forget();

    let apply_filters_closure = Closure::wrap(Box::new(apply_filters_impl) as Box<dyn Fn()>);
    js_sys::Reflect::set(
        &window,
        &"applyFilters".into(),
        apply_filters_closure.as_ref().unchecked_ref(),
    )
    .map_err(dom::js_error)?;
    apply_filters_closure.forget();

    Ok(())
}

/// Popup id as markup passes it: `openFilter('price', this)` or `openFilter(1, this)`.
pub fn filter_id(text: Option<String>, number: Option<f64>) -> Option<String> {
    text.or_else(|| number.map(|number| number.to_string()))
}

fn filter_id_from_js(id: &JsValue) -> Option<String> {
    filter_id(id.as_string(), id.as_f64())
}

fn open_filter_impl(id: JsValue, button: JsValue) {
    let Some(id) = filter_id_from_js(&id) else {
        zoon::eprintln!("[Popups] openFilter called with a non-string, non-numeric id: {id:?}");
        return;
    };
    let Ok(button) = button.dyn_into::<HtmlElement>() else {
        zoon::eprintln!("[Popups] openFilter('{id}') called without a trigger element");
        return;
    };
    let result = with_page(|page| page.popups.open_filter(&id, &button));
    match result {
        Some(Ok(())) => {}
        Some(Err(error)) => zoon::eprintln!("[Popups] Failed to open '{id}': {error}"),
        None => zoon::eprintln!("[Popups] openFilter('{id}') called before the page mounted"),
    }
}

fn apply_filters_impl() {
    let result = with_page(|page| page.listings.apply());
    match result {
        Some(Ok(())) => {}
        Some(Err(error)) => zoon::eprintln!("[Listings] Failed to apply filters: {error}"),
        None => zoon::eprintln!("[Listings] applyFilters() called before the page mounted"),
    }
}


#[cfg(all(test, target_arch = "wasm32"))]
mod dom_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn numeric_ids_from_markup_are_accepted() {
        assert_eq!(filter_id_from_js(&JsValue::from_f64(1.0)), Some("1".to_string()));
        assert_eq!(filter_id_from_js(&JsValue::from_str("city")), Some("city".to_string()));
        assert_eq!(filter_id_from_js(&JsValue::NULL), None);
    }
}
