//! Thin helpers over `web_sys` used by every page controller.
//!
//! DOM failures come back as `JsValue`; helpers turn them into `String` errors so
//! controllers can `?` through them and report once at the event boundary.

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{Document, Element, Event, EventTarget, HtmlElement, Window};

pub fn window() -> Result<Window, String> {
    web_sys::window().ok_or_else(|| "No global window".to_string())
}

pub fn document() -> Result<Document, String> {
    window()?
        .document()
        .ok_or_else(|| "Window has no document".to_string())
}

pub fn js_error(error: wasm_bindgen::JsValue) -> String {
    format!("{error:?}")
}

/// Look up an element by id and cast it. A missing or differently typed element is `None`.
pub fn element_by_id<T: JsCast>(document: &Document, id: &str) -> Option<T> {
    document
        .get_element_by_id(id)
        .and_then(|element| element.dyn_into::<T>().ok())
}

/// Value of an `<input>`, `<select>` or `<textarea>`; `None` when the element is absent.
pub fn field_value(document: &Document, id: &str) -> Option<String> {
    let element = document.get_element_by_id(id)?;
    if let Some(input) = element.dyn_ref::<web_sys::HtmlInputElement>() {
        return Some(input.value());
    }
    if let Some(select) = element.dyn_ref::<web_sys::HtmlSelectElement>() {
        return Some(select.value());
    }
    element
        .dyn_ref::<web_sys::HtmlTextAreaElement>()
        .map(|textarea| textarea.value())
}

pub fn set_field_value(document: &Document, id: &str, value: &str) {
    let Some(element) = document.get_element_by_id(id) else {
        return;
    };
    if let Some(input) = element.dyn_ref::<web_sys::HtmlInputElement>() {
        input.set_value(value);
    } else if let Some(select) = element.dyn_ref::<web_sys::HtmlSelectElement>() {
        select.set_value(value);
    } else if let Some(textarea) = element.dyn_ref::<web_sys::HtmlTextAreaElement>() {
        textarea.set_value(value);
    }
}

/// All elements carrying `class_name`.
pub fn elements_with_class(document: &Document, class_name: &str) -> Result<Vec<HtmlElement>, String> {
    let nodes = document
        .query_selector_all(&format!(".{class_name}"))
        .map_err(js_error)?;
    Ok((0..nodes.length())
        .filter_map(|index| nodes.item(index))
        .filter_map(|node| node.dyn_into::<HtmlElement>().ok())
        .collect())
}

/// Whether `target` is, or sits inside, an element with `class_name`.
pub fn is_within_class(target: &EventTarget, class_name: &str) -> bool {
    let Some(element) = target.dyn_ref::<Element>() else {
        return false;
    };
    matches!(element.closest(&format!(".{class_name}")), Ok(Some(_)))
}

pub fn set_display(element: &HtmlElement, display: &str) -> Result<(), String> {
    element
        .style()
        .set_property("display", display)
        .map_err(js_error)
}

pub fn remove_children(element: &Element) {
    element.set_inner_html("");
}

/// Owns a listener closure and detaches it again when dropped.
pub struct EventListener {
    target: EventTarget,
    event_type: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl EventListener {
    pub fn new<F>(target: &EventTarget, event_type: &'static str, handler: F) -> Result<Self, String>
    where
        F: FnMut(Event) + 'static,
    {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target
            .add_event_listener_with_callback(event_type, closure.as_ref().unchecked_ref())
            .map_err(js_error)?;
        Ok(Self {
            target: target.clone(),
            event_type,
            closure,
        })
    }

    /// Listener for a specific event interface; events of another type are ignored.
    pub fn typed<E, F>(target: &EventTarget, event_type: &'static str, mut handler: F) -> Result<Self, String>
    where
        E: JsCast,
        F: FnMut(E) + 'static,
    {
        Self::new(target, event_type, move |event: Event| {
            if let Ok(event) = event.dyn_into::<E>() {
                handler(event);
            }
        })
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event_type, self.closure.as_ref().unchecked_ref());
    }
}

/// Browser fixtures shared by the `wasm_bindgen_test` suites.
#[cfg(all(test, target_arch = "wasm32"))]
pub mod fixtures {
    use super::*;
    use wasm_bindgen::JsValue;
    use web_sys::{DataTransfer, File, FileList, FilePropertyBag, KeyboardEvent, KeyboardEventInit};

    pub fn document() -> Document {
        web_sys::window().unwrap().document().unwrap()
    }

    pub fn create<T: JsCast>(tag: &str) -> T {
        document().create_element(tag).unwrap().dyn_into::<T>().unwrap()
    }

    /// Create an element and attach it to `<body>`; callers `remove()` it when done.
    pub fn attach<T: JsCast>(tag: &str, id: &str) -> T {
        let element: Element = create(tag);
        element.set_id(id);
        document().body().unwrap().append_child(&element).unwrap();
        element.dyn_into::<T>().unwrap()
    }

    pub fn file(name: &str, media_type: &str) -> File {
        let options = FilePropertyBag::new();
        options.set_type(media_type);
        let parts = js_sys::Array::of1(&JsValue::from_str("fixture bytes"));
        File::new_with_str_sequence_and_options(&parts, name, &options).unwrap()
    }

    pub fn data_transfer(files: &[File]) -> DataTransfer {
        let transfer = DataTransfer::new().unwrap();
        for file in files {
            transfer.items().add_with_file(file).unwrap();
        }
        transfer
    }

    pub fn file_list(files: &[File]) -> FileList {
        data_transfer(files).files().unwrap()
    }

    /// Dispatch a cancelable `keydown`; returns `false` when a listener prevented the default.
    pub fn key_down(target: &EventTarget, key: &str, shift: bool) -> bool {
        let init = KeyboardEventInit::new();
        init.set_key(key);
        init.set_shift_key(shift);
        init.set_cancelable(true);
        init.set_bubbles(true);
        let event = KeyboardEvent::new_with_keyboard_event_init_dict("keydown", &init).unwrap();
        target.dispatch_event(&event).unwrap()
    }

    /// Replace `window[name]` with a function that counts its calls in `window[counter]`.
    pub fn install_counting_function(name: &str, counter: &str) {
        let body = format!("window['{counter}'] = (window['{counter}'] || 0) + 1;");
        let function = js_sys::Function::new_no_args(&body);
        js_sys::Reflect::set(&window().unwrap(), &JsValue::from_str(name), &function).unwrap();
    }

    pub fn counter(name: &str) -> u32 {
        js_sys::Reflect::get(&window().unwrap(), &JsValue::from_str(name))
            .unwrap()
            .as_f64()
            .unwrap_or(0.0) as u32
    }

    /// Poll `done` on the event loop until it holds or roughly two seconds pass.
    pub async fn wait_until(mut done: impl FnMut() -> bool) -> bool {
        for _ in 0..200 {
            if done() {
                return true;
            }
            gloo_timers::future::TimeoutFuture::new(10).await;
        }
        done()
    }
}
