//! Enter-to-send for the chat composer and Enter-to-search for the search box.

use shared::{ChatSection, SearchSection};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, EventTarget, HtmlElement, HtmlFormElement, HtmlInputElement, HtmlTextAreaElement, KeyboardEvent};

use crate::dom::{self, EventListener, js_error};

const ENTER: &str = "Enter";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyPress<'a> {
    pub key: &'a str,
    pub shift: bool,
    /// An IME composition is in progress; Enter then confirms the candidate text.
    pub composing: bool,
}

impl<'a> KeyPress<'a> {
    pub fn enter() -> Self {
        Self {
            key: ENTER,
            shift: false,
            composing: false,
        }
    }

    fn is_enter(&self) -> bool {
        self.key == ENTER && !self.composing
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComposerKey {
    /// Plain Enter: suppress the newline and submit the form.
    Send,
    /// Shift+Enter: let the textarea insert a newline.
    Newline,
    Other,
}

pub fn composer_key(press: KeyPress<'_>) -> ComposerKey {
    match (press.is_enter(), press.shift) {
        (true, false) => ComposerKey::Send,
        (true, true) => ComposerKey::Newline,
        (false, _) => ComposerKey::Other,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Not an Enter press.
    Ignored,
    Invoked,
    /// Enter pressed but no search function is defined on the page.
    Unavailable,
}

/// Run the search on Enter when `resolve` finds a search function.
/// `resolve` is only consulted for Enter presses.
pub fn dispatch_search<F>(press: KeyPress<'_>, resolve: impl FnOnce() -> Option<F>) -> Result<SearchOutcome, String>
where
    F: FnOnce() -> Result<(), String>,
{
    if !press.is_enter() {
        return Ok(SearchOutcome::Ignored);
    }
    match resolve() {
        Some(search) => search().map(|()| SearchOutcome::Invoked),
        None => Ok(SearchOutcome::Unavailable),
    }
}

fn key_press(event: &KeyboardEvent) -> (String, bool, bool) {
    (event.key(), event.shift_key(), event.is_composing())
}

/// Enter submits the chat form through `requestSubmit`, so validation and submit listeners still run.
pub struct ChatComposer {
    keydown: Option<EventListener>,
}

impl ChatComposer {
    pub fn from_document(document: &Document, config: &ChatSection) -> Result<Self, String> {
        Self::new(
            dom::element_by_id(document, &config.textarea_id),
            dom::element_by_id(document, &config.form_id),
            dom::element_by_id(document, &config.messages_id),
        )
    }

    pub fn new(
        textarea: Option<HtmlTextAreaElement>,
        form: Option<HtmlFormElement>,
        messages: Option<HtmlElement>,
    ) -> Result<Self, String> {
        let (Some(textarea), Some(form)) = (textarea, form) else {
            return Ok(Self { keydown: None });
        };

        // Newest messages are at the bottom
        if let Some(messages) = messages {
            messages.set_scroll_top(messages.scroll_height());
        }

        let target: EventTarget = textarea.into();
        let keydown = EventListener::typed(&target, "keydown", move |event: KeyboardEvent| {
            let (key, shift, composing) = key_press(&event);
            let press = KeyPress {
                key: &key,
                shift,
                composing,
            };
            if composer_key(press) == ComposerKey::Send {
                event.prevent_default();
                if let Err(error) = form.request_submit() {
                    zoon::eprintln!("[Chat] Failed to submit message: {}", js_error(error));
                }
            }
        })?;

        Ok(Self {
            keydown: Some(keydown),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.keydown.is_some()
    }
}

/// Enter in the search input calls the page's global search function, if there is one.
pub struct SearchBox {
    keydown: Option<EventListener>,
}

impl SearchBox {
    pub fn from_document(document: &Document, config: &SearchSection) -> Result<Self, String> {
        Self::new(
            dom::element_by_id(document, &config.input_id),
            config.function_name.clone(),
        )
    }

    pub fn new(input: Option<HtmlInputElement>, function_name: String) -> Result<Self, String> {
        let Some(input) = input else {
            return Ok(Self { keydown: None });
        };

        let target: EventTarget = input.into();
        let keydown = EventListener::typed(&target, "keydown", move |event: KeyboardEvent| {
            let (key, shift, composing) = key_press(&event);
            let press = KeyPress {
                key: &key,
                shift,
                composing,
            };
            if press.is_enter() {
                event.prevent_default();
            }
            let outcome = dispatch_search(press, || {
                resolve_global_function(&function_name)
                    .map(|(this, function)| move || function.call0(&this).map(|_| ()).map_err(js_error))
            });
            if let Err(error) = outcome {
                zoon::eprintln!("[Search] '{function_name}' failed: {error}");
            }
        })?;

        Ok(Self {
            keydown: Some(keydown),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.keydown.is_some()
    }
}

/// The function `name` resolves to in the page's global scope, along with the window as `this`.
///
/// `window[name]` covers `function` declarations and `var`s. Top-level `let`/`const`/`class`
/// bindings are not window properties, so those are looked up by evaluating the identifier.
fn resolve_global_function(name: &str) -> Option<(JsValue, js_sys::Function)> {
    let window: JsValue = web_sys::window()?.into();
    let value = js_sys::Reflect::get(&window, &JsValue::from_str(name)).ok()?;
    if let Ok(function) = value.dyn_into::<js_sys::Function>() {
        return Some((window, function));
    }
    if !is_identifier(name) {
        return None;
    }
    let function = lookup_global_binding(name).dyn_into::<js_sys::Function>().ok()?;
    Some((window, function))
}

/// Plain JavaScript identifier (ASCII subset), so it is safe to evaluate as an expression.
pub fn is_identifier(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
        "do", "else", "enum", "export", "extends", "false", "finally", "for", "function", "if", "import",
        "in", "instanceof", "let", "new", "null", "return", "super", "switch", "this", "throw", "true",
        "try", "typeof", "var", "void", "while", "with", "yield",
    ];
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let is_part = |c: char| c.is_ascii_alphanumeric() || c == '_' || c == '$';
    (first.is_ascii_alphabetic() || first == '_' || first == '$') && chars.all(is_part) && !RESERVED.contains(&name)
}

#[wasm_bindgen::prelude::wasm_bindgen(inline_js = r#"
export function lookup_global_binding(name) {
  try {
    const value = (0, eval)(`typeof ${name} === "function" ? ${name} : undefined`);
    return typeof value === "function" ? value : undefined;
  } catch (_e) {
    return undefined;
  }
}
"#)]
extern "C" {
    fn lookup_global_binding(name: &str) -> JsValue;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn press(key: &str, shift: bool) -> KeyPress<'_> {
        KeyPress {
            key,
            shift,
            composing: false,
        }
    }

    #[test]
    fn enter_sends_and_shift_enter_breaks_line() {
        assert_eq!(composer_key(KeyPress::enter()), ComposerKey::Send);
        assert_eq!(composer_key(press("Enter", true)), ComposerKey::Newline);
        assert_eq!(composer_key(press("a", false)), ComposerKey::Other);
        assert_eq!(composer_key(press("Escape", true)), ComposerKey::Other);
    }

    #[test]
    fn enter_during_ime_composition_is_not_a_send() {
        let composing = KeyPress {
            composing: true,
            ..KeyPress::enter()
        };
        assert_eq!(composer_key(composing), ComposerKey::Other);
    }

    #[test]
    fn enter_invokes_search_exactly_once() {
        let calls = Cell::new(0);
        let outcome = dispatch_search(KeyPress::enter(), || {
            Some(|| {
                calls.set(calls.get() + 1);
                Ok(())
            })
        });
        assert_eq!(outcome, Ok(SearchOutcome::Invoked));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn shift_enter_still_searches() {
        let calls = Cell::new(0);
        let outcome = dispatch_search(press("Enter", true), || {
            Some(|| {
                calls.set(calls.get() + 1);
                Ok(())
            })
        });
        assert_eq!(outcome, Ok(SearchOutcome::Invoked));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn missing_search_function_is_tolerated() {
        let outcome = dispatch_search(KeyPress::enter(), || None::<fn() -> Result<(), String>>);
        assert_eq!(outcome, Ok(SearchOutcome::Unavailable));
    }

    #[test]
    fn other_keys_never_resolve_the_function() {
        let resolved = Cell::new(false);
        let outcome = dispatch_search(press("k", false), || {
            resolved.set(true);
            None::<fn() -> Result<(), String>>
        });
        assert_eq!(outcome, Ok(SearchOutcome::Ignored));
        assert!(!resolved.get());
    }

    #[test]
    fn only_plain_identifiers_are_evaluated() {
        assert!(is_identifier("aiSearch"));
        assert!(is_identifier("_search$2"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier("ai-search"));
        assert!(!is_identifier("alert(1)"));
        assert!(!is_identifier("return"));
    }

    #[test]
    fn search_errors_propagate_to_the_caller() {
        let outcome = dispatch_search(KeyPress::enter(), || Some(|| Err("boom".to_string())));
        assert_eq!(outcome, Err("boom".to_string()));
    }
}
