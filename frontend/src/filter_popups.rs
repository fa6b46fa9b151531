//! Anchored filter popups: at most one open, dismissed by any click outside popups and triggers.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexSet;
use shared::PopupSection;
use web_sys::{Document, EventTarget, HtmlElement, MouseEvent};

use crate::dom::{self, EventListener, js_error};

/// Where a click landed, relative to the popups and their trigger buttons.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClickTarget {
    pub inside_popup: bool,
    pub inside_trigger: bool,
}

impl ClickTarget {
    pub fn is_outside(&self) -> bool {
        !self.inside_popup && !self.inside_trigger
    }
}

/// Open-popup bookkeeping, independent of the DOM.
#[derive(Debug, Default)]
pub struct FilterPopups {
    open: IndexSet<String>,
}

impl FilterPopups {
    /// Open `id`, closing every other popup. Returns the ids that were closed.
    pub fn open(&mut self, id: &str) -> Vec<String> {
        let closed = self
            .close_all()
            .into_iter()
            .filter(|open_id| open_id != id)
            .collect();
        self.open.insert(id.to_string());
        closed
    }

    pub fn close_all(&mut self) -> Vec<String> {
        self.open.drain(..).collect()
    }

    /// Returns `true` when the click dismisses the popups.
    pub fn handle_global_click(&mut self, target: ClickTarget) -> bool {
        if !target.is_outside() {
            return false;
        }
        self.close_all();
        true
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.open.contains(id)
    }

    pub fn open_ids(&self) -> impl Iterator<Item = &str> {
        self.open.iter().map(String::as_str)
    }
}

/// Trigger button geometry, from its `offset*` properties.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnchorBox {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl AnchorBox {
    pub fn of(element: &HtmlElement) -> Self {
        Self {
            top: f64::from(element.offset_top()),
            left: f64::from(element.offset_left()),
            width: f64::from(element.offset_width()),
            height: f64::from(element.offset_height()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PopupPlacement {
    pub top: f64,
    pub left: f64,
}

impl PopupPlacement {
    /// Just below the anchor, `gap` pixels down, with `left` at the anchor's horizontal center.
    pub fn below(anchor: AnchorBox, gap: f64) -> Self {
        Self {
            top: anchor.top + anchor.height + gap,
            left: anchor.left + anchor.width / 2.0,
        }
    }
}

struct PopupLayerState {
    config: PopupSection,
    popups: RefCell<FilterPopups>,
}

/// Page-wide popup behavior: `openFilter` plus outside-click dismissal on the document.
pub struct PopupLayer {
    state: Rc<PopupLayerState>,
    _document_click: EventListener,
}

impl PopupLayer {
    pub fn new(document: &Document, config: PopupSection) -> Result<Self, String> {
        let state = Rc::new(PopupLayerState {
            config,
            popups: RefCell::new(FilterPopups::default()),
        });
        let document_target: EventTarget = document.clone().into();

        let document_click = EventListener::typed(&document_target, "click", {
            let state = Rc::clone(&state);
            move |event: MouseEvent| {
                let Some(target) = event.target() else {
                    return;
                };
                let click = ClickTarget {
                    inside_popup: dom::is_within_class(&target, &state.config.popup_class),
                    inside_trigger: dom::is_within_class(&target, &state.config.trigger_class),
                };
                if state.popups.borrow_mut().handle_global_click(click) {
                    if let Err(error) = hide_all(&state.config) {
                        zoon::eprintln!("[Popups] Failed to dismiss popups: {error}");
                    }
                }
            }
        })?;

        Ok(Self {
            state,
            _document_click: document_click,
        })
    }

    /// Hide every popup, then show `filter-<id>` below `button` if that popup exists.
    pub fn open_filter(&self, id: &str, button: &HtmlElement) -> Result<(), String> {
        let config = &self.state.config;
        self.state.popups.borrow_mut().close_all();
        hide_all(config)?;

        let document = dom::document()?;
        let Some(popup) = dom::element_by_id::<HtmlElement>(&document, &config.popup_element_id(id)) else {
            zoon::println!("[Popups] No popup for filter '{id}'");
            return Ok(());
        };

        self.state.popups.borrow_mut().open(id);
        let placement = PopupPlacement::below(AnchorBox::of(button), config.gap);
        let style = popup.style();
        style.set_property("display", "block").map_err(js_error)?;
        style
            .set_property("top", &format!("{}px", placement.top))
            .map_err(js_error)?;
        style
            .set_property("left", &format!("{}px", placement.left))
            .map_err(js_error)?;
        Ok(())
    }
}

fn hide_all(config: &PopupSection) -> Result<(), String> {
    let document = dom::document()?;
    for popup in dom::elements_with_class(&document, &config.popup_class)? {
        dom::set_display(&popup, "none")?;
    }
    Ok(())
}


#[cfg(all(test, target_arch = "wasm32"))]
mod dom_tests {
    use super::*;
    use crate::dom::fixtures;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    struct Fixture {
        layer: PopupLayer,
        popups: Vec<HtmlElement>,
        button: HtmlElement,
        outside: HtmlElement,
    }

    impl Fixture {
        /// Popups `<prefix>x` and `<prefix>y`, a trigger button and an unrelated element.
        fn mount(name: &str) -> Self {
            let config = PopupSection {
                popup_class: format!("{name}-popup"),
                popup_id_prefix: format!("{name}-"),
                trigger_class: format!("{name}-trigger"),
                gap: 10.0,
            };
            let popups = ["x", "y"]
                .into_iter()
                .map(|id| {
                    let popup: HtmlElement = fixtures::attach("div", &config.popup_element_id(id));
                    popup.set_class_name(&config.popup_class);
                    popup
                })
                .collect();
            let button: HtmlElement = fixtures::attach("button", &format!("{name}-button"));
            button.set_class_name(&config.trigger_class);
            let outside: HtmlElement = fixtures::attach("div", &format!("{name}-outside"));

            let layer = PopupLayer::new(&fixtures::document(), config).unwrap();
            Self {
                layer,
                popups,
                button,
                outside,
            }
        }

        fn display(&self, index: usize) -> String {
            self.popups[index].style().get_property_value("display").unwrap()
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            for popup in &self.popups {
                popup.remove();
            }
            self.button.remove();
            self.outside.remove();
        }
    }

    #[wasm_bindgen_test]
    fn opening_second_popup_hides_first() {
        let fixture = Fixture::mount("switch");
        fixture.layer.open_filter("x", &fixture.button).unwrap();
        assert_eq!(fixture.display(0), "block");

        fixture.layer.open_filter("y", &fixture.button).unwrap();
        assert_eq!(fixture.display(0), "none");
        assert_eq!(fixture.display(1), "block");

        let placement = PopupPlacement::below(AnchorBox::of(&fixture.button), 10.0);
        let style = fixture.popups[1].style();
        assert_eq!(style.get_property_value("top").unwrap(), format!("{}px", placement.top));
        assert_eq!(style.get_property_value("left").unwrap(), format!("{}px", placement.left));
    }

    #[wasm_bindgen_test]
    fn unknown_popup_only_hides_others() {
        let fixture = Fixture::mount("unknown");
        fixture.layer.open_filter("x", &fixture.button).unwrap();
        fixture.layer.open_filter("missing", &fixture.button).unwrap();
        assert_eq!(fixture.display(0), "none");
        assert_eq!(fixture.display(1), "none");
    }

    #[wasm_bindgen_test]
    fn outside_click_hides_open_popup() {
        let fixture = Fixture::mount("dismiss");
        fixture.layer.open_filter("x", &fixture.button).unwrap();

        fixture.button.click();
        assert_eq!(fixture.display(0), "block");
        fixture.popups[0].click();
        assert_eq!(fixture.display(0), "block");

        fixture.outside.click();
        assert_eq!(fixture.display(0), "none");
    }
}
