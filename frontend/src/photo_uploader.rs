//! Drag & drop photo uploader with a live preview grid.
//!
//! Data flows: drop / picker change → `PhotoSelection::begin` → one `FileReader` per image →
//! `PhotoSelection::complete` → preview item inserted in selection order.

use std::cell::RefCell;
use std::rc::Rc;

use futures::channel::oneshot;
use shared::UploaderSection;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{Document, DragEvent, Event, EventTarget, File, FileList, FileReader, HtmlElement, HtmlImageElement, HtmlInputElement, MouseEvent, Node};

use crate::dom::{self, EventListener, js_error};

/// Identifies one file selection. Reads started for an older generation are discarded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Generation(u64);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// Too many files: nothing is kept, the input and the grid are cleared.
    Rejected { count: usize },
    /// Indices (into the selection) of the files that get a preview.
    Accepted {
        generation: Generation,
        image_slots: Vec<usize>,
    },
}

pub fn is_image_type(media_type: &str) -> bool {
    media_type.starts_with("image/")
}

/// DOM-free bookkeeping for the current selection and its rendered previews.
#[derive(Debug)]
pub struct PhotoSelection {
    max_photos: usize,
    generation: Generation,
    // Selection indices already rendered, sorted; position == child index in the grid
    rendered_slots: Vec<usize>,
}

impl PhotoSelection {
    pub fn new(max_photos: usize) -> Self {
        Self {
            max_photos,
            generation: Generation::default(),
            rendered_slots: Vec::new(),
        }
    }

    /// Start a new selection from the media types of the chosen files, in selection order.
    /// Always invalidates reads from earlier selections, including when the selection is rejected.
    pub fn begin<S: AsRef<str>>(&mut self, media_types: &[S]) -> SelectionOutcome {
        self.generation = Generation(self.generation.0 + 1);
        self.rendered_slots.clear();

        if media_types.len() > self.max_photos {
            return SelectionOutcome::Rejected {
                count: media_types.len(),
            };
        }

        let image_slots = media_types
            .iter()
            .enumerate()
            .filter(|(_, media_type)| is_image_type(media_type.as_ref()))
            .map(|(slot, _)| slot)
            .collect();
        SelectionOutcome::Accepted {
            generation: self.generation,
            image_slots,
        }
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.generation == generation
    }

    /// Record a finished read. Returns the grid index to insert the preview at,
    /// or `None` when the read is stale or the slot was already rendered.
    pub fn complete(&mut self, generation: Generation, slot: usize) -> Option<usize> {
        if !self.is_current(generation) {
            return None;
        }
        match self.rendered_slots.binary_search(&slot) {
            Ok(_) => None,
            Err(position) => {
                self.rendered_slots.insert(position, slot);
                Some(position)
            }
        }
    }

    pub fn preview_count(&self) -> usize {
        self.rendered_slots.len()
    }
}

struct UploaderState {
    drop_zone: HtmlElement,
    file_input: HtmlInputElement,
    preview_grid: HtmlElement,
    config: UploaderSection,
    selection: RefCell<PhotoSelection>,
}

/// Photo uploader bound to a drop zone, a file input and a preview grid.
/// Disabled (no listeners) when any of the three is missing.
pub struct PhotoUploader {
    listeners: Vec<EventListener>,
}

impl PhotoUploader {
    pub fn from_document(document: &Document, config: &UploaderSection) -> Result<Self, String> {
        Self::new(
            dom::element_by_id(document, &config.drop_zone_id),
            dom::element_by_id(document, &config.file_input_id),
            dom::element_by_id(document, &config.preview_grid_id),
            config.clone(),
        )
    }

    pub fn new(
        drop_zone: Option<HtmlElement>,
        file_input: Option<HtmlInputElement>,
        preview_grid: Option<HtmlElement>,
        config: UploaderSection,
    ) -> Result<Self, String> {
        let (Some(drop_zone), Some(file_input), Some(preview_grid)) = (drop_zone, file_input, preview_grid) else {
            zoon::println!("[Uploader] Drop zone, file input or preview grid missing, uploader disabled");
            return Ok(Self::disabled());
        };

        let state = Rc::new(UploaderState {
            selection: RefCell::new(PhotoSelection::new(config.max_photos)),
            drop_zone,
            file_input,
            preview_grid,
            config,
        });
        let drop_zone_target: EventTarget = state.drop_zone.clone().into();
        let file_input_target: EventTarget = state.file_input.clone().into();

        let listeners = vec![
            EventListener::typed(&drop_zone_target, "click", {
                let state = Rc::clone(&state);
                move |_event: MouseEvent| state.file_input.click()
            })?,
            EventListener::typed(&drop_zone_target, "dragover", {
                let state = Rc::clone(&state);
                move |event: DragEvent| {
                    event.prevent_default();
                    let _ = state.drop_zone.class_list().add_1(&state.config.active_class);
                }
            })?,
            EventListener::new(&drop_zone_target, "dragleave", {
                let state = Rc::clone(&state);
                move |_event: Event| {
                    let _ = state.drop_zone.class_list().remove_1(&state.config.active_class);
                }
            })?,
            EventListener::typed(&drop_zone_target, "drop", {
                let state = Rc::clone(&state);
                move |event: DragEvent| {
                    event.prevent_default();
                    let _ = state.drop_zone.class_list().remove_1(&state.config.active_class);
                    let Some(files) = event.data_transfer().and_then(|transfer| transfer.files()) else {
                        return;
                    };
                    // Keep the dropped files on the input so the form submits them
                    state.file_input.set_files(Some(&files));
                    if let Err(error) = handle_files(&state, &files) {
                        zoon::eprintln!("[Uploader] Failed to handle dropped files: {error}");
                    }
                }
            })?,
            EventListener::new(&file_input_target, "change", {
                let state = Rc::clone(&state);
                move |_event: Event| {
                    let Some(files) = state.file_input.files() else {
                        return;
                    };
                    if let Err(error) = handle_files(&state, &files) {
                        zoon::eprintln!("[Uploader] Failed to handle selected files: {error}");
                    }
                }
            })?,
        ];

        Ok(Self { listeners })
    }

    fn disabled() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.listeners.is_empty()
    }
}

fn handle_files(state: &Rc<UploaderState>, files: &FileList) -> Result<(), String> {
    let files: Vec<File> = (0..files.length()).filter_map(|index| files.get(index)).collect();
    let media_types: Vec<String> = files.iter().map(|file| file.type_()).collect();
    let outcome = state.selection.borrow_mut().begin(&media_types);

    match outcome {
        SelectionOutcome::Rejected { count } => {
            zoon::println!(
                "[Uploader] Rejected {count} files, at most {} allowed",
                state.config.max_photos
            );
            state.file_input.set_value("");
            dom::remove_children(&state.preview_grid);
            let notice = state.config.rejection_notice();
            if let Err(error) = dom::window().and_then(|window| window.alert_with_message(&notice).map_err(js_error)) {
                zoon::eprintln!("[Uploader] Failed to show rejection notice: {error}");
            }
        }
        SelectionOutcome::Accepted {
            generation,
            image_slots,
        } => {
            dom::remove_children(&state.preview_grid);
            for slot in image_slots {
                let file = files[slot].clone();
                let state = Rc::clone(state);
                wasm_bindgen_futures::spawn_local(async move {
                    match read_as_data_url(&file).await {
                        Ok(data_url) => {
                            if let Err(error) = append_preview(&state, generation, slot, &data_url) {
                                zoon::eprintln!("[Uploader] Failed to render preview for '{}': {error}", file.name());
                            }
                        }
                        Err(error) => {
                            zoon::eprintln!("[Uploader] Failed to read '{}': {error}", file.name());
                        }
                    }
                });
            }
        }
    }
    Ok(())
}

fn append_preview(state: &UploaderState, generation: Generation, slot: usize, data_url: &str) -> Result<(), String> {
    let Some(position) = state.selection.borrow_mut().complete(generation, slot) else {
        return Ok(());
    };

    let document = dom::document()?;
    let item = document.create_element("div").map_err(js_error)?;
    item.set_class_name(&state.config.preview_item_class);
    let image = document
        .create_element("img")
        .map_err(js_error)?
        .dyn_into::<HtmlImageElement>()
        .map_err(|_| "Created element is not an <img>".to_string())?;
    image.set_src(data_url);
    image.set_alt("");
    item.append_child(&image).map_err(js_error)?;

    let reference: Option<Node> = state
        .preview_grid
        .children()
        .item(position as u32)
        .map(Into::into);
    state
        .preview_grid
        .insert_before(&item, reference.as_ref())
        .map_err(js_error)?;
    Ok(())
}

/// Read a file as a `data:` URL, bridging `FileReader` callbacks into a future.
async fn read_as_data_url(file: &File) -> Result<String, String> {
    let reader = FileReader::new().map_err(js_error)?;
    let (sender, receiver) = oneshot::channel::<Result<String, String>>();
    let sender = Rc::new(RefCell::new(Some(sender)));

    let on_load = Closure::wrap(Box::new({
        let sender = Rc::clone(&sender);
        let reader = reader.clone();
        move |_event: Event| {
            let result = reader
                .result()
                .map_err(js_error)
                .and_then(|value| value.as_string().ok_or_else(|| "Read result is not a string".to_string()));
            if let Some(sender) = sender.borrow_mut().take() {
                let _ = sender.send(result);
            }
        }
    }) as Box<dyn FnMut(Event)>);
    let on_error = Closure::wrap(Box::new({
        let sender = Rc::clone(&sender);
        let reader = reader.clone();
        move |_event: Event| {
            let message = reader
                .error()
                .map(|error| error.message())
                .unwrap_or_else(|| "unknown read error".to_string());
            if let Some(sender) = sender.borrow_mut().take() {
                let _ = sender.send(Err(message));
            }
        }
    }) as Box<dyn FnMut(Event)>);

    reader.set_onload(Some(on_load.as_ref().unchecked_ref()));
    reader.set_onerror(Some(on_error.as_ref().unchecked_ref()));
    reader.read_as_data_url(file).map_err(js_error)?;

    let result = receiver
        .await
        .unwrap_or_else(|_| Err("File read was abandoned".to_string()));
    reader.set_onload(None);
    reader.set_onerror(None);
    result
}
