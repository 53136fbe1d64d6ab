//! Live browser backend, compiled for `wasm32` only.
//!
//! [`start`] is the page-script entry point: it wires a capture-phase
//! `keydown` listener and a subtree-wide `MutationObserver` to one
//! [`Assistant`].

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Element, HtmlElement, HtmlInputElement, HtmlTextAreaElement, KeyboardEvent,
    MutationObserver, MutationObserverInit, MutationRecord, Window,
};

use pastefocus_core::{Config, Error, Result};

use crate::assistant::Assistant;
use crate::dom::{Document, ElementState, MutationBatch};
use crate::patterns::CandidatePattern;
use crate::timer::{Scheduler, Task, TimerHandle};
use crate::trigger::KeyStroke;

fn js_error(context: &str, err: JsValue) -> Error {
    Error::Dom(format!("{}: {:?}", context, err))
}

pub struct WebDocument {
    window: Window,
    document: web_sys::Document,
}

impl WebDocument {
    pub fn new(window: Window) -> Result<Self> {
        let document = window
            .document()
            .ok_or_else(|| Error::Dom("window has no document".to_string()))?;
        Ok(Self { window, document })
    }

    pub fn document(&self) -> &web_sys::Document {
        &self.document
    }
}

impl Document for WebDocument {
    type Element = Element;

    fn location(&self) -> String {
        self.window.location().href().unwrap_or_default()
    }

    fn query_all(&self, pattern: &CandidatePattern) -> Vec<Element> {
        let list = match self.document.query_selector_all(&pattern.selector()) {
            Ok(list) => list,
            Err(e) => {
                warn!(pattern = %pattern, error = ?e, "Selector rejected");
                return Vec::new();
            }
        };
        (0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn state(&self, element: &Element) -> ElementState {
        let Some(html) = element.dyn_ref::<HtmlElement>() else {
            return ElementState::default();
        };
        let style = html.style();
        let inline = |property: &str| {
            style
                .get_property_value(property)
                .ok()
                .map(|value| value.trim().to_ascii_lowercase())
                .filter(|value| !value.is_empty())
        };

        let textarea = element.dyn_ref::<HtmlTextAreaElement>();
        let (disabled, read_only) = if let Some(textarea) = textarea {
            (textarea.disabled(), textarea.read_only())
        } else if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            (input.disabled(), input.read_only())
        } else {
            (false, false)
        };

        ElementState {
            rendered: html.offset_parent().is_some(),
            disabled,
            read_only,
            inline_display: inline("display"),
            inline_visibility: inline("visibility"),
        }
    }

    fn tag_name(&self, element: &Element) -> String {
        element.tag_name().to_ascii_lowercase()
    }

    fn attribute(&self, element: &Element, name: &str) -> Option<String> {
        element.get_attribute(name)
    }

    fn is_content_editable(&self, element: &Element) -> bool {
        element
            .dyn_ref::<HtmlElement>()
            .is_some_and(|html| html.content_editable() == "true")
    }

    fn active_element(&self) -> Option<Element> {
        self.document.active_element()
    }

    fn focus(&self, element: &Element) -> Result<()> {
        let html = element
            .dyn_ref::<HtmlElement>()
            .ok_or_else(|| Error::Dom("element cannot take focus".to_string()))?;
        html.focus().map_err(|e| js_error("focus", e))
    }

    fn child_count(&self, element: &Element) -> usize {
        element.child_nodes().length() as usize
    }

    fn append_empty_text(&self, element: &Element) -> Result<()> {
        let text = self.document.create_text_node("");
        element
            .append_child(&text)
            .map(|_| ())
            .map_err(|e| js_error("appendChild", e))
    }

    fn collapse_selection_to_end(&self, element: &Element) -> Result<()> {
        let range = self
            .document
            .create_range()
            .map_err(|e| js_error("createRange", e))?;
        range
            .select_node_contents(element)
            .map_err(|e| js_error("selectNodeContents", e))?;
        range.collapse_with_to_start(false);

        let selection = self
            .window
            .get_selection()
            .map_err(|e| js_error("getSelection", e))?
            .ok_or_else(|| Error::Dom("no selection object".to_string()))?;
        selection
            .remove_all_ranges()
            .map_err(|e| js_error("removeAllRanges", e))?;
        selection
            .add_range(&range)
            .map_err(|e| js_error("addRange", e))
    }

    fn value_len(&self, element: &Element) -> Option<usize> {
        if let Some(textarea) = element.dyn_ref::<HtmlTextAreaElement>() {
            Some(textarea.value().encode_utf16().count())
        } else {
            element
                .dyn_ref::<HtmlInputElement>()
                .map(|input| input.value().encode_utf16().count())
        }
    }

    fn set_selection_range(&self, element: &Element, start: usize, end: usize) -> Result<()> {
        let (start, end) = (start as u32, end as u32);
        if let Some(textarea) = element.dyn_ref::<HtmlTextAreaElement>() {
            textarea
                .set_selection_range(start, end)
                .map_err(|e| js_error("setSelectionRange", e))
        } else if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            input
                .set_selection_range(start, end)
                .map_err(|e| js_error("setSelectionRange", e))
        } else {
            Err(Error::Dom("element has no text value".to_string()))
        }
    }
}

/// `setTimeout`-backed scheduler. The timeout id doubles as the handle.
pub struct WebScheduler {
    window: Window,
}

impl WebScheduler {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl Scheduler for WebScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> Result<TimerHandle> {
        let callback = Closure::once_into_js(move || task());
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        let id = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), millis)
            .map_err(|e| js_error("setTimeout", e))?;
        Ok(TimerHandle(id as u64))
    }

    fn cancel(&self, handle: TimerHandle) {
        self.window.clear_timeout_with_handle(handle.0 as i32);
    }
}

fn summarize(records: &js_sys::Array) -> MutationBatch {
    let mut batch = MutationBatch::default();
    for record in records.iter() {
        if let Ok(record) = record.dyn_into::<MutationRecord>() {
            batch.records += 1;
            batch.added += record.added_nodes().length() as usize;
            batch.removed += record.removed_nodes().length() as usize;
        }
    }
    batch
}

/// Install the assistant on the current page.
pub fn install(config: &Config) -> Result<()> {
    config.validate()?;
    let window = web_sys::window().ok_or_else(|| Error::Dom("no window".to_string()))?;
    let document = Rc::new(WebDocument::new(window.clone())?);
    let scheduler: Rc<dyn Scheduler> = Rc::new(WebScheduler::new(window));
    let assistant = Rc::new(RefCell::new(Assistant::new(
        Rc::clone(&document),
        scheduler,
        config,
    )));
    assistant.borrow().start()?;

    let on_key = {
        let assistant = Rc::clone(&assistant);
        Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
            let key = KeyStroke {
                key: event.key(),
                ctrl: event.ctrl_key(),
                meta: event.meta_key(),
            };
            match assistant.try_borrow_mut() {
                Ok(mut assistant) => {
                    assistant.on_key_down(&key);
                }
                Err(_) => debug!("Key-down while busy, skipped"),
            }
        })
    };
    document
        .document()
        .add_event_listener_with_callback_and_bool("keydown", on_key.as_ref().unchecked_ref(), true)
        .map_err(|e| js_error("addEventListener", e))?;
    on_key.forget();

    let on_mutations = {
        let assistant = Rc::clone(&assistant);
        Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
            move |records: js_sys::Array, _observer: MutationObserver| {
                let batch = summarize(&records);
                match assistant.try_borrow_mut() {
                    Ok(mut assistant) => {
                        assistant.on_mutations(batch);
                    }
                    Err(_) => debug!("Mutations while busy, skipped"),
                }
            },
        )
    };
    let observer = MutationObserver::new(on_mutations.as_ref().unchecked_ref())
        .map_err(|e| js_error("MutationObserver", e))?;
    let options = MutationObserverInit::new();
    options.set_child_list(true);
    options.set_subtree(true);
    observer
        .observe_with_options(document.document(), &options)
        .map_err(|e| js_error("observe", e))?;
    on_mutations.forget();

    Ok(())
}

#[wasm_bindgen(start)]
pub fn start() -> std::result::Result<(), JsValue> {
    install(&Config::default()).map_err(|e| JsValue::from_str(&e.to_string()))
}
