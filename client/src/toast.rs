use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement};

use kidsboard_shared::notice::NoticeLevel;
use kidsboard_shared::Notice;

use crate::dom::create_element;

/// Stack of transient notices in the corner of the page.
#[derive(Clone)]
pub struct Toasts {
    document: Document,
    container: HtmlElement,
}

impl Toasts {
    pub fn new(document: Document, container: HtmlElement) -> Self {
        Self {
            document,
            container,
        }
    }

    pub fn show(&self, notice: &Notice) {
        let Some(toast) = create_element::<HtmlElement>(&self.document, "div") else {
            return;
        };
        let level = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "success",
            NoticeLevel::Error => "error",
        };
        let _ = toast.set_attribute("class", &format!("toast toast-{level}"));
        let _ = toast.set_attribute("role", "status");
        if let Some(icon) = create_element::<HtmlElement>(&self.document, "span") {
            let _ = icon.set_attribute("class", "toast-icon");
            icon.set_text_content(Some(notice.icon));
            let _ = toast.append_child(&icon);
        }
        if let Some(text) = create_element::<HtmlElement>(&self.document, "p") {
            text.set_text_content(Some(&notice.text));
            let _ = toast.append_child(&text);
        }
        let _ = self.container.append_child(&toast);

        let Some(window) = web_sys::window() else {
            return;
        };
        let ondismiss = Closure::once_into_js(move || toast.remove());
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            ondismiss.unchecked_ref(),
            notice.duration.millis(),
        );
    }
}
