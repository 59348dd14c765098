use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlButtonElement, HtmlCanvasElement, HtmlElement, Window};

use kidsboard_shared::geometry::SurfaceLayout;

pub fn get_element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    let element = document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Missing element: {id}")))?;
    element
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("Invalid element type: {id}")))
}

pub fn create_element<T: JsCast>(document: &Document, tag: &str) -> Option<T> {
    document.create_element(tag).ok()?.dyn_into::<T>().ok()
}

/// Disables a trigger while its request is in flight.
pub fn set_busy(button: &HtmlButtonElement, busy: bool) {
    button.set_disabled(busy);
    let value = if busy { "true" } else { "false" };
    let _ = button.set_attribute("aria-busy", value);
}

pub fn set_pressed(button: &HtmlButtonElement, pressed: bool) {
    let value = if pressed { "true" } else { "false" };
    let _ = button.set_attribute("aria-pressed", value);
}

pub fn set_hidden(element: &Element, hidden: bool) {
    if hidden {
        let _ = element.set_attribute("hidden", "");
    } else {
        let _ = element.remove_attribute("hidden");
    }
}

/// Sizes the canvas for the current viewport and returns the layout the
/// raster must be rebuilt with.
pub fn resize_canvas(window: &Window, canvas: &HtmlCanvasElement) -> SurfaceLayout {
    let viewport_width = window
        .inner_width()
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or(0.0);
    let layout = SurfaceLayout::for_viewport(viewport_width, window.device_pixel_ratio());
    canvas.set_width(layout.buffer_width);
    canvas.set_height(layout.buffer_height);
    if let Ok(element) = canvas.clone().dyn_into::<HtmlElement>() {
        let style = element.style();
        let _ = style.set_property("width", &format!("{}px", layout.display_width));
        let _ = style.set_property("height", &format!("{}px", layout.display_height));
    }
    log::debug!(
        "canvas {}x{} css, {}x{} px",
        layout.display_width,
        layout.display_height,
        layout.buffer_width,
        layout.buffer_height
    );
    layout
}

/// Top-left corner of `element` in client coordinates.
pub fn client_offset(element: &Element) -> (f64, f64) {
    let rect = element.get_bounding_client_rect();
    (rect.left(), rect.top())
}
