use strum::IntoEnumIterator;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, HtmlButtonElement, HtmlElement};

use kidsboard_shared::brush::PALETTE;
use kidsboard_shared::{BrushWidth, Color};

use crate::dom::create_element;

pub enum PaletteAction {
    Color(usize),
    Width(BrushWidth),
}

pub fn render_palette(document: &Document, palette_el: &HtmlElement, selected: Color) {
    palette_el.set_inner_html("");
    for (index, named) in PALETTE.iter().enumerate() {
        let Some(button) = create_element::<HtmlButtonElement>(document, "button") else {
            continue;
        };
        let _ = button.set_attribute("type", "button");
        let _ = button.set_attribute("data-index", &index.to_string());
        let _ = button.set_attribute("aria-label", named.name);
        let _ = button.set_attribute("title", named.name);
        let active = named.hex.parse::<Color>().is_ok_and(|color| color == selected);
        let class_name = if active { "swatch active" } else { "swatch" };
        let _ = button.set_attribute("class", class_name);
        let _ = button.style().set_property("background", named.hex);
        let _ = palette_el.append_child(&button);
    }
}

pub fn render_widths(document: &Document, widths_el: &HtmlElement, selected: BrushWidth) {
    widths_el.set_inner_html("");
    for width in BrushWidth::iter() {
        let Some(button) = create_element::<HtmlButtonElement>(document, "button") else {
            continue;
        };
        let px = width.px();
        let _ = button.set_attribute("type", "button");
        let _ = button.set_attribute("data-width", &px.to_string());
        let _ = button.set_attribute("aria-label", &format!("Brush size {px}"));
        let class_name = if width == selected {
            "width-option active"
        } else {
            "width-option"
        };
        let _ = button.set_attribute("class", class_name);
        if let Some(dot) = create_element::<HtmlElement>(document, "span") {
            let _ = dot.set_attribute("class", "width-dot");
            let _ = dot.style().set_property("width", &format!("{px}px"));
            let _ = dot.style().set_property("height", &format!("{px}px"));
            let _ = button.append_child(&dot);
        }
        let _ = widths_el.append_child(&button);
    }
}

pub fn palette_action_from_event(event: &Event) -> Option<PaletteAction> {
    let mut current = event
        .target()
        .and_then(|target| target.dyn_into::<Element>().ok());
    while let Some(element) = current {
        if let Some(index) = element.get_attribute("data-index") {
            return index.parse::<usize>().ok().map(PaletteAction::Color);
        }
        if let Some(px) = element.get_attribute("data-width") {
            return px
                .parse::<u32>()
                .ok()
                .and_then(BrushWidth::from_px)
                .map(PaletteAction::Width);
        }
        current = element.parent_element();
    }
    None
}
