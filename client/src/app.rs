use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::str::FromStr;

use js_sys::Reflect;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Document, Element, Event, HtmlButtonElement, HtmlCanvasElement,
    HtmlElement, Window,
};

use strum::IntoEnumIterator;

use kidsboard_shared::shell::{mascot_waving, WAVE_DURATION_MS};
use kidsboard_shared::{
    AppConfig, Conversation, DrawingSurface, Gateway, ImageIntake, Shell, Tab,
};

use crate::dom::{create_element, get_element, set_hidden};
use crate::net::FetchTransport;
use crate::state::{ChatPanel, DrawPanel, State, Ui, UploadPanel};
use crate::toast::Toasts;
use crate::util::{debug_enabled, now};
use crate::{chat_panel, draw_panel, upload_panel};

const CONFIG_ELEMENT_ID: &str = "kidsboard-config";

fn document_ready_state(document: &Document) -> Option<String> {
    Reflect::get(document.as_ref(), &JsValue::from_str("readyState"))
        .ok()?
        .as_string()
}

fn init_logging(debug: bool) {
    let level = if debug {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    if console_log::init_with_level(level).is_err() {
        web_sys::console::warn_1(&"logger already initialized".into());
    }
}

/// Reads the JSON config embedded in the page. Falls back to defaults when it
/// is absent or invalid.
fn load_config(document: &Document) -> AppConfig {
    let Some(element) = document.get_element_by_id(CONFIG_ELEMENT_ID) else {
        log::info!("no #{CONFIG_ELEMENT_ID} element, using defaults");
        return AppConfig::default();
    };
    let text = element.text_content().unwrap_or_default();
    match AppConfig::from_json(&text) {
        Ok(config) => config,
        Err(err) => {
            log::error!("ignoring #{CONFIG_ELEMENT_ID}: {err}");
            AppConfig::default()
        }
    }
}

#[wasm_bindgen(start)]
pub fn run() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;
    let started = Rc::new(Cell::new(false));

    if document_ready_state(&document).as_deref() == Some("complete") {
        started.set(true);
        return start_app();
    }

    let onload_started = started.clone();
    let onload = Closure::<dyn FnMut(Event)>::new(move |_| {
        if onload_started.replace(true) {
            return;
        }
        if let Err(err) = start_app() {
            web_sys::console::error_1(&err);
        }
    });
    window.add_event_listener_with_callback("load", onload.as_ref().unchecked_ref())?;
    onload.forget();

    Ok(())
}

fn start_app() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;

    let config = load_config(&document);
    init_logging(config.debug || debug_enabled(&window));
    if config.api_key.is_none() {
        log::warn!("no API key configured; analysis and chat will fail");
    }
    log::debug!(
        "config endpoint={} model={} upload_limit={}",
        config.endpoint,
        config.model,
        config.upload_limit_bytes
    );

    let canvas: HtmlCanvasElement = get_element(&document, "board")?;
    let ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("Missing canvas context"))?
        .dyn_into::<CanvasRenderingContext2d>()?;

    let toasts = Toasts::new(document.clone(), get_element(&document, "toasts")?);
    let ui = Ui {
        toasts,
        mascot: get_element(&document, "mascot")?,
        mascot_message: get_element(&document, "mascotMessage")?,
        tab_buttons: get_element(&document, "tabs")?,
        draw_panel: get_element(&document, "panel-draw")?,
        upload_panel: get_element(&document, "panel-upload")?,
        chat_panel: get_element(&document, "panel-chat")?,
        palette: get_element(&document, "palette")?,
        widths: get_element(&document, "widths")?,
        color_input: get_element(&document, "color")?,
        sparkle_button: get_element(&document, "sparkle")?,
        analyze_drawing: get_element(&document, "analyzeDrawing")?,
        drop_zone: get_element(&document, "dropZone")?,
        file_input: get_element(&document, "fileInput")?,
        preview: get_element(&document, "preview")?,
        preview_wrap: get_element(&document, "previewWrap")?,
        analyze_image: get_element(&document, "analyzeImage")?,
        messages: get_element(&document, "messages")?,
        chat_input: get_element(&document, "chatInput")?,
        send_button: get_element(&document, "send")?,
        document: document.clone(),
    };

    let state = Rc::new(RefCell::new(State {
        shell: Shell::default(),
        draw: DrawPanel {
            surface: DrawingSurface::new(),
            canvas,
            ctx,
            pointer_id: None,
        },
        upload: UploadPanel {
            intake: ImageIntake::new(config.upload_limit_bytes),
            pending: None,
        },
        chat: ChatPanel {
            conversation: Conversation::new(now()),
        },
    }));
    let gateway = Rc::new(Gateway::new(config.gateway_config(), FetchTransport));

    draw_panel::bind(&window, &state, &ui, &gateway)?;
    upload_panel::bind(&state, &ui, &gateway)?;
    chat_panel::bind(&state, &ui, &gateway)?;
    bind_tabs(&window, &state, &ui)?;
    start_mascot(&window, &ui)?;

    {
        let mut state = state.borrow_mut();
        let active = state.shell.active();
        show_tab(&ui, active);
        if active == Tab::Draw {
            draw_panel::mount(&window, &mut state, &ui);
        }
    }

    log::info!("kidsboard started");
    Ok(())
}

fn tab_from_event(event: &Event) -> Option<Tab> {
    let mut current = event
        .target()
        .and_then(|target| target.dyn_into::<Element>().ok());
    while let Some(element) = current {
        if let Some(id) = element.get_attribute("data-tab") {
            return Tab::from_str(&id).ok();
        }
        current = element.parent_element();
    }
    None
}

fn render_tabs(ui: &Ui) {
    ui.tab_buttons.set_inner_html("");
    for tab in Tab::iter() {
        let Some(button) = create_element::<HtmlButtonElement>(&ui.document, "button") else {
            continue;
        };
        let _ = button.set_attribute("type", "button");
        let _ = button.set_attribute("role", "tab");
        let _ = button.set_attribute("data-tab", tab.as_ref());
        button.set_text_content(Some(&format!("{} {}", tab.icon(), tab.label())));
        let _ = ui.tab_buttons.append_child(&button);
    }
}

fn show_tab(ui: &Ui, active: Tab) {
    for (tab, panel) in [
        (Tab::Draw, &ui.draw_panel),
        (Tab::Upload, &ui.upload_panel),
        (Tab::Chat, &ui.chat_panel),
    ] {
        set_hidden(panel, tab != active);
    }
    if let Ok(buttons) = ui.tab_buttons.query_selector_all("[data-tab]") {
        for index in 0..buttons.length() {
            let Some(button) = buttons
                .get(index)
                .and_then(|node| node.dyn_into::<Element>().ok())
            else {
                continue;
            };
            let selected = button.get_attribute("data-tab").as_deref() == Some(active.as_ref());
            let _ = button.set_attribute("aria-selected", if selected { "true" } else { "false" });
        }
    }
    ui.mascot_message
        .set_text_content(Some(active.mascot_message()));
}

/// Leaving a panel unmounts it: its state is reset and any request it still
/// has in flight is forgotten.
fn switch_tab(window: &Window, state: &mut State, ui: &Ui, tab: Tab) {
    let Some(previous) = state.shell.select(tab) else {
        return;
    };
    match previous {
        Tab::Draw => draw_panel::unmount(state, ui),
        Tab::Upload => upload_panel::reset(state, ui),
        Tab::Chat => chat_panel::reset(state, ui),
    }
    show_tab(ui, tab);
    if tab == Tab::Draw {
        draw_panel::mount(window, state, ui);
    }
}

fn bind_tabs(window: &Window, state: &Rc<RefCell<State>>, ui: &Ui) -> Result<(), JsValue> {
    render_tabs(ui);
    let state = state.clone();
    let ui_cb = ui.clone();
    let window_cb = window.clone();
    let onclick = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        let Some(tab) = tab_from_event(&event) else {
            return;
        };
        switch_tab(&window_cb, &mut state.borrow_mut(), &ui_cb, tab);
    });
    ui.tab_buttons
        .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
    onclick.forget();
    Ok(())
}

fn start_mascot(window: &Window, ui: &Ui) -> Result<(), JsValue> {
    let mascot: HtmlElement = ui.mascot.clone();
    let started = js_sys::Date::now();
    let ontick = Closure::<dyn FnMut()>::new(move || {
        let elapsed = (js_sys::Date::now() - started).max(0.0) as u64;
        let waving = mascot_waving(elapsed);
        let _ = mascot
            .class_list()
            .toggle_with_force("waving", waving);
    });
    window.set_interval_with_callback_and_timeout_and_arguments_0(
        ontick.as_ref().unchecked_ref(),
        (WAVE_DURATION_MS / 4) as i32,
    )?;
    ontick.forget();
    Ok(())
}
