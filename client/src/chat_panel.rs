use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Element, Event, HtmlButtonElement, HtmlElement, KeyboardEvent, ScrollBehavior,
    ScrollIntoViewOptions,
};

use kidsboard_shared::conversation::{ReplyOutcome, CHAT_STARTERS, VISIBLE_STARTERS};
use kidsboard_shared::{Conversation, Gateway};

use crate::dom::{create_element, get_element, set_busy};
use crate::net::FetchTransport;
use crate::state::{State, Ui};
use crate::util::{format_time, now};

pub fn reset(state: &mut State, ui: &Ui) {
    state.chat.conversation.reset(now());
    ui.chat_input.set_value("");
    set_waiting(ui, false);
    render_messages(ui, &state.chat.conversation);
}

fn set_waiting(ui: &Ui, waiting: bool) {
    ui.chat_input.set_disabled(waiting);
    set_busy(&ui.send_button, waiting);
}

pub fn render_messages(ui: &Ui, conversation: &Conversation) {
    ui.messages.set_inner_html("");
    let mut last: Option<HtmlElement> = None;
    for message in conversation.messages() {
        let Some(bubble) = create_element::<HtmlElement>(&ui.document, "div") else {
            continue;
        };
        let class_name = if message.from_user() {
            "message user"
        } else {
            "message bot"
        };
        let _ = bubble.set_attribute("class", class_name);
        if let Some(text) = create_element::<HtmlElement>(&ui.document, "p") {
            text.set_text_content(Some(message.text()));
            let _ = bubble.append_child(&text);
        }
        if let Some(time) = create_element::<HtmlElement>(&ui.document, "p") {
            let _ = time.set_attribute("class", "message-time");
            time.set_text_content(Some(&format_time(message.timestamp())));
            let _ = bubble.append_child(&time);
        }
        let _ = ui.messages.append_child(&bubble);
        last = Some(bubble);
    }
    if let Some(last) = last {
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        last.scroll_into_view_with_scroll_into_view_options(&options);
    }
}

fn render_starters(ui: &Ui, starters_el: &HtmlElement) {
    starters_el.set_inner_html("");
    for (index, starter) in CHAT_STARTERS.iter().take(VISIBLE_STARTERS).enumerate() {
        let Some(button) = create_element::<HtmlButtonElement>(&ui.document, "button") else {
            continue;
        };
        let _ = button.set_attribute("type", "button");
        let _ = button.set_attribute("class", "starter");
        let _ = button.set_attribute("data-starter", &index.to_string());
        button.set_text_content(Some(starter));
        let _ = starters_el.append_child(&button);
    }
}

fn starter_from_event(event: &Event) -> Option<usize> {
    let mut current = event
        .target()
        .and_then(|target| target.dyn_into::<Element>().ok());
    while let Some(element) = current {
        if let Some(index) = element.get_attribute("data-starter") {
            return index.parse().ok();
        }
        current = element.parent_element();
    }
    None
}

fn send(state: &Rc<RefCell<State>>, ui: &Ui, gateway: &Rc<Gateway<FetchTransport>>) {
    let request = {
        let mut state = state.borrow_mut();
        let conversation = &mut state.chat.conversation;
        conversation.set_input(ui.chat_input.value());
        let request = conversation.send(now());
        if request.is_some() {
            render_messages(ui, conversation);
        }
        request
    };
    let Some(request) = request else {
        return;
    };
    ui.chat_input.set_value("");
    set_waiting(ui, true);

    let state = state.clone();
    let ui = ui.clone();
    let gateway = gateway.clone();
    wasm_bindgen_futures::spawn_local(async move {
        let result = gateway.chat(&request.text).await;
        let mut state = state.borrow_mut();
        let conversation = &mut state.chat.conversation;
        match conversation.finish(request.ticket, result, now()) {
            ReplyOutcome::Appended => {
                set_waiting(&ui, false);
                render_messages(&ui, conversation);
            }
            ReplyOutcome::Failed(notice) => {
                set_waiting(&ui, false);
                ui.toasts.show(&notice);
            }
            ReplyOutcome::Stale => {}
        }
    });
}

pub fn bind(
    state: &Rc<RefCell<State>>,
    ui: &Ui,
    gateway: &Rc<Gateway<FetchTransport>>,
) -> Result<(), JsValue> {
    let starters_el: HtmlElement = get_element(&ui.document, "starters")?;
    render_starters(ui, &starters_el);
    render_messages(ui, &state.borrow().chat.conversation);

    {
        let state = state.clone();
        let ui_cb = ui.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let Some(index) = starter_from_event(&event) else {
                return;
            };
            let mut state = state.borrow_mut();
            let conversation = &mut state.chat.conversation;
            if conversation.use_starter(index) {
                ui_cb.chat_input.set_value(conversation.input());
                let _ = ui_cb.chat_input.focus();
            }
        });
        starters_el.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let state = state.clone();
        let ui_cb = ui.clone();
        let gateway = gateway.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            send(&state, &ui_cb, &gateway);
        });
        ui.send_button
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let state = state.clone();
        let ui_cb = ui.clone();
        let gateway = gateway.clone();
        let onkeydown = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
            if event.key() != "Enter" || event.is_composing() {
                return;
            }
            event.prevent_default();
            send(&state, &ui_cb, &gateway);
        });
        ui.chat_input
            .add_event_listener_with_callback("keydown", onkeydown.as_ref().unchecked_ref())?;
        onkeydown.forget();
    }

    Ok(())
}
