use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{DragEvent, Event, File, FileReader, HtmlButtonElement, ProgressEvent};

use kidsboard_shared::{FileMeta, Gateway, ImageIntake, Ticket};

use crate::dom::{get_element, set_busy, set_hidden};
use crate::net::FetchTransport;
use crate::state::{PendingRead, State, Ui};

/// Drops the picture and any read or analysis in flight. Used both by the
/// clear button and when the panel is left.
pub fn reset(state: &mut State, ui: &Ui) {
    abort_pending(state);
    state.upload.intake.clear();
    show_preview(ui, None);
    set_busy(&ui.analyze_image, false);
    show_reading(ui, &state.upload.intake);
    ui.file_input.set_value("");
}

fn show_reading(ui: &Ui, intake: &ImageIntake) {
    let value = if intake.is_reading() { "true" } else { "false" };
    let _ = ui.drop_zone.set_attribute("aria-busy", value);
}

fn abort_pending(state: &mut State) {
    if let Some(pending) = state.upload.pending.take() {
        pending.reader.set_onload(None);
        pending.reader.set_onerror(None);
        pending.reader.abort();
    }
}

fn show_preview(ui: &Ui, data_uri: Option<&str>) {
    match data_uri {
        Some(data_uri) => {
            ui.preview.set_src(data_uri);
            set_hidden(&ui.preview_wrap, false);
            set_hidden(&ui.drop_zone, true);
        }
        None => {
            ui.preview.set_src("");
            set_hidden(&ui.preview_wrap, true);
            set_hidden(&ui.drop_zone, false);
        }
    }
}

fn file_meta(file: &File) -> FileMeta {
    FileMeta {
        name: file.name(),
        media_type: file.type_(),
        size: file.size().max(0.0) as u64,
    }
}

fn read_data_uri(event: &ProgressEvent) -> Option<String> {
    let reader: FileReader = event.target()?.dyn_into().ok()?;
    reader.result().ok()?.as_string()
}

fn finish_read(state: &Rc<RefCell<State>>, ui: &Ui, ticket: Ticket, result: Result<String, String>) {
    let mut state = state.borrow_mut();
    let notice = state.upload.intake.finish_read(ticket, result);
    let Some(notice) = notice else {
        return;
    };
    state.upload.pending = None;
    show_reading(ui, &state.upload.intake);
    let data_uri = state
        .upload
        .intake
        .image()
        .map(|image| image.data_uri.clone());
    show_preview(ui, data_uri.as_deref());
    ui.toasts.show(&notice);
}

/// Drag-and-drop and the file picker both land here.
fn accept_file(state: &Rc<RefCell<State>>, ui: &Ui, file: File) {
    let meta = file_meta(&file);
    let accepted = state.borrow_mut().upload.intake.accept(&meta);
    let ticket = match accepted {
        Ok(ticket) => {
            show_reading(ui, &state.borrow().upload.intake);
            ticket
        }
        Err(err) => {
            log::info!("upload rejected: {err}");
            ui.toasts.show(&err.notice());
            return;
        }
    };
    let reader = match FileReader::new() {
        Ok(reader) => reader,
        Err(err) => {
            log::error!("FileReader unavailable: {err:?}");
            finish_read(state, ui, ticket, Err("file reader unavailable".to_string()));
            return;
        }
    };

    let onload = {
        let state = state.clone();
        let ui = ui.clone();
        Closure::<dyn FnMut(ProgressEvent)>::new(move |event: ProgressEvent| {
            let result = read_data_uri(&event).ok_or_else(|| "empty read result".to_string());
            finish_read(&state, &ui, ticket, result);
        })
    };
    let onerror = {
        let state = state.clone();
        let ui = ui.clone();
        Closure::<dyn FnMut(ProgressEvent)>::new(move |_| {
            finish_read(&state, &ui, ticket, Err("file read failed".to_string()));
        })
    };
    reader.set_onload(Some(onload.as_ref().unchecked_ref()));
    reader.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    if let Err(err) = reader.read_as_data_url(&file) {
        log::error!("could not start reading {:?}: {err:?}", meta.name);
        finish_read(state, ui, ticket, Err("file read failed".to_string()));
        return;
    }

    let mut state = state.borrow_mut();
    abort_pending(&mut state);
    state.upload.pending = Some(PendingRead {
        reader,
        onload,
        onerror,
    });
}

pub fn bind(
    state: &Rc<RefCell<State>>,
    ui: &Ui,
    gateway: &Rc<Gateway<FetchTransport>>,
) -> Result<(), JsValue> {
    let browse_button: HtmlButtonElement = get_element(&ui.document, "browse")?;
    let clear_button: HtmlButtonElement = get_element(&ui.document, "clearImage")?;

    {
        let file_input = ui.file_input.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            file_input.set_value("");
            file_input.click();
        });
        browse_button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let state = state.clone();
        let ui_cb = ui.clone();
        let onchange = Closure::<dyn FnMut(Event)>::new(move |_| {
            let file = ui_cb.file_input.files().and_then(|list| list.get(0));
            if let Some(file) = file {
                accept_file(&state, &ui_cb, file);
            }
        });
        ui.file_input
            .add_event_listener_with_callback("change", onchange.as_ref().unchecked_ref())?;
        onchange.forget();
    }

    {
        let drop_zone = ui.drop_zone.clone();
        let ondragover = Closure::<dyn FnMut(DragEvent)>::new(move |event: DragEvent| {
            event.prevent_default();
            let _ = drop_zone.class_list().add_1("dragging");
        });
        ui.drop_zone
            .add_event_listener_with_callback("dragover", ondragover.as_ref().unchecked_ref())?;
        ondragover.forget();
    }

    {
        let drop_zone = ui.drop_zone.clone();
        let ondragleave = Closure::<dyn FnMut(DragEvent)>::new(move |_| {
            let _ = drop_zone.class_list().remove_1("dragging");
        });
        ui.drop_zone
            .add_event_listener_with_callback("dragleave", ondragleave.as_ref().unchecked_ref())?;
        ondragleave.forget();
    }

    {
        let state = state.clone();
        let ui_cb = ui.clone();
        let ondrop = Closure::<dyn FnMut(DragEvent)>::new(move |event: DragEvent| {
            event.prevent_default();
            let _ = ui_cb.drop_zone.class_list().remove_1("dragging");
            let file = event
                .data_transfer()
                .and_then(|transfer| transfer.files())
                .and_then(|list| list.get(0));
            if let Some(file) = file {
                accept_file(&state, &ui_cb, file);
            }
        });
        ui.drop_zone
            .add_event_listener_with_callback("drop", ondrop.as_ref().unchecked_ref())?;
        ondrop.forget();
    }

    {
        let state = state.clone();
        let ui_cb = ui.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            reset(&mut state.borrow_mut(), &ui_cb);
        });
        clear_button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let state = state.clone();
        let ui_cb = ui.clone();
        let gateway = gateway.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            let request = state.borrow_mut().upload.intake.request_analysis();
            let request = match request {
                Ok(request) => request,
                Err(err) => {
                    log::debug!("picture analysis not started: {err}");
                    ui_cb.toasts.show(&err.notice());
                    return;
                }
            };
            set_busy(&ui_cb.analyze_image, true);
            let state = state.clone();
            let ui = ui_cb.clone();
            let gateway = gateway.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let result = gateway.analyze_image(&request.data_uri).await;
                let notice = state
                    .borrow_mut()
                    .upload
                    .intake
                    .finish_analysis(request.ticket, result);
                if let Some(notice) = notice {
                    set_busy(&ui.analyze_image, false);
                    ui.toasts.show(&notice);
                }
            });
        });
        ui.analyze_image
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    Ok(())
}
