use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, PointerEvent, Window};

use kidsboard_shared::brush::sanitize_color;
use kidsboard_shared::surface::SurfaceError;
use kidsboard_shared::Gateway;

use crate::dom::{client_offset, get_element, resize_canvas, set_busy, set_pressed};
use crate::export::download_png;
use crate::net::FetchTransport;
use crate::palette::{palette_action_from_event, render_palette, render_widths, PaletteAction};
use crate::render::{clear_canvas, present};
use crate::state::{DrawPanel, State, Ui};

pub fn mount(window: &Window, state: &mut State, ui: &Ui) {
    let draw = &mut state.draw;
    let layout = resize_canvas(window, &draw.canvas);
    if let Err(err) = draw.surface.resize(layout) {
        log::error!("could not create drawing surface: {err}");
        return;
    }
    let (left, top) = client_offset(&draw.canvas);
    draw.surface.set_offset(left, top);
    present(&draw.ctx, &mut draw.surface);
    sync_controls(ui, draw);
}

pub fn unmount(state: &mut State, ui: &Ui) {
    let draw = &mut state.draw;
    draw.surface.unmount();
    draw.pointer_id = None;
    clear_canvas(&draw.ctx, draw.canvas.width(), draw.canvas.height());
    set_busy(&ui.analyze_drawing, false);
    sync_controls(ui, draw);
}

fn sync_controls(ui: &Ui, draw: &DrawPanel) {
    let brush = draw.surface.brush();
    render_palette(&ui.document, &ui.palette, brush.color);
    render_widths(&ui.document, &ui.widths, brush.width);
    ui.color_input.set_value(&brush.color.to_hex());
    set_pressed(&ui.sparkle_button, brush.particle_mode);
}

fn report(action: &str, err: SurfaceError) {
    match err {
        SurfaceError::AnalysisPending => log::debug!("{action}: analysis already running"),
        err => log::warn!("{action} failed: {err}"),
    }
}

pub fn bind(
    window: &Window,
    state: &Rc<RefCell<State>>,
    ui: &Ui,
    gateway: &Rc<Gateway<FetchTransport>>,
) -> Result<(), JsValue> {
    let canvas = state.borrow().draw.canvas.clone();

    {
        let state = state.clone();
        let ondown = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            let mut state = state.borrow_mut();
            let draw = &mut state.draw;
            if draw.pointer_id.is_some() {
                return;
            }
            event.prevent_default();
            let (left, top) = client_offset(&draw.canvas);
            draw.surface.set_offset(left, top);
            match draw
                .surface
                .pointer_down(event.client_x() as f64, event.client_y() as f64)
            {
                Ok(()) => draw.pointer_id = Some(event.pointer_id()),
                Err(err) => report("stroke", err),
            }
            present(&draw.ctx, &mut draw.surface);
        });
        canvas.add_event_listener_with_callback("pointerdown", ondown.as_ref().unchecked_ref())?;
        ondown.forget();
    }

    {
        let state = state.clone();
        let onmove = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            let mut state = state.borrow_mut();
            let draw = &mut state.draw;
            if draw.pointer_id != Some(event.pointer_id()) {
                return;
            }
            event.prevent_default();
            draw.surface
                .pointer_move(event.client_x() as f64, event.client_y() as f64);
            present(&draw.ctx, &mut draw.surface);
        });
        canvas.add_event_listener_with_callback("pointermove", onmove.as_ref().unchecked_ref())?;
        onmove.forget();
    }

    for name in ["pointerup", "pointerleave", "pointercancel"] {
        let state = state.clone();
        let onend = Closure::<dyn FnMut(PointerEvent)>::new(move |event: PointerEvent| {
            let mut state = state.borrow_mut();
            let draw = &mut state.draw;
            if draw.pointer_id != Some(event.pointer_id()) {
                return;
            }
            draw.pointer_id = None;
            draw.surface.end_stroke();
        });
        canvas.add_event_listener_with_callback(name, onend.as_ref().unchecked_ref())?;
        onend.forget();
    }

    {
        let state = state.clone();
        let ui_cb = ui.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let Some(action) = palette_action_from_event(&event) else {
                return;
            };
            let mut state = state.borrow_mut();
            let draw = &mut state.draw;
            match action {
                PaletteAction::Color(index) => {
                    let Some(named) = kidsboard_shared::brush::PALETTE.get(index) else {
                        return;
                    };
                    draw.surface.set_color(sanitize_color(named.hex));
                }
                PaletteAction::Width(width) => draw.surface.set_width(width),
            }
            sync_controls(&ui_cb, draw);
        });
        ui.palette
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        ui.widths
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let state = state.clone();
        let ui_cb = ui.clone();
        let oninput = Closure::<dyn FnMut(Event)>::new(move |_| {
            let mut state = state.borrow_mut();
            let draw = &mut state.draw;
            draw.surface.set_color(sanitize_color(&ui_cb.color_input.value()));
            render_palette(&ui_cb.document, &ui_cb.palette, draw.surface.brush().color);
        });
        ui.color_input
            .add_event_listener_with_callback("input", oninput.as_ref().unchecked_ref())?;
        oninput.forget();
    }

    {
        let state = state.clone();
        let ui_cb = ui.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            let notice = state.borrow_mut().draw.surface.toggle_particle_mode();
            let particle_mode = state.borrow().draw.surface.brush().particle_mode;
            set_pressed(&ui_cb.sparkle_button, particle_mode);
            ui_cb.toasts.show(&notice);
        });
        ui.sparkle_button
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let clear_button: web_sys::HtmlButtonElement = get_element(&ui.document, "clear")?;
        let state = state.clone();
        let ui_cb = ui.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            let mut state = state.borrow_mut();
            let draw = &mut state.draw;
            draw.pointer_id = None;
            match draw.surface.clear() {
                Ok(notice) => {
                    present(&draw.ctx, &mut draw.surface);
                    ui_cb.toasts.show(&notice);
                }
                Err(err) => report("clear", err),
            }
        });
        clear_button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let save_button: web_sys::HtmlButtonElement = get_element(&ui.document, "save")?;
        let state = state.clone();
        let ui_cb = ui.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            let exported = state.borrow().draw.surface.export_png();
            match exported {
                Ok((export, notice)) => {
                    if let Err(err) = download_png(&ui_cb.document, export.file_name, &export.bytes)
                    {
                        log::error!("download failed: {err:?}");
                        return;
                    }
                    ui_cb.toasts.show(&notice);
                }
                Err(err) => report("export", err),
            }
        });
        save_button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let state = state.clone();
        let ui_cb = ui.clone();
        let gateway = gateway.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            let request = state.borrow_mut().draw.surface.request_analysis();
            let request = match request {
                Ok(request) => request,
                Err(err) => {
                    report("analysis", err);
                    return;
                }
            };
            set_busy(&ui_cb.analyze_drawing, true);
            let state = state.clone();
            let ui = ui_cb.clone();
            let gateway = gateway.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let result = gateway.analyze_drawing(&request.data_uri).await;
                let notice = state
                    .borrow_mut()
                    .draw
                    .surface
                    .finish_analysis(request.ticket, result);
                if let Some(notice) = notice {
                    set_busy(&ui.analyze_drawing, false);
                    ui.toasts.show(&notice);
                }
            });
        });
        ui.analyze_drawing
            .add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let state = state.clone();
        let ui = ui.clone();
        let window_cb = window.clone();
        let onresize = Closure::<dyn FnMut(Event)>::new(move |_| {
            let mut state = state.borrow_mut();
            if !state.draw.surface.is_mounted() {
                return;
            }
            state.draw.pointer_id = None;
            mount(&window_cb, &mut state, &ui);
        });
        window.add_event_listener_with_callback("resize", onresize.as_ref().unchecked_ref())?;
        onresize.forget();
    }

    Ok(())
}
