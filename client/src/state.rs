use wasm_bindgen::prelude::Closure;
use web_sys::{
    CanvasRenderingContext2d, Document, FileReader, HtmlButtonElement, HtmlCanvasElement,
    HtmlElement, HtmlImageElement, HtmlInputElement, ProgressEvent,
};

use kidsboard_shared::{Conversation, DrawingSurface, ImageIntake, Shell};

use crate::toast::Toasts;

pub struct DrawPanel {
    pub surface: DrawingSurface,
    pub canvas: HtmlCanvasElement,
    pub ctx: CanvasRenderingContext2d,
    pub pointer_id: Option<i32>,
}

/// The reader stays alive until its `load` fires or the panel is left.
pub struct PendingRead {
    pub reader: FileReader,
    pub onload: Closure<dyn FnMut(ProgressEvent)>,
    pub onerror: Closure<dyn FnMut(ProgressEvent)>,
}

pub struct UploadPanel {
    pub intake: ImageIntake,
    pub pending: Option<PendingRead>,
}

pub struct ChatPanel {
    pub conversation: Conversation,
}

pub struct State {
    pub shell: Shell,
    pub draw: DrawPanel,
    pub upload: UploadPanel,
    pub chat: ChatPanel,
}

/// Elements the handlers touch after startup.
#[derive(Clone)]
pub struct Ui {
    pub document: Document,
    pub toasts: Toasts,
    pub mascot: HtmlElement,
    pub mascot_message: HtmlElement,
    pub tab_buttons: HtmlElement,
    pub draw_panel: HtmlElement,
    pub upload_panel: HtmlElement,
    pub chat_panel: HtmlElement,
    pub palette: HtmlElement,
    pub widths: HtmlElement,
    pub color_input: HtmlInputElement,
    pub sparkle_button: HtmlButtonElement,
    pub analyze_drawing: HtmlButtonElement,
    pub drop_zone: HtmlElement,
    pub file_input: HtmlInputElement,
    pub preview: HtmlImageElement,
    pub preview_wrap: HtmlElement,
    pub analyze_image: HtmlButtonElement,
    pub messages: HtmlElement,
    pub chat_input: HtmlInputElement,
    pub send_button: HtmlButtonElement,
}
