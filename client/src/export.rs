use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Blob, BlobPropertyBag, Document, HtmlAnchorElement, Url};

use kidsboard_shared::raster::PNG_MEDIA_TYPE;

use crate::dom::create_element;

/// Hands `bytes` to the browser as a download named `file_name`.
pub fn download_png(document: &Document, file_name: &str, bytes: &[u8]) -> Result<(), JsValue> {
    let parts = js_sys::Array::of1(&js_sys::Uint8Array::from(bytes));
    let options = BlobPropertyBag::new();
    options.set_type(PNG_MEDIA_TYPE);
    let blob = Blob::new_with_u8_array_sequence_and_options(&parts, &options)?;
    let href = Url::create_object_url_with_blob(&blob)?;

    let anchor = create_element::<HtmlAnchorElement>(document, "a")
        .ok_or_else(|| JsValue::from_str("Could not create download link"))?;
    anchor.set_href(&href);
    anchor.set_download(file_name);
    anchor.click();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let onrevoke = Closure::once_into_js(move || {
        let _ = Url::revoke_object_url(&href);
    });
    window.set_timeout_with_callback_and_timeout_and_arguments_0(onrevoke.unchecked_ref(), 0)?;
    Ok(())
}
