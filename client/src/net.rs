use async_trait::async_trait;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, Response};

use kidsboard_shared::gateway::{HttpRequest, HttpResponse};
use kidsboard_shared::Transport;

/// `Transport` over the browser's `fetch`.
pub struct FetchTransport;

#[async_trait(?Send)]
impl Transport for FetchTransport {
    async fn post_json(&self, request: HttpRequest) -> Result<HttpResponse, String> {
        post_json(request).await.map_err(describe)
    }
}

async fn post_json(request: HttpRequest) -> Result<HttpResponse, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let headers = Headers::new()?;
    headers.set("Content-Type", "application/json")?;
    headers.set("Authorization", &format!("Bearer {}", request.bearer_token))?;

    let init = RequestInit::new();
    init.set_method("POST");
    init.set_headers(&headers);
    init.set_body(&JsValue::from_str(&request.body));
    let fetch_request = Request::new_with_str_and_init(&request.url, &init)?;

    let response: Response = JsFuture::from(window.fetch_with_request(&fetch_request))
        .await?
        .dyn_into()?;
    let status = response.status();
    let body = JsFuture::from(response.text()?)
        .await?
        .as_string()
        .unwrap_or_default();
    Ok(HttpResponse { status, body })
}

fn describe(err: JsValue) -> String {
    err.as_string()
        .or_else(|| {
            err.dyn_ref::<js_sys::Error>()
                .map(|error| String::from(error.message()))
        })
        .unwrap_or_else(|| format!("{err:?}"))
}
