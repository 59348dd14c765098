//! Client for the chat-completion API behind the chatbot and the two
//! "tell me about my picture" buttons.
//!
//! Every call is a single request: no retries, no streaming. Callers treat any
//! [`GatewayError`] as final for that request and report it to the user.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4-turbo";

pub const CHAT_PERSONA: &str = "You are a friendly and helpful AI assistant for children. You speak in Arabic and provide fun, educational, and age-appropriate responses. Keep your answers short, engaging, and easy to understand. Use emojis occasionally to make the conversation more fun!";

pub const DRAWING_PERSONA: &str = "You are an expert in analyzing children's drawings. Provide a fun, encouraging analysis in Arabic. Focus on the creative elements, colors, and what makes the drawing special. Make the child feel proud of their artwork. Keep it short and engaging.";

pub const DRAWING_INSTRUCTION: &str = "Please analyze this children's drawing. Tell me what you see, what makes it special, and give some encouraging feedback. Make it fun and engaging for a child. Maximum 5 sentences. Always answer in Arabic.";

pub const PHOTO_PERSONA: &str = "You are an expert in analyzing baby images and drawings. Provide detailed analysis in Arabic, focusing on identifying objects, emotions, and artistic style if it's a drawing. Make your response child-friendly and engaging.";

pub const PHOTO_INSTRUCTION: &str = "Please analyze the following baby image or drawing. Identify objects, emotions, and style if it's a drawing make it short and fun maximum 5 sentences. Always answer in Arabic.";

const ERROR_SNIPPET_CHARS: usize = 200;

#[derive(Clone, Debug, PartialEq)]
pub struct GatewayConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub chat_max_tokens: u32,
    pub chat_temperature: f64,
    pub analysis_max_tokens: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            chat_max_tokens: 500,
            chat_temperature: 0.7,
            analysis_max_tokens: 1000,
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ChatMessage<'a> {
    pub role: Role,
    pub content: Content<'a>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum Content<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ImageUrl<'a> {
    pub url: &'a str,
}

#[derive(Deserialize, Debug)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize, Debug)]
struct ReplyMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize, Debug)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub bearer_token: String,
    pub body: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Sends one JSON POST. Implemented over `fetch` in the browser client.
#[async_trait(?Send)]
pub trait Transport {
    async fn post_json(&self, request: HttpRequest) -> Result<HttpResponse, String>;
}

#[derive(Debug, Error)]
pub enum FailureCause {
    #[error("no API key configured")]
    MissingCredential,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("API returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("response carried no reply text")]
    EmptyReply,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("inference request failed: {0}")]
    RequestFailed(#[from] FailureCause),
}

pub fn chat_request<'a>(config: &'a GatewayConfig, text: &'a str) -> CompletionRequest<'a> {
    CompletionRequest {
        model: &config.model,
        messages: vec![
            ChatMessage {
                role: Role::System,
                content: Content::Text(CHAT_PERSONA),
            },
            ChatMessage {
                role: Role::User,
                content: Content::Text(text),
            },
        ],
        max_tokens: config.chat_max_tokens,
        temperature: Some(config.chat_temperature),
    }
}

fn image_request<'a>(
    config: &'a GatewayConfig,
    persona: &'static str,
    instruction: &'static str,
    data_uri: &'a str,
) -> CompletionRequest<'a> {
    CompletionRequest {
        model: &config.model,
        messages: vec![
            ChatMessage {
                role: Role::System,
                content: Content::Text(persona),
            },
            ChatMessage {
                role: Role::User,
                content: Content::Parts(vec![
                    ContentPart::Text { text: instruction },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: data_uri },
                    },
                ]),
            },
        ],
        max_tokens: config.analysis_max_tokens,
        temperature: None,
    }
}

pub fn drawing_request<'a>(config: &'a GatewayConfig, data_uri: &'a str) -> CompletionRequest<'a> {
    image_request(config, DRAWING_PERSONA, DRAWING_INSTRUCTION, data_uri)
}

pub fn photo_request<'a>(config: &'a GatewayConfig, data_uri: &'a str) -> CompletionRequest<'a> {
    image_request(config, PHOTO_PERSONA, PHOTO_INSTRUCTION, data_uri)
}

fn snippet(text: &str) -> String {
    if text.chars().count() <= ERROR_SNIPPET_CHARS {
        text.to_string()
    } else {
        let head: String = text.chars().take(ERROR_SNIPPET_CHARS).collect();
        format!("{head}...")
    }
}

pub fn parse_reply(response: &HttpResponse) -> Result<String, FailureCause> {
    if !(200..300).contains(&response.status) {
        let message = match serde_json::from_str::<ApiErrorBody>(&response.body) {
            Ok(body) => body.error.message,
            Err(_) => snippet(&response.body),
        };
        return Err(FailureCause::Status {
            status: response.status,
            message,
        });
    }
    let parsed: CompletionResponse = serde_json::from_str(&response.body)?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(FailureCause::EmptyReply)
}

/// The inference client. Built once at startup and shared by the panels.
pub struct Gateway<T> {
    config: GatewayConfig,
    transport: T,
}

impl<T: Transport> Gateway<T> {
    pub fn new(config: GatewayConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub async fn chat(&self, text: &str) -> Result<String, GatewayError> {
        self.complete("chat", chat_request(&self.config, text)).await
    }

    pub async fn analyze_drawing(&self, data_uri: &str) -> Result<String, GatewayError> {
        self.complete("drawing analysis", drawing_request(&self.config, data_uri))
            .await
    }

    pub async fn analyze_image(&self, data_uri: &str) -> Result<String, GatewayError> {
        self.complete("image analysis", photo_request(&self.config, data_uri))
            .await
    }

    async fn complete(
        &self,
        label: &str,
        request: CompletionRequest<'_>,
    ) -> Result<String, GatewayError> {
        match self.send(request).await {
            Ok(reply) => {
                log::debug!("{label} reply received ({} chars)", reply.chars().count());
                Ok(reply)
            }
            Err(cause) => {
                log::error!("{label} failed: {cause}");
                Err(GatewayError::RequestFailed(cause))
            }
        }
    }

    async fn send(&self, request: CompletionRequest<'_>) -> Result<String, FailureCause> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(FailureCause::MissingCredential)?;
        let body = serde_json::to_string(&request)?;
        let response = self
            .transport
            .post_json(HttpRequest {
                url: self.config.endpoint.clone(),
                bearer_token: api_key.to_string(),
                body,
            })
            .await
            .map_err(FailureCause::Transport)?;
        parse_reply(&response)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use futures::executor::block_on;
    use serde_json::{json, Value};

    use super::*;

    struct MockTransport {
        response: Result<HttpResponse, String>,
        sent: RefCell<Vec<HttpRequest>>,
    }

    impl MockTransport {
        fn replying(status: u16, body: Value) -> Self {
            Self {
                response: Ok(HttpResponse {
                    status,
                    body: body.to_string(),
                }),
                sent: RefCell::new(Vec::new()),
            }
        }

        fn failing(reason: &str) -> Self {
            Self {
                response: Err(reason.to_string()),
                sent: RefCell::new(Vec::new()),
            }
        }
    }

    #[async_trait(?Send)]
    impl Transport for MockTransport {
        async fn post_json(&self, request: HttpRequest) -> Result<HttpResponse, String> {
            self.sent.borrow_mut().push(request);
            self.response.clone()
        }
    }

    fn config() -> GatewayConfig {
        GatewayConfig {
            api_key: Some("sk-test".to_string()),
            ..GatewayConfig::default()
        }
    }

    fn ok_body(text: &str) -> Value {
        json!({ "choices": [{ "message": { "role": "assistant", "content": text } }] })
    }

    fn sent_json(gateway: &Gateway<MockTransport>) -> Value {
        let sent = gateway.transport.sent.borrow();
        assert_eq!(sent.len(), 1);
        serde_json::from_str(&sent[0].body).unwrap()
    }

    #[test]
    fn chat_sends_persona_and_text() {
        let gateway = Gateway::new(config(), MockTransport::replying(200, ok_body("مرحبا!")));
        let reply = block_on(gateway.chat("Tell me about dinosaurs!")).unwrap();
        assert_eq!(reply, "مرحبا!");

        let sent = gateway.transport.sent.borrow();
        assert_eq!(sent[0].url, DEFAULT_ENDPOINT);
        assert_eq!(sent[0].bearer_token, "sk-test");
        drop(sent);

        let body = sent_json(&gateway);
        assert_eq!(
            body,
            json!({
                "model": "gpt-4-turbo",
                "messages": [
                    { "role": "system", "content": CHAT_PERSONA },
                    { "role": "user", "content": "Tell me about dinosaurs!" }
                ],
                "max_tokens": 500,
                "temperature": 0.7
            })
        );
    }

    #[test]
    fn drawing_analysis_inlines_the_image() {
        let gateway = Gateway::new(config(), MockTransport::replying(200, ok_body("جميل")));
        let reply = block_on(gateway.analyze_drawing("data:image/png;base64,AAAA")).unwrap();
        assert_eq!(reply, "جميل");
        let body = sent_json(&gateway);
        assert_eq!(body["max_tokens"], 1000);
        assert!(body.get("temperature").is_none());
        assert_eq!(body["messages"][0]["content"], DRAWING_PERSONA);
        assert_eq!(
            body["messages"][1]["content"],
            json!([
                { "type": "text", "text": DRAWING_INSTRUCTION },
                { "type": "image_url", "image_url": { "url": "data:image/png;base64,AAAA" } }
            ])
        );
    }

    #[test]
    fn photo_analysis_uses_its_own_persona() {
        let gateway = Gateway::new(config(), MockTransport::replying(200, ok_body("قطة")));
        block_on(gateway.analyze_image("data:image/jpeg;base64,BBBB")).unwrap();
        let body = sent_json(&gateway);
        assert_eq!(body["messages"][0]["content"], PHOTO_PERSONA);
        assert_eq!(body["messages"][1]["content"][0]["text"], PHOTO_INSTRUCTION);
        assert_eq!(
            body["messages"][1]["content"][1]["image_url"]["url"],
            "data:image/jpeg;base64,BBBB"
        );
    }

    #[test]
    fn missing_key_fails_without_sending() {
        let gateway = Gateway::new(
            GatewayConfig::default(),
            MockTransport::replying(200, ok_body("unused")),
        );
        let error = block_on(gateway.chat("hi")).unwrap_err();
        assert!(matches!(
            error,
            GatewayError::RequestFailed(FailureCause::MissingCredential)
        ));
        assert!(gateway.transport.sent.borrow().is_empty());
    }

    #[test]
    fn transport_errors_are_request_failures() {
        let gateway = Gateway::new(config(), MockTransport::failing("network down"));
        let error = block_on(gateway.chat("hi")).unwrap_err();
        assert!(matches!(
            error,
            GatewayError::RequestFailed(FailureCause::Transport(ref reason)) if reason == "network down"
        ));
    }

    #[test]
    fn api_errors_surface_their_message() {
        let gateway = Gateway::new(
            config(),
            MockTransport::replying(401, json!({ "error": { "message": "bad key" } })),
        );
        let error = block_on(gateway.chat("hi")).unwrap_err();
        assert_eq!(
            error.to_string(),
            "inference request failed: API returned status 401: bad key"
        );
    }

    #[test]
    fn non_json_error_bodies_are_truncated() {
        let response = HttpResponse {
            status: 502,
            body: "x".repeat(500),
        };
        match parse_reply(&response) {
            Err(FailureCause::Status { status, message }) => {
                assert_eq!(status, 502);
                assert_eq!(message.len(), ERROR_SNIPPET_CHARS + 3);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_or_malformed_replies_fail() {
        let empty = HttpResponse {
            status: 200,
            body: json!({ "choices": [] }).to_string(),
        };
        assert!(matches!(parse_reply(&empty), Err(FailureCause::EmptyReply)));

        let null_content = HttpResponse {
            status: 200,
            body: json!({ "choices": [{ "message": { "content": null } }] }).to_string(),
        };
        assert!(matches!(
            parse_reply(&null_content),
            Err(FailureCause::EmptyReply)
        ));

        let garbage = HttpResponse {
            status: 200,
            body: "<html>".to_string(),
        };
        assert!(matches!(parse_reply(&garbage), Err(FailureCause::Json(_))));
    }
}
