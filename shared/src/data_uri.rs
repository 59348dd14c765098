use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataUriError {
    #[error("not a data URI")]
    MissingScheme,
    #[error("data URI has no payload separator")]
    MissingPayload,
    #[error("data URI payload is not base64")]
    NotBase64,
}

/// A borrowed view of a `data:<media type>;base64,<payload>` string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataUri<'a> {
    pub media_type: &'a str,
    pub payload: &'a str,
}

impl<'a> DataUri<'a> {
    pub fn parse(text: &'a str) -> Result<Self, DataUriError> {
        let rest = text
            .trim_start()
            .strip_prefix("data:")
            .ok_or(DataUriError::MissingScheme)?;
        let (header, payload) = rest.split_once(',').ok_or(DataUriError::MissingPayload)?;
        let media_type = header
            .strip_suffix(";base64")
            .ok_or(DataUriError::NotBase64)?;
        Ok(Self {
            media_type,
            payload,
        })
    }

    pub fn is_image(&self) -> bool {
        is_image_media_type(self.media_type)
    }
}

pub fn encode(media_type: &str, bytes: &[u8]) -> String {
    format!("data:{media_type};base64,{}", BASE64.encode(bytes))
}

pub fn is_image_media_type(media_type: &str) -> bool {
    media_type
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
        && media_type.len() > 6
}
