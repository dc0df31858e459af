use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::{CloudHttpError, Result};

/// Response headers keyed by name.
///
/// `ReqwestTransport` reports names lowercased (`x-request-id`), as normalized by `reqwest`.
pub type Headers = BTreeMap<String, String>;

/// Response content: parsed JSON or opaque text.
#[derive(Clone, Debug, PartialEq)]
pub enum Content {
    Structured(JsonValue),
    Text(String),
}

impl Content {
    /// Parses `body` as JSON when `structured` is set, falling back to text.
    pub fn from_body(body: String, structured: bool) -> Self {
        if !structured {
            return Self::Text(body);
        }
        match serde_json::from_str(&body) {
            Ok(value) => Self::Structured(value),
            Err(_) => Self::Text(body),
        }
    }

    /// Returns the text of a `Text` or a JSON string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Structured(value) => value.as_str(),
        }
    }

    pub fn as_json(&self) -> Option<&JsonValue> {
        match self {
            Self::Structured(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(text) if text.is_empty())
    }

    fn into_json(self) -> JsonValue {
        match self {
            Self::Structured(value) => value,
            Self::Text(text) => JsonValue::String(text),
        }
    }

    /// Value of the `"error"` field, if the content is (or parses as) a JSON object carrying one.
    fn error_field(&self) -> Option<JsonValue> {
        match self {
            Self::Structured(value) => value.get("error").cloned(),
            Self::Text(text) => serde_json::from_str::<JsonValue>(text)
                .ok()
                .and_then(|mut value| value.get_mut("error").map(JsonValue::take)),
        }
    }
}

impl Default for Content {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<JsonValue> for Content {
    fn from(value: JsonValue) -> Self {
        Self::Structured(value)
    }
}

impl From<String> for Content {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Content {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// Normalized outcome of a call.
#[derive(Clone, Debug, PartialEq)]
pub struct CloudResult {
    status: u16,
    content: Content,
    headers: Headers,
}

impl CloudResult {
    /// Classifies a raw outcome.
    ///
    /// For non-success statuses, content that is a JSON object with an
    /// `"error"` field is replaced by that field's value. Everything else is
    /// stored as given.
    pub fn new(status: u16, content: impl Into<Content>, headers: Option<Headers>) -> Self {
        let content = content.into();
        let content = if is_success(status) {
            content
        } else {
            match content.error_field() {
                Some(error) => Content::Structured(error),
                None => content,
            }
        };

        Self {
            status,
            content,
            headers: headers.unwrap_or_default(),
        }
    }

    /// Result of a call that never obtained a response: status 0, empty content and headers.
    pub fn empty() -> Self {
        Self {
            status: 0,
            content: Content::default(),
            headers: Headers::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        is_success(self.status)
    }

    pub fn is_error(&self) -> bool {
        !self.is_ok()
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Deserializes the content into the caller's entity type.
    ///
    /// Text content is presented to the deserializer as a JSON string.
    pub fn entity<E: DeserializeOwned>(&self) -> Result<E> {
        serde_json::from_value(self.content.clone().into_json())
            .map_err(|err| CloudHttpError::Decode(format!("invalid entity: {err}")))
    }

    pub fn into_parts(self) -> (u16, Content, Headers) {
        (self.status, self.content, self.headers)
    }

    /// Drops headers, keeping status and already-classified content.
    pub(crate) fn without_headers(mut self) -> Self {
        self.headers.clear();
        self
    }
}

impl fmt::Display for CloudResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let content = match &self.content {
            Content::Structured(value) => value.to_string(),
            Content::Text(text) => JsonValue::String(text.clone()).to_string(),
        };
        write!(f, "CloudResult - State: {} Content: {}", self.status, content)
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}
