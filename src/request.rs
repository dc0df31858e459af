use std::collections::BTreeMap;
use std::fmt;

use reqwest::Method;

/// Verb of a logical call.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    /// GraphQL query; sent as `POST` on the wire.
    GraphQl,
}

impl HttpMethod {
    /// Method used on the wire.
    pub fn as_wire(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post | Self::GraphQl => Method::POST,
            Self::Put => Method::PUT,
            Self::Patch => Method::PATCH,
            Self::Delete => Method::DELETE,
        }
    }

    /// Whether a body is attached when the request is sent.
    pub fn carries_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch | Self::GraphQl)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::GraphQl => "GRAPHQL",
        };
        f.write_str(name)
    }
}

/// Fully formed request for one attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub uri: String,
    pub headers: BTreeMap<String, String>,
    /// Serialized body, if any.
    pub body: Option<String>,
}

impl HttpRequest {
    /// Creates a request with the default `Accept: application/json` header.
    pub fn new(method: HttpMethod, uri: impl Into<String>) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Accept".to_owned(), "application/json".to_owned());
        Self {
            method,
            uri: uri.into(),
            headers,
            body: None,
        }
    }

    /// Returns a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
