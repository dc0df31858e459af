use std::future::Future;
use std::sync::Arc;

use reqwest::header::{HeaderMap, CONTENT_TYPE};

use crate::{CancellationToken, CloudHttpError, CloudResult, Content, Headers, HttpRequest, Result};

/// Executes a single request attempt.
///
/// A failure before any response exists is reported as `Err`, or as a
/// [`CloudResult`] with status 0. Implementations should stop waiting once
/// `cancel` is triggered.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<CloudResult>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn send(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<CloudResult>> + Send {
        (**self).send(request, cancel)
    }
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest, cancel: &CancellationToken) -> Result<CloudResult> {
        let mut builder = self.http.request(request.method.as_wire(), &request.uri);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if request.method.carries_body() {
            if let Some(body) = request.body {
                builder = builder.body(body);
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CloudHttpError::Cancelled),
            outcome = exchange(builder) => outcome,
        }
    }
}

async fn exchange(builder: reqwest::RequestBuilder) -> Result<CloudResult> {
    let response = builder.send().await.map_err(CloudHttpError::Transport)?;
    let status = response.status().as_u16();
    let structured = declares_json(response.headers());
    let headers = collect_headers(response.headers());
    let body = response.text().await.map_err(CloudHttpError::Transport)?;

    Ok(CloudResult::new(
        status,
        Content::from_body(body, structured),
        Some(headers),
    ))
}

fn declares_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.to_ascii_lowercase().contains("json"))
}

/// Repeated headers are joined with `", "`.
fn collect_headers(headers: &HeaderMap) -> Headers {
    let mut collected = Headers::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        collected
            .entry(name.as_str().to_owned())
            .and_modify(|existing: &mut String| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    collected
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, SET_COOKIE};

    use super::{collect_headers, declares_json};

    #[test]
    fn json_content_types_are_structured() {
        let mut headers = HeaderMap::new();
        assert!(!declares_json(&headers));

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(!declares_json(&headers));

        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        assert!(declares_json(&headers));

        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/problem+JSON"),
        );
        assert!(declares_json(&headers));
    }

    #[test]
    fn repeated_headers_are_joined() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let collected = collect_headers(&headers);
        assert_eq!(collected.get("set-cookie").map(String::as_str), Some("a=1, b=2"));
        assert_eq!(
            collected.get("content-type").map(String::as_str),
            Some("text/plain")
        );
    }
}
