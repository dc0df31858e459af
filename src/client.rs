use std::fmt;

use serde::Serialize;
use tokio::time::{sleep, Instant};

use crate::{
    retry::{should_retry, Backoff},
    wire::GraphQlRequest,
    CallOptions, CancellationToken, ClientOptions, CloudHttpError, CloudResult, HttpMethod,
    HttpRequest, ReqwestTransport, Result, Transport,
};

const DEFAULT_CONTENT_TYPE: &str = "application/json";

#[derive(Clone)]
/// Retrying HTTP client over a [`Transport`].
pub struct CloudClient<T = ReqwestTransport> {
    transport: T,
    options: ClientOptions,
}

impl<T> fmt::Debug for CloudClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudClient")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl CloudClient<ReqwestTransport> {
    /// Creates a client for `endpoint` with default options and a fresh `reqwest::Client`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_transport(
            ReqwestTransport::default(),
            ClientOptions {
                endpoint: endpoint.into(),
                ..ClientOptions::default()
            },
        )
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `CLOUD_HTTP_ENDPOINT` — endpoint prefix for relative resources (required)
    /// - `CLOUD_HTTP_TOKEN` — static auth token
    /// - `CLOUD_HTTP_AUTH_HEADER` — header carrying the token
    /// - `CLOUD_HTTP_TIMEOUT_MS` — default per-attempt timeout
    /// - `CLOUD_HTTP_MAX_RETRIES` — retries after the first attempt
    ///
    /// # Example
    ///
    /// ```no_run
    /// use cloud_http::CloudClient;
    ///
    /// let client = CloudClient::from_env().expect("missing CLOUD_HTTP_* env vars");
    /// ```
    pub fn from_env() -> std::result::Result<Self, String> {
        let endpoint = std::env::var("CLOUD_HTTP_ENDPOINT")
            .map_err(|_| "missing CLOUD_HTTP_ENDPOINT environment variable".to_owned())?;
        if endpoint.trim().is_empty() {
            return Err("CLOUD_HTTP_ENDPOINT is set but empty".to_owned());
        }

        let mut options = ClientOptions {
            endpoint,
            ..ClientOptions::default()
        };
        if let Some(token) = optional_env("CLOUD_HTTP_TOKEN") {
            options.auth_token = Some(token);
        }
        if let Some(header) = optional_env("CLOUD_HTTP_AUTH_HEADER") {
            options.auth_header = header;
        }
        if let Some(timeout) = optional_env("CLOUD_HTTP_TIMEOUT_MS") {
            options.timeout_ms = timeout
                .parse()
                .map_err(|err| format!("CLOUD_HTTP_TIMEOUT_MS is not a number: {err}"))?;
        }
        if let Some(retries) = optional_env("CLOUD_HTTP_MAX_RETRIES") {
            options.max_retries = retries
                .parse()
                .map_err(|err| format!("CLOUD_HTTP_MAX_RETRIES is not a number: {err}"))?;
        }

        Ok(Self::with_transport(ReqwestTransport::default(), options))
    }
}

impl<T: Transport> CloudClient<T> {
    /// Creates a client over a custom transport.
    pub fn with_transport(transport: T, options: ClientOptions) -> Self {
        Self { transport, options }
    }

    /// Replaces the client options.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.options = opts;
        self
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Builds a request for `resource`.
    ///
    /// Relative resources are prefixed with the endpoint and receive the auth
    /// header when a token is configured. Absolute `http(s)://` resources are
    /// used as-is without auth.
    pub fn create_request(&self, resource: &str, method: HttpMethod) -> HttpRequest {
        let relative = !is_absolute(resource);
        let uri = if relative {
            join_endpoint(&self.options.endpoint, resource)
        } else {
            resource.to_owned()
        };

        let mut request = HttpRequest::new(method, uri);
        if relative {
            if let Some(token) = &self.options.auth_token {
                request
                    .headers
                    .insert(self.options.auth_header.clone(), token.clone());
            }
        }
        request
            .headers
            .insert("User-Agent".to_owned(), self.options.user_agent.to_string());
        request
    }

    /// Serializes `entity` as JSON into the request body and sets `Content-Type`.
    ///
    /// A `None` entity leaves the request untouched.
    pub fn add_body<E>(
        &self,
        request: &mut HttpRequest,
        entity: Option<&E>,
        content_type: Option<&str>,
    ) -> Result<()>
    where
        E: Serialize + ?Sized,
    {
        let Some(entity) = entity else {
            return Ok(());
        };
        let body = serde_json::to_string(entity).map_err(CloudHttpError::Serialize)?;
        request.headers.insert(
            "Content-Type".to_owned(),
            content_type.unwrap_or(DEFAULT_CONTENT_TYPE).to_owned(),
        );
        request.body = Some(body);
        Ok(())
    }

    pub async fn get(&self, resource: &str, call: impl Into<CallOptions>) -> Result<CloudResult> {
        self.run_request(|| Ok(self.create_request(resource, HttpMethod::Get)), call)
            .await
    }

    pub async fn delete(
        &self,
        resource: &str,
        call: impl Into<CallOptions>,
    ) -> Result<CloudResult> {
        self.run_request(
            || Ok(self.create_request(resource, HttpMethod::Delete)),
            call,
        )
        .await
    }

    pub async fn post<E>(
        &self,
        resource: &str,
        entity: Option<&E>,
        call: impl Into<CallOptions>,
    ) -> Result<CloudResult>
    where
        E: Serialize + ?Sized,
    {
        self.send_entity(resource, HttpMethod::Post, entity, call)
            .await
    }

    pub async fn put<E>(
        &self,
        resource: &str,
        entity: Option<&E>,
        call: impl Into<CallOptions>,
    ) -> Result<CloudResult>
    where
        E: Serialize + ?Sized,
    {
        self.send_entity(resource, HttpMethod::Put, entity, call)
            .await
    }

    pub async fn patch<E>(
        &self,
        resource: &str,
        entity: Option<&E>,
        call: impl Into<CallOptions>,
    ) -> Result<CloudResult>
    where
        E: Serialize + ?Sized,
    {
        self.send_entity(resource, HttpMethod::Patch, entity, call)
            .await
    }

    /// Posts `{"query", "variables"}` to the `graphql` resource.
    pub async fn graphql<V>(
        &self,
        query: &str,
        variables: Option<&V>,
        call: impl Into<CallOptions>,
    ) -> Result<CloudResult>
    where
        V: Serialize + ?Sized,
    {
        self.run_request(
            || {
                let mut request = self.create_request("graphql", HttpMethod::GraphQl);
                let body = GraphQlRequest { query, variables };
                self.add_body(&mut request, Some(&body), None)?;
                Ok(request)
            },
            call,
        )
        .await
    }

    async fn send_entity<E>(
        &self,
        resource: &str,
        method: HttpMethod,
        entity: Option<&E>,
        call: impl Into<CallOptions>,
    ) -> Result<CloudResult>
    where
        E: Serialize + ?Sized,
    {
        self.run_request(
            || {
                let mut request = self.create_request(resource, method);
                self.add_body(&mut request, entity, None)?;
                Ok(request)
            },
            call,
        )
        .await
    }

    /// Runs a call with bounded retries and exponential backoff.
    ///
    /// `build` is invoked once per attempt; an error from it ends the call
    /// immediately. Attempts without a response and statuses 429/500 are
    /// retried, sleeping between attempts; any other status ends the call.
    /// Up to `max_retries + 1` attempts are made.
    ///
    /// Error statuses are returned as an error [`CloudResult`] without
    /// headers. When no attempt obtained a response, the call returns
    /// [`CloudResult::empty`] or, with `throw_on_error`, the last error.
    pub async fn run_request<F>(
        &self,
        mut build: F,
        call: impl Into<CallOptions>,
    ) -> Result<CloudResult>
    where
        F: FnMut() -> Result<HttpRequest>,
    {
        let call = call.into();
        let timeout = call
            .timeout
            .unwrap_or_else(|| self.options.default_timeout());

        let start = Instant::now();
        let mut remaining_retries = self.options.max_retries;
        let mut backoff =
            Backoff::new(self.options.retry_backoff_ms, self.options.max_backoff_ms);
        let mut attempts = 0usize;
        let mut success = false;
        let mut last_response: Option<CloudResult> = None;
        let mut last_error: Option<CloudHttpError> = None;

        while !success {
            let request = build()?;
            let method = request.method;
            let uri = request.uri.clone();
            attempts += 1;

            #[cfg(feature = "tracing")]
            tracing::debug!(%method, %uri, attempt = attempts, "sending request");

            let response = {
                let cancel = CancellationToken::with_deadline(timeout);
                match self.transport.send(request, &cancel).await {
                    Ok(response) if response.status_code() == 0 => {
                        if let Some(err) = sentinel_error(&response) {
                            last_error = Some(err);
                        }
                        None
                    }
                    Ok(response) => Some(response),
                    // Malformed URI or header: sending again cannot succeed.
                    Err(CloudHttpError::Transport(err)) if err.is_builder() => {
                        return Err(CloudHttpError::Transport(err));
                    }
                    Err(err) => {
                        last_error = Some(err);
                        None
                    }
                }
            };

            #[cfg(feature = "tracing")]
            {
                if let Some(response) = &response {
                    tracing::debug!(
                        %method,
                        %uri,
                        status = response.status_code(),
                        "received response"
                    );
                }
            }

            if should_retry(response.as_ref()) {
                log_retry(
                    method,
                    &uri,
                    response.as_ref(),
                    last_error.as_ref(),
                    remaining_retries,
                    start,
                );
                if response.is_some() {
                    last_response = response;
                }

                let delay = backoff.next_delay();
                #[cfg(feature = "tracing")]
                tracing::debug!("retrying request after {} ms", delay.as_millis());
                sleep(delay).await;

                if remaining_retries == 0 {
                    break;
                }
                remaining_retries -= 1;
            } else {
                last_response = response;
                success = true;
            }
        }

        match last_response {
            None if call.throw_on_error => Err(last_error.unwrap_or(CloudHttpError::NoResponse {
                attempts,
                elapsed: start.elapsed(),
            })),
            None => Ok(CloudResult::empty()),
            Some(response) if response.is_ok() => Ok(response),
            Some(response) => Ok(response.without_headers()),
        }
    }
}

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn log_retry(
    method: HttpMethod,
    uri: &str,
    response: Option<&CloudResult>,
    error: Option<&CloudHttpError>,
    remaining_retries: usize,
    start: Instant,
) {
    #[cfg(feature = "tracing")]
    {
        let elapsed = start.elapsed().as_secs_f64();
        let reason = retry_reason(response);
        tracing::warn!(
            status = response.map(CloudResult::status_code),
            error = error.map(tracing::field::display),
            "{reason} running {method} request to {uri}. remaining retries: {remaining_retries}. elapsed: {elapsed:.3}s"
        );
    }
}

#[cfg_attr(not(feature = "tracing"), allow(dead_code))]
fn retry_reason(response: Option<&CloudResult>) -> &'static str {
    match response.map(CloudResult::status_code) {
        None | Some(0) => "exception",
        Some(429) => "rate limited",
        Some(_) => "server error",
    }
}

/// Error carried by a status-0 result, if it has a message.
fn sentinel_error(response: &CloudResult) -> Option<CloudHttpError> {
    response
        .content()
        .as_str()
        .filter(|text| !text.is_empty())
        .map(|text| CloudHttpError::Connection(text.to_owned()))
}

fn is_absolute(resource: &str) -> bool {
    let prefix = |scheme: &str| {
        resource
            .get(..scheme.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(scheme))
    };
    prefix("http://") || prefix("https://")
}

fn join_endpoint(endpoint: &str, resource: &str) -> String {
    format!(
        "{}/{}",
        endpoint.trim_end_matches('/'),
        resource.trim_start_matches('/')
    )
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}
