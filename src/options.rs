use std::fmt;
use std::time::Duration;

/// Product name and version rendered into the `User-Agent` header.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProductInfo {
    pub product: String,
    pub version: String,
}

impl ProductInfo {
    pub fn new(product: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            version: version.into(),
        }
    }

    /// Header value in `"<product> <version>"` form.
    pub fn value(&self) -> String {
        self.to_string()
    }
}

impl Default for ProductInfo {
    fn default() -> Self {
        Self::new("CloudX", env!("CARGO_PKG_VERSION"))
    }
}

impl fmt::Display for ProductInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.product, self.version)
    }
}

/// Configures endpoint, authentication, timeout and retry behavior.
#[derive(Clone, Eq, PartialEq)]
pub struct ClientOptions {
    /// Prefix applied to relative resources.
    pub endpoint: String,
    /// Per-attempt timeout in milliseconds, used when a call does not override it.
    pub timeout_ms: u64,
    /// Retries after the initial attempt.
    pub max_retries: usize,
    /// First backoff delay in milliseconds; doubles after every retried attempt.
    pub retry_backoff_ms: u64,
    /// Upper bound for the backoff delay in milliseconds.
    pub max_backoff_ms: u64,
    /// Header that carries `auth_token`.
    pub auth_header: String,
    /// Static token injected on endpoint-relative requests.
    pub auth_token: Option<String>,
    pub user_agent: ProductInfo,
}

impl ClientOptions {
    pub(crate) fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            timeout_ms: 5_000,
            max_retries: 10,
            retry_backoff_ms: 250,
            max_backoff_ms: 10_000,
            auth_header: "Authorization".to_owned(),
            auth_token: None,
            user_agent: ProductInfo::default(),
        }
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("endpoint", &self.endpoint)
            .field("timeout_ms", &self.timeout_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("max_backoff_ms", &self.max_backoff_ms)
            .field("auth_header", &self.auth_header)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Per-call overrides for timeout and failure reporting.
///
/// `()` converts into the defaults and a [`Duration`] into a timeout override,
/// so verb methods can be called as `client.get("users/1", ())`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CallOptions {
    /// Per-attempt timeout; falls back to [`ClientOptions::timeout_ms`].
    pub timeout: Option<Duration>,
    /// Return an error when every attempt fails without a response.
    ///
    /// When `false`, such a call resolves to [`CloudResult::empty`](crate::CloudResult::empty).
    pub throw_on_error: bool,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn throw_on_error(mut self, throw_on_error: bool) -> Self {
        self.throw_on_error = throw_on_error;
        self
    }
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            throw_on_error: true,
        }
    }
}

impl From<()> for CallOptions {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

impl From<Duration> for CallOptions {
    fn from(timeout: Duration) -> Self {
        Self::default().timeout(timeout)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{CallOptions, ClientOptions, ProductInfo};

    #[test]
    fn defaults_match_documented_values() {
        let opts = ClientOptions::default();
        assert_eq!(opts.endpoint, "");
        assert_eq!(opts.timeout_ms, 5_000);
        assert_eq!(opts.max_retries, 10);
        assert_eq!(opts.retry_backoff_ms, 250);
        assert_eq!(opts.max_backoff_ms, 10_000);
        assert_eq!(opts.auth_header, "Authorization");
        assert!(opts.auth_token.is_none());
        assert_eq!(opts.user_agent.product, "CloudX");
    }

    #[test]
    fn product_info_renders_name_and_version() {
        let info = ProductInfo::new("Bot", "1.2.3");
        assert_eq!(info.value(), "Bot 1.2.3");
        assert_eq!(info.to_string(), "Bot 1.2.3");
    }

    #[test]
    fn debug_redacts_auth_token() {
        let opts = ClientOptions {
            auth_token: Some("secret-token".to_owned()),
            ..ClientOptions::default()
        };
        let debug = format!("{opts:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn call_options_conversions() {
        assert_eq!(CallOptions::from(()), CallOptions::default());
        assert!(CallOptions::default().throw_on_error);

        let call = CallOptions::from(Duration::from_millis(40));
        assert_eq!(call.timeout, Some(Duration::from_millis(40)));
        assert!(call.throw_on_error);

        let call = CallOptions::new().throw_on_error(false);
        assert!(!call.throw_on_error);
        assert_eq!(call.timeout, None);
    }
}
