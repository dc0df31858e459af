//! `cloud-http` is an async HTTP call engine with bounded retries.
//!
//! Every call goes through [`CloudClient::run_request`], which:
//! - builds a fresh [`HttpRequest`] per attempt
//! - bounds each attempt with a deadline [`CancellationToken`]
//! - retries missing responses and statuses 429/500 with exponential backoff
//! - normalizes the outcome into a [`CloudResult`]
//!
//! Verb helpers: [`CloudClient::get`], [`CloudClient::post`], [`CloudClient::put`],
//! [`CloudClient::patch`], [`CloudClient::delete`] and [`CloudClient::graphql`].

mod cancel;
mod client;
mod error;
mod options;
mod request;
mod result;
mod retry;
mod transport;
mod wire;

pub use cancel::CancellationToken;
pub use client::CloudClient;
pub use error::CloudHttpError;
pub use options::{CallOptions, ClientOptions, ProductInfo};
pub use request::{HttpMethod, HttpRequest};
pub use result::{CloudResult, Content, Headers};
pub use transport::{ReqwestTransport, Transport};

pub type Result<T> = std::result::Result<T, CloudHttpError>;
