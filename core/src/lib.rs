//! Uniform outbound API calls for server-side request handlers.
//!
//! # Overview
//! `Dispatcher::make` resolves a bearer token, assembles the request from a
//! `RequestConfig`, performs the HTTP call through a `Transport`, and folds
//! the remote API's inconsistent success and error shapes into a single
//! `Result<ApiResponse, DispatchError>`.
//!
//! # Design
//! - Option assembly (`Dispatcher::build_request`) and response
//!   classification (`classify`) are pure; the transport call is the only
//!   suspension point.
//! - Pinned credentials live in an injected `SessionStore`, per-request ones
//!   in a `CallContext`.
//! - Diagnostics go through the narrow `Logger` interface, backed by
//!   `tracing` in production.

pub mod classify;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod encode;
pub mod error;
pub mod http;
pub mod log;
pub mod response;
pub mod session;
pub mod settings;
pub mod transport;

pub use classify::classify;
pub use config::{ContentType, Payload, PayloadValue, RawPayload, RequestConfig};
pub use context::{CallContext, SessionData};
pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use error::{ConfigError, DispatchError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, MultipartPart, RequestBody, TransportOptions};
pub use log::{LogCategory, LogLevel, Logger, TracingLogger};
pub use response::ApiResponse;
pub use session::{CredentialProvider, InMemorySession, SessionStore, SessionUser, TokenAccessor};
pub use settings::Settings;
pub use transport::{ReqwestTransport, Transport};
