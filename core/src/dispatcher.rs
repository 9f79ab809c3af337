//! Outbound API request dispatcher.
//!
//! # Design
//! A call is split the same way at every layer: `build_request` turns a path
//! and a `RequestConfig` into an `HttpRequest` without touching the network,
//! the `Transport` executes it, and `classify` turns the raw response into an
//! `ApiResponse` or a `DispatchError`. `make` strings the three together and
//! adds logging.
//!
//! Token resolution order: the pinned session token, then the token carried
//! by the call context, then the token of the context user (or, without one,
//! the pinned session user).

use std::sync::Arc;

use tracing::{field, instrument, Span};
use url::Url;
use uuid::Uuid;

use crate::classify::classify;
use crate::config::{RawPayload, RequestConfig};
use crate::context::CallContext;
use crate::encode::{append_query, encode_pairs, form_pairs, query_pairs};
use crate::error::DispatchError;
use crate::http::{HttpRequest, MultipartPart, RequestBody};
use crate::log::{LogCategory, Logger, TracingLogger};
use crate::response::ApiResponse;
use crate::session::{InMemorySession, SessionStore};
use crate::settings::Settings;
use crate::transport::{ReqwestTransport, Transport};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Builder for configuring a [`Dispatcher`].
pub struct DispatcherBuilder<T> {
    transport: T,
    default_base_url: Option<String>,
    session: Option<Arc<dyn SessionStore>>,
    logger: Option<Arc<dyn Logger>>,
}

impl<T: Transport> DispatcherBuilder<T> {
    /// Base URL used when a call's configuration does not set one.
    pub fn default_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.default_base_url = Some(base_url.into());
        self
    }

    pub fn session(mut self, session: Arc<dyn SessionStore>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn build(self) -> Dispatcher<T> {
        Dispatcher {
            transport: self.transport,
            default_base_url: self.default_base_url,
            session: self
                .session
                .unwrap_or_else(|| Arc::new(InMemorySession::new())),
            logger: self
                .logger
                .unwrap_or_else(|| Arc::new(TracingLogger::default())),
        }
    }
}

/// Issues API calls and normalizes their results.
pub struct Dispatcher<T = ReqwestTransport> {
    transport: T,
    default_base_url: Option<String>,
    session: Arc<dyn SessionStore>,
    logger: Arc<dyn Logger>,
}

impl Dispatcher<ReqwestTransport> {
    /// Dispatcher over reqwest configured from startup settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut builder = Dispatcher::builder(ReqwestTransport::new())
            .logger(Arc::new(TracingLogger::new(settings.log_level.clone())));
        if let Some(url) = &settings.api_url {
            builder = builder.default_base_url(url.clone());
        }
        builder.build()
    }
}

impl<T: Transport> Dispatcher<T> {
    pub fn builder(transport: T) -> DispatcherBuilder<T> {
        DispatcherBuilder {
            transport,
            default_base_url: None,
            session: None,
            logger: None,
        }
    }

    /// The session store used for pinned tokens and users.
    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    fn base_url<'a>(&'a self, config: &'a RequestConfig) -> Option<&'a str> {
        let base = config
            .base_url
            .as_deref()
            .or(self.default_base_url.as_deref())?
            .trim();
        if base.is_empty() || Url::parse(base).is_err() {
            return None;
        }
        Some(base.trim_end_matches('/'))
    }

    fn resolve_token(&self, ctx: Option<&CallContext>, session_field: &str) -> Option<String> {
        let present = |t: &String| !t.is_empty();
        if let Some(token) = self.session.token().filter(present) {
            return Some(token);
        }
        let session = ctx.and_then(|c| c.session(session_field));
        if let Some(token) = session.and_then(|s| s.token.clone()).filter(present) {
            return Some(token);
        }
        session
            .and_then(|s| s.user.clone())
            .or_else(|| self.session.user())
            .and_then(|user| user.token())
            .filter(present)
    }

    /// Assembles the request for `path`.
    ///
    /// Returns `None` when no usable base URL is configured.
    pub fn build_request(
        &self,
        ctx: Option<&CallContext>,
        path: &str,
        config: &RequestConfig,
    ) -> Option<HttpRequest> {
        let base_url = self.base_url(config)?;

        let mut url = if path.starts_with('/') {
            format!("{base_url}{path}")
        } else {
            format!("{base_url}/{path}")
        };

        let mut headers = match &config.headers {
            Some(explicit) => explicit.clone(),
            None => self
                .resolve_token(ctx, &config.session_field)
                .map(|token| vec![("Authorization".to_string(), format!("Bearer {token}"))])
                .unwrap_or_default(),
        };

        let body = match &config.carrier {
            Some(RawPayload::Body(raw)) => RequestBody::Raw(raw.clone()),
            Some(RawPayload::FormData(fields)) => RequestBody::Multipart(
                fields
                    .iter()
                    .map(|(name, value)| MultipartPart::text(name.clone(), value.clone()))
                    .collect(),
            ),
            Some(RawPayload::Multipart(parts)) => RequestBody::Multipart(parts.clone()),
            None if config.method.carries_form_body() => {
                let pairs = form_pairs(&config.payload, config.arrays_as_form_args);
                if !headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("content-type")) {
                    headers.push(("content-type".to_string(), FORM_CONTENT_TYPE.to_string()));
                }
                RequestBody::Form(encode_pairs(&pairs))
            }
            None => {
                let pairs = query_pairs(&config.payload, config.arrays_as_form_args);
                append_query(&mut url, &encode_pairs(&pairs));
                RequestBody::Empty
            }
        };

        Some(HttpRequest {
            method: config.method,
            url,
            headers,
            body,
            options: config.transport_options(),
        })
    }

    /// Performs one API call.
    ///
    /// Returns `None`, without touching the network, when no base URL is
    /// configured. Otherwise exactly one of a resolved `ApiResponse` or a
    /// `DispatchError` is produced.
    #[instrument(
        name = "api_dispatch",
        skip_all,
        fields(
            request_id = %Uuid::new_v4(),
            http.method = field::Empty,
            http.url = field::Empty,
            http.status_code = field::Empty,
        )
    )]
    pub async fn make(
        &self,
        ctx: Option<&CallContext>,
        path: &str,
        config: RequestConfig,
    ) -> Option<Result<ApiResponse, DispatchError>> {
        let Some(request) = self.build_request(ctx, path, &config) else {
            self.logger
                .error(format_args!("API base URL is not configured"));
            return None;
        };

        let span = Span::current();
        span.record("http.method", request.method.as_str());
        span.record("http.url", request.url.as_str());

        if self.logger.includes(LogCategory::Requests) {
            self.logger.log(format_args!("request: {request:?}"));
        }

        let response = match self.transport.send(request.clone()).await {
            Ok(response) => response,
            Err(err) => {
                if self.logger.includes(LogCategory::Errors) {
                    self.logger
                        .error(format_args!("transport error for {}: {err}", request.url));
                }
                return Some(Err(DispatchError::Transport(err)));
            }
        };

        span.record("http.status_code", response.status);
        if self.logger.includes(LogCategory::Responses) {
            self.logger.log(format_args!(
                "response {}: {}",
                response.status, response.body
            ));
        }

        let outcome = classify(&response, config.content_type);
        if let Err(DispatchError::Parse { source, .. }) = &outcome {
            self.logger.log(format_args!("request: {request:?}"));
            self.logger.log(format_args!("body: {}", response.body));
            self.logger.error(format_args!("context: {ctx:?}"));
            self.logger.error(format_args!("error: {source}"));
        }
        Some(outcome)
    }
}
