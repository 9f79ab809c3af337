//! Per-call request configuration.
//!
//! # Design
//! Transport options are fixed, named fields. Everything sent as request data
//! lives in an explicit `Payload`, so a payload key can never collide with an
//! option name. Raw payload carriers are a single `RawPayload` enum, which
//! makes them mutually exclusive by construction.

use std::time::Duration;

use crate::context::DEFAULT_SESSION_FIELD;
use crate::http::{HttpMethod, MultipartPart, TransportOptions, DEFAULT_TIMEOUT};

/// How the response body is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    Json,
    /// Opaque text, wrapped as `{success: true, text}`.
    Text,
}

/// A payload value: a scalar or a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadValue {
    Single(String),
    List(Vec<String>),
}

impl From<&str> for PayloadValue {
    fn from(value: &str) -> Self {
        PayloadValue::Single(value.to_string())
    }
}

impl From<String> for PayloadValue {
    fn from(value: String) -> Self {
        PayloadValue::Single(value)
    }
}

impl From<Vec<String>> for PayloadValue {
    fn from(values: Vec<String>) -> Self {
        PayloadValue::List(values)
    }
}

impl From<Vec<&str>> for PayloadValue {
    fn from(values: Vec<&str>) -> Self {
        PayloadValue::List(values.into_iter().map(str::to_string).collect())
    }
}

/// Ordered request data. Insertion order is preserved on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Payload {
    fields: Vec<(String, PayloadValue)>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, replacing an existing value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PayloadValue>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&PayloadValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PayloadValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for Payload
where
    K: Into<String>,
    V: Into<PayloadValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut payload = Payload::new();
        for (k, v) in iter {
            payload.insert(k, v);
        }
        payload
    }
}

/// Pre-built request data that bypasses payload encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawPayload {
    /// Sent verbatim.
    Body(String),
    /// Simple fields sent as `multipart/form-data`.
    FormData(Vec<(String, String)>),
    Multipart(Vec<MultipartPart>),
}

/// Options for one dispatcher call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfig {
    /// Overrides the dispatcher's default base URL.
    pub base_url: Option<String>,
    pub method: HttpMethod,
    /// When set, replaces the synthesized `Authorization` header entirely.
    pub headers: Option<Vec<(String, String)>>,
    pub timeout: Duration,
    pub reject_unauthorized: bool,
    pub content_type: ContentType,
    pub gzip: bool,
    pub carrier: Option<RawPayload>,
    pub arrays_as_form_args: bool,
    pub session_field: String,
    pub payload: Payload,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            method: HttpMethod::Post,
            headers: None,
            timeout: DEFAULT_TIMEOUT,
            reject_unauthorized: false,
            content_type: ContentType::Json,
            gzip: false,
            carrier: None,
            arrays_as_form_args: false,
            session_field: DEFAULT_SESSION_FIELD.to_string(),
            payload: Payload::new(),
        }
    }
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(Vec::new)
            .push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn reject_unauthorized(mut self, reject: bool) -> Self {
        self.reject_unauthorized = reject;
        self
    }

    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn gzip(mut self, gzip: bool) -> Self {
        self.gzip = gzip;
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.carrier = Some(RawPayload::Body(body.into()));
        self
    }

    pub fn form_data(mut self, fields: Vec<(String, String)>) -> Self {
        self.carrier = Some(RawPayload::FormData(fields));
        self
    }

    pub fn multipart(mut self, parts: Vec<MultipartPart>) -> Self {
        self.carrier = Some(RawPayload::Multipart(parts));
        self
    }

    pub fn arrays_as_form_args(mut self, enabled: bool) -> Self {
        self.arrays_as_form_args = enabled;
        self
    }

    pub fn session_field(mut self, field: impl Into<String>) -> Self {
        self.session_field = field.into();
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<PayloadValue>) -> Self {
        self.payload.insert(key, value);
        self
    }

    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// A zero timeout means "use the default".
    pub(crate) fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            timeout: if self.timeout.is_zero() {
                DEFAULT_TIMEOUT
            } else {
                self.timeout
            },
            reject_unauthorized: self.reject_unauthorized,
            gzip: self.gzip,
        }
    }
}
