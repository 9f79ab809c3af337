//! Cached credential slots shared across dispatcher calls.
//!
//! # Design
//! `SessionStore` is injected into the `Dispatcher` rather than living in
//! module-level globals, so each test (or each service account) gets its own
//! isolated instance. The store only holds what the caller put there: there is
//! no expiry, and invalidation is the caller's job via `clear`.
//!
//! A pinned token is process-wide. Per-request user tokens belong in the
//! `CallContext`, never here.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::http::REDACTED;

/// Anything that can yield a bearer token.
///
/// Wraps whichever user representation the host application carries, whether
/// the token sits in a plain field or behind an accessor.
pub trait CredentialProvider: Send + Sync + fmt::Debug {
    fn token(&self) -> Option<String>;
}

/// A shared, type-erased user record.
pub type SessionUser = Arc<dyn CredentialProvider>;

/// JSON user records expose their token through a top-level `token` string.
impl CredentialProvider for serde_json::Value {
    fn token(&self) -> Option<String> {
        self.get("token")
            .and_then(serde_json::Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }
}

/// Adapts an accessor closure, for user types that compute or look up their
/// token on demand.
pub struct TokenAccessor<F> {
    label: &'static str,
    accessor: F,
}

impl<F> TokenAccessor<F>
where
    F: Fn() -> Option<String> + Send + Sync,
{
    pub fn new(label: &'static str, accessor: F) -> Self {
        Self { label, accessor }
    }
}

impl<F> fmt::Debug for TokenAccessor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAccessor")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl<F> CredentialProvider for TokenAccessor<F>
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn token(&self) -> Option<String> {
        (self.accessor)()
    }
}

/// Storage for the pinned token and user.
///
/// Setters are last-write-wins and never validate their input.
pub trait SessionStore: Send + Sync {
    fn token(&self) -> Option<String>;
    fn set_token(&self, token: String);
    fn user(&self) -> Option<SessionUser>;
    fn set_user(&self, user: SessionUser);
    fn clear(&self);
}

#[derive(Default)]
struct Slots {
    token: Option<String>,
    user: Option<SessionUser>,
}

/// Process-local `SessionStore` backed by an `RwLock`.
#[derive(Default)]
pub struct InMemorySession {
    slots: RwLock<Slots>,
}

impl InMemorySession {
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Debug for InMemorySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("InMemorySession")
            .field("token", &slots.token.as_ref().map(|_| REDACTED))
            .field("user", &slots.user.as_ref().map(|_| REDACTED))
            .finish()
    }
}

impl SessionStore for InMemorySession {
    fn token(&self) -> Option<String> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .token
            .clone()
    }

    fn set_token(&self, token: String) {
        self.slots.write().unwrap_or_else(PoisonError::into_inner).token = Some(token);
    }

    fn user(&self) -> Option<SessionUser> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .user
            .clone()
    }

    fn set_user(&self, user: SessionUser) {
        self.slots.write().unwrap_or_else(PoisonError::into_inner).user = Some(user);
    }

    fn clear(&self) {
        *self.slots.write().unwrap_or_else(PoisonError::into_inner) = Slots::default();
    }
}
