//! Call-scoped request context.
//!
//! A handler passes the context it received (if any) so the dispatcher can
//! pick up a per-request token or user. Session data is keyed by field name;
//! `"session"` is the conventional one.

use std::collections::BTreeMap;
use std::fmt;

use crate::http::REDACTED;
use crate::session::SessionUser;

/// Field name looked up when the configuration does not name one.
pub const DEFAULT_SESSION_FIELD: &str = "session";

/// Session data carried by a single request.
#[derive(Clone, Default)]
pub struct SessionData {
    pub user: Option<SessionUser>,
    pub token: Option<String>,
}

impl fmt::Debug for SessionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionData")
            .field("user", &self.user.as_ref().map(|_| REDACTED))
            .field("token", &self.token.as_ref().map(|_| REDACTED))
            .finish()
    }
}

impl SessionData {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            user: None,
            token: Some(token.into()),
        }
    }

    pub fn with_user(user: SessionUser) -> Self {
        Self {
            user: Some(user),
            token: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CallContext {
    sessions: BTreeMap<String, SessionData>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context with `data` stored under the default session field.
    pub fn with_session(data: SessionData) -> Self {
        Self::new().insert_session(DEFAULT_SESSION_FIELD, data)
    }

    pub fn insert_session(mut self, field: impl Into<String>, data: SessionData) -> Self {
        self.sessions.insert(field.into(), data);
        self
    }

    pub fn session(&self, field: &str) -> Option<&SessionData> {
        self.sessions.get(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn session_lookup_by_field() {
        let ctx = CallContext::new()
            .insert_session("auth", SessionData::with_token("t1"))
            .insert_session(DEFAULT_SESSION_FIELD, SessionData::with_token("t2"));
        assert_eq!(ctx.session("auth").unwrap().token.as_deref(), Some("t1"));
        assert_eq!(ctx.session("session").unwrap().token.as_deref(), Some("t2"));
        assert!(ctx.session("missing").is_none());
    }

    #[test]
    fn debug_redacts_credentials() {
        let ctx = CallContext::with_session(SessionData {
            user: Some(Arc::new(serde_json::json!({"token": "user-secret"}))),
            token: Some("ctx-secret".to_string()),
        });
        let rendered = format!("{ctx:?}");
        assert!(!rendered.contains("user-secret"));
        assert!(!rendered.contains("ctx-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn with_user_has_no_token() {
        let data = SessionData::with_user(Arc::new(serde_json::json!({"token": "u"})));
        assert!(data.token.is_none());
        assert!(data.user.is_some());
    }
}
