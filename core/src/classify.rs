//! Turns raw responses into a resolved `ApiResponse` or a `DispatchError`.
//!
//! The remote API does not signal failure consistently: some errors arrive as
//! plain-text markers with a 200 status, others as JSON bodies carrying an
//! `error` field. Classification looks at the body, not the status code.

use serde_json::{Map, Value};

use crate::config::ContentType;
use crate::error::DispatchError;
use crate::http::HttpResponse;
use crate::response::ApiResponse;

/// Substrings that mark a remote-side failure regardless of status.
pub const SENTINEL_MARKERS: [&str; 2] = ["Authentication Error", "Internal Server Error"];

/// Status reported when neither the body nor the transport provides one.
const FALLBACK_STATUS: u16 = 200;

pub fn classify(
    response: &HttpResponse,
    content_type: ContentType,
) -> Result<ApiResponse, DispatchError> {
    let body = response.body.as_str();

    if SENTINEL_MARKERS.iter().any(|marker| body.contains(marker)) {
        return Err(DispatchError::Sentinel {
            message: body.to_string(),
        });
    }
    if body.is_empty() {
        return Err(DispatchError::EmptyResponse);
    }

    let transport_status = match response.status {
        0 => FALLBACK_STATUS,
        status => status,
    };

    let mut parsed = match content_type {
        ContentType::Json => match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => ApiResponse::new(map),
            Ok(Value::String(text)) => ApiResponse::text_body(text),
            Ok(other) => {
                let mut map = Map::new();
                map.insert("success".to_string(), Value::Bool(true));
                map.insert("data".to_string(), other);
                ApiResponse::new(map)
            }
            Err(source) => {
                return Err(DispatchError::Parse {
                    source,
                    status: transport_status,
                })
            }
        },
        ContentType::Text => ApiResponse::text_body(body),
    };

    if parsed.get("status").map_or(true, Value::is_null) {
        parsed.insert("status", Value::from(transport_status));
    }

    if parsed.contains_key("error") {
        Err(DispatchError::Remote(parsed))
    } else {
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    fn resolved(body: &str, content_type: ContentType) -> Value {
        classify(&response(body), content_type).unwrap().into()
    }

    #[test]
    fn empty_body_is_rejected() {
        let err = classify(&response(""), ContentType::Json).unwrap_err();
        assert!(matches!(err, DispatchError::EmptyResponse));
        assert_eq!(err.message(), "Empty response");
    }

    #[test]
    fn internal_server_error_marker_is_rejected_with_raw_body() {
        let err = classify(&response("Internal Server Error: boom"), ContentType::Json).unwrap_err();
        match err {
            DispatchError::Sentinel { message } => assert_eq!(message, "Internal Server Error: boom"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn authentication_error_marker_wins_over_valid_json() {
        let err = classify(
            &response(r#"{"detail":"Authentication Error"}"#),
            ContentType::Json,
        )
        .unwrap_err();
        assert!(matches!(err, DispatchError::Sentinel { .. }));
    }

    #[test]
    fn json_string_is_wrapped() {
        assert_eq!(
            resolved(r#""hello""#, ContentType::Json),
            json!({"success": true, "text": "hello", "status": 200})
        );
    }

    #[test]
    fn json_object_is_used_as_is() {
        assert_eq!(
            resolved(r#"{"value":1}"#, ContentType::Json),
            json!({"value": 1, "status": 200})
        );
    }

    #[test]
    fn error_field_rejects_with_body() {
        let err = classify(&response(r#"{"error":"bad"}"#), ContentType::Json).unwrap_err();
        match err {
            DispatchError::Remote(body) => {
                assert_eq!(Value::from(body), json!({"error": "bad", "status": 200}))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = classify(&response("not-json{{"), ContentType::Json).unwrap_err();
        assert!(matches!(err, DispatchError::Parse { status: 200, .. }));
    }

    #[test]
    fn text_content_is_wrapped() {
        assert_eq!(
            resolved("plain text", ContentType::Text),
            json!({"success": true, "text": "plain text", "status": 200})
        );
    }

    #[test]
    fn text_content_skips_json_parsing() {
        assert_eq!(
            resolved(r#"{"value":1}"#, ContentType::Text),
            json!({"success": true, "text": "{\"value\":1}", "status": 200})
        );
    }

    #[test]
    fn body_status_takes_precedence() {
        let mut resp = response(r#"{"value":1,"status":"queued"}"#);
        resp.status = 202;
        let value: Value = classify(&resp, ContentType::Json).unwrap().into();
        assert_eq!(value["status"], "queued");
    }

    #[test]
    fn transport_status_used_when_body_has_none() {
        let mut resp = response(r#"{"value":1}"#);
        resp.status = 201;
        assert_eq!(classify(&resp, ContentType::Json).unwrap().status(), Some(201));
    }

    #[test]
    fn missing_transport_status_falls_back_to_200() {
        let mut resp = response(r#"{"value":1}"#);
        resp.status = 0;
        assert_eq!(classify(&resp, ContentType::Json).unwrap().status(), Some(200));
    }

    #[test]
    fn non_object_json_is_wrapped_as_data() {
        assert_eq!(
            resolved("[1,2]", ContentType::Json),
            json!({"success": true, "data": [1, 2], "status": 200})
        );
    }
}
