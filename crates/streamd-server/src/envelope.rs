use serde_json::{json, Value};

use streamd_types::{ControlResult, ReturnCode};

/// Render the wire envelope `{"code", "description", "response"}`.
///
/// `response` is the node's rendered JSON text, embedded as structured JSON
/// rather than a quoted string; `None` renders as `null`.
pub fn envelope(code: ReturnCode, response: Option<&str>) -> String {
    let response = match response {
        Some(text) => {
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
        }
        None => Value::Null,
    };
    json!({
        "code": code.code(),
        "description": code.description(),
        "response": response,
    })
    .to_string()
}

/// Split a command result into its wire code and envelope body.
pub fn envelope_for(result: &ControlResult<Option<String>>) -> (ReturnCode, String) {
    match result {
        Ok(output) => (ReturnCode::Ok, envelope(ReturnCode::Ok, output.as_deref())),
        Err(err) => (err.code(), envelope(err.code(), None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamd_types::ControlError;

    #[test]
    fn success_with_payload() {
        let body = envelope(ReturnCode::Ok, Some(r#"{"name":"p0"}"#));
        assert_eq!(
            body,
            r#"{"code":0,"description":"Success","response":{"name":"p0"}}"#
        );
    }

    #[test]
    fn success_without_payload() {
        let body = envelope(ReturnCode::Ok, None);
        assert_eq!(body, r#"{"code":0,"description":"Success","response":null}"#);
    }

    #[test]
    fn error_carries_fixed_description() {
        let result = Err(ControlError::NoResource("/pipelines/x".into()));
        let (code, body) = envelope_for(&result);
        assert_eq!(code, ReturnCode::NoResource);
        assert_eq!(
            body,
            r#"{"code":3,"description":"Resource not found","response":null}"#
        );
    }

    #[test]
    fn member_order_is_stable() {
        let body = envelope(ReturnCode::Ok, None);
        let code_at = body.find("\"code\"").unwrap();
        let desc_at = body.find("\"description\"").unwrap();
        let resp_at = body.find("\"response\"").unwrap();
        assert!(code_at < desc_at && desc_at < resp_at);
    }
}
