//! Normalized response contract.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Response every successful facade call resolves to.
///
/// `success` is always present: backends that only send a numeric `code`
/// get `success = (code == 0)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default)]
    pub data: Value,

    /// Any other top-level fields the backend sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Insert a boolean `success` into an object body that lacks one.
///
/// Returns `true` when the field was derived. Non-object bodies are left
/// untouched.
pub(crate) fn derive_success(body: &mut Value) -> bool {
    let Value::Object(map) = body else {
        return false;
    };
    if matches!(map.get("success"), Some(Value::Bool(_))) {
        return false;
    }

    let success = map.get("code").and_then(Value::as_i64) == Some(0);
    map.insert("success".to_string(), Value::Bool(success));
    true
}

impl ApiResponse {
    /// Build the normalized view of a 2xx body.
    pub fn from_body(mut body: Value) -> Self {
        derive_success(&mut body);

        let mut map = match body {
            Value::Object(map) => map,
            other => {
                return Self {
                    success: true,
                    code: None,
                    message: None,
                    data: other,
                    extra: Map::new(),
                }
            }
        };

        let success = map
            .remove("success")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        let code = match map.remove("code") {
            Some(value) => match value.as_i64() {
                Some(code) => Some(code),
                None => {
                    map.insert("code".to_string(), value);
                    None
                }
            },
            None => None,
        };

        let message = match map.remove("message") {
            Some(Value::String(message)) => Some(message),
            Some(Value::Null) | None => None,
            Some(other) => {
                map.insert("message".to_string(), other);
                None
            }
        };

        let data = map.remove("data").unwrap_or(Value::Null);

        Self {
            success,
            code,
            message,
            data,
            extra: map,
        }
    }

    /// Deserialize `data` into a typed view model.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_value(self.data.clone()).map_err(|e| ApiError::Network {
            status: None,
            message: format!("unexpected response data: {e}"),
        })
    }
}
