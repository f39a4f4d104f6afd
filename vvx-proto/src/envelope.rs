use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Puts a request body into the `{"data": ...}` envelope the phone expects.
///
/// A mapping goes in as is, a sequence is already in list form, any other
/// value is sent as a one element list. An empty mapping still produces
/// `{"data":{}}`.
pub fn wrap_body(body: Value) -> Value {
    match body {
        Value::Object(_) | Value::Array(_) => json!({ "data": body }),
        single => json!({ "data": [single] }),
    }
}

/// `{"Status": 2000, "data": ...}` as returned by every REST endpoint.
///
/// `Status` is the application status, unrelated to the HTTP status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(rename = "Status")]
    pub status: i64,
    #[serde(default)]
    pub data: Value,
}
