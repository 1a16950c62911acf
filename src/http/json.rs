//! JSON body formatting
//!
//! API responses and JSON error bodies are pretty-printed with a fixed
//! indentation width (the `json_spaces` setting, 4 by default).

use serde::Serialize;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Serialize a value as pretty-printed JSON with `spaces` indentation.
///
/// # Examples
/// ```
/// use survey_web::http::json::pretty;
/// let value = serde_json::json!({"code": 404});
/// assert_eq!(pretty(&value, 4).unwrap(), "{\n    \"code\": 404\n}");
/// ```
pub fn pretty<T: Serialize>(value: &T, spaces: usize) -> Result<String, serde_json::Error> {
    let indent = " ".repeat(spaces);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
