pub mod routes;

use serde_json::Value;

use crate::color::to_hex;

// HELPERS

/// Rewrites an `rgb(...)` color in the body to `#rrggbb` before validation.
pub fn normalize_color(mut body: Value) -> Value {
    if let Some(color) = body.get_mut("color") {
        if let Some(raw) = color.as_str() {
            *color = Value::String(to_hex(raw));
        }
    }
    body
}
