use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The decoded payload of an access token. `sub`, `role` and `exp` are
/// required; deserialization fails when any of them is absent, so a token
/// missing them is rejected at decode time rather than at each use site.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Claims {
    /// Identity of the authenticated user.
    pub sub: String,
    /// Role used by the UI for authorization branching.
    pub role: String,
    /// Expiry as Unix seconds.
    pub exp: i64,
    pub email: Option<String>,
    pub nome: Option<String>,
    /// Any additional claim fields we don't explicitly model.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl Claims {
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }

    /// Read an unmodelled claim as a display string, if present.
    pub fn attribute(&self, name: &str) -> Option<String> {
        self.extra.get(name).map(value_to_string)
    }
}

/// Convert arbitrary JSON claim values into string form.
/// Sanitizes the resulting string to remove control characters.
fn value_to_string(value: &Value) -> String {
    let raw = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    };
    raw.chars().filter(|c| !c.is_control()).collect()
}
