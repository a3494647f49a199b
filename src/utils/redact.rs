//! Recursive redaction of credential material before anything reaches the
//! operational log store.

use serde_json::Value;

const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "confirmpassword",
    "token",
    "authorization",
    "refreshtoken",
    "otp",
];

const REDACTED: &str = "[REDACTED]";

/// Replace the values of sensitive keys (case-insensitive) anywhere in a
/// JSON tree. Non-object inputs pass through untouched.
pub fn redact_sensitive(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, val) in map {
                if SENSITIVE_FIELDS.contains(&key.to_lowercase().as_str()) {
                    out.insert(key.clone(), Value::String(REDACTED.to_string()));
                } else {
                    out.insert(key.clone(), redact_sensitive(val));
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redacts_sensitive_keys_case_insensitively() {
        let body = json!({
            "email": "a@b.com",
            "password": "Secret123",
            "Token": "abc",
            "nested": { "OTP": "1234", "phoneNumber": "9998887776" },
            "list": [{ "refreshToken": "xyz" }],
        });

        let redacted = redact_sensitive(&body);
        assert_eq!(redacted["email"], "a@b.com");
        assert_eq!(redacted["password"], "[REDACTED]");
        assert_eq!(redacted["Token"], "[REDACTED]");
        assert_eq!(redacted["nested"]["OTP"], "[REDACTED]");
        assert_eq!(redacted["nested"]["phoneNumber"], "9998887776");
        assert_eq!(redacted["list"][0]["refreshToken"], "[REDACTED]");
    }

    #[test]
    fn non_objects_pass_through() {
        assert_eq!(redact_sensitive(&json!("plain")), json!("plain"));
        assert_eq!(redact_sensitive(&json!(42)), json!(42));
    }
}
