use caixa_session::config::{ConfigV1, EndpointConfig, HttpConfig, LoggingConfig};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;

pub const TEST_SECRET: &[u8] = b"test-secret";

/// Mint a signed access token the way the backend would. The client never
/// verifies the signature, but using a real JWT keeps the shape honest.
pub fn make_token(sub: &str, role: &str, ttl_secs: i64) -> String {
    let claims = json!({
        "sub": sub,
        "role": role,
        "exp": (Utc::now() + Duration::seconds(ttl_secs)).timestamp(),
        "email": format!("{}@example.com", sub),
    });
    encode(&Header::default(), &claims, &EncodingKey::from_secret(TEST_SECRET))
        .expect("failed to encode token")
}

pub fn test_config(base_url: &str) -> ConfigV1 {
    ConfigV1 {
        base_url: base_url.to_string(),
        http: HttpConfig { timeout_in_ms: 5000 },
        endpoints: EndpointConfig::default(),
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "console".to_string(),
        },
    }
}
