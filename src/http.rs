use reqwest::{Client, Method, Response};
use serde_json::Value;

/// A description of an outbound API call. The bearer token is deliberately
/// not part of the request: it is attached at dispatch time, so a token
/// refreshed between construction and dispatch is the one that goes out.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        ApiRequest {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Send a request against `base_url`, attaching the bearer token when one is
/// held. Returns the response whatever its status; status handling is the
/// caller's concern.
pub(crate) async fn dispatch(
    client: &Client,
    base_url: &str,
    request: &ApiRequest,
    token: Option<&str>,
) -> Result<Response, reqwest::Error> {
    let url = format!("{}{}", base_url.trim_end_matches('/'), request.path);
    let mut builder = client.request(request.method.clone(), url);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    if let Some(body) = &request.body {
        builder = builder.json(body);
    }
    builder.send().await
}
