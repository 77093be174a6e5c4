use serde::Deserialize;

/// Success payload of the login, registration and refresh endpoints. The
/// backend also inlines user fields next to the token; those are ignored
/// here because the decoded token is the source of truth for the user.
#[derive(Deserialize, Debug)]
pub struct TokenResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

/// Error payload the backend attaches to non-2xx responses.
#[derive(Deserialize, Debug)]
pub struct ErrorBody {
    pub error: Option<String>,
}
