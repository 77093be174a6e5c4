pub mod api;
pub mod claims;

// Re-export so consumers can do "use caixa_session::models::Claims;"
pub use api::{ErrorBody, TokenResponse};
pub use claims::Claims;
