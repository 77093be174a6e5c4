pub mod manager;
pub mod state;

mod refresh;

// Re-export so consumers can do "use caixa_session::session::SessionManager;"
pub use manager::{SessionManager, Subscription};
pub use state::SessionSnapshot;
