//! Library exports for caixa-session, shared between the binary and tests.

pub mod config;
pub mod errors;
pub mod http;
pub mod models;
pub mod session;
pub mod token;
