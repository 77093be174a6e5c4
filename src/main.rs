use caixa_session::config::{init_logging, load_config, print_schema};
use caixa_session::session::SessionManager;
use tracing::{error, info};

/// Smoke entrypoint: restore a session against the configured backend and
/// report the outcome. `--schema` prints the config JSON schema instead.
#[tokio::main]
async fn main() {
    if std::env::args().any(|arg| arg == "--schema") {
        print_schema();
        return;
    }

    let config = load_config();
    init_logging(&config.logging);

    let manager = match SessionManager::new(config) {
        Ok(manager) => manager,
        Err(err) => {
            error!(error = %err, "failed to build session manager");
            std::process::exit(1);
        }
    };

    manager.init().await;
    match manager.current_user() {
        Some(user) => info!(sub = %user.sub, role = %user.role, "session restored"),
        None => info!("no active session"),
    }
}
