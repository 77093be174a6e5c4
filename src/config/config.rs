use figment::providers::{Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0: backend location, endpoint paths, HTTP, logging.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct ConfigV1 {
    /// Base URL of the backend, e.g. "https://api.example.com".
    pub base_url: String,
    pub http: HttpConfig,
    #[serde(default)]
    pub endpoints: EndpointConfig,
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct HttpConfig {
    pub timeout_in_ms: u64,
}

/// Paths of the four auth endpoints. These calls must never themselves go
/// through the refresh-retry pipeline, so the client needs to know where
/// they live even when a deployment remaps them.
#[derive(Deserialize, Serialize, Debug, JsonSchema, Clone)]
pub struct EndpointConfig {
    #[serde(default = "default_login_path")]
    pub login: String,
    #[serde(default = "default_refresh_path")]
    pub refresh: String,
    #[serde(default = "default_create_account_path")]
    pub create_account: String,
    #[serde(default = "default_logout_path")]
    pub logout: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        EndpointConfig {
            login: default_login_path(),
            refresh: default_refresh_path(),
            create_account: default_create_account_path(),
            logout: default_logout_path(),
        }
    }
}

impl EndpointConfig {
    /// True when `path` addresses one of the auth endpoints.
    pub fn is_auth_path(&self, path: &str) -> bool {
        path == self.login
            || path == self.refresh
            || path == self.create_account
            || path == self.logout
    }
}

fn default_login_path() -> String {
    "/api/auth/login".to_string()
}

fn default_refresh_path() -> String {
    "/api/auth/refresh".to_string()
}

fn default_create_account_path() -> String {
    "/api/criar-conta".to_string()
}

fn default_logout_path() -> String {
    "/api/auth/logout".to_string()
}

/// Load config from a YAML file named "config.yaml" in the current directory.
pub fn load_config() -> ConfigV1 {
    let figment = Figment::new().merge(Yaml::file("./config.yaml"));
    let config = match figment.extract::<Config>() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    };
    match config {
        Config::ConfigV1(c) => c,
    }
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() {
    let schema = schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema).unwrap());
}
