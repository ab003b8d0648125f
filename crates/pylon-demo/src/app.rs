//! Wiring: configuration, pipeline and routes.

use http::Method;
use pylon_config::{ConfigError, ConfigLoader, PylonConfig};
use pylon_middleware::stages::CorsConfig;
use pylon_middleware::{HandlerEndpoint, Pipeline, PipelineConfig};
use pylon_server::{Server, ServerConfig};
use pylon_telemetry::TelemetryConfig;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::artists::{CreateArtist, DeleteArtist, GetArtist};
use crate::auth::{Login, Register};
use crate::store::{ArtistRepository, InMemoryArtists, InMemoryUsers, UserRepository};
use crate::token::TokenIssuer;

/// Configuration file read when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "pylon.toml";

/// Prefix of environment overrides (`PYLON__SERVER__HTTP_ADDR`, ...).
pub const ENV_PREFIX: &str = "PYLON";

/// Shared services behind the handlers.
#[derive(Clone)]
pub struct DemoState {
    /// Artist storage.
    pub artists: Arc<dyn ArtistRepository>,
    /// Account storage.
    pub users: Arc<dyn UserRepository>,
    /// Token issuer.
    pub tokens: Arc<TokenIssuer>,
}

impl Default for DemoState {
    fn default() -> Self {
        Self {
            artists: Arc::new(InMemoryArtists::new()),
            users: Arc::new(InMemoryUsers::new()),
            tokens: Arc::new(TokenIssuer::new()),
        }
    }
}

/// Loads defaults, then `path` (or [`DEFAULT_CONFIG_FILE`]) if it exists,
/// then `.env`, then `PYLON__*` variables.
pub fn load_config(path: Option<&Path>) -> Result<PylonConfig, ConfigError> {
    let loader = ConfigLoader::new().with_defaults();
    let loader = match path {
        Some(path) => loader.with_file(path)?,
        None => loader.with_optional_file(DEFAULT_CONFIG_FILE)?,
    };
    loader.with_dotenv()?.with_env_prefix(ENV_PREFIX).load()
}

/// Telemetry settings from the `logging` and `metrics` sections.
pub fn telemetry_config(config: &PylonConfig) -> TelemetryConfig {
    TelemetryConfig {
        logging: config.logging.to_log_config(),
        metrics: config.metrics.to_metrics_config(),
    }
}

/// Pipeline settings from the `cors` and `locale` sections.
pub fn pipeline_config(config: &PylonConfig) -> Result<PipelineConfig, ConfigError> {
    let cors = &config.cors;
    Ok(PipelineConfig {
        cors: CorsConfig::default()
            .allow_origin(cors.allow_origin.clone())
            .allow_methods(cors.allow_methods.iter().cloned())
            .allow_headers(cors.allow_headers.iter().cloned())
            .expose_headers(cors.expose_headers.iter().cloned())
            .allow_credentials(cors.allow_credentials)
            .max_age(Duration::from_secs(cors.max_age_secs)),
        negotiator: config.negotiator()?,
    })
}

/// Server settings from the `server` section.
pub fn server_config(config: &PylonConfig) -> ServerConfig {
    let server = &config.server;
    ServerConfig::builder()
        .http_addr(server.http_addr.clone())
        .shutdown_timeout(Duration::from_secs(server.shutdown_timeout_secs))
        .request_timeout(Duration::from_millis(server.request_timeout_ms))
        .max_body_bytes(server.max_body_bytes)
        .build()
}

/// Builds the demo server with every route registered.
pub fn build_server(config: &PylonConfig, state: &DemoState) -> Result<Server, ConfigError> {
    let pipeline = Pipeline::standard(&pipeline_config(config)?);

    let server = Server::builder()
        .config(server_config(config))
        .pipeline(pipeline)
        .route(
            Method::POST,
            "/artists",
            HandlerEndpoint::new(CreateArtist::new(state.artists.clone())),
        )
        .route(
            Method::GET,
            "/artists/{id}",
            HandlerEndpoint::new(GetArtist::new(state.artists.clone())),
        )
        .route(
            Method::DELETE,
            "/artists/{id}",
            HandlerEndpoint::new(DeleteArtist::new(state.artists.clone())),
        )
        .route(
            Method::POST,
            "/auth/register",
            HandlerEndpoint::new(Register::new(state.users.clone(), state.tokens.clone())),
        )
        .route(
            Method::POST,
            "/auth/login",
            HandlerEndpoint::new(Login::new(state.users.clone(), state.tokens.clone())),
        )
        .build();

    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_registers_routes() {
        let server = build_server(&PylonConfig::default(), &DemoState::default()).unwrap();
        assert_eq!(server.router().route_count(), 5);
        assert_eq!(server.pipeline().stage_count(), 5);
    }

    #[test]
    fn test_server_config_mapping() {
        let mut config = PylonConfig::default();
        config.server.request_timeout_ms = 1500;
        config.server.max_body_bytes = 2048;
        let server = server_config(&config);
        assert_eq!(server.request_timeout(), Duration::from_millis(1500));
        assert_eq!(server.max_body_bytes(), 2048);
    }

    #[test]
    fn test_unknown_locale_rejected() {
        let mut config = PylonConfig::default();
        config.locale.supported = vec!["de".to_string()];
        assert!(pipeline_config(&config).is_err());
    }
}
