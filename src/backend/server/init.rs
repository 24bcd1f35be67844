/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP server,
 * including state creation, background tasks and route configuration.
 *
 * # Initialization Process
 *
 * 1. Validate the configuration and build the identity resolver
 * 2. Create the streaming hub
 * 3. Start the connection monitor
 * 4. Create and configure the router
 */

use axum::Router;
use std::sync::Arc;

use crate::backend::chat::answers::EchoAnswers;
use crate::backend::realtime::Hub;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::build_resolver;
use crate::backend::server::state::{AppState, SharedAnswers};
use crate::shared::{ConfigError, HubConfig};

/// Create and configure the Axum application
///
/// Uses the development `EchoAnswers` source; see [`create_app_with`] to
/// plug in another one.
///
/// # Returns
///
/// The router and the hub handle, whose `shutdown` stops every stream.
///
/// # Errors
///
/// * `ConfigError` - If the configuration is invalid or the identity
///   resolver cannot be built
pub fn create_app(config: HubConfig) -> Result<(Router, Hub), ConfigError> {
    create_app_with(config, Arc::new(EchoAnswers::default()))
}

/// Create the application with a specific answer source
pub fn create_app_with(
    config: HubConfig,
    answers: SharedAnswers,
) -> Result<(Router, Hub), ConfigError> {
    tracing::info!("[Server] Initializing streaming hub");

    config.validate()?;
    let resolver = build_resolver(&config)?;
    let hub = Hub::new(&config);

    if hub.spawn_monitor(config.monitor_interval()).is_some() {
        tracing::info!(
            "[Server] Connection monitor every {}s",
            config.monitor_interval_secs
        );
    }

    let app_state = AppState {
        hub: hub.clone(),
        resolver,
        answers,
        config: Arc::new(config),
    };

    let app = create_router(app_state);
    tracing::info!("[Server] Router configured");
    Ok((app, hub))
}
