/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * The `AppState` struct serves as the central state container for the
 * application, holding:
 * - The streaming hub (session registry, broadcaster, shutdown token)
 * - The identity resolver used by every client-facing handler
 * - The answer source behind the ask endpoint
 * - The loaded configuration
 *
 * # State Extraction
 *
 * The `FromRef` implementations allow Axum handlers to extract specific
 * parts of the state without needing the entire `AppState`.
 *
 * # Example
 *
 * ```rust,no_run
 * use chathub::backend::realtime::Hub;
 * use axum::extract::State;
 *
 * async fn handler(State(hub): State<Hub>) {
 *     let sessions = hub.registry().len();
 * }
 * ```
 */

use axum::extract::FromRef;
use std::sync::Arc;

use crate::backend::auth::identity::SharedResolver;
use crate::backend::chat::answers::AnswerSource;
use crate::backend::realtime::Hub;
use crate::shared::HubConfig;

/// Shared answer source handle
pub type SharedAnswers = Arc<dyn AnswerSource>;

/// Application state shared by every handler
///
/// # Fields
///
/// * `hub` - Streaming hub
/// * `resolver` - Identity resolution strategy
/// * `answers` - Source of AI answers
/// * `config` - Loaded configuration
#[derive(Clone)]
pub struct AppState {
    pub hub: Hub,
    pub resolver: SharedResolver,
    pub answers: SharedAnswers,
    pub config: Arc<HubConfig>,
}

impl FromRef<AppState> for Hub {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.hub.clone()
    }
}

impl FromRef<AppState> for SharedResolver {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.resolver.clone()
    }
}

impl FromRef<AppState> for SharedAnswers {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.answers.clone()
    }
}

impl FromRef<AppState> for Arc<HubConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}
