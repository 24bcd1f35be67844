//! `GET /api/sessions`: the sessions known to the hub and their open
//! connection ids. Identity keys are credentials in cookie mode, so only
//! administrators may list them.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::backend::middleware::Admin;
use crate::backend::realtime::Hub;

/// One entry of the sessions listing
#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub identity: String,
    pub created_at: DateTime<Utc>,
    pub connections: Vec<String>,
}

/// List sessions (GET /api/sessions)
pub async fn handle_list_sessions(
    State(hub): State<Hub>,
    Admin(admin): Admin,
) -> Json<Vec<SessionSummary>> {
    tracing::debug!("[Chat] Session listing requested by {}", admin);
    let mut sessions = Vec::new();
    hub.registry().for_each(|session| {
        sessions.push(SessionSummary {
            identity: session.identity_key().to_string(),
            created_at: session.created_at(),
            connections: session.connection_ids(),
        });
    });
    sessions.sort_by(|a, b| a.identity.cmp(&b.identity));
    Json(sessions)
}
