/**
 * Ask Handler
 *
 * This module implements `POST /api/v1/ask`. The answer is produced in the
 * background and streamed to the asker's open connections as
 * `chatgpt_response` events tagged with the requesting tab.
 */

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::backend::chat::answers::stream_answer;
use crate::backend::error::BackendError;
use crate::backend::middleware::{ApiJson, Identity};
use crate::backend::realtime::Hub;
use crate::backend::server::state::SharedAnswers;
use crate::shared::SharedError;

/// Body of `POST /api/v1/ask`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub tab_id: String,
}

/// Ask a question (POST /api/v1/ask)
///
/// # Request Body
///
/// JSON object with:
/// - `question`: String - The question to answer
/// - `tabId`: String - Browser tab the answer belongs to (optional)
///
/// # Returns
///
/// `{"status":"OK","chatId":"<uuid>"}`; the answer follows on the stream
/// and ends with a `######` event.
///
/// # Errors
///
/// * `400 Bad Request` - If the question is empty
/// * `401 Unauthorized` - If no identity can be resolved
pub async fn handle_ask(
    State(hub): State<Hub>,
    State(answers): State<SharedAnswers>,
    Identity(identity): Identity,
    ApiJson(request): ApiJson<AskRequest>,
) -> Result<Json<Value>, BackendError> {
    if request.question.trim().is_empty() {
        return Err(SharedError::validation("question", "question cannot be empty").into());
    }

    let chat_id = Uuid::new_v4();
    tracing::info!(
        "[Chat] Question from {} (tab '{}', chat {})",
        identity,
        request.tab_id,
        chat_id
    );

    let session = hub.session(&identity);
    tokio::spawn(async move {
        // failures are already reported to the client as a notice event
        let _ = stream_answer(&session, answers.as_ref(), &request.question, &request.tab_id).await;
    });

    Ok(Json(json!({ "status": "OK", "chatId": chat_id })))
}
