/**
 * AI Answer Producer
 *
 * An `AnswerSource` turns a question into an asynchronous stream of text
 * fragments. `stream_answer` consumes that stream and publishes it into
 * the asker's session as `chatgpt_response` events tagged with the browser
 * tab id, so the page can route each line to the right chat panel.
 *
 * # Framing
 *
 * - Every fragment is split on `\n`; each line becomes one event
 * - An empty line is sent as a single space so the client keeps the break
 * - A finished answer is followed by the `######` end marker
 * - A failed answer is followed by a fallback notice instead
 */

use futures_util::stream::{self, BoxStream, StreamExt};
use std::time::Duration;
use thiserror::Error;

use crate::backend::realtime::Session;
use crate::shared::StructuredEvent;

/// Marker event closing a successful answer
pub const END_OF_ANSWER: &str = "######";

/// Notice sent when the answer could not be produced
pub const ANSWER_UNAVAILABLE: &str =
    "__Service temporarily unavailable. Please try again later...__";

/// Failure while producing an answer
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("answer source failed: {0}")]
pub struct AnswerError(pub String);

/// Produces answers as streams of text fragments
pub trait AnswerSource: Send + Sync {
    fn answer(&self, question: &str) -> BoxStream<'static, Result<String, AnswerError>>;
}

/// Development source that echoes the question back word by word
#[derive(Debug, Clone, Default)]
pub struct EchoAnswers {
    pacing: Duration,
}

impl EchoAnswers {
    /// Wait `pacing` between fragments
    pub fn with_pacing(pacing: Duration) -> Self {
        Self { pacing }
    }
}

impl AnswerSource for EchoAnswers {
    fn answer(&self, question: &str) -> BoxStream<'static, Result<String, AnswerError>> {
        let mut fragments = vec!["You asked:\n".to_string()];
        fragments.extend(question.split_whitespace().map(|word| format!("{} ", word)));
        let pacing = self.pacing;

        stream::iter(fragments)
            .then(move |fragment| async move {
                if !pacing.is_zero() {
                    tokio::time::sleep(pacing).await;
                }
                Ok::<_, AnswerError>(fragment)
            })
            .boxed()
    }
}

/// Publish the answer to `question` into `session`
///
/// # Returns
///
/// Number of line events published, markers excluded.
pub async fn stream_answer(
    session: &Session,
    source: &dyn AnswerSource,
    question: &str,
    tab_id: &str,
) -> Result<usize, AnswerError> {
    let mut fragments = source.answer(question);
    let mut published = 0;

    while let Some(fragment) = fragments.next().await {
        match fragment {
            Ok(text) => {
                for line in text.split('\n') {
                    let line = if line.is_empty() { " " } else { line };
                    session.push_event(StructuredEvent::chat_response(line, tab_id));
                    published += 1;
                }
            }
            Err(e) => {
                tracing::error!(
                    "[Chat] Answer for {} failed after {} lines: {}",
                    session.identity_key(),
                    published,
                    e
                );
                session.push_event(StructuredEvent::chat_response(ANSWER_UNAVAILABLE, tab_id));
                return Err(e);
            }
        }
    }

    session.push_event(StructuredEvent::chat_response(END_OF_ANSWER, tab_id));
    tracing::info!(
        "[Chat] Answer for {} finished ({} lines)",
        session.identity_key(),
        published
    );
    Ok(published)
}
