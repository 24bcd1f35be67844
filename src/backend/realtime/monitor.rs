//! Connection monitor
//!
//! Background task that periodically logs every session with its open
//! connection ids. Stops with the server shutdown token.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::backend::realtime::registry::SessionRegistry;

/// One line per session, as logged by the monitor
pub fn report(registry: &SessionRegistry) -> Vec<String> {
    let mut lines = Vec::new();
    registry.for_each(|session| {
        lines.push(format!(
            "session {} (since {}): {} connection(s) {:?}",
            session.identity_key(),
            session.created_at().to_rfc3339(),
            session.connection_count(),
            session.connection_ids()
        ));
    });
    lines.sort();
    lines
}

/// Spawn the monitor loop
pub fn spawn(
    registry: SessionRegistry,
    every: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::debug!("[Hub] Connection monitor stopped");
                    return;
                }
                _ = ticker.tick() => {
                    let lines = report(&registry);
                    tracing::info!("[Hub] {} session(s) active", lines.len());
                    for line in lines {
                        tracing::info!("[Hub]   {}", line);
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::realtime::sink::pipe;

    #[tokio::test]
    async fn test_report_lists_connections() {
        let registry = SessionRegistry::default();
        let session = registry.get_or_create("alice");
        let (s1, _r1) = pipe();
        let (s2, _r2) = pipe();
        session.register_connection("tab-2", s2).await;
        session.register_connection("tab-1", s1).await;

        let lines = report(&registry);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("session alice"));
        assert!(lines[0].contains("2 connection(s) [\"tab-1\", \"tab-2\"]"));
    }

    #[tokio::test]
    async fn test_monitor_stops_on_shutdown() {
        let shutdown = CancellationToken::new();
        let handle = spawn(SessionRegistry::default(), Duration::from_millis(5), shutdown.clone());
        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("monitor should stop")
            .unwrap();
    }
}
