//! Streaming hub integration tests
//!
//! Drives the hub through its public API with in-memory pipes standing in
//! for client connections.

mod common;

use assert_matches::assert_matches;
use bytes::Bytes;
use chathub::backend::error::HubError;
use chathub::backend::realtime::{sink, StreamExit};
use chathub::shared::{EventKind, StructuredEvent};
use common::{fast_hub, quiet_hub, FrameReader};
use pretty_assertions::assert_eq;
use std::time::Duration;

#[tokio::test]
async fn events_pushed_before_connecting_arrive_in_order() {
    let hub = quiet_hub();
    let session = hub.session("alice");
    for i in 0..5 {
        session.push_event(StructuredEvent::info(format!("event {}", i)).with_id(i.to_string()));
    }

    let (sink, reader) = sink::pipe();
    let task = hub.open_stream("alice", "tab", sink).await;
    let mut frames = FrameReader::new(reader);
    for i in 0..5 {
        assert_eq!(
            frames.next_frame().await,
            format!("id: {}\nevent: info\ndata: event {}\n\n", i, i)
        );
    }

    hub.shutdown();
    assert_eq!(assert_ok!(task.await.unwrap()), StreamExit::Shutdown);
}

#[tokio::test]
async fn producers_share_one_ordered_queue() {
    let hub = quiet_hub();
    let (sink, reader) = sink::pipe();
    let _task = hub.open_stream("alice", "tab", sink).await;
    let session = hub.session("alice");

    session.push_event(
        StructuredEvent::new(EventKind::SqlResult, "{}")
            .with_id("1")
            .with_retry(3000),
    );
    session.push_raw(Bytes::from_static(b"raw \"bytes\""));
    session.push_text("two\nlines");
    session.push_preformatted("event: info\ndata: pre\n\n");

    let mut frames = FrameReader::new(reader);
    assert_eq!(
        frames.next_frame().await,
        "id: 1\nevent: sql_table_as_json\ndata: {}\nretry: 3000\n\n"
    );
    assert_eq!(
        frames.next_frame().await,
        "event: chatgpt_response\ndata: raw \\\"bytes\\\"\n\n"
    );
    assert_eq!(
        frames.next_frame().await,
        "event: chatgpt_response\ndata: two\\nlines\n\n"
    );
    assert_eq!(frames.next_frame().await, "event: info\ndata: pre\n\n");
    hub.shutdown();
}

#[tokio::test]
async fn reconnecting_with_same_id_replaces_stream() {
    let hub = quiet_hub();
    let (first_sink, first_reader) = sink::pipe();
    let first = hub.open_stream("alice", "c1", first_sink).await;
    let (second_sink, second_reader) = sink::pipe();
    let _second = hub.open_stream("alice", "c1", second_sink).await;

    assert_eq!(assert_ok!(first.await.unwrap()), StreamExit::Replaced);
    assert_eq!(hub.session("alice").connection_ids(), vec!["c1".to_string()]);

    hub.session("alice").push_event(StructuredEvent::info("after").with_id("7"));

    let mut second = FrameReader::new(second_reader);
    assert_eq!(second.next_frame().await, "id: 7\nevent: info\ndata: after\n\n");

    let mut first = FrameReader::new(first_reader);
    assert!(first.drain_to_end().await.is_empty());
    hub.shutdown();
}

#[tokio::test]
async fn every_connection_of_a_session_gets_one_copy() {
    let hub = quiet_hub();
    let (s1, r1) = sink::pipe();
    let (s2, r2) = sink::pipe();
    let _c1 = hub.open_stream("alice", "c1", s1).await;
    let _c2 = hub.open_stream("alice", "c2", s2).await;
    let mut c1 = FrameReader::new(r1);
    let mut c2 = FrameReader::new(r2);

    // give both multiplexers time to subscribe
    tokio::time::sleep(Duration::from_millis(50)).await;
    let session = hub.session("alice");
    session.push_event(StructuredEvent::info("once").with_id("1"));
    session.push_event(StructuredEvent::info("twice").with_id("2"));

    for reader in [&mut c1, &mut c2] {
        assert_eq!(reader.next_frame().await, "id: 1\nevent: info\ndata: once\n\n");
        assert_eq!(reader.next_frame().await, "id: 2\nevent: info\ndata: twice\n\n");
    }
    hub.shutdown();
    assert!(c1.drain_to_end().await.is_empty());
    assert!(c2.drain_to_end().await.is_empty());
}

#[tokio::test]
async fn sessions_do_not_see_each_other() {
    let hub = quiet_hub();
    let (s1, r1) = sink::pipe();
    let (s2, r2) = sink::pipe();
    let _a = hub.open_stream("alice", "tab", s1).await;
    let _b = hub.open_stream("bob", "tab", s2).await;

    hub.session("alice").push_text("for alice");
    hub.session("bob").push_text("for bob");

    let mut alice = FrameReader::new(r1);
    let mut bob = FrameReader::new(r2);
    assert_eq!(alice.next_frame().await, "event: chatgpt_response\ndata: for alice\n\n");
    assert_eq!(bob.next_frame().await, "event: chatgpt_response\ndata: for bob\n\n");
    hub.shutdown();
}

#[tokio::test]
async fn broadcast_reaches_only_connections_open_at_call_time() {
    let hub = quiet_hub();
    let (s1, r1) = sink::pipe();
    let (s2, r2) = sink::pipe();
    let _a = hub.open_stream("alice", "tab", s1).await;
    let _b = hub.open_stream("bob", "tab", s2).await;

    let delivered = assert_ok!(hub.broadcaster().broadcast("maintenance").await);
    assert_eq!(delivered, 2);

    let (s3, r3) = sink::pipe();
    let _late = hub.open_stream("carol", "tab", s3).await;
    hub.session("carol").push_event(StructuredEvent::info("welcome").with_id("1"));

    for reader in [r1, r2] {
        let frame = FrameReader::new(reader).next_frame().await;
        assert!(frame.starts_with("id: "));
        assert_contains!(frame, "\nevent: announce\ndata: maintenance\n\n");
    }
    let mut late = FrameReader::new(r3);
    assert_eq!(late.next_frame().await, "id: 1\nevent: info\ndata: welcome\n\n");
    hub.shutdown();
}

#[tokio::test]
async fn idle_connection_gets_heartbeats_until_shutdown() {
    let hub = fast_hub(Duration::from_millis(25));
    let (sink, reader) = sink::pipe();
    let task = hub.open_stream("alice", "tab", sink).await;
    let mut frames = FrameReader::new(reader);

    let first = frames.next_frame().await;
    assert_heartbeat!(first);
    assert_contains!(first, "Cycle: 1, Time: ");
    assert_heartbeat!(frames.next_frame().await);

    hub.shutdown();
    assert_eq!(assert_ok!(task.await.unwrap()), StreamExit::Shutdown);
    for frame in frames.drain_to_end().await {
        assert_heartbeat!(frame);
    }
}

#[tokio::test]
async fn no_heartbeat_follows_shutdown() {
    let hub = fast_hub(Duration::from_millis(5));
    hub.shutdown();

    let (sink, reader) = sink::pipe();
    let task = hub.open_stream("alice", "late", sink).await;
    let mut frames = FrameReader::new(reader);

    assert_eq!(assert_ok!(task.await.unwrap()), StreamExit::Shutdown);
    assert!(frames.drain_to_end().await.is_empty());
    assert_eq!(hub.session("alice").connection_count(), 0);
}

#[tokio::test]
async fn disconnected_client_is_removed() {
    let hub = fast_hub(Duration::from_millis(10));
    let (sink, reader) = sink::pipe();
    let task = hub.open_stream("alice", "gone", sink).await;
    drop(reader);

    let result = tokio::time::timeout(Duration::from_secs(3), task)
        .await
        .expect("stream should terminate")
        .unwrap();
    assert_matches!(result, Err(HubError::FlushFailed { attempts: 3, .. }));
    assert_eq!(hub.session("alice").connection_count(), 0);
}

#[tokio::test]
async fn messages_published_while_offline_wait_for_next_stream() {
    let hub = quiet_hub();
    let (sink, reader) = sink::pipe();
    let task = hub.open_stream("alice", "tab", sink).await;
    drop(reader);
    hub.session("alice").push_text("lost with the stream");
    let _ = tokio::time::timeout(Duration::from_secs(3), task).await;

    hub.session("alice").push_text("kept for later");
    let (sink, reader) = sink::pipe();
    let _task = hub.open_stream("alice", "tab", sink).await;
    let mut frames = FrameReader::new(reader);
    assert_eq!(
        frames.next_frame().await,
        "event: chatgpt_response\ndata: kept for later\n\n"
    );
    hub.shutdown();
}
