// SPDX-FileCopyrightText: 2026 Wisp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end session tests against the mock transport and a wiremock
//! backend.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wisp_client::history::HistoryLimit;
use wisp_client::session::{SessionCommand, UiEvent, WidgetSession};
use wisp_core::error::WispError;
use wisp_core::traits::state::{HISTORY_LIMIT_KEY, ROOM_ID_KEY, WIDGET_ID_KEY};
use wisp_core::types::{ConnectionState, DeliveryStatus, Sender};
use wisp_config::WispConfig;
use wisp_test_utils::{MemoryStateStore, MockTransport};

fn test_config(server_uri: Option<&str>) -> WispConfig {
    let mut config = WispConfig::default();
    config.widget.widget_id = Some("w-1".to_string());
    config.widget.ws_url = "ws://backend/ws/chat/".to_string();
    if let Some(uri) = server_uri {
        config.widget.api_url = format!("{uri}/chat/user-chat/");
        config.widget.history_url = format!("{uri}/chat/chat-history/");
        config.widget.file_upload_url = format!("{uri}/chat/user-chat/upload-file/");
    }
    // Keep reconnect pacing fast for real-time tests.
    config.connection.base_delay_ms = 10;
    config
}

fn seeded_state() -> MemoryStateStore {
    MemoryStateStore::seeded([(ROOM_ID_KEY, "room-1"), (WIDGET_ID_KEY, "w-1")])
}

async fn mount_handshake(server: &MockServer, is_active: bool) {
    Mock::given(method("POST"))
        .and(path("/chat/user-chat/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "room_id": "room-1",
            "widget": { "is_active": is_active, "settings": {} }
        })))
        .mount(server)
        .await;
}

async fn mount_empty_history(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/chat/chat-history/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "messages": [] })),
        )
        .mount(server)
        .await;
}

struct Harness {
    commands: mpsc::Sender<SessionCommand>,
    events: mpsc::Receiver<UiEvent>,
    transport: Arc<MockTransport>,
    task: JoinHandle<Result<(), WispError>>,
}

async fn start_session(config: WispConfig, state: MemoryStateStore) -> Harness {
    let transport = Arc::new(MockTransport::new());
    let (session, events) = WidgetSession::open(config, transport.clone(), Box::new(state))
        .await
        .expect("session opens");
    let (commands_tx, commands_rx) = mpsc::channel(16);
    let task = tokio::spawn(session.run(commands_rx));
    Harness {
        commands: commands_tx,
        events,
        transport,
        task,
    }
}

async fn next_event(events: &mut mpsc::Receiver<UiEvent>) -> UiEvent {
    timeout(Duration::from_secs(10), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

async fn wait_for<F>(events: &mut mpsc::Receiver<UiEvent>, mut predicate: F) -> UiEvent
where
    F: FnMut(&UiEvent) -> bool,
{
    loop {
        let event = next_event(events).await;
        if predicate(&event) {
            return event;
        }
    }
}

#[tokio::test]
async fn open_creates_a_room_and_persists_it() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/user-chat/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "room_id": "room-9",
            "widget": { "is_active": true, "settings": {} }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let transport = Arc::new(MockTransport::new());
    let (session, _events) = WidgetSession::open(
        test_config(Some(&server.uri())),
        transport,
        Box::new(MemoryStateStore::new()),
    )
    .await
    .expect("session opens");
    assert_eq!(session.room_id().0, "room-9");
}

#[tokio::test]
async fn persisted_room_is_reused_without_a_handshake() {
    // No REST server at all: a seeded state must be enough.
    let transport = Arc::new(MockTransport::new());
    let (session, _events) =
        WidgetSession::open(test_config(None), transport, Box::new(seeded_state()))
            .await
            .expect("session opens");
    assert_eq!(session.room_id().0, "room-1");
}

#[tokio::test]
async fn inactive_widget_refuses_to_open() {
    let server = MockServer::start().await;
    mount_handshake(&server, false).await;

    let transport = Arc::new(MockTransport::new());
    let result = WidgetSession::open(
        test_config(Some(&server.uri())),
        transport,
        Box::new(MemoryStateStore::new()),
    )
    .await;
    assert!(matches!(result, Err(WispError::Config(_))));
}

#[tokio::test]
async fn sent_message_walks_pending_sent_delivered() {
    let server = MockServer::start().await;
    mount_empty_history(&server).await;

    let mut harness = start_session(test_config(Some(&server.uri())), seeded_state()).await;
    wait_for(&mut harness.events, |e| {
        matches!(e, UiEvent::ConnectionChanged(ConnectionState::Open))
    })
    .await;

    harness
        .commands
        .send(SessionCommand::SendText("hello".to_string()))
        .await
        .unwrap();

    let pending = wait_for(&mut harness.events, |e| {
        matches!(e, UiEvent::MessageUpserted(_))
    })
    .await;
    let UiEvent::MessageUpserted(pending) = pending else {
        unreachable!()
    };
    assert_eq!(pending.status, DeliveryStatus::Pending);

    let sent = wait_for(&mut harness.events, |e| {
        matches!(e, UiEvent::MessageUpserted(m) if m.status == DeliveryStatus::Sent)
    })
    .await;
    let UiEvent::MessageUpserted(sent) = sent else {
        unreachable!()
    };
    assert_eq!(sent.id, pending.id);

    // Backend echoes the message; the record advances to delivered
    // without duplicating.
    let socket = harness.transport.latest_socket().await.unwrap();
    socket
        .inject(format!(
            r#"{{"message_id":"{}","sender":"User","message":"hello"}}"#,
            pending.id
        ))
        .await;

    let delivered = wait_for(&mut harness.events, |e| {
        matches!(e, UiEvent::MessageUpserted(m) if m.status == DeliveryStatus::Delivered)
    })
    .await;
    let UiEvent::MessageUpserted(delivered) = delivered else {
        unreachable!()
    };
    assert_eq!(delivered.id, pending.id);

    // The echo of our own send must not trigger a seen ack.
    let frames = socket.sent_frames().await;
    assert!(!frames.iter().any(|f| f.contains(r#""status":"seen""#)));

    harness.commands.send(SessionCommand::Close).await.unwrap();
    harness.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn agent_message_is_acked_and_notified_once() {
    let server = MockServer::start().await;
    mount_empty_history(&server).await;

    let mut harness = start_session(test_config(Some(&server.uri())), seeded_state()).await;
    wait_for(&mut harness.events, |e| {
        matches!(e, UiEvent::ConnectionChanged(ConnectionState::Open))
    })
    .await;

    let socket = harness.transport.latest_socket().await.unwrap();
    let frame = r#"{"message_id":"msg_a1","sender":"Agent","message":"Hi!"}"#;
    socket.inject(frame).await;
    wait_for(&mut harness.events, |e| matches!(e, UiEvent::Notify)).await;

    // Redelivery of the same id: upsert again, but no second ack or cue.
    socket.inject(frame).await;
    wait_for(&mut harness.events, |e| {
        matches!(e, UiEvent::MessageUpserted(m) if m.id.0 == "msg_a1")
    })
    .await;

    let frames = socket.sent_frames().await;
    let acks = frames
        .iter()
        .filter(|f| f.contains(r#""status":"seen""#) && f.contains("msg_a1"))
        .count();
    assert_eq!(acks, 1);

    harness.commands.send(SessionCommand::Close).await.unwrap();
    harness.task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn reconnect_backoff_doubles_until_exhausted() {
    // Seeded state avoids any REST traffic; every dial is refused.
    let transport = Arc::new(MockTransport::new());
    transport.refuse_next(6).await;

    let (session, mut events) = WidgetSession::open(
        test_config(None),
        transport.clone(),
        Box::new(seeded_state()),
    )
    .await
    .expect("session opens");
    let (_commands_tx, commands_rx) = mpsc::channel::<SessionCommand>(1);
    let task = tokio::spawn(session.run(commands_rx));

    wait_for(&mut events, |e| {
        matches!(e, UiEvent::ConnectionChanged(ConnectionState::Closed))
    })
    .await;
    wait_for(&mut events, |e| {
        matches!(e, UiEvent::SystemNotice(n) if n.contains("Connection lost"))
    })
    .await;

    // Initial dial plus five retries, then the budget is spent.
    assert_eq!(transport.dial_count().await, 6);
    assert!(transport
        .dialed_urls()
        .await
        .iter()
        .all(|url| url == "ws://backend/ws/chat/room-1/"));

    drop(_commands_tx);
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn dropped_socket_reconnects_and_history_loads_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/chat-history/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "messages": [
                { "message_id": "msg_h1", "sender": "Agent", "message": "Welcome back", "status": "delivered" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut harness = start_session(test_config(Some(&server.uri())), seeded_state()).await;
    wait_for(&mut harness.events, |e| {
        matches!(e, UiEvent::MessageUpserted(m) if m.id.0 == "msg_h1")
    })
    .await;

    // Sever the connection; the session reconnects and must not fetch
    // history a second time (enforced by the mock's expect).
    let first_socket = harness.transport.latest_socket().await.unwrap();
    first_socket.drop_connection().await;

    wait_for(&mut harness.events, |e| {
        matches!(e, UiEvent::ConnectionChanged(ConnectionState::Reconnecting))
    })
    .await;
    wait_for(&mut harness.events, |e| {
        matches!(e, UiEvent::ConnectionChanged(ConnectionState::Open))
    })
    .await;
    assert_eq!(harness.transport.dial_count().await, 2);

    harness.commands.send(SessionCommand::Close).await.unwrap();
    harness.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn connection_state_is_emitted_only_on_transitions() {
    let server = MockServer::start().await;
    mount_empty_history(&server).await;

    let mut harness = start_session(test_config(Some(&server.uri())), seeded_state()).await;

    let mut states = Vec::new();
    loop {
        if let UiEvent::ConnectionChanged(state) = next_event(&mut harness.events).await {
            states.push(state);
            if state == ConnectionState::Open {
                break;
            }
        }
    }

    let socket = harness.transport.latest_socket().await.unwrap();
    socket.drop_connection().await;
    loop {
        if let UiEvent::ConnectionChanged(state) = next_event(&mut harness.events).await {
            states.push(state);
            if state == ConnectionState::Open {
                break;
            }
        }
    }

    harness.commands.send(SessionCommand::Close).await.unwrap();
    loop {
        if let UiEvent::ConnectionChanged(state) = next_event(&mut harness.events).await {
            states.push(state);
            if state == ConnectionState::Closed {
                break;
            }
        }
    }

    // No duplicate consecutive transitions, and no pre-dial echo of the
    // starting state.
    assert_eq!(
        states,
        vec![
            ConnectionState::Open,
            ConnectionState::Reconnecting,
            ConnectionState::Open,
            ConnectionState::Closed,
        ]
    );
    harness.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn changing_the_history_limit_rearms_the_loader() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/chat-history/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "messages": [] })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let mut harness = start_session(test_config(Some(&server.uri())), seeded_state()).await;
    wait_for(&mut harness.events, |e| {
        matches!(e, UiEvent::ConnectionChanged(ConnectionState::Open))
    })
    .await;

    harness
        .commands
        .send(SessionCommand::SetHistoryLimit(HistoryLimit::Unbounded))
        .await
        .unwrap();

    harness.commands.send(SessionCommand::Close).await.unwrap();
    harness.task.await.unwrap().unwrap();
    // Both fetches must have happened by the time the session closed.
    server.verify().await;
}

#[tokio::test]
async fn send_while_disconnected_keeps_the_message_pending() {
    let transport = Arc::new(MockTransport::new());
    transport.refuse_next(6).await;

    let (session, mut events) = WidgetSession::open(
        test_config(None),
        transport.clone(),
        Box::new(seeded_state()),
    )
    .await
    .expect("session opens");
    let (commands_tx, commands_rx) = mpsc::channel(16);
    let task = tokio::spawn(session.run(commands_rx));

    commands_tx
        .send(SessionCommand::SendText("queued".to_string()))
        .await
        .unwrap();

    let message = wait_for(&mut events, |e| matches!(e, UiEvent::MessageUpserted(_))).await;
    let UiEvent::MessageUpserted(message) = message else {
        unreachable!()
    };
    assert_eq!(message.status, DeliveryStatus::Pending);
    assert_eq!(message.sender, Sender::User);

    wait_for(&mut events, |e| {
        matches!(e, UiEvent::SystemNotice(n) if n.contains("Not connected"))
    })
    .await;

    commands_tx.send(SessionCommand::Close).await.unwrap();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn remote_typing_is_surfaced_and_trigger_phrase_opens_the_form() {
    let server = MockServer::start().await;
    mount_empty_history(&server).await;

    let mut harness = start_session(test_config(Some(&server.uri())), seeded_state()).await;
    wait_for(&mut harness.events, |e| {
        matches!(e, UiEvent::ConnectionChanged(ConnectionState::Open))
    })
    .await;

    let socket = harness.transport.latest_socket().await.unwrap();
    socket
        .inject(r#"{"typing":true,"sender":"Agent","content":""}"#)
        .await;
    let typing = wait_for(&mut harness.events, |e| {
        matches!(e, UiEvent::RemoteTyping { .. })
    })
    .await;
    assert_eq!(
        typing,
        UiEvent::RemoteTyping {
            sender: Sender::Agent,
            active: true
        }
    );

    socket
        .inject(r#"{"sender":"Agent","message":"You can talk to a human if you prefer."}"#)
        .await;
    wait_for(&mut harness.events, |e| {
        matches!(e, UiEvent::ShowContactForm)
    })
    .await;

    harness.commands.send(SessionCommand::Close).await.unwrap();
    harness.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn rejected_contact_form_keeps_the_form_open() {
    let server = MockServer::start().await;
    mount_empty_history(&server).await;

    let mut harness = start_session(test_config(Some(&server.uri())), seeded_state()).await;
    wait_for(&mut harness.events, |e| {
        matches!(e, UiEvent::ConnectionChanged(ConnectionState::Open))
    })
    .await;

    harness
        .commands
        .send(SessionCommand::SubmitContactForm {
            name: "Ada".to_string(),
            email: "not-an-email".to_string(),
        })
        .await
        .unwrap();

    // The rejection notice is followed by a fresh form prompt so the
    // front-end stays in form mode.
    wait_for(&mut harness.events, |e| {
        matches!(e, UiEvent::SystemNotice(n) if n.contains("valid email"))
    })
    .await;
    assert_eq!(next_event(&mut harness.events).await, UiEvent::ShowContactForm);

    harness.commands.send(SessionCommand::Close).await.unwrap();
    harness.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn history_limit_preference_is_persisted() {
    let server = MockServer::start().await;
    mount_empty_history(&server).await;
    mount_handshake(&server, true).await;

    let mut state = MemoryStateStore::new();
    // Pre-existing preference wins over the config default.
    use wisp_core::traits::state::ClientStateStore;
    state.set(HISTORY_LIMIT_KEY, "5").unwrap();
    state.set(ROOM_ID_KEY, "room-1").unwrap();
    state.set(WIDGET_ID_KEY, "w-1").unwrap();

    let mut harness = start_session(test_config(Some(&server.uri())), state).await;
    wait_for(&mut harness.events, |e| {
        matches!(e, UiEvent::ConnectionChanged(ConnectionState::Open))
    })
    .await;

    // Tear the session down first so the history POST has landed before
    // the request log is inspected.
    harness.commands.send(SessionCommand::Close).await.unwrap();
    harness.task.await.unwrap().unwrap();

    let requests = server.received_requests().await.unwrap();
    let history_call = requests
        .iter()
        .find(|r| r.url.path() == "/chat/chat-history/")
        .expect("history was fetched");
    let body: serde_json::Value = serde_json::from_slice(&history_call.body).unwrap();
    assert_eq!(body["limit"], 5);
}
