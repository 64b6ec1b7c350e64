// SPDX-FileCopyrightText: 2026 Wisp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session orchestration.
//!
//! A `WidgetSession` owns every moving part of one chat session: the
//! message store, the socket connection, typing debounce, history
//! hydration, and the inbound dispatcher. It runs as a single task
//! driven by a `select!` loop, so no component needs interior locking.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use regex::Regex;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use wisp_config::WispConfig;
use wisp_core::error::WispError;
use wisp_core::frame::{OutboundFrame, PresenceStatus};
use wisp_core::traits::state::{ClientStateStore, HISTORY_LIMIT_KEY, ROOM_ID_KEY, WIDGET_ID_KEY};
use wisp_core::traits::transport::SocketTransport;
use wisp_core::types::{
    Attachment, ChatMessage, ConnectionState, ContactInfo, MessageId, RoomId, Sender, WidgetId,
};

use crate::connection::{ConnectionManager, ReconnectDecision, SocketEvent};
use crate::dispatch::{DispatchOutcome, InboundDispatcher};
use crate::history::{HistoryLimit, HistoryLoader};
use crate::rest::RestClient;
use crate::store::MessageStore;
use crate::typing::{RemoteTypingWindow, TypingDebouncer};

/// Instructions from the front-end to the session task.
#[derive(Debug)]
pub enum SessionCommand {
    /// Send a chat message with the given body.
    SendText(String),
    /// The composer content changed (drives typing indication).
    InputChanged(String),
    /// Submit the contact-info form.
    SubmitContactForm { name: String, email: String },
    /// Upload a file and announce it in the conversation.
    SendFile { name: String, bytes: Vec<u8> },
    /// Change the history replay limit and re-hydrate.
    SetHistoryLimit(HistoryLimit),
    /// Shut the session down.
    Close,
}

/// Events from the session task to the front-end.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    ConnectionChanged(ConnectionState),
    MessageUpserted(ChatMessage),
    SystemNotice(String),
    RemoteTyping { sender: Sender, active: bool },
    ShowContactForm,
    ResumeChat,
    QuickReplies(Vec<String>),
    Notify,
}

pub struct WidgetSession {
    config: WispConfig,
    widget_id: WidgetId,
    room_id: RoomId,
    rest: RestClient,
    store: MessageStore,
    dispatcher: InboundDispatcher,
    typing: TypingDebouncer,
    remote_typing: RemoteTypingWindow,
    remote_typing_sender: Sender,
    history: HistoryLoader,
    history_limit: HistoryLimit,
    connection: ConnectionManager,
    socket_events: Option<mpsc::Receiver<SocketEvent>>,
    state: Box<dyn ClientStateStore>,
    ui_tx: mpsc::Sender<UiEvent>,
    /// Last connection state surfaced to the UI; transitions are emitted
    /// only when the state actually changes.
    ui_state: ConnectionState,
}

impl WidgetSession {
    /// Ensures a room exists (reusing a persisted one when the widget id
    /// matches) and assembles the session. Fails when the widget is not
    /// configured or the backend reports it inactive.
    pub async fn open(
        config: WispConfig,
        transport: Arc<dyn SocketTransport>,
        mut state: Box<dyn ClientStateStore>,
    ) -> Result<(Self, mpsc::Receiver<UiEvent>), WispError> {
        let widget_id = WidgetId(
            config
                .widget
                .widget_id
                .clone()
                .ok_or_else(|| WispError::Config("widget_id is not configured".into()))?,
        );
        let rest = RestClient::new(
            config.widget.api_url.clone(),
            config.widget.history_url.clone(),
            config.widget.file_upload_url.clone(),
            &config.widget.user_agent,
        )?;

        let room_id = Self::ensure_room(&config, &rest, &widget_id, state.as_mut()).await?;

        let history_limit = state
            .get(HISTORY_LIMIT_KEY)
            .and_then(|raw| raw.parse().ok())
            .or_else(|| config.history.default_limit.parse().ok())
            .unwrap_or_default();

        let (connection, socket_events) = ConnectionManager::new(
            transport,
            config.widget.ws_url.clone(),
            Duration::from_millis(config.connection.base_delay_ms),
            config.connection.max_attempts,
        );
        let (ui_tx, ui_rx) = mpsc::channel(64);

        let session = Self {
            dispatcher: InboundDispatcher::new(config.widget.trigger_phrases.clone()),
            typing: TypingDebouncer::new(
                Duration::from_millis(config.typing.debounce_ms),
                Duration::from_millis(config.typing.idle_expire_ms),
            ),
            remote_typing: RemoteTypingWindow::new(Duration::from_millis(
                config.typing.idle_expire_ms,
            )),
            remote_typing_sender: Sender::Agent,
            config,
            widget_id,
            room_id,
            rest,
            store: MessageStore::new(),
            history: HistoryLoader::new(),
            history_limit,
            connection,
            socket_events: Some(socket_events),
            state,
            ui_tx,
            ui_state: ConnectionState::Idle,
        };
        Ok((session, ui_rx))
    }

    async fn ensure_room(
        config: &WispConfig,
        rest: &RestClient,
        widget_id: &WidgetId,
        state: &mut dyn ClientStateStore,
    ) -> Result<RoomId, WispError> {
        // A persisted room is only valid for the widget it was opened for.
        if let (Some(room), Some(stored_widget)) = (state.get(ROOM_ID_KEY), state.get(WIDGET_ID_KEY))
        {
            if stored_widget == widget_id.0 {
                info!(room = %room, "resuming persisted room");
                return Ok(RoomId(room));
            }
            debug!(stored = %stored_widget, current = %widget_id, "widget changed, abandoning room");
        }

        let ip = config
            .widget
            .user_ip
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        let handshake = rest
            .create_room(widget_id, &ip, &config.widget.user_agent)
            .await?;
        if !handshake.widget.is_active {
            return Err(WispError::Config(
                "this widget is disabled on the backend".into(),
            ));
        }
        state.set(ROOM_ID_KEY, &handshake.room_id.0)?;
        state.set(WIDGET_ID_KEY, &widget_id.0)?;
        info!(room = %handshake.room_id, "room created");
        Ok(handshake.room_id)
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Drives the session until `Close`, the command channel closes, or
    /// the UI receiver goes away.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
    ) -> Result<(), WispError> {
        let mut socket_events = self
            .socket_events
            .take()
            .ok_or_else(|| WispError::Internal("session already running".into()))?;
        let mut reconnect_at: Option<Instant> = None;

        self.try_connect(&mut reconnect_at).await;

        loop {
            let typing_deadline = self.typing.idle_deadline();
            let remote_deadline = self.remote_typing.deadline();

            tokio::select! {
                command = commands.recv() => {
                    match command {
                        Some(command) => {
                            if self.handle_command(command).await? {
                                break;
                            }
                        }
                        None => {
                            debug!("command channel closed");
                            self.connection.close().await;
                            break;
                        }
                    }
                }
                event = socket_events.recv() => {
                    match event {
                        Some(event) => self.handle_socket_event(event, &mut reconnect_at).await,
                        None => break,
                    }
                }
                _ = sleep_until_opt(reconnect_at), if reconnect_at.is_some() => {
                    reconnect_at = None;
                    self.try_connect(&mut reconnect_at).await;
                }
                _ = sleep_until_opt(typing_deadline), if typing_deadline.is_some() => {
                    if let Some(frame) = self.typing.on_idle_expired(Instant::now()) {
                        self.send_best_effort(&frame).await;
                    }
                }
                _ = sleep_until_opt(remote_deadline), if remote_deadline.is_some() => {
                    if self.remote_typing.expire_if_due(Instant::now()) {
                        self.emit(UiEvent::RemoteTyping {
                            sender: self.remote_typing_sender,
                            active: false,
                        })
                        .await;
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns `true` when the session should shut down.
    async fn handle_command(&mut self, command: SessionCommand) -> Result<bool, WispError> {
        match command {
            SessionCommand::SendText(text) => self.send_text(text).await,
            SessionCommand::InputChanged(content) => {
                if let Some(frame) = self.typing.on_input(&content, Instant::now()) {
                    self.send_best_effort(&frame).await;
                }
            }
            SessionCommand::SubmitContactForm { name, email } => {
                self.submit_contact_form(name, email).await;
            }
            SessionCommand::SendFile { name, bytes } => self.send_file(name, bytes).await,
            SessionCommand::SetHistoryLimit(limit) => self.set_history_limit(limit).await?,
            SessionCommand::Close => {
                if self.connection.state() == ConnectionState::Open {
                    let _ = self
                        .connection
                        .send(&OutboundFrame::presence(PresenceStatus::Offline))
                        .await;
                }
                self.connection.close().await;
                self.emit_connection_state(ConnectionState::Closed).await;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn send_text(&mut self, text: String) {
        let message = match self.store.create(Some(text), None) {
            Ok(message) => message,
            Err(err) => {
                self.emit(UiEvent::SystemNotice(err.to_string())).await;
                return;
            }
        };
        self.emit(UiEvent::MessageUpserted(message.clone())).await;

        // Sending clears the composer, so typing stops with it.
        if let Some(frame) = self.typing.on_input("", Instant::now()) {
            self.send_best_effort(&frame).await;
        }

        let frame = OutboundFrame::chat(
            message.body.clone().unwrap_or_default(),
            message.id.clone(),
        );
        match self.connection.send(&frame).await {
            Ok(()) => {
                if let Some(updated) = self
                    .store
                    .advance_status(&message.id, wisp_core::types::DeliveryStatus::Sent)
                {
                    let updated = updated.clone();
                    self.emit(UiEvent::MessageUpserted(updated)).await;
                }
            }
            Err(WispError::NotConnected) => {
                // The message stays pending in the store; the user can
                // resend once the socket is back.
                self.emit(UiEvent::SystemNotice(
                    "Not connected. Message kept as pending.".to_string(),
                ))
                .await;
            }
            Err(err) => {
                warn!(error = %err, "chat send failed");
                self.emit(UiEvent::SystemNotice("Failed to send message.".to_string()))
                    .await;
            }
        }
    }

    async fn submit_contact_form(&mut self, name: String, email: String) {
        let name = name.trim().to_string();
        let email = email.trim().to_string();
        if name.is_empty() {
            self.emit(UiEvent::SystemNotice("Please enter your name.".to_string()))
                .await;
            // Keep the front-end in form mode for a corrected attempt.
            self.emit(UiEvent::ShowContactForm).await;
            return;
        }
        if !email_is_valid(&email) {
            self.emit(UiEvent::SystemNotice(
                "Please enter a valid email address.".to_string(),
            ))
            .await;
            self.emit(UiEvent::ShowContactForm).await;
            return;
        }

        let frame = OutboundFrame::form_data(ContactInfo { name, email }, MessageId::generate());
        match self.connection.send(&frame).await {
            Ok(()) => {}
            Err(err) => {
                warn!(error = %err, "contact form send failed");
                self.emit(UiEvent::SystemNotice(
                    "Could not submit the form. Please try again.".to_string(),
                ))
                .await;
            }
        }
    }

    async fn send_file(&mut self, name: String, bytes: Vec<u8>) {
        let cap = self.config.widget.max_file_size_bytes;
        if bytes.len() as u64 > cap {
            self.emit(UiEvent::SystemNotice(format!(
                "File is too large (limit {} MB).",
                cap / (1024 * 1024)
            )))
            .await;
            return;
        }

        let uploaded = match self.rest.upload_file(&name, bytes).await {
            Ok(uploaded) => uploaded,
            Err(err) => {
                warn!(error = %err, file = %name, "file upload failed");
                self.emit(UiEvent::SystemNotice("File upload failed.".to_string()))
                    .await;
                return;
            }
        };

        let attachment = Attachment {
            url: uploaded.file_url.clone(),
            name: uploaded.file_name.clone(),
            size: None,
        };
        let message = match self.store.create(None, Some(attachment)) {
            Ok(message) => message,
            Err(err) => {
                self.emit(UiEvent::SystemNotice(err.to_string())).await;
                return;
            }
        };
        self.emit(UiEvent::MessageUpserted(message.clone())).await;

        let frame = OutboundFrame::file_notice(
            uploaded.file_url,
            uploaded.file_name,
            message.id.clone(),
        );
        match self.connection.send(&frame).await {
            Ok(()) => {
                if let Some(updated) = self
                    .store
                    .advance_status(&message.id, wisp_core::types::DeliveryStatus::Sent)
                {
                    let updated = updated.clone();
                    self.emit(UiEvent::MessageUpserted(updated)).await;
                }
            }
            Err(err) => {
                warn!(error = %err, "file notice send failed");
                self.emit(UiEvent::SystemNotice(
                    "Uploaded, but the announcement failed to send.".to_string(),
                ))
                .await;
            }
        }
    }

    async fn set_history_limit(&mut self, limit: HistoryLimit) -> Result<(), WispError> {
        if limit == self.history_limit {
            return Ok(());
        }
        self.history_limit = limit;
        self.state.set(HISTORY_LIMIT_KEY, limit.as_str())?;
        self.history.rearm();
        self.hydrate_history().await;
        Ok(())
    }

    async fn try_connect(&mut self, reconnect_at: &mut Option<Instant>) {
        let pre_dial = self.connection.state();
        self.emit_connection_state(pre_dial).await;
        let room = self.room_id.clone();
        match self.connection.connect(&room).await {
            Ok(()) => self.on_opened().await,
            Err(err) => {
                warn!(error = %err, "socket dial failed");
                let decision = self.connection.fail_attempt();
                let state = self.connection.state();
                self.apply_decision(state, decision, reconnect_at).await;
            }
        }
    }

    async fn on_opened(&mut self) {
        self.emit_connection_state(ConnectionState::Open).await;
        self.send_best_effort(&OutboundFrame::presence(PresenceStatus::Online))
            .await;
        self.hydrate_history().await;
    }

    async fn hydrate_history(&mut self) {
        let result = self
            .history
            .load_once(
                &self.rest,
                &self.room_id,
                &self.widget_id,
                self.history_limit,
                &mut self.store,
            )
            .await;
        match result {
            Some(Ok(touched)) => {
                for id in touched {
                    if let Some(message) = self.store.get(&id) {
                        let message = message.clone();
                        self.emit(UiEvent::MessageUpserted(message)).await;
                    }
                }
            }
            Some(Err(_)) => {
                self.emit(UiEvent::SystemNotice(
                    "Failed to load chat history.".to_string(),
                ))
                .await;
            }
            None => {}
        }
    }

    async fn handle_socket_event(
        &mut self,
        event: SocketEvent,
        reconnect_at: &mut Option<Instant>,
    ) {
        match event {
            SocketEvent::Frame { generation, text } => {
                if generation != self.connection.generation() {
                    debug!(generation, "stale frame dropped");
                    return;
                }
                let outcomes = self.dispatcher.dispatch(&text, &mut self.store);
                for outcome in outcomes {
                    self.apply_outcome(outcome).await;
                }
            }
            SocketEvent::Closed { generation } => {
                if let Some(decision) = self.connection.handle_socket_closed(generation) {
                    self.apply_decision(self.connection.state(), decision, reconnect_at)
                        .await;
                }
            }
        }
    }

    async fn apply_decision(
        &mut self,
        state: ConnectionState,
        decision: ReconnectDecision,
        reconnect_at: &mut Option<Instant>,
    ) {
        self.emit_connection_state(state).await;
        match decision {
            ReconnectDecision::RetryAfter(delay) => {
                *reconnect_at = Some(Instant::now() + delay);
            }
            ReconnectDecision::Exhausted => {
                self.emit(UiEvent::SystemNotice(
                    "Connection lost. Please refresh to reconnect.".to_string(),
                ))
                .await;
            }
        }
    }

    async fn apply_outcome(&mut self, outcome: DispatchOutcome) {
        match outcome {
            DispatchOutcome::TypingNotice { sender, active } => {
                self.remote_typing.note(active, Instant::now());
                self.remote_typing_sender = sender;
                self.emit(UiEvent::RemoteTyping { sender, active }).await;
            }
            DispatchOutcome::ShowContactForm => self.emit(UiEvent::ShowContactForm).await,
            DispatchOutcome::ResumeChat => self.emit(UiEvent::ResumeChat).await,
            DispatchOutcome::SystemNotice(notice) => {
                self.emit(UiEvent::SystemNotice(notice)).await;
            }
            DispatchOutcome::MessageUpserted(message) => {
                self.emit(UiEvent::MessageUpserted(message)).await;
            }
            DispatchOutcome::Notify => self.emit(UiEvent::Notify).await,
            DispatchOutcome::SendFrame(frame) => self.send_best_effort(&frame).await,
            DispatchOutcome::QuickReplies(replies) => {
                self.emit(UiEvent::QuickReplies(replies)).await;
            }
        }
    }

    async fn send_best_effort(&mut self, frame: &OutboundFrame) {
        if let Err(err) = self.connection.send(frame).await {
            debug!(error = %err, "frame not sent");
        }
    }

    async fn emit_connection_state(&mut self, state: ConnectionState) {
        if state == self.ui_state {
            return;
        }
        self.ui_state = state;
        self.emit(UiEvent::ConnectionChanged(state)).await;
    }

    async fn emit(&self, event: UiEvent) {
        // A closed UI receiver only matters at the loop level, where the
        // command channel closing ends the session anyway.
        let _ = self.ui_tx.send(event).await;
    }
}

/// Sleeps until the deadline; resolves immediately when `None` (callers
/// guard with `if deadline.is_some()`).
async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => {}
    }
}

fn email_is_valid(email: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let regex = PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
    });
    regex.is_match(email)
}
