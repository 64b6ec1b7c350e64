// SPDX-FileCopyrightText: 2026 Wisp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST endpoints: room handshake, history fetch, file upload.

use reqwest::multipart;
use serde::{Deserialize, Serialize};
use tracing::debug;
use wisp_core::error::WispError;
use wisp_core::types::{Attachment, DeliveryStatus, RoomId, Sender, WidgetId};

use crate::history::HistoryLimit;

/// Response of the room-creation handshake.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomHandshake {
    pub room_id: RoomId,
    pub widget: WidgetInfo,
}

/// Widget activation flag and free-form backend settings.
#[derive(Debug, Clone, Deserialize)]
pub struct WidgetInfo {
    pub is_active: bool,
    #[serde(default)]
    pub settings: serde_json::Value,
}

/// One message as returned by the history endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryMessage {
    #[serde(default)]
    pub message_id: Option<String>,
    pub sender: Sender,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub status: Option<DeliveryStatus>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HistoryMessage {
    pub fn attachment(&self) -> Option<Attachment> {
        self.file_url.as_ref().map(|url| Attachment {
            url: url.clone(),
            name: self
                .file_name
                .clone()
                .unwrap_or_else(|| "attachment".to_string()),
            size: None,
        })
    }
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    messages: Vec<HistoryMessage>,
}

/// Response of a file upload.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedFile {
    pub file_url: String,
    pub file_name: String,
}

#[derive(Serialize)]
struct CreateRoomRequest<'a> {
    widget_id: &'a WidgetId,
    ip: &'a str,
    user_agent: &'a str,
}

#[derive(Serialize)]
struct HistoryRequest<'a> {
    room_id: &'a RoomId,
    widget_id: &'a WidgetId,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
}

pub struct RestClient {
    http: reqwest::Client,
    api_url: String,
    history_url: String,
    file_upload_url: String,
}

impl RestClient {
    pub fn new(
        api_url: impl Into<String>,
        history_url: impl Into<String>,
        file_upload_url: impl Into<String>,
        user_agent: &str,
    ) -> Result<Self, WispError> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|err| WispError::Http {
                message: "failed to build HTTP client".into(),
                source: Some(Box::new(err)),
            })?;
        Ok(Self {
            http,
            api_url: api_url.into(),
            history_url: history_url.into(),
            file_upload_url: file_upload_url.into(),
        })
    }

    /// Creates (or resumes) a chat room for this widget.
    pub async fn create_room(
        &self,
        widget_id: &WidgetId,
        ip: &str,
        user_agent: &str,
    ) -> Result<RoomHandshake, WispError> {
        debug!(widget = %widget_id, "creating room");
        let response = self
            .http
            .post(&self.api_url)
            .json(&CreateRoomRequest {
                widget_id,
                ip,
                user_agent,
            })
            .send()
            .await
            .map_err(http_err("room creation request failed"))?
            .error_for_status()
            .map_err(http_err("room creation rejected"))?;
        response
            .json()
            .await
            .map_err(http_err("room creation response malformed"))
    }

    /// Fetches stored history for a room, newest-last, honoring the limit.
    pub async fn fetch_history(
        &self,
        room_id: &RoomId,
        widget_id: &WidgetId,
        limit: HistoryLimit,
    ) -> Result<Vec<HistoryMessage>, WispError> {
        debug!(room = %room_id, limit = %limit, "fetching history");
        let response = self
            .http
            .post(&self.history_url)
            .json(&HistoryRequest {
                room_id,
                widget_id,
                limit: limit.request_value(),
            })
            .send()
            .await
            .map_err(http_err("history request failed"))?
            .error_for_status()
            .map_err(http_err("history request rejected"))?;
        let body: HistoryResponse = response
            .json()
            .await
            .map_err(http_err("history response malformed"))?;
        Ok(body.messages)
    }

    /// Uploads a file and returns its served URL.
    pub async fn upload_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedFile, WispError> {
        debug!(file = file_name, size = bytes.len(), "uploading file");
        let part = multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = multipart::Form::new().part("file", part);
        let response = self
            .http
            .post(&self.file_upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(http_err("file upload request failed"))?
            .error_for_status()
            .map_err(http_err("file upload rejected"))?;
        response
            .json()
            .await
            .map_err(http_err("file upload response malformed"))
    }
}

fn http_err(message: &'static str) -> impl Fn(reqwest::Error) -> WispError {
    move |err| WispError::Http {
        message: message.to_string(),
        source: Some(Box::new(err)),
    }
}
