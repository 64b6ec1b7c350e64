// SPDX-FileCopyrightText: 2026 Wisp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `wisp chat` command implementation.
//!
//! Runs the widget session in a background task and bridges it to the
//! terminal: stdin lines become session commands, UI events are rendered
//! as colored output. Slash commands cover the non-text operations
//! (`/file`, `/limit`, `/quit`).

use std::path::Path;
use std::sync::Arc;

use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;
use wisp_client::history::HistoryLimit;
use wisp_client::session::{SessionCommand, UiEvent, WidgetSession};
use wisp_client::state::FileStateStore;
use wisp_client::transport::TungsteniteTransport;
use wisp_config::WispConfig;
use wisp_core::error::WispError;
use wisp_core::types::{ConnectionState, Sender};

/// Runs the interactive chat loop until `/quit` or stdin closes.
pub async fn run_chat(config: WispConfig) -> Result<(), WispError> {
    let transport = Arc::new(TungsteniteTransport);
    let state = FileStateStore::open_default()?;
    let (session, mut events) = WidgetSession::open(config, transport, Box::new(state)).await?;
    println!(
        "{} room {}",
        "connected:".dimmed(),
        session.room_id().to_string().bold()
    );
    println!("{}", "commands: /file <path>, /limit <5|10|all>, /quit".dimmed());

    let (commands, commands_rx) = mpsc::channel(16);
    let session_task = tokio::spawn(session.run(commands_rx));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut collecting_contact = false;

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Some(event) => render_event(event, &mut collecting_contact),
                    None => break,
                }
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) | Err(_) => {
                        let _ = commands.send(SessionCommand::Close).await;
                        break;
                    }
                };
                if !handle_line(&commands, line, &mut collecting_contact).await {
                    break;
                }
            }
        }
    }

    drop(commands);
    match session_task.await {
        Ok(result) => result,
        Err(err) => Err(WispError::Internal(format!("session task failed: {err}"))),
    }
}

/// Returns `false` when the loop should exit.
async fn handle_line(
    commands: &mpsc::Sender<SessionCommand>,
    line: String,
    collecting_contact: &mut bool,
) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return true;
    }

    if *collecting_contact {
        // Expected as "Name, email@example.com".
        let Some((name, email)) = trimmed.split_once(',') else {
            println!("{}", "enter: <name>, <email>".yellow());
            return true;
        };
        *collecting_contact = false;
        return commands
            .send(SessionCommand::SubmitContactForm {
                name: name.trim().to_string(),
                email: email.trim().to_string(),
            })
            .await
            .is_ok();
    }

    let command = match trimmed.strip_prefix('/') {
        Some(rest) => match parse_slash_command(rest).await {
            Some(command) => command,
            None => return true,
        },
        None => SessionCommand::SendText(trimmed.to_string()),
    };
    let closing = matches!(command, SessionCommand::Close);
    if commands.send(command).await.is_err() {
        return false;
    }
    !closing
}

async fn parse_slash_command(rest: &str) -> Option<SessionCommand> {
    let (name, arg) = rest.split_once(' ').unwrap_or((rest, ""));
    match name {
        "quit" | "exit" => Some(SessionCommand::Close),
        "limit" => match arg.trim().parse::<HistoryLimit>() {
            Ok(limit) => Some(SessionCommand::SetHistoryLimit(limit)),
            Err(err) => {
                println!("{}", err.to_string().yellow());
                None
            }
        },
        "file" => {
            let path = Path::new(arg.trim());
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "attachment".to_string());
            match tokio::fs::read(path).await {
                Ok(bytes) => Some(SessionCommand::SendFile { name, bytes }),
                Err(err) => {
                    println!("{}", format!("cannot read {}: {err}", path.display()).yellow());
                    None
                }
            }
        }
        other => {
            println!("{}", format!("unknown command: /{other}").yellow());
            None
        }
    }
}

fn render_event(event: UiEvent, collecting_contact: &mut bool) {
    match event {
        UiEvent::ConnectionChanged(state) => match state {
            ConnectionState::Open => println!("{}", "[online]".green().dimmed()),
            ConnectionState::Reconnecting => {
                println!("{}", "[reconnecting...]".yellow().dimmed());
            }
            ConnectionState::Closed => println!("{}", "[offline]".red().dimmed()),
            ConnectionState::Idle | ConnectionState::Connecting => {
                debug!(%state, "connection state");
            }
        },
        UiEvent::MessageUpserted(message) => {
            let label = match message.sender {
                Sender::User => format!("you [{}]", message.status).cyan(),
                Sender::Agent => "agent".blue().bold(),
                Sender::System => "system".magenta(),
            };
            let body = message.body.unwrap_or_default();
            match message.attachment {
                Some(attachment) => {
                    println!("{label}: {body} {}", format!("({})", attachment.url).dimmed());
                }
                None => println!("{label}: {body}"),
            }
        }
        UiEvent::SystemNotice(notice) => println!("{}", notice.yellow()),
        UiEvent::RemoteTyping { sender, active } => {
            if active {
                println!("{}", format!("{sender} is typing...").dimmed());
            }
        }
        UiEvent::ShowContactForm => {
            *collecting_contact = true;
            println!(
                "{}",
                "please share your contact details as: <name>, <email>".bold()
            );
        }
        UiEvent::ResumeChat => {
            *collecting_contact = false;
            println!("{}", "thanks! you're back in the chat.".green());
        }
        UiEvent::QuickReplies(replies) => {
            println!("{} {}", "suggestions:".dimmed(), replies.join(" | ").dimmed());
        }
        UiEvent::Notify => print!("\x07"),
    }
}
