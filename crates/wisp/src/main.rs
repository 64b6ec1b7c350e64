// SPDX-FileCopyrightText: 2026 Wisp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wisp - a terminal chat-widget client.
//!
//! This is the binary entry point for the Wisp client.

use clap::{Parser, Subcommand};

mod chat;

/// Wisp - a terminal chat-widget client.
#[derive(Parser, Debug)]
#[command(name = "wisp", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Open a chat session against the configured backend.
    Chat,
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match wisp_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            wisp_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.client.log_level);

    match cli.command {
        Some(Commands::Chat) | None => {
            if let Err(err) = chat::run_chat(config).await {
                eprintln!("error: {err}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => {
                eprintln!("error: failed to render config: {err}");
                std::process::exit(1);
            }
        },
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wisp={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    #[test]
    fn binary_loads_config_defaults() {
        let config = wisp_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.connection.max_attempts, 5);
    }
}
