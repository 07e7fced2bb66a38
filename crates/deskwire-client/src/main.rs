//! deskwire: command-line remote desktop input client.
//!
//! Sends one input action (or watches the video stream for a while) over a
//! persistent agent connection, then closes it.
//!
//! # Usage
//!
//! ```text
//! deskwire [OPTIONS] <COMMAND>
//!
//! Commands:
//!   move         Relative pointer motion
//!   click        Press and release a pointer button
//!   button       Press or release a pointer button
//!   scroll       Wheel motion
//!   keys         Send a keyboard chord, e.g. `keys CTRL ALT DEL`
//!   watch        Log inbound video frames for a number of seconds
//!   end-session  End a desktop session at the agent
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable           | Description                         |
//! |--------------------|-------------------------------------|
//! | `DESKWIRE_CONFIG`  | Path of a TOML config file          |
//! | `DESKWIRE_HOST`    | Agent hostname or IP                |
//! | `DESKWIRE_PORT`    | Agent port                          |
//! | `DESKWIRE_API_KEY` | Agent API key                       |
//!
//! CLI args take precedence over environment variables, which take
//! precedence over the config file.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use deskwire_client::infrastructure::config_file::load_config;
use deskwire_client::{ClientConfig, ConnectionManager, InMemorySessionStore};
use deskwire_core::{ButtonAction, InputEvent, KeyCombo};
use tracing::info;
use tracing_subscriber::EnvFilter;

// ── CLI argument definitions ──────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(
    name = "deskwire",
    about = "Relay pointer and keyboard input to a remote desktop agent",
    version
)]
struct Cli {
    /// TOML config file; CLI and environment values override it.
    #[arg(long, env = "DESKWIRE_CONFIG")]
    config: Option<PathBuf>,

    /// Agent hostname or IP address.
    #[arg(long, env = "DESKWIRE_HOST")]
    host: Option<String>,

    /// Agent port.
    #[arg(long, env = "DESKWIRE_PORT")]
    port: Option<u16>,

    /// Agent API key, sent as `X-Openctrol-Key`.
    #[arg(long, env = "DESKWIRE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Use https/wss.
    #[arg(long)]
    ssl: bool,

    /// Identifier sent when creating sessions.
    #[arg(long)]
    client_id: Option<String>,

    /// After a session-limit refusal, reuse sessions cached for other agents.
    #[arg(long)]
    cross_endpoint_reuse: bool,

    /// Connect to this WebSocket URL instead of resolving a session.
    #[arg(long)]
    url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand, PartialEq)]
enum Command {
    /// Relative pointer motion.
    Move {
        #[arg(long, allow_negative_numbers = true)]
        dx: f64,
        #[arg(long, allow_negative_numbers = true)]
        dy: f64,
    },
    /// Press and release a pointer button.
    Click {
        #[arg(long, default_value = "left")]
        button: String,
    },
    /// Press or release a pointer button.
    Button {
        #[arg(long, default_value = "left")]
        button: String,
        /// `down` or `up`.
        #[arg(long, default_value = "down")]
        action: String,
    },
    /// Wheel motion.
    Scroll {
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        dx: f64,
        #[arg(long, allow_negative_numbers = true)]
        dy: f64,
    },
    /// Send a keyboard chord.
    Keys {
        /// Key names, modifiers first, e.g. `CTRL SHIFT ESC`.
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Log inbound video frames.
    Watch {
        #[arg(long, default_value_t = 10)]
        seconds: u64,
    },
    /// End a desktop session at the agent.
    EndSession {
        session_id: String,
    },
}

impl Cli {
    /// Builds the [`ClientConfig`]: config file (or defaults), then CLI
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed.
    fn into_client_config(&self) -> anyhow::Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("failed to load config file {}", path.display()))?,
            None => ClientConfig::default(),
        };

        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(key) = &self.api_key {
            config.api_key = Some(key.clone()).filter(|k| !k.is_empty());
        }
        if let Some(client_id) = &self.client_id {
            config.client_id = client_id.clone();
        }
        config.use_ssl |= self.ssl;
        config.cross_endpoint_session_reuse |= self.cross_endpoint_reuse;
        Ok(config)
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `RUST_LOG` controls verbosity; fall back to `info`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.into_client_config()?;
    info!(
        agent = %config.endpoint(),
        instance = %config.instance_id,
        "deskwire starting"
    );

    let store = Arc::new(InMemorySessionStore::new());
    let mut manager =
        ConnectionManager::with_rest_api(config, store).context("failed to build agent client")?;

    let result = run(&mut manager, cli.url.as_deref(), cli.command).await;
    manager.close().await;
    result
}

async fn run(manager: &mut ConnectionManager, url: Option<&str>, command: Command) -> anyhow::Result<()> {
    if let Command::EndSession { session_id } = &command {
        manager
            .end_session(session_id)
            .await
            .with_context(|| format!("failed to end session {session_id}"))?;
        info!(%session_id, "session ended");
        return Ok(());
    }

    if let Some(url) = url {
        manager
            .connect(Some(url))
            .await
            .context("failed to connect to explicit URL")?;
    }

    match command {
        Command::Move { dx, dy } => manager.send_pointer_event(&InputEvent::Move { dx, dy }).await?,
        Command::Click { button } => manager.send_pointer_event(&InputEvent::Click { button }).await?,
        Command::Button { button, action } => {
            let action = ButtonAction::parse_lenient(&action);
            manager
                .send_pointer_event(&InputEvent::ButtonToggle { button, action })
                .await?
        }
        Command::Scroll { dx, dy } => manager.send_pointer_event(&InputEvent::Scroll { dx, dy }).await?,
        Command::Keys { keys } => manager.send_key_combo(&KeyCombo::new(keys)).await?,
        Command::Watch { seconds } => watch(manager, seconds).await?,
        Command::EndSession { .. } => {}
    }
    Ok(())
}

async fn watch(manager: &mut ConnectionManager, seconds: u64) -> anyhow::Result<()> {
    let frames = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&frames);
    manager.set_frame_callback(move |payload: &[u8], width: u32, height: u32| {
        let n = counter.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(n, width, height, bytes = payload.len(), "frame");
    });

    // No-op on a verified-open connection from `--url`.
    manager.connect(None).await.context("failed to connect")?;
    info!(
        dialect = ?manager.dialect(),
        seconds,
        "watching video frames (Ctrl+C to stop)"
    );

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(seconds)) => {}
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
    }

    info!(frames = frames.load(Ordering::Relaxed), "watch finished");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_produce_default_config() {
        // Arrange: only a subcommand
        let cli = Cli::parse_from(["deskwire", "click"]);

        // Act
        let config = cli.into_client_config().unwrap();

        // Assert
        assert_eq!(config.port, 44325);
        assert_eq!(config.host, "127.0.0.1");
        assert!(!config.use_ssl);
    }

    #[test]
    fn test_cli_overrides_apply() {
        let cli = Cli::parse_from([
            "deskwire",
            "--host",
            "10.0.0.5",
            "--port",
            "9000",
            "--api-key",
            "k",
            "--ssl",
            "--client-id",
            "den",
            "--cross-endpoint-reuse",
            "click",
        ]);

        let config = cli.into_client_config().unwrap();

        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.port, 9000);
        assert_eq!(config.api_key.as_deref(), Some("k"));
        assert!(config.use_ssl);
        assert_eq!(config.client_id, "den");
        assert!(config.cross_endpoint_session_reuse);
    }

    #[test]
    fn test_cli_overrides_config_file() {
        // Arrange
        let path = std::env::temp_dir().join(format!("deskwire-cli-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[agent]\nhost = \"from-file\"\nport = 1234\n").unwrap();
        let path_arg = path.to_string_lossy().to_string();
        let cli = Cli::parse_from(["deskwire", "--config", &path_arg, "--port", "4321", "click"]);

        // Act
        let config = cli.into_client_config().unwrap();
        std::fs::remove_file(&path).unwrap();

        // Assert: file host survives, CLI port wins
        assert_eq!(config.host, "from-file");
        assert_eq!(config.port, 4321);
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let cli = Cli::parse_from(["deskwire", "--config", "/nonexistent/deskwire.toml", "click"]);
        assert!(cli.into_client_config().is_err());
    }

    #[test]
    fn test_move_accepts_negative_deltas() {
        let cli = Cli::parse_from(["deskwire", "move", "--dx", "10.6", "--dy", "-3.2"]);
        assert_eq!(cli.command, Command::Move { dx: 10.6, dy: -3.2 });
    }

    #[test]
    fn test_click_defaults_to_left() {
        let cli = Cli::parse_from(["deskwire", "click"]);
        assert_eq!(
            cli.command,
            Command::Click {
                button: "left".into()
            }
        );
    }

    #[test]
    fn test_button_takes_action() {
        let cli = Cli::parse_from(["deskwire", "button", "--button", "right", "--action", "up"]);
        assert_eq!(
            cli.command,
            Command::Button {
                button: "right".into(),
                action: "up".into()
            }
        );
    }

    #[test]
    fn test_keys_collects_positional_names() {
        let cli = Cli::parse_from(["deskwire", "keys", "CTRL", "SHIFT", "ESC"]);
        assert_eq!(
            cli.command,
            Command::Keys {
                keys: vec!["CTRL".into(), "SHIFT".into(), "ESC".into()]
            }
        );
    }

    #[test]
    fn test_keys_requires_at_least_one_name() {
        assert!(Cli::try_parse_from(["deskwire", "keys"]).is_err());
    }

    #[test]
    fn test_end_session_takes_id() {
        let cli = Cli::parse_from(["deskwire", "end-session", "abc"]);
        assert_eq!(
            cli.command,
            Command::EndSession {
                session_id: "abc".into()
            }
        );
    }

    #[test]
    fn test_explicit_url_is_parsed() {
        let cli = Cli::parse_from(["deskwire", "--url", "ws://h:1/ws?sess=x", "watch", "--seconds", "2"]);
        assert_eq!(cli.url.as_deref(), Some("ws://h:1/ws?sess=x"));
        assert_eq!(cli.command, Command::Watch { seconds: 2 });
    }
}
