//! # ridestream
//!
//! Follows one rider's notification stream from the terminal and prints
//! each new notification as it arrives.

#![deny(unsafe_code)]

use std::io::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};

use ridestream_client::{ConnectionState, NotificationDriver, NotificationStreamClient};
use ridestream_core::logging::{LogFormat, init_subscriber};
use ridestream_core::{BearerToken, Identity, Notification, NotificationId, Principal};
use ridestream_settings::{load_settings_from_path, settings_path};

/// Follow a rider's real-time notifications.
#[derive(Parser, Debug)]
#[command(name = "ridestream", about = "Follow a rider's real-time notifications")]
struct Cli {
    /// Address the stream is scoped to (email or user id).
    #[arg(long)]
    email: String,

    /// Bearer token for the subscription request.
    #[arg(long, env = "RIDESTREAM_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Gateway base URL (overrides settings).
    #[arg(long)]
    base_url: Option<String>,

    /// Print notifications as JSON lines.
    #[arg(long)]
    json: bool,

    /// Settings file (default `~/.ridestream/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,
}

/// Renders notifications not printed before.
struct Printer {
    json: bool,
    last_seen: Option<NotificationId>,
}

impl Printer {
    fn new(json: bool) -> Self {
        Self {
            json,
            last_seen: None,
        }
    }

    /// Lines for notifications newer than the last rendered one. Ids grow
    /// monotonically, so removals never cause a reprint.
    fn render_new(&mut self, snapshot: &[Notification]) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        for notification in snapshot {
            if self.last_seen.is_some_and(|last| notification.id() <= last) {
                continue;
            }
            lines.push(self.render(notification)?);
            self.last_seen = Some(notification.id());
        }
        Ok(lines)
    }

    fn render(&self, notification: &Notification) -> Result<String> {
        if self.json {
            return serde_json::to_string(notification).context("failed to encode notification");
        }
        let category = notification.category().unwrap_or("-");
        Ok(format!(
            "{} [{}] {} ({category})",
            notification.received_at().format("%H:%M:%S"),
            notification.severity(),
            notification.message(),
        ))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let path = args.settings.clone().unwrap_or_else(settings_path);
    let mut settings = load_settings_from_path(&path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;
    if let Some(base_url) = args.base_url {
        settings.client.base_url = base_url;
    }

    let format = if settings.logging.json {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    init_subscriber(&settings.logging.level, format);

    let principal = Principal::parse(args.email).context("--email must not be blank")?;
    let identity = Identity::with_credential(principal, args.token.and_then(BearerToken::parse));

    let client = NotificationStreamClient::from_settings(&settings.client)
        .context("Invalid client settings")?;
    let (identity_tx, identity_rx) = watch::channel(Some(identity));
    let handle = NotificationDriver::spawn(client, identity_rx);

    let mut printer = Printer::new(args.json);
    let mut notifications = handle.subscribe();
    let mut states = handle.state_updates();
    let mut closed = false;
    let mut stdout = std::io::stdout().lock();

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for ctrl-c")?;
                info!("shutting down");
                break;
            }
            changed = notifications.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = notifications.borrow_and_update().clone();
                for line in printer.render_new(&snapshot)? {
                    writeln!(stdout, "{line}").context("Failed to write to stdout")?;
                }
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *states.borrow_and_update();
                info!(%state, "connection state changed");
                if state == ConnectionState::Closed {
                    closed = true;
                    break;
                }
            }
        }
    }

    // Anything published alongside the final state change.
    let snapshot = notifications.borrow().clone();
    for line in printer.render_new(&snapshot)? {
        writeln!(stdout, "{line}").context("Failed to write to stdout")?;
    }

    drop(identity_tx);
    handle.shutdown().await;

    if closed {
        warn!("notification stream closed by the transport");
        bail!("notification stream closed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn notification(id: u64, message: &str, category: Option<&str>) -> Notification {
        Notification::new(
            NotificationId::from_raw(id),
            Some(message.to_string()),
            category.map(str::to_string),
            None,
            Utc.with_ymd_and_hms(2025, 3, 1, 8, 15, 30).unwrap(),
        )
    }

    #[test]
    fn cli_requires_email() {
        assert!(Cli::try_parse_from(["ridestream"]).is_err());
    }

    #[test]
    fn cli_flags() {
        let cli = Cli::parse_from([
            "ridestream",
            "--email",
            "rider@example.com",
            "--token",
            "jwt",
            "--base-url",
            "https://gw.example.com",
            "--json",
        ]);
        assert_eq!(cli.email, "rider@example.com");
        assert_eq!(cli.token.as_deref(), Some("jwt"));
        assert_eq!(cli.base_url.as_deref(), Some("https://gw.example.com"));
        assert!(cli.json);
        assert!(cli.settings.is_none());
    }

    #[test]
    fn plain_lines() {
        let mut printer = Printer::new(false);
        let lines = printer
            .render_new(&[notification(1, "Ride accepted", Some("RIDE"))])
            .unwrap();
        assert_eq!(lines, vec!["08:15:30 [success] Ride accepted (RIDE)"]);

        let lines = printer
            .render_new(&[notification(2, "Hello", None)])
            .unwrap();
        assert_eq!(lines, vec!["08:15:30 [info] Hello (-)"]);
    }

    #[test]
    fn json_lines() {
        let mut printer = Printer::new(true);
        let lines = printer
            .render_new(&[notification(7, "Receipt ready", Some("PAYMENT"))])
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["message"], "Receipt ready");
        assert_eq!(value["severity"], "success");
    }

    #[test]
    fn only_new_notifications_are_printed() {
        let mut printer = Printer::new(false);
        let first = notification(1, "a", None);
        let second = notification(2, "b", None);

        assert_eq!(printer.render_new(&[first.clone()]).unwrap().len(), 1);
        assert_eq!(printer.render_new(&[first, second.clone()]).unwrap().len(), 1);
        // After a removal the remaining items are not reprinted.
        assert!(printer.render_new(&[second]).unwrap().is_empty());
    }
}
