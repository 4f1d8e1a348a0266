//! Background task binding a client to the host's identity source.
//!
//! The host publishes its current identity on a `watch` channel. The driver
//! owns the [`NotificationStreamClient`], follows identity changes, applies
//! inbound signals and publishes a snapshot of the notification list and
//! connection state after every step. When the identity sender is dropped or
//! [`DriverHandle::shutdown`] is called, the client is deactivated before the
//! task ends.

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use ridestream_core::{Identity, Notification, NotificationId};

use crate::client::{ConnectionState, NotificationStreamClient};

const COMMAND_CAPACITY: usize = 16;

#[derive(Debug)]
enum DriverCommand {
    Remove {
        id: NotificationId,
        reply: oneshot::Sender<bool>,
    },
    Shutdown,
}

/// Spawns driver tasks.
#[derive(Debug)]
pub struct NotificationDriver;

impl NotificationDriver {
    /// Move `client` into a new tokio task driven by `identity`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        client: NotificationStreamClient,
        identity: watch::Receiver<Option<Identity>>,
    ) -> DriverHandle {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (notifications_tx, notifications_rx) = watch::channel(Vec::new());
        let (state_tx, state_rx) = watch::channel(ConnectionState::Idle);

        let task = tokio::spawn(run(
            client,
            identity,
            command_rx,
            Publisher {
                notifications: notifications_tx,
                state: state_tx,
            },
        ));

        DriverHandle {
            commands: command_tx,
            notifications: notifications_rx,
            state: state_rx,
            task,
        }
    }
}

/// Host-side handle on a running driver.
#[derive(Debug)]
pub struct DriverHandle {
    commands: mpsc::Sender<DriverCommand>,
    notifications: watch::Receiver<Vec<Notification>>,
    state: watch::Receiver<ConnectionState>,
    task: JoinHandle<()>,
}

impl DriverHandle {
    /// Latest notification snapshot.
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.borrow().clone()
    }

    /// Receiver notified whenever the notification list changes.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Notification>> {
        self.notifications.clone()
    }

    /// Latest connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Receiver notified whenever the connection state changes.
    pub fn state_updates(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Remove a notification. Returns whether it was present; `false` once
    /// the driver has stopped.
    pub async fn remove_notification(&self, id: NotificationId) -> bool {
        let (reply, response) = oneshot::channel();
        if self
            .commands
            .send(DriverCommand::Remove { id, reply })
            .await
            .is_err()
        {
            return false;
        }
        response.await.unwrap_or(false)
    }

    /// Whether the driver task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Deactivate the client and wait for the task to end.
    pub async fn shutdown(self) {
        let _ = self.commands.send(DriverCommand::Shutdown).await;
        if let Err(e) = self.task.await {
            warn!(error = %e, "notification driver task failed");
        }
    }
}

struct Publisher {
    notifications: watch::Sender<Vec<Notification>>,
    state: watch::Sender<ConnectionState>,
}

impl Publisher {
    fn publish(&self, client: &NotificationStreamClient) {
        let _ = self.notifications.send_if_modified(|current| {
            if current.as_slice() == client.notifications() {
                return false;
            }
            *current = client.notifications().to_vec();
            true
        });
        let _ = self.state.send_if_modified(|current| {
            if *current == client.state() {
                return false;
            }
            *current = client.state();
            true
        });
    }
}

async fn run(
    mut client: NotificationStreamClient,
    mut identity: watch::Receiver<Option<Identity>>,
    mut commands: mpsc::Receiver<DriverCommand>,
    publisher: Publisher,
) {
    let initial = identity.borrow_and_update().clone();
    let outcome = client.bind_identity(initial);
    debug!(?outcome, "notification driver started");
    publisher.publish(&client);

    loop {
        tokio::select! {
            changed = identity.changed() => {
                if changed.is_err() {
                    debug!("identity source closed");
                    break;
                }
                let next = identity.borrow_and_update().clone();
                let outcome = client.bind_identity(next);
                debug!(?outcome, "identity changed");
            }
            command = commands.recv() => match command {
                Some(DriverCommand::Remove { id, reply }) => {
                    let _ = reply.send(client.remove_notification(id));
                }
                Some(DriverCommand::Shutdown) | None => break,
            },
            signal = client.next_signal() => {
                let outcome = client.handle_signal(signal);
                debug!(?outcome, "signal applied");
            }
        }
        publisher.publish(&client);
    }

    client.deactivate();
    publisher.publish(&client);
    debug!("notification driver stopped");
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
