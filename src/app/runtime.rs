// SPDX-License-Identifier: GPL-3.0-only

//! Session owner task
//!
//! One tokio task owns the [`CaptureSessionManager`]. User events arrive on
//! a bounded channel; capture and import completions run on their own tasks
//! and are sent back as [`Message`]s, so every state change happens on the
//! owner. Notifications leave on an unbounded channel and the terminal
//! outcome on a oneshot, which can only ever fire once.

use crate::app::CaptureSessionManager;
use crate::app::state::{Message, Notification, SessionEvent, SessionOutcome};
use crate::app::update::Task;
use crate::backends::camera::CameraPlatform;
use crate::backends::library::LibraryPicker;
use crate::config::Config;
use crate::errors::{CaptureError, CaptureResult};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Capacity of the user event channel
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Drives one session on a background task
pub struct SessionRuntime {
    manager: CaptureSessionManager,
    events: mpsc::Receiver<SessionEvent>,
    completions_tx: mpsc::UnboundedSender<Message>,
    completions: mpsc::UnboundedReceiver<Message>,
    notifications: mpsc::UnboundedSender<Notification>,
    outcome: Option<oneshot::Sender<SessionOutcome>>,
}

/// Caller side of a running session
pub struct SessionHandle {
    events: mpsc::Sender<SessionEvent>,
    notifications: mpsc::UnboundedReceiver<Notification>,
    outcome: oneshot::Receiver<SessionOutcome>,
    task: JoinHandle<()>,
}

impl SessionRuntime {
    /// Start a session and spawn its owner task
    ///
    /// Errors from `start` (access refused, no device, zero cap) are
    /// returned here and no task is spawned.
    pub fn start(
        platform: Arc<dyn CameraPlatform>,
        picker: Arc<dyn LibraryPicker>,
        config: Config,
        max_count: Option<usize>,
    ) -> CaptureResult<SessionHandle> {
        let mut manager = CaptureSessionManager::new(platform, picker, config);
        manager.start(max_count)?;

        let (events_tx, events) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let (notifications_tx, notifications) = mpsc::unbounded_channel();
        let (outcome_tx, outcome) = oneshot::channel();

        let mut runtime = SessionRuntime {
            manager,
            events,
            completions_tx,
            completions,
            notifications: notifications_tx,
            outcome: Some(outcome_tx),
        };
        runtime.flush_notifications();
        let task = tokio::spawn(runtime.run());

        Ok(SessionHandle {
            events: events_tx,
            notifications,
            outcome,
            task,
        })
    }

    async fn run(mut self) {
        let id = self.manager.id();
        info!(session = %id, "Session runtime started");

        loop {
            // Completions first so results land before newer user events
            let message = tokio::select! {
                biased;
                Some(message) = self.completions.recv() => message,
                event = self.events.recv() => match event {
                    Some(event) => Message::Event(event),
                    None => {
                        debug!(session = %id, "Session handle dropped, cancelling");
                        Message::Event(SessionEvent::Cancel)
                    }
                },
            };

            let task = self.manager.update(message);
            self.flush_notifications();

            match task {
                Task::None => {}
                Task::Capture(pending) => {
                    let tx = self.completions_tx.clone();
                    tokio::spawn(async move {
                        let result = pending.resolve().await;
                        let _ = tx.send(Message::CaptureCompleted(result));
                    });
                }
                Task::Import(mut items) => {
                    let tx = self.completions_tx.clone();
                    tokio::spawn(async move {
                        while let Some(item) = items.next().await {
                            if tx.send(Message::ImportItem(item)).is_err() {
                                return;
                            }
                        }
                        let _ = tx.send(Message::ImportFinished);
                    });
                }
                Task::Finish(outcome) => {
                    if let Some(sender) = self.outcome.take() {
                        if sender.send(outcome).is_err() {
                            warn!(session = %id, "Session outcome had no receiver");
                        }
                    }
                    break;
                }
            }
        }

        info!(session = %id, "Session runtime finished");
    }

    fn flush_notifications(&mut self) {
        for notification in self.manager.drain_notifications() {
            // Receiver gone just means nobody is watching
            let _ = self.notifications.send(notification);
        }
    }
}

impl SessionHandle {
    /// Queue a user event for the session
    pub async fn send(&self, event: SessionEvent) -> CaptureResult<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| CaptureError::Terminated)
    }

    /// Next notification; `None` once the session has finished and all
    /// notifications were read
    pub async fn next_notification(&mut self) -> Option<Notification> {
        self.notifications.recv().await
    }

    /// Notification already queued, without waiting
    pub fn try_next_notification(&mut self) -> Option<Notification> {
        self.notifications.try_recv().ok()
    }

    /// Stop sending events and wait for the terminal outcome
    ///
    /// Events already queued are still handled. If none of them ends the
    /// session, it is cancelled.
    pub async fn outcome(self) -> CaptureResult<SessionOutcome> {
        let SessionHandle {
            events,
            outcome,
            task,
            ..
        } = self;
        drop(events);

        let outcome = outcome.await.map_err(|_| CaptureError::Terminated)?;
        if let Err(e) = task.await {
            warn!(error = %e, "Session task ended abnormally");
        }
        Ok(outcome)
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("closed", &self.events.is_closed())
            .finish()
    }
}
