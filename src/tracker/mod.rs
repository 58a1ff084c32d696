//! The tracker's owner thread.
//!
//! A dedicated thread runs a tokio runtime whose single owner task holds
//! the [`SessionEngine`]. Key events (from the input hook), session
//! controls (from the tray) and authorization grants (from the permission
//! poll) all arrive as [`Command`]s on one unbounded channel and are
//! applied strictly in arrival order. The inactivity timer is a sleep
//! until the engine's current deadline, raced against the next command.

pub mod events;
pub mod state;

pub use events::*;
pub use state::*;

use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use crate::monitor::KeyEvent;
use crate::store::{
    elapsed_between, AggregateHistory, Clock, EndReason, SessionEngine, TrackerSnapshot,
};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};

/// Capacity of the lifecycle event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Input to the owner thread.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Key(KeyEvent),
    StartSession,
    ResetSession,
    EndSession,
    PermissionGranted,
    Shutdown,
}

/// The owner task. Holds the engine and the receiving ends of every input.
pub struct OwnerLoop<C: Clock> {
    engine: SessionEngine<C>,
    capture_authorized: bool,
    commands: mpsc::UnboundedReceiver<Command>,
    snapshot_tx: watch::Sender<TrackerSnapshot>,
    events_tx: broadcast::Sender<TrackerEvent>,
}

/// Wires an engine to a fresh set of channels.
///
/// The caller decides where [`OwnerLoop::run`] executes; [`start_tracker`]
/// gives it a dedicated thread.
pub fn tracker_channel<C: Clock>(
    engine: SessionEngine<C>,
    capture_authorized: bool,
) -> (TrackerHandle, OwnerLoop<C>) {
    let (commands_tx, commands) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot(capture_authorized));
    let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

    let handle = TrackerHandle::new(commands_tx, snapshot_rx, events_tx.clone());
    let owner = OwnerLoop {
        engine,
        capture_authorized,
        commands,
        snapshot_tx,
        events_tx,
    };
    (handle, owner)
}

impl<C: Clock> OwnerLoop<C> {
    /// Processes commands until shutdown (or until every handle is gone).
    ///
    /// An active session is archived before returning. Returns the final
    /// aggregate history.
    pub async fn run(mut self) -> AggregateHistory {
        tracing::info!(
            authorized = self.capture_authorized,
            inactivity_secs = self.engine.inactivity_timeout().as_secs(),
            "Tracker owner loop started"
        );

        loop {
            let wait = self.time_until_deadline();

            tokio::select! {
                biased;

                _ = tokio::time::sleep(wait.unwrap_or_default()), if wait.is_some() => {
                    if let Some(summary) = self.engine.handle_inactivity_timeout() {
                        self.emit(TrackerEvent::SessionEnded {
                            reason: EndReason::Inactivity,
                            summary: Some(summary),
                        });
                    }
                }
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.apply(command),
                },
            }

            self.publish_snapshot();
        }

        if self.engine.is_session_started() {
            let summary = self.engine.end_session_with(EndReason::Shutdown);
            self.emit(TrackerEvent::SessionEnded {
                reason: EndReason::Shutdown,
                summary,
            });
            self.publish_snapshot();
        }

        tracing::info!("Tracker owner loop stopped");
        self.engine.history().clone()
    }

    fn time_until_deadline(&self) -> Option<Duration> {
        self.engine
            .inactivity_deadline()
            .map(|deadline| elapsed_between(self.engine.now(), deadline))
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Key(event) => {
                self.engine.handle_key_event(event);
            }
            Command::PermissionGranted => {
                if !self.capture_authorized {
                    self.capture_authorized = true;
                    tracing::info!("Input capture enabled");
                    self.emit(TrackerEvent::PermissionGranted);
                }
            }
            _ if !self.capture_authorized => {
                tracing::warn!(?command, "Input capture unavailable, ignoring session control");
            }
            Command::StartSession => {
                self.engine.start_session();
                self.emit(TrackerEvent::SessionStarted);
            }
            Command::ResetSession => {
                self.engine.reset_session();
                self.emit(TrackerEvent::SessionReset);
            }
            Command::EndSession => {
                let was_active = self.engine.is_session_started();
                let summary = self.engine.end_session();
                if was_active || summary.is_some() {
                    self.emit(TrackerEvent::SessionEnded {
                        reason: EndReason::Manual,
                        summary,
                    });
                }
            }
            Command::Shutdown => {}
        }
    }

    fn emit(&self, event: TrackerEvent) {
        tracing::debug!(event = %event.to_json(), "Tracker event");
        // No subscribers is fine.
        let _ = self.events_tx.send(event);
    }

    fn publish_snapshot(&self) {
        let snapshot = self.engine.snapshot(self.capture_authorized);
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

/// A running tracker: its handle, its runtime and its owner thread.
pub struct Tracker {
    handle: TrackerHandle,
    runtime: tokio::runtime::Handle,
    thread: JoinHandle<AggregateHistory>,
}

impl Tracker {
    pub fn handle(&self) -> &TrackerHandle {
        &self.handle
    }

    /// Runtime for deferred work that must feed the tracker
    /// (e.g. the permission poll).
    pub fn runtime(&self) -> &tokio::runtime::Handle {
        &self.runtime
    }

    /// Stops the owner thread and returns the final aggregate history.
    pub fn shutdown(self) -> Result<AggregateHistory> {
        // Already stopped is fine; join reports the outcome.
        let _ = self.handle.shutdown();
        self.thread.join().map_err(|_| TrackerError::EngineStopped)
    }
}

/// Spawns the tracker's owner thread.
///
/// # Arguments
/// * `config` - Inactivity window and related settings
/// * `clock` - Time source for session timing
/// * `capture_authorized` - Whether input capture is already authorized
pub fn start_tracker<C: Clock>(
    config: &TrackerConfig,
    clock: C,
    capture_authorized: bool,
) -> Result<Tracker> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("wpmon-worker")
        .enable_all()
        .build()
        .map_err(TrackerError::Runtime)?;
    let runtime_handle = runtime.handle().clone();

    let engine = SessionEngine::with_clock(clock, config.inactivity_timeout);
    let (handle, owner) = tracker_channel(engine, capture_authorized);

    let thread = thread::Builder::new()
        .name("wpmon-tracker".to_string())
        .spawn(move || runtime.block_on(owner.run()))?;

    tracing::info!("Tracker thread started");
    Ok(Tracker {
        handle,
        runtime: runtime_handle,
        thread,
    })
}
