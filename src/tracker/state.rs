//! Handles shared with the tracker's consumers.

use super::events::TrackerEvent;
use super::Command;
use crate::error::{Result, TrackerError};
use crate::monitor::KeyEvent;
use crate::store::TrackerSnapshot;
use tokio::sync::{broadcast, mpsc, watch};

/// Cloneable handle to the tracker's owner thread.
///
/// Every mutation is sent as a [`Command`] and applied in arrival order on
/// the owner thread; the handle itself never touches session state.
#[derive(Debug, Clone)]
pub struct TrackerHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<TrackerSnapshot>,
    events: broadcast::Sender<TrackerEvent>,
}

impl TrackerHandle {
    pub(crate) fn new(
        commands: mpsc::UnboundedSender<Command>,
        snapshot: watch::Receiver<TrackerSnapshot>,
        events: broadcast::Sender<TrackerEvent>,
    ) -> Self {
        Self {
            commands,
            snapshot,
            events,
        }
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| TrackerError::EngineStopped)
    }

    pub fn start_session(&self) -> Result<()> {
        self.send(Command::StartSession)
    }

    pub fn reset_session(&self) -> Result<()> {
        self.send(Command::ResetSession)
    }

    pub fn end_session(&self) -> Result<()> {
        self.send(Command::EndSession)
    }

    pub fn submit_key(&self, event: KeyEvent) -> Result<()> {
        self.send(Command::Key(event))
    }

    /// Tells the tracker that input capture is now authorized.
    pub fn permission_granted(&self) -> Result<()> {
        self.send(Command::PermissionGranted)
    }

    /// Asks the owner thread to archive any active session and stop.
    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }

    /// Latest published state.
    pub fn snapshot(&self) -> TrackerSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver notified whenever the snapshot changes.
    pub fn watch(&self) -> watch::Receiver<TrackerSnapshot> {
        self.snapshot.clone()
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<TrackerEvent> {
        self.events.subscribe()
    }

    /// Lightweight sender for the input hook.
    pub fn key_sender(&self) -> KeySender {
        KeySender(self.commands.clone())
    }
}

/// Fire-and-forget key event sender.
///
/// Never blocks and never fails; events sent after the tracker stopped
/// are dropped.
#[derive(Debug, Clone)]
pub struct KeySender(mpsc::UnboundedSender<Command>);

impl KeySender {
    #[inline]
    pub fn send(&self, event: KeyEvent) {
        let _ = self.0.send(Command::Key(event));
    }
}
