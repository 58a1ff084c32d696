//! Permission gate for global input observation.
//!
//! The platform's trust store is reached through the opaque
//! [`AuthorizationProvider`] port. The gate adds prompt de-duplication and
//! a cancellable wait-until-granted poll on top of it.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Capability check against the platform's trust store.
///
/// Both calls must be synchronous and total: lack of trust is a normal
/// negative answer, never an error.
pub trait AuthorizationProvider: Send + Sync {
    /// Whether this process may currently observe global input.
    fn is_trusted(&self) -> bool;

    /// Shows the platform's consent prompt. Resolution is asynchronous.
    fn prompt(&self);
}

/// Provider for platforms where low-level capture needs no consent.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysAuthorized;

impl AuthorizationProvider for AlwaysAuthorized {
    fn is_trusted(&self) -> bool {
        true
    }

    fn prompt(&self) {}
}

/// Provider backed by a shared flag.
///
/// Whoever learns about the grant (a settings callback, a manual
/// "I've enabled it" action) flips the flag; the gate observes it.
#[derive(Debug, Default, Clone)]
pub struct SharedFlagProvider {
    trusted: Arc<AtomicBool>,
    prompts: Arc<AtomicU32>,
}

impl SharedFlagProvider {
    pub fn new(trusted: bool) -> Self {
        Self {
            trusted: Arc::new(AtomicBool::new(trusted)),
            prompts: Arc::default(),
        }
    }

    pub fn set_trusted(&self, trusted: bool) {
        self.trusted.store(trusted, Ordering::SeqCst);
    }

    /// Number of times the consent prompt was shown.
    pub fn prompt_count(&self) -> u32 {
        self.prompts.load(Ordering::SeqCst)
    }
}

impl AuthorizationProvider for SharedFlagProvider {
    fn is_trusted(&self) -> bool {
        self.trusted.load(Ordering::SeqCst)
    }

    fn prompt(&self) {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        tracing::info!("Input monitoring consent requested");
    }
}

type GrantCallback = Box<dyn FnOnce() + Send + 'static>;

/// Shortest accepted poll interval.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// One poll cycle. The callback slot is the single source of truth:
/// whoever takes it out first (grant or cancel) wins.
struct PollCycle {
    callback: Arc<Mutex<Option<GrantCallback>>>,
    task: JoinHandle<()>,
}

impl PollCycle {
    fn cancel(self) {
        if let Ok(mut slot) = self.callback.lock() {
            slot.take();
        }
        self.task.abort();
    }

    fn is_active(&self) -> bool {
        let pending = self
            .callback
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false);
        pending && !self.task.is_finished()
    }
}

/// Answers "may we observe global input?" and supports waiting for a grant.
pub struct PermissionGate {
    provider: Arc<dyn AuthorizationProvider>,
    runtime: Handle,
    prompted: AtomicBool,
    poll: Mutex<Option<PollCycle>>,
}

impl PermissionGate {
    /// Creates a gate whose poll cycles run on `runtime`.
    pub fn new(provider: Arc<dyn AuthorizationProvider>, runtime: Handle) -> Self {
        Self {
            provider,
            runtime,
            prompted: AtomicBool::new(false),
            poll: Mutex::new(None),
        }
    }

    /// Queries the current authorization state. No side effects.
    pub fn is_authorized(&self) -> bool {
        self.provider.is_trusted()
    }

    /// Shows the consent prompt at most once per gate, unless already
    /// authorized, and returns the current state immediately.
    pub fn request_authorization(&self) -> bool {
        if self.provider.is_trusted() {
            return true;
        }

        if !self.prompted.swap(true, Ordering::SeqCst) {
            self.provider.prompt();
        } else {
            tracing::debug!("Consent prompt already shown, not prompting again");
        }

        self.provider.is_trusted()
    }

    /// Checks authorization every `interval` until it is granted, then
    /// invokes `on_granted` exactly once and stops.
    ///
    /// Replaces any poll cycle already running on this gate.
    pub fn poll_until_authorized<F>(&self, interval: Duration, on_granted: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let Ok(mut poll) = self.poll.lock() else {
            tracing::error!("Permission poll state poisoned");
            return;
        };

        if let Some(previous) = poll.take() {
            tracing::debug!("Replacing active permission poll");
            previous.cancel();
        }

        let interval = if interval < MIN_POLL_INTERVAL {
            tracing::warn!(
                requested_ms = interval.as_millis() as u64,
                "Permission poll interval too short, using minimum"
            );
            MIN_POLL_INTERVAL
        } else {
            interval
        };

        let on_granted: GrantCallback = Box::new(on_granted);
        let callback = Arc::new(Mutex::new(Some(on_granted)));
        let slot = Arc::clone(&callback);
        let provider = Arc::clone(&self.provider);

        let task = self.runtime.spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let granted = {
                    let Ok(mut pending) = slot.lock() else {
                        return;
                    };
                    if pending.is_none() {
                        return;
                    }
                    if !provider.is_trusted() {
                        tracing::trace!("Still waiting for input monitoring authorization");
                        continue;
                    }
                    pending.take()
                };

                // Guard released: the callback may call back into the gate.
                tracing::info!("Input monitoring authorized");
                if let Some(on_granted) = granted {
                    on_granted();
                }
                return;
            }
        });

        tracing::debug!(
            interval_ms = interval.as_millis() as u64,
            "Permission poll started"
        );
        *poll = Some(PollCycle { callback, task });
    }

    /// Stops the active poll cycle. Once this returns, the pending
    /// callback can no longer run.
    pub fn cancel(&self) {
        if let Ok(mut poll) = self.poll.lock() {
            if let Some(cycle) = poll.take() {
                cycle.cancel();
                tracing::debug!("Permission poll cancelled");
            }
        }
    }

    /// Whether a poll cycle is still waiting for a grant.
    pub fn is_polling(&self) -> bool {
        self.poll
            .lock()
            .map(|poll| poll.as_ref().is_some_and(PollCycle::is_active))
            .unwrap_or(false)
    }
}

impl Drop for PermissionGate {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate_with(provider: &SharedFlagProvider) -> PermissionGate {
        PermissionGate::new(Arc::new(provider.clone()), Handle::current())
    }

    fn counter() -> (Arc<AtomicU32>, impl FnOnce() + Send + 'static) {
        let count = Arc::new(AtomicU32::new(0));
        let inner = Arc::clone(&count);
        (count, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test]
    async fn test_always_authorized() {
        let gate = PermissionGate::new(Arc::new(AlwaysAuthorized), Handle::current());
        assert!(gate.is_authorized());
        assert!(gate.request_authorization());
    }

    #[tokio::test]
    async fn test_request_prompts_only_once() {
        let provider = SharedFlagProvider::new(false);
        let gate = gate_with(&provider);

        assert!(!gate.request_authorization());
        assert!(!gate.request_authorization());
        assert!(!gate.request_authorization());
        assert_eq!(provider.prompt_count(), 1);
    }

    #[tokio::test]
    async fn test_request_does_not_prompt_when_trusted() {
        let provider = SharedFlagProvider::new(true);
        let gate = gate_with(&provider);

        assert!(gate.request_authorization());
        assert_eq!(provider.prompt_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_fires_once_after_grant() {
        let provider = SharedFlagProvider::new(false);
        let gate = gate_with(&provider);
        let (fired, on_granted) = counter();

        gate.poll_until_authorized(Duration::from_secs(2), on_granted);
        tokio::time::sleep(Duration::from_secs(7)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(gate.is_polling());

        provider.set_trusted(true);
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!gate.is_polling());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_grant_stops_checks() {
        let provider = SharedFlagProvider::new(false);
        let gate = gate_with(&provider);
        let (fired, on_granted) = counter();

        gate.poll_until_authorized(Duration::from_secs(2), on_granted);
        tokio::time::sleep(Duration::from_secs(3)).await;
        gate.cancel();
        assert!(!gate.is_polling());

        provider.set_trusted(true);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_cancel_starts_fresh_cycle() {
        let provider = SharedFlagProvider::new(false);
        let gate = gate_with(&provider);
        let (first, first_cb) = counter();
        let (second, second_cb) = counter();

        gate.poll_until_authorized(Duration::from_secs(2), first_cb);
        gate.cancel();
        gate.poll_until_authorized(Duration::from_secs(2), second_cb);

        provider.set_trusted(true);
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_callback_may_cancel_its_own_gate() {
        let provider = SharedFlagProvider::new(true);
        let gate = Arc::new(gate_with(&provider));
        let (fired, on_granted) = counter();

        let inner = Arc::clone(&gate);
        gate.poll_until_authorized(Duration::from_secs(2), move || {
            inner.cancel();
            on_granted();
        });

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!gate.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_callback_may_start_another_poll() {
        let provider = SharedFlagProvider::new(true);
        let gate = Arc::new(gate_with(&provider));
        let (second, second_cb) = counter();

        let inner = Arc::clone(&gate);
        gate.poll_until_authorized(Duration::from_secs(2), move || {
            inner.poll_until_authorized(Duration::from_secs(2), second_cb);
        });

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(gate.is_polling());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert!(!gate.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_is_clamped() {
        let provider = SharedFlagProvider::new(false);
        let gate = gate_with(&provider);
        let (fired, on_granted) = counter();

        gate.poll_until_authorized(Duration::ZERO, on_granted);
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(gate.is_polling());

        provider.set_trusted(true);
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!gate.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_poll_replaces_previous() {
        let provider = SharedFlagProvider::new(false);
        let gate = gate_with(&provider);
        let (first, first_cb) = counter();
        let (second, second_cb) = counter();

        gate.poll_until_authorized(Duration::from_secs(2), first_cb);
        gate.poll_until_authorized(Duration::from_secs(2), second_cb);

        provider.set_trusted(true);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }
}
