use std::time::{Duration, Instant};

/// Pure cooldown gate: only handles timing.
/// No file system access, no global state.
///
/// The first accepted notification opens a cooldown window; everything
/// arriving inside the window is swallowed. Editors routinely fire
/// several notifications per save, and a reload itself can echo as a
/// change event. One reload per burst is the contract.
pub(super) struct Cooldown {
    window: Duration,
    last_accepted: Option<Instant>,
}

impl Cooldown {
    pub(super) fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: None,
        }
    }

    /// Whether a notification arriving now should trigger a reload.
    /// Accepting opens (or re-opens) the window.
    pub(super) fn accept(&mut self) -> bool {
        self.accept_at(Instant::now())
    }

    fn accept_at(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_accepted
            && now.duration_since(last) < self.window
        {
            return false;
        }
        self.last_accepted = Some(now);
        true
    }
}
