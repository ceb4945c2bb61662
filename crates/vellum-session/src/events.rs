//! Host-delivered lifecycle and activity events.

/// What the embedding host reports to the session controller.
///
/// The controller is host-agnostic: it never hooks platform lifecycle
/// callbacks itself. The host observes interaction and suspend/resume
/// and forwards them over the channel returned by
/// [`SessionController::events`](crate::SessionController::events).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// User interaction occurred; restarts the idle countdown while
    /// the session is unlocked.
    Activity,
    /// The application returned to the foreground. Treated as
    /// activity, so the countdown restarts at its full duration.
    Foregrounded,
    /// The application moved to the background. The idle countdown
    /// keeps running, so the timeout can lock the session before the
    /// user returns.
    Backgrounded,
}
