//! Hysteresis gate.
//!
//! Load sampled several times a second is noisy. A transition is only
//! accepted once the cooldown window has elapsed since the previous
//! accepted one, so a single spike or dip cannot flap units.

use std::time::Duration;

use tokio::time::Instant;

/// Whether a transition at `now` is allowed.
///
/// `last_transition` is `None` until the first transition is accepted, which
/// always passes.
pub fn allow(now: Instant, last_transition: Option<Instant>, cooldown: Duration) -> bool {
    match last_transition {
        None => true,
        Some(last) => now.saturating_duration_since(last) >= cooldown,
    }
}
