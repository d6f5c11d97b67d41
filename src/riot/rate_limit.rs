use std::time::Duration;

use tokio::{
    sync::Mutex,
    time::{Instant, sleep_until},
};
use tracing::debug;

/// Process-wide fixed-interval limiter shared by every outbound request.
///
/// Callers queue on a single gate: each request starts at least `min_delay` after the
/// previous one, and never before a cooldown recorded from a throttling response.
pub struct RateLimiter {
    min_delay: Duration,
    gate: Mutex<LimiterState>,
}

#[derive(Default)]
struct LimiterState {
    last_request: Option<Instant>,
    cooldown_until: Option<Instant>,
}

impl RateLimiter {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            gate: Mutex::new(LimiterState::default()),
        }
    }

    /// Wait for this caller's turn and claim the next request slot.
    pub async fn acquire(&self) {
        let mut state = self.gate.lock().await;

        let spacing = state.last_request.map(|last| last + self.min_delay);
        let ready_at = match (spacing, state.cooldown_until) {
            (Some(spacing), Some(cooldown)) => Some(spacing.max(cooldown)),
            (spacing, cooldown) => spacing.or(cooldown),
        };

        if let Some(ready_at) = ready_at {
            if ready_at > Instant::now() {
                debug!(
                    wait_ms = (ready_at - Instant::now()).as_millis() as u64,
                    "waiting for Riot API request slot"
                );
                // The gate stays locked while sleeping so queued callers keep their order.
                sleep_until(ready_at).await;
            }
        }

        let now = Instant::now();
        if state.cooldown_until.is_some_and(|until| until <= now) {
            state.cooldown_until = None;
        }
        state.last_request = Some(now);
    }

    /// Block every subsequent request until `retry_after` has elapsed.
    pub async fn cool_down(&self, retry_after: Duration) {
        let until = Instant::now() + retry_after;
        let mut state = self.gate.lock().await;
        state.cooldown_until = Some(match state.cooldown_until {
            Some(existing) => existing.max(until),
            None => until,
        });
    }
}
