mod sse;

use std::sync::Arc;

use crate::{dao::match_store::MatchStore, services::polling::PollingService};

pub use self::sse::SseHub;

pub type SharedState = Arc<AppState>;

/// Capacity of the broadcast channel feeding SSE subscribers.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Central application state shared by the HTTP handlers.
pub struct AppState {
    store: Arc<dyn MatchStore>,
    events: Arc<SseHub>,
    polling: PollingService,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(
        store: Arc<dyn MatchStore>,
        events: Arc<SseHub>,
        polling: PollingService,
    ) -> SharedState {
        Arc::new(Self {
            store,
            events,
            polling,
        })
    }

    /// Match repository backing both loops.
    pub fn store(&self) -> &Arc<dyn MatchStore> {
        &self.store
    }

    /// Broadcast hub carrying published state changes.
    pub fn events(&self) -> &SseHub {
        &self.events
    }

    /// Start/stop surface of the tracking loops.
    pub fn polling(&self) -> &PollingService {
        &self.polling
    }
}
