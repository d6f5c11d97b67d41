//! Lifecycle of the detection and completion loops.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{Mutex, watch},
    task::JoinHandle,
    time::sleep,
};
use tracing::{debug, info, warn};

use crate::{
    dao::match_store::MatchStore,
    riot::RiotApi,
    services::{completion, detection, publisher::EventPublisher},
};

const DEFAULT_DETECTION_INTERVAL: Duration = Duration::from_secs(30);
const DEFAULT_COMPLETION_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_COMPLETION_START_DELAY: Duration = Duration::from_secs(10);
const DEFAULT_ERROR_BACKOFF_CAP: Duration = Duration::from_secs(60);

/// Pacing of the two loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    pub detection_interval: Duration,
    pub completion_interval: Duration,
    /// Delay before the first completion iteration.
    pub completion_start_delay: Duration,
    /// Upper bound on the pause after a failed iteration.
    pub error_backoff_cap: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            detection_interval: DEFAULT_DETECTION_INTERVAL,
            completion_interval: DEFAULT_COMPLETION_INTERVAL,
            completion_start_delay: DEFAULT_COMPLETION_START_DELAY,
            error_backoff_cap: DEFAULT_ERROR_BACKOFF_CAP,
        }
    }
}

impl PollingConfig {
    /// Pause applied after an iteration of a loop running every `interval` failed.
    pub fn error_backoff(&self, interval: Duration) -> Duration {
        interval.min(self.error_backoff_cap)
    }
}

/// Collaborators shared by both loops.
#[derive(Clone)]
pub struct Tracker {
    pub store: Arc<dyn MatchStore>,
    pub riot: Arc<dyn RiotApi>,
    pub publisher: Arc<dyn EventPublisher>,
}

/// Cooperative cancellation handle observed by the loops.
#[derive(Clone)]
pub struct StopSignal {
    receiver: watch::Receiver<bool>,
}

impl StopSignal {
    pub fn new(receiver: watch::Receiver<bool>) -> Self {
        Self { receiver }
    }

    /// Whether a stop was requested. A dropped controller counts as a stop.
    pub fn is_stopped(&self) -> bool {
        *self.receiver.borrow() || self.receiver.has_changed().is_err()
    }

    /// Sleep for `duration` unless a stop arrives first. Returns `true` when stopped.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        let interrupted = tokio::select! {
            _ = sleep(duration) => false,
            _ = self.receiver.wait_for(|stopped| *stopped) => true,
        };
        interrupted || self.is_stopped()
    }
}

struct RunningLoops {
    stop: watch::Sender<bool>,
    detection: JoinHandle<()>,
    completion: JoinHandle<()>,
}

/// Start/stop surface owning the two background loops.
pub struct PollingService {
    tracker: Tracker,
    config: PollingConfig,
    running: Mutex<Option<RunningLoops>>,
}

impl PollingService {
    pub fn new(
        store: Arc<dyn MatchStore>,
        riot: Arc<dyn RiotApi>,
        publisher: Arc<dyn EventPublisher>,
        config: PollingConfig,
    ) -> Self {
        Self {
            tracker: Tracker {
                store,
                riot,
                publisher,
            },
            config,
            running: Mutex::new(None),
        }
    }

    /// Spawn both loops. Returns `false` when they are already running.
    pub async fn start_polling(&self) -> bool {
        let mut running = self.running.lock().await;
        if running.is_some() {
            debug!("polling already running");
            return false;
        }

        let (stop, receiver) = watch::channel(false);
        let detection = tokio::spawn(detection::run(
            self.tracker.clone(),
            self.config,
            StopSignal::new(receiver.clone()),
        ));
        let completion = tokio::spawn(completion::run(
            self.tracker.clone(),
            self.config,
            StopSignal::new(receiver),
        ));

        *running = Some(RunningLoops {
            stop,
            detection,
            completion,
        });
        info!(
            detection_interval = ?self.config.detection_interval,
            completion_interval = ?self.config.completion_interval,
            "polling started"
        );
        true
    }

    /// Signal both loops and wait for them to finish their current record.
    ///
    /// Returns `false` when nothing was running.
    pub async fn stop_polling(&self) -> bool {
        let mut running = self.running.lock().await;
        let Some(loops) = running.take() else {
            return false;
        };

        let _ = loops.stop.send(true);
        for (task, handle) in [
            ("detection", loops.detection),
            ("completion", loops.completion),
        ] {
            if let Err(err) = handle.await {
                warn!(task, error = %err, "polling task ended abnormally");
            }
        }

        info!("polling stopped");
        true
    }

    /// Whether both loops are alive.
    pub async fn is_running(&self) -> bool {
        let running = self.running.lock().await;
        running
            .as_ref()
            .is_some_and(|loops| !loops.detection.is_finished() && !loops.completion.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::match_store::MemoryMatchStore,
        services::testing::{FakeRiot, RecordingPublisher},
    };

    fn service(store: MemoryMatchStore, riot: Arc<FakeRiot>) -> PollingService {
        PollingService::new(
            Arc::new(store),
            riot,
            Arc::new(RecordingPublisher::default()),
            PollingConfig::default(),
        )
    }

    #[test]
    fn error_backoff_is_capped() {
        let config = PollingConfig {
            error_backoff_cap: Duration::from_secs(5),
            ..PollingConfig::default()
        };
        assert_eq!(
            config.error_backoff(Duration::from_secs(30)),
            Duration::from_secs(5)
        );
        assert_eq!(
            config.error_backoff(Duration::from_secs(2)),
            Duration::from_secs(2)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stop_signal_interrupts_sleep() {
        let (stop, receiver) = watch::channel(false);
        let mut signal = StopSignal::new(receiver);

        let sleeper = tokio::spawn(async move { signal.sleep(Duration::from_secs(3600)).await });
        tokio::task::yield_now().await;
        stop.send(true).unwrap();

        assert!(sleeper.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_runs_to_completion_without_stop() {
        let (_stop, receiver) = watch::channel(false);
        let mut signal = StopSignal::new(receiver);
        assert!(!signal.sleep(Duration::from_secs(1)).await);
        assert!(!signal.is_stopped());
    }

    #[tokio::test]
    async fn dropped_controller_counts_as_stop() {
        let (stop, receiver) = watch::channel(false);
        let mut signal = StopSignal::new(receiver);
        drop(stop);
        assert!(signal.is_stopped());
        assert!(signal.sleep(Duration::from_secs(3600)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn start_and_stop_are_idempotent() {
        let service = service(MemoryMatchStore::new(), Arc::new(FakeRiot::default()));

        assert!(!service.is_running().await);
        assert!(service.start_polling().await);
        assert!(!service.start_polling().await);
        assert!(service.is_running().await);

        assert!(service.stop_polling().await);
        assert!(!service.is_running().await);
        assert!(!service.stop_polling().await);
    }

    #[tokio::test(start_paused = true)]
    async fn running_loops_detect_matches() {
        let store = MemoryMatchStore::new();
        let player = store.add_player("Faker", "KR1").await.unwrap();
        let riot = Arc::new(FakeRiot::default());
        riot.set_in_match(&player, FakeRiot::lol_snapshot("123"));

        let service = service(store.clone(), riot);
        service.start_polling().await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        service.stop_polling().await;

        let games = store.all_games().await;
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].match_id, "123");
    }
}
