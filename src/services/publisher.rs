use std::sync::Arc;

use futures::future::BoxFuture;
use thiserror::Error;
use tracing::debug;

use crate::{
    dto::{events::StateChangeEvent, sse::ServerEvent},
    state::SseHub,
};

/// Failure to hand an event to downstream consumers.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to serialize event for match `{game_id}`")]
    Serialize {
        game_id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("event channel unavailable: {0}")]
    Unavailable(String),
}

/// Sink for state-change events. Delivery is at-most-once.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: StateChangeEvent) -> BoxFuture<'static, Result<(), PublishError>>;
}

/// Publishes events on the SSE broadcast hub, named `game.start` or `game.end`.
#[derive(Clone)]
pub struct BroadcastPublisher {
    hub: Arc<SseHub>,
}

impl BroadcastPublisher {
    pub fn new(hub: Arc<SseHub>) -> Self {
        Self { hub }
    }
}

impl EventPublisher for BroadcastPublisher {
    fn publish(&self, event: StateChangeEvent) -> BoxFuture<'static, Result<(), PublishError>> {
        let hub = self.hub.clone();
        Box::pin(async move {
            let payload = ServerEvent::json(Some(event.event_name().to_string()), &event)
                .map_err(|source| PublishError::Serialize {
                    game_id: event.envelope().game_id().to_string(),
                    source,
                })?;
            let receivers = hub.broadcast(payload);
            debug!(
                event = event.event_name(),
                game_id = %event.envelope().game_id(),
                receivers,
                "published state change"
            );
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::{
        dao::models::{GameMode, NewTrackedGame, PlayerEntity, TrackedGameEntity},
        riot::QueueType,
        services::event_factory::build_event,
    };

    #[tokio::test]
    async fn events_reach_subscribers_with_their_name() {
        let hub = Arc::new(SseHub::new(4));
        let mut receiver = hub.subscribe();
        let publisher = BroadcastPublisher::new(hub);

        let player = PlayerEntity::new("Faker", "KR1");
        let game = TrackedGameEntity::from_new(
            NewTrackedGame {
                player_id: player.id,
                match_id: "77".into(),
                game_mode: GameMode::Lol,
                queue_type: QueueType::Aram,
                started_at: None,
                raw_snapshot: None,
            },
            SystemTime::now(),
        );
        let event = build_event(&player, None, &game).unwrap();

        publisher.publish(event).await.unwrap();

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.event.as_deref(), Some("game.start"));
        let body: serde_json::Value = serde_json::from_str(&received.data).unwrap();
        assert_eq!(body["game_id"], "77");
        assert_eq!(body["game_mode"], "LOL");
    }

    #[tokio::test]
    async fn publishing_without_subscribers_succeeds() {
        let publisher = BroadcastPublisher::new(Arc::new(SseHub::new(4)));
        let player = PlayerEntity::new("Faker", "KR1");
        let game = TrackedGameEntity::from_new(
            NewTrackedGame {
                player_id: player.id,
                match_id: "78".into(),
                game_mode: GameMode::Tft,
                queue_type: QueueType::TftRanked,
                started_at: None,
                raw_snapshot: None,
            },
            SystemTime::now(),
        );

        let event = build_event(&player, None, &game).unwrap();
        assert!(publisher.publish(event).await.is_ok());
    }
}
