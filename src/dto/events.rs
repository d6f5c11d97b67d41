use serde::Serialize;
use uuid::Uuid;

use crate::{dao::models::GameMode, riot::QueueType};

/// Whether a player is in a match, from the consumer's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerStatus {
    /// Idle, or between matches.
    NotInMatch,
    /// Inside a live match.
    InMatch,
}

/// Who the event is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerIdentity {
    /// Tracked player identifier.
    pub player_id: Uuid,
    /// Riot ID name part.
    pub game_name: String,
    /// Riot ID tag part, without the `#`.
    pub tag_line: String,
}

/// Player and match an event refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventSubject {
    /// Player whose status changed.
    pub player: PlayerIdentity,
    /// Upstream match identifier.
    pub game_id: String,
    /// Queue the match was played in.
    pub queue_type: QueueType,
}

/// Fields shared by every state-change event.
///
/// Only built through the start and end constructors of the mode events, so the status pair,
/// the start/end flags and the duration always agree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventEnvelope {
    #[serde(flatten)]
    subject: EventSubject,
    previous_status: PlayerStatus,
    new_status: PlayerStatus,
    changed_at: String,
    is_game_start: bool,
    is_game_end: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_seconds: Option<u32>,
}

impl EventEnvelope {
    fn start(subject: EventSubject, changed_at: String) -> Self {
        Self {
            subject,
            previous_status: PlayerStatus::NotInMatch,
            new_status: PlayerStatus::InMatch,
            changed_at,
            is_game_start: true,
            is_game_end: false,
            duration_seconds: None,
        }
    }

    fn end(subject: EventSubject, changed_at: String, duration_seconds: u32) -> Self {
        Self {
            subject,
            previous_status: PlayerStatus::InMatch,
            new_status: PlayerStatus::NotInMatch,
            changed_at,
            is_game_start: false,
            is_game_end: true,
            duration_seconds: Some(duration_seconds),
        }
    }

    pub fn player(&self) -> &PlayerIdentity {
        &self.subject.player
    }

    pub fn game_id(&self) -> &str {
        &self.subject.game_id
    }

    pub fn queue_type(&self) -> QueueType {
        self.subject.queue_type
    }

    /// Status before the transition.
    pub fn previous_status(&self) -> PlayerStatus {
        self.previous_status
    }

    /// Status after the transition.
    pub fn new_status(&self) -> PlayerStatus {
        self.new_status
    }

    /// RFC 3339 timestamp of the transition.
    pub fn changed_at(&self) -> &str {
        &self.changed_at
    }

    pub fn is_game_start(&self) -> bool {
        self.is_game_start
    }

    pub fn is_game_end(&self) -> bool {
        self.is_game_end
    }

    /// Match length, present on end events only.
    pub fn duration_seconds(&self) -> Option<u32> {
        self.duration_seconds
    }
}

/// League outcome carried by an end event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LolOutcome {
    /// Whether the player's team won.
    pub won: bool,
    /// Champion the player picked.
    pub champion_played: String,
}

/// TFT outcome carried by an end event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TftOutcome {
    placement: u8,
    won: bool,
}

impl TftOutcome {
    /// Top-four placements count as a win.
    pub fn new(placement: u8) -> Self {
        Self {
            placement,
            won: (1..=4).contains(&placement),
        }
    }

    pub fn placement(&self) -> u8 {
        self.placement
    }

    pub fn won(&self) -> bool {
        self.won
    }
}

/// League transition. End events always carry their outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LolGameEvent {
    #[serde(flatten)]
    envelope: EventEnvelope,
    #[serde(flatten)]
    outcome: Option<LolOutcome>,
}

impl LolGameEvent {
    /// Player entered the match.
    pub fn start(subject: EventSubject, changed_at: String) -> Self {
        Self {
            envelope: EventEnvelope::start(subject, changed_at),
            outcome: None,
        }
    }

    /// Player left the match with a verified outcome.
    pub fn end(
        subject: EventSubject,
        changed_at: String,
        duration_seconds: u32,
        outcome: LolOutcome,
    ) -> Self {
        Self {
            envelope: EventEnvelope::end(subject, changed_at, duration_seconds),
            outcome: Some(outcome),
        }
    }

    pub fn envelope(&self) -> &EventEnvelope {
        &self.envelope
    }

    pub fn outcome(&self) -> Option<&LolOutcome> {
        self.outcome.as_ref()
    }
}

/// TFT transition. End events always carry their outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TftGameEvent {
    #[serde(flatten)]
    envelope: EventEnvelope,
    #[serde(flatten)]
    outcome: Option<TftOutcome>,
}

impl TftGameEvent {
    /// Player entered the match.
    pub fn start(subject: EventSubject, changed_at: String) -> Self {
        Self {
            envelope: EventEnvelope::start(subject, changed_at),
            outcome: None,
        }
    }

    /// Player left the match with a verified outcome.
    pub fn end(
        subject: EventSubject,
        changed_at: String,
        duration_seconds: u32,
        outcome: TftOutcome,
    ) -> Self {
        Self {
            envelope: EventEnvelope::end(subject, changed_at, duration_seconds),
            outcome: Some(outcome),
        }
    }

    pub fn envelope(&self) -> &EventEnvelope {
        &self.envelope
    }

    pub fn outcome(&self) -> Option<&TftOutcome> {
        self.outcome.as_ref()
    }
}

/// Event published for every match start and end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "game_mode", rename_all = "UPPERCASE")]
pub enum StateChangeEvent {
    /// League of Legends transition.
    Lol(LolGameEvent),
    /// Teamfight Tactics transition.
    Tft(TftGameEvent),
}

impl StateChangeEvent {
    pub fn envelope(&self) -> &EventEnvelope {
        match self {
            StateChangeEvent::Lol(event) => event.envelope(),
            StateChangeEvent::Tft(event) => event.envelope(),
        }
    }

    pub fn game_mode(&self) -> GameMode {
        match self {
            StateChangeEvent::Lol(_) => GameMode::Lol,
            StateChangeEvent::Tft(_) => GameMode::Tft,
        }
    }

    pub fn is_start(&self) -> bool {
        self.envelope().is_game_start()
    }

    pub fn is_end(&self) -> bool {
        self.envelope().is_game_end()
    }

    /// Event name used on the SSE stream.
    pub fn event_name(&self) -> &'static str {
        if self.is_start() {
            "game.start"
        } else {
            "game.end"
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn subject() -> EventSubject {
        EventSubject {
            player: PlayerIdentity {
                player_id: Uuid::nil(),
                game_name: "Faker".into(),
                tag_line: "KR1".into(),
            },
            game_id: "123".into(),
            queue_type: QueueType::RankedSoloDuo,
        }
    }

    fn to_json(event: StateChangeEvent) -> Value {
        serde_json::to_value(event).unwrap()
    }

    #[test]
    fn lol_end_event_always_serializes_its_result() {
        let value = to_json(StateChangeEvent::Lol(LolGameEvent::end(
            subject(),
            "2024-01-01T00:30:00Z".into(),
            1800,
            LolOutcome {
                won: false,
                champion_played: "Ahri".into(),
            },
        )));

        assert_eq!(value["game_mode"], json!("LOL"));
        assert_eq!(value["is_game_end"], json!(true));
        assert_eq!(value["is_game_start"], json!(false));
        assert_eq!(value["previous_status"], json!("IN_MATCH"));
        assert_eq!(value["new_status"], json!("NOT_IN_MATCH"));
        assert_eq!(value["duration_seconds"], json!(1800));
        assert_eq!(value["won"], json!(false));
        assert_eq!(value["champion_played"], json!("Ahri"));
        assert_eq!(value["player"]["tag_line"], json!("KR1"));
    }

    #[test]
    fn tft_end_event_always_serializes_its_result() {
        let value = to_json(StateChangeEvent::Tft(TftGameEvent::end(
            subject(),
            "2024-01-01T00:35:00Z".into(),
            2100,
            TftOutcome::new(4),
        )));

        assert_eq!(value["is_game_end"], json!(true));
        assert_eq!(value["duration_seconds"], json!(2100));
        assert_eq!(value["placement"], json!(4));
        assert_eq!(value["won"], json!(true));
    }

    #[test]
    fn start_event_has_no_result_fields() {
        let value = to_json(StateChangeEvent::Lol(LolGameEvent::start(
            subject(),
            "2024-01-01T00:00:00Z".into(),
        )));
        let fields = value.as_object().unwrap();

        assert_eq!(value["is_game_start"], json!(true));
        assert_eq!(value["new_status"], json!("IN_MATCH"));
        for absent in ["duration_seconds", "won", "champion_played", "placement"] {
            assert!(!fields.contains_key(absent), "{absent} set on a start event");
        }
    }

    #[test]
    fn tft_win_is_derived_from_placement() {
        assert!(TftOutcome::new(1).won());
        assert!(!TftOutcome::new(5).won());
    }
}
