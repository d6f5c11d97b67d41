//! Mapping from numeric Riot queue ids to symbolic queue types.

use serde::{Deserialize, Serialize};

/// Symbolic queue a tracked game was played in.
///
/// Unrecognised ids map to [`QueueType::Unknown`] so new queues never break the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueType {
    Custom,
    NormalDraft,
    RankedSoloDuo,
    NormalBlind,
    RankedFlex,
    Aram,
    Quickplay,
    Clash,
    AramClash,
    Bots,
    Urf,
    OneForAll,
    Arena,
    TftNormal,
    TftRanked,
    TftTutorial,
    TftHyperRoll,
    TftDoubleUp,
    #[serde(other)]
    Unknown,
}

impl QueueType {
    /// Resolve a queue id as reported by the spectator and match endpoints.
    pub fn from_id(id: i64) -> Self {
        match id {
            0 => QueueType::Custom,
            400 => QueueType::NormalDraft,
            420 => QueueType::RankedSoloDuo,
            430 => QueueType::NormalBlind,
            440 => QueueType::RankedFlex,
            450 => QueueType::Aram,
            490 => QueueType::Quickplay,
            700 => QueueType::Clash,
            720 => QueueType::AramClash,
            830 | 840 | 850 | 870 | 880 | 890 => QueueType::Bots,
            900 | 1900 => QueueType::Urf,
            1020 => QueueType::OneForAll,
            1700 => QueueType::Arena,
            1090 => QueueType::TftNormal,
            1100 => QueueType::TftRanked,
            1110 => QueueType::TftTutorial,
            1130 => QueueType::TftHyperRoll,
            1160 => QueueType::TftDoubleUp,
            _ => QueueType::Unknown,
        }
    }

    /// Whether the queue affects ranked standings.
    pub fn is_ranked(self) -> bool {
        matches!(
            self,
            QueueType::RankedSoloDuo | QueueType::RankedFlex | QueueType::TftRanked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranked_queues_are_flagged() {
        assert!(QueueType::RankedFlex.is_ranked());
        assert!(QueueType::TftRanked.is_ranked());
        assert!(!QueueType::Aram.is_ranked());
        assert!(!QueueType::from_id(9999).is_ranked());
    }

    #[test]
    fn known_ids_resolve() {
        assert_eq!(QueueType::from_id(420), QueueType::RankedSoloDuo);
        assert_eq!(QueueType::from_id(450), QueueType::Aram);
        assert_eq!(QueueType::from_id(1100), QueueType::TftRanked);
        assert_eq!(QueueType::from_id(1160), QueueType::TftDoubleUp);
    }

    #[test]
    fn unknown_ids_fall_back() {
        assert_eq!(QueueType::from_id(-1), QueueType::Unknown);
        assert_eq!(QueueType::from_id(31337), QueueType::Unknown);
    }

    #[test]
    fn serializes_as_screaming_snake_case() {
        let json = serde_json::to_string(&QueueType::RankedSoloDuo).unwrap();
        assert_eq!(json, "\"RANKED_SOLO_DUO\"");

        let parsed: QueueType = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(parsed, QueueType::Unknown);
    }
}
