//! Badge criteria
//! Mission: Map each criteria tag to a predicate over a user's history

use crate::models::HistorySnapshot;
use std::fmt;

const COMPLETED_SESSIONS_TARGET: u32 = 10;
const VALIDATED_SESSIONS_TARGET: u32 = 10;

/// Criteria tag stored on a badge definition.
///
/// Tags that do not match a known predicate are kept as `Unknown` so a typo
/// in a badge definition stays visible instead of failing to load.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CriteriaTag {
    FirstSession,
    Complete10Sessions,
    NightDriving,
    HighwayDriving,
    MasterParking,
    MasterEcoDriving,
    Validate10Sessions,
    CompleteRoadbook,
    Unknown(String),
}

impl CriteriaTag {
    pub const KNOWN: [CriteriaTag; 8] = [
        CriteriaTag::FirstSession,
        CriteriaTag::Complete10Sessions,
        CriteriaTag::NightDriving,
        CriteriaTag::HighwayDriving,
        CriteriaTag::MasterParking,
        CriteriaTag::MasterEcoDriving,
        CriteriaTag::Validate10Sessions,
        CriteriaTag::CompleteRoadbook,
    ];

    pub fn parse(tag: &str) -> Self {
        match tag.trim() {
            "FIRST_SESSION" => CriteriaTag::FirstSession,
            "COMPLETE_10_SESSIONS" => CriteriaTag::Complete10Sessions,
            "NIGHT_DRIVING" => CriteriaTag::NightDriving,
            "HIGHWAY_DRIVING" => CriteriaTag::HighwayDriving,
            "MASTER_PARKING" => CriteriaTag::MasterParking,
            "MASTER_ECO_DRIVING" => CriteriaTag::MasterEcoDriving,
            "VALIDATE_10_SESSIONS" => CriteriaTag::Validate10Sessions,
            "COMPLETE_ROADBOOK" => CriteriaTag::CompleteRoadbook,
            other => CriteriaTag::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CriteriaTag::FirstSession => "FIRST_SESSION",
            CriteriaTag::Complete10Sessions => "COMPLETE_10_SESSIONS",
            CriteriaTag::NightDriving => "NIGHT_DRIVING",
            CriteriaTag::HighwayDriving => "HIGHWAY_DRIVING",
            CriteriaTag::MasterParking => "MASTER_PARKING",
            CriteriaTag::MasterEcoDriving => "MASTER_ECO_DRIVING",
            CriteriaTag::Validate10Sessions => "VALIDATE_10_SESSIONS",
            CriteriaTag::CompleteRoadbook => "COMPLETE_ROADBOOK",
            CriteriaTag::Unknown(tag) => tag,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, CriteriaTag::Unknown(_))
    }

    /// Evaluate the predicate. Unknown tags are never satisfied.
    pub fn is_satisfied(&self, history: &HistorySnapshot) -> bool {
        match self {
            CriteriaTag::FirstSession => history.sessions >= 1,
            CriteriaTag::Complete10Sessions => {
                history.completed_sessions >= COMPLETED_SESSIONS_TARGET
            }
            CriteriaTag::NightDriving => history.night_sessions >= 1,
            CriteriaTag::HighwayDriving => history.highway_sessions >= 1,
            CriteriaTag::MasterParking => history.mastered_parking >= 1,
            CriteriaTag::MasterEcoDriving => {
                history.eco_competencies > 0 && history.eco_mastered >= history.eco_competencies
            }
            CriteriaTag::Validate10Sessions => {
                history.validated_sessions >= VALIDATED_SESSIONS_TARGET
            }
            CriteriaTag::CompleteRoadbook => history.completed_roadbooks >= 1,
            CriteriaTag::Unknown(_) => false,
        }
    }
}

impl fmt::Display for CriteriaTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
