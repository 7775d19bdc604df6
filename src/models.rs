//! Driving history inputs
//!
//! Sessions, competency progress and roadbooks are owned by the logbook CRUD
//! surface; badge evaluation only reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Daylight {
    Day,
    Night,
    DawnDusk,
}

impl Daylight {
    pub fn as_str(&self) -> &'static str {
        match self {
            Daylight::Day => "DAY",
            Daylight::Night => "NIGHT",
            Daylight::DawnDusk => "DAWN_DUSK",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoadType {
    Urban,
    Rural,
    Highway,
    Mountain,
}

impl RoadType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoadType::Urban => "URBAN",
            RoadType::Rural => "RURAL",
            RoadType::Highway => "HIGHWAY",
            RoadType::Mountain => "MOUNTAIN",
        }
    }
}

/// A logged driving session
#[derive(Debug, Clone)]
pub struct DrivingSession {
    pub id: Uuid,
    pub apprentice_id: Uuid,
    pub roadbook_id: Option<Uuid>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub daylight: Daylight,
    pub road_types: Vec<RoadType>,
    pub validator_id: Option<Uuid>,
}

impl DrivingSession {
    /// A finished daytime session with no road types recorded
    pub fn completed(apprentice_id: Uuid, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            apprentice_id,
            roadbook_id: None,
            started_at,
            ended_at: Some(started_at + chrono::Duration::hours(1)),
            daylight: Daylight::Day,
            road_types: Vec::new(),
            validator_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompetencyCategory {
    VehicleControl,
    Maneuvering,
    TrafficRules,
    EcofriendlyDriving,
    RiskAwareness,
}

impl CompetencyCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompetencyCategory::VehicleControl => "VEHICLE_CONTROL",
            CompetencyCategory::Maneuvering => "MANEUVERING",
            CompetencyCategory::TrafficRules => "TRAFFIC_RULES",
            CompetencyCategory::EcofriendlyDriving => "ECOFRIENDLY_DRIVING",
            CompetencyCategory::RiskAwareness => "RISK_AWARENESS",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Competency {
    pub id: Uuid,
    pub name: String,
    pub category: CompetencyCategory,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompetencyStatus {
    NotStarted,
    InProgress,
    Mastered,
}

impl CompetencyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompetencyStatus::NotStarted => "NOT_STARTED",
            CompetencyStatus::InProgress => "IN_PROGRESS",
            CompetencyStatus::Mastered => "MASTERED",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoadBookStatus {
    Active,
    Completed,
    Archived,
}

impl RoadBookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoadBookStatus::Active => "ACTIVE",
            RoadBookStatus::Completed => "COMPLETED",
            RoadBookStatus::Archived => "ARCHIVED",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoadBook {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub status: RoadBookStatus,
}

/// Aggregated view of one user's history, the only input badge criteria see
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistorySnapshot {
    pub sessions: u32,
    pub completed_sessions: u32,
    pub night_sessions: u32,
    pub highway_sessions: u32,
    pub validated_sessions: u32,
    pub completed_roadbooks: u32,
    pub mastered_parking: u32,
    pub eco_competencies: u32,
    pub eco_mastered: u32,
}
