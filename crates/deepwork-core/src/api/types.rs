use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One persisted study session.
///
/// `end_time` is `None` while the session is still running; `rating` is
/// filled in (1.0-5.0) when the user closes the block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyBlock {
    pub id: i64,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub rating: Option<f64>,
    pub is_countdown: bool,
    #[serde(default)]
    pub study_category_id: Option<i64>,
    #[serde(default)]
    pub daily_goal_id: Option<i64>,
}

/// Payload for `POST /study-blocks`.
#[derive(Debug, Clone, Serialize)]
pub struct NewStudyBlock {
    pub start_time: DateTime<Utc>,
    pub is_countdown: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub study_category_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_goal_id: Option<i64>,
}

/// Partial payload for `PATCH /study-blocks/{id}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StudyBlockUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

/// The streak counter: how many work intervals the user has completed
/// toward `target`. At most one counter is selected at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCounter {
    pub id: i64,
    pub target: u32,
    pub completed: u32,
    pub is_selected: bool,
}

/// Payload for `POST /session-counters`.
#[derive(Debug, Clone, Serialize)]
pub struct NewSessionCounter {
    pub target: u32,
    pub is_selected: bool,
}

/// Partial payload for `PATCH /session-counters/{id}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionCounterUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_selected: Option<bool>,
}
