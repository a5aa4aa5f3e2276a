use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{TimerMode, TimerState};

/// Every timer state change produces an Event.
/// The CLI prints them; UI surfaces may subscribe via the state watch channel
/// and treat events as a transition log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        mode: TimerMode,
        study_block_id: i64,
        /// Countdown target in seconds; absent for open sessions.
        duration_secs: Option<u64>,
        at: DateTime<Utc>,
    },
    TimerPaused {
        time_secs: u64,
        is_break: bool,
        at: DateTime<Utc>,
    },
    TimerResumed {
        time_secs: u64,
        at: DateTime<Utc>,
    },
    /// A work interval ran out and a configured break began.
    BreakStarted {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// A break ran out; the streak counter was credited and a new work
    /// interval began.
    BreakFinished {
        work_duration_secs: u64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        study_block_id: i64,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        at: DateTime<Utc>,
    },
}
