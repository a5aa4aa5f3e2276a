use chrono::{DateTime, Utc};

use super::types::{NewStudyBlock, SessionCounter, StudyBlock};
use crate::error::ApiError;

/// Session-record collaborator consumed by the timer controller.
///
/// The real implementation is [`super::StudyBlocksApi`]; controller tests
/// substitute an in-memory fake.
#[allow(async_fn_in_trait)]
pub trait StudyBlockService {
    /// Create a study block and return the persisted record.
    async fn create(&self, new: NewStudyBlock) -> Result<StudyBlock, ApiError>;

    /// Close a study block: set its end time and optional rating.
    async fn finish(
        &self,
        id: i64,
        end_time: DateTime<Utc>,
        rating: Option<f64>,
    ) -> Result<StudyBlock, ApiError>;

    /// Discard a study block entirely.
    async fn delete(&self, id: i64) -> Result<(), ApiError>;
}

/// Streak-counter collaborator consumed by the timer controller.
#[allow(async_fn_in_trait)]
pub trait SessionCounterService {
    /// The currently selected counter, if any.
    async fn selected(&self) -> Result<Option<SessionCounter>, ApiError>;

    /// Credit one completed work interval to the selected counter.
    /// No-op (returns `None`) when no counter is selected.
    async fn credit(&self) -> Result<Option<SessionCounter>, ApiError>;
}
