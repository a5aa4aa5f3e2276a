//! Study block client -- `/study-blocks` resource.

use chrono::{DateTime, Utc};

use super::client::ApiClient;
use super::traits::StudyBlockService;
use super::types::{NewStudyBlock, StudyBlock, StudyBlockUpdate};
use crate::error::ApiError;

#[derive(Debug, Clone)]
pub struct StudyBlocksApi {
    client: ApiClient,
}

impl StudyBlocksApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// All study blocks for the acting user (calendar view).
    pub async fn list(&self) -> Result<Vec<StudyBlock>, ApiError> {
        self.client.get_json("study-blocks").await
    }

    pub async fn update(&self, id: i64, update: &StudyBlockUpdate) -> Result<StudyBlock, ApiError> {
        self.client
            .patch_json(&format!("study-blocks/{id}"), update)
            .await
    }
}

impl StudyBlockService for StudyBlocksApi {
    async fn create(&self, new: NewStudyBlock) -> Result<StudyBlock, ApiError> {
        self.client.post_json("study-blocks", &new).await
    }

    async fn finish(
        &self,
        id: i64,
        end_time: DateTime<Utc>,
        rating: Option<f64>,
    ) -> Result<StudyBlock, ApiError> {
        self.update(
            id,
            &StudyBlockUpdate {
                end_time: Some(end_time),
                rating,
            },
        )
        .await
    }

    async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.client.delete(&format!("study-blocks/{id}")).await
    }
}
