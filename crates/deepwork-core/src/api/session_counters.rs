//! Session counter client -- `/session-counters` resource.

use super::client::ApiClient;
use super::traits::SessionCounterService;
use super::types::{NewSessionCounter, SessionCounter, SessionCounterUpdate};
use crate::error::ApiError;

#[derive(Debug, Clone)]
pub struct SessionCountersApi {
    client: ApiClient,
}

impl SessionCountersApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<SessionCounter>, ApiError> {
        self.client.get_json("session-counters").await
    }

    pub async fn create(&self, new: &NewSessionCounter) -> Result<SessionCounter, ApiError> {
        self.client.post_json("session-counters", new).await
    }

    pub async fn update(
        &self,
        id: i64,
        update: &SessionCounterUpdate,
    ) -> Result<SessionCounter, ApiError> {
        self.client
            .patch_json(&format!("session-counters/{id}"), update)
            .await
    }

    /// Zero out the completed count on the selected counter.
    pub async fn reset(&self) -> Result<Option<SessionCounter>, ApiError> {
        let Some(counter) = self.selected().await? else {
            return Ok(None);
        };
        let updated = self
            .update(
                counter.id,
                &SessionCounterUpdate {
                    completed: Some(0),
                    ..Default::default()
                },
            )
            .await?;
        Ok(Some(updated))
    }
}

impl SessionCounterService for SessionCountersApi {
    async fn selected(&self) -> Result<Option<SessionCounter>, ApiError> {
        let counters = self.list().await?;
        Ok(counters.into_iter().find(|c| c.is_selected))
    }

    async fn credit(&self) -> Result<Option<SessionCounter>, ApiError> {
        let Some(counter) = self.selected().await? else {
            return Ok(None);
        };
        // Completion past the target keeps counting; the UI caps the dots.
        let updated = self
            .update(
                counter.id,
                &SessionCounterUpdate {
                    completed: Some(counter.completed + 1),
                    ..Default::default()
                },
            )
            .await?;
        Ok(Some(updated))
    }
}
