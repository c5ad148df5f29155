use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::error::ClientError;

/// Signed-in player: the user id and the identity token the server verifies.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PuzzleView {
    pub question: String,
    pub date: NaiveDate,
    pub kind: String,
    pub difficulty: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidatePayload {
    pub firebase_uid: String,
    pub answer: String,
    #[serde(rename = "puzzleDate")]
    pub puzzle_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub correct: bool,
    pub added_score: i64,
    pub correct_answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LeaderboardRow {
    pub firebase_uid: String,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncEntry {
    pub date: NaiveDate,
    pub score: i64,
    #[serde(rename = "timeTaken", skip_serializing_if = "Option::is_none")]
    pub time_taken: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncPayload {
    pub firebase_uid: String,
    pub entries: Vec<SyncEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncAck {
    pub success: bool,
    pub synced: usize,
}

/// Server calls the game makes.
#[async_trait]
pub trait PuzzleApi: Send + Sync {
    async fn daily_puzzle(&self) -> Result<PuzzleView, ClientError>;

    async fn validate(
        &self,
        identity: &Identity,
        payload: &ValidatePayload,
    ) -> Result<Verdict, ClientError>;

    async fn leaderboard(&self) -> Result<Vec<LeaderboardRow>, ClientError>;

    async fn sync(&self, identity: &Identity, payload: &SyncPayload)
        -> Result<SyncAck, ClientError>;
}

pub struct HttpPuzzleApi {
    client: Client,
    base_url: String,
}

impl HttpPuzzleApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn json_or_error<T: serde::de::DeserializeOwned>(
        response: Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        #[derive(Deserialize)]
        struct ErrorBody {
            error: String,
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
        };
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl PuzzleApi for HttpPuzzleApi {
    async fn daily_puzzle(&self) -> Result<PuzzleView, ClientError> {
        let response = self.client.get(self.url("/api/puzzle")).send().await?;
        Self::json_or_error(response).await
    }

    async fn validate(
        &self,
        identity: &Identity,
        payload: &ValidatePayload,
    ) -> Result<Verdict, ClientError> {
        let response = self
            .client
            .post(self.url("/api/validate"))
            .bearer_auth(&identity.token)
            .json(payload)
            .send()
            .await?;
        Self::json_or_error(response).await
    }

    async fn leaderboard(&self) -> Result<Vec<LeaderboardRow>, ClientError> {
        let response = self.client.get(self.url("/api/leaderboard")).send().await?;
        Self::json_or_error(response).await
    }

    async fn sync(
        &self,
        identity: &Identity,
        payload: &SyncPayload,
    ) -> Result<SyncAck, ClientError> {
        let response = self
            .client
            .post(self.url("/api/sync"))
            .bearer_auth(&identity.token)
            .json(payload)
            .send()
            .await?;
        Self::json_or_error(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sync_payload_uses_server_field_names() {
        let payload = SyncPayload {
            firebase_uid: "u1".to_string(),
            entries: vec![
                SyncEntry {
                    date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
                    score: 10,
                    time_taken: Some(12),
                },
                SyncEntry {
                    date: NaiveDate::from_ymd_opt(2024, 3, 16).unwrap(),
                    score: 0,
                    time_taken: None,
                },
            ],
        };

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "firebase_uid": "u1",
                "entries": [
                    { "date": "2024-03-15", "score": 10, "timeTaken": 12 },
                    { "date": "2024-03-16", "score": 0 }
                ]
            })
        );
    }

    #[test]
    fn verdict_reads_camel_case() {
        let verdict: Verdict = serde_json::from_value(json!({
            "correct": true, "addedScore": 10, "correctAnswer": "object"
        }))
        .unwrap();
        assert_eq!(verdict.added_score, 10);
    }

    #[test]
    fn base_url_trailing_slash_is_ignored() {
        let config = ClientConfig {
            base_url: "http://localhost:5000/".to_string(),
            ..ClientConfig::default()
        };
        let api = HttpPuzzleApi::new(&config).unwrap();
        assert_eq!(api.url("/api/puzzle"), "http://localhost:5000/api/puzzle");
    }
}
