//! Score entries and the two places they can go: browser storage or the
//! community spreadsheet endpoint.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod leaderboard;
pub mod remote;
pub mod store;

use remote::ScoreClient;
use store::ScoreBook;

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("Please enter a username")]
    EmptyUsername,
    #[error("Storage unavailable: {0}")]
    Storage(String),
    #[error("Could not encode scores: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid score endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    /// the endpoint answered with `{ error }`
    #[error("{0}")]
    Remote(String),
    /// the request itself failed (script load, bad payload)
    #[error("Could not reach the score server: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub username: String,
    pub score: u32,
    /// stored as `date`, the field name every schema version shares
    #[serde(default, rename = "date", alias = "recorded_at")]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl ScoreEntry {
    pub fn new(username: &str, score: u32, recorded_at: DateTime<Utc>) -> Result<Self, ScoreError> {
        Ok(ScoreEntry {
            username: validate_username(username)?,
            score,
            recorded_at: Some(recorded_at),
        })
    }
}

/// Usernames are free-form; only empty or whitespace-only names are refused.
/// Returns the trimmed name.
pub fn validate_username(raw: &str) -> Result<String, ScoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(ScoreError::EmptyUsername)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Where a finished run's score is sent
#[async_trait(?Send)]
pub trait ScoreSink {
    async fn submit(&self, game: &str, entry: ScoreEntry) -> Result<(), ScoreError>;
}

/// Keeps the top ten per game in local storage
pub struct LocalScoreSink {
    book: ScoreBook,
}

impl LocalScoreSink {
    pub fn new(book: ScoreBook) -> Self {
        LocalScoreSink { book }
    }
}

#[async_trait(?Send)]
impl ScoreSink for LocalScoreSink {
    async fn submit(&self, game: &str, entry: ScoreEntry) -> Result<(), ScoreError> {
        let ranked = self.book.record(game, entry)?;
        log::info!("{} now keeps {} local scores", game, ranked.len());
        Ok(())
    }
}

/// Posts to the spreadsheet endpoint over JSONP
pub struct RemoteScoreSink {
    client: ScoreClient,
}

impl RemoteScoreSink {
    pub fn new(client: ScoreClient) -> Self {
        RemoteScoreSink { client }
    }
}

#[async_trait(?Send)]
impl ScoreSink for RemoteScoreSink {
    async fn submit(&self, game: &str, entry: ScoreEntry) -> Result<(), ScoreError> {
        self.client.submit(game, &entry).await
    }
}

#[cfg(test)]
mod tests {
    use super::store::{KeyValueStore, MemoryStore};
    use super::*;
    use chrono::TimeZone;
    use futures::executor::block_on;
    use std::rc::Rc;

    #[test]
    fn whitespace_names_are_rejected_and_others_trimmed() {
        assert!(matches!(
            validate_username("   \t"),
            Err(ScoreError::EmptyUsername)
        ));
        assert_eq!(validate_username("  ada ").unwrap(), "ada");
    }

    #[test]
    fn local_sink_records_through_the_book() {
        let store = Rc::new(MemoryStore::default());
        let sink = LocalScoreSink::new(ScoreBook::new(store.clone(), store::SCORES_KEY));
        let entry = ScoreEntry::new("ada", 12, Utc::now()).unwrap();
        block_on(sink.submit("snake", entry)).unwrap();
        assert!(store.get(store::SCORES_KEY).unwrap().unwrap().contains("ada"));
    }

    #[test]
    fn local_sink_refuses_blank_names_without_writing() {
        let store = Rc::new(MemoryStore::default());
        let sink = LocalScoreSink::new(ScoreBook::new(store.clone(), store::SCORES_KEY));
        let entry = ScoreEntry {
            username: "  ".into(),
            score: 5,
            recorded_at: None,
        };
        let result = block_on(sink.submit("snake", entry));
        assert!(matches!(result, Err(ScoreError::EmptyUsername)));
        assert_eq!(store.get(store::SCORES_KEY).unwrap(), None);
    }

    #[test]
    fn entries_store_their_time_as_date() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let entry = ScoreEntry::new("ada", 3, at).unwrap();
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["date"], "2024-03-01T10:00:00Z");
        assert!(json.get("recorded_at").is_none());

        let read: ScoreEntry =
            serde_json::from_str(r#"{"username":"ada","score":3,"date":"2024-03-01T10:00:00Z"}"#)
                .unwrap();
        assert_eq!(read, entry);
    }
}
