use crate::browser;
use crate::scores::leaderboard::Leaderboard;
use crate::scores::{ScoreEntry, ScoreError};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;
use wasm_bindgen::JsValue;

/// `type=` discriminator understood by the endpoint
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RequestType {
    Constants,
    NameLeaderboard,
}

impl RequestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Constants => "GET_CONSTANTS",
            RequestType::NameLeaderboard => "NAME_LEADERBOARD",
        }
    }
}

/// A GET against the endpoint whose callback name is only known when the
/// request is sent
#[derive(Debug, Clone, PartialEq)]
pub struct JsonpRequest {
    endpoint: Url,
    params: Vec<(String, String)>,
}

impl JsonpRequest {
    fn new(endpoint: &Url) -> Self {
        JsonpRequest {
            endpoint: endpoint.clone(),
            params: Vec::new(),
        }
    }

    fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.push((key.to_string(), value.into()));
        self
    }

    /// `{endpoint}?callback=<callback>&<params...>`, form-encoded
    pub fn url(&self, callback: &str) -> String {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("callback", callback);
            for (key, value) in &self.params {
                query.append_pair(key, value);
            }
        }
        url.into()
    }
}

/// `{ success: true }` or `{ error: "..." }`
#[derive(Debug, Default, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

impl SubmitResponse {
    pub fn into_result(self) -> Result<(), ScoreError> {
        match (self.error, self.success) {
            (Some(error), _) => Err(ScoreError::Remote(error)),
            (None, true) => Ok(()),
            (None, false) => Err(ScoreError::Remote(
                "The score server did not confirm the submission".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LeaderboardResponse {
    Failed { error: String },
    Snapshot(Leaderboard),
}

/// Client for the community spreadsheet endpoint. Nothing is cached, every
/// call goes to the network.
#[derive(Debug, Clone)]
pub struct ScoreClient {
    endpoint: Url,
}

impl ScoreClient {
    pub fn new(endpoint: &str) -> Result<Self, ScoreError> {
        Ok(ScoreClient {
            endpoint: Url::parse(endpoint)?,
        })
    }

    pub fn submit_request(&self, game: &str, entry: &ScoreEntry) -> JsonpRequest {
        JsonpRequest::new(&self.endpoint)
            .param("gameName", game)
            .param("username", entry.username.as_str())
            .param("score", entry.score.to_string())
    }

    pub fn leaderboard_request(&self, kind: Option<RequestType>) -> JsonpRequest {
        let request = JsonpRequest::new(&self.endpoint);
        match kind {
            Some(kind) => request.param("type", kind.as_str()),
            None => request,
        }
    }

    pub async fn submit(&self, game: &str, entry: &ScoreEntry) -> Result<(), ScoreError> {
        log::info!("Submitting {} for {} to the score server", entry.score, game);
        let response: SubmitResponse = self.fetch(self.submit_request(game, entry)).await?;
        response.into_result()
    }

    /// Per-game scores
    pub async fn leaderboard(&self) -> Result<Leaderboard, ScoreError> {
        self.fetch_board(None).await
    }

    /// Scores grouped the way the name ranking page shows them
    pub async fn name_leaderboard(&self) -> Result<Leaderboard, ScoreError> {
        self.fetch_board(Some(RequestType::NameLeaderboard)).await
    }

    /// Site constants kept in the spreadsheet, passed through untyped
    pub async fn constants(&self) -> Result<serde_json::Value, ScoreError> {
        self.fetch(self.leaderboard_request(Some(RequestType::Constants)))
            .await
    }

    async fn fetch_board(&self, kind: Option<RequestType>) -> Result<Leaderboard, ScoreError> {
        match self.fetch(self.leaderboard_request(kind)).await? {
            LeaderboardResponse::Snapshot(board) => Ok(board),
            LeaderboardResponse::Failed { error } => Err(ScoreError::Remote(error)),
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, request: JsonpRequest) -> Result<T, ScoreError> {
        let value: JsValue = browser::jsonp(|callback| request.url(callback))
            .await
            .map_err(|err| ScoreError::Transport(format!("{:#}", err)))?;
        serde_wasm_bindgen::from_value(value).map_err(|err| ScoreError::Transport(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENDPOINT: &str = "https://script.example.com/macros/s/abc/exec";

    fn entry(name: &str, score: u32) -> ScoreEntry {
        ScoreEntry {
            username: name.into(),
            score,
            recorded_at: None,
        }
    }

    #[test]
    fn submission_url_puts_callback_first() {
        let client = ScoreClient::new(ENDPOINT).unwrap();
        let url = client
            .submit_request("snake", &entry("ada", 42))
            .url("__arcadeJsonp7");
        assert_eq!(
            url,
            format!(
                "{}?callback=__arcadeJsonp7&gameName=snake&username=ada&score=42",
                ENDPOINT
            )
        );
    }

    #[test]
    fn usernames_are_encoded() {
        let client = ScoreClient::new(ENDPOINT).unwrap();
        let url = client
            .submit_request("pong", &entry("a&b c", 1))
            .url("cb");
        assert!(url.contains("username=a%26b+c"));
    }

    #[test]
    fn leaderboard_type_is_appended() {
        let client = ScoreClient::new(ENDPOINT).unwrap();
        assert_eq!(
            client.leaderboard_request(None).url("cb"),
            format!("{}?callback=cb", ENDPOINT)
        );
        assert!(client
            .leaderboard_request(Some(RequestType::NameLeaderboard))
            .url("cb")
            .ends_with("callback=cb&type=NAME_LEADERBOARD"));
    }

    #[test]
    fn bad_endpoints_are_refused() {
        assert!(matches!(
            ScoreClient::new("not a url"),
            Err(ScoreError::Endpoint(_))
        ));
    }

    #[test]
    fn submit_responses_map_to_results() {
        let ok: SubmitResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(ok.into_result().is_ok());

        let failed: SubmitResponse = serde_json::from_str(r#"{"error": "sheet locked"}"#).unwrap();
        match failed.into_result() {
            Err(ScoreError::Remote(message)) => assert_eq!(message, "sheet locked"),
            other => panic!("unexpected {:?}", other),
        }

        let empty: SubmitResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.into_result().is_err());
    }

    #[test]
    fn leaderboard_errors_are_recognised() {
        let parsed: LeaderboardResponse = serde_json::from_str(r#"{"error": "quota"}"#).unwrap();
        assert!(matches!(parsed, LeaderboardResponse::Failed { .. }));
        let parsed: LeaderboardResponse =
            serde_json::from_str(r#"{"snake": [{"username": "a", "score": 1}]}"#).unwrap();
        assert!(matches!(parsed, LeaderboardResponse::Snapshot(_)));
    }
}
