use crate::browser;
use crate::engine::viewport::DEFAULT_CANVAS_FRACTION;
use crate::scores::store::SCORES_KEY;
use serde::Deserialize;

pub const CONFIG_PATH: &str = "arcade.json";

/// Settings read from `arcade.json` next to the page. Every field is
/// optional; a missing or broken file means the defaults below.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArcadeConfig {
    /// JSONP spreadsheet endpoint. Without one, scores stay in local storage.
    pub score_endpoint: Option<String>,
    pub storage_key: String,
    /// share of the window the canvas may cover
    pub canvas_fraction: f32,
    pub logo_path: String,
    /// fixed seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for ArcadeConfig {
    fn default() -> Self {
        ArcadeConfig {
            score_endpoint: None,
            storage_key: SCORES_KEY.to_string(),
            canvas_fraction: DEFAULT_CANVAS_FRACTION,
            logo_path: "logo.png".to_string(),
            seed: None,
        }
    }
}

impl ArcadeConfig {
    pub async fn load() -> ArcadeConfig {
        match browser::fetch_json::<ArcadeConfig>(CONFIG_PATH).await {
            Ok(config) => config.sanitized(),
            Err(err) => {
                log::warn!("Using default settings, {} not loaded: {:#}", CONFIG_PATH, err);
                ArcadeConfig::default()
            }
        }
    }

    /// Blank endpoints count as none; the canvas fraction is kept in (0, 1]
    pub fn sanitized(mut self) -> Self {
        if self
            .score_endpoint
            .as_deref()
            .map_or(false, |endpoint| endpoint.trim().is_empty())
        {
            self.score_endpoint = None;
        }
        if !(self.canvas_fraction > 0.0 && self.canvas_fraction <= 1.0) {
            self.canvas_fraction = DEFAULT_CANVAS_FRACTION;
        }
        if self.storage_key.trim().is_empty() {
            self.storage_key = SCORES_KEY.to_string();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_all_defaults() {
        let config: ArcadeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ArcadeConfig::default());
        assert_eq!(config.storage_key, "minigameScores");
    }

    #[test]
    fn fields_are_camel_case() {
        let config: ArcadeConfig = serde_json::from_str(
            r#"{"scoreEndpoint": "https://example.com/exec", "canvasFraction": 0.75, "seed": 42}"#,
        )
        .unwrap();
        assert_eq!(config.score_endpoint.as_deref(), Some("https://example.com/exec"));
        assert_eq!(config.canvas_fraction, 0.75);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.logo_path, "logo.png");
    }

    #[test]
    fn nonsense_values_fall_back() {
        let config = ArcadeConfig {
            score_endpoint: Some("  ".into()),
            canvas_fraction: 3.0,
            storage_key: String::new(),
            ..ArcadeConfig::default()
        }
        .sanitized();
        assert_eq!(config, ArcadeConfig::default());
    }
}
