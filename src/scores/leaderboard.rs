use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Individual scores above this never count towards the aggregate ranking.
/// The spreadsheet holds known bogus entries beyond it.
pub const AGGREGATE_SCORE_CAP: u64 = 100_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteScore {
    #[serde(deserialize_with = "lenient_username")]
    pub username: String,
    #[serde(deserialize_with = "lenient_score")]
    pub score: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateRank {
    pub username: String,
    pub total: u64,
}

/// Snapshot of the spreadsheet: game name -> submitted scores.
/// Rows that do not read as a score are logged and left out; one bad cell
/// never costs the whole snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Leaderboard {
    games: BTreeMap<String, Vec<RemoteScore>>,
}

impl<'de> Deserialize<'de> for Leaderboard {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
        let mut games = BTreeMap::new();
        for (game, rows) in raw {
            let Value::Array(rows) = rows else {
                log::warn!("Skipping leaderboard entry {}: not a list of scores", game);
                continue;
            };
            let scores = rows
                .into_iter()
                .filter_map(|row| match serde_json::from_value::<RemoteScore>(row) {
                    Ok(score) => Some(score),
                    Err(err) => {
                        log::warn!("Skipping {} row: {}", game, err);
                        None
                    }
                })
                .collect();
            games.insert(game, scores);
        }
        Ok(Leaderboard { games })
    }
}

impl Leaderboard {
    pub fn game_names(&self) -> impl Iterator<Item = &str> {
        self.games.keys().map(String::as_str)
    }

    /// Best `n` scores for one game, highest first
    pub fn top(&self, game: &str, n: usize) -> Vec<RemoteScore> {
        let mut scores = self.games.get(game).cloned().unwrap_or_default();
        scores.sort_by(|a, b| b.score.cmp(&a.score));
        scores.truncate(n);
        scores
    }

    /// Sum of every player's scores across all games, skipping single
    /// scores above `AGGREGATE_SCORE_CAP`. Highest total first, then name.
    pub fn aggregate(&self) -> Vec<AggregateRank> {
        let mut totals: HashMap<&str, u64> = HashMap::new();
        for score in self.games.values().flatten() {
            let total = totals.entry(score.username.trim()).or_insert(0);
            if score.score <= AGGREGATE_SCORE_CAP {
                *total += score.score;
            }
        }
        let mut ranks: Vec<AggregateRank> = totals
            .into_iter()
            .map(|(username, total)| AggregateRank {
                username: username.to_string(),
                total,
            })
            .collect();
        ranks.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.username.cmp(&b.username)));
        ranks
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Cell {
    Number(f64),
    Text(String),
}

/// A name typed as digits comes back from the sheet as a number
fn lenient_username<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Cell::deserialize(deserializer)? {
        Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", n as i64),
        Cell::Number(n) => n.to_string(),
        Cell::Text(text) => text,
    })
}

/// Sheet cells come back as numbers or as numeric strings
fn lenient_score<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Cell::deserialize(deserializer)? {
        Cell::Number(n) => n,
        Cell::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("score '{}' is not a number", text)))?,
    };
    if !value.is_finite() {
        return Err(de::Error::custom("score is not finite"));
    }
    Ok(value.max(0.0).round() as u64)
}
