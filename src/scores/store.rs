use crate::browser;
use crate::scores::{validate_username, ScoreEntry, ScoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use web_sys::Storage;

pub const SCORES_KEY: &str = "minigameScores";
pub const HIGH_SCORE_KEY: &str = "ideaDashHighScore";
pub const STREAK_KEY: &str = "ideaDashStreak";
pub const MAX_ENTRIES_PER_GAME: usize = 10;
/// v1 was the bare `{ game: [{username, score, date}] }` map
pub const SCHEMA_VERSION: u32 = 2;

/// String key/value persistence, `localStorage` shaped
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, ScoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), ScoreError>;
}

pub struct BrowserStorage {
    storage: Storage,
}

impl BrowserStorage {
    pub fn open() -> anyhow::Result<Self> {
        Ok(BrowserStorage {
            storage: browser::local_storage()?,
        })
    }
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Result<Option<String>, ScoreError> {
        self.storage
            .get_item(key)
            .map_err(|err| ScoreError::Storage(format!("{:?}", err)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ScoreError> {
        // throws when the quota is exceeded or storage is disabled
        self.storage
            .set_item(key, value)
            .map_err(|err| ScoreError::Storage(format!("{:?}", err)))
    }
}

/// In-memory store for tests and for browsers with storage disabled
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RefCell<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, ScoreError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ScoreError> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ScoreFile {
    version: u32,
    games: BTreeMap<String, Vec<ScoreEntry>>,
}

impl Default for ScoreFile {
    fn default() -> Self {
        ScoreFile {
            version: SCHEMA_VERSION,
            games: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LegacyEntry {
    username: String,
    score: u32,
    #[serde(default)]
    date: Option<String>,
}

/// Whatever is found under the key. Tried in order: current, then legacy.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredScores {
    Current(ScoreFile),
    Legacy(BTreeMap<String, Vec<LegacyEntry>>),
}

impl From<BTreeMap<String, Vec<LegacyEntry>>> for ScoreFile {
    fn from(legacy: BTreeMap<String, Vec<LegacyEntry>>) -> Self {
        let games = legacy
            .into_iter()
            .map(|(game, entries)| {
                let mut entries: Vec<ScoreEntry> = entries
                    .into_iter()
                    .map(|old| ScoreEntry {
                        username: old.username,
                        score: old.score,
                        recorded_at: old
                            .date
                            .as_deref()
                            .and_then(|date| DateTime::parse_from_rfc3339(date).ok())
                            .map(|date| date.with_timezone(&Utc)),
                    })
                    .collect();
                rank(&mut entries);
                (game, entries)
            })
            .collect();
        ScoreFile {
            version: SCHEMA_VERSION,
            games,
        }
    }
}

/// Highest first, ties keep the older entry in front, top ten only
fn rank(entries: &mut Vec<ScoreEntry>) {
    entries.sort_by(|a, b| b.score.cmp(&a.score));
    entries.truncate(MAX_ENTRIES_PER_GAME);
}

/// Per-game top ten stored as one JSON document
pub struct ScoreBook {
    store: Rc<dyn KeyValueStore>,
    key: String,
}

impl ScoreBook {
    pub fn new(store: Rc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        ScoreBook {
            store,
            key: key.into(),
        }
    }

    fn load(&self) -> Result<ScoreFile, ScoreError> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(ScoreFile::default());
        };
        match serde_json::from_str::<StoredScores>(&raw) {
            Ok(StoredScores::Current(file)) => {
                if file.version > SCHEMA_VERSION {
                    log::warn!(
                        "{} has schema v{}, newer than v{}",
                        self.key,
                        file.version,
                        SCHEMA_VERSION
                    );
                }
                Ok(file)
            }
            Ok(StoredScores::Legacy(legacy)) => {
                log::info!("Migrating {} to schema v{}", self.key, SCHEMA_VERSION);
                Ok(legacy.into())
            }
            Err(err) => {
                log::warn!("Ignoring unreadable {}: {}", self.key, err);
                Ok(ScoreFile::default())
            }
        }
    }

    fn save(&self, file: &ScoreFile) -> Result<(), ScoreError> {
        let json = serde_json::to_string(file)?;
        self.store.set(&self.key, &json)
    }

    /// Adds `entry` under `game` and returns the new ranking. Blank names
    /// fail before storage is touched.
    pub fn record(&self, game: &str, entry: ScoreEntry) -> Result<Vec<ScoreEntry>, ScoreError> {
        let username = validate_username(&entry.username)?;
        let mut file = self.load()?;
        let entries = file.games.entry(game.to_string()).or_default();
        entries.push(ScoreEntry { username, ..entry });
        rank(entries);
        let ranked = entries.clone();
        file.version = SCHEMA_VERSION;
        self.save(&file)?;
        Ok(ranked)
    }

    pub fn top(&self, game: &str) -> Result<Vec<ScoreEntry>, ScoreError> {
        Ok(self.load()?.games.remove(game).unwrap_or_default())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub new_best: bool,
    pub streak: u32,
}

/// High score and streak counters, stored as plain decimal strings
pub struct RunRecords {
    store: Rc<dyn KeyValueStore>,
}

impl RunRecords {
    pub fn new(store: Rc<dyn KeyValueStore>) -> Self {
        RunRecords { store }
    }

    fn read(&self, key: &str) -> u32 {
        match self.store.get(key) {
            Ok(Some(raw)) => raw.trim().parse().unwrap_or(0),
            Ok(None) => 0,
            Err(err) => {
                log::warn!("{}", err);
                0
            }
        }
    }

    pub fn high_score(&self) -> u32 {
        self.read(HIGH_SCORE_KEY)
    }

    pub fn streak(&self) -> u32 {
        self.read(STREAK_KEY)
    }

    /// A run that collected at least one idea extends the streak, any
    /// other run resets it.
    pub fn record_run(&self, score: u32, ideas: u32) -> Result<RunOutcome, ScoreError> {
        let new_best = score > self.high_score();
        if new_best {
            self.store.set(HIGH_SCORE_KEY, &score.to_string())?;
        }
        let streak = if ideas > 0 { self.streak() + 1 } else { 0 };
        self.store.set(STREAK_KEY, &streak.to_string())?;
        Ok(RunOutcome { new_best, streak })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> (Rc<MemoryStore>, ScoreBook) {
        let store = Rc::new(MemoryStore::default());
        let book = ScoreBook::new(store.clone(), SCORES_KEY);
        (store, book)
    }

    fn entry(name: &str, score: u32) -> ScoreEntry {
        ScoreEntry {
            username: name.to_string(),
            score,
            recorded_at: None,
        }
    }

    #[test]
    fn stays_sorted_and_capped_after_many_submissions() {
        let (_, book) = book();
        for (i, score) in [5, 80, 12, 3, 99, 41, 7, 63, 28, 50, 1, 77, 18, 90].iter().enumerate() {
            book.record("flappy", entry(&format!("p{}", i), *score)).unwrap();
        }
        let top = book.top("flappy").unwrap();
        assert_eq!(top.len(), MAX_ENTRIES_PER_GAME);
        assert!(top.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(top[0].score, 99);
        assert_eq!(top[9].score, 12);
    }

    #[test]
    fn games_are_ranked_independently() {
        let (_, book) = book();
        book.record("snake", entry("ada", 3)).unwrap();
        book.record("pong", entry("bob", 9)).unwrap();
        assert_eq!(book.top("snake").unwrap().len(), 1);
        assert!(book.top("wordle").unwrap().is_empty());
    }

    #[test]
    fn ties_keep_the_earlier_entry_first() {
        let (_, book) = book();
        book.record("2048", entry("first", 10)).unwrap();
        let ranked = book.record("2048", entry("second", 10)).unwrap();
        assert_eq!(ranked[0].username, "first");
    }

    #[test]
    fn blank_username_does_not_touch_storage() {
        let (store, book) = book();
        book.record("snake", entry("ada", 3)).unwrap();
        let before = store.get(SCORES_KEY).unwrap();
        assert!(matches!(
            book.record("snake", entry("   ", 500)),
            Err(ScoreError::EmptyUsername)
        ));
        assert_eq!(store.get(SCORES_KEY).unwrap(), before);
    }

    #[test]
    fn legacy_documents_are_migrated_on_read() {
        let (store, book) = book();
        store
            .set(
                SCORES_KEY,
                r#"{"snake":[{"username":"old","score":4,"date":"2024-03-01T10:00:00.000Z"},
                             {"username":"older","score":9,"date":"3/1/2024"}]}"#,
            )
            .unwrap();
        let top = book.top("snake").unwrap();
        assert_eq!(top[0].username, "older");
        assert!(top[0].recorded_at.is_none());
        assert!(top[1].recorded_at.is_some());

        book.record("snake", entry("new", 1)).unwrap();
        let raw = store.get(SCORES_KEY).unwrap().unwrap();
        assert!(raw.contains(r#""version":2"#));
    }

    #[test]
    fn unreadable_documents_start_fresh() {
        let (store, book) = book();
        store.set(SCORES_KEY, "not json").unwrap();
        assert!(book.top("snake").unwrap().is_empty());
        book.record("snake", entry("ada", 1)).unwrap();
        assert_eq!(book.top("snake").unwrap().len(), 1);
    }

    #[test]
    fn run_records_track_best_and_streak() {
        let store = Rc::new(MemoryStore::default());
        let records = RunRecords::new(store.clone());
        assert_eq!(
            records.record_run(40, 2).unwrap(),
            RunOutcome {
                new_best: true,
                streak: 1
            }
        );
        assert_eq!(
            records.record_run(10, 1).unwrap(),
            RunOutcome {
                new_best: false,
                streak: 2
            }
        );
        assert_eq!(records.record_run(5, 0).unwrap().streak, 0);
        assert_eq!(records.high_score(), 40);
        assert_eq!(store.get(HIGH_SCORE_KEY).unwrap().as_deref(), Some("40"));
    }
}
