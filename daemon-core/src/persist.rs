//! State persistence over a data directory.
//!
//! Each entity collection lives in its own JSON file and is replaced
//! atomically (temp file + rename) on save, so a failure writing one
//! collection never corrupts the others. The action log is append-only.

use crate::executor::ActionRecord;
use crate::network::{NetworkState, Operative, Quest, Trigger, TriggerId};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

const TRIGGERS_FILE: &str = "triggers.json";
const QUESTS_FILE: &str = "quests.json";
const OPERATIVES_FILE: &str = "operatives.json";
const ACTION_LOG_FILE: &str = "action_log.json";
const EVENTS_FILE: &str = "events.json";

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// An entry in the external event feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub payload: Value,
}

/// JSON-file store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct StateStore {
    data_dir: PathBuf,
}

impl StateStore {
    /// Open a store, creating the data directory if needed.
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).await?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Load all entity collections. A missing file is an empty
    /// collection, not an error.
    pub async fn load(&self) -> Result<NetworkState, PersistError> {
        let triggers: Vec<Trigger> = self.read_collection(TRIGGERS_FILE).await?;
        let quests: Vec<Quest> = self.read_collection(QUESTS_FILE).await?;
        let operatives: Vec<Operative> = self.read_collection(OPERATIVES_FILE).await?;
        info!(
            triggers = triggers.len(),
            quests = quests.len(),
            operatives = operatives.len(),
            "state loaded"
        );
        Ok(NetworkState {
            triggers,
            quests,
            operatives,
        })
    }

    /// Save all entity collections. Every collection is attempted even
    /// if an earlier one fails; the first error is reported.
    pub async fn save(&self, state: &NetworkState) -> Result<(), PersistError> {
        let results = [
            self.write_collection(TRIGGERS_FILE, &state.triggers).await,
            self.write_collection(QUESTS_FILE, &state.quests).await,
            self.write_collection(OPERATIVES_FILE, &state.operatives)
                .await,
        ];
        for result in results {
            result?;
        }
        debug!("state saved");
        Ok(())
    }

    /// Append a record to the action log.
    pub async fn append_action(&self, record: &ActionRecord) -> Result<(), PersistError> {
        let mut log: Vec<ActionRecord> = self.read_collection(ACTION_LOG_FILE).await?;
        log.push(record.clone());
        self.write_collection(ACTION_LOG_FILE, &log).await
    }

    /// The full action log, oldest first.
    pub async fn action_log(&self) -> Result<Vec<ActionRecord>, PersistError> {
        self.read_collection(ACTION_LOG_FILE).await
    }

    /// The external event feed. Missing file means an empty feed.
    pub async fn events(&self) -> Result<Vec<NetworkEvent>, PersistError> {
        self.read_collection(EVENTS_FILE).await
    }

    /// Archive a parsed trigger configuration beside the entity files.
    pub async fn archive_trigger_config(
        &self,
        id: TriggerId,
        config: &Value,
    ) -> Result<(), PersistError> {
        let name = format!("trigger_{id}_config.json");
        self.write_collection(&name, config).await
    }

    async fn read_collection<T: DeserializeOwned + Default>(
        &self,
        name: &str,
    ) -> Result<T, PersistError> {
        match fs::read_to_string(self.data_dir.join(name)).await {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
            Err(e) => Err(PersistError::Io(e)),
        }
    }

    async fn write_collection<T: Serialize + ?Sized>(
        &self,
        name: &str,
        value: &T,
    ) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(value)?;
        let target = self.data_dir.join(name);
        let tmp = self.data_dir.join(format!("{name}.tmp"));
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &target).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{Quest, QuestRequirements, QuestRewards, Trigger, TriggerCondition};

    #[tokio::test]
    async fn test_missing_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::open(dir.path()).await.unwrap();
        let state = store.load().await.unwrap();
        assert!(state.triggers.is_empty());
        assert!(state.quests.is_empty());
        assert!(state.operatives.is_empty());
    }

    #[tokio::test]
    async fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::open(dir.path()).await.unwrap();

        let mut state = NetworkState::new();
        state.create_trigger(Trigger::new(
            TriggerCondition::Time {
                at: "09:00".to_string(),
            },
            "daily_report",
        ));
        state.create_quest(Quest::new(
            "Recon",
            "Scout",
            2,
            QuestRewards { reputation: 50 },
            QuestRequirements {
                min_rank: 1,
                skills: vec![],
            },
        ));
        state.recruit("alice", vec!["osint".to_string()]);

        store.save(&state).await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.triggers, state.triggers);
        assert_eq!(loaded.quests, state.quests);
        assert_eq!(loaded.operatives, state.operatives);
    }

    #[tokio::test]
    async fn test_event_feed_missing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::open(dir.path()).await.unwrap();
        assert!(store.events().await.unwrap().is_empty());
    }
}
