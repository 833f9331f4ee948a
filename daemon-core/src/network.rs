//! The network entity model.
//!
//! Triggers, quests, and operatives, owned by [`NetworkState`], the
//! single authoritative registry the orchestrator mutates. Entities are
//! never deleted; retirement happens through `active` flags and quest
//! status only.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;
use uuid::Uuid;

/// Macro to define a newtype ID wrapper around UUID
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random ID
            #[inline]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create an ID from an existing UUID
            #[inline]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the underlying UUID
            #[inline]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), &self.0.to_string()[..8])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

define_id! {
    /// Unique identifier for a trigger.
    TriggerId
}

define_id! {
    /// Unique identifier for a quest.
    QuestId
}

define_id! {
    /// Unique identifier for an operative.
    OperativeId
}

/// Metrics a condition trigger can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    OperativeCount,
    QuestCompletions,
}

/// What makes a trigger fire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerCondition {
    /// Fires when the local wall clock reads `at` ("HH:MM").
    Time { at: String },
    /// Fires when the event feed holds a matching event newer than the
    /// trigger's previous check.
    Event { event_type: String },
    /// Fires when a network metric meets its threshold.
    Condition { metric: Metric, threshold: i64 },
    /// Defers the decision to the AI gateway.
    AiDecision { directive: String },
}

impl TriggerCondition {
    /// Short tag for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            TriggerCondition::Time { .. } => "time",
            TriggerCondition::Event { .. } => "event",
            TriggerCondition::Condition { .. } => "condition",
            TriggerCondition::AiDecision { .. } => "ai_decision",
        }
    }
}

/// An installed automation trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub id: TriggerId,
    pub condition: TriggerCondition,
    /// Identifier of the action to execute when the trigger fires.
    pub action_id: String,
    pub active: bool,
    /// When this trigger was last evaluated.
    pub last_checked: Option<DateTime<Utc>>,
}

impl Trigger {
    pub fn new(condition: TriggerCondition, action_id: impl Into<String>) -> Self {
        Self {
            id: TriggerId::new(),
            condition,
            action_id: action_id.into(),
            active: true,
            last_checked: None,
        }
    }
}

/// Quest lifecycle. Transitions only move forward:
/// Available → Active → Completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    Available,
    Active,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestRewards {
    pub reputation: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestRequirements {
    pub min_rank: u32,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// A mission an operative can take on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: QuestId,
    pub title: String,
    pub description: String,
    /// 1 (trivial) to 5 (extreme).
    pub difficulty: u8,
    pub rewards: QuestRewards,
    pub requirements: QuestRequirements,
    pub status: QuestStatus,
    /// Set while Active or Completed, never while Available.
    pub assigned_to: Option<OperativeId>,
    pub created_at: DateTime<Utc>,
}

impl Quest {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        difficulty: u8,
        rewards: QuestRewards,
        requirements: QuestRequirements,
    ) -> Self {
        Self {
            id: QuestId::new(),
            title: title.into(),
            description: description.into(),
            difficulty: difficulty.clamp(1, 5),
            rewards,
            requirements,
            status: QuestStatus::Available,
            assigned_to: None,
            created_at: Utc::now(),
        }
    }
}

/// A member of the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operative {
    pub id: OperativeId,
    pub username: String,
    /// Generated handle used in network-facing communication.
    pub darknet_name: String,
    /// Starts at 1, never decreases.
    pub rank: u32,
    /// Never negative.
    pub reputation: i64,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub completed_quests: Vec<QuestId>,
    pub active: bool,
    pub joined_date: DateTime<Utc>,
}

/// Failures of quest assignment and completion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuestError {
    #[error("unknown quest: {0}")]
    UnknownQuest(QuestId),

    #[error("unknown operative: {0}")]
    UnknownOperative(OperativeId),

    #[error("quest is not available for assignment")]
    NotAvailable,

    #[error("operative rank {rank} is below required rank {min_rank}")]
    RankTooLow { rank: u32, min_rank: u32 },

    #[error("quest is not active")]
    NotActive,

    #[error("quest is assigned to a different operative")]
    NotAssignee,
}

/// Serialized snapshot of the network fed into AI prompts.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkContext {
    pub total_operatives: usize,
    pub active_operatives: usize,
    pub available_quests: usize,
    pub active_quests: usize,
    pub completed_quests: usize,
    pub active_triggers: usize,
    pub average_rank: f64,
    pub total_reputation: i64,
    pub timestamp: DateTime<Utc>,
}

const NAME_PREFIXES: &[&str] = &[
    "Ghost", "Cipher", "Vector", "Echo", "Raven", "Onyx", "Static", "Umbra", "Hex", "Drift",
];

const NAME_SUFFIXES: &[&str] = &[
    "Runner", "Wire", "Node", "Blade", "Signal", "Shade", "Protocol", "Relay", "Circuit", "Key",
];

/// Generate a darknet handle: prefix + suffix + three digits.
pub fn generate_darknet_name() -> String {
    let mut rng = rand::thread_rng();
    let prefix = NAME_PREFIXES[rng.gen_range(0..NAME_PREFIXES.len())];
    let suffix = NAME_SUFFIXES[rng.gen_range(0..NAME_SUFFIXES.len())];
    let number: u32 = rng.gen_range(100..1000);
    format!("{prefix}{suffix}{number}")
}

/// The three entity registries, insertion-ordered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkState {
    pub triggers: Vec<Trigger>,
    pub quests: Vec<Quest>,
    pub operatives: Vec<Operative>,
}

impl NetworkState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a trigger and return its id.
    pub fn create_trigger(&mut self, trigger: Trigger) -> TriggerId {
        let id = trigger.id;
        info!(trigger = %id, kind = trigger.condition.kind(), "trigger created");
        self.triggers.push(trigger);
        id
    }

    /// Register a quest and return its id.
    pub fn create_quest(&mut self, quest: Quest) -> QuestId {
        let id = quest.id;
        info!(quest = %id, title = %quest.title, "quest created");
        self.quests.push(quest);
        id
    }

    /// Recruit a new operative at rank 1 with zero reputation and a
    /// generated darknet name.
    pub fn recruit(&mut self, username: impl Into<String>, skills: Vec<String>) -> OperativeId {
        let operative = Operative {
            id: OperativeId::new(),
            username: username.into(),
            darknet_name: generate_darknet_name(),
            rank: 1,
            reputation: 0,
            skills,
            completed_quests: Vec::new(),
            active: true,
            joined_date: Utc::now(),
        };
        let id = operative.id;
        info!(operative = %id, darknet_name = %operative.darknet_name, "operative recruited");
        self.operatives.push(operative);
        id
    }

    pub fn trigger(&self, id: TriggerId) -> Option<&Trigger> {
        self.triggers.iter().find(|t| t.id == id)
    }

    pub fn trigger_mut(&mut self, id: TriggerId) -> Option<&mut Trigger> {
        self.triggers.iter_mut().find(|t| t.id == id)
    }

    pub fn quest(&self, id: QuestId) -> Option<&Quest> {
        self.quests.iter().find(|q| q.id == id)
    }

    pub fn operative(&self, id: OperativeId) -> Option<&Operative> {
        self.operatives.iter().find(|o| o.id == id)
    }

    /// Assign an available quest to an operative of sufficient rank.
    pub fn assign_quest(
        &mut self,
        quest_id: QuestId,
        operative_id: OperativeId,
    ) -> Result<(), QuestError> {
        let quest_index = self
            .quests
            .iter()
            .position(|q| q.id == quest_id)
            .ok_or(QuestError::UnknownQuest(quest_id))?;
        let operative = self
            .operatives
            .iter()
            .find(|o| o.id == operative_id)
            .ok_or(QuestError::UnknownOperative(operative_id))?;

        let quest = &self.quests[quest_index];
        if quest.status != QuestStatus::Available {
            return Err(QuestError::NotAvailable);
        }
        if operative.rank < quest.requirements.min_rank {
            return Err(QuestError::RankTooLow {
                rank: operative.rank,
                min_rank: quest.requirements.min_rank,
            });
        }

        let quest = &mut self.quests[quest_index];
        quest.status = QuestStatus::Active;
        quest.assigned_to = Some(operative_id);
        info!(quest = %quest_id, operative = %operative_id, "quest assigned");
        Ok(())
    }

    /// Complete an active quest on behalf of its assignee, awarding
    /// reputation and applying the leveling rule.
    pub fn complete_quest(
        &mut self,
        quest_id: QuestId,
        operative_id: OperativeId,
    ) -> Result<(), QuestError> {
        let quest_index = self
            .quests
            .iter()
            .position(|q| q.id == quest_id)
            .ok_or(QuestError::UnknownQuest(quest_id))?;
        let operative_index = self
            .operatives
            .iter()
            .position(|o| o.id == operative_id)
            .ok_or(QuestError::UnknownOperative(operative_id))?;

        {
            let quest = &self.quests[quest_index];
            if quest.status != QuestStatus::Active {
                return Err(QuestError::NotActive);
            }
            if quest.assigned_to != Some(operative_id) {
                return Err(QuestError::NotAssignee);
            }
        }

        self.quests[quest_index].status = QuestStatus::Completed;
        let reward = self.quests[quest_index].rewards.reputation;

        let operative = &mut self.operatives[operative_index];
        operative.completed_quests.push(quest_id);
        operative.reputation += reward;

        // Reputation can cross several thresholds in one award.
        let before = operative.rank;
        while operative.reputation >= operative.rank as i64 * 100 {
            operative.rank += 1;
        }
        if operative.rank > before {
            info!(
                operative = %operative_id,
                rank = operative.rank,
                "operative promoted"
            );
        }

        info!(quest = %quest_id, operative = %operative_id, reward, "quest completed");
        Ok(())
    }

    /// Snapshot the network for AI prompts.
    pub fn context(&self) -> NetworkContext {
        let active_operatives = self.operatives.iter().filter(|o| o.active).count();
        let average_rank = if self.operatives.is_empty() {
            0.0
        } else {
            self.operatives.iter().map(|o| o.rank as f64).sum::<f64>()
                / self.operatives.len() as f64
        };

        NetworkContext {
            total_operatives: self.operatives.len(),
            active_operatives,
            available_quests: self.count_quests(QuestStatus::Available),
            active_quests: self.count_quests(QuestStatus::Active),
            completed_quests: self.count_quests(QuestStatus::Completed),
            active_triggers: self.triggers.iter().filter(|t| t.active).count(),
            average_rank,
            total_reputation: self.operatives.iter().map(|o| o.reputation).sum(),
            timestamp: Utc::now(),
        }
    }

    fn count_quests(&self, status: QuestStatus) -> usize {
        self.quests.iter().filter(|q| q.status == status).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_quest(min_rank: u32, reputation: i64) -> Quest {
        Quest::new(
            "Recon",
            "Scout the perimeter",
            2,
            QuestRewards { reputation },
            QuestRequirements {
                min_rank,
                skills: vec![],
            },
        )
    }

    #[test]
    fn test_recruit_defaults() {
        let mut state = NetworkState::new();
        let id = state.recruit("alice", vec!["osint".to_string()]);
        let operative = state.operative(id).unwrap();
        assert_eq!(operative.rank, 1);
        assert_eq!(operative.reputation, 0);
        assert!(operative.active);
        assert!(operative.completed_quests.is_empty());
    }

    #[test]
    fn test_darknet_name_shape() {
        for _ in 0..20 {
            let name = generate_darknet_name();
            let digits: String = name.chars().rev().take(3).collect();
            assert!(digits.chars().all(|c| c.is_ascii_digit()), "{name}");
            assert!(name.len() > 3);
        }
    }

    #[test]
    fn test_assign_requires_rank() {
        let mut state = NetworkState::new();
        let operative = state.recruit("bob", vec![]);
        let quest = state.create_quest(sample_quest(3, 50));

        let err = state.assign_quest(quest, operative).unwrap_err();
        assert_eq!(err, QuestError::RankTooLow { rank: 1, min_rank: 3 });
    }

    #[test]
    fn test_assign_and_complete_flow() {
        let mut state = NetworkState::new();
        let operative = state.recruit("carol", vec![]);
        let quest = state.create_quest(sample_quest(1, 75));

        state.assign_quest(quest, operative).unwrap();
        assert_eq!(state.quest(quest).unwrap().status, QuestStatus::Active);
        assert_eq!(state.quest(quest).unwrap().assigned_to, Some(operative));

        state.complete_quest(quest, operative).unwrap();
        let op = state.operative(operative).unwrap();
        assert_eq!(op.reputation, 75);
        assert_eq!(op.completed_quests, vec![quest]);
    }

    #[test]
    fn test_complete_rejects_non_assignee() {
        let mut state = NetworkState::new();
        let assignee = state.recruit("dave", vec![]);
        let other = state.recruit("eve", vec![]);
        let quest = state.create_quest(sample_quest(1, 50));

        state.assign_quest(quest, assignee).unwrap();
        let err = state.complete_quest(quest, other).unwrap_err();
        assert_eq!(err, QuestError::NotAssignee);
    }

    #[test]
    fn test_leveling_crosses_multiple_thresholds() {
        let mut state = NetworkState::new();
        let operative = state.recruit("frank", vec![]);
        let quest = state.create_quest(sample_quest(1, 500));

        state.assign_quest(quest, operative).unwrap();
        state.complete_quest(quest, operative).unwrap();

        // 500 >= 100, 200, 300, 400, 500 -> rank 6
        assert_eq!(state.operative(operative).unwrap().rank, 6);
    }

    #[test]
    fn test_context_counts() {
        let mut state = NetworkState::new();
        let operative = state.recruit("grace", vec![]);
        let q1 = state.create_quest(sample_quest(1, 50));
        state.create_quest(sample_quest(1, 50));
        state.assign_quest(q1, operative).unwrap();

        let context = state.context();
        assert_eq!(context.total_operatives, 1);
        assert_eq!(context.available_quests, 1);
        assert_eq!(context.active_quests, 1);
        assert_eq!(context.completed_quests, 0);
    }
}
