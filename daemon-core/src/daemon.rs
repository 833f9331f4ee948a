//! The orchestration engine.
//!
//! [`Daemon`] owns the network state, the state store, and the AI
//! gateway, and exposes every operation the engine supports: entity
//! management, AI-backed operations, natural-language trigger
//! authoring, the evaluation tick, and the cooperative run loop.

use crate::evaluator;
use crate::executor::{self, ActionOutcome, ActionRecord, ActionStatus};
use crate::network::{
    NetworkState, OperativeId, Quest, QuestError, QuestId, QuestRequirements, QuestRewards,
    Trigger, TriggerCondition, TriggerId,
};
use crate::persist::{PersistError, StateStore};
use chrono::{Local, Utc};
use gateway::ops::{
    Decision, QuestDraft, StrategicPlan, SubmissionReview, ThreatAssessment,
};
use gateway::{Gateway, GatewayConfig, GatewayError};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

const AI_CONFIG_FILE: &str = "ai_config.json";
const DEFAULT_DATA_DIR: &str = "./daemon_data";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Errors from orchestrator operations.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error(transparent)]
    Quest(#[from] QuestError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid trigger definition: {0}")]
    InvalidTriggerDefinition(String),
}

/// Orchestrator settings.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub data_dir: PathBuf,
    pub poll_interval: Duration,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl DaemonConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Outcome of natural-language trigger authoring. Rejection by the
/// safety review is a normal outcome, not an error.
#[derive(Debug, Clone)]
pub enum TriggerAuthoring {
    Created(TriggerId),
    Rejected {
        risk_level: String,
        concerns: Vec<String>,
    },
}

/// Requests a running daemon to stop at the next loop iteration.
#[derive(Debug, Clone)]
pub struct StopHandle {
    sender: watch::Sender<bool>,
}

impl StopHandle {
    /// Signal the run loop to stop. Performs no I/O; the loop persists
    /// state on its way out.
    pub fn stop(&self) {
        let _ = self.sender.send(true);
    }
}

/// The orchestration engine.
pub struct Daemon {
    state: NetworkState,
    store: StateStore,
    gateway: Gateway,
    shutdown: watch::Receiver<bool>,
    poll_interval: Duration,
}

impl Daemon {
    /// Open the data directory, load persisted state, and build the
    /// gateway from its config file (created with defaults if absent).
    pub async fn new(config: DaemonConfig) -> Result<(Self, StopHandle), DaemonError> {
        let gateway_config = GatewayConfig::load_or_create(config.data_dir.join(AI_CONFIG_FILE))?;
        let gateway = Gateway::new(gateway_config);
        Self::with_gateway(config, gateway).await
    }

    /// Like [`Daemon::new`] with a caller-supplied gateway. Tests use
    /// this to inject a scripted provider.
    pub async fn with_gateway(
        config: DaemonConfig,
        gateway: Gateway,
    ) -> Result<(Self, StopHandle), DaemonError> {
        let store = StateStore::open(&config.data_dir).await?;
        let state = store.load().await?;
        let (sender, shutdown) = watch::channel(false);
        let daemon = Self {
            state,
            store,
            gateway,
            shutdown,
            poll_interval: config.poll_interval,
        };
        Ok((daemon, StopHandle { sender }))
    }

    pub fn state(&self) -> &NetworkState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut NetworkState {
        &mut self.state
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    // Entity operations. Each persists immediately.

    pub async fn create_trigger(
        &mut self,
        condition: TriggerCondition,
        action_id: impl Into<String>,
    ) -> Result<TriggerId, DaemonError> {
        let id = self.state.create_trigger(Trigger::new(condition, action_id));
        self.store.save(&self.state).await?;
        Ok(id)
    }

    pub async fn create_quest(&mut self, quest: Quest) -> Result<QuestId, DaemonError> {
        let id = self.state.create_quest(quest);
        self.store.save(&self.state).await?;
        Ok(id)
    }

    pub async fn recruit(
        &mut self,
        username: impl Into<String>,
        skills: Vec<String>,
    ) -> Result<OperativeId, DaemonError> {
        let id = self.state.recruit(username, skills);
        self.store.save(&self.state).await?;
        Ok(id)
    }

    pub async fn assign_quest(
        &mut self,
        quest: QuestId,
        operative: OperativeId,
    ) -> Result<(), DaemonError> {
        self.state.assign_quest(quest, operative)?;
        self.store.save(&self.state).await?;
        Ok(())
    }

    pub async fn complete_quest(
        &mut self,
        quest: QuestId,
        operative: OperativeId,
    ) -> Result<(), DaemonError> {
        self.state.complete_quest(quest, operative)?;
        self.store.save(&self.state).await?;
        Ok(())
    }

    // AI-backed operations.

    /// Ask the gateway to draft a quest and register it.
    pub async fn generate_quest(&mut self, difficulty: u8) -> Result<QuestId, DaemonError> {
        let difficulty = difficulty.clamp(1, 5);
        let context = self.context_value()?;
        let draft = self.gateway.generate_quest(difficulty, &context).await?;
        let quest = materialize_quest(draft);
        let id = self.state.create_quest(quest);
        self.store.save(&self.state).await?;
        Ok(id)
    }

    /// Grade an operative's submission for a quest, completing it and
    /// awarding any bonus when the review passes.
    pub async fn grade_submission(
        &mut self,
        quest_id: QuestId,
        operative_id: OperativeId,
        submission: &str,
    ) -> Result<SubmissionReview, DaemonError> {
        let (title, description) = {
            let quest = self
                .state
                .quest(quest_id)
                .ok_or(QuestError::UnknownQuest(quest_id))?;
            (quest.title.clone(), quest.description.clone())
        };

        let review = self
            .gateway
            .review_submission(&title, &description, submission)
            .await?;

        if review.quest_completed {
            self.state.complete_quest(quest_id, operative_id)?;
            if review.bonus_reputation > 0 {
                if let Some(operative) = self
                    .state
                    .operatives
                    .iter_mut()
                    .find(|o| o.id == operative_id)
                {
                    operative.reputation += review.bonus_reputation;
                    // The bonus can cross rank thresholds on its own.
                    while operative.reputation >= operative.rank as i64 * 100 {
                        operative.rank += 1;
                    }
                }
            }
            self.store.save(&self.state).await?;
        }
        Ok(review)
    }

    pub async fn assess_threat(&self, event: &str) -> Result<ThreatAssessment, DaemonError> {
        let context = self.context_value()?;
        Ok(self.gateway.assess_threat(event, &context).await?)
    }

    pub async fn plan_strategy(&self, focus: &str) -> Result<StrategicPlan, DaemonError> {
        let context = self.context_value()?;
        Ok(self.gateway.plan_strategy(focus, &context).await?)
    }

    pub async fn make_decision(&self, situation: &str) -> Result<Decision, DaemonError> {
        let context = self.context_value()?;
        Ok(self.gateway.make_decision(situation, &context).await?)
    }

    pub async fn send_communication(
        &self,
        recipient: &str,
        purpose: &str,
    ) -> Result<String, DaemonError> {
        let context = self.context_value()?;
        Ok(self
            .gateway
            .compose_message(recipient, purpose, &context)
            .await?)
    }

    /// Author a trigger from a natural-language request: parse via the
    /// gateway, safety-review the parsed configuration, and materialize
    /// it only on explicit approval.
    pub async fn create_trigger_from_description(
        &mut self,
        description: &str,
    ) -> Result<TriggerAuthoring, DaemonError> {
        let parsed = self.gateway.parse_trigger_description(description).await?;
        let verdict = self
            .gateway
            .validate_trigger_safety(description, &parsed.trigger)
            .await?;

        if !verdict.approved {
            info!(
                risk_level = %verdict.risk_level,
                concerns = verdict.concerns.len(),
                "trigger request rejected by safety review"
            );
            return Ok(TriggerAuthoring::Rejected {
                risk_level: verdict.risk_level,
                concerns: verdict.concerns,
            });
        }

        let condition: TriggerCondition = serde_json::from_value(parsed.trigger.clone())
            .map_err(|e| DaemonError::InvalidTriggerDefinition(e.to_string()))?;

        let mut trigger = Trigger::new(condition, parsed.action_id.clone());
        trigger.active = parsed.active;
        let id = self.state.create_trigger(trigger);

        self.store.save(&self.state).await?;
        self.store
            .archive_trigger_config(id, &serde_json::to_value(&parsed)?)
            .await?;
        Ok(TriggerAuthoring::Created(id))
    }

    // Evaluation and execution.

    /// Evaluate every active trigger once, in registry order. A fault
    /// deciding one trigger is logged and does not abort the rest.
    pub async fn tick(&mut self) -> Result<(), DaemonError> {
        for index in 0..self.state.triggers.len() {
            let (id, condition, active, previous_check, action_id) = {
                let trigger = &self.state.triggers[index];
                (
                    trigger.id,
                    trigger.condition.clone(),
                    trigger.active,
                    trigger.last_checked,
                    trigger.action_id.clone(),
                )
            };
            if !active {
                continue;
            }

            self.state.triggers[index].last_checked = Some(Utc::now());

            let fired = match self.decide(&condition, previous_check).await {
                Ok(fired) => fired,
                Err(e) => {
                    error!(trigger = %id, error = %e, "trigger evaluation failed");
                    false
                }
            };

            if fired {
                info!(trigger = %id, kind = condition.kind(), "trigger fired");
                self.execute_action(&action_id, Some(id)).await?;
            }
        }
        Ok(())
    }

    async fn decide(
        &self,
        condition: &TriggerCondition,
        previous_check: Option<chrono::DateTime<Utc>>,
    ) -> Result<bool, DaemonError> {
        match condition {
            TriggerCondition::Time { at } => Ok(evaluator::time_matches(at, &Local::now())),
            TriggerCondition::Event { event_type } => {
                let feed = self.store.events().await?;
                Ok(evaluator::event_matches(event_type, previous_check, &feed))
            }
            TriggerCondition::Condition { metric, threshold } => {
                Ok(evaluator::metric_matches(*metric, *threshold, &self.state))
            }
            TriggerCondition::AiDecision { directive } => {
                let context = self.context_value()?;
                match self.gateway.evaluate_trigger(directive, &context).await {
                    Ok(evaluation) => {
                        info!(
                            should_trigger = evaluation.should_trigger,
                            confidence = evaluation.confidence,
                            reasoning = %evaluation.reasoning,
                            "AI trigger evaluation"
                        );
                        Ok(evaluation.should_trigger)
                    }
                    Err(e) => {
                        warn!(error = %e, "AI trigger evaluation unavailable");
                        Ok(false)
                    }
                }
            }
        }
    }

    /// Plan and apply actions for a fired trigger, then audit and
    /// persist. A planning failure is audited as failed; it does not
    /// abort the tick.
    pub async fn execute_action(
        &mut self,
        action_id: &str,
        trigger_id: Option<TriggerId>,
    ) -> Result<(), DaemonError> {
        let context = self.context_value()?;
        let trigger_event = match trigger_id {
            Some(id) => format!("Action {action_id} triggered by trigger {id}"),
            None => format!("Action {action_id} triggered"),
        };

        let (actions, status) = match self.gateway.plan_actions(&trigger_event, &context).await {
            Ok(plan) => (plan.actions, ActionStatus::Executed),
            Err(e) => {
                error!(action_id, error = %e, "action planning failed");
                (Vec::new(), ActionStatus::Failed)
            }
        };

        for action in &actions {
            match executor::apply_planned_action(&mut self.state, action) {
                ActionOutcome::GenerateQuest { difficulty } => {
                    if let Err(e) = self.generate_quest(difficulty).await {
                        warn!(error = %e, "quest generation failed");
                    }
                }
                ActionOutcome::Recorded => {}
            }
        }

        let record = ActionRecord {
            action_id: action_id.to_string(),
            trigger_id,
            timestamp: Utc::now(),
            status,
            ai_generated_actions: actions,
        };
        self.store.append_action(&record).await?;
        self.store.save(&self.state).await?;
        Ok(())
    }

    /// Run the evaluation loop until the stop handle fires. State is
    /// persisted on every exit path.
    pub async fn run(&mut self) -> Result<(), DaemonError> {
        info!(interval = ?self.poll_interval, "orchestration loop started");
        loop {
            if *self.shutdown.borrow() {
                info!("stop requested, shutting down");
                self.store.save(&self.state).await?;
                return Ok(());
            }

            if let Err(e) = self.tick().await {
                error!(error = %e, "tick failed, shutting down");
                self.store.save(&self.state).await?;
                return Err(e);
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    fn context_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self.state.context())
    }
}

fn materialize_quest(draft: QuestDraft) -> Quest {
    let mut description = draft.description;
    if !draft.objectives.is_empty() {
        description.push_str("\n\nObjectives:");
        for objective in &draft.objectives {
            description.push_str("\n- ");
            description.push_str(objective);
        }
    }
    Quest::new(
        draft.title,
        description,
        draft.difficulty,
        QuestRewards {
            reputation: draft.rewards.reputation,
        },
        QuestRequirements {
            min_rank: draft.requirements.min_rank,
            skills: draft.requirements.skills,
        },
    )
}
