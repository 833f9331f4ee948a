//! Applying planned actions to the network.
//!
//! The orchestrator asks the gateway for an [`gateway::ops::ActionPlan`]
//! and applies each action here, in returned order. Quest generation
//! needs another gateway round trip, so applying `CreateQuest` yields
//! an outcome the orchestrator follows up on.

use crate::network::{NetworkState, TriggerId};
use chrono::{DateTime, Utc};
use gateway::ops::{ActionKind, PlannedAction};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Audit record appended to the action log after every execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    pub action_id: String,
    pub trigger_id: Option<TriggerId>,
    pub timestamp: DateTime<Utc>,
    pub status: ActionStatus,
    pub ai_generated_actions: Vec<PlannedAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Executed,
    Failed,
}

/// What applying a single planned action requires of the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Ask the gateway to draft a quest at this difficulty.
    GenerateQuest { difficulty: u8 },
    /// Nothing further; any effect already landed on the state.
    Recorded,
}

/// Apply one planned action to the network state.
///
/// The `priority` field on the action is advisory and ignored here;
/// callers apply actions in the order the plan returned them.
pub fn apply_planned_action(state: &mut NetworkState, action: &PlannedAction) -> ActionOutcome {
    match action.action_type {
        ActionKind::CreateQuest => {
            let difficulty = difficulty_param(&action.parameters);
            ActionOutcome::GenerateQuest { difficulty }
        }
        ActionKind::SendMessage => {
            // Notification extension point; record-only for now.
            info!(
                recipient = action.parameters["recipient"].as_str().unwrap_or("network"),
                description = %action.description,
                "message dispatch recorded"
            );
            ActionOutcome::Recorded
        }
        ActionKind::AlertOperatives => {
            info!(description = %action.description, "operative alert recorded");
            ActionOutcome::Recorded
        }
        ActionKind::ModifyTrigger => {
            let target = action.parameters["trigger_id"]
                .as_str()
                .and_then(|s| s.parse::<TriggerId>().ok());
            let active = action.parameters["active"].as_bool().unwrap_or(true);
            match target.and_then(|id| state.trigger_mut(id)) {
                Some(trigger) => {
                    trigger.active = active;
                    info!(trigger = %trigger.id, active, "trigger modified");
                }
                None => {
                    debug!(parameters = %action.parameters, "modify_trigger target not found");
                }
            }
            ActionOutcome::Recorded
        }
        ActionKind::Other => {
            warn!(description = %action.description, "unrecognized action type skipped");
            ActionOutcome::Recorded
        }
    }
}

fn difficulty_param(parameters: &Value) -> u8 {
    parameters["difficulty"]
        .as_u64()
        .map(|d| d.clamp(1, 5) as u8)
        .unwrap_or(2)
}
