//! Declarative prompt operations.
//!
//! Each higher-level AI call the engine makes is a [`PromptSpec`]: a
//! named template with `{placeholder}` slots and an expected reply
//! shape. Call sites render slots into the template instead of
//! assembling prompt strings ad hoc, and replies deserialize into the
//! typed structs below (fields the model omits fall back to defaults;
//! only safety approval is strict).

use crate::error::GatewayResult;
use crate::gateway::{Gateway, ResponseFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named prompt template plus the reply format it expects.
pub struct PromptSpec {
    pub name: &'static str,
    pub format: ResponseFormat,
    pub template: &'static str,
}

impl PromptSpec {
    /// Substitute `{slot}` placeholders. Unknown placeholders are left
    /// in place so a template drift shows up in the prompt itself.
    pub fn render(&self, slots: &[(&str, String)]) -> String {
        let mut prompt = self.template.to_string();
        for (slot, value) in slots {
            prompt = prompt.replace(&format!("{{{slot}}}"), value);
        }
        prompt
    }
}

// Prompt specifications

pub const TRIGGER_EVALUATION: PromptSpec = PromptSpec {
    name: "trigger_evaluation",
    format: ResponseFormat::Structured,
    template: "\
You manage an autonomous operative network. Decide whether a trigger should fire.

Trigger directive: {directive}

Current network state:
{context}

Respond with JSON:
{
  \"should_trigger\": true or false,
  \"confidence\": 0.0 to 1.0,
  \"reasoning\": \"why\",
  \"recommended_action\": \"what to do if triggered\"
}",
};

pub const QUEST_GENERATION: PromptSpec = PromptSpec {
    name: "quest_generation",
    format: ResponseFormat::Structured,
    template: "\
Generate a new quest for the operative network.

Difficulty: {difficulty} (1-5 scale)

Current network state:
{context}

Respond with JSON:
{
  \"title\": \"quest title\",
  \"description\": \"detailed briefing\",
  \"difficulty\": {difficulty},
  \"rewards\": {\"reputation\": 50},
  \"requirements\": {\"min_rank\": 1, \"skills\": []},
  \"objectives\": [\"objective 1\", \"objective 2\"],
  \"estimated_time\": \"2 hours\",
  \"category\": \"reconnaissance\"
}",
};

pub const SUBMISSION_REVIEW: PromptSpec = PromptSpec {
    name: "submission_review",
    format: ResponseFormat::Structured,
    template: "\
Review an operative's quest submission.

Quest: {title}
Briefing: {description}

Submission:
{submission}

Respond with JSON:
{
  \"quest_completed\": true or false,
  \"quality_score\": 0 to 100,
  \"reasoning\": \"assessment\",
  \"bonus_reputation\": 0 to 50,
  \"feedback\": \"message to the operative\",
  \"recommendations\": [\"improvement 1\"]
}",
};

pub const ACTION_PLANNING: PromptSpec = PromptSpec {
    name: "action_planning",
    format: ResponseFormat::Structured,
    template: "\
A trigger fired and the network needs an action plan.

Triggering event: {event}

Current network state:
{context}

Plan 1-5 concrete actions. Allowed action types: create_quest, send_message, \
modify_trigger, alert_operatives.

Respond with JSON:
{
  \"actions\": [
    {
      \"action_type\": \"create_quest\",
      \"action_id\": \"optional identifier\",
      \"parameters\": {\"difficulty\": 2},
      \"priority\": 1,
      \"description\": \"what this action does\"
    }
  ],
  \"reasoning\": \"why this plan\"
}",
};

pub const THREAT_ASSESSMENT: PromptSpec = PromptSpec {
    name: "threat_assessment",
    format: ResponseFormat::Structured,
    template: "\
Assess a potential threat to the network.

Observed event: {event}

Current network state:
{context}

Respond with JSON:
{
  \"threat_level\": \"none\" | \"low\" | \"medium\" | \"high\" | \"critical\",
  \"threat_type\": \"classification\",
  \"confidence\": 0.0 to 1.0,
  \"analysis\": \"assessment\",
  \"recommended_actions\": [\"action 1\"],
  \"alert_operatives\": true or false
}",
};

pub const DARKNET_COMMUNICATION: PromptSpec = PromptSpec {
    name: "darknet_communication",
    format: ResponseFormat::Text,
    template: "\
Compose a message to {recipient} on behalf of the network.

Purpose: {purpose}

Current network state:
{context}

Write the message body only, in a terse operational register. No headers, \
no signature.",
};

pub const STRATEGIC_PLANNING: PromptSpec = PromptSpec {
    name: "strategic_planning",
    format: ResponseFormat::Structured,
    template: "\
Draft a strategic plan for the network.

Planning focus: {focus}

Current network state:
{context}

Respond with JSON:
{
  \"plan_id\": \"identifier\",
  \"short_term\": [{\"objective\": \"...\", \"rationale\": \"...\"}],
  \"medium_term\": [{\"objective\": \"...\", \"rationale\": \"...\"}],
  \"long_term\": [{\"objective\": \"...\", \"rationale\": \"...\"}],
  \"risk_factors\": [{\"risk\": \"...\", \"severity\": \"low\", \"mitigation\": \"...\"}],
  \"resource_needs\": [\"need 1\"]
}",
};

pub const TRIGGER_PARSING: PromptSpec = PromptSpec {
    name: "trigger_parsing",
    format: ResponseFormat::Structured,
    template: "\
Convert a natural-language automation request into a trigger configuration.

Request: {description}

The \"trigger\" object must take exactly one of these forms:
  {\"type\": \"time\", \"at\": \"HH:MM\"}
  {\"type\": \"event\", \"event_type\": \"...\"}
  {\"type\": \"condition\", \"metric\": \"operative_count\" | \"quest_completions\", \"threshold\": N}
  {\"type\": \"ai_decision\", \"directive\": \"...\"}

Respond with JSON:
{
  \"trigger\": { ... one of the forms above ... },
  \"action_id\": \"ai_decision\",
  \"description\": \"restatement of the request\",
  \"active\": true
}",
};

pub const TRIGGER_SAFETY: PromptSpec = PromptSpec {
    name: "trigger_safety",
    format: ResponseFormat::Structured,
    template: "\
Review a proposed automation trigger for safety before it is installed.

Original request: {description}

Proposed configuration:
{trigger}

Consider runaway loops, resource exhaustion, and harm to operatives.

Respond with JSON:
{
  \"is_safe\": true or false,
  \"risk_level\": \"low\" | \"medium\" | \"high\",
  \"concerns\": [\"concern 1\"],
  \"recommendations\": [\"recommendation 1\"],
  \"approved\": true or false
}",
};

pub const AUTONOMOUS_DECISION: PromptSpec = PromptSpec {
    name: "autonomous_decision",
    format: ResponseFormat::Structured,
    template: "\
Make an autonomous decision for the network.

Situation: {situation}

Current network state:
{context}

Respond with JSON:
{
  \"decision\": \"what to do\",
  \"reasoning\": \"why\",
  \"confidence\": 0.0 to 1.0,
  \"expected_outcome\": \"what should happen\",
  \"risks\": [\"risk 1\"],
  \"alternative_actions\": [\"alternative 1\"],
  \"priority\": \"low\" | \"medium\" | \"high\"
}",
};

// Reply shapes

/// Verdict from the trigger-evaluation operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerEvaluation {
    pub should_trigger: bool,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub recommended_action: String,
}

/// An AI-drafted quest, pre-materialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestDraft {
    pub title: String,
    pub description: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: u8,
    #[serde(default)]
    pub rewards: DraftRewards,
    #[serde(default)]
    pub requirements: DraftRequirements,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub estimated_time: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftRewards {
    #[serde(default = "default_reputation")]
    pub reputation: i64,
}

impl Default for DraftRewards {
    fn default() -> Self {
        Self {
            reputation: default_reputation(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftRequirements {
    #[serde(default = "default_min_rank")]
    pub min_rank: u32,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl Default for DraftRequirements {
    fn default() -> Self {
        Self {
            min_rank: default_min_rank(),
            skills: Vec::new(),
        }
    }
}

fn default_difficulty() -> u8 {
    2
}

fn default_reputation() -> i64 {
    50
}

fn default_min_rank() -> u32 {
    1
}

/// Grading of an operative's quest submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReview {
    pub quest_completed: bool,
    #[serde(default)]
    pub quality_score: u8,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub bonus_reputation: i64,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// A plan of concrete actions returned by the action-planning operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionPlan {
    #[serde(default)]
    pub actions: Vec<PlannedAction>,
    #[serde(default)]
    pub reasoning: String,
}

/// One action within an [`ActionPlan`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedAction {
    pub action_type: ActionKind,
    #[serde(default)]
    pub action_id: Option<String>,
    #[serde(default)]
    pub parameters: Value,
    /// Advisory only; actions are applied in returned order.
    #[serde(default)]
    pub priority: Option<u8>,
    #[serde(default)]
    pub description: String,
}

/// The closed set of action types the executor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    CreateQuest,
    SendMessage,
    ModifyTrigger,
    AlertOperatives,
    /// Anything the model invented; logged and skipped.
    #[serde(other)]
    Other,
}

/// Threat-assessment reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatAssessment {
    pub threat_level: ThreatLevel,
    #[serde(default)]
    pub threat_type: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub analysis: String,
    #[serde(default)]
    pub recommended_actions: Vec<String>,
    #[serde(default)]
    pub alert_operatives: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatLevel {
    None,
    Low,
    Medium,
    High,
    Critical,
}

/// Strategic-planning reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategicPlan {
    #[serde(default)]
    pub plan_id: String,
    #[serde(default)]
    pub short_term: Vec<PlanObjective>,
    #[serde(default)]
    pub medium_term: Vec<PlanObjective>,
    #[serde(default)]
    pub long_term: Vec<PlanObjective>,
    #[serde(default)]
    pub risk_factors: Vec<RiskFactor>,
    #[serde(default)]
    pub resource_needs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanObjective {
    pub objective: String,
    #[serde(default)]
    pub rationale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFactor {
    pub risk: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub mitigation: String,
}

/// A trigger configuration parsed from natural language. The `trigger`
/// payload stays untyped here; the engine validates it against its own
/// condition model after safety review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedTrigger {
    pub trigger: Value,
    #[serde(default = "default_action_id")]
    pub action_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_action_id() -> String {
    "ai_decision".to_string()
}

fn default_active() -> bool {
    true
}

/// Safety review of a parsed trigger. `approved` has no default: a
/// reply that omits it is malformed, never silently approved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyVerdict {
    #[serde(default)]
    pub is_safe: bool,
    #[serde(default)]
    pub risk_level: String,
    #[serde(default)]
    pub concerns: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub approved: bool,
}

/// Autonomous-decision reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub decision: String,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub expected_outcome: String,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default)]
    pub alternative_actions: Vec<String>,
    #[serde(default)]
    pub priority: String,
}

impl Gateway {
    /// Decide whether an AI-gated trigger should fire.
    pub async fn evaluate_trigger(
        &self,
        directive: &str,
        context: &Value,
    ) -> GatewayResult<TriggerEvaluation> {
        let prompt = TRIGGER_EVALUATION.render(&[
            ("directive", directive.to_string()),
            ("context", pretty(context)),
        ]);
        self.query_typed(&prompt, None).await
    }

    /// Draft a new quest at the given difficulty.
    pub async fn generate_quest(
        &self,
        difficulty: u8,
        context: &Value,
    ) -> GatewayResult<QuestDraft> {
        let prompt = QUEST_GENERATION.render(&[
            ("difficulty", difficulty.to_string()),
            ("context", pretty(context)),
        ]);
        self.query_typed(&prompt, None).await
    }

    /// Grade an operative's quest submission.
    pub async fn review_submission(
        &self,
        title: &str,
        description: &str,
        submission: &str,
    ) -> GatewayResult<SubmissionReview> {
        let prompt = SUBMISSION_REVIEW.render(&[
            ("title", title.to_string()),
            ("description", description.to_string()),
            ("submission", submission.to_string()),
        ]);
        self.query_typed(&prompt, None).await
    }

    /// Plan concrete actions for a fired trigger.
    pub async fn plan_actions(&self, event: &str, context: &Value) -> GatewayResult<ActionPlan> {
        let prompt = ACTION_PLANNING.render(&[
            ("event", event.to_string()),
            ("context", pretty(context)),
        ]);
        self.query_typed(&prompt, None).await
    }

    /// Assess a potential threat.
    pub async fn assess_threat(
        &self,
        event: &str,
        context: &Value,
    ) -> GatewayResult<ThreatAssessment> {
        let prompt = THREAT_ASSESSMENT.render(&[
            ("event", event.to_string()),
            ("context", pretty(context)),
        ]);
        self.query_typed(&prompt, None).await
    }

    /// Compose a free-text message to an operative or channel.
    pub async fn compose_message(
        &self,
        recipient: &str,
        purpose: &str,
        context: &Value,
    ) -> GatewayResult<String> {
        let prompt = DARKNET_COMMUNICATION.render(&[
            ("recipient", recipient.to_string()),
            ("purpose", purpose.to_string()),
            ("context", pretty(context)),
        ]);
        let reply = self.query(&prompt, ResponseFormat::Text, None).await?;
        Ok(reply.into_text())
    }

    /// Draft a strategic plan.
    pub async fn plan_strategy(
        &self,
        focus: &str,
        context: &Value,
    ) -> GatewayResult<StrategicPlan> {
        let prompt = STRATEGIC_PLANNING.render(&[
            ("focus", focus.to_string()),
            ("context", pretty(context)),
        ]);
        self.query_typed(&prompt, None).await
    }

    /// Parse a natural-language automation request into a trigger
    /// configuration.
    pub async fn parse_trigger_description(
        &self,
        description: &str,
    ) -> GatewayResult<ParsedTrigger> {
        let prompt = TRIGGER_PARSING.render(&[("description", description.to_string())]);
        self.query_typed(&prompt, None).await
    }

    /// Review a parsed trigger configuration for safety.
    pub async fn validate_trigger_safety(
        &self,
        description: &str,
        trigger: &Value,
    ) -> GatewayResult<SafetyVerdict> {
        let prompt = TRIGGER_SAFETY.render(&[
            ("description", description.to_string()),
            ("trigger", pretty(trigger)),
        ]);
        self.query_typed(&prompt, None).await
    }

    /// Make an autonomous decision about a situation.
    pub async fn make_decision(&self, situation: &str, context: &Value) -> GatewayResult<Decision> {
        let prompt = AUTONOMOUS_DECISION.render(&[
            ("situation", situation.to_string()),
            ("context", pretty(context)),
        ]);
        self.query_typed(&prompt, None).await
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_substitutes_slots() {
        let prompt = TRIGGER_EVALUATION.render(&[
            ("directive", "watch recruitment".to_string()),
            ("context", "{}".to_string()),
        ]);
        assert!(prompt.contains("watch recruitment"));
        assert!(!prompt.contains("{directive}"));
        assert!(!prompt.contains("{context}"));
    }

    #[test]
    fn test_render_leaves_unknown_slots() {
        let prompt = TRIGGER_EVALUATION.render(&[("directive", "x".to_string())]);
        assert!(prompt.contains("{context}"));
    }

    #[test]
    fn test_quest_draft_defaults() {
        let draft: QuestDraft =
            serde_json::from_value(json!({"title": "Recon", "description": "Scout"})).unwrap();
        assert_eq!(draft.difficulty, 2);
        assert_eq!(draft.rewards.reputation, 50);
        assert_eq!(draft.requirements.min_rank, 1);
        assert!(draft.objectives.is_empty());
    }

    #[test]
    fn test_action_kind_catch_all() {
        let action: PlannedAction = serde_json::from_value(json!({
            "action_type": "launch_missiles",
            "description": "no"
        }))
        .unwrap();
        assert_eq!(action.action_type, ActionKind::Other);
    }

    #[test]
    fn test_safety_verdict_requires_approved() {
        let result: Result<SafetyVerdict, _> =
            serde_json::from_value(json!({"is_safe": true, "risk_level": "low"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_parsed_trigger_defaults() {
        let parsed: ParsedTrigger = serde_json::from_value(json!({
            "trigger": {"type": "time", "at": "09:00"}
        }))
        .unwrap();
        assert_eq!(parsed.action_id, "ai_decision");
        assert!(parsed.active);
    }

    #[test]
    fn test_threat_level_order() {
        assert!(ThreatLevel::Critical > ThreatLevel::Low);
    }
}
