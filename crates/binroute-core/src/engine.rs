//! Decision engine
//!
//! Rules are scanned in ascending priority, list order breaking ties. The
//! first rule whose condition evaluates true decides. A rule whose condition
//! fails to lex, parse or evaluate is logged and skipped. When the scan is
//! exhausted the policy's default action applies, so every call yields
//! exactly one [`Decision`].

use crate::cache::ConditionCache;
use crate::config::EngineConfig;
use crate::context::{DefectInspection, EvaluationContext, PartClassification};
use crate::interpreter::evaluate;
use crate::parser::parse_condition;
use crate::policy::{priority_order, Action, DecisionRule, DefaultAction, DocumentSource, ExecutablePolicy};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Rule id reported when no rule matched
pub const DEFAULT_RULE_ID: &str = "DEFAULT";

/// Condition text reported when no rule matched
pub const NO_RULE_MATCHED: &str = "no_rule_matched";

/// Routing decision for one part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: Action,
    pub target_bin: String,
    pub rule_id: String,
    pub rule_condition: String,
    pub confidence: f64,
    pub source: Option<DocumentSource>,
    pub requires_operator: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<RuleTrace>,
}

impl Decision {
    fn from_rule(rule: &DecisionRule, confidence: f64) -> Self {
        Self {
            action: rule.action,
            target_bin: rule.target_bin.clone(),
            rule_id: rule.id.clone(),
            rule_condition: rule.condition.clone(),
            confidence,
            source: rule.source.clone(),
            requires_operator: rule.action == Action::ManualReview,
            trace: Vec::new(),
        }
    }

    fn fallback(default: &DefaultAction, confidence: f64) -> Self {
        Self {
            action: default.action,
            target_bin: default.target_bin.clone(),
            rule_id: DEFAULT_RULE_ID.to_string(),
            rule_condition: NO_RULE_MATCHED.to_string(),
            confidence,
            source: None,
            requires_operator: default.action == Action::ManualReview,
            trace: Vec::new(),
        }
    }

    /// Check if no rule matched
    pub fn is_default(&self) -> bool {
        self.rule_id == DEFAULT_RULE_ID
    }
}

/// What happened to one rule during a scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RuleOutcome {
    Matched,
    NotMatched,
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTrace {
    pub rule_id: String,
    #[serde(flatten)]
    pub outcome: RuleOutcome,
}

/// Applies prioritized rules to fact contexts
pub struct DecisionEngine {
    config: EngineConfig,
    cache: Option<Arc<ConditionCache>>,
}

impl DecisionEngine {
    pub fn new(config: EngineConfig) -> Self {
        let cache = config.cache_conditions.then(|| Arc::new(ConditionCache::new()));
        Self { config, cache }
    }

    /// Create an engine sharing an existing condition cache
    pub fn with_cache(config: EngineConfig, cache: Arc<ConditionCache>) -> Self {
        Self { config, cache: Some(cache) }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> Option<&ConditionCache> {
        self.cache.as_deref()
    }

    /// Decide a route for one fact context
    ///
    /// `confidence` is carried into the decision unchanged.
    pub fn decide(
        &self,
        rules: &[DecisionRule],
        default: &DefaultAction,
        ctx: &EvaluationContext,
        confidence: f64,
    ) -> Decision {
        self.scan(rules, default, ctx, confidence, self.config.trace_decisions)
    }

    /// Decide and record the outcome of every rule visited
    pub fn decide_traced(
        &self,
        rules: &[DecisionRule],
        default: &DefaultAction,
        ctx: &EvaluationContext,
        confidence: f64,
    ) -> Decision {
        self.scan(rules, default, ctx, confidence, true)
    }

    /// Decide using a policy's rules and default action
    pub fn decide_policy(&self, policy: &ExecutablePolicy, ctx: &EvaluationContext, confidence: f64) -> Decision {
        self.decide(&policy.decision_rules, &policy.default_action, ctx, confidence)
    }

    /// Decide from a part inspection, propagating the classification
    /// confidence
    pub fn decide_inspection(
        &self,
        policy: &ExecutablePolicy,
        classification: &PartClassification,
        defects: &DefectInspection,
    ) -> Decision {
        let ctx = EvaluationContext::from_inspection(classification, defects);
        self.decide_policy(policy, &ctx, classification.confidence)
    }

    fn scan(
        &self,
        rules: &[DecisionRule],
        default: &DefaultAction,
        ctx: &EvaluationContext,
        confidence: f64,
        keep_trace: bool,
    ) -> Decision {
        let mut trace = Vec::new();

        for rule in priority_order(rules) {
            let outcome = match self.evaluate_rule(rule, ctx) {
                Ok(true) => RuleOutcome::Matched,
                Ok(false) => RuleOutcome::NotMatched,
                Err(e) => {
                    warn!(rule_id = %rule.id, condition = %rule.condition, error = %e, "skipping rule");
                    RuleOutcome::Skipped { reason: e.to_string() }
                }
            };
            debug!(rule_id = %rule.id, priority = rule.priority, ?outcome, "evaluated rule");

            let matched = outcome == RuleOutcome::Matched;
            if keep_trace {
                trace.push(RuleTrace { rule_id: rule.id.clone(), outcome });
            }

            if matched {
                info!(rule_id = %rule.id, action = %rule.action, target_bin = %rule.target_bin, "rule matched");
                return Decision { trace, ..Decision::from_rule(rule, confidence) };
            }
        }

        info!(action = %default.action, target_bin = %default.target_bin, "no rule matched, applying default");
        Decision { trace, ..Decision::fallback(default, confidence) }
    }

    fn evaluate_rule(&self, rule: &DecisionRule, ctx: &EvaluationContext) -> Result<bool> {
        match &self.cache {
            Some(cache) => {
                let expr = cache.get_or_parse(&rule.id, &rule.condition)?;
                Ok(evaluate(&expr, ctx)?)
            }
            None => {
                let expr = parse_condition(&rule.condition)?;
                Ok(evaluate(&expr, ctx)?)
            }
        }
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Decide without a cache
pub fn decide(
    rules: &[DecisionRule],
    default: &DefaultAction,
    ctx: &EvaluationContext,
    confidence: f64,
) -> Decision {
    let config = EngineConfig { cache_conditions: false, ..EngineConfig::default() };
    DecisionEngine::new(config).decide(rules, default, ctx, confidence)
}
