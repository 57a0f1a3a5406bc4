//! In-memory policy lifecycle registry
//!
//! Policies move through DRAFT, APPROVED, SUSPENDED and REJECTED. At most
//! one approved policy is active at a time. The active policy is held in an
//! atomic snapshot so readers on the decision path never take a lock:
//!
//! ```text
//! ┌─────────────┐
//! │   Readers   │ (decision path, lock-free)
//! └──────┬──────┘
//!        │ load_full()
//!        ▼
//! ┌──────────────────────────┐
//! │ ArcSwapOption<Policy>    │ ◄─── swap on approve / suspend
//! └──────────────────────────┘
//!        ▲
//!        │ validate, diff & swap
//! ┌──────┴──────┐
//! │  approve()  │ (registry write lock)
//! └─────────────┘
//! ```

use crate::config::EngineConfig;
use crate::diff::{diff_policies, PolicyDiff};
use crate::policy::{ExecutablePolicy, PolicyStatus};
use crate::validation::{validate_policy, PolicyValidation, Severity};
use crate::{Error, Result};
use arc_swap::ArcSwapOption;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

/// Result of activating a policy
#[derive(Debug, Clone)]
pub struct Activation {
    pub policy: Arc<ExecutablePolicy>,
    pub validation: PolicyValidation,
    /// Changes against the previously active policy, empty if none was active
    pub diffs: Vec<PolicyDiff>,
    pub previous_policy_id: Option<String>,
}

#[derive(Debug, Default)]
struct StoreStats {
    reads: AtomicU64,
    activations: AtomicU64,
}

/// Snapshot of store statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStatSnapshot {
    pub policies: usize,
    pub reads: u64,
    pub activations: u64,
}

pub struct PolicyStore {
    policies: RwLock<HashMap<String, ExecutablePolicy>>,
    active: ArcSwapOption<ExecutablePolicy>,
    config: EngineConfig,
    stats: StoreStats,
}

impl PolicyStore {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            policies: RwLock::new(HashMap::new()),
            active: ArcSwapOption::empty(),
            config,
            stats: StoreStats::default(),
        }
    }

    /// Insert or replace a policy, returning its id
    ///
    /// Replacing the active policy's record does not change what is active
    /// until it is approved again.
    pub fn store(&self, policy: ExecutablePolicy) -> String {
        let policy_id = policy.policy_id.clone();
        info!(policy_id = %policy_id, version = policy.version, status = %policy.status, "stored policy");
        self.policies.write().insert(policy_id.clone(), policy);
        policy_id
    }

    pub fn get(&self, policy_id: &str) -> Option<ExecutablePolicy> {
        self.policies.read().get(policy_id).cloned()
    }

    /// All policies, newest first
    pub fn list(&self) -> Vec<ExecutablePolicy> {
        let mut policies: Vec<ExecutablePolicy> = self.policies.read().values().cloned().collect();
        policies.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.policy_id.cmp(&b.policy_id)));
        policies
    }

    pub fn by_status(&self, status: PolicyStatus) -> Vec<ExecutablePolicy> {
        self.list().into_iter().filter(|p| p.status == status).collect()
    }

    /// The active policy, if any
    #[inline]
    pub fn active(&self) -> Option<Arc<ExecutablePolicy>> {
        self.stats.reads.fetch_add(1, Ordering::Relaxed);
        self.active.load_full()
    }

    /// Validate and activate a policy
    ///
    /// A CRITICAL validation leaves the policy in DRAFT with its report
    /// attached and fails with [`Error::PolicyRejected`]. On success the
    /// previously active policy is suspended and the diff against it is
    /// returned.
    pub fn approve(&self, policy_id: &str) -> Result<Activation> {
        let mut policies = self.policies.write();
        let policy = policies
            .get_mut(policy_id)
            .ok_or_else(|| Error::PolicyNotFound(policy_id.to_string()))?;
        Self::check_transition(policy, PolicyStatus::Approved)?;

        let validation = validate_policy(policy, &self.config);
        policy.validation = validation.clone();
        if validation.severity == Severity::Critical {
            return Err(Error::PolicyRejected {
                policy_id: policy_id.to_string(),
                reason: validation.missing_elements.join(", "),
            });
        }

        policy.status = PolicyStatus::Approved;
        let approved = Arc::new(policy.clone());

        let previous = self.active.load_full().filter(|p| p.policy_id != policy_id);
        let diffs = previous
            .as_deref()
            .map(|prev| diff_policies(prev, &approved))
            .unwrap_or_default();

        if let Some(prev) = &previous {
            if let Some(superseded) = policies.get_mut(&prev.policy_id) {
                superseded.status = PolicyStatus::Suspended;
            }
            info!(policy_id = %prev.policy_id, superseded_by = %policy_id, "suspended superseded policy");
        }

        for diff in &diffs {
            info!(policy_id = %policy_id, kind = %diff.kind, item = %diff.item_id, "{}", diff);
        }

        self.active.store(Some(Arc::clone(&approved)));
        self.stats.activations.fetch_add(1, Ordering::Relaxed);
        info!(
            policy_id = %policy_id,
            severity = %validation.severity,
            coverage = validation.coverage_pct,
            changes = diffs.len(),
            "activated policy"
        );

        Ok(Activation {
            policy: approved,
            validation,
            diffs,
            previous_policy_id: previous.map(|p| p.policy_id.clone()),
        })
    }

    pub fn reject(&self, policy_id: &str) -> Result<ExecutablePolicy> {
        self.transition(policy_id, PolicyStatus::Rejected)
    }

    /// Suspend a policy, deactivating it if it is active
    pub fn suspend(&self, policy_id: &str) -> Result<ExecutablePolicy> {
        let policy = self.transition(policy_id, PolicyStatus::Suspended)?;
        let is_active = self.active.load_full().is_some_and(|p| p.policy_id == policy_id);
        if is_active {
            self.active.store(None);
            info!(policy_id = %policy_id, "deactivated policy");
        }
        Ok(policy)
    }

    pub fn stats(&self) -> StoreStatSnapshot {
        StoreStatSnapshot {
            policies: self.policies.read().len(),
            reads: self.stats.reads.load(Ordering::Relaxed),
            activations: self.stats.activations.load(Ordering::Relaxed),
        }
    }

    fn transition(&self, policy_id: &str, to: PolicyStatus) -> Result<ExecutablePolicy> {
        let mut policies = self.policies.write();
        let policy = policies
            .get_mut(policy_id)
            .ok_or_else(|| Error::PolicyNotFound(policy_id.to_string()))?;
        Self::check_transition(policy, to)?;
        info!(policy_id = %policy_id, from = %policy.status, to = %to, "policy transition");
        policy.status = to;
        Ok(policy.clone())
    }

    fn check_transition(policy: &ExecutablePolicy, to: PolicyStatus) -> Result<()> {
        let allowed = match to {
            PolicyStatus::Approved | PolicyStatus::Rejected => {
                matches!(policy.status, PolicyStatus::Draft | PolicyStatus::Suspended)
            }
            PolicyStatus::Suspended => policy.status == PolicyStatus::Approved,
            PolicyStatus::Draft => false,
        };
        if allowed {
            Ok(())
        } else {
            Err(Error::InvalidTransition { policy_id: policy.policy_id.clone(), from: policy.status, to })
        }
    }
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
