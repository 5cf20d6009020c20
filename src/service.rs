use std::path::Path;

use serde::Serialize;

use crate::{
    device::{NxapiClient, Transport},
    error::{QoscError, Result},
    policy::{
        ExecutionResult, Policy, PolicyStatus, PolicySummary, ValidationReport, command_count,
        generate, parse_file, preview, validate,
    },
    store::PolicyRepository,
};

/// Log target for the per-operation audit trail
pub const OPS_TARGET: &str = "qosc::ops";

/// Outcome of registering a policy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registration {
    pub policy: PolicySummary,
    pub report: ValidationReport,
}

impl Registration {
    pub fn is_valid(&self) -> bool {
        self.report.is_valid()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandPreview {
    pub policy_id: String,
    pub commands: Vec<String>,
    pub text: String,
    pub command_count: usize,
}

/// Upload, preview and apply workflow over a policy repository
///
/// Lookups (`get`, `list`, `delete`, `last_result`) only see what earlier
/// calls on the same repository stored.
pub struct PolicyService<R: PolicyRepository> {
    repository: R,
}

impl<R: PolicyRepository> PolicyService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Parse a policy file and register it
    pub fn upload_file(&self, path: &Path) -> Result<Registration> {
        let policy = parse_file(path).inspect_err(|err| {
            log::error!(target: OPS_TARGET, "policy upload failed: {} ({err})", path.display());
        })?;
        log::info!(target: OPS_TARGET, "policy upload: {} from {}", policy.id, path.display());
        Ok(self.register(policy))
    }

    /// Validate a parsed policy; only valid policies are stored
    pub fn register(&self, mut policy: Policy) -> Registration {
        let report = validate(&policy);
        log::info!(
            target: OPS_TARGET,
            "policy validation: {} valid={} errors={} warnings={}",
            policy.id,
            report.is_valid(),
            report.errors().count(),
            report.warnings().count()
        );
        for issue in &report.issues {
            log::debug!("{}: {issue}", policy.id);
        }

        let summary = if report.is_valid() {
            policy.transition(PolicyStatus::Validated);
            let summary = policy.summary();
            self.repository.put(policy);
            summary
        } else {
            policy.summary()
        };

        Registration {
            policy: summary,
            report,
        }
    }

    pub fn get(&self, id: &str) -> Result<Policy> {
        self.repository
            .get(id)
            .ok_or_else(|| QoscError::PolicyNotFound { id: id.to_string() })
    }

    /// Summaries of every stored policy, newest first
    pub fn list(&self) -> Vec<PolicySummary> {
        let mut summaries: Vec<PolicySummary> = self
            .repository
            .list()
            .iter()
            .map(Policy::summary)
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        summaries
    }

    pub fn delete(&self, id: &str) -> Result<PolicySummary> {
        let policy = self
            .repository
            .delete(id)
            .ok_or_else(|| QoscError::PolicyNotFound { id: id.to_string() })?;
        log::info!(target: OPS_TARGET, "policy delete: {id}");
        Ok(policy.summary())
    }

    pub fn preview(&self, id: &str) -> Result<CommandPreview> {
        let policy = self.get(id)?;
        let commands = generate(&policy);
        Ok(CommandPreview {
            policy_id: policy.id.clone(),
            command_count: command_count(&commands),
            text: preview(&policy),
            commands,
        })
    }

    /// Generate the policy's commands and push them through `client`
    ///
    /// Live runs check connectivity first. The policy moves to `applied` on a
    /// successful live run and to `failed` on any failed run; dry runs leave
    /// a successful policy untouched.
    pub async fn apply<T: Transport>(
        &self,
        id: &str,
        client: &NxapiClient<T>,
        dry_run: bool,
    ) -> Result<ExecutionResult> {
        let mut policy = self.get(id)?;
        if !matches!(
            policy.status,
            PolicyStatus::Validated | PolicyStatus::Applied | PolicyStatus::Failed
        ) {
            return Err(QoscError::NotDeployable {
                id: policy.id,
                status: policy.status.to_string(),
            });
        }

        let commands = generate(&policy);

        if !dry_run && !client.test_connection().await {
            log::error!(target: OPS_TARGET, "policy apply: {id} aborted, switch unreachable");
            return Err(QoscError::DeviceUnreachable);
        }

        let mut result = client.execute_commands(&commands, dry_run).await;
        result.policy_id = policy.id.clone();

        if !result.success {
            policy.transition(PolicyStatus::Failed);
        } else if !dry_run {
            policy.transition(PolicyStatus::Applied);
        }

        log::info!(
            target: OPS_TARGET,
            "policy apply: {} ({}) success={} duration_ms={} commands={}",
            policy.id,
            if dry_run { "dry-run" } else { "execute" },
            result.success,
            result.duration_ms,
            command_count(&commands)
        );

        self.repository.put(policy);
        self.repository.put_result(result.clone());
        Ok(result)
    }

    pub fn last_result(&self, id: &str) -> Option<ExecutionResult> {
        self.repository.last_result(id)
    }
}
