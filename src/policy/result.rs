use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of a single command sent to the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutcome {
    pub command: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandOutcome {
    pub fn succeeded(command: impl Into<String>, output: Option<String>) -> Self {
        Self {
            command: command.into(),
            success: true,
            output,
            error: None,
        }
    }

    pub fn failed(command: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            success: false,
            output: None,
            error: Some(error.into()),
        }
    }
}

/// Result of pushing a command batch to a device
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    /// Policy the commands were generated from (by id only)
    pub policy_id: String,
    pub success: bool,
    pub message: String,
    /// Full command list handed to the client, blank separators included
    pub commands: Vec<String>,
    pub command_results: Vec<CommandOutcome>,
    pub errors: Vec<String>,
    /// First command the device rejected
    pub failed_command: Option<String>,
    /// Device reply kept for diagnostics when it could not be interpreted
    pub raw_response: Option<String>,
    pub executed_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub dry_run: bool,
}

impl ExecutionResult {
    pub fn new(policy_id: impl Into<String>, commands: Vec<String>, dry_run: bool) -> Self {
        Self {
            policy_id: policy_id.into(),
            success: true,
            message: String::new(),
            commands,
            command_results: Vec::new(),
            errors: Vec::new(),
            failed_command: None,
            raw_response: None,
            executed_at: Utc::now(),
            duration_ms: 0,
            dry_run,
        }
    }

    /// Record an error; the result is failed from then on
    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.success = false;
    }

    /// Mark the whole result failed with `message` as both summary and error
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.add_error(message.clone());
        self.message = message;
    }

    pub fn summary(&self) -> ExecutionSummary {
        ExecutionSummary {
            policy_id: self.policy_id.clone(),
            success: self.success,
            message: self.message.clone(),
            commands_count: self.commands.len(),
            errors_count: self.errors.len(),
            failed_command: self.failed_command.clone(),
            executed_at: self.executed_at,
            duration_ms: self.duration_ms,
            dry_run: self.dry_run,
            details: ExecutionDetails {
                commands: self.commands.clone(),
                errors: self.errors.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionDetails {
    pub commands: Vec<String>,
    pub errors: Vec<String>,
}

/// Serializable report of an execution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionSummary {
    pub policy_id: String,
    pub success: bool,
    pub message: String,
    pub commands_count: usize,
    pub errors_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_command: Option<String>,
    pub executed_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub dry_run: bool,
    pub details: ExecutionDetails,
}
