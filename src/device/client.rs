use std::{collections::BTreeMap, time::Instant};

use serde_json::Value;

use super::{
    rpc::{self, BatchOutcome, Method, RpcRequest},
    transport::{Transport, TransportError},
};
use crate::policy::{CommandOutcome, ExecutionResult};

/// Policy id used until the caller attaches the real one
pub const UNASSIGNED_POLICY: &str = "unknown";

/// Reply to a read-only query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShowOutcome {
    pub success: bool,
    pub bodies: Vec<Option<Value>>,
    pub error: Option<String>,
}

enum ExchangeError {
    Transport(TransportError),
    Undecodable { detail: String, raw: String },
}

impl ExchangeError {
    fn message(&self) -> String {
        match self {
            ExchangeError::Transport(err) => err.to_string(),
            ExchangeError::Undecodable { detail, .. } => {
                format!("Failed to parse JSON response: {detail}")
            }
        }
    }
}

/// NX-API client for one device
pub struct NxapiClient<T: Transport> {
    transport: T,
}

impl<T: Transport> NxapiClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Issue `show version`; true iff the device answered successfully
    pub async fn test_connection(&self) -> bool {
        let outcome = self.show_command("show version").await;
        if let Some(error) = &outcome.error {
            log::warn!("Connection test failed: {error}");
        }
        outcome.success
    }

    /// Run a single read-only command
    pub async fn show_command(&self, command: &str) -> ShowOutcome {
        let batch = rpc::build_batch(&[command.to_string()], Method::Cli);

        match self.exchange(&batch).await {
            Ok(BatchOutcome::Completed { bodies }) => ShowOutcome {
                success: true,
                bodies,
                error: None,
            },
            Ok(BatchOutcome::Rejected { message, .. }) => ShowOutcome {
                success: false,
                bodies: Vec::new(),
                error: Some(message),
            },
            Err(err) => ShowOutcome {
                success: false,
                bodies: Vec::new(),
                error: Some(err.message()),
            },
        }
    }

    /// Push configuration commands to the device as one batch
    ///
    /// Blank lines and `#` comments are dropped before sending. Transport and
    /// device failures are folded into the returned result; this never fails.
    /// With `dry_run` nothing is sent.
    pub async fn execute_commands(&self, commands: &[String], dry_run: bool) -> ExecutionResult {
        let started = Instant::now();
        let mut result = ExecutionResult::new(UNASSIGNED_POLICY, commands.to_vec(), dry_run);

        self.run_batch(&mut result).await;

        result.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        result
    }

    async fn run_batch(&self, result: &mut ExecutionResult) {
        if result.dry_run {
            result.message = "Dry-run mode: commands not executed".to_string();
            log::info!("Dry-run: skipped {} commands", result.commands.len());
            return;
        }

        let valid = executable_commands(&result.commands);
        if valid.is_empty() {
            result.message = "No valid commands to execute".to_string();
            return;
        }

        log::info!("Sending {} commands to device", valid.len());
        let batch = rpc::build_batch(&valid, Method::CliConf);

        match self.exchange(&batch).await {
            Ok(BatchOutcome::Completed { bodies }) => {
                result.message = format!("Successfully executed {} commands", valid.len());
                result.command_results = valid
                    .iter()
                    .enumerate()
                    .map(|(index, command)| {
                        let output = bodies
                            .get(index)
                            .and_then(Option::as_ref)
                            .map(rpc::body_text);
                        CommandOutcome::succeeded(command.as_str(), output)
                    })
                    .collect();
            }
            Ok(BatchOutcome::Rejected { index, message }) => {
                log::error!("{message}");
                result.fail(message.as_str());
                result.failed_command = valid.get(index).cloned();
                result.command_results = valid
                    .iter()
                    .map(|command| CommandOutcome::failed(command.as_str(), message.as_str()))
                    .collect();
            }
            Err(err) => {
                let message = err.message();
                log::error!("{message}");
                result.fail(message);
                if let ExchangeError::Undecodable { raw, .. } = err {
                    result.raw_response = Some(raw);
                }
            }
        }
    }

    async fn exchange(&self, batch: &[RpcRequest]) -> Result<BatchOutcome, ExchangeError> {
        let raw = match self.transport.send(batch).await {
            Ok(raw) => raw,
            Err(err) => {
                // Command errors arrive with an HTTP error status
                if let TransportError::Status { body, .. } = &err
                    && let Ok(responses) = rpc::decode_reply(body)
                    && let rejected @ BatchOutcome::Rejected { .. } = rpc::inspect(responses)
                {
                    return Ok(rejected);
                }
                return Err(ExchangeError::Transport(err));
            }
        };

        match rpc::decode_reply(&raw) {
            Ok(responses) => Ok(rpc::inspect(responses)),
            Err(err) => Err(ExchangeError::Undecodable {
                detail: err.to_string(),
                raw,
            }),
        }
    }

    /// Running configuration, optionally limited to a section; empty on failure
    pub async fn get_running_config(&self, section: Option<&str>) -> String {
        let command = match section {
            Some(section) => format!("show running-config {section}"),
            None => "show running-config".to_string(),
        };

        let outcome = self.show_command(&command).await;
        if !outcome.success {
            log::warn!(
                "'{command}' failed: {}",
                outcome.error.as_deref().unwrap_or("unknown error")
            );
            return String::new();
        }

        outcome
            .bodies
            .first()
            .and_then(Option::as_ref)
            .map(rpc::body_text)
            .unwrap_or_default()
    }

    /// Check which snippets appear in the running configuration
    pub async fn verify_configuration(&self, expected: &[String]) -> BTreeMap<String, bool> {
        let config = self.get_running_config(None).await;
        expected
            .iter()
            .map(|pattern| (pattern.clone(), config.contains(pattern.as_str())))
            .collect()
    }
}

fn executable_commands(commands: &[String]) -> Vec<String> {
    commands
        .iter()
        .map(|command| command.trim())
        .filter(|command| !command.is_empty() && !command.starts_with('#'))
        .map(String::from)
        .collect()
}
