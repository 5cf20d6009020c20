use std::{collections::BTreeMap, fmt::Write as _, path::Path};

use serde::Serialize;
use serde_json::json;

use crate::{
    device::{HttpTransport, NxapiClient, Transport},
    error::{QoscError, Result},
    policy::ExecutionResult,
    service::{PolicyService, Registration},
    store::InMemoryRepository,
};

use super::{
    args::{Args, Command},
    loader::SettingsLoader,
};

/// Run the selected subcommand and return the process exit code
pub async fn run(args: &Args) -> Result<i32> {
    let config = SettingsLoader::config(args)?;
    let service = PolicyService::new(InMemoryRepository::new());

    match &args.command {
        Command::Validate { file } => validate(&service, file, args.json),
        Command::Preview { file } => preview(&service, file, args.json),
        Command::Apply { file, dry_run } => {
            let registration = service.upload_file(file)?;
            if !registration.is_valid() {
                emit(args.json, &registration, || render_registration(&registration))?;
                return Ok(1);
            }

            let settings = SettingsLoader::device(&args.device, &config)?;
            let client = NxapiClient::new(HttpTransport::new(&settings)?);
            let dry_run = SettingsLoader::dry_run(*dry_run, &config);
            log::info!("applying {} to {}", registration.policy.id, settings.url());

            apply(&service, &registration.policy.id, &client, dry_run, args.json).await
        }
        Command::Check => {
            let settings = SettingsLoader::device(&args.device, &config)?;
            let client = NxapiClient::new(HttpTransport::new(&settings)?);
            check(&client, &settings.host, args.json).await
        }
        Command::ShowConfig { section } => {
            let settings = SettingsLoader::device(&args.device, &config)?;
            let client = NxapiClient::new(HttpTransport::new(&settings)?);
            let text = client.get_running_config(section.as_deref()).await;
            emit(
                args.json,
                &json!({ "section": section, "config": text }),
                || text.clone(),
            )?;
            Ok(0)
        }
        Command::Verify { patterns } => {
            let settings = SettingsLoader::device(&args.device, &config)?;
            let client = NxapiClient::new(HttpTransport::new(&settings)?);
            verify(&client, patterns, args.json).await
        }
    }
}

fn validate(service: &PolicyService<InMemoryRepository>, file: &Path, json: bool) -> Result<i32> {
    let registration = service.upload_file(file)?;
    emit(json, &registration, || render_registration(&registration))?;
    Ok(if registration.is_valid() { 0 } else { 1 })
}

fn preview(service: &PolicyService<InMemoryRepository>, file: &Path, json: bool) -> Result<i32> {
    let registration = service.upload_file(file)?;
    if !registration.is_valid() {
        emit(json, &registration, || render_registration(&registration))?;
        return Ok(1);
    }

    let preview = service.preview(&registration.policy.id)?;
    emit(json, &preview, || preview.text.clone())?;
    Ok(0)
}

async fn apply<T: Transport>(
    service: &PolicyService<InMemoryRepository>,
    id: &str,
    client: &NxapiClient<T>,
    dry_run: bool,
    json: bool,
) -> Result<i32> {
    let result = match service.apply(id, client, dry_run).await {
        Ok(result) => result,
        Err(QoscError::DeviceUnreachable) => {
            eprintln!("{}", QoscError::DeviceUnreachable);
            return Ok(1);
        }
        Err(err) => return Err(err),
    };

    emit(json, &result.summary(), || render_execution(&result))?;
    Ok(if result.success { 0 } else { 1 })
}

async fn check<T: Transport>(client: &NxapiClient<T>, host: &str, json: bool) -> Result<i32> {
    let connected = client.test_connection().await;
    emit(json, &json!({ "host": host, "connected": connected }), || {
        if connected {
            format!("Connected to {host}")
        } else {
            format!("Failed to connect to {host}")
        }
    })?;
    Ok(if connected { 0 } else { 1 })
}

async fn verify<T: Transport>(
    client: &NxapiClient<T>,
    patterns: &[String],
    json: bool,
) -> Result<i32> {
    let found = client.verify_configuration(patterns).await;
    emit(json, &found, || render_verification(&found))?;
    Ok(if found.values().all(|present| *present) { 0 } else { 1 })
}

/// Print `value` as pretty JSON, or the text rendering otherwise
fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}

fn render_registration(registration: &Registration) -> String {
    let policy = &registration.policy;
    let mut out = format!(
        "Policy {} ({}): {}\n  access lists: {}, class maps: {}, policy maps: {}, service policies: {}",
        policy.id,
        policy.name,
        if registration.is_valid() { "valid" } else { "invalid" },
        policy.access_lists_count,
        policy.class_maps_count,
        policy.policy_maps_count,
        policy.service_policies_count,
    );
    for issue in &registration.report.issues {
        let _ = write!(out, "\n  {issue}");
    }
    out
}

fn render_execution(result: &ExecutionResult) -> String {
    let mut out = format!(
        "{}\n  policy: {}  mode: {}  duration: {}ms",
        result.message,
        result.policy_id,
        if result.dry_run { "dry-run" } else { "execute" },
        result.duration_ms,
    );
    if result.dry_run {
        for command in &result.commands {
            let _ = write!(out, "\n    {command}");
        }
    }
    if let Some(command) = &result.failed_command {
        let _ = write!(out, "\n  failed command: {command}");
    }
    for error in &result.errors {
        let _ = write!(out, "\n  error: {error}");
    }
    out
}

fn render_verification(found: &BTreeMap<String, bool>) -> String {
    found
        .iter()
        .map(|(pattern, present)| {
            format!("[{}] {pattern}", if *present { "PRESENT" } else { "MISSING" })
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        device::{TransportError, transport::MockTransport},
        policy::{CommandOutcome, Direction, Policy, ServicePolicy},
    };
    use rstest::rstest;

    fn client<F>(reply: F) -> NxapiClient<MockTransport>
    where
        F: Fn() -> std::result::Result<String, TransportError> + Send + 'static,
    {
        let mut transport = MockTransport::new();
        transport.expect_send().times(1).returning(move |_| reply());
        NxapiClient::new(transport)
    }

    #[tokio::test]
    async fn check_reports_exit_code() {
        let up = client(|| Ok(r#"{"result":{"body":{}},"id":1}"#.to_string()));
        assert_eq!(check(&up, "sw1", true).await.unwrap(), 0);

        let down = client(|| Err(TransportError::Connect("refused".to_string())));
        assert_eq!(check(&down, "sw1", false).await.unwrap(), 1);
    }

    #[rstest]
    #[case("ip access-list ACL1", 0)]
    #[case("policy-map type qos PM9", 1)]
    #[tokio::test]
    async fn verify_exit_code_follows_missing_patterns(#[case] pattern: &str, #[case] code: i32) {
        let device = client(|| {
            Ok(r#"{"result":{"body":"ip access-list ACL1\n  10 permit ip any any\n"},"id":1}"#
                .to_string())
        });
        let patterns = vec![pattern.to_string()];

        assert_eq!(verify(&device, &patterns, true).await.unwrap(), code);
    }

    #[tokio::test]
    async fn apply_unreachable_switch_exits_nonzero() {
        let service = PolicyService::new(InMemoryRepository::new());
        service.register(Policy::new("p1", "n", "d"));
        let device = client(|| Err(TransportError::Timeout(30)));

        assert_eq!(apply(&service, "p1", &device, false, true).await.unwrap(), 1);
    }

    #[test]
    fn registration_lists_issues() {
        let service = PolicyService::new(InMemoryRepository::new());
        let mut policy = Policy::new("p1", "Voice", "d");
        policy.service_policies.push(ServicePolicy {
            interface: "Ethernet1/1".to_string(),
            direction: Direction::Input,
            policy_map: "PM9".to_string(),
        });

        let text = render_registration(&service.register(policy));

        assert!(text.starts_with("Policy p1 (Voice): invalid\n"));
        assert!(text.contains("[ERROR] service_policies:"));
    }

    #[test]
    fn execution_shows_failed_command() {
        let mut result = ExecutionResult::new("p1", vec!["interface Ethernet1/1".to_string()], false);
        result
            .command_results
            .push(CommandOutcome::failed("interface Ethernet1/1", "boom"));
        result.failed_command = Some("interface Ethernet1/1".to_string());
        result.fail("Command #1 failed: boom");

        let text = render_execution(&result);

        assert!(text.starts_with("Command #1 failed: boom\n  policy: p1  mode: execute"));
        assert!(text.contains("failed command: interface Ethernet1/1"));
        assert!(text.ends_with("error: Command #1 failed: boom"));
    }

    #[test]
    fn verification_marks_each_pattern() {
        let found = BTreeMap::from([("a".to_string(), true), ("b".to_string(), false)]);
        assert_eq!(render_verification(&found), "[PRESENT] a\n[MISSING] b");
    }
}
