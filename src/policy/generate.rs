use super::model::{
    AccessList, AccessListRule, ClassMap, MatchCondition, Policy, PolicyAction, PolicyMap,
    PortSpec, ServicePolicy,
};

const DEFAULT_POLICE_RATE: &str = "10m";
const DEFAULT_BANDWIDTH: &str = "10";

/// Render a policy into NX-OS configuration lines
///
/// Blocks are emitted in device dependency order: access lists, class maps,
/// policy maps, then interface bindings. Each block ends with an empty
/// separator line.
pub fn generate(policy: &Policy) -> Vec<String> {
    let mut commands = Vec::new();

    for acl in &policy.access_lists {
        access_list_commands(acl, &mut commands);
    }
    for class_map in &policy.class_maps {
        class_map_commands(class_map, &mut commands);
    }
    for policy_map in &policy.policy_maps {
        policy_map_commands(policy_map, &mut commands);
    }
    for service_policy in &policy.service_policies {
        service_policy_commands(service_policy, &mut commands);
    }

    commands
}

/// Number of lines that carry a command
pub fn command_count(commands: &[String]) -> usize {
    commands
        .iter()
        .filter(|command| !command.trim().is_empty())
        .count()
}

/// Commented header followed by the generated commands
pub fn preview(policy: &Policy) -> String {
    let commands = generate(policy);

    let mut output = format!("# Policy: {}\n", policy.name);
    output.push_str(&format!("# Description: {}\n", policy.description));
    output.push_str(&format!("# Total Commands: {}\n", command_count(&commands)));
    output.push_str(&format!("# {}\n\n", "=".repeat(70)));
    output.push_str(&commands.join("\n"));
    output
}

fn access_list_commands(acl: &AccessList, commands: &mut Vec<String>) {
    commands.push(format!("ip access-list {}", acl.name));
    for rule in &acl.rules {
        rule_commands(rule, commands);
    }
    commands.push(String::new());
}

fn rule_commands(rule: &AccessListRule, commands: &mut Vec<String>) {
    let mut line = format!(
        "  {} {} {} {}",
        rule.sequence,
        rule.action.as_str(),
        rule.protocol.as_str(),
        rule.source
    );
    if let Some(ports) = &rule.source_port {
        push_port_clause(&mut line, ports);
    }
    line.push(' ');
    line.push_str(&rule.destination);

    match &rule.dest_port {
        Some(PortSpec::List(ports)) => {
            commands.extend(ports.iter().map(|port| format!("{line} eq {port}")));
        }
        Some(ports) => {
            push_port_clause(&mut line, ports);
            commands.push(line);
        }
        None => commands.push(line),
    }
}

fn push_port_clause(line: &mut String, ports: &PortSpec) {
    match ports {
        PortSpec::Eq(port) => line.push_str(&format!(" eq {port}")),
        PortSpec::Range(low, high) => line.push_str(&format!(" range {low} {high}")),
        // Fan-out is destination only; a list here collapses to one clause
        PortSpec::List(ports) => match ports.as_slice() {
            [] => {}
            [port] => line.push_str(&format!(" eq {port}")),
            [low, high, ..] => line.push_str(&format!(" range {low} {high}")),
        },
    }
}

fn class_map_commands(class_map: &ClassMap, commands: &mut Vec<String>) {
    commands.push(format!(
        "class-map {} {}",
        class_map.match_type.as_str(),
        class_map.name
    ));
    for condition in &class_map.conditions {
        commands.push(match condition {
            MatchCondition::AccessGroup { name } => format!("  match access-group name {name}"),
            MatchCondition::Dscp { value } => format!("  match dscp {value}"),
            MatchCondition::Precedence { value } => format!("  match precedence {value}"),
        });
    }
    commands.push(String::new());
}

fn policy_map_commands(policy_map: &PolicyMap, commands: &mut Vec<String>) {
    commands.push(format!("policy-map {}", policy_map.name));
    for class in &policy_map.classes {
        commands.push(format!("  class {}", class.class_name));
        for action in &class.actions {
            commands.push(match action {
                PolicyAction::Set { parameter, value } => format!("    set {parameter} {value}"),
                PolicyAction::Police { rate } => format!(
                    "    police cir {}",
                    rate.as_deref().unwrap_or(DEFAULT_POLICE_RATE)
                ),
                PolicyAction::Bandwidth { value } => format!(
                    "    bandwidth {}",
                    value.as_deref().unwrap_or(DEFAULT_BANDWIDTH)
                ),
            });
        }
    }
    commands.push(String::new());
}

fn service_policy_commands(service_policy: &ServicePolicy, commands: &mut Vec<String>) {
    commands.push(format!("interface {}", service_policy.interface));
    commands.push(format!(
        "  service-policy {} {}",
        service_policy.direction.as_str(),
        service_policy.policy_map
    ));
    commands.push(String::new());
}
