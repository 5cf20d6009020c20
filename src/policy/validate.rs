use std::{collections::HashSet, fmt, sync::LazyLock};

use regex::Regex;
use serde::Serialize;

use super::model::{MatchCondition, Policy};

/// Class name that is always defined on the device
pub const CLASS_DEFAULT: &str = "class-default";

static INTERFACE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(Ethernet|Vlan|port-channel)\d+(/\d+)?$").expect("valid interface regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
        }
    }
}

/// A single problem found in a policy, tagged with the section it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub message: String,
    pub severity: Severity,
}

impl ValidationIssue {
    fn error(field: &'static str, message: String) -> Self {
        Self {
            field,
            message,
            severity: Severity::Error,
        }
    }

    fn warning(field: &'static str, message: String) -> Self {
        Self {
            field,
            message,
            severity: Severity::Warning,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity.as_str(), self.field, self.message)
    }
}

/// Issues collected by [`validate`], in check order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// A policy is deployable iff no issue has error severity
    pub fn is_valid(&self) -> bool {
        !self.issues.iter().any(ValidationIssue::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|issue| issue.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|issue| !issue.is_error())
    }
}

/// Run every consistency check against a parsed policy
///
/// Checks never short-circuit each other: all issues are collected and
/// returned in the order the checks ran.
pub fn validate(policy: &Policy) -> ValidationReport {
    let mut issues = Vec::new();

    check_access_lists(policy, &mut issues);
    check_class_maps(policy, &mut issues);
    check_policy_maps(policy, &mut issues);
    check_service_policies(policy, &mut issues);
    check_interfaces(policy, &mut issues);

    ValidationReport { issues }
}

fn check_access_lists(policy: &Policy, issues: &mut Vec<ValidationIssue>) {
    for acl in &policy.access_lists {
        if acl.rules.is_empty() {
            issues.push(ValidationIssue::error(
                "access_lists",
                format!("ACL '{}' has no rules", acl.name),
            ));
        }

        let mut seen = HashSet::new();
        if !acl.rules.iter().all(|rule| seen.insert(rule.sequence)) {
            issues.push(ValidationIssue::error(
                "access_lists",
                format!("ACL '{}' has duplicate sequence numbers", acl.name),
            ));
        }
    }
}

fn check_class_maps(policy: &Policy, issues: &mut Vec<ValidationIssue>) {
    let acl_names: HashSet<&str> = policy
        .access_lists
        .iter()
        .map(|acl| acl.name.as_str())
        .collect();

    for class_map in &policy.class_maps {
        for condition in &class_map.conditions {
            if let MatchCondition::AccessGroup { name } = condition
                && !acl_names.contains(name.as_str())
            {
                issues.push(ValidationIssue::error(
                    "class_maps",
                    format!(
                        "Class-map '{}' references non-existent ACL '{}'",
                        class_map.name, name
                    ),
                ));
            }
        }
    }
}

fn check_policy_maps(policy: &Policy, issues: &mut Vec<ValidationIssue>) {
    let class_names: HashSet<&str> = policy
        .class_maps
        .iter()
        .map(|class_map| class_map.name.as_str())
        .collect();

    for policy_map in &policy.policy_maps {
        if policy_map.classes.is_empty() {
            issues.push(ValidationIssue::warning(
                "policy_maps",
                format!("Policy-map '{}' has no classes", policy_map.name),
            ));
        }

        for class in &policy_map.classes {
            if class.class_name != CLASS_DEFAULT
                && !class_names.contains(class.class_name.as_str())
            {
                issues.push(ValidationIssue::error(
                    "policy_maps",
                    format!(
                        "Policy-map '{}' references non-existent class '{}'",
                        policy_map.name, class.class_name
                    ),
                ));
            }
        }
    }
}

fn check_service_policies(policy: &Policy, issues: &mut Vec<ValidationIssue>) {
    let policy_map_names: HashSet<&str> = policy
        .policy_maps
        .iter()
        .map(|policy_map| policy_map.name.as_str())
        .collect();

    for service_policy in &policy.service_policies {
        if !policy_map_names.contains(service_policy.policy_map.as_str()) {
            issues.push(ValidationIssue::error(
                "service_policies",
                format!(
                    "Service-policy references non-existent policy-map '{}'",
                    service_policy.policy_map
                ),
            ));
        }
    }
}

fn check_interfaces(policy: &Policy, issues: &mut Vec<ValidationIssue>) {
    for service_policy in &policy.service_policies {
        if !INTERFACE_NAME.is_match(&service_policy.interface) {
            issues.push(ValidationIssue::warning(
                "service_policies",
                format!(
                    "Invalid interface name format: '{}'",
                    service_policy.interface
                ),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::model::{
        AccessList, AccessListRule, Action, ClassMap, Direction, MatchType, PolicyMap,
        PolicyMapClass, Protocol, ServicePolicy,
    };
    use rstest::rstest;

    fn rule(sequence: u32) -> AccessListRule {
        AccessListRule {
            sequence,
            action: Action::Permit,
            protocol: Protocol::Tcp,
            source: "any".to_string(),
            destination: "any".to_string(),
            source_port: None,
            dest_port: None,
        }
    }

    fn acl(name: &str, sequences: &[u32]) -> AccessList {
        let mut acl = AccessList::new(name);
        acl.rules = sequences.iter().copied().map(rule).collect();
        acl
    }

    fn class_map(name: &str, conditions: Vec<MatchCondition>) -> ClassMap {
        ClassMap {
            name: name.to_string(),
            match_type: MatchType::MatchAny,
            conditions,
        }
    }

    fn policy_map(name: &str, classes: &[&str]) -> PolicyMap {
        PolicyMap {
            name: name.to_string(),
            classes: classes
                .iter()
                .map(|class_name| PolicyMapClass {
                    class_name: class_name.to_string(),
                    actions: vec![],
                })
                .collect(),
        }
    }

    fn service_policy(interface: &str, policy_map: &str) -> ServicePolicy {
        ServicePolicy {
            interface: interface.to_string(),
            direction: Direction::Input,
            policy_map: policy_map.to_string(),
        }
    }

    fn consistent_policy() -> Policy {
        let mut policy = Policy::new("p1", "Voice", "voice QoS");
        policy.access_lists.push(acl("ACL1", &[10, 20]));
        policy.class_maps.push(class_map(
            "CM1",
            vec![MatchCondition::AccessGroup {
                name: "ACL1".to_string(),
            }],
        ));
        policy.policy_maps.push(policy_map("PM1", &["CM1", CLASS_DEFAULT]));
        policy
            .service_policies
            .push(service_policy("Ethernet1/1", "PM1"));
        policy
    }

    #[test]
    fn consistent_policy_has_no_issues() {
        let report = validate(&consistent_policy());
        assert!(report.is_valid());
        assert!(report.issues.is_empty());
    }

    #[test]
    fn empty_acl_is_an_error() {
        let mut policy = consistent_policy();
        policy.access_lists.push(acl("EMPTY", &[]));

        let report = validate(&policy);
        assert!(!report.is_valid());
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].field, "access_lists");
        assert_eq!(report.issues[0].message, "ACL 'EMPTY' has no rules");
    }

    #[rstest]
    #[case(&[10, 10], true)]
    #[case(&[10, 20, 10], true)]
    #[case(&[5, 10, 15], false)]
    #[case(&[1], false)]
    fn duplicate_sequences(#[case] sequences: &[u32], #[case] expect_issue: bool) {
        let mut policy = consistent_policy();
        policy.access_lists[0] = acl("ACL1", sequences);

        let report = validate(&policy);
        let duplicate = report.issues.iter().any(|issue| {
            issue.field == "access_lists"
                && issue.severity == Severity::Error
                && issue.message.contains("duplicate sequence")
        });
        assert_eq!(duplicate, expect_issue);
    }

    #[rstest]
    #[case("ACL1", false)]
    #[case("ACL-MISSING", true)]
    fn access_group_reference(#[case] target: &str, #[case] expect_error: bool) {
        let mut policy = consistent_policy();
        policy.class_maps[0].conditions = vec![MatchCondition::AccessGroup {
            name: target.to_string(),
        }];

        let report = validate(&policy);
        assert_eq!(!report.is_valid(), expect_error);
        assert_eq!(
            report.errors().any(|issue| issue.field == "class_maps"),
            expect_error
        );
    }

    #[test]
    fn non_acl_conditions_are_not_resolved() {
        let mut policy = consistent_policy();
        policy.class_maps[0].conditions.push(MatchCondition::Dscp {
            value: "ef".to_string(),
        });
        assert!(validate(&policy).issues.is_empty());
    }

    #[test]
    fn empty_policy_map_is_only_a_warning() {
        let mut policy = consistent_policy();
        policy.policy_maps.push(policy_map("PM-EMPTY", &[]));

        let report = validate(&policy);
        assert!(report.is_valid());
        assert_eq!(report.warnings().count(), 1);
        assert_eq!(report.issues[0].field, "policy_maps");
    }

    #[test]
    fn unknown_class_reference_is_an_error() {
        let mut policy = consistent_policy();
        policy.policy_maps[0] = policy_map("PM1", &["CM-MISSING"]);

        let report = validate(&policy);
        assert!(!report.is_valid());
        assert_eq!(
            report.issues[0].message,
            "Policy-map 'PM1' references non-existent class 'CM-MISSING'"
        );
    }

    #[test]
    fn unknown_policy_map_binding_is_an_error() {
        let mut policy = consistent_policy();
        policy.service_policies[0].policy_map = "PM-MISSING".to_string();

        let report = validate(&policy);
        assert!(!report.is_valid());
        assert_eq!(report.issues[0].field, "service_policies");
    }

    #[rstest]
    #[case("Ethernet1/1", false)]
    #[case("ethernet1/48", false)]
    #[case("Vlan100", false)]
    #[case("port-channel10", false)]
    #[case("PORT-CHANNEL7", false)]
    #[case("Eth1/1", true)]
    #[case("Ethernet1/1/1", true)]
    #[case("mgmt0", true)]
    #[case("Vlan", true)]
    fn interface_names_are_advisory(#[case] interface: &str, #[case] expect_warning: bool) {
        let mut policy = consistent_policy();
        policy.service_policies[0].interface = interface.to_string();

        let report = validate(&policy);
        assert!(report.is_valid());
        assert_eq!(report.warnings().count(), usize::from(expect_warning));
    }

    #[test]
    fn issues_accumulate_in_check_order() {
        let mut policy = Policy::new("p1", "Broken", "everything wrong");
        policy.access_lists.push(acl("ACL1", &[10, 10]));
        policy.class_maps.push(class_map(
            "CM1",
            vec![MatchCondition::AccessGroup {
                name: "NOPE".to_string(),
            }],
        ));
        policy.policy_maps.push(policy_map("PM1", &[]));
        policy.service_policies.push(service_policy("bogus", "PMX"));

        let report = validate(&policy);
        let fields: Vec<&str> = report.issues.iter().map(|issue| issue.field).collect();
        assert_eq!(
            fields,
            vec![
                "access_lists",
                "class_maps",
                "policy_maps",
                "service_policies",
                "service_policies"
            ]
        );
        assert_eq!(report.issues[4].severity, Severity::Warning);
        assert!(!report.is_valid());
    }

    #[test]
    fn issue_display_shows_severity_and_section() {
        let issue = ValidationIssue::warning("policy_maps", "Policy-map 'X' has no classes".into());
        assert_eq!(
            issue.to_string(),
            "[WARNING] policy_maps: Policy-map 'X' has no classes"
        );
    }
}
