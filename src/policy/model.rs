use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};

/// Rule action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Permit,
    Deny,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Permit => "permit",
            Action::Deny => "deny",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
    Ip,
    Icmp,
    Any,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Ip => "ip",
            Protocol::Icmp => "icmp",
            Protocol::Any => "any",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    #[default]
    Ipv4,
    Ipv6,
}

/// Port clause of an ACL rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PortSpec {
    /// `eq <port>`
    Eq(u16),
    /// `range <low> <high>`
    Range(u16, u16),
    /// Discrete ports, one rule line per port
    List(Vec<u16>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPorts {
    One(u16),
    Many(Vec<u16>),
}

impl RawPorts {
    fn into_ports(self) -> Vec<u16> {
        match self {
            RawPorts::One(port) => vec![port],
            RawPorts::Many(ports) => ports,
        }
    }
}

fn source_ports<'de, D>(deserializer: D) -> Result<Option<PortSpec>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<RawPorts>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match raw.into_ports().as_slice() {
        [] => Ok(None),
        [port] => Ok(Some(PortSpec::Eq(*port))),
        [low, high] => Ok(Some(PortSpec::Range(*low, *high))),
        _ => Err(D::Error::custom(
            "source_port accepts a single port or a two-value range",
        )),
    }
}

fn dest_ports<'de, D>(deserializer: D) -> Result<Option<PortSpec>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<RawPorts>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let ports = raw.into_ports();
    Ok(match ports.as_slice() {
        [] => None,
        [port] => Some(PortSpec::Eq(*port)),
        [low, high] => Some(PortSpec::Range(*low, *high)),
        _ => Some(PortSpec::List(ports)),
    })
}

/// Scalar that may be written as a YAML string or number (`dscp: 46`, `name: 100`)
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<Scalar> for String {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Text(text) => text,
            Scalar::Int(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

pub(crate) fn scalar_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Scalar::deserialize(deserializer).map(String::from)
}

fn optional_scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(String::from))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccessListRule {
    pub sequence: u32,
    pub action: Action,
    pub protocol: Protocol,
    pub source: String,
    pub destination: String,
    #[serde(default, deserialize_with = "source_ports")]
    pub source_port: Option<PortSpec>,
    #[serde(default, deserialize_with = "dest_ports")]
    pub dest_port: Option<PortSpec>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccessList {
    #[serde(deserialize_with = "scalar_text")]
    pub name: String,
    #[serde(rename = "type", default)]
    pub family: AddressFamily,
    #[serde(default)]
    pub rules: Vec<AccessListRule>,
}

impl AccessList {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            family: AddressFamily::default(),
            rules: Vec::new(),
        }
    }

    /// Add a rule, keeping rules ordered by sequence number
    pub fn add_rule(&mut self, rule: AccessListRule) {
        self.rules.push(rule);
        self.sort_rules();
    }

    pub(crate) fn sort_rules(&mut self) {
        self.rules.sort_by_key(|rule| rule.sequence);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchType {
    #[default]
    MatchAny,
    MatchAll,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::MatchAny => "match-any",
            MatchType::MatchAll => "match-all",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MatchCondition {
    AccessGroup {
        #[serde(deserialize_with = "scalar_text")]
        name: String,
    },
    Dscp {
        #[serde(deserialize_with = "scalar_text")]
        value: String,
    },
    Precedence {
        #[serde(deserialize_with = "scalar_text")]
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClassMap {
    #[serde(deserialize_with = "scalar_text")]
    pub name: String,
    #[serde(default)]
    pub match_type: MatchType,
    #[serde(default)]
    pub conditions: Vec<MatchCondition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PolicyAction {
    Set {
        #[serde(deserialize_with = "scalar_text")]
        parameter: String,
        #[serde(deserialize_with = "scalar_text")]
        value: String,
    },
    Police {
        #[serde(default, deserialize_with = "optional_scalar_text")]
        rate: Option<String>,
    },
    Bandwidth {
        #[serde(default, deserialize_with = "optional_scalar_text")]
        value: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PolicyMapClass {
    #[serde(deserialize_with = "scalar_text")]
    pub class_name: String,
    #[serde(default)]
    pub actions: Vec<PolicyAction>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PolicyMap {
    #[serde(deserialize_with = "scalar_text")]
    pub name: String,
    #[serde(default)]
    pub classes: Vec<PolicyMapClass>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Input => "input",
            Direction::Output => "output",
        }
    }
}

/// Binding of a policy map to an interface
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServicePolicy {
    #[serde(deserialize_with = "scalar_text")]
    pub interface: String,
    pub direction: Direction,
    #[serde(deserialize_with = "scalar_text")]
    pub policy_map: String,
}

/// Lifecycle of an uploaded policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyStatus {
    #[default]
    Pending,
    Uploaded,
    Validated,
    Applied,
    Failed,
}

impl PolicyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyStatus::Pending => "pending",
            PolicyStatus::Uploaded => "uploaded",
            PolicyStatus::Validated => "validated",
            PolicyStatus::Applied => "applied",
            PolicyStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PolicyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete QoS policy
#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    pub id: String,
    pub name: String,
    pub description: String,
    pub access_lists: Vec<AccessList>,
    pub class_maps: Vec<ClassMap>,
    pub policy_maps: Vec<PolicyMap>,
    pub service_policies: Vec<ServicePolicy>,
    pub status: PolicyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Policy {
    /// Create an empty policy in the `pending` state
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            access_lists: Vec::new(),
            class_maps: Vec::new(),
            policy_maps: Vec::new(),
            service_policies: Vec::new(),
            status: PolicyStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to a new lifecycle state and bump `updated_at`
    pub fn transition(&mut self, status: PolicyStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    pub fn summary(&self) -> PolicySummary {
        PolicySummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            access_lists_count: self.access_lists.len(),
            class_maps_count: self.class_maps.len(),
            policy_maps_count: self.policy_maps.len(),
            service_policies_count: self.service_policies.len(),
        }
    }
}

/// Serializable overview of a policy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolicySummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: PolicyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub access_lists_count: usize,
    pub class_maps_count: usize,
    pub policy_maps_count: usize,
    pub service_policies_count: usize,
}
