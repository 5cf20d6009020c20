use std::{fs, path::Path};

use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};

use super::model::{Policy, PolicyStatus};
use crate::error::{QoscError, Result};

const REQUIRED_FIELDS: [&str; 3] = ["id", "name", "description"];

/// Parse a policy document from a file
///
/// # Errors
/// * `NotFound` - the file does not exist
/// * anything [`parse_str`] returns for the file contents
pub fn parse_file(path: &Path) -> Result<Policy> {
    if !path.exists() {
        return Err(QoscError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path)?;
    log::debug!("Parsing policy document {}", path.display());
    parse_str(&content)
}

/// Parse a policy document from YAML text
///
/// Only the top-level `id`, `name` and `description` fields are required.
/// Absent entity sections produce empty lists; references between entities
/// are left to the validator.
///
/// # Examples
/// ```
/// use qosc::policy::parser::parse_str;
///
/// let policy = parse_str("id: p1\nname: Voice\ndescription: voice QoS\n").unwrap();
/// assert!(policy.access_lists.is_empty());
/// ```
pub fn parse_str(document: &str) -> Result<Policy> {
    if document.trim().is_empty() {
        return Err(QoscError::EmptyDocument);
    }

    let root: Value =
        serde_yaml::from_str(document).map_err(|e| QoscError::Format(e.to_string()))?;
    let root = match root {
        Value::Null => return Err(QoscError::EmptyDocument),
        Value::Mapping(mapping) if mapping.is_empty() => return Err(QoscError::EmptyDocument),
        Value::Mapping(mapping) => mapping,
        _ => {
            return Err(QoscError::Format(
                "document root must be a mapping".to_string(),
            ));
        }
    };

    for field in REQUIRED_FIELDS {
        if !root.contains_key(field) {
            return Err(QoscError::MissingField(field));
        }
    }

    let mut policy = Policy::new(
        required_text(&root, "id")?,
        required_text(&root, "name")?,
        required_text(&root, "description")?,
    );

    policy.access_lists = section(&root, "access_lists")?;
    for acl in &mut policy.access_lists {
        acl.sort_rules();
    }
    policy.class_maps = section(&root, "class_maps")?;
    policy.policy_maps = section(&root, "policy_maps")?;
    policy.service_policies = section(&root, "service_policies")?;
    policy.status = PolicyStatus::Uploaded;

    log::debug!(
        "Parsed policy {}: {} ACLs, {} class-maps, {} policy-maps, {} service-policies",
        policy.id,
        policy.access_lists.len(),
        policy.class_maps.len(),
        policy.policy_maps.len(),
        policy.service_policies.len()
    );

    Ok(policy)
}

fn required_text(root: &Mapping, field: &'static str) -> Result<String> {
    match root.get(field) {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(Value::Number(number)) => Ok(number.to_string()),
        Some(Value::Bool(flag)) => Ok(flag.to_string()),
        Some(Value::Null) | None => Err(QoscError::MissingField(field)),
        Some(_) => Err(QoscError::Format(format!("field '{field}' must be a scalar"))),
    }
}

fn section<T: DeserializeOwned>(root: &Mapping, section: &'static str) -> Result<Vec<T>> {
    match root.get(section) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => serde_yaml::from_value(value.clone())
            .map_err(|source| QoscError::InvalidSection { section, source }),
    }
}
