pub mod generate;
pub mod model;
pub mod parser;
pub mod result;
pub mod validate;

// Re-export main types and functions
pub use generate::{command_count, generate, preview};
pub use model::{
    AccessList, AccessListRule, Action, AddressFamily, ClassMap, Direction, MatchCondition,
    MatchType, Policy, PolicyAction, PolicyMap, PolicyMapClass, PolicyStatus, PolicySummary,
    PortSpec, Protocol, ServicePolicy,
};
pub use parser::{parse_file, parse_str};
pub use result::{CommandOutcome, ExecutionResult, ExecutionSummary};
pub use validate::{Severity, ValidationIssue, ValidationReport, validate};
