use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use crate::policy::{ExecutionResult, Policy};

/// Storage for uploaded policies and their latest execution result
pub trait PolicyRepository: Send + Sync {
    fn get(&self, id: &str) -> Option<Policy>;

    /// Insert or replace by policy id
    fn put(&self, policy: Policy);

    /// Remove a policy together with its stored result
    fn delete(&self, id: &str) -> Option<Policy>;

    fn list(&self) -> Vec<Policy>;

    /// Replace the stored result for `result.policy_id`
    fn put_result(&self, result: ExecutionResult);

    fn last_result(&self, policy_id: &str) -> Option<ExecutionResult>;
}

/// Process-local repository; contents are lost on exit
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    policies: Mutex<HashMap<String, Policy>>,
    results: Mutex<HashMap<String, ExecutionResult>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl PolicyRepository for InMemoryRepository {
    fn get(&self, id: &str) -> Option<Policy> {
        lock(&self.policies).get(id).cloned()
    }

    fn put(&self, policy: Policy) {
        lock(&self.policies).insert(policy.id.clone(), policy);
    }

    fn delete(&self, id: &str) -> Option<Policy> {
        lock(&self.results).remove(id);
        lock(&self.policies).remove(id)
    }

    fn list(&self) -> Vec<Policy> {
        lock(&self.policies).values().cloned().collect()
    }

    fn put_result(&self, result: ExecutionResult) {
        lock(&self.results).insert(result.policy_id.clone(), result);
    }

    fn last_result(&self, policy_id: &str) -> Option<ExecutionResult> {
        lock(&self.results).get(policy_id).cloned()
    }
}
