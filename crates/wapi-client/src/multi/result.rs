//! Batch result projection

use super::step::{Method, StepDescriptor};
use serde::Serialize;
use serde_json::Value;

/// Caller-visible results of a multi-request, in step order
///
/// Discarded steps are absent. A `STATE:DISPLAY` step contributes a snapshot
/// of the state store at the point it ran.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BatchResult {
    entries: Vec<Value>,
    #[serde(skip)]
    snapshot: Option<usize>,
}

impl BatchResult {
    pub(crate) fn record(&mut self, step: &StepDescriptor, response: Value) {
        if step.discard {
            return;
        }
        if step.method == Method::StateDisplay {
            self.snapshot = Some(self.entries.len());
        }
        self.entries.push(response);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[Value] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Value> {
        self.entries
    }

    /// The most recent state snapshot, if a `STATE:DISPLAY` step was kept
    pub fn state(&self) -> Option<&Value> {
        self.snapshot.and_then(|i| self.entries.get(i))
    }

    /// A captured value from the most recent state snapshot
    pub fn captured(&self, key: &str) -> Option<&Value> {
        self.state()?.get(key)
    }

    /// Captured value as a string, if it is one
    pub fn captured_str(&self, key: &str) -> Option<&str> {
        self.captured(key).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_discard_and_order() {
        let mut result = BatchResult::default();
        result.record(&StepDescriptor::get("a").discarded(), json!("hidden"));
        result.record(&StepDescriptor::get("b"), json!(["first"]));
        result.record(&StepDescriptor::update("c").discarded(), json!("hidden"));
        result.record(&StepDescriptor::delete("d"), json!("second"));

        assert_eq!(result.entries(), [json!(["first"]), json!("second")]);
        assert!(result.state().is_none());
    }

    #[test]
    fn test_state_snapshot_lookup() {
        let mut result = BatchResult::default();
        result.record(&StepDescriptor::display_state(), json!({"HOLDER": "tenant-a"}));

        assert_eq!(result.len(), 1);
        assert_eq!(result.captured_str("HOLDER"), Some("tenant-a"));
        assert_eq!(result.captured("NOPE"), None);
        assert_eq!(serde_json::to_value(&result).unwrap(), json!([{"HOLDER": "tenant-a"}]));
    }
}
