//! Multi-request: an ordered batch of dependent steps

use super::step::{PreparedStep, StepDescriptor};
use serde::{Serialize, Serializer};

/// Ordered, immutable sequence of steps sharing one state store
///
/// Templates are parsed here, once; they are evaluated before each step runs.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiRequest {
    steps: Vec<StepDescriptor>,
    prepared: Vec<PreparedStep>,
}

impl MultiRequest {
    pub fn new(steps: Vec<StepDescriptor>) -> Self {
        let prepared = steps.iter().map(PreparedStep::compile).collect();
        Self { steps, prepared }
    }

    pub fn steps(&self) -> &[StepDescriptor] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub(crate) fn iter_prepared(&self) -> impl Iterator<Item = (&StepDescriptor, &PreparedStep)> {
        self.steps.iter().zip(&self.prepared)
    }
}

impl FromIterator<StepDescriptor> for MultiRequest {
    fn from_iter<I: IntoIterator<Item = StepDescriptor>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Serializes as the JSON array accepted by the WAPI `request` object
impl Serialize for MultiRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.steps.serialize(serializer)
    }
}
