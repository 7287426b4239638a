//! Client-side multi-request interpreter
//!
//! Steps run strictly in order. Before each step its templates are evaluated
//! against the shared state store; after it succeeds its capture rules write
//! back into that store. The first failure aborts the batch. Writes made by
//! earlier steps are not rolled back.

use super::request::MultiRequest;
use super::result::BatchResult;
use super::state::StateStore;
use super::step::{Method, ResolvedStep, Selector, StepDescriptor};
use crate::connector::Connector;
use crate::error::WapiError;
use crate::models::ea_value;
use serde_json::Value;
use tracing::{Instrument, debug, debug_span};

/// Execute `request` against `connector`
pub async fn execute<C>(connector: &C, request: &MultiRequest) -> Result<BatchResult, WapiError>
where
    C: Connector + ?Sized,
{
    let span = debug_span!("multi_request", steps = request.len());
    run(connector, request).instrument(span).await
}

async fn run<C>(connector: &C, request: &MultiRequest) -> Result<BatchResult, WapiError>
where
    C: Connector + ?Sized,
{
    let mut state = StateStore::new();
    let mut result = BatchResult::default();

    for (index, (step, prepared)) in request.iter_prepared().enumerate() {
        let resolved = prepared.resolve(index, step, &state)?;
        debug!(step = index, method = %resolved.method, target = %resolved.target, "Dispatching step");

        let response = dispatch(connector, &resolved, &state).await.map_err(|e| {
            debug!(step = index, error = %e, "Step failed, aborting multi-request");
            WapiError::StepFailed {
                step: index,
                method: resolved.method.to_string(),
                target: resolved.target.clone(),
                source: Box::new(e),
            }
        })?;

        capture(index, step, &response, &mut state)?;
        result.record(step, response);
    }

    debug!(results = result.len(), "Multi-request completed");
    Ok(result)
}

async fn dispatch<C>(connector: &C, step: &ResolvedStep, state: &StateStore) -> Result<Value, WapiError>
where
    C: Connector + ?Sized,
{
    let body = step.payload.to_json();
    match step.method {
        Method::StateDisplay => Ok(state.to_json()),
        _ if step.target.is_empty() => Err(WapiError::InvalidRequest(format!(
            "{} step has no target object",
            step.method
        ))),
        Method::Get => connector.get_object(&step.target, &body, &step.args).await,
        Method::Post => connector.create_object(&step.target, &body, &step.args).await,
        Method::Put => connector.update_object(&step.target, &body, &step.args).await,
        Method::Delete => connector.delete_object(&step.target, &step.args).await,
    }
}

/// Apply `step`'s capture rules to `response`
fn capture(
    index: usize,
    step: &StepDescriptor,
    response: &Value,
    state: &mut StateStore,
) -> Result<(), WapiError> {
    for (key, selector) in &step.capture {
        let value = select(response, selector).ok_or_else(|| WapiError::CaptureFailed {
            step: index,
            key: key.clone(),
            selector: selector.to_string(),
        })?;
        debug!(step = index, key = %key, selector = %selector, "Captured state");
        state.set(key.clone(), value);
    }
    Ok(())
}

/// Pick the value a selector points at
///
/// A search result is a list; its first object is used, and an empty list
/// selects nothing. A bare string response is the object's reference.
pub fn select(response: &Value, selector: &Selector) -> Option<Value> {
    let object = match response {
        Value::Array(items) => items.first()?,
        other => other,
    };
    match (object, selector) {
        (Value::String(reference), Selector::Field(name)) if name == "_ref" => {
            Some(Value::String(reference.clone()))
        }
        (Value::Object(map), Selector::Field(name)) => map.get(name).cloned(),
        (Value::Object(_), Selector::ExtAttr(name)) => ea_value(object, name).cloned(),
        _ => None,
    }
}
