//! Multi-request engine
//!
//! Builds batches of dependent WAPI calls and runs them on the client,
//! threading captured values from one step into the next.
//!
//! - `state.rs` - state store shared by the steps of one run
//! - `template.rs` - `##STATE:<Key>:##` template parsing and evaluation
//! - `payload.rs` - plain-field / EA-add / EA-remove payloads
//! - `step.rs` - step descriptors and substitution
//! - `request.rs` - the immutable multi-request
//! - `interpreter.rs` - sequential execution and state capture
//! - `result.rs` - caller-visible result projection

mod interpreter;
mod payload;
mod request;
mod result;
mod state;
mod step;
mod template;

pub use interpreter::{execute, select};
pub use payload::{CompiledPayload, EA_ADD_KEY, EA_REMOVE_KEY, Payload};
pub use request::MultiRequest;
pub use result::BatchResult;
pub use state::{StateStore, value_text};
pub use step::{Method, ResolvedStep, Selector, StepDescriptor, substitute};
pub use template::{MissingKey, Segment, TOKEN_CLOSE, TOKEN_OPEN, Template, TemplateValue};
