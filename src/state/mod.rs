pub mod error;
pub mod event;
pub mod machine;
pub mod model;

pub use error::{StateError, StateResult};
pub use event::{Effect, EventKind, ProcessTicket, StepTransition, WorkflowEvent};
pub use machine::Workflow;
pub use model::{StepId, StepState, StepStatus};
