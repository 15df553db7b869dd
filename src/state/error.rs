use super::event::EventKind;
use super::model::{StepId, StepStatus};
use thiserror::Error;

pub type StateResult<T> = std::result::Result<T, StateError>;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("step {step} does not take uploads")]
    UploadNotSupported { step: StepId },
    #[error("step {step} does not accept new input while {status:?} (approved: {approved})")]
    InputNotAccepted {
        step: StepId,
        status: StepStatus,
        approved: bool,
    },
    #[error("invalid transition on step {step}: from {from:?} using event {event:?}")]
    InvalidTransition {
        step: StepId,
        from: StepStatus,
        event: EventKind,
    },
}
