use super::model::{StepId, StepStatus};
use crate::edit::EditOperation;
use crate::image_ref::ImageRef;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    Upload {
        step: StepId,
        image: ImageRef,
    },
    Process {
        step: StepId,
    },
    Complete {
        ticket: ProcessTicket,
        outcome: Result<ImageRef, String>,
    },
    Retry {
        step: StepId,
    },
    Approve {
        step: StepId,
    },
    Reset {
        step: StepId,
    },
    ResetAll,
}

impl WorkflowEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Upload { .. } => EventKind::Upload,
            Self::Process { .. } => EventKind::Process,
            Self::Complete { .. } => EventKind::Complete,
            Self::Retry { .. } => EventKind::Retry,
            Self::Approve { .. } => EventKind::Approve,
            Self::Reset { .. } => EventKind::Reset,
            Self::ResetAll => EventKind::ResetAll,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Upload,
    Process,
    Complete,
    Retry,
    Approve,
    Reset,
    ResetAll,
}

/// Everything the caller needs to run one remote edit for a step.
///
/// The ticket goes back into the machine with the result; a ticket whose
/// generation is no longer current is discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessTicket {
    pub step: StepId,
    pub generation: u64,
    pub operation: EditOperation,
    pub inputs: Vec<ImageRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    Approved,
    Process(ProcessTicket),
    Discarded,
    SavedToAlbum { album_len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepTransition {
    pub step: StepId,
    pub event: EventKind,
    pub from: StepStatus,
    pub to: StepStatus,
}

impl StepTransition {
    pub const fn new(step: StepId, event: EventKind, from: StepStatus, to: StepStatus) -> Self {
        Self {
            step,
            event,
            from,
            to,
        }
    }
}
