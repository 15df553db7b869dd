use super::error::{StateError, StateResult};
use super::event::{Effect, EventKind, ProcessTicket, StepTransition, WorkflowEvent};
use super::model::{StepId, StepState, StepStatus};
use crate::album::Album;
use crate::image_ref::ImageRef;

/// The three step states plus the album they feed.
///
/// All mutation goes through [`Workflow::transition`]. Resetting a step
/// always resets every step after it, since their outputs derive from it.
#[derive(Debug, Clone, Default)]
pub struct Workflow {
    steps: [StepState; 3],
    album: Album,
    generation: u64,
    transition_history: Vec<StepTransition>,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self, step: StepId) -> &StepState {
        &self.steps[step.index()]
    }

    pub fn album(&self) -> &Album {
        &self.album
    }

    pub fn album_mut(&mut self) -> &mut Album {
        &mut self.album
    }

    pub fn history(&self) -> &[StepTransition] {
        &self.transition_history
    }

    /// Step 1 is always active; later steps unlock once every earlier one is approved.
    pub fn is_active(&self, step: StepId) -> bool {
        StepId::ALL
            .into_iter()
            .filter(|earlier| *earlier < step)
            .all(|earlier| self.step(earlier).approved)
    }

    pub fn accepts_input(&self, step: StepId) -> bool {
        let state = self.step(step);
        step.takes_upload()
            && self.is_active(step)
            && state.status != StepStatus::Processing
            && !state.approved
    }

    /// Inputs for the step's edit, or `None` while its prerequisites are missing.
    pub fn process_inputs(&self, step: StepId) -> Option<Vec<ImageRef>> {
        if !self.is_active(step) {
            return None;
        }
        match step {
            StepId::ModelPrep | StepId::OutfitPrep => {
                self.step(step).original_image.clone().map(|image| vec![image])
            }
            StepId::Fusion => {
                let model = self.step(StepId::ModelPrep).processed_image.clone()?;
                let outfit = self.step(StepId::OutfitPrep).processed_image.clone()?;
                Some(vec![model, outfit])
            }
        }
    }

    pub fn transition(&mut self, event: WorkflowEvent) -> StateResult<Effect> {
        let kind = event.kind();
        tracing::debug!(event = ?kind, "request workflow transition");
        match event {
            WorkflowEvent::Upload { step, image } => self.upload(step, image),
            WorkflowEvent::Process { step } => Ok(self.process(step)),
            WorkflowEvent::Complete { ticket, outcome } => Ok(self.complete(ticket, outcome)),
            WorkflowEvent::Retry { step } => self.retry(step),
            WorkflowEvent::Approve { step } => self.approve(step),
            WorkflowEvent::Reset { step } => {
                self.reset_from(step, EventKind::Reset);
                Ok(Effect::None)
            }
            WorkflowEvent::ResetAll => {
                self.reset_from(StepId::ModelPrep, EventKind::ResetAll);
                Ok(Effect::None)
            }
        }
    }

    fn upload(&mut self, step: StepId, image: ImageRef) -> StateResult<Effect> {
        if !step.takes_upload() {
            return Err(StateError::UploadNotSupported { step });
        }
        if !self.accepts_input(step) {
            let state = self.step(step);
            tracing::warn!(step = %step, status = ?state.status, "upload rejected");
            return Err(StateError::InputNotAccepted {
                step,
                status: state.status,
                approved: state.approved,
            });
        }

        let from = self.step(step).status;
        self.steps[step.index()] = StepState {
            status: StepStatus::Uploaded,
            original_image: Some(image),
            ..StepState::default()
        };
        self.record(step, EventKind::Upload, from);
        self.reset_downstream(step, EventKind::Upload);
        Ok(Effect::None)
    }

    fn process(&mut self, step: StepId) -> Effect {
        let Some(inputs) = self.process_inputs(step) else {
            tracing::debug!(step = %step, "process ignored: prerequisites missing");
            return Effect::None;
        };

        if self.step(step).approved {
            // The approved output is about to be replaced; later steps were built on it.
            self.reset_downstream(step, EventKind::Process);
        }

        self.generation += 1;
        let generation = self.generation;
        let state = &mut self.steps[step.index()];
        let from = state.status;
        state.status = StepStatus::Processing;
        state.error = None;
        state.approved = false;
        state.in_flight = Some(generation);
        self.record(step, EventKind::Process, from);

        Effect::Process(ProcessTicket {
            step,
            generation,
            operation: step.operation(),
            inputs,
        })
    }

    fn complete(&mut self, ticket: ProcessTicket, outcome: Result<ImageRef, String>) -> Effect {
        let step = ticket.step;
        let state = &mut self.steps[step.index()];
        if state.status != StepStatus::Processing || state.in_flight != Some(ticket.generation) {
            tracing::info!(
                step = %step,
                generation = ticket.generation,
                current = ?state.in_flight,
                "discarding superseded process result"
            );
            return Effect::Discarded;
        }

        let from = state.status;
        state.in_flight = None;
        match outcome {
            Ok(image) => {
                state.status = StepStatus::Done;
                state.processed_image = Some(image);
                state.error = None;
            }
            Err(message) => {
                tracing::warn!(step = %step, error = %message, "step processing failed");
                state.status = StepStatus::Error;
                state.processed_image = None;
                state.error = Some(message);
            }
        }
        self.record(step, EventKind::Complete, from);
        Effect::None
    }

    fn retry(&mut self, step: StepId) -> StateResult<Effect> {
        let from = self.step(step).status;
        if !matches!(from, StepStatus::Done | StepStatus::Error) {
            return Err(StateError::InvalidTransition {
                step,
                from,
                event: EventKind::Retry,
            });
        }

        match step {
            StepId::ModelPrep | StepId::OutfitPrep => {
                let state = &mut self.steps[step.index()];
                state.status = StepStatus::Uploaded;
                state.processed_image = None;
                state.error = None;
                state.approved = false;
                state.in_flight = None;
                self.record(step, EventKind::Retry, from);
                self.reset_downstream(step, EventKind::Retry);
                Ok(Effect::None)
            }
            StepId::Fusion => Ok(self.process(step)),
        }
    }

    fn approve(&mut self, step: StepId) -> StateResult<Effect> {
        let state = self.step(step);
        if !self.is_active(step) {
            return Err(StateError::InvalidTransition {
                step,
                from: state.status,
                event: EventKind::Approve,
            });
        }
        let processed = match (state.status, state.processed_image.clone()) {
            (StepStatus::Done, Some(image)) => image,
            (from, _) => {
                return Err(StateError::InvalidTransition {
                    step,
                    from,
                    event: EventKind::Approve,
                })
            }
        };

        match step {
            StepId::ModelPrep | StepId::OutfitPrep => {
                self.steps[step.index()].approved = true;
                self.record(step, EventKind::Approve, StepStatus::Done);
                Ok(Effect::Approved)
            }
            StepId::Fusion => {
                self.album.push(processed);
                let album_len = self.album.len();
                tracing::info!(album_len, "look saved to album");
                self.record(step, EventKind::Approve, StepStatus::Done);
                // Keep the approved model; start over with a new outfit.
                self.reset_from(StepId::OutfitPrep, EventKind::Approve);
                Ok(Effect::SavedToAlbum { album_len })
            }
        }
    }

    fn reset_downstream(&mut self, step: StepId, event: EventKind) {
        if let Some(next) = step.downstream().next() {
            self.reset_from(next, event);
        }
    }

    fn reset_from(&mut self, first: StepId, event: EventKind) {
        for step in StepId::ALL.into_iter().filter(|step| *step >= first) {
            let from = self.step(step).status;
            self.steps[step.index()] = StepState::default();
            self.record(step, event, from);
        }
    }

    fn record(&mut self, step: StepId, event: EventKind, from: StepStatus) {
        let to = self.step(step).status;
        self.transition_history
            .push(StepTransition::new(step, event, from, to));
    }
}
