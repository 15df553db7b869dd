//! Drives a workflow end to end: events into the state machine, process
//! tickets out to the image editor, results back in.

use std::path::{Path, PathBuf};

use crate::album::AlbumStyle;
use crate::edit::ImageEditor;
use crate::error::AppResult;
use crate::image_ref::ImageRef;
use crate::state::{Effect, ProcessTicket, StepId, StepStatus, Workflow, WorkflowEvent};
use crate::storage::{DownloadTarget, StorageService};

pub struct FittingRoom<E> {
    workflow: Workflow,
    editor: E,
    storage: StorageService,
    album_style: AlbumStyle,
}

impl<E: ImageEditor> FittingRoom<E> {
    pub fn new(editor: E, storage: StorageService, album_style: AlbumStyle) -> Self {
        Self {
            workflow: Workflow::new(),
            editor,
            storage,
            album_style,
        }
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    pub fn storage(&self) -> &StorageService {
        &self.storage
    }

    pub fn upload_file(&mut self, step: StepId, path: &Path) -> AppResult<()> {
        let image = ImageRef::from_file(path)?;
        self.upload(step, image)
    }

    pub fn upload(&mut self, step: StepId, image: ImageRef) -> AppResult<()> {
        self.workflow
            .transition(WorkflowEvent::Upload { step, image })?;
        Ok(())
    }

    /// Runs the step's edit if its inputs are ready; otherwise leaves it alone.
    ///
    /// An edit failure is not an `Err`: it lands in the step as `Error` with
    /// a message, and the returned status says so.
    pub fn process(&mut self, step: StepId) -> AppResult<StepStatus> {
        let effect = self.workflow.transition(WorkflowEvent::Process { step })?;
        self.run_effect(effect)?;
        Ok(self.workflow.step(step).status)
    }

    /// Re-runs a finished or failed step.
    pub fn retry(&mut self, step: StepId) -> AppResult<StepStatus> {
        match self.workflow.transition(WorkflowEvent::Retry { step })? {
            Effect::Process(ticket) => {
                self.run_ticket(ticket)?;
                Ok(self.workflow.step(step).status)
            }
            _ => self.process(step),
        }
    }

    pub fn approve(&mut self, step: StepId) -> AppResult<Effect> {
        Ok(self.workflow.transition(WorkflowEvent::Approve { step })?)
    }

    pub fn reset(&mut self, step: StepId) -> AppResult<()> {
        self.workflow.transition(WorkflowEvent::Reset { step })?;
        Ok(())
    }

    pub fn reset_all(&mut self) -> AppResult<()> {
        self.workflow.transition(WorkflowEvent::ResetAll)?;
        Ok(())
    }

    /// Saves the step's processed image. `None` when there is nothing to save.
    pub fn download_step(&self, step: StepId) -> AppResult<Option<PathBuf>> {
        let Some(image) = self.workflow.step(step).processed_image.as_ref() else {
            tracing::debug!(step = %step, "nothing to download");
            return Ok(None);
        };
        Ok(Some(self.storage.save_image(image, DownloadTarget::Step(step))?))
    }

    pub fn compose_album(&self) -> AppResult<ImageRef> {
        Ok(self.workflow.album().compose(&self.album_style)?)
    }

    pub fn download_album(&self) -> AppResult<PathBuf> {
        let page = self.compose_album()?;
        Ok(self.storage.save_image(&page, DownloadTarget::Album)?)
    }

    fn run_effect(&mut self, effect: Effect) -> AppResult<()> {
        if let Effect::Process(ticket) = effect {
            self.run_ticket(ticket)?;
        }
        Ok(())
    }

    fn run_ticket(&mut self, ticket: ProcessTicket) -> AppResult<()> {
        tracing::info!(
            step = %ticket.step,
            generation = ticket.generation,
            operation = %ticket.operation,
            "processing step"
        );
        let outcome = self
            .editor
            .edit(ticket.operation, &ticket.inputs)
            .map_err(|err| err.to_string());
        let effect = self
            .workflow
            .transition(WorkflowEvent::Complete { ticket, outcome })?;
        if effect == Effect::Discarded {
            tracing::debug!("process result arrived after the step moved on");
        }
        Ok(())
    }
}
