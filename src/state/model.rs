use std::fmt;

use crate::edit::EditOperation;
use crate::image_ref::ImageRef;

/// One stage of the fitting-room workflow, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StepId {
    ModelPrep,
    OutfitPrep,
    Fusion,
}

impl StepId {
    pub const ALL: [StepId; 3] = [Self::ModelPrep, Self::OutfitPrep, Self::Fusion];

    pub const fn index(self) -> usize {
        match self {
            Self::ModelPrep => 0,
            Self::OutfitPrep => 1,
            Self::Fusion => 2,
        }
    }

    /// 1-based position shown to users.
    pub const fn number(self) -> usize {
        self.index() + 1
    }

    pub const fn operation(self) -> EditOperation {
        match self {
            Self::ModelPrep => EditOperation::RemoveAccessories,
            Self::OutfitPrep => EditOperation::IsolateOutfit,
            Self::Fusion => EditOperation::Fuse,
        }
    }

    /// Only the first two steps take a user upload; fusion consumes their outputs.
    pub const fn takes_upload(self) -> bool {
        !matches!(self, Self::Fusion)
    }

    pub fn downstream(self) -> impl Iterator<Item = StepId> {
        Self::ALL.into_iter().filter(move |step| *step > self)
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "model" | "model-prep" => Some(Self::ModelPrep),
            "2" | "outfit" | "outfit-prep" => Some(Self::OutfitPrep),
            "3" | "fusion" | "fuse" => Some(Self::Fusion),
            _ => None,
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ModelPrep => "model-prep",
            Self::OutfitPrep => "outfit-prep",
            Self::Fusion => "fusion",
        };
        write!(f, "{} ({name})", self.number())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StepStatus {
    #[default]
    Idle,
    Uploaded,
    Processing,
    Done,
    Error,
}

/// Per-step state. `approved` is a flag on top of `Done`, not a status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepState {
    pub status: StepStatus,
    pub original_image: Option<ImageRef>,
    pub processed_image: Option<ImageRef>,
    pub error: Option<String>,
    pub approved: bool,
    /// Generation of the process call whose result this step is waiting for.
    pub in_flight: Option<u64>,
}

impl StepState {
    pub fn is_initial(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downstream_lists_later_steps_in_order() {
        assert_eq!(
            StepId::ModelPrep.downstream().collect::<Vec<_>>(),
            vec![StepId::OutfitPrep, StepId::Fusion]
        );
        assert_eq!(
            StepId::OutfitPrep.downstream().collect::<Vec<_>>(),
            vec![StepId::Fusion]
        );
        assert_eq!(StepId::Fusion.downstream().count(), 0);
    }

    #[test]
    fn steps_map_to_edit_operations() {
        assert_eq!(
            StepId::ModelPrep.operation(),
            EditOperation::RemoveAccessories
        );
        assert_eq!(StepId::OutfitPrep.operation(), EditOperation::IsolateOutfit);
        assert_eq!(StepId::Fusion.operation(), EditOperation::Fuse);
    }

    #[test]
    fn parse_accepts_numbers_and_names() {
        assert_eq!(StepId::parse("1"), Some(StepId::ModelPrep));
        assert_eq!(StepId::parse("Outfit"), Some(StepId::OutfitPrep));
        assert_eq!(StepId::parse("fusion"), Some(StepId::Fusion));
        assert_eq!(StepId::parse("4"), None);
    }

    #[test]
    fn default_state_is_idle_and_unapproved() {
        let state = StepState::default();
        assert_eq!(state.status, StepStatus::Idle);
        assert!(!state.approved);
        assert!(state.is_initial());
    }
}
