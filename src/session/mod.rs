//! Session state machine
//!
//! The whole session is one serializable [`SessionState`] value moved
//! through [`reduce`]. Side effects (the generation call) are returned as
//! [`Effect`]s and executed by [`SessionController`], which feeds their
//! outcome back in as another [`Action`].

pub mod controller;
pub mod export;

pub use controller::SessionController;
pub use export::{DownloadArtifact, SharePayload};

use crate::error::GenerationError;
use crate::models::{EncodedImage, GenerationResult, HugStyle};
use crate::upload::SlotId;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// User-facing text for every generation failure.
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate the image. Please try again.";

pub type Outcome = std::result::Result<GenerationResult, GenerationError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    Ready,
    Generating,
    Result,
    Failed,
}

/// Advisory shown next to the controls; never changes the phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Notice {
    BothImagesRequired,
}

impl Notice {
    pub fn message(self) -> &'static str {
        match self {
            Notice::BothImagesRequired => "Please upload both images before generating.",
        }
    }
}

/// A failed generation: the kind for logs, the generic message for users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFailure {
    pub kind: GenerationError,
    pub message: String,
}

impl SessionFailure {
    pub fn new(kind: GenerationError) -> Self {
        Self {
            kind,
            message: GENERATION_FAILED_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub person1: Option<EncodedImage>,
    pub person2: Option<EncodedImage>,
    pub style: HugStyle,
    pub result: Option<GenerationResult>,
    pub in_flight: bool,
    pub error: Option<SessionFailure>,
    pub notice: Option<Notice>,
    /// Bumped on every accepted `Generate` and on `StartOver`; completions
    /// carrying an older value are dropped.
    pub epoch: u64,
}

impl SessionState {
    pub fn phase(&self) -> Phase {
        if self.in_flight {
            Phase::Generating
        } else if self.result.is_some() {
            Phase::Result
        } else if self.error.is_some() {
            Phase::Failed
        } else if self.both_images().is_some() {
            Phase::Ready
        } else {
            Phase::Idle
        }
    }

    pub fn slot(&self, slot: SlotId) -> Option<&EncodedImage> {
        match slot {
            SlotId::Person1 => self.person1.as_ref(),
            SlotId::Person2 => self.person2.as_ref(),
        }
    }

    fn slot_mut(&mut self, slot: SlotId) -> &mut Option<EncodedImage> {
        match slot {
            SlotId::Person1 => &mut self.person1,
            SlotId::Person2 => &mut self.person2,
        }
    }

    pub fn both_images(&self) -> Option<(&EncodedImage, &EncodedImage)> {
        Some((self.person1.as_ref()?, self.person2.as_ref()?))
    }

    pub fn can_generate(&self) -> bool {
        !self.in_flight && self.both_images().is_some()
    }

    /// Whether a completion tagged `epoch` belongs to the pending request.
    pub fn accepts_completion(&self, epoch: u64) -> bool {
        self.in_flight && self.epoch == epoch
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    SetImage {
        slot: SlotId,
        image: Option<EncodedImage>,
    },
    SetStyle {
        style: HugStyle,
    },
    Generate,
    GenerationFinished {
        epoch: u64,
        outcome: Outcome,
    },
    StartOver,
}

/// Everything the generation call needs, tagged with its epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub epoch: u64,
    pub person1: EncodedImage,
    pub person2: EncodedImage,
    pub style: HugStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Generate(GenerationRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: SessionState,
    pub effect: Option<Effect>,
}

impl Transition {
    fn stay(state: SessionState) -> Self {
        Self {
            state,
            effect: None,
        }
    }
}

pub fn reduce(mut state: SessionState, action: Action) -> Transition {
    match action {
        Action::SetImage { slot, image } => {
            let change = if image.is_some() { "set" } else { "cleared" };
            debug!("[{}] image {}", slot.label(), change);
            *state.slot_mut(slot) = image;
            Transition::stay(state)
        }
        Action::SetStyle { style } => {
            state.style = style;
            Transition::stay(state)
        }
        Action::Generate => {
            if state.in_flight {
                debug!("Generate ignored: a request is already in flight");
                return Transition::stay(state);
            }

            let Some((person1, person2)) = state
                .both_images()
                .map(|(a, b)| (a.clone(), b.clone()))
            else {
                info!("Generate ignored: both images are required");
                state.notice = Some(Notice::BothImagesRequired);
                return Transition::stay(state);
            };

            state.epoch = state.epoch.wrapping_add(1);
            state.in_flight = true;
            state.result = None;
            state.error = None;
            state.notice = None;
            info!("Starting generation #{} ({:?})", state.epoch, state.style);

            let request = GenerationRequest {
                epoch: state.epoch,
                person1,
                person2,
                style: state.style,
            };
            Transition {
                state,
                effect: Some(Effect::Generate(request)),
            }
        }
        Action::GenerationFinished { epoch, outcome } => {
            if !state.accepts_completion(epoch) {
                warn!(
                    "Discarding stale generation result #{} (current #{}, in flight: {})",
                    epoch, state.epoch, state.in_flight
                );
                return Transition::stay(state);
            }

            state.in_flight = false;
            match outcome {
                Ok(result) => {
                    info!("Generation #{} produced an image", epoch);
                    state.result = Some(result);
                }
                Err(kind) => {
                    error!("Generation #{} failed ({}): {}", epoch, kind.kind(), kind);
                    state.error = Some(SessionFailure::new(kind));
                }
            }
            Transition::stay(state)
        }
        Action::StartOver => {
            info!("Starting over");
            Transition::stay(SessionState {
                epoch: state.epoch.wrapping_add(1),
                ..SessionState::default()
            })
        }
    }
}
