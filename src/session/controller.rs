use super::{
    reduce, Action, DownloadArtifact, Effect, GenerationRequest, Phase, SessionState, SharePayload,
};
use crate::ai::HugGenerationService;
use crate::error::{GenerationError, UploadError};
use crate::models::HugStyle;
use crate::upload::{CandidateFile, SlotId, SlotNotice, UploadPolicy, UploadSlot};
use crate::Result;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Drives a session: owns the upload slots, runs the generation effect on
/// the Tokio runtime and applies completions through [`reduce`].
pub struct SessionController {
    state: SessionState,
    person1: UploadSlot,
    person2: UploadSlot,
    service: Arc<dyn HugGenerationService>,
    completions_tx: mpsc::UnboundedSender<Action>,
    completions_rx: mpsc::UnboundedReceiver<Action>,
}

impl SessionController {
    pub fn new(service: Arc<dyn HugGenerationService>) -> Self {
        Self::with_policy(service, UploadPolicy::DEFAULT)
    }

    pub fn with_policy(service: Arc<dyn HugGenerationService>, policy: UploadPolicy) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            state: SessionState::default(),
            person1: UploadSlot::with_policy(SlotId::Person1, policy),
            person2: UploadSlot::with_policy(SlotId::Person2, policy),
            service,
            completions_tx,
            completions_rx,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn slot(&self, id: SlotId) -> &UploadSlot {
        match id {
            SlotId::Person1 => &self.person1,
            SlotId::Person2 => &self.person2,
        }
    }

    /// Offers `file` to a slot. Rejections stay on the slot and are also
    /// returned for convenience.
    pub async fn submit_file(
        &mut self,
        id: SlotId,
        file: &CandidateFile,
    ) -> std::result::Result<(), UploadError> {
        let notice = self.slot_mut(id).submit(file).await;
        self.apply_notice(id, notice);

        match self.slot(id).last_error() {
            Some(rejection) => Err(rejection.clone()),
            None => Ok(()),
        }
    }

    /// Drop onto a slot; only the first file is used.
    pub async fn drop_files(&mut self, id: SlotId, files: &[CandidateFile]) {
        if let Some(notice) = self.slot_mut(id).drop_files(files).await {
            self.apply_notice(id, notice);
        }
    }

    /// Highlights a slot while files are dragged over it.
    pub fn drag_enter(&mut self, id: SlotId) {
        self.slot_mut(id).drag_enter();
    }

    pub fn drag_leave(&mut self, id: SlotId) {
        self.slot_mut(id).drag_leave();
    }

    pub fn clear_slot(&mut self, id: SlotId) {
        let notice = self.slot_mut(id).clear();
        self.apply_notice(id, notice);
    }

    pub fn set_style(&mut self, style: HugStyle) {
        self.dispatch(Action::SetStyle { style });
    }

    /// Starts a generation if the session allows one.
    ///
    /// Returns `true` when a request was sent. Must be called from within a
    /// Tokio runtime.
    pub fn trigger_generate(&mut self) -> bool {
        self.dispatch(Action::Generate)
    }

    /// Empties both slots and the session. A response still in flight is
    /// dropped when it arrives.
    pub fn start_over(&mut self) {
        for slot in [&mut self.person1, &mut self.person2] {
            slot.clear();
            slot.drag_leave();
        }
        self.dispatch(Action::StartOver);
    }

    /// Waits for the next generation completion and applies it.
    ///
    /// Returns `false` when the completion was stale and ignored. Waits
    /// forever if nothing was ever sent, so only call it after
    /// [`SessionController::trigger_generate`].
    pub async fn next_completion(&mut self) -> bool {
        let Some(action) = self.completions_rx.recv().await else {
            return false;
        };

        let applied = match &action {
            Action::GenerationFinished { epoch, .. } => self.state.accepts_completion(*epoch),
            _ => false,
        };
        self.dispatch(action);
        applied
    }

    /// Applies completions until nothing is in flight.
    pub async fn wait_until_settled(&mut self) -> Phase {
        while self.state.in_flight {
            self.next_completion().await;
        }
        self.phase()
    }

    /// The current result as a timestamped file, if there is one.
    pub fn download(&self) -> Result<Option<DownloadArtifact>> {
        self.state
            .result
            .as_ref()
            .map(|result| DownloadArtifact::from_result(result, Utc::now()))
            .transpose()
    }

    pub fn share(&self) -> Result<Option<SharePayload>> {
        self.state
            .result
            .as_ref()
            .map(SharePayload::from_result)
            .transpose()
    }

    fn slot_mut(&mut self, id: SlotId) -> &mut UploadSlot {
        match id {
            SlotId::Person1 => &mut self.person1,
            SlotId::Person2 => &mut self.person2,
        }
    }

    fn apply_notice(&mut self, id: SlotId, notice: SlotNotice) {
        self.dispatch(Action::SetImage {
            slot: id,
            image: notice.into_image(),
        });
    }

    /// Runs the reducer and any effect; `true` if an effect was started.
    fn dispatch(&mut self, action: Action) -> bool {
        let transition = reduce(std::mem::take(&mut self.state), action);
        self.state = transition.state;

        match transition.effect {
            Some(Effect::Generate(request)) => {
                self.spawn_generation(request);
                true
            }
            None => false,
        }
    }

    fn spawn_generation(&self, request: GenerationRequest) {
        let service = Arc::clone(&self.service);
        let completions = self.completions_tx.clone();

        tokio::spawn(async move {
            let outcome = service
                .generate(&request.person1, &request.person2, request.style)
                .await
                .map_err(GenerationError::from);

            if completions
                .send(Action::GenerationFinished {
                    epoch: request.epoch,
                    outcome,
                })
                .is_err()
            {
                debug!("Session closed before generation #{} finished", request.epoch);
            }
        });
    }
}
