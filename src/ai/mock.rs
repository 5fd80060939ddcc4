use super::HugGenerationService;
use crate::error::GenerationError;
use crate::models::{EncodedImage, GenerationResult, HugStyle};
use crate::Result;
use async_trait::async_trait;
use base64::Engine as _;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Smallest valid PNG, returned when no response is queued.
const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1 pixel
    0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44,
    0x41, // IDAT chunk
    0x54, 0x08, 0x99, 0x63, 0xF8, 0xCF, 0xC0, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0xE2, 0x25,
    0x00, 0xBC, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, // IEND chunk
    0x44, 0xAE, 0x42, 0x60, 0x82,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub person1: EncodedImage,
    pub person2: EncodedImage,
    pub style: HugStyle,
}

type Outcome = std::result::Result<GenerationResult, GenerationError>;

/// In-memory generation service for tests and dry runs.
///
/// Clones share state, so a clone kept by a test can observe calls made
/// through the session.
#[derive(Clone)]
pub struct MockHugClient {
    outcomes: Arc<Mutex<VecDeque<Outcome>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    gate: Option<Arc<Semaphore>>,
}

impl MockHugClient {
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            gate: None,
        }
    }

    pub fn with_image_response(self, bytes: Vec<u8>) -> Self {
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        self.outcomes
            .lock()
            .unwrap()
            .push_back(Ok(GenerationResult::new(payload, Some("image/png"))));
        self
    }

    pub fn with_failure(self, error: GenerationError) -> Self {
        self.outcomes.lock().unwrap().push_back(Err(error));
        self
    }

    /// Holds every call in flight until [`MockHugClient::release`] is called.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Lets `n` held calls complete.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockHugClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HugGenerationService for MockHugClient {
    async fn generate(
        &self,
        person1: &EncodedImage,
        person2: &EncodedImage,
        style: HugStyle,
    ) -> Result<GenerationResult> {
        self.calls.lock().unwrap().push(RecordedCall {
            person1: person1.clone(),
            person2: person2.clone(),
            style,
        });

        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| GenerationError::failed(e.to_string()))?
                .forget();
        }

        let next = self.outcomes.lock().unwrap().pop_front();
        match next {
            Some(outcome) => outcome.map_err(Into::into),
            None => Ok(GenerationResult::new(
                base64::engine::general_purpose::STANDARD.encode(TINY_PNG),
                Some("image/png"),
            )),
        }
    }
}
