use base64::Engine as _;
use hugfusion::{
    ai::{CredentialSource, GeminiHugClient, MockHugClient},
    error::{GenerationError, UploadError},
    models::{EncodedImage, HugStyle},
    session::{Phase, SessionController, SessionState, GENERATION_FAILED_MESSAGE},
    upload::{CandidateFile, SlotId, UploadPolicy, MAX_FILE_SIZE},
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_string_contains, method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MB: usize = 1024 * 1024;
const GENERATE_CONTENT: &str = r"^/v1beta/models/[^/]+:generateContent$";

fn gemini(server: &MockServer) -> Arc<GeminiHugClient> {
    Arc::new(
        GeminiHugClient::new(
            "gemini-2.5-flash-image".to_string(),
            CredentialSource::Static(Some("test-key".to_string())),
        )
        .with_base_url(server.uri()),
    )
}

fn image_body(bytes: &[u8]) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {
                "parts": [{
                    "inlineData": {
                        "mimeType": "image/png",
                        "data": base64::engine::general_purpose::STANDARD.encode(bytes)
                    }
                }]
            }
        }]
    })
}

fn jpeg(size: usize) -> CandidateFile {
    CandidateFile::from_bytes("person1.jpg", "image/jpeg", vec![0xAB; size])
}

fn png(size: usize) -> CandidateFile {
    CandidateFile::from_bytes("person2.png", "image/png", vec![0xCD; size])
}

#[tokio::test]
async fn test_cartoon_hug_end_to_end() {
    let server = MockServer::start().await;
    let person1 = jpeg(2 * MB);
    let person2 = png(3 * MB);
    let encoded1 = EncodedImage::from_bytes(&vec![0xAB; 2 * MB], "image/jpeg");
    let encoded2 = EncodedImage::from_bytes(&vec![0xCD; 3 * MB], "image/png");

    Mock::given(method("POST"))
        .and(path_regex(GENERATE_CONTENT))
        .and(body_string_contains("cartoon/anime"))
        .and(body_string_contains(encoded1.payload()))
        .and(body_string_contains(encoded2.payload()))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_body(&[1, 2, 3])))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = SessionController::new(gemini(&server));
    assert_ok!(session.submit_file(SlotId::Person1, &person1).await);
    assert_ok!(session.submit_file(SlotId::Person2, &person2).await);
    session.set_style(HugStyle::Cartoon);

    assert!(session.trigger_generate());
    assert_eq!(session.wait_until_settled().await, Phase::Result);

    let result = session.state().result.clone().unwrap();
    assert_eq!(result.decode().unwrap(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_oversized_png_keeps_generation_blocked() {
    let mock = MockHugClient::new();
    let mut session = SessionController::new(Arc::new(mock.clone()));

    assert_ok!(session.submit_file(SlotId::Person1, &jpeg(1024)).await);
    let rejection = assert_err!(session.submit_file(SlotId::Person2, &png(12 * MB)).await);

    assert_eq!(
        rejection,
        UploadError::SizeExceedsLimit {
            size: (12 * MB) as u64,
            limit: MAX_FILE_SIZE
        }
    );
    assert!(session.slot(SlotId::Person2).current().is_none());
    assert!(!session.trigger_generate());
    assert_eq!(mock.get_call_count(), 0);
}

#[tokio::test]
async fn test_file_exactly_at_limit_is_accepted() {
    let mut session = SessionController::new(Arc::new(MockHugClient::new()));
    assert_ok!(
        session
            .submit_file(SlotId::Person1, &png(MAX_FILE_SIZE as usize))
            .await
    );
}

#[tokio::test]
async fn test_response_without_image_fails_and_retry_is_available() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(GENERATE_CONTENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "I can't do that" }] } }]
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(GENERATE_CONTENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_body(&[9])))
        .mount(&server)
        .await;

    let mut session = SessionController::new(gemini(&server));
    assert_ok!(session.submit_file(SlotId::Person1, &jpeg(16)).await);
    assert_ok!(session.submit_file(SlotId::Person2, &png(16)).await);

    session.trigger_generate();
    assert_eq!(session.wait_until_settled().await, Phase::Failed);

    let failure = session.state().error.clone().unwrap();
    assert_eq!(failure.kind, GenerationError::NoImageReturned);
    assert_eq!(failure.message, GENERATION_FAILED_MESSAGE);
    assert!(session.state().both_images().is_some());

    assert!(session.trigger_generate());
    assert_eq!(session.wait_until_settled().await, Phase::Result);
}

#[tokio::test]
async fn test_missing_credential_fails_without_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_body(&[1])))
        .expect(0)
        .mount(&server)
        .await;

    let client = GeminiHugClient::new(
        "gemini-2.5-flash-image".to_string(),
        CredentialSource::Static(None),
    )
    .with_base_url(server.uri());

    let mut session = SessionController::new(Arc::new(client));
    assert_ok!(session.submit_file(SlotId::Person1, &jpeg(4)).await);
    assert_ok!(session.submit_file(SlotId::Person2, &png(4)).await);

    session.trigger_generate();
    assert_eq!(session.wait_until_settled().await, Phase::Failed);
    assert_eq!(
        session.state().error.as_ref().unwrap().kind,
        GenerationError::MissingCredential
    );
}

#[tokio::test]
async fn test_start_over_while_generating_ignores_late_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(GENERATE_CONTENT))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(image_body(&[1]))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut session = SessionController::new(gemini(&server));
    assert_ok!(session.submit_file(SlotId::Person1, &jpeg(4)).await);
    assert_ok!(session.submit_file(SlotId::Person2, &png(4)).await);

    assert!(session.trigger_generate());
    assert!(!session.trigger_generate());
    session.start_over();

    assert!(!session.next_completion().await);

    let state = session.state();
    assert_eq!(session.phase(), Phase::Idle);
    assert_eq!(
        state,
        &SessionState {
            epoch: state.epoch,
            ..SessionState::default()
        }
    );
}

#[tokio::test]
async fn test_start_over_from_result_resets_to_idle() {
    let mock = MockHugClient::new();
    let mut session = SessionController::new(Arc::new(mock));
    assert_ok!(session.submit_file(SlotId::Person1, &jpeg(4)).await);
    assert_ok!(session.submit_file(SlotId::Person2, &png(4)).await);
    session.set_style(HugStyle::Cartoon);
    session.trigger_generate();
    session.wait_until_settled().await;

    session.start_over();

    let state = session.state();
    assert_eq!(session.phase(), Phase::Idle);
    assert!(state.person1.is_none() && state.person2.is_none());
    assert!(state.result.is_none() && state.error.is_none());
    assert!(!state.in_flight);
    assert_eq!(state.style, HugStyle::Realistic);
}

#[tokio::test]
async fn test_regenerate_sends_same_images_with_current_style() {
    let mock = MockHugClient::new();
    let mut session = SessionController::new(Arc::new(mock.clone()));
    assert_ok!(session.submit_file(SlotId::Person1, &jpeg(4)).await);
    assert_ok!(session.submit_file(SlotId::Person2, &png(4)).await);

    session.trigger_generate();
    session.wait_until_settled().await;
    session.set_style(HugStyle::Cartoon);
    session.trigger_generate();
    session.wait_until_settled().await;

    let calls = mock.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].person1, calls[1].person1);
    assert_eq!(calls[0].person2, calls[1].person2);
    assert_eq!(calls[0].style, HugStyle::Realistic);
    assert_eq!(calls[1].style, HugStyle::Cartoon);
}

#[tokio::test]
async fn test_files_on_disk_flow_through_to_download() {
    let dir = tempfile::tempdir().unwrap();
    let photo1 = dir.path().join("alice.jpeg");
    let photo2 = dir.path().join("bob.PNG");
    let notes = dir.path().join("notes.txt");
    std::fs::write(&photo1, [0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
    std::fs::write(&photo2, [0x89, 0x50, 0x4E, 0x47]).unwrap();
    std::fs::write(&notes, b"hello").unwrap();

    let mock = MockHugClient::new().with_image_response(vec![42, 42]);
    let mut session = SessionController::with_policy(Arc::new(mock), UploadPolicy::DEFAULT);

    let text = CandidateFile::from_path(&notes).await.unwrap();
    let rejection = assert_err!(session.submit_file(SlotId::Person1, &text).await);
    assert!(matches!(rejection, UploadError::UnsupportedMediaType { .. }));

    for (slot, path) in [(SlotId::Person1, &photo1), (SlotId::Person2, &photo2)] {
        let file = CandidateFile::from_path(path).await.unwrap();
        assert_ok!(session.submit_file(slot, &file).await);
    }
    assert_eq!(
        session.state().person1.as_ref().unwrap().media_type(),
        "image/jpeg"
    );

    session.trigger_generate();
    assert_eq!(session.wait_until_settled().await, Phase::Result);

    let out = dir.path().join("out");
    let saved = session
        .download()
        .unwrap()
        .unwrap()
        .save_to(&out)
        .await
        .unwrap();
    assert_eq!(std::fs::read(saved).unwrap(), vec![42, 42]);
}
