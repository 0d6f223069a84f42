use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use checker_core::{
    CheckError, ClientViewModel, ImageFile, Phase, SubmissionId, TransportKind,
    ValidationError, MAX_IMAGE_BYTES,
};
use checker_engine::{ClientSettings, FlowObserver, ReqwestApi, SubmissionClient};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(checker_logging::initialize_for_tests);
}

fn settings(server: &MockServer) -> ClientSettings {
    ClientSettings {
        base_url: server.uri(),
        poll_interval: Duration::from_millis(5),
        ..ClientSettings::default()
    }
}

fn client(server: &MockServer) -> SubmissionClient<ReqwestApi> {
    let settings = settings(server);
    let api = ReqwestApi::new(&settings).expect("api");
    SubmissionClient::new(api, settings)
}

async fn mount_create(server: &MockServer, id: &str) {
    Mock::given(method("POST"))
        .and(path("/check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "submission_id": id })))
        .expect(1)
        .mount(server)
        .await;
}

fn pending() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "status": "processing" }))
}

async fn result_polls(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .expect("request recording")
        .iter()
        .filter(|request| request.url.path().starts_with("/result/"))
        .count()
}

#[tokio::test]
async fn completes_on_thirtieth_poll() {
    init_logging();
    let server = MockServer::start().await;
    mount_create(&server, "sub-30").await;
    Mock::given(method("GET"))
        .and(path("/result/sub-30"))
        .respond_with(pending())
        .up_to_n_times(29)
        .expect(29)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/result/sub-30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completed",
            "claim": "Garlic cures COVID-19",
            "normalized_claim": "garlic cures covid-19",
            "confidence": 0.12,
            "explanation": "No clinical evidence supports this."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client(&server);
    let outcome = client
        .check("Garlic cures COVID-19", &CancellationToken::new())
        .await;

    assert_eq!(outcome.polls, 30);
    assert_eq!(outcome.submission_id, Some(SubmissionId::new("sub-30")));
    let result = outcome.result.expect("completed");
    assert_eq!(result.claim.as_deref(), Some("Garlic cures COVID-19"));
    assert_eq!(result.confidence, 0.12);
    assert_eq!(client.phase(), Phase::Completed);
    assert_eq!(result_polls(&server).await, 30);
}

#[tokio::test]
async fn status_less_polls_keep_polling() {
    init_logging();
    let server = MockServer::start().await;
    mount_create(&server, "quiet").await;
    Mock::given(method("GET"))
        .and(path("/result/quiet"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "claim": "draft" })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/result/quiet"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": null })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/result/quiet"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "completed", "confidence": 0.8 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client(&server);
    let outcome = client.check("claim", &CancellationToken::new()).await;

    assert_eq!(outcome.polls, 3);
    assert_eq!(outcome.result.expect("completed").confidence, 0.8);
    assert_eq!(result_polls(&server).await, 3);
}

#[tokio::test]
async fn times_out_after_thirty_pending_polls() {
    init_logging();
    let server = MockServer::start().await;
    mount_create(&server, "slow").await;
    Mock::given(method("GET"))
        .and(path("/result/slow"))
        .respond_with(pending())
        .expect(30)
        .mount(&server)
        .await;

    let mut client = client(&server);
    let outcome = client.check("claim", &CancellationToken::new()).await;

    assert_eq!(outcome.result, Err(CheckError::Timeout { attempts: 30 }));
    assert_eq!(client.phase(), Phase::TimedOut);
    assert_eq!(result_polls(&server).await, 30);
}

#[tokio::test]
async fn backend_error_stops_after_first_poll() {
    init_logging();
    let server = MockServer::start().await;
    mount_create(&server, "dup").await;
    Mock::given(method("GET"))
        .and(path("/result/dup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "error",
            "explanation": "duplicate claim"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client(&server);
    let outcome = client.check("claim", &CancellationToken::new()).await;

    assert_eq!(
        outcome.result,
        Err(CheckError::Backend("duplicate claim".to_string()))
    );
    assert_eq!(client.phase(), Phase::Failed);
    assert_eq!(result_polls(&server).await, 1);
}

#[tokio::test]
async fn submit_http_failure_is_a_transport_error() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/check"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client(&server);
    let outcome = client.check("claim", &CancellationToken::new()).await;

    match outcome.result {
        Err(CheckError::Transport(err)) => {
            assert_eq!(err.kind, TransportKind::HttpStatus(500));
            assert_eq!(err.message, "API error: 500");
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(result_polls(&server).await, 0);
}

#[tokio::test]
async fn poll_http_failure_is_not_retried() {
    init_logging();
    let server = MockServer::start().await;
    mount_create(&server, "gone").await;
    Mock::given(method("GET"))
        .and(path("/result/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client(&server);
    let outcome = client.check("claim", &CancellationToken::new()).await;

    assert!(matches!(
        outcome.result,
        Err(CheckError::Transport(ref err)) if err.kind == TransportKind::HttpStatus(404)
    ));
    assert_eq!(outcome.polls, 1);
}

#[tokio::test]
async fn malformed_poll_body_is_a_decode_failure() {
    init_logging();
    let server = MockServer::start().await;
    mount_create(&server, "weird").await;
    Mock::given(method("GET"))
        .and(path("/result/weird"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let mut client = client(&server);
    let outcome = client.check("claim", &CancellationToken::new()).await;

    assert!(matches!(
        outcome.result,
        Err(CheckError::Transport(ref err)) if err.kind == TransportKind::Decode
    ));
}

#[tokio::test]
async fn url_input_is_sent_in_the_url_field() {
    init_logging();
    let server = MockServer::start().await;
    mount_create(&server, "u1").await;
    Mock::given(method("GET"))
        .and(path("/result/u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "completed" })))
        .mount(&server)
        .await;

    let mut client = client(&server);
    let outcome = client
        .check("https://example.com/article", &CancellationToken::new())
        .await;
    assert!(outcome.result.is_ok());

    let requests = server.received_requests().await.expect("requests");
    let submit = requests
        .iter()
        .find(|request| request.url.path() == "/check")
        .expect("submit request");
    let body = String::from_utf8_lossy(&submit.body);
    assert!(body.contains("name=\"url\""));
    assert!(body.contains("https://example.com/article"));
    assert!(!body.contains("name=\"text\""));
}

#[tokio::test]
async fn selected_file_is_uploaded_instead_of_text() {
    init_logging();
    let server = MockServer::start().await;
    mount_create(&server, "f1").await;
    Mock::given(method("GET"))
        .and(path("/result/f1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "completed" })))
        .mount(&server)
        .await;

    let mut client = client(&server);
    client
        .select_file(ImageFile::new("meme.png", "image/png", b"PNGDATA".to_vec()))
        .expect("valid image");
    let outcome = client
        .check("this text is not submitted", &CancellationToken::new())
        .await;
    assert!(outcome.result.is_ok());
    assert!(client.state().selected_file().is_none());

    let requests = server.received_requests().await.expect("requests");
    let body = String::from_utf8_lossy(&requests[0].body).into_owned();
    assert!(body.contains("name=\"file\"; filename=\"meme.png\""));
    assert!(body.contains("PNGDATA"));
    assert!(!body.contains("this text is not submitted"));
}

#[tokio::test]
async fn invalid_input_never_reaches_the_network() {
    init_logging();
    let server = MockServer::start().await;
    let mut client = client(&server);

    let oversized = ImageFile::new(
        "big.jpg",
        "image/jpeg",
        vec![0u8; MAX_IMAGE_BYTES as usize + 1],
    );
    assert!(matches!(
        client.select_file(oversized),
        Err(CheckError::Validation(ValidationError::FileTooLarge { .. }))
    ));
    let pdf = ImageFile::new("paper.pdf", "application/pdf", vec![1]);
    assert!(matches!(
        client.select_file(pdf),
        Err(CheckError::Validation(ValidationError::NotAnImage { .. }))
    ));

    let outcome = client.check("   ", &CancellationToken::new()).await;
    assert_eq!(
        outcome.result,
        Err(CheckError::Validation(ValidationError::EmptyInput))
    );
    assert_eq!(client.phase(), Phase::Idle);

    let requests = server.received_requests().await.expect("requests");
    assert!(requests.is_empty());
}

#[tokio::test]
async fn cancellation_stops_polling_and_frees_the_client() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "submission_id": "c1" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/result/c1"))
        .respond_with(pending())
        .mount(&server)
        .await;

    let settings = ClientSettings {
        base_url: server.uri(),
        poll_interval: Duration::from_millis(20),
        ..ClientSettings::default()
    };
    let mut client = SubmissionClient::new(ReqwestApi::new(&settings).expect("api"), settings);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(120)).await;
        trigger.cancel();
    });

    let outcome = client.check("claim", &cancel).await;
    assert_eq!(outcome.result, Err(CheckError::Cancelled));
    assert_eq!(outcome.submission_id, Some(SubmissionId::new("c1")));
    assert_eq!(client.phase(), Phase::Cancelled);

    // Let any request that was already on the wire land before counting.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let polls_at_cancel = result_polls(&server).await;
    assert!(polls_at_cancel < 30);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(result_polls(&server).await, polls_at_cancel);
    assert!(!client.state().is_busy());
}

#[tokio::test]
async fn already_cancelled_token_sends_nothing() {
    init_logging();
    let server = MockServer::start().await;
    let mut client = client(&server);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let outcome = client.check("claim", &cancel).await;

    assert_eq!(outcome.result, Err(CheckError::Cancelled));
    assert!(server.received_requests().await.expect("requests").is_empty());
}

#[derive(Default)]
struct RecordingObserver {
    views: Mutex<Vec<ClientViewModel>>,
}

impl FlowObserver for RecordingObserver {
    fn on_change(&self, view: &ClientViewModel) {
        self.views.lock().unwrap().push(view.clone());
    }
}

#[tokio::test]
async fn observer_sees_each_phase_in_order() {
    init_logging();
    let server = MockServer::start().await;
    mount_create(&server, "o1").await;
    Mock::given(method("GET"))
        .and(path("/result/o1"))
        .respond_with(pending())
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/result/o1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "completed" })))
        .mount(&server)
        .await;

    let observer = Arc::new(RecordingObserver::default());
    let mut client = client(&server).with_observer(observer.clone());
    client.check("claim", &CancellationToken::new()).await;

    let views = observer.views.lock().unwrap();
    let phases: Vec<Phase> = views.iter().map(|view| view.phase).collect();
    assert_eq!(
        phases,
        vec![
            Phase::Submitting,
            Phase::Polling,
            Phase::Polling,
            Phase::Polling,
            Phase::Completed,
        ]
    );
    assert_eq!(views[3].attempts, 2);
    assert!(!views[1].input_enabled);
    assert!(views[4].input_enabled);
}
