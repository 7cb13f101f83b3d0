mod common;

use std::time::Duration;

use common::init_logging;
use leadpipe_core::{Category, Phase, Query, STATUS_READY};
use leadpipe_engine::{
    ClientSettings, FailureKind, JobHandle, JobStatus, PipelineBackend, PipelineController,
    ReqwestBackend,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer) -> ReqwestBackend {
    let settings = ClientSettings::default()
        .with_base_url(&server.uri())
        .expect("mock server uri");
    ReqwestBackend::new(settings).expect("client")
}

#[tokio::test]
async fn submit_posts_query_as_json() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pipeline/run"))
        .and(body_json(json!({ "query": "SaaS startups in Berlin" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "started",
            "message": "Pipeline execution started in background"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let handle = backend
        .submit(&Query::new("SaaS startups in Berlin").unwrap())
        .await
        .expect("submit ok");

    assert_eq!(handle, JobHandle::ambient());
}

#[tokio::test]
async fn submit_keeps_server_issued_run_id() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pipeline/run"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "started", "run_id": "r-7" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/pipeline/status"))
        .and(query_param("run_id", "r-7"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": "running", "message": "Scoring leads..." })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let handle = backend.submit(&Query::new("q").unwrap()).await.unwrap();
    assert_eq!(handle.server_run_id(), Some("r-7"));

    let report = backend.status(&handle).await.unwrap();
    assert_eq!(report.status, JobStatus::Running);
}

#[tokio::test]
async fn submit_rejection_carries_detail() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pipeline/run"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "detail": "Pipeline is already running" })),
        )
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let err = backend.submit(&Query::new("q").unwrap()).await.unwrap_err();

    assert_eq!(err.kind, FailureKind::HttpStatus(400));
    assert_eq!(err.detail.as_deref(), Some("Pipeline is already running"));
}

#[tokio::test]
async fn status_parses_report_fields() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pipeline/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "error",
            "message": "No leads found for this query. Try a broader search term.",
            "steps_completed": 0
        })))
        .mount(&server)
        .await;

    let report = backend_for(&server)
        .status(&JobHandle::ambient())
        .await
        .unwrap();

    assert_eq!(report.status, JobStatus::Error);
    assert_eq!(report.steps_completed, Some(0));
    assert_eq!(
        report.message,
        "No leads found for this query. Try a broader search term."
    );
}

#[tokio::test]
async fn malformed_status_is_a_decode_error() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pipeline/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .status(&JobHandle::ambient())
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Decode);
}

#[tokio::test]
async fn data_routes_decode_records() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data/leads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "url": "https://a.com", "emails": "x@a.com, y@a.com" },
            { "url": "https://b.com", "emails": "N/A" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/data/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "email": "x@a.com", "category": "hot", "reason": "Wants a demo" },
            { "email": "z@c.com", "category": "cold", "reason": null }
        ])))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let leads = backend.leads().await.unwrap();
    let forecast = backend.forecast().await.unwrap();

    assert_eq!(leads.len(), 2);
    assert_eq!(leads[0].email_list(), vec!["x@a.com", "y@a.com"]);
    assert_eq!(forecast[0].category, Category::Hot);
    assert_eq!(forecast[1].reason, "");
}

#[tokio::test]
async fn data_route_failure_reports_http_status() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data/forecast"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = backend_for(&server).forecast().await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(500));
    assert_eq!(err.detail, None);
}

#[tokio::test]
async fn slow_response_times_out_when_configured() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pipeline/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_json(json!({ "status": "running", "message": "slow" })),
        )
        .mount(&server)
        .await;

    let mut settings = ClientSettings::default().with_base_url(&server.uri()).unwrap();
    settings.request_timeout = Some(Duration::from_millis(50));
    let backend = ReqwestBackend::new(settings).unwrap();

    let err = backend.status(&JobHandle::ambient()).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    init_logging();
    let settings = ClientSettings::default()
        .with_base_url("http://127.0.0.1:9")
        .unwrap();
    let backend = ReqwestBackend::new(settings).unwrap();

    let err = backend.submit(&Query::new("q").unwrap()).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Network);
    assert_eq!(err.detail, None);
}

#[tokio::test]
async fn controller_runs_end_to_end_over_http() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pipeline/run"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "started" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/pipeline/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completed",
            "message": "Pipeline finished successfully",
            "steps_completed": 6
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/data/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "email": "x@a.com", "category": "hot", "reason": "Replied" },
            { "email": "y@b.com", "category": "hot", "reason": "Replied" },
            { "email": "z@c.com", "category": "warm", "reason": "Maybe" }
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/data/leads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "url": "a.com", "emails": "x@a.com" },
            { "url": "b.com", "emails": "N/A" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let settings = ClientSettings::default()
        .with_base_url(&server.uri())
        .unwrap()
        .with_poll_interval(Duration::from_millis(20))
        .unwrap();
    let mut controller =
        PipelineController::from_settings(&settings, &CancellationToken::new()).unwrap();

    controller.start("SaaS startups in Berlin").unwrap();
    let snapshot = controller.run_to_end().await;

    assert_eq!(snapshot.phase, Phase::Completed);
    assert_eq!(snapshot.status_message, STATUS_READY);
    assert_eq!(snapshot.aggregate.total_leads, 2);
    assert_eq!(snapshot.aggregate.qualified_email_count, 1);
    assert_eq!(snapshot.aggregate.hot_count, 2);
    assert_eq!(snapshot.aggregate.hot_rate, 67);
}
