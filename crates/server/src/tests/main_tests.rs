use super::*;
use axum::{body, body::Body, http::Request, response::Response};
use shared::domain::RegistryStatus;
use tower::ServiceExt;

fn test_app() -> Router {
    build_router(Arc::new(AppState {
        api: ApiContext::new(),
    }))
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

async fn create(app: &Router) -> CallRecord {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/calls",
            serde_json::json!({ "operatorId": 7, "originNumber": "+51 912 345 678" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await
}

#[tokio::test]
async fn healthz_reports_ok() {
    let response = test_app()
        .oneshot(Request::get("/healthz").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn accept_then_finalize_round_trips_status_strings() {
    let app = test_app();
    let call = create(&app).await;
    assert_eq!(call.status, RegistryStatus::Ringing);

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/calls/{}/state", call.id),
            serde_json::json!({ "state": "ACEPTADA" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let accepted: CallRecord = read_json(response).await;
    assert_eq!(accepted.status, RegistryStatus::Accepted);

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/calls/{}/finalize", call.id),
            serde_json::json!({ "durationSeconds": 125 }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let finalized: CallRecord = read_json(response).await;
    assert_eq!(finalized.status, RegistryStatus::Finalized);
    assert_eq!(finalized.duration_seconds, Some(125));
}

#[tokio::test]
async fn finalize_of_ringing_call_is_conflict() {
    let app = test_app();
    let call = create(&app).await;
    let response = app
        .oneshot(json_request(
            "PATCH",
            &format!("/calls/{}/finalize", call.id),
            serde_json::json!({ "durationSeconds": 3 }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let err: ApiError = read_json(response).await;
    assert_eq!(err.code, ErrorCode::Conflict);
}

#[tokio::test]
async fn blank_origin_number_is_bad_request() {
    let response = test_app()
        .oneshot(json_request(
            "POST",
            "/calls",
            serde_json::json!({ "operatorId": 7, "originNumber": "   " }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let err: ApiError = read_json(response).await;
    assert_eq!(err.code, ErrorCode::Validation);
}

#[tokio::test]
async fn unknown_call_state_change_is_not_found() {
    let response = test_app()
        .oneshot(json_request(
            "PATCH",
            "/calls/404/state",
            serde_json::json!({ "state": "DECLINADA" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ticket_route_links_accepted_call() {
    let app = test_app();
    let call = create(&app).await;
    app.clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/calls/{}/state", call.id),
            serde_json::json!({ "state": "ACEPTADA" }),
        ))
        .await
        .expect("response");

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/calls/{}/ticket", call.id),
            serde_json::json!({ "ticketId": 55 }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::get("/calls?operatorId=7")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    let calls: Vec<CallRecord> = read_json(response).await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].ticket_id, Some(shared::domain::TicketId(55)));
}
