use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use notewell_core::models::section::MappedSectionContent;
use notewell_core::models::session::{Session, SessionStatus};
use notewell_core::models::template::TemplateSectionInfo;
use notewell_gaps::{DetectionConfig, GapService};
use notewell_lambda::router;
use notewell_lambda::state::AppState;
use notewell_storage::memory::MemoryStore;

fn template(
    key: &str,
    name: &str,
    required: bool,
    min_length: u32,
    order: u32,
) -> TemplateSectionInfo {
    TemplateSectionInfo {
        id: Uuid::new_v4(),
        key: key.to_string(),
        name: name.to_string(),
        is_required: required,
        min_length: Some(min_length),
        keywords: Vec::new(),
        display_order: order,
        mapping_info: None,
        response_fields: None,
    }
}

fn mapped(
    session_id: Uuid,
    key: &str,
    content: &str,
    confidence: f64,
    order: u32,
) -> MappedSectionContent {
    MappedSectionContent {
        id: Uuid::new_v4(),
        session_id,
        section_key: key.to_string(),
        section_name: key.to_string(),
        raw_content: content.to_string(),
        processed_content: None,
        user_provided_content: None,
        final_content: None,
        confidence,
        needs_review: false,
        display_order: order,
    }
}

async fn app() -> (Router, Arc<MemoryStore>, Uuid) {
    let store = Arc::new(MemoryStore::new());
    let session_id = Uuid::new_v4();
    let template_id = Uuid::new_v4();
    let now = jiff::Timestamp::now();

    store
        .insert_session(Session {
            id: session_id,
            status: SessionStatus::Mapping,
            template_id,
            created_at: now,
            updated_at: now,
        })
        .await;
    store
        .insert_template(
            template_id,
            vec![
                template("subjective", "Subjective", true, 50, 1),
                template("objective", "Objective", true, 50, 2),
                template("plan", "Plan", false, 20, 3),
            ],
        )
        .await;
    store
        .insert_sections(vec![
            mapped(
                session_id,
                "subjective",
                "Client reports improved sleep and reduced anxiety at work since the last session.",
                90.0,
                1,
            ),
            mapped(session_id, "objective", "", 0.0, 2),
            mapped(session_id, "plan", "Follow up.", 90.0, 3),
        ])
        .await;

    let service = GapService::from_store(store.clone(), DetectionConfig::default());
    (router(AppState::new(service)), store, session_id)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::post(uri).body(Body::empty()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn put_json(uri: &str, body: Value) -> Request<Body> {
    Request::put(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_check_answers_ok() {
    let (app, _, _) = app().await;
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn analyze_returns_detection_envelope() {
    let (app, _, session_id) = app().await;
    let (status, body) =
        send(&app, post_empty(&format!("/sessions/{session_id}/gaps/analyze"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["result"]["completeness_score"], 47);
    let gaps = body["result"]["gaps"].as_array().unwrap();
    assert_eq!(gaps.len(), 2);
    assert_eq!(gaps[0]["section_key"], "objective");
    assert_eq!(gaps[0]["severity"], "critical");
    assert_eq!(gaps[0]["priority"], 1);
    assert_eq!(gaps[1]["kind"], "incomplete");
}

#[tokio::test]
async fn analyze_accepts_overrides() {
    let (app, _, session_id) = app().await;
    let request = Request::post(format!("/sessions/{session_id}/gaps/analyze"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "review_threshold": 45.0 }).to_string()))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["gaps"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_overrides_are_400_envelope() {
    let (app, store, session_id) = app().await;
    let request = Request::post(format!("/sessions/{session_id}/gaps/analyze"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().starts_with("invalid overrides"));
    assert!(body.get("result").is_none());

    assert_eq!(store.session(session_id).await.unwrap().status, SessionStatus::Mapping);
}

#[tokio::test]
async fn out_of_range_overrides_are_400_envelope() {
    let (app, _, session_id) = app().await;
    let request = Request::post(format!("/sessions/{session_id}/gaps/analyze"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "review_threshold": 150.0 }).to_string()))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn analyze_unknown_session_is_404_envelope() {
    let (app, _, _) = app().await;
    let (status, body) = send(
        &app,
        post_empty(&format!("/sessions/{}/gaps/analyze", Uuid::new_v4())),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().starts_with("session not found"));
    assert!(body.get("result").is_none());
}

#[tokio::test]
async fn list_filters_by_severity() {
    let (app, _, session_id) = app().await;
    send(&app, post_empty(&format!("/sessions/{session_id}/gaps/analyze"))).await;

    let (status, body) = send(
        &app,
        get(&format!("/sessions/{session_id}/gaps?severity=medium")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let gaps = body["gaps"].as_array().unwrap();
    assert_eq!(gaps.len(), 1);
    assert_eq!(gaps[0]["section_key"], "plan");
    assert_eq!(body["summary"]["total"], 2);
    assert_eq!(body["session_status"], "gaps_detected");
}

#[tokio::test]
async fn resolving_every_gap_makes_session_ready() {
    let (app, store, session_id) = app().await;
    let (_, analysis) =
        send(&app, post_empty(&format!("/sessions/{session_id}/gaps/analyze"))).await;
    let gap_ids: Vec<String> = analysis["result"]["gaps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["id"].as_str().unwrap().to_string())
        .collect();

    let (status, body) = send(
        &app,
        put_json(
            &format!("/gaps/{}", gap_ids[0]),
            json!({ "user_response": "Client reports improved mood" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["all_gaps_resolved"], false);
    assert_eq!(body["gap"]["is_resolved"], true);

    let (_, body) = send(
        &app,
        put_json(
            &format!("/gaps/{}", gap_ids[1]),
            json!({ "user_response": "Return in two weeks." }),
        ),
    )
    .await;
    assert_eq!(body["all_gaps_resolved"], true);

    let (_, readiness) = send(&app, get(&format!("/sessions/{session_id}/readiness"))).await;
    assert_eq!(readiness["status"], "completing");
    assert_eq!(readiness["ready_for_generation"], true);

    let objective = store
        .sections_of(session_id)
        .await
        .into_iter()
        .find(|s| s.section_key == "objective")
        .unwrap();
    assert!(
        objective
            .final_content
            .unwrap()
            .ends_with("[Additional Information]\nClient reports improved mood")
    );
}

#[tokio::test]
async fn empty_response_names_the_field() {
    let (app, _, session_id) = app().await;
    let (_, analysis) =
        send(&app, post_empty(&format!("/sessions/{session_id}/gaps/analyze"))).await;
    let gap_id = analysis["result"]["gaps"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        put_json(&format!("/gaps/{gap_id}"), json!({ "user_response": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "user_response");
    assert_eq!(body["error"], "response must not be empty");
}

#[tokio::test]
async fn dismissal_removes_gap() {
    let (app, _, session_id) = app().await;
    let (_, analysis) =
        send(&app, post_empty(&format!("/sessions/{session_id}/gaps/analyze"))).await;
    let gap_id = analysis["result"]["gaps"][1]["id"].as_str().unwrap().to_string();

    let request = Request::delete(format!("/gaps/{gap_id}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);

    let (_, listing) = send(
        &app,
        get(&format!("/sessions/{session_id}/gaps?include_resolved=true")),
    )
    .await;
    assert_eq!(listing["gaps"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_gap_is_404() {
    let (app, _, _) = app().await;
    let (status, body) = send(
        &app,
        put_json(
            &format!("/gaps/{}", Uuid::new_v4()),
            json!({ "user_response": "anything" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().starts_with("gap not found"));
}
