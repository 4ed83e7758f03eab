use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::Response;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::catch_panic::CatchPanicLayer;

use revise_core::catalog;
use services::ProgressService;

use crate::envelope::ApiError;

type SharedService = Arc<ProgressService>;

/// Build the API router over a shared progress service.
#[must_use]
pub fn router(service: SharedService) -> Router {
    Router::new()
        .route("/api/student-info", get(student_info))
        .route("/api/baseline", post(baseline))
        .route("/api/dashboard", get(dashboard))
        .route("/api/quiz", post(quiz))
        .route("/api/study-plan", get(study_plan))
        .route("/api/exam-predictor", get(exam_predictor))
        .route("/api/explain", post(explain))
        .route("/api/reflection", post(reflection))
        .route("/api/topics", get(topics))
        .route("/api/reset", post(reset))
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(service)
}

fn panic_response(_: Box<dyn Any + Send + 'static>) -> Response<Body> {
    ApiError::internal().into_response()
}

async fn not_found() -> ApiError {
    ApiError::not_found()
}

async fn student_info(State(service): State<SharedService>) -> Json<Value> {
    let info = service.student_info().await;
    Json(json!({ "status": "success", "data": info }))
}

/// Request bodies are read leniently: absent fields behave like empty
/// input and fall through to the service-level validation.
fn field<'a>(body: &'a Value, name: &str) -> &'a str {
    body.get(name).and_then(Value::as_str).unwrap_or("")
}

async fn baseline(
    State(service): State<SharedService>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let answers: BTreeMap<String, String> = body
        .get("answers")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .map(|(topic, answer)| {
                    (
                        topic.clone(),
                        answer.as_str().unwrap_or("").to_string(),
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    let outcome = service.submit_baseline(&answers).await?;
    Ok(Json(json!({
        "status": "success",
        "readiness_score": outcome.readiness_score,
        "message": outcome.message,
    })))
}

async fn dashboard(State(service): State<SharedService>) -> Json<Value> {
    let view = service.dashboard().await;
    Json(json!({ "status": "success", "data": view }))
}

async fn quiz(
    State(service): State<SharedService>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let feedback = service
        .submit_quiz(field(&body, "topic"), field(&body, "answer"))
        .await?;

    Ok(Json(json!({
        "status": "success",
        "correct": feedback.correct,
        "explanation": feedback.explanation,
        "online": feedback.online,
    })))
}

async fn study_plan(
    State(service): State<SharedService>,
) -> Result<Json<Value>, ApiError> {
    let plan = service.study_plan().await?;
    Ok(Json(json!({ "status": "success", "data": plan })))
}

async fn exam_predictor(
    State(service): State<SharedService>,
) -> Result<Json<Value>, ApiError> {
    let predicted = service.exam_prediction().await?;
    Ok(Json(json!({ "status": "success", "data": predicted })))
}

async fn explain(
    State(service): State<SharedService>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let explanation = service.explain(field(&body, "topic")).await?;
    Ok(Json(json!({
        "status": "success",
        "explanation": explanation.explanation,
        "online": explanation.online,
    })))
}

async fn reflection(
    State(service): State<SharedService>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    service.add_reflection(field(&body, "entry")).await?;
    Ok(Json(json!({ "status": "success", "message": "Reflection saved!" })))
}

async fn topics(State(_service): State<SharedService>) -> Json<Value> {
    let map: serde_json::Map<String, Value> = catalog::SUBJECT_TOPICS
        .iter()
        .map(|(subject, topics)| ((*subject).to_string(), json!(topics)))
        .collect();

    Json(json!({ "status": "success", "topics": map }))
}

async fn reset(State(service): State<SharedService>) -> Json<Value> {
    service.reset().await;
    Json(json!({ "status": "success", "message": "Data reset successfully" }))
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::{header, Request, StatusCode};
    use revise_core::time::fixed_clock;
    use services::FixedProbe;
    use storage::InMemoryStore;
    use tower::ServiceExt;

    async fn test_router() -> Router {
        let service = ProgressService::new(
            fixed_clock(),
            Arc::new(InMemoryStore::new()),
            Arc::new(FixedProbe::offline()),
        )
        .await;
        router(Arc::new(service))
    }

    async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = router
            .clone()
            .oneshot(
                Request::post(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn student_info_wraps_data_in_envelope() {
        let router = test_router().await;
        let (status, body) = get_json(&router, "/api/student-info").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["username"], "Student");
        assert_eq!(body["data"]["baseline_done"], false);
        assert_eq!(body["data"]["readiness_score"], 0);
    }

    #[tokio::test]
    async fn baseline_succeeds_once_then_rejects() {
        let router = test_router().await;
        let payload = json!({ "answers": { "cells": "cells are alive" } });

        let (status, body) = post_json(&router, "/api/baseline", payload.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["readiness_score"], 100);

        let (status, body) = post_json(&router, "/api/baseline", payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "baseline already completed");
    }

    #[tokio::test]
    async fn baseline_rejects_missing_answers() {
        let router = test_router().await;
        let (status, body) = post_json(&router, "/api/baseline", json!({})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "no answers provided");
    }

    #[tokio::test]
    async fn quiz_flow_grades_and_explains() {
        let router = test_router().await;
        post_json(
            &router,
            "/api/baseline",
            json!({ "answers": { "cells": "cells are alive" } }),
        )
        .await;

        let (status, body) = post_json(
            &router,
            "/api/quiz",
            json!({ "topic": "cells", "answer": "cells are everywhere" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["correct"], true);
        assert_eq!(body["explanation"], "Great understanding!");

        let (status, body) = post_json(
            &router,
            "/api/quiz",
            json!({ "topic": "cells", "answer": "i forget" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["correct"], false);
        assert_eq!(body["online"], false);
    }

    #[tokio::test]
    async fn quiz_validates_topics() {
        let router = test_router().await;

        let (status, body) =
            post_json(&router, "/api/quiz", json!({ "topic": "cells", "answer": "x" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            "no topics tracked yet; complete the baseline first"
        );

        post_json(
            &router,
            "/api/baseline",
            json!({ "answers": { "cells": "cells are alive" } }),
        )
        .await;

        let (status, body) = post_json(&router, "/api/quiz", json!({ "answer": "x" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "unknown topic: ");
    }

    #[tokio::test]
    async fn study_plan_and_predictor_require_topics() {
        let router = test_router().await;

        let (status, _) = get_json(&router, "/api/study-plan").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get_json(&router, "/api/exam-predictor").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        post_json(
            &router,
            "/api/baseline",
            json!({ "answers": { "cells": "cells are alive", "ratio": "no" } }),
        )
        .await;

        let (status, body) = get_json(&router, "/api/study-plan").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["topic"], "ratio");
        assert_eq!(body["data"][0]["priority"], "High");

        let (status, body) = get_json(&router, "/api/exam-predictor").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0], "ratio");
    }

    #[tokio::test]
    async fn explain_requires_a_topic() {
        let router = test_router().await;

        let (status, body) = post_json(&router, "/api/explain", json!({ "topic": " " })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "topic cannot be empty");

        let (status, body) =
            post_json(&router, "/api/explain", json!({ "topic": "cells" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["explanation"], "Cells are the basic units of life.");
        assert_eq!(body["online"], false);
    }

    #[tokio::test]
    async fn reflection_validates_and_confirms() {
        let router = test_router().await;

        let (status, _) = post_json(&router, "/api/reflection", json!({ "entry": "" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) =
            post_json(&router, "/api/reflection", json!({ "entry": "hard day" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Reflection saved!");
    }

    #[tokio::test]
    async fn topics_lists_the_full_catalog() {
        let router = test_router().await;
        let (status, body) = get_json(&router, "/api/topics").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["topics"]["math"][0], "linear equations");
        assert_eq!(body["topics"].as_object().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn reset_clears_state() {
        let router = test_router().await;
        post_json(
            &router,
            "/api/baseline",
            json!({ "answers": { "cells": "cells are alive" } }),
        )
        .await;

        let (status, body) = post_json(&router, "/api/reset", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Data reset successfully");

        let (_, body) = get_json(&router, "/api/student-info").await;
        assert_eq!(body["data"]["baseline_done"], false);
    }

    #[tokio::test]
    async fn unknown_routes_return_the_error_envelope() {
        let router = test_router().await;
        let (status, body) = get_json(&router, "/api/missing").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Page not found");
    }
}
