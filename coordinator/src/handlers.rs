use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use common::{JobStatusResponse, TaskAssignmentResponse, TaskReportRequest, TaskReportResponse};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::registry::ReportOutcome;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/tasks/request", post(request_task))
        .route("/api/v1/tasks/report", post(report_task))
        .route("/api/v1/job", get(job_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/* ---------------- handlers HTTP ---------------- */

async fn health() -> &'static str {
    "ok"
}

// Un worker pide la próxima tarea (map, reduce o ninguna)
async fn request_task(
    State(state): State<AppState>,
) -> Result<Json<TaskAssignmentResponse>, StatusCode> {
    let mut registry = state.lock().map_err(|_| {
        warn!("lock del registro envenenado en request_task");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(registry.request_task()))
}

// Un worker reporta que terminó una tarea
async fn report_task(
    State(state): State<AppState>,
    Json(req): Json<TaskReportRequest>,
) -> Result<Json<TaskReportResponse>, StatusCode> {
    let mut registry = state.lock().map_err(|_| {
        warn!("lock del registro envenenado en report_task");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    match registry.report_task(&req) {
        Ok(outcome) => Ok(Json(TaskReportResponse {
            ok: true,
            accepted: outcome == ReportOutcome::Accepted,
        })),
        Err(e) => {
            warn!("{}", e);
            Err(StatusCode::BAD_REQUEST)
        }
    }
}

// Estado del job para operadores
async fn job_status(State(state): State<AppState>) -> Result<Json<JobStatusResponse>, StatusCode> {
    let registry = state
        .lock()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(registry.status()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::Request,
    };
    use common::TaskKind;
    use serde::de::DeserializeOwned;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app(files: &[&str], n_reduce: u32) -> (AppState, Router) {
        let files = files.iter().map(|f| f.to_string()).collect();
        let state = AppState::new(files, n_reduce, Duration::from_secs(10));
        (state.clone(), build_router(state))
    }

    async fn send<T: DeserializeOwned>(router: &Router, req: Request<Body>) -> (StatusCode, Option<T>) {
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).ok())
    }

    fn post_empty(uri: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn post_json<T: serde::Serialize>(uri: &str, body: &T) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_responde_ok() {
        let (_, router) = app(&[], 1);
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn request_y_report_por_http() {
        let (state, router) = app(&["a.txt"], 2);

        let (status, resp) =
            send::<TaskAssignmentResponse>(&router, post_empty("/api/v1/tasks/request")).await;
        assert_eq!(status, StatusCode::OK);
        let resp = resp.unwrap();
        assert_eq!(resp.kind, TaskKind::Map);
        assert_eq!(resp.input_file.as_deref(), Some("a.txt"));
        assert_eq!(resp.n_reduce, 2);

        let report = TaskReportRequest::map(
            "a.txt",
            resp.assignment,
            vec!["mr-1-0".into(), "mr-1-1".into()],
        );
        let (status, ack) =
            send::<TaskReportResponse>(&router, post_json("/api/v1/tasks/report", &report)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack, Some(TaskReportResponse { ok: true, accepted: true }));

        // duplicado: se reconoce pero no se acepta
        let (status, ack) =
            send::<TaskReportResponse>(&router, post_json("/api/v1/tasks/report", &report)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack, Some(TaskReportResponse { ok: true, accepted: false }));

        assert_eq!(state.lock().unwrap().intermediates_for(1), &["mr-1-1".to_string()]);
    }

    #[tokio::test]
    async fn report_sin_tipo_es_bad_request() {
        let (_, router) = app(&["a.txt"], 1);
        let mut report = TaskReportRequest::reduce(0, 1);
        report.kind = TaskKind::None;

        let (status, _) =
            send::<TaskReportResponse>(&router, post_json("/api/v1/tasks/report", &report)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn job_status_refleja_el_registro() {
        let (_, router) = app(&["a.txt", "b.txt"], 3);
        send::<TaskAssignmentResponse>(&router, post_empty("/api/v1/tasks/request")).await;

        let req = Request::builder().uri("/api/v1/job").body(Body::empty()).unwrap();
        let (status, st) = send::<JobStatusResponse>(&router, req).await;
        assert_eq!(status, StatusCode::OK);

        let st = st.unwrap();
        assert!(!st.done);
        assert_eq!(st.total_map_tasks, 2);
        assert_eq!(st.map_in_progress, 1);
        assert_eq!(st.reduce_remaining, 3);
        assert_eq!(st.phase(), "MAP");
    }

    #[tokio::test]
    async fn sin_tareas_responde_done() {
        let (_, router) = app(&[], 0);
        let (_, resp) =
            send::<TaskAssignmentResponse>(&router, post_empty("/api/v1/tasks/request")).await;
        let resp = resp.unwrap();
        assert_eq!(resp.kind, TaskKind::None);
        assert!(resp.done);
    }
}
