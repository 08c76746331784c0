use crate::data::{
    CheckRequest, CheckResponse, GenerateRequest, GenerateResponse, SaveRequest, SaveResponse,
    ScheduleResponse, UpdateAssignmentRequest,
};
use crate::service::{self, EngineError};
use crate::store::InMemoryStore;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;

fn status_of(err: &EngineError) -> StatusCode {
    match err {
        EngineError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::Conflict(_) => StatusCode::BAD_REQUEST,
        EngineError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(err: EngineError) -> (StatusCode, String) {
    (status_of(&err), err.to_string())
}

async fn generate_handler(
    State(store): State<Arc<InMemoryStore>>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, (StatusCode, String)> {
    service::generate(store.as_ref(), request)
        .await
        .map(Json)
        .map_err(reject)
}

async fn check_handler(
    State(store): State<Arc<InMemoryStore>>,
    Json(request): Json<CheckRequest>,
) -> Result<Json<CheckResponse>, (StatusCode, String)> {
    service::check_schedule(store.as_ref(), &request.rows)
        .await
        .map(Json)
        .map_err(reject)
}

async fn save_handler(
    State(store): State<Arc<InMemoryStore>>,
    Json(request): Json<SaveRequest>,
) -> Result<Json<SaveResponse>, (StatusCode, String)> {
    service::save_schedule(store.as_ref(), &request.rows)
        .await
        .map(Json)
        .map_err(reject)
}

async fn update_assignment_handler(
    State(store): State<Arc<InMemoryStore>>,
    Json(request): Json<UpdateAssignmentRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    service::update_assignment(store.as_ref(), request)
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(reject)
}

async fn current_handler(
    State(store): State<Arc<InMemoryStore>>,
) -> Result<Json<ScheduleResponse>, (StatusCode, String)> {
    service::current_schedule(store.as_ref())
        .await
        .map(Json)
        .map_err(reject)
}

pub fn router(store: Arc<InMemoryStore>) -> Router {
    Router::new()
        .route("/v1/schedule/generate", post(generate_handler))
        .route("/v1/schedule/check", post(check_handler))
        .route("/v1/schedule/save", post(save_handler))
        .route("/v1/schedule/assignment", post(update_assignment_handler))
        .route("/v1/schedule/current", get(current_handler))
        .with_state(store)
}

pub async fn run_server(store: Arc<InMemoryStore>) {
    let app = router(store);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:8080")
        .await
        .unwrap();

    println!("Server running at http://{}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
