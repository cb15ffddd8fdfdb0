// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::sync::Arc;

use axum::extract::{Path, Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::{from_fn_with_state, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tower_http::cors::{AllowOrigin, CorsLayer};

use taskanchor_core::session::SessionSnapshot;
use taskanchor_core::task::TaskId;

use crate::api::*;
use crate::auth::{AuthError, AuthKeys, AuthUser, TOKEN_COOKIE};
use crate::engine::Engine;
use crate::errors::ApiError;
use crate::session::SessionEvent;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub auth: Arc<AuthKeys>,
}

pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    let protected = Router::new()
        .route("/user/verify", get(verify))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/:id", get(get_task).put(update_task).delete(delete_task))
        .route("/tasks/:id/complete", post(complete_task))
        .route("/tasks/:id/complete/persist", post(resume_persist))
        .route("/session", get(session_snapshot))
        .route("/session/events", post(session_event))
        .route("/advisor/priorities", post(advisor_priorities))
        .route("/advisor/reminders", post(advisor_reminders))
        .layer(from_fn_with_state(state.clone(), require_auth));

    let app = Router::new()
        .route("/user/signup", post(signup))
        .route("/user/signin", post(signin))
        .route("/user/signout", get(signout))
        .route("/metrics", get(metrics_handler))
        .merge(protected)
        .with_state(state);

    match cors_layer(cors_origins) {
        Some(cors) => app.layer(cors),
        None => app,
    }
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    if origins.is_empty() {
        return None;
    }
    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([CONTENT_TYPE, AUTHORIZATION])
            .allow_credentials(true),
    )
}

async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = jar
        .get(TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| {
            req.headers()
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::to_string)
        })
        .ok_or(ApiError::Auth(AuthError::MissingToken))?;

    let user = state.auth.verify(&token).map_err(ApiError::Auth)?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

// ---- users ----

async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = state.engine.signup(&req.full_name, &req.email, &req.password).await?;
    tracing::info!(email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(UserResponse { id: user.id.to_string(), full_name: user.full_name, email: user.email }),
    ))
}

async fn signin(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<SigninRequest>,
) -> Result<(CookieJar, Json<serde_json::Value>), ApiError> {
    let user = state.engine.signin(&req.email, &req.password).await?;
    let token = state.auth.mint(&user).map_err(ApiError::Auth)?;
    let cookie = Cookie::build((TOKEN_COOKIE, token)).path("/").build();
    Ok((jar.add(cookie), Json(serde_json::json!({ "message": "logged in successfully" }))))
}

async fn signout(jar: CookieJar) -> (CookieJar, Json<serde_json::Value>) {
    let mut cookie = Cookie::from(TOKEN_COOKIE);
    cookie.set_path("/");
    (jar.remove(cookie), Json(serde_json::json!({ "message": "signed out" })))
}

async fn verify(Extension(user): Extension<AuthUser>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "token is verified",
        "user": {
            "id": user.id.to_string(),
            "email": user.email,
            "full_name": user.full_name,
        }
    }))
}

// ---- tasks ----

async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    let task = state.engine.create_task(&user, req).await?;
    Ok((StatusCode::CREATED, Json(task.into())))
}

async fn list_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    let tasks = state.engine.list_tasks(&user).await?;
    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

async fn get_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<TaskId>,
) -> Result<Json<TaskResponse>, ApiError> {
    Ok(Json(state.engine.get_task(&user, id).await?.into()))
}

async fn update_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<TaskId>,
    Json(patch): Json<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, ApiError> {
    Ok(Json(state.engine.update_task(&user, id, patch).await?.into()))
}

async fn delete_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<TaskId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.engine.delete_task(&user, id).await?;
    Ok(Json(serde_json::json!({ "message": "Task deleted successfully" })))
}

// ---- completion anchoring ----

async fn complete_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<TaskId>,
) -> Result<Json<CompleteTaskResponse>, ApiError> {
    let outcome = state.engine.complete_task(&user, id).await?;
    Ok(Json(CompleteTaskResponse {
        task: outcome.task.into(),
        fingerprint: outcome.fingerprint,
        receipt: outcome.receipt,
    }))
}

async fn resume_persist(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<TaskId>,
    Json(req): Json<ResumePersistRequest>,
) -> Result<Json<CompleteTaskResponse>, ApiError> {
    let outcome = state.engine.resume_persist(&user, id, req.fingerprint, req.receipt).await?;
    Ok(Json(CompleteTaskResponse {
        task: outcome.task.into(),
        fingerprint: outcome.fingerprint,
        receipt: outcome.receipt,
    }))
}

// ---- signing session ----

async fn session_snapshot(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.engine.session_snapshot())
}

async fn session_event(
    State(state): State<AppState>,
    Json(event): Json<SessionEvent>,
) -> Json<SessionSnapshot> {
    Json(state.engine.apply_session_event(event))
}

// ---- advisor ----

async fn advisor_priorities(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<AnalyzePrioritiesRequest>,
) -> Result<Json<crate::advisor::AdvisorReport>, ApiError> {
    Ok(Json(state.engine.analyze_priorities(&user, &req.preferences).await?))
}

async fn advisor_reminders(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<SuggestRemindersRequest>,
) -> Result<Json<crate::advisor::AdvisorReport>, ApiError> {
    Ok(Json(state.engine.suggest_reminders(&user, req.task_id, &req.preferences).await?))
}

async fn metrics_handler() -> String {
    crate::telemetry::get_metrics()
}
