//! User directory handlers and their wire types.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wicket_identity::{User, UserPatch};
use wicket_types::{Role, Timestamp};

use crate::auth::{self, CurrentActor};
use crate::{ApiError, AppState};

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub offset: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub badge: u32,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        // The credential hash never leaves the process.
        Self {
            id: user.id,
            badge: user.badge,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub offset: usize,
    pub length: usize,
    pub records: Vec<UserResponse>,
    pub total_records: usize,
}

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub badge: u32,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct PatchRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub badge: u32,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub user: Uuid,
    pub expires_at: Timestamp,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub expires_at: Timestamp,
}

// ── Handlers ─────────────────────────────────────────────────────────────

pub async fn list(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let page = state
        .directory
        .list(&actor, query.offset, query.limit)
        .await?;

    Ok(Json(ListResponse {
        offset: page.offset,
        length: page.len(),
        total_records: page.total,
        records: page.records.into_iter().map(UserResponse::from).collect(),
    }))
}

pub async fn get(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_uuid(&id)?;
    let user = state.directory.get(&actor, id).await?;
    Ok(Json(user.into()))
}

pub async fn get_by_badge(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(badge): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let badge: u32 = badge.parse().map_err(|_| ApiError::bad_badge())?;
    let user = state.directory.get_by_badge(&actor, badge).await?;
    Ok(Json(user.into()))
}

pub async fn me(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<UserResponse>, ApiError> {
    let id = actor.user_id().ok_or_else(ApiError::unauthenticated)?;
    let user = state.directory.get(&actor, id).await?;
    Ok(Json(user.into()))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(req): Json<CreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .directory
        .create(
            &actor,
            req.badge,
            &req.name,
            &req.email,
            &req.password,
            req.role,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn patch(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Json(req): Json<PatchRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_uuid(&id)?;
    let patch = UserPatch {
        name: req.name,
        email: req.email,
        password: req.password,
        role: req.role,
    };
    let user = state.directory.patch(&actor, id, patch).await?;
    Ok(Json(user.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_uuid(&id)?;
    state.directory.delete(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Login: check the credential, start a session, hand the client its
/// session cookie.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (user, session) = state.directory.authenticate(req.badge, &req.password).await?;

    let cookie = auth::session_cookie(&session);
    let body = SessionResponse {
        id: session.id,
        user: user.id,
        expires_at: session.expires_at,
    };
    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(body),
    ))
}

/// Renew the caller's session for a fresh lifetime.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let id = auth::session_id(&headers).ok_or_else(ApiError::unauthenticated)?;
    let expires_at = state.directory.refresh(id).await?;

    let cookie = auth::refreshed_cookie(id, expires_at);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(RefreshResponse { expires_at }),
    ))
}

/// End the caller's session and drop the cookie. Logging out without a
/// live session is fine.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(id) = auth::session_id(&headers) {
        state.directory.logout(id).await;
    }
    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, auth::clear_session_cookie())],
    ))
}

pub(crate) fn parse_uuid(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_uuid())
}
