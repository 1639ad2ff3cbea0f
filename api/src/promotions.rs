//! Promotion pass handlers and their wire types.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wicket_promotions::Promotion;
use wicket_types::Timestamp;

use crate::auth::CurrentActor;
use crate::users::{parse_uuid, ListQuery, UserResponse};
use crate::{ApiError, AppState};

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PromotionResponse {
    pub id: Uuid,
    pub user: Uuid,
    pub expires_at: Timestamp,
}

impl From<Promotion> for PromotionResponse {
    fn from(pass: Promotion) -> Self {
        Self {
            id: pass.id,
            user: pass.user,
            expires_at: pass.expires_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PromotionListResponse {
    pub offset: usize,
    pub length: usize,
    pub records: Vec<PromotionResponse>,
    pub total_records: usize,
}

#[derive(Debug, Deserialize)]
pub struct GrantRequest {
    pub user: Uuid,
}

// ── Handlers ─────────────────────────────────────────────────────────────

pub async fn list(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<ListQuery>,
) -> Result<Json<PromotionListResponse>, ApiError> {
    let page = state
        .directory
        .list_promotions(&actor, query.offset, query.limit)
        .await?;

    Ok(Json(PromotionListResponse {
        offset: page.offset,
        length: page.len(),
        total_records: page.total,
        records: page
            .records
            .into_iter()
            .map(PromotionResponse::from)
            .collect(),
    }))
}

pub async fn grant(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(req): Json<GrantRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let pass = state.directory.grant_promotion(&actor, req.user).await?;
    Ok((StatusCode::CREATED, Json(PromotionResponse::from(pass))))
}

pub async fn get(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> Result<Json<PromotionResponse>, ApiError> {
    let id = parse_uuid(&id)?;
    let pass = state.directory.get_promotion(&actor, id).await?;
    Ok(Json(pass.into()))
}

pub async fn revoke(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_uuid(&id)?;
    state.directory.revoke_promotion(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Redeem a pass for its one-rank promotion; returns the promoted user.
pub async fn redeem(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_uuid(&id)?;
    let user = state.directory.redeem_promotion(&actor, id).await?;
    Ok(Json(user.into()))
}
