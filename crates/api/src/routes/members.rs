//! Member registration and profile endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::Role;
use domain::Member;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::Auth;
use crate::error::ApiError;

use super::CommonResponse;

#[derive(Deserialize)]
pub struct MemberCreateRequest {
    pub email: String,
    pub name: String,
    /// Optional role name; defaults to USER.
    pub role: Option<String>,
}

#[derive(Serialize)]
pub struct MemberResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
}

impl From<Member> for MemberResponse {
    fn from(member: Member) -> Self {
        Self {
            id: member.id.to_string(),
            email: member.email,
            name: member.name,
            role: member.role.to_string(),
        }
    }
}

/// POST /member/create — register a new member.
#[tracing::instrument(skip(state, req), fields(email = %req.email))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MemberCreateRequest>,
) -> Result<(StatusCode, Json<CommonResponse<String>>), ApiError> {
    if req.email.trim().is_empty() || !req.email.contains('@') {
        return Err(ApiError::BadRequest(format!(
            "invalid email: {}",
            req.email
        )));
    }

    let role = match req.role.as_deref() {
        Some(raw) => {
            Role::parse(raw).ok_or_else(|| ApiError::BadRequest(format!("unknown role: {raw}")))?
        }
        None => Role::User,
    };

    let member = Member::with_role(req.email, req.name, role);
    let member_id = member.id;
    state.members.insert(member).await?;

    Ok((
        StatusCode::CREATED,
        Json(CommonResponse::new(
            member_id.to_string(),
            StatusCode::CREATED,
            "member registered",
        )),
    ))
}

/// GET /member/list — list all members (admin only).
#[tracing::instrument(skip(state, auth))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    auth: Auth,
) -> Result<Json<CommonResponse<Vec<MemberResponse>>>, ApiError> {
    auth.require(Role::Admin)?;

    let members = state.members.list().await?;
    let responses: Vec<MemberResponse> = members.into_iter().map(MemberResponse::from).collect();

    Ok(Json(CommonResponse::new(
        responses,
        StatusCode::OK,
        "member list",
    )))
}

/// GET /member/myinfo — the authenticated member's profile.
#[tracing::instrument(skip(state, auth))]
pub async fn myinfo(
    State(state): State<Arc<AppState>>,
    auth: Auth,
) -> Result<Json<CommonResponse<MemberResponse>>, ApiError> {
    let member = state
        .members
        .find_by_id(auth.0.member_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("member {} not found", auth.0.member_id)))?;

    Ok(Json(CommonResponse::new(
        member.into(),
        StatusCode::OK,
        "member info",
    )))
}

/// DELETE /member/delete — soft-delete the authenticated member.
#[tracing::instrument(skip(state, auth))]
pub async fn soft_delete(
    State(state): State<Arc<AppState>>,
    auth: Auth,
) -> Result<Json<CommonResponse<&'static str>>, ApiError> {
    state.members.soft_delete(auth.0.member_id).await?;

    Ok(Json(CommonResponse::new(
        "OK",
        StatusCode::OK,
        "member deleted",
    )))
}
