use axum::{extract::State, Json};

use crate::{
    app::AppState,
    auth,
    error::AppResult,
    model::{LoginPayload, LoginResponse, LogoutPayload},
};

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> AppResult<Json<LoginResponse>> {
    if !state.sessions.verify_password(&payload.password) {
        return Err(auth::invalid_credentials_error());
    }

    let token = state.sessions.issue_session().await;

    Ok(Json(LoginResponse {
        token,
        expires_in: state.sessions.ttl_secs(),
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<LogoutPayload>,
) -> AppResult<Json<serde_json::Value>> {
    state.sessions.revoke_session(&payload.token).await;
    Ok(Json(serde_json::json!({ "ok": true })))
}
