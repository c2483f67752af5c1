use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    app::AppState,
    error::AppResult,
    model::{ItemPage, ItemsUpdatePayload},
    service,
};

pub async fn read_page(
    State(state): State<AppState>,
    Path((url_hash, page)): Path<(String, u32)>,
) -> AppResult<Json<ItemPage>> {
    let page = service::items::page(&state.pool, &url_hash, page, true).await?;
    Ok(Json(page))
}

pub async fn unread_page(
    State(state): State<AppState>,
    Path((url_hash, page)): Path<(String, u32)>,
) -> AppResult<Json<ItemPage>> {
    let page = service::items::page(&state.pool, &url_hash, page, false).await?;
    Ok(Json(page))
}

pub async fn update_read_flags(
    State(state): State<AppState>,
    Json(payload): Json<ItemsUpdatePayload>,
) -> AppResult<Json<serde_json::Value>> {
    service::items::update_read_flags(&state.pool, payload).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
