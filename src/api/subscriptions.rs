use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    app::AppState,
    error::AppResult,
    model::{SubscriptionAddPayload, SubscriptionOut, SubscriptionUpdatePayload},
    service,
};

pub async fn list(
    State(state): State<AppState>,
) -> AppResult<Json<HashMap<String, SubscriptionOut>>> {
    let subscriptions = service::subscriptions::list(&state.pool).await?;
    Ok(Json(subscriptions))
}

pub async fn add(
    State(state): State<AppState>,
    Json(payload): Json<SubscriptionAddPayload>,
) -> AppResult<Json<SubscriptionOut>> {
    let subscription =
        service::subscriptions::add(&state.pool, &state.feed_client, payload).await?;
    Ok(Json(subscription))
}

pub async fn update(
    State(state): State<AppState>,
    Path(url_hash): Path<String>,
    Json(payload): Json<SubscriptionUpdatePayload>,
) -> AppResult<Json<serde_json::Value>> {
    service::subscriptions::update_category(&state.pool, &url_hash, payload).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(url_hash): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    service::subscriptions::remove(&state.pool, &url_hash).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

pub async fn refresh(
    State(state): State<AppState>,
    Path(url_hash): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    service::subscriptions::refresh(&state.pool, &state.feed_client, &url_hash).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
