use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct SubscriptionOut {
    pub url_hash: String,
    pub title: String,
    pub link: String,
    pub url: String,
    pub category: String,
    pub unread: i64,
    pub read: i64,
    pub unread_pages: i64,
    pub read_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct ItemOut {
    pub guid: String,
    pub title: String,
    pub link: String,
    pub description: String,
    pub pubdate: i64,
    pub read: bool,
}

#[derive(Debug, Serialize)]
pub struct ItemPage {
    pub page: u32,
    pub page_size: u32,
    pub items: Vec<ItemOut>,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionAddPayload {
    pub url: String,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionUpdatePayload {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ItemReadFlag {
    pub read: bool,
}

/// Bulk read-flag update, keyed by the item guid in hex.
pub type ItemsUpdatePayload = HashMap<String, ItemReadFlag>;

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: u64,
}

#[derive(Debug, Deserialize)]
pub struct LogoutPayload {
    pub token: String,
}
