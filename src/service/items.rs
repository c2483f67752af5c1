use sqlx::SqlitePool;

use crate::{
    error::{AppError, AppResult},
    model::{ItemOut, ItemPage, ItemsUpdatePayload},
    repo,
    service::subscriptions,
    util::guid,
};

pub const MAX_ITEMS_PER_PAGE: i64 = 100;

pub async fn page(pool: &SqlitePool, url_hash: &str, page: u32, read: bool) -> AppResult<ItemPage> {
    let sub = subscriptions::find_by_hash(pool, url_hash).await?;
    let offset = page as i64 * MAX_ITEMS_PER_PAGE;

    let rows = repo::items::list_page(pool, sub.id, read, MAX_ITEMS_PER_PAGE, offset).await?;

    tracing::debug!(subscription = sub.id, page, read, count = rows.len(), "items page queried");

    let items = rows
        .into_iter()
        .map(|row| ItemOut {
            guid: guid::encode_hex(&row.guid),
            title: row.title,
            link: row.link,
            description: row.description,
            pubdate: row.pubdate,
            read: row.read,
        })
        .collect();

    Ok(ItemPage {
        page,
        page_size: MAX_ITEMS_PER_PAGE as u32,
        items,
    })
}

pub async fn update_read_flags(pool: &SqlitePool, payload: ItemsUpdatePayload) -> AppResult<()> {
    let flags = payload
        .into_iter()
        .map(|(hex, flag)| guid::decode_hex(&hex).map(|blob| (blob, flag.read)))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| AppError::BadRequest("invalid item guid".into()))?;

    repo::items::set_read_flags(pool, flags).await?;
    Ok(())
}
