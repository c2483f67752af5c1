use std::collections::HashMap;

use sqlx::SqlitePool;

use crate::{
    error::{AppError, AppResult},
    fetcher::{self, FeedClient},
    model::{SubscriptionAddPayload, SubscriptionOut, SubscriptionUpdatePayload},
    repo::{
        self,
        subscriptions::{SubscriptionRow, SubscriptionUpsertRecord},
    },
    service::items::MAX_ITEMS_PER_PAGE,
    util::guid,
};

/// All subscriptions keyed by url hash, with read/unread counts folded in.
pub async fn list(pool: &SqlitePool) -> AppResult<HashMap<String, SubscriptionOut>> {
    let rows = repo::subscriptions::list_subscriptions(pool).await?;
    let counts = repo::items::count_by_read_state(pool).await?;

    let mut read_counts: HashMap<i64, (i64, i64)> = HashMap::new();
    for row in counts {
        let entry = read_counts.entry(row.subscription).or_default();
        if row.read {
            entry.1 = row.count;
        } else {
            entry.0 = row.count;
        }
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let (unread, read) = read_counts.get(&row.id).copied().unwrap_or((0, 0));
            let out = summarize(row, unread, read);
            (out.url_hash.clone(), out)
        })
        .collect())
}

pub async fn add(
    pool: &SqlitePool,
    client: &FeedClient,
    payload: SubscriptionAddPayload,
) -> AppResult<SubscriptionOut> {
    let SubscriptionAddPayload { url, category } = payload;

    if url.trim().is_empty() {
        return Err(AppError::BadRequest("url is required".into()));
    }

    let feed = client.fetch_feed(&url).await.map_err(|err| {
        tracing::warn!(url = %url, error = ?err, "failed to load feed for new subscription");
        AppError::Upstream("unable to load feed".into())
    })?;

    let category = category
        .filter(|category| !category.trim().is_empty())
        .unwrap_or_else(|| "Misc".to_string());

    let row = repo::subscriptions::upsert_subscription(
        pool,
        SubscriptionUpsertRecord {
            title: feed.title.clone(),
            link: feed.link.clone(),
            url,
            category,
        },
    )
    .await?;

    let inserted = fetcher::ingest_items(pool, &row, &feed).await?;

    tracing::info!(
        subscription = row.id,
        url = %row.url,
        inserted,
        "subscription saved"
    );

    Ok(summarize(row, inserted as i64, 0))
}

pub async fn update_category(
    pool: &SqlitePool,
    url_hash: &str,
    payload: SubscriptionUpdatePayload,
) -> AppResult<()> {
    let category = payload
        .category
        .filter(|category| !category.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("missing category".into()))?;

    let sub = find_by_hash(pool, url_hash).await?;
    repo::subscriptions::update_category(pool, sub.id, &category).await?;

    tracing::info!(subscription = sub.id, category = %category, "subscription category updated");
    Ok(())
}

pub async fn remove(pool: &SqlitePool, url_hash: &str) -> AppResult<()> {
    let sub = find_by_hash(pool, url_hash).await?;
    let affected = repo::subscriptions::delete_subscription(pool, sub.id).await?;
    if affected == 0 {
        return Err(AppError::NotFound("unknown subscription".into()));
    }
    tracing::info!(subscription = sub.id, url = %sub.url, "subscription deleted");
    Ok(())
}

pub async fn refresh(pool: &SqlitePool, client: &FeedClient, url_hash: &str) -> AppResult<()> {
    let sub = find_by_hash(pool, url_hash).await?;
    fetcher::refresh_subscription(pool, client, &sub)
        .await
        .map_err(|err| {
            tracing::warn!(url = %sub.url, error = ?err, "manual refresh failed");
            AppError::Upstream("unable to load feed".into())
        })?;
    Ok(())
}

pub async fn find_by_hash(pool: &SqlitePool, url_hash: &str) -> AppResult<SubscriptionRow> {
    let rows = repo::subscriptions::list_subscriptions(pool).await?;
    rows.into_iter()
        .find(|row| guid::url_hash(&row.url) == url_hash)
        .ok_or_else(|| AppError::NotFound("unknown subscription".into()))
}

fn summarize(row: SubscriptionRow, unread: i64, read: i64) -> SubscriptionOut {
    SubscriptionOut {
        url_hash: guid::url_hash(&row.url),
        title: row.title,
        link: row.link,
        url: row.url,
        category: row.category,
        unread,
        read,
        unread_pages: unread / MAX_ITEMS_PER_PAGE,
        read_pages: read / MAX_ITEMS_PER_PAGE,
    }
}
