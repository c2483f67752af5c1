use sqlx::SqlitePool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubscriptionRow {
    pub id: i64,
    pub title: String,
    pub link: String,
    pub url: String,
    pub category: String,
}

pub struct SubscriptionUpsertRecord {
    pub title: String,
    pub link: String,
    pub url: String,
    pub category: String,
}

pub async fn list_subscriptions(pool: &SqlitePool) -> Result<Vec<SubscriptionRow>, sqlx::Error> {
    sqlx::query_as::<_, SubscriptionRow>(
        r#"
        SELECT id, title, link, url, category
        FROM subscriptions
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn upsert_subscription(
    pool: &SqlitePool,
    record: SubscriptionUpsertRecord,
) -> Result<SubscriptionRow, sqlx::Error> {
    sqlx::query_as::<_, SubscriptionRow>(
        r#"
        INSERT INTO subscriptions (title, link, url, category)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(url) DO UPDATE SET
            title = excluded.title,
            link = excluded.link,
            category = excluded.category
        RETURNING id, title, link, url, category
        "#,
    )
    .bind(record.title)
    .bind(record.link)
    .bind(record.url)
    .bind(record.category)
    .fetch_one(pool)
    .await
}

pub async fn update_category(
    pool: &SqlitePool,
    id: i64,
    category: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE subscriptions SET category = ? WHERE id = ?")
        .bind(category)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Items cascade via the foreign key.
pub async fn delete_subscription(pool: &SqlitePool, id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM subscriptions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
