use sqlx::SqlitePool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ItemRow {
    pub guid: Vec<u8>,
    pub title: String,
    pub link: String,
    pub description: String,
    pub pubdate: i64,
    pub read: bool,
    pub subscription: i64,
}

#[derive(Debug, Clone)]
pub struct NewItem {
    pub guid: Vec<u8>,
    pub title: String,
    pub link: String,
    pub description: String,
    pub pubdate: i64,
    pub subscription: i64,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ReadCountRow {
    pub subscription: i64,
    pub read: bool,
    pub count: i64,
}

/// Insert items, silently skipping guids already present. Returns the
/// number actually inserted.
pub async fn insert_items(pool: &SqlitePool, items: Vec<NewItem>) -> Result<u64, sqlx::Error> {
    if items.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    let mut inserted = 0;
    for item in &items {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO items (guid, title, link, description, pubdate, read, subscription)
            VALUES (?, ?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(&item.guid)
        .bind(&item.title)
        .bind(&item.link)
        .bind(&item.description)
        .bind(item.pubdate)
        .bind(item.subscription)
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected();
    }
    tx.commit().await?;

    Ok(inserted)
}

pub async fn list_page(
    pool: &SqlitePool,
    subscription: i64,
    read: bool,
    limit: i64,
    offset: i64,
) -> Result<Vec<ItemRow>, sqlx::Error> {
    sqlx::query_as::<_, ItemRow>(
        r#"
        SELECT guid, title, link, description, pubdate, read, subscription
        FROM items
        WHERE subscription = ? AND read = ?
        ORDER BY pubdate ASC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(subscription)
    .bind(read)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_by_read_state(pool: &SqlitePool) -> Result<Vec<ReadCountRow>, sqlx::Error> {
    sqlx::query_as::<_, ReadCountRow>(
        r#"
        SELECT subscription, read, COUNT(*) AS count
        FROM items
        GROUP BY subscription, read
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn set_read_flags(
    pool: &SqlitePool,
    flags: Vec<(Vec<u8>, bool)>,
) -> Result<(), sqlx::Error> {
    if flags.is_empty() {
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    for (guid, read) in &flags {
        sqlx::query("UPDATE items SET read = ? WHERE guid = ?")
            .bind(read)
            .bind(guid)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    Ok(())
}
