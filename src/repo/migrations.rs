use sqlx::SqlitePool;
use tracing::info;

pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS subscriptions (
          id       INTEGER PRIMARY KEY,
          title    TEXT NOT NULL,
          link     TEXT NOT NULL,
          url      TEXT NOT NULL UNIQUE,
          category TEXT NOT NULL DEFAULT 'Misc'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS items (
          guid         BLOB PRIMARY KEY,
          title        TEXT NOT NULL,
          link         TEXT NOT NULL,
          description  TEXT NOT NULL,
          pubdate      INTEGER NOT NULL,
          read         INTEGER NOT NULL DEFAULT 0,
          subscription INTEGER NOT NULL REFERENCES subscriptions(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_items_subscription_read ON items(subscription, read)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_items_pubdate ON items(pubdate)")
        .execute(pool)
        .await?;

    info!("database schema ready");
    Ok(())
}
