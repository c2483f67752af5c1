//! Storage and ingestion round trips against per-test in-memory SQLite
//! databases, plus the identity/date helpers the pipeline leans on.

use std::str::FromStr;

use feedreader::{
    feed::extract::{self, FeedTimestamp},
    fetcher,
    repo::{
        self, items,
        subscriptions::{self, SubscriptionUpsertRecord},
    },
    util::{guid, pubdate},
};
use pretty_assertions::assert_eq;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

async fn test_db() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    repo::migrations::ensure_schema(&pool).await.unwrap();
    pool
}

async fn test_subscription(pool: &SqlitePool, url: &str) -> subscriptions::SubscriptionRow {
    subscriptions::upsert_subscription(
        pool,
        SubscriptionUpsertRecord {
            title: "Example Feed".to_string(),
            link: "https://example.com/".to_string(),
            url: url.to_string(),
            category: "Misc".to_string(),
        },
    )
    .await
    .unwrap()
}

const SAMPLE_FEED: &str = r#"<rss version="2.0"><channel>
<title>Example Feed</title>
<link>https://example.com/</link>
<item>
  <title>First &lt;script&gt;alert(1)&lt;/script&gt;Post</title>
  <link>https://example.com/posts/1</link>
  <description>&lt;img src="/a.png"&gt; body</description>
  <guid>post-1</guid>
  <pubDate>Mon, 01 Jan 2024 00:00:00 +0000</pubDate>
</item>
<item>
  <title>Second Post</title>
  <link>https://example.com/posts/2</link>
  <description>plain</description>
  <guid>post-2</guid>
  <pubDate>Tue, 02 Jan 2024 00:00:00 +0000</pubDate>
</item>
</channel></rss>"#;

// ============================================================================
// Subscriptions
// ============================================================================

#[tokio::test]
async fn upsert_subscription_is_idempotent_on_url() {
    let pool = test_db().await;

    let first = test_subscription(&pool, "https://example.com/feed.xml").await;
    let second = subscriptions::upsert_subscription(
        &pool,
        SubscriptionUpsertRecord {
            title: "Renamed".to_string(),
            link: "https://example.com/".to_string(),
            url: "https://example.com/feed.xml".to_string(),
            category: "Tech".to_string(),
        },
    )
    .await
    .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.title, "Renamed");
    assert_eq!(second.category, "Tech");

    let all = subscriptions::list_subscriptions(&pool).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn deleting_a_subscription_cascades_to_items() {
    let pool = test_db().await;
    let sub = test_subscription(&pool, "https://example.com/feed.xml").await;

    let feed = extract::parse(SAMPLE_FEED);
    fetcher::ingest_items(&pool, &sub, &feed).await.unwrap();

    let affected = subscriptions::delete_subscription(&pool, sub.id)
        .await
        .unwrap();
    assert_eq!(affected, 1);

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

// ============================================================================
// Ingestion
// ============================================================================

#[tokio::test]
async fn ingest_sanitizes_and_stores_items() {
    let pool = test_db().await;
    let sub = test_subscription(&pool, "https://example.com/feed.xml").await;

    let feed = extract::parse(SAMPLE_FEED);
    let inserted = fetcher::ingest_items(&pool, &sub, &feed).await.unwrap();
    assert_eq!(inserted, 2);

    let rows = items::list_page(&pool, sub.id, false, 100, 0).await.unwrap();
    assert_eq!(rows.len(), 2);

    // ascending pubdate, titles sanitized, relative description links resolved
    assert_eq!(rows[0].title, "First Post");
    assert_eq!(
        rows[0].description,
        "<img src=\"https://example.com/a.png\"> body</img>"
    );
    assert_eq!(rows[0].pubdate, 1_704_067_200);
    assert_eq!(rows[1].title, "Second Post");
    assert_eq!(rows[1].pubdate, 1_704_153_600);
}

#[tokio::test]
async fn reingesting_the_same_feed_inserts_nothing() {
    let pool = test_db().await;
    let sub = test_subscription(&pool, "https://example.com/feed.xml").await;

    let feed = extract::parse(SAMPLE_FEED);
    assert_eq!(fetcher::ingest_items(&pool, &sub, &feed).await.unwrap(), 2);
    assert_eq!(fetcher::ingest_items(&pool, &sub, &feed).await.unwrap(), 0);

    let rows = items::list_page(&pool, sub.id, false, 100, 0).await.unwrap();
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn read_flags_move_items_between_pages() {
    let pool = test_db().await;
    let sub = test_subscription(&pool, "https://example.com/feed.xml").await;

    let feed = extract::parse(SAMPLE_FEED);
    fetcher::ingest_items(&pool, &sub, &feed).await.unwrap();

    let unread = items::list_page(&pool, sub.id, false, 100, 0).await.unwrap();
    items::set_read_flags(&pool, vec![(unread[0].guid.clone(), true)])
        .await
        .unwrap();

    let unread = items::list_page(&pool, sub.id, false, 100, 0).await.unwrap();
    let read = items::list_page(&pool, sub.id, true, 100, 0).await.unwrap();
    assert_eq!(unread.len(), 1);
    assert_eq!(read.len(), 1);
    assert_eq!(read[0].title, "First Post");

    let counts = items::count_by_read_state(&pool).await.unwrap();
    assert_eq!(counts.len(), 2);
    for row in counts {
        assert_eq!(row.subscription, sub.id);
        assert_eq!(row.count, 1);
    }
}

// ============================================================================
// Identity helpers
// ============================================================================

#[test]
fn item_guids_are_stable_and_scoped_to_the_subscription() {
    let a = guid::item_guid("https://one.example/feed", "post-1");
    let b = guid::item_guid("https://one.example/feed", "post-1");
    let c = guid::item_guid("https://two.example/feed", "post-1");

    assert_eq!(a.len(), 16);
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn hex_roundtrip() {
    let blob = guid::item_guid("https://one.example/feed", "post-1");
    let hex = guid::encode_hex(&blob);
    assert_eq!(hex.len(), 32);
    assert_eq!(guid::decode_hex(&hex).unwrap(), blob);
}

#[test]
fn decode_hex_rejects_malformed_input() {
    assert_eq!(guid::decode_hex(""), None);
    assert_eq!(guid::decode_hex("abc"), None);
    assert_eq!(guid::decode_hex("zz"), None);
}

#[test]
fn url_hash_is_hex_of_fixed_width() {
    let hash = guid::url_hash("https://example.com/feed.xml");
    assert_eq!(hash.len(), 32);
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
}

// ============================================================================
// Date resolution
// ============================================================================

#[test]
fn rfc2822_pubdates_resolve() {
    let ts = FeedTimestamp::PubDate("Mon, 01 Jan 2024 00:00:00 +0000".to_string());
    assert_eq!(pubdate::resolve_timestamp(Some(&ts)), 1_704_067_200);
}

#[test]
fn asctime_pubdates_resolve_via_http_date() {
    let ts = FeedTimestamp::PubDate("Sun Nov  6 08:49:37 1994".to_string());
    assert_eq!(pubdate::resolve_timestamp(Some(&ts)), 784_111_777);
}

#[test]
fn rfc3339_updated_resolves() {
    let ts = FeedTimestamp::Updated("2024-01-01T00:00:00Z".to_string());
    assert_eq!(pubdate::resolve_timestamp(Some(&ts)), 1_704_067_200);
}

#[test]
fn unparseable_dates_fall_back_to_now() {
    let before = chrono::Utc::now().timestamp();
    let ts = FeedTimestamp::PubDate("not a date".to_string());
    let resolved = pubdate::resolve_timestamp(Some(&ts));
    let after = chrono::Utc::now().timestamp();
    assert!(resolved >= before && resolved <= after);

    let resolved = pubdate::resolve_timestamp(None);
    assert!(resolved >= before);
}
