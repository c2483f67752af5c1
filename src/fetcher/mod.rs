use std::{collections::HashMap, sync::Arc, time::Duration};

use anyhow::anyhow;
use reqwest::Client;
use sqlx::SqlitePool;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{
    config::FetcherConfig,
    feed::{
        extract::{self, ParsedFeed},
        sanitize,
    },
    repo::{
        items::{self, NewItem},
        subscriptions::{self, SubscriptionRow},
    },
    util::{decode::decode_body, guid, pubdate},
};

/// A feed that fails this many rounds in a row gets a prominent log line;
/// transient failures stay at debug.
const FAILED_UPDATES_TO_LOG_AT: u32 = 3;

/// Shared feed-fetching client: the background worker and the subscription
/// API both go through it.
pub struct FeedClient {
    client: Client,
}

impl FeedClient {
    pub fn new(config: &FetcherConfig) -> anyhow::Result<Self> {
        let timeout_secs = if config.request_timeout_secs == 0 {
            10
        } else {
            config.request_timeout_secs
        };

        let client = Client::builder()
            .user_agent("feedreader/0.1")
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self { client })
    }

    /// Fetch and extract a feed. Transport and HTTP failures surface as
    /// errors; malformed feed text does not (extraction is total).
    pub async fn fetch_feed(&self, url: &str) -> anyhow::Result<ParsedFeed> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("unexpected status {status} fetching {url}"));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let bytes = response.bytes().await?;
        let text = decode_body(&bytes, content_type.as_deref());

        Ok(extract::parse(&text))
    }
}

pub fn spawn(pool: SqlitePool, config: FetcherConfig, client: Arc<FeedClient>) {
    let fetcher = Fetcher {
        pool,
        client,
        config,
    };
    tokio::spawn(async move {
        fetcher.run().await;
    });
}

struct Fetcher {
    pool: SqlitePool,
    client: Arc<FeedClient>,
    config: FetcherConfig,
}

impl Fetcher {
    async fn run(self) {
        let interval_secs = if self.config.interval_secs == 0 {
            60
        } else {
            self.config.interval_secs
        };

        let mut ticker = interval(Duration::from_secs(interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // immediate first run

        let mut fail_counts: HashMap<String, u32> = HashMap::new();
        loop {
            ticker.tick().await;
            if let Err(err) = self.run_once(&mut fail_counts).await {
                warn!(error = ?err, "update round failed");
            }
        }
    }

    async fn run_once(&self, fail_counts: &mut HashMap<String, u32>) -> anyhow::Result<()> {
        let subs = subscriptions::list_subscriptions(&self.pool).await?;
        if subs.is_empty() {
            debug!("no subscriptions to update");
            return Ok(());
        }

        info!(count = subs.len(), "starting update round");

        for sub in subs {
            sleep(Duration::from_secs(self.config.per_feed_delay_secs)).await;
            match refresh_subscription(&self.pool, &self.client, &sub).await {
                Ok(inserted) => {
                    fail_counts.remove(&sub.url);
                    debug!(subscription = sub.id, inserted, "subscription updated");
                }
                Err(err) => {
                    let count = fail_counts.entry(sub.url.clone()).or_insert(0);
                    *count += 1;
                    if *count == FAILED_UPDATES_TO_LOG_AT {
                        warn!(
                            url = %sub.url,
                            failures = *count,
                            error = ?err,
                            "subscription keeps failing"
                        );
                    } else {
                        debug!(url = %sub.url, error = ?err, "subscription update failed");
                    }
                }
            }
        }

        Ok(())
    }
}

/// Fetch one subscription and ingest whatever it yields. Returns the number
/// of newly stored items.
pub async fn refresh_subscription(
    pool: &SqlitePool,
    client: &FeedClient,
    sub: &SubscriptionRow,
) -> anyhow::Result<u64> {
    let feed = client.fetch_feed(&sub.url).await?;
    ingest_items(pool, sub, &feed).await
}

/// Turn extracted items into stored rows: unescape the link, sanitize title
/// and description against it, derive the guid blob, resolve the timestamp.
/// Already-known guids are skipped by the insert.
pub async fn ingest_items(
    pool: &SqlitePool,
    sub: &SubscriptionRow,
    feed: &ParsedFeed,
) -> anyhow::Result<u64> {
    let mut new_items = Vec::with_capacity(feed.items.len());
    for item in &feed.items {
        let link = html_escape::decode_html_entities(&item.link).into_owned();
        let title = sanitize::sanitize(&item.title, &link);
        let description = sanitize::sanitize(&item.description, &link);
        let pubdate = pubdate::resolve_timestamp(item.timestamp.as_ref());

        new_items.push(NewItem {
            guid: guid::item_guid(&sub.url, &item.guid),
            title,
            link,
            description,
            pubdate,
            subscription: sub.id,
        });
    }

    let inserted = items::insert_items(pool, new_items).await?;
    Ok(inserted)
}
