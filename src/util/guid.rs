//! Content-addressed identities: items are keyed by a digest of the
//! subscription URL and the feed-supplied guid, subscriptions by a digest
//! of their URL. Both are opaque to clients.

/// 16-byte item key: `md5(md5(subscription_url) ‖ md5(item_guid))`.
/// Hashing the subscription URL into the key keeps identical articles from
/// colliding across subscriptions.
pub fn item_guid(subscription_url: &str, feed_guid: &str) -> Vec<u8> {
    let mut seed = Vec::with_capacity(32);
    seed.extend_from_slice(&md5::compute(subscription_url).0);
    seed.extend_from_slice(&md5::compute(feed_guid).0);
    md5::compute(&seed).0.to_vec()
}

/// Hex digest identifying a subscription in API paths.
pub fn url_hash(url: &str) -> String {
    format!("{:x}", md5::compute(url))
}

pub fn encode_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, byte| {
        let _ = write!(out, "{byte:02x}");
        out
    })
}

pub fn decode_hex(hex: &str) -> Option<Vec<u8>> {
    if hex.is_empty() || hex.len() % 2 != 0 || !hex.is_ascii() {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}
