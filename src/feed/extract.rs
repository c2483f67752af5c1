//! Lenient field extraction for RSS 2.0 / Atom style documents.
//!
//! Real-world feeds are malformed often enough that a conformant XML parser
//! rejects a meaningful fraction of them outright. This module instead runs
//! ordered regex cascades per field: each pattern is tried in priority order
//! and the first match wins. Every cascade has a defined fallback, so
//! extraction is total — any input produces a [`ParsedFeed`].

use std::sync::LazyLock;

use regex::Regex;

static ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<\s*item.*?>.*?</\s*item\s*>").unwrap());
static ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<\s*entry.*?>.*?</\s*entry\s*>").unwrap());
static IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<\s*image.+?</\s*image.*?>").unwrap());

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<\s*title.*?>(.+?)</\s*title\s*>").unwrap());
static MEDIA_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<\s*media:title.*?>(.+?)</\s*media:title\s*>").unwrap());

static LINK_BODY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<\s*link\s*>(.*?)</\s*link\s*>").unwrap());
static LINK_SELF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<\s*link.+?rel\s*=\s*.self.+?>").unwrap());
static LINK_HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)<\s*link.+?href\s*=\s*("(.+?)"|'(.+?)')"#).unwrap());

static CONTENT_ENCODED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<\s*content:encoded.*?>(.*?)</\s*content:encoded\s*>").unwrap()
});
static MEDIA_DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<\s*media:description.*?>(.*?)</\s*media:description\s*>").unwrap()
});
static DESCRIPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<\s*description\s*>(.*?)</\s*description\s*>").unwrap());
// the mandatory whitespace keeps this from matching tags that merely start
// with "content", e.g. <content-type>
static CONTENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<\s*content\s.*?>(.*?)</\s*content\s*>").unwrap());

static ENCLOSURE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<\s*enclosure\s.*?url\s*=\s*("(.+?)"|'(.+?)')"#).unwrap()
});
static ENCLOSURE_TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)<\s*enclosure\s.*?type\s*=\s*["'](.+?)/"#).unwrap());
static THUMBNAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)<\s*media:thumbnail.+?url\s*=\s*"(.+?)""#).unwrap());

static GUID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<\s*guid\s*>(.*?)</\s*guid\s*>").unwrap());
static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<\s*id\s*>(.*?)</\s*id\s*>").unwrap());
static PUBDATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<\s*pubdate\s*>(.*?)</\s*pubdate\s*>").unwrap());
static UPDATED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<\s*updated\s*>(.*?)</\s*updated\s*>").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFeed {
    pub title: String,
    pub link: String,
    pub items: Vec<ParsedItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedItem {
    pub title: String,
    pub link: String,
    /// Raw, unsanitized markup. Callers sanitize before rendering or storing.
    pub description: String,
    /// Feed-supplied identifier; already falls back to `link` when the feed
    /// provides none (or an empty one), so it may still be empty.
    pub guid: String,
    pub timestamp: Option<FeedTimestamp>,
}

/// At most one raw date string survives per item: RSS `pubDate` wins over
/// Atom `updated`. Converting either into an actual timestamp is the
/// caller's job (see `util::pubdate`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedTimestamp {
    PubDate(String),
    Updated(String),
}

/// Extract a feed from raw document text. Total: malformed input degrades
/// to default field values, never an error.
pub fn parse(xml: &str) -> ParsedFeed {
    let mut spans: Vec<&str> = ITEM_RE.find_iter(xml).map(|m| m.as_str()).collect();
    // entries are appended after items on purpose; mixed-dialect feeds keep
    // this ordering and downstream consumers observe it
    spans.extend(ENTRY_RE.find_iter(xml).map(|m| m.as_str()));

    // feed-level metadata comes from the residue: the document minus any
    // <image> blocks and minus every extracted item span
    let mut header = IMAGE_RE.replace_all(xml, "").into_owned();
    for span in &spans {
        header = header.replace(span, "");
    }

    ParsedFeed {
        title: extract_title(&header),
        link: extract_link(&header),
        items: spans.iter().map(|span| parse_item(span)).collect(),
    }
}

fn parse_item(xml: &str) -> ParsedItem {
    let link = extract_link(xml);
    let guid = match capture(&GUID_RE, xml).or_else(|| capture(&ID_RE, xml)) {
        Some(guid) if !guid.is_empty() => guid.to_string(),
        _ => link.clone(),
    };
    let timestamp = capture(&PUBDATE_RE, xml)
        .map(|raw| FeedTimestamp::PubDate(raw.to_string()))
        .or_else(|| capture(&UPDATED_RE, xml).map(|raw| FeedTimestamp::Updated(raw.to_string())));

    ParsedItem {
        title: extract_title(xml),
        description: extract_description(xml),
        link,
        guid,
        timestamp,
    }
}

fn capture<'a>(re: &Regex, text: &'a str) -> Option<&'a str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn extract_title(xml: &str) -> String {
    let raw = capture(&TITLE_RE, xml)
        .or_else(|| capture(&MEDIA_TITLE_RE, xml))
        .unwrap_or("No Title");
    strip_cdata(raw).to_string()
}

fn extract_link(xml: &str) -> String {
    if let Some(body) = capture(&LINK_BODY_RE, xml) {
        return body.to_string();
    }
    // self-referential link tags would otherwise shadow the real target
    let stripped = LINK_SELF_RE.replace_all(xml, "");
    if let Some(caps) = LINK_HREF_RE.captures(&stripped) {
        if let Some(href) = caps.get(2).or_else(|| caps.get(3)) {
            return href.as_str().to_string();
        }
    }
    String::new()
}

fn extract_description(xml: &str) -> String {
    let raw = capture(&CONTENT_ENCODED_RE, xml)
        .or_else(|| capture(&MEDIA_DESCRIPTION_RE, xml))
        .or_else(|| capture(&DESCRIPTION_RE, xml))
        .or_else(|| capture(&CONTENT_RE, xml))
        .unwrap_or("");
    let mut description = strip_cdata(raw).to_string();

    if let Some(url) = enclosure_url(xml) {
        let tag = enclosure_media_tag(xml, &url);
        description = format!("<{tag} controls src=\"{url}\" /><br><br>{description}");
    }
    // thumbnail is prepended after the enclosure so it ends up first
    if let Some(caps) = THUMBNAIL_RE.captures(xml) {
        let url = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        description = format!("<img src=\"{url}\" /><br><br>{description}");
    }

    description
}

fn strip_cdata(text: &str) -> &str {
    match text
        .strip_prefix("<![CDATA[")
        .and_then(|inner| inner.strip_suffix("]]>"))
    {
        Some(inner) => inner,
        None => text,
    }
}

fn enclosure_url(xml: &str) -> Option<String> {
    let caps = ENCLOSURE_URL_RE.captures(xml)?;
    caps.get(2)
        .or_else(|| caps.get(3))
        .map(|m| m.as_str().to_string())
}

const MEDIA_TAGS: &[(&str, &str)] = &[("image", "img"), ("audio", "audio"), ("video", "video")];

fn media_tag_for(category: &str) -> Option<&'static str> {
    MEDIA_TAGS
        .iter()
        .find(|(known, _)| *known == category)
        .map(|(_, tag)| *tag)
}

/// Embed tag for an enclosure: MIME category from the `type` attribute,
/// else guessed from the URL's file extension, else `img`.
fn enclosure_media_tag(xml: &str, url: &str) -> &'static str {
    ENCLOSURE_TYPE_RE
        .captures(xml)
        .and_then(|caps| media_tag_for(&caps[1].to_ascii_lowercase()))
        .or_else(|| extension_category(url).and_then(media_tag_for))
        .unwrap_or("img")
}

const IMAGE_EXTS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "svg", "ico", "tif", "tiff",
];
const AUDIO_EXTS: &[&str] = &[
    "mp3", "ogg", "oga", "wav", "m4a", "flac", "aac", "opus", "mid", "midi",
];
const VIDEO_EXTS: &[&str] = &["mp4", "m4v", "webm", "mov", "avi", "mkv", "mpg", "mpeg"];

fn extension_category(url: &str) -> Option<&'static str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let (_, ext) = path.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    if IMAGE_EXTS.contains(&ext.as_str()) {
        Some("image")
    } else if AUDIO_EXTS.contains(&ext.as_str()) {
        Some("audio")
    } else if VIDEO_EXTS.contains(&ext.as_str()) {
        Some("video")
    } else {
        None
    }
}
