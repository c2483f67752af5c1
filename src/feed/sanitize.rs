//! Streaming HTML sanitizer for untrusted feed fragments.
//!
//! A hand-rolled left-to-right tokenizer reduces a fragment to an
//! allow-listed subset and rewrites relative `src`/`href` values against a
//! base link. Tag filtering never prunes text: dropping a `<table>` keeps
//! the cell text, with the sole exception of `<script>`/`<style>` bodies,
//! which are raw text belonging to the dropped element and are swallowed
//! with it.
//!
//! Close tags are matched by name against the sequence of currently open
//! tags, newest first, rather than strict nesting. A stray close tag is
//! dropped instead of corrupting the remainder of the fragment. This
//! leniency is observable in the output and is intentional.

use std::borrow::Cow;

use url::Url;

pub const ALLOWED_TAGS: &[&str] = &[
    "a", "img", "div", "span", "i", "b", "u", "br", "hr", "p", "video", "audio", "h1", "h2", "h3",
    "h4", "h5", "h6", "li", "ul",
];

pub const ALLOWED_ATTRS: &[&str] = &[
    "src",
    "href",
    "controls",
    "style",
    "data-srcset",
    "data-src",
    "alt",
    "title",
];

/// A `style` attribute whose value contains any of these substrings
/// (case-insensitive, anywhere in the value) is dropped entirely.
pub const BANNED_STYLE_SUBSTRINGS: &[&str] = &["display", "border", "float"];

const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

/// Reduce `fragment` to the allow-listed subset, resolving relative
/// `src`/`href` values against `base_link`. Total: unparseable markup
/// degrades to best-effort output.
pub fn sanitize(fragment: &str, base_link: &str) -> String {
    let decoded = html_escape::decode_html_entities(fragment);
    let mut sanitizer = Sanitizer::new(base_link);
    sanitizer.run(&decoded);
    sanitizer.finish()
}

struct Sanitizer {
    out: String,
    open_tags: Vec<String>,
    base: Option<Url>,
}

impl Sanitizer {
    fn new(base_link: &str) -> Self {
        Self {
            out: String::new(),
            open_tags: Vec::new(),
            base: Url::parse(base_link).ok(),
        }
    }

    fn run(&mut self, input: &str) {
        let chars: Vec<char> = input.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            if chars[i] != '<' {
                self.out.push(chars[i]);
                i += 1;
                continue;
            }
            if starts_with(&chars, i + 1, "!--") {
                i = skip_past(&chars, i + 4, "-->");
            } else if matches!(chars.get(i + 1), Some(&'!') | Some(&'?')) {
                i = skip_past(&chars, i + 2, ">");
            } else if chars.get(i + 1) == Some(&'/') {
                let (name, after_name) = read_name(&chars, i + 2);
                i = skip_past(&chars, after_name, ">");
                if !name.is_empty() {
                    self.handle_end(&name);
                }
            } else if chars.get(i + 1).is_some_and(|c| c.is_ascii_alphabetic()) {
                i = self.read_start_tag(&chars, i + 1);
            } else {
                // lone '<' that opens no tag is ordinary text
                self.out.push('<');
                i += 1;
            }
        }
    }

    fn read_start_tag(&mut self, chars: &[char], name_start: usize) -> usize {
        let (name, mut i) = read_name(chars, name_start);
        let mut attrs: Vec<(String, Option<String>)> = Vec::new();
        let mut self_closing = false;

        loop {
            while i < chars.len() && chars[i].is_whitespace() {
                i += 1;
            }
            match chars.get(i) {
                None => break,
                Some(&'>') => {
                    i += 1;
                    break;
                }
                Some(&'/') => {
                    if chars.get(i + 1) == Some(&'>') {
                        self_closing = true;
                        i += 2;
                        break;
                    }
                    i += 1;
                }
                Some(_) => {
                    let (attr, after_attr) = read_attr_name(chars, i);
                    i = after_attr;
                    while i < chars.len() && chars[i].is_whitespace() {
                        i += 1;
                    }
                    let mut value = None;
                    if chars.get(i) == Some(&'=') {
                        i += 1;
                        while i < chars.len() && chars[i].is_whitespace() {
                            i += 1;
                        }
                        let (parsed, after_value) = read_attr_value(chars, i);
                        value = Some(parsed);
                        i = after_value;
                    }
                    if !attr.is_empty() {
                        attrs.push((attr, value));
                    }
                }
            }
        }

        self.handle_start(&name, &attrs);
        if self_closing {
            self.handle_end(&name);
        } else if RAW_TEXT_TAGS.contains(&name.as_str()) {
            // swallow the raw-text body; the close tag itself is then parsed
            // normally and dropped like any other disallowed end tag
            i = find_rawtext_close(chars, i, &name);
        }
        i
    }

    fn handle_start(&mut self, tag: &str, attrs: &[(String, Option<String>)]) {
        if !ALLOWED_TAGS.contains(&tag) {
            return;
        }
        self.out.push('<');
        self.out.push_str(tag);
        for (attr, value) in attrs {
            if attr == "style" && value.as_deref().is_some_and(style_is_banned) {
                continue;
            }
            if !ALLOWED_ATTRS.contains(&attr.as_str()) {
                continue;
            }
            match value {
                Some(value) => {
                    let value = if (attr == "src" || attr == "href") && !is_absolute(value) {
                        self.resolve(value)
                    } else {
                        Cow::Borrowed(value.as_str())
                    };
                    self.out.push(' ');
                    self.out.push_str(attr);
                    self.out.push_str("=\"");
                    self.out.push_str(&value.replace('"', "&quot;"));
                    self.out.push('"');
                }
                None => {
                    self.out.push(' ');
                    self.out.push_str(attr);
                }
            }
        }
        if tag == "a" {
            self.out.push_str(" target=\"_new\" rel=\"noreferrer\"");
        }
        self.out.push('>');
        self.open_tags.insert(0, tag.to_string());
    }

    fn handle_end(&mut self, tag: &str) {
        if !ALLOWED_TAGS.contains(&tag) {
            return;
        }
        // remove by name, newest occurrence first; unmatched close tags are
        // dropped without output
        if let Some(pos) = self.open_tags.iter().position(|open| open == tag) {
            self.open_tags.remove(pos);
            self.out.push_str("</");
            self.out.push_str(tag);
            self.out.push('>');
        }
    }

    fn resolve<'a>(&self, value: &'a str) -> Cow<'a, str> {
        match &self.base {
            Some(base) => match base.join(value) {
                Ok(resolved) => Cow::Owned(resolved.to_string()),
                Err(_) => Cow::Borrowed(value),
            },
            None => Cow::Borrowed(value),
        }
    }

    fn finish(mut self) -> String {
        let open = std::mem::take(&mut self.open_tags);
        for tag in open {
            self.out.push_str("</");
            self.out.push_str(&tag);
            self.out.push('>');
        }
        self.out
    }
}

fn style_is_banned(value: &str) -> bool {
    let value = value.to_lowercase();
    BANNED_STYLE_SUBSTRINGS
        .iter()
        .any(|banned| value.contains(banned))
}

/// A value counts as absolute only when it parses as a URL with a host.
fn is_absolute(value: &str) -> bool {
    Url::parse(value).map(|url| url.has_host()).unwrap_or(false)
}

fn read_name(chars: &[char], mut i: usize) -> (String, usize) {
    let mut name = String::new();
    while let Some(&c) = chars.get(i) {
        if c.is_ascii_alphanumeric() || c == ':' || c == '-' || c == '_' {
            name.push(c.to_ascii_lowercase());
            i += 1;
        } else {
            break;
        }
    }
    (name, i)
}

fn read_attr_name(chars: &[char], mut i: usize) -> (String, usize) {
    let mut name = String::new();
    while let Some(&c) = chars.get(i) {
        if c.is_whitespace() || c == '=' || c == '>' || c == '/' {
            break;
        }
        name.push(c.to_ascii_lowercase());
        i += 1;
    }
    (name, i)
}

fn read_attr_value(chars: &[char], mut i: usize) -> (String, usize) {
    let mut value = String::new();
    match chars.get(i) {
        Some(&quote) if quote == '"' || quote == '\'' => {
            i += 1;
            while let Some(&c) = chars.get(i) {
                i += 1;
                if c == quote {
                    break;
                }
                value.push(c);
            }
        }
        _ => {
            while let Some(&c) = chars.get(i) {
                if c.is_whitespace() || c == '>' {
                    break;
                }
                value.push(c);
                i += 1;
            }
        }
    }
    (value, i)
}

fn starts_with(chars: &[char], from: usize, needle: &str) -> bool {
    needle
        .chars()
        .enumerate()
        .all(|(offset, c)| chars.get(from + offset) == Some(&c))
}

/// Index just past the first occurrence of `needle` at or after `from`,
/// or end of input when it never occurs.
fn skip_past(chars: &[char], from: usize, needle: &str) -> usize {
    let needle: Vec<char> = needle.chars().collect();
    let mut i = from;
    while i + needle.len() <= chars.len() {
        if chars[i..i + needle.len()]
            .iter()
            .zip(&needle)
            .all(|(a, b)| a == b)
        {
            return i + needle.len();
        }
        i += 1;
    }
    chars.len()
}

/// Index of the `</name` close tag (whitespace tolerated after the slash,
/// name compared case-insensitively), or end of input.
fn find_rawtext_close(chars: &[char], from: usize, name: &str) -> usize {
    let name: Vec<char> = name.chars().collect();
    let mut i = from;
    'scan: while i + 1 < chars.len() {
        if chars[i] == '<' && chars[i + 1] == '/' {
            let mut j = i + 2;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            for (offset, expected) in name.iter().enumerate() {
                match chars.get(j + offset) {
                    Some(c) if c.to_ascii_lowercase() == *expected => {}
                    _ => {
                        i += 1;
                        continue 'scan;
                    }
                }
            }
            return i;
        }
        i += 1;
    }
    chars.len()
}
