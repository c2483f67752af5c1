//! Sanitizer behavior: allow-list filtering, attribute handling, relative
//! URL resolution, and the lenient close-tag discipline.

use feedreader::feed::sanitize::{sanitize, ALLOWED_TAGS, BANNED_STYLE_SUBSTRINGS};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const BASE: &str = "https://ex.com/a/";

// ============================================================================
// Tag filtering
// ============================================================================

#[test]
fn script_is_dropped_with_its_body() {
    assert_eq!(sanitize("<script>evil()</script>text", BASE), "text");
}

#[test]
fn style_element_is_dropped_with_its_body() {
    assert_eq!(sanitize("<style>p{color:red}</style>after", BASE), "after");
}

#[test]
fn unterminated_script_swallows_to_end_of_input() {
    assert_eq!(sanitize("before<script>evil(", BASE), "before");
}

#[test]
fn other_disallowed_tags_keep_their_text() {
    assert_eq!(
        sanitize("<table><tr><td>cell</td></tr></table>", BASE),
        "cell"
    );
}

#[test]
fn entity_escaped_markup_is_decoded_then_filtered() {
    assert_eq!(
        sanitize("&lt;script&gt;alert(1)&lt;/script&gt;safe", BASE),
        "safe"
    );
}

#[test]
fn uppercase_tags_are_normalized() {
    assert_eq!(sanitize("<DIV>x</DIV>", BASE), "<div>x</div>");
}

#[test]
fn comments_and_declarations_vanish() {
    assert_eq!(sanitize("a<!-- <b> -->c<!DOCTYPE html>d", BASE), "acd");
}

#[test]
fn lone_angle_bracket_is_text() {
    assert_eq!(sanitize("1 < 2", BASE), "1 < 2");
}

// ============================================================================
// Attributes
// ============================================================================

#[test]
fn relative_src_is_resolved_against_base() {
    assert_eq!(
        sanitize("<img src='/p.png'>", BASE),
        "<img src=\"https://ex.com/p.png\"></img>"
    );
}

#[test]
fn absolute_src_is_untouched() {
    assert_eq!(
        sanitize("<img src='https://cdn.ex/pic.png'>", BASE),
        "<img src=\"https://cdn.ex/pic.png\"></img>"
    );
}

#[test]
fn unparseable_base_leaves_values_alone() {
    assert_eq!(
        sanitize("<img src='/p.png'>", ""),
        "<img src=\"/p.png\"></img>"
    );
}

#[test]
fn banned_style_value_drops_the_attribute() {
    assert_eq!(
        sanitize("<div style='border:1px'>x</div>", BASE),
        "<div>x</div>"
    );
}

#[test]
fn banned_style_match_is_case_insensitive_substring() {
    assert_eq!(
        sanitize("<div style='FLOAT:left'>x</div>", BASE),
        "<div>x</div>"
    );
    // substring anywhere in the value, not only as a property name
    assert_eq!(
        sanitize("<div style='background:url(border.png)'>x</div>", BASE),
        "<div>x</div>"
    );
}

#[test]
fn benign_style_survives() {
    assert_eq!(
        sanitize("<span style='color:red'>x</span>", BASE),
        "<span style=\"color:red\">x</span>"
    );
}

#[test]
fn disallowed_attributes_are_dropped() {
    assert_eq!(
        sanitize("<a href='/post' onclick='x()'>go</a>", "https://ex.com/"),
        "<a href=\"https://ex.com/post\" target=\"_new\" rel=\"noreferrer\">go</a>"
    );
}

#[test]
fn data_src_passes_without_resolution() {
    // only src/href are rewritten; the data-* variants pass through as-is
    assert_eq!(
        sanitize("<img data-src='/l.png'>", "https://ex.com/"),
        "<img data-src=\"/l.png\"></img>"
    );
}

#[test]
fn valueless_attributes_are_emitted_bare() {
    assert_eq!(
        sanitize("<video controls src='http://v/v.mp4'></video>", BASE),
        "<video controls src=\"http://v/v.mp4\"></video>"
    );
}

#[test]
fn quotes_in_values_are_escaped() {
    assert_eq!(
        sanitize(r#"<img alt='say "hi"'>"#, BASE),
        "<img alt=\"say &quot;hi&quot;\"></img>"
    );
}

// ============================================================================
// Close-tag discipline
// ============================================================================

#[test]
fn unclosed_tags_close_newest_first_at_end_of_input() {
    assert_eq!(sanitize("<div><p>x", BASE), "<div><p>x</p></div>");
}

#[test]
fn stray_close_tags_are_dropped() {
    assert_eq!(sanitize("x</div>y", BASE), "xy");
}

#[test]
fn interleaved_close_tags_are_honored_by_name() {
    // one stray close must not corrupt the remainder of the fragment
    assert_eq!(sanitize("<i><b>x</i>y</b>", BASE), "<i><b>x</i>y</b>");
}

#[test]
fn self_closing_tags_open_and_close() {
    assert_eq!(sanitize("<br/>", BASE), "<br></br>");
}

#[test]
fn close_removes_nearest_open_of_that_name() {
    assert_eq!(
        sanitize("<div>a<div>b</div>c", BASE),
        "<div>a<div>b</div>c</div>"
    );
}

// ============================================================================
// Allow-list surface
// ============================================================================

#[test]
fn allow_lists_are_the_published_constants() {
    assert!(ALLOWED_TAGS.contains(&"h6"));
    assert!(!ALLOWED_TAGS.contains(&"script"));
    assert!(BANNED_STYLE_SUBSTRINGS.contains(&"display"));
}

// ============================================================================
// Property: sanitization is total
// ============================================================================

proptest! {
    #[test]
    fn sanitize_never_panics(input in ".*") {
        let _ = sanitize(&input, "https://example.com/base/");
    }

    #[test]
    fn sanitize_never_panics_with_garbage_base(input in ".*", base in ".*") {
        let _ = sanitize(&input, &base);
    }
}
