//! Strips HTML, URLs, markdown link syntax, and code-fence noise from raw text.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"http\S+|www\S+|https\S+").expect("url pattern"));

// The closing paren is optional so an unterminated link still collapses
// to its label.
static MARKDOWN_LINK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)?").expect("markdown link pattern"));

static FENCE_OPEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```[a-zA-Z]*\n").expect("fence open pattern"));

static WHITESPACE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Reduces raw corpus text to the plain prose worth embedding.
///
/// Applied in order: HTML tags are dropped keeping only visible text,
/// markdown links collapse to their label, bare URLs are removed,
/// fenced-code delimiters are stripped (the code itself is kept), inline
/// backticks are stripped, and whitespace runs collapse to a single space.
///
/// Link replacement runs before URL stripping: it needs the link target's
/// closing paren intact, otherwise the match swallows the prose after it.
///
/// Idempotent: `clean(clean(x)) == clean(x)`.
pub fn clean(text: &str) -> String {
    let stripped = strip_html(text);
    let without_links = MARKDOWN_LINK_PATTERN.replace_all(&stripped, "$1");
    let without_urls = URL_PATTERN.replace_all(&without_links, "");
    let without_fences = FENCE_OPEN_PATTERN.replace_all(&without_urls, "");
    let without_fences = without_fences.replace("```", "").replace('`', "");
    let collapsed = WHITESPACE_PATTERN.replace_all(&without_fences, " ");
    collapsed.trim().to_string()
}

/// Keeps only the visible text of an HTML fragment.
///
/// The html5ever parser underneath is lenient and recovers from malformed
/// markup, so plain text passes through with its characters intact.
fn strip_html(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let fragment = Html::parse_fragment(text);
    fragment.root_element().text().collect::<String>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_html_tags_keeping_text() {
        assert_eq!(
            clean("<p>Use <b>pandas</b> for this.</p>"),
            "Use pandas for this."
        );
    }

    #[test]
    fn removes_bare_urls() {
        assert_eq!(
            clean("See https://docs.python.org/3/ for details"),
            "See for details"
        );
        assert_eq!(clean("visit www.example.com now"), "visit now");
    }

    #[test]
    fn markdown_links_keep_their_label() {
        assert_eq!(clean("read [the docs](https://example.com) first"), "read the docs first");
    }

    #[test]
    fn prose_between_links_survives() {
        assert_eq!(clean("[one](http://a) and [two](http://b)"), "one and two");
    }

    #[test]
    fn fence_delimiters_removed_but_code_kept() {
        let input = "intro\n```python\nprint('hi')\n```\noutro";
        assert_eq!(clean(input), "intro print('hi') outro");
    }

    #[test]
    fn inline_backticks_removed() {
        assert_eq!(clean("call `len(x)` here"), "call len(x) here");
    }

    #[test]
    fn whitespace_collapses_and_trims() {
        assert_eq!(clean("  a\t\tb \n c  "), "a b c");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(clean(""), "");
    }

    #[test]
    fn idempotent_on_varied_samples() {
        let samples = [
            "already clean text",
            "<div><p>pure html</p><span>nodes</span></div>",
            "[one](http://a) and [two](http://b)",
            "outer\n```rust\nlet x = 1;\n```\ninner\n```\ndone\n```",
            "mixed <em>markup</em> with `code` and http://url.example",
        ];
        for sample in samples {
            let once = clean(sample);
            assert_eq!(clean(&once), once, "not idempotent for {sample:?}");
        }
    }

    proptest! {
        #[test]
        fn idempotent_for_plain_text(input in "[a-zA-Z0-9 .,\n]{0,200}") {
            let once = clean(&input);
            prop_assert_eq!(clean(&once), once);
        }
    }
}
