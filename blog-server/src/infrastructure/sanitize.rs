//! The only boundary between author input and stored post content.
//! Content is rendered as raw markup downstream, so every write goes
//! through [`sanitize_html`].

use ammonia::Builder;
use once_cell::sync::Lazy;

static CLEANER: Lazy<Builder<'static>> = Lazy::new(|| {
    let mut builder = Builder::default();
    builder
        .add_generic_attributes(["class"])
        .add_tags(["figure", "figcaption", "mark", "s", "u"])
        .link_rel(Some("noopener noreferrer"));
    builder
});

/// Allowlist-based cleaning: drops `<script>`/`<style>` with their
/// content, event-handler attributes and non-http(s)/mailto URLs.
pub fn sanitize_html(html: &str) -> String {
    CLEANER.clean(html).to_string()
}

/// Visible text of an HTML fragment with whitespace collapsed.
pub fn plain_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut quote: Option<char> = None;

    for ch in html.chars() {
        match (in_tag, quote, ch) {
            (false, _, '<') => {
                in_tag = true;
                text.push(' ');
            }
            (false, _, c) => text.push(c),
            (true, Some(q), c) if c == q => quote = None,
            (true, Some(_), _) => {}
            (true, None, '"' | '\'') => quote = Some(ch),
            (true, None, '>') => in_tag = false,
            (true, None, _) => {}
        }
    }

    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
