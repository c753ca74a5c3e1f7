//! Allow-list HTML sanitizer
//!
//! Post bodies come from the CMS, embeds carry provider HTML verbatim, and
//! hyperlinks can hold any URL an editor typed. Everything rendered into a
//! page passes through [`sanitize_html`] first.

use lazy_static::lazy_static;
use regex::Regex;

/// Elements removed together with their content
const DROPPED_ELEMENTS: [&str; 7] = [
    "script", "style", "iframe", "object", "embed", "noscript", "template",
];

/// Elements written as `<tag />`
const VOID_ELEMENTS: [&str; 3] = ["br", "hr", "img"];

/// Attributes whose value is a URL
const URL_ATTRIBUTES: [&str; 3] = ["href", "src", "data-oembed"];

const SAFE_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

lazy_static! {
    static ref COMMENT_RE: Regex = Regex::new(r"(?s)<!--.*?-->").unwrap();
    static ref DROPPED_RES: Vec<Regex> = DROPPED_ELEMENTS
        .iter()
        .map(|name| Regex::new(&format!(r"(?is)<{0}\b[^>]*>.*?</{0}\s*>", name)).unwrap())
        .collect();
    static ref TAG_RE: Regex =
        Regex::new(r#"<(/?)([a-zA-Z][a-zA-Z0-9]*)((?:[^>"']|"[^"]*"|'[^']*')*)>"#).unwrap();
    static ref ATTR_RE: Regex = Regex::new(
        r#"([a-zA-Z_:][-a-zA-Z0-9_:.]*)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#
    )
    .unwrap();
}

/// Attributes kept on an allowed element; `None` drops the tag
fn allowed_attributes(tag: &str) -> Option<&'static [&'static str]> {
    match tag {
        "a" => Some(&["href", "title", "target"]),
        "img" => Some(&["src", "alt", "title", "width", "height"]),
        "div" => Some(&[
            "class",
            "data-oembed",
            "data-oembed-type",
            "data-oembed-provider",
        ]),
        "p" | "span" => Some(&["class"]),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "strong" | "em" | "b" | "i" | "u" | "s"
        | "sub" | "sup" | "ul" | "ol" | "li" | "pre" | "code" | "blockquote" | "br" | "hr"
        | "figure" | "figcaption" => Some(&[]),
        _ => None,
    }
}

/// Strip everything outside the allow-list from an HTML fragment
pub fn sanitize_html(html: &str) -> String {
    let mut cleaned = COMMENT_RE.replace_all(html, "").into_owned();
    for re in DROPPED_RES.iter() {
        cleaned = re.replace_all(&cleaned, "").into_owned();
    }

    let mut out = String::with_capacity(cleaned.len());
    let mut last = 0;

    for caps in TAG_RE.captures_iter(&cleaned) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        push_text(&mut out, &cleaned[last..whole.start()]);
        last = whole.end();

        let name = caps[2].to_ascii_lowercase();
        let Some(allowed) = allowed_attributes(&name) else {
            tracing::debug!("Dropped <{}> from rendered content", name);
            continue;
        };

        if !caps[1].is_empty() {
            if !VOID_ELEMENTS.contains(&name.as_str()) {
                out.push_str(&format!("</{}>", name));
            }
            continue;
        }

        let attrs = caps.get(3).map_or("", |m| m.as_str());
        out.push_str(&open_tag(&name, allowed, attrs));
    }

    push_text(&mut out, &cleaned[last..]);
    out
}

fn open_tag(name: &str, allowed: &[&str], attrs: &str) -> String {
    let mut tag = format!("<{}", name);
    let mut blank_target = false;

    for caps in ATTR_RE.captures_iter(attrs) {
        let attr = caps[1].to_ascii_lowercase();
        let Some(value) = caps.get(2).or_else(|| caps.get(3)).or_else(|| caps.get(4)) else {
            continue;
        };
        let value = value.as_str();

        if !allowed.contains(&attr.as_str()) {
            continue;
        }
        if URL_ATTRIBUTES.contains(&attr.as_str()) && !is_safe_url(value) {
            tracing::debug!("Dropped unsafe {} on <{}>", attr, name);
            continue;
        }
        if attr == "target" {
            blank_target = value == "_blank";
        }

        tag.push_str(&format!(r#" {}="{}""#, attr, escape_attr(value)));
    }

    if blank_target {
        tag.push_str(r#" rel="noopener noreferrer""#);
    }

    if VOID_ELEMENTS.contains(&name) {
        tag.push_str(" />");
    } else {
        tag.push('>');
    }
    tag
}

/// Relative URLs and allow-listed schemes only
///
/// An entity before the first delimiter (`java&#115;cript:`) is rejected
/// rather than decoded.
fn is_safe_url(url: &str) -> bool {
    let url: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();

    match url.find([':', '/', '?', '#']) {
        Some(pos) if url[pos..].starts_with(':') => {
            let scheme = url[..pos].to_ascii_lowercase();
            SAFE_SCHEMES.contains(&scheme.as_str())
        }
        Some(pos) => !url[..pos].contains('&'),
        None => !url.contains('&'),
    }
}

/// Absolute `http`/`https` URLs only, for CMS URLs printed outside a body
pub fn is_http_url(url: &str) -> bool {
    let scheme = url.trim_start().split(':').next().unwrap_or("");
    (scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https"))
        && is_safe_url(url)
}

fn escape_attr(value: &str) -> String {
    value
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Text between tags; angle brackets here never form valid markup
fn push_text(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::testing::SEARCH_FIXTURE;
    use crate::cms::SearchResponse;
    use crate::content::as_html;

    #[test]
    fn test_rendered_rich_text_passes_unchanged() {
        let response = SearchResponse::from_json(SEARCH_FIXTURE).unwrap();
        for section in &response.results[0].data.content {
            let html = as_html(&section.body);
            assert_eq!(sanitize_html(&html), html);
        }
    }

    #[test]
    fn test_script_and_comments_removed() {
        let html = "<p>hi</p><script>alert('x')</script><!-- note --><SCRIPT src=x></SCRIPT>";
        assert_eq!(sanitize_html(html), "<p>hi</p>");
    }

    #[test]
    fn test_event_handlers_dropped() {
        let html = r#"<p class="lead" onclick="steal()">x</p><img src="/a.png" onerror="steal()">"#;
        assert_eq!(
            sanitize_html(html),
            r#"<p class="lead">x</p><img src="/a.png" />"#
        );
    }

    #[test]
    fn test_unsafe_urls_dropped() {
        assert_eq!(
            sanitize_html(r#"<a href="javascript:alert(1)">x</a>"#),
            "<a>x</a>"
        );
        assert_eq!(
            sanitize_html(r#"<a href=" JaVaScRiPt:alert(1)">x</a>"#),
            "<a>x</a>"
        );
        assert_eq!(
            sanitize_html(r#"<a href="java&#115;cript:alert(1)">x</a>"#),
            "<a>x</a>"
        );
        assert_eq!(
            sanitize_html(r#"<img src="data:text/html;base64,AAAA">"#),
            "<img />"
        );
    }

    #[test]
    fn test_safe_urls_kept() {
        assert!(is_safe_url("https://example.com/?a=1&amp;b=2"));
        assert!(is_safe_url("mailto:hello@example.com"));
        assert!(is_safe_url("/posts/hooks/"));
        assert!(is_safe_url("#top"));
        assert!(is_safe_url("page.html"));
        assert!(!is_safe_url("vbscript:msgbox"));
    }

    #[test]
    fn test_http_urls_only() {
        assert!(is_http_url("https://images.prismic.io/a.png"));
        assert!(is_http_url("HTTP://example.com"));
        assert!(!is_http_url("/a.png"));
        assert!(!is_http_url("javascript:alert(1)"));
        assert!(!is_http_url("data:image/png;base64,AAAA"));
    }

    #[test]
    fn test_blank_target_gets_rel() {
        assert_eq!(
            sanitize_html(r#"<a href="https://x.io" target="_blank" rel="opener">x</a>"#),
            r#"<a href="https://x.io" target="_blank" rel="noopener noreferrer">x</a>"#
        );
    }

    #[test]
    fn test_embed_iframe_removed_wrapper_kept() {
        let html = concat!(
            r#"<div data-oembed="https://youtu.be/x" data-oembed-type="video" data-oembed-provider="YouTube">"#,
            r#"<iframe src="https://www.youtube.com/embed/x"></iframe></div>"#
        );
        assert_eq!(
            sanitize_html(html),
            r#"<div data-oembed="https://youtu.be/x" data-oembed-type="video" data-oembed-provider="YouTube"></div>"#
        );
    }

    #[test]
    fn test_unknown_tags_unwrapped_and_stray_brackets_escaped() {
        assert_eq!(
            sanitize_html("<marquee>hi</marquee> 1 < 2 >"),
            "hi 1 &lt; 2 &gt;"
        );
    }
}
