//! Post page view model

use serde::Serialize;

use super::rich_text::{as_html, as_text, field_text, optional_text};
use super::sanitize::{is_http_url, sanitize_html};
use crate::cms::RawDocument;
use crate::helpers::{date_xml, DateStyle};

/// Reading speed used for the reading-time estimate
pub const WORDS_PER_MINUTE: usize = 200;

/// One heading with its rendered body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub heading: String,
    /// Sanitized HTML
    pub body_html: String,
}

/// What a post page shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostDetail {
    pub uid: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub publication_date: Option<String>,
    /// Machine-readable first publication time
    pub published_at: Option<String>,
    /// Set only when the post was edited after it was first published
    pub last_publication_date: Option<String>,
    pub banner_url: Option<String>,
    pub banner_alt: String,
    pub sections: Vec<Section>,
    pub reading_time_minutes: u32,
}

/// Assemble the post page view model from a raw document
pub fn to_post_detail(doc: &RawDocument, dates: &DateStyle) -> PostDetail {
    let sections = doc
        .data
        .content
        .iter()
        .map(|entry| Section {
            heading: optional_text(entry.heading.as_ref()),
            body_html: sanitize_html(&as_html(&entry.body)),
        })
        .collect();

    let total_words: usize = doc
        .data
        .content
        .iter()
        .map(|entry| count_words(&as_text(&entry.body)))
        .sum();

    let edited = match (doc.first_publication_date, doc.last_publication_date) {
        (Some(first), Some(last)) => last > first,
        _ => false,
    };

    let banner = doc.data.banner.as_ref();

    PostDetail {
        uid: doc.uid.clone(),
        title: field_text(&doc.data.title),
        subtitle: optional_text(doc.data.subtitle.as_ref()),
        author: optional_text(doc.data.author.as_ref()),
        publication_date: doc.first_publication_date.as_ref().map(|d| dates.format(d)),
        published_at: doc.first_publication_date.as_ref().map(|d| date_xml(d)),
        last_publication_date: doc
            .last_publication_date
            .as_ref()
            .filter(|_| edited)
            .map(|d| dates.format(d)),
        banner_url: banner
            .and_then(|b| b.url.clone())
            .filter(|url| is_http_url(url)),
        banner_alt: banner.and_then(|b| b.alt.clone()).unwrap_or_default(),
        sections,
        // Any content at all reads as at least a minute
        reading_time_minutes: if doc.data.content.is_empty() {
            0
        } else {
            reading_time_minutes(total_words).max(1)
        },
    }
}

/// Number of whitespace-delimited tokens
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Minutes needed to read `words` words, rounded up
pub fn reading_time_minutes(words: usize) -> u32 {
    words.div_ceil(WORDS_PER_MINUTE) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::testing::SEARCH_FIXTURE;
    use crate::cms::SearchResponse;
    use crate::helpers::DateLocale;
    use chrono_tz::Tz;

    fn post_style() -> DateStyle {
        DateStyle::new("DD MMM YYYY", DateLocale::PtBr, Tz::UTC)
    }

    fn doc_with_words(words: usize) -> RawDocument {
        let text = vec!["palavra"; words].join(" ");
        RawDocument::from_json(&format!(
            r#"{{"uid": "words", "data": {{
                "title": "Words",
                "content": [{{"heading": "Only", "body": [{{"type": "paragraph", "text": "{}", "spans": []}}]}}]
            }}}}"#,
            text
        ))
        .unwrap()
    }

    #[test]
    fn test_reading_time_rounds_up() {
        assert_eq!(reading_time_minutes(0), 0);
        assert_eq!(reading_time_minutes(1), 1);
        assert_eq!(reading_time_minutes(200), 1);
        assert_eq!(reading_time_minutes(201), 2);
        assert_eq!(reading_time_minutes(400), 2);
    }

    #[test]
    fn test_reading_time_from_content() {
        assert_eq!(to_post_detail(&doc_with_words(400), &post_style()).reading_time_minutes, 2);
        assert_eq!(to_post_detail(&doc_with_words(1), &post_style()).reading_time_minutes, 1);
    }

    #[test]
    fn test_image_only_section_takes_a_minute() {
        let doc = RawDocument::from_json(
            r#"{"uid": "pics", "data": {"title": "Pics", "content": [{"heading": "Gallery", "body": [
                {"type": "image", "url": "https://images.prismic.io/a.png", "alt": "a"}
            ]}]}}"#,
        )
        .unwrap();
        let detail = to_post_detail(&doc, &post_style());
        assert_eq!(detail.sections.len(), 1);
        assert_eq!(detail.reading_time_minutes, 1);
    }

    #[test]
    fn test_banner_must_be_http() {
        let banner = |url: &str| {
            let doc = RawDocument::from_json(&format!(
                r#"{{"uid": "b", "data": {{"title": "B", "banner": {{"url": {}, "alt": "x"}}}}}}"#,
                serde_json::to_string(url).unwrap()
            ))
            .unwrap();
            to_post_detail(&doc, &post_style()).banner_url
        };

        assert_eq!(banner("javascript:alert(1)"), None);
        assert_eq!(banner(""), None);
        assert_eq!(
            banner("https://a/x.png").as_deref(),
            Some("https://a/x.png")
        );
    }

    #[test]
    fn test_count_words_uses_any_whitespace() {
        assert_eq!(count_words("  one\ttwo\n three  "), 3);
        assert_eq!(count_words(""), 0);
    }

    #[test]
    fn test_fixture_detail() {
        let response = SearchResponse::from_json(SEARCH_FIXTURE).unwrap();
        let detail = to_post_detail(&response.results[0], &post_style());

        assert_eq!(detail.title, "Como utilizar Hooks");
        assert_eq!(detail.publication_date.as_deref(), Some("15 mar 2021"));
        assert_eq!(
            detail.published_at.as_deref(),
            Some("2021-03-15T19:25:28.000+00:00")
        );
        assert_eq!(detail.last_publication_date.as_deref(), Some("16 mar 2021"));
        assert_eq!(
            detail.banner_url.as_deref(),
            Some("https://images.prismic.io/spacetraveling/banner.png?auto=compress,format")
        );
        assert_eq!(detail.sections.len(), 2);
        assert_eq!(detail.sections[0].heading, "Proin et varius");
        assert_eq!(detail.sections[1].heading, "Cras laoreet mi");
        assert!(detail.sections[0].body_html.starts_with("<p><strong>Lorem ipsum</strong>"));
        // 8 + 2 + 2 words in the first section, 7 in the second
        assert_eq!(detail.reading_time_minutes, 1);
    }

    #[test]
    fn test_post_without_content_or_banner() {
        let response = SearchResponse::from_json(SEARCH_FIXTURE).unwrap();
        let detail = to_post_detail(&response.results[1], &post_style());
        assert!(detail.sections.is_empty());
        assert_eq!(detail.reading_time_minutes, 0);
        assert_eq!(detail.banner_url, None);
        assert_eq!(detail.publication_date, None);
        assert_eq!(detail.last_publication_date, None);
    }

    #[test]
    fn test_body_html_is_sanitized() {
        let doc = RawDocument::from_json(
            r#"{"uid": "xss", "data": {"title": "x", "content": [{"heading": "h", "body": [
                {"type": "paragraph", "text": "click", "spans": [
                    {"start": 0, "end": 5, "type": "hyperlink", "data": {"url": "javascript:alert(1)"}}]},
                {"type": "embed", "oembed": {"embed_url": "https://x", "type": "rich", "html": "<script>bad()</script><b>ok</b>"}}
            ]}]}}"#,
        )
        .unwrap();
        let detail = to_post_detail(&doc, &post_style());
        let html = &detail.sections[0].body_html;
        assert!(!html.contains("javascript"));
        assert!(!html.contains("script"));
        assert!(html.contains("<a>click</a>"));
        assert!(html.contains("<b>ok</b>"));
    }
}
