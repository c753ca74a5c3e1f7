//! Prismic document schema
//!
//! Payloads are decoded into explicit types at the adapter boundary. Optional
//! fields stay `Option`/empty; anything that violates the schema (missing
//! `uid` or `title`, an unparseable timestamp) fails with
//! [`CmsError::Decode`](super::CmsError::Decode).

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use super::CmsError;

/// A document as returned by the content API
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawDocument {
    #[serde(default)]
    pub id: String,

    /// Unique, URL-safe identifier of the post
    pub uid: String,

    #[serde(rename = "type", default)]
    pub doc_type: String,

    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub first_publication_date: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub last_publication_date: Option<DateTime<Utc>>,

    pub data: PostFields,
}

impl RawDocument {
    /// Decode a single document
    pub fn from_json(body: &str) -> Result<Self, CmsError> {
        serde_json::from_str(body).map_err(|e| CmsError::decode("document", e))
    }
}

/// The custom type fields of a post
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PostFields {
    pub title: RichField,

    #[serde(default)]
    pub subtitle: Option<RichField>,

    #[serde(default)]
    pub author: Option<RichField>,

    #[serde(default)]
    pub banner: Option<Banner>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Vec<ContentSection>,
}

/// Image field; Prismic sends `{}` for an empty image
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Banner {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
}

/// One `{heading, body}` group of the post content slice
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContentSection {
    #[serde(default)]
    pub heading: Option<RichField>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub body: RichText,
}

/// A text field that may be modelled as key text or as structured text
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RichField {
    Plain(String),
    Rich(RichText),
}

/// Structured text: an ordered list of blocks
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RichText(pub Vec<RichTextBlock>);

impl RichText {
    pub fn blocks(&self) -> &[RichTextBlock] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RichTextBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,

    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub spans: Vec<Span>,

    /// Image blocks
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,

    /// Embed blocks
    #[serde(default)]
    pub oembed: Option<Embed>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum BlockKind {
    #[serde(rename = "heading1")]
    Heading1,
    #[serde(rename = "heading2")]
    Heading2,
    #[serde(rename = "heading3")]
    Heading3,
    #[serde(rename = "heading4")]
    Heading4,
    #[serde(rename = "heading5")]
    Heading5,
    #[serde(rename = "heading6")]
    Heading6,
    #[serde(rename = "paragraph")]
    Paragraph,
    #[serde(rename = "preformatted")]
    Preformatted,
    #[serde(rename = "list-item")]
    ListItem,
    #[serde(rename = "o-list-item")]
    OrderedListItem,
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "embed")]
    Embed,
    #[serde(other)]
    Other,
}

/// Inline formatting over a `[start, end)` range of UTF-16 code units
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: SpanKind,
    #[serde(default)]
    pub data: Option<SpanData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink,
    Label,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SpanData {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Embed {
    #[serde(default)]
    pub embed_url: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub provider_name: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
}

/// A page of search results
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results_per_page: u32,
    #[serde(default)]
    pub total_results_size: u32,
    #[serde(default)]
    pub total_pages: u32,
    /// Cursor of the following page, `None` on the last page
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub prev_page: Option<String>,
    pub results: Vec<RawDocument>,
}

impl SearchResponse {
    pub fn from_json(body: &str) -> Result<Self, CmsError> {
        serde_json::from_str(body).map_err(|e| CmsError::decode("search response", e))
    }

    /// An empty last page
    pub fn empty() -> Self {
        Self {
            page: 1,
            results_per_page: 0,
            total_results_size: 0,
            total_pages: 0,
            next_page: None,
            prev_page: None,
            results: Vec::new(),
        }
    }
}

/// Repository metadata served at the API endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ApiInfo {
    pub refs: Vec<ApiRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRef {
    pub id: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "isMasterRef", default)]
    pub is_master_ref: bool,
}

impl ApiInfo {
    pub fn master_ref(&self) -> Option<&str> {
        self.refs
            .iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference.as_str())
    }
}

/// Parse a Prismic timestamp (`2021-03-15T19:25:28+0000` or RFC 3339)
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => parse_timestamp(&value)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid publication date `{}`", value))),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) const SEARCH_FIXTURE: &str = include_str!("fixtures/search.json");

    #[test]
    fn test_decode_search_response() {
        let response = SearchResponse::from_json(SEARCH_FIXTURE).unwrap();
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.total_pages, 2);
        assert!(response.next_page.is_some());
        assert!(response.prev_page.is_none());

        let post = &response.results[0];
        assert_eq!(post.uid, "como-utilizar-hooks");
        assert_eq!(
            post.first_publication_date,
            Some(Utc.with_ymd_and_hms(2021, 3, 15, 19, 25, 28).unwrap())
        );
        assert_eq!(post.data.content.len(), 2);
        assert_eq!(post.data.content[0].body.blocks()[0].spans.len(), 2);
        assert_eq!(
            post.data.content[0].body.blocks()[1].kind,
            BlockKind::ListItem
        );
    }

    #[test]
    fn test_decode_key_text_fields_and_nulls() {
        let response = SearchResponse::from_json(SEARCH_FIXTURE).unwrap();
        let post = &response.results[1];
        assert_eq!(
            post.data.title,
            RichField::Plain("Criando um app CRA do zero".to_string())
        );
        assert!(post.first_publication_date.is_none());
        assert!(post.data.content.is_empty());
        assert_eq!(post.data.banner.as_ref().and_then(|b| b.url.clone()), None);
    }

    #[test]
    fn test_missing_uid_is_named_error() {
        let err = RawDocument::from_json(r#"{"data": {"title": "x"}}"#).unwrap_err();
        assert!(matches!(err, CmsError::Decode { context: "document", .. }));
        assert!(err.to_string().contains("uid"));
    }

    #[test]
    fn test_malformed_date_is_named_error() {
        let err = RawDocument::from_json(
            r#"{"uid": "a", "first_publication_date": "yesterday", "data": {"title": "x"}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("invalid publication date"));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2021, 3, 15, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2021-03-15T00:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2021-03-15T00:00:00+0000"), Some(expected));
        assert_eq!(parse_timestamp("2021-03-14T21:00:00-03:00"), Some(expected));
        assert_eq!(parse_timestamp("15/03/2021"), None);
    }

    #[test]
    fn test_unknown_block_and_span_kinds() {
        let rich: RichText = serde_json::from_str(
            r#"[{"type": "callout", "text": "hi", "spans": [{"start": 0, "end": 2, "type": "underline"}]}]"#,
        )
        .unwrap();
        assert_eq!(rich.blocks()[0].kind, BlockKind::Other);
        assert_eq!(rich.blocks()[0].spans[0].kind, SpanKind::Other);
    }

    #[test]
    fn test_master_ref() {
        let info: ApiInfo = serde_json::from_str(
            r#"{"refs": [
                {"id": "preview", "ref": "Xpreview", "label": "Release"},
                {"id": "master", "ref": "YFCR6xAAACIAxxLh", "label": "Master", "isMasterRef": true}
            ]}"#,
        )
        .unwrap();
        assert_eq!(info.master_ref(), Some("YFCR6xAAACIAxxLh"));
    }
}
