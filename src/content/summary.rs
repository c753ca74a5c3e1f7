//! Listing view model

use serde::Serialize;

use super::rich_text::{field_text, optional_text};
use crate::cms::RawDocument;
use crate::helpers::DateStyle;

/// What the post listing shows for one post
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostSummary {
    pub uid: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    /// Formatted first publication date; `None` hides the date line
    pub publication_date: Option<String>,
}

/// Map a raw document to its listing entry
pub fn to_post_summary(doc: &RawDocument, dates: &DateStyle) -> PostSummary {
    PostSummary {
        uid: doc.uid.clone(),
        title: field_text(&doc.data.title),
        subtitle: optional_text(doc.data.subtitle.as_ref()),
        author: optional_text(doc.data.author.as_ref()),
        publication_date: doc.first_publication_date.as_ref().map(|d| dates.format(d)),
    }
}
