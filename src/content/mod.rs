//! Content module - turns CMS documents into what the pages show

mod detail;
mod pagination;
mod rich_text;
mod sanitize;
mod summary;

pub use detail::{
    count_words, reading_time_minutes, to_post_detail, PostDetail, Section, WORDS_PER_MINUTE,
};
pub use pagination::{LoadOutcome, PaginationState, Paginator};
pub use rich_text::{as_html, as_text, field_text, optional_text};
pub use sanitize::{is_http_url, sanitize_html};
pub use summary::{to_post_summary, PostSummary};
