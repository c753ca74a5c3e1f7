//! Structured text rendering
//!
//! Converts Prismic rich text into plain text (for titles, word counts) and
//! into HTML (for post bodies). The HTML is not trusted output: it goes
//! through [`sanitize_html`](super::sanitize_html) before reaching a page.

use crate::cms::{BlockKind, Embed, RichField, RichText, RichTextBlock, Span, SpanKind};
use crate::helpers::html_escape;

/// Plain text of all blocks, joined with a single space
pub fn as_text(rich: &RichText) -> String {
    rich.blocks()
        .iter()
        .map(|block| block.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Plain text of a key-text or rich-text field
pub fn field_text(field: &RichField) -> String {
    match field {
        RichField::Plain(text) => text.clone(),
        RichField::Rich(rich) => as_text(rich),
    }
}

/// Plain text of an optional field, empty when absent
pub fn optional_text(field: Option<&RichField>) -> String {
    field.map(field_text).unwrap_or_default()
}

/// Render structured text to HTML
pub fn as_html(rich: &RichText) -> String {
    let mut html = String::new();
    let mut open_list: Option<BlockKind> = None;

    for block in rich.blocks() {
        let list = match block.kind {
            BlockKind::ListItem | BlockKind::OrderedListItem => Some(block.kind),
            _ => None,
        };

        if open_list != list {
            if let Some(kind) = open_list {
                html.push_str(list_tag(kind, true));
            }
            if let Some(kind) = list {
                html.push_str(list_tag(kind, false));
            }
            open_list = list;
        }

        html.push_str(&render_block(block));
    }

    if let Some(kind) = open_list {
        html.push_str(list_tag(kind, true));
    }

    html
}

fn list_tag(kind: BlockKind, closing: bool) -> &'static str {
    match (kind, closing) {
        (BlockKind::OrderedListItem, false) => "<ol>",
        (BlockKind::OrderedListItem, true) => "</ol>",
        (_, false) => "<ul>",
        (_, true) => "</ul>",
    }
}

fn render_block(block: &RichTextBlock) -> String {
    let wrap = |tag: &str| format!("<{0}>{1}</{0}>", tag, render_spans(&block.text, &block.spans));

    match block.kind {
        BlockKind::Heading1 => wrap("h1"),
        BlockKind::Heading2 => wrap("h2"),
        BlockKind::Heading3 => wrap("h3"),
        BlockKind::Heading4 => wrap("h4"),
        BlockKind::Heading5 => wrap("h5"),
        BlockKind::Heading6 => wrap("h6"),
        BlockKind::Preformatted => wrap("pre"),
        BlockKind::ListItem | BlockKind::OrderedListItem => wrap("li"),
        BlockKind::Paragraph | BlockKind::Other => wrap("p"),
        BlockKind::Image => match &block.url {
            Some(url) => format!(
                r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
                html_escape(url),
                html_escape(block.alt.as_deref().unwrap_or(""))
            ),
            None => String::new(),
        },
        BlockKind::Embed => match &block.oembed {
            Some(embed) => render_embed(embed),
            None => String::new(),
        },
    }
}

/// Provider markup inside the oEmbed wrapper
///
/// Players are iframes, which never survive sanitizing, so those embeds also
/// carry a plain link to the embedded page.
fn render_embed(embed: &Embed) -> String {
    let url = embed.embed_url.as_deref().unwrap_or("");
    let provider = embed.provider_name.as_deref().unwrap_or("");
    let html = embed.html.as_deref().unwrap_or("");

    let needs_link = html.trim().is_empty() || html.to_ascii_lowercase().contains("<iframe");
    let link = if needs_link && !url.is_empty() {
        let label = if provider.is_empty() { url } else { provider };
        format!(r#"<a href="{}">{}</a>"#, html_escape(url), html_escape(label))
    } else {
        String::new()
    };

    format!(
        r#"<div data-oembed="{}" data-oembed-type="{}" data-oembed-provider="{}">{}{}</div>"#,
        html_escape(url),
        html_escape(embed.kind.as_deref().unwrap_or("")),
        html_escape(provider),
        html,
        link
    )
}

/// Apply inline spans to a block's text
///
/// Spans nest by position; when two spans overlap without nesting, the inner
/// ones are closed and reopened around the boundary.
fn render_spans(text: &str, spans: &[Span]) -> String {
    let mut spans: Vec<&Span> = spans.iter().filter(|s| s.start < s.end).collect();
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut out = String::with_capacity(text.len());
    let mut stack: Vec<&Span> = Vec::new();
    let mut next = 0;
    let mut offset = 0;

    for c in text.chars() {
        close_spans(&mut out, &mut stack, offset);
        while next < spans.len() && spans[next].start <= offset {
            out.push_str(&open_tag(spans[next]));
            stack.push(spans[next]);
            next += 1;
        }

        match c {
            '\n' => out.push_str("<br />"),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
        // Prismic offsets count UTF-16 code units
        offset += c.len_utf16();
    }

    close_spans(&mut out, &mut stack, usize::MAX);
    out
}

fn close_spans<'a>(out: &mut String, stack: &mut Vec<&'a Span>, offset: usize) {
    let Some(first) = stack.iter().position(|s| s.end <= offset) else {
        return;
    };

    let popped: Vec<&'a Span> = stack.drain(first..).collect();
    for span in popped.iter().rev() {
        out.push_str(close_tag(span));
    }
    for span in popped {
        if span.end > offset {
            out.push_str(&open_tag(span));
            stack.push(span);
        }
    }
}

fn open_tag(span: &Span) -> String {
    let data = span.data.as_ref();
    match span.kind {
        SpanKind::Strong => "<strong>".to_string(),
        SpanKind::Em => "<em>".to_string(),
        SpanKind::Hyperlink => match data.and_then(|d| d.url.as_deref()) {
            Some(url) => {
                let target = match data.and_then(|d| d.target.as_deref()) {
                    Some(target) => format!(r#" target="{}" rel="noopener""#, html_escape(target)),
                    None => String::new(),
                };
                format!(r#"<a href="{}"{}>"#, html_escape(url), target)
            }
            None => "<span>".to_string(),
        },
        SpanKind::Label => match data.and_then(|d| d.label.as_deref()) {
            Some(label) => format!(r#"<span class="{}">"#, html_escape(label)),
            None => "<span>".to_string(),
        },
        SpanKind::Other => "<span>".to_string(),
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind {
        SpanKind::Strong => "</strong>",
        SpanKind::Em => "</em>",
        SpanKind::Hyperlink if span.data.as_ref().and_then(|d| d.url.as_ref()).is_some() => "</a>",
        _ => "</span>",
    }
}
