//! Built-in templates using the Tera template engine
//!
//! The listing, post, and error pages are embedded directly in the binary.
//! Autoescaping stays on: the only raw HTML a template prints is section
//! bodies, which have been sanitized.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::{PaginationState, PostSummary};
use crate::helpers::{listing_route, post_route, url_for};

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("spacetraveling/layout.html")),
            ("index.html", include_str!("spacetraveling/index.html")),
            ("post.html", include_str!("spacetraveling/post.html")),
            ("not_found.html", include_str!("spacetraveling/not_found.html")),
            ("error.html", include_str!("spacetraveling/error.html")),
            (
                "partials/header.html",
                include_str!("spacetraveling/partials/header.html"),
            ),
            (
                "partials/post_list.html",
                include_str!("spacetraveling/partials/post_list.html"),
            ),
        ])?;

        tera.register_filter("truncate_chars", truncate_chars_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "...".to_string(),
    };

    if s.chars().count() <= length {
        Ok(tera::Value::String(s))
    } else {
        let truncated: String = s.chars().take(length).collect();
        Ok(tera::Value::String(format!(
            "{}{}",
            truncated.trim_end(),
            omission
        )))
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct ConfigData {
    pub title: String,
    pub description: String,
    pub url: String,
    pub root: String,
    pub language: String,
}

impl From<&SiteConfig> for ConfigData {
    fn from(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            url: config.url.clone(),
            root: config.root.clone(),
            language: config.language.clone(),
        }
    }
}

/// A listing entry with its link
#[derive(Debug, Clone, Serialize)]
pub struct PostLink<'a> {
    #[serde(flatten)]
    pub summary: &'a PostSummary,
    pub path: String,
}

/// The listing as the index template sees it
#[derive(Debug, Clone, Serialize)]
pub struct ListingData<'a> {
    pub posts: Vec<PostLink<'a>>,
    pub has_more: bool,
    /// Link that loads the next page; absent when there is none
    pub more_url: Option<String>,
}

impl<'a> ListingData<'a> {
    pub fn new(config: &SiteConfig, state: &'a PaginationState) -> Self {
        Self {
            posts: state
                .posts()
                .iter()
                .map(|summary| PostLink {
                    summary,
                    path: url_for(config, &post_route(&summary.uid)),
                })
                .collect(),
            has_more: state.has_more(),
            more_url: state
                .has_more()
                .then(|| url_for(config, &listing_route(state.pages() + 1))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_context() -> Context {
        let config = SiteConfig::default();
        let mut context = Context::new();
        context.insert("config", &ConfigData::from(&config));
        context.insert("t", &crate::i18n::I18n::new("pt-BR").get_all_translations());
        context.insert("head", "");
        context
    }

    fn summary(uid: &str, date: Option<&str>) -> PostSummary {
        PostSummary {
            uid: uid.to_string(),
            title: format!("<{}>", uid),
            subtitle: "sub".to_string(),
            author: "Ana".to_string(),
            publication_date: date.map(str::to_string),
        }
    }

    #[test]
    fn test_empty_listing_has_no_load_more() {
        let renderer = TemplateRenderer::new().unwrap();
        let config = SiteConfig::default();
        let state = PaginationState::default();

        let mut context = base_context();
        context.insert("listing", &ListingData::new(&config, &state));
        let html = renderer.render("index.html", &context).unwrap();

        assert!(!html.contains(r#"class="load-more""#));
        assert!(!html.contains("Carregar mais posts"));
        assert!(html.contains("Nenhum post por aqui."));
    }

    #[test]
    fn test_listing_links_dates_and_load_more() {
        let renderer = TemplateRenderer::new().unwrap();
        let config = SiteConfig::default();
        let state = PaginationState::new(
            vec![summary("hooks", Some("15 Mar 2021")), summary("cra", None)],
            Some("https://spacetraveling.cdn.prismic.io/api/v2/documents/search?page=2".to_string()),
        );

        let mut context = base_context();
        context.insert("listing", &ListingData::new(&config, &state));
        let html = renderer.render("index.html", &context).unwrap();

        assert!(html.contains(r#"href="/posts/hooks/""#));
        assert!(html.contains("&lt;hooks&gt;"));
        assert_eq!(html.matches("<time>").count(), 1);
        assert!(html.contains("15 Mar 2021"));
        assert!(html.contains(r#"<a class="load-more" href="/page/2/">"#));
        assert!(!html.contains("prismic.io"));
        assert!(html.contains("Carregar mais posts"));
    }

    #[test]
    fn test_truncate_chars() {
        let mut args = HashMap::new();
        args.insert("length".to_string(), tera::Value::from(5));
        let value = truncate_chars_filter(&tera::Value::from("hello world"), &args).unwrap();
        assert_eq!(value, tera::Value::from("hello..."));

        let value = truncate_chars_filter(&tera::Value::from("hi"), &args).unwrap();
        assert_eq!(value, tera::Value::from("hi"));
    }
}
