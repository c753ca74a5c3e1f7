//! Generator module - renders the listing and post pages from the CMS

use anyhow::{bail, Context as _, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tera::Context;

use crate::cache::{hash_content, unix_now, CacheDb};
use crate::cms::{ContentSource, Predicate, Query, RawDocument};
use crate::content::{to_post_detail, LoadOutcome, PaginationState, Paginator, PostDetail};
use crate::helpers::{
    full_url_for, listing_route, meta_generator, open_graph, post_route, DateStyle,
    LISTING_PAGES_DIR,
};
use crate::i18n::I18n;
use crate::templates::{ConfigData, ListingData, TemplateRenderer};
use crate::Blog;

/// Fields the listing needs from each post
const LISTING_FIELDS: [&str; 4] = ["title", "subtitle", "author", "banner"];

/// A post page that was written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPost {
    pub uid: String,
    /// Output path relative to the public dir
    pub output_path: String,
    pub revision: u64,
}

impl RenderedPost {
    /// Note this render in the revalidation ledger
    pub fn record(&self, cache: &mut CacheDb, now: u64) {
        cache.record(&self.uid, self.revision, &self.output_path, now);
    }
}

/// Counts reported by a full generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateStats {
    pub posts: usize,
    pub written: usize,
    pub skipped: usize,
    pub removed: usize,
}

/// Static page generator over a content source
pub struct Generator {
    blog: Blog,
    source: Arc<dyn ContentSource>,
    renderer: TemplateRenderer,
    i18n: I18n,
    listing_dates: DateStyle,
    post_dates: DateStyle,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog, source: Arc<dyn ContentSource>) -> Result<Self> {
        let renderer = TemplateRenderer::new()?;

        let mut i18n = I18n::new(&blog.config.language);
        i18n.load_languages(blog.base_dir.join(&blog.config.i18n_dir))?;

        Ok(Self {
            listing_dates: DateStyle::listing(&blog.config),
            post_dates: DateStyle::post(&blog.config),
            blog: blog.clone(),
            source,
            renderer,
            i18n,
        })
    }

    pub fn source(&self) -> &dyn ContentSource {
        self.source.as_ref()
    }

    pub fn listing_dates(&self) -> &DateStyle {
        &self.listing_dates
    }

    /// Generate the listing and every post page
    pub async fn generate(&self, cache: &mut CacheDb, force: bool) -> Result<GenerateStats> {
        fs::create_dir_all(&self.blog.public_dir)?;

        self.generate_not_found()?;
        let listing = self.generate_listing().await?;
        tracing::info!(
            "Listing: {} posts on {} pages",
            listing.len(),
            listing.pages()
        );

        let posts = self.enumerate_posts().await?;
        let mut stats = GenerateStats {
            posts: posts.len(),
            ..Default::default()
        };

        for doc in &posts {
            let revision = revision_hash(doc);
            if !force
                && cache.is_unchanged(&doc.uid, revision)
                && self.post_path(&doc.uid).is_file()
            {
                tracing::debug!("Unchanged: {}", doc.uid);
                stats.skipped += 1;
                continue;
            }

            match self.generate_post(&doc.uid).await? {
                Some(rendered) => {
                    rendered.record(cache, unix_now());
                    stats.written += 1;
                }
                None => tracing::warn!("Post {} disappeared while generating", doc.uid),
            }
        }

        let live: HashSet<&str> = posts.iter().map(|doc| doc.uid.as_str()).collect();
        let gone: Vec<String> = cache
            .posts
            .keys()
            .filter(|uid| !live.contains(uid.as_str()))
            .cloned()
            .collect();
        for uid in gone {
            self.remove_post(&uid, cache)?;
            stats.removed += 1;
        }

        Ok(stats)
    }

    /// The first listing page query
    pub fn listing_query(&self) -> Query {
        let cms = &self.blog.config.cms;
        Query::new(Predicate::document_type(&cms.document_type))
            .fetch(&cms.document_type, LISTING_FIELDS)
            .page_size(cms.page_size)
    }

    /// Write `index.html` and a continuation page for every further listing page
    ///
    /// `page/{n}/index.html` lists all posts of pages 1 to n, so following a
    /// "load more" link extends the list the reader already has.
    pub async fn generate_listing(&self) -> Result<PaginationState> {
        let paginator = Paginator::new(self.first_listing_page().await?);
        self.write_page("", &self.render_index(&paginator.snapshot().await)?)?;

        let pages_dir = self.blog.public_dir.join(LISTING_PAGES_DIR);
        if pages_dir.is_dir() {
            fs::remove_dir_all(&pages_dir)?;
        }

        while let LoadOutcome::Appended(_) = paginator
            .load_next_page(self.source.as_ref(), &self.listing_dates)
            .await
            .context("Failed to fetch the next listing page")?
        {
            let state = paginator.snapshot().await;
            self.write_page(&listing_route(state.pages()), &self.render_index(&state)?)?;
        }

        Ok(paginator.into_state())
    }

    /// Listing page `page` from live data, replaying the pages before it
    ///
    /// `None` when the listing has fewer pages.
    pub async fn render_listing(&self, page: usize) -> Result<Option<String>> {
        if page == 0 {
            return Ok(None);
        }

        let paginator = Paginator::new(self.first_listing_page().await?);
        for _ in 1..page {
            let outcome = paginator
                .load_next_page(self.source.as_ref(), &self.listing_dates)
                .await?;
            if !matches!(outcome, LoadOutcome::Appended(_)) {
                return Ok(None);
            }
        }

        self.render_index(&paginator.into_state()).map(Some)
    }

    async fn first_listing_page(&self) -> Result<PaginationState> {
        let response = self
            .source
            .query(&self.listing_query())
            .await
            .context("Failed to fetch the post listing")?;
        Ok(PaginationState::from_response(&response, &self.listing_dates))
    }

    /// Write `404.html`, served for paths outside the generated tree
    pub fn generate_not_found(&self) -> Result<PathBuf> {
        let path = self.blog.public_dir.join("404.html");
        write_file(&path, &self.render_not_found()?)?;
        Ok(path)
    }

    /// All posts in the repository, following every cursor
    ///
    /// Only titles are fetched; pages are rendered from `get_by_uid`.
    pub async fn enumerate_posts(&self) -> Result<Vec<RawDocument>> {
        let cms = &self.blog.config.cms;
        let query = Query::new(Predicate::document_type(&cms.document_type))
            .fetch(&cms.document_type, ["title"])
            .page_size(cms.paths_page_size);

        let mut response = self
            .source
            .query(&query)
            .await
            .context("Failed to enumerate posts")?;
        let mut posts = std::mem::take(&mut response.results);

        while let Some(cursor) = response.next_page.take() {
            response = self
                .source
                .fetch_page(&cursor)
                .await
                .with_context(|| format!("Failed to fetch {}", cursor))?;
            posts.append(&mut response.results);
        }

        tracing::debug!("Enumerated {} posts", posts.len());
        Ok(posts)
    }

    /// Fetch one post and write its page; `None` when the CMS has no such post
    pub async fn generate_post(&self, uid: &str) -> Result<Option<RenderedPost>> {
        let doc = self
            .source
            .get_by_uid(&self.blog.config.cms.document_type, uid)
            .await
            .with_context(|| format!("Failed to fetch post {}", uid))?;

        match doc {
            Some(doc) => self.write_post(&doc).map(Some),
            None => Ok(None),
        }
    }

    /// Render a fetched post to `posts/{uid}/index.html`
    pub fn write_post(&self, doc: &RawDocument) -> Result<RenderedPost> {
        if matches!(doc.uid.as_str(), "" | "." | "..") {
            bail!("Refusing to write post with uid {:?}", doc.uid);
        }

        let detail = to_post_detail(doc, &self.post_dates);
        let html = self.render_post(&detail)?;
        let route = post_route(&doc.uid);
        self.write_page(&route, &html)?;

        Ok(RenderedPost {
            uid: doc.uid.clone(),
            output_path: format!("{}index.html", route),
            revision: revision_hash(doc),
        })
    }

    /// Delete a post page and its ledger entry
    pub fn remove_post(&self, uid: &str, cache: &mut CacheDb) -> Result<()> {
        if let Some(entry) = cache.forget(uid) {
            let path = self.blog.public_dir.join(&entry.output_path);
            if path.is_file() {
                fs::remove_file(&path)?;
                if let Some(dir) = path.parent() {
                    let _ = fs::remove_dir(dir);
                }
            }
            tracing::info!("Removed: {}", uid);
        }
        Ok(())
    }

    /// Absolute path of a post's page
    pub fn post_path(&self, uid: &str) -> PathBuf {
        self.blog
            .public_dir
            .join(post_route(uid))
            .join("index.html")
    }

    pub fn render_index(&self, state: &PaginationState) -> Result<String> {
        let mut context = self.create_base_context();
        context.insert("head", &meta_generator());
        context.insert("listing", &ListingData::new(&self.blog.config, state));
        self.renderer.render("index.html", &context)
    }

    pub fn render_post(&self, detail: &PostDetail) -> Result<String> {
        let config = &self.blog.config;
        let og = open_graph(
            &detail.title,
            &detail.subtitle,
            &full_url_for(config, &post_route(&detail.uid)),
            detail.banner_url.as_deref(),
            &config.title,
        );

        let mut context = self.create_base_context();
        context.insert("head", &format!("{}\n{}", meta_generator(), og));
        context.insert("post", detail);
        context.insert(
            "reading_time",
            &self
                .i18n
                .get_count("reading_time", detail.reading_time_minutes),
        );
        if let Some(edited) = &detail.last_publication_date {
            context.insert("edited", &self.i18n.get("last_edited").replace("%s", edited));
        }

        self.renderer.render("post.html", &context)
    }

    pub fn render_not_found(&self) -> Result<String> {
        let mut context = self.create_base_context();
        context.insert("head", &meta_generator());
        self.renderer.render("not_found.html", &context)
    }

    /// Error page, with a retry link when the failed action can be repeated
    pub fn render_error(&self, retry_url: Option<&str>) -> Result<String> {
        let mut context = self.create_base_context();
        context.insert("head", &meta_generator());
        if let Some(url) = retry_url {
            context.insert("retry_url", url);
        }
        self.renderer.render("error.html", &context)
    }

    fn create_base_context(&self) -> Context {
        let mut context = Context::new();
        context.insert("config", &ConfigData::from(&self.blog.config));
        context.insert("t", &self.i18n.get_all_translations());
        context
    }

    /// Write `html` as the index of `route` under the public dir
    fn write_page(&self, route: &str, html: &str) -> Result<PathBuf> {
        let output_path = self.blog.public_dir.join(route).join("index.html");
        write_file(&output_path, html)?;
        tracing::debug!("Generated: {:?}", output_path);
        Ok(output_path)
    }
}

/// Identity of a document revision
fn revision_hash(doc: &RawDocument) -> u64 {
    let revision = doc
        .last_publication_date
        .or(doc.first_publication_date)
        .map(|date| date.to_rfc3339())
        .unwrap_or_default();
    hash_content(&format!("{}@{}", doc.id, revision))
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))
}
