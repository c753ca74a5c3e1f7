//! Generate static files

use anyhow::Result;

use crate::cache::CacheDb;
use crate::generator::Generator;
use crate::Blog;

/// Generate the site, skipping posts whose page is up to date unless forced
pub async fn run(blog: &Blog, force: bool) -> Result<()> {
    let start = std::time::Instant::now();

    let mut cache = if force {
        tracing::info!("Full generation (force=true)");
        CacheDb::new()
    } else {
        CacheDb::load(&blog.base_dir)
    };

    let generator = Generator::new(blog, blog.source()?)?;
    let result = generator.generate(&mut cache, force).await;

    // Keep what was rendered before a failure
    cache.save(&blog.base_dir)?;
    let stats = result?;

    tracing::info!(
        "{} posts: {} generated, {} unchanged, {} removed",
        stats.posts,
        stats.written,
        stats.skipped,
        stats.removed
    );
    tracing::info!("Generated in {:.2}s", start.elapsed().as_secs_f64());

    Ok(())
}
