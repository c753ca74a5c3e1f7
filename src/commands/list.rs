//! List site content

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::content::{PaginationState, Paginator, PostSummary};
use crate::generator::Generator;
use crate::Blog;

/// List site content by type
pub async fn run(blog: &Blog, content_type: &str, all: bool) -> Result<()> {
    match content_type {
        "post" | "posts" => {
            let generator = Generator::new(blog, blog.source()?)?;
            let response = generator
                .source()
                .query(&generator.listing_query())
                .await
                .context("Failed to fetch the post listing")?;
            let paginator = Paginator::new(PaginationState::from_response(
                &response,
                generator.listing_dates(),
            ));

            if all {
                paginator
                    .load_all(generator.source(), generator.listing_dates())
                    .await?;
            }

            let state = paginator.into_state();
            println!("Posts ({}):", state.len());
            for post in state.posts() {
                println!("  {}", format_post(post));
            }
            if state.has_more() {
                println!("  ... more available (use --all)");
            }
        }
        "route" | "routes" => {
            let routes = list_routes(blog);
            println!("Routes ({}):", routes.len());
            for route in routes {
                println!("  {}", route);
            }
        }
        _ => {
            anyhow::bail!("Unknown type: {}. Available: post, route", content_type);
        }
    }

    Ok(())
}

fn format_post(post: &PostSummary) -> String {
    match &post.publication_date {
        Some(date) => format!("{} - {} [{}]", date, post.title, post.uid),
        None => format!("{} [{}]", post.title, post.uid),
    }
}

/// Generated files, relative to the public dir, sorted
fn list_routes(blog: &Blog) -> Vec<String> {
    let mut routes: Vec<String> = WalkDir::new(&blog.public_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            e.path()
                .strip_prefix(&blog.public_dir)
                .ok()
                .map(|p| p.to_string_lossy().replace('\\', "/"))
        })
        .collect();
    routes.sort();
    routes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_list_routes() {
        let dir = TempDir::new().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        fs::create_dir_all(blog.public_dir.join("posts/hooks")).unwrap();
        fs::write(blog.public_dir.join("posts/hooks/index.html"), "").unwrap();
        fs::write(blog.public_dir.join("index.html"), "").unwrap();

        assert_eq!(
            list_routes(&blog),
            vec!["index.html".to_string(), "posts/hooks/index.html".to_string()]
        );
    }

    #[test]
    fn test_format_post() {
        let mut post = PostSummary {
            uid: "hooks".to_string(),
            title: "Como utilizar Hooks".to_string(),
            subtitle: String::new(),
            author: String::new(),
            publication_date: Some("15 Mar 2021".to_string()),
        };
        assert_eq!(format_post(&post), "15 Mar 2021 - Como utilizar Hooks [hooks]");
        post.publication_date = None;
        assert_eq!(format_post(&post), "Como utilizar Hooks [hooks]");
    }

    #[tokio::test]
    async fn test_unknown_type() {
        let dir = TempDir::new().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        assert!(run(&blog, "tags", false).await.is_err());
    }
}
