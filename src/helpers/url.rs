//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::config::SiteConfig;

/// Characters left alone in a uid path segment
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/posts/hello/") // -> "/blog/posts/hello/"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let root = config.root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Generate a full URL including the domain
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    let base = config.url.trim_end_matches('/');
    format!("{}{}", base, url_for(config, path))
}

/// Route of a post page, relative to the root
pub fn post_route(uid: &str) -> String {
    format!("posts/{}/", encode_segment(uid))
}

/// Directory holding the listing continuation pages
pub const LISTING_PAGES_DIR: &str = "page";

/// Route of the listing with its first `page` pages loaded
pub fn listing_route(page: usize) -> String {
    if page <= 1 {
        String::new()
    } else {
        format!("{}/{}/", LISTING_PAGES_DIR, page)
    }
}

/// Encode a single path segment
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.url = "https://example.com".to_string();
        config.root = "/blog/".to_string();
        config
    }

    #[test]
    fn test_url_for() {
        let config = test_config();
        assert_eq!(url_for(&config, "/posts/a/"), "/blog/posts/a/");
        assert_eq!(url_for(&config, ""), "/blog/");
    }

    #[test]
    fn test_full_url_for() {
        let config = test_config();
        assert_eq!(
            full_url_for(&config, "/posts/a/"),
            "https://example.com/blog/posts/a/"
        );
    }

    #[test]
    fn test_post_route_encodes_uid() {
        assert_eq!(post_route("como-utilizar-hooks"), "posts/como-utilizar-hooks/");
        assert_eq!(post_route("a/../b"), "posts/a%2F..%2Fb/");
    }

    #[test]
    fn test_listing_route() {
        let config = test_config();
        assert_eq!(url_for(&config, &listing_route(1)), "/blog/");
        assert_eq!(url_for(&config, &listing_route(3)), "/blog/page/3/");
    }
}
