//! Revalidation ledger for generated post pages
//!
//! Records when each post page was last rendered and from which revision of
//! the document, so `generate` can skip unchanged posts and the server can
//! tell when a page has aged past the revalidation interval.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Ledger directory, relative to the site root
pub const CACHE_DIR: &str = ".spacetraveling-cache";

/// Ledger file name inside [`CACHE_DIR`]
const CACHE_FILE: &str = "db.json";

/// Last render of one post page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Unix seconds of the render
    pub generated_at: u64,
    /// Hash of the document revision that was rendered
    pub content_hash: u64,
    /// Output path relative to the public dir
    pub output_path: String,
}

/// Post uid -> last render
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheDb {
    pub version: u32,
    pub posts: HashMap<String, CacheEntry>,
}

impl CacheDb {
    /// Current ledger format version
    const VERSION: u32 = 1;

    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            ..Default::default()
        }
    }

    /// Load the ledger, or start an empty one when it is missing or unreadable
    pub fn load(base_dir: &Path) -> Self {
        let path = base_dir.join(CACHE_DIR).join(CACHE_FILE);
        let Ok(content) = fs::read_to_string(&path) else {
            return Self::new();
        };

        match serde_json::from_str::<CacheDb>(&content) {
            Ok(cache) if cache.version == Self::VERSION => cache,
            Ok(_) => {
                tracing::info!("Cache version mismatch, rebuilding cache");
                Self::new()
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable cache {:?}: {}", path, e);
                Self::new()
            }
        }
    }

    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let cache_dir = base_dir.join(CACHE_DIR);
        fs::create_dir_all(&cache_dir)?;

        let content = serde_json::to_string_pretty(self)?;
        fs::write(cache_dir.join(CACHE_FILE), content)?;
        Ok(())
    }

    /// Record a render of `uid` at `now`
    pub fn record(&mut self, uid: &str, content_hash: u64, output_path: &str, now: u64) {
        self.posts.insert(
            uid.to_string(),
            CacheEntry {
                generated_at: now,
                content_hash,
                output_path: output_path.to_string(),
            },
        );
    }

    /// Whether the page for `uid` is older than `revalidate_secs`
    ///
    /// Pages the ledger has never seen count as stale.
    pub fn is_stale(&self, uid: &str, now: u64, revalidate_secs: u64) -> bool {
        match self.posts.get(uid) {
            Some(entry) => now.saturating_sub(entry.generated_at) >= revalidate_secs,
            None => true,
        }
    }

    /// Whether the last render of `uid` came from the same document revision
    pub fn is_unchanged(&self, uid: &str, content_hash: u64) -> bool {
        self.posts
            .get(uid)
            .is_some_and(|entry| entry.content_hash == content_hash)
    }

    pub fn get(&self, uid: &str) -> Option<&CacheEntry> {
        self.posts.get(uid)
    }

    pub fn forget(&mut self, uid: &str) -> Option<CacheEntry> {
        self.posts.remove(uid)
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

/// Calculate a hash for content
pub fn hash_content(content: &str) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

/// Current time as unix seconds
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
