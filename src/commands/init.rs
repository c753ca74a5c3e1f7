//! Initialize a new blog

use anyhow::{bail, Result};
use std::fs;
use std::path::Path;

use crate::Blog;

/// Default `_config.yml` written by `init`
const DEFAULT_CONFIG: &str = r#"# spacetraveling configuration

# Site
title: spacetraveling
description: ''
language: pt-BR
# IANA name, e.g. America/Sao_Paulo; empty means UTC
timezone: ''

# URL
url: http://localhost:4000
root: /

# Directory
public_dir: public
i18n_dir: languages

# Dates (Moment.js-style patterns; locales: en, pt-BR)
listing_date_format: D MMM YYYY
listing_date_locale: en
post_date_format: DD MMM YYYY
post_date_locale: pt-BR

# Seconds before the server renders a post page again
revalidate_secs: 86400

# Content source; PRISMIC_API_ENDPOINT and PRISMIC_ACCESS_TOKEN override these
cms:
  endpoint: https://spacetraveling.cdn.prismic.io/api/v2
  access_token:
  document_type: posts
  page_size: 20
  paths_page_size: 100
  timeout_secs: 30
"#;

/// Initialize a new blog in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        bail!("{:?} already exists", config_path);
    }

    fs::create_dir_all(target_dir.join("languages"))?;
    fs::write(&config_path, DEFAULT_CONFIG)?;
    fs::write(target_dir.join(".gitignore"), "public/\n.spacetraveling-cache/\n")?;

    Ok(())
}

/// Run the init command with an existing blog
pub fn run(blog: &Blog) -> Result<()> {
    init_site(&blog.base_dir)
}
