//! Interface strings for the built-in templates
//!
//! English and Brazilian Portuguese tables are compiled in. A site can
//! override or add keys with `languages/<lang>.yml` files.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

type Table = HashMap<String, serde_yaml::Value>;

const BUILTIN: [(&str, &str); 2] = [
    ("en", include_str!("languages/en.yml")),
    ("pt-BR", include_str!("languages/pt-BR.yml")),
];

/// Translation lookup with English fallback
#[derive(Debug, Clone)]
pub struct I18n {
    language: String,
    /// lang -> key -> translation
    translations: HashMap<String, Table>,
}

impl I18n {
    /// Create a handler for `language` with the built-in tables loaded
    pub fn new(language: &str) -> Self {
        let mut i18n = Self {
            language: language.to_string(),
            translations: HashMap::new(),
        };

        for (lang, source) in BUILTIN {
            match serde_yaml::from_str::<Table>(source) {
                Ok(table) => i18n.merge(lang, table),
                Err(e) => tracing::warn!("Built-in language table {} is invalid: {}", lang, e),
            }
        }

        i18n
    }

    /// Merge `*.yml` files from a directory over the built-in tables
    pub fn load_languages<P: AsRef<Path>>(&mut self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {:?}", dir))? {
            let path = entry?.path();
            let ext = path.extension().and_then(|e| e.to_str());
            if !path.is_file() || !matches!(ext, Some("yml") | Some("yaml")) {
                continue;
            }
            let Some(lang) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let content = fs::read_to_string(&path)?;
            match serde_yaml::from_str::<Table>(&content) {
                Ok(table) => {
                    self.merge(lang, table);
                    tracing::debug!("Loaded language file: {:?}", path);
                }
                Err(e) => tracing::warn!("Failed to parse language file {:?}: {}", path, e),
            }
        }

        Ok(())
    }

    fn merge(&mut self, lang: &str, table: Table) {
        self.translations
            .entry(lang.to_string())
            .or_default()
            .extend(table);
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Translation of a dotted key like `not_found.title`
    pub fn get(&self, key: &str) -> String {
        self.get_for_lang(&self.language, key)
    }

    /// Translation for a specific language, falling back to English, then to the key
    pub fn get_for_lang(&self, lang: &str, key: &str) -> String {
        let lookup = |lang: &str| {
            self.translations
                .get(lang)
                .and_then(|table| get_nested_value(table, key))
                .map(yaml_value_to_string)
        };

        lookup(lang)
            .or_else(|| lookup("en"))
            .unwrap_or_else(|| key.to_string())
    }

    /// Translation with `%d` replaced by `count`
    pub fn get_count(&self, key: &str, count: u32) -> String {
        self.get(key).replace("%d", &count.to_string())
    }

    pub fn has(&self, key: &str) -> bool {
        self.translations
            .get(&self.language)
            .and_then(|table| get_nested_value(table, key))
            .is_some()
    }

    /// All keys for the current language, flattened with dot notation
    pub fn get_all_translations(&self) -> HashMap<String, String> {
        let mut result = HashMap::new();
        if let Some(table) = self.translations.get(&self.language) {
            flatten_translations(table, "", &mut result);
        }

        if self.language != "en" {
            if let Some(table) = self.translations.get("en") {
                let mut fallback = HashMap::new();
                flatten_translations(table, "", &mut fallback);
                for (k, v) in fallback {
                    result.entry(k).or_insert(v);
                }
            }
        }

        result
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::new("en")
    }
}

fn get_nested_value<'a>(table: &'a Table, key: &str) -> Option<&'a serde_yaml::Value> {
    let mut parts = key.split('.');
    let mut current = table.get(parts.next()?);

    for part in parts {
        match current {
            Some(serde_yaml::Value::Mapping(map)) => current = map.get(part),
            _ => return None,
        }
    }

    current
}

fn yaml_value_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        _ => format!("{:?}", value),
    }
}

fn flatten_translations(table: &Table, prefix: &str, result: &mut HashMap<String, String>) {
    for (key, value) in table {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            serde_yaml::Value::Mapping(map) => {
                let nested: Table = map
                    .iter()
                    .filter_map(|(k, v)| Some((k.as_str()?.to_string(), v.clone())))
                    .collect();
                flatten_translations(&nested, &full_key, result);
            }
            serde_yaml::Value::Sequence(_) | serde_yaml::Value::Tagged(_) => {}
            scalar => {
                result.insert(full_key, yaml_value_to_string(scalar));
            }
        }
    }
}
