//! Search queries against the content API

use std::fmt;

/// A single query predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `[at(path, "value")]`
    At { path: String, value: String },
}

impl Predicate {
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::At {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Match every document of a custom type
    pub fn document_type(doc_type: &str) -> Self {
        Self::at("document.type", doc_type)
    }

    /// Match a document of a custom type by its uid
    pub fn uid(doc_type: &str, uid: &str) -> Self {
        Self::at(format!("my.{}.uid", doc_type), uid)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At { path, value } => {
                let value = value.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "[at({}, \"{}\")]", path, value)
            }
        }
    }
}

/// A search request: predicates plus paging and field selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub predicates: Vec<Predicate>,
    /// Fields to return, as `type.field`; empty returns every field
    pub fetch: Vec<String>,
    pub page_size: u32,
}

impl Query {
    pub fn new(predicate: Predicate) -> Self {
        Self {
            predicates: vec![predicate],
            fetch: Vec::new(),
            page_size: 20,
        }
    }

    #[must_use]
    pub fn fetch<I, S>(mut self, doc_type: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.fetch = fields
            .into_iter()
            .map(|field| format!("{}.{}", doc_type, field.as_ref()))
            .collect();
        self
    }

    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, 100);
        self
    }

    /// The `q` parameter value
    pub fn q(&self) -> String {
        let predicates: String = self.predicates.iter().map(|p| p.to_string()).collect();
        format!("[{}]", predicates)
    }

    /// Query-string pairs, without `ref` and `access_token`
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("q", self.q()), ("pageSize", self.page_size.to_string())];
        if !self.fetch.is_empty() {
            params.push(("fetch", self.fetch.join(",")));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_type_query() {
        let query = Query::new(Predicate::document_type("posts"))
            .fetch("posts", ["title", "subtitle"])
            .page_size(20);
        assert_eq!(query.q(), r#"[[at(document.type, "posts")]]"#);
        assert_eq!(
            query.params(),
            vec![
                ("q", r#"[[at(document.type, "posts")]]"#.to_string()),
                ("pageSize", "20".to_string()),
                ("fetch", "posts.title,posts.subtitle".to_string()),
            ]
        );
    }

    #[test]
    fn test_uid_predicate_escapes_quotes() {
        let predicate = Predicate::uid("posts", "a\"b");
        assert_eq!(predicate.to_string(), r#"[at(my.posts.uid, "a\"b")]"#);
    }

    #[test]
    fn test_page_size_is_clamped() {
        assert_eq!(Query::new(Predicate::document_type("posts")).page_size(500).page_size, 100);
        assert_eq!(Query::new(Predicate::document_type("posts")).page_size(0).page_size, 1);
    }
}
