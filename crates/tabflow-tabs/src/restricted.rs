//! Restricted URL policy
//!
//! Browser-internal and extension-internal pages cannot be inspected or
//! navigated by the extension. Empty and unparseable URLs are treated the
//! same way.

use std::collections::BTreeSet;

use url::Url;

pub const DEFAULT_RESTRICTED_SCHEMES: &[&str] = &[
    "chrome",
    "edge",
    "chrome-extension",
    "about",
    "devtools",
    "view-source",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictedUrls {
    schemes: BTreeSet<String>,
}

impl RestrictedUrls {
    pub fn new<I, S>(schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            schemes: schemes
                .into_iter()
                .map(|s| s.as_ref().trim_end_matches(':').to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn is_restricted(&self, url: &str) -> bool {
        let url = url.trim();
        if url.is_empty() {
            return true;
        }

        match Url::parse(url) {
            Ok(parsed) => self.schemes.contains(parsed.scheme()),
            Err(_) => true,
        }
    }

    pub fn schemes(&self) -> impl Iterator<Item = &str> {
        self.schemes.iter().map(String::as_str)
    }
}

impl Default for RestrictedUrls {
    fn default() -> Self {
        Self::new(DEFAULT_RESTRICTED_SCHEMES)
    }
}
