//! Category extraction from page content.

use std::sync::LazyLock;

use regex::Regex;

/// Pulls category names out of page content when a submission names none.
pub trait CategoryExtractor: Send + Sync {
    fn extract(&self, content: &str) -> Vec<String>;
}

/// Matches `[[Category:Name]]` and `[[Category:Name|sort key]]`.
static CATEGORY_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[\s*[Cc]ategory\s*:\s*([^\]|]+?)\s*(?:\|[^\]]*)?\]\]").expect("valid regex")
});

/// Default extractor: collects wiki category links, deduplicated, in
/// order of first appearance.
#[derive(Debug, Clone, Copy, Default)]
pub struct WikiLinkCategories;

impl CategoryExtractor for WikiLinkCategories {
    fn extract(&self, content: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        for cap in CATEGORY_LINK.captures_iter(content) {
            let name = cap[1].trim().to_string();
            if !name.is_empty() && !found.contains(&name) {
                found.push(name);
            }
        }
        found
    }
}
