//! Page title, slug, namespace, and content validation.
//!
//! This module lives in `core` (zero internal deps) so the store, the engine,
//! and the HTTP layer all derive slugs and reject bad input the same way.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Namespaces
// ---------------------------------------------------------------------------

pub const NAMESPACE_MAIN: &str = "main";
pub const NAMESPACE_TALK: &str = "talk";
pub const NAMESPACE_USER: &str = "user";
pub const NAMESPACE_PROJECT: &str = "project";
pub const NAMESPACE_HELP: &str = "help";
pub const NAMESPACE_CATEGORY: &str = "category";
pub const NAMESPACE_TEMPLATE: &str = "template";

/// All valid page namespaces.
pub const VALID_NAMESPACES: &[&str] = &[
    NAMESPACE_MAIN,
    NAMESPACE_TALK,
    NAMESPACE_USER,
    NAMESPACE_PROJECT,
    NAMESPACE_HELP,
    NAMESPACE_CATEGORY,
    NAMESPACE_TEMPLATE,
];

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

pub const MAX_TITLE_LEN: usize = 255;
pub const MAX_CONTENT_LEN: usize = 500_000;
pub const MAX_SUMMARY_LEN: usize = 500;
pub const MAX_TAGS: usize = 20;
pub const MAX_TAG_LEN: usize = 50;
pub const MAX_CATEGORIES: usize = 50;
pub const MAX_CATEGORY_LEN: usize = 100;
pub const MAX_DISCUSSION_LEN: usize = 10_000;

/// Content prefix written into a page converted to a redirect.
pub const REDIRECT_PREFIX: &str = "#REDIRECT";

// ---------------------------------------------------------------------------
// Slug generation
// ---------------------------------------------------------------------------

/// Generate a URL-safe slug from a page title.
///
/// Lowercases, replaces everything that is not alphanumeric with hyphens,
/// collapses consecutive hyphens, and trims leading/trailing hyphens.
pub fn generate_slug(title: &str) -> String {
    let mut result = String::with_capacity(title.len());
    let mut prev_hyphen = false;
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            result.push(c);
            prev_hyphen = false;
        } else if !prev_hyphen {
            result.push('-');
            prev_hyphen = true;
        }
    }
    result.trim_matches('-').to_string()
}

/// Content stored on a page that now redirects to `target`.
pub fn redirect_content(target: &str) -> String {
    format!("{REDIRECT_PREFIX} [[{target}]]")
}

/// The redirect target named by `content`, if it is a redirect.
pub fn parse_redirect(content: &str) -> Option<String> {
    let rest = content.trim_start().strip_prefix(REDIRECT_PREFIX)?;
    let rest = rest.trim_start().strip_prefix("[[")?;
    let end = rest.find("]]")?;
    let target = rest[..end].trim();
    if target.is_empty() {
        None
    } else {
        Some(target.to_string())
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a page title (non-empty, at most [`MAX_TITLE_LEN`] chars, no
/// control characters).
pub fn validate_title(title: &str) -> Result<(), CoreError> {
    if title.trim().is_empty() {
        return Err(CoreError::Validation("Title must not be empty".into()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(CoreError::Validation(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    if title.chars().any(char::is_control) {
        return Err(CoreError::Validation(
            "Title must not contain control characters".into(),
        ));
    }
    Ok(())
}

/// Validate a slug (non-empty, only lowercase alphanumerics and hyphens).
pub fn validate_slug(slug: &str) -> Result<(), CoreError> {
    if slug.is_empty() {
        return Err(CoreError::Validation("Slug must not be empty".into()));
    }
    if !slug
        .chars()
        .all(|c| (c.is_alphanumeric() && !c.is_uppercase()) || c == '-')
    {
        return Err(CoreError::Validation(
            "Slug must contain only lowercase alphanumeric characters and hyphens".into(),
        ));
    }
    Ok(())
}

pub fn validate_namespace(namespace: &str) -> Result<(), CoreError> {
    if !VALID_NAMESPACES.contains(&namespace) {
        return Err(CoreError::Validation(format!(
            "Invalid namespace '{}'. Valid namespaces: {}",
            namespace,
            VALID_NAMESPACES.join(", ")
        )));
    }
    Ok(())
}

pub fn validate_content(content: &str) -> Result<(), CoreError> {
    if content.trim().is_empty() {
        return Err(CoreError::Validation("Content must not be empty".into()));
    }
    if content.len() > MAX_CONTENT_LEN {
        return Err(CoreError::Validation(format!(
            "Content must be at most {MAX_CONTENT_LEN} bytes"
        )));
    }
    Ok(())
}

pub fn validate_summary(summary: &str) -> Result<(), CoreError> {
    if summary.chars().count() > MAX_SUMMARY_LEN {
        return Err(CoreError::Validation(format!(
            "Summary must be at most {MAX_SUMMARY_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate page tags (each non-empty, at most [`MAX_TAG_LEN`] chars, at most
/// [`MAX_TAGS`] tags).
pub fn validate_tags(tags: &[String]) -> Result<(), CoreError> {
    if tags.len() > MAX_TAGS {
        return Err(CoreError::Validation(format!(
            "A maximum of {MAX_TAGS} tags is allowed"
        )));
    }
    for tag in tags {
        if tag.trim().is_empty() {
            return Err(CoreError::Validation("Tags must not be empty".into()));
        }
        if tag.chars().count() > MAX_TAG_LEN {
            return Err(CoreError::Validation(format!(
                "Each tag must be at most {MAX_TAG_LEN} characters"
            )));
        }
    }
    Ok(())
}

pub fn validate_categories(categories: &[String]) -> Result<(), CoreError> {
    if categories.len() > MAX_CATEGORIES {
        return Err(CoreError::Validation(format!(
            "A maximum of {MAX_CATEGORIES} categories is allowed"
        )));
    }
    for category in categories {
        if category.trim().is_empty() || category.chars().count() > MAX_CATEGORY_LEN {
            return Err(CoreError::Validation(format!(
                "Category names must be 1-{MAX_CATEGORY_LEN} characters"
            )));
        }
    }
    Ok(())
}

pub fn validate_discussion_body(body: &str) -> Result<(), CoreError> {
    if body.trim().is_empty() {
        return Err(CoreError::Validation("Comment must not be empty".into()));
    }
    if body.chars().count() > MAX_DISCUSSION_LEN {
        return Err(CoreError::Validation(format!(
            "Comment must be at most {MAX_DISCUSSION_LEN} characters"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
