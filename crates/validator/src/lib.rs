// Structural contract for generated site content, plus advisory checks on
// the content itself

pub mod schema;
pub mod validate;

pub use schema::{REQUIRED_FIELDS, SchemaType, site_content_schema};
pub use validate::parse_generation_result;

use launchkit_core::SiteContent;

pub struct ValidationReport {
    /// Violations of the structural contract
    pub errors: Vec<String>,
    /// Advisory content-quality findings; never block storage or rendering
    pub warnings: Vec<String>,
    pub info: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Review an already-typed SiteContent.
///
/// Errors cover the required fields (`title`, `slug`, `html`, `css` must be
/// non-empty). Warnings cover the advisory instructions given to the
/// generative backend: external script dependencies other than the utility
/// CSS runtime, missing alt text, missing description.
pub fn validate_content(content: &SiteContent, allowed_runtime: &str) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut info = Vec::new();

    for (name, value) in [
        ("title", &content.title),
        ("slug", &content.slug),
        ("html", &content.html),
        ("css", &content.css),
    ] {
        if value.trim().is_empty() {
            errors.push(format!("'{}' is empty", name));
        }
    }

    for src in external_script_sources(&content.html) {
        if src != allowed_runtime {
            warnings.push(format!("External script dependency: {}", src));
        }
    }

    for (i, asset) in content.assets.iter().enumerate() {
        if asset.alt_text.trim().is_empty() {
            warnings.push(format!("Asset {} ({}) has no alt text", i, asset.path));
        }
    }

    if content.description.trim().is_empty() && content.seo.meta_description.is_none() {
        warnings.push("No description or meta description".to_string());
    }

    info.push(format!(
        "Styling: {}",
        if content.tailwind_enabled {
            "Tailwind CSS"
        } else {
            "Custom CSS"
        }
    ));
    info.push(format!("Assets: {}", content.assets.len()));
    if !content.scripts.trim().is_empty() {
        info.push(format!("Inline script: {} bytes", content.scripts.len()));
    }

    ValidationReport {
        errors,
        warnings,
        info,
    }
}

/// `src` values of `<script src=...>` tags, quoted or not
fn external_script_sources(html: &str) -> Vec<String> {
    const OPEN: &str = "<script";

    let lower = html.to_ascii_lowercase();
    let mut sources = Vec::new();
    let mut rest = 0;

    let ends_name = |c: char| c.is_ascii_whitespace() || c == '>' || c == '/';

    while let Some(start) = lower[rest..].find(OPEN) {
        let tag_start = rest + start;
        let name_end = tag_start + OPEN.len();
        // `<scripts>` or `<script-x>` are other elements
        if !lower[name_end..].starts_with(ends_name) {
            rest = name_end;
            continue;
        }
        let Some(tag_len) = lower[name_end..].find('>') else {
            break;
        };
        let attributes = &html[name_end..name_end + tag_len];

        if let Some(src) = src_attribute(attributes).filter(|s| !s.is_empty()) {
            sources.push(src.to_string());
        }
        rest = name_end + tag_len;
    }

    sources
}

/// Value of a standalone `src` attribute; `data-src` and friends do not count
fn src_attribute(attributes: &str) -> Option<&str> {
    let lower = attributes.to_ascii_lowercase();
    let mut from = 0;

    while let Some(found) = lower[from..].find("src") {
        let pos = from + found;
        from = pos + 3;

        let bounded = lower[..pos].ends_with(|c: char| c.is_ascii_whitespace());
        let after = lower[from..].trim_start();
        if !bounded || !after.starts_with('=') {
            continue;
        }

        let value = attributes[attributes.len() - after.len() + 1..].trim_start();
        let src = match value.chars().next() {
            Some(q @ ('"' | '\'')) => value[1..].split(q).next().unwrap_or(""),
            _ => value.split(char::is_whitespace).next().unwrap_or(""),
        };
        return Some(src);
    }
    None
}
