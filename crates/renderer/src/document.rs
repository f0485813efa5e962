use launchkit_core::SiteContent;
use launchkit_core::config::DEFAULT_TAILWIND_RUNTIME;

/// Reset applied ahead of the generated stylesheet
const BASE_RESET: &str =
    "body { margin: 0; padding: 0; font-family: system-ui, -apple-system, sans-serif; }";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Script injected when the content enables the utility CSS runtime
    pub tailwind_runtime_url: String,
    /// Base for relative asset paths; the sandboxed document has an opaque
    /// origin, so relative URLs need an explicit base to reach the host
    pub base_href: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            tailwind_runtime_url: DEFAULT_TAILWIND_RUNTIME.to_string(),
            base_href: None,
        }
    }
}

/// HTML-escape a string for text and attribute positions
///
/// Escapes: & < > " '
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn meta_property(property: &str, value: Option<&String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => format!(
            "\n    <meta property=\"{}\" content=\"{}\">",
            property,
            html_escape(v)
        ),
        _ => String::new(),
    }
}

/// Compile `content` into one self-contained document.
///
/// Title and metadata are escaped. `css`, `html` and `scripts` are inlined
/// verbatim: they are untrusted and only ever run inside the sandbox.
pub fn render_document(content: &SiteContent, options: &RenderOptions) -> String {
    let base = options
        .base_href
        .as_ref()
        .map(|href| format!("\n    <base href=\"{}\">", html_escape(href)))
        .unwrap_or_default();

    let runtime = if content.tailwind_enabled {
        format!(
            "\n    <script src=\"{}\"></script>",
            html_escape(&options.tailwind_runtime_url)
        )
    } else {
        String::new()
    };

    let seo = [
        meta_property("og:title", content.seo.og_title.as_ref()),
        meta_property("og:description", content.seo.og_description.as_ref()),
        meta_property("og:image", content.seo.og_image.as_ref()),
    ]
    .concat();

    let description = content
        .seo
        .meta_description
        .as_ref()
        .filter(|d| content.description.trim().is_empty() && !d.trim().is_empty())
        .unwrap_or(&content.description);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <meta name="description" content="{description}">{seo}{base}{runtime}
    <style>
{reset}
{css}
    </style>
</head>
<body>
{html}
<script>{scripts}</script>
</body>
</html>
"#,
        title = html_escape(&content.title),
        description = html_escape(description),
        seo = seo,
        base = base,
        runtime = runtime,
        reset = BASE_RESET,
        css = content.css,
        html = content.html,
        scripts = content.scripts,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use launchkit_core::SeoMetadata;

    fn content() -> SiteContent {
        SiteContent {
            title: "Bean There".to_string(),
            description: "Small batch coffee".to_string(),
            slug: "bean-there".to_string(),
            html: "<main class=\"p-4\"><h1>Bean & Co</h1></main>".to_string(),
            css: ".hero > h1 { color: #3b2f2f; }".to_string(),
            scripts: "document.querySelector('h1').dataset.ready = '1';".to_string(),
            tailwind_enabled: true,
            assets: Vec::new(),
            seo: SeoMetadata::default(),
            accessibility_notes: String::new(),
            mobile_first: true,
            author_notes: String::new(),
            preview_instructions: String::new(),
        }
    }

    fn between<'a>(doc: &'a str, open: &str, close: &str) -> &'a str {
        let start = doc.find(open).unwrap() + open.len();
        let end = doc[start..].find(close).unwrap() + start;
        &doc[start..end]
    }

    #[test]
    fn test_body_and_style_hold_raw_content() {
        let c = content();
        let doc = render_document(&c, &RenderOptions::default());
        assert!(between(&doc, "<body>", "</body>").contains(&c.html));
        assert!(between(&doc, "<style>", "</style>").contains(&c.css));
        assert!(doc.contains(&format!("<script>{}</script>", c.scripts)));
    }

    #[test]
    fn test_head_boilerplate() {
        let doc = render_document(&content(), &RenderOptions::default());
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains(r#"<meta charset="UTF-8">"#));
        assert!(doc.contains(r#"name="viewport""#));
        assert_eq!(between(&doc, "<title>", "</title>"), "Bean There");
        assert!(doc.contains(r#"<meta name="description" content="Small batch coffee">"#));
    }

    #[test]
    fn test_tailwind_runtime_is_conditional() {
        let mut c = content();
        let doc = render_document(&c, &RenderOptions::default());
        assert!(doc.contains(r#"<script src="https://cdn.tailwindcss.com"></script>"#));

        c.tailwind_enabled = false;
        let doc = render_document(&c, &RenderOptions::default());
        assert!(!doc.contains("cdn.tailwindcss.com"));
    }

    #[test]
    fn test_title_and_description_escaped() {
        let mut c = content();
        c.title = "</title><script>alert(1)</script>".to_string();
        c.description = "\"><img src=x>".to_string();
        let doc = render_document(&c, &RenderOptions::default());
        assert!(!doc.contains("</title><script>alert(1)"));
        assert!(doc.contains("&lt;/title&gt;"));
        assert!(doc.contains("&quot;&gt;&lt;img src=x&gt;"));
    }

    #[test]
    fn test_base_href_and_seo_tags() {
        let mut c = content();
        c.seo.og_image = Some("/assets/og.png".to_string());
        let options = RenderOptions {
            base_href: Some("http://localhost:8080/".to_string()),
            ..RenderOptions::default()
        };
        let doc = render_document(&c, &options);
        assert!(doc.contains(r#"<base href="http://localhost:8080/">"#));
        assert!(doc.contains(r#"<meta property="og:image" content="/assets/og.png">"#));
        assert!(!doc.contains("og:title"));
    }

    #[test]
    fn test_meta_description_fallback() {
        let mut c = content();
        c.description = String::new();
        c.seo.meta_description = Some("From SEO".to_string());
        let doc = render_document(&c, &RenderOptions::default());
        assert!(doc.contains(r#"<meta name="description" content="From SEO">"#));
    }

    #[test]
    fn test_render_is_deterministic() {
        let c = content();
        let options = RenderOptions::default();
        assert_eq!(render_document(&c, &options), render_document(&c, &options));
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape("A&B<C>D\"E'F"),
            "A&amp;B&lt;C&gt;D&quot;E&#x27;F"
        );
        assert_eq!(html_escape("トラック01"), "トラック01");
    }
}
