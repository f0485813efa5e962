//! Isolation boundary for untrusted generated documents.
//!
//! Generated markup and scripts are mounted in an `<iframe sandbox>` whose
//! token list never contains `allow-same-origin`. The frame therefore runs
//! with an opaque origin: scripts execute, but cannot read the host's
//! storage, cookies, or DOM. Top-level navigation is also withheld.

use crate::document::html_escape;

/// Capabilities that may be granted to a sandboxed frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Scripts,
    Forms,
    Popups,
    Modals,
}

impl Capability {
    pub fn token(self) -> &'static str {
        match self {
            Capability::Scripts => "allow-scripts",
            Capability::Forms => "allow-forms",
            Capability::Popups => "allow-popups",
            Capability::Modals => "allow-modals",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxPolicy {
    capabilities: Vec<Capability>,
}

impl Default for SandboxPolicy {
    /// Interactive landing pages: scripts, form posts and outbound links
    fn default() -> Self {
        Self::with(&[Capability::Scripts, Capability::Forms, Capability::Popups])
    }
}

impl SandboxPolicy {
    pub fn with(capabilities: &[Capability]) -> Self {
        let mut unique = Vec::with_capacity(capabilities.len());
        for cap in capabilities {
            if !unique.contains(cap) {
                unique.push(*cap);
            }
        }
        Self {
            capabilities: unique,
        }
    }

    pub fn allows(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Value for the iframe `sandbox` attribute
    pub fn attribute_value(&self) -> String {
        self.capabilities
            .iter()
            .map(|c| c.token())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// `Content-Security-Policy` value for serving the raw document.
    ///
    /// Applies the same sandbox when the document URL is opened directly
    /// instead of through the frame.
    pub fn csp_header_value(&self) -> String {
        let tokens = self.attribute_value();
        if tokens.is_empty() {
            "sandbox".to_string()
        } else {
            format!("sandbox {}", tokens)
        }
    }

    /// Frame that loads the document inline through `srcdoc`
    pub fn frame_srcdoc(&self, document: &str, title: &str) -> String {
        format!(
            r#"<iframe class="launchkit-frame" title="{}" sandbox="{}" referrerpolicy="no-referrer" srcdoc="{}"></iframe>"#,
            html_escape(title),
            self.attribute_value(),
            html_escape(document)
        )
    }

    /// Frame that loads the document from `src`
    pub fn frame_src(&self, src: &str, title: &str) -> String {
        format!(
            r#"<iframe class="launchkit-frame" title="{}" sandbox="{}" referrerpolicy="no-referrer" src="{}"></iframe>"#,
            html_escape(title),
            self.attribute_value(),
            html_escape(src)
        )
    }
}

/// Full-viewport host page around a sandboxed frame.
///
/// With `reload_endpoint` set, the page subscribes to that server-sent event
/// stream and reloads on every message, which tears down the frame's
/// browsing context and mounts a fresh one.
pub fn shell_page(title: &str, frame: &str, reload_endpoint: Option<&str>) -> String {
    let reload = reload_endpoint
        .map(|endpoint| {
            format!(
                r#"
    <script>
        const eventSource = new EventSource('{}');
        eventSource.onmessage = () => location.reload();
        eventSource.onerror = () => eventSource.close();
    </script>"#,
                html_escape(endpoint)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{}</title>
    <style>
        html, body {{ margin: 0; height: 100%; }}
        .launchkit-frame {{ border: 0; width: 100%; height: 100vh; display: block; }}
    </style>
</head>
<body>
    {}{}
</body>
</html>"#,
        html_escape(title),
        frame,
        reload
    )
}

/// Minimal page for a failed lookup or a closed publish gate
pub fn message_page(heading: &str, detail: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{heading}</title>
    <style>
        body {{ font-family: system-ui, -apple-system, sans-serif; display: grid; place-items: center; min-height: 100vh; margin: 0; color: #333; }}
    </style>
</head>
<body>
    <main>
        <h1>{heading}</h1>
        <p>{detail}</p>
    </main>
</body>
</html>"#,
        heading = html_escape(heading),
        detail = html_escape(detail),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_tokens() {
        let policy = SandboxPolicy::default();
        assert_eq!(
            policy.attribute_value(),
            "allow-scripts allow-forms allow-popups"
        );
        assert!(policy.allows(Capability::Scripts));
        assert!(!policy.allows(Capability::Modals));
    }

    #[test]
    fn test_policy_never_grants_same_origin() {
        let policy = SandboxPolicy::with(&[
            Capability::Scripts,
            Capability::Forms,
            Capability::Popups,
            Capability::Modals,
        ]);
        let attr = policy.attribute_value();
        assert!(!attr.contains("allow-same-origin"));
        assert!(!attr.contains("allow-top-navigation"));
    }

    #[test]
    fn test_duplicate_capabilities_collapse() {
        let policy = SandboxPolicy::with(&[Capability::Scripts, Capability::Scripts]);
        assert_eq!(policy.attribute_value(), "allow-scripts");
    }

    #[test]
    fn test_csp_header_value() {
        assert_eq!(
            SandboxPolicy::default().csp_header_value(),
            "sandbox allow-scripts allow-forms allow-popups"
        );
        assert_eq!(SandboxPolicy::with(&[]).csp_header_value(), "sandbox");
    }

    #[test]
    fn test_srcdoc_is_escaped_into_attribute() {
        let policy = SandboxPolicy::default();
        let frame = policy.frame_srcdoc(r#"<p class="x">Hi & bye</p>"#, "Demo");
        assert!(frame.contains(r#"srcdoc="&lt;p class=&quot;x&quot;&gt;Hi &amp; bye&lt;/p&gt;""#));
        assert!(frame.contains(r#"sandbox="allow-scripts allow-forms allow-popups""#));
        assert_eq!(frame.matches("<iframe").count(), 1);
    }

    #[test]
    fn test_frame_src() {
        let frame = SandboxPolicy::default().frame_src("/p/u1/s1/raw", "Demo");
        assert!(frame.contains(r#"src="/p/u1/s1/raw""#));
    }

    #[test]
    fn test_shell_page_reload_is_optional() {
        let with = shell_page("T", "<iframe></iframe>", Some("/_reload"));
        assert!(with.contains("new EventSource('/_reload')"));

        let without = shell_page("T", "<iframe></iframe>", None);
        assert!(!without.contains("EventSource"));
        assert!(without.contains("<iframe></iframe>"));
    }

    #[test]
    fn test_message_page_escapes() {
        let page = message_page("Site not found", "<b>nope</b>");
        assert!(page.contains("<h1>Site not found</h1>"));
        assert!(page.contains("&lt;b&gt;nope&lt;/b&gt;"));
    }
}
