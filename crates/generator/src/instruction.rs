/// Advisory content requirements sent alongside every generation request.
///
/// These shape what the backend writes; nothing here is enforced locally
/// beyond the response schema.
pub const SYSTEM_INSTRUCTION: &str = r#"You are an expert web developer and UI designer.
Generate a COMPLETE, production-ready landing page that meets these platform requirements.
Output as a single JSON object.

Requirements:
1. Visual & structural:
   - Modern, professional layout (Header, Hero, Features, How it Works, Pricing, Testimonials, About, Contact, CTA, Footer).
   - Clear CTA for Sign Up/Login.
   - Professional color scheme.
2. Technical:
   - HTML must be valid, well-structured (semantic tags).
   - Mobile-first responsive layout.
   - If using Tailwind, set "tailwind": true.
   - Avoid external CDN dependencies (except Tailwind).
   - Images should be placeholders (paths under /assets/).
   - Minimize JS.
3. A11y & SEO:
   - Meaningful alt text.
   - Accessible contrast.
   - Aria labels.

Return STRICT valid JSON."#;

/// Wrap the user's description into the request contents
pub fn frame_prompt(prompt: &str) -> String {
    format!("Create landing page for: \"{}\"", prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_prompt() {
        assert_eq!(
            frame_prompt("Coffee shop"),
            "Create landing page for: \"Coffee shop\""
        );
    }

    #[test]
    fn test_instruction_mentions_tailwind_flag() {
        assert!(SYSTEM_INSTRUCTION.contains(r#""tailwind": true"#));
        assert!(SYSTEM_INSTRUCTION.contains("/assets/"));
    }
}
