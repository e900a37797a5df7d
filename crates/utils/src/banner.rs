//! Provenance banner prepended to every relayed message.

/// Default banner markup, placeholders are replaced by [`BannerTemplate::render`].
pub const DEFAULT_BANNER: &str = r#"<div style="border:1px solid #d0d7de;background:#f6f8fa;padding:8px 12px;margin-bottom:12px;font-family:sans-serif;font-size:13px;color:#1f2328">
<strong>Relayed message</strong><br>
<b>From:</b> {email_from}<br>
<b>To:</b> {email_to}<br>
<b>Archive:</b> <a href="{email_archive_url}">{email_archive_url}</a>
</div>
"#;

/// HTML template with three named placeholders:
/// `{email_from}`, `{email_to}` and `{email_archive_url}`.
#[derive(Debug, Clone)]
pub struct BannerTemplate {
    template: String,
}

impl Default for BannerTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_BANNER)
    }
}

impl BannerTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Renders the banner, HTML-escaping every substituted value.
    ///
    /// Substitution happens in a single pass, so a value that itself looks
    /// like a placeholder is never expanded.
    pub fn render(&self, email_from: &str, email_to: &str, archive_url: &str) -> String {
        let mut output = String::with_capacity(self.template.len() + 256);
        let mut rest = self.template.as_str();
        while let Some(start) = rest.find('{') {
            output.push_str(&rest[..start]);
            let tail = &rest[start..];
            let value = match tail.find('}').map(|end| &tail[1..end]) {
                Some("email_from") => Some(email_from),
                Some("email_to") => Some(email_to),
                Some("email_archive_url") => Some(archive_url),
                _ => None,
            };
            match value {
                Some(value) => {
                    output.push_str(&escape_html(value));
                    rest = &tail[tail.find('}').map_or(1, |end| end + 1)..];
                }
                None => {
                    output.push('{');
                    rest = &tail[1..];
                }
            }
        }
        output.push_str(rest);
        output
    }
}

/// Escapes the characters that carry meaning in HTML text and attributes.
///
/// ```rust
/// assert_eq!(
///     mailrelay_utils::escape_html("<script>alert(\"x\" & 'y')</script>"),
///     "&lt;script&gt;alert(&quot;x&quot; &amp; &#39;y&#39;)&lt;/script&gt;"
/// );
/// ```
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_default_template() {
        let banner = BannerTemplate::default().render(
            "Alice a@x.com",
            "b@y.com",
            "http://console.example.com/inbox/m1?region=r",
        );
        assert!(banner.contains("<b>From:</b> Alice a@x.com<br>"));
        assert!(banner.contains("<b>To:</b> b@y.com<br>"));
        assert!(banner.contains(
            "<a href=\"http://console.example.com/inbox/m1?region=r\">http://console.example.com/inbox/m1?region=r</a>"
        ));
        assert!(!banner.contains("{email_"));
    }

    #[test]
    fn test_render_escapes_values() {
        let banner = BannerTemplate::new("{email_from}|{email_to}|{email_archive_url}").render(
            "<script>x</script>",
            "a&b",
            "http://x/\"y\"",
        );
        assert_eq!(
            banner,
            "&lt;script&gt;x&lt;/script&gt;|a&amp;b|http://x/&quot;y&quot;"
        );
    }

    #[test]
    fn test_render_does_not_expand_nested_placeholders() {
        let banner = BannerTemplate::new("{email_from}-{email_to}").render("{email_to}", "t", "u");
        assert_eq!(banner, "{email_to}-t");
    }

    #[test]
    fn test_render_keeps_unknown_braces() {
        let banner =
            BannerTemplate::new("p { color: red } {unknown} {email_to}").render("f", "t", "u");
        assert_eq!(banner, "p { color: red } {unknown} t");
    }
}
