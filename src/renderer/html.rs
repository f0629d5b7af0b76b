//! Escaped markup and the output buffer templates write into

use std::fmt;

/// Escape markup-special characters
///
/// `&`, `<`, `>`, `"` and `'` become `&amp;`, `&lt;`, `&gt;`, `&quot;` and `&#39;`.
///
/// # Example
///
/// ```rust
/// use view_components::escape_html;
///
/// assert_eq!(escape_html("<b>\"hi\" & 'bye'</b>"),
///            "&lt;b&gt;&quot;hi&quot; &amp; &#39;bye&#39;&lt;/b&gt;");
/// ```
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    push_escaped(&mut out, s);
    out
}

fn push_escaped(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

const ENTITIES: [(&str, char); 5] = [
    ("&amp;", '&'),
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&quot;", '"'),
    ("&#39;", '\''),
];

/// Reverse [`escape_html`]; other entities are left as written
pub fn unescape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(at) = rest.find('&') {
        out.push_str(&rest[..at]);
        rest = &rest[at..];
        match ENTITIES.iter().find(|(entity, _)| rest.starts_with(entity)) {
            Some((entity, c)) => {
                out.push(*c);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Markup that is safe to embed without further escaping
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SafeHtml(String);

impl SafeHtml {
    /// Escape plain text into safe markup
    pub fn escape(text: &str) -> Self {
        Self(escape_html(text))
    }

    /// Wrap markup the caller vouches for
    pub fn from_trusted(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The text this markup displays as, with escaped characters restored
    pub fn to_text(&self) -> String {
        unescape_html(&self.0)
    }

    /// Empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for SafeHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SafeHtml {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Append-only buffer a render routine writes into
///
/// Plain text is escaped on the way in; [`SafeHtml`] passes through unchanged.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    buf: String,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text, escaping it
    pub fn push_text(&mut self, text: &str) {
        push_escaped(&mut self.buf, text);
    }

    /// Append markup verbatim
    pub fn push_safe(&mut self, html: &SafeHtml) {
        self.buf.push_str(html.as_str());
    }

    /// Append a template's literal markup
    pub fn push_raw(&mut self, markup: &str) {
        self.buf.push_str(markup);
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_html(self) -> SafeHtml {
        SafeHtml(self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_all_special_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_escape_leaves_plain_text() {
        assert_eq!(escape_html("Hello, world"), "Hello, world");
    }

    #[test]
    fn test_buffer_escapes_text_but_not_safe_html() {
        let mut buf = OutputBuffer::new();
        buf.push_raw("<p>");
        buf.push_text("a < b");
        buf.push_safe(&SafeHtml::from_trusted("<br>"));
        buf.push_raw("</p>");
        assert_eq!(buf.into_html().as_str(), "<p>a &lt; b<br></p>");
    }

    #[test]
    fn test_unescape_reverses_escape() {
        let text = r#"R&D <"quoted"> 'x' &copy;"#;
        assert_eq!(SafeHtml::escape(text).to_text(), text);
        assert_eq!(unescape_html("a &amp;lt; b &"), "a &lt; b &");
    }

    #[test]
    fn test_blank_detection() {
        assert!(SafeHtml::from_trusted("  \n").is_blank());
        assert!(!SafeHtml::escape("x").is_blank());
    }
}
