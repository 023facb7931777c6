//! MarkupTree: the structured document handed from the compositor to the renderer.
//!
//! All text in the tree is [`SafeText`]: it can only be built by escaping a raw
//! value (or from a static literal), so serializing the tree to HTML never
//! needs to escape again and can never emit unescaped profile input.

use std::fmt;

use crate::compose::styles::RESUME_CSS;

/// Text that is safe to embed verbatim in HTML body or attribute context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeText(String);

impl SafeText {
    /// Neutralizes markup-significant characters in an untrusted value.
    /// Whitespace and punctuation such as `/` pass through unchanged.
    pub fn escape(raw: &str) -> Self {
        let mut escaped = String::with_capacity(raw.len());
        for ch in raw.chars() {
            match ch {
                '&' => escaped.push_str("&amp;"),
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                '"' => escaped.push_str("&quot;"),
                '\'' => escaped.push_str("&#39;"),
                _ => escaped.push(ch),
            }
        }
        SafeText(escaped)
    }

    /// Wraps a compile-time literal authored in this crate.
    pub fn literal(text: &'static str) -> Self {
        SafeText(text.to_string())
    }

    /// Joins already-safe fragments with a literal separator.
    pub fn join(parts: &[SafeText], separator: &'static str) -> Self {
        SafeText(
            parts
                .iter()
                .map(SafeText::as_str)
                .collect::<Vec<_>>()
                .join(separator),
        )
    }

    /// Concatenates already-safe fragments.
    pub fn concat(parts: &[&SafeText]) -> Self {
        SafeText(parts.iter().map(|p| p.as_str()).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SafeText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for SafeText {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub name: SafeText,
    pub contact: Vec<SafeText>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub label: SafeText,
    pub value: SafeText,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(SafeText),
    /// Skill chips, in input order.
    Tags(Vec<SafeText>),
    Entry {
        heading: SafeText,
        subheading: SafeText,
        body: SafeText,
    },
    Fields(Vec<Field>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: SafeText,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkupTree {
    pub title: SafeText,
    pub header: Header,
    pub sections: Vec<Section>,
}

#[cfg(test)]
impl MarkupTree {
    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.title == title)
    }

    /// Tags of the first tag block in the tree.
    pub fn skill_tags(&self) -> Vec<&str> {
        self.sections
            .iter()
            .flat_map(|s| s.blocks.iter())
            .find_map(|b| match b {
                Block::Tags(tags) => Some(tags.iter().map(SafeText::as_str).collect()),
                _ => None,
            })
            .unwrap_or_default()
    }
}

impl MarkupTree {
    /// Serializes the tree into a self-contained HTML document (inline CSS,
    /// no external resources).
    pub fn to_html(&self) -> String {
        let mut html = String::with_capacity(4096);
        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n");
        html.push_str(&format!("<title>{}</title>\n", self.title));
        html.push_str(&format!("<style>{RESUME_CSS}</style>\n"));
        html.push_str("</head>\n<body>\n");

        html.push_str("<div class=\"header\">\n");
        html.push_str(&format!("<div class=\"name\">{}</div>\n", self.header.name));
        html.push_str(&format!(
            "<div class=\"contact\">{}</div>\n",
            SafeText::join(&self.header.contact, " | ")
        ));
        html.push_str("</div>\n");

        for section in &self.sections {
            html.push_str("<div class=\"section\">\n");
            html.push_str(&format!(
                "<div class=\"section-title\">{}</div>\n",
                section.title
            ));
            for block in &section.blocks {
                render_block(&mut html, block);
            }
            html.push_str("</div>\n");
        }

        html.push_str("</body>\n</html>\n");
        html
    }
}

fn render_block(html: &mut String, block: &Block) {
    match block {
        Block::Paragraph(text) => html.push_str(&format!("<p>{text}</p>\n")),
        Block::Tags(tags) => {
            html.push_str("<div class=\"skills\">");
            for tag in tags {
                html.push_str(&format!("<span class=\"skill-tag\">{tag}</span>"));
            }
            html.push_str("</div>\n");
        }
        Block::Entry {
            heading,
            subheading,
            body,
        } => {
            html.push_str("<div class=\"experience-item\">\n");
            html.push_str(&format!("<div class=\"job-title\">{heading}</div>\n"));
            html.push_str(&format!("<div class=\"company\">{subheading}</div>\n"));
            html.push_str(&format!("<p>{body}</p>\n"));
            html.push_str("</div>\n");
        }
        Block::Fields(fields) => {
            html.push_str("<div class=\"preferences\">\n");
            for field in fields {
                html.push_str(&format!(
                    "<p><strong>{}:</strong> {}</p>\n",
                    field.label, field.value
                ));
            }
            html.push_str("</div>\n");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_neutralizes_markup() {
        let text = SafeText::escape("<script>alert(1)</script>");
        assert!(!text.as_str().contains('<'));
        assert!(!text.as_str().contains('>'));
        assert!(text.as_str().contains("&lt;script&gt;"));
    }

    #[test]
    fn test_escape_keeps_plain_tokens() {
        assert_eq!(SafeText::escape("C++"), "C++");
        assert_eq!(SafeText::escape("Machine Learning"), "Machine Learning");
        assert_eq!(SafeText::escape("CI/CD"), "CI/CD");
    }

    #[test]
    fn test_escape_covers_quotes_and_ampersand() {
        assert_eq!(
            SafeText::escape("R&D \"lab\" 'x'"),
            "R&amp;D &quot;lab&quot; &#39;x&#39;"
        );
    }

    #[test]
    fn test_to_html_contains_every_block_kind() {
        let tree = MarkupTree {
            title: SafeText::literal("Resume"),
            header: Header {
                name: SafeText::literal("Ada"),
                contact: vec![SafeText::literal("a@b.c"), SafeText::literal("123")],
            },
            sections: vec![Section {
                title: SafeText::literal("Skills"),
                blocks: vec![
                    Block::Tags(vec![SafeText::literal("Math")]),
                    Block::Paragraph(SafeText::literal("Hello")),
                    Block::Fields(vec![Field {
                        label: SafeText::literal("Work Type"),
                        value: SafeText::literal("Remote"),
                    }]),
                ],
            }],
        };

        let html = tree.to_html();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Resume</title>"));
        assert!(html.contains("a@b.c | 123"));
        assert!(html.contains("<span class=\"skill-tag\">Math</span>"));
        assert!(html.contains("<p>Hello</p>"));
        assert!(html.contains("<strong>Work Type:</strong> Remote"));
        assert!(!html.contains("http://") && !html.contains("https://"));
    }
}
