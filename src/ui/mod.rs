//! Presentation collaborators driven by the render core.
//!
//! - [`markdown`] turns composed message text into HTML.
//! - [`highlight`] post-processes fenced code blocks inside an element.
//! - [`math`] wraps TeX delimiters so a page-side typesetter can pick them up.
//! - [`view`] defines the [`ChatView`] surface plus the page element model.
//! - [`html`] and [`console`] are the two concrete views.

pub mod console;
pub mod highlight;
pub mod html;
pub mod markdown;
pub mod math;
pub mod view;

pub use console::ConsoleView;
pub use highlight::{PlainHighlighter, SyntaxHighlighter, SyntectHighlighter};
pub use html::HtmlView;
pub use markdown::{MarkdownRenderer, PulldownMarkdown};
pub use math::{DelimiterTypesetter, MathTypesetter, NoopTypesetter};
pub use view::{ChatView, Element, ElementClass, NoticeKind};

/// Escapes text for inclusion in HTML body or attribute context.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Reverses the entity escaping pulldown-cmark applies to code text.
pub(crate) fn unescape_html(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
