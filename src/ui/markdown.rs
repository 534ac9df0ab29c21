use pulldown_cmark::{html, Options, Parser};

/// Markdown to HTML markup. Must be pure: the same input always gives the
/// same output, which is what makes re-rendering a slot idempotent.
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, markdown: &str) -> String;
}

#[derive(Debug, Clone, Copy)]
pub struct PulldownMarkdown {
    options: Options,
}

impl Default for PulldownMarkdown {
    fn default() -> Self {
        // Math stays off: `$` is left untouched for the typesetter.
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS;
        Self { options }
    }
}

impl PulldownMarkdown {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MarkdownRenderer for PulldownMarkdown {
    fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}
