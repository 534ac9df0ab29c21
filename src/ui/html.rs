use crate::core::render::SlotId;
use crate::ui::escape_html;
use crate::ui::view::{ChatView, Element, ElementClass, NoticeKind};

const BASE_CSS: &str = "\
body { font-family: system-ui, sans-serif; margin: 0; background: #f6f6f4; }
#chat-box { max-width: 52rem; margin: 0 auto; padding: 1rem; }
#chat-box > div { margin: 0.6rem 0; padding: 0.6rem 0.9rem; border-radius: 0.5rem; }
.user { background: #dbeafe; white-space: pre-wrap; }
.ai { background: #ffffff; }
.notice { font-style: italic; color: #555; }
.notice-error { color: #a40000; }
.transcript pre { white-space: pre-wrap; }
pre { overflow-x: auto; padding: 0.5rem; background: #f3f3f3; }
";

const MATHJAX_SCRIPT: &str =
    "<script async src=\"https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js\"></script>";

/// In-memory model of the chat page.
#[derive(Debug, Clone)]
pub struct HtmlView {
    title: String,
    elements: Vec<Element>,
    stylesheet: Option<String>,
    refresh_seconds: Option<u32>,
    scroll_requests: usize,
}

impl HtmlView {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            elements: Vec::new(),
            stylesheet: None,
            refresh_seconds: None,
            scroll_requests: 0,
        }
    }

    /// Extra CSS, typically the syntax highlighter's class styles.
    pub fn with_stylesheet(mut self, css: Option<String>) -> Self {
        self.stylesheet = css;
        self
    }

    /// Makes the written page reload itself, for watching a live file.
    pub fn with_auto_refresh(mut self, seconds: u32) -> Self {
        self.refresh_seconds = Some(seconds);
        self
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn slot_markup(&self, slot: SlotId) -> Option<&str> {
        self.elements
            .iter()
            .find(|element| element.slot == Some(slot))
            .map(|element| element.markup.as_str())
    }

    pub fn scroll_requests(&self) -> usize {
        self.scroll_requests
    }

    pub fn to_document(&self) -> String {
        let mut doc = String::new();
        doc.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        if let Some(seconds) = self.refresh_seconds {
            doc.push_str(&format!(
                "<meta http-equiv=\"refresh\" content=\"{seconds}\">\n"
            ));
        }
        doc.push_str(&format!("<title>{}</title>\n", escape_html(&self.title)));
        doc.push_str("<style>\n");
        doc.push_str(BASE_CSS);
        if let Some(css) = &self.stylesheet {
            doc.push_str(css);
        }
        doc.push_str("</style>\n");
        doc.push_str(MATHJAX_SCRIPT);
        doc.push_str("\n</head>\n<body>\n<div id=\"chat-box\">\n");
        for element in &self.elements {
            doc.push_str("<div class=\"");
            doc.push_str(element.class.css_class());
            doc.push('"');
            if let Some(id) = element.dom_id() {
                doc.push_str(" id=\"");
                doc.push_str(&id);
                doc.push('"');
            }
            doc.push('>');
            doc.push_str(&element.markup);
            doc.push_str("</div>\n");
        }
        doc.push_str("</div>\n");
        // Keep the newest message in view after a refresh.
        doc.push_str("<script>window.scrollTo(0, document.body.scrollHeight);</script>\n");
        doc.push_str("</body>\n</html>\n");
        doc
    }
}

impl ChatView for HtmlView {
    fn append_user_message(&mut self, text: &str) {
        let markup = format!("You: {}", escape_html(text));
        self.elements.push(Element::new(ElementClass::User, markup));
    }

    fn create_slot(&mut self, slot: SlotId) {
        self.elements.push(Element::for_slot(slot));
    }

    fn slot_mut(&mut self, slot: SlotId) -> Option<&mut Element> {
        // Slots are appended in order, so the open one is almost always last.
        self.elements
            .iter_mut()
            .rev()
            .find(|element| element.slot == Some(slot))
    }

    fn show_notice(&mut self, kind: NoticeKind, text: &str) {
        self.elements.push(Element::new(
            ElementClass::Notice(kind),
            escape_html(text),
        ));
    }

    fn show_transcript(&mut self, name: &str, text: &str) {
        let markup = format!(
            "<h3>{}</h3><pre>{}</pre>",
            escape_html(name),
            escape_html(text)
        );
        self.elements.push(Element::new(ElementClass::Transcript, markup));
    }

    fn scroll_to_bottom(&mut self) {
        self.scroll_requests += 1;
    }

    fn clear(&mut self) {
        self.elements.clear();
    }
}
