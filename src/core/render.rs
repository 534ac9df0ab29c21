//! Maps accumulated response text onto the view.
//!
//! Exactly one slot represents the assistant message currently being
//! produced. Every render for that response replaces the slot's full markup,
//! so rendering the same `(content, reasoning)` pair twice yields the same
//! page.

use std::fmt;

use tracing::{debug, warn};

use crate::core::accumulator::Snapshot;
use crate::ui::highlight::SyntaxHighlighter;
use crate::ui::markdown::MarkdownRenderer;
use crate::ui::math::MathTypesetter;
use crate::ui::view::ChatView;

/// Literal token bracketing the reasoning block. It is entity-escaped so the
/// Markdown renderer shows it as text instead of treating it as a tag.
pub const REASONING_MARKER: &str = "&lt;reasoning&gt;";

const ASSISTANT_PREFIX: &str = "AI: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u64);

impl SlotId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn dom_id(self) -> String {
        format!("ai-{}", self.0)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dom_id())
    }
}

/// Builds the Markdown source for one assistant message.
pub fn compose_display(content: &str, reasoning: &str) -> String {
    let mut display = String::with_capacity(
        ASSISTANT_PREFIX.len() + content.len() + reasoning.len() + 2 * REASONING_MARKER.len() + 4,
    );
    display.push_str(ASSISTANT_PREFIX);
    if !reasoning.is_empty() {
        display.push('\n');
        display.push_str(REASONING_MARKER);
        display.push('\n');
        display.push_str(reasoning);
        display.push('\n');
        display.push_str(REASONING_MARKER);
        display.push('\n');
    }
    display.push_str(content);
    display
}

/// The renderers a driver pushes each update through.
pub struct Renderers {
    pub markdown: Box<dyn MarkdownRenderer>,
    pub highlighter: Box<dyn SyntaxHighlighter>,
    pub typesetter: Box<dyn MathTypesetter>,
}

impl Renderers {
    /// pulldown-cmark, syntect and delimiter-based math.
    pub fn standard() -> Self {
        Self {
            markdown: Box::new(crate::ui::PulldownMarkdown::new()),
            highlighter: Box::new(crate::ui::SyntectHighlighter::default()),
            typesetter: Box::new(crate::ui::DelimiterTypesetter),
        }
    }

    /// Markdown only; no highlighting or math.
    pub fn plain() -> Self {
        Self {
            markdown: Box::new(crate::ui::PulldownMarkdown::new()),
            highlighter: Box::new(crate::ui::PlainHighlighter),
            typesetter: Box::new(crate::ui::NoopTypesetter),
        }
    }
}

pub struct RenderDriver {
    renderers: Renderers,
    current: Option<SlotId>,
    next_id: u64,
}

impl RenderDriver {
    pub fn new(renderers: Renderers) -> Self {
        Self {
            renderers,
            current: None,
            next_id: 1,
        }
    }

    pub fn current_slot(&self) -> Option<SlotId> {
        self.current
    }

    pub fn stylesheet(&self) -> Option<String> {
        self.renderers.highlighter.stylesheet()
    }

    /// Allocates a fresh slot and asks the view to create its element. Any
    /// slot still open is closed first.
    pub fn open_slot(&mut self, view: &mut dyn ChatView) -> SlotId {
        if self.current.is_some() {
            self.close_slot();
        }
        let slot = SlotId(self.next_id);
        self.next_id += 1;
        view.create_slot(slot);
        self.current = Some(slot);
        debug!(%slot, "opened render slot");
        slot
    }

    pub fn close_slot(&mut self) {
        if let Some(slot) = self.current.take() {
            debug!(%slot, "closed render slot");
        }
    }

    /// Replaces the slot's markup with the rendering of `(content,
    /// reasoning)` and runs post-processing on that element only.
    pub async fn render(
        &self,
        view: &mut dyn ChatView,
        slot: SlotId,
        content: &str,
        reasoning: &str,
    ) {
        if self.current != Some(slot) {
            warn!(%slot, current = ?self.current, "render for a slot that is not open; ignoring");
            return;
        }

        let display = compose_display(content, reasoning);
        let markup = self.renderers.markdown.render(&display);

        let Some(element) = view.slot_mut(slot) else {
            warn!(%slot, "view has no element for slot");
            return;
        };
        element.markup = markup;
        self.renderers.highlighter.highlight(element);
        self.renderers.typesetter.typeset(element).await;

        view.update_slot_text(slot, Snapshot { content, reasoning });
        view.scroll_to_bottom();
    }
}
