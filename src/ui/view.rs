use crate::core::accumulator::Snapshot;
use crate::core::render::SlotId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementClass {
    User,
    Ai,
    Notice(NoticeKind),
    Transcript,
}

impl ElementClass {
    pub fn css_class(self) -> &'static str {
        match self {
            ElementClass::User => "user",
            ElementClass::Ai => "ai",
            ElementClass::Notice(NoticeKind::Info) => "notice notice-info",
            ElementClass::Notice(NoticeKind::Error) => "notice notice-error",
            ElementClass::Transcript => "transcript",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// One block in the chat page. Assistant blocks carry the slot they were
/// created for; everything else is anonymous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub slot: Option<SlotId>,
    pub class: ElementClass,
    pub markup: String,
}

impl Element {
    pub fn new(class: ElementClass, markup: impl Into<String>) -> Self {
        Self {
            slot: None,
            class,
            markup: markup.into(),
        }
    }

    pub fn for_slot(slot: SlotId) -> Self {
        Self {
            slot: Some(slot),
            class: ElementClass::Ai,
            markup: String::new(),
        }
    }

    /// DOM id for slot-backed elements.
    pub fn dom_id(&self) -> Option<String> {
        self.slot.map(|slot| slot.dom_id())
    }
}

/// The message list surface the session writes into.
pub trait ChatView {
    fn append_user_message(&mut self, text: &str);

    /// Creates the element for a new in-progress assistant message.
    fn create_slot(&mut self, slot: SlotId);

    /// Looks an assistant element up by slot identity.
    fn slot_mut(&mut self, slot: SlotId) -> Option<&mut Element>;

    /// Raw channel text after a render. Text consoles use this to print
    /// incrementally; markup views can ignore it.
    fn update_slot_text(&mut self, _slot: SlotId, _snapshot: Snapshot<'_>) {}

    fn show_notice(&mut self, kind: NoticeKind, text: &str);

    fn show_transcript(&mut self, name: &str, text: &str);

    fn scroll_to_bottom(&mut self);

    fn clear(&mut self);
}
