use crate::api::ChatResponseDelta;
use crate::core::frame::StreamEvent;
use crate::core::render::SlotId;

/// Lifecycle of one assistant response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponsePhase {
    /// No response is active.
    Idle,
    /// Slot is open and the request is in flight; nothing rendered yet.
    AwaitingFirstDelta,
    Streaming,
    Done,
}

/// Full current state of both channels, handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot<'a> {
    pub content: &'a str,
    pub reasoning: &'a str,
}

#[derive(Debug)]
pub struct ResponseAccumulator {
    content: String,
    reasoning: String,
    slot: Option<SlotId>,
    phase: ResponsePhase,
}

impl ResponseAccumulator {
    pub fn new(slot: Option<SlotId>) -> Self {
        Self {
            content: String::new(),
            reasoning: String::new(),
            slot,
            phase: ResponsePhase::AwaitingFirstDelta,
        }
    }

    pub fn phase(&self) -> ResponsePhase {
        self.phase
    }

    pub fn slot(&self) -> Option<SlotId> {
        self.slot
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            content: &self.content,
            reasoning: &self.reasoning,
        }
    }

    /// Folds one decoded event in. Returns the updated pair when a channel
    /// grew, `None` otherwise.
    pub fn apply(&mut self, event: StreamEvent) -> Option<Snapshot<'_>> {
        if self.phase == ResponsePhase::Done {
            return None;
        }
        match event {
            StreamEvent::ContentDelta(text) => self.append(Some(&text), None),
            StreamEvent::ReasoningDelta(text) => self.append(None, Some(&text)),
            StreamEvent::Done => {
                self.phase = ResponsePhase::Done;
                None
            }
            StreamEvent::Malformed(_) => None,
        }
    }

    /// Folds an already parsed payload delta in.
    pub fn apply_delta(&mut self, delta: &ChatResponseDelta) -> Option<Snapshot<'_>> {
        if self.phase == ResponsePhase::Done {
            return None;
        }
        self.append(delta.content.as_deref(), delta.reasoning_content.as_deref())
    }

    fn append(&mut self, content: Option<&str>, reasoning: Option<&str>) -> Option<Snapshot<'_>> {
        let mut changed = false;
        if let Some(text) = reasoning.filter(|text| !text.is_empty()) {
            self.reasoning.push_str(text);
            changed = true;
        }
        if let Some(text) = content.filter(|text| !text.is_empty()) {
            self.content.push_str(text);
            changed = true;
        }
        if !changed {
            return None;
        }
        self.phase = ResponsePhase::Streaming;
        Some(self.snapshot())
    }

    /// Marks the response finished without a `[DONE]` marker.
    pub fn mark_done(&mut self) {
        self.phase = ResponsePhase::Done;
    }

    /// Consumes the accumulator, keeping only the content channel.
    pub fn finish(self) -> String {
        self.content
    }
}
