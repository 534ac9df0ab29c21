//! One chat session: the conversation, the render driver and the response
//! currently streaming into the view.
//!
//! The controller owns the session and drives it in two steps per exchange:
//! [`ChatSession::submit`] records the user turn and yields the request, then
//! [`ChatSession::consume`] pulls the response body until it finishes, fails
//! or is cancelled.

use std::error::Error;
use std::fmt;

use futures_util::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::api::ChatRequest;
use crate::core::accumulator::{ResponseAccumulator, ResponsePhase};
use crate::core::chat_stream::TransportError;
use crate::core::conversation::{ContextPolicy, Conversation};
use crate::core::frame::{FrameDecoder, StreamEvent};
use crate::core::render::{RenderDriver, Renderers, SlotId};
use crate::ui::view::{ChatView, NoticeKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub model: String,
    pub max_tokens: u32,
    pub policy: ContextPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// The submitted text was empty or whitespace.
    EmptyInput,
    /// A response is still streaming.
    StreamInFlight,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::EmptyInput => write!(f, "Nothing to send"),
            SessionError::StreamInFlight => {
                write!(f, "A response is still streaming; wait for it or cancel it")
            }
        }
    }
}

impl Error for SessionError {}

/// How consuming one response ended. `committed` tells whether an assistant
/// turn was appended to the conversation.
#[derive(Debug)]
pub enum StreamOutcome {
    /// `data: [DONE]` was received.
    Completed { committed: bool },
    /// The body ended without a `[DONE]` marker.
    Ended { committed: bool },
    Cancelled { committed: bool },
    Failed {
        error: TransportError,
        committed: bool,
    },
}

impl StreamOutcome {
    pub fn committed(&self) -> bool {
        match self {
            StreamOutcome::Completed { committed }
            | StreamOutcome::Ended { committed }
            | StreamOutcome::Cancelled { committed }
            | StreamOutcome::Failed { committed, .. } => *committed,
        }
    }
}

enum Ending {
    Completed,
    Ended,
    Cancelled,
    Failed(TransportError),
}

pub struct ChatSession {
    settings: SessionSettings,
    conversation: Conversation,
    driver: RenderDriver,
    response: Option<ResponseAccumulator>,
}

impl ChatSession {
    pub fn new(settings: SessionSettings, renderers: Renderers) -> Self {
        Self {
            settings,
            conversation: Conversation::new(),
            driver: RenderDriver::new(renderers),
            response: None,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn current_slot(&self) -> Option<SlotId> {
        self.driver.current_slot()
    }

    /// CSS the highlighter needs on the page, if any.
    pub fn stylesheet(&self) -> Option<String> {
        self.driver.stylesheet()
    }

    pub fn phase(&self) -> ResponsePhase {
        self.response
            .as_ref()
            .map(ResponseAccumulator::phase)
            .unwrap_or(ResponsePhase::Idle)
    }

    /// Records `text` as the next user turn and opens a slot for the reply.
    /// Returns the request to send.
    pub fn submit(
        &mut self,
        text: &str,
        view: &mut dyn ChatView,
    ) -> Result<ChatRequest, SessionError> {
        if text.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }
        if self.response.is_some() {
            return Err(SessionError::StreamInFlight);
        }

        self.conversation.append_user_turn(text);
        view.append_user_message(text);

        self.driver.close_slot();
        let slot = self.driver.open_slot(view);
        self.response = Some(ResponseAccumulator::new(Some(slot)));

        let messages = self.conversation.snapshot_for_request(self.settings.policy);
        debug!(%slot, turns = messages.len(), "submitted user turn");
        Ok(ChatRequest::streaming(
            self.settings.model.clone(),
            messages,
            self.settings.max_tokens,
        ))
    }

    /// Pulls `body` until `[DONE]`, end of body, a transport error or
    /// cancellation, rendering once per chunk that changed the response.
    ///
    /// Dropping `body` on return releases the underlying connection.
    pub async fn consume<S, B>(
        &mut self,
        body: S,
        view: &mut dyn ChatView,
        cancel: &CancellationToken,
    ) -> StreamOutcome
    where
        S: Stream<Item = Result<B, TransportError>>,
        B: AsRef<[u8]>,
    {
        if self.response.is_none() {
            debug!("no active response to consume");
            return StreamOutcome::Ended { committed: false };
        }

        futures_util::pin_mut!(body);
        let mut decoder = FrameDecoder::new();

        let ending = loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => break Ending::Cancelled,
                next = body.next() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    let events = decoder.push(chunk.as_ref());
                    self.apply_events(events, view).await;
                    if decoder.is_done() {
                        break Ending::Completed;
                    }
                }
                Some(Err(err)) => break Ending::Failed(err),
                None => {
                    let events = decoder.finish();
                    self.apply_events(events, view).await;
                    break if decoder.is_done() {
                        Ending::Completed
                    } else {
                        Ending::Ended
                    };
                }
            }
        };

        match ending {
            Ending::Completed => StreamOutcome::Completed {
                committed: self.finish_response(true),
            },
            Ending::Ended => {
                info!("response body ended without a [DONE] marker");
                StreamOutcome::Ended {
                    committed: self.finish_response(false),
                }
            }
            Ending::Cancelled => {
                info!("response cancelled");
                let committed = self.finish_response(false);
                view.show_notice(NoticeKind::Info, "Response cancelled");
                StreamOutcome::Cancelled { committed }
            }
            Ending::Failed(err) => {
                error!("chat stream failed: {err}");
                let committed = self.finish_response(false);
                view.show_notice(NoticeKind::Error, &err.to_string());
                StreamOutcome::Failed {
                    error: err,
                    committed,
                }
            }
        }
    }

    /// Reports a failure that happened before any body arrived. Nothing is
    /// committed and the slot is closed.
    pub fn fail(&mut self, err: &TransportError, view: &mut dyn ChatView) {
        error!("chat request failed: {err}");
        self.response = None;
        self.driver.close_slot();
        view.show_notice(NoticeKind::Error, &err.to_string());
    }

    /// Abandons a response that was cancelled before its body arrived.
    pub fn cancel(&mut self, view: &mut dyn ChatView) {
        if self.response.take().is_some() {
            info!("response cancelled before it started");
            self.driver.close_slot();
            view.show_notice(NoticeKind::Info, "Response cancelled");
        }
    }

    /// Replaces the conversation with a stored transcript.
    pub fn load_transcript(&mut self, name: &str, text: &str, view: &mut dyn ChatView) {
        self.response = None;
        self.driver.close_slot();
        view.clear();
        self.conversation.replace_with_seed(text);
        view.show_transcript(name, text);
        debug!(name = %name, turns = self.conversation.len(), "loaded transcript");
    }

    /// Starts a blank conversation.
    pub fn reset(&mut self, view: &mut dyn ChatView) {
        self.response = None;
        self.driver.close_slot();
        self.conversation.clear();
        view.clear();
    }

    async fn apply_events(&mut self, events: Vec<StreamEvent>, view: &mut dyn ChatView) {
        let Some(response) = self.response.as_mut() else {
            return;
        };

        let mut changed = false;
        for event in events {
            changed |= response.apply(event).is_some();
        }
        if !changed {
            return;
        }
        if let Some(slot) = response.slot() {
            self.driver
                .render(view, slot, response.content(), response.reasoning())
                .await;
        }
    }

    /// Converts the active response into an assistant turn. Partial content
    /// is kept only when non-empty; a completed response always commits.
    fn finish_response(&mut self, completed: bool) -> bool {
        let Some(mut response) = self.response.take() else {
            return false;
        };
        response.mark_done();
        self.driver.close_slot();

        let content = response.finish();
        if !completed && content.is_empty() {
            return false;
        }
        self.conversation.append_assistant_turn(content);
        true
    }
}
