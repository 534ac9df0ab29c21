//! Line framing for `data:` event streams.
//!
//! Chunks arrive with arbitrary boundaries, so the decoder keeps the
//! unterminated tail of each chunk and prefixes it onto the next one before
//! splitting on line feeds. Buffering bytes instead of text also keeps
//! multi-byte characters that straddle two chunks intact.

use memchr::memchr;
use tracing::{debug, warn};

use crate::api::ChatResponse;

const DATA_PREFIX: &str = "data: ";
const DONE_LINE: &str = "data: [DONE]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    ContentDelta(String),
    ReasoningDelta(String),
    Done,
    Malformed(String),
}

#[derive(Debug, Default)]
pub struct FrameDecoder {
    carry: Vec<u8>,
    done: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once `data: [DONE]` has been decoded. The caller should stop
    /// pulling from the underlying stream.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feeds one chunk and returns the events for every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if self.done {
            return events;
        }

        self.carry.extend_from_slice(chunk);
        let mut consumed = 0;
        while let Some(offset) = memchr(b'\n', &self.carry[consumed..]) {
            let end = consumed + offset;
            decode_line(&self.carry[consumed..end], &mut events);
            consumed = end + 1;
            if matches!(events.last(), Some(StreamEvent::Done)) {
                self.done = true;
                self.carry.clear();
                return events;
            }
        }
        self.carry.drain(..consumed);
        events
    }

    /// Flushes the final line of a body that ended without a trailing newline.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if self.done || self.carry.is_empty() {
            self.carry.clear();
            return events;
        }
        let tail = std::mem::take(&mut self.carry);
        decode_line(&tail, &mut events);
        if matches!(events.last(), Some(StreamEvent::Done)) {
            self.done = true;
        }
        events
    }
}

fn decode_line(raw: &[u8], events: &mut Vec<StreamEvent>) {
    let line = match std::str::from_utf8(raw) {
        Ok(line) => line.trim_end(),
        Err(err) => {
            let lossy = String::from_utf8_lossy(raw).into_owned();
            if lossy.starts_with(DATA_PREFIX) {
                warn!("invalid UTF-8 in stream line: {err}");
                events.push(StreamEvent::Malformed(lossy));
            }
            return;
        }
    };

    if line == DONE_LINE {
        events.push(StreamEvent::Done);
        return;
    }

    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return;
    };

    let value = match serde_json::from_str::<serde_json::Value>(payload) {
        Ok(value) => value,
        Err(err) => {
            warn!(line = %line, "skipping malformed stream payload: {err}");
            events.push(StreamEvent::Malformed(line.to_string()));
            return;
        }
    };

    let Some(delta) = ChatResponse::first_delta(value) else {
        debug!(payload = %payload, "payload has no choices[0].delta; ignoring");
        return;
    };

    if let Some(reasoning) = delta.reasoning_content.filter(|text| !text.is_empty()) {
        events.push(StreamEvent::ReasoningDelta(reasoning));
    }
    if let Some(content) = delta.content.filter(|text| !text.is_empty()) {
        events.push(StreamEvent::ContentDelta(content));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(chunks: &[&[u8]]) -> Vec<StreamEvent> {
        let mut decoder = FrameDecoder::new();
        let mut events = Vec::new();
        for chunk in chunks {
            events.extend(decoder.push(chunk));
        }
        events.extend(decoder.finish());
        events
    }

    #[test]
    fn decodes_content_and_done() {
        let events = decode_all(&[
            b"data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n\ndata: [DONE]\n",
        ]);
        assert_eq!(
            events,
            vec![StreamEvent::ContentDelta("Hello".into()), StreamEvent::Done]
        );
    }

    #[test]
    fn carries_partial_lines_across_chunks() {
        let events = decode_all(&[
            b"da",
            b"ta: {\"choices\":[{\"delta\":{\"con",
            b"tent\":\"Hi\"}}]}",
            b"\ndata: [DO",
            b"NE]\n",
        ]);
        assert_eq!(
            events,
            vec![StreamEvent::ContentDelta("Hi".into()), StreamEvent::Done]
        );
    }

    #[test]
    fn non_data_lines_are_ignored() {
        let events = decode_all(&[
            b": keep-alive\nevent: message\nid: 7\n\ndata:{\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n",
        ]);
        assert!(events.is_empty(), "got {events:?}");
    }

    #[test]
    fn malformed_payload_is_reported_and_decoding_continues() {
        let events = decode_all(&[
            b"data: not-json\ndata: {\"choices\":[{\"delta\":{\"content\":\"B\"}}]}\n",
        ]);
        assert_eq!(
            events,
            vec![
                StreamEvent::Malformed("data: not-json".into()),
                StreamEvent::ContentDelta("B".into()),
            ]
        );
    }

    #[test]
    fn schema_mismatch_yields_nothing() {
        let events = decode_all(&[
            b"data: {\"object\":\"chat.completion.chunk\"}\ndata: {\"choices\":[]}\n",
        ]);
        assert!(events.is_empty());
    }

    #[test]
    fn reasoning_is_emitted_before_content_and_empty_fields_are_skipped() {
        let events = decode_all(&[
            b"data: {\"choices\":[{\"delta\":{\"content\":\"A\",\"reasoning_content\":\"r\"}}]}\n",
            b"data: {\"choices\":[{\"delta\":{\"content\":\"\",\"reasoning_content\":null}}]}\n",
        ]);
        assert_eq!(
            events,
            vec![
                StreamEvent::ReasoningDelta("r".into()),
                StreamEvent::ContentDelta("A".into()),
            ]
        );
    }

    #[test]
    fn stops_after_done() {
        let mut decoder = FrameDecoder::new();
        let events = decoder.push(
            b"data: [DONE]\ndata: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n",
        );
        assert_eq!(events, vec![StreamEvent::Done]);
        assert!(decoder.is_done());
        assert!(decoder
            .push(b"data: {\"choices\":[{\"delta\":{\"content\":\"later\"}}]}\n")
            .is_empty());
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn crlf_framing_is_accepted() {
        let events = decode_all(&[
            b"data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\r\n\r\ndata: [DONE]\r\n",
        ]);
        assert_eq!(
            events,
            vec![StreamEvent::ContentDelta("ok".into()), StreamEvent::Done]
        );
    }

    #[test]
    fn multibyte_characters_split_across_chunks_survive() {
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"你好\"}}]}\n".as_bytes();
        let split = line.iter().position(|b| *b >= 0x80).expect("multibyte") + 1;
        let events = decode_all(&[&line[..split], &line[split..]]);
        assert_eq!(events, vec![StreamEvent::ContentDelta("你好".into())]);
    }

    #[test]
    fn unterminated_final_line_is_flushed() {
        let events = decode_all(&[b"data: {\"choices\":[{\"delta\":{\"content\":\"end\"}}]}"]);
        assert_eq!(events, vec![StreamEvent::ContentDelta("end".into())]);
    }
}
