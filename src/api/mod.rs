//! Chat completion payloads exchanged with OpenAI-compatible endpoints.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub max_tokens: u32,
}

impl ChatRequest {
    pub fn streaming(model: impl Into<String>, messages: Vec<ChatMessage>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: true,
            max_tokens,
        }
    }
}

/// A single streamed delta.
///
/// `None` means the field was absent (or `null`) in the payload, which is
/// distinct from `Some("")`.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ChatResponseDelta {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub reasoning_content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponseChoice {
    pub delta: ChatResponseDelta,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatResponseChoice>,
}

impl ChatResponse {
    /// Pulls `choices[0].delta` out of an arbitrary JSON payload.
    ///
    /// Returns `None` when the payload is valid JSON but does not carry the
    /// expected shape.
    pub fn first_delta(value: serde_json::Value) -> Option<ChatResponseDelta> {
        let response: ChatResponse = serde_json::from_value(value).ok()?;
        response.choices.into_iter().next().map(|choice| choice.delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_wire_shape() {
        let request = ChatRequest::streaming(
            "deepseek-ai/DeepSeek-R1",
            vec![ChatMessage {
                role: "user".into(),
                content: "hi".into(),
            }],
            512,
        );
        let value = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            value,
            json!({
                "model": "deepseek-ai/DeepSeek-R1",
                "messages": [{"role": "user", "content": "hi"}],
                "stream": true,
                "max_tokens": 512
            })
        );
    }

    #[test]
    fn absent_and_empty_fields_stay_distinct() {
        let delta = ChatResponse::first_delta(json!({
            "choices": [{"delta": {"content": ""}}]
        }))
        .expect("delta");
        assert_eq!(delta.content.as_deref(), Some(""));
        assert_eq!(delta.reasoning_content, None);

        let delta = ChatResponse::first_delta(json!({
            "choices": [{"delta": {"reasoning_content": "hm", "content": null}}]
        }))
        .expect("delta");
        assert_eq!(delta.content, None);
        assert_eq!(delta.reasoning_content.as_deref(), Some("hm"));
    }

    #[test]
    fn payloads_without_delta_are_rejected() {
        assert!(ChatResponse::first_delta(json!({"choices": []})).is_none());
        assert!(ChatResponse::first_delta(json!({"choices": [{"index": 0}]})).is_none());
        assert!(ChatResponse::first_delta(json!({"id": "abc"})).is_none());
        assert!(ChatResponse::first_delta(json!("text")).is_none());
    }
}
