//! Completion text extraction
//!
//! Completion endpoints and client versions disagree on where the generated
//! text lives. Each known layout gets its own decoder; they run in a fixed
//! priority order and the first one yielding non-blank text wins.

use serde::Deserialize;
use serde_json::Value;

/// Known response layouts, in decode priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionShape {
    /// `choices[0].message.content` as a string
    ChatMessage,
    /// `choices[0].message.content` as a list of text parts
    ChatContentParts,
    /// `choices[0].text` from the legacy completions endpoint
    LegacyText,
    /// `output_text` or `output[].content[].text` from the responses endpoint
    ResponsesOutput,
}

impl CompletionShape {
    pub const PRIORITY: [CompletionShape; 4] = [
        CompletionShape::ChatMessage,
        CompletionShape::ChatContentParts,
        CompletionShape::LegacyText,
        CompletionShape::ResponsesOutput,
    ];

    /// Decode this layout, returning trimmed text when present and non-blank
    pub fn decode(self, body: &Value) -> Option<String> {
        let text = match self {
            Self::ChatMessage => ChatCompletion::deserialize(body)
                .ok()?
                .choices
                .into_iter()
                .next()?
                .message
                .content
                .and_then(MessageContent::into_text),
            Self::ChatContentParts => ChatCompletion::deserialize(body)
                .ok()?
                .choices
                .into_iter()
                .next()?
                .message
                .content
                .and_then(MessageContent::into_parts_text),
            Self::LegacyText => LegacyCompletion::deserialize(body)
                .ok()?
                .choices
                .into_iter()
                .next()?
                .text,
            Self::ResponsesOutput => ResponsesOutput::deserialize(body).ok()?.into_text(),
        }?;

        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

/// Extract the first usable completion text from a response body
pub fn extract_completion_text(body: &Value) -> Option<(CompletionShape, String)> {
    CompletionShape::PRIORITY
        .iter()
        .find_map(|shape| shape.decode(body).map(|text| (*shape, text)))
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<MessageContent>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            Self::Parts(_) => None,
        }
    }

    fn into_parts_text(self) -> Option<String> {
        match self {
            Self::Text(_) => None,
            Self::Parts(parts) => join_parts(parts),
        }
    }
}

#[derive(Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<String>,
}

fn join_parts(parts: Vec<ContentPart>) -> Option<String> {
    let texts: Vec<String> = parts.into_iter().filter_map(|p| p.text).collect();
    (!texts.is_empty()).then(|| texts.join(""))
}

#[derive(Deserialize)]
struct LegacyCompletion {
    choices: Vec<LegacyChoice>,
}

#[derive(Deserialize)]
struct LegacyChoice {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ResponsesOutput {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<ContentPart>,
}

impl ResponsesOutput {
    fn into_text(self) -> Option<String> {
        if let Some(text) = self.output_text.filter(|t| !t.trim().is_empty()) {
            return Some(text);
        }
        join_parts(self.output.into_iter().flat_map(|item| item.content).collect())
    }
}
