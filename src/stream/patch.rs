use std::borrow::Cow;

use serde_json::Value;

use super::events::Patch;

const CHUNKS_SEGMENT: &str = "/chunks/";
const ANSWER_SUFFIX: &str = "/answer";

/// The encodings upstream has used for answer text over its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchKind<'a> {
    /// `{"chunks": [...]}` carrying an ordered batch of text chunks.
    ChunkBatch(Vec<Cow<'a, str>>),
    /// A single string appended at a `/chunks/<n>` path.
    ChunkAppend(&'a str),
    /// A self-contained final answer from the older `answer` encoding.
    LegacyAnswer(&'a str),
    Unrecognized,
}

impl<'a> PatchKind<'a> {
    /// Resolves a patch to exactly one encoding. Chunk encodings are checked
    /// before the legacy one, so a string at `/chunks/.../answer` is an append.
    pub fn classify(patch: &Patch<'a>) -> Self {
        let Some(value) = patch.value else {
            return Self::Unrecognized;
        };
        let path = patch.path.unwrap_or_default();

        match value {
            Value::Object(map) => {
                if let Some(chunks) = map.get("chunks").and_then(chunk_list) {
                    return Self::ChunkBatch(chunks);
                }
                match map.get("answer").and_then(Value::as_str) {
                    Some(answer) if !answer.is_empty() => Self::LegacyAnswer(answer),
                    _ => Self::Unrecognized,
                }
            }
            Value::String(text) if path.contains(CHUNKS_SEGMENT) => {
                Self::ChunkAppend(text.as_str())
            }
            Value::String(text) if path.ends_with(ANSWER_SUFFIX) => {
                Self::LegacyAnswer(text.as_str())
            }
            _ => Self::Unrecognized,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::LegacyAnswer(_))
    }
}

// A non-empty bare string under `chunks` counts as one chunk. Any other
// non-array shape is not a chunk list.
fn chunk_list(chunks: &Value) -> Option<Vec<Cow<'_, str>>> {
    match chunks {
        Value::Array(items) => Some(items.iter().filter_map(chunk_text).collect()),
        Value::String(text) if !text.is_empty() => Some(vec![Cow::Borrowed(text.as_str())]),
        _ => None,
    }
}

// Numbers and booleans are rendered as text; null and nested structures
// contribute nothing.
fn chunk_text(item: &Value) -> Option<Cow<'_, str>> {
    match item {
        Value::String(text) => Some(Cow::Borrowed(text.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        _ => None,
    }
}
