use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use super::events::StreamEvent;
use super::patch::PatchKind;

/// Final result of decoding one upstream response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedAnswer {
    pub answer: Option<String>,
    pub conversation_id: Option<String>,
}

/// What happened to one fed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// Not an event, malformed, or fed after the decoder finished.
    Skipped,
    Applied,
    /// A legacy whole-answer patch was found; the rest of the stream is irrelevant.
    Terminal,
}

/// Incremental decoder for the answer event stream.
///
/// Feed lines in arrival order with [`feed_line`](Self::feed_line), then call
/// [`finish`](Self::finish). The conversation id is first-write-wins. Chunks
/// are only joined in `finish`, never handed out partially.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    conversation_id: Option<String>,
    chunks: Vec<String>,
    legacy_answer: Option<String>,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_terminal(&self) -> bool {
        self.legacy_answer.is_some()
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn feed_line(&mut self, line: &str) -> LineOutcome {
        if self.is_terminal() {
            return LineOutcome::Skipped;
        }
        match StreamEvent::parse_line(line) {
            Some(event) => self.apply(&event),
            None => LineOutcome::Skipped,
        }
    }

    fn apply(&mut self, event: &StreamEvent) -> LineOutcome {
        if self.conversation_id.is_none() {
            if let Some(id) = event.backend_uuid() {
                log::debug!("conversation id assigned: {}", id);
                self.conversation_id = Some(id.to_string());
            }
        }

        for block in event.markdown_blocks() {
            for patch in block.patches() {
                match PatchKind::classify(&patch) {
                    PatchKind::ChunkBatch(chunks) => {
                        self.chunks.extend(chunks.into_iter().map(Cow::into_owned));
                    }
                    PatchKind::ChunkAppend(chunk) => self.chunks.push(chunk.to_string()),
                    PatchKind::LegacyAnswer(answer) => {
                        // Supersedes whatever was accumulated so far.
                        if !self.chunks.is_empty() {
                            log::debug!(
                                "legacy answer patch discards {} accumulated chunks",
                                self.chunks.len()
                            );
                        }
                        self.chunks.clear();
                        self.legacy_answer = Some(answer.to_string());
                        return LineOutcome::Terminal;
                    }
                    PatchKind::Unrecognized => {}
                }
            }
        }
        LineOutcome::Applied
    }

    pub fn finish(self) -> DecodedAnswer {
        let answer = match self.legacy_answer {
            Some(answer) => Some(answer),
            None if self.chunks.is_empty() => None,
            None => Some(self.chunks.concat()),
        };
        DecodedAnswer {
            answer,
            conversation_id: self.conversation_id,
        }
    }
}

/// Decodes a complete response body, stopping at the first legacy answer patch.
pub fn decode(raw: &str) -> DecodedAnswer {
    let mut decoder = StreamDecoder::new();
    for line in raw.lines() {
        if decoder.feed_line(line) == LineOutcome::Terminal {
            break;
        }
    }
    decoder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn event(value: Value) -> String {
        format!("data: {}", value)
    }

    fn markdown_event(patches: Value) -> String {
        event(json!({
            "blocks": [{"diff_block": {"field": "markdown_block", "patches": patches}}]
        }))
    }

    fn stream(lines: &[String]) -> String {
        lines.join("\n")
    }

    #[test]
    fn test_chunk_array_decoding() {
        let raw = markdown_event(json!([{"path": "", "value": {"chunks": ["Hel", "lo"]}}]));
        assert_eq!(decode(&raw).answer.as_deref(), Some("Hello"));
    }

    #[test]
    fn test_numeric_chunks_are_concatenated_as_text() {
        let raw = markdown_event(json!([{"value": {"chunks": ["a", 1, "b"]}}]));
        assert_eq!(decode(&raw).answer.as_deref(), Some("a1b"));
    }

    #[test]
    fn test_incremental_addition_keeps_event_order() {
        let raw = stream(&[
            markdown_event(json!([{"path": "", "value": {"chunks": ["A"]}}])),
            String::new(),
            markdown_event(json!([{"path": "/chunks/1", "value": "B"}])),
        ]);
        assert_eq!(decode(&raw).answer.as_deref(), Some("AB"));
    }

    #[test]
    fn test_legacy_answer_short_circuits() {
        let raw = stream(&[
            event(json!({"backend_uuid": "conv-1"})),
            markdown_event(json!([{"path": "", "value": {"chunks": ["partial"]}}])),
            markdown_event(json!([{"path": "/markdown_block/answer", "value": "final"}])),
            event(json!({"backend_uuid": "ignored"})),
            markdown_event(json!([{"path": "/chunks/9", "value": " more"}])),
        ]);
        let decoded = decode(&raw);
        assert_eq!(decoded.answer.as_deref(), Some("final"));
        assert_eq!(decoded.conversation_id.as_deref(), Some("conv-1"));
    }

    #[test]
    fn test_legacy_answer_returns_id_seen_so_far_only() {
        let raw = stream(&[
            markdown_event(json!([{"value": {"answer": "whole"}}])),
            event(json!({"backend_uuid": "too-late"})),
        ]);
        let decoded = decode(&raw);
        assert_eq!(decoded.answer.as_deref(), Some("whole"));
        assert_eq!(decoded.conversation_id, None);
    }

    #[test]
    fn test_legacy_patch_stops_remaining_patches_in_same_block() {
        let raw = markdown_event(json!([
            {"path": "/chunks/0", "value": "x"},
            {"path": "/answer", "value": "done"},
            {"path": "/chunks/1", "value": "y"}
        ]));
        assert_eq!(decode(&raw).answer.as_deref(), Some("done"));
    }

    #[test]
    fn test_malformed_line_is_skipped() {
        let raw = stream(&[
            "data: {not valid json".to_string(),
            markdown_event(json!([{"value": {"chunks": ["ok"]}}])),
        ]);
        assert_eq!(decode(&raw).answer.as_deref(), Some("ok"));
    }

    #[test]
    fn test_truncated_final_frame_keeps_earlier_chunks() {
        let mut raw = markdown_event(json!([{"value": {"chunks": ["kept"]}}]));
        raw.push_str("\ndata: {\"blocks\": [{\"diff_block\": {\"field\": \"mark");
        assert_eq!(decode(&raw).answer.as_deref(), Some("kept"));
    }

    #[test]
    fn test_empty_stream() {
        assert_eq!(decode(""), DecodedAnswer::default());
        assert_eq!(
            decode(": keep-alive\nevent: message\n\nretry: 100\n"),
            DecodedAnswer::default()
        );
    }

    #[test]
    fn test_events_without_chunks_yield_no_answer() {
        let raw = stream(&[
            event(json!({"backend_uuid": "conv-1", "status": "PENDING"})),
            markdown_event(json!([{"path": "/progress", "value": "DONE"}])),
        ]);
        let decoded = decode(&raw);
        assert_eq!(decoded.answer, None);
        assert_eq!(decoded.conversation_id.as_deref(), Some("conv-1"));
    }

    #[test]
    fn test_conversation_id_first_write_wins() {
        let raw = stream(&[
            event(json!({"backend_uuid": ""})),
            event(json!({"backend_uuid": "first"})),
            event(json!({"backend_uuid": "second"})),
        ]);
        assert_eq!(decode(&raw).conversation_id.as_deref(), Some("first"));
    }

    #[test]
    fn test_other_diff_fields_do_not_contribute() {
        let raw = event(json!({"blocks": [
            {"diff_block": {"field": "sources_block", "patches": [{"value": {"chunks": ["no"]}}]}},
            {"diff_block": {"field": "markdown_block", "patches": [{"value": {"chunks": ["yes"]}}]}}
        ]}));
        assert_eq!(decode(&raw).answer.as_deref(), Some("yes"));
    }

    #[test]
    fn test_byte_order_mark_before_first_line() {
        let raw = format!(
            "\u{feff}{}",
            markdown_event(json!([{"value": {"chunks": ["bom"]}}]))
        );
        assert_eq!(decode(&raw).answer.as_deref(), Some("bom"));
    }

    #[test]
    fn test_crlf_and_indented_lines() {
        let raw = format!(
            "  {}\r\n{}\r\n",
            markdown_event(json!([{"value": {"chunks": ["a"]}}])),
            markdown_event(json!([{"path": "/chunks/1", "value": "b"}]))
        );
        assert_eq!(decode(&raw).answer.as_deref(), Some("ab"));
    }

    #[test]
    fn test_decode_is_idempotent() {
        let raw = stream(&[
            event(json!({"backend_uuid": "c"})),
            markdown_event(json!([{"value": {"chunks": ["x", "y"]}}])),
        ]);
        assert_eq!(decode(&raw), decode(&raw));
    }

    #[test]
    fn test_feed_after_terminal_is_skipped() {
        let mut decoder = StreamDecoder::new();
        let terminal = markdown_event(json!([{"value": {"answer": "final"}}]));
        assert_eq!(decoder.feed_line(&terminal), LineOutcome::Terminal);
        assert!(decoder.is_terminal());

        let late = markdown_event(json!([{"value": {"chunks": ["late"]}}]));
        assert_eq!(decoder.feed_line(&late), LineOutcome::Skipped);
        assert_eq!(decoder.finish().answer.as_deref(), Some("final"));
    }

    #[test]
    fn test_feed_line_outcomes() {
        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.feed_line("event: message"), LineOutcome::Skipped);
        assert_eq!(decoder.feed_line("data: [DONE"), LineOutcome::Skipped);
        assert_eq!(
            decoder.feed_line(r#"data: {"backend_uuid": "c-9"}"#),
            LineOutcome::Applied
        );
        assert_eq!(decoder.conversation_id(), Some("c-9"));
    }

    #[test]
    fn test_serializes_camel_case() {
        let decoded = DecodedAnswer {
            answer: Some("a".to_string()),
            conversation_id: Some("c".to_string()),
        };
        let json = serde_json::to_value(&decoded).unwrap();
        assert_eq!(json, json!({"answer": "a", "conversationId": "c"}));
    }
}
