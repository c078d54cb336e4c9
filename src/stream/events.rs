use serde_json::Value;

/// Prefix carried by every event line of the upstream `text/event-stream` body.
pub const DATA_PREFIX: &str = "data: ";

/// Diff-block target field that carries answer text.
pub const MARKDOWN_FIELD: &str = "markdown_block";

// ============================================================================
// Borrowed views over one decoded event
// ============================================================================

/// One JSON event taken from a single `data: ` line.
///
/// Upstream drifts its schema often, so the event is kept as a loose
/// [`Value`] and read through accessors that treat anything unexpected as
/// absent instead of failing the whole line.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEvent {
    raw: Value,
}

impl StreamEvent {
    /// Parses a raw line. Returns `None` for non-event lines and malformed JSON.
    pub fn parse_line(line: &str) -> Option<Self> {
        let payload = line
            .trim_start_matches('\u{feff}')
            .trim()
            .strip_prefix(DATA_PREFIX)?;
        match serde_json::from_str::<Value>(payload) {
            Ok(raw) => Some(Self { raw }),
            Err(e) => {
                log::trace!("skipping malformed event frame: {}", e);
                None
            }
        }
    }

    /// Backend-assigned conversation id, when present and non-empty.
    pub fn backend_uuid(&self) -> Option<&str> {
        self.raw
            .get("backend_uuid")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Diff blocks in arrival order.
    pub fn diff_blocks(&self) -> impl Iterator<Item = DiffBlock<'_>> {
        self.raw
            .get("blocks")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|block| block.get("diff_block"))
            .filter(|diff| diff.is_object())
            .map(DiffBlock::new)
    }

    /// Diff blocks that target the answer text.
    pub fn markdown_blocks(&self) -> impl Iterator<Item = DiffBlock<'_>> {
        self.diff_blocks()
            .filter(|block| block.field() == Some(MARKDOWN_FIELD))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DiffBlock<'a> {
    raw: &'a Value,
}

impl<'a> DiffBlock<'a> {
    fn new(raw: &'a Value) -> Self {
        Self { raw }
    }

    pub fn field(&self) -> Option<&'a str> {
        self.raw.get("field").and_then(Value::as_str)
    }

    pub fn patches(&self) -> impl Iterator<Item = Patch<'a>> + use<'a> {
        self.raw
            .get("patches")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .map(Patch::from_value)
    }
}

/// A single `{path, value}` edit inside a diff block.
#[derive(Debug, Clone, Copy)]
pub struct Patch<'a> {
    pub path: Option<&'a str>,
    pub value: Option<&'a Value>,
}

impl<'a> Patch<'a> {
    pub fn from_value(raw: &'a Value) -> Self {
        Self {
            path: raw.get("path").and_then(Value::as_str),
            value: raw.get("value"),
        }
    }
}
