//! Upstream record reassembly and decoding
//!
//! The provider stream is line-delimited SSE. A single read chunk can carry
//! a fraction of a record or several records at once, so raw bytes are
//! buffered until a delimiter is seen and complete records are handed out in
//! arrival order.

use serde::Deserialize;

/// Reassembles newline-delimited records from arbitrary read chunks.
///
/// Buffering happens on bytes, not strings, so a UTF-8 sequence split across
/// two chunks is only decoded once the line is complete.
#[derive(Debug, Default)]
pub struct RecordSplitter {
    buf: Vec<u8>,
}

impl RecordSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one read chunk; returns every record completed by it, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut records = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            records.push(String::from_utf8_lossy(&line[..line.len() - 1]).into_owned());
        }

        records
    }

    /// Drain whatever is left after upstream EOF (a final record may arrive
    /// without a trailing delimiter).
    pub fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buf);
        Some(String::from_utf8_lossy(&rest).into_owned())
    }
}

/// Outcome of decoding one upstream record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedRecord {
    /// Non-empty content to forward
    Token(String),
    /// Upstream terminal marker
    Done,
    /// Valid record with nothing to forward (metadata, keep-alives, blanks)
    Metadata,
    /// Record shape we do not understand
    Unrecognized,
}

#[derive(Debug, Deserialize)]
struct ChunkRecord {
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Deserialize, Default)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Decode one reassembled record.
///
/// Role/model-only records decode fine but carry no content and are treated
/// as metadata; shapes that do not decode at all are `Unrecognized` so the
/// relay can skip them safely and fail only after repeated garbage.
pub fn decode_record(record: &str) -> ParsedRecord {
    let line = record.trim();

    if line.is_empty() {
        return ParsedRecord::Metadata;
    }

    // SSE comment lines and non-data fields (event:, id:, retry:) carry no
    // payload for us.
    if line.starts_with(':') {
        return ParsedRecord::Metadata;
    }

    let data = match line.strip_prefix("data:") {
        Some(rest) => rest.trim(),
        None if is_sse_field(line) => return ParsedRecord::Metadata,
        None => return ParsedRecord::Unrecognized,
    };

    if data == "[DONE]" {
        return ParsedRecord::Done;
    }

    match serde_json::from_str::<ChunkRecord>(data) {
        Ok(chunk) => {
            let mut acc = String::new();
            for choice in chunk.choices {
                if let Some(piece) = choice.delta.content {
                    acc.push_str(&piece);
                }
            }
            if acc.is_empty() {
                ParsedRecord::Metadata
            } else {
                ParsedRecord::Token(acc)
            }
        }
        Err(_) => ParsedRecord::Unrecognized,
    }
}

fn is_sse_field(line: &str) -> bool {
    line.starts_with("event:") || line.starts_with("id:") || line.starts_with("retry:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splitter_record_spanning_chunks() {
        let mut splitter = RecordSplitter::new();
        assert!(splitter.feed(b"data: {\"choices\":").is_empty());
        let records = splitter.feed(b"[]}\n");
        assert_eq!(records, vec!["data: {\"choices\":[]}"]);
    }

    #[test]
    fn test_splitter_multiple_records_in_one_chunk() {
        let mut splitter = RecordSplitter::new();
        let records = splitter.feed(b"data: a\n\ndata: b\n");
        assert_eq!(records, vec!["data: a", "", "data: b"]);
    }

    #[test]
    fn test_splitter_preserves_order_across_feeds() {
        let mut splitter = RecordSplitter::new();
        let mut all = Vec::new();
        all.extend(splitter.feed(b"data: 1\nda"));
        all.extend(splitter.feed(b"ta: 2\ndata: 3"));
        all.extend(splitter.feed(b"\n"));
        assert_eq!(all, vec!["data: 1", "data: 2", "data: 3"]);
    }

    #[test]
    fn test_splitter_finish_drains_remainder() {
        let mut splitter = RecordSplitter::new();
        splitter.feed(b"data: tail");
        assert_eq!(splitter.finish(), Some("data: tail".to_string()));
        assert_eq!(splitter.finish(), None);
    }

    #[test]
    fn test_splitter_utf8_split_across_chunks() {
        let mut splitter = RecordSplitter::new();
        let text = "data: {\"choices\":[{\"delta\":{\"content\":\"héllo\"}}]}\n".as_bytes();
        let (a, b) = text.split_at(40); // splits inside the multi-byte char
        assert!(splitter.feed(a).is_empty());
        let records = splitter.feed(b);
        assert_eq!(records.len(), 1);
        assert!(records[0].contains("héllo"));
    }

    #[test]
    fn test_decode_content_record() {
        let record = r#"data: {"choices":[{"delta":{"content":"Hello"}}]}"#;
        assert_eq!(decode_record(record), ParsedRecord::Token("Hello".into()));
    }

    #[test]
    fn test_decode_concatenates_choice_contents() {
        let record = r#"data: {"choices":[{"delta":{"content":"a"}},{"delta":{"content":"b"}}]}"#;
        assert_eq!(decode_record(record), ParsedRecord::Token("ab".into()));
    }

    #[test]
    fn test_decode_metadata_only_record() {
        // Role announcement with empty content: dropped silently
        let record = r#"data: {"choices":[{"delta":{"role":"assistant","content":""}}]}"#;
        assert_eq!(decode_record(record), ParsedRecord::Metadata);

        let record = r#"data: {"choices":[{"delta":{}}]}"#;
        assert_eq!(decode_record(record), ParsedRecord::Metadata);
    }

    #[test]
    fn test_decode_done_marker() {
        assert_eq!(decode_record("data: [DONE]"), ParsedRecord::Done);
        assert_eq!(decode_record("data:[DONE]"), ParsedRecord::Done);
    }

    #[test]
    fn test_decode_blank_and_comment_lines() {
        assert_eq!(decode_record(""), ParsedRecord::Metadata);
        assert_eq!(decode_record("   "), ParsedRecord::Metadata);
        assert_eq!(decode_record(": keep-alive"), ParsedRecord::Metadata);
        assert_eq!(decode_record("event: message"), ParsedRecord::Metadata);
    }

    #[test]
    fn test_decode_unrecognized_shapes() {
        assert_eq!(decode_record("data: {not json"), ParsedRecord::Unrecognized);
        assert_eq!(
            decode_record(r#"data: {"unexpected":"shape"}"#),
            ParsedRecord::Unrecognized
        );
        assert_eq!(decode_record("garbage line"), ParsedRecord::Unrecognized);
    }

    #[test]
    fn test_decode_finish_reason_record_is_metadata() {
        let record = r#"data: {"choices":[{"delta":{},"finish_reason":"stop"}]}"#;
        assert_eq!(decode_record(record), ParsedRecord::Metadata);
    }
}
